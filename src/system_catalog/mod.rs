// Catalog rows, the store seam over them, and the reader that fills a
// snapshot from a live server.

pub mod registry;
pub mod pg_catalog;
pub mod reader;
