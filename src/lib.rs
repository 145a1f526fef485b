pub mod error;
pub mod metadata;
pub mod system_catalog;
pub mod introspect;
pub mod configuration;
pub mod deployment;
pub mod scalar_types;
