// One module per pg_catalog table the resolver reads. Each module declares the
// columns it selects, decodes its rows and owns the resolution stage built on
// top of that table.

use tokio_postgres::Row;

use crate::error::{AppError, AppResult};

pub mod pg_namespace;
pub mod pg_class;
pub mod pg_type;
pub mod pg_attribute;
pub mod pg_description;
pub mod pg_constraint;
pub mod pg_proc;
pub mod pg_aggregate;

#[doc(hidden)]
pub mod fixtures;

/// Catalog object identifier.
pub type Oid = u32;

/// Decode a `"char"` column that was selected as text.
pub(crate) fn char_col(row: &Row, name: &str) -> AppResult<char> {
    let s: String = row.try_get(name)?;
    s.chars().next().ok_or_else(|| AppError::decode(
        "empty_char_column".to_string(),
        format!("column '{}' is empty", name),
    ))
}
