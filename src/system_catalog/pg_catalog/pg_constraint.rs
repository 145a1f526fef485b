use tokio_postgres::Row;
use tracing::debug;

use crate::error::AppResult;
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::pg_attribute::ResolvedColumns;
use super::{char_col, Oid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgConstraint {
    pub oid: Oid,
    pub connamespace: Oid,
    pub conname: String,
    pub conrelid: Oid,
    pub contype: char,
    /// Local column numbers, in key order.
    pub conkey: Vec<i16>,
    /// Referenced relation of a foreign key, 0 otherwise.
    pub confrelid: Oid,
    /// Referenced column numbers, positionally aligned with `conkey`.
    pub confkey: Vec<i16>,
}

const COLS: &[ColumnDef] = &[
    ColumnDef { name: "oid", coltype: ColType::Oid },
    ColumnDef { name: "connamespace", coltype: ColType::Oid },
    ColumnDef { name: "conname", coltype: ColType::Text },
    ColumnDef { name: "conrelid", coltype: ColType::Oid },
    ColumnDef { name: "contype", coltype: ColType::Char },
    ColumnDef { name: "conkey", coltype: ColType::SmallIntArray },
    ColumnDef { name: "confrelid", coltype: ColType::Oid },
    ColumnDef { name: "confkey", coltype: ColType::SmallIntArray },
];

pub const CONTYPE_PRIMARY: char = 'p';
pub const CONTYPE_UNIQUE: char = 'u';
pub const CONTYPE_FOREIGN: char = 'f';

impl CatalogTable for PgConstraint {
    const NAME: &'static str = "pg_constraint";
    const COLUMNS: &'static [ColumnDef] = COLS;
    const FILTER: Option<&'static str> = Some("contype IN ('p', 'u', 'f')");

    fn from_row(row: &Row) -> AppResult<Self> {
        // conkey/confkey are NULL for constraints that are not on table columns
        let conkey: Option<Vec<i16>> = row.try_get("conkey")?;
        let confkey: Option<Vec<i16>> = row.try_get("confkey")?;
        Ok(PgConstraint {
            oid: row.try_get("oid")?,
            connamespace: row.try_get("connamespace")?,
            conname: row.try_get("conname")?,
            conrelid: row.try_get("conrelid")?,
            contype: char_col(row, "contype")?,
            conkey: conkey.unwrap_or_default(),
            confrelid: row.try_get("confrelid")?,
            confkey: confkey.unwrap_or_default(),
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UniquenessConstraint {
    pub constraint_id: Oid,
    pub schema_id: Oid,
    pub constraint_name: String,
    pub relation_id: Oid,
    pub key_columns: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ForeignKeyConstraint {
    pub constraint_id: Oid,
    pub schema_id: Oid,
    pub constraint_name: String,
    pub relation_id: Oid,
    pub key_columns: Vec<String>,
    pub referenced_relation_id: Oid,
    pub referenced_columns: Vec<String>,
}

impl ForeignKeyConstraint {
    /// Local column paired with referenced column, by position.
    pub fn column_pairs(&self) -> impl Iterator<Item = (&str, &str)> + '_ {
        self.key_columns
            .iter()
            .zip(self.referenced_columns.iter())
            .map(|(l, r)| (l.as_str(), r.as_str()))
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedConstraints {
    pub uniqueness: Vec<UniquenessConstraint>,
    pub foreign_keys: Vec<ForeignKeyConstraint>,
}

/// Map column numbers to live column names, keeping key order. `None` if any
/// number does not name a live column of the relation.
fn column_names(columns: &ResolvedColumns, relation_id: Oid, numbers: &[i16]) -> Option<Vec<String>> {
    numbers
        .iter()
        .map(|n| columns.column(relation_id, *n).map(|c| c.column_name.clone()))
        .collect()
}

/// Reconstruct key column lists for unique, primary key and foreign key
/// constraints on exposed relations.
///
/// A constraint is dropped when one of its column numbers no longer resolves,
/// and a foreign key additionally when its referenced relation is not exposed
/// or the two key arrays differ in length.
pub fn resolve_constraints(constraints: &[PgConstraint], columns: &ResolvedColumns) -> ResolvedConstraints {
    let mut out = ResolvedConstraints::default();
    let mut dropped = 0usize;

    for c in constraints.iter() {
        if !columns.is_exposed(c.conrelid) { continue; }
        match c.contype {
            CONTYPE_PRIMARY | CONTYPE_UNIQUE => {
                let Some(key_columns) = column_names(columns, c.conrelid, &c.conkey) else { dropped += 1; continue };
                out.uniqueness.push(UniquenessConstraint {
                    constraint_id: c.oid,
                    schema_id: c.connamespace,
                    constraint_name: c.conname.clone(),
                    relation_id: c.conrelid,
                    key_columns,
                });
            }
            CONTYPE_FOREIGN => {
                if !columns.is_exposed(c.confrelid) || c.conkey.len() != c.confkey.len() {
                    dropped += 1;
                    continue;
                }
                let local = column_names(columns, c.conrelid, &c.conkey);
                let referenced = column_names(columns, c.confrelid, &c.confkey);
                let (Some(key_columns), Some(referenced_columns)) = (local, referenced) else { dropped += 1; continue };
                out.foreign_keys.push(ForeignKeyConstraint {
                    constraint_id: c.oid,
                    schema_id: c.connamespace,
                    constraint_name: c.conname.clone(),
                    relation_id: c.conrelid,
                    key_columns,
                    referenced_relation_id: c.confrelid,
                    referenced_columns,
                });
            }
            _ => {}
        }
    }

    out.uniqueness.sort_by_key(|u| u.constraint_id);
    out.foreign_keys.sort_by_key(|f| f.constraint_id);
    debug!(target: "catalog::introspect", "constraints resolved: unique={} foreign={} dropped={}", out.uniqueness.len(), out.foreign_keys.len(), dropped);
    out
}
