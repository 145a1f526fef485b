use std::collections::BTreeMap;

use tokio_postgres::Row;

use crate::error::AppResult;
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::pg_attribute::ResolvedColumns;
use super::Oid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgDescription {
    pub objoid: Oid,
    pub classoid: Oid,
    pub objsubid: i32,
    pub description: String,
}

const COLS: &[ColumnDef] = &[
    ColumnDef { name: "objoid", coltype: ColType::Oid },
    ColumnDef { name: "classoid", coltype: ColType::Oid },
    ColumnDef { name: "objsubid", coltype: ColType::Integer },
    ColumnDef { name: "description", coltype: ColType::Text },
];

/// Oid of `pg_catalog.pg_class` itself, i.e. `'pg_class'::regclass`. Comments
/// on relations and their columns are stored against this class.
///
/// Hardcoded instead of looked up: only relation and column comments are
/// resolved, so there is no other catalog to dispatch to.
pub const PG_CLASS_RELATION_OID: Oid = 1259;

impl CatalogTable for PgDescription {
    const NAME: &'static str = "pg_description";
    const COLUMNS: &'static [ColumnDef] = COLS;
    const FILTER: Option<&'static str> = Some("classoid = 'pg_catalog.pg_class'::regclass");

    fn from_row(row: &Row) -> AppResult<Self> {
        Ok(PgDescription {
            objoid: row.try_get("objoid")?,
            classoid: row.try_get("classoid")?,
            objsubid: row.try_get("objsubid")?,
            description: row.try_get("description")?,
        })
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Comments {
    relations: BTreeMap<Oid, String>,
    columns: BTreeMap<(Oid, i16), String>,
}

impl Comments {
    pub fn relation(&self, relation_id: Oid) -> Option<&str> {
        self.relations.get(&relation_id).map(|s| s.as_str())
    }

    pub fn column(&self, relation_id: Oid, column_number: i16) -> Option<&str> {
        self.columns.get(&(relation_id, column_number)).map(|s| s.as_str())
    }
}

/// Attach comments to exposed relations (`objsubid` 0) and to their live
/// columns (`objsubid` = column number). Everything else is ignored.
pub fn resolve_comments(descriptions: &[PgDescription], columns: &ResolvedColumns) -> Comments {
    let mut out = Comments::default();
    for d in descriptions.iter().filter(|d| d.classoid == PG_CLASS_RELATION_OID) {
        if !columns.is_exposed(d.objoid) { continue; }
        if d.objsubid == 0 {
            out.relations.insert(d.objoid, d.description.clone());
            continue;
        }
        let Ok(attnum) = i16::try_from(d.objsubid) else { continue };
        if columns.column(d.objoid, attnum).is_some() {
            out.columns.insert((d.objoid, attnum), d.description.clone());
        }
    }
    out
}
