use std::collections::BTreeMap;

use tokio_postgres::Row;

use crate::error::AppResult;
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::Oid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgNamespace {
    pub oid: Oid,
    pub nspname: String,
}

const COLS: &[ColumnDef] = &[
    ColumnDef { name: "oid", coltype: ColType::Oid },
    ColumnDef { name: "nspname", coltype: ColType::Text },
];

impl CatalogTable for PgNamespace {
    const NAME: &'static str = "pg_namespace";
    const COLUMNS: &'static [ColumnDef] = COLS;

    fn from_row(row: &Row) -> AppResult<Self> {
        Ok(PgNamespace { oid: row.try_get("oid")?, nspname: row.try_get("nspname")? })
    }
}

/// A schema that survived the denylist.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Schema {
    pub schema_id: Oid,
    pub schema_name: String,
}

/// Surviving schemas keyed by oid. Later stages only ever look schemas up by id.
pub type Schemas = BTreeMap<Oid, Schema>;

/// Keep every namespace whose name is not in `excluded`. Matching is exact, as
/// catalog names are already case-folded by the server.
pub fn filter_namespaces(namespaces: &[PgNamespace], excluded: &[String]) -> Schemas {
    namespaces
        .iter()
        .filter(|n| !excluded.iter().any(|e| e == &n.nspname))
        .map(|n| (n.oid, Schema { schema_id: n.oid, schema_name: n.nspname.clone() }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ns(oid: Oid, name: &str) -> PgNamespace { PgNamespace { oid, nspname: name.into() } }

    #[test]
    fn excluded_schemas_are_dropped() {
        let all = vec![ns(11, "pg_catalog"), ns(2200, "public"), ns(13211, "information_schema"), ns(16400, "sales")];
        let kept = filter_namespaces(&all, &["pg_catalog".into(), "information_schema".into()]);
        let names: Vec<&str> = kept.values().map(|s| s.schema_name.as_str()).collect();
        assert_eq!(names, vec!["public", "sales"]);
        assert_eq!(kept[&2200].schema_id, 2200);
    }

    #[test]
    fn empty_denylist_keeps_everything() {
        let all = vec![ns(11, "pg_catalog"), ns(2200, "public")];
        assert_eq!(filter_namespaces(&all, &[]).len(), 2);
    }

    #[test]
    fn matching_is_case_sensitive() {
        let all = vec![ns(16400, "Sales")];
        assert_eq!(filter_namespaces(&all, &["sales".into()]).len(), 1);
    }
}
