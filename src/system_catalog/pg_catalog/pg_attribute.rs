use std::collections::BTreeMap;

use tokio_postgres::Row;
use tracing::debug;

use crate::error::AppResult;
use crate::metadata::{Nullable, ScalarType};
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::pg_class::QueryableRelations;
use super::pg_type::RetainedTypes;
use super::Oid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgAttribute {
    pub attrelid: Oid,
    pub attname: String,
    pub attnum: i16,
    pub atttypid: Oid,
    pub attnotnull: bool,
    pub attisdropped: bool,
}

const COLS: &[ColumnDef] = &[
    ColumnDef { name: "attrelid", coltype: ColType::Oid },
    ColumnDef { name: "attname", coltype: ColType::Text },
    ColumnDef { name: "attnum", coltype: ColType::SmallInt },
    ColumnDef { name: "atttypid", coltype: ColType::Oid },
    ColumnDef { name: "attnotnull", coltype: ColType::Boolean },
    ColumnDef { name: "attisdropped", coltype: ColType::Boolean },
];

impl CatalogTable for PgAttribute {
    const NAME: &'static str = "pg_attribute";
    const COLUMNS: &'static [ColumnDef] = COLS;

    fn from_row(row: &Row) -> AppResult<Self> {
        Ok(PgAttribute {
            attrelid: row.try_get("attrelid")?,
            attname: row.try_get("attname")?,
            attnum: row.try_get("attnum")?,
            atttypid: row.try_get("atttypid")?,
            attnotnull: row.try_get("attnotnull")?,
            attisdropped: row.try_get("attisdropped")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Column {
    pub relation_id: Oid,
    pub column_name: String,
    pub column_number: i16,
    pub type_id: Oid,
    pub type_name: ScalarType,
    pub nullable: Nullable,
}

/// Columns of every relation whose live columns all have a retained type,
/// keyed by relation oid and ordered by column number.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ResolvedColumns {
    by_relation: BTreeMap<Oid, Vec<Column>>,
}

impl ResolvedColumns {
    /// Whether the relation passed the type gate.
    pub fn is_exposed(&self, relation_id: Oid) -> bool {
        self.by_relation.contains_key(&relation_id)
    }

    pub fn columns_of(&self, relation_id: Oid) -> Option<&[Column]> {
        self.by_relation.get(&relation_id).map(|v| v.as_slice())
    }

    pub fn column(&self, relation_id: Oid, column_number: i16) -> Option<&Column> {
        self.columns_of(relation_id)?.iter().find(|c| c.column_number == column_number)
    }

    pub fn relation_ids(&self) -> impl Iterator<Item = Oid> + '_ {
        self.by_relation.keys().copied()
    }
}

fn is_live(a: &PgAttribute) -> bool {
    !a.attisdropped && a.attnum > 0
}

/// Project live columns of the queryable relations and attach type names.
///
/// All-or-nothing per relation: one column whose type is not retained censors
/// the whole relation. A relation without live columns has nothing to expose
/// and is dropped as well.
pub fn resolve_columns(
    attributes: &[PgAttribute],
    relations: &QueryableRelations,
    types: &RetainedTypes,
) -> ResolvedColumns {
    let mut by_relation: BTreeMap<Oid, Vec<Column>> = BTreeMap::new();
    let mut censored: BTreeMap<Oid, Oid> = BTreeMap::new();

    for a in attributes.iter().filter(|a| is_live(a)) {
        if !relations.contains_key(&a.attrelid) { continue; }
        match types.get(&a.atttypid) {
            Some(t) => by_relation.entry(a.attrelid).or_default().push(Column {
                relation_id: a.attrelid,
                column_name: a.attname.clone(),
                column_number: a.attnum,
                type_id: t.type_id,
                type_name: t.type_name.clone(),
                nullable: Nullable::from_not_null(a.attnotnull),
            }),
            None => { censored.entry(a.attrelid).or_insert(a.atttypid); }
        }
    }

    for (rel_id, type_id) in censored.iter() {
        by_relation.remove(rel_id);
        if let Some(rel) = relations.get(rel_id) {
            debug!(target: "catalog::introspect", "relation '{}' hidden: column type oid {} is not supported", rel.relation_name, type_id);
        }
    }
    for cols in by_relation.values_mut() {
        cols.sort_by_key(|c| c.column_number);
    }
    ResolvedColumns { by_relation }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system_catalog::pg_catalog::fixtures::*;
    use crate::system_catalog::pg_catalog::pg_class::project_relations;
    use crate::system_catalog::pg_catalog::pg_namespace::filter_namespaces;
    use crate::system_catalog::pg_catalog::pg_type::classify_types;

    fn resolve(snapshot: &crate::system_catalog::registry::CatalogSnapshot) -> ResolvedColumns {
        let schemas = filter_namespaces(&snapshot.namespaces, &["pg_catalog".into()]);
        let rels = project_relations(&snapshot.classes, &schemas);
        let types = classify_types(&snapshot.types);
        resolve_columns(&snapshot.attributes, &rels, &types)
    }

    #[test]
    fn columns_are_typed_ordered_and_nullability_tagged() {
        let mut s = base_snapshot();
        table(&mut s, 20000, PUBLIC, "orders", &[("total", NUMERIC, false), ("id", INT4, true)]);
        // attnums follow declaration order; reverse the rows to check sorting
        s.attributes.reverse();
        let cols = resolve(&s);
        let orders = cols.columns_of(20000).unwrap();
        let names: Vec<&str> = orders.iter().map(|c| c.column_name.as_str()).collect();
        assert_eq!(names, vec!["total", "id"]);
        assert_eq!(orders[0].type_name.as_str(), "numeric");
        assert_eq!(orders[0].nullable, Nullable::Nullable);
        assert_eq!(orders[1].nullable, Nullable::NonNullable);
    }

    #[test]
    fn dropped_and_system_columns_are_skipped() {
        let mut s = base_snapshot();
        table(&mut s, 20000, PUBLIC, "t", &[("a", INT4, false)]);
        s.attributes.push(PgAttribute { attrelid: 20000, attname: "ctid".into(), attnum: -1, atttypid: 27, attnotnull: true, attisdropped: false });
        s.attributes.push(PgAttribute { attrelid: 20000, attname: "........pg.dropped.2........".into(), attnum: 2, atttypid: INT4_ARRAY, attnotnull: false, attisdropped: true });
        let cols = resolve(&s);
        // neither the tid system column nor the dropped array column censors the table
        assert_eq!(cols.columns_of(20000).unwrap().len(), 1);
    }

    #[test]
    fn one_unsupported_column_hides_the_relation() {
        let mut s = base_snapshot();
        table(&mut s, 20000, PUBLIC, "tagged", &[("id", INT4, true), ("tags", INT4_ARRAY, false)]);
        table(&mut s, 20001, PUBLIC, "plain", &[("id", INT4, true)]);
        let cols = resolve(&s);
        assert!(!cols.is_exposed(20000));
        assert!(cols.is_exposed(20001));
    }

    #[test]
    fn relation_without_live_columns_is_not_exposed() {
        let mut s = base_snapshot();
        table(&mut s, 20000, PUBLIC, "empty", &[]);
        table(&mut s, 20001, PUBLIC, "only_dropped", &[]);
        s.attributes.push(PgAttribute { attrelid: 20001, attname: "........pg.dropped.1........".into(), attnum: 1, atttypid: INT4, attnotnull: false, attisdropped: true });
        let cols = resolve(&s);
        assert!(!cols.is_exposed(20000));
        assert!(!cols.is_exposed(20001));
        assert!(cols.columns_of(20000).is_none());
    }

    #[test]
    fn column_lookup_by_number() {
        let mut s = base_snapshot();
        table(&mut s, 20000, PUBLIC, "t", &[("a", INT4, false), ("b", TEXT, false)]);
        let cols = resolve(&s);
        assert_eq!(cols.column(20000, 2).map(|c| c.column_name.as_str()), Some("b"));
        assert!(cols.column(20000, 3).is_none());
    }
}
