use std::cmp::Ordering;
use std::collections::BTreeMap;

use tokio_postgres::Row;

use crate::error::AppResult;
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::pg_namespace::Schemas;
use super::{char_col, Oid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgClass {
    pub oid: Oid,
    pub relnamespace: Oid,
    pub relname: String,
    pub relkind: char,
}

const COLS: &[ColumnDef] = &[
    ColumnDef { name: "oid", coltype: ColType::Oid },
    ColumnDef { name: "relnamespace", coltype: ColType::Oid },
    ColumnDef { name: "relname", coltype: ColType::Text },
    ColumnDef { name: "relkind", coltype: ColType::Char },
];

impl CatalogTable for PgClass {
    const NAME: &'static str = "pg_class";
    const COLUMNS: &'static [ColumnDef] = COLS;

    fn from_row(row: &Row) -> AppResult<Self> {
        Ok(PgClass {
            oid: row.try_get("oid")?,
            relnamespace: row.try_get("relnamespace")?,
            relname: row.try_get("relname")?,
            relkind: char_col(row, "relkind")?,
        })
    }
}

/// The relation kinds that have a queryable row shape. Indexes ('i'),
/// sequences ('S'), composite types ('c'), TOAST tables ('t') and
/// partitioned indexes ('I') never become relations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RelKind {
    OrdinaryTable,
    View,
    MaterializedView,
    ForeignTable,
    PartitionedTable,
}

impl RelKind {
    pub fn from_code(code: char) -> Option<Self> {
        match code {
            'r' => Some(RelKind::OrdinaryTable),
            'v' => Some(RelKind::View),
            'm' => Some(RelKind::MaterializedView),
            'f' => Some(RelKind::ForeignTable),
            'p' => Some(RelKind::PartitionedTable),
            _ => None,
        }
    }

    pub fn code(self) -> char {
        match self {
            RelKind::OrdinaryTable => 'r',
            RelKind::View => 'v',
            RelKind::MaterializedView => 'm',
            RelKind::ForeignTable => 'f',
            RelKind::PartitionedTable => 'p',
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Relation {
    pub relation_id: Oid,
    pub schema_id: Oid,
    pub relation_name: String,
    pub relation_kind: RelKind,
}

/// Tie-break for same-named relations: ascending (relation_name, schema_id, relkind code).
/// The kind compares by its catalog letter, not by enum position.
pub fn dedup_order(a: &Relation, b: &Relation) -> Ordering {
    a.relation_name
        .cmp(&b.relation_name)
        .then(a.schema_id.cmp(&b.schema_id))
        .then(a.relation_kind.code().cmp(&b.relation_kind.code()))
        .then(a.relation_id.cmp(&b.relation_id))
}

/// Relations exposed after name deduplication, keyed by relation oid.
pub type QueryableRelations = BTreeMap<Oid, Relation>;

/// Project relation-like classes in surviving schemas and keep one per name.
///
/// The exposed name is the bare relation name, so a same-named relation in a
/// schema with a higher oid is silently hidden. That is a known limitation
/// until relation names become schema qualified.
pub fn project_relations(classes: &[PgClass], schemas: &Schemas) -> QueryableRelations {
    let mut candidates: Vec<Relation> = classes
        .iter()
        .filter(|c| schemas.contains_key(&c.relnamespace))
        .filter_map(|c| {
            RelKind::from_code(c.relkind).map(|kind| Relation {
                relation_id: c.oid,
                schema_id: c.relnamespace,
                relation_name: c.relname.clone(),
                relation_kind: kind,
            })
        })
        .collect();
    candidates.sort_by(dedup_order);

    let mut out = QueryableRelations::new();
    let mut last_name: Option<String> = None;
    for rel in candidates {
        if last_name.as_deref() == Some(rel.relation_name.as_str()) { continue; }
        last_name = Some(rel.relation_name.clone());
        out.insert(rel.relation_id, rel);
    }
    out
}
