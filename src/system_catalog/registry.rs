use tokio_postgres::Row;

use crate::error::AppResult;
use crate::system_catalog::pg_catalog::{
    pg_aggregate::PgAggregate, pg_attribute::PgAttribute, pg_class::PgClass,
    pg_constraint::PgConstraint, pg_description::PgDescription, pg_namespace::PgNamespace,
    pg_proc::PgProc, pg_type::PgType,
};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ColType {
    Oid,
    SmallInt,
    Integer,
    Boolean,
    Text,
    /// Postgres `"char"`; read as text and narrowed to a single char.
    Char,
    OidArray,
    SmallIntArray,
}

#[derive(Clone, Copy, Debug)]
pub struct ColumnDef {
    pub name: &'static str,
    pub coltype: ColType,
}

impl ColumnDef {
    /// Select-list expression for this column, with the casts the row decoders expect.
    fn select_expr(&self) -> String {
        match self.coltype {
            ColType::Char => format!("{0}::text AS {0}", self.name),
            // oidvector columns (proargtypes) decode as plain oid arrays
            ColType::OidArray => format!("{0}::oid[] AS {0}", self.name),
            _ => self.name.to_string(),
        }
    }
}

/// One `pg_catalog` table the resolver reads. Implementors declare the subset of
/// columns they need and decode a row of exactly that shape.
pub trait CatalogTable: Sized {
    const NAME: &'static str;
    const COLUMNS: &'static [ColumnDef];
    /// Optional pushed-down predicate. Resolvers re-check anything they rely on.
    const FILTER: Option<&'static str> = None;

    fn from_row(row: &Row) -> AppResult<Self>;

    fn select_sql() -> String {
        let cols: Vec<String> = Self::COLUMNS.iter().map(|c| c.select_expr()).collect();
        let mut sql = format!("SELECT {} FROM pg_catalog.{}", cols.join(", "), Self::NAME);
        if let Some(filter) = Self::FILTER {
            sql.push_str(" WHERE ");
            sql.push_str(filter);
        }
        sql
    }
}

/// Read-only view over one consistent snapshot of the catalog. Every
/// resolution stage reads through this seam, never through a live connection.
pub trait CatalogStore {
    fn namespaces(&self) -> &[PgNamespace];
    fn classes(&self) -> &[PgClass];
    fn types(&self) -> &[PgType];
    fn attributes(&self) -> &[PgAttribute];
    fn descriptions(&self) -> &[PgDescription];
    fn constraints(&self) -> &[PgConstraint];
    fn procs(&self) -> &[PgProc];
    fn aggregates(&self) -> &[PgAggregate];
}

/// Materialized catalog rows. Filled by `reader::load_snapshot` from a live
/// server, or by hand in tests.
#[derive(Debug, Clone, Default)]
pub struct CatalogSnapshot {
    pub namespaces: Vec<PgNamespace>,
    pub classes: Vec<PgClass>,
    pub types: Vec<PgType>,
    pub attributes: Vec<PgAttribute>,
    pub descriptions: Vec<PgDescription>,
    pub constraints: Vec<PgConstraint>,
    pub procs: Vec<PgProc>,
    pub aggregates: Vec<PgAggregate>,
}

impl CatalogStore for CatalogSnapshot {
    fn namespaces(&self) -> &[PgNamespace] { &self.namespaces }
    fn classes(&self) -> &[PgClass] { &self.classes }
    fn types(&self) -> &[PgType] { &self.types }
    fn attributes(&self) -> &[PgAttribute] { &self.attributes }
    fn descriptions(&self) -> &[PgDescription] { &self.descriptions }
    fn constraints(&self) -> &[PgConstraint] { &self.constraints }
    fn procs(&self) -> &[PgProc] { &self.procs }
    fn aggregates(&self) -> &[PgAggregate] { &self.aggregates }
}
