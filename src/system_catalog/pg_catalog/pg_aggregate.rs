// pg_aggregate extends a pg_proc row (prokind 'a') with the aggregate's
// internals. Only aggnumdirectargs matters here: ordered-set and
// hypothetical-set aggregates (percentile_cont, rank, ...) take direct
// arguments and cannot be exposed as a plain one-column reduction.

use std::cmp::Ordering;
use std::collections::BTreeMap;

use tokio_postgres::Row;
use tracing::debug;

use crate::error::AppResult;
use crate::metadata::ScalarType;
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::pg_proc::PgProc;
use super::pg_type::RetainedTypes;
use super::Oid;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgAggregate {
    pub aggfnoid: Oid,
    pub aggnumdirectargs: i16,
}

const COLS: &[ColumnDef] = &[
    // regproc; cast so it decodes as a plain oid
    ColumnDef { name: "aggfnoid", coltype: ColType::Oid },
    ColumnDef { name: "aggnumdirectargs", coltype: ColType::SmallInt },
];

impl CatalogTable for PgAggregate {
    const NAME: &'static str = "pg_aggregate";
    const COLUMNS: &'static [ColumnDef] = COLS;

    fn select_sql() -> String {
        "SELECT aggfnoid::oid AS aggfnoid, aggnumdirectargs FROM pg_catalog.pg_aggregate".to_string()
    }

    fn from_row(row: &Row) -> AppResult<Self> {
        Ok(PgAggregate {
            aggfnoid: row.try_get("aggfnoid")?,
            aggnumdirectargs: row.try_get("aggnumdirectargs")?,
        })
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolvedAggregate {
    pub proc_id: Oid,
    pub proc_name: String,
    pub schema_id: Oid,
    pub argument_type_name: ScalarType,
    pub return_type_name: ScalarType,
}

/// Overload tie-break: ascending (argument type, name, return type). Schema and
/// oid only make the order total; they never change which output is emitted.
pub fn overload_order(a: &ResolvedAggregate, b: &ResolvedAggregate) -> Ordering {
    a.argument_type_name
        .cmp(&b.argument_type_name)
        .then(a.proc_name.cmp(&b.proc_name))
        .then(a.return_type_name.cmp(&b.return_type_name))
        .then(a.schema_id.cmp(&b.schema_id))
        .then(a.proc_id.cmp(&b.proc_id))
}

/// Aggregates with one aggregated argument and no direct arguments whose
/// argument and return types are both retained. Pseudo-typed signatures
/// (`anyelement`, `anyarray`) fall out through the type lookup.
pub fn qualifying_aggregates(procs: &[PgProc], aggregates: &[PgAggregate], types: &RetainedTypes) -> Vec<ResolvedAggregate> {
    let direct_args: BTreeMap<Oid, i16> = aggregates.iter().map(|a| (a.aggfnoid, a.aggnumdirectargs)).collect();
    procs
        .iter()
        .filter(|p| p.is_aggregate())
        .filter(|p| direct_args.get(&p.oid) == Some(&0))
        .filter_map(|p| {
            let arg = types.get(&p.single_argument()?)?;
            let ret = types.get(&p.prorettype)?;
            Some(ResolvedAggregate {
                proc_id: p.oid,
                proc_name: p.proname.clone(),
                schema_id: p.pronamespace,
                argument_type_name: arg.type_name.clone(),
                return_type_name: ret.type_name.clone(),
            })
        })
        .collect()
}

/// Argument type name to aggregate name to the chosen overload.
pub type AggregateCatalog = BTreeMap<ScalarType, BTreeMap<String, ResolvedAggregate>>;

/// Group qualifying aggregates by argument type. Overloads sharing an argument
/// type and a name (differing only by return type or schema) collapse onto the
/// first in `overload_order`.
pub fn build_aggregate_catalog(procs: &[PgProc], aggregates: &[PgAggregate], types: &RetainedTypes) -> AggregateCatalog {
    let mut candidates = qualifying_aggregates(procs, aggregates, types);
    candidates.sort_by(overload_order);

    let mut out = AggregateCatalog::new();
    let mut collapsed = 0usize;
    for agg in candidates {
        let by_name = out.entry(agg.argument_type_name.clone()).or_default();
        if by_name.contains_key(&agg.proc_name) {
            collapsed += 1;
            continue;
        }
        by_name.insert(agg.proc_name.clone(), agg);
    }
    debug!(target: "catalog::introspect", "aggregates resolved: argument_types={} collapsed_overloads={}", out.len(), collapsed);
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::system_catalog::pg_catalog::fixtures::*;
    use crate::system_catalog::pg_catalog::pg_type::classify_types;
    use crate::system_catalog::registry::CatalogSnapshot;

    fn build(s: &CatalogSnapshot) -> AggregateCatalog {
        build_aggregate_catalog(&s.procs, &s.aggregates, &classify_types(&s.types))
    }

    #[test]
    fn groups_by_argument_type() {
        let mut s = base_snapshot();
        aggregate(&mut s, 2108, "sum", INT4, INT8);
        aggregate(&mut s, 2116, "max", INT4, INT4);
        aggregate(&mut s, 2129, "max", TEXT, TEXT);
        let cat = build(&s);
        assert_eq!(cat.len(), 2);
        let int4 = &cat[&ScalarType("int4".into())];
        assert_eq!(int4.keys().map(|k| k.as_str()).collect::<Vec<_>>(), vec!["max", "sum"]);
        assert_eq!(int4["sum"].return_type_name.as_str(), "int8");
        assert_eq!(cat[&ScalarType("text".into())]["max"].return_type_name.as_str(), "text");
    }

    #[test]
    fn multi_argument_and_direct_argument_aggregates_are_skipped() {
        let mut s = base_snapshot();
        aggregate_with(&mut s, 3538, "string_agg", &[TEXT, TEXT], TEXT, 0);
        aggregate_with(&mut s, 3972, "percentile_cont", &[FLOAT8, FLOAT8], FLOAT8, 1);
        aggregate_with(&mut s, 9000, "odd_one", &[FLOAT8], FLOAT8, 1);
        aggregate_with(&mut s, 9001, "count_star", &[], INT8, 0);
        assert!(build(&s).is_empty());
    }

    #[test]
    fn polymorphic_signatures_are_skipped() {
        let mut s = base_snapshot();
        aggregate(&mut s, 2335, "array_agg", ANYELEMENT, ANYARRAY);
        aggregate(&mut s, 2244, "max_any", ANYELEMENT, ANYELEMENT);
        aggregate(&mut s, 9002, "int_array_agg", INT4, INT4_ARRAY);
        assert!(build(&s).is_empty());
    }

    #[test]
    fn missing_pg_aggregate_row_disqualifies() {
        let mut s = base_snapshot();
        aggregate(&mut s, 2108, "sum", INT4, INT8);
        s.aggregates.clear();
        assert!(build(&s).is_empty());
    }

    #[test]
    fn overloads_collapse_to_smallest_return_type() {
        let mut s = base_snapshot();
        aggregate(&mut s, 9100, "total", INT4, NUMERIC);
        aggregate(&mut s, 9101, "total", INT4, INT8);
        let first = build(&s);
        assert_eq!(first[&ScalarType("int4".into())]["total"].return_type_name.as_str(), "int8");

        s.procs.reverse();
        s.aggregates.reverse();
        assert_eq!(build(&s), first);
    }
}
