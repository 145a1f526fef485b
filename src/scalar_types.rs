//! Which scalar types a configuration actually uses, and what can be
//! aggregated over each of them.

use std::collections::{BTreeMap, BTreeSet};

use crate::configuration::RawConfiguration;
use crate::metadata::ScalarType;

/// Every type named by a table column, a native query column or argument,
/// or an aggregate function's argument.
pub fn occurring_scalar_types(config: &RawConfiguration) -> BTreeSet<ScalarType> {
    let tables = &config.metadata.tables.0;
    let native_queries = &config.metadata.native_queries.0;

    let table_column_types = tables.values().flat_map(|t| t.columns.values()).map(|c| c.r#type.clone());
    let native_query_types = native_queries
        .values()
        .flat_map(|q| q.columns.values().chain(q.arguments.values()))
        .map(|c| c.r#type.clone());
    let aggregate_types = config.aggregate_functions.0.keys().cloned();

    table_column_types.chain(native_query_types).chain(aggregate_types).collect()
}

/// Each occurring type mapped to its aggregate functions (name to return type).
/// Types without aggregates map to an empty set.
pub fn scalar_type_catalog(config: &RawConfiguration) -> BTreeMap<ScalarType, BTreeMap<String, ScalarType>> {
    occurring_scalar_types(config)
        .into_iter()
        .map(|t| {
            let functions = config
                .aggregate_functions
                .0
                .get(&t)
                .map(|fs| fs.iter().map(|(name, f)| (name.clone(), f.return_type.clone())).collect())
                .unwrap_or_default();
            (t, functions)
        })
        .collect()
}
