//! Schema assembly: runs the catalog resolvers in order over one snapshot and
//! shapes their output into the `{Tables, AggregateFunctions}` document.
//!
//! Stages, leaves first: namespace filter and type classifier, then relations,
//! columns, comments and constraints, then aggregates. Each stage is a pure
//! function of the snapshot and the stages before it.

use std::collections::BTreeMap;

use tokio_postgres::Client;
use tracing::info;

use crate::error::AppResult;
use crate::metadata::{
    AggregateFunction, AggregateFunctions, ColumnInfo, ForeignRelation, ForeignRelations,
    IntrospectionResult, TableInfo, TablesInfo, UniquenessConstraint, UniquenessConstraints,
};
use crate::system_catalog::pg_catalog::pg_aggregate::{build_aggregate_catalog, AggregateCatalog};
use crate::system_catalog::pg_catalog::pg_attribute::{resolve_columns, ResolvedColumns};
use crate::system_catalog::pg_catalog::pg_class::{project_relations, QueryableRelations};
use crate::system_catalog::pg_catalog::pg_constraint::{resolve_constraints, ResolvedConstraints};
use crate::system_catalog::pg_catalog::pg_description::{resolve_comments, Comments};
use crate::system_catalog::pg_catalog::pg_namespace::{filter_namespaces, Schemas};
use crate::system_catalog::pg_catalog::pg_type::classify_types;
use crate::system_catalog::reader;
use crate::system_catalog::registry::CatalogStore;

/// Resolve the exposed schema of `store`, ignoring schemas named in `excluded_schemas`.
pub fn resolve<S: CatalogStore + ?Sized>(store: &S, excluded_schemas: &[String]) -> IntrospectionResult {
    let schemas = filter_namespaces(store.namespaces(), excluded_schemas);
    let types = classify_types(store.types());
    let relations = project_relations(store.classes(), &schemas);
    let columns = resolve_columns(store.attributes(), &relations, &types);
    let comments = resolve_comments(store.descriptions(), &columns);
    let constraints = resolve_constraints(store.constraints(), &columns);
    let aggregates = build_aggregate_catalog(store.procs(), store.aggregates(), &types);

    let tables = assemble_tables(&schemas, &relations, &columns, &comments, &constraints);
    let aggregate_functions = assemble_aggregates(aggregates);

    info!(
        target: "catalog::introspect",
        "resolved schema: schemas={} candidate_relations={} tables={} aggregate_argument_types={}",
        schemas.len(), relations.len(), tables.0.len(), aggregate_functions.0.len()
    );
    IntrospectionResult { tables, aggregate_functions }
}

/// Load a snapshot over `client` and resolve it.
pub async fn introspect_database(client: &mut Client, excluded_schemas: &[String]) -> AppResult<IntrospectionResult> {
    let snapshot = reader::load_snapshot(client).await?;
    Ok(resolve(&snapshot, excluded_schemas))
}

/// Connect to `uri`, then load and resolve.
pub async fn introspect_uri(uri: &str, excluded_schemas: &[String]) -> AppResult<IntrospectionResult> {
    let mut client = reader::connect(uri).await?;
    introspect_database(&mut client, excluded_schemas).await
}

fn assemble_tables(
    schemas: &Schemas,
    relations: &QueryableRelations,
    columns: &ResolvedColumns,
    comments: &Comments,
    constraints: &ResolvedConstraints,
) -> TablesInfo {
    let mut tables: BTreeMap<String, TableInfo> = BTreeMap::new();

    for rel_id in columns.relation_ids() {
        let (Some(rel), Some(cols)) = (relations.get(&rel_id), columns.columns_of(rel_id)) else { continue };
        let Some(schema) = schemas.get(&rel.schema_id) else { continue };
        let column_map = cols
            .iter()
            .map(|c| (c.column_name.clone(), ColumnInfo {
                name: c.column_name.clone(),
                r#type: c.type_name.clone(),
                nullable: c.nullable,
                description: comments.column(rel_id, c.column_number).map(str::to_string),
            }))
            .collect();
        tables.insert(rel.relation_name.clone(), TableInfo {
            schema_name: schema.schema_name.clone(),
            table_name: rel.relation_name.clone(),
            description: comments.relation(rel_id).map(str::to_string),
            columns: column_map,
            uniqueness_constraints: UniquenessConstraints::default(),
            foreign_relations: ForeignRelations::default(),
        });
    }

    for u in constraints.uniqueness.iter() {
        let Some(table) = relations.get(&u.relation_id).and_then(|r| tables.get_mut(&r.relation_name)) else { continue };
        table
            .uniqueness_constraints
            .0
            .insert(u.constraint_name.clone(), UniquenessConstraint(u.key_columns.clone()));
    }

    for fk in constraints.foreign_keys.iter() {
        let Some(foreign) = relations.get(&fk.referenced_relation_id) else { continue };
        let Some(table) = relations.get(&fk.relation_id).and_then(|r| tables.get_mut(&r.relation_name)) else { continue };
        let column_mapping = fk.column_pairs().map(|(l, r)| (l.to_string(), r.to_string())).collect();
        table.foreign_relations.0.insert(fk.constraint_name.clone(), ForeignRelation {
            foreign_table: foreign.relation_name.clone(),
            column_mapping,
        });
    }

    TablesInfo(tables)
}

fn assemble_aggregates(catalog: AggregateCatalog) -> AggregateFunctions {
    AggregateFunctions(
        catalog
            .into_iter()
            .map(|(arg_type, by_name)| {
                let functions = by_name
                    .into_iter()
                    .map(|(name, agg)| (name, AggregateFunction { return_type: agg.return_type_name }))
                    .collect();
                (arg_type, functions)
            })
            .collect(),
    )
}
