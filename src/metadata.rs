//! JSON-shaped schema model produced by introspection and stored in the
//! deployment file. Maps are `BTreeMap` so serialized output is stable.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

/// Name of a usable scalar type as reported by the catalog (`int4`, `text`, ...).
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub struct ScalarType(pub String);

impl ScalarType {
    pub fn as_str(&self) -> &str { &self.0 }
}

impl From<&str> for ScalarType {
    fn from(s: &str) -> Self { ScalarType(s.to_string()) }
}

/// Everything the query-serving layer knows about the database.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Metadata {
    #[serde(default)]
    pub tables: TablesInfo,
    #[serde(default)]
    pub native_queries: NativeQueries,
}

/// Relation name to relation schema.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TablesInfo(pub BTreeMap<String, TableInfo>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TableInfo {
    pub schema_name: String,
    pub table_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    pub columns: BTreeMap<String, ColumnInfo>,
    #[serde(default)]
    pub uniqueness_constraints: UniquenessConstraints,
    #[serde(default)]
    pub foreign_relations: ForeignRelations,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ColumnInfo {
    pub name: String,
    pub r#type: ScalarType,
    #[serde(default)]
    pub nullable: Nullable,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub enum Nullable {
    #[default]
    Nullable,
    NonNullable,
}

impl Nullable {
    /// `attnotnull` is the only nullability signal the catalog gives us.
    pub fn from_not_null(not_null: bool) -> Self {
        if not_null { Nullable::NonNullable } else { Nullable::Nullable }
    }
}

/// Constraint name to the ordered key columns of a unique or primary key constraint.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UniquenessConstraints(pub BTreeMap<String, UniquenessConstraint>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniquenessConstraint(pub Vec<String>);

/// Constraint name to foreign key description.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ForeignRelations(pub BTreeMap<String, ForeignRelation>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ForeignRelation {
    pub foreign_table: String,
    /// Local column to referenced column.
    pub column_mapping: BTreeMap<String, String>,
}

/// Argument type to the aggregates callable on it.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AggregateFunctions(pub BTreeMap<ScalarType, BTreeMap<String, AggregateFunction>>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AggregateFunction {
    pub return_type: ScalarType,
}

/// User-authored queries exposed as relations. Introspection never produces
/// these; they are preserved verbatim across a configuration refresh.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct NativeQueries(pub BTreeMap<String, NativeQueryInfo>);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NativeQueryInfo {
    pub sql: String,
    pub columns: BTreeMap<String, ColumnInfo>,
    #[serde(default)]
    pub arguments: BTreeMap<String, ColumnInfo>,
}

/// The two-key document a resolution produces.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct IntrospectionResult {
    #[serde(rename = "Tables")]
    pub tables: TablesInfo,
    #[serde(rename = "AggregateFunctions")]
    pub aggregate_functions: AggregateFunctions,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn empty_result_serializes_as_two_empty_objects() {
        let v = serde_json::to_value(IntrospectionResult::default()).unwrap();
        assert_eq!(v, json!({"Tables": {}, "AggregateFunctions": {}}));
    }

    #[test]
    fn missing_description_is_omitted_and_submaps_are_objects() {
        let mut columns = BTreeMap::new();
        columns.insert("id".to_string(), ColumnInfo {
            name: "id".into(),
            r#type: "int4".into(),
            nullable: Nullable::NonNullable,
            description: None,
        });
        let t = TableInfo {
            schema_name: "public".into(),
            table_name: "t".into(),
            description: None,
            columns,
            uniqueness_constraints: UniquenessConstraints::default(),
            foreign_relations: ForeignRelations::default(),
        };
        let v = serde_json::to_value(&t).unwrap();
        assert_eq!(v, json!({
            "schemaName": "public",
            "tableName": "t",
            "columns": {"id": {"name": "id", "type": "int4", "nullable": "nonNullable"}},
            "uniquenessConstraints": {},
            "foreignRelations": {}
        }));
    }

    #[test]
    fn table_info_reads_back_without_optional_maps() {
        let t: TableInfo = serde_json::from_value(json!({
            "schemaName": "public",
            "tableName": "t",
            "columns": {"x": {"name": "x", "type": "text"}}
        })).unwrap();
        assert_eq!(t.columns["x"].nullable, Nullable::Nullable);
        assert!(t.uniqueness_constraints.0.is_empty());
        assert!(t.foreign_relations.0.is_empty());
    }
}
