use std::collections::BTreeMap;

use tokio_postgres::Row;

use crate::error::AppResult;
use crate::metadata::ScalarType;
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::{char_col, Oid};

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgType {
    pub oid: Oid,
    pub typnamespace: Oid,
    pub typname: String,
    pub typtype: char,
    pub typcategory: char,
    pub typelem: Oid,
}

const COLS: &[ColumnDef] = &[
    ColumnDef { name: "oid", coltype: ColType::Oid },
    ColumnDef { name: "typnamespace", coltype: ColType::Oid },
    ColumnDef { name: "typname", coltype: ColType::Text },
    ColumnDef { name: "typtype", coltype: ColType::Char },
    ColumnDef { name: "typcategory", coltype: ColType::Char },
    ColumnDef { name: "typelem", coltype: ColType::Oid },
];

impl CatalogTable for PgType {
    const NAME: &'static str = "pg_type";
    const COLUMNS: &'static [ColumnDef] = COLS;

    fn from_row(row: &Row) -> AppResult<Self> {
        Ok(PgType {
            oid: row.try_get("oid")?,
            typnamespace: row.try_get("typnamespace")?,
            typname: row.try_get("typname")?,
            typtype: char_col(row, "typtype")?,
            typcategory: char_col(row, "typcategory")?,
            typelem: row.try_get("typelem")?,
        })
    }
}

pub const TYPTYPE_COMPOSITE: char = 'c';
pub const TYPTYPE_PSEUDO: char = 'p';
pub const TYPCATEGORY_ARRAY: char = 'A';

/// A type usable as a column or aggregate argument type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Type {
    pub type_id: Oid,
    pub schema_id: Oid,
    pub type_name: ScalarType,
}

pub type RetainedTypes = BTreeMap<Oid, Type>;

/// Base, domain, enum, range and multirange types qualify; composite and
/// pseudo types (`anyelement`, `record`, ...) do not.
fn is_scalar_kind(t: &PgType) -> bool {
    t.typtype != TYPTYPE_COMPOSITE && t.typtype != TYPTYPE_PSEUDO
}

/// A "true" array has an element type and is categorized as an array.
///
/// Intentionally conservative: array-like extension types in category 'A' are
/// excluded too, so adding proper array support later is not a breaking change.
/// Types with an element type outside category 'A' (`point`, `name`) stay
/// usable; the legacy vector types (`int2vector`, `oidvector`) are category 'A'
/// and are excluded with the arrays.
pub fn is_true_array(t: &PgType) -> bool {
    t.typelem != 0 && t.typcategory == TYPCATEGORY_ARRAY
}

pub fn is_usable(t: &PgType) -> bool {
    is_scalar_kind(t) && !is_true_array(t)
}

pub fn classify_types(types: &[PgType]) -> RetainedTypes {
    types
        .iter()
        .filter(|t| is_usable(t))
        .map(|t| (t.oid, Type {
            type_id: t.oid,
            schema_id: t.typnamespace,
            type_name: ScalarType(t.typname.clone()),
        }))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ty(oid: Oid, name: &str, typtype: char, cat: char, elem: Oid) -> PgType {
        PgType { oid, typnamespace: 11, typname: name.into(), typtype, typcategory: cat, typelem: elem }
    }

    #[test]
    fn scalar_kinds_are_retained() {
        let types = vec![
            ty(23, "int4", 'b', 'N', 0),
            ty(16450, "email", 'd', 'S', 0),
            ty(16460, "mood", 'e', 'E', 0),
            ty(3904, "int4range", 'r', 'R', 0),
            ty(4451, "int4multirange", 'm', 'R', 0),
        ];
        assert_eq!(classify_types(&types).len(), 5);
    }

    #[test]
    fn composite_and_pseudo_types_are_excluded() {
        let types = vec![
            ty(16390, "orders", 'c', 'C', 0),
            ty(2283, "anyelement", 'p', 'P', 0),
            ty(2249, "record", 'p', 'P', 0),
        ];
        assert!(classify_types(&types).is_empty());
    }

    #[test]
    fn true_arrays_and_vector_types_are_excluded_but_array_like_scalars_are_not() {
        let int4_array = ty(1007, "_int4", 'b', 'A', 23);
        let point = ty(600, "point", 'b', 'G', 701);
        let name = ty(19, "name", 'b', 'S', 18);
        let int2vector = ty(22, "int2vector", 'b', 'A', 21);
        let oidvector = ty(30, "oidvector", 'b', 'A', 26);
        assert!(is_true_array(&int4_array));
        assert!(!is_usable(&int4_array));
        assert!(is_usable(&point));
        assert!(is_usable(&name));
        assert!(!is_usable(&int2vector));
        assert!(!is_usable(&oidvector));
    }

    #[test]
    fn retained_type_keeps_display_name() {
        let retained = classify_types(&[ty(1700, "numeric", 'b', 'N', 0)]);
        assert_eq!(retained[&1700].type_name, ScalarType("numeric".into()));
    }
}
