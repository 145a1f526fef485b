use tokio_postgres::Row;

use crate::error::AppResult;
use crate::system_catalog::registry::{CatalogTable, ColType, ColumnDef};
use super::{char_col, Oid};

pub const PROKIND_AGGREGATE: char = 'a';

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PgProc {
    pub oid: Oid,
    pub proname: String,
    pub pronamespace: Oid,
    pub prokind: char,
    pub pronargs: i16,
    /// Declared input argument types, excluding OUT arguments.
    pub proargtypes: Vec<Oid>,
    pub prorettype: Oid,
}

const COLS: &[ColumnDef] = &[
    ColumnDef { name: "oid", coltype: ColType::Oid },
    ColumnDef { name: "proname", coltype: ColType::Text },
    ColumnDef { name: "pronamespace", coltype: ColType::Oid },
    ColumnDef { name: "prokind", coltype: ColType::Char },
    ColumnDef { name: "pronargs", coltype: ColType::SmallInt },
    ColumnDef { name: "proargtypes", coltype: ColType::OidArray },
    ColumnDef { name: "prorettype", coltype: ColType::Oid },
];

impl CatalogTable for PgProc {
    const NAME: &'static str = "pg_proc";
    const COLUMNS: &'static [ColumnDef] = COLS;
    // Only aggregates are ever resolved; no need to ship every function across.
    const FILTER: Option<&'static str> = Some("prokind = 'a'");

    fn from_row(row: &Row) -> AppResult<Self> {
        Ok(PgProc {
            oid: row.try_get("oid")?,
            proname: row.try_get("proname")?,
            pronamespace: row.try_get("pronamespace")?,
            prokind: char_col(row, "prokind")?,
            pronargs: row.try_get("pronargs")?,
            proargtypes: row.try_get("proargtypes")?,
            prorettype: row.try_get("prorettype")?,
        })
    }
}

impl PgProc {
    pub fn is_aggregate(&self) -> bool {
        self.prokind == PROKIND_AGGREGATE
    }

    /// The single declared argument, if the function takes exactly one.
    pub fn single_argument(&self) -> Option<Oid> {
        match (self.pronargs, self.proargtypes.as_slice()) {
            (1, [arg]) => Some(*arg),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn proc(args: &[Oid]) -> PgProc {
        PgProc {
            oid: 2108,
            proname: "sum".into(),
            pronamespace: 11,
            prokind: 'a',
            pronargs: args.len() as i16,
            proargtypes: args.to_vec(),
            prorettype: 20,
        }
    }

    #[test]
    fn single_argument_requires_exactly_one() {
        assert_eq!(proc(&[23]).single_argument(), Some(23));
        assert_eq!(proc(&[]).single_argument(), None);
        assert_eq!(proc(&[23, 25]).single_argument(), None);
    }

    #[test]
    fn plain_functions_are_not_aggregates() {
        let mut p = proc(&[23]);
        p.prokind = 'f';
        assert!(!p.is_aggregate());
    }
}
