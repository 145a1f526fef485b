// Hand-built catalog rows shared by the unit tests, the integration tests and
// the bench. Oids mimic a stock server so failures read naturally against psql
// output.

use super::pg_aggregate::PgAggregate;
use super::pg_attribute::PgAttribute;
use super::pg_class::PgClass;
use super::pg_constraint::PgConstraint;
use super::pg_description::{PgDescription, PG_CLASS_RELATION_OID};
use super::pg_namespace::PgNamespace;
use super::pg_proc::PgProc;
use super::pg_type::PgType;
use super::Oid;
use crate::system_catalog::registry::CatalogSnapshot;

pub const PG_CATALOG: Oid = 11;
pub const PUBLIC: Oid = 2200;
pub const INFORMATION_SCHEMA: Oid = 13000;
pub const SALES: Oid = 16400;
pub const ARCHIVE: Oid = 16500;

pub const BOOL: Oid = 16;
pub const INT8: Oid = 20;
pub const INT4: Oid = 23;
pub const TEXT: Oid = 25;
pub const FLOAT8: Oid = 701;
pub const NUMERIC: Oid = 1700;
pub const JSONB: Oid = 3802;
pub const INT4_ARRAY: Oid = 1007;
pub const TEXT_ARRAY: Oid = 1009;
pub const RECORD: Oid = 2249;
pub const ANYARRAY: Oid = 2277;
pub const ANYELEMENT: Oid = 2283;
/// Row type of a user table.
pub const ADDRESS: Oid = 16450;

pub fn excluded() -> Vec<String> {
    vec!["pg_catalog".to_string(), "information_schema".to_string()]
}

fn ty(oid: Oid, name: &str, typtype: char, cat: char, elem: Oid) -> PgType {
    PgType { oid, typnamespace: PG_CATALOG, typname: name.into(), typtype, typcategory: cat, typelem: elem }
}

/// System and user schemas plus a handful of built-in types.
pub fn base_snapshot() -> CatalogSnapshot {
    CatalogSnapshot {
        namespaces: vec![
            PgNamespace { oid: PG_CATALOG, nspname: "pg_catalog".into() },
            PgNamespace { oid: PUBLIC, nspname: "public".into() },
            PgNamespace { oid: INFORMATION_SCHEMA, nspname: "information_schema".into() },
            PgNamespace { oid: SALES, nspname: "sales".into() },
            PgNamespace { oid: ARCHIVE, nspname: "archive".into() },
        ],
        types: vec![
            ty(BOOL, "bool", 'b', 'B', 0),
            ty(INT8, "int8", 'b', 'N', 0),
            ty(INT4, "int4", 'b', 'N', 0),
            ty(TEXT, "text", 'b', 'S', 0),
            ty(FLOAT8, "float8", 'b', 'N', 0),
            ty(NUMERIC, "numeric", 'b', 'N', 0),
            ty(JSONB, "jsonb", 'b', 'U', 0),
            ty(INT4_ARRAY, "_int4", 'b', 'A', INT4),
            ty(TEXT_ARRAY, "_text", 'b', 'A', TEXT),
            ty(RECORD, "record", 'p', 'P', 0),
            ty(ANYARRAY, "anyarray", 'p', 'P', 0),
            ty(ANYELEMENT, "anyelement", 'p', 'P', 0),
            ty(ADDRESS, "address", 'c', 'C', 0),
        ],
        ..CatalogSnapshot::default()
    }
}

/// Add an ordinary table whose columns are numbered from 1 in slice order.
/// Each column is (name, type oid, not null).
pub fn table(s: &mut CatalogSnapshot, oid: Oid, ns: Oid, name: &str, cols: &[(&str, Oid, bool)]) {
    relation(s, oid, ns, name, 'r', cols);
}

pub fn relation(s: &mut CatalogSnapshot, oid: Oid, ns: Oid, name: &str, kind: char, cols: &[(&str, Oid, bool)]) {
    s.classes.push(PgClass { oid, relnamespace: ns, relname: name.into(), relkind: kind });
    for (i, (col, typ, not_null)) in cols.iter().enumerate() {
        s.attributes.push(PgAttribute {
            attrelid: oid,
            attname: col.to_string(),
            attnum: (i + 1) as i16,
            atttypid: *typ,
            attnotnull: *not_null,
            attisdropped: false,
        });
    }
}

pub fn constraint(s: &mut CatalogSnapshot, oid: Oid, rel: Oid, name: &str, contype: char, keys: &[i16]) {
    s.constraints.push(PgConstraint {
        oid,
        connamespace: PUBLIC,
        conname: name.into(),
        conrelid: rel,
        contype,
        conkey: keys.to_vec(),
        confrelid: 0,
        confkey: Vec::new(),
    });
}

pub fn primary_key(s: &mut CatalogSnapshot, oid: Oid, rel: Oid, name: &str, keys: &[i16]) {
    constraint(s, oid, rel, name, 'p', keys);
}

pub fn unique(s: &mut CatalogSnapshot, oid: Oid, rel: Oid, name: &str, keys: &[i16]) {
    constraint(s, oid, rel, name, 'u', keys);
}

pub fn foreign_key(s: &mut CatalogSnapshot, oid: Oid, rel: Oid, name: &str, keys: &[i16], ref_rel: Oid, ref_keys: &[i16]) {
    constraint(s, oid, rel, name, 'f', keys);
    if let Some(c) = s.constraints.last_mut() {
        c.confrelid = ref_rel;
        c.confkey = ref_keys.to_vec();
    }
}

/// Comment on a relation (`subid` 0) or one of its columns.
pub fn comment(s: &mut CatalogSnapshot, rel: Oid, subid: i32, text: &str) {
    s.descriptions.push(PgDescription {
        objoid: rel,
        classoid: PG_CLASS_RELATION_OID,
        objsubid: subid,
        description: text.into(),
    });
}

/// Add an aggregate over the given argument types with `aggnumdirectargs` = `direct`.
pub fn aggregate_with(s: &mut CatalogSnapshot, oid: Oid, name: &str, args: &[Oid], ret: Oid, direct: i16) {
    s.procs.push(PgProc {
        oid,
        proname: name.into(),
        pronamespace: PG_CATALOG,
        prokind: 'a',
        pronargs: args.len() as i16,
        proargtypes: args.to_vec(),
        prorettype: ret,
    });
    s.aggregates.push(PgAggregate { aggfnoid: oid, aggnumdirectargs: direct });
}

pub fn aggregate(s: &mut CatalogSnapshot, oid: Oid, name: &str, arg: Oid, ret: Oid) {
    aggregate_with(s, oid, name, &[arg], ret, 0);
}

/// Same helpers with oids handed out in sequence, for tests that only care
/// about names.
pub struct CatalogBuilder {
    pub snapshot: CatalogSnapshot,
    next_oid: Oid,
}

impl Default for CatalogBuilder {
    fn default() -> Self {
        Self::new()
    }
}

impl CatalogBuilder {
    pub fn new() -> Self {
        CatalogBuilder { snapshot: base_snapshot(), next_oid: 60_000 }
    }

    fn oid(&mut self) -> Oid {
        self.next_oid += 1;
        self.next_oid
    }

    pub fn relation(&mut self, ns: Oid, name: &str, kind: char, cols: &[(&str, Oid, bool)]) -> Oid {
        let rel = self.oid();
        relation(&mut self.snapshot, rel, ns, name, kind, cols);
        rel
    }

    pub fn table(&mut self, ns: Oid, name: &str, cols: &[(&str, Oid, bool)]) -> Oid {
        self.relation(ns, name, 'r', cols)
    }

    pub fn primary_key(&mut self, rel: Oid, name: &str, keys: &[i16]) {
        let oid = self.oid();
        primary_key(&mut self.snapshot, oid, rel, name, keys);
    }

    pub fn unique(&mut self, rel: Oid, name: &str, keys: &[i16]) {
        let oid = self.oid();
        unique(&mut self.snapshot, oid, rel, name, keys);
    }

    pub fn check(&mut self, rel: Oid, name: &str, keys: &[i16]) {
        let oid = self.oid();
        constraint(&mut self.snapshot, oid, rel, name, 'c', keys);
    }

    pub fn foreign_key(&mut self, rel: Oid, name: &str, keys: &[i16], ref_rel: Oid, ref_keys: &[i16]) {
        let oid = self.oid();
        foreign_key(&mut self.snapshot, oid, rel, name, keys, ref_rel, ref_keys);
    }

    pub fn comment(&mut self, rel: Oid, subid: i32, text: &str) {
        comment(&mut self.snapshot, rel, subid, text);
    }

    pub fn aggregate(&mut self, name: &str, args: &[Oid], ret: Oid, direct_args: i16) -> Oid {
        let oid = self.oid();
        aggregate_with(&mut self.snapshot, oid, name, args, ret, direct_args);
        oid
    }

    /// customers(id, name, email) and orders(id, customer_id, total) with keys.
    pub fn shop(mut self) -> Self {
        let customers = self.table(PUBLIC, "customers", &[("id", INT4, true), ("name", TEXT, true), ("email", TEXT, false)]);
        self.primary_key(customers, "customers_pkey", &[1]);
        self.unique(customers, "customers_email_key", &[3]);
        let orders = self.table(PUBLIC, "orders", &[("id", INT4, true), ("customer_id", INT4, true), ("total", NUMERIC, false)]);
        self.primary_key(orders, "orders_pkey", &[1]);
        self.foreign_key(orders, "orders_customer_id_fkey", &[2], customers, &[1]);
        self
    }

    pub fn build(self) -> CatalogSnapshot {
        self.snapshot
    }
}
