//! Deployment configuration (format version 1) and the `configure` operation
//! that refreshes its introspected parts from a live database.

use serde::{Deserialize, Serialize};
use tracing::info;

use crate::error::{AppError, AppResult};
use crate::introspect;
use crate::metadata::{AggregateFunctions, Metadata};
use crate::system_catalog::reader;
use crate::system_catalog::registry::CatalogStore;

pub const CURRENT_VERSION: u32 = 1;

/// What a user writes: enough to connect, plus anything introspection must preserve.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RawConfiguration {
    pub version: u32,
    pub connection_uris: ConnectionUris,
    #[serde(default, skip_serializing_if = "PoolSettings::is_default")]
    pub pool_settings: PoolSettings,
    #[serde(default)]
    pub metadata: Metadata,
    #[serde(default)]
    pub aggregate_functions: AggregateFunctions,
    /// Schemas never introspected. The default skips the internal schemas of
    /// Postgres, PostGIS, CockroachDB and Citus.
    #[serde(default = "default_excluded_schemas")]
    pub excluded_schemas: Vec<String>,
}

pub fn default_excluded_schemas() -> Vec<String> {
    vec![
        // Postgres
        "information_schema".to_string(),
        "pg_catalog".to_string(),
        // PostGIS
        "tiger".to_string(),
        // CockroachDB
        "crdb_internal".to_string(),
        // Citus
        "columnar".to_string(),
        "columnar_internal".to_string(),
    ]
}

/// A validated `RawConfiguration`.
#[derive(Debug, Clone, PartialEq)]
pub struct Configuration {
    pub config: RawConfiguration,
}

/// Accepts either one value or a list, so the common single-URI case stays terse.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum SingleOrList<T> {
    Single(T),
    List(Vec<T>),
}

impl<T> SingleOrList<T> {
    pub fn is_empty(&self) -> bool {
        match self {
            SingleOrList::Single(_) => false,
            SingleOrList::List(l) => l.is_empty(),
        }
    }

    pub fn first(&self) -> Option<&T> {
        match self {
            SingleOrList::Single(s) => Some(s),
            SingleOrList::List(l) => l.first(),
        }
    }
}

impl<'a, T> IntoIterator for &'a SingleOrList<T> {
    type Item = &'a T;
    type IntoIter = std::slice::Iter<'a, T>;

    fn into_iter(self) -> Self::IntoIter {
        match self {
            SingleOrList::Single(s) => std::slice::from_ref(s).iter(),
            SingleOrList::List(l) => l.iter(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionUri(pub String);

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConnectionUris(pub SingleOrList<ConnectionUri>);

pub fn single_connection_uri(connection_uri: String) -> ConnectionUris {
    ConnectionUris(SingleOrList::Single(ConnectionUri(connection_uri)))
}

impl RawConfiguration {
    pub fn empty() -> Self {
        Self {
            version: CURRENT_VERSION,
            connection_uris: ConnectionUris(SingleOrList::List(vec![])),
            pool_settings: PoolSettings::default(),
            metadata: Metadata::default(),
            aggregate_functions: AggregateFunctions::default(),
            excluded_schemas: default_excluded_schemas(),
        }
    }
}

/// Connection pool settings handed through to the serving agent.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PoolSettings {
    /// maximum number of pool connections
    #[serde(default = "max_connection_default")]
    pub max_connections: u32,
    /// timeout for acquiring a connection from the pool (seconds)
    #[serde(default = "pool_timeout_default")]
    pub pool_timeout: u64,
    /// idle timeout for releasing a connection from the pool (seconds)
    #[serde(default = "idle_timeout_default")]
    pub idle_timeout: Option<u64>,
    /// maximum lifetime for an individual connection (seconds)
    #[serde(default = "connection_lifetime_default")]
    pub connection_lifetime: Option<u64>,
}

impl PoolSettings {
    fn is_default(&self) -> bool {
        *self == PoolSettings::default()
    }
}

impl Default for PoolSettings {
    fn default() -> PoolSettings {
        PoolSettings {
            max_connections: 50,
            pool_timeout: 30,
            idle_timeout: Some(180),
            connection_lifetime: Some(600),
        }
    }
}

fn max_connection_default() -> u32 { PoolSettings::default().max_connections }
fn pool_timeout_default() -> u64 { PoolSettings::default().pool_timeout }
fn idle_timeout_default() -> Option<u64> { PoolSettings::default().idle_timeout }
fn connection_lifetime_default() -> Option<u64> { PoolSettings::default().connection_lifetime }

/// One invalid field of a configuration.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{}: {message}", .path.join("."))]
pub struct ValidationError {
    pub path: Vec<String>,
    pub message: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("invalid configuration: {}", .0.iter().map(|e| e.to_string()).collect::<Vec<_>>().join("; "))]
pub struct ValidationErrors(pub Vec<ValidationError>);

impl From<ValidationErrors> for AppError {
    fn from(err: ValidationErrors) -> Self {
        AppError::Config { code: "invalid_configuration".into(), message: err.to_string() }
    }
}

/// Check the version and that there is something to connect to.
pub fn validate_raw_configuration(raw: &RawConfiguration) -> Result<Configuration, ValidationErrors> {
    let mut errors = Vec::new();
    if raw.version != CURRENT_VERSION {
        errors.push(ValidationError {
            path: vec!["version".into()],
            message: format!("invalid configuration version, expected {}, got {}", CURRENT_VERSION, raw.version),
        });
    }
    if raw.connection_uris.0.is_empty() {
        errors.push(ValidationError {
            path: vec!["connection_uris".into()],
            message: "At least one database url must be specified".to_string(),
        });
    }
    if !errors.is_empty() {
        return Err(ValidationErrors(errors));
    }
    Ok(Configuration { config: raw.clone() })
}

/// The first configured URI. Load balancing across replicas is not supported,
/// so the others are only kept for the serving agent.
pub fn select_first_connection_url(ConnectionUris(urls): &ConnectionUris) -> AppResult<String> {
    urls.first()
        .map(|u| u.0.clone())
        .ok_or_else(|| AppError::config("no_connection_uri", "At least one database url must be specified"))
}

/// Rebuild `args` from an already-loaded catalog: tables and aggregate functions
/// are replaced, everything the user owns is carried over unchanged.
pub fn configure_from_snapshot<S: CatalogStore + ?Sized>(args: &RawConfiguration, store: &S) -> RawConfiguration {
    let result = introspect::resolve(store, &args.excluded_schemas);
    RawConfiguration {
        version: CURRENT_VERSION,
        connection_uris: args.connection_uris.clone(),
        pool_settings: args.pool_settings.clone(),
        metadata: Metadata {
            tables: result.tables,
            native_queries: args.metadata.native_queries.clone(),
        },
        aggregate_functions: result.aggregate_functions,
        excluded_schemas: args.excluded_schemas.clone(),
    }
}

/// Construct the deployment configuration by introspecting the database.
pub async fn configure(args: &RawConfiguration) -> AppResult<RawConfiguration> {
    validate_raw_configuration(args)?;
    let url = select_first_connection_url(&args.connection_uris)?;

    let mut client = reader::connect(&url).await?;
    let snapshot = reader::load_snapshot(&mut client).await?;
    let configured = configure_from_snapshot(args, &snapshot);

    info!(
        target: "catalog::config",
        "configuration refreshed: tables={} native_queries={}",
        configured.metadata.tables.0.len(), configured.metadata.native_queries.0.len()
    );
    Ok(configured)
}
