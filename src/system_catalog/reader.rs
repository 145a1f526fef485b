//! Loads a `CatalogSnapshot` from a live Postgres-compatible server.
//!
//! All catalog tables are read inside one read-only REPEATABLE READ
//! transaction, so every resolver stage sees the same point-in-time state.
//! Any failure aborts the load; there is no partial snapshot.

use std::sync::Arc;

use tokio_postgres::{Client, IsolationLevel, Transaction};
use tokio_postgres_rustls::MakeRustlsConnect;
use tracing::{debug, info};

use crate::error::{AppError, AppResult};
use crate::system_catalog::pg_catalog::{
    pg_aggregate::PgAggregate, pg_attribute::PgAttribute, pg_class::PgClass,
    pg_constraint::PgConstraint, pg_description::PgDescription, pg_namespace::PgNamespace,
    pg_proc::PgProc, pg_type::PgType,
};
use crate::system_catalog::registry::{CatalogSnapshot, CatalogTable};

/// Client TLS setup: ring crypto and the webpki root store, no client certificate.
pub fn tls_connector() -> AppResult<MakeRustlsConnect> {
    let mut roots = rustls::RootCertStore::empty();
    roots.extend(webpki_roots::TLS_SERVER_ROOTS.iter().cloned());
    let config = rustls::ClientConfig::builder_with_provider(Arc::new(rustls::crypto::ring::default_provider()))
        .with_safe_default_protocol_versions()
        .map_err(|e| AppError::catalog("tls_config", e.to_string()))?
        .with_root_certificates(roots)
        .with_no_client_auth();
    Ok(MakeRustlsConnect::new(config))
}

/// Open a connection and drive it on a background task.
///
/// TLS follows the URI's `sslmode`: `disable` stays plaintext, `prefer` (the
/// default) upgrades when the server offers it and `require` fails without it.
/// Server certificates are verified against the webpki roots, so a server with
/// a self-signed certificate needs `sslmode=disable`.
pub async fn connect(uri: &str) -> AppResult<Client> {
    let (client, connection) = tokio_postgres::connect(uri, tls_connector()?).await?;
    tokio::spawn(async move {
        if let Err(e) = connection.await {
            tracing::warn!(target: "catalog::reader", "connection closed with error: {}", e);
        }
    });
    Ok(client)
}

async fn read_table<T: CatalogTable>(txn: &Transaction<'_>) -> AppResult<Vec<T>> {
    let sql = T::select_sql();
    let rows = txn.query(sql.as_str(), &[]).await?;
    let out = rows.iter().map(T::from_row).collect::<AppResult<Vec<T>>>()?;
    debug!(target: "catalog::reader", "{}: {} rows", T::NAME, out.len());
    Ok(out)
}

/// Read every catalog table the resolver needs in one consistent snapshot.
pub async fn load_snapshot(client: &mut Client) -> AppResult<CatalogSnapshot> {
    let txn = client
        .build_transaction()
        .isolation_level(IsolationLevel::RepeatableRead)
        .read_only(true)
        .start()
        .await?;

    let snapshot = CatalogSnapshot {
        namespaces: read_table::<PgNamespace>(&txn).await?,
        classes: read_table::<PgClass>(&txn).await?,
        types: read_table::<PgType>(&txn).await?,
        attributes: read_table::<PgAttribute>(&txn).await?,
        descriptions: read_table::<PgDescription>(&txn).await?,
        constraints: read_table::<PgConstraint>(&txn).await?,
        procs: read_table::<PgProc>(&txn).await?,
        aggregates: read_table::<PgAggregate>(&txn).await?,
    };
    // Read-only; nothing to keep.
    txn.rollback().await?;

    info!(
        target: "catalog::reader",
        "catalog snapshot loaded: namespaces={} classes={} types={} attributes={} constraints={} aggregates={}",
        snapshot.namespaces.len(), snapshot.classes.len(), snapshot.types.len(),
        snapshot.attributes.len(), snapshot.constraints.len(), snapshot.aggregates.len()
    );
    Ok(snapshot)
}
