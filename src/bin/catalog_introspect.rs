//!
//! catalog_introspect binary
//! -------------------------
//! Refreshes a deployment file from its database, or prints the resolved
//! schema of a database as JSON.

use anyhow::{bail, Context, Result};
use std::env;
use std::path::PathBuf;

use catalog_resolver::configuration::default_excluded_schemas;
use catalog_resolver::{deployment, introspect};

const USAGE: &str = "catalog_introspect\n\nUSAGE:\n  catalog_introspect update --config FILE\n  catalog_introspect print --uri URI [--exclude SCHEMA]...\n\nCOMMANDS:\n  update    Introspect the database named in FILE and rewrite FILE in place\n  print     Print {Tables, AggregateFunctions} for URI to stdout\n\nOPTIONS:\n  --config FILE       Deployment configuration file\n  --uri URI           Postgres connection URI (env: CATALOG_DATABASE_URL)\n  --exclude SCHEMA    Schema to skip; repeatable. Defaults to the system schemas\n\nRUST_LOG controls log verbosity (default info).\n";

fn has_flag(args: &[String], flag: &str) -> bool {
    args.iter().any(|a| a == flag)
}

fn flag_value(args: &[String], flag: &str) -> Option<String> {
    let mut i = 0;
    while i < args.len() {
        if args[i] == flag && i + 1 < args.len() {
            return Some(args[i + 1].clone());
        }
        i += 1;
    }
    None
}

fn flag_values(args: &[String], flag: &str) -> Vec<String> {
    args.windows(2).filter(|w| w[0] == flag).map(|w| w[1].clone()).collect()
}

#[tokio::main]
async fn main() -> Result<()> {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    // Logs go to stderr so `print` output stays pipeable.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();

    let args: Vec<String> = env::args().skip(1).collect();
    if args.is_empty() || has_flag(&args, "--help") || has_flag(&args, "-h") {
        println!("{}", USAGE);
        return Ok(());
    }

    match args[0].as_str() {
        "update" => {
            let Some(config) = flag_value(&args, "--config") else { bail!("update requires --config FILE") };
            let path = PathBuf::from(config);
            let configured = deployment::update_deployment(&path)
                .await
                .with_context(|| format!("updating {}", path.display()))?;
            tracing::info!(
                "{} refreshed: {} tables, {} aggregate argument types",
                path.display(), configured.metadata.tables.0.len(), configured.aggregate_functions.0.len()
            );
        }
        "print" => {
            let Some(uri) = flag_value(&args, "--uri").or_else(|| env::var("CATALOG_DATABASE_URL").ok()) else {
                bail!("print requires --uri URI or CATALOG_DATABASE_URL")
            };
            let mut excluded = flag_values(&args, "--exclude");
            if excluded.is_empty() {
                excluded = default_excluded_schemas();
            }
            let result = introspect::introspect_uri(&uri, &excluded).await?;
            println!("{}", serde_json::to_string_pretty(&result)?);
        }
        other => bail!("unknown command '{}'\n\n{}", other, USAGE),
    }
    Ok(())
}
