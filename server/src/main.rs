use anyhow::{Context, Result};
use app_core::{AppConfig, CoreBuilder};
use db_postgres::PgDb;
use server::build_router;
use std::{env, sync::Arc};
use tracing::info;
use tracing_bunyan_formatter::{BunyanFormattingLayer, JsonStorageLayer};
use tracing_error::ErrorLayer;
use tracing_log::LogTracer;
use tracing_subscriber::{EnvFilter, Registry, prelude::*};
use url::Url;

fn init_tracing_bunyan(debug: bool) -> Result<()> {
    let default_directives = if debug {
        "debug,axum=debug"
    } else {
        "info,axum=info"
    };
    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_directives));

    // Name identifies the service in log streams
    let formatting_layer = BunyanFormattingLayer::new(
        "power-rankings".into(),
        std::io::stdout, // single sink: JSON to stdout; no other outputs supported
    );

    // Build a Bunyan-only subscriber:
    // - JsonStorageLayer: propagates span fields to child events
    // - BunyanFormattingLayer: strict Bunyan JSON output
    // - ErrorLayer: enrich errors with span context
    let subscriber = Registry::default()
        .with(env_filter)
        .with(JsonStorageLayer)
        .with(formatting_layer)
        .with(ErrorLayer::default());

    // Set as the single global subscriber (no fallback to fmt/console)
    tracing::subscriber::set_global_default(subscriber)?;
    Ok(())
}

#[tokio::main(flavor = "multi_thread")]
async fn main() -> Result<()> {
    // Load .env first if present; ignore if missing (Docker sets envs)
    let _ = dotenvy::dotenv();
    // map all log! calls in dependencies to tracing
    LogTracer::init()?;

    let mut args = env::args().skip(1);
    let port: u16 = args
        .next()
        .context("usage: server <port> <debug>")?
        .parse()
        .context("port must be a number")?;
    let debug = args
        .next()
        .map(|raw| raw.eq_ignore_ascii_case("true"))
        .unwrap_or(false);

    // Initialize tracing before constructing anything else.
    init_tracing_bunyan(debug)?;

    let config = AppConfig::from_env()?;
    let database_url =
        Url::parse(&config.database_url).context("DATABASE_URL must be a valid url")?;
    let db = PgDb::connect(database_url).await?;
    db.migrate_to_latest().await?;

    let core = CoreBuilder::new()
        .set_db(Arc::new(db))
        .set_config(config)
        .build();
    let app = build_router(Arc::new(core));

    let addr = format!("0.0.0.0:{port}");
    info!(%addr, "listening on http server");
    let listener = tokio::net::TcpListener::bind(&addr).await?;
    axum::serve(listener, app.into_make_service()).await?;
    Ok(())
}
