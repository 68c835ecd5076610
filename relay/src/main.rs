use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use relay::proxy::upstream::TmdbClient;
use relay::store::memory::MemoryStore;
use relay::store::postgres::PgStore;
use relay::store::MovieStore;
use relay::{api, cli, config, AppState};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cfg = config::load()?;
    init_tracing()?;

    let args = cli::Cli::parse();

    let result = match args.command {
        Some(cli::Commands::Serve { port, ephemeral }) => {
            let port = port.unwrap_or(cfg.port);
            run_server(cfg, port, ephemeral).await
        }
        Some(cli::Commands::Migrate) => {
            let db = PgStore::connect(&cfg.database_url).await?;
            db.migrate().await?;
            println!("Migrations applied.");
            Ok(())
        }
        None => {
            let port = cfg.port;
            run_server(cfg, port, false).await
        }
    };

    if let Err(ref e) = result {
        eprintln!("Error: {:?}", e);
    }
    result
}

fn init_tracing() -> anyhow::Result<()> {
    // OTLP export is opt-in via OTEL_EXPORTER_OTLP_ENDPOINT.
    use opentelemetry::KeyValue;
    use opentelemetry_sdk::{trace as sdktrace, Resource};

    let telemetry_layer = if std::env::var("OTEL_EXPORTER_OTLP_ENDPOINT").is_ok() {
        let tracer = opentelemetry_otlp::new_pipeline()
            .tracing()
            .with_exporter(opentelemetry_otlp::new_exporter().tonic())
            .with_trace_config(sdktrace::config().with_resource(Resource::new(vec![
                KeyValue::new("service.name", "movie-relay"),
            ])))
            .install_batch(opentelemetry_sdk::runtime::Tokio)
            .context("failed to install OpenTelemetry tracer")?;
        Some(tracing_opentelemetry::layer().with_tracer(tracer))
    } else {
        None
    };

    let json = std::env::var("RELAY_LOG_FORMAT").is_ok_and(|v| v.eq_ignore_ascii_case("json"));

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "relay=debug,tower_http=debug".into()),
        ))
        .with(json.then(|| tracing_subscriber::fmt::layer().json()))
        .with((!json).then(|| tracing_subscriber::fmt::layer()))
        .with(telemetry_layer)
        .init();

    Ok(())
}

async fn run_server(cfg: config::Config, port: u16, ephemeral: bool) -> anyhow::Result<()> {
    let movies: Box<dyn MovieStore> = if ephemeral {
        tracing::warn!("Running with the in-memory movie store; records are lost on exit");
        Box::new(MemoryStore::new())
    } else {
        tracing::info!("Connecting to database...");
        let db = PgStore::connect(&cfg.database_url)
            .await
            .context("failed to connect to the movie database")?;

        tracing::info!("Running migrations...");
        db.migrate().await?;
        Box::new(db)
    };

    let tmdb = TmdbClient::new(&cfg.tmdb)?;

    let state = Arc::new(AppState { movies, tmdb });
    let app = api::app(state);

    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!("Movie relay listening on {}", addr);
    axum::serve(listener, app).await?;

    Ok(())
}
