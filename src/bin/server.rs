use std::{
    fs::OpenOptions,
    net::{IpAddr, SocketAddr},
    path::{Path, PathBuf},
    process::ExitCode,
    sync::Arc,
};

use axum::{
    Router,
    extract::{MatchedPath, Request},
};
use axum_server::Handle;
use clap::Parser;
use tower_http::trace::TraceLayer;
use tracing_subscriber::{EnvFilter, Layer, filter, layer::SubscriberExt, util::SubscriberInitExt};

use openfinance_rs::{AppState, build_router, graceful_shutdown, open_connection};

/// The REST API server for openfinance_rs.
#[derive(Parser, Debug)]
#[command(version, about, long_about = None)]
struct Args {
    /// File path to the application SQLite database.
    #[arg(long, env = "DATABASE_PATH")]
    db_path: PathBuf,

    /// The port to serve the API from.
    #[arg(short, long, env = "PORT", default_value_t = 3000)]
    port: u16,

    /// The address to listen on.
    #[arg(long, default_value = "127.0.0.1")]
    host: IpAddr,

    /// File path for the debug log.
    #[arg(long, default_value = "debug.log")]
    log_path: PathBuf,
}

#[tokio::main]
async fn main() -> ExitCode {
    let args = Args::parse();

    if let Err(error) = setup_logging(&args.log_path) {
        eprintln!("Could not set up logging: {error}");
        return ExitCode::FAILURE;
    }

    let connection = match open_connection(&args.db_path) {
        Ok(connection) => connection,
        Err(error) => {
            tracing::error!("Could not open database {}: {error}", args.db_path.display());
            return ExitCode::FAILURE;
        }
    };

    let state = match AppState::new(connection) {
        Ok(state) => state,
        Err(error) => {
            tracing::error!("Could not initialize database: {error}");
            return ExitCode::FAILURE;
        }
    };

    let addr = SocketAddr::new(args.host, args.port);
    let handle = Handle::new();
    tokio::spawn(graceful_shutdown(handle.clone()));

    let router = add_tracing_layer(build_router(state));

    tracing::info!("HTTP server listening on {}", addr);
    if let Err(error) = axum_server::bind(addr)
        .handle(handle)
        .serve(router.into_make_service())
        .await
    {
        tracing::error!("Server error: {error}");
        return ExitCode::FAILURE;
    }

    tracing::info!("Server shut down");
    ExitCode::SUCCESS
}

fn setup_logging(log_path: &Path) -> std::io::Result<()> {
    let stdout_log = tracing_subscriber::fmt::layer().pretty();

    let log_file = OpenOptions::new()
        .create(true)
        .append(true)
        .open(log_path)?;

    let debug_log = tracing_subscriber::fmt::layer()
        .pretty()
        .with_ansi(false)
        .with_writer(Arc::new(log_file));

    let env_filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("debug"));

    tracing_subscriber::registry()
        .with(env_filter)
        .with(
            stdout_log
                .with_filter(filter::LevelFilter::INFO)
                .and_then(debug_log)
                .with_filter(filter::LevelFilter::DEBUG),
        )
        .init();

    Ok(())
}

fn add_tracing_layer(router: Router) -> Router {
    let tracing_layer = TraceLayer::new_for_http()
        .make_span_with(|req: &Request| {
            let method = req.method();
            let uri = req.uri();

            let matched_path = req
                .extensions()
                .get::<MatchedPath>()
                .map(|matched_path| matched_path.as_str());

            tracing::debug_span!("request", %method, %uri, matched_path)
        })
        // Errors are logged by `Error::into_response`.
        .on_failure(());

    router.layer(tracing_layer)
}
