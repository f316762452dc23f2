use std::path::Path;

use arrrg::CommandLine;
use arrrg_derive::CommandLine;
use tokio::net::TcpListener;
use tokio::signal;
use tracing_subscriber::EnvFilter;

use ncmdb::{AppState, ServerConfig, cli_utils, create_router, db};

#[derive(CommandLine, Default, PartialEq, Eq)]
struct Args {
    #[arrrg(optional, "Path to a YAML configuration file")]
    config: Option<String>,
    #[arrrg(optional, "SQLite URL of the catalog database")]
    database_url: Option<String>,
    #[arrrg(optional, "Maximum number of pooled database connections")]
    max_connections: Option<u32>,
    #[arrrg(optional, "Host to bind the HTTP server")]
    host: Option<String>,
    #[arrrg(optional, "Port to bind the HTTP server")]
    port: Option<u16>,
    #[arrrg(flag, "Enable verbose logging")]
    verbose: bool,
}

const HELP_TEXT: &str = r#"ncmdbd - film and person catalog daemon

USAGE:
    ncmdbd [OPTIONS]

OPTIONS:
    --config <PATH>            YAML configuration file
    --database-url <URL>       SQLite URL of the catalog [default: sqlite://ncmdb.db]
    --max-connections <N>      Maximum pooled connections [default: 5]
    --host <HOST>              Host to bind the HTTP server [default: 127.0.0.1]
    --port <PORT>              Port to bind the HTTP server [default: 8080]
    --verbose                  Enable debug logging

DESCRIPTION:
    Serves the catalog under /api/v1/ and an HTML film list at /.
    Migrations are applied at startup.  Flags override the configuration
    file, and RUST_LOG overrides the log filter.

    The server supports graceful shutdown via Ctrl+C.

API ENDPOINTS:
    GET    /                        HTML list of films (accepts film filters)

    People:
      GET    /api/v1/people/        List people (filters, fields)
      POST   /api/v1/people/        Create a person
      GET    /api/v1/people/{id}/   Get a person (fields)
      PUT    /api/v1/people/{id}/   Update a person
      DELETE /api/v1/people/{id}/   Delete a person and their credits

    Films:
      GET    /api/v1/films/         List films (filters, fields)
      POST   /api/v1/films/         Create a film
      GET    /api/v1/films/{id}/    Get a film (fields)
      PUT    /api/v1/films/{id}/    Update a film
      DELETE /api/v1/films/{id}/    Delete a film and its credits"#;

#[tokio::main]
async fn main() -> Result<(), Box<dyn std::error::Error>> {
    let (args, free) = Args::from_command_line("USAGE: ncmdbd [OPTIONS]");

    if !free.is_empty() && free[0] == "help" {
        println!("{}", HELP_TEXT);
        return Ok(());
    }
    if !free.is_empty() {
        cli_utils::exit_with_usage_error(
            &format!("Unexpected arguments: {:?}", free),
            "USAGE: ncmdbd [OPTIONS] | ncmdbd help",
        );
    }

    let default_filter = if args.verbose {
        "ncmdb=debug,ncmdbd=debug"
    } else {
        "ncmdb=info,ncmdbd=info"
    };
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter)),
        )
        .init();

    let config = match &args.config {
        Some(path) => ServerConfig::load(Path::new(path))?,
        None => ServerConfig::default(),
    }
    .with_overrides(args.database_url, args.max_connections, args.host, args.port);
    tracing::debug!(?config, "configuration loaded");

    let pool = db::connect(&config.database_url, config.max_connections).await?;
    db::migrate(&pool).await?;
    tracing::info!(database_url = %config.database_url, "catalog ready");

    let state = AppState::new(pool.clone())
        .map_err(|e| format!("Failed to load templates: {}", e))?;
    let app = create_router(state);

    let addr = config.bind_address();
    let listener = TcpListener::bind(&addr)
        .await
        .map_err(|e| format!("Failed to bind to {}: {}", addr, e))?;
    tracing::info!(address = %addr, "listening");

    let server = axum::serve(listener, app);

    tokio::select! {
        result = server => {
            if let Err(e) = result {
                cli_utils::exit_with_error(&format!("Server error: {}", e));
            }
        }
        result = signal::ctrl_c() => {
            if let Err(e) = result {
                tracing::error!(error = %e, "could not listen for shutdown signal");
            }
            tracing::info!("shutdown signal received, stopping");
        }
    }

    pool.close().await;
    Ok(())
}
