use std::path::PathBuf;
use std::sync::Arc;

use clap::Parser;
use oxhttp::Server;
use orbql_server::config::ServerConfig;
use orbql_server::{build_registry, handle_request, AppState};

/// orbql: a SPARQL endpoint backed by registered procedures instead of a static store.
#[derive(Parser)]
struct Args {
    /// Path to the TOML configuration file.
    #[arg(long, default_value = "orbql.toml")]
    config: PathBuf,
}

fn main() -> anyhow::Result<()> {
    let args = Args::parse();
    let config = if args.config.exists() {
        ServerConfig::from_file(&args.config)?
    } else {
        ServerConfig::default()
    };

    tracing_subscriber::fmt()
        .with_env_filter(if config.debug { "debug" } else { "info" })
        .init();

    std::fs::create_dir_all(&config.log_directory)?;
    let registry = build_registry(&config)?;
    let address = config.bind_address();
    let state = Arc::new(AppState { config, registry });

    tracing::info!(%address, "starting orbql server");
    let server = Server::new(move |request| handle_request(request, &state));
    server.bind(address).spawn()?.join()?;
    Ok(())
}
