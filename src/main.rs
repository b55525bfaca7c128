//! ragspace — multi-workspace retrieval server
//!
//! A single-process server hosting several isolated workspaces. Workspace
//! ids come from the environment at startup; every request names the
//! workspace it runs in.
//!
//! Usage:
//!   ragspace                                  # One workspace ("default"), port 9621
//!   ragspace --workspace docs                 # One workspace named "docs"
//!   WORKSPACES=docs,wiki,legal ragspace       # Three workspaces
//!   ragspace --port 8080 --working-dir /var/lib/ragspace

use std::fs::File;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::Context;
use clap::Parser;
use ragspace_server::{
    RagServer, StorageLayout, WorkspaceContext, WorkspaceRegistry, load_workspace_configs,
};
use ragspace_transport::{TransportConfig, TransportServer};
use tracing::info;
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(name = "ragspace", version, about = "Multi-workspace retrieval server")]
struct Cli {
    /// TCP port (0 picks a free one)
    #[arg(long, default_value_t = 9621)]
    port: u16,

    /// Interface or hostname to bind
    #[arg(long, default_value = "127.0.0.1")]
    hostname: String,

    /// Single workspace id (used when WORKSPACES is unset; overrides WORKSPACE)
    #[arg(long)]
    workspace: Option<String>,

    /// Root directory for per-workspace engine storage
    #[arg(long, default_value = "./rag_storage")]
    working_dir: PathBuf,

    /// Root directory for per-workspace input documents
    #[arg(long, default_value = "./inputs")]
    input_dir: PathBuf,

    /// Allow cross-origin requests
    #[arg(long)]
    cors: bool,

    /// Log at debug level unless RUST_LOG says otherwise
    #[arg(long, short)]
    verbose: bool,

    /// Append logs to this file instead of stderr
    #[arg(long, value_name = "PATH")]
    log_file: Option<PathBuf>,

    /// Emit logs as JSON lines
    #[arg(long)]
    log_json: bool,
}

fn init_tracing(cli: &Cli) -> anyhow::Result<()> {
    let level = if cli.verbose { "debug" } else { "info" };
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));
    let builder = tracing_subscriber::fmt().with_env_filter(filter);

    let Some(path) = &cli.log_file else {
        if cli.log_json {
            builder.json().init();
        } else {
            builder.init();
        }
        return Ok(());
    };

    if let Some(dir) = path.parent().filter(|dir| !dir.as_os_str().is_empty()) {
        std::fs::create_dir_all(dir)
            .with_context(|| format!("Failed to create log directory {}", dir.display()))?;
    }
    let file = File::options()
        .create(true)
        .append(true)
        .open(path)
        .with_context(|| format!("Failed to open log file {}", path.display()))?;

    let builder = builder.with_writer(Mutex::new(file)).with_ansi(false);
    if cli.log_json {
        builder.json().init();
    } else {
        builder.init();
    }
    eprintln!("Logging to {}", path.display());
    Ok(())
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();
    init_tracing(&cli)?;

    // Workspaces are derived fresh from the environment on every start
    let layout = StorageLayout::new(&cli.working_dir, &cli.input_dir);
    let configs = load_workspace_configs(cli.workspace.as_deref());

    let registry = Arc::new(WorkspaceRegistry::new());
    for config in configs {
        registry.register(WorkspaceContext::with_bundled_engines(config, &layout));
    }

    let server = Arc::new(RagServer::new(registry.clone()));
    server.initialize().await;

    let bind = TransportConfig {
        port: cli.port,
        hostname: cli.hostname.clone(),
        enable_cors: cli.cors,
    };
    let mut transport = TransportServer::start_with_handler(bind, server.clone())
        .await
        .with_context(|| format!("Failed to bind {}:{}", cli.hostname, cli.port))?;

    println!();
    println!("  ragspace running on http://{}", transport.local_addr());
    println!("  Storage:    {}", layout.working_dir.display());
    println!("  Inputs:     {}", layout.input_dir.display());
    println!("  Workspaces:");
    for summary in registry.summaries() {
        let status = match (&summary.error, summary.enabled) {
            (Some(err), _) => format!("unavailable ({err})"),
            (None, true) => "ready".to_string(),
            (None, false) => "disabled".to_string(),
        };
        println!("    {:<20} {status}", summary.id);
    }
    println!();
    println!("  Ctrl+C stops the server.");
    println!();

    tokio::signal::ctrl_c()
        .await
        .context("Failed to listen for Ctrl+C")?;

    info!("Shutdown signal received");
    transport.stop().await;
    server.shutdown().await;

    Ok(())
}
