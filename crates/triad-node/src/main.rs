//! triad-node — the Triad module suite's node binary.
//!
//! Startup sequence:
//!   1. Open (or initialise) the state database
//!   2. Apply genesis if the DB is fresh
//!   3. Start the JSON-RPC introspection server
//!   4. Run the begin-block loop: `run_matching_block` on a fixed tick

use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Context;
use clap::Parser;
use tracing::{info, warn};

use triad_genesis::{apply_genesis, load_or_default_genesis_params, read_genesis_params};
use triad_precompile::{RpcServer, RpcServerState};
use triad_state::StateDb;

#[derive(Parser, Debug)]
#[command(
    name = "triad-node",
    version,
    about = "Triad node — fee sponsorship, ride-hail matching, and the end-to-end crypto envelope"
)]
struct Args {
    /// Directory for the persistent state database.
    #[arg(long, default_value = "~/.triad/data")]
    data_dir: PathBuf,

    /// JSON-RPC listen address.
    #[arg(long, default_value = "127.0.0.1:8645")]
    rpc_addr: SocketAddr,

    /// Path to genesis params JSON (only consulted on first run).
    #[arg(long)]
    genesis_params: Option<PathBuf>,

    /// Seconds between `run_matching_block` passes.
    #[arg(long, default_value_t = 2)]
    matching_interval_secs: u64,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "info,triad=debug".parse().unwrap()),
        )
        .init();

    let args = Args::parse();
    info!("Triad node starting");

    // ── State database ────────────────────────────────────────────────────────
    let data_dir = expand_tilde(&args.data_dir);
    std::fs::create_dir_all(&data_dir)
        .with_context(|| format!("creating data dir {}", data_dir.display()))?;

    let db = Arc::new(StateDb::open(&data_dir).context("opening state database")?);

    // ── Genesis if fresh ──────────────────────────────────────────────────────
    if read_genesis_params(&db).context("checking for existing genesis")?.is_none() {
        info!("fresh database — applying genesis");
        let params = load_or_default_genesis_params(args.genesis_params.as_deref())?;
        apply_genesis(&db, &params).context("applying genesis")?;
    } else {
        info!("existing database found — skipping genesis");
    }

    // ── RPC server ────────────────────────────────────────────────────────────
    let rpc_state = Arc::new(RpcServerState { db: Arc::clone(&db) });
    let _rpc_handle = RpcServer::new(rpc_state)
        .start(args.rpc_addr)
        .await
        .context("starting RPC server")?;

    // ── Begin-block loop: run the RideHail matching pass on a fixed tick ──────
    info!("node ready");
    let mut ticker = tokio::time::interval(Duration::from_secs(args.matching_interval_secs));
    loop {
        ticker.tick().await;
        let now = chrono::Utc::now().timestamp();
        match triad_precompile::dispatch::run_matching_block(&db, now) {
            Ok(events) if !events.is_empty() => info!(count = events.len(), "matching block produced events"),
            Ok(_) => {}
            Err(e) => warn!(error = %e, "matching block failed"),
        }
    }
}

/// Expand a leading `~` to the user's home directory (`HOME` or `USERPROFILE`).
fn expand_tilde(path: &Path) -> PathBuf {
    if let Ok(stripped) = path.strip_prefix("~") {
        if let Ok(home) = std::env::var("HOME").or_else(|_| std::env::var("USERPROFILE")) {
            return PathBuf::from(home).join(stripped);
        }
    }
    path.to_path_buf()
}
