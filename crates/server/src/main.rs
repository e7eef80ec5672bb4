//! Headless arena server.
//!
//! Composition root that assembles one session in a single process:
//! 1. Content (templates, arena, session settings) via ContentFactory
//! 2. One coordinator and `mirrors` peers sharing a replication bus
//! 3. Scripted players that move around and shoot at agents
//!
//! # Examples
//!
//! ```bash
//! RUST_LOG=info,arena::replication=debug cargo run -p arena-server
//! ARENA_DURATION_SECS=10 ARENA_HANDOVER_SECS=5 cargo run -p arena-server
//! ```
mod config;
mod logging;
mod players;
mod session;

use anyhow::{Context, Result};

use arena_content::ContentFactory;

use crate::config::ServerConfig;
use crate::session::ArenaSession;

#[tokio::main]
async fn main() -> Result<()> {
    dotenvy::dotenv().ok();
    logging::setup_logging()?;

    let server = ServerConfig::from_env();
    let factory = ContentFactory::new(&server.data_dir);
    let mut bundle = factory
        .load_bundle()
        .with_context(|| format!("loading content from {}", factory.data_dir().display()))?;
    server.apply(&mut bundle.session);

    let session = ArenaSession::boot(bundle, &server).await?;
    let summary = session.run().await?;

    println!("{}", serde_json::to_string_pretty(&summary)?);
    tracing::info!("session shutdown complete");
    Ok(())
}
