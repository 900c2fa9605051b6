//! # draft-server
//!
//! Runs a single draft room over WebSockets with an in-memory store.
//! Connect with any WebSocket client and send JSON commands, e.g.
//!
//! ```text
//! {"type":"start_draft","pickOrder":[1,2,3],"totalRounds":5,"timerDuration":30}
//! {"type":"make_pick","userID":1,"playerID":17}
//! ```

use std::sync::Arc;

use anyhow::{Context, Result};
use clap::Parser;
use draftroom::prelude::*;
use tracing_subscriber::EnvFilter;

/// Live snake draft server.
#[derive(Parser, Debug)]
#[command(name = "draft-server", about = "Live snake draft server")]
struct Cli {
    /// Address to listen on.
    #[arg(long, env = "DRAFTROOM_BIND", default_value = "0.0.0.0:8080")]
    bind: String,

    /// Event the draft room is opened for.
    #[arg(long, env = "DRAFTROOM_EVENT_ID", default_value_t = 1)]
    event_id: u64,

    /// Number of draftable players, numbered 1..=N.
    #[arg(long, env = "DRAFTROOM_POOL_SIZE", default_value_t = 100)]
    pool_size: u64,

    /// Frames buffered per connection before it is dropped as too slow.
    #[arg(long, default_value_t = 256)]
    outbound_capacity: usize,
}

type Server = DraftServer<InMemoryStore, InMemoryStore>;

async fn build(cli: &Cli) -> Result<Server> {
    let store = Arc::new(InMemoryStore::new());
    let server = Server::builder()
        .bind(&cli.bind)
        .hub_config(HubConfig {
            outbound_capacity: cli.outbound_capacity,
        })
        .build(Arc::clone(&store), store)
        .await
        .with_context(|| format!("failed to bind {}", cli.bind))?;

    let pool = (1..=cli.pool_size).map(PlayerId).collect();
    server.service().create_room(EventId(cli.event_id), pool).await;
    Ok(server)
}

#[tokio::main]
async fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let cli = Cli::parse();
    let server = build(&cli).await?;
    let addr = server.local_addr()?;
    tracing::info!(
        %addr,
        event_id = cli.event_id,
        pool_size = cli.pool_size,
        "draft-server ready"
    );

    server.run().await?;
    Ok(())
}
