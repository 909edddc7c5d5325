// This is the entry point of the community board.
//
// **Architecture Overview:**
// - `core/` = Business logic (moderation gate, hydration, board service)
// - `infra/` = Implementations of core traits (SQLite, in-memory)
// - `console/` = Line-oriented front end that turns input into core calls
//
// This file's job is to:
// 1. Load configuration
// 2. Initialize services (dependency injection)
// 3. Hand control to the console

// These attrs point each module declaration at a more descriptive root file
// so we don't end up with several mod.rs files that all look the same.
#[path = "console/console_layer.rs"]
mod console;
#[path = "core/core_layer.rs"]
mod core;
#[path = "infra/infra_layer.rs"]
mod infra;

mod config;

use crate::config::{AppConfig, StorageBackend};
use crate::core::board::BoardService;
use crate::core::moderation::{ContentFilter, ModerationGate};
use crate::infra::board::{InMemoryBoardStore, SqliteBoardStore};
use std::sync::Arc;
use tracing_subscriber::EnvFilter;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Load environment variables from .env file (if it exists)
    dotenv::dotenv().ok();

    // Initialize logging so we can see what's happening
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    let config = AppConfig::from_env();

    // ========================================================================
    // DEPENDENCY INJECTION
    // ========================================================================
    // The lexicon is compiled once here and shared read-only by every request.

    let filter = ContentFilter::from_standard_lexicon()?;
    let gate = Arc::new(ModerationGate::new(filter));
    tracing::info!(entries = gate.lexicon_size(), "Content filter loaded");

    match config.storage {
        StorageBackend::Sqlite { database_path } => {
            let store = SqliteBoardStore::new(&database_path).await?;
            tracing::info!(path = %database_path, "Using SQLite board store");
            let board = BoardService::new(store, gate, config.board);
            console::run(&board).await
        }
        StorageBackend::Memory => {
            tracing::info!("Using in-memory board store");
            let board = BoardService::new(InMemoryBoardStore::new(), gate, config.board);
            console::run(&board).await
        }
    }
}
