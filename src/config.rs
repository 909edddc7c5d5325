// Runtime configuration, read from the environment (and .env, if present).

use crate::core::board::BoardSettings;
use std::str::FromStr;
use std::time::Duration;

const DEFAULT_DATABASE_PATH: &str = "data/board.db";
const DEFAULT_HYDRATION_TIMEOUT_SECS: u64 = 10;

/// Which BoardStore implementation to wire up.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Sqlite { database_path: String },
    Memory,
}

#[derive(Debug, Clone)]
pub struct AppConfig {
    pub storage: StorageBackend,
    pub board: BoardSettings,
}

impl AppConfig {
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let sqlite = || StorageBackend::Sqlite {
            database_path: lookup("BOARD_DATABASE_PATH")
                .unwrap_or_else(|| DEFAULT_DATABASE_PATH.to_string()),
        };
        let storage = match lookup("BOARD_STORAGE").as_deref() {
            Some("memory") => StorageBackend::Memory,
            Some("sqlite") | None => sqlite(),
            Some(other) => {
                tracing::warn!("Unknown BOARD_STORAGE {:?}, using sqlite", other);
                sqlite()
            }
        };

        let timeout_secs = parse_or(
            &lookup,
            "BOARD_HYDRATION_TIMEOUT_SECS",
            DEFAULT_HYDRATION_TIMEOUT_SECS,
        );
        let feed_limit = lookup("BOARD_FEED_LIMIT").and_then(|raw| match raw.parse::<usize>() {
            Ok(limit) => Some(limit),
            Err(_) => {
                tracing::warn!("Ignoring invalid BOARD_FEED_LIMIT {:?}", raw);
                None
            }
        });

        Self {
            storage,
            board: BoardSettings {
                hydration_timeout: Duration::from_secs(timeout_secs),
                feed_limit,
            },
        }
    }
}

/// Parse a variable, falling back to `default` when it is missing or malformed.
fn parse_or<T: FromStr>(lookup: &impl Fn(&str) -> Option<String>, key: &str, default: T) -> T {
    match lookup(key) {
        Some(raw) => raw.parse().unwrap_or_else(|_| {
            tracing::warn!("Invalid value {:?} for {}, using default", raw, key);
            default
        }),
        None => default,
    }
}
