//! # keystone-app: Keystone Workshop Back Office
//!
//! Configuration, shared state and the command layer that strings
//! `keystone-core` and `keystone-db` together. The `keystone` binary is a
//! thin CLI over these commands; an embedding UI can call them directly.
//!
//! ## Startup
//! ```text
//! init_tracing()
//!      │
//!      ▼
//! AppConfig::load(--config)     defaults < keystone.toml < KEYSTONE_* env
//!      │
//!      ▼
//! AppState::open(config)        create data dir, open pool, migrate
//!      │
//!      ▼
//! commands::*(&state, ...)      Result<T, ApiError>
//! ```

use tracing_subscriber::EnvFilter;

pub mod commands;
pub mod config;
pub mod error;
pub mod state;

pub use config::{AppConfig, ConfigError};
pub use error::{ApiError, ApiResult, ErrorCode};
pub use state::AppState;

/// Default log filter when `RUST_LOG` is unset.
pub const DEFAULT_LOG_FILTER: &str = "info,keystone=debug,sqlx=warn";

/// Initializes the tracing subscriber for logging.
///
/// Logs go to stderr so command output on stdout stays clean.
///
/// ## Log Levels
/// - `RUST_LOG=debug` - Show debug messages
/// - `RUST_LOG=keystone_db=trace` - Trace the database crate only
/// - Default: [`DEFAULT_LOG_FILTER`]
pub fn init_tracing() {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(DEFAULT_LOG_FILTER));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
