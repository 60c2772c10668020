//! Logging setup.

use once_cell::sync::OnceCell;
use serde::{Deserialize, Serialize};
use tracing_subscriber::EnvFilter;

const DEFAULT_LOG_TARGETS: [&str; 2] = ["stack_reconcile", "sreconcile"];

static INIT: OnceCell<()> = OnceCell::new();

/// LoggingConfig controls the log subscriber.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase", default)]
pub struct LoggingConfig {
    /// One of trace, debug, info, warn, error.
    pub level: String,
    /// Emit one JSON object per event instead of text.
    pub json: bool,
}

impl Default for LoggingConfig {
    fn default() -> Self {
        LoggingConfig {
            level: "info".to_string(),
            json: false,
        }
    }
}

fn filter_directives(level: &str) -> String {
    DEFAULT_LOG_TARGETS
        .iter()
        .map(|target| format!("{}={}", target, level))
        .collect::<Vec<_>>()
        .join(",")
}

/// Installs the global tracing subscriber. `RUST_LOG` takes precedence over
/// the configured level. Only the first call has any effect.
pub fn init_logging(config: &LoggingConfig) {
    INIT.get_or_init(|| {
        let filter = EnvFilter::try_from_default_env()
            .unwrap_or_else(|_| EnvFilter::new(filter_directives(&config.level)));

        let builder = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_writer(std::io::stderr)
            .with_target(true);

        let installed = if config.json {
            builder.json().flatten_event(true).try_init()
        } else {
            builder.try_init()
        };
        if let Err(e) = installed {
            eprintln!("Failed to install log subscriber: {}", e);
        }
    });
}
