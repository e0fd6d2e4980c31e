//! Test utilities for templar
//!
//! Helpers shared by the unit tests and the integration suite (enabled there
//! through the `test-utils` feature):
//! - [`TemplateFixture`] - template hierarchies written into a temporary directory
//! - [`RecordingPipeline`] - a generation host that copies files and records every request
//! - [`init_test_logging`] - tracing output for tests
//!
//! # Example
//!
//! ```rust,no_run
//! use serde_json::json;
//! use templar_cli::test_utils::TemplateFixture;
//!
//! # fn example() -> anyhow::Result<()> {
//! let fixture = TemplateFixture::new()?;
//! fixture.template("core", json!({"license": "MIT"}))?;
//! fixture.template("app", json!({"name": "demo", "_bases": ["core"]}))?;
//!
//! let mut session = fixture.session("app")?;
//! session.prepare()?;
//! # Ok(())
//! # }
//! ```

pub mod fixtures;
pub mod pipeline;

pub use fixtures::TemplateFixture;
pub use pipeline::RecordingPipeline;

use std::sync::Once;
use tracing::Level;
use tracing_subscriber::EnvFilter;

static INIT_LOGGING: Once = Once::new();

/// Initialize logging for tests, once per process.
///
/// Uses `level` when given, `RUST_LOG` otherwise, and stays silent when
/// neither is set.
///
/// ```bash
/// RUST_LOG=templar_cli=debug cargo test
/// ```
pub fn init_test_logging(level: Option<Level>) {
    INIT_LOGGING.call_once(|| {
        let filter = if let Some(level) = level {
            EnvFilter::new(level.to_string())
        } else if std::env::var("RUST_LOG").is_ok() {
            EnvFilter::from_default_env()
        } else {
            return;
        };

        let _ = tracing_subscriber::fmt()
            .with_env_filter(filter)
            .with_test_writer()
            .with_target(true)
            .with_thread_ids(false)
            .try_init();
    });
}
