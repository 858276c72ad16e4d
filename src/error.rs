use thiserror::Error;

use crate::config::ConfigError;
use crate::trigger::TriggerError;

/// Failures surfaced by `print()`. Cooperative cancellation and declined
/// confirmations are not errors; they resolve the call with a
/// non-successful [`crate::orchestrator::PrintOutcome`].
#[derive(Debug, Error)]
pub enum PrintError {
    #[error("invalid argument: {0}")]
    InvalidArgument(String),
    #[error("a print job is already running")]
    AlreadyRunning,
    #[error("no pages matched selector '{selector}' in container '{container}'")]
    NoPagesFound { container: String, selector: String },
    #[error("failed to prepare print surface for batch {batch}: {reason}")]
    SurfacePreparation { batch: usize, reason: String },
    #[error("print trigger error: {0}")]
    Trigger(#[from] TriggerError),
    #[error("config error: {0}")]
    Config(#[from] ConfigError),
}
