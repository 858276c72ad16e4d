//! Print triggers: hand a prepared surface to the host's print pipeline and
//! resolve once printing has been handed off.

use std::time::Duration;

use async_trait::async_trait;
use futures::future::BoxFuture;
use thiserror::Error;
use tokio::sync::oneshot;
use tokio::time::{sleep, timeout};

use crate::config::PrintOptions;
use crate::surface::PrintSurface;

#[derive(Debug, Error)]
pub enum TriggerError {
    #[error("print host unavailable: {0}")]
    HostUnavailable(String),
    #[error("print surface is missing or empty")]
    MissingSurface,
    #[error("direct print callback failed: {0}")]
    Callback(String),
}

/// How an invocation resolved. Timeout and settle are degraded success: the
/// trigger was handed off but completion could not be observed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TriggerOutcome {
    /// The host's print-state signal confirmed completion.
    Signaled,
    /// The completion signal never fired within the hard bound.
    TimedOut,
    /// No signal available; resolved after the fixed settle delay.
    Settled,
    /// A caller-supplied direct-print callback ran to completion.
    Callback,
}

impl TriggerOutcome {
    /// Whether completion was actually observed rather than assumed.
    pub fn observed(self) -> bool {
        matches!(self, TriggerOutcome::Signaled | TriggerOutcome::Callback)
    }
}

/// Performs the printing side effect for one prepared surface.
///
/// Implementations only error for failures invoking the trigger itself; a
/// print the host cannot observe failing resolves normally.
#[async_trait]
pub trait PrintTrigger: Send + Sync {
    async fn invoke(&self, surface: &PrintSurface, automatic: bool) -> Result<TriggerOutcome, TriggerError>;
}

/// Host seam behind [`HostPrintTrigger`]: starts the native print action and
/// optionally returns a completion signal when the host can observe
/// print-state changes.
#[async_trait]
pub trait PrintHost: Send + Sync {
    async fn start_print(
        &self,
        surface: &PrintSurface,
    ) -> Result<Option<oneshot::Receiver<()>>, TriggerError>;
}

const DEFAULT_COMPLETION_TIMEOUT: Duration = Duration::from_secs(8);
const DEFAULT_SETTLE_DELAY: Duration = Duration::from_secs(3);

/// Default trigger: native print with a bounded completion wait so a stuck
/// host signal can never stall the job.
pub struct HostPrintTrigger {
    host: std::sync::Arc<dyn PrintHost>,
    completion_timeout: Duration,
    settle_delay: Duration,
}

impl HostPrintTrigger {
    pub fn new(host: std::sync::Arc<dyn PrintHost>) -> Self {
        Self::with_waits(host, DEFAULT_COMPLETION_TIMEOUT, DEFAULT_SETTLE_DELAY)
    }

    pub fn with_waits(
        host: std::sync::Arc<dyn PrintHost>,
        completion_timeout: Duration,
        settle_delay: Duration,
    ) -> Self {
        Self { host, completion_timeout, settle_delay }
    }

    /// Construct with the waits configured in [`PrintOptions`].
    pub fn from_options(host: std::sync::Arc<dyn PrintHost>, options: &PrintOptions) -> Self {
        Self::with_waits(host, options.completion_timeout(), options.settle_delay())
    }
}

#[async_trait]
impl PrintTrigger for HostPrintTrigger {
    async fn invoke(&self, surface: &PrintSurface, _automatic: bool) -> Result<TriggerOutcome, TriggerError> {
        if surface.page_count() == 0 {
            return Err(TriggerError::MissingSurface);
        }
        match self.host.start_print(surface).await? {
            Some(done) => match timeout(self.completion_timeout, done).await {
                Ok(Ok(())) => Ok(TriggerOutcome::Signaled),
                Ok(Err(_)) => {
                    tracing::debug!("print completion signal dropped without firing");
                    Ok(TriggerOutcome::TimedOut)
                }
                Err(_) => {
                    tracing::warn!(
                        "print completion signal did not fire within {:?}, continuing",
                        self.completion_timeout
                    );
                    Ok(TriggerOutcome::TimedOut)
                }
            },
            None => {
                sleep(self.settle_delay).await;
                Ok(TriggerOutcome::Settled)
            }
        }
    }
}

/// Caller-supplied direct-print function, boxed so the job loop can await it.
pub type DirectPrintCallback =
    Box<dyn Fn(&PrintSurface) -> BoxFuture<'static, Result<(), TriggerError>> + Send + Sync>;

/// Trigger that routes every batch through a caller-supplied callback
/// instead of the host's native print action.
pub struct CallbackTrigger {
    callback: DirectPrintCallback,
}

impl CallbackTrigger {
    pub fn new<F>(callback: F) -> Self
    where
        F: Fn(&PrintSurface) -> BoxFuture<'static, Result<(), TriggerError>> + Send + Sync + 'static,
    {
        Self { callback: Box::new(callback) }
    }
}

#[async_trait]
impl PrintTrigger for CallbackTrigger {
    async fn invoke(&self, surface: &PrintSurface, _automatic: bool) -> Result<TriggerOutcome, TriggerError> {
        if surface.page_count() == 0 {
            return Err(TriggerError::MissingSurface);
        }
        (self.callback)(surface).await?;
        Ok(TriggerOutcome::Callback)
    }
}
