//! The batch print orchestrator: owns the job state machine, iterates
//! batches, emits lifecycle events, and applies confirmation/cancellation
//! gating.
//!
//! One orchestrator instance runs at most one job at a time. All host
//! effects go through the injected capability seams in [`HostBindings`], so
//! the state machine itself is host-independent.

use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use chrono::Utc;
use serde::Serialize;
use tokio::sync::RwLock;
use tokio::time::sleep;

use crate::config::PrintOptions;
use crate::confirm::{ConfirmationMode, ConfirmationProvider};
use crate::error::PrintError;
use crate::events::{
    BatchStartEvent, CancelEvent, ErrorEvent, EventBus, EventKind, FinishEvent, FinishStatus,
    PrintEvent, PrintMode, ProgressEvent, ProgressStatus, StoppedEvent, SubscriptionId,
};
use crate::job::{JobState, JobStatus, PrintJob};
use crate::locator::PageLocator;
use crate::planner::{self, BatchPlan, CapabilityProbe};
use crate::surface::SurfaceHost;
use crate::trigger::{PrintTrigger, TriggerOutcome};

/// Injected host capabilities the orchestrator drives.
#[derive(Clone)]
pub struct HostBindings {
    pub locator: Arc<dyn PageLocator>,
    pub surfaces: Arc<dyn SurfaceHost>,
    pub trigger: Arc<dyn PrintTrigger>,
    pub confirmations: Arc<dyn ConfirmationProvider>,
    pub capability: Arc<dyn CapabilityProbe>,
}

/// Resolution of one `print()` call. `success` is false for cancelled or
/// declined jobs; `printed_pages` reflects partial progress in that case.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PrintOutcome {
    pub success: bool,
    pub printed_pages: usize,
}

pub struct PrintOrchestrator {
    options: PrintOptions,
    bindings: HostBindings,
    events: Arc<EventBus>,
    job: Arc<RwLock<PrintJob>>,
    /// Single-job claim; a second `print()` fails fast while this is set.
    printing: AtomicBool,
    /// Cooperative cancellation flag, observed at batch boundaries only.
    cancel_requested: AtomicBool,
}

impl PrintOrchestrator {
    pub fn new(options: PrintOptions, bindings: HostBindings) -> Result<Self, PrintError> {
        options.validate()?;
        Ok(Self {
            options,
            bindings,
            events: Arc::new(EventBus::new()),
            job: Arc::new(RwLock::new(PrintJob::default())),
            printing: AtomicBool::new(false),
            cancel_requested: AtomicBool::new(false),
        })
    }

    pub fn options(&self) -> &PrintOptions {
        &self.options
    }

    pub fn events(&self) -> Arc<EventBus> {
        self.events.clone()
    }

    /// Subscribe a lifecycle event handler.
    pub fn on<F>(&self, kind: EventKind, handler: F) -> SubscriptionId
    where
        F: Fn(&PrintEvent) + Send + Sync + 'static,
    {
        self.events.on(kind, handler)
    }

    /// Remove one handler, or all handlers for the kind when `id` is `None`.
    pub fn off(&self, kind: EventKind, id: Option<SubscriptionId>) {
        self.events.off(kind, id);
    }

    /// Point-in-time snapshot, safe to call at any time.
    pub async fn get_status(&self) -> JobStatus {
        let job = self.job.read().await;
        job.status(self.printing.load(Ordering::Acquire))
    }

    /// Request cooperative cancellation. The loop observes the flag at the
    /// next batch boundary; an in-flight trigger invocation is never
    /// interrupted. Returns whether a job was actually running.
    pub fn stop(&self) -> bool {
        let was_printing = self.printing.load(Ordering::Acquire);
        if was_printing {
            self.cancel_requested.store(true, Ordering::Release);
            tracing::info!("stop requested, job will halt at the next batch boundary");
        }
        was_printing
    }

    /// Alias for [`stop`](Self::stop).
    pub fn cancel(&self) -> bool {
        self.stop()
    }

    /// Force the state back to idle. Only meaningful between jobs; ignored
    /// while a job is running.
    pub async fn reset(&self) {
        let mut job = self.job.write().await;
        if !job.state.is_terminal() && job.state != JobState::Idle {
            tracing::warn!("reset ignored while a job is running");
            return;
        }
        *job = PrintJob::default();
        self.cancel_requested.store(false, Ordering::Release);
    }

    /// Start a job with the orchestrator's configured options.
    pub async fn print(&self, container: &str, total_pages: usize) -> Result<PrintOutcome, PrintError> {
        self.print_with(container, total_pages, None).await
    }

    /// Start a job, optionally overriding the configured options for this
    /// call only. Rejects if a job is already active or arguments are
    /// invalid; validation failures leave the state idle and emit nothing.
    pub async fn print_with(
        &self,
        container: &str,
        total_pages: usize,
        overrides: Option<PrintOptions>,
    ) -> Result<PrintOutcome, PrintError> {
        // Claim the single-job slot before anything else: a print() during
        // an active job always reports AlreadyRunning, even when its own
        // arguments are bad. The active job is never touched.
        if self
            .printing
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .is_err()
        {
            return Err(PrintError::AlreadyRunning);
        }
        self.cancel_requested.store(false, Ordering::Release);

        let result = self.check_and_run(container, total_pages, overrides).await;
        self.printing.store(false, Ordering::Release);
        result
    }

    async fn check_and_run(
        &self,
        container: &str,
        total_pages: usize,
        overrides: Option<PrintOptions>,
    ) -> Result<PrintOutcome, PrintError> {
        let options = match overrides {
            Some(options) => {
                options.validate()?;
                options
            }
            None => self.options.clone(),
        };
        if container.trim().is_empty() {
            return Err(PrintError::InvalidArgument("container must not be empty".to_string()));
        }
        if total_pages < 1 {
            return Err(PrintError::InvalidArgument("total_pages must be >= 1".to_string()));
        }
        self.run(container, total_pages, &options).await
    }

    async fn run(
        &self,
        container: &str,
        total_pages: usize,
        options: &PrintOptions,
    ) -> Result<PrintOutcome, PrintError> {
        // Pre-flight, still idle: page lookup and planning failures reject
        // the call without entering the running state or emitting events.
        let pages = self
            .bindings
            .locator
            .find_pages(container, &options.page_selector)
            .await?;
        if pages.is_empty() {
            return Err(PrintError::NoPagesFound {
                container: container.to_string(),
                selector: options.page_selector.clone(),
            });
        }

        let capability = self.bindings.capability.classify();
        let plan = planner::plan(total_pages, options.batch_size, options.batch_threshold, capability)?;

        {
            let mut job = self.job.write().await;
            *job = PrintJob::start(container, &plan);
        }
        tracing::info!(
            "bulk print started: {} pages, {} per batch, {} batches",
            plan.total_pages,
            plan.batch_size,
            plan.total_batches()
        );

        // Negotiate the gate once per job; the direct path never prompts.
        let mode = if plan.single_pass {
            ConfirmationMode::Automatic
        } else {
            ConfirmationMode::negotiate(
                options.auto_mode,
                options.confirm_each_batch,
                self.bindings.confirmations.as_ref(),
                plan.total_batches(),
            )
            .await
        };

        match self.drive_batches(container, options, &plan, mode).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                {
                    let mut job = self.job.write().await;
                    job.state = JobState::Failed;
                }
                tracing::error!("print job failed: {}", e);
                self.events.emit(PrintEvent::Error(ErrorEvent {
                    message: e.to_string(),
                    emitted_at: Utc::now(),
                }));
                Err(e)
            }
        }
    }

    async fn drive_batches(
        &self,
        container: &str,
        options: &PrintOptions,
        plan: &BatchPlan,
        mode: ConfirmationMode,
    ) -> Result<PrintOutcome, PrintError> {
        let total_batches = plan.total_batches();
        let mut last_outcome = TriggerOutcome::Settled;

        for window in &plan.windows {
            if self.cancel_requested.load(Ordering::Acquire) {
                return Ok(self.finish_stopped().await);
            }

            let batch = window.index + 1;

            // (a) resolve pages; the page set may have changed since the
            // last batch.
            let pages = self
                .bindings
                .locator
                .find_pages(container, &options.page_selector)
                .await?;
            if window.start >= pages.len() {
                return Err(PrintError::NoPagesFound {
                    container: container.to_string(),
                    selector: options.page_selector.clone(),
                });
            }
            let end = (window.start + window.count).min(pages.len());
            let batch_pages = &pages[window.start..end];

            // (b) prepare the batch surface.
            let surface = self.bindings.surfaces.prepare_surface(window, batch_pages).await?;

            // (c) announce the batch.
            self.events.emit(PrintEvent::BatchStart(BatchStartEvent {
                batch,
                total_batches,
                start_page: window.start + 1,
                pages_in_batch: window.count,
                emitted_at: Utc::now(),
            }));
            tracing::info!("printing batch {}/{} ({} pages)", batch, total_batches, window.count);

            // (d) per-batch gate. A decline is a cancelled outcome, not an
            // error.
            if mode == ConfirmationMode::Manual {
                let prompt = format!(
                    "Print batch {} of {} ({} pages)?",
                    batch, total_batches, window.count
                );
                if !self.bindings.confirmations.confirm(&prompt).await {
                    self.bindings.surfaces.release_surface(surface).await;
                    return Ok(self.finish_declined(batch).await);
                }
            }

            // (e) hand the surface to the print trigger.
            let automatic = mode == ConfirmationMode::Automatic;
            match self.bindings.trigger.invoke(&surface, automatic).await {
                Ok(outcome) => last_outcome = outcome,
                Err(e) => {
                    self.bindings.surfaces.release_surface(surface).await;
                    return Err(e.into());
                }
            }

            // (f) advance counters and report progress.
            let progress = {
                let mut job = self.job.write().await;
                job.printed_pages += window.count;
                job.current_batch = batch;
                ProgressEvent {
                    progress: job.progress_percent(),
                    printed_pages: job.printed_pages,
                    total_pages: job.total_pages,
                    current_batch: job.current_batch,
                    total_batches: job.total_batches,
                    status: if job.printed_pages == job.total_pages {
                        ProgressStatus::Queued
                    } else {
                        ProgressStatus::Processing
                    },
                    emitted_at: Utc::now(),
                }
            };
            self.events.emit(PrintEvent::Progress(progress));

            // (g) the surface never outlives its batch.
            self.bindings.surfaces.release_surface(surface).await;

            // (h) give the host pipeline room to drain before the next
            // batch; the cancellation flag is re-checked at the loop top.
            let is_last = window.index + 1 == total_batches;
            if !is_last && !plan.single_pass && options.delay_between_batches_ms > 0 {
                tracing::debug!("waiting {}ms before next batch", options.delay_between_batches_ms);
                sleep(options.delay_between_batches()).await;
            }
        }

        let printed_pages = {
            let mut job = self.job.write().await;
            job.state = JobState::Completed;
            job.printed_pages
        };
        let mode = if plan.single_pass { PrintMode::Single } else { PrintMode::Batched };
        let status = if last_outcome.observed() { FinishStatus::Done } else { FinishStatus::Queued };
        self.events.emit(PrintEvent::Finish(FinishEvent {
            status,
            total_pages: plan.total_pages,
            printed_pages,
            total_batches,
            mode,
            emitted_at: Utc::now(),
        }));
        tracing::info!("bulk print finished: {} pages in {} batches", printed_pages, total_batches);
        Ok(PrintOutcome { success: true, printed_pages })
    }

    /// Cooperative stop observed at a batch boundary.
    async fn finish_stopped(&self) -> PrintOutcome {
        let (printed_pages, total_pages, current_batch) = {
            let mut job = self.job.write().await;
            job.state = JobState::Cancelled;
            (job.printed_pages, job.total_pages, job.current_batch)
        };
        self.events.emit(PrintEvent::Stopped(StoppedEvent {
            printed_pages,
            total_pages,
            current_batch,
            emitted_at: Utc::now(),
        }));
        tracing::info!(
            "bulk print stopped after batch {} ({}/{} pages)",
            current_batch,
            printed_pages,
            total_pages
        );
        PrintOutcome { success: false, printed_pages }
    }

    /// Confirmation declined for `batch` (1-based).
    async fn finish_declined(&self, batch: usize) -> PrintOutcome {
        let printed_pages = {
            let mut job = self.job.write().await;
            job.state = JobState::Cancelled;
            job.printed_pages
        };
        self.events.emit(PrintEvent::Cancel(CancelEvent { batch, emitted_at: Utc::now() }));
        tracing::info!("bulk print cancelled: batch {} declined", batch);
        PrintOutcome { success: false, printed_pages }
    }
}
