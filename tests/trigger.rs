// Resolution-policy tests for the print triggers: completion signal,
// bounded timeout fallback, settle delay, and the direct callback path.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::{Duration, Instant};

use tokio_test::assert_ok;

use bulk_print::config::PrintOptions;
use bulk_print::locator::PageHandle;
use bulk_print::sim::{SignalBehavior, SimHost};
use bulk_print::surface::PrintSurface;
use bulk_print::trigger::{
    CallbackTrigger, HostPrintTrigger, PrintTrigger, TriggerError, TriggerOutcome,
};

fn surface(pages: usize) -> PrintSurface {
    let pages = (0..pages).map(|i| PageHandle::new(format!("page-{}", i))).collect();
    PrintSurface::new(0, pages)
}

#[tokio::test]
async fn resolves_signaled_when_host_signal_fires() {
    let host = Arc::new(SimHost::new().with_signal(SignalBehavior::Fires(Duration::from_millis(5))));
    let trigger =
        HostPrintTrigger::with_waits(host, Duration::from_secs(1), Duration::from_secs(1));
    let outcome = assert_ok!(trigger.invoke(&surface(3), true).await);
    assert_eq!(outcome, TriggerOutcome::Signaled);
}

#[tokio::test]
async fn resolves_timed_out_when_signal_never_fires() {
    let host = Arc::new(SimHost::new().with_signal(SignalBehavior::NeverFires));
    let trigger =
        HostPrintTrigger::with_waits(host, Duration::from_millis(30), Duration::from_secs(5));
    let started = Instant::now();
    let outcome = assert_ok!(trigger.invoke(&surface(3), true).await);
    assert_eq!(outcome, TriggerOutcome::TimedOut);
    // The hard bound resolved the wait; the settle delay never applied.
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn resolves_settled_when_host_has_no_signal() {
    let host = Arc::new(SimHost::new().with_signal(SignalBehavior::Unavailable));
    let trigger =
        HostPrintTrigger::with_waits(host, Duration::from_secs(5), Duration::from_millis(10));
    let started = Instant::now();
    let outcome = assert_ok!(trigger.invoke(&surface(3), true).await);
    assert_eq!(outcome, TriggerOutcome::Settled);
    assert!(started.elapsed() >= Duration::from_millis(10));
}

#[tokio::test]
async fn waits_come_from_the_configured_options() {
    let mut options = PrintOptions::default();
    options.settle_delay_ms = 10;
    let host = Arc::new(SimHost::new().with_signal(SignalBehavior::Unavailable));
    let trigger = HostPrintTrigger::from_options(host, &options);
    let started = Instant::now();
    let outcome = assert_ok!(trigger.invoke(&surface(3), true).await);
    assert_eq!(outcome, TriggerOutcome::Settled);
    assert!(started.elapsed() >= Duration::from_millis(10));
    // The 3s default settle delay would blow well past this bound.
    assert!(started.elapsed() < Duration::from_secs(1));
}

#[tokio::test]
async fn empty_surface_is_a_trigger_error() {
    let host = Arc::new(SimHost::new());
    let trigger = HostPrintTrigger::new(host.clone());
    let result = trigger.invoke(&surface(0), true).await;
    assert!(matches!(result, Err(TriggerError::MissingSurface)));
    assert_eq!(host.print_invocations(), 0, "the host print action was never reached");
}

#[tokio::test]
async fn callback_trigger_runs_callback_per_batch() {
    let calls = Arc::new(AtomicUsize::new(0));
    let trigger = {
        let calls = calls.clone();
        CallbackTrigger::new(move |_surface| {
            calls.fetch_add(1, Ordering::SeqCst);
            Box::pin(async { Ok(()) })
        })
    };
    let outcome = assert_ok!(trigger.invoke(&surface(3), false).await);
    assert_eq!(outcome, TriggerOutcome::Callback);
    assert!(outcome.observed());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn callback_failure_propagates() {
    let trigger = CallbackTrigger::new(|_surface| {
        Box::pin(async { Err(TriggerError::Callback("spooler offline".to_string())) })
    });
    let result = trigger.invoke(&surface(3), false).await;
    assert!(matches!(result, Err(TriggerError::Callback(_))));
}

#[test]
fn degraded_outcomes_are_not_observed() {
    assert!(TriggerOutcome::Signaled.observed());
    assert!(TriggerOutcome::Callback.observed());
    assert!(!TriggerOutcome::TimedOut.observed());
    assert!(!TriggerOutcome::Settled.observed());
}
