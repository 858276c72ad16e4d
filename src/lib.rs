//! Batch print orchestrator.
//!
//! Printing thousands of page elements in a single pass can crash or freeze
//! a host's print pipeline. This crate splits large page sets into bounded
//! batches and drives the per-batch lifecycle — locate pages, prepare a
//! print surface, confirm, trigger, wait, advance — behind a
//! cancellation-safe, event-observable state machine. All host effects
//! (page lookup, surface rendering, the print call itself, user
//! confirmation) are injected capability traits, so the orchestrator runs
//! against any host, including the in-memory simulator in [`sim`].

pub mod config;
pub mod confirm;
pub mod error;
pub mod events;
pub mod job;
pub mod locator;
pub mod orchestrator;
pub mod planner;
pub mod sim;
pub mod surface;
pub mod trigger;

pub use config::{ConfigError, PrintOptions, load_options};
pub use confirm::{ConfirmationMode, ConfirmationProvider};
pub use error::PrintError;
pub use events::{EventBus, EventKind, PrintEvent, SubscriptionId};
pub use job::{JobState, JobStatus, PrintJob};
pub use locator::{PageHandle, PageLocator};
pub use orchestrator::{HostBindings, PrintOrchestrator, PrintOutcome};
pub use planner::{BatchPlan, BatchWindow, CapabilityClass, CapabilityProbe, plan};
pub use surface::{PrintSurface, SurfaceHost};
pub use trigger::{
    CallbackTrigger, HostPrintTrigger, PrintHost, PrintTrigger, TriggerError, TriggerOutcome,
};
