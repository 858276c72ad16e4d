//! Simulated host: in-memory implementations of every capability seam, used
//! by the demo binary and the integration tests.

use std::collections::{HashMap, HashSet, VecDeque};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use async_trait::async_trait;
use tokio::sync::oneshot;
use uuid::Uuid;

use crate::config::PrintOptions;
use crate::confirm::ConfirmationProvider;
use crate::error::PrintError;
use crate::locator::{PageHandle, PageLocator};
use crate::orchestrator::HostBindings;
use crate::planner::{BatchWindow, CapabilityClass, CapabilityProbe};
use crate::surface::{PrintSurface, SurfaceHost};
use crate::trigger::{HostPrintTrigger, PrintHost, TriggerError};

/// How the simulated host reports print completion.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SignalBehavior {
    /// Completion signal fires after the given delay.
    Fires(Duration),
    /// A signal exists but never fires; exercises the timeout bound.
    NeverFires,
    /// Host exposes no print-state signal; exercises the settle path.
    Unavailable,
}

/// In-memory host. Containers hold a fixed ordered page list; child
/// containers model one level of encapsulated sub-trees. Surface
/// prepare/release calls are counted so tests can assert that no two
/// surfaces are ever live at once.
pub struct SimHost {
    selector: String,
    pages: HashMap<String, Vec<PageHandle>>,
    children: HashMap<String, Vec<String>>,
    signal: SignalBehavior,
    fail_prepare_on_batch: Option<usize>,
    live: Mutex<HashSet<Uuid>>,
    max_live: AtomicUsize,
    prepared: AtomicUsize,
    released: AtomicUsize,
    invocations: AtomicUsize,
    pending_signals: Mutex<Vec<oneshot::Sender<()>>>,
}

impl SimHost {
    pub fn new() -> Self {
        Self {
            selector: ".print-page".to_string(),
            pages: HashMap::new(),
            children: HashMap::new(),
            signal: SignalBehavior::Fires(Duration::from_millis(1)),
            fail_prepare_on_batch: None,
            live: Mutex::new(HashSet::new()),
            max_live: AtomicUsize::new(0),
            prepared: AtomicUsize::new(0),
            released: AtomicUsize::new(0),
            invocations: AtomicUsize::new(0),
            pending_signals: Mutex::new(Vec::new()),
        }
    }

    /// Register a container holding `page_count` pages.
    pub fn with_container(mut self, name: &str, page_count: usize) -> Self {
        let pages = (0..page_count)
            .map(|i| PageHandle::new(format!("{}/page-{}", name, i)))
            .collect();
        self.pages.insert(name.to_string(), pages);
        self
    }

    /// Register a container nested one level below `parent`. Its pages are
    /// included when the parent is located.
    pub fn with_child_container(mut self, parent: &str, name: &str, page_count: usize) -> Self {
        self = self.with_container(name, page_count);
        self.children.entry(parent.to_string()).or_default().push(name.to_string());
        self
    }

    /// Selector the host's pages answer to (default `.print-page`).
    pub fn with_selector(mut self, selector: &str) -> Self {
        self.selector = selector.to_string();
        self
    }

    pub fn with_signal(mut self, signal: SignalBehavior) -> Self {
        self.signal = signal;
        self
    }

    /// Make surface preparation fail for the given 1-based batch number.
    pub fn fail_prepare_on_batch(mut self, batch: usize) -> Self {
        self.fail_prepare_on_batch = Some(batch);
        self
    }

    pub fn live_surfaces(&self) -> usize {
        self.live.lock().unwrap_or_else(|e| e.into_inner()).len()
    }

    /// Highest number of surfaces ever live at the same time.
    pub fn max_live_surfaces(&self) -> usize {
        self.max_live.load(Ordering::SeqCst)
    }

    pub fn prepared_count(&self) -> usize {
        self.prepared.load(Ordering::SeqCst)
    }

    pub fn released_count(&self) -> usize {
        self.released.load(Ordering::SeqCst)
    }

    pub fn print_invocations(&self) -> usize {
        self.invocations.load(Ordering::SeqCst)
    }
}

impl Default for SimHost {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl PageLocator for SimHost {
    async fn find_pages(&self, container: &str, selector: &str) -> Result<Vec<PageHandle>, PrintError> {
        if selector != self.selector {
            return Ok(Vec::new());
        }
        let mut pages = self.pages.get(container).cloned().unwrap_or_default();
        // One level of encapsulated sub-trees, in registration order.
        if let Some(children) = self.children.get(container) {
            for child in children {
                if let Some(child_pages) = self.pages.get(child) {
                    pages.extend(child_pages.iter().cloned());
                }
            }
        }
        Ok(pages)
    }
}

#[async_trait]
impl SurfaceHost for SimHost {
    async fn prepare_surface(
        &self,
        window: &BatchWindow,
        pages: &[PageHandle],
    ) -> Result<PrintSurface, PrintError> {
        let batch = window.index + 1;
        if self.fail_prepare_on_batch == Some(batch) {
            return Err(PrintError::SurfacePreparation {
                batch,
                reason: "simulated preparation failure".to_string(),
            });
        }
        let surface = PrintSurface::new(window.index, pages.to_vec());
        let live = {
            let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
            live.insert(surface.id);
            live.len()
        };
        self.max_live.fetch_max(live, Ordering::SeqCst);
        self.prepared.fetch_add(1, Ordering::SeqCst);
        Ok(surface)
    }

    async fn release_surface(&self, surface: PrintSurface) {
        let mut live = self.live.lock().unwrap_or_else(|e| e.into_inner());
        live.remove(&surface.id);
        self.released.fetch_add(1, Ordering::SeqCst);
    }
}

#[async_trait]
impl PrintHost for SimHost {
    async fn start_print(
        &self,
        _surface: &PrintSurface,
    ) -> Result<Option<oneshot::Receiver<()>>, TriggerError> {
        self.invocations.fetch_add(1, Ordering::SeqCst);
        match self.signal {
            SignalBehavior::Fires(delay) => {
                let (tx, rx) = oneshot::channel();
                tokio::spawn(async move {
                    tokio::time::sleep(delay).await;
                    let _ = tx.send(());
                });
                Ok(Some(rx))
            }
            SignalBehavior::NeverFires => {
                let (tx, rx) = oneshot::channel();
                // Keep the sender alive so the receiver waits out the bound.
                self.pending_signals.lock().unwrap_or_else(|e| e.into_inner()).push(tx);
                Ok(Some(rx))
            }
            SignalBehavior::Unavailable => Ok(None),
        }
    }
}

impl CapabilityProbe for SimHost {
    fn classify(&self) -> CapabilityClass {
        CapabilityClass::Standard
    }
}

/// Confirmation provider that always gives the same answer.
pub struct AutoConfirm(pub bool);

#[async_trait]
impl ConfirmationProvider for AutoConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}

/// Confirmation provider that replays a fixed sequence of answers, then
/// keeps answering `true`. Records the prompts it was asked.
pub struct ScriptedConfirm {
    answers: Mutex<VecDeque<bool>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedConfirm {
    pub fn new(answers: impl IntoIterator<Item = bool>) -> Self {
        Self {
            answers: Mutex::new(answers.into_iter().collect()),
            prompts: Mutex::new(Vec::new()),
        }
    }

    pub fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).clone()
    }
}

#[async_trait]
impl ConfirmationProvider for ScriptedConfirm {
    async fn confirm(&self, prompt: &str) -> bool {
        self.prompts.lock().unwrap_or_else(|e| e.into_inner()).push(prompt.to_string());
        self.answers
            .lock()
            .unwrap_or_else(|e| e.into_inner())
            .pop_front()
            .unwrap_or(true)
    }
}

/// Capability probe with a fixed answer.
pub struct FixedCapability(pub CapabilityClass);

impl CapabilityProbe for FixedCapability {
    fn classify(&self) -> CapabilityClass {
        self.0
    }
}

/// Wire a [`SimHost`] into a full set of bindings. The trigger's completion
/// and settle waits come from the options.
pub fn sim_bindings(
    host: Arc<SimHost>,
    confirmations: Arc<dyn ConfirmationProvider>,
    options: &PrintOptions,
) -> HostBindings {
    let trigger = HostPrintTrigger::from_options(host.clone(), options);
    HostBindings {
        locator: host.clone(),
        surfaces: host.clone(),
        trigger: Arc::new(trigger),
        confirmations,
        capability: host,
    }
}
