//! Per-batch print surface: the prepared, print-visible representation of
//! one batch's pages.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::PrintError;
use crate::locator::PageHandle;
use crate::planner::BatchWindow;

/// Ephemeral surface for exactly one batch. Owned by the orchestrator for
/// the duration of that batch and handed back to the host for release on
/// every exit path; no two surfaces are ever live at once.
#[derive(Debug, Clone)]
pub struct PrintSurface {
    pub id: Uuid,
    /// 0-based index of the batch this surface was prepared for.
    pub batch_index: usize,
    pub pages: Vec<PageHandle>,
}

impl PrintSurface {
    pub fn new(batch_index: usize, pages: Vec<PageHandle>) -> Self {
        Self { id: Uuid::new_v4(), batch_index, pages }
    }

    pub fn page_count(&self) -> usize {
        self.pages.len()
    }
}

/// Host capability that materializes and tears down batch surfaces.
#[async_trait]
pub trait SurfaceHost: Send + Sync {
    /// Clone/render the window's pages into a printable surface.
    async fn prepare_surface(
        &self,
        window: &BatchWindow,
        pages: &[PageHandle],
    ) -> Result<PrintSurface, PrintError>;

    /// Tear the surface down. Best-effort: release failures are the host's
    /// to log, the batch loop never blocks on them.
    async fn release_surface(&self, surface: PrintSurface);
}
