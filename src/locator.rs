//! Page lookup capability: resolves the ordered set of printable pages
//! inside a container.

use async_trait::async_trait;
use serde::Serialize;

use crate::error::PrintError;

/// Opaque handle to one printable page element. The orchestrator never
/// inspects it; it is only carried through to the surface host.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize)]
pub struct PageHandle {
    pub id: String,
}

impl PageHandle {
    pub fn new(id: impl Into<String>) -> Self {
        Self { id: id.into() }
    }
}

/// Host capability that resolves page elements by selector.
///
/// Implementations must return pages in document order and traverse one
/// level of encapsulated sub-trees (shadow-boundary analogue) below the
/// container.
#[async_trait]
pub trait PageLocator: Send + Sync {
    async fn find_pages(&self, container: &str, selector: &str) -> Result<Vec<PageHandle>, PrintError>;
}
