//! Batch planning: decides whether a page set is split at all, sizes the
//! batches, and lays out the contiguous page windows.

use serde::{Deserialize, Serialize};

use crate::error::PrintError;

/// Coarse classification of the host's print-handling capacity. Bounds the
/// batch-size heuristic only; it never decides whether to batch.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CapabilityClass {
    Extended,
    Standard,
    Constrained,
}

impl CapabilityClass {
    /// Largest batch the host class is trusted to render in one pass.
    pub fn max_safe_batch(self) -> usize {
        match self {
            CapabilityClass::Extended => 150,
            CapabilityClass::Standard => 100,
            CapabilityClass::Constrained => 50,
        }
    }
}

/// Host capability detector, consulted once per job.
pub trait CapabilityProbe: Send + Sync {
    fn classify(&self) -> CapabilityClass;
}

/// One batch's page window: pages `[start, start + count)`, 0-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct BatchWindow {
    pub index: usize,
    pub start: usize,
    pub count: usize,
}

/// Immutable per-job plan. Windows partition `[0, total_pages)` with no
/// gaps or overlaps.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct BatchPlan {
    pub total_pages: usize,
    pub batch_size: usize,
    pub windows: Vec<BatchWindow>,
    /// True when the whole set prints as one batch (direct path).
    pub single_pass: bool,
}

impl BatchPlan {
    pub fn total_batches(&self) -> usize {
        self.windows.len()
    }
}

const MIN_TARGET_BATCHES: usize = 5;
const MAX_TARGET_BATCHES: usize = 15;
const MIN_SAFE_BATCH: usize = 20;
const PAGES_PER_TARGET_BATCH: usize = 100;

/// Compute the plan for a job.
///
/// At or below `batch_threshold` the plan is a single window covering all
/// pages. Above it, an explicit `requested_batch_size` wins; otherwise the
/// size is derived heuristically and clamped to what the host class can
/// safely take. Deterministic for fixed inputs.
pub fn plan(
    total_pages: usize,
    requested_batch_size: Option<usize>,
    batch_threshold: usize,
    capability: CapabilityClass,
) -> Result<BatchPlan, PrintError> {
    if total_pages < 1 {
        return Err(PrintError::InvalidArgument("total_pages must be >= 1".to_string()));
    }
    if requested_batch_size == Some(0) {
        return Err(PrintError::InvalidArgument("batch_size must be >= 1".to_string()));
    }

    let batch_size = if total_pages <= batch_threshold {
        total_pages
    } else {
        requested_batch_size.unwrap_or_else(|| heuristic_batch_size(total_pages, capability))
    };

    let mut windows = Vec::with_capacity(total_pages.div_ceil(batch_size));
    let mut start = 0;
    while start < total_pages {
        let count = batch_size.min(total_pages - start);
        windows.push(BatchWindow { index: windows.len(), start, count });
        start += count;
    }

    let single_pass = windows.len() == 1;
    Ok(BatchPlan { total_pages, batch_size, windows, single_pass })
}

/// Derive a batch size from the page count: aim for a bounded batch count,
/// then clamp the resulting size into the host's safe range.
fn heuristic_batch_size(total_pages: usize, capability: CapabilityClass) -> usize {
    let target_batches = total_pages
        .div_ceil(PAGES_PER_TARGET_BATCH)
        .clamp(MIN_TARGET_BATCHES, MAX_TARGET_BATCHES);
    let size = total_pages.div_ceil(target_batches);
    size.clamp(MIN_SAFE_BATCH, capability.max_safe_batch())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn assert_partition(plan: &BatchPlan) {
        let mut expected_start = 0;
        for window in &plan.windows {
            assert_eq!(window.start, expected_start, "windows must be contiguous");
            assert!(window.count >= 1, "no empty windows");
            assert!(window.count <= plan.batch_size);
            expected_start += window.count;
        }
        assert_eq!(expected_start, plan.total_pages, "windows must cover all pages");
    }

    #[test]
    fn test_rejects_zero_pages() {
        let result = plan(0, None, 100, CapabilityClass::Standard);
        assert!(matches!(result, Err(PrintError::InvalidArgument(_))));
    }

    #[test]
    fn test_rejects_zero_batch_size() {
        let result = plan(500, Some(0), 100, CapabilityClass::Standard);
        assert!(matches!(result, Err(PrintError::InvalidArgument(_))));
    }

    #[test]
    fn test_at_or_below_threshold_is_single_pass() {
        for total in [1, 50, 100] {
            let plan = plan(total, Some(10), 100, CapabilityClass::Standard).unwrap();
            assert!(plan.single_pass);
            assert_eq!(plan.windows.len(), 1);
            assert_eq!(plan.windows[0].start, 0);
            assert_eq!(plan.windows[0].count, total);
            assert_partition(&plan);
        }
    }

    #[test]
    fn test_explicit_batch_size_partition() {
        let plan = plan(250, Some(100), 100, CapabilityClass::Standard).unwrap();
        assert!(!plan.single_pass);
        assert_eq!(plan.windows.len(), 3);
        assert_eq!((plan.windows[0].start, plan.windows[0].count), (0, 100));
        assert_eq!((plan.windows[1].start, plan.windows[1].count), (100, 100));
        assert_eq!((plan.windows[2].start, plan.windows[2].count), (200, 50));
        assert_partition(&plan);
    }

    #[test]
    fn test_partition_property_across_inputs() {
        for total in [101, 137, 250, 999, 1000, 4567, 20_000] {
            for size in [None, Some(1), Some(7), Some(100), Some(400)] {
                let plan = plan(total, size, 100, CapabilityClass::Standard).unwrap();
                assert_partition(&plan);
                let sum: usize = plan.windows.iter().map(|w| w.count).sum();
                assert_eq!(sum, total);
            }
        }
    }

    #[test]
    fn test_heuristic_respects_capability_bounds() {
        // Large job: the heuristic lands on the class's safe ceiling.
        let extended = plan(10_000, None, 100, CapabilityClass::Extended).unwrap();
        assert_eq!(extended.batch_size, 150);
        let standard = plan(10_000, None, 100, CapabilityClass::Standard).unwrap();
        assert_eq!(standard.batch_size, 100);
        let constrained = plan(10_000, None, 100, CapabilityClass::Constrained).unwrap();
        assert_eq!(constrained.batch_size, 50);

        // Small job just above threshold: floor keeps batches from shrinking
        // below the minimum worth splitting for.
        let small = plan(120, None, 100, CapabilityClass::Standard).unwrap();
        assert!(small.batch_size >= 20);
        assert_partition(&small);
    }

    #[test]
    fn test_heuristic_targets_bounded_batch_count() {
        // 1000 pages -> target 10 batches -> size 100.
        let plan = plan(1000, None, 100, CapabilityClass::Standard).unwrap();
        assert_eq!(plan.batch_size, 100);
        assert_eq!(plan.windows.len(), 10);
    }

    #[test]
    fn test_deterministic() {
        let a = plan(4321, None, 100, CapabilityClass::Standard).unwrap();
        let b = plan(4321, None, 100, CapabilityClass::Standard).unwrap();
        assert_eq!(a, b);
    }
}
