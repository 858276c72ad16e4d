//! The single active print job and its point-in-time status snapshot.

use serde::Serialize;
use uuid::Uuid;

use crate::planner::BatchPlan;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum JobState {
    Idle,
    Running,
    Completed,
    Cancelled,
    Failed,
}

impl JobState {
    pub fn is_terminal(self) -> bool {
        matches!(self, JobState::Completed | JobState::Cancelled | JobState::Failed)
    }
}

/// State of the one job an orchestrator instance may run at a time. Mutated
/// exclusively by the orchestrator's own batch loop; reset to the idle
/// defaults at the start of the next `print()` call or via `reset()`.
#[derive(Debug, Clone)]
pub struct PrintJob {
    pub id: Uuid,
    pub container: String,
    pub total_pages: usize,
    pub batch_size: usize,
    pub total_batches: usize,
    /// Number of fully completed batches; advances monotonically.
    pub current_batch: usize,
    /// Cumulative pages handed off; monotonically non-decreasing.
    pub printed_pages: usize,
    pub state: JobState,
}

impl Default for PrintJob {
    fn default() -> Self {
        Self {
            id: Uuid::nil(),
            container: String::new(),
            total_pages: 0,
            batch_size: 0,
            total_batches: 0,
            current_batch: 0,
            printed_pages: 0,
            state: JobState::Idle,
        }
    }
}

impl PrintJob {
    /// Fresh running job for a freshly computed plan.
    pub fn start(container: &str, plan: &BatchPlan) -> Self {
        Self {
            id: Uuid::new_v4(),
            container: container.to_string(),
            total_pages: plan.total_pages,
            batch_size: plan.batch_size,
            total_batches: plan.total_batches(),
            current_batch: 0,
            printed_pages: 0,
            state: JobState::Running,
        }
    }

    /// Rounded integer percentage of pages handed off.
    pub fn progress_percent(&self) -> u8 {
        if self.total_pages == 0 {
            return 0;
        }
        ((self.printed_pages as f64 / self.total_pages as f64) * 100.0).round() as u8
    }

    pub fn status(&self, is_printing: bool) -> JobStatus {
        JobStatus {
            total_pages: self.total_pages,
            total_batches: self.total_batches,
            current_batch: self.current_batch,
            printed_pages: self.printed_pages,
            is_printing,
            progress: self.progress_percent(),
            state: self.state,
        }
    }
}

/// Snapshot returned by `get_status()`, safe to take at any time.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct JobStatus {
    pub total_pages: usize,
    pub total_batches: usize,
    pub current_batch: usize,
    pub printed_pages: usize,
    pub is_printing: bool,
    pub progress: u8,
    pub state: JobState,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::planner::{CapabilityClass, plan};

    #[test]
    fn test_default_job_is_idle() {
        let job = PrintJob::default();
        assert_eq!(job.state, JobState::Idle);
        assert_eq!(job.printed_pages, 0);
        assert_eq!(job.progress_percent(), 0);
        let status = job.status(false);
        assert!(!status.is_printing);
        assert_eq!(status.progress, 0);
    }

    #[test]
    fn test_start_from_plan() {
        let plan = plan(250, Some(100), 100, CapabilityClass::Standard).unwrap();
        let job = PrintJob::start("report", &plan);
        assert_eq!(job.state, JobState::Running);
        assert_eq!(job.total_pages, 250);
        assert_eq!(job.batch_size, 100);
        assert_eq!(job.total_batches, 3);
        assert_ne!(job.id, Uuid::nil());
    }

    #[test]
    fn test_progress_percent_rounds() {
        let plan = plan(3, None, 100, CapabilityClass::Standard).unwrap();
        let mut job = PrintJob::start("c", &plan);
        job.printed_pages = 1;
        assert_eq!(job.progress_percent(), 33);
        job.printed_pages = 2;
        assert_eq!(job.progress_percent(), 67);
        job.printed_pages = 3;
        assert_eq!(job.progress_percent(), 100);
    }

    #[test]
    fn test_terminal_states() {
        assert!(!JobState::Idle.is_terminal());
        assert!(!JobState::Running.is_terminal());
        assert!(JobState::Completed.is_terminal());
        assert!(JobState::Cancelled.is_terminal());
        assert!(JobState::Failed.is_terminal());
    }
}
