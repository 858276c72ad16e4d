//! Confirmation gate: the yes/no decision point in front of each batch.

use async_trait::async_trait;

/// Host capability that asks the user a yes/no question.
#[async_trait]
pub trait ConfirmationProvider: Send + Sync {
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Gating strategy for one job.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ConfirmationMode {
    /// Never prompts; every batch proceeds.
    Automatic,
    /// Prompts before each batch; a decline cancels the job.
    Manual,
}

impl ConfirmationMode {
    /// Negotiate the mode for a whole job. `auto_mode` forces [`Automatic`];
    /// `confirm_each_batch` forces [`Manual`]; otherwise a single upfront
    /// prompt picks one for the run.
    ///
    /// [`Automatic`]: ConfirmationMode::Automatic
    /// [`Manual`]: ConfirmationMode::Manual
    pub async fn negotiate(
        auto_mode: bool,
        confirm_each_batch: bool,
        provider: &dyn ConfirmationProvider,
        total_batches: usize,
    ) -> ConfirmationMode {
        if auto_mode {
            return ConfirmationMode::Automatic;
        }
        if confirm_each_batch {
            return ConfirmationMode::Manual;
        }
        let prompt = format!(
            "Print all {} batches automatically without per-batch confirmation?",
            total_batches
        );
        if provider.confirm(&prompt).await {
            ConfirmationMode::Automatic
        } else {
            ConfirmationMode::Manual
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::sim::{AutoConfirm, ScriptedConfirm};

    #[tokio::test]
    async fn test_auto_mode_wins_without_prompting() {
        // A provider that would answer "no" is never consulted.
        let provider = AutoConfirm(false);
        let mode = ConfirmationMode::negotiate(true, true, &provider, 5).await;
        assert_eq!(mode, ConfirmationMode::Automatic);
    }

    #[tokio::test]
    async fn test_confirm_each_batch_forces_manual() {
        let provider = AutoConfirm(true);
        let mode = ConfirmationMode::negotiate(false, true, &provider, 5).await;
        assert_eq!(mode, ConfirmationMode::Manual);
    }

    #[tokio::test]
    async fn test_upfront_prompt_picks_mode() {
        let yes = ScriptedConfirm::new([true]);
        assert_eq!(
            ConfirmationMode::negotiate(false, false, &yes, 3).await,
            ConfirmationMode::Automatic
        );
        let no = ScriptedConfirm::new([false]);
        assert_eq!(
            ConfirmationMode::negotiate(false, false, &no, 3).await,
            ConfirmationMode::Manual
        );
    }
}
