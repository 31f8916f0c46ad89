//! Driving-side confirmation prompt for destructive admin actions.

use async_trait::async_trait;

/// Asks the operator to confirm an action.
#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait Confirm: Send + Sync {
    /// `true` when the operator accepts `prompt`.
    async fn confirm(&self, prompt: &str) -> bool;
}

/// Confirmation that always answers the same way, for scripted runs.
#[derive(Debug, Clone, Copy)]
pub struct FixedConfirm(pub bool);

#[async_trait]
impl Confirm for FixedConfirm {
    async fn confirm(&self, _prompt: &str) -> bool {
        self.0
    }
}
