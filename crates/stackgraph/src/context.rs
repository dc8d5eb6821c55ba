//! Provider and callback traits
//!
//! These traits let the executor run without depending on a specific cloud
//! API, progress UI, or confirmation prompt.

use crate::error::ApplyError;
use crate::resource::ResourceNode;
use crate::types::{Attributes, Outputs};
use std::fmt;

/// The external collaborator that creates or updates resources
///
/// Implementations must be idempotent under retry: applying the same node
/// twice with identical resolved attributes yields the same outputs or is a
/// no-op. `resolved` never contains references.
pub trait Provider: Send + Sync {
    fn apply(&self, node: &ResourceNode, resolved: &Attributes) -> Result<Outputs, ApplyError>;
}

/// Outcome of applying one node
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApplyResult {
    /// Outputs were recorded
    Applied { attempts: u32 },
    /// Apply failed (after retries, if retryable)
    Failed { error: String, attempts: u32 },
    /// Not attempted
    Skipped { reason: String },
}

impl ApplyResult {
    /// Check if the result represents success (no failure)
    pub fn is_success(&self) -> bool {
        !matches!(self, Self::Failed { .. })
    }
}

impl fmt::Display for ApplyResult {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Applied { attempts: 1 } => write!(f, "applied"),
            Self::Applied { attempts } => write!(f, "applied after {attempts} attempts"),
            Self::Failed { error, .. } => write!(f, "failed: {error}"),
            Self::Skipped { reason } => write!(f, "skipped: {reason}"),
        }
    }
}

/// Progress callback for execution operations
///
/// Implement this trait to receive progress updates during execution.
pub trait ProgressCallback: Send {
    /// Called when starting a batch (a plan layer, or a single node when
    /// running sequentially)
    fn on_batch_start(&mut self, index: usize, count: usize);

    /// Called when a node's result is known
    fn on_node_complete(&mut self, id: &str, result: &ApplyResult);

    /// Called when a batch completes
    fn on_batch_complete(&mut self);
}

/// Confirmation callback for user interaction
pub trait ConfirmCallback: Send {
    /// Ask the user to confirm an action
    fn confirm(&mut self, prompt: &str) -> bool;
}

/// Callback trait for retry notifications
pub trait RetryCallback {
    /// Called before sleeping ahead of another attempt
    ///
    /// `attempt` is the 1-indexed attempt that just failed.
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &ApplyError, delay_secs: f64);
}

/// No-op progress callback
pub struct NoProgress;

impl ProgressCallback for NoProgress {
    fn on_batch_start(&mut self, _index: usize, _count: usize) {}
    fn on_node_complete(&mut self, _id: &str, _result: &ApplyResult) {}
    fn on_batch_complete(&mut self) {}
}

/// Auto-confirm callback (always returns true)
pub struct AutoConfirm;

impl ConfirmCallback for AutoConfirm {
    fn confirm(&mut self, _prompt: &str) -> bool {
        true
    }
}

/// Auto-decline callback (always returns false)
pub struct AutoDecline;

impl ConfirmCallback for AutoDecline {
    fn confirm(&mut self, _prompt: &str) -> bool {
        false
    }
}

/// Retry callback that logs a warning per retry
pub struct LogRetry<'a> {
    pub node: &'a str,
}

impl RetryCallback for LogRetry<'_> {
    fn on_retry(&self, attempt: u32, max_attempts: u32, error: &ApplyError, delay_secs: f64) {
        log::warn!(
            "'{}' attempt {}/{} failed: {}. Retrying in {:.1}s...",
            self.node,
            attempt,
            max_attempts,
            error,
            delay_secs
        );
    }
}
