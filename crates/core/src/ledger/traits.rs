//! Trait definitions for the ledger's collaborators.

use super::types::LaunchRequest;

/// The feed-lane launch service.
///
/// Launches complete asynchronously and in request order; the host reports
/// each physical completion back through `Machine::launch_completed`.
pub trait FeedLauncher: Send + Sync {
    fn launch(&self, request: LaunchRequest);
}
