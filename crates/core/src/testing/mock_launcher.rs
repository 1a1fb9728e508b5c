//! Mock feed-lane launcher for testing.

use std::sync::Mutex;

use crate::ledger::{FeedLauncher, LaunchRequest};

/// Mock implementation of the FeedLauncher trait.
///
/// Only records requests; tests report completions back to the machine with
/// `Machine::launch_completed` when they want a ball to reach the playfield.
#[derive(Debug, Default)]
pub struct MockLauncher {
    requests: Mutex<Vec<LaunchRequest>>,
}

impl MockLauncher {
    /// Create a new mock launcher.
    pub fn new() -> std::sync::Arc<Self> {
        std::sync::Arc::new(Self::default())
    }

    /// Get all recorded launch requests.
    pub fn requests(&self) -> Vec<LaunchRequest> {
        self.requests.lock().unwrap().clone()
    }

    /// Total balls requested across all launches.
    pub fn launched_balls(&self) -> u32 {
        self.requests.lock().unwrap().iter().map(|r| r.count).sum()
    }

    /// Clear recorded requests.
    pub fn clear(&self) {
        self.requests.lock().unwrap().clear();
    }
}

impl FeedLauncher for MockLauncher {
    fn launch(&self, request: LaunchRequest) {
        self.requests.lock().unwrap().push(request);
    }
}
