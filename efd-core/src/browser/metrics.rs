use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SessionMetrics {
    pub pages_opened: u64,
    pub navigation_failures: u64,
    pub waits_satisfied: u64,
    pub wait_timeouts: u64,
    pub poll_attempts: u64,
    pub settles: u64,
}

impl SessionMetrics {
    pub fn record_page_open(&mut self, success: bool) {
        if success {
            self.pages_opened = self.pages_opened.saturating_add(1);
        } else {
            self.navigation_failures = self.navigation_failures.saturating_add(1);
        }
    }

    pub fn record_wait(&mut self, satisfied: bool, polls: u64) {
        self.poll_attempts = self.poll_attempts.saturating_add(polls);
        if satisfied {
            self.waits_satisfied = self.waits_satisfied.saturating_add(1);
        } else {
            self.wait_timeouts = self.wait_timeouts.saturating_add(1);
        }
    }

    pub fn record_settle(&mut self) {
        self.settles = self.settles.saturating_add(1);
    }

    pub fn wait_success_rate(&self) -> f64 {
        let total = self.waits_satisfied + self.wait_timeouts;
        if total == 0 {
            0.0
        } else {
            (self.waits_satisfied as f64 / total as f64) * 100.0
        }
    }
}
