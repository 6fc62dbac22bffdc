use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// Fraction of the daily cap at which usage is considered near the limit
pub const NEAR_LIMIT_RATIO: f64 = 0.9;

/// Snapshot of the daily request quota
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct RateLimitStatus {
    pub requests_used: u32,
    pub daily_cap: u32,
    /// Next UTC midnight
    pub reset_at: DateTime<Utc>,
}

impl RateLimitStatus {
    /// Usage is at or above 90% of the cap
    pub fn is_near_limit(&self) -> bool {
        f64::from(self.requests_used) >= f64::from(self.daily_cap) * NEAR_LIMIT_RATIO
    }

    pub fn is_over_limit(&self) -> bool {
        self.requests_used >= self.daily_cap
    }

    pub fn remaining(&self) -> u32 {
        self.daily_cap.saturating_sub(self.requests_used)
    }

    /// Whether `requests` more would stay within the cap
    pub fn can_afford(&self, requests: u32) -> bool {
        self.requests_used.saturating_add(requests) <= self.daily_cap
    }
}
