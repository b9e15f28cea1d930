// Per-user daily limits for placement requests.

use std::collections::HashMap;

use chrono::{DateTime, Duration, Utc};
use thiserror::Error;

use crate::model::constants::DAILY_PLACEMENT_LIMIT;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("daily limit of {limit} reached, resets at {resets_at}")]
pub struct UsageLimitExceeded {
    pub limit: u32,
    pub resets_at: DateTime<Utc>
}

#[derive(Debug, Clone, Copy)]
struct UsageWindow {
    count: u32,
    resets_at: DateTime<Utc>
}

/// Counts requests per user until the next UTC midnight.
///
/// The caller supplies `now`, so the tracker holds no clock of its own.
#[derive(Debug, Clone)]
pub struct UsageTracker {
    limit: u32,
    windows: HashMap<i64, UsageWindow>
}

impl Default for UsageTracker {
    fn default() -> Self {
        UsageTracker::new(DAILY_PLACEMENT_LIMIT)
    }
}

impl UsageTracker {
    pub fn new(limit: u32) -> UsageTracker {
        UsageTracker {
            limit,
            windows: HashMap::new()
        }
    }

    /// Records one request for `user_id` and returns how many are left today.
    pub fn check_and_record(&mut self, user_id: i64, now: DateTime<Utc>) -> Result<u32, UsageLimitExceeded> {
        let window = self.windows.entry(user_id).or_insert(UsageWindow {
            count: 0,
            resets_at: next_reset(now)
        });

        if now >= window.resets_at {
            window.count = 0;
            window.resets_at = next_reset(now);
        }

        if window.count >= self.limit {
            return Err(UsageLimitExceeded {
                limit: self.limit,
                resets_at: window.resets_at
            });
        }

        window.count += 1;
        Ok(self.limit - window.count)
    }

    pub fn remaining(&self, user_id: i64, now: DateTime<Utc>) -> u32 {
        match self.windows.get(&user_id) {
            Some(window) if now < window.resets_at => self.limit.saturating_sub(window.count),
            _ => self.limit
        }
    }

    pub fn reset(&mut self, user_id: i64) {
        self.windows.remove(&user_id);
    }
}

/// The UTC midnight following `now`.
fn next_reset(now: DateTime<Utc>) -> DateTime<Utc> {
    now.date_naive()
        .succ_opt()
        .and_then(|day| day.and_hms_opt(0, 0, 0))
        .map(|midnight| midnight.and_utc())
        .unwrap_or(now + Duration::days(1))
}
