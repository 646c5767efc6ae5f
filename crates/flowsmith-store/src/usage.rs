//! Usage statistics.
//!
//! Counts how many workflows were requested and how many came back
//! successfully.  The counters live as one JSON value under
//! [`USAGE_STATS_KEY`] and every increment goes through
//! [`KvStore::update`], so concurrent generations never lose a count.

use chrono::Local;
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::db::Database;
use crate::error::StoreResult;
use crate::kv::KvStore;

/// Key under which the counters are stored.
pub const USAGE_STATS_KEY: &str = "usage_stats";

/// Generation counters as persisted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UsageStats {
    /// Generation attempts.
    pub generated: u64,
    /// Attempts that produced a workflow.
    pub successful: u64,
    /// `round(successful / generated * 100)`; 100 before the first attempt.
    pub success_rate: u8,
    /// Local date (`YYYY-MM-DD`) of the most recent attempt.
    #[serde(default)]
    pub last_used: Option<String>,
}

impl Default for UsageStats {
    fn default() -> Self {
        Self {
            generated: 0,
            successful: 0,
            success_rate: 100,
            last_used: None,
        }
    }
}

impl UsageStats {
    /// Count one attempt made on `date`.
    pub fn record(&mut self, success: bool, date: impl Into<String>) {
        self.generated += 1;
        if success {
            self.successful += 1;
        }
        self.success_rate = success_rate(self.successful, self.generated);
        self.last_used = Some(date.into());
    }
}

/// Percentage of successful attempts, rounded half up.
pub fn success_rate(successful: u64, generated: u64) -> u8 {
    if generated == 0 {
        return 100;
    }
    let rate = (successful as f64 / generated as f64 * 100.0).round();
    rate.clamp(0.0, 100.0) as u8
}

/// Persistent usage counters.
#[derive(Clone)]
pub struct UsageStore {
    kv: KvStore,
}

impl UsageStore {
    /// Create a store backed by `db`.
    pub fn new(db: Database) -> Self {
        Self {
            kv: KvStore::new(db),
        }
    }

    /// Current counters, or the zero state if nothing was recorded yet.
    pub async fn load(&self) -> StoreResult<UsageStats> {
        Ok(parse_or_reset(self.kv.get(USAGE_STATS_KEY).await?))
    }

    /// Record one generation attempt and return the updated counters.
    pub async fn record(&self, success: bool) -> StoreResult<UsageStats> {
        let today = Local::now().format("%Y-%m-%d").to_string();
        let raw = self
            .kv
            .update(USAGE_STATS_KEY, move |current| {
                let mut stats = parse_or_reset(current);
                stats.record(success, today);
                Ok(serde_json::to_string(&stats)?)
            })
            .await?;

        let stats: UsageStats = serde_json::from_str(&raw)?;
        debug!(
            generated = stats.generated,
            successful = stats.successful,
            success_rate = stats.success_rate,
            "usage statistics updated"
        );
        Ok(stats)
    }

    /// Forget all counters.
    pub async fn reset(&self) -> StoreResult<()> {
        self.kv.delete(USAGE_STATS_KEY).await.map(|_| ())
    }
}

/// Decode stored counters; unreadable data starts over from zero.
fn parse_or_reset(raw: Option<String>) -> UsageStats {
    let Some(raw) = raw else {
        return UsageStats::default();
    };
    serde_json::from_str(&raw).unwrap_or_else(|e| {
        warn!(error = %e, "stored usage statistics are unreadable, resetting");
        UsageStats::default()
    })
}

// ── tests ────────────────────────────────────────────────────────────
