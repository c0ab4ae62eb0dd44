//! Vendor notification classification.
//!
//! The gateway multiplexes benign connectivity notices, transient outage
//! reports, and hard errors over one notification callback, distinguished
//! only by vendor-defined integer codes. The partitions live in a
//! [`NotificationPolicy`] so a vendor code-set change is a config edit,
//! not a code change.

use std::collections::BTreeSet;
use std::time::Duration;

use serde::Deserialize;

use crate::CycleScope;

/// Default retry pause while a data farm reconnects.
const DEFAULT_RETRY_DELAY_SECS: u64 = 30;

/// Recovery action for one classified notification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Verdict {
    /// Informational notice; no state change.
    Ignorable,
    /// Self-healing outage: pause for the delay, then resume waiting on
    /// the same outstanding requests. No resubmission.
    TransientRetry(Duration),
    /// Permanent no-data condition: abandon this ticker, continue the
    /// batch. Only reachable on the interday path.
    NoDataSkip,
    /// Unrecoverable: abort the batch and tear down the connection.
    Fatal,
}

/// Code partitions driving [`classify`](NotificationPolicy::classify).
///
/// Defaults follow the vendor's current code set; any field may be
/// overridden from a JSON policy file, e.g.
/// `{ "transient": [1100, 2103, 2105], "retry_delay_secs": 60 }`.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct NotificationPolicy {
    /// Benign data-farm connectivity notices.
    pub ignorable: BTreeSet<i32>,
    /// Data-farm outages expected to self-heal.
    pub transient: BTreeSet<i32>,
    /// "No data returned" for the requested window.
    pub no_data: BTreeSet<i32>,
    /// Pause applied to every transient verdict.
    pub retry_delay_secs: u64,
}

impl Default for NotificationPolicy {
    fn default() -> Self {
        Self {
            ignorable: BTreeSet::from([2104, 2106, 2158]),
            transient: BTreeSet::from([1100, 2103, 2105]),
            no_data: BTreeSet::from([162]),
            retry_delay_secs: DEFAULT_RETRY_DELAY_SECS,
        }
    }
}

impl NotificationPolicy {
    pub fn from_json(raw: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(raw)
    }

    pub const fn retry_delay(&self) -> Duration {
        Duration::from_secs(self.retry_delay_secs)
    }

    /// Classify one notification code for the given cycle scope.
    ///
    /// The no-data condition skips the ticker only on the interday path.
    /// An intraday cycle has sibling requests in flight whose correlation
    /// state cannot be safely unwound mid-cycle, so the identical code
    /// escalates to [`Verdict::Fatal`] there.
    pub fn classify(&self, code: i32, scope: CycleScope) -> Verdict {
        if self.ignorable.contains(&code) {
            return Verdict::Ignorable;
        }
        if self.transient.contains(&code) {
            return Verdict::TransientRetry(self.retry_delay());
        }
        if self.no_data.contains(&code) {
            return match scope {
                CycleScope::Interday => Verdict::NoDataSkip,
                CycleScope::Intraday => Verdict::Fatal,
            };
        }
        Verdict::Fatal
    }
}
