//! Staleness classification of a local dataset against its upstream copy.

use chrono::NaiveDate;

/// How the recorded `last_updated` date relates to the upstream date.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Freshness {
    UpToDate,
    /// Upstream is newer: fetch it.
    Stale,
    /// The recorded date is ahead of upstream. Reported, never fetched.
    LocalAhead,
}

impl Freshness {
    /// Compare dates by ordering rather than equality, so that any newer
    /// upstream date triggers an update.
    pub fn classify(local: NaiveDate, remote: NaiveDate) -> Self {
        match remote.cmp(&local) {
            std::cmp::Ordering::Greater => Freshness::Stale,
            std::cmp::Ordering::Less => Freshness::LocalAhead,
            std::cmp::Ordering::Equal => Freshness::UpToDate,
        }
    }
}
