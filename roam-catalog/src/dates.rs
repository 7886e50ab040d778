use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A requested or stored stay, `[check_in, check_out)`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StayRange {
    pub check_in: DateTime<Utc>,
    pub check_out: DateTime<Utc>,
}

impl StayRange {
    pub fn new(check_in: DateTime<Utc>, check_out: DateTime<Utc>) -> Self {
        Self { check_in, check_out }
    }

    /// Ranges must end after they start.
    pub fn is_well_formed(&self) -> bool {
        self.check_out > self.check_in
    }

    /// Overlap test used for double-booking detection.
    ///
    /// Matches the stored-document query `stored.check_in <= requested.check_out
    /// AND stored.check_out >= requested.check_in`, so ranges that merely touch
    /// at a boundary also count as overlapping.
    pub fn overlaps(&self, other: &StayRange) -> bool {
        self.check_in <= other.check_out && self.check_out >= other.check_in
    }

    pub fn nights(&self) -> i64 {
        (self.check_out - self.check_in).num_days()
    }
}
