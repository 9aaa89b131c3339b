//! Ledger entities

use serde::{Deserialize, Serialize};
use shared_types::ScanCursor;

/// Result of one accepted report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct IngestOutcome {
    /// Always `true` for a returned outcome; refusals are errors.
    pub accepted: bool,
    /// The reporter had already reported this target.
    pub duplicate: bool,
    /// Distinct reporters for the target after this call.
    pub count: u64,
}

/// Outcome for one target of a batch report.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct BatchOutcome {
    pub target_id: String,
    #[serde(flatten)]
    pub outcome: IngestOutcome,
}

/// One live ledger record as seen by a scan.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct LedgerEntry {
    pub target_id: String,
    /// Reporter-set cardinality.
    pub count: u64,
}

/// One page of a ledger scan.
#[derive(Clone, Debug, Default)]
pub struct LedgerPage {
    pub entries: Vec<LedgerEntry>,
    /// Cursor to resume from; `None` when the scan is complete.
    pub next: Option<ScanCursor>,
}

/// Client-side usage counters uploaded alongside reports.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UsageReport {
    pub unique_reports: i64,
    pub total_reports: i64,
    pub blurred_encounters: i64,
    pub unblur_attempts: i64,
}

impl UsageReport {
    /// Hash field names paired with values, in storage order.
    pub fn fields(&self) -> [(&'static str, i64); 4] {
        [
            ("uniqueReports", self.unique_reports),
            ("totalReports", self.total_reports),
            ("blurredEncounters", self.blurred_encounters),
            ("unblurAttempts", self.unblur_attempts),
        ]
    }

    /// Rebuild totals from stored hash fields; unknown fields are ignored.
    pub fn from_fields(fields: &[(String, i64)]) -> Self {
        let mut totals = Self::default();
        for (name, value) in fields {
            match name.as_str() {
                "uniqueReports" => totals.unique_reports = *value,
                "totalReports" => totals.total_reports = *value,
                "blurredEncounters" => totals.blurred_encounters = *value,
                "unblurAttempts" => totals.unblur_attempts = *value,
                _ => {}
            }
        }
        totals
    }
}
