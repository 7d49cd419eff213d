use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};

/// Dashboard output for a year (and optional month) filter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct DashboardSummary {
    pub year: i32,
    pub month: Option<u32>,
    pub total_reports: i64,
    /// Reports still in OPEN.
    pub pending_reports: i64,
    pub resolved_reports: i64,
    /// Sum of fine amounts over the filtered set; unfined reports count as 0.
    pub total_fines: Decimal,
    /// Jan..Dec report counts for the whole year, zero-filled. Always spans
    /// the full year even when a month filter narrows the headline numbers;
    /// only present when no month filter was supplied.
    pub monthly_counts: Option<[i64; 12]>,
    /// Per-violation-type counts over the filtered set, descending by count,
    /// ties broken by name.
    pub violation_breakdown: Vec<ViolationCount>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ViolationCount {
    pub name: String,
    pub count: i64,
}
