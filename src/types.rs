use serde::Serialize;
use std::collections::BTreeSet;

/// Column headers every input table must carry, in export order.
pub const REQUIRED_COLUMNS: [&str; 20] = [
    "year",
    "branch",
    "total_students",
    "placed_students",
    "unplaced_students",
    "placement_percentage",
    "highest_package_LPA",
    "median_package_LPA",
    "lowest_package_LPA",
    "avg_package_LPA",
    "top_company_1",
    "top_company_1_students",
    "top_company_2",
    "top_company_2_students",
    "top_company_3",
    "top_company_3_students",
    "top_job_role_1",
    "top_job_role_2",
    "top_job_role_3",
    "internship_conversion_rate_percent",
];

/// Untyped table as read from a delimited source: a header row plus string
/// cells. Nothing downstream accepts this until it has been validated.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawTable {
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

impl RawTable {
    pub fn column_index(&self, name: &str) -> Option<usize> {
        self.headers.iter().position(|h| h.trim() == name)
    }
}

/// One validated (year, branch) placement row.
///
/// Field order and serde names match [`REQUIRED_COLUMNS`] so a filtered
/// view can be written back out with the original headers.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Record {
    pub year: i32,
    pub branch: String,
    pub total_students: u32,
    pub placed_students: u32,
    pub unplaced_students: u32,
    pub placement_percentage: f64,
    #[serde(rename = "highest_package_LPA")]
    pub highest_package_lpa: f64,
    #[serde(rename = "median_package_LPA")]
    pub median_package_lpa: f64,
    #[serde(rename = "lowest_package_LPA")]
    pub lowest_package_lpa: f64,
    #[serde(rename = "avg_package_LPA")]
    pub avg_package_lpa: f64,
    pub top_company_1: String,
    pub top_company_1_students: u32,
    pub top_company_2: String,
    pub top_company_2_students: u32,
    pub top_company_3: String,
    pub top_company_3_students: u32,
    pub top_job_role_1: String,
    pub top_job_role_2: String,
    pub top_job_role_3: String,
    pub internship_conversion_rate_percent: f64,
}

impl Record {
    /// Ranked (company, students placed) pairs, blanks included.
    pub fn companies(&self) -> [(&str, u32); 3] {
        [
            (self.top_company_1.as_str(), self.top_company_1_students),
            (self.top_company_2.as_str(), self.top_company_2_students),
            (self.top_company_3.as_str(), self.top_company_3_students),
        ]
    }

    pub fn job_roles(&self) -> [&str; 3] {
        [
            self.top_job_role_1.as_str(),
            self.top_job_role_2.as_str(),
            self.top_job_role_3.as_str(),
        ]
    }
}

/// The session's reference table.
///
/// Rows are unique on (year, branch) and kept in canonical order: year
/// ascending, then branch ascending. Only the validator and the filter
/// engine build one, so both invariants always hold.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Table {
    records: Vec<Record>,
}

impl Table {
    pub(crate) fn from_canonical(records: Vec<Record>) -> Self {
        Self { records }
    }

    pub fn records(&self) -> &[Record] {
        &self.records
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    pub fn years(&self) -> BTreeSet<i32> {
        self.records.iter().map(|r| r.year).collect()
    }

    pub fn branches(&self) -> BTreeSet<String> {
        self.records.iter().map(|r| r.branch.clone()).collect()
    }

    /// Observed `(min, max)` of `avg_package_LPA`, `None` for an empty table.
    pub fn avg_package_span(&self) -> Option<(f64, f64)> {
        let mut iter = self.records.iter().map(|r| r.avg_package_lpa);
        let first = iter.next()?;
        Some(iter.fold((first, first), |(lo, hi), v| (lo.min(v), hi.max(v))))
    }
}

/// Rows of a [`Table`] that satisfy the current filter selection.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilteredView {
    rows: Vec<Record>,
    active_filter_count: usize,
}

impl FilteredView {
    pub(crate) fn new(rows: Vec<Record>, active_filter_count: usize) -> Self {
        Self {
            rows,
            active_filter_count,
        }
    }

    pub fn records(&self) -> &[Record] {
        &self.rows
    }

    /// Number of filter dimensions that currently restrict the table.
    pub fn active_filter_count(&self) -> usize {
        self.active_filter_count
    }

    pub fn len(&self) -> usize {
        self.rows.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rows.is_empty()
    }
}

impl From<FilteredView> for Table {
    // A view is an order-preserving subset of a valid table.
    fn from(view: FilteredView) -> Self {
        Table::from_canonical(view.rows)
    }
}
