//! Filter selection and the engine that applies it.
use crate::types::{FilteredView, Record, Table};
use serde::Serialize;
use std::collections::BTreeSet;
use tracing::debug;

/// Display order for the well-known branches; anything else follows
/// alphabetically.
pub const BRANCH_ORDER: [&str; 5] = [
    "Computer Science",
    "IT",
    "Electronics",
    "Mechanical",
    "Civil",
];

/// Inclusive numeric range.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Bounds {
    pub min: f64,
    pub max: f64,
}

impl Bounds {
    pub fn new(min: f64, max: f64) -> Self {
        Self { min, max }
    }

    pub fn contains(&self, value: f64) -> bool {
        self.min <= value && value <= self.max
    }

    /// True when every value in `[lo, hi]` falls inside this range.
    pub fn covers(&self, lo: f64, hi: f64) -> bool {
        self.min <= lo && hi <= self.max
    }
}

/// The user's current filter selection.
///
/// Empty sets and `None` ranges mean "no restriction" on that dimension.
/// A spec is replaced wholesale on every interaction; the engines only ever
/// borrow it.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct FilterSpec {
    pub years: BTreeSet<i32>,
    pub branches: BTreeSet<String>,
    pub avg_package: Option<Bounds>,
    pub placement_rate: Option<Bounds>,
}

impl FilterSpec {
    pub fn unrestricted() -> Self {
        Self::default()
    }

    pub fn with_years<I: IntoIterator<Item = i32>>(mut self, years: I) -> Self {
        self.years = years.into_iter().collect();
        self
    }

    pub fn with_branches<I, S>(mut self, branches: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.branches = branches.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_avg_package(mut self, min: f64, max: f64) -> Self {
        self.avg_package = Some(Bounds::new(min, max));
        self
    }

    pub fn with_placement_rate(mut self, min: f64, max: f64) -> Self {
        self.placement_rate = Some(Bounds::new(min, max));
        self
    }

    pub fn allows_year(&self, year: i32) -> bool {
        self.years.is_empty() || self.years.contains(&year)
    }

    pub fn allows_branch(&self, branch: &str) -> bool {
        self.branches.is_empty() || self.branches.contains(branch)
    }

    /// All four predicates, ANDed.
    pub fn matches(&self, r: &Record) -> bool {
        self.allows_year(r.year)
            && self.allows_branch(&r.branch)
            && self.avg_package.map_or(true, |b| b.contains(r.avg_package_lpa))
            && self.placement_rate.map_or(true, |b| b.contains(r.placement_percentage))
    }
}

/// Apply `spec` to `table`, producing a fresh view in table order.
pub fn apply(table: &Table, spec: &FilterSpec) -> FilteredView {
    let rows: Vec<Record> = table
        .records()
        .iter()
        .filter(|r| spec.matches(r))
        .cloned()
        .collect();
    let active = active_filter_count(table, spec);
    debug!(matched = rows.len(), of = table.len(), active, "applied filters");
    FilteredView::new(rows, active)
}

/// Count the dimensions of `spec` that actually restrict `table`.
///
/// A set selecting every value present in the table, or a range spanning
/// the whole domain, is the same as no restriction. The package domain is
/// the table's observed span; the placement domain is always `[0, 100]`.
pub fn active_filter_count(table: &Table, spec: &FilterSpec) -> usize {
    let years_active = !spec.years.is_empty() && !spec.years.is_superset(&table.years());
    let branches_active =
        !spec.branches.is_empty() && !spec.branches.is_superset(&table.branches());
    let package_active = match (spec.avg_package, table.avg_package_span()) {
        (Some(b), Some((lo, hi))) => !b.covers(lo, hi),
        _ => false,
    };
    let rate_active = spec
        .placement_rate
        .map_or(false, |b| !b.covers(0.0, 100.0));

    [years_active, branches_active, package_active, rate_active]
        .into_iter()
        .filter(|active| *active)
        .count()
}

/// Values a presentation layer can offer as filter choices.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct FilterOptions {
    /// Most recent first.
    pub years: Vec<i32>,
    pub branches: Vec<String>,
    pub avg_package: Option<Bounds>,
    pub placement_rate: Bounds,
}

pub fn options(table: &Table) -> FilterOptions {
    let years: Vec<i32> = table.years().into_iter().rev().collect();
    let mut branches: Vec<String> = table.branches().into_iter().collect();
    branches.sort_by(|a, b| {
        branch_rank(a)
            .cmp(&branch_rank(b))
            .then_with(|| a.cmp(b))
    });
    FilterOptions {
        years,
        branches,
        avg_package: table.avg_package_span().map(|(lo, hi)| Bounds::new(lo, hi)),
        placement_rate: Bounds::new(0.0, 100.0),
    }
}

fn branch_rank(branch: &str) -> usize {
    BRANCH_ORDER
        .iter()
        .position(|b| *b == branch)
        .unwrap_or(BRANCH_ORDER.len())
}
