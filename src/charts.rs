//! Shapes of the ten derived chart datasets.
use crate::util::{format_count, format_number, format_optional};
use serde::Serialize;
use std::fmt;
use tabled::Tabled;

fn two_dp(v: &f64) -> String {
    format_number(*v, 2)
}

fn count(v: &u64) -> String {
    format_count(*v)
}

fn optional_two_dp(v: &Option<f64>) -> String {
    format_optional(*v, 2)
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ChartKind {
    Trends,
    PlacedVsUnplaced,
    BranchRate,
    PackageDistribution,
    PackageTrend,
    RateVsPackage,
    TopCompanies,
    JobRoles,
    InternshipConversion,
    Heatmap,
}

impl ChartKind {
    pub const ALL: [ChartKind; 10] = [
        ChartKind::Trends,
        ChartKind::PlacedVsUnplaced,
        ChartKind::BranchRate,
        ChartKind::PackageDistribution,
        ChartKind::PackageTrend,
        ChartKind::RateVsPackage,
        ChartKind::TopCompanies,
        ChartKind::JobRoles,
        ChartKind::InternshipConversion,
        ChartKind::Heatmap,
    ];

    /// Stable machine name, also used as the JSON tag.
    pub fn name(&self) -> &'static str {
        match self {
            ChartKind::Trends => "trends",
            ChartKind::PlacedVsUnplaced => "placed_vs_unplaced",
            ChartKind::BranchRate => "branch_rate",
            ChartKind::PackageDistribution => "package_distribution",
            ChartKind::PackageTrend => "package_trend",
            ChartKind::RateVsPackage => "rate_vs_package",
            ChartKind::TopCompanies => "top_companies",
            ChartKind::JobRoles => "job_roles",
            ChartKind::InternshipConversion => "internship_conversion",
            ChartKind::Heatmap => "heatmap",
        }
    }

    pub fn title(&self) -> &'static str {
        match self {
            ChartKind::Trends => "Placement Trends Over Years",
            ChartKind::PlacedVsUnplaced => "Students Placed vs Unplaced by Year",
            ChartKind::BranchRate => "Branch-wise Placement Rate",
            ChartKind::PackageDistribution => "Package Distribution by Branch",
            ChartKind::PackageTrend => "Package Trends Over Years",
            ChartKind::RateVsPackage => "Placement Rate vs Avg Package",
            ChartKind::TopCompanies => "Top Recruiting Companies",
            ChartKind::JobRoles => "Job Role Distribution",
            ChartKind::InternshipConversion => "Internship Conversion vs Placement Rate",
            ChartKind::Heatmap => "Placement Rate by Branch & Year",
        }
    }

    pub fn from_name(name: &str) -> Option<ChartKind> {
        ChartKind::ALL.into_iter().find(|k| k.name() == name)
    }

    fn index(&self) -> usize {
        *self as usize
    }
}

impl fmt::Display for ChartKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Strength classification of a correlation coefficient.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Correlation {
    Positive,
    Negative,
    Negligible,
}

impl Correlation {
    /// Below this magnitude a coefficient is reported as negligible.
    pub const THRESHOLD: f64 = 0.2;

    /// Strength of a defined coefficient. An undefined one (a single point
    /// or zero variance) has no class; callers map over the `Option`.
    pub fn classify(r: f64) -> Correlation {
        if r >= Self::THRESHOLD {
            Correlation::Positive
        } else if r <= -Self::THRESHOLD {
            Correlation::Negative
        } else {
            Correlation::Negligible
        }
    }
}

impl fmt::Display for Correlation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Correlation::Positive => "positive",
            Correlation::Negative => "negative",
            Correlation::Negligible => "negligible",
        })
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct TrendPoint {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "Placement %", display_with = "two_dp")]
    pub placement_percentage: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct YearPlacement {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Placed", display_with = "count")]
    pub placed: u64,
    #[tabled(rename = "Unplaced", display_with = "count")]
    pub unplaced: u64,
    #[tabled(rename = "Total", display_with = "count")]
    pub total: u64,
    #[tabled(rename = "Placed %", display_with = "two_dp")]
    pub placed_pct: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct BranchRate {
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "Placed", display_with = "count")]
    pub placed: u64,
    #[tabled(rename = "Total", display_with = "count")]
    pub total: u64,
    #[tabled(rename = "Placement %", display_with = "two_dp")]
    pub placement_rate: f64,
}

/// Per-branch `avg_package_LPA` values with a box-plot summary.
#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct BranchPackages {
    #[tabled(rename = "Branch")]
    pub branch: String,
    /// Values in year order.
    #[tabled(skip)]
    pub values: Vec<f64>,
    #[tabled(rename = "Min", display_with = "two_dp")]
    pub min: f64,
    #[tabled(rename = "Q1", display_with = "two_dp")]
    pub q1: f64,
    #[tabled(rename = "Median", display_with = "two_dp")]
    pub median: f64,
    #[tabled(rename = "Q3", display_with = "two_dp")]
    pub q3: f64,
    #[tabled(rename = "Max", display_with = "two_dp")]
    pub max: f64,
    #[tabled(rename = "Mean", display_with = "two_dp")]
    pub mean: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct YearPackages {
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Highest", display_with = "two_dp")]
    pub highest: f64,
    #[tabled(rename = "Average", display_with = "two_dp")]
    pub average: f64,
    #[tabled(rename = "Median", display_with = "two_dp")]
    pub median: f64,
    #[tabled(rename = "Lowest", display_with = "two_dp")]
    pub lowest: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ScatterPoint {
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Placement %", display_with = "two_dp")]
    pub placement_percentage: f64,
    #[tabled(rename = "Avg Package", display_with = "two_dp")]
    pub avg_package_lpa: f64,
    #[tabled(rename = "Students")]
    pub total_students: u32,
}

/// Quadrant lines drawn through the scatter.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Midlines {
    pub placement_rate: f64,
    pub avg_package: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RateVsPackage {
    pub points: Vec<ScatterPoint>,
    pub midlines: Option<Midlines>,
    /// Pearson r between placement % and average package.
    pub correlation: Option<f64>,
}

/// A name with its summed count, used for companies and job roles.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Tabled)]
pub struct Tally {
    #[tabled(rename = "Name")]
    pub name: String,
    #[tabled(rename = "Count", display_with = "count")]
    pub count: u64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Tabled)]
pub struct ConversionPoint {
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Conversion %", display_with = "two_dp")]
    pub conversion_rate: f64,
    #[tabled(rename = "Placement %", display_with = "two_dp")]
    pub placement_percentage: f64,
}

#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct LinearFit {
    pub slope: f64,
    pub intercept: f64,
    /// `None` when the y-values have no variance.
    pub r: Option<f64>,
    /// Class of `r`, unavailable whenever `r` is.
    pub correlation: Option<Correlation>,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InternshipConversion {
    pub points: Vec<ConversionPoint>,
    /// `None` with fewer than two distinct conversion rates.
    pub fit: Option<LinearFit>,
}

/// Branch × year matrix; `cells[b][y]` is `None` where no record exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Heatmap {
    pub branches: Vec<String>,
    pub years: Vec<i32>,
    pub cells: Vec<Vec<Option<f64>>>,
}

impl Heatmap {
    pub fn cell(&self, branch: &str, year: i32) -> Option<f64> {
        let b = self.branches.iter().position(|x| x == branch)?;
        let y = self.years.iter().position(|x| *x == year)?;
        self.cells.get(b)?.get(y).copied().flatten()
    }
}

/// Display helper for heatmap rows.
#[derive(Debug, Clone, PartialEq, Tabled)]
pub struct HeatmapCell {
    #[tabled(rename = "Branch")]
    pub branch: String,
    #[tabled(rename = "Year")]
    pub year: i32,
    #[tabled(rename = "Placement %", display_with = "optional_two_dp")]
    pub value: Option<f64>,
}

impl Heatmap {
    /// Flatten to (branch, year, value) rows, "no data" cells included.
    pub fn flatten(&self) -> Vec<HeatmapCell> {
        let mut out = Vec::with_capacity(self.branches.len() * self.years.len());
        for (branch, row) in self.branches.iter().zip(&self.cells) {
            for (year, value) in self.years.iter().zip(row) {
                out.push(HeatmapCell {
                    branch: branch.clone(),
                    year: *year,
                    value: *value,
                });
            }
        }
        out
    }
}

/// One derived dataset, tagged by chart kind.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(tag = "chart", content = "data", rename_all = "snake_case")]
pub enum ChartDataset {
    Trends(Vec<TrendPoint>),
    PlacedVsUnplaced(Vec<YearPlacement>),
    BranchRate(Vec<BranchRate>),
    PackageDistribution(Vec<BranchPackages>),
    PackageTrend(Vec<YearPackages>),
    RateVsPackage(RateVsPackage),
    TopCompanies(Vec<Tally>),
    JobRoles(Vec<Tally>),
    InternshipConversion(InternshipConversion),
    Heatmap(Heatmap),
}

impl ChartDataset {
    pub fn kind(&self) -> ChartKind {
        match self {
            ChartDataset::Trends(_) => ChartKind::Trends,
            ChartDataset::PlacedVsUnplaced(_) => ChartKind::PlacedVsUnplaced,
            ChartDataset::BranchRate(_) => ChartKind::BranchRate,
            ChartDataset::PackageDistribution(_) => ChartKind::PackageDistribution,
            ChartDataset::PackageTrend(_) => ChartKind::PackageTrend,
            ChartDataset::RateVsPackage(_) => ChartKind::RateVsPackage,
            ChartDataset::TopCompanies(_) => ChartKind::TopCompanies,
            ChartDataset::JobRoles(_) => ChartKind::JobRoles,
            ChartDataset::InternshipConversion(_) => ChartKind::InternshipConversion,
            ChartDataset::Heatmap(_) => ChartKind::Heatmap,
        }
    }

    pub fn name(&self) -> &'static str {
        self.kind().name()
    }

    pub fn is_empty(&self) -> bool {
        match self {
            ChartDataset::Trends(v) => v.is_empty(),
            ChartDataset::PlacedVsUnplaced(v) => v.is_empty(),
            ChartDataset::BranchRate(v) => v.is_empty(),
            ChartDataset::PackageDistribution(v) => v.is_empty(),
            ChartDataset::PackageTrend(v) => v.is_empty(),
            ChartDataset::RateVsPackage(d) => d.points.is_empty(),
            ChartDataset::TopCompanies(v) | ChartDataset::JobRoles(v) => v.is_empty(),
            ChartDataset::InternshipConversion(d) => d.points.is_empty(),
            ChartDataset::Heatmap(h) => h.branches.is_empty(),
        }
    }
}

/// All ten datasets for one view, in [`ChartKind::ALL`] order.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(transparent)]
pub struct ChartSet {
    datasets: [ChartDataset; 10],
}

impl ChartSet {
    pub(crate) fn new(datasets: [ChartDataset; 10]) -> Self {
        debug_assert!(datasets
            .iter()
            .zip(ChartKind::ALL)
            .all(|(d, k)| d.kind() == k));
        Self { datasets }
    }

    pub fn get(&self, kind: ChartKind) -> &ChartDataset {
        &self.datasets[kind.index()]
    }

    pub fn iter(&self) -> impl Iterator<Item = &ChartDataset> {
        self.datasets.iter()
    }
}
