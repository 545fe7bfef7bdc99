//! One-sentence, rule-based descriptions of each chart dataset.
use crate::charts::{
    BranchPackages, BranchRate, ChartDataset, Correlation, Heatmap, InternshipConversion,
    RateVsPackage, Tally, TrendPoint, YearPackages, YearPlacement,
};
use crate::util::{format_count, format_number, pearson};
use std::collections::BTreeMap;

/// Returned for any dataset with nothing in it.
pub const NO_DATA_MESSAGE: &str = "No data available for the current filters.";

/// Describe the most notable fact in `dataset`.
pub fn describe(dataset: &ChartDataset) -> String {
    if dataset.is_empty() {
        return NO_DATA_MESSAGE.to_string();
    }
    match dataset {
        ChartDataset::Trends(points) => trends(points),
        ChartDataset::PlacedVsUnplaced(years) => placed_vs_unplaced(years),
        ChartDataset::BranchRate(rates) => branch_rate(rates),
        ChartDataset::PackageDistribution(branches) => package_distribution(branches),
        ChartDataset::PackageTrend(years) => package_trend(years),
        ChartDataset::RateVsPackage(scatter) => rate_vs_package(scatter),
        ChartDataset::TopCompanies(tallies) => top_companies(tallies),
        ChartDataset::JobRoles(tallies) => job_roles(tallies),
        ChartDataset::InternshipConversion(conv) => internship_conversion(conv),
        ChartDataset::Heatmap(heatmap) => heatmap_insight(heatmap),
    }
}

fn direction(delta: f64) -> &'static str {
    if delta > 0.0 {
        "rose"
    } else if delta < 0.0 {
        "fell"
    } else {
        "held steady"
    }
}

/// First entry with the strictly largest key, so earlier items win ties.
fn max_by_key<T>(items: impl IntoIterator<Item = T>, key: impl Fn(&T) -> f64) -> Option<T> {
    let mut best: Option<(f64, T)> = None;
    for item in items {
        let k = key(&item);
        if best.as_ref().map_or(true, |(b, _)| k > *b) {
            best = Some((k, item));
        }
    }
    best.map(|(_, item)| item)
}

/// Largest (branch, first value, last value) change between two years.
fn biggest_gain<'a>(
    by_branch: &BTreeMap<&'a str, BTreeMap<i32, f64>>,
    first: i32,
    last: i32,
) -> Option<(&'a str, f64, f64)> {
    let candidates = by_branch.iter().filter_map(|(branch, cells)| {
        Some((*branch, *cells.get(&first)?, *cells.get(&last)?))
    });
    max_by_key(candidates, |(_, a, b)| b - a)
}

fn trends(points: &[TrendPoint]) -> String {
    let first = points.iter().map(|p| p.year).min().unwrap_or_default();
    let last = points.iter().map(|p| p.year).max().unwrap_or_default();

    if first == last {
        let best = max_by_key(points, |p| p.placement_percentage);
        return match best {
            Some(p) => format!(
                "Only {} is in view; {} leads with a placement rate of {:.1}%.",
                p.year, p.branch, p.placement_percentage
            ),
            None => NO_DATA_MESSAGE.to_string(),
        };
    }

    let mut by_branch: BTreeMap<&str, BTreeMap<i32, f64>> = BTreeMap::new();
    for p in points {
        by_branch
            .entry(p.branch.as_str())
            .or_default()
            .insert(p.year, p.placement_percentage);
    }
    match biggest_gain(&by_branch, first, last) {
        Some((branch, a, b)) if b >= a => format!(
            "{} showed the largest increase in placement rate, \
             from {:.1}% in {} to {:.1}% in {} ({:+.1} pp).",
            branch, a, first, b, last, b - a
        ),
        Some((branch, a, b)) => format!(
            "Every branch declined between {} and {}; {} fell the least, \
             from {:.1}% to {:.1}% ({:+.1} pp).",
            first, last, branch, a, b, b - a
        ),
        None => format!(
            "No branch has records for both {} and {}, \
             so no year-over-year change can be computed.",
            first, last
        ),
    }
}

fn placed_vs_unplaced(years: &[YearPlacement]) -> String {
    let (Some(first), Some(last)) = (years.first(), years.last()) else {
        return NO_DATA_MESSAGE.to_string();
    };
    if first.year == last.year {
        return format!(
            "{} of {} students were placed in {} ({:.1}%).",
            format_count(first.placed),
            format_count(first.total),
            first.year,
            first.placed_pct
        );
    }
    let change = last.placed as f64 - first.placed as f64;
    let relative = if first.placed > 0 {
        format!(" ({:+.1}%)", change / first.placed as f64 * 100.0)
    } else {
        String::new()
    };
    format!(
        "Placements {} from {} in {} to {} in {}{}.",
        direction(change),
        format_count(first.placed),
        first.year,
        format_count(last.placed),
        last.year,
        relative
    )
}

fn branch_rate(rates: &[BranchRate]) -> String {
    let (Some(top), Some(bottom)) = (rates.first(), rates.last()) else {
        return NO_DATA_MESSAGE.to_string();
    };
    if rates.len() == 1 {
        return format!(
            "{} has a placement rate of {:.1}%.",
            top.branch, top.placement_rate
        );
    }
    format!(
        "{} leads with a {:.1}% placement rate, while {} trails at {:.1}%.",
        top.branch, top.placement_rate, bottom.branch, bottom.placement_rate
    )
}

fn package_distribution(branches: &[BranchPackages]) -> String {
    match max_by_key(branches, |b| b.median) {
        Some(b) => format!(
            "{} has the highest median average package at {:.2} LPA across the selected years.",
            b.branch, b.median
        ),
        None => NO_DATA_MESSAGE.to_string(),
    }
}

fn package_trend(years: &[YearPackages]) -> String {
    let (Some(first), Some(last)) = (years.first(), years.last()) else {
        return NO_DATA_MESSAGE.to_string();
    };
    if first.year == last.year {
        return format!(
            "The average package in {} was {:.2} LPA, with the highest offers averaging {:.2} LPA.",
            first.year, first.average, first.highest
        );
    }
    format!(
        "Average packages {} from {:.2} LPA in {} to {:.2} LPA in {}.",
        direction(last.average - first.average),
        first.average,
        first.year,
        last.average,
        last.year
    )
}

fn rate_vs_package(scatter: &RateVsPackage) -> String {
    let mut text = match scatter.correlation {
        Some(r) => format!(
            "Placement rate and average package show a {} correlation (r = {}).",
            Correlation::classify(r),
            format_number(r, 2)
        ),
        None => "The correlation between placement rate and average package is n/a.".to_string(),
    };
    if let Some(m) = scatter.midlines {
        text.push_str(&format!(
            " Quadrants split at {:.1}% placement and {:.2} LPA.",
            m.placement_rate, m.avg_package
        ));
    }
    text
}

fn top_companies(tallies: &[Tally]) -> String {
    match tallies.first() {
        Some(top) => format!(
            "{} is the top recruiter with {} students placed across the selected period.",
            top.name,
            format_count(top.count)
        ),
        None => NO_DATA_MESSAGE.to_string(),
    }
}

fn job_roles(tallies: &[Tally]) -> String {
    let total: u64 = tallies.iter().map(|t| t.count).sum();
    match tallies.first() {
        Some(top) if total > 0 => format!(
            "{} is the most common role, appearing {} times ({:.0}% of mentions).",
            top.name,
            format_count(top.count),
            top.count as f64 / total as f64 * 100.0
        ),
        _ => NO_DATA_MESSAGE.to_string(),
    }
}

fn internship_conversion(conv: &InternshipConversion) -> String {
    match conv.fit {
        Some(fit) => match (fit.r, fit.correlation) {
            (Some(r), Some(class)) => format!(
                "Internship conversion rate shows a {} correlation with placement percentage \
                 (slope {:+.2} pp per point, r = {}).",
                class,
                fit.slope,
                format_number(r, 2)
            ),
            _ => format!(
                "The internship trend line has slope {:+.2} pp per point, \
                 but its correlation is n/a.",
                fit.slope
            ),
        },
        None => "Internship conversion rates do not vary across the selected records, \
                 so the trend line is n/a."
            .to_string(),
    }
}

fn heatmap_insight(heatmap: &Heatmap) -> String {
    let mut by_branch: BTreeMap<&str, BTreeMap<i32, f64>> = BTreeMap::new();
    let (mut xs, mut ys) = (Vec::new(), Vec::new());
    for (branch, row) in heatmap.branches.iter().zip(&heatmap.cells) {
        for (year, cell) in heatmap.years.iter().zip(row) {
            if let Some(v) = cell {
                by_branch.entry(branch.as_str()).or_default().insert(*year, *v);
                xs.push(f64::from(*year));
                ys.push(*v);
            }
        }
    }

    let r = pearson(&xs, &ys);
    let trend = match r {
        Some(r) => format!(
            "Placement rate shows a {} correlation with year (r = {}).",
            Correlation::classify(r),
            format_number(r, 2)
        ),
        None => "The correlation of placement rate with year is n/a.".to_string(),
    };

    let (Some(&first), Some(&last)) = (heatmap.years.first(), heatmap.years.last()) else {
        return trend;
    };
    if first == last {
        return trend;
    }
    match biggest_gain(&by_branch, first, last) {
        Some((branch, a, b)) => format!(
            "{} showed the most improvement, {:+.1} percentage points from {} to {}. {}",
            branch,
            b - a,
            first,
            last,
            trend
        ),
        None => trend,
    }
}
