use crate::charts::{
    BranchPackages, BranchRate, ChartDataset, ChartSet, ConversionPoint, Correlation, Heatmap,
    InternshipConversion, LinearFit, Midlines, RateVsPackage, ScatterPoint, Tally, TrendPoint,
    YearPackages, YearPlacement,
};
use crate::types::{FilteredView, Record};
use crate::util::{average, median, ols, pearson, quantile};
use std::collections::BTreeMap;

/// Companies kept in the top-companies ranking.
pub const TOP_COMPANY_LIMIT: usize = 10;

/// Build all ten chart datasets for `view`.
///
/// Every grouping goes through an ordered map and every sort has an
/// explicit tie-break, so equal inputs give identical outputs.
pub fn aggregate(view: &FilteredView) -> ChartSet {
    let rows = view.records();
    ChartSet::new([
        ChartDataset::Trends(trends(rows)),
        ChartDataset::PlacedVsUnplaced(placed_vs_unplaced(rows)),
        ChartDataset::BranchRate(branch_rates(rows)),
        ChartDataset::PackageDistribution(package_distribution(rows)),
        ChartDataset::PackageTrend(package_trend(rows)),
        ChartDataset::RateVsPackage(rate_vs_package(rows)),
        ChartDataset::TopCompanies(top_companies(rows)),
        ChartDataset::JobRoles(job_roles(rows)),
        ChartDataset::InternshipConversion(internship_conversion(rows)),
        ChartDataset::Heatmap(heatmap(rows)),
    ])
}

pub fn trends(rows: &[Record]) -> Vec<TrendPoint> {
    // (year, branch) is unique, so each group holds exactly one row.
    let mut map: BTreeMap<(i32, &str), f64> = BTreeMap::new();
    for r in rows {
        map.insert((r.year, r.branch.as_str()), r.placement_percentage);
    }
    map.into_iter()
        .map(|((year, branch), placement_percentage)| TrendPoint {
            year,
            branch: branch.to_string(),
            placement_percentage,
        })
        .collect()
}

pub fn placed_vs_unplaced(rows: &[Record]) -> Vec<YearPlacement> {
    #[derive(Default)]
    struct Acc {
        placed: u64,
        unplaced: u64,
        total: u64,
    }
    let mut map: BTreeMap<i32, Acc> = BTreeMap::new();
    for r in rows {
        let e = map.entry(r.year).or_default();
        e.placed += u64::from(r.placed_students);
        e.unplaced += u64::from(r.unplaced_students);
        e.total += u64::from(r.total_students);
    }
    map.into_iter()
        .map(|(year, acc)| YearPlacement {
            year,
            placed: acc.placed,
            unplaced: acc.unplaced,
            total: acc.total,
            placed_pct: rate(acc.placed, acc.total),
        })
        .collect()
}

pub fn branch_rates(rows: &[Record]) -> Vec<BranchRate> {
    let mut map: BTreeMap<&str, (u64, u64)> = BTreeMap::new();
    for r in rows {
        let e = map.entry(r.branch.as_str()).or_default();
        e.0 += u64::from(r.placed_students);
        e.1 += u64::from(r.total_students);
    }
    let mut out: Vec<BranchRate> = map
        .into_iter()
        .map(|(branch, (placed, total))| BranchRate {
            branch: branch.to_string(),
            placed,
            total,
            placement_rate: rate(placed, total),
        })
        .collect();
    out.sort_by(|a, b| {
        b.placement_rate
            .total_cmp(&a.placement_rate)
            .then_with(|| a.branch.cmp(&b.branch))
    });
    out
}

pub fn package_distribution(rows: &[Record]) -> Vec<BranchPackages> {
    // Rows arrive in (year, branch) order, so each branch's values are
    // already in year order.
    let mut map: BTreeMap<&str, Vec<f64>> = BTreeMap::new();
    for r in rows {
        map.entry(r.branch.as_str())
            .or_default()
            .push(r.avg_package_lpa);
    }
    map.into_iter()
        .map(|(branch, values)| BranchPackages {
            branch: branch.to_string(),
            min: quantile(values.clone(), 0.0),
            q1: quantile(values.clone(), 0.25),
            median: median(values.clone()),
            q3: quantile(values.clone(), 0.75),
            max: quantile(values.clone(), 1.0),
            mean: average(&values),
            values,
        })
        .collect()
}

pub fn package_trend(rows: &[Record]) -> Vec<YearPackages> {
    #[derive(Default)]
    struct Acc {
        highest: Vec<f64>,
        average: Vec<f64>,
        median: Vec<f64>,
        lowest: Vec<f64>,
    }
    let mut map: BTreeMap<i32, Acc> = BTreeMap::new();
    for r in rows {
        let e = map.entry(r.year).or_default();
        e.highest.push(r.highest_package_lpa);
        e.average.push(r.avg_package_lpa);
        e.median.push(r.median_package_lpa);
        e.lowest.push(r.lowest_package_lpa);
    }
    map.into_iter()
        .map(|(year, acc)| YearPackages {
            year,
            highest: average(&acc.highest),
            average: average(&acc.average),
            median: average(&acc.median),
            lowest: average(&acc.lowest),
        })
        .collect()
}

pub fn rate_vs_package(rows: &[Record]) -> RateVsPackage {
    let points: Vec<ScatterPoint> = rows
        .iter()
        .map(|r| ScatterPoint {
            branch: r.branch.clone(),
            year: r.year,
            placement_percentage: r.placement_percentage,
            avg_package_lpa: r.avg_package_lpa,
            total_students: r.total_students,
        })
        .collect();
    let rates: Vec<f64> = points.iter().map(|p| p.placement_percentage).collect();
    let packages: Vec<f64> = points.iter().map(|p| p.avg_package_lpa).collect();
    let midlines = (!points.is_empty()).then(|| Midlines {
        placement_rate: average(&rates),
        avg_package: average(&packages),
    });
    RateVsPackage {
        correlation: pearson(&packages, &rates),
        midlines,
        points,
    }
}

pub fn top_companies(rows: &[Record]) -> Vec<Tally> {
    let mut map: BTreeMap<&str, u64> = BTreeMap::new();
    for r in rows {
        for (company, students) in r.companies() {
            if company.is_empty() {
                continue;
            }
            *map.entry(company).or_default() += u64::from(students);
        }
    }
    let mut out = ranked(map);
    out.truncate(TOP_COMPANY_LIMIT);
    out
}

/// Each appearance of a role in a row's top-three counts as one mention.
pub fn job_roles(rows: &[Record]) -> Vec<Tally> {
    let mut map: BTreeMap<&str, u64> = BTreeMap::new();
    for r in rows {
        for role in r.job_roles() {
            if role.is_empty() {
                continue;
            }
            *map.entry(role).or_default() += 1;
        }
    }
    ranked(map)
}

pub fn internship_conversion(rows: &[Record]) -> InternshipConversion {
    let points: Vec<ConversionPoint> = rows
        .iter()
        .map(|r| ConversionPoint {
            branch: r.branch.clone(),
            year: r.year,
            conversion_rate: r.internship_conversion_rate_percent,
            placement_percentage: r.placement_percentage,
        })
        .collect();
    let xs: Vec<f64> = points.iter().map(|p| p.conversion_rate).collect();
    let ys: Vec<f64> = points.iter().map(|p| p.placement_percentage).collect();
    let fit = ols(&xs, &ys).map(|(slope, intercept)| {
        let r = pearson(&xs, &ys);
        LinearFit {
            slope,
            intercept,
            r,
            correlation: r.map(Correlation::classify),
        }
    });
    InternshipConversion { points, fit }
}

pub fn heatmap(rows: &[Record]) -> Heatmap {
    let mut by_branch: BTreeMap<&str, BTreeMap<i32, f64>> = BTreeMap::new();
    let mut years: Vec<i32> = rows.iter().map(|r| r.year).collect();
    years.sort_unstable();
    years.dedup();
    for r in rows {
        by_branch
            .entry(r.branch.as_str())
            .or_default()
            .insert(r.year, r.placement_percentage);
    }

    let mut ordered: Vec<(&str, f64, Vec<Option<f64>>)> = by_branch
        .into_iter()
        .map(|(branch, cells)| {
            let present: Vec<f64> = cells.values().copied().collect();
            let row = years.iter().map(|y| cells.get(y).copied()).collect();
            (branch, average(&present), row)
        })
        .collect();
    ordered.sort_by(|a, b| b.1.total_cmp(&a.1).then_with(|| a.0.cmp(b.0)));

    let mut branches = Vec::with_capacity(ordered.len());
    let mut cells = Vec::with_capacity(ordered.len());
    for (branch, _, row) in ordered {
        branches.push(branch.to_string());
        cells.push(row);
    }
    Heatmap {
        branches,
        years,
        cells,
    }
}

fn rate(placed: u64, total: u64) -> f64 {
    if total == 0 {
        0.0
    } else {
        placed as f64 / total as f64 * 100.0
    }
}

/// Sort tallies by count descending, then name ascending.
fn ranked(map: BTreeMap<&str, u64>) -> Vec<Tally> {
    let mut out: Vec<Tally> = map
        .into_iter()
        .map(|(name, count)| Tally {
            name: name.to_string(),
            count,
        })
        .collect();
    out.sort_by(|a, b| b.count.cmp(&a.count).then_with(|| a.name.cmp(&b.name)));
    out
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::charts::ChartKind;
    use crate::filter::{apply, FilterSpec};
    use crate::fixtures::{record, table};

    fn sample() -> Vec<Record> {
        table(vec![
            record(2023, "CSE", 100, 80, 10.0),
            record(2023, "ECE", 50, 30, 6.0),
            record(2024, "CSE", 100, 90, 12.0),
            record(2024, "ECE", 60, 45, 7.0),
            record(2024, "Civil", 40, 10, 4.0),
        ])
        .records()
        .to_vec()
    }

    #[test]
    fn trends_are_sorted_by_year_then_branch() {
        let t = trends(&sample());
        let keys: Vec<(i32, &str)> = t.iter().map(|p| (p.year, p.branch.as_str())).collect();
        assert_eq!(
            keys,
            vec![
                (2023, "CSE"),
                (2023, "ECE"),
                (2024, "CSE"),
                (2024, "Civil"),
                (2024, "ECE")
            ]
        );
        assert_eq!(t[1].placement_percentage, 60.0);
    }

    #[test]
    fn placed_vs_unplaced_sums_per_year() {
        let y = placed_vs_unplaced(&sample());
        assert_eq!(y.len(), 2);
        assert_eq!((y[0].year, y[0].placed, y[0].unplaced, y[0].total), (2023, 110, 40, 150));
        assert_eq!((y[1].year, y[1].placed, y[1].unplaced), (2024, 145, 55));
        assert!((y[1].placed_pct - 72.5).abs() < 1e-9);
    }

    #[test]
    fn branch_rates_are_weighted_and_descending() {
        let b = branch_rates(&sample());
        let names: Vec<&str> = b.iter().map(|r| r.branch.as_str()).collect();
        assert_eq!(names, vec!["CSE", "ECE", "Civil"]);
        assert!((b[0].placement_rate - 85.0).abs() < 1e-9);
        assert!((b[1].placement_rate - 75.0 / 110.0 * 100.0).abs() < 1e-9);
    }

    #[test]
    fn branch_rate_ties_break_by_name() {
        let rows = table(vec![
            record(2024, "ME", 10, 5, 3.0),
            record(2024, "EE", 20, 10, 3.0),
        ]);
        let b = branch_rates(rows.records());
        assert_eq!(b[0].branch, "EE");
        assert_eq!(b[1].branch, "ME");
    }

    #[test]
    fn package_distribution_keeps_year_order_and_quartiles() {
        let d = package_distribution(&sample());
        let cse = d.iter().find(|b| b.branch == "CSE").unwrap();
        assert_eq!(cse.values, vec![10.0, 12.0]);
        assert_eq!(cse.median, 11.0);
        assert_eq!(cse.q1, 10.5);
        assert_eq!((cse.min, cse.max), (10.0, 12.0));
    }

    #[test]
    fn package_trend_averages_each_figure_per_year() {
        let p = package_trend(&sample());
        assert_eq!(p[0].year, 2023);
        assert!((p[0].average - 8.0).abs() < 1e-9);
        assert!((p[0].highest - 24.0).abs() < 1e-9);
        assert!((p[1].lowest - (6.0 + 3.5 + 2.0) / 3.0).abs() < 1e-9);
    }

    #[test]
    fn scatter_carries_midlines_and_correlation() {
        let s = rate_vs_package(&sample());
        assert_eq!(s.points.len(), 5);
        let m = s.midlines.unwrap();
        assert!((m.avg_package - 39.0 / 5.0).abs() < 1e-9);
        assert!(s.correlation.unwrap() > 0.2);
    }

    #[test]
    fn company_ties_are_ordered_by_name() {
        let mut a = record(2024, "CSE", 100, 90, 10.0);
        a.top_company_1 = "Zoho".to_string();
        a.top_company_1_students = 7;
        a.top_company_2 = "Accenture".to_string();
        a.top_company_2_students = 7;
        a.top_company_3 = "Microsoft".to_string();
        a.top_company_3_students = 9;
        let mut b = record(2024, "ECE", 100, 50, 6.0);
        b.top_company_1 = "Accenture".to_string();
        b.top_company_1_students = 3;
        b.top_company_2 = "Zoho".to_string();
        b.top_company_2_students = 3;
        b.top_company_3 = String::new();
        b.top_company_3_students = 0;
        let rows = vec![a, b];

        let first = top_companies(&rows);
        assert_eq!(
            first,
            vec![
                Tally { name: "Accenture".to_string(), count: 10 },
                Tally { name: "Zoho".to_string(), count: 10 },
                Tally { name: "Microsoft".to_string(), count: 9 },
            ]
        );
        for _ in 0..5 {
            assert_eq!(top_companies(&rows), first);
        }
    }

    #[test]
    fn top_companies_truncates_to_ten() {
        let rows: Vec<Record> = (0..5)
            .map(|i| {
                let mut r = record(2024, &format!("B{i}"), 10, 5, 3.0);
                r.top_company_1 = format!("C{i}a");
                r.top_company_2 = format!("C{i}b");
                r.top_company_3 = format!("C{i}c");
                r
            })
            .collect();
        assert_eq!(top_companies(&rows).len(), TOP_COMPANY_LIMIT);
    }

    #[test]
    fn job_roles_count_mentions_without_truncation() {
        let roles = job_roles(&sample());
        assert_eq!(roles.len(), 3);
        assert!(roles.iter().all(|t| t.count == 5));
        assert_eq!(roles[0].name, "Data Analyst");
    }

    #[test]
    fn ols_fit_is_unavailable_for_identical_conversion_rates() {
        let c = internship_conversion(&sample());
        assert_eq!(c.points.len(), 5);
        assert!(c.fit.is_none());
    }

    #[test]
    fn ols_fit_reports_slope_and_direction() {
        let mut rows = sample();
        for (i, r) in rows.iter_mut().enumerate() {
            r.internship_conversion_rate_percent = 40.0 + 10.0 * i as f64;
            r.placement_percentage = 50.0 + 5.0 * i as f64;
        }
        let fit = internship_conversion(&rows).fit.unwrap();
        assert!((fit.slope - 0.5).abs() < 1e-9);
        assert!((fit.intercept - 30.0).abs() < 1e-9);
        assert_eq!(fit.correlation, Some(Correlation::Positive));
    }

    #[test]
    fn heatmap_marks_missing_pairs_explicitly() {
        let h = heatmap(&sample());
        assert_eq!(h.years, vec![2023, 2024]);
        assert_eq!(h.branches, vec!["CSE", "ECE", "Civil"]);
        assert_eq!(h.cell("Civil", 2023), None);
        assert_eq!(h.cells[2], vec![None, Some(25.0)]);
        assert_eq!(h.cell("CSE", 2024), Some(90.0));
    }

    #[test]
    fn empty_view_gives_ten_empty_datasets() {
        let t = table(vec![record(2024, "CSE", 100, 90, 12.0)]);
        let view = apply(&t, &FilterSpec::unrestricted().with_years([2001]));
        let charts = aggregate(&view);
        assert_eq!(charts.iter().count(), 10);
        assert!(charts.iter().all(ChartDataset::is_empty));
        for (dataset, kind) in charts.iter().zip(ChartKind::ALL) {
            assert_eq!(dataset.kind(), kind);
        }
    }

    #[test]
    fn aggregation_is_deterministic() {
        let t = table(sample());
        let view = apply(&t, &FilterSpec::unrestricted());
        let a = serde_json::to_string(&aggregate(&view)).unwrap();
        let b = serde_json::to_string(&aggregate(&view)).unwrap();
        assert_eq!(a, b);
    }
}
