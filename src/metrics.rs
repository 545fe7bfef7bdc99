//! Headline KPIs with year-over-year deltas.
//!
//! Placement rate and average package are weighted by students, not by
//! rows: `sum(placed) / sum(total)` and the placed-weighted mean of
//! `avg_package_LPA`.
use crate::filter::FilterSpec;
use crate::types::{FilteredView, Record, Table};
use serde::Serialize;

/// A KPI value and its change against the prior year.
///
/// `delta` is `None` when the prior year has no rows in the reference
/// table; that is distinct from a change of zero.
#[derive(Debug, Clone, Copy, PartialEq, Serialize)]
pub struct Kpi<T> {
    pub value: T,
    pub delta: Option<f64>,
}

impl<T> Kpi<T> {
    fn without_delta(value: T) -> Self {
        Self { value, delta: None }
    }
}

/// Where the highest package in view was recorded.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PackageHolder {
    pub branch: String,
    pub year: i32,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct MetricsSnapshot {
    /// Latest year present in the view; deltas compare it with the year
    /// before.
    pub latest_year: Option<i32>,
    pub total_placements: Kpi<u64>,
    pub placement_rate: Kpi<f64>,
    pub highest_package: Kpi<f64>,
    pub highest_package_holder: Option<PackageHolder>,
    pub average_package: Kpi<f64>,
}

impl MetricsSnapshot {
    pub fn empty() -> Self {
        Self {
            latest_year: None,
            total_placements: Kpi::without_delta(0),
            placement_rate: Kpi::without_delta(0.0),
            highest_package: Kpi::without_delta(0.0),
            highest_package_holder: None,
            average_package: Kpi::without_delta(0.0),
        }
    }
}

/// Running sums for one group of rows.
#[derive(Default)]
struct Totals<'a> {
    placed: u64,
    students: u64,
    package_weight: f64,
    highest: Option<&'a Record>,
}

impl<'a> Totals<'a> {
    fn over<I: IntoIterator<Item = &'a Record>>(rows: I) -> Self {
        let mut t = Totals::default();
        for r in rows {
            t.placed += u64::from(r.placed_students);
            t.students += u64::from(r.total_students);
            t.package_weight += r.avg_package_lpa * f64::from(r.placed_students);
            // Strict comparison keeps the first row in table order on ties.
            if t.highest.map_or(true, |h| r.highest_package_lpa > h.highest_package_lpa) {
                t.highest = Some(r);
            }
        }
        t
    }

    fn placement_rate(&self) -> f64 {
        if self.students == 0 {
            0.0
        } else {
            self.placed as f64 / self.students as f64 * 100.0
        }
    }

    fn average_package(&self) -> f64 {
        if self.placed == 0 {
            0.0
        } else {
            self.package_weight / self.placed as f64
        }
    }

    fn highest_package(&self) -> f64 {
        self.highest.map_or(0.0, |r| r.highest_package_lpa)
    }
}

/// Compute the KPI snapshot for `view`.
///
/// The prior-year comparison reads from the unfiltered `table` with only
/// the branch selection of `spec` applied, so narrowing the view to the
/// latest year still yields a delta.
pub fn compute(view: &FilteredView, table: &Table, spec: &FilterSpec) -> MetricsSnapshot {
    let rows = view.records();
    let Some(latest) = rows.iter().map(|r| r.year).max() else {
        return MetricsSnapshot::empty();
    };

    let overall = Totals::over(rows);
    let current = Totals::over(rows.iter().filter(|r| r.year == latest));
    let previous = latest.checked_sub(1).and_then(|prior| {
        let prior_rows: Vec<&Record> = table
            .records()
            .iter()
            .filter(|r| r.year == prior && spec.allows_branch(&r.branch))
            .collect();
        (!prior_rows.is_empty()).then(|| Totals::over(prior_rows))
    });

    let delta = |f: fn(&Totals<'_>) -> f64| previous.as_ref().map(|p| f(&current) - f(p));

    MetricsSnapshot {
        latest_year: Some(latest),
        total_placements: Kpi {
            value: overall.placed,
            delta: delta(|t| t.placed as f64),
        },
        placement_rate: Kpi {
            value: overall.placement_rate(),
            delta: delta(|t| t.placement_rate()),
        },
        highest_package: Kpi {
            value: overall.highest_package(),
            delta: delta(|t| t.highest_package()),
        },
        highest_package_holder: overall.highest.map(|r| PackageHolder {
            branch: r.branch.clone(),
            year: r.year,
        }),
        average_package: Kpi {
            value: overall.average_package(),
            delta: delta(|t| t.average_package()),
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::filter::apply;
    use crate::fixtures::{record, table};

    fn close(a: f64, b: f64) -> bool {
        (a - b).abs() < 1e-9
    }

    #[test]
    fn placement_rate_is_weighted_by_students() {
        // 900/1000 and 10/100: weighted 910/1100, naive mean 50%.
        let t = table(vec![
            record(2024, "CSE", 1000, 900, 10.0),
            record(2024, "Civil", 100, 10, 4.0),
        ]);
        let view = apply(&t, &FilterSpec::unrestricted());
        let m = compute(&view, &t, &FilterSpec::unrestricted());

        let naive = view
            .records()
            .iter()
            .map(|r| r.placement_percentage)
            .sum::<f64>()
            / 2.0;
        assert!(close(m.placement_rate.value, 910.0 / 1100.0 * 100.0));
        assert!((m.placement_rate.value - naive).abs() > 1.0);
        assert_eq!(m.total_placements.value, 910);
    }

    #[test]
    fn weighted_package_is_neutral_for_equal_values() {
        let t = table(vec![
            record(2024, "CSE", 100, 90, 8.0),
            record(2024, "ECE", 100, 10, 8.0),
        ]);
        let view = apply(&t, &FilterSpec::unrestricted());
        let m = compute(&view, &t, &FilterSpec::unrestricted());
        assert!(close(m.average_package.value, 8.0));
    }

    #[test]
    fn weighted_package_leans_toward_larger_placements() {
        let t = table(vec![
            record(2024, "CSE", 100, 90, 12.0),
            record(2024, "ECE", 100, 10, 6.0),
        ]);
        let view = apply(&t, &FilterSpec::unrestricted());
        let m = compute(&view, &t, &FilterSpec::unrestricted());
        assert!(close(m.average_package.value, (12.0 * 90.0 + 6.0 * 10.0) / 100.0));
        assert!(m.average_package.value > 9.0);
    }

    #[test]
    fn deltas_compare_latest_year_with_unfiltered_prior_year() {
        let t = table(vec![
            record(2023, "CSE", 100, 80, 10.0),
            record(2023, "ECE", 100, 60, 6.0),
            record(2024, "CSE", 100, 90, 12.0),
            record(2024, "ECE", 100, 70, 7.0),
        ]);
        let spec = FilterSpec::unrestricted().with_years([2024]);
        let view = apply(&t, &spec);
        let m = compute(&view, &t, &spec);

        assert_eq!(m.latest_year, Some(2024));
        assert_eq!(m.total_placements.value, 160);
        assert_eq!(m.total_placements.delta, Some(20.0));
        assert!(close(m.placement_rate.delta.unwrap(), 80.0 - 70.0));
        assert!(close(m.highest_package.delta.unwrap(), 36.0 - 30.0));
        let cur = (12.0 * 90.0 + 7.0 * 70.0) / 160.0;
        let prev = (10.0 * 80.0 + 6.0 * 60.0) / 140.0;
        assert!(close(m.average_package.delta.unwrap(), cur - prev));
    }

    #[test]
    fn prior_year_respects_branch_selection() {
        let t = table(vec![
            record(2023, "CSE", 100, 80, 10.0),
            record(2023, "ECE", 100, 60, 6.0),
            record(2024, "ECE", 100, 70, 7.0),
        ]);
        let spec = FilterSpec::unrestricted().with_branches(["ECE"]);
        let view = apply(&t, &spec);
        let m = compute(&view, &t, &spec);
        assert_eq!(m.total_placements.delta, Some(10.0));
    }

    #[test]
    fn missing_prior_year_leaves_deltas_undefined() {
        let t = table(vec![
            record(2022, "CSE", 100, 80, 10.0),
            record(2024, "CSE", 100, 90, 12.0),
        ]);
        let view = apply(&t, &FilterSpec::unrestricted());
        let m = compute(&view, &t, &FilterSpec::unrestricted());
        assert_eq!(m.total_placements.delta, None);
        assert_eq!(m.placement_rate.delta, None);
        assert_eq!(m.highest_package.delta, None);
        assert_eq!(m.average_package.delta, None);
        assert_eq!(m.total_placements.value, 170);
    }

    #[test]
    fn highest_package_names_its_holder() {
        let t = table(vec![
            record(2023, "CSE", 100, 80, 15.0),
            record(2024, "CSE", 100, 90, 12.0),
        ]);
        let view = apply(&t, &FilterSpec::unrestricted());
        let m = compute(&view, &t, &FilterSpec::unrestricted());
        assert!(close(m.highest_package.value, 45.0));
        assert_eq!(
            m.highest_package_holder,
            Some(PackageHolder {
                branch: "CSE".to_string(),
                year: 2023
            })
        );
    }

    #[test]
    fn empty_view_reports_zeroes_without_deltas() {
        let t = table(vec![record(2024, "CSE", 100, 90, 12.0)]);
        let spec = FilterSpec::unrestricted().with_years([2020]);
        let view = apply(&t, &spec);
        assert_eq!(compute(&view, &t, &spec), MetricsSnapshot::empty());
    }
}
