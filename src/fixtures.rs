//! Record builders shared by the unit tests.
use crate::types::{Record, Table};

/// A consistent record: `placement_percentage` is derived from the counts
/// and the package spread is centred on `avg_package`.
pub fn record(year: i32, branch: &str, total: u32, placed: u32, avg_package: f64) -> Record {
    let pct = if total == 0 {
        0.0
    } else {
        f64::from(placed) / f64::from(total) * 100.0
    };
    Record {
        year,
        branch: branch.to_string(),
        total_students: total,
        placed_students: placed,
        unplaced_students: total - placed,
        placement_percentage: pct,
        highest_package_lpa: avg_package * 3.0,
        median_package_lpa: avg_package * 0.9,
        lowest_package_lpa: avg_package * 0.5,
        avg_package_lpa: avg_package,
        top_company_1: "TCS".to_string(),
        top_company_1_students: 10,
        top_company_2: "Infosys".to_string(),
        top_company_2_students: 5,
        top_company_3: "Wipro".to_string(),
        top_company_3_students: 2,
        top_job_role_1: "Software Engineer".to_string(),
        top_job_role_2: "Data Analyst".to_string(),
        top_job_role_3: "QA Engineer".to_string(),
        internship_conversion_rate_percent: 50.0,
    }
}

/// Build a table in canonical (year, branch) order.
pub fn table(mut records: Vec<Record>) -> Table {
    records.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.branch.cmp(&b.branch)));
    Table::from_canonical(records)
}
