use placement_analytics::filter::apply;
use placement_analytics::output::write_records;
use placement_analytics::{
    load_table, read_table, ChartDataset, ChartKind, FilterSpec, MetricsSnapshot, SchemaError,
    Session, Table, NO_DATA_MESSAGE,
};
use std::io::Write;

const DATA: &str = "\
year,branch,total_students,placed_students,unplaced_students,placement_percentage,highest_package_LPA,median_package_LPA,lowest_package_LPA,avg_package_LPA,top_company_1,top_company_1_students,top_company_2,top_company_2_students,top_company_3,top_company_3_students,top_job_role_1,top_job_role_2,top_job_role_3,internship_conversion_rate_percent
2024,ECE,100,72,28,72.0,20.0,6.5,4.0,7.0,Infosys,20,TCS,14,HCL,9,Embedded,SDE,Support,52.0
2023,CSE,100,80,20,80.0,30.0,9.0,5.0,10.0,TCS,20,Infosys,15,Wipro,10,SDE,Analyst,QA,60.0
2024,CSE,100,95,5,95.0,42.0,11.0,6.0,12.0,TCS,25,Google,20,Infosys,15,SDE,ML Engineer,Analyst,70.0
2023,ECE,100,70,30,70.0,18.0,6.0,3.5,6.0,Infosys,18,TCS,12,HCL,8,Embedded,SDE,Support,50.0
";

fn session() -> Session {
    Session::new(read_table(DATA.as_bytes()).unwrap())
}

fn close(a: f64, b: f64) -> bool {
    (a - b).abs() < 1e-9
}

#[test]
fn latest_year_view_compares_against_prior_year() {
    let eval = session().evaluate(&FilterSpec::unrestricted().with_years([2024]));
    let m = &eval.metrics;

    assert_eq!(eval.row_count, 2);
    assert_eq!(eval.active_filter_count, 1);
    assert_eq!(m.latest_year, Some(2024));
    assert_eq!(m.total_placements.value, 167);
    assert_eq!(m.total_placements.delta, Some(17.0));
    assert!(close(m.placement_rate.value, 83.5));
    assert!(close(m.placement_rate.delta.unwrap(), 8.5));
    assert!(close(m.highest_package.value, 42.0));
    assert!(close(m.highest_package.delta.unwrap(), 12.0));

    let holder = m.highest_package_holder.as_ref().unwrap();
    assert_eq!((holder.branch.as_str(), holder.year), ("CSE", 2024));

    let avg_2024 = (12.0 * 95.0 + 7.0 * 72.0) / 167.0;
    let avg_2023 = (10.0 * 80.0 + 6.0 * 70.0) / 150.0;
    assert!(close(m.average_package.value, avg_2024));
    assert!(close(m.average_package.delta.unwrap(), avg_2024 - avg_2023));
}

#[test]
fn branch_selection_scopes_the_prior_year() {
    let spec = FilterSpec::unrestricted()
        .with_years([2024])
        .with_branches(["CSE"]);
    let eval = session().evaluate(&spec);
    assert_eq!(eval.metrics.total_placements.value, 95);
    assert_eq!(eval.metrics.total_placements.delta, Some(15.0));
}

#[test]
fn full_table_feeds_every_chart() {
    let eval = session().evaluate(&FilterSpec::unrestricted());
    assert_eq!(eval.active_filter_count, 0);
    assert!(eval.charts.iter().all(|d| !d.is_empty()));

    match eval.charts.get(ChartKind::TopCompanies) {
        ChartDataset::TopCompanies(rows) => {
            assert_eq!(rows[0].name, "TCS");
            assert_eq!(rows[0].count, 71);
            assert_eq!(rows[1].name, "Infosys");
            assert_eq!(rows[1].count, 68);
        }
        other => panic!("unexpected dataset {:?}", other.kind()),
    }

    let branch = eval
        .insights
        .iter()
        .find(|i| i.chart == ChartKind::BranchRate)
        .unwrap();
    assert!(branch.text.starts_with("CSE leads"), "{}", branch.text);
}

#[test]
fn empty_selection_is_not_an_error() {
    let eval = session().evaluate(&FilterSpec::unrestricted().with_branches(["Civil"]));
    assert_eq!(eval.row_count, 0);
    assert_eq!(eval.metrics, MetricsSnapshot::empty());
    assert_eq!(eval.charts.iter().count(), 10);
    assert!(eval.charts.iter().all(|d| d.is_empty()));
    assert!(eval.insights.iter().all(|i| i.text == NO_DATA_MESSAGE));
}

#[test]
fn filtering_a_filtered_view_changes_nothing() {
    let s = session();
    let spec = FilterSpec::unrestricted()
        .with_avg_package(6.5, 11.0)
        .with_placement_rate(60.0, 90.0);
    let once = apply(s.table(), &spec);
    let twice = apply(&Table::from(once.clone()), &spec);
    assert_eq!(once.records(), twice.records());
    assert_eq!(once.len(), 2);
}

#[test]
fn exported_view_reloads_from_disk() {
    let eval = session().evaluate(&FilterSpec::unrestricted().with_branches(["ECE"]));
    let file = tempfile::NamedTempFile::new().unwrap();
    write_records(file.as_file(), eval.view.records()).unwrap();

    let reloaded = load_table(file.path()).unwrap();
    assert_eq!(reloaded.records(), eval.view.records());
}

#[test]
fn malformed_file_names_row_and_column() {
    let mut file = tempfile::NamedTempFile::new().unwrap();
    let broken = DATA.replacen("2023,CSE,100,80,20", "2023,CSE,100,80,25", 1);
    file.write_all(broken.as_bytes()).unwrap();

    let err = load_table(file.path()).unwrap_err();
    assert!(matches!(err, SchemaError::Inconsistent { .. }));
    assert_eq!(err.column(), Some("unplaced_students"));
    assert_eq!(err.row(), Some(1));
}
