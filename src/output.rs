use crate::charts::ChartDataset;
use crate::filter::FilterOptions;
use crate::metrics::MetricsSnapshot;
use crate::types::Record;
use crate::util::{format_count, format_delta, format_number};
use serde::Serialize;
use std::error::Error;
use std::io::Write;
use tabled::{settings::Style, Table, Tabled};

/// Outcome of any write in this module.
pub type WriteResult = Result<(), Box<dyn Error + Send + Sync>>;

/// Serialise rows as CSV, taking the header line from the first row.
///
/// For [`Record`]s the headers match the input schema, so the output can be
/// loaded again as-is.
pub fn write_csv_to<W: Write, T: Serialize>(writer: W, rows: &[T]) -> WriteResult {
    let mut wtr = csv::Writer::from_writer(writer);
    for r in rows {
        wtr.serialize(r)?;
    }
    wtr.flush()?;
    Ok(())
}

/// Filtered rows in export form, header included even when empty.
pub fn write_records<W: Write>(writer: W, rows: &[Record]) -> WriteResult {
    if rows.is_empty() {
        let mut wtr = csv::Writer::from_writer(writer);
        wtr.write_record(crate::types::REQUIRED_COLUMNS)?;
        wtr.flush()?;
        return Ok(());
    }
    write_csv_to(writer, rows)
}

/// Pretty-printed JSON followed by a newline.
pub fn write_json<W: Write, T: Serialize>(mut writer: W, value: &T) -> WriteResult {
    serde_json::to_writer_pretty(&mut writer, value)?;
    writer.write_all(b"\n")?;
    writer.flush()?;
    Ok(())
}

/// Markdown table of at most `max_rows` rows, noting how many were left out.
pub fn render_rows<T: Tabled + Clone>(rows: &[T], max_rows: usize) -> String {
    let shown = &rows[..rows.len().min(max_rows)];
    let mut out = if shown.is_empty() {
        "(no rows)".to_string()
    } else {
        Table::new(shown.to_vec()).with(Style::markdown()).to_string()
    };
    let hidden = rows.len() - shown.len();
    if hidden > 0 {
        out.push_str(&format!("\n... {} more rows", format_count(hidden)));
    }
    out.push('\n');
    out
}

/// A dataset's title, table preview and any fitted lines, ready to print.
pub fn render_dataset(dataset: &ChartDataset, max_rows: usize) -> String {
    let body = match dataset {
        ChartDataset::Trends(rows) => render_rows(rows, max_rows),
        ChartDataset::PlacedVsUnplaced(rows) => render_rows(rows, max_rows),
        ChartDataset::BranchRate(rows) => render_rows(rows, max_rows),
        ChartDataset::PackageDistribution(rows) => render_rows(rows, max_rows),
        ChartDataset::PackageTrend(rows) => render_rows(rows, max_rows),
        ChartDataset::RateVsPackage(scatter) => {
            let mut text = render_rows(&scatter.points, max_rows);
            if let Some(m) = scatter.midlines {
                text.push_str(&format!(
                    "Midlines: placement {}%, avg package {} LPA\n",
                    format_number(m.placement_rate, 2),
                    format_number(m.avg_package, 2)
                ));
            }
            text
        }
        ChartDataset::TopCompanies(rows) | ChartDataset::JobRoles(rows) => {
            render_rows(rows, max_rows)
        }
        ChartDataset::InternshipConversion(conv) => {
            let line = match conv.fit {
                Some(fit) => format!(
                    "Trend line: y = {}x + {}\n",
                    format_number(fit.slope, 3),
                    format_number(fit.intercept, 2)
                ),
                None => "Trend line: n/a\n".to_string(),
            };
            render_rows(&conv.points, max_rows) + &line
        }
        ChartDataset::Heatmap(heatmap) => render_rows(&heatmap.flatten(), max_rows),
    };
    format!("{}\n\n{}", dataset.kind().title(), body)
}

/// Key figures with their year-over-year deltas.
#[derive(Debug, Clone, Tabled)]
struct KpiRow {
    #[tabled(rename = "Metric")]
    metric: &'static str,
    #[tabled(rename = "Value")]
    value: String,
    #[tabled(rename = "YoY")]
    delta: String,
}

pub fn print_metrics(m: &MetricsSnapshot) {
    let holder = m
        .highest_package_holder
        .as_ref()
        .map(|h| format!(" ({}, {})", h.branch, h.year))
        .unwrap_or_default();
    let rows = vec![
        KpiRow {
            metric: "Total Placements",
            value: format_count(m.total_placements.value),
            delta: format_delta(m.total_placements.delta, 0, ""),
        },
        KpiRow {
            metric: "Placement Rate",
            value: format!("{}%", format_number(m.placement_rate.value, 1)),
            delta: format_delta(m.placement_rate.delta, 1, " pp"),
        },
        KpiRow {
            metric: "Highest Package",
            value: format!("{} LPA{}", format_number(m.highest_package.value, 2), holder),
            delta: format_delta(m.highest_package.delta, 2, " LPA"),
        },
        KpiRow {
            metric: "Avg Package",
            value: format!("{} LPA", format_number(m.average_package.value, 2)),
            delta: format_delta(m.average_package.delta, 2, " LPA"),
        },
    ];
    match m.latest_year {
        Some(y) => println!("Key metrics (YoY: {} vs {})\n", y, y - 1),
        None => println!("Key metrics\n"),
    }
    println!("{}\n", Table::new(rows).with(Style::markdown()));
}

pub fn print_options(opts: &FilterOptions) {
    let years: Vec<String> = opts.years.iter().map(i32::to_string).collect();
    println!("Years:    {}", years.join(", "));
    println!("Branches: {}", opts.branches.join(", "));
    match opts.avg_package {
        Some(b) => println!(
            "Avg package range: {} - {} LPA",
            format_number(b.min, 2),
            format_number(b.max, 2)
        ),
        None => println!("Avg package range: n/a"),
    }
    println!(
        "Placement % range: {} - {}",
        format_number(opts.placement_rate.min, 0),
        format_number(opts.placement_rate.max, 0)
    );
}
