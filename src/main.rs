// Entry point and high-level CLI flow.
//
// Every subcommand loads the placement CSV once, evaluates one filter
// selection and renders it. `interactive` keeps the loaded session for the
// whole run and lets the user change filters between summaries until they
// choose exit or stdin closes.
use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Args, Parser, Subcommand};
use once_cell::sync::OnceCell;
use placement_analytics::output::{
    print_metrics, print_options, render_dataset, write_json, write_records,
};
use placement_analytics::util::format_count;
use placement_analytics::{load_table, Evaluation, FilterSpec, Session};
use serde::Serialize;
use std::fs::File;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;

// Loaded at most once per run; every evaluation borrows it.
static SESSION: OnceCell<Session> = OnceCell::new();

#[derive(Parser)]
#[command(name = "placement-analytics")]
#[command(about = "Filter, summarise and describe campus placement records", long_about = None)]
struct Cli {
    /// Placement CSV to analyse
    #[arg(
        long,
        global = true,
        env = "PLACEMENT_DATA",
        default_value = "data/placement_data.csv"
    )]
    data: PathBuf,
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// List the years, branches and ranges available for filtering
    Options,
    /// Print key metrics, chart previews and insights
    Summary {
        #[command(flatten)]
        filters: FilterArgs,
        /// Rows shown per chart preview
        #[arg(long, default_value_t = 5)]
        rows: usize,
    },
    /// Write the filtered rows as CSV with the input headers
    Export {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "placement_data_filtered.csv")]
        out: PathBuf,
    },
    /// Write metrics, chart datasets and insights as JSON
    Report {
        #[command(flatten)]
        filters: FilterArgs,
        #[arg(long, default_value = "placement_report.json")]
        out: PathBuf,
    },
    /// Menu-driven session over the loaded table
    Interactive,
}

#[derive(Args, Debug, Clone, Default)]
struct FilterArgs {
    /// Keep only these placement years (repeatable)
    #[arg(long = "year")]
    years: Vec<i32>,
    /// Keep only these branches (repeatable)
    #[arg(long = "branch")]
    branches: Vec<String>,
    /// Lower bound on average package, LPA
    #[arg(long)]
    min_package: Option<f64>,
    /// Upper bound on average package, LPA
    #[arg(long)]
    max_package: Option<f64>,
    /// Lower bound on placement percentage
    #[arg(long)]
    min_rate: Option<f64>,
    /// Upper bound on placement percentage
    #[arg(long)]
    max_rate: Option<f64>,
}

impl FilterArgs {
    fn to_spec(&self) -> FilterSpec {
        let mut spec = FilterSpec::unrestricted()
            .with_years(self.years.iter().copied())
            .with_branches(self.branches.iter().cloned());
        if self.min_package.is_some() || self.max_package.is_some() {
            spec = spec.with_avg_package(
                self.min_package.unwrap_or(0.0),
                self.max_package.unwrap_or(f64::INFINITY),
            );
        }
        if self.min_rate.is_some() || self.max_rate.is_some() {
            spec = spec.with_placement_rate(
                self.min_rate.unwrap_or(0.0),
                self.max_rate.unwrap_or(100.0),
            );
        }
        spec
    }
}

#[derive(Serialize)]
struct ReportFile<'a> {
    generated_at: String,
    source: String,
    #[serde(flatten)]
    evaluation: &'a Evaluation,
}

fn main() -> Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .with_writer(io::stderr)
        .init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Options => print_options(&session(&cli.data)?.options()),
        Commands::Summary { filters, rows } => {
            print_summary(&session(&cli.data)?.evaluate(&filters.to_spec()), rows);
        }
        Commands::Export { filters, out } => {
            export(&session(&cli.data)?.evaluate(&filters.to_spec()), &out)?;
        }
        Commands::Report { filters, out } => {
            let eval = session(&cli.data)?.evaluate(&filters.to_spec());
            let report = ReportFile {
                generated_at: Local::now().to_rfc3339(),
                source: cli.data.display().to_string(),
                evaluation: &eval,
            };
            let file = File::create(&out)
                .with_context(|| format!("failed to create {}", out.display()))?;
            write_json(file, &report)
                .map_err(|e| anyhow!(e))
                .with_context(|| format!("failed to write report to {}", out.display()))?;
            println!("Report written to {}", out.display());
        }
        Commands::Interactive => run_interactive(&cli.data)?,
    }
    Ok(())
}

/// Load the table into a session on first use; later calls reuse it.
fn session(path: &Path) -> Result<&'static Session> {
    SESSION.get_or_try_init(|| {
        load_table(path)
            .map(Session::new)
            .with_context(|| format!("failed to load {}", path.display()))
    })
}

fn print_summary(eval: &Evaluation, rows: usize) {
    println!(
        "{} rows match ({} active filters)\n",
        format_count(eval.row_count),
        eval.active_filter_count
    );
    print_metrics(&eval.metrics);
    for (dataset, insight) in eval.charts.iter().zip(&eval.insights) {
        println!("{}", render_dataset(dataset, rows));
        println!("Insight: {}\n", insight.text);
    }
}

fn export(eval: &Evaluation, out: &Path) -> Result<()> {
    let file = File::create(out)
        .with_context(|| format!("failed to create {}", out.display()))?;
    write_records(file, eval.view.records())
        .map_err(|e| anyhow!(e))
        .with_context(|| format!("failed to export to {}", out.display()))?;
    info!(rows = eval.row_count, out = %out.display(), "exported filtered rows");
    println!(
        "Exported {} rows to {}",
        format_count(eval.row_count),
        out.display()
    );
    Ok(())
}

/// Print `label` and read one trimmed line.
///
/// `None` once the input is closed or can no longer be read.
fn prompt<R: BufRead>(input: &mut R, label: &str) -> Option<String> {
    print!("{label}");
    let _ = io::stdout().flush();
    let mut buf = String::new();
    match input.read_line(&mut buf) {
        Ok(0) => None,
        Ok(_) => Some(buf.trim().to_string()),
        Err(e) => {
            warn!(error = %e, "failed to read input");
            None
        }
    }
}

/// Comma-separated values; a blank line means "no restriction".
fn parse_list<T>(input: &str) -> Result<Vec<T>>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    input
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(|s| s.parse::<T>().map_err(|e| anyhow!("invalid value {s:?}: {e}")))
        .collect()
}

/// `lo-hi`, or blank for no bound.
fn parse_range(input: &str) -> Result<Option<(f64, f64)>> {
    if input.is_empty() {
        return Ok(None);
    }
    let (lo, hi) = input
        .split_once('-')
        .ok_or_else(|| anyhow!("expected a range like 5-12, got {input:?}"))?;
    let lo: f64 = lo.trim().parse().with_context(|| format!("invalid lower bound {lo:?}"))?;
    let hi: f64 = hi.trim().parse().with_context(|| format!("invalid upper bound {hi:?}"))?;
    if lo > hi {
        bail!("lower bound {lo} is above upper bound {hi}");
    }
    Ok(Some((lo, hi)))
}

/// Ask for each filter dimension in turn. `Ok(None)` if input closes midway.
fn prompt_filters<R: BufRead>(session: &Session, input: &mut R) -> Result<Option<FilterSpec>> {
    print_options(&session.options());
    println!();
    let Some(years) = prompt(input, "Years (comma-separated, blank = all): ") else {
        return Ok(None);
    };
    let Some(branches) = prompt(input, "Branches (comma-separated, blank = all): ") else {
        return Ok(None);
    };
    let Some(package) = prompt(input, "Avg package LPA min-max (blank = any): ") else {
        return Ok(None);
    };
    let Some(rate) = prompt(input, "Placement % min-max (blank = any): ") else {
        return Ok(None);
    };

    let mut spec = FilterSpec::unrestricted()
        .with_years(parse_list::<i32>(&years)?)
        .with_branches(parse_list::<String>(&branches)?);
    if let Some((lo, hi)) = parse_range(&package)? {
        spec = spec.with_avg_package(lo, hi);
    }
    if let Some((lo, hi)) = parse_range(&rate)? {
        spec = spec.with_placement_rate(lo, hi);
    }
    Ok(Some(spec))
}

fn run_interactive(path: &Path) -> Result<()> {
    let session = session(path)?;
    println!(
        "Loaded {} rows from {}",
        format_count(session.table().len()),
        path.display()
    );
    run_menu(session, &mut io::stdin().lock())
}

/// Menu loop over `input`; returns on `0` or when the input closes.
fn run_menu<R: BufRead>(session: &Session, input: &mut R) -> Result<()> {
    let mut spec = FilterSpec::unrestricted();

    loop {
        println!("\nSelect Option:");
        println!("[1] Set Filters");
        println!("[2] Show Summary");
        println!("[3] Export Filtered CSV");
        println!("[4] Reset Filters");
        println!("[0] Exit");

        let Some(choice) = prompt(input, "Enter choice: ") else {
            println!("\nInput closed. Exiting.");
            return Ok(());
        };
        match choice.as_str() {
            "1" => match prompt_filters(session, input) {
                Ok(Some(next)) => {
                    spec = next;
                    let eval = session.evaluate(&spec);
                    println!(
                        "{} rows match ({} active filters)",
                        format_count(eval.row_count),
                        eval.active_filter_count
                    );
                }
                Ok(None) => {
                    println!("\nInput closed. Exiting.");
                    return Ok(());
                }
                Err(e) => {
                    warn!(error = %e, "filters left unchanged");
                    println!("Filters left unchanged: {e}");
                }
            },
            "2" => print_summary(&session.evaluate(&spec), 5),
            "3" => {
                let Some(out) = prompt(input, "Output file [placement_data_filtered.csv]: ") else {
                    println!("\nInput closed. Exiting.");
                    return Ok(());
                };
                let out = if out.is_empty() {
                    PathBuf::from("placement_data_filtered.csv")
                } else {
                    PathBuf::from(out)
                };
                if let Err(e) = export(&session.evaluate(&spec), &out) {
                    println!("Export failed: {e:#}");
                }
            }
            "4" => {
                spec = FilterSpec::unrestricted();
                println!("Filters reset.");
            }
            "0" => {
                println!("Exiting.");
                return Ok(());
            }
            _ => println!("Invalid choice. Please enter 0-4."),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use placement_analytics::Table;
    use rstest::rstest;

    #[test]
    fn one_sided_bounds_fill_the_open_end() {
        let args = FilterArgs {
            min_package: Some(8.0),
            max_rate: Some(90.0),
            ..FilterArgs::default()
        };
        let spec = args.to_spec();
        let pkg = spec.avg_package.unwrap();
        assert_eq!(pkg.min, 8.0);
        assert!(pkg.max.is_infinite());
        let rate = spec.placement_rate.unwrap();
        assert_eq!((rate.min, rate.max), (0.0, 90.0));
    }

    #[test]
    fn no_flags_means_unrestricted() {
        assert_eq!(FilterArgs::default().to_spec(), FilterSpec::unrestricted());
    }

    #[rstest]
    #[case("", None)]
    #[case("5-12", Some((5.0, 12.0)))]
    #[case(" 0.5 - 7 ", Some((0.5, 7.0)))]
    fn ranges_parse(#[case] input: &str, #[case] expected: Option<(f64, f64)>) {
        assert_eq!(parse_range(input.trim()).unwrap(), expected);
    }

    #[rstest]
    #[case("12")]
    #[case("a-b")]
    #[case("9-3")]
    fn bad_ranges_are_rejected(#[case] input: &str) {
        assert!(parse_range(input).is_err());
    }

    #[test]
    fn lists_skip_blanks() {
        let years: Vec<i32> = parse_list("2023, ,2024").unwrap();
        assert_eq!(years, vec![2023, 2024]);
        assert!(parse_list::<i32>("20x3").is_err());
    }

    #[test]
    fn prompt_reads_trimmed_lines_until_input_closes() {
        let mut input = " 3 \n".as_bytes();
        assert_eq!(prompt(&mut input, "> "), Some("3".to_string()));
        assert_eq!(prompt(&mut input, "> "), None);
    }

    #[rstest]
    #[case("")]
    #[case("9\n")]
    #[case("2\n4\n")]
    #[case("1\n2024\n")]
    #[case("3\n")]
    fn menu_exits_when_input_closes(#[case] script: &str) {
        let session = Session::new(Table::default());
        let mut input = script.as_bytes();
        run_menu(&session, &mut input).unwrap();
        assert!(input.is_empty());
    }

    #[test]
    fn filter_prompts_build_a_spec() {
        let session = Session::new(Table::default());
        let mut input = "2023, 2024\nCSE\n5-12\n\n".as_bytes();
        let spec = prompt_filters(&session, &mut input).unwrap().unwrap();
        assert_eq!(
            spec,
            FilterSpec::unrestricted()
                .with_years([2023, 2024])
                .with_branches(["CSE"])
                .with_avg_package(5.0, 12.0)
        );
    }
}
