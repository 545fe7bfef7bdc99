use crate::error::SchemaError;
use crate::types::{RawTable, Record, Table, REQUIRED_COLUMNS};
use crate::util::{parse_f64_safe, parse_i32_safe, parse_u32_safe};
use csv::{ReaderBuilder, Trim};
use std::collections::BTreeSet;
use std::fs::File;
use std::io::Read;
use std::path::Path;
use tracing::{debug, info};

/// Maximum gap, in percentage points, between the stated
/// `placement_percentage` and `placed / total * 100`.
pub const PERCENTAGE_TOLERANCE: f64 = 1.0;

/// Read a delimited source into an untyped [`RawTable`].
///
/// Rows may be ragged; short rows surface later as missing values in the
/// validator rather than as CSV errors.
pub fn read_raw<R: Read>(reader: R) -> Result<RawTable, SchemaError> {
    let mut rdr = ReaderBuilder::new()
        .flexible(true)
        .trim(Trim::All)
        .from_reader(reader);
    let headers = rdr.headers()?.iter().map(str::to_string).collect();
    let mut rows = Vec::new();
    for result in rdr.records() {
        let record = result?;
        rows.push(record.iter().map(str::to_string).collect());
    }
    Ok(RawTable { headers, rows })
}

/// Read and validate a table from any reader.
pub fn read_table<R: Read>(reader: R) -> Result<Table, SchemaError> {
    let raw = read_raw(reader)?;
    validate(&raw)
}

/// Open `path`, read it as CSV and validate it.
pub fn load_table(path: &Path) -> Result<Table, SchemaError> {
    let file = File::open(path).map_err(|source| SchemaError::Io {
        path: path.display().to_string(),
        source,
    })?;
    let table = read_table(file)?;
    info!(
        path = %path.display(),
        rows = table.len(),
        years = table.years().len(),
        branches = table.branches().len(),
        "loaded placement table"
    );
    Ok(table)
}

/// Check a raw table against the placement schema and build a [`Table`].
///
/// Columns are checked first (in [`REQUIRED_COLUMNS`] order), then rows top
/// to bottom; the first problem found is returned.
pub fn validate(raw: &RawTable) -> Result<Table, SchemaError> {
    let mut index = [0usize; REQUIRED_COLUMNS.len()];
    for (slot, column) in index.iter_mut().zip(REQUIRED_COLUMNS) {
        *slot = raw
            .column_index(column)
            .ok_or_else(|| SchemaError::MissingColumn {
                column: column.to_string(),
            })?;
    }

    let mut seen: BTreeSet<(i32, String)> = BTreeSet::new();
    let mut records = Vec::with_capacity(raw.rows.len());
    for (row, cells) in raw.rows.iter().enumerate() {
        let reader = RowReader {
            row,
            cells,
            index: &index,
        };
        let record = reader.record()?;
        check_consistency(row, &record)?;
        if !seen.insert((record.year, record.branch.clone())) {
            return Err(SchemaError::DuplicateKey {
                row,
                year: record.year,
                branch: record.branch,
            });
        }
        records.push(record);
    }

    records.sort_by(|a, b| a.year.cmp(&b.year).then_with(|| a.branch.cmp(&b.branch)));
    debug!(rows = records.len(), "schema validation passed");
    Ok(Table::from_canonical(records))
}

/// Typed access to one raw row through the resolved column positions.
struct RowReader<'a> {
    row: usize,
    cells: &'a [String],
    index: &'a [usize; REQUIRED_COLUMNS.len()],
}

impl RowReader<'_> {
    fn cell(&self, column: &str) -> &str {
        REQUIRED_COLUMNS
            .iter()
            .position(|c| *c == column)
            .and_then(|i| self.cells.get(self.index[i]))
            .map(String::as_str)
            .unwrap_or("")
    }

    fn invalid(&self, column: &str, expected: &'static str) -> SchemaError {
        SchemaError::InvalidValue {
            row: self.row,
            column: column.to_string(),
            value: self.cell(column).to_string(),
            expected,
        }
    }

    fn year(&self, column: &str) -> Result<i32, SchemaError> {
        parse_i32_safe(Some(self.cell(column))).ok_or_else(|| self.invalid(column, "an integer"))
    }

    fn count(&self, column: &str) -> Result<u32, SchemaError> {
        parse_u32_safe(Some(self.cell(column)))
            .ok_or_else(|| self.invalid(column, "a non-negative integer"))
    }

    fn number(&self, column: &str) -> Result<f64, SchemaError> {
        parse_f64_safe(Some(self.cell(column))).ok_or_else(|| self.invalid(column, "a number"))
    }

    fn required_text(&self, column: &str) -> Result<String, SchemaError> {
        let s = self.cell(column).trim();
        if s.is_empty() {
            return Err(self.invalid(column, "a non-empty string"));
        }
        Ok(s.to_string())
    }

    // Ranked company and role slots may legitimately be blank.
    fn text(&self, column: &str) -> String {
        self.cell(column).trim().to_string()
    }

    fn record(&self) -> Result<Record, SchemaError> {
        Ok(Record {
            year: self.year("year")?,
            branch: self.required_text("branch")?,
            total_students: self.count("total_students")?,
            placed_students: self.count("placed_students")?,
            unplaced_students: self.count("unplaced_students")?,
            placement_percentage: self.number("placement_percentage")?,
            highest_package_lpa: self.number("highest_package_LPA")?,
            median_package_lpa: self.number("median_package_LPA")?,
            lowest_package_lpa: self.number("lowest_package_LPA")?,
            avg_package_lpa: self.number("avg_package_LPA")?,
            top_company_1: self.text("top_company_1"),
            top_company_1_students: self.count("top_company_1_students")?,
            top_company_2: self.text("top_company_2"),
            top_company_2_students: self.count("top_company_2_students")?,
            top_company_3: self.text("top_company_3"),
            top_company_3_students: self.count("top_company_3_students")?,
            top_job_role_1: self.text("top_job_role_1"),
            top_job_role_2: self.text("top_job_role_2"),
            top_job_role_3: self.text("top_job_role_3"),
            internship_conversion_rate_percent: self.number("internship_conversion_rate_percent")?,
        })
    }
}

fn check_range(
    row: usize,
    column: &str,
    value: f64,
    min: f64,
    max: f64,
) -> Result<(), SchemaError> {
    if value < min || value > max {
        return Err(SchemaError::OutOfRange {
            row,
            column: column.to_string(),
            value,
            min,
            max,
        });
    }
    Ok(())
}

fn check_consistency(row: usize, r: &Record) -> Result<(), SchemaError> {
    if u64::from(r.placed_students) + u64::from(r.unplaced_students) != u64::from(r.total_students)
    {
        return Err(SchemaError::Inconsistent {
            row,
            column: "unplaced_students".to_string(),
            detail: format!(
                "placed ({}) + unplaced ({}) != total ({})",
                r.placed_students, r.unplaced_students, r.total_students
            ),
        });
    }

    check_range(row, "placement_percentage", r.placement_percentage, 0.0, 100.0)?;
    for (column, value) in [
        ("highest_package_LPA", r.highest_package_lpa),
        ("median_package_LPA", r.median_package_lpa),
        ("lowest_package_LPA", r.lowest_package_lpa),
        ("avg_package_LPA", r.avg_package_lpa),
    ] {
        check_range(row, column, value, 0.0, f64::INFINITY)?;
    }
    check_range(
        row,
        "internship_conversion_rate_percent",
        r.internship_conversion_rate_percent,
        0.0,
        100.0,
    )?;

    if r.total_students > 0 {
        let derived = f64::from(r.placed_students) / f64::from(r.total_students) * 100.0;
        if (derived - r.placement_percentage).abs() > PERCENTAGE_TOLERANCE {
            return Err(SchemaError::Inconsistent {
                row,
                column: "placement_percentage".to_string(),
                detail: format!(
                    "stated {} but placed/total gives {:.2}",
                    r.placement_percentage, derived
                ),
            });
        }
    }
    Ok(())
}
