//! Flat tabular snapshot of the record store.
//!
//! One row per record: every raw column plus the derived columns recomputed
//! at export time. Reimport parses raw columns only; derived columns are
//! never trusted, so raw values round-trip exactly while grades and statuses
//! are recomputed on the next read.

use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::grading::classify;
use crate::models::{HerdProfile, LabEntry, LabPanel, SubmissionRecord};
use crate::pending::{days_since_submission, pending_stages};

/// Export errors.
#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Snapshot serialization error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Snapshot parse error at line {line}: {message}")]
    Parse { line: usize, message: String },
}

pub type ExportResult<T> = Result<T, ExportError>;

/// Raw columns at the front of the snapshot, in order. These round-trip
/// exactly through export and reimport.
pub const RAW_COLUMNS: [&str; 32] = [
    "id",
    "date",
    "farmer",
    "farm",
    "location",
    "mobile",
    "milk_today_litres",
    "lactating_total",
    "lactating_under_3m",
    "lactating_3_to_6m",
    "lactating_6_to_9m",
    "lactating_over_9m",
    "dry_cows",
    "heifers",
    "calves_under_1y",
    "mastitis_cases_now",
    "mastitis_cases_last_month",
    "breed",
    "somatic_cell_count",
    "scc_entered_on",
    "fat_percent",
    "fat_entered_on",
    "protein_percent",
    "protein_entered_on",
    "lactose_percent",
    "lactose_entered_on",
    "solids_not_fat",
    "solids_not_fat_entered_on",
    "freezing_point",
    "freezing_point_entered_on",
    "total_bacterial_count",
    "tbc_entered_on",
];

/// Derived columns appended after the raw block. Recomputed at export time
/// and ignored by reimport.
pub const DERIVED_COLUMNS: [&str; 6] = [
    "scc_grade",
    "scc_status",
    "composition_status",
    "tbc_status",
    "pending",
    "days_since_submission",
];

/// One flat row of the snapshot.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SnapshotRow {
    pub record: SubmissionRecord,
    pub scc_grade: String,
    pub scc_status: String,
    pub composition_status: String,
    pub tbc_status: String,
    pub pending: String,
    pub days_since_submission: i64,
}

impl SnapshotRow {
    fn from_record(record: &SubmissionRecord, as_of: NaiveDate) -> Self {
        let classification = classify(record);
        Self {
            record: record.clone(),
            scc_grade: classification.scc_grade.to_string(),
            scc_status: classification.scc_status.to_string(),
            composition_status: classification.composition_status.to_string(),
            tbc_status: classification.tbc_status.to_string(),
            pending: pending_stages(record).to_string(),
            days_since_submission: days_since_submission(record, as_of),
        }
    }

    fn to_csv_line(&self) -> String {
        let r = &self.record;
        let lab = &r.lab;
        let cells: Vec<String> = vec![
            r.id.to_string(),
            r.date.to_string(),
            escape_csv(&r.farmer),
            escape_csv(&r.farm),
            escape_csv(&r.location),
            escape_csv(&r.mobile),
            r.herd.milk_today_litres.to_string(),
            r.herd.lactating_total.to_string(),
            r.herd.lactating_under_3m.to_string(),
            r.herd.lactating_3_to_6m.to_string(),
            r.herd.lactating_6_to_9m.to_string(),
            r.herd.lactating_over_9m.to_string(),
            r.herd.dry_cows.to_string(),
            r.herd.heifers.to_string(),
            r.herd.calves_under_1y.to_string(),
            r.herd.mastitis_cases_now.to_string(),
            r.herd.mastitis_cases_last_month.to_string(),
            escape_csv(&r.herd.breed),
            value_cell(&lab.somatic_cell_count),
            date_cell(&lab.somatic_cell_count),
            value_cell(&lab.fat_percent),
            date_cell(&lab.fat_percent),
            value_cell(&lab.protein_percent),
            date_cell(&lab.protein_percent),
            value_cell(&lab.lactose_percent),
            date_cell(&lab.lactose_percent),
            value_cell(&lab.solids_not_fat),
            date_cell(&lab.solids_not_fat),
            value_cell(&lab.freezing_point),
            date_cell(&lab.freezing_point),
            value_cell(&lab.total_bacterial_count),
            date_cell(&lab.total_bacterial_count),
            escape_csv(&self.scc_grade),
            escape_csv(&self.scc_status),
            escape_csv(&self.composition_status),
            escape_csv(&self.tbc_status),
            escape_csv(&self.pending),
            self.days_since_submission.to_string(),
        ];
        cells.join(",")
    }
}

/// Flat snapshot of a record cohort.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Snapshot {
    /// Date the snapshot was taken (drives the days-since column)
    pub exported_on: NaiveDate,
    /// One row per record, in store order
    pub rows: Vec<SnapshotRow>,
}

impl Snapshot {
    /// Build a snapshot of the given records as of a date.
    pub fn from_records(records: &[SubmissionRecord], as_of: NaiveDate) -> Self {
        let rows = records
            .iter()
            .map(|r| SnapshotRow::from_record(r, as_of))
            .collect::<Vec<_>>();
        info!(rows = rows.len(), "snapshot built");
        Self {
            exported_on: as_of,
            rows,
        }
    }

    /// Render as delimited text with a header row.
    pub fn to_csv(&self) -> String {
        let mut csv = String::new();
        csv.push_str(&header_line());
        csv.push('\n');
        for row in &self.rows {
            csv.push_str(&row.to_csv_line());
            csv.push('\n');
        }
        csv
    }

    /// Render as pretty JSON.
    pub fn to_json(&self) -> ExportResult<String> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Parse records back out of a CSV snapshot.
    ///
    /// Only the raw columns are read; derived columns are recomputed on the
    /// next read of the restored records.
    pub fn from_csv(data: &str) -> ExportResult<Vec<SubmissionRecord>> {
        let mut lines = data.lines().enumerate();

        let (_, header) = lines.next().ok_or(ExportError::Parse {
            line: 1,
            message: "empty snapshot".into(),
        })?;
        if header != header_line() {
            return Err(ExportError::Parse {
                line: 1,
                message: "unrecognized snapshot header".into(),
            });
        }

        let mut records = Vec::new();
        for (index, line) in lines {
            if line.is_empty() {
                continue;
            }
            let line_no = index + 1;
            records.push(parse_row(line, line_no)?);
        }
        info!(records = records.len(), "snapshot parsed");
        Ok(records)
    }
}

fn header_line() -> String {
    let mut columns: Vec<&str> = RAW_COLUMNS.to_vec();
    columns.extend(DERIVED_COLUMNS);
    columns.join(",")
}

fn parse_row(line: &str, line_no: usize) -> ExportResult<SubmissionRecord> {
    let cells = split_csv_line(line).map_err(|message| ExportError::Parse {
        line: line_no,
        message,
    })?;
    let expected = RAW_COLUMNS.len() + DERIVED_COLUMNS.len();
    if cells.len() != expected {
        return Err(ExportError::Parse {
            line: line_no,
            message: format!("expected {} columns, got {}", expected, cells.len()),
        });
    }

    let row = RowReader {
        cells: &cells,
        line: line_no,
    };
    let lab = LabPanel {
        somatic_cell_count: row.lab_entry(18, 19, "somatic_cell_count")?,
        fat_percent: row.lab_entry(20, 21, "fat_percent")?,
        protein_percent: row.lab_entry(22, 23, "protein_percent")?,
        lactose_percent: row.lab_entry(24, 25, "lactose_percent")?,
        solids_not_fat: row.lab_entry(26, 27, "solids_not_fat")?,
        freezing_point: row.lab_entry(28, 29, "freezing_point")?,
        total_bacterial_count: row.lab_entry(30, 31, "total_bacterial_count")?,
    };

    Ok(SubmissionRecord {
        id: row.parse(0, "id")?,
        date: row.date(1, "date")?,
        farmer: cells[2].clone(),
        farm: cells[3].clone(),
        location: cells[4].clone(),
        mobile: cells[5].clone(),
        herd: HerdProfile {
            milk_today_litres: row.parse(6, "milk_today_litres")?,
            lactating_total: row.parse(7, "lactating_total")?,
            lactating_under_3m: row.parse(8, "lactating_under_3m")?,
            lactating_3_to_6m: row.parse(9, "lactating_3_to_6m")?,
            lactating_6_to_9m: row.parse(10, "lactating_6_to_9m")?,
            lactating_over_9m: row.parse(11, "lactating_over_9m")?,
            dry_cows: row.parse(12, "dry_cows")?,
            heifers: row.parse(13, "heifers")?,
            calves_under_1y: row.parse(14, "calves_under_1y")?,
            mastitis_cases_now: row.parse(15, "mastitis_cases_now")?,
            mastitis_cases_last_month: row.parse(16, "mastitis_cases_last_month")?,
            breed: cells[17].clone(),
        },
        lab,
    })
}

/// Position-based cell reader for one parsed row.
struct RowReader<'a> {
    cells: &'a [String],
    line: usize,
}

impl RowReader<'_> {
    fn parse<T: FromStr>(&self, index: usize, column: &str) -> ExportResult<T> {
        self.cells[index].parse().map_err(|_| ExportError::Parse {
            line: self.line,
            message: format!("invalid value '{}' in column {}", self.cells[index], column),
        })
    }

    fn date(&self, index: usize, column: &str) -> ExportResult<NaiveDate> {
        self.parse(index, column)
    }

    fn lab_entry<T: FromStr + Copy>(
        &self,
        value_index: usize,
        date_index: usize,
        column: &str,
    ) -> ExportResult<Option<LabEntry<T>>> {
        let value_cell = &self.cells[value_index];
        let date_cell = &self.cells[date_index];
        match (value_cell.is_empty(), date_cell.is_empty()) {
            (true, true) => Ok(None),
            (false, false) => Ok(Some(LabEntry::new(
                self.parse(value_index, column)?,
                self.date(date_index, column)?,
            ))),
            _ => Err(ExportError::Parse {
                line: self.line,
                message: format!("column {} needs both a value and an entry date", column),
            }),
        }
    }
}

fn value_cell<T: ToString + Copy>(entry: &Option<LabEntry<T>>) -> String {
    entry.map(|e| e.value.to_string()).unwrap_or_default()
}

fn date_cell<T: Copy>(entry: &Option<LabEntry<T>>) -> String {
    entry.map(|e| e.entered_on.to_string()).unwrap_or_default()
}

/// Escape a string for CSV output.
fn escape_csv(s: &str) -> String {
    if s.contains(',') || s.contains('"') || s.contains('\n') {
        format!("\"{}\"", s.replace('"', "\"\""))
    } else {
        s.to_string()
    }
}

/// Split one CSV line into cells, honoring quoted fields.
fn split_csv_line(line: &str) -> Result<Vec<String>, String> {
    let mut cells = Vec::new();
    let mut cell = String::new();
    let mut chars = line.chars().peekable();
    let mut in_quotes = false;

    while let Some(ch) = chars.next() {
        match ch {
            '"' if in_quotes => {
                if chars.peek() == Some(&'"') {
                    chars.next();
                    cell.push('"');
                } else {
                    in_quotes = false;
                }
            }
            '"' => in_quotes = true,
            ',' if !in_quotes => {
                cells.push(std::mem::take(&mut cell));
            }
            _ => cell.push(ch),
        }
    }
    if in_quotes {
        return Err("unterminated quoted field".into());
    }
    cells.push(cell);
    Ok(cells)
}
