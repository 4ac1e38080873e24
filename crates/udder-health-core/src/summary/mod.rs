//! Cohort statistics over submission records.
//!
//! Every aggregate tolerates missing values: statistics are computed over the
//! present subsequence only, and an all-missing column yields an explicit
//! "no data" `None` rather than NaN.

use std::cmp::Ordering;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::SubmissionRecord;
use crate::pending::{is_overdue, pending_stages, DEFAULT_OVERDUE_THRESHOLD_DAYS};

/// Rounding scale: statistics are reported to two decimals.
const ROUND_SCALE: f64 = 100.0;

/// Summary statistics over the present values of one numeric column.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct Stats {
    /// Number of present values
    pub count: usize,
    /// Arithmetic mean
    pub mean: f64,
    /// 25th percentile (linear interpolation)
    pub p25: f64,
    /// Median
    pub p50: f64,
    /// 75th percentile (linear interpolation)
    pub p75: f64,
}

/// Describe a sequence of optional values.
///
/// Returns `None` when no value is present.
pub fn describe<I>(values: I) -> Option<Stats>
where
    I: IntoIterator<Item = Option<f64>>,
{
    let mut present: Vec<f64> = values.into_iter().flatten().collect();
    if present.is_empty() {
        return None;
    }
    present.sort_by(|a, b| a.partial_cmp(b).unwrap_or(Ordering::Equal));

    let count = present.len();
    let mean = present.iter().sum::<f64>() / count as f64;

    Some(Stats {
        count,
        mean: round2(mean),
        p25: round2(quantile(&present, 0.25)),
        p50: round2(quantile(&present, 0.50)),
        p75: round2(quantile(&present, 0.75)),
    })
}

/// Linear-interpolation quantile of an already sorted, non-empty slice.
fn quantile(sorted: &[f64], q: f64) -> f64 {
    let pos = q * (sorted.len() - 1) as f64;
    let lo = pos.floor() as usize;
    let hi = pos.ceil() as usize;
    if lo == hi {
        sorted[lo]
    } else {
        sorted[lo] + (sorted[hi] - sorted[lo]) * (pos - lo as f64)
    }
}

fn round2(value: f64) -> f64 {
    (value * ROUND_SCALE).round() / ROUND_SCALE
}

/// Per-column statistics for the whole lab panel.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct LabStatistics {
    pub somatic_cell_count: Option<Stats>,
    pub fat_percent: Option<Stats>,
    pub protein_percent: Option<Stats>,
    pub lactose_percent: Option<Stats>,
    pub solids_not_fat: Option<Stats>,
    pub freezing_point: Option<Stats>,
    pub total_bacterial_count: Option<Stats>,
}

/// Compute statistics for every lab column of a cohort.
pub fn lab_statistics<'a, I>(records: I) -> LabStatistics
where
    I: IntoIterator<Item = &'a SubmissionRecord>,
{
    let mut scc = Vec::new();
    let mut fat = Vec::new();
    let mut protein = Vec::new();
    let mut lactose = Vec::new();
    let mut snf = Vec::new();
    let mut freezing = Vec::new();
    let mut tbc = Vec::new();

    for record in records {
        let lab = &record.lab;
        scc.push(lab.scc_value().map(f64::from));
        fat.push(lab.fat_value());
        protein.push(lab.protein_value());
        lactose.push(lab.lactose_value());
        snf.push(lab.snf_value());
        freezing.push(lab.freezing_point_value());
        tbc.push(lab.tbc_value().map(f64::from));
    }

    LabStatistics {
        somatic_cell_count: describe(scc),
        fat_percent: describe(fat),
        protein_percent: describe(protein),
        lactose_percent: describe(lactose),
        solids_not_fat: describe(snf),
        freezing_point: describe(freezing),
        total_bacterial_count: describe(tbc),
    }
}

/// Cohort-wide pending and overdue counts.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
pub struct CohortCounts {
    /// Total records in the cohort
    pub total: usize,
    /// Records with the SCC stage pending
    pub pending_scc: usize,
    /// Records with the milk composition stage pending
    pub pending_milk_composition: usize,
    /// Records with the TBC stage pending
    pub pending_tbc: usize,
    /// Records with outstanding work past the overdue threshold
    pub overdue: usize,
}

/// Count pending stages and overdue records across a cohort, evaluated as of
/// the supplied date with the default 3-day threshold.
pub fn cohort_counts<'a, I>(records: I, as_of: NaiveDate) -> CohortCounts
where
    I: IntoIterator<Item = &'a SubmissionRecord>,
{
    let mut counts = CohortCounts::default();
    for record in records {
        counts.total += 1;
        let pending = pending_stages(record);
        if pending.contains(crate::models::LabCategory::Scc) {
            counts.pending_scc += 1;
        }
        if pending.contains(crate::models::LabCategory::MilkComposition) {
            counts.pending_milk_composition += 1;
        }
        if pending.contains(crate::models::LabCategory::Tbc) {
            counts.pending_tbc += 1;
        }
        if is_overdue(record, as_of, DEFAULT_OVERDUE_THRESHOLD_DAYS) {
            counts.overdue += 1;
        }
    }
    counts
}
