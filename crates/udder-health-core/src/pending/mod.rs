//! Pending-work tracking derived from partial lab panels.
//!
//! Completion state is never stored; it is derived from the raw lab fields
//! on every read.

use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use crate::models::{LabCategory, SubmissionRecord};

/// Days after submission before outstanding lab work counts as overdue.
pub const DEFAULT_OVERDUE_THRESHOLD_DAYS: i64 = 3;

/// The ordered set of lab stages still missing for one record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct PendingStages {
    stages: Vec<LabCategory>,
}

impl PendingStages {
    /// The missing stages, in entry order (SCC, Milk Composition, TBC).
    pub fn stages(&self) -> &[LabCategory] {
        &self.stages
    }

    /// The "all complete" sentinel: no stage is missing.
    pub fn is_complete(&self) -> bool {
        self.stages.is_empty()
    }

    /// Check whether a specific stage is still pending.
    pub fn contains(&self, category: LabCategory) -> bool {
        self.stages.contains(&category)
    }
}

impl fmt::Display for PendingStages {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_complete() {
            return f.write_str("All tests complete");
        }
        write!(f, "Awaiting: ")?;
        for (i, stage) in self.stages.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{}", stage)?;
        }
        Ok(())
    }
}

/// Derive the pending stages for a record.
///
/// SCC and TBC are pending while their single raw field is unset; milk
/// composition is pending while ANY of its five fields is unset.
pub fn pending_stages(record: &SubmissionRecord) -> PendingStages {
    let mut stages = Vec::new();
    if record.lab.somatic_cell_count.is_none() {
        stages.push(LabCategory::Scc);
    }
    if !record.lab.composition_complete() {
        stages.push(LabCategory::MilkComposition);
    }
    if record.lab.total_bacterial_count.is_none() {
        stages.push(LabCategory::Tbc);
    }
    PendingStages { stages }
}

/// Whole days elapsed since submission, clamped to zero.
pub fn days_since_submission(record: &SubmissionRecord, as_of: NaiveDate) -> i64 {
    (as_of - record.date).num_days().max(0)
}

/// A record is overdue when lab work is outstanding past the threshold.
pub fn is_overdue(record: &SubmissionRecord, as_of: NaiveDate, threshold_days: i64) -> bool {
    days_since_submission(record, as_of) > threshold_days
        && !pending_stages(record).is_complete()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{HerdProfile, LabEntry, NewSubmission};

    fn june(day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(2024, 6, day).unwrap()
    }

    fn make_record() -> SubmissionRecord {
        SubmissionRecord::new(
            1,
            NewSubmission {
                date: june(1),
                farmer: "Rahim Uddin".into(),
                farm: "Green Pastures".into(),
                location: "Sirajganj".into(),
                mobile: "01711000000".into(),
                herd: HerdProfile {
                    milk_today_litres: 100.0,
                    lactating_total: 10,
                    lactating_under_3m: 3,
                    lactating_3_to_6m: 3,
                    lactating_6_to_9m: 2,
                    lactating_over_9m: 2,
                    dry_cows: 2,
                    heifers: 1,
                    calves_under_1y: 4,
                    mastitis_cases_now: 0,
                    mastitis_cases_last_month: 1,
                    breed: "Sahiwal".into(),
                },
            },
        )
    }

    fn complete_lab(record: &mut SubmissionRecord) {
        let on = june(2);
        record.lab.somatic_cell_count = Some(LabEntry::new(150_000, on));
        record.lab.fat_percent = Some(LabEntry::new(4.0, on));
        record.lab.protein_percent = Some(LabEntry::new(3.5, on));
        record.lab.lactose_percent = Some(LabEntry::new(4.5, on));
        record.lab.solids_not_fat = Some(LabEntry::new(8.5, on));
        record.lab.freezing_point = Some(LabEntry::new(-0.55, on));
        record.lab.total_bacterial_count = Some(LabEntry::new(50_000, on));
    }

    #[test]
    fn test_fresh_record_has_all_stages_pending() {
        let record = make_record();
        let pending = pending_stages(&record);
        assert_eq!(
            pending.stages(),
            &[LabCategory::Scc, LabCategory::MilkComposition, LabCategory::Tbc]
        );
        assert!(!pending.is_complete());
    }

    #[test]
    fn test_single_composition_field_leaves_stage_pending() {
        let mut record = make_record();
        record.lab.fat_percent = Some(LabEntry::new(4.0, june(2)));
        let pending = pending_stages(&record);
        assert!(pending.contains(LabCategory::MilkComposition));
    }

    #[test]
    fn test_complete_record_hits_sentinel() {
        let mut record = make_record();
        complete_lab(&mut record);
        let pending = pending_stages(&record);
        assert!(pending.is_complete());
        assert_eq!(pending.to_string(), "All tests complete");
    }

    #[test]
    fn test_display_lists_missing_stages() {
        let mut record = make_record();
        record.lab.somatic_cell_count = Some(LabEntry::new(150_000, june(2)));
        assert_eq!(
            pending_stages(&record).to_string(),
            "Awaiting: Milk Composition, Total Bacterial Count"
        );
    }

    #[test]
    fn test_days_since_submission_clamped() {
        let record = make_record();
        assert_eq!(days_since_submission(&record, june(5)), 4);
        assert_eq!(days_since_submission(&record, june(1)), 0);
        // asOf before submission is clamped, not negative
        assert_eq!(days_since_submission(&record, NaiveDate::from_ymd_opt(2024, 5, 20).unwrap()), 0);
    }

    #[test]
    fn test_overdue_requires_pending_work() {
        let mut record = make_record();
        assert!(!is_overdue(&record, june(4), DEFAULT_OVERDUE_THRESHOLD_DAYS));
        assert!(is_overdue(&record, june(5), DEFAULT_OVERDUE_THRESHOLD_DAYS));

        complete_lab(&mut record);
        assert!(!is_overdue(&record, june(30), DEFAULT_OVERDUE_THRESHOLD_DAYS));
    }
}
