//! Submission record models.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

use super::lab::LabPanel;

/// A single farmer/farm/date milk sample submission.
///
/// Raw lab measurements live in [`LabPanel`]; grades and statuses are derived
/// from them on read and are never stored on the record.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct SubmissionRecord {
    /// Sequential id assigned by the store, stable for the record's lifetime
    pub id: u32,
    /// Date the sample was submitted
    pub date: NaiveDate,
    /// Farmer's name
    pub farmer: String,
    /// Farm name
    pub farm: String,
    /// Farm location
    pub location: String,
    /// Contact mobile number
    pub mobile: String,
    /// Herd counts reported with the submission
    pub herd: HerdProfile,
    /// Lab measurements, each absent until an admin enters it
    pub lab: LabPanel,
}

impl SubmissionRecord {
    /// Create a record from a validated submission, with all lab fields unset.
    pub fn new(id: u32, submission: NewSubmission) -> Self {
        Self {
            id,
            date: submission.date,
            farmer: submission.farmer,
            farm: submission.farm,
            location: submission.location,
            mobile: submission.mobile,
            herd: submission.herd,
            lab: LabPanel::default(),
        }
    }
}

/// Herd counts reported by the farmer at submission time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct HerdProfile {
    /// Total litres of milk produced on the submission day
    pub milk_today_litres: f64,
    /// Total lactating cows
    pub lactating_total: u32,
    /// Lactating cows under 3 months into lactation
    pub lactating_under_3m: u32,
    /// Lactating cows 3 to 6 months into lactation
    pub lactating_3_to_6m: u32,
    /// Lactating cows 6 to 9 months into lactation
    pub lactating_6_to_9m: u32,
    /// Lactating cows over 9 months into lactation
    pub lactating_over_9m: u32,
    /// Dry cows
    pub dry_cows: u32,
    /// Heifers
    pub heifers: u32,
    /// Calves under one year
    pub calves_under_1y: u32,
    /// Clinical mastitis cases at submission time
    pub mastitis_cases_now: u32,
    /// Clinical mastitis cases during the previous month
    pub mastitis_cases_last_month: u32,
    /// Breed of the herd
    pub breed: String,
}

/// Input to the submit operation: metadata and herd counts, no lab fields.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct NewSubmission {
    /// Date the sample was submitted
    pub date: NaiveDate,
    /// Farmer's name
    pub farmer: String,
    /// Farm name
    pub farm: String,
    /// Farm location
    pub location: String,
    /// Contact mobile number
    pub mobile: String,
    /// Herd counts reported with the submission
    pub herd: HerdProfile,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn make_submission() -> NewSubmission {
        NewSubmission {
            date: NaiveDate::from_ymd_opt(2024, 6, 1).unwrap(),
            farmer: "Rahim Uddin".into(),
            farm: "Green Pastures".into(),
            location: "Sirajganj".into(),
            mobile: "01711000000".into(),
            herd: HerdProfile {
                milk_today_litres: 120.5,
                lactating_total: 14,
                lactating_under_3m: 4,
                lactating_3_to_6m: 5,
                lactating_6_to_9m: 3,
                lactating_over_9m: 2,
                dry_cows: 3,
                heifers: 2,
                calves_under_1y: 5,
                mastitis_cases_now: 1,
                mastitis_cases_last_month: 0,
                breed: "Holstein Friesian".into(),
            },
        }
    }

    #[test]
    fn test_new_record_has_no_lab_values() {
        let record = SubmissionRecord::new(1, make_submission());
        assert_eq!(record.id, 1);
        assert_eq!(record.farmer, "Rahim Uddin");
        assert!(record.lab.somatic_cell_count.is_none());
        assert!(record.lab.fat_percent.is_none());
        assert!(record.lab.total_bacterial_count.is_none());
    }
}
