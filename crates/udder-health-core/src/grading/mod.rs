//! Classification rules for lab measurements.
//!
//! Pure, stateless functions from raw values to graded categories. A missing
//! input always classifies as `Undetermined`, never as a computed status.
//!
//! SCC grade ladder (cells/mL, inclusive on the lower grade):
//! - up to 200,000: Super Quality
//! - up to 400,000: Excellent
//! - up to 600,000: Very Good
//! - up to 800,000: Good
//! - above 800,000: Fair

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::models::SubmissionRecord;

/// Upper bound of the Super Quality SCC band (cells/mL).
pub const SCC_SUPER_QUALITY_MAX: u32 = 200_000;
/// Upper bound of the Excellent SCC band (cells/mL).
pub const SCC_EXCELLENT_MAX: u32 = 400_000;
/// Upper bound of the Very Good SCC band (cells/mL).
pub const SCC_VERY_GOOD_MAX: u32 = 600_000;
/// Upper bound of the Good SCC band; also the Normal/High boundary (cells/mL).
pub const SCC_GOOD_MAX: u32 = 800_000;
/// Normal/High boundary for total bacterial count (cfu/mL).
pub const TBC_NORMAL_MAX: u32 = 100_000;

/// Normal range for fat percentage.
const FAT_MIN: f64 = 3.0;
const FAT_MAX: f64 = 5.0;
/// Normal range for protein percentage.
const PROTEIN_MIN: f64 = 3.2;
const PROTEIN_MAX: f64 = 3.8;
/// Normal range for lactose percentage.
const LACTOSE_MIN: f64 = 4.4;
const LACTOSE_MAX: f64 = 4.6;
/// Minimum normal solids-not-fat.
const SNF_MIN: f64 = 8.0;
/// Normal range for freezing point (degrees Celsius).
const FREEZING_POINT_MIN: f64 = -0.565;
const FREEZING_POINT_MAX: f64 = -0.532;

/// Ordinal milk-quality grade derived from the somatic cell count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SccGrade {
    SuperQuality,
    Excellent,
    VeryGood,
    Good,
    Fair,
    /// No count entered yet
    Undetermined,
}

impl SccGrade {
    /// The five determinate grades, best first. Certificates render this
    /// ladder as a checklist.
    pub const LADDER: [SccGrade; 5] = [
        SccGrade::SuperQuality,
        SccGrade::Excellent,
        SccGrade::VeryGood,
        SccGrade::Good,
        SccGrade::Fair,
    ];
}

impl fmt::Display for SccGrade {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SccGrade::SuperQuality => "Super Quality",
            SccGrade::Excellent => "Excellent",
            SccGrade::VeryGood => "Very Good",
            SccGrade::Good => "Good",
            SccGrade::Fair => "Fair",
            SccGrade::Undetermined => "Undetermined",
        };
        f.write_str(label)
    }
}

/// Udder-health status derived from the somatic cell count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum SccStatus {
    Normal,
    High,
    Undetermined,
}

impl fmt::Display for SccStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            SccStatus::Normal => "Normal",
            SccStatus::High => "High",
            SccStatus::Undetermined => "Undetermined",
        };
        f.write_str(label)
    }
}

/// Status of the five-field milk composition panel.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum CompositionStatus {
    Normal,
    Abnormal,
    Undetermined,
}

impl fmt::Display for CompositionStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            CompositionStatus::Normal => "Normal",
            CompositionStatus::Abnormal => "Abnormal",
            CompositionStatus::Undetermined => "Undetermined",
        };
        f.write_str(label)
    }
}

/// Contamination status derived from the total bacterial count.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TbcStatus {
    Normal,
    High,
    Undetermined,
}

impl fmt::Display for TbcStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            TbcStatus::Normal => "Normal",
            TbcStatus::High => "High",
            TbcStatus::Undetermined => "Undetermined",
        };
        f.write_str(label)
    }
}

/// Grade a somatic cell count.
pub fn scc_grade(cells_per_ml: Option<u32>) -> SccGrade {
    match cells_per_ml {
        None => SccGrade::Undetermined,
        Some(v) if v <= SCC_SUPER_QUALITY_MAX => SccGrade::SuperQuality,
        Some(v) if v <= SCC_EXCELLENT_MAX => SccGrade::Excellent,
        Some(v) if v <= SCC_VERY_GOOD_MAX => SccGrade::VeryGood,
        Some(v) if v <= SCC_GOOD_MAX => SccGrade::Good,
        Some(_) => SccGrade::Fair,
    }
}

/// Classify a somatic cell count as Normal or High.
pub fn scc_status(cells_per_ml: Option<u32>) -> SccStatus {
    match cells_per_ml {
        None => SccStatus::Undetermined,
        Some(v) if v <= SCC_GOOD_MAX => SccStatus::Normal,
        Some(_) => SccStatus::High,
    }
}

/// Classify a milk composition panel.
///
/// All five fields must be present; any missing field yields `Undetermined`
/// rather than a status computed from partial data.
pub fn composition_status(
    fat_percent: Option<f64>,
    protein_percent: Option<f64>,
    lactose_percent: Option<f64>,
    solids_not_fat: Option<f64>,
    freezing_point: Option<f64>,
) -> CompositionStatus {
    let (Some(fat), Some(protein), Some(lactose), Some(snf), Some(fp)) = (
        fat_percent,
        protein_percent,
        lactose_percent,
        solids_not_fat,
        freezing_point,
    ) else {
        return CompositionStatus::Undetermined;
    };

    let normal = (FAT_MIN..=FAT_MAX).contains(&fat)
        && (PROTEIN_MIN..=PROTEIN_MAX).contains(&protein)
        && (LACTOSE_MIN..=LACTOSE_MAX).contains(&lactose)
        && snf >= SNF_MIN
        && (FREEZING_POINT_MIN..=FREEZING_POINT_MAX).contains(&fp);

    if normal {
        CompositionStatus::Normal
    } else {
        CompositionStatus::Abnormal
    }
}

/// Classify a total bacterial count as Normal or High.
pub fn tbc_status(cfu_per_ml: Option<u32>) -> TbcStatus {
    match cfu_per_ml {
        None => TbcStatus::Undetermined,
        Some(v) if v <= TBC_NORMAL_MAX => TbcStatus::Normal,
        Some(_) => TbcStatus::High,
    }
}

/// The full classified view of one record, recomputed from raw values.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
pub struct Classification {
    pub scc_grade: SccGrade,
    pub scc_status: SccStatus,
    pub composition_status: CompositionStatus,
    pub tbc_status: TbcStatus,
}

/// Classify all lab categories of a record.
pub fn classify(record: &SubmissionRecord) -> Classification {
    let lab = &record.lab;
    Classification {
        scc_grade: scc_grade(lab.scc_value()),
        scc_status: scc_status(lab.scc_value()),
        composition_status: composition_status(
            lab.fat_value(),
            lab.protein_value(),
            lab.lactose_value(),
            lab.snf_value(),
            lab.freezing_point_value(),
        ),
        tbc_status: tbc_status(lab.tbc_value()),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_scc_grade_bands() {
        assert_eq!(scc_grade(Some(0)), SccGrade::SuperQuality);
        assert_eq!(scc_grade(Some(200_000)), SccGrade::SuperQuality);
        assert_eq!(scc_grade(Some(200_001)), SccGrade::Excellent);
        assert_eq!(scc_grade(Some(400_000)), SccGrade::Excellent);
        assert_eq!(scc_grade(Some(400_001)), SccGrade::VeryGood);
        assert_eq!(scc_grade(Some(600_000)), SccGrade::VeryGood);
        assert_eq!(scc_grade(Some(600_001)), SccGrade::Good);
        assert_eq!(scc_grade(Some(800_000)), SccGrade::Good);
        assert_eq!(scc_grade(Some(800_001)), SccGrade::Fair);
        assert_eq!(scc_grade(None), SccGrade::Undetermined);
    }

    #[test]
    fn test_scc_status_boundary() {
        assert_eq!(scc_status(Some(800_000)), SccStatus::Normal);
        assert_eq!(scc_status(Some(800_001)), SccStatus::High);
        assert_eq!(scc_status(None), SccStatus::Undetermined);
    }

    #[test]
    fn test_composition_normal() {
        let status =
            composition_status(Some(4.0), Some(3.5), Some(4.5), Some(8.5), Some(-0.55));
        assert_eq!(status, CompositionStatus::Normal);
    }

    #[test]
    fn test_composition_abnormal_on_any_out_of_range_field() {
        // Fat below range
        assert_eq!(
            composition_status(Some(2.9), Some(3.5), Some(4.5), Some(8.5), Some(-0.55)),
            CompositionStatus::Abnormal
        );
        // SNF below minimum
        assert_eq!(
            composition_status(Some(4.0), Some(3.5), Some(4.5), Some(7.9), Some(-0.55)),
            CompositionStatus::Abnormal
        );
        // Freezing point above range (towards zero, suggests added water)
        assert_eq!(
            composition_status(Some(4.0), Some(3.5), Some(4.5), Some(8.5), Some(-0.50)),
            CompositionStatus::Abnormal
        );
    }

    #[test]
    fn test_composition_range_boundaries_inclusive() {
        assert_eq!(
            composition_status(Some(3.0), Some(3.2), Some(4.4), Some(8.0), Some(-0.565)),
            CompositionStatus::Normal
        );
        assert_eq!(
            composition_status(Some(5.0), Some(3.8), Some(4.6), Some(9.0), Some(-0.532)),
            CompositionStatus::Normal
        );
    }

    #[test]
    fn test_composition_undetermined_when_any_field_missing() {
        assert_eq!(
            composition_status(None, Some(3.5), Some(4.5), Some(8.5), Some(-0.55)),
            CompositionStatus::Undetermined
        );
        assert_eq!(
            composition_status(Some(4.0), None, Some(4.5), Some(8.5), Some(-0.55)),
            CompositionStatus::Undetermined
        );
        assert_eq!(
            composition_status(Some(4.0), Some(3.5), Some(4.5), Some(8.5), None),
            CompositionStatus::Undetermined
        );
        assert_eq!(
            composition_status(None, None, None, None, None),
            CompositionStatus::Undetermined
        );
    }

    #[test]
    fn test_tbc_status_boundary() {
        assert_eq!(tbc_status(Some(100_000)), TbcStatus::Normal);
        assert_eq!(tbc_status(Some(100_001)), TbcStatus::High);
        assert_eq!(tbc_status(None), TbcStatus::Undetermined);
    }

    #[test]
    fn test_display_labels() {
        assert_eq!(SccGrade::SuperQuality.to_string(), "Super Quality");
        assert_eq!(SccGrade::VeryGood.to_string(), "Very Good");
        assert_eq!(CompositionStatus::Abnormal.to_string(), "Abnormal");
        assert_eq!(TbcStatus::High.to_string(), "High");
    }
}
