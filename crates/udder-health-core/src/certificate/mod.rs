//! Certificate rendering for a single record and test category.
//!
//! Rendering never fails: when the raw values required by the selected
//! category are unset, the outcome is an explicit `InsufficientData` result
//! naming the missing fields, and no numeric formatting of absent values is
//! attempted.

use chrono::{Duration, NaiveDate};
use serde::{Deserialize, Serialize};

use crate::grading::{
    composition_status, scc_grade, tbc_status, CompositionStatus, SccGrade, TbcStatus,
};
use crate::models::{LabCategory, SubmissionRecord};

/// Days an SCC result stays valid; the certificate suggests retesting after
/// this window.
pub const SCC_VALIDITY_DAYS: i64 = 30;

/// Band ranges printed next to each grade of [`SccGrade::LADDER`] on the
/// certificate checklist.
const GRADE_BAND_RANGES: [&str; 5] = [
    "up to 200,000 cells/mL",
    "200,001 to 400,000 cells/mL",
    "400,001 to 600,000 cells/mL",
    "600,001 to 800,000 cells/mL",
    "above 800,000 cells/mL",
];

/// Result of a certificate request.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CertificateOutcome {
    /// All required raw values were present
    Ready(Certificate),
    /// The selected category is missing raw values; nothing was rendered
    InsufficientData { missing: Vec<String> },
}

/// A rendered certificate for one record and one test category.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct Certificate {
    pub record_id: u32,
    pub farmer: String,
    pub farm: String,
    pub location: String,
    pub submission_date: NaiveDate,
    pub block: CertificateBlock,
}

/// The category-specific block of a certificate.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub enum CertificateBlock {
    Scc {
        entered_on: NaiveDate,
        lactating_total: u32,
        cells_per_ml: u32,
        grade: SccGrade,
        next_test_due: NaiveDate,
    },
    MilkComposition {
        entered_on: NaiveDate,
        fat_percent: f64,
        protein_percent: f64,
        lactose_percent: f64,
        solids_not_fat: f64,
        freezing_point: f64,
        status: CompositionStatus,
    },
    Tbc {
        entered_on: NaiveDate,
        cfu_per_ml: u32,
        status: TbcStatus,
    },
}

/// Render a certificate for one record and category.
pub fn render(record: &SubmissionRecord, category: LabCategory) -> CertificateOutcome {
    let block = match category {
        LabCategory::Scc => {
            let Some(entry) = record.lab.somatic_cell_count else {
                return CertificateOutcome::InsufficientData {
                    missing: vec!["somatic_cell_count".into()],
                };
            };
            CertificateBlock::Scc {
                entered_on: entry.entered_on,
                lactating_total: record.herd.lactating_total,
                cells_per_ml: entry.value,
                grade: scc_grade(Some(entry.value)),
                next_test_due: entry.entered_on + Duration::days(SCC_VALIDITY_DAYS),
            }
        }
        LabCategory::MilkComposition => {
            let missing = missing_composition_fields(record);
            if !missing.is_empty() {
                return CertificateOutcome::InsufficientData { missing };
            }
            let lab = &record.lab;
            // All five are present past the guard above
            let (fat, protein, lactose, snf, fp) = (
                lab.fat_value().unwrap_or_default(),
                lab.protein_value().unwrap_or_default(),
                lab.lactose_value().unwrap_or_default(),
                lab.snf_value().unwrap_or_default(),
                lab.freezing_point_value().unwrap_or_default(),
            );
            CertificateBlock::MilkComposition {
                entered_on: lab.composition_entered_on().unwrap_or(record.date),
                fat_percent: fat,
                protein_percent: protein,
                lactose_percent: lactose,
                solids_not_fat: snf,
                freezing_point: fp,
                status: composition_status(
                    Some(fat),
                    Some(protein),
                    Some(lactose),
                    Some(snf),
                    Some(fp),
                ),
            }
        }
        LabCategory::Tbc => {
            let Some(entry) = record.lab.total_bacterial_count else {
                return CertificateOutcome::InsufficientData {
                    missing: vec!["total_bacterial_count".into()],
                };
            };
            CertificateBlock::Tbc {
                entered_on: entry.entered_on,
                cfu_per_ml: entry.value,
                status: tbc_status(Some(entry.value)),
            }
        }
    };

    CertificateOutcome::Ready(Certificate {
        record_id: record.id,
        farmer: record.farmer.clone(),
        farm: record.farm.clone(),
        location: record.location.clone(),
        submission_date: record.date,
        block,
    })
}

fn missing_composition_fields(record: &SubmissionRecord) -> Vec<String> {
    let lab = &record.lab;
    let fields = [
        ("fat_percent", lab.fat_percent.is_none()),
        ("protein_percent", lab.protein_percent.is_none()),
        ("lactose_percent", lab.lactose_percent.is_none()),
        ("solids_not_fat", lab.solids_not_fat.is_none()),
        ("freezing_point", lab.freezing_point.is_none()),
    ];
    fields
        .iter()
        .filter(|(_, missing)| *missing)
        .map(|(name, _)| (*name).to_string())
        .collect()
}

impl Certificate {
    /// The certificate's category.
    pub fn category(&self) -> LabCategory {
        match self.block {
            CertificateBlock::Scc { .. } => LabCategory::Scc,
            CertificateBlock::MilkComposition { .. } => LabCategory::MilkComposition,
            CertificateBlock::Tbc { .. } => LabCategory::Tbc,
        }
    }

    /// Render the fixed text template.
    pub fn to_text(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "MILK QUALITY CERTIFICATE - {}\n",
            self.category().to_string().to_uppercase()
        ));
        out.push_str(&format!("Certificate for record #{}\n", self.record_id));
        out.push_str(&format!("Farmer: {}\n", self.farmer));
        out.push_str(&format!("Farm: {} ({})\n", self.farm, self.location));
        out.push_str(&format!("Sample submitted: {}\n", self.submission_date));

        match &self.block {
            CertificateBlock::Scc {
                entered_on,
                lactating_total,
                cells_per_ml,
                grade,
                next_test_due,
            } => {
                out.push_str(&format!("Tested on: {}\n", entered_on));
                out.push_str(&format!("Lactating cows: {}\n", lactating_total));
                out.push_str(&format!(
                    "Somatic cell count: {} cells/mL\n",
                    group_thousands(*cells_per_ml)
                ));
                out.push_str(&format!("Grade: {}\n", grade));
                for (band, range) in SccGrade::LADDER.into_iter().zip(GRADE_BAND_RANGES) {
                    let mark = if band == *grade { 'x' } else { ' ' };
                    out.push_str(&format!("  [{}] {} ({})\n", mark, band, range));
                }
                out.push_str(&format!("Next test suggested by: {}\n", next_test_due));
            }
            CertificateBlock::MilkComposition {
                entered_on,
                fat_percent,
                protein_percent,
                lactose_percent,
                solids_not_fat,
                freezing_point,
                status,
            } => {
                out.push_str(&format!("Tested on: {}\n", entered_on));
                out.push_str(&format!("Fat: {}%\n", fat_percent));
                out.push_str(&format!("Protein: {}%\n", protein_percent));
                out.push_str(&format!("Lactose: {}%\n", lactose_percent));
                out.push_str(&format!("Solids-not-fat: {}\n", solids_not_fat));
                out.push_str(&format!("Freezing point: {} C\n", freezing_point));
                out.push_str(&format!("Composition status: {}\n", status));
            }
            CertificateBlock::Tbc {
                entered_on,
                cfu_per_ml,
                status,
            } => {
                out.push_str(&format!("Tested on: {}\n", entered_on));
                out.push_str(&format!(
                    "Total bacterial count: {} cfu/mL\n",
                    group_thousands(*cfu_per_ml)
                ));
                out.push_str(&format!("Contamination status: {}\n", status));
            }
        }
        out
    }
}

/// Format a count with thousands separators, e.g. 150000 -> "150,000".
fn group_thousands(value: u32) -> String {
    let digits = value.to_string();
    let mut out = String::with_capacity(digits.len() + digits.len() / 3);
    for (i, ch) in digits.chars().enumerate() {
        if i > 0 && (digits.len() - i) % 3 == 0 {
            out.push(',');
        }
        out.push(ch);
    }
    out
}
