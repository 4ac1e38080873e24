//! Lab measurement models.
//!
//! Every measurement is wrapped in [`LabEntry`], which records the date the
//! value was entered. Absence of a wrapper is the only "not yet tested"
//! marker; there are no in-band sentinel values.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

/// A recorded lab measurement together with the date it was entered.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq)]
pub struct LabEntry<T> {
    /// The measured value
    pub value: T,
    /// Date the value was (last) entered
    pub entered_on: NaiveDate,
}

impl<T> LabEntry<T> {
    /// Create a new entry.
    pub fn new(value: T, entered_on: NaiveDate) -> Self {
        Self { value, entered_on }
    }
}

/// The full lab panel for one submission. Each field is independently
/// optional; re-entry overwrites the value and refreshes the entry date.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct LabPanel {
    /// Somatic cell count in cells/mL
    pub somatic_cell_count: Option<LabEntry<u32>>,
    /// Fat percentage
    pub fat_percent: Option<LabEntry<f64>>,
    /// Protein percentage
    pub protein_percent: Option<LabEntry<f64>>,
    /// Lactose percentage
    pub lactose_percent: Option<LabEntry<f64>>,
    /// Solids-not-fat
    pub solids_not_fat: Option<LabEntry<f64>>,
    /// Freezing point in degrees Celsius
    pub freezing_point: Option<LabEntry<f64>>,
    /// Total bacterial count in cfu/mL
    pub total_bacterial_count: Option<LabEntry<u32>>,
}

impl LabPanel {
    /// Raw somatic cell count, if entered.
    pub fn scc_value(&self) -> Option<u32> {
        self.somatic_cell_count.map(|e| e.value)
    }

    /// Raw fat percentage, if entered.
    pub fn fat_value(&self) -> Option<f64> {
        self.fat_percent.map(|e| e.value)
    }

    /// Raw protein percentage, if entered.
    pub fn protein_value(&self) -> Option<f64> {
        self.protein_percent.map(|e| e.value)
    }

    /// Raw lactose percentage, if entered.
    pub fn lactose_value(&self) -> Option<f64> {
        self.lactose_percent.map(|e| e.value)
    }

    /// Raw solids-not-fat, if entered.
    pub fn snf_value(&self) -> Option<f64> {
        self.solids_not_fat.map(|e| e.value)
    }

    /// Raw freezing point, if entered.
    pub fn freezing_point_value(&self) -> Option<f64> {
        self.freezing_point.map(|e| e.value)
    }

    /// Raw total bacterial count, if entered.
    pub fn tbc_value(&self) -> Option<u32> {
        self.total_bacterial_count.map(|e| e.value)
    }

    /// Check whether all five composition fields have been entered.
    pub fn composition_complete(&self) -> bool {
        self.fat_percent.is_some()
            && self.protein_percent.is_some()
            && self.lactose_percent.is_some()
            && self.solids_not_fat.is_some()
            && self.freezing_point.is_some()
    }

    /// Latest entry date across the composition fields that have been
    /// entered. This is the panel-level test date shown on certificates.
    pub fn composition_entered_on(&self) -> Option<NaiveDate> {
        [
            self.fat_percent,
            self.protein_percent,
            self.lactose_percent,
            self.solids_not_fat,
            self.freezing_point,
        ]
        .iter()
        .flatten()
        .map(|e| e.entered_on)
        .max()
    }
}

/// Input panel for a milk-composition entry. Unset fields leave previously
/// entered values untouched, so a partial panel can be completed later.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq)]
pub struct CompositionEntry {
    /// Fat percentage
    pub fat_percent: Option<f64>,
    /// Protein percentage
    pub protein_percent: Option<f64>,
    /// Lactose percentage
    pub lactose_percent: Option<f64>,
    /// Solids-not-fat
    pub solids_not_fat: Option<f64>,
    /// Freezing point in degrees Celsius
    pub freezing_point: Option<f64>,
}

/// The three lab test categories, each entered by a different admin role.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum LabCategory {
    /// Somatic cell count
    Scc,
    /// Milk composition (fat, protein, lactose, SNF, freezing point)
    MilkComposition,
    /// Total bacterial count
    Tbc,
}

impl LabCategory {
    /// All categories in entry order.
    pub const ALL: [LabCategory; 3] =
        [LabCategory::Scc, LabCategory::MilkComposition, LabCategory::Tbc];

    /// Stable wire name used across the FFI boundary and in exports.
    pub fn wire_name(&self) -> &'static str {
        match self {
            LabCategory::Scc => "scc",
            LabCategory::MilkComposition => "milk_composition",
            LabCategory::Tbc => "tbc",
        }
    }
}

impl fmt::Display for LabCategory {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let label = match self {
            LabCategory::Scc => "Somatic Cell Count",
            LabCategory::MilkComposition => "Milk Composition",
            LabCategory::Tbc => "Total Bacterial Count",
        };
        write!(f, "{}", label)
    }
}

impl FromStr for LabCategory {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "scc" | "somatic cell count" => Ok(LabCategory::Scc),
            "milk_composition" | "milk composition" => Ok(LabCategory::MilkComposition),
            "tbc" | "total bacterial count" => Ok(LabCategory::Tbc),
            other => Err(format!("Unknown lab category: {}", other)),
        }
    }
}
