//! In-memory record store and the submission/lab-entry operations.
//!
//! The store is an explicit owned object passed to (or held by) the caller;
//! nothing in this crate keeps ambient session state. Records are append-only
//! and never deleted; lab entry operations mutate lab fields in place with
//! last-write-wins semantics.

use chrono::NaiveDate;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::info;

use crate::grading::{classify, Classification};
use crate::models::{
    CompositionEntry, FilterCriteria, LabEntry, NewSubmission, SubmissionRecord,
};
use crate::pending::{
    days_since_submission, is_overdue, pending_stages, PendingStages,
    DEFAULT_OVERDUE_THRESHOLD_DAYS,
};

/// Store errors.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum StoreError {
    #[error("Validation failed for field '{field}': {message}")]
    Validation { field: &'static str, message: String },

    #[error("No record with id {0}")]
    NotFound(u32),

    #[error("Duplicate record id {0} in snapshot")]
    Duplicate(u32),
}

pub type StoreResult<T> = Result<T, StoreError>;

/// The classified read-side view of one record: raw fields plus every
/// derived value, recomputed at view time.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct RecordView {
    pub record: SubmissionRecord,
    pub classification: Classification,
    pub pending: PendingStages,
    pub days_since_submission: i64,
    pub overdue: bool,
}

impl RecordView {
    fn build(record: &SubmissionRecord, as_of: NaiveDate) -> Self {
        Self {
            record: record.clone(),
            classification: classify(record),
            pending: pending_stages(record),
            days_since_submission: days_since_submission(record, as_of),
            overdue: is_overdue(record, as_of, DEFAULT_OVERDUE_THRESHOLD_DAYS),
        }
    }
}

/// Append-only collection of submission records with sequential ids.
#[derive(Debug, Default)]
pub struct RecordStore {
    records: Vec<SubmissionRecord>,
    next_id: u32,
}

impl RecordStore {
    /// Create an empty store.
    pub fn new() -> Self {
        Self {
            records: Vec::new(),
            next_id: 1,
        }
    }

    /// Number of records.
    pub fn len(&self) -> usize {
        self.records.len()
    }

    /// True when the store holds no records.
    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }

    /// All records in submission order.
    pub fn records(&self) -> &[SubmissionRecord] {
        &self.records
    }

    /// Validate and append a new submission, returning its assigned id.
    pub fn submit(&mut self, submission: NewSubmission) -> StoreResult<u32> {
        validate_submission(&submission)?;

        let id = self.next_id;
        let record = SubmissionRecord::new(id, submission);
        info!(id, farmer = %record.farmer, farm = %record.farm, "submission recorded");
        self.records.push(record);
        self.next_id += 1;
        Ok(id)
    }

    /// Look up a record by id.
    pub fn get(&self, id: u32) -> StoreResult<&SubmissionRecord> {
        self.records
            .iter()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    fn get_mut(&mut self, id: u32) -> StoreResult<&mut SubmissionRecord> {
        self.records
            .iter_mut()
            .find(|r| r.id == id)
            .ok_or(StoreError::NotFound(id))
    }

    /// Enter (or overwrite) the somatic cell count for a record.
    pub fn enter_scc(
        &mut self,
        id: u32,
        cells_per_ml: u32,
        entered_on: NaiveDate,
    ) -> StoreResult<()> {
        let record = self.get_mut(id)?;
        record.lab.somatic_cell_count = Some(LabEntry::new(cells_per_ml, entered_on));
        info!(id, cells_per_ml, "somatic cell count recorded");
        Ok(())
    }

    /// Enter (or overwrite) milk composition values for a record.
    ///
    /// Unset fields in the entry leave previously entered values untouched.
    /// The whole entry is validated before any field is written.
    pub fn enter_milk_composition(
        &mut self,
        id: u32,
        entry: CompositionEntry,
        entered_on: NaiveDate,
    ) -> StoreResult<()> {
        validate_composition_entry(&entry)?;

        let record = self.get_mut(id)?;
        let lab = &mut record.lab;
        if let Some(v) = entry.fat_percent {
            lab.fat_percent = Some(LabEntry::new(v, entered_on));
        }
        if let Some(v) = entry.protein_percent {
            lab.protein_percent = Some(LabEntry::new(v, entered_on));
        }
        if let Some(v) = entry.lactose_percent {
            lab.lactose_percent = Some(LabEntry::new(v, entered_on));
        }
        if let Some(v) = entry.solids_not_fat {
            lab.solids_not_fat = Some(LabEntry::new(v, entered_on));
        }
        if let Some(v) = entry.freezing_point {
            lab.freezing_point = Some(LabEntry::new(v, entered_on));
        }
        info!(id, complete = lab.composition_complete(), "milk composition recorded");
        Ok(())
    }

    /// Enter (or overwrite) the total bacterial count for a record.
    pub fn enter_tbc(
        &mut self,
        id: u32,
        cfu_per_ml: u32,
        entered_on: NaiveDate,
    ) -> StoreResult<()> {
        let record = self.get_mut(id)?;
        record.lab.total_bacterial_count = Some(LabEntry::new(cfu_per_ml, entered_on));
        info!(id, cfu_per_ml, "total bacterial count recorded");
        Ok(())
    }

    /// Records matching all supplied criteria, in original order. Never
    /// mutates the store.
    pub fn filter(&self, criteria: &FilterCriteria) -> Vec<&SubmissionRecord> {
        self.records.iter().filter(|r| criteria.matches(r)).collect()
    }

    /// Classified view of one record.
    pub fn view(&self, id: u32, as_of: NaiveDate) -> StoreResult<RecordView> {
        Ok(RecordView::build(self.get(id)?, as_of))
    }

    /// Classified views of all records matching the criteria, in original
    /// order.
    pub fn views(&self, criteria: &FilterCriteria, as_of: NaiveDate) -> Vec<RecordView> {
        self.filter(criteria)
            .into_iter()
            .map(|r| RecordView::build(r, as_of))
            .collect()
    }

    /// Bulk-load records from a snapshot, e.g. a reimported export.
    ///
    /// Ids must be unique, both within the batch and against existing
    /// records; the id counter advances past the largest restored id. On any
    /// error nothing is loaded.
    pub fn restore(&mut self, records: Vec<SubmissionRecord>) -> StoreResult<()> {
        for (i, record) in records.iter().enumerate() {
            let clash_within = records[..i].iter().any(|r| r.id == record.id);
            let clash_existing = self.records.iter().any(|r| r.id == record.id);
            if clash_within || clash_existing {
                return Err(StoreError::Duplicate(record.id));
            }
        }

        info!(count = records.len(), "snapshot restored");
        for record in records {
            self.next_id = self.next_id.max(record.id + 1);
            self.records.push(record);
        }
        Ok(())
    }
}

fn validate_submission(submission: &NewSubmission) -> StoreResult<()> {
    if submission.farmer.trim().is_empty() {
        return Err(StoreError::Validation {
            field: "farmer",
            message: "farmer name must not be empty".into(),
        });
    }
    if submission.farm.trim().is_empty() {
        return Err(StoreError::Validation {
            field: "farm",
            message: "farm name must not be empty".into(),
        });
    }
    if !submission.herd.milk_today_litres.is_finite() || submission.herd.milk_today_litres < 0.0 {
        return Err(StoreError::Validation {
            field: "milk_today_litres",
            message: format!(
                "milk volume must be a non-negative number, got {}",
                submission.herd.milk_today_litres
            ),
        });
    }
    Ok(())
}

fn validate_composition_entry(entry: &CompositionEntry) -> StoreResult<()> {
    let percents = [
        ("fat_percent", entry.fat_percent),
        ("protein_percent", entry.protein_percent),
        ("lactose_percent", entry.lactose_percent),
        ("solids_not_fat", entry.solids_not_fat),
    ];
    for (field, value) in percents {
        if let Some(v) = value {
            if !v.is_finite() || v < 0.0 {
                return Err(StoreError::Validation {
                    field,
                    message: format!("must be a non-negative number, got {}", v),
                });
            }
        }
    }
    if let Some(v) = entry.freezing_point {
        // Freezing point of milk is below zero; only reject non-numbers.
        if !v.is_finite() {
            return Err(StoreError::Validation {
                field: "freezing_point",
                message: format!("must be a finite number, got {}", v),
            });
        }
    }
    Ok(())
}
