//! Udder Health Core Library
//!
//! Milk-quality submission records with laboratory-grade classification.
//!
//! # Architecture
//!
//! ```text
//! Farmer submission ──▶ RecordStore (append-only, sequential ids)
//!                              │
//!              lab entry operations (role-gated, one per category)
//!                              │ mutate raw lab fields in place
//!                              ▼
//!                 classified view (recomputed on every read)
//!              ┌───────────────┼────────────────────┐
//!              ▼               ▼                    ▼
//!       pending tracker   cohort summaries    certificates
//!                              │
//!                              ▼
//!                     CSV / JSON snapshot
//! ```
//!
//! # Core Principle
//!
//! **Raw measurements are the only stored truth.** Grades and statuses are
//! recomputed from raw values on every read, so a derived value can never
//! drift from the measurement behind it.
//!
//! # Modules
//!
//! - [`models`]: Domain types (SubmissionRecord, LabPanel, FilterCriteria)
//! - [`access`]: Role to permitted-operation table
//! - [`grading`]: Classification rules (SCC grade, composition, TBC)
//! - [`pending`]: Pending-stage tracker and overdue detection
//! - [`store`]: In-memory record store and entry operations
//! - [`summary`]: Cohort statistics
//! - [`certificate`]: Per-record certificate generator
//! - [`export`]: Flat snapshot export/reimport

pub mod access;
pub mod certificate;
pub mod export;
pub mod grading;
pub mod models;
pub mod pending;
pub mod store;
pub mod summary;

// Re-export commonly used types
pub use access::{ensure_permitted, permitted_operations, AccessError, Operation, Role};
pub use certificate::{Certificate, CertificateBlock, CertificateOutcome};
pub use export::Snapshot;
pub use grading::{classify, Classification, CompositionStatus, SccGrade, SccStatus, TbcStatus};
pub use models::{
    CompositionEntry, FilterCriteria, HerdProfile, LabCategory, LabEntry, LabPanel,
    NewSubmission, SubmissionRecord,
};
pub use pending::{days_since_submission, is_overdue, pending_stages, PendingStages};
pub use store::{RecordStore, RecordView, StoreError};
pub use summary::{cohort_counts, describe, lab_statistics, CohortCounts, LabStatistics, Stats};

// UniFFI setup - using proc macros
uniffi::setup_scaffolding!();

use std::str::FromStr;
use std::sync::{Arc, Mutex};

use chrono::NaiveDate;

// =========================================================================
// FFI Error Type
// =========================================================================

#[derive(Debug, thiserror::Error, uniffi::Error)]
pub enum UdderHealthError {
    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Permission denied: {0}")]
    PermissionDenied(String),

    #[error("Invalid input: {0}")]
    InvalidInput(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl From<store::StoreError> for UdderHealthError {
    fn from(e: store::StoreError) -> Self {
        match e {
            store::StoreError::NotFound(id) => {
                UdderHealthError::NotFound(format!("record {}", id))
            }
            other => UdderHealthError::ValidationError(other.to_string()),
        }
    }
}

impl From<access::AccessError> for UdderHealthError {
    fn from(e: access::AccessError) -> Self {
        match e {
            access::AccessError::Forbidden { .. } => {
                UdderHealthError::PermissionDenied(e.to_string())
            }
            access::AccessError::UnknownRole(_) => UdderHealthError::InvalidInput(e.to_string()),
        }
    }
}

impl From<export::ExportError> for UdderHealthError {
    fn from(e: export::ExportError) -> Self {
        match e {
            export::ExportError::Json(err) => {
                UdderHealthError::SerializationError(err.to_string())
            }
            parse => UdderHealthError::InvalidInput(parse.to_string()),
        }
    }
}

impl From<serde_json::Error> for UdderHealthError {
    fn from(e: serde_json::Error) -> Self {
        UdderHealthError::SerializationError(e.to_string())
    }
}

impl<T> From<std::sync::PoisonError<T>> for UdderHealthError {
    fn from(e: std::sync::PoisonError<T>) -> Self {
        UdderHealthError::Internal(format!("Lock poisoned: {}", e))
    }
}

// =========================================================================
// Factory Function (exported to FFI)
// =========================================================================

/// Create a new, empty record registry.
#[uniffi::export]
pub fn new_core() -> Arc<UdderHealthCore> {
    Arc::new(UdderHealthCore {
        store: Arc::new(Mutex::new(RecordStore::new())),
    })
}

// =========================================================================
// Main API Object
// =========================================================================

/// Thread-safe store wrapper for FFI.
///
/// Every access-gated method takes the caller's role as an explicit
/// parameter; there is no ambient session role.
#[derive(uniffi::Object)]
pub struct UdderHealthCore {
    store: Arc<Mutex<RecordStore>>,
}

#[uniffi::export]
impl UdderHealthCore {
    // =========================================================================
    // Submission Operations
    // =========================================================================

    /// Submit a new sample record, returning its assigned id.
    pub fn submit(
        &self,
        role: String,
        submission: FfiNewSubmission,
    ) -> Result<u32, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::Submit)?;
        let submission: NewSubmission = submission.try_into()?;
        let mut store = self.store.lock()?;
        Ok(store.submit(submission)?)
    }

    // =========================================================================
    // Lab Entry Operations
    // =========================================================================

    /// Enter (or overwrite) the somatic cell count for a record.
    pub fn enter_scc(
        &self,
        role: String,
        record_id: u32,
        cells_per_ml: u32,
    ) -> Result<(), UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::EnterScc)?;
        let mut store = self.store.lock()?;
        Ok(store.enter_scc(record_id, cells_per_ml, today())?)
    }

    /// Enter (or overwrite) milk composition values for a record.
    pub fn enter_milk_composition(
        &self,
        role: String,
        record_id: u32,
        entry: FfiCompositionEntry,
    ) -> Result<(), UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::EnterMilkComposition)?;
        let mut store = self.store.lock()?;
        Ok(store.enter_milk_composition(record_id, entry.into(), today())?)
    }

    /// Enter (or overwrite) the total bacterial count for a record.
    pub fn enter_tbc(
        &self,
        role: String,
        record_id: u32,
        cfu_per_ml: u32,
    ) -> Result<(), UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::EnterTbc)?;
        let mut store = self.store.lock()?;
        Ok(store.enter_tbc(record_id, cfu_per_ml, today())?)
    }

    // =========================================================================
    // Read Operations
    // =========================================================================

    /// Get the classified view of one record.
    pub fn get_record(
        &self,
        role: String,
        record_id: u32,
    ) -> Result<FfiRecordView, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::View)?;
        let store = self.store.lock()?;
        Ok(store.view(record_id, today())?.into())
    }

    /// List classified views of all records matching the filter, in
    /// submission order.
    pub fn list_records(
        &self,
        role: String,
        filter: FfiFilterCriteria,
    ) -> Result<Vec<FfiRecordView>, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::View)?;
        let criteria: FilterCriteria = filter.try_into()?;
        let store = self.store.lock()?;
        Ok(store
            .views(&criteria, today())
            .into_iter()
            .map(Into::into)
            .collect())
    }

    /// Cohort-wide pending/overdue counts and per-column lab statistics.
    pub fn cohort_summary(&self, role: String) -> Result<FfiCohortSummary, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::View)?;
        let store = self.store.lock()?;
        let counts = cohort_counts(store.records(), today());
        let stats = lab_statistics(store.records());
        Ok(FfiCohortSummary::build(counts, stats))
    }

    // =========================================================================
    // Certificate Operations
    // =========================================================================

    /// Render a certificate for one record and test category.
    ///
    /// A record whose selected category has not been entered yields an
    /// `insufficient_data` result, never an error.
    pub fn generate_certificate(
        &self,
        role: String,
        record_id: u32,
        category: String,
    ) -> Result<FfiCertificate, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::Certificate)?;
        let category = LabCategory::from_str(&category).map_err(UdderHealthError::InvalidInput)?;
        let store = self.store.lock()?;
        let record = store.get(record_id)?;
        Ok(FfiCertificate::build(
            record_id,
            category,
            certificate::render(record, category),
        ))
    }

    // =========================================================================
    // Export Operations
    // =========================================================================

    /// Export the full store as a CSV snapshot.
    pub fn export_csv(&self, role: String) -> Result<String, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::Export)?;
        let store = self.store.lock()?;
        Ok(Snapshot::from_records(store.records(), today()).to_csv())
    }

    /// Export the full store as a JSON snapshot.
    pub fn export_json(&self, role: String) -> Result<String, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::Export)?;
        let store = self.store.lock()?;
        Ok(Snapshot::from_records(store.records(), today()).to_json()?)
    }

    /// Restore records from a CSV snapshot, returning how many were loaded.
    pub fn import_csv(&self, role: String, data: String) -> Result<u32, UdderHealthError> {
        let role = Role::parse(&role)?;
        ensure_permitted(role, Operation::Export)?;
        let records = Snapshot::from_csv(&data)?;
        let count = records.len() as u32;
        let mut store = self.store.lock()?;
        store.restore(records)?;
        Ok(count)
    }

    // =========================================================================
    // Access Operations
    // =========================================================================

    /// Operation names permitted for a role.
    pub fn permitted_operations(&self, role: String) -> Result<Vec<String>, UdderHealthError> {
        let role = Role::parse(&role)?;
        Ok(access::permitted_operations(role)
            .iter()
            .map(|op| op.wire_name().to_string())
            .collect())
    }
}

/// Current calendar date; the FFI layer stamps entry dates and "as of now"
/// evaluations so the core stays deterministic.
fn today() -> NaiveDate {
    chrono::Utc::now().date_naive()
}

fn parse_date(s: &str, field: &str) -> Result<NaiveDate, UdderHealthError> {
    s.parse().map_err(|_| {
        UdderHealthError::InvalidInput(format!("{} must be an ISO date, got '{}'", field, s))
    })
}

// =========================================================================
// FFI Types
// =========================================================================

/// FFI-safe new submission.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiNewSubmission {
    pub date: String,
    pub farmer: String,
    pub farm: String,
    pub location: String,
    pub mobile: String,
    pub milk_today_litres: f64,
    pub lactating_total: u32,
    pub lactating_under_3m: u32,
    pub lactating_3_to_6m: u32,
    pub lactating_6_to_9m: u32,
    pub lactating_over_9m: u32,
    pub dry_cows: u32,
    pub heifers: u32,
    pub calves_under_1y: u32,
    pub mastitis_cases_now: u32,
    pub mastitis_cases_last_month: u32,
    pub breed: String,
}

impl TryFrom<FfiNewSubmission> for NewSubmission {
    type Error = UdderHealthError;

    fn try_from(s: FfiNewSubmission) -> Result<Self, Self::Error> {
        Ok(NewSubmission {
            date: parse_date(&s.date, "date")?,
            farmer: s.farmer,
            farm: s.farm,
            location: s.location,
            mobile: s.mobile,
            herd: HerdProfile {
                milk_today_litres: s.milk_today_litres,
                lactating_total: s.lactating_total,
                lactating_under_3m: s.lactating_under_3m,
                lactating_3_to_6m: s.lactating_3_to_6m,
                lactating_6_to_9m: s.lactating_6_to_9m,
                lactating_over_9m: s.lactating_over_9m,
                dry_cows: s.dry_cows,
                heifers: s.heifers,
                calves_under_1y: s.calves_under_1y,
                mastitis_cases_now: s.mastitis_cases_now,
                mastitis_cases_last_month: s.mastitis_cases_last_month,
                breed: s.breed,
            },
        })
    }
}

/// FFI-safe milk composition entry.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCompositionEntry {
    pub fat_percent: Option<f64>,
    pub protein_percent: Option<f64>,
    pub lactose_percent: Option<f64>,
    pub solids_not_fat: Option<f64>,
    pub freezing_point: Option<f64>,
}

impl From<FfiCompositionEntry> for CompositionEntry {
    fn from(e: FfiCompositionEntry) -> Self {
        CompositionEntry {
            fat_percent: e.fat_percent,
            protein_percent: e.protein_percent,
            lactose_percent: e.lactose_percent,
            solids_not_fat: e.solids_not_fat,
            freezing_point: e.freezing_point,
        }
    }
}

/// FFI-safe filter criteria.
#[derive(Debug, Clone, Default, uniffi::Record)]
pub struct FfiFilterCriteria {
    pub from: Option<String>,
    pub to: Option<String>,
    pub farm: Option<String>,
    pub breed: Option<String>,
    pub year: Option<i32>,
    pub month: Option<u32>,
}

impl TryFrom<FfiFilterCriteria> for FilterCriteria {
    type Error = UdderHealthError;

    fn try_from(f: FfiFilterCriteria) -> Result<Self, Self::Error> {
        Ok(FilterCriteria {
            from: f.from.as_deref().map(|s| parse_date(s, "from")).transpose()?,
            to: f.to.as_deref().map(|s| parse_date(s, "to")).transpose()?,
            farm: f.farm,
            breed: f.breed,
            year: f.year,
            month: f.month,
        })
    }
}

/// FFI-safe classified record view: raw fields plus every derived value.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiRecordView {
    pub id: u32,
    pub date: String,
    pub farmer: String,
    pub farm: String,
    pub location: String,
    pub mobile: String,
    pub milk_today_litres: f64,
    pub lactating_total: u32,
    pub lactating_under_3m: u32,
    pub lactating_3_to_6m: u32,
    pub lactating_6_to_9m: u32,
    pub lactating_over_9m: u32,
    pub dry_cows: u32,
    pub heifers: u32,
    pub calves_under_1y: u32,
    pub mastitis_cases_now: u32,
    pub mastitis_cases_last_month: u32,
    pub breed: String,
    pub somatic_cell_count: Option<u32>,
    pub scc_entered_on: Option<String>,
    pub fat_percent: Option<f64>,
    pub protein_percent: Option<f64>,
    pub lactose_percent: Option<f64>,
    pub solids_not_fat: Option<f64>,
    pub freezing_point: Option<f64>,
    pub composition_entered_on: Option<String>,
    pub total_bacterial_count: Option<u32>,
    pub tbc_entered_on: Option<String>,
    pub scc_grade: String,
    pub scc_status: String,
    pub composition_status: String,
    pub tbc_status: String,
    pub pending: Vec<String>,
    pub pending_summary: String,
    pub days_since_submission: i64,
    pub overdue: bool,
}

impl From<RecordView> for FfiRecordView {
    fn from(view: RecordView) -> Self {
        let record = &view.record;
        let lab = &record.lab;
        Self {
            id: record.id,
            date: record.date.to_string(),
            farmer: record.farmer.clone(),
            farm: record.farm.clone(),
            location: record.location.clone(),
            mobile: record.mobile.clone(),
            milk_today_litres: record.herd.milk_today_litres,
            lactating_total: record.herd.lactating_total,
            lactating_under_3m: record.herd.lactating_under_3m,
            lactating_3_to_6m: record.herd.lactating_3_to_6m,
            lactating_6_to_9m: record.herd.lactating_6_to_9m,
            lactating_over_9m: record.herd.lactating_over_9m,
            dry_cows: record.herd.dry_cows,
            heifers: record.herd.heifers,
            calves_under_1y: record.herd.calves_under_1y,
            mastitis_cases_now: record.herd.mastitis_cases_now,
            mastitis_cases_last_month: record.herd.mastitis_cases_last_month,
            breed: record.herd.breed.clone(),
            somatic_cell_count: lab.scc_value(),
            scc_entered_on: lab.somatic_cell_count.map(|e| e.entered_on.to_string()),
            fat_percent: lab.fat_value(),
            protein_percent: lab.protein_value(),
            lactose_percent: lab.lactose_value(),
            solids_not_fat: lab.snf_value(),
            freezing_point: lab.freezing_point_value(),
            composition_entered_on: lab.composition_entered_on().map(|d| d.to_string()),
            total_bacterial_count: lab.tbc_value(),
            tbc_entered_on: lab.total_bacterial_count.map(|e| e.entered_on.to_string()),
            scc_grade: view.classification.scc_grade.to_string(),
            scc_status: view.classification.scc_status.to_string(),
            composition_status: view.classification.composition_status.to_string(),
            tbc_status: view.classification.tbc_status.to_string(),
            pending: view
                .pending
                .stages()
                .iter()
                .map(|s| s.wire_name().to_string())
                .collect(),
            pending_summary: view.pending.to_string(),
            days_since_submission: view.days_since_submission,
            overdue: view.overdue,
        }
    }
}

/// FFI-safe column statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiStats {
    pub count: u32,
    pub mean: f64,
    pub p25: f64,
    pub p50: f64,
    pub p75: f64,
}

impl From<Stats> for FfiStats {
    fn from(stats: Stats) -> Self {
        Self {
            count: stats.count as u32,
            mean: stats.mean,
            p25: stats.p25,
            p50: stats.p50,
            p75: stats.p75,
        }
    }
}

/// FFI-safe cohort summary: counts plus per-column lab statistics.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCohortSummary {
    pub total: u32,
    pub pending_scc: u32,
    pub pending_milk_composition: u32,
    pub pending_tbc: u32,
    pub overdue: u32,
    pub somatic_cell_count: Option<FfiStats>,
    pub fat_percent: Option<FfiStats>,
    pub protein_percent: Option<FfiStats>,
    pub lactose_percent: Option<FfiStats>,
    pub solids_not_fat: Option<FfiStats>,
    pub freezing_point: Option<FfiStats>,
    pub total_bacterial_count: Option<FfiStats>,
}

impl FfiCohortSummary {
    fn build(counts: CohortCounts, stats: LabStatistics) -> Self {
        Self {
            total: counts.total as u32,
            pending_scc: counts.pending_scc as u32,
            pending_milk_composition: counts.pending_milk_composition as u32,
            pending_tbc: counts.pending_tbc as u32,
            overdue: counts.overdue as u32,
            somatic_cell_count: stats.somatic_cell_count.map(Into::into),
            fat_percent: stats.fat_percent.map(Into::into),
            protein_percent: stats.protein_percent.map(Into::into),
            lactose_percent: stats.lactose_percent.map(Into::into),
            solids_not_fat: stats.solids_not_fat.map(Into::into),
            freezing_point: stats.freezing_point.map(Into::into),
            total_bacterial_count: stats.total_bacterial_count.map(Into::into),
        }
    }
}

/// FFI-safe certificate result.
#[derive(Debug, Clone, uniffi::Record)]
pub struct FfiCertificate {
    pub record_id: u32,
    pub category: String,
    /// "ready" or "insufficient_data"
    pub status: String,
    /// Rendered certificate text when ready
    pub text: Option<String>,
    /// Raw fields missing for the selected category
    pub missing: Vec<String>,
}

impl FfiCertificate {
    fn build(record_id: u32, category: LabCategory, outcome: CertificateOutcome) -> Self {
        match outcome {
            CertificateOutcome::Ready(cert) => Self {
                record_id,
                category: category.wire_name().to_string(),
                status: "ready".into(),
                text: Some(cert.to_text()),
                missing: Vec::new(),
            },
            CertificateOutcome::InsufficientData { missing } => Self {
                record_id,
                category: category.wire_name().to_string(),
                status: "insufficient_data".into(),
                text: None,
                missing,
            },
        }
    }
}
