//! Filter criteria for record queries.

use chrono::{Datelike, NaiveDate};
use serde::{Deserialize, Serialize};

use super::record::SubmissionRecord;

/// Criteria for filtering records. Every field is optional; an unset
/// criterion passes all records through.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
pub struct FilterCriteria {
    /// Earliest submission date, inclusive
    pub from: Option<NaiveDate>,
    /// Latest submission date, inclusive
    pub to: Option<NaiveDate>,
    /// Exact farm name
    pub farm: Option<String>,
    /// Exact breed
    pub breed: Option<String>,
    /// Exact submission year
    pub year: Option<i32>,
    /// Exact submission month (1-12)
    pub month: Option<u32>,
}

impl FilterCriteria {
    /// Check whether a record matches all supplied criteria.
    pub fn matches(&self, record: &SubmissionRecord) -> bool {
        if let Some(from) = self.from {
            if record.date < from {
                return false;
            }
        }
        if let Some(to) = self.to {
            if record.date > to {
                return false;
            }
        }
        if let Some(farm) = &self.farm {
            if record.farm != *farm {
                return false;
            }
        }
        if let Some(breed) = &self.breed {
            if record.herd.breed != *breed {
                return false;
            }
        }
        if let Some(year) = self.year {
            if record.date.year() != year {
                return false;
            }
        }
        if let Some(month) = self.month {
            if record.date.month() != month {
                return false;
            }
        }
        true
    }

    /// True when no criterion is set.
    pub fn is_empty(&self) -> bool {
        self.from.is_none()
            && self.to.is_none()
            && self.farm.is_none()
            && self.breed.is_none()
            && self.year.is_none()
            && self.month.is_none()
    }
}
