//! Flat snapshot export and reimport.

mod snapshot;

pub use snapshot::*;
