//! Data models for the application
//!
//! Organized by domain: scans (the processing queue), analysis payloads
//! (what the external model returns and what we persist), derived clinical
//! records, and patient profile data.

mod analysis;
mod clinical_record;
mod patient;
mod scan;

// Re-export all models for convenient imports
pub use analysis::*;
pub use clinical_record::*;
pub use patient::*;
pub use scan::*;
