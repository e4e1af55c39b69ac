//! Results scraping and extraction subsystem.
//!
//! Layered pipeline: validate the roll number, rate-limit the outbound
//! request, submit it through the discovered form (falling back to candidate
//! query parameters), then extract the CGPA and semester tables from whatever
//! HTML comes back.

mod client;
mod document;
mod error;
mod extract;
mod form;
mod rate_limit;
mod types;

pub use client::{FetchOrchestrator, FetchRequest, HttpTransport, OrchestratorConfig, Transport};
pub use document::Document;
pub use error::ExtractorError;
pub use extract::extract;
pub use form::{discover, FormSubmission};
pub use rate_limit::RateLimiter;
pub use types::{
    Extraction, ExtractionOutcome, FetchResult, RollNumber, SemesterRecord, TransportStatus,
    MIN_ROW_CELLS,
};
