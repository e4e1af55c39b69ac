//! Core data types for roll numbers, fetch results, and extraction outcomes.

use super::error::ExtractorError;
use regex::Regex;
use serde::Serialize;
use std::fmt;
use std::sync::LazyLock;

/// Minimum number of cells a table row must have to count as result data.
pub const MIN_ROW_CELLS: usize = 3;

static ROLL_REGEX: LazyLock<Regex> = LazyLock::new(|| Regex::new(r"^[A-Z0-9]{8,15}$").unwrap());

/// A validated, uppercase-normalized student roll number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RollNumber(String);

impl RollNumber {
    /// Parses raw user input into a roll number.
    ///
    /// Input is trimmed and uppercased, then must match `^[A-Z0-9]{8,15}$`.
    /// Anything else is rejected before any network call happens.
    pub fn parse(input: &str) -> Result<Self, ExtractorError> {
        let normalized = input.trim().to_ascii_uppercase();
        if ROLL_REGEX.is_match(&normalized) {
            Ok(Self(normalized))
        } else {
            Err(ExtractorError::Validation {
                input: input.trim().to_string(),
            })
        }
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RollNumber {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

/// Transport-level status of a single fetch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TransportStatus {
    /// Got a 2xx response with a body
    Ok(u16),
    /// The request timed out
    Timeout,
    /// Connection-level failure (DNS, refused, reset, ...)
    NetworkError,
    /// Server responded with a non-success status
    BadStatus(u16),
}

impl TransportStatus {
    pub fn is_ok(&self) -> bool {
        matches!(self, TransportStatus::Ok(_))
    }
}

impl fmt::Display for TransportStatus {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            TransportStatus::Ok(code) => write!(f, "HTTP {code}"),
            TransportStatus::Timeout => f.write_str("timeout"),
            TransportStatus::NetworkError => f.write_str("network error"),
            TransportStatus::BadStatus(code) => write!(f, "HTTP {code}"),
        }
    }
}

/// Raw result of one HTTP fetch. Ephemeral, never persisted.
#[derive(Debug, Clone)]
pub struct FetchResult {
    pub status: TransportStatus,
    pub html: Option<String>,
}

impl FetchResult {
    pub fn ok(code: u16, html: String) -> Self {
        Self {
            status: TransportStatus::Ok(code),
            html: Some(html),
        }
    }

    pub fn failed(status: TransportStatus) -> Self {
        Self { status, html: None }
    }

    /// Returns the body if the transport succeeded.
    pub fn html_if_ok(&self) -> Option<&str> {
        if self.status.is_ok() {
            self.html.as_deref()
        } else {
            None
        }
    }
}

/// One parsed results table: rows of cell strings, in document order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct SemesterRecord {
    pub rows: Vec<Vec<String>>,
}

/// Successfully extracted data, before being wrapped into an outcome.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Extraction {
    pub cgpa: String,
    pub semesters: Vec<SemesterRecord>,
}

/// The structured result of a full fetch-and-extract sequence.
///
/// Invariant: `success == true` iff `cgpa` is present (and numerically within
/// [0, 10], which the extractor guarantees); on failure `cgpa` is `None` and
/// `semesters` is empty.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ExtractionOutcome {
    pub success: bool,
    pub cgpa: Option<String>,
    pub semesters: Vec<SemesterRecord>,
    pub message: String,
}

impl ExtractionOutcome {
    pub fn from_extraction(extraction: Extraction, roll: &RollNumber) -> Self {
        Self {
            success: true,
            cgpa: Some(extraction.cgpa),
            semesters: extraction.semesters,
            message: format!("Results for {roll}"),
        }
    }

    pub fn failure(message: impl Into<String>) -> Self {
        Self {
            success: false,
            cgpa: None,
            semesters: Vec::new(),
            message: message.into(),
        }
    }
}
