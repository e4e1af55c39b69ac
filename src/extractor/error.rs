//! Error types for the results extraction subsystem.

use thiserror::Error;

/// Errors that can occur while fetching and extracting results.
#[derive(Debug, Error, Clone)]
pub enum ExtractorError {
    /// The submitted roll number does not match the expected format
    #[error("invalid roll number: {input:?}")]
    Validation { input: String },

    /// Network/HTTP request failed (timeout, connection error, non-200 status)
    #[error("transport error: {message}")]
    Transport { message: String },

    /// The results page explicitly says there is no record for this roll number
    #[error("no record found for roll number {roll}")]
    NotFound { roll: String },

    /// The page fetched fine but no CGPA pattern could be recognized
    #[error("result page format not recognized")]
    Format,

    /// PDF generation failed
    #[error("PDF rendering failed: {message}")]
    Render { message: String },

    /// Startup configuration is missing or malformed
    #[error("configuration error: {message}")]
    Config { message: String },
}

impl ExtractorError {
    /// Returns true if retrying the whole fetch sequence could help.
    ///
    /// Only transport-class failures qualify. A page that explicitly reports
    /// "not found", or one whose format we cannot recognize, will not change
    /// between attempts.
    pub fn is_retryable(&self) -> bool {
        matches!(self, ExtractorError::Transport { .. })
    }

    /// Converts the error into the message shown to the user.
    pub fn user_message(&self) -> String {
        match self {
            ExtractorError::Validation { input } => format!(
                "❌ {input:?} does not look like a valid roll number. \
                 Roll numbers are 8-15 letters and digits, e.g. 21A91A0501."
            ),
            ExtractorError::Transport { .. } => {
                "❌ The results site is temporarily unavailable. Please try again later.".to_string()
            }
            ExtractorError::NotFound { roll } => {
                format!("❌ No results found for roll number {roll}. Please check it and try again.")
            }
            ExtractorError::Format => {
                "❌ Fetched the results page, but its format was not recognized.".to_string()
            }
            ExtractorError::Render { .. } => {
                "❌ Could not generate the PDF. Your results are still available - reply 'yes' to retry.".to_string()
            }
            ExtractorError::Config { message } => format!("Configuration error: {message}"),
        }
    }
}

impl From<reqwest::Error> for ExtractorError {
    fn from(err: reqwest::Error) -> Self {
        ExtractorError::Transport {
            message: err.to_string(),
        }
    }
}

impl From<url::ParseError> for ExtractorError {
    fn from(err: url::ParseError) -> Self {
        ExtractorError::Config {
            message: err.to_string(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_only_transport_is_retryable() {
        assert!(ExtractorError::Transport {
            message: "timeout".to_string()
        }
        .is_retryable());

        assert!(!ExtractorError::Validation {
            input: "x".to_string()
        }
        .is_retryable());
        assert!(!ExtractorError::NotFound {
            roll: "21A91A0501".to_string()
        }
        .is_retryable());
        assert!(!ExtractorError::Format.is_retryable());
    }

    #[test]
    fn test_not_found_message_references_roll() {
        let err = ExtractorError::NotFound {
            roll: "21A91A0501".to_string(),
        };
        assert!(err.user_message().contains("21A91A0501"));
    }

    #[test]
    fn test_format_message_distinct_from_not_found() {
        let not_found = ExtractorError::NotFound {
            roll: "21A91A0501".to_string(),
        }
        .user_message();
        let format = ExtractorError::Format.user_message();
        assert_ne!(not_found, format);
        assert!(format.contains("not recognized"));
    }
}
