//! Error types for MusicXML ingestion
//!
//! Defines the error hierarchy for ingestion failures: fatal parse errors
//! (ParseError), out-of-range numeric values that make position arithmetic
//! meaningless (Assertion) and structural inconsistencies that indicate a
//! corrupted traversal (Internal). Non-fatal findings go to
//! [`crate::diagnostics::Diagnostics`] instead.

use thiserror::Error;

/// Top-level ingestion error type
#[derive(Debug, Clone, PartialEq, Error)]
pub enum IngestError {
    /// Fatal XML parsing error
    #[error("XML parsing failed: {0}")]
    ParseError(#[from] ParseError),

    /// Out-of-range numeric value (divisions, staff or voice number)
    #[error("Assertion failed at line {line}: {message}")]
    Assertion { line: usize, message: String },

    /// Structural inconsistency the traversal cannot recover from
    #[error("Internal ingestion error at line {line}: {message}")]
    Internal { line: usize, message: String },
}

impl IngestError {
    pub fn assertion(line: usize, message: impl Into<String>) -> Self {
        IngestError::Assertion {
            line,
            message: message.into(),
        }
    }

    pub fn internal(line: usize, message: impl Into<String>) -> Self {
        IngestError::Internal {
            line,
            message: message.into(),
        }
    }

    /// Source line of the offending element, when known
    pub fn line(&self) -> Option<usize> {
        match self {
            IngestError::ParseError(e) => e.line(),
            IngestError::Assertion { line, .. } | IngestError::Internal { line, .. } => Some(*line),
        }
    }
}

/// Fatal XML parsing errors
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ParseError {
    /// XML is malformed (not well-formed)
    #[error("Invalid XML: {0}")]
    InvalidXml(String),

    /// MusicXML format not supported (e.g., timewise instead of partwise)
    #[error("Unsupported MusicXML format: {0}")]
    UnsupportedFormat(String),

    /// Required structural element is missing
    #[error("Missing required element <{element}> at line {line}")]
    MissingRequiredElement { line: usize, element: String },

    /// Element text or attribute could not be converted
    #[error("Invalid value '{value}' for <{element}> at line {line}: {reason}")]
    InvalidValue {
        line: usize,
        element: String,
        value: String,
        reason: String,
    },
}

impl ParseError {
    pub fn line(&self) -> Option<usize> {
        match self {
            ParseError::InvalidXml(_) | ParseError::UnsupportedFormat(_) => None,
            ParseError::MissingRequiredElement { line, .. } | ParseError::InvalidValue { line, .. } => {
                Some(*line)
            }
        }
    }
}

pub type Result<T> = std::result::Result<T, IngestError>;
