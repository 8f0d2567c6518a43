//! Diagnostics collected during ingestion
//!
//! Non-fatal findings: unknown enumerated values (reported as errors, a
//! default is used and traversal continues), advisory warnings and skipped
//! elements. Fatal problems are [`crate::errors::IngestError`]s instead.

use serde::{Deserialize, Serialize};

/// Severity level for diagnostics
#[derive(Serialize, Deserialize, Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord)]
#[serde(rename_all = "lowercase")]
pub enum DiagnosticSeverity {
    Error,
    Warning,
    Info,
}

/// A diagnostic attached to a source line
#[derive(Serialize, Deserialize, Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// 1-based line of the offending element (0 when synthesized)
    pub line: usize,
    /// Severity level
    pub severity: DiagnosticSeverity,
    /// Kind identifier (e.g., "unknown_clef_sign", "backup_before_measure_start")
    pub kind: String,
    /// Human-readable message
    pub message: String,
}

impl Diagnostic {
    pub fn new(
        line: usize,
        severity: DiagnosticSeverity,
        kind: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            line,
            severity,
            kind: kind.into(),
            message: message.into(),
        }
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let severity = match self.severity {
            DiagnosticSeverity::Error => "error",
            DiagnosticSeverity::Warning => "warning",
            DiagnosticSeverity::Info => "info",
        };
        write!(f, "line {}: {} [{}]: {}", self.line, severity, self.kind, self.message)
    }
}

/// Collection of diagnostics for one ingested document
#[derive(Serialize, Deserialize, Clone, Debug, Default, PartialEq, Eq)]
pub struct Diagnostics {
    pub marks: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self { marks: Vec::new() }
    }

    pub fn add(&mut self, mark: Diagnostic) {
        self.marks.push(mark);
    }

    /// Unknown enumerated value; the caller continues with a default
    pub fn error(&mut self, line: usize, kind: &str, message: impl Into<String>) {
        let mark = Diagnostic::new(line, DiagnosticSeverity::Error, kind, message);
        log::error!("{}", mark);
        self.add(mark);
    }

    pub fn warning(&mut self, line: usize, kind: &str, message: impl Into<String>) {
        let mark = Diagnostic::new(line, DiagnosticSeverity::Warning, kind, message);
        log::warn!("{}", mark);
        self.add(mark);
    }

    /// Element skipped because it is not supported
    pub fn skipped(&mut self, line: usize, element: &str, reason: impl Into<String>) {
        let mark = Diagnostic::new(line, DiagnosticSeverity::Info, "skipped", format!("<{}>: {}", element, reason.into()));
        log::debug!("{}", mark);
        self.add(mark);
    }

    pub fn has_errors(&self) -> bool {
        self.marks
            .iter()
            .any(|m| m.severity == DiagnosticSeverity::Error)
    }

    pub fn is_empty(&self) -> bool {
        self.marks.is_empty()
    }

    pub fn len(&self) -> usize {
        self.marks.len()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Diagnostic> {
        self.marks.iter()
    }

    pub fn of_kind<'a>(&'a self, kind: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.marks.iter().filter(move |m| m.kind == kind)
    }

    pub fn warnings(&self) -> impl Iterator<Item = &Diagnostic> {
        self.marks
            .iter()
            .filter(|m| m.severity == DiagnosticSeverity::Warning)
    }
}
