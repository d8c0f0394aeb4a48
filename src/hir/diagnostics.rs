//! Diagnostics: syntax and evaluation error reporting.
//!
//! Syntax errors and evaluation errors are accumulated as diagnostics for
//! the editor; neither is ever propagated across the core's boundary as a
//! failure.

use std::sync::Arc;

use crate::base::{FileId, LineIndex, Range};
use crate::syntax::SyntaxError;

use super::engine::EvaluationError;

// ============================================================================
// DIAGNOSTIC TYPES
// ============================================================================

/// Severity level of a diagnostic.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
pub enum Severity {
    Error,
    Warning,
    Info,
    Hint,
}

impl Severity {
    /// Convert to LSP severity number.
    pub fn to_lsp(&self) -> u32 {
        match self {
            Severity::Error => 1,
            Severity::Warning => 2,
            Severity::Info => 3,
            Severity::Hint => 4,
        }
    }
}

/// A diagnostic message with location.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct Diagnostic {
    /// The file containing this diagnostic.
    pub file: FileId,
    /// 0-based range.
    pub range: Range,
    /// Severity level.
    pub severity: Severity,
    /// Error code (e.g., "XML0001").
    pub code: Option<Arc<str>>,
    /// The diagnostic message.
    pub message: Arc<str>,
}

impl Diagnostic {
    /// Create a new error diagnostic.
    pub fn error(file: FileId, range: Range, message: impl Into<Arc<str>>) -> Self {
        Self {
            file,
            range,
            severity: Severity::Error,
            code: None,
            message: message.into(),
        }
    }

    /// Create a new warning diagnostic.
    pub fn warning(file: FileId, range: Range, message: impl Into<Arc<str>>) -> Self {
        Self {
            severity: Severity::Warning,
            ..Self::error(file, range, message)
        }
    }

    /// Set the error code.
    pub fn with_code(mut self, code: impl Into<Arc<str>>) -> Self {
        self.code = Some(code.into());
        self
    }
}

// ============================================================================
// DIAGNOSTIC CODES
// ============================================================================

/// Standard diagnostic codes.
pub mod codes {
    /// Malformed XML.
    pub const MALFORMED_XML: &str = "XML0001";

    /// The evaluation engine rejected the XML.
    pub const INVALID_PROJECT: &str = "MSB0001";
    /// A condition could not be evaluated.
    pub const INVALID_CONDITION: &str = "MSB0002";
    /// Engine failure unrelated to the document text.
    pub const ENGINE_FAILURE: &str = "MSB0003";
}

// ============================================================================
// DIAGNOSTIC COLLECTOR
// ============================================================================

/// Collects diagnostics for one document version.
#[derive(Clone, Debug)]
pub struct DiagnosticCollector<'a> {
    file: FileId,
    index: &'a LineIndex,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> DiagnosticCollector<'a> {
    /// Create a new empty collector.
    pub fn new(file: FileId, index: &'a LineIndex) -> Self {
        Self {
            file,
            index,
            diagnostics: Vec::new(),
        }
    }

    /// Add a diagnostic.
    pub fn add(&mut self, diagnostic: Diagnostic) {
        self.diagnostics.push(diagnostic);
    }

    /// Add a malformed-XML error.
    pub fn syntax_error(&mut self, error: &SyntaxError) {
        let range = self.index.range(error.range);
        self.add(
            Diagnostic::error(self.file, range, error.message.as_str())
                .with_code(codes::MALFORMED_XML),
        );
    }

    /// Add an evaluation error at the position the engine reported, or at
    /// the start of the document.
    pub fn evaluation_error(&mut self, error: &EvaluationError) {
        let start = error
            .position()
            .and_then(|p| self.index.offset(p).ok())
            .map(|offset| self.index.position(offset))
            .unwrap_or_else(|| self.index.position(0.into()));
        let code = match error {
            EvaluationError::InvalidXml { .. } => codes::INVALID_PROJECT,
            EvaluationError::InvalidCondition { .. } => codes::INVALID_CONDITION,
            EvaluationError::Engine(_) => codes::ENGINE_FAILURE,
        };
        self.add(
            Diagnostic::error(self.file, Range::empty(start), error.to_string()).with_code(code),
        );
    }

    /// Get all diagnostics.
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Get the number of errors.
    pub fn error_count(&self) -> usize {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == Severity::Error)
            .count()
    }

    /// Check if there are any errors.
    pub fn has_errors(&self) -> bool {
        self.diagnostics
            .iter()
            .any(|d| d.severity == Severity::Error)
    }

    /// Take all diagnostics, leaving the collector empty.
    pub fn take(&mut self) -> Vec<Diagnostic> {
        std::mem::take(&mut self.diagnostics)
    }

    /// Consume the collector.
    pub fn finish(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
