//! Validation context for a loaded record
//!
//! A context is built once per successful load and bound to the record the
//! service holds. It never writes the record; it reads the current field
//! values on every `validate` call, so a save that resumes after other events
//! still validates what is there now.

use parking_lot::RwLock;
use std::sync::Arc;

/// Record shared between the service (owner) and the session (reader)
pub type SharedRecord<R> = Arc<RwLock<R>>;

/// A single field-level validation message
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FieldError {
    /// Field name
    pub field: String,
    /// Message shown beside the field
    pub message: String,
}

impl FieldError {
    /// Create new field error
    #[inline]
    #[must_use]
    pub fn new(field: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            field: field.into(),
            message: message.into(),
        }
    }
}

/// Result of validating a record
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ValidationReport {
    errors: Vec<FieldError>,
}

impl ValidationReport {
    /// Report with no errors
    #[inline]
    #[must_use]
    pub fn valid() -> Self {
        Self::default()
    }

    /// Add an error
    #[inline]
    #[must_use]
    pub fn with_error(mut self, field: impl Into<String>, message: impl Into<String>) -> Self {
        self.push(field, message);
        self
    }

    /// Add an error in place
    pub fn push(&mut self, field: impl Into<String>, message: impl Into<String>) {
        self.errors.push(FieldError::new(field, message));
    }

    #[inline]
    #[must_use]
    pub fn is_valid(&self) -> bool {
        self.errors.is_empty()
    }

    #[inline]
    #[must_use]
    pub fn errors(&self) -> &[FieldError] {
        &self.errors
    }
}

/// Field-level validation rules of a record type
pub trait Validate {
    /// Validate the current field values
    fn validate(&self) -> ValidationReport;
}

/// Per-load validity and modification tracking
#[derive(Debug)]
pub struct ValidationContext<R> {
    record: SharedRecord<R>,
    last_report: ValidationReport,
    modified: bool,
}

impl<R: Validate> ValidationContext<R> {
    /// Bind a fresh context to a loaded record
    #[must_use]
    pub fn new(record: SharedRecord<R>) -> Self {
        Self {
            record,
            last_report: ValidationReport::valid(),
            modified: false,
        }
    }

    /// Validate the record as it is now. Field messages are kept until the
    /// next call.
    pub fn validate(&mut self) -> bool {
        self.last_report = self.record.read().validate();
        self.last_report.is_valid()
    }

    /// Messages from the last `validate` call
    #[must_use]
    pub fn field_errors(&self) -> &[FieldError] {
        self.last_report.errors()
    }

    #[must_use]
    pub fn is_modified(&self) -> bool {
        self.modified
    }

    pub fn mark_modified(&mut self) {
        self.modified = true;
    }

    pub fn mark_unmodified(&mut self) {
        self.modified = false;
    }

    /// The record this context is bound to
    #[must_use]
    pub fn record(&self) -> &SharedRecord<R> {
        &self.record
    }
}
