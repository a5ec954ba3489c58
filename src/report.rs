//! Per-record outcomes and the end-of-run summary.

use std::fmt;

use crate::api::ApiError;
use crate::error::ValueError;
use crate::model::Id;
use crate::resolver::ResolveError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    MalformedValue,
    UnmappedCode,
    MissingField,
    Api,
    Network,
}

impl fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ErrorKind::MalformedValue => "malformed value",
            ErrorKind::UnmappedCode => "unmapped code",
            ErrorKind::MissingField => "missing field",
            ErrorKind::Api => "api",
            ErrorKind::Network => "network",
        };
        f.write_str(name)
    }
}

/// Why one record could not be loaded.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RecordError {
    pub kind: ErrorKind,
    pub message: String,
}

impl RecordError {
    pub fn new(kind: ErrorKind, message: impl Into<String>) -> Self {
        RecordError {
            kind,
            message: message.into(),
        }
    }
}

impl fmt::Display for RecordError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.message, self.kind)
    }
}

impl std::error::Error for RecordError {}

impl From<ValueError> for RecordError {
    fn from(err: ValueError) -> Self {
        let kind = match err {
            ValueError::MalformedIsbn(_)
            | ValueError::MalformedIssn(_)
            | ValueError::InvalidNumber { .. } => ErrorKind::MalformedValue,
            ValueError::UnmappedCode { .. } => ErrorKind::UnmappedCode,
            ValueError::MissingField(_) => ErrorKind::MissingField,
        };
        RecordError::new(kind, err.to_string())
    }
}

impl From<ApiError> for RecordError {
    fn from(err: ApiError) -> Self {
        RecordError::new(ErrorKind::Api, err.to_string())
    }
}

impl From<ResolveError> for RecordError {
    fn from(err: ResolveError) -> Self {
        RecordError::new(ErrorKind::Network, err.to_string())
    }
}

/// What happened to a record that loaded without error.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RecordSuccess {
    Created(Id),
    Updated(Id),
    Unchanged(Id),
    /// The record belongs to another publisher, or the work it updates is
    /// missing.
    Skipped,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RecordOutcome {
    pub label: String,
    pub result: Result<RecordSuccess, RecordError>,
}

/// Outcomes of a whole run, in input order.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct RunReport {
    pub outcomes: Vec<RecordOutcome>,
    /// Set when `--fail-fast` stopped the run at the first failure.
    pub aborted: bool,
    pub deferred_issues_created: usize,
    pub deferred_issues_failed: usize,
}

impl RunReport {
    pub fn push(&mut self, label: impl Into<String>, result: Result<RecordSuccess, RecordError>) {
        self.outcomes.push(RecordOutcome {
            label: label.into(),
            result,
        });
    }

    fn count(&self, pred: impl Fn(&RecordSuccess) -> bool) -> usize {
        self.outcomes
            .iter()
            .filter(|o| o.result.as_ref().is_ok_and(&pred))
            .count()
    }

    pub fn created(&self) -> usize {
        self.count(|s| matches!(s, RecordSuccess::Created(_)))
    }

    pub fn updated(&self) -> usize {
        self.count(|s| matches!(s, RecordSuccess::Updated(_)))
    }

    pub fn unchanged(&self) -> usize {
        self.count(|s| matches!(s, RecordSuccess::Unchanged(_)))
    }

    pub fn skipped(&self) -> usize {
        self.count(|s| matches!(s, RecordSuccess::Skipped))
    }

    pub fn failures(&self) -> impl Iterator<Item = (&str, &RecordError)> {
        self.outcomes
            .iter()
            .filter_map(|o| o.result.as_ref().err().map(|e| (o.label.as_str(), e)))
    }

    pub fn failed(&self) -> usize {
        self.failures().count()
    }

    /// Ids of works that were created or updated, in input order.
    pub fn touched_works(&self) -> impl Iterator<Item = &Id> {
        self.outcomes.iter().filter_map(|o| match &o.result {
            Ok(RecordSuccess::Created(id) | RecordSuccess::Updated(id)) => Some(id),
            _ => None,
        })
    }

    /// True when every record loaded and the run was not aborted.
    pub fn is_success(&self) -> bool {
        !self.aborted && self.failed() == 0 && self.deferred_issues_failed == 0
    }
}

impl fmt::Display for RunReport {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        writeln!(
            f,
            "{} created, {} updated, {} unchanged, {} skipped, {} failed",
            self.created(),
            self.updated(),
            self.unchanged(),
            self.skipped(),
            self.failed()
        )?;
        if self.deferred_issues_created + self.deferred_issues_failed > 0 {
            writeln!(
                f,
                "series issues: {} created, {} failed",
                self.deferred_issues_created, self.deferred_issues_failed
            )?;
        }
        for (label, err) in self.failures() {
            writeln!(f, "  {label}: {err}")?;
        }
        if self.aborted {
            writeln!(f, "run aborted after first failure")?;
        }
        Ok(())
    }
}
