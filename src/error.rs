use std::path::PathBuf;

use thiserror::Error;
use uuid::Uuid;

use crate::model::EntityKind;

pub type Result<T> = std::result::Result<T, LcaError>;

/// Every failure the data-access layer, report pipeline and session can surface.
#[derive(Debug, Error)]
pub enum LcaError {
    /// Service unreachable or archive unreadable at the given endpoint/path
    #[error("connection to {endpoint} failed: {reason}")]
    Connection { endpoint: String, reason: String },

    #[error("{kind} {id} not found")]
    NotFound { kind: EntityKind, id: Uuid },

    /// A stored document or reference contradicts the schema (corrupt dataset)
    #[error("schema violation: {0}")]
    Schema(String),

    #[error("invalid edit of '{field}': {reason}")]
    Validation { field: String, reason: String },

    #[error("{endpoint} is read-only; cannot write {kind} {id}")]
    WriteUnsupported {
        endpoint: String,
        kind: EntityKind,
        id: Uuid,
    },

    #[error("conversion of {} failed: {reason}", .report.display())]
    Conversion { report: PathBuf, reason: String },

    #[error("report {} already exists", .0.display())]
    ReportExists(PathBuf),

    #[error("no report found at {}", .0.display())]
    MissingReport(PathBuf),

    #[error("no product system selected")]
    NoSelection,

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl LcaError {
    pub fn connection(endpoint: impl Into<String>, reason: impl ToString) -> Self {
        Self::Connection {
            endpoint: endpoint.into(),
            reason: reason.to_string(),
        }
    }

    pub fn validation(field: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::Validation {
            field: field.into(),
            reason: reason.into(),
        }
    }

    /// Read-only backends reject writes as an expected outcome, not a failure
    pub fn is_informational(&self) -> bool {
        matches!(self, Self::WriteUnsupported { .. })
    }
}
