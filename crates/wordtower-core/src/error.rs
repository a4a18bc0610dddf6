//! Error types for graph building, store access, and the quiz engine.
//!
//! Store errors live here rather than in `wordtower-store` so that the quiz
//! engine and importer can propagate them without depending on a concrete
//! adapter.

use thiserror::Error;
use uuid::Uuid;

use crate::engine::QuizMode;

/// Why a raw word record was rejected by the builder.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RejectReason {
    EmptyText,
    EmptyGloss,
    GradeOutOfRange { grade: i64, max: u8 },
}

impl std::fmt::Display for RejectReason {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            RejectReason::EmptyText => write!(f, "missing word text"),
            RejectReason::EmptyGloss => write!(f, "missing gloss"),
            RejectReason::GradeOutOfRange { grade, max } => {
                write!(f, "grade {grade} outside 1..={max}")
            }
        }
    }
}

/// A malformed input record. Skipped and reported; never aborts a build.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("record #{index} ({text:?}): {reason}")]
pub struct ValidationError {
    /// Position of the record in the input sequence.
    pub index: usize,
    /// The raw text of the record, possibly empty.
    pub text: String,
    pub reason: RejectReason,
}

/// Failures reported by a graph store adapter.
#[derive(Debug, Error)]
pub enum StoreError {
    /// The store could not be reached or refused the operation.
    #[error("store unavailable: {0}")]
    Unavailable(String),

    /// An edge referenced a node that does not exist.
    #[error("missing {label} node: {key}")]
    MissingNode { label: String, key: String },

    /// Stored data could not be decoded.
    #[error("corrupt store data: {0}")]
    Corrupt(String),

    /// Filesystem failure in a file-backed store.
    #[error("store I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl StoreError {
    /// Returns `true` if re-running the operation may succeed.
    pub fn is_transient(&self) -> bool {
        matches!(self, StoreError::Unavailable(_) | StoreError::Io(_))
    }
}

/// Errors returned by quiz engine operations. Each one fails only the call
/// that produced it; session state is left unchanged.
#[derive(Debug, Error)]
pub enum QuizError {
    #[error("tier {tier} outside 1..={max}")]
    InvalidTier { tier: u8, max: u8 },

    #[error("no eligible words for floor {tier}")]
    InsufficientWords { tier: u8 },

    #[error("floor {tier} has no questions left")]
    FloorExhausted { tier: u8 },

    #[error("question {0} was already answered")]
    AlreadyAnswered(Uuid),

    #[error("unknown question {0}")]
    UnknownQuestion(Uuid),

    #[error("option {index} out of range (question has {count} options)")]
    InvalidOption { index: usize, count: usize },

    #[error("no floor has been started")]
    NoActiveFloor,

    #[error("floor {tier} is still in progress")]
    FloorInProgress { tier: u8 },

    #[error("floor {tier} is not complete yet")]
    FloorNotComplete { tier: u8 },

    #[error("session is complete")]
    SessionComplete,

    #[error("floor {tier} is the top of the tower")]
    TopFloorReached { tier: u8 },

    #[error("the current floor is in {mode} mode")]
    ModeMismatch { mode: QuizMode },

    #[error("invalid quiz settings: {0}")]
    InvalidConfig(String),

    #[error(transparent)]
    Store(#[from] StoreError),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn validation_error_message() {
        let err = ValidationError {
            index: 3,
            text: "cat".into(),
            reason: RejectReason::GradeOutOfRange { grade: 12, max: 9 },
        };
        assert_eq!(err.to_string(), "record #3 (\"cat\"): grade 12 outside 1..=9");
    }

    #[test]
    fn store_error_transience() {
        assert!(StoreError::Unavailable("down".into()).is_transient());
        assert!(!StoreError::Corrupt("bad json".into()).is_transient());
        assert!(!StoreError::MissingNode {
            label: "Grade".into(),
            key: "3".into()
        }
        .is_transient());
    }

    #[test]
    fn quiz_error_wraps_store_error() {
        let err: QuizError = StoreError::Unavailable("timeout".into()).into();
        assert!(matches!(err, QuizError::Store(StoreError::Unavailable(_))));
        assert_eq!(err.to_string(), "store unavailable: timeout");
    }
}
