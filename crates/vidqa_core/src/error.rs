use thiserror::Error;

use crate::{EntryHandle, ProcessingStatus};

/// User-facing failures surfaced as the transient session message.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please enter a valid YouTube URL")]
    InvalidReference,
    #[error("{0}")]
    IngestionFailure(String),
    #[error("{0}")]
    AnswerFailure(String),
    #[error("{0}")]
    DeletionFailure(String),
    #[error("There is no processed video to forget")]
    NothingToForget,
}

/// A transition was requested from a state that does not allow it.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum TransitionError {
    #[error("expected status Processing, found {0:?}")]
    NotProcessing(ProcessingStatus),
    #[error("no pending entry with handle {0}")]
    UnknownEntry(EntryHandle),
}
