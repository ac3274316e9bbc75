use std::fmt;

use serde::{Deserialize, Serialize};

/// Message used for every transport-level fault, distinct from any service `detail`.
pub const UNREACHABLE_MESSAGE: &str =
    "Failed to reach the video Q&A service. Make sure the backend is running.";

#[derive(Debug, Clone, PartialEq, Eq, Default, Deserialize)]
pub struct IngestAck {
    #[serde(default)]
    pub message: Option<String>,
    #[serde(default)]
    pub video_id: Option<String>,
    #[serde(default)]
    pub chunks_created: Option<u64>,
    #[serde(default)]
    pub transcript_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Answer {
    #[serde(rename = "answer")]
    pub text: String,
    #[serde(rename = "relevant_chunks", default)]
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct HealthStatus {
    pub status: String,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct VideoRequest<'a> {
    pub video_url: &'a str,
}

#[derive(Debug, Clone, Serialize)]
pub(crate) struct QuestionRequest<'a> {
    pub video_url: &'a str,
    pub question: &'a str,
}

#[derive(Debug, Clone, Deserialize)]
pub(crate) struct ErrorBody {
    pub detail: Option<serde_json::Value>,
}

/// Uniform failure for every gateway call.
///
/// `message` is what the session shows; `kind` only feeds logging.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("{message}")]
pub struct GatewayFailure {
    pub kind: FailureKind,
    pub message: String,
}

impl GatewayFailure {
    pub(crate) fn new(kind: FailureKind, message: impl Into<String>) -> Self {
        Self {
            kind,
            message: message.into(),
        }
    }

    pub(crate) fn transport(kind: FailureKind) -> Self {
        Self::new(kind, UNREACHABLE_MESSAGE)
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum FailureKind {
    InvalidBaseUrl,
    Rejected { status: u16 },
    Unreachable,
    Timeout,
    MalformedBody,
    Cancelled,
}

impl fmt::Display for FailureKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FailureKind::InvalidBaseUrl => write!(f, "invalid base url"),
            FailureKind::Rejected { status } => write!(f, "rejected with status {status}"),
            FailureKind::Unreachable => write!(f, "service unreachable"),
            FailureKind::Timeout => write!(f, "timeout"),
            FailureKind::MalformedBody => write!(f, "malformed response body"),
            FailureKind::Cancelled => write!(f, "cancelled"),
        }
    }
}

/// What a finished request produced, keyed by the request kind.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Outcome {
    Ingested(Result<IngestAck, GatewayFailure>),
    Answered(Result<Answer, GatewayFailure>),
    Deleted(Result<(), GatewayFailure>),
    Health(Result<HealthStatus, GatewayFailure>),
}

/// Completion of a command, carrying back the caller's tag.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GatewayEvent<T> {
    pub tag: T,
    pub outcome: Outcome,
}
