use std::time::Duration;

use crate::{
    AnswerState, EntryHandle, ErrorToken, IngestSummary, ProcessingStatus, ServiceHealth, VideoId,
};

/// Read-only snapshot handed to the presentation layer.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionView {
    pub status: ProcessingStatus,
    pub raw_locator: String,
    pub video_id: Option<VideoId>,
    pub summary: Option<IngestSummary>,
    pub entries: Vec<EntryView>,
    pub pending_count: usize,
    pub error: Option<ErrorView>,
    pub service_health: Option<ServiceHealth>,
}

impl SessionView {
    /// Whether a new question would be accepted right now.
    pub fn can_ask(&self) -> bool {
        self.status == ProcessingStatus::Ready
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EntryView {
    pub handle: EntryHandle,
    pub question: String,
    pub answer: AnswerState,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorView {
    pub token: ErrorToken,
    pub message: String,
    pub display_for: Duration,
}
