use std::collections::BTreeMap;
use std::time::Duration;

use vidqa_logging::vidqa_debug;

use crate::view_model::{EntryView, ErrorView, SessionView};
use crate::{SessionError, TransitionError, VideoId};

/// Stable identifier of a conversation entry. Never reused within a session.
pub type EntryHandle = u64;
/// Generation of the active video context; advanced whenever that context is invalidated.
pub type Epoch = u64;
/// Identifies one recorded transient error so a late expiry cannot clear a newer one.
pub type ErrorToken = u64;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ProcessingStatus {
    #[default]
    Idle,
    Processing,
    Ready,
    /// Never a resting state: a failed ingestion settles back to `Idle`.
    Failed,
}

impl ProcessingStatus {
    /// True for the states that accept a fresh submission and hold no video.
    pub fn is_idle(self) -> bool {
        matches!(self, ProcessingStatus::Idle | ProcessingStatus::Failed)
    }
}

/// What the ingestion service reported about a processed video.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct IngestSummary {
    pub message: Option<String>,
    /// Identifier the service stored the transcript under.
    pub video_id: Option<String>,
    pub chunks_created: Option<u64>,
    pub transcript_length: Option<u64>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AnswerContent {
    pub text: String,
    pub sources: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum AnswerState {
    Pending,
    Answered(AnswerContent),
    Discarded,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ConversationEntry {
    pub handle: EntryHandle,
    pub question: String,
    pub answer_state: AnswerState,
}

#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct VideoSession {
    pub raw_locator: String,
    pub video_id: Option<VideoId>,
    pub status: ProcessingStatus,
    pub summary: Option<IngestSummary>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ServiceHealth {
    Healthy(String),
    Unreachable(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SessionSettings {
    /// How long a transient error stays visible.
    pub error_display: Duration,
}

impl Default for SessionSettings {
    fn default() -> Self {
        Self {
            error_display: Duration::from_secs(5),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub(crate) struct TransientError {
    token: ErrorToken,
    error: SessionError,
    display_for: Duration,
}

/// Authoritative in-memory model of one video Q&A session.
///
/// All mutation goes through the transition methods below; `update` is the
/// only caller outside of tests.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct SessionState {
    settings: SessionSettings,
    video: VideoSession,
    // BTreeMap keeps iteration in handle order, which is submission order.
    entries: BTreeMap<EntryHandle, ConversationEntry>,
    last_error: Option<TransientError>,
    service_health: Option<ServiceHealth>,
    next_handle: EntryHandle,
    next_error_token: ErrorToken,
    epoch: Epoch,
    dirty: bool,
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_settings(settings: SessionSettings) -> Self {
        Self {
            settings,
            ..Self::default()
        }
    }

    pub fn settings(&self) -> SessionSettings {
        self.settings
    }

    pub fn status(&self) -> ProcessingStatus {
        self.video.status
    }

    pub fn video(&self) -> &VideoSession {
        &self.video
    }

    pub fn epoch(&self) -> Epoch {
        self.epoch
    }

    /// Entries in submission order.
    pub fn entries(&self) -> impl Iterator<Item = &ConversationEntry> {
        self.entries.values()
    }

    pub fn entry(&self, handle: EntryHandle) -> Option<&ConversationEntry> {
        self.entries.get(&handle)
    }

    pub fn last_error(&self) -> Option<&SessionError> {
        self.last_error.as_ref().map(|e| &e.error)
    }

    pub fn view(&self) -> SessionView {
        let entries: Vec<EntryView> = self
            .entries
            .values()
            .map(|entry| EntryView {
                handle: entry.handle,
                question: entry.question.clone(),
                answer: entry.answer_state.clone(),
            })
            .collect();
        let pending_count = entries
            .iter()
            .filter(|e| e.answer == AnswerState::Pending)
            .count();

        SessionView {
            status: self.video.status,
            raw_locator: self.video.raw_locator.clone(),
            video_id: self.video.video_id.clone(),
            summary: self.video.summary.clone(),
            entries,
            pending_count,
            error: self.last_error.as_ref().map(|e| ErrorView {
                token: e.token,
                message: e.error.to_string(),
                display_for: e.display_for,
            }),
            service_health: self.service_health.clone(),
        }
    }

    /// Returns whether anything changed since the last call, and resets the flag.
    pub fn consume_dirty(&mut self) -> bool {
        std::mem::take(&mut self.dirty)
    }

    pub(crate) fn mark_dirty(&mut self) {
        self.dirty = true;
    }

    /// Start ingesting `locator`. Drops the old video context entirely.
    pub fn begin_processing(&mut self, locator: impl Into<String>) {
        self.epoch += 1;
        self.video = VideoSession {
            raw_locator: locator.into(),
            video_id: None,
            status: ProcessingStatus::Processing,
            summary: None,
        };
        self.entries.clear();
        self.last_error = None;
        self.mark_dirty();
        vidqa_debug!("begin_processing epoch={}", self.epoch);
    }

    pub fn complete_processing(
        &mut self,
        id: VideoId,
        summary: IngestSummary,
    ) -> Result<(), TransitionError> {
        self.expect_processing()?;
        vidqa_debug!("complete_processing epoch={} video_id={}", self.epoch, id);
        self.video.status = ProcessingStatus::Ready;
        self.video.video_id = Some(id);
        self.video.summary = Some(summary);
        self.entries.clear();
        self.mark_dirty();
        Ok(())
    }

    pub fn fail_processing(
        &mut self,
        message: impl Into<String>,
    ) -> Result<ErrorToken, TransitionError> {
        self.expect_processing()?;
        vidqa_debug!("fail_processing epoch={}", self.epoch);
        self.video.status = ProcessingStatus::Idle;
        self.video.video_id = None;
        self.video.summary = None;
        Ok(self.record_error(SessionError::IngestionFailure(message.into())))
    }

    /// Optimistically add `question` with no answer yet.
    pub fn append_pending_question(&mut self, question: impl Into<String>) -> EntryHandle {
        self.next_handle += 1;
        let handle = self.next_handle;
        self.entries.insert(
            handle,
            ConversationEntry {
                handle,
                question: question.into(),
                answer_state: AnswerState::Pending,
            },
        );
        self.mark_dirty();
        handle
    }

    pub fn resolve_entry(
        &mut self,
        handle: EntryHandle,
        answer_text: impl Into<String>,
        source_fragments: Vec<String>,
    ) -> Result<(), TransitionError> {
        let entry = self
            .entries
            .get_mut(&handle)
            .filter(|entry| entry.answer_state == AnswerState::Pending)
            .ok_or(TransitionError::UnknownEntry(handle))?;
        entry.answer_state = AnswerState::Answered(AnswerContent {
            text: answer_text.into(),
            sources: source_fragments,
        });
        self.mark_dirty();
        Ok(())
    }

    /// Roll back a pending entry and surface `message`.
    ///
    /// Returns the removed entry, tagged `Discarded`, with the token of the
    /// recorded error.
    pub fn discard_entry(
        &mut self,
        handle: EntryHandle,
        message: impl Into<String>,
    ) -> Result<(ConversationEntry, ErrorToken), TransitionError> {
        if !matches!(
            self.entries.get(&handle),
            Some(entry) if entry.answer_state == AnswerState::Pending
        ) {
            return Err(TransitionError::UnknownEntry(handle));
        }
        let mut removed = self
            .entries
            .remove(&handle)
            .ok_or(TransitionError::UnknownEntry(handle))?;
        removed.answer_state = AnswerState::Discarded;
        let token = self.record_error(SessionError::AnswerFailure(message.into()));
        Ok((removed, token))
    }

    pub fn clear_conversation(&mut self) {
        if !self.entries.is_empty() {
            self.entries.clear();
            self.mark_dirty();
        }
    }

    /// Back to the initial empty state. Handle, token and epoch counters keep
    /// counting so results issued before the reset can still be recognized as stale.
    pub fn reset_all(&mut self) {
        *self = Self {
            settings: self.settings,
            next_handle: self.next_handle,
            next_error_token: self.next_error_token,
            epoch: self.epoch + 1,
            dirty: true,
            ..Self::default()
        };
        vidqa_debug!("reset_all epoch={}", self.epoch);
    }

    /// Record `error` as the transient session message, replacing any previous one.
    pub fn record_error(&mut self, error: SessionError) -> ErrorToken {
        self.next_error_token += 1;
        let token = self.next_error_token;
        self.last_error = Some(TransientError {
            token,
            error,
            display_for: self.settings.error_display,
        });
        self.mark_dirty();
        token
    }

    /// Clear the transient error if it is still the one identified by `token`.
    pub fn expire_error(&mut self, token: ErrorToken) -> bool {
        match &self.last_error {
            Some(current) if current.token == token => {
                self.last_error = None;
                self.mark_dirty();
                true
            }
            _ => false,
        }
    }

    pub fn set_service_health(&mut self, health: ServiceHealth) {
        self.service_health = Some(health);
        self.mark_dirty();
    }

    fn expect_processing(&self) -> Result<(), TransitionError> {
        if self.video.status == ProcessingStatus::Processing {
            Ok(())
        } else {
            Err(TransitionError::NotProcessing(self.video.status))
        }
    }
}
