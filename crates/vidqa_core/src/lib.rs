//! Vidqa core: pure session state machine and view-model helpers.
mod effect;
mod error;
mod locator;
mod msg;
mod state;
mod update;
mod view_model;

pub use effect::Effect;
pub use error::{SessionError, TransitionError};
pub use locator::{extract_video_id, VideoId};
pub use msg::Msg;
pub use state::{
    AnswerContent, AnswerState, ConversationEntry, EntryHandle, Epoch, ErrorToken,
    IngestSummary, ProcessingStatus, ServiceHealth, SessionSettings, SessionState, VideoSession,
};
pub use update::update;
pub use view_model::{EntryView, ErrorView, SessionView};
