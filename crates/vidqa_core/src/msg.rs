#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Msg {
    /// User submitted a video locator for ingestion.
    VideoSubmitted(String),
    /// Ingestion request settled.
    IngestFinished {
        epoch: crate::Epoch,
        video_id: crate::VideoId,
        result: Result<crate::IngestSummary, String>,
    },
    /// User asked a question about the active video.
    QuestionSubmitted(String),
    /// Question request settled.
    AnswerReceived {
        epoch: crate::Epoch,
        handle: crate::EntryHandle,
        result: Result<crate::AnswerContent, String>,
    },
    /// User cleared the conversation, keeping the video.
    ClearClicked,
    /// User reset the whole session.
    ResetClicked,
    /// User asked the service to forget the active video.
    ForgetClicked,
    /// Server-side deletion settled.
    VideoForgotten {
        video_id: crate::VideoId,
        result: Result<(), String>,
    },
    /// User requested a service health check.
    HealthCheckRequested,
    /// Health check settled.
    HealthReported(Result<String, String>),
    /// Display duration of a transient error elapsed.
    ErrorExpired(crate::ErrorToken),
    /// Fallback for placeholder wiring.
    NoOp,
}
