use std::time::Duration;

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Effect {
    SubmitVideo {
        epoch: crate::Epoch,
        video_id: crate::VideoId,
        locator: String,
    },
    SubmitQuestion {
        epoch: crate::Epoch,
        handle: crate::EntryHandle,
        locator: String,
        question: String,
    },
    /// Requests issued under an epoch older than `epoch` are no longer wanted.
    CancelStale { epoch: crate::Epoch },
    DeleteVideo { video_id: crate::VideoId },
    CheckHealth,
    /// Deliver `Msg::ErrorExpired(token)` after `after` has elapsed.
    ScheduleErrorClear {
        token: crate::ErrorToken,
        after: Duration,
    },
}
