use vidqa_logging::{vidqa_debug, vidqa_info, vidqa_warn};

use crate::{
    extract_video_id, Effect, ErrorToken, Msg, ProcessingStatus, ServiceHealth, SessionError,
    SessionState,
};

/// Pure update function: applies a message to state and returns any effects.
pub fn update(mut state: SessionState, msg: Msg) -> (SessionState, Vec<Effect>) {
    let effects = match msg {
        Msg::VideoSubmitted(raw) => process_video(&mut state, &raw),
        Msg::IngestFinished {
            epoch,
            video_id,
            result,
        } => {
            if epoch != state.epoch() {
                vidqa_debug!(
                    "Dropping stale ingest result epoch={} current={}",
                    epoch,
                    state.epoch()
                );
                return (state, Vec::new());
            }
            match result {
                Ok(summary) => {
                    if let Err(err) = state.complete_processing(video_id, summary) {
                        vidqa_warn!("Ignoring ingest success: {}", err);
                    }
                    Vec::new()
                }
                Err(message) => match state.fail_processing(message) {
                    Ok(token) => vec![schedule_clear(&state, token)],
                    Err(err) => {
                        vidqa_warn!("Ignoring ingest failure: {}", err);
                        Vec::new()
                    }
                },
            }
        }
        Msg::QuestionSubmitted(text) => ask_question(&mut state, text),
        Msg::AnswerReceived {
            epoch,
            handle,
            result,
        } => {
            if epoch != state.epoch() {
                vidqa_debug!(
                    "Dropping stale answer handle={} epoch={} current={}",
                    handle,
                    epoch,
                    state.epoch()
                );
                return (state, Vec::new());
            }
            match result {
                Ok(content) => {
                    // A cleared conversation no longer holds the entry.
                    if let Err(err) = state.resolve_entry(handle, content.text, content.sources) {
                        vidqa_debug!("Dropping answer: {}", err);
                    }
                    Vec::new()
                }
                Err(message) => match state.discard_entry(handle, message) {
                    Ok((_, token)) => vec![schedule_clear(&state, token)],
                    Err(err) => {
                        vidqa_debug!("Dropping answer failure: {}", err);
                        Vec::new()
                    }
                },
            }
        }
        Msg::ClearClicked => {
            state.clear_conversation();
            Vec::new()
        }
        Msg::ResetClicked => {
            state.reset_all();
            vec![Effect::CancelStale {
                epoch: state.epoch(),
            }]
        }
        Msg::ForgetClicked => {
            let Some(video_id) = state.video().video_id.clone() else {
                vidqa_info!("Forget requested without a processed video");
                let token = state.record_error(SessionError::NothingToForget);
                let effects = vec![schedule_clear(&state, token)];
                return (state, effects);
            };
            state.reset_all();
            vec![
                Effect::CancelStale {
                    epoch: state.epoch(),
                },
                Effect::DeleteVideo { video_id },
            ]
        }
        Msg::VideoForgotten { video_id, result } => match result {
            Ok(()) => {
                vidqa_info!("Service forgot video {}", video_id);
                Vec::new()
            }
            Err(message) => {
                let token = state.record_error(SessionError::DeletionFailure(message));
                vec![schedule_clear(&state, token)]
            }
        },
        Msg::HealthCheckRequested => vec![Effect::CheckHealth],
        Msg::HealthReported(result) => {
            state.set_service_health(match result {
                Ok(status) => ServiceHealth::Healthy(status),
                Err(message) => ServiceHealth::Unreachable(message),
            });
            Vec::new()
        }
        Msg::ErrorExpired(token) => {
            state.expire_error(token);
            Vec::new()
        }
        Msg::NoOp => Vec::new(),
    };

    (state, effects)
}

fn process_video(state: &mut SessionState, raw: &str) -> Vec<Effect> {
    // At most one ingestion in flight.
    if state.status() == ProcessingStatus::Processing {
        vidqa_info!("Ignoring video submission while processing");
        return Vec::new();
    }

    let Some(video_id) = extract_video_id(raw) else {
        vidqa_info!("Rejected video locator of {} bytes", raw.len());
        let token = state.record_error(SessionError::InvalidReference);
        return vec![schedule_clear(state, token)];
    };

    let locator = raw.trim().to_string();
    state.begin_processing(locator.clone());
    let epoch = state.epoch();
    vec![
        Effect::CancelStale { epoch },
        Effect::SubmitVideo {
            epoch,
            video_id,
            locator,
        },
    ]
}

fn ask_question(state: &mut SessionState, text: String) -> Vec<Effect> {
    if text.trim().is_empty() {
        return Vec::new();
    }
    if state.status() != ProcessingStatus::Ready {
        vidqa_info!("Ignoring question without a processed video");
        return Vec::new();
    }

    let locator = state.video().raw_locator.clone();
    let handle = state.append_pending_question(text.clone());
    vec![Effect::SubmitQuestion {
        epoch: state.epoch(),
        handle,
        locator,
        question: text,
    }]
}

fn schedule_clear(state: &SessionState, token: ErrorToken) -> Effect {
    Effect::ScheduleErrorClear {
        token,
        after: state.settings().error_display,
    }
}
