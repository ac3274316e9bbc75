use std::io;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread::{self, JoinHandle};
use std::time::Duration;

use vidqa_core::{AnswerContent, Effect, EntryHandle, Epoch, IngestSummary, Msg, VideoId};
use vidqa_gateway::{Gateway, GatewayEvent, GatewayHandle, Outcome};
use vidqa_logging::{vidqa_debug, vidqa_info, vidqa_warn};

/// What a gateway request was issued for, echoed back on completion.
#[derive(Debug, Clone, PartialEq, Eq)]
enum RequestTag {
    Ingest { epoch: Epoch, video_id: VideoId },
    Question { epoch: Epoch, handle: EntryHandle },
    Delete { video_id: VideoId },
    Health,
}

/// Executes core effects and turns their completions back into messages.
///
/// Dropping the runner stops its event loop; once every handle is gone the
/// gateway runtime shuts down.
pub struct EffectRunner {
    gateway: GatewayHandle<RequestTag>,
    msg_tx: mpsc::Sender<Msg>,
    stop: Arc<AtomicBool>,
    event_loop: Option<JoinHandle<()>>,
}

impl EffectRunner {
    pub fn new(gateway: Arc<dyn Gateway>, msg_tx: mpsc::Sender<Msg>) -> io::Result<Self> {
        let mut runner = Self {
            gateway: GatewayHandle::new(gateway)?,
            msg_tx,
            stop: Arc::new(AtomicBool::new(false)),
            event_loop: None,
        };
        runner.event_loop = Some(runner.spawn_event_loop());
        Ok(runner)
    }

    pub fn enqueue(&self, effects: Vec<Effect>) {
        for effect in effects {
            match effect {
                Effect::SubmitVideo {
                    epoch,
                    video_id,
                    locator,
                } => {
                    vidqa_info!("SubmitVideo epoch={} video_id={}", epoch, video_id);
                    self.gateway
                        .submit_video(RequestTag::Ingest { epoch, video_id }, locator);
                }
                Effect::SubmitQuestion {
                    epoch,
                    handle,
                    locator,
                    question,
                } => {
                    vidqa_info!(
                        "SubmitQuestion epoch={} handle={} question_len={}",
                        epoch,
                        handle,
                        question.len()
                    );
                    self.gateway.submit_question(
                        RequestTag::Question { epoch, handle },
                        locator,
                        question,
                    );
                }
                Effect::CancelStale { epoch } => {
                    vidqa_debug!("CancelStale before epoch={}", epoch);
                    self.gateway.cancel_outstanding();
                }
                Effect::DeleteVideo { video_id } => {
                    vidqa_info!("DeleteVideo video_id={}", video_id);
                    let raw = video_id.as_str().to_string();
                    self.gateway.delete_video(RequestTag::Delete { video_id }, raw);
                }
                Effect::CheckHealth => self.gateway.check_health(RequestTag::Health),
                Effect::ScheduleErrorClear { token, after } => {
                    self.schedule(after, Msg::ErrorExpired(token));
                }
            }
        }
    }

    fn schedule(&self, after: Duration, msg: Msg) {
        let msg_tx = self.msg_tx.clone();
        thread::spawn(move || {
            thread::sleep(after);
            let _ = msg_tx.send(msg);
        });
    }

    fn spawn_event_loop(&self) -> JoinHandle<()> {
        let gateway = self.gateway.clone();
        let msg_tx = self.msg_tx.clone();
        let stop = self.stop.clone();
        thread::spawn(move || {
            while !stop.load(Ordering::Relaxed) {
                let Some(event) = gateway.recv_timeout(Duration::from_millis(100)) else {
                    continue;
                };
                if msg_tx.send(to_msg(event)).is_err() {
                    vidqa_debug!("Session loop gone; stopping gateway event loop");
                    break;
                }
            }
            vidqa_debug!("Gateway event loop stopped");
        })
    }
}

impl Drop for EffectRunner {
    fn drop(&mut self) {
        self.stop.store(true, Ordering::Relaxed);
        if let Some(handle) = self.event_loop.take() {
            if handle.join().is_err() {
                vidqa_warn!("Gateway event loop panicked");
            }
        }
    }
}

fn to_msg(event: GatewayEvent<RequestTag>) -> Msg {
    match (event.tag, event.outcome) {
        (RequestTag::Ingest { epoch, video_id }, Outcome::Ingested(result)) => {
            Msg::IngestFinished {
                epoch,
                video_id,
                result: result
                    .map(|ack| IngestSummary {
                        message: ack.message,
                        video_id: ack.video_id,
                        chunks_created: ack.chunks_created,
                        transcript_length: ack.transcript_length,
                    })
                    .map_err(|failure| {
                        vidqa_warn!("Ingestion epoch={} failed: {}", epoch, failure.kind);
                        failure.message
                    }),
            }
        }
        (RequestTag::Question { epoch, handle }, Outcome::Answered(result)) => {
            Msg::AnswerReceived {
                epoch,
                handle,
                result: result
                    .map(|answer| AnswerContent {
                        text: answer.text,
                        sources: answer.sources,
                    })
                    .map_err(|failure| {
                        vidqa_warn!("Question handle={} failed: {}", handle, failure.kind);
                        failure.message
                    }),
            }
        }
        (RequestTag::Delete { video_id }, Outcome::Deleted(result)) => Msg::VideoForgotten {
            video_id,
            result: result.map_err(|failure| failure.message),
        },
        (RequestTag::Health, Outcome::Health(result)) => Msg::HealthReported(
            result
                .map(|health| health.status)
                .map_err(|failure| failure.message),
        ),
        (tag, outcome) => {
            vidqa_warn!("Mismatched gateway completion {:?}: {:?}", tag, outcome);
            Msg::NoOp
        }
    }
}
