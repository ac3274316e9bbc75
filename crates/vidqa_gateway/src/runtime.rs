use std::io;
use std::sync::{mpsc, Arc, Mutex};
use std::thread;
use std::time::Duration;

use tokio_util::sync::CancellationToken;
use vidqa_logging::{vidqa_debug, vidqa_error, vidqa_trace};

use crate::{FailureKind, Gateway, GatewayEvent, GatewayFailure, Outcome};

enum Command<T> {
    SubmitVideo { tag: T, locator: String },
    SubmitQuestion { tag: T, locator: String, question: String },
    DeleteVideo { tag: T, video_id: String },
    CheckHealth { tag: T },
    /// Abort every video and question request issued so far.
    CancelOutstanding,
}

impl<T> Command<T> {
    fn name(&self) -> &'static str {
        match self {
            Command::SubmitVideo { .. } => "process-video",
            Command::SubmitQuestion { .. } => "ask",
            Command::DeleteVideo { .. } => "delete-video",
            Command::CheckHealth { .. } => "health",
            Command::CancelOutstanding => "cancel",
        }
    }
}

/// Runs gateway calls on a background tokio runtime.
///
/// Commands are fire-and-forget; each completion comes back as a
/// [`GatewayEvent`] carrying the tag it was submitted with. Requests run
/// concurrently and complete in whatever order the service answers.
pub struct GatewayHandle<T> {
    cmd_tx: mpsc::Sender<Command<T>>,
    event_rx: Arc<Mutex<mpsc::Receiver<GatewayEvent<T>>>>,
}

impl<T> Clone for GatewayHandle<T> {
    fn clone(&self) -> Self {
        Self {
            cmd_tx: self.cmd_tx.clone(),
            event_rx: self.event_rx.clone(),
        }
    }
}

impl<T: Send + 'static> GatewayHandle<T> {
    pub fn new(gateway: Arc<dyn Gateway>) -> io::Result<Self> {
        let runtime = tokio::runtime::Builder::new_multi_thread()
            .enable_all()
            .thread_name("vidqa-gateway")
            .build()?;
        let (cmd_tx, cmd_rx) = mpsc::channel::<Command<T>>();
        let (event_tx, event_rx) = mpsc::channel();

        thread::spawn(move || {
            let mut cancel = CancellationToken::new();
            while let Ok(command) = cmd_rx.recv() {
                if let Command::CancelOutstanding = command {
                    vidqa_debug!("Cancelling outstanding requests");
                    cancel.cancel();
                    cancel = CancellationToken::new();
                    continue;
                }
                let name = command.name();
                vidqa_trace!("Dispatching {} request", name);
                let gateway = gateway.clone();
                let event_tx = event_tx.clone();
                let cancel = cancel.child_token();
                runtime.spawn(async move {
                    let event = handle_command(gateway.as_ref(), command, cancel).await;
                    if let Some(event) = event {
                        vidqa_trace!("Settled {} request", name);
                        let _ = event_tx.send(event);
                    }
                });
            }
            vidqa_debug!("Gateway command channel closed");
            runtime.shutdown_timeout(Duration::from_secs(1));
        });

        Ok(Self {
            cmd_tx,
            event_rx: Arc::new(Mutex::new(event_rx)),
        })
    }

    pub fn submit_video(&self, tag: T, locator: impl Into<String>) {
        self.send(Command::SubmitVideo {
            tag,
            locator: locator.into(),
        });
    }

    pub fn submit_question(&self, tag: T, locator: impl Into<String>, question: impl Into<String>) {
        self.send(Command::SubmitQuestion {
            tag,
            locator: locator.into(),
            question: question.into(),
        });
    }

    pub fn delete_video(&self, tag: T, video_id: impl Into<String>) {
        self.send(Command::DeleteVideo {
            tag,
            video_id: video_id.into(),
        });
    }

    pub fn check_health(&self, tag: T) {
        self.send(Command::CheckHealth { tag });
    }

    /// In-flight video and question requests settle as `FailureKind::Cancelled`.
    pub fn cancel_outstanding(&self) {
        self.send(Command::CancelOutstanding);
    }

    pub fn try_recv(&self) -> Option<GatewayEvent<T>> {
        self.event_rx.lock().ok()?.try_recv().ok()
    }

    /// Wait up to `timeout` for the next completion.
    pub fn recv_timeout(&self, timeout: Duration) -> Option<GatewayEvent<T>> {
        self.event_rx.lock().ok()?.recv_timeout(timeout).ok()
    }

    fn send(&self, command: Command<T>) {
        if self.cmd_tx.send(command).is_err() {
            vidqa_error!("Gateway runtime is gone; dropping command");
        }
    }
}

async fn handle_command<T>(
    gateway: &dyn Gateway,
    command: Command<T>,
    cancel: CancellationToken,
) -> Option<GatewayEvent<T>> {
    let cancelled = || GatewayFailure::new(FailureKind::Cancelled, "request cancelled");
    let event = match command {
        Command::SubmitVideo { tag, locator } => {
            let result = tokio::select! {
                result = gateway.submit_video(&locator) => result,
                _ = cancel.cancelled() => Err(cancelled()),
            };
            GatewayEvent {
                tag,
                outcome: Outcome::Ingested(result),
            }
        }
        Command::SubmitQuestion {
            tag,
            locator,
            question,
        } => {
            let result = tokio::select! {
                result = gateway.submit_question(&locator, &question) => result,
                _ = cancel.cancelled() => Err(cancelled()),
            };
            GatewayEvent {
                tag,
                outcome: Outcome::Answered(result),
            }
        }
        Command::DeleteVideo { tag, video_id } => GatewayEvent {
            tag,
            outcome: Outcome::Deleted(gateway.delete_video(&video_id).await),
        },
        Command::CheckHealth { tag } => GatewayEvent {
            tag,
            outcome: Outcome::Health(gateway.health().await),
        },
        Command::CancelOutstanding => return None,
    };
    Some(event)
}
