use std::io::{self, BufRead, Write};
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{mpsc, Arc};
use std::thread;
use std::time::Duration;

use anyhow::Context;
use vidqa_core::{update, Msg, SessionState, SessionView};
use vidqa_gateway::ReqwestGateway;
use vidqa_logging::{vidqa_info, vidqa_warn};

use crate::config::{self, AppConfig};
use crate::effects::EffectRunner;
use crate::{logging, render};

const HELP: &str = "\
commands:
  :video <url>   process a YouTube video
  :clear         clear the conversation, keep the video
  :reset         start over
  :forget        delete the video on the service and start over
  :health        check the service
  :help          show this help
  :quit          exit
anything else is asked as a question about the current video";

#[derive(Debug, Clone, PartialEq, Eq)]
enum Command {
    Session(Msg),
    Help,
    Quit,
    Unknown(String),
    Empty,
}

fn parse_command(line: &str) -> Command {
    let trimmed = line.trim();
    if trimmed.is_empty() {
        return Command::Empty;
    }
    let Some(rest) = trimmed.strip_prefix(':') else {
        return Command::Session(Msg::QuestionSubmitted(trimmed.to_string()));
    };
    let (name, arg) = rest
        .split_once(char::is_whitespace)
        .map(|(name, arg)| (name, arg.trim()))
        .unwrap_or((rest, ""));
    match name {
        "video" | "v" => Command::Session(Msg::VideoSubmitted(arg.to_string())),
        "clear" => Command::Session(Msg::ClearClicked),
        "reset" => Command::Session(Msg::ResetClicked),
        "forget" => Command::Session(Msg::ForgetClicked),
        "health" => Command::Session(Msg::HealthCheckRequested),
        "help" | "h" => Command::Help,
        "quit" | "q" | "exit" => Command::Quit,
        other => Command::Unknown(other.to_string()),
    }
}

pub fn run() -> anyhow::Result<()> {
    let (config, config_err) = match config::load() {
        Ok(config) => (config, None),
        Err(err) => (AppConfig::default(), Some(err)),
    };
    logging::initialize(config.log, config.log_level());
    if let Some(err) = config_err {
        vidqa_warn!("Using default configuration: {}", err);
        eprintln!("warning: {err}; using defaults");
    }

    let gateway = ReqwestGateway::new(config.gateway_settings())
        .with_context(|| format!("invalid api_base {:?}", config.api_base))?;
    vidqa_info!("Using service at {}", gateway.base_url());

    let (msg_tx, msg_rx) = mpsc::channel::<Msg>();
    let runner = EffectRunner::new(Arc::new(gateway), msg_tx.clone())
        .context("failed to start gateway runtime")?;

    let quit = Arc::new(AtomicBool::new(false));
    spawn_input_reader(msg_tx, quit.clone());

    let mut stdout = io::stdout();
    writeln!(stdout, "video Q&A against {}\n{HELP}", config.api_base)?;

    let mut state = SessionState::with_settings(config.session_settings());
    let mut shown = SessionView::default();
    while !quit.load(Ordering::Relaxed) {
        let msg = match msg_rx.recv_timeout(Duration::from_millis(100)) {
            Ok(msg) => msg,
            Err(mpsc::RecvTimeoutError::Timeout) => continue,
            Err(mpsc::RecvTimeoutError::Disconnected) => break,
        };

        let (next, effects) = update(state, msg);
        state = next;
        runner.enqueue(effects);

        if state.consume_dirty() {
            let view = state.view();
            for line in render::diff(&shown, &view) {
                writeln!(stdout, "{line}")?;
            }
            stdout.flush()?;
            shown = view;
        }
    }

    vidqa_info!("Session ended");
    Ok(())
}

fn spawn_input_reader(msg_tx: mpsc::Sender<Msg>, quit: Arc<AtomicBool>) {
    thread::spawn(move || {
        let stdin = io::stdin();
        for line in stdin.lock().lines() {
            let Ok(line) = line else { break };
            match parse_command(&line) {
                Command::Session(msg) => {
                    if msg_tx.send(msg).is_err() {
                        break;
                    }
                }
                Command::Help => println!("{HELP}"),
                Command::Unknown(name) => println!("unknown command :{name} (try :help)"),
                Command::Empty => {}
                Command::Quit => break,
            }
        }
        quit.store(true, Ordering::Relaxed);
    });
}
