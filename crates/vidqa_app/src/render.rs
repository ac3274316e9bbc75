use std::collections::BTreeMap;

use vidqa_core::{
    AnswerState, EntryHandle, EntryView, ProcessingStatus, ServiceHealth, SessionView,
};

const SOURCE_PREVIEW_CHARS: usize = 120;

/// Lines describing what changed between two consecutive views.
///
/// The terminal is append-only, so only transitions are printed.
pub fn diff(prev: &SessionView, next: &SessionView) -> Vec<String> {
    let mut lines = Vec::new();

    if prev.status != next.status || prev.raw_locator != next.raw_locator {
        lines.push(status_line(next));
    }

    let before: BTreeMap<EntryHandle, &EntryView> =
        prev.entries.iter().map(|e| (e.handle, e)).collect();
    let after: BTreeMap<EntryHandle, &EntryView> =
        next.entries.iter().map(|e| (e.handle, e)).collect();

    for entry in &next.entries {
        let previous = before.get(&entry.handle).map(|e| &e.answer);
        match (previous, &entry.answer) {
            (None, AnswerState::Pending) => {
                lines.push(format!("Q{}> {} (waiting...)", entry.handle, entry.question));
            }
            (None | Some(AnswerState::Pending), AnswerState::Answered(content)) => {
                if previous.is_none() {
                    lines.push(format!("Q{}> {}", entry.handle, entry.question));
                }
                lines.push(format!("A{}> {}", entry.handle, content.text));
                for source in &content.sources {
                    lines.push(format!("     | {}", preview(source)));
                }
            }
            _ => {}
        }
    }

    let same_video = prev.status == next.status && prev.raw_locator == next.raw_locator;
    let new_error = next.error.is_some() && prev.error != next.error;
    let removed: Vec<_> = before
        .iter()
        .filter(|(handle, _)| !after.contains_key(*handle))
        .collect();
    if same_video && !removed.is_empty() {
        if new_error {
            for (handle, entry) in removed {
                lines.push(format!("Q{}> {} (withdrawn)", handle, entry.question));
            }
        } else {
            lines.push("-- conversation cleared --".to_string());
        }
    }

    if let (true, Some(error)) = (new_error, &next.error) {
        lines.push(format!("! {}", error.message));
    }

    if prev.service_health != next.service_health {
        match &next.service_health {
            Some(ServiceHealth::Healthy(status)) => lines.push(format!("service: {status}")),
            Some(ServiceHealth::Unreachable(message)) => {
                lines.push(format!("service unreachable: {message}"))
            }
            None => {}
        }
    }

    lines
}

fn status_line(view: &SessionView) -> String {
    match view.status {
        ProcessingStatus::Idle | ProcessingStatus::Failed => {
            "[idle] submit a video with :video <url>".to_string()
        }
        ProcessingStatus::Processing => format!("[processing] {}", view.raw_locator),
        ProcessingStatus::Ready => {
            let id = view
                .video_id
                .as_ref()
                .map(|id| id.to_string())
                .unwrap_or_default();
            match view.summary.as_ref().and_then(|s| s.chunks_created) {
                Some(chunks) => format!("[ready] {id} ({chunks} chunks), ask away"),
                None => format!("[ready] {id}, ask away"),
            }
        }
    }
}

fn preview(text: &str) -> String {
    let flat = text.split_whitespace().collect::<Vec<_>>().join(" ");
    if flat.chars().count() <= SOURCE_PREVIEW_CHARS {
        return flat;
    }
    let mut cut: String = flat.chars().take(SOURCE_PREVIEW_CHARS).collect();
    cut.push_str("...");
    cut
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use pretty_assertions::assert_eq;
    use vidqa_core::{AnswerContent, ErrorView, IngestSummary, VideoId};

    use super::*;

    fn ready_view() -> SessionView {
        SessionView {
            status: ProcessingStatus::Ready,
            raw_locator: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            video_id: VideoId::parse("dQw4w9WgXcQ"),
            summary: Some(IngestSummary {
                chunks_created: Some(5),
                ..IngestSummary::default()
            }),
            ..SessionView::default()
        }
    }

    fn entry(handle: EntryHandle, question: &str, answer: AnswerState) -> EntryView {
        EntryView {
            handle,
            question: question.to_string(),
            answer,
        }
    }

    #[test]
    fn status_change_is_announced() {
        let lines = diff(&SessionView::default(), &ready_view());
        assert_eq!(lines, vec!["[ready] dQw4w9WgXcQ (5 chunks), ask away".to_string()]);
    }

    #[test]
    fn pending_then_answered_prints_question_then_answer() {
        let base = ready_view();
        let pending = SessionView {
            entries: vec![entry(1, "Who?", AnswerState::Pending)],
            ..base.clone()
        };
        assert_eq!(
            diff(&base, &pending),
            vec!["Q1> Who? (waiting...)".to_string()]
        );

        let answered = SessionView {
            entries: vec![entry(
                1,
                "Who?",
                AnswerState::Answered(AnswerContent {
                    text: "Rick.".to_string(),
                    sources: vec!["never   gonna\ngive".to_string()],
                }),
            )],
            ..base
        };
        assert_eq!(
            diff(&pending, &answered),
            vec!["A1> Rick.".to_string(), "     | never gonna give".to_string()]
        );
    }

    #[test]
    fn withdrawn_question_and_error_are_reported() {
        let base = ready_view();
        let two = SessionView {
            entries: vec![
                entry(1, "A?", AnswerState::Pending),
                entry(2, "B?", AnswerState::Pending),
            ],
            ..base.clone()
        };
        let one = SessionView {
            entries: vec![entry(1, "A?", AnswerState::Pending)],
            error: Some(ErrorView {
                token: 1,
                message: "Internal error".to_string(),
                display_for: Duration::from_secs(5),
            }),
            ..base
        };
        assert_eq!(
            diff(&two, &one),
            vec!["Q2> B? (withdrawn)".to_string(), "! Internal error".to_string()]
        );
    }

    #[test]
    fn failed_ingestion_returns_to_idle_line_with_message() {
        let processing = SessionView {
            status: ProcessingStatus::Processing,
            raw_locator: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            ..SessionView::default()
        };
        let failed = SessionView {
            status: ProcessingStatus::Idle,
            error: Some(ErrorView {
                token: 1,
                message: "Transcript is empty".to_string(),
                display_for: Duration::from_secs(5),
            }),
            ..processing.clone()
        };
        assert_eq!(
            diff(&processing, &failed),
            vec![
                "[idle] submit a video with :video <url>".to_string(),
                "! Transcript is empty".to_string(),
            ]
        );
    }

    #[test]
    fn long_sources_are_truncated() {
        let long = "x".repeat(SOURCE_PREVIEW_CHARS + 10);
        let shown = preview(&long);
        assert!(shown.ends_with("..."));
        assert_eq!(shown.chars().count(), SOURCE_PREVIEW_CHARS + 3);
    }
}
