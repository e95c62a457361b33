//! Turns view-model changes into terminal lines.
//!
//! The terminal is append-only, so rendering compares the newly built view
//! against the one last shown and prints only what changed.

use chrono::{Local, TimeZone};
use tutor_core::{AppViewModel, BackendStatus, MessageView, NoticeKind, Sender, Timestamp};
use tutor_engine::ConnectionInfo;

pub fn render(shown: &AppViewModel, view: &AppViewModel) -> Vec<String> {
    let mut lines = Vec::new();

    if view.messages.starts_with(&shown.messages) {
        lines.extend(view.messages[shown.messages.len()..].iter().map(message_line));
    } else {
        lines.push(String::new());
        lines.push("----- conversation -----".to_string());
        lines.extend(view.messages.iter().map(message_line));
    }

    if view.is_typing && !shown.is_typing {
        lines.push("Tutor is thinking...".to_string());
    }

    if view.notice != shown.notice {
        if let Some(notice) = &view.notice {
            let tag = match notice.kind {
                NoticeKind::Info => "info",
                NoticeKind::Error => "error",
            };
            lines.push(format!("[{tag}] {}", notice.text));
        }
    }

    if view.backend != shown.backend && view.backend != BackendStatus::Unknown {
        lines.push(format!("Backend: {}", backend_label(view.backend)));
    }

    lines
}

pub fn render_history(view: &AppViewModel) -> Vec<String> {
    if view.history.is_empty() {
        return vec!["No saved conversations.".to_string()];
    }
    view.history
        .iter()
        .enumerate()
        .map(|(index, row)| {
            let marker = if row.is_current { " *" } else { "" };
            format!(
                "{:>2}. {} ({}){}",
                index + 1,
                row.title,
                format_date(row.timestamp),
                marker
            )
        })
        .collect()
}

pub fn render_status(view: &AppViewModel, info: &ConnectionInfo) -> Vec<String> {
    let mut lines = vec![
        format!("Backend: {}", backend_label(view.backend)),
        format!(
            "Endpoint: {}",
            info.endpoint.as_deref().unwrap_or("not resolved")
        ),
    ];
    if let Some(origin) = &info.origin {
        lines.push(format!("Client origin: {origin}"));
    }
    if !info.attempted.is_empty() {
        lines.push(format!("Tried: {}", info.attempted.join(", ")));
    }
    lines
}

fn backend_label(status: BackendStatus) -> &'static str {
    match status {
        BackendStatus::Unknown => "checking...",
        BackendStatus::Online => "online",
        BackendStatus::Limited => "online (AI answers not configured)",
        BackendStatus::Offline => "unreachable",
    }
}

fn message_line(message: &MessageView) -> String {
    let who = match message.sender {
        Sender::User => "You",
        Sender::Ai => "Tutor",
    };
    format!("[{}] {}: {}", format_time(message.timestamp), who, message.text)
}

fn format_time(timestamp: Timestamp) -> String {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|at| at.format("%H:%M").to_string())
        .unwrap_or_default()
}

fn format_date(timestamp: Timestamp) -> String {
    Local
        .timestamp_millis_opt(timestamp)
        .single()
        .map(|at| at.format("%Y-%m-%d %H:%M").to_string())
        .unwrap_or_default()
}
