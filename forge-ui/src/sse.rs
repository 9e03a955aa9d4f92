//! Server-Sent Events stream and settings file watcher.

use std::convert::Infallible;
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use axum::extract::State;
use axum::response::sse::{Event, Sse};
use forge::agents::interpreter::AgentInterpreter;
use forge::io::settings::load_settings;
use futures::stream::Stream;
use notify::{Event as NotifyEvent, EventKind, PollWatcher, RecursiveMode, Watcher};
use serde::Serialize;
use tokio::sync::broadcast;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

#[derive(Serialize)]
struct SsePayload {
    #[serde(rename = "type")]
    event_type: &'static str,
}

impl From<&ChangeEvent> for SsePayload {
    fn from(event: &ChangeEvent) -> Self {
        let event_type = match event {
            ChangeEvent::ConfigChanged => "config_changed",
            ChangeEvent::SettingsChanged => "settings_changed",
        };
        SsePayload { event_type }
    }
}

/// SSE endpoint handler.
pub async fn events_handler(
    State(state): State<AppState>,
) -> Sse<impl Stream<Item = Result<Event, Infallible>>> {
    let mut rx = state.event_tx.subscribe();

    let stream = async_stream::stream! {
        yield Ok(Event::default().event("connected").data("{}"));

        loop {
            match rx.recv().await {
                Ok(change_event) => {
                    let payload = SsePayload::from(&change_event);
                    if let Ok(json) = serde_json::to_string(&payload) {
                        yield Ok(Event::default().event("change").data(json));
                    }
                }
                Err(broadcast::error::RecvError::Lagged(n)) => {
                    warn!(skipped = n, "SSE client lagged, some events dropped");
                }
                Err(broadcast::error::RecvError::Closed) => {
                    break;
                }
            }
        }
    };

    Sse::new(stream).keep_alive(
        axum::response::sse::KeepAlive::new()
            .interval(Duration::from_secs(15))
            .text("ping"),
    )
}

/// Start the settings watcher in a background task.
pub fn start_settings_watcher(state: AppState) {
    tokio::spawn(async move {
        if let Err(e) = run_settings_watcher(state).await {
            warn!(error = %e, "settings watcher failed");
        }
    });
}

async fn run_settings_watcher(state: AppState) -> anyhow::Result<()> {
    let (tx, mut rx) = mpsc::channel::<NotifyEvent>(100);

    let mut watcher = PollWatcher::new(
        move |res: Result<NotifyEvent, notify::Error>| {
            if let Ok(event) = res {
                let _ = tx.try_send(event);
            }
        },
        notify::Config::default().with_poll_interval(Duration::from_millis(500)),
    )?;

    // Watch the directory so the file may be created or replaced later.
    let Some(dir) = state.settings_path.parent().filter(|dir| dir.is_dir()) else {
        info!(path = %state.settings_path.display(), "settings directory missing, not watching");
        return Ok(());
    };
    watcher.watch(dir, RecursiveMode::NonRecursive)?;
    info!(path = %state.settings_path.display(), "watching settings file");

    let mut pending = false;
    let mut flush_tick = tokio::time::interval(Duration::from_millis(200));
    flush_tick.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

    loop {
        tokio::select! {
            Some(event) = rx.recv() => {
                pending |= touches_settings(&state.settings_path, &event);
            }
            _ = flush_tick.tick() => {
                if !pending {
                    continue;
                }
                pending = false;
                if let Err(e) = reload_settings(&state).await {
                    warn!(error = %format!("{e:#}"), "settings reload failed, keeping previous interpreter");
                }
            }
        }
    }
}

fn touches_settings(settings_path: &Path, event: &NotifyEvent) -> bool {
    matches!(event.kind, EventKind::Create(_) | EventKind::Modify(_))
        && event.paths.iter().any(|path| path == settings_path)
}

/// Reload settings from disk, rebuild the interpreter and broadcast the change.
pub async fn reload_settings(state: &AppState) -> anyhow::Result<()> {
    let settings = load_settings(&state.settings_path)?;
    let interpreter = AgentInterpreter::from_settings(&settings.interpreter)?;
    state.replace_interpreter(Arc::new(interpreter)).await;
    debug!("broadcasting settings change");
    state.notify(ChangeEvent::SettingsChanged);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use forge::test_support::ScriptedInterpreter;
    use std::fs;
    use std::path::PathBuf;

    fn event(kind: EventKind, path: PathBuf) -> NotifyEvent {
        NotifyEvent {
            kind,
            paths: vec![path],
            attrs: Default::default(),
        }
    }

    #[test]
    fn only_settings_file_writes_count() {
        let settings = PathBuf::from("/project/.forge/config.toml");
        let modify = EventKind::Modify(notify::event::ModifyKind::Any);

        assert!(touches_settings(&settings, &event(modify, settings.clone())));
        assert!(touches_settings(
            &settings,
            &event(
                EventKind::Create(notify::event::CreateKind::File),
                settings.clone()
            )
        ));
        assert!(!touches_settings(
            &settings,
            &event(modify, PathBuf::from("/project/.forge/config.toml.tmp"))
        ));
        assert!(!touches_settings(
            &settings,
            &event(
                EventKind::Remove(notify::event::RemoveKind::File),
                settings.clone()
            )
        ));
    }

    #[test]
    fn payload_uses_snake_case_type() {
        let json = serde_json::to_string(&SsePayload::from(&ChangeEvent::SettingsChanged))
            .expect("serialize");
        assert_eq!(json, r#"{"type":"settings_changed"}"#);
    }

    #[tokio::test]
    async fn reload_broadcasts_on_valid_settings() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[interpreter]\ntimeout_secs = 5\n").expect("write");
        let state = AppState::new(path, Arc::new(ScriptedInterpreter::new()));
        let mut rx = state.event_tx.subscribe();

        reload_settings(&state).await.expect("reload");

        assert_eq!(rx.try_recv().expect("event"), ChangeEvent::SettingsChanged);
    }

    #[tokio::test]
    async fn invalid_settings_keep_previous_interpreter() {
        let temp = tempfile::tempdir().expect("tempdir");
        let path = temp.path().join("config.toml");
        fs::write(&path, "[interpreter]\ncommand = []\n").expect("write");
        let state = AppState::new(path, Arc::new(ScriptedInterpreter::new()));
        let before = state.current_interpreter().await;
        let mut rx = state.event_tx.subscribe();

        assert!(reload_settings(&state).await.is_err());

        assert!(Arc::ptr_eq(&before, &state.current_interpreter().await));
        assert!(rx.try_recv().is_err());
    }
}
