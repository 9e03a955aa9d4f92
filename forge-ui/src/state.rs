//! Shared application state for the session server.

use std::path::PathBuf;
use std::sync::Arc;

use forge::agents::interpreter::Interpreter;
use forge::session::{RequestGate, Session};
use tokio::sync::{RwLock, broadcast};

/// Events broadcast to SSE clients.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ChangeEvent {
    /// The session configuration was replaced.
    ConfigChanged,
    /// The settings file changed and the interpreter was rebuilt.
    SettingsChanged,
}

pub type SharedInterpreter = Arc<dyn Interpreter + Send + Sync>;

/// Shared state accessible from all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// The single in-memory configuration of this server.
    pub session: Arc<RwLock<Session>>,
    /// Swapped wholesale when settings are reloaded.
    pub interpreter: Arc<RwLock<SharedInterpreter>>,
    /// Orders interpretation requests; only the newest may apply.
    pub gate: Arc<RequestGate>,
    /// Settings file watched for interpreter changes.
    pub settings_path: PathBuf,
    /// Broadcast sender for change events.
    pub event_tx: Arc<broadcast::Sender<ChangeEvent>>,
}

impl AppState {
    pub fn new(settings_path: PathBuf, interpreter: SharedInterpreter) -> Self {
        let (event_tx, _) = broadcast::channel(64);
        Self {
            session: Arc::new(RwLock::new(Session::new())),
            interpreter: Arc::new(RwLock::new(interpreter)),
            gate: Arc::new(RequestGate::new()),
            settings_path,
            event_tx: Arc::new(event_tx),
        }
    }

    pub async fn current_interpreter(&self) -> SharedInterpreter {
        Arc::clone(&*self.interpreter.read().await)
    }

    pub async fn replace_interpreter(&self, interpreter: SharedInterpreter) {
        *self.interpreter.write().await = interpreter;
    }

    /// Broadcast an event; having no subscriber is fine.
    pub fn notify(&self, event: ChangeEvent) {
        let _ = self.event_tx.send(event);
    }
}
