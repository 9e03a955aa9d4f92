//! HTTP route handlers for the session API.

use axum::Router;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::Json;
use axum::routing::{get, post};
use forge::core::catalog::{Catalog, catalog};
use forge::core::composer::QuotingHazard;
use forge::core::explain::Explanation;
use forge::core::phase::Phase;
use forge::core::types::{DeploymentConfiguration, PartialConfiguration};
use forge::session::Session;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::state::{AppState, ChangeEvent};

/// Build the API router.
pub fn api_router() -> Router<AppState> {
    Router::new()
        .route("/health", get(health))
        .route("/catalog", get(get_catalog))
        .route("/config", get(get_config).patch(patch_config))
        .route("/reset", post(reset))
        .route("/phase/{phase}", post(apply_phase))
        .route("/tags/{tag}/toggle", post(toggle_tag))
        .route("/skip-tags/{tag}/toggle", post(toggle_skip_tag))
        .route("/limit/{group}/toggle", post(toggle_limit_group))
        .route("/command", get(get_command))
        .route("/explain", get(get_explain))
        .route("/interpret", post(interpret))
}

/// Configuration together with its rendering.
#[derive(Debug, Serialize)]
pub struct ConfigView {
    pub config: DeploymentConfiguration,
    pub command: String,
    pub hazards: Vec<QuotingHazard>,
}

impl ConfigView {
    fn of(session: &Session) -> Self {
        Self {
            config: session.config().clone(),
            command: session.command(),
            hazards: session.hazards(),
        }
    }
}

#[derive(Debug, Serialize)]
pub struct CommandView {
    pub command: String,
    pub hazards: Vec<QuotingHazard>,
}

#[derive(Debug, Deserialize)]
pub struct InterpretRequest {
    pub text: String,
}

#[derive(Debug, Serialize)]
pub struct InterpretResponse {
    /// False when a newer request was issued while this one ran.
    pub applied: bool,
    #[serde(flatten)]
    pub view: ConfigView,
}

async fn health() -> &'static str {
    "ok"
}

async fn get_catalog() -> Json<Catalog> {
    Json(catalog())
}

/// GET /api/config
async fn get_config(State(state): State<AppState>) -> Json<ConfigView> {
    Json(ConfigView::of(&*state.session.read().await))
}

/// Apply `change` under the write lock, broadcast, and return the new view.
async fn mutate(state: &AppState, change: impl FnOnce(&mut Session)) -> Json<ConfigView> {
    let view = {
        let mut session = state.session.write().await;
        change(&mut *session);
        ConfigView::of(&session)
    };
    state.notify(ChangeEvent::ConfigChanged);
    Json(view)
}

/// PATCH /api/config - shallow merge of a partial configuration.
async fn patch_config(
    State(state): State<AppState>,
    Json(patch): Json<PartialConfiguration>,
) -> Json<ConfigView> {
    mutate(&state, |session| session.update(&patch)).await
}

/// POST /api/reset
async fn reset(State(state): State<AppState>) -> Json<ConfigView> {
    mutate(&state, Session::reset).await
}

/// POST /api/phase/{phase}
async fn apply_phase(
    State(state): State<AppState>,
    Path(phase): Path<String>,
) -> Result<Json<ConfigView>, StatusCode> {
    let phase: Phase = phase.parse().map_err(|_| StatusCode::NOT_FOUND)?;
    Ok(mutate(&state, |session| session.apply_phase(phase)).await)
}

/// POST /api/tags/{tag}/toggle
async fn toggle_tag(State(state): State<AppState>, Path(tag): Path<String>) -> Json<ConfigView> {
    mutate(&state, |session| session.toggle_tag(&tag)).await
}

/// POST /api/skip-tags/{tag}/toggle
async fn toggle_skip_tag(
    State(state): State<AppState>,
    Path(tag): Path<String>,
) -> Json<ConfigView> {
    mutate(&state, |session| session.toggle_skip_tag(&tag)).await
}

/// POST /api/limit/{group}/toggle
async fn toggle_limit_group(
    State(state): State<AppState>,
    Path(group): Path<String>,
) -> Json<ConfigView> {
    mutate(&state, |session| session.toggle_limit_group(&group)).await
}

/// GET /api/command
async fn get_command(State(state): State<AppState>) -> Json<CommandView> {
    let session = state.session.read().await;
    Json(CommandView {
        command: session.command(),
        hazards: session.hazards(),
    })
}

/// GET /api/explain
async fn get_explain(State(state): State<AppState>) -> Json<Explanation> {
    Json(state.session.read().await.explain())
}

/// POST /api/interpret - ask the interpreter, merge only if still the latest request.
///
/// The interpreter runs on a blocking thread without holding the session lock.
async fn interpret(
    State(state): State<AppState>,
    Json(request): Json<InterpretRequest>,
) -> Result<Json<InterpretResponse>, (StatusCode, String)> {
    if request.text.trim().is_empty() {
        return Err((StatusCode::BAD_REQUEST, "text must not be empty".to_string()));
    }

    let ticket = state.gate.issue();
    let interpreter = state.current_interpreter().await;
    let text = request.text;
    let outcome = tokio::task::spawn_blocking(move || interpreter.interpret(&text))
        .await
        .map_err(|err| {
            warn!(error = %err, "interpreter task failed");
            (StatusCode::INTERNAL_SERVER_ERROR, "interpreter task failed".to_string())
        })?;

    let patch = match outcome {
        Ok(patch) => patch,
        Err(err) => {
            let message = format!("{err:#}");
            warn!(ticket, error = %message, "interpretation failed, configuration unchanged");
            return Err((StatusCode::BAD_GATEWAY, message));
        }
    };

    let (applied, view) = {
        let mut session = state.session.write().await;
        let applied = state.gate.is_latest(ticket);
        if applied {
            session.update(&patch);
            info!(ticket, fields = ?patch.field_names(), "applied interpreted request");
        } else {
            debug!(ticket, "dropping stale interpretation");
        }
        (applied, ConfigView::of(&session))
    };
    if applied {
        state.notify(ChangeEvent::ConfigChanged);
    }
    Ok(Json(InterpretResponse { applied, view }))
}
