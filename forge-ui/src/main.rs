//! Forge UI server - keeps one deployment configuration in memory and serves
//! the form, the composed command and the interpreter over HTTP.

mod routes;
mod sse;
mod state;

use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Context;
use axum::Router;
use axum::routing::get;
use clap::Parser;
use forge::agents::interpreter::AgentInterpreter;
use forge::io::init::ForgePaths;
use forge::io::settings::load_settings;
use tower_http::cors::{Any, CorsLayer};
use tower_http::services::ServeDir;
use tracing::info;

use crate::state::AppState;

#[derive(Parser)]
#[command(name = "forge-ui")]
#[command(about = "Session server for composing MOGEND deployment commands")]
struct Args {
    /// Address to bind the server to (overrides `server.bind`)
    #[arg(long)]
    bind: Option<String>,

    /// Port to listen on (overrides `server.port`)
    #[arg(long)]
    port: Option<u16>,

    /// Project directory (contains .forge/)
    #[arg(long, default_value = ".")]
    project_dir: PathBuf,

    /// Settings file (defaults to .forge/config.toml in the project directory)
    #[arg(long)]
    settings: Option<PathBuf>,

    /// Directory containing UI static files (defaults to ./ui/dist in the project directory)
    #[arg(long)]
    ui_dir: Option<PathBuf>,
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    tracing_subscriber::fmt()
        .with_env_filter(
            tracing_subscriber::EnvFilter::from_default_env()
                .add_directive("forge_ui=info".parse()?),
        )
        .init();

    let args = Args::parse();

    let project_dir = args.project_dir.canonicalize().unwrap_or(args.project_dir);
    let settings_path = args
        .settings
        .unwrap_or_else(|| ForgePaths::new(&project_dir).settings_path);
    info!(project_dir = %project_dir.display(), settings = %settings_path.display(), "starting forge-ui");

    let settings = load_settings(&settings_path)?;
    let interpreter = AgentInterpreter::from_settings(&settings.interpreter)
        .context("build interpreter from settings")?;
    let state = AppState::new(settings_path, Arc::new(interpreter));

    sse::start_settings_watcher(state.clone());

    let cors = CorsLayer::new()
        .allow_origin(Any)
        .allow_methods(Any)
        .allow_headers(Any);

    let mut app = Router::new()
        .nest("/api", routes::api_router())
        .route("/events", get(sse::events_handler))
        .layer(cors)
        .with_state(state);

    let ui_dir = args
        .ui_dir
        .unwrap_or_else(|| project_dir.join("ui").join("dist"));
    if ui_dir.exists() {
        info!(ui_dir = %ui_dir.display(), "serving static UI files");
        app = app.fallback_service(ServeDir::new(ui_dir).append_index_html_on_directories(true));
    } else {
        info!(ui_dir = %ui_dir.display(), "UI directory not found, API-only mode");
    }

    let bind = args.bind.unwrap_or(settings.server.bind);
    let port = args.port.unwrap_or(settings.server.port);
    let addr: SocketAddr = format!("{bind}:{port}")
        .parse()
        .with_context(|| format!("parse listen address {bind}:{port}"))?;
    info!(addr = %addr, "listening");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
