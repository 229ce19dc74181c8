use crate::{
    config::Config,
    errors::AppError,
    resolver,
    responder::{self, Action},
};
use anyhow::Context;
use axum::{
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::get,
    Json, Router,
};
use serde_json::json;
use std::{
    path::{Path, PathBuf},
    sync::Arc,
};
use tower_http::{services::ServeDir, trace::TraceLayer};
use tracing::{debug, error, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub cfg: Arc<Config>,
    /// Canonical data root, resolved once at startup.
    pub root: Arc<Path>,
}

impl AppState {
    pub fn new(cfg: Config, root: PathBuf) -> Self {
        Self {
            cfg: Arc::new(cfg),
            root: Arc::from(root),
        }
    }
}

pub async fn serve(cfg: Config, root: PathBuf) -> anyhow::Result<()> {
    let shared = AppState::new(cfg, root);

    let addr: std::net::SocketAddr =
        format!("{}:{}", shared.cfg.server.bind_addr, shared.cfg.server.port)
            .parse()
            .context("parsing bind address")?;
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("binding {addr}"))?;
    info!(
        addr = %addr,
        mount = %shared.cfg.data.mount,
        root = %shared.root.display(),
        "listening"
    );

    let app = build_router(shared);
    axum::serve(listener, app).await?;
    Ok(())
}

pub fn build_router(shared: AppState) -> Router {
    let router = Router::new().route("/healthz", get(health));
    let router = match &shared.cfg.assets {
        Some(assets) => router.fallback_service(ServeDir::new(&assets.dir)),
        None => router.fallback(not_found),
    };
    router
        .layer(middleware::from_fn_with_state(shared.clone(), serve_data_dir))
        .layer(TraceLayer::new_for_http())
        .with_state(shared)
}

async fn health() -> impl IntoResponse {
    (StatusCode::OK, Json(json!({"status":"ok"})))
}

async fn not_found() -> Response {
    AppError::NotFound.into_response()
}

/// Serves JSON files from the data root for any request under the mount.
///
/// Anything outside the mount, and any authorized path that is not a regular
/// file, is handed to the next handler untouched.
async fn serve_data_dir(State(state): State<AppState>, request: Request, next: Next) -> Response {
    let raw_path = request.uri().path().to_string();
    let Some(rest) = strip_mount(&raw_path, &state.cfg.data.mount) else {
        return next.run(request).await;
    };

    let resolution = resolver::resolve(rest, &state.root);
    let action = responder::respond(&resolution).await;

    if state.cfg.logging.log_requests {
        debug!(
            request_id = %uuid::Uuid::new_v4(),
            method = %request.method(),
            raw_path = %raw_path,
            decoded = %resolution.decoded_relative,
            candidate = %resolution.candidate_path.display(),
            action = ?action,
            "data request"
        );
    }

    match action {
        Action::Forbidden => {
            warn!(raw_path = %raw_path, "blocked request outside data root");
            AppError::Forbidden.into_response()
        }
        Action::Stream {
            path,
            content_type,
            cache_control,
        } => match responder::stream_file(path, content_type, cache_control).await {
            Ok(response) => response,
            Err(e) => {
                error!(raw_path = %raw_path, code = e.code(), error = %e, "serving data file failed");
                e.into_response()
            }
        },
        Action::PassThrough => next.run(request).await,
    }
}

/// Strip the mount prefix from a raw request path.
///
/// Matches only on a segment boundary: with mount `/data`, `/data` and
/// `/data/x` match but `/database` does not.
pub fn strip_mount<'a>(path: &'a str, mount: &str) -> Option<&'a str> {
    let rest = path.strip_prefix(mount)?;
    if rest.is_empty() || rest.starts_with('/') {
        Some(rest)
    } else {
        None
    }
}
