use std::time::Instant;

use axum::{
    extract::{Request, State},
    http::Method,
    middleware::Next,
    response::Response,
};
use tracing::{info, warn};
use tracing_subscriber::{fmt, EnvFilter};

use crate::registry::{HandlerRegistry, Route};
use crate::AppState;

pub fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    fmt()
        .with_env_filter(filter)
        .with_target(false)
        .compact()
        .init();
}

/// Full name of the rpc method a POST to `path` dispatches to.
pub fn resolved_method(registry: &HandlerRegistry, method: &Method, path: &str) -> Option<String> {
    if *method != Method::POST {
        return None;
    }

    registry
        .lookup_method_by_route(&Route::exact(path))
        .map(|definition| definition.descriptor().full_name())
}

pub async fn request_logging_middleware(
    State(state): State<AppState>,
    request: Request,
    next: Next,
) -> Response {
    let method = request.method().clone();
    let path = request.uri().path().to_string();
    let rpc_method = resolved_method(&state.registry, &method, &path);
    let started_at = Instant::now();

    let response = next.run(request).await;
    let status = response.status();
    let elapsed_ms = started_at.elapsed().as_millis();

    info!(
        method = %method,
        path = %path,
        rpc_method = rpc_method.as_deref().unwrap_or("-"),
        status = status.as_u16(),
        duration_ms = elapsed_ms,
        "request summary"
    );

    if method == Method::POST && rpc_method.is_none() {
        warn!(path = %path, "no rpc method bound to route");
    }

    response
}
