//! Axum handlers for the rpc server
//!
//! Dispatches POSTed payloads to the method bound at the request route and
//! serves the health and discovery documents.

use axum::{
    body::Bytes,
    extract::State,
    http::{header, StatusCode, Uri},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;

use crate::errors::AppError;
use crate::registry::{HandlerRegistry, Route};
use crate::service::MethodType;
use crate::AppState;

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct DiscoveryResponse {
    pub name: &'static str,
    pub version: &'static str,
    pub services: Vec<String>,
    pub methods: Vec<MethodInfo>,
}

#[derive(Debug, Serialize)]
pub struct MethodInfo {
    pub path: String,
    pub method: String,
    #[serde(rename = "type")]
    pub method_type: MethodType,
    pub decorators: Vec<String>,
}

pub async fn health() -> Json<HealthResponse> {
    Json(HealthResponse { status: "ok" })
}

pub async fn discovery(State(state): State<AppState>) -> Json<DiscoveryResponse> {
    Json(describe(&state.registry))
}

pub fn describe(registry: &HandlerRegistry) -> DiscoveryResponse {
    let services = registry
        .services()
        .iter()
        .map(|service| service.name().to_string())
        .collect();

    let methods = registry
        .methods()
        .iter()
        .map(|(path, definition)| MethodInfo {
            path: path.clone(),
            method: definition.descriptor().full_name(),
            method_type: definition.descriptor().method_type(),
            decorators: registry
                .decorators_for(definition)
                .iter()
                .map(|decorator| decorator.decorator().name().to_string())
                .collect(),
        })
        .collect();

    DiscoveryResponse {
        name: env!("CARGO_PKG_NAME"),
        version: env!("CARGO_PKG_VERSION"),
        services,
        methods,
    }
}

pub async fn dispatch(
    State(state): State<AppState>,
    uri: Uri,
    body: Bytes,
) -> Result<Response, AppError> {
    let route = Route::exact(uri.path());
    let method = state
        .registry
        .lookup_method_by_route(&route)
        .ok_or_else(|| {
            AppError::not_found(
                "method_not_found",
                format!("no method bound to {}", route.path()),
            )
        })?;

    let response = method.call(body).await?;
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, "application/octet-stream")],
        response,
    )
        .into_response())
}
