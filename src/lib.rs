use std::sync::Arc;

use axum::{
    middleware,
    routing::{get, post},
    Router,
};

pub mod config;
pub mod decorator;
pub mod errors;
pub mod health;
pub mod http;
pub mod logging;
pub mod registry;
pub mod service;

use registry::HandlerRegistry;

#[derive(Clone)]
pub struct AppState {
    pub registry: Arc<HandlerRegistry>,
}

impl AppState {
    pub fn new(registry: HandlerRegistry) -> Self {
        Self {
            registry: Arc::new(registry),
        }
    }
}

pub fn build_app(state: AppState) -> Router {
    Router::new()
        .route(
            "/health",
            get(http::handlers::health).post(http::handlers::dispatch),
        )
        .route(
            "/.well-known/rpc",
            get(http::handlers::discovery).post(http::handlers::dispatch),
        )
        .route("/{*path}", post(http::handlers::dispatch))
        .layer(middleware::from_fn_with_state(
            state.clone(),
            logging::request_logging_middleware,
        ))
        .with_state(state)
}

#[cfg(test)]
mod tests {
    use axum::{
        body::{Body, Bytes},
        http::{header, Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use serde_json::Value;
    use tower::ServiceExt;

    use crate::decorator::{Decorator, ImplMethod, ImplType};
    use crate::errors::AppError;
    use crate::service::{handler_fn, MethodType, ServiceDefinition};

    use super::*;

    #[derive(Debug)]
    struct Named(&'static str);

    impl Decorator for Named {
        fn name(&self) -> &str {
            self.0
        }
    }

    fn greeter() -> ServiceDefinition {
        ServiceDefinition::builder("helloworld.Greeter")
            .method(
                "SayHello",
                MethodType::Unary,
                handler_fn(|request: Bytes| async move {
                    let name = String::from_utf8(request.to_vec())
                        .map_err(|_| AppError::bad_request("invalid_name", "name must be utf-8"))?;
                    Ok::<_, AppError>(Bytes::from(format!("Hello, {name}!")))
                }),
            )
            .method(
                "SayGoodbye",
                MethodType::Unary,
                handler_fn(|_request: Bytes| async {
                    Err::<Bytes, _>(AppError::internal("goodbye is broken"))
                }),
            )
            .build()
    }

    fn app() -> Router {
        let impl_type = ImplType::new("GreeterImpl").method(
            ImplMethod::new("sayHello")
                .decorator(Arc::new(Named("auth")))
                .decorator(Arc::new(Named("tracing"))),
        );

        let mut builder = HandlerRegistry::builder();
        builder
            .add_service(greeter(), Some(impl_type))
            .add_service_at("/health", health::service(), None, None);
        let registry = builder.build().expect("registry builds");
        build_app(AppState::new(registry))
    }

    async fn body_bytes(response: axum::response::Response) -> Bytes {
        response
            .into_body()
            .collect()
            .await
            .expect("collect body")
            .to_bytes()
    }

    fn post_request(uri: &str, body: &'static str) -> Request<Body> {
        Request::builder()
            .uri(uri)
            .method("POST")
            .body(Body::from(body))
            .expect("request build")
    }

    #[tokio::test]
    async fn health_endpoint_reports_ok() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/health")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, "{\"status\":\"ok\"}");
    }

    #[tokio::test]
    async fn dispatch_invokes_registered_method() {
        let response = app()
            .oneshot(post_request("/helloworld.Greeter/SayHello", "Armeria"))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(
            response.headers()[header::CONTENT_TYPE],
            "application/octet-stream"
        );
        assert_eq!(body_bytes(response).await, "Hello, Armeria!");
    }

    #[tokio::test]
    async fn dispatch_reaches_service_mounted_at_custom_path() {
        let response = app()
            .oneshot(post_request("/health/Check", ""))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        assert_eq!(body_bytes(response).await, "SERVING");
    }

    #[tokio::test]
    async fn post_reaches_methods_bound_on_builtin_paths() {
        let service = health::service();
        let check = service.methods()[0].descriptor().clone();

        let mut builder = HandlerRegistry::builder();
        builder
            .add_service_at("health", service.clone(), Some(check.clone()), None)
            .add_service_at(".well-known/rpc", service, Some(check), None);
        let app = build_app(AppState::new(builder.build().expect("registry builds")));

        for uri in ["/health", "/.well-known/rpc"] {
            let response = app
                .clone()
                .oneshot(post_request(uri, ""))
                .await
                .expect("request execution");

            assert_eq!(response.status(), StatusCode::OK, "POST {uri}");
            assert_eq!(body_bytes(response).await, "SERVING");
        }
    }

    #[tokio::test]
    async fn post_on_builtin_path_without_binding_is_method_not_found() {
        let response = app()
            .oneshot(post_request("/.well-known/rpc", ""))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn unknown_route_returns_method_not_found() {
        let response = app()
            .oneshot(post_request("/helloworld.Greeter/sayHello", "Armeria"))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::NOT_FOUND);
        let body: Value =
            serde_json::from_slice(&body_bytes(response).await).expect("json error body");
        assert_eq!(body["code"], "method_not_found");
        assert_eq!(body["message"], "no method bound to /helloworld.Greeter/sayHello");
    }

    #[tokio::test]
    async fn handler_errors_are_rendered() {
        let response = app()
            .oneshot(post_request("/helloworld.Greeter/SayGoodbye", ""))
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        let body: Value =
            serde_json::from_slice(&body_bytes(response).await).expect("json error body");
        assert_eq!(body["code"], "internal_error");
        assert_eq!(body["message"], "internal server error");
    }

    #[tokio::test]
    async fn get_on_rpc_route_is_not_allowed() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/helloworld.Greeter/SayHello")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
    }

    #[tokio::test]
    async fn discovery_lists_services_methods_and_decorators() {
        let response = app()
            .oneshot(
                Request::builder()
                    .uri("/.well-known/rpc")
                    .method("GET")
                    .body(Body::empty())
                    .expect("request build"),
            )
            .await
            .expect("request execution");

        assert_eq!(response.status(), StatusCode::OK);
        let body: Value =
            serde_json::from_slice(&body_bytes(response).await).expect("json discovery body");

        assert_eq!(body["name"], env!("CARGO_PKG_NAME"));
        assert_eq!(
            body["services"],
            serde_json::json!(["helloworld.Greeter", "grpc.health.v1.Health"])
        );

        let methods = body["methods"].as_array().expect("methods array");
        assert_eq!(methods.len(), 3);
        assert_eq!(methods[0]["path"], "helloworld.Greeter/SayHello");
        assert_eq!(methods[0]["method"], "helloworld.Greeter/SayHello");
        assert_eq!(methods[0]["type"], "unary");
        assert_eq!(methods[0]["decorators"], serde_json::json!(["auth", "tracing"]));
        assert_eq!(methods[1]["path"], "helloworld.Greeter/SayGoodbye");
        assert_eq!(methods[1]["decorators"], serde_json::json!([]));
        assert_eq!(methods[2]["path"], "health/Check");
        assert_eq!(methods[2]["method"], "grpc.health.v1.Health/Check");
    }
}
