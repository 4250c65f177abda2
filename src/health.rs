//! Built-in health checking service
//!
//! Exposes `grpc.health.v1.Health/Check`, answering `SERVING` for as long as
//! the process is able to dispatch requests.

use bytes::Bytes;

use crate::errors::AppError;
use crate::service::{handler_fn, MethodType, ServiceDefinition};

pub const SERVICE_NAME: &str = "grpc.health.v1.Health";
pub const SERVING: &str = "SERVING";

pub fn service() -> ServiceDefinition {
    ServiceDefinition::builder(SERVICE_NAME)
        .method(
            "Check",
            MethodType::Unary,
            handler_fn(|_request: Bytes| async {
                Ok::<_, AppError>(Bytes::from_static(SERVING.as_bytes()))
            }),
        )
        .build()
}
