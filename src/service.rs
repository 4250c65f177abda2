//! Service and method definitions consumed by the registry
//!
//! A `ServiceDefinition` is the generated method table of one RPC service: a
//! name plus an ordered list of `MethodDefinition`s, each pairing a
//! `MethodDescriptor` with the handler that serves it.

use std::{
    fmt,
    future::Future,
    hash::{Hash, Hasher},
    sync::Arc,
};

use async_trait::async_trait;
use bytes::Bytes;
use serde::Serialize;

use crate::errors::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum MethodType {
    Unary,
    ClientStreaming,
    ServerStreaming,
    BidiStreaming,
}

/// Identity of one RPC method.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct MethodDescriptor {
    service_name: Arc<str>,
    bare_name: Arc<str>,
    method_type: MethodType,
}

impl MethodDescriptor {
    pub fn new(
        service_name: impl Into<Arc<str>>,
        bare_name: impl Into<Arc<str>>,
        method_type: MethodType,
    ) -> Self {
        Self {
            service_name: service_name.into(),
            bare_name: bare_name.into(),
            method_type,
        }
    }

    pub fn service_name(&self) -> &str {
        &self.service_name
    }

    pub fn bare_method_name(&self) -> &str {
        &self.bare_name
    }

    pub fn method_type(&self) -> MethodType {
        self.method_type
    }

    pub fn full_name(&self) -> String {
        format!("{}/{}", self.service_name, self.bare_name)
    }
}

impl fmt::Display for MethodDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.service_name, self.bare_name)
    }
}

#[async_trait]
pub trait MethodHandler: Send + Sync {
    async fn call(&self, request: Bytes) -> Result<Bytes, AppError>;
}

/// Adapts an async closure into a `MethodHandler`.
pub struct FnHandler<F>(F);

pub fn handler_fn<F, Fut>(f: F) -> FnHandler<F>
where
    F: Fn(Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Bytes, AppError>> + Send + 'static,
{
    FnHandler(f)
}

#[async_trait]
impl<F, Fut> MethodHandler for FnHandler<F>
where
    F: Fn(Bytes) -> Fut + Send + Sync + 'static,
    Fut: Future<Output = Result<Bytes, AppError>> + Send + 'static,
{
    async fn call(&self, request: Bytes) -> Result<Bytes, AppError> {
        (self.0)(request).await
    }
}

/// A descriptor bound to the handler serving it.
///
/// Two definitions are equal only when they carry equal descriptors and share
/// the same handler allocation, so clones of one definition compare equal
/// while a re-registration with a fresh handler does not.
#[derive(Clone)]
pub struct MethodDefinition {
    descriptor: MethodDescriptor,
    handler: Arc<dyn MethodHandler>,
}

impl MethodDefinition {
    pub fn new(descriptor: MethodDescriptor, handler: Arc<dyn MethodHandler>) -> Self {
        Self {
            descriptor,
            handler,
        }
    }

    pub fn descriptor(&self) -> &MethodDescriptor {
        &self.descriptor
    }

    pub async fn call(&self, request: Bytes) -> Result<Bytes, AppError> {
        self.handler.call(request).await
    }

    fn handler_addr(&self) -> *const () {
        Arc::as_ptr(&self.handler) as *const ()
    }
}

impl PartialEq for MethodDefinition {
    fn eq(&self, other: &Self) -> bool {
        self.descriptor == other.descriptor && self.handler_addr() == other.handler_addr()
    }
}

impl Eq for MethodDefinition {}

impl Hash for MethodDefinition {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.descriptor.hash(state);
    }
}

impl fmt::Debug for MethodDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDefinition")
            .field("descriptor", &self.descriptor)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServiceDefinition {
    name: Arc<str>,
    methods: Arc<[MethodDefinition]>,
}

impl ServiceDefinition {
    pub fn builder(name: impl Into<Arc<str>>) -> ServiceDefinitionBuilder {
        ServiceDefinitionBuilder {
            name: name.into(),
            methods: Vec::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn methods(&self) -> &[MethodDefinition] {
        &self.methods
    }

    pub fn method(&self, descriptor: &MethodDescriptor) -> Option<&MethodDefinition> {
        self.methods
            .iter()
            .find(|method| method.descriptor() == descriptor)
    }
}

impl fmt::Display for ServiceDefinition {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.name)
    }
}

pub struct ServiceDefinitionBuilder {
    name: Arc<str>,
    methods: Vec<MethodDefinition>,
}

impl ServiceDefinitionBuilder {
    /// Adds a method owned by this service.
    pub fn method<H>(self, bare_name: &str, method_type: MethodType, handler: H) -> Self
    where
        H: MethodHandler + 'static,
    {
        let descriptor = MethodDescriptor::new(self.name.clone(), bare_name, method_type);
        self.definition(MethodDefinition::new(descriptor, Arc::new(handler)))
    }

    /// Adds an already built definition. Its descriptor is kept as is, even if
    /// it names a different service.
    pub fn definition(mut self, definition: MethodDefinition) -> Self {
        self.methods.push(definition);
        self
    }

    pub fn build(self) -> ServiceDefinition {
        ServiceDefinition {
            name: self.name,
            methods: self.methods.into(),
        }
    }
}
