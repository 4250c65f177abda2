//! Method dispatch registry
//!
//! `RegistryBuilder` collects service bindings during server configuration and
//! `build()` freezes them into a `HandlerRegistry`, which the transport layer
//! queries for every request without any locking.

mod builder;
pub mod path;
mod route;

use std::collections::HashMap;

use indexmap::IndexMap;

pub use builder::{Entry, RegistryBuilder};
pub use route::Route;

use crate::{
    decorator::DecoratorAndOrder,
    service::{MethodDefinition, MethodDescriptor, ServiceDefinition},
};

#[derive(Debug)]
pub struct HandlerRegistry {
    services: Vec<ServiceDefinition>,
    methods: IndexMap<String, MethodDefinition>,
    methods_by_route: IndexMap<Route, MethodDefinition>,
    simple_names: HashMap<MethodDescriptor, String>,
    decorators: HashMap<MethodDefinition, Vec<DecoratorAndOrder>>,
}

impl HandlerRegistry {
    pub fn builder() -> RegistryBuilder {
        RegistryBuilder::new()
    }

    /// Looks a method up by its registered path, e.g. `helloworld.Greeter/SayHello`.
    pub fn lookup_method(&self, name: &str) -> Option<&MethodDefinition> {
        self.methods.get(name)
    }

    pub fn lookup_method_by_route(&self, route: &Route) -> Option<&MethodDefinition> {
        self.methods_by_route.get(route)
    }

    pub fn simple_method_name(&self, descriptor: &MethodDescriptor) -> Option<&str> {
        self.simple_names.get(descriptor).map(String::as_str)
    }

    pub fn services(&self) -> &[ServiceDefinition] {
        &self.services
    }

    pub fn methods(&self) -> &IndexMap<String, MethodDefinition> {
        &self.methods
    }

    pub fn methods_by_route(&self) -> &IndexMap<Route, MethodDefinition> {
        &self.methods_by_route
    }

    pub fn decorators(&self) -> &HashMap<MethodDefinition, Vec<DecoratorAndOrder>> {
        &self.decorators
    }

    pub fn decorators_for(&self, method: &MethodDefinition) -> &[DecoratorAndOrder] {
        self.decorators
            .get(method)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }
}
