use std::{collections::HashMap, sync::Arc};

use indexmap::IndexMap;
use tracing::{debug, info};

use super::{
    path::{normalize_path, to_lower_camel},
    HandlerRegistry, Route,
};
use crate::{
    decorator::{DeclaredDecorators, DecoratorAndOrder, DecoratorResolver, ImplMethod, ImplType},
    errors::RegistryError,
    service::{MethodDefinition, MethodDescriptor, ServiceDefinition},
};

/// One registration request, recorded as given.
#[derive(Debug, Clone)]
pub struct Entry {
    path: String,
    service: ServiceDefinition,
    method: Option<MethodDescriptor>,
    impl_type: Option<ImplType>,
}

impl Entry {
    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn service(&self) -> &ServiceDefinition {
        &self.service
    }

    /// `None` when the entry binds the whole service.
    pub fn method(&self) -> Option<&MethodDescriptor> {
        self.method.as_ref()
    }

    pub fn impl_type(&self) -> Option<&ImplType> {
        self.impl_type.as_ref()
    }

    fn normalized_path(&self) -> String {
        normalize_path(&self.path, self.method.is_none())
    }
}

/// Accumulates registrations and freezes them into a `HandlerRegistry`.
///
/// Registrations that end up on the same normalized path replace each other
/// as a whole: the last one wins and none of the earlier entry's methods
/// survive at that path.
pub struct RegistryBuilder {
    entries: Vec<Entry>,
    resolver: Arc<dyn DecoratorResolver>,
}

impl RegistryBuilder {
    pub fn new() -> Self {
        Self {
            entries: Vec::new(),
            resolver: Arc::new(DeclaredDecorators),
        }
    }

    pub fn with_resolver(mut self, resolver: Arc<dyn DecoratorResolver>) -> Self {
        self.resolver = resolver;
        self
    }

    /// Binds every method of `service` under the service's own name.
    pub fn add_service(
        &mut self,
        service: ServiceDefinition,
        impl_type: Option<ImplType>,
    ) -> &mut Self {
        let path = service.name().to_string();
        self.add_service_at(path, service, None, impl_type)
    }

    /// Binds `service` at a custom path. With `method` set, only that method is
    /// bound and `path` is its full route.
    pub fn add_service_at(
        &mut self,
        path: impl Into<String>,
        service: ServiceDefinition,
        method: Option<MethodDescriptor>,
        impl_type: Option<ImplType>,
    ) -> &mut Self {
        self.entries.push(Entry {
            path: path.into(),
            service,
            method,
            impl_type,
        });
        self
    }

    pub fn entries(&self) -> &[Entry] {
        &self.entries
    }

    pub fn build(&self) -> Result<HandlerRegistry, RegistryError> {
        // Deduplicate by path before expanding so a replaced entry contributes
        // nothing at all.
        let mut by_path: IndexMap<String, &Entry> = IndexMap::new();
        for entry in &self.entries {
            let path = entry.normalized_path();
            if let Some(previous) = by_path.insert(path.clone(), entry) {
                debug!(
                    path = %path,
                    replaced = %previous.service(),
                    service = %entry.service(),
                    "registration replaced at path"
                );
            }
        }

        let mut expansion = Expansion::default();
        for (path, entry) in &by_path {
            match entry.method() {
                None => expansion.bind_service(path, entry, self.resolver.as_ref()),
                Some(descriptor) => {
                    expansion.bind_method(path, entry, descriptor, self.resolver.as_ref())?
                }
            }
        }

        let services: Vec<ServiceDefinition> =
            by_path.values().map(|entry| entry.service().clone()).collect();

        info!(
            services = services.len(),
            methods = expansion.methods.len(),
            decorated = expansion.decorators.len(),
            "handler registry built"
        );

        Ok(HandlerRegistry {
            services,
            methods: expansion.methods,
            methods_by_route: expansion.methods_by_route,
            simple_names: expansion.simple_names,
            decorators: expansion.decorators,
        })
    }
}

impl Default for RegistryBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Default)]
struct Expansion {
    methods: IndexMap<String, MethodDefinition>,
    methods_by_route: IndexMap<Route, MethodDefinition>,
    simple_names: HashMap<MethodDescriptor, String>,
    decorators: HashMap<MethodDefinition, Vec<DecoratorAndOrder>>,
}

impl Expansion {
    fn bind_service(&mut self, path: &str, entry: &Entry, resolver: &dyn DecoratorResolver) {
        let impl_methods: HashMap<&str, &ImplMethod> = match entry.impl_type() {
            Some(impl_type) => {
                let mut lookup = HashMap::new();
                for method in impl_type.methods() {
                    lookup.entry(method.name()).or_insert(method);
                }
                lookup
            }
            None => HashMap::new(),
        };

        for definition in entry.service().methods() {
            let bare_name = definition.descriptor().bare_method_name();
            let full_path = format!("{path}/{bare_name}");
            self.record(&full_path, definition);

            if let Some(impl_type) = entry.impl_type() {
                if let Some(method) = impl_methods.get(to_lower_camel(bare_name).as_str()) {
                    self.resolve_decorators(definition, impl_type, method, resolver);
                }
            }
        }
    }

    fn bind_method(
        &mut self,
        path: &str,
        entry: &Entry,
        descriptor: &MethodDescriptor,
        resolver: &dyn DecoratorResolver,
    ) -> Result<(), RegistryError> {
        let definition =
            entry
                .service()
                .method(descriptor)
                .ok_or_else(|| RegistryError::MethodNotFound {
                    method: descriptor.to_string(),
                    service: entry.service().to_string(),
                })?;
        self.record(path, definition);

        if let Some(impl_type) = entry.impl_type() {
            let name = to_lower_camel(definition.descriptor().bare_method_name());
            if let Some(method) = impl_type.find_method(&name) {
                self.resolve_decorators(definition, impl_type, method, resolver);
            }
        }
        Ok(())
    }

    fn record(&mut self, path: &str, definition: &MethodDefinition) {
        let descriptor = definition.descriptor();
        debug!(path = %path, method = %descriptor, "binding rpc method");

        self.methods.insert(path.to_string(), definition.clone());
        self.methods_by_route
            .insert(Route::exact(format!("/{path}")), definition.clone());
        self.simple_names.insert(
            descriptor.clone(),
            descriptor.bare_method_name().to_string(),
        );
    }

    fn resolve_decorators(
        &mut self,
        definition: &MethodDefinition,
        impl_type: &ImplType,
        method: &ImplMethod,
        resolver: &dyn DecoratorResolver,
    ) {
        let decorators = resolver.resolve(impl_type, method);
        if !decorators.is_empty() {
            self.decorators.insert(definition.clone(), decorators);
        }
    }
}
