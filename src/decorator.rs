//! Declarative decorator discovery
//!
//! Implementation types describe the methods they expose, and the decorators
//! attached to the type and to each method, through an `ImplType` table. The
//! registry scans that table once at build time and asks a `DecoratorResolver`
//! for the ordered decorators of every matched method.

use std::{fmt, sync::Arc};

/// A cross-cutting behavior (tracing, auth, rate limiting, ...) attached to a
/// method. The registry never runs it, it only hands it to whoever assembles
/// the interceptor chain.
pub trait Decorator: fmt::Debug + Send + Sync {
    fn name(&self) -> &str;
}

#[derive(Debug, Clone)]
pub struct DecoratorAndOrder {
    decorator: Arc<dyn Decorator>,
    order: i32,
}

impl DecoratorAndOrder {
    pub fn new(decorator: Arc<dyn Decorator>, order: i32) -> Self {
        Self { decorator, order }
    }

    pub fn decorator(&self) -> &Arc<dyn Decorator> {
        &self.decorator
    }

    pub fn order(&self) -> i32 {
        self.order
    }
}

impl PartialEq for DecoratorAndOrder {
    fn eq(&self, other: &Self) -> bool {
        self.order == other.order && same_decorator(&self.decorator, &other.decorator)
    }
}

impl Eq for DecoratorAndOrder {}

fn same_decorator(left: &Arc<dyn Decorator>, right: &Arc<dyn Decorator>) -> bool {
    Arc::as_ptr(left) as *const () == Arc::as_ptr(right) as *const ()
}

/// One method exposed by an implementation type.
#[derive(Debug, Clone)]
pub struct ImplMethod {
    name: String,
    decorators: Vec<DecoratorAndOrder>,
}

impl ImplMethod {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
        }
    }

    pub fn decorator(self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorator_with_order(decorator, 0)
    }

    pub fn decorator_with_order(mut self, decorator: Arc<dyn Decorator>, order: i32) -> Self {
        self.decorators.push(DecoratorAndOrder::new(decorator, order));
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decorators(&self) -> &[DecoratorAndOrder] {
        &self.decorators
    }
}

/// Static description of a service implementation.
#[derive(Debug, Clone)]
pub struct ImplType {
    name: String,
    decorators: Vec<DecoratorAndOrder>,
    methods: Vec<ImplMethod>,
}

impl ImplType {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            decorators: Vec::new(),
            methods: Vec::new(),
        }
    }

    pub fn of<T: ?Sized>() -> Self {
        Self::new(std::any::type_name::<T>())
    }

    /// Adds a decorator that applies to every method of the type.
    pub fn decorator(self, decorator: Arc<dyn Decorator>) -> Self {
        self.decorator_with_order(decorator, 0)
    }

    pub fn decorator_with_order(mut self, decorator: Arc<dyn Decorator>, order: i32) -> Self {
        self.decorators.push(DecoratorAndOrder::new(decorator, order));
        self
    }

    pub fn method(mut self, method: ImplMethod) -> Self {
        self.methods.push(method);
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn decorators(&self) -> &[DecoratorAndOrder] {
        &self.decorators
    }

    /// Exposed methods in declaration order.
    pub fn methods(&self) -> &[ImplMethod] {
        &self.methods
    }

    /// First declared method with the given name.
    pub fn find_method(&self, name: &str) -> Option<&ImplMethod> {
        self.methods.iter().find(|method| method.name == name)
    }
}

/// Implemented by service implementations that declare their decorators.
pub trait ServiceImpl {
    fn impl_type() -> ImplType;
}

pub trait DecoratorResolver: Send + Sync {
    fn resolve(&self, impl_type: &ImplType, method: &ImplMethod) -> Vec<DecoratorAndOrder>;
}

/// Resolves type-level decorators followed by method-level ones, ordered by
/// ascending `order`. Equal orders keep declaration order.
#[derive(Debug, Clone, Copy, Default)]
pub struct DeclaredDecorators;

impl DecoratorResolver for DeclaredDecorators {
    fn resolve(&self, impl_type: &ImplType, method: &ImplMethod) -> Vec<DecoratorAndOrder> {
        let mut decorators: Vec<DecoratorAndOrder> = impl_type
            .decorators()
            .iter()
            .chain(method.decorators())
            .cloned()
            .collect();
        decorators.sort_by_key(DecoratorAndOrder::order);
        decorators
    }
}
