//! # Type Introspector
//!
//! Rust has no runtime reflection, so a wrapped type describes its own method
//! surface through [`RestApi`]. The `#[rest_api]` attribute generates that impl
//! from an inherent `impl` block; it can also be written by hand.
//!
//! [`introspect`] turns the descriptors into [`OverloadGroup`]s:
//!
//! - only descriptors declared by the type itself are kept (see
//!   [`MethodDescriptor::declared_by`]),
//! - descriptors are grouped by exposed name,
//! - groups keep first-discovery order so route registration is deterministic.
//!
//! Groups are not validated here; an over-sized or ill-shaped group is rejected
//! by the adapter synthesizer.

use crate::error::InvocationError;
use crate::types::{Arguments, TypeTag};
use std::any::TypeId;
use std::fmt;
use std::sync::Arc;

/// Implemented by every type whose methods can be served.
///
/// The wrapped object is shared by all in-flight requests, so it must be
/// `Send + Sync`. Interior state needs its own synchronization.
pub trait RestApi: Send + Sync + 'static {
    /// Every exposed method, in declaration order.
    fn methods() -> Vec<MethodDescriptor<Self>>
    where
        Self: Sized;
}

/// Name and declared type of one method parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ParameterDescriptor {
    name: String,
    ty: TypeTag,
}

impl ParameterDescriptor {
    pub fn new(name: impl Into<String>, ty: TypeTag) -> Self {
        Self {
            name: name.into(),
            ty,
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn ty(&self) -> TypeTag {
        self.ty
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReturnType {
    Void,
    Value(TypeTag),
}

/// Calls the described method on a target with already-decoded arguments.
///
/// Returns the serialized result, or `None` for methods without a return value.
pub type Invoker<T> =
    Arc<dyn Fn(&T, &mut Arguments) -> Result<Option<String>, InvocationError> + Send + Sync>;

/// One exposed method: its name, parameters, return type and invoker.
pub struct MethodDescriptor<T> {
    name: String,
    parameters: Vec<ParameterDescriptor>,
    return_type: ReturnType,
    declared_by: TypeId,
    declared_in: &'static str,
    invoker: Invoker<T>,
}

impl<T: 'static> MethodDescriptor<T> {
    /// Describe a method declared directly on `T`.
    pub fn new<F>(
        name: impl Into<String>,
        parameters: Vec<ParameterDescriptor>,
        return_type: ReturnType,
        invoker: F,
    ) -> Self
    where
        F: Fn(&T, &mut Arguments) -> Result<Option<String>, InvocationError>
            + Send
            + Sync
            + 'static,
    {
        Self {
            name: name.into(),
            parameters,
            return_type,
            declared_by: TypeId::of::<T>(),
            declared_in: std::any::type_name::<T>(),
            invoker: Arc::new(invoker),
        }
    }

    /// Attribute the method to another declaring type `D`.
    ///
    /// Used for methods a type forwards from a shared base (common helpers,
    /// blanket behaviour). The introspector drops them, so they are never
    /// exposed as routes of `T`.
    #[must_use]
    pub fn declared_by<D: 'static>(mut self) -> Self {
        self.declared_by = TypeId::of::<D>();
        self.declared_in = std::any::type_name::<D>();
        self
    }

    #[must_use]
    pub fn is_declared_by<D: 'static>(&self) -> bool {
        self.declared_by == TypeId::of::<D>()
    }
}

impl<T> MethodDescriptor<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn parameters(&self) -> &[ParameterDescriptor] {
        &self.parameters
    }

    #[must_use]
    pub fn return_type(&self) -> ReturnType {
        self.return_type
    }

    #[must_use]
    pub fn arity(&self) -> usize {
        self.parameters.len()
    }

    /// Declaring type name, for diagnostics.
    #[must_use]
    pub fn declared_in(&self) -> &'static str {
        self.declared_in
    }

    /// True when the method takes exactly one parameter of a complex type,
    /// i.e. it can be fed from a request body.
    #[must_use]
    pub fn is_body_shaped(&self) -> bool {
        matches!(self.parameters.as_slice(), [only] if only.ty().is_complex())
    }

    pub fn invoke(&self, target: &T, args: &mut Arguments) -> Result<Option<String>, InvocationError> {
        (self.invoker)(target, args)
    }

    /// Human readable signature, e.g. `Add(a: int32, b: int32) -> int32`.
    #[must_use]
    pub fn signature(&self) -> String {
        let params = self
            .parameters
            .iter()
            .map(|p| format!("{}: {}", p.name(), p.ty()))
            .collect::<Vec<_>>()
            .join(", ");
        match self.return_type {
            ReturnType::Void => format!("{}({})", self.name, params),
            ReturnType::Value(ty) => format!("{}({}) -> {}", self.name, params, ty),
        }
    }
}

impl<T> Clone for MethodDescriptor<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            parameters: self.parameters.clone(),
            return_type: self.return_type,
            declared_by: self.declared_by,
            declared_in: self.declared_in,
            invoker: Arc::clone(&self.invoker),
        }
    }
}

impl<T> fmt::Debug for MethodDescriptor<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("MethodDescriptor")
            .field("name", &self.name)
            .field("parameters", &self.parameters)
            .field("return_type", &self.return_type)
            .field("declared_in", &self.declared_in)
            .finish_non_exhaustive()
    }
}

/// Methods sharing one exposed name.
pub struct OverloadGroup<T> {
    name: String,
    methods: Vec<MethodDescriptor<T>>,
}

impl<T> Clone for OverloadGroup<T> {
    fn clone(&self) -> Self {
        Self {
            name: self.name.clone(),
            methods: self.methods.clone(),
        }
    }
}

impl<T> fmt::Debug for OverloadGroup<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("OverloadGroup")
            .field("name", &self.name)
            .field("methods", &self.methods)
            .finish()
    }
}

impl<T> OverloadGroup<T> {
    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    #[must_use]
    pub fn methods(&self) -> &[MethodDescriptor<T>] {
        &self.methods
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.methods.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.methods.is_empty()
    }

    pub(crate) fn into_methods(self) -> Vec<MethodDescriptor<T>> {
        self.methods
    }
}

/// Enumerate the methods declared by `T` and group them by exposed name.
#[must_use]
pub fn introspect<T: RestApi>() -> Vec<OverloadGroup<T>> {
    group_methods(
        T::methods()
            .into_iter()
            .filter(|m| m.is_declared_by::<T>())
            .collect(),
    )
}

pub(crate) fn group_methods<T>(methods: Vec<MethodDescriptor<T>>) -> Vec<OverloadGroup<T>> {
    let mut groups: Vec<OverloadGroup<T>> = Vec::new();
    for method in methods {
        match groups.iter_mut().find(|g| g.name == method.name) {
            Some(group) => group.methods.push(method),
            None => groups.push(OverloadGroup {
                name: method.name.clone(),
                methods: vec![method],
            }),
        }
    }
    groups
}
