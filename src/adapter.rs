//! # Adapter Synthesizer
//!
//! Builds one [`Adapter`] per [`OverloadGroup`]. An adapter is a closure with
//! the uniform signature `(parameters, body) -> text` that decodes arguments,
//! calls the wrapped method and encodes the result.
//!
//! ## Overload rule
//!
//! A group holds one or two methods:
//!
//! - one method: the "simple" form, every parameter is decoded from the
//!   parameter map and the body is ignored;
//! - two methods: exactly one must take a single complex parameter. That
//!   "body" form is called whenever the request body is non-empty, the other
//!   one otherwise.
//!
//! Anything else is an [`SynthesisError::AmbiguousOverload`].

use crate::coerce::coerce_all;
use crate::error::{AdapterError, InvocationError, SynthesisError};
use crate::introspect::{MethodDescriptor, OverloadGroup, RestApi};
use crate::types::{Argument, Arguments};
use std::any::Any;
use std::collections::HashMap;
use std::fmt;
use std::panic::{catch_unwind, AssertUnwindSafe};
use std::sync::Arc;

/// Returned by adapters whose method has no return value.
pub const SUCCESS_SENTINEL: &str = "Call success, no return value";

/// Query-string parameters of one request.
pub type Parameters = HashMap<String, String>;

type AdapterFn = dyn Fn(&Parameters, Option<&str>) -> Result<String, AdapterError> + Send + Sync;

/// Uniform callable bound to one overload group and one target object.
///
/// Cloning is cheap; clones share the same closure.
#[derive(Clone)]
pub struct Adapter {
    name: Arc<str>,
    signatures: Arc<[String]>,
    call: Arc<AdapterFn>,
}

impl Adapter {
    /// Wrap a hand-written handler with the adapter signature.
    pub fn from_fn<F>(name: &str, call: F) -> Self
    where
        F: Fn(&Parameters, Option<&str>) -> Result<String, AdapterError> + Send + Sync + 'static,
    {
        Self {
            name: Arc::from(name),
            signatures: Arc::from(Vec::new()),
            call: Arc::new(call),
        }
    }

    #[must_use]
    pub fn name(&self) -> &str {
        &self.name
    }

    /// Signatures of the wrapped methods, simple form first.
    #[must_use]
    pub fn signatures(&self) -> &[String] {
        &self.signatures
    }

    /// Run the adapter. `body` is the raw request payload, if any.
    pub fn invoke(&self, parameters: &Parameters, body: Option<&str>) -> Result<String, AdapterError> {
        (self.call)(parameters, body)
    }

    /// True when both handles share the same underlying closure.
    #[must_use]
    pub fn ptr_eq(a: &Adapter, b: &Adapter) -> bool {
        Arc::ptr_eq(&a.call, &b.call)
    }
}

impl fmt::Debug for Adapter {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Adapter")
            .field("name", &self.name)
            .field("signatures", &self.signatures)
            .finish_non_exhaustive()
    }
}

/// Build the adapter for one overload group bound to `target`.
pub fn synthesize<T: RestApi>(
    group: OverloadGroup<T>,
    target: Arc<T>,
) -> Result<Adapter, SynthesisError> {
    let name = group.name().to_string();
    let ambiguous = |reason: &str| SynthesisError::AmbiguousOverload {
        method: name.clone(),
        reason: reason.to_string(),
    };

    let mut methods = group.into_methods();
    let (simple, body) = match methods.len() {
        1 => (methods.remove(0), None),
        2 => {
            let body_shaped: Vec<usize> = methods
                .iter()
                .enumerate()
                .filter(|(_, m)| m.is_body_shaped())
                .map(|(i, _)| i)
                .collect();
            match body_shaped.as_slice() {
                [i] => {
                    let body = methods.remove(*i);
                    (methods.remove(0), Some(body))
                }
                [] => {
                    return Err(ambiguous(
                        "no overload fits a body request; one overload must take a single complex parameter",
                    ))
                }
                _ => {
                    return Err(ambiguous(
                        "both overloads take a single complex parameter",
                    ))
                }
            }
        }
        0 => return Err(ambiguous("no methods in overload group")),
        n => {
            return Err(ambiguous(&format!(
                "{n} overloads found, at most 2 are supported"
            )))
        }
    };

    let signatures: Vec<String> = std::iter::once(simple.signature())
        .chain(body.as_ref().map(MethodDescriptor::signature))
        .collect();
    let method_name: Arc<str> = Arc::from(name.as_str());
    let call_name = Arc::clone(&method_name);

    let call = move |parameters: &Parameters, raw_body: Option<&str>| -> Result<String, AdapterError> {
        let invocation_error = |source| AdapterError::Invocation {
            method: call_name.to_string(),
            source,
        };
        match (&body, raw_body) {
            (Some(body_method), Some(raw)) if !raw.is_empty() => {
                let args = vec![Argument::Body(raw.to_string())];
                invoke(body_method, &target, args).map_err(invocation_error)
            }
            _ => {
                let args = coerce_all(simple.parameters(), parameters).map_err(|source| {
                    AdapterError::Decode {
                        method: call_name.to_string(),
                        source,
                    }
                })?;
                invoke(&simple, &target, args).map_err(invocation_error)
            }
        }
    };

    Ok(Adapter {
        name: method_name,
        signatures: Arc::from(signatures),
        call: Arc::new(call),
    })
}

/// Call one descriptor, recovering panics raised by the wrapped method.
fn invoke<T>(
    method: &MethodDescriptor<T>,
    target: &T,
    args: Vec<Argument>,
) -> Result<String, InvocationError> {
    let mut args = Arguments::new(args);
    let outcome = catch_unwind(AssertUnwindSafe(|| method.invoke(target, &mut args)))
        .map_err(|panic| InvocationError::Panicked {
            message: panic_message(panic.as_ref()),
        })??;
    Ok(outcome.unwrap_or_else(|| SUCCESS_SENTINEL.to_string()))
}

fn panic_message(panic: &(dyn Any + Send)) -> String {
    if let Some(s) = panic.downcast_ref::<&str>() {
        (*s).to_string()
    } else if let Some(s) = panic.downcast_ref::<String>() {
        s.clone()
    } else {
        "unknown panic payload".to_string()
    }
}
