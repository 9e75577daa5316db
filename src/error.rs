//! Error taxonomy.
//!
//! Synthesis and registration errors are returned to the registering caller.
//! Request-time errors ([`AdapterError`] and everything it wraps) are caught by
//! the request handler and turned into a 500 with a correlation id.

use crate::types::TypeTag;
use thiserror::Error;

/// Boxed cause kept as the `source` of coercion and invocation errors.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// An overload group cannot be turned into an adapter.
#[derive(Debug, Error)]
pub enum SynthesisError {
    #[error("ambiguous method definition '{method}': {reason}")]
    AmbiguousOverload { method: String, reason: String },
}

#[derive(Debug, Error)]
pub enum RouteError {
    #[error("method {path} already registered")]
    DuplicateRoute { path: String },
}

/// Failure to expose one method of a registered object.
#[derive(Debug, Error)]
pub enum RegistrationError {
    #[error(transparent)]
    Synthesis(#[from] SynthesisError),
    #[error(transparent)]
    Route(#[from] RouteError),
}

/// A query parameter could not be turned into its declared type.
#[derive(Debug, Error)]
pub enum CoercionError {
    #[error("parameter '{parameter}' has unsupported type {ty}; complex types can only be sent as the request body")]
    UnsupportedParameterType { parameter: String, ty: TypeTag },
    #[error("parameter '{parameter}' is not a valid {ty}")]
    ParameterDecodeError {
        parameter: String,
        ty: TypeTag,
        #[source]
        source: BoxError,
    },
}

/// Failure inside the serialization collaborator.
#[derive(Debug, Error)]
pub enum CodecError {
    #[error("failed to serialize value")]
    Serialize(#[source] serde_json::Error),
    #[error("failed to deserialize {target}")]
    Deserialize {
        target: &'static str,
        #[source]
        source: serde_json::Error,
    },
}

/// Failure while invoking a wrapped method, including decoding its body
/// argument and encoding its result.
#[derive(Debug, Error)]
pub enum InvocationError {
    #[error("request body could not be decoded")]
    Decode(#[source] CodecError),
    #[error("result could not be encoded")]
    Encode(#[source] CodecError),
    #[error("method returned an error")]
    Failed(#[source] BoxError),
    #[error("method panicked: {message}")]
    Panicked { message: String },
    #[error("argument {position} is missing")]
    MissingArgument { position: usize },
    #[error("argument {position} is {found}, expected {expected}")]
    ArgumentMismatch {
        position: usize,
        expected: &'static str,
        found: &'static str,
    },
}

impl InvocationError {
    /// Wrap an error returned by the wrapped method itself.
    ///
    /// Accepts any `std::error::Error`, `anyhow::Error`, `String` or `&str`.
    pub fn failed<E: Into<BoxError>>(err: E) -> Self {
        InvocationError::Failed(err.into())
    }
}

/// Any failure raised by an adapter. Always carries the original cause.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("failed to decode arguments for '{method}'")]
    Decode {
        method: String,
        #[source]
        source: CoercionError,
    },
    #[error("invocation of '{method}' failed")]
    Invocation {
        method: String,
        #[source]
        source: InvocationError,
    },
}

impl AdapterError {
    #[must_use]
    pub fn method(&self) -> &str {
        match self {
            AdapterError::Decode { method, .. } | AdapterError::Invocation { method, .. } => {
                method
            }
        }
    }

    /// Render the error with its full source chain, for logging.
    #[must_use]
    pub fn chain(&self) -> String {
        let mut out = self.to_string();
        let mut source = std::error::Error::source(self);
        while let Some(cause) = source {
            out.push_str(": ");
            out.push_str(&cause.to_string());
            source = cause.source();
        }
        out
    }
}

/// Configuration could not be loaded.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("failed to read config file {path}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },
    #[error("failed to parse config file {path}")]
    Yaml {
        path: String,
        #[source]
        source: serde_yaml::Error,
    },
    #[error("invalid value {value:?} for {key}")]
    Invalid { key: &'static str, value: String },
}
