//! Declared parameter types and the typed argument values handed to invokers.
//!
//! A [`TypeTag`] is the runtime description of a declared Rust type. The
//! primitive set (`i32`, `i64`, `Decimal`, `String`, `NaiveDateTime`) can be
//! decoded from a query parameter; every other type is [`TypeTag::Complex`] and
//! can only be decoded from a request body.

use crate::codec;
use crate::error::InvocationError;
use chrono::NaiveDateTime;
use rust_decimal::Decimal;
use serde::de::DeserializeOwned;
use std::fmt;

/// Runtime description of a declared parameter or return type.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TypeTag {
    /// `i32`
    Int32,
    /// `i64`
    Int64,
    /// `rust_decimal::Decimal`
    Decimal,
    /// `String`
    String,
    /// `chrono::NaiveDateTime`
    DateTime,
    /// Any other type, carrying its source spelling for diagnostics.
    Complex(&'static str),
}

impl TypeTag {
    /// True for the fixed set of types that can be decoded from a parameter map.
    #[must_use]
    pub fn is_primitive(&self) -> bool {
        !self.is_complex()
    }

    #[must_use]
    pub fn is_complex(&self) -> bool {
        matches!(self, TypeTag::Complex(_))
    }

    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            TypeTag::Int32 => "int32",
            TypeTag::Int64 => "int64",
            TypeTag::Decimal => "decimal",
            TypeTag::String => "string",
            TypeTag::DateTime => "datetime",
            TypeTag::Complex(name) => name,
        }
    }
}

impl fmt::Display for TypeTag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// A decoded argument, ready to be moved into a method call.
#[derive(Debug, Clone, PartialEq)]
pub enum Argument {
    Int32(i32),
    Int64(i64),
    Decimal(Decimal),
    String(String),
    DateTime(NaiveDateTime),
    /// Raw request body; deserialized by the invoker into the declared type.
    Body(String),
}

impl Argument {
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        match self {
            Argument::Int32(_) => TypeTag::Int32.name(),
            Argument::Int64(_) => TypeTag::Int64.name(),
            Argument::Decimal(_) => TypeTag::Decimal.name(),
            Argument::String(_) => TypeTag::String.name(),
            Argument::DateTime(_) => TypeTag::DateTime.name(),
            Argument::Body(_) => "body",
        }
    }
}

/// Conversion from a decoded [`Argument`] into one of the primitive Rust types.
pub trait FromArgument: Sized {
    const TAG: TypeTag;

    /// `None` when the argument holds a different type.
    fn from_argument(arg: Argument) -> Option<Self>;
}

macro_rules! from_argument {
    ($ty:ty, $variant:ident) => {
        impl FromArgument for $ty {
            const TAG: TypeTag = TypeTag::$variant;

            fn from_argument(arg: Argument) -> Option<Self> {
                match arg {
                    Argument::$variant(v) => Some(v),
                    _ => None,
                }
            }
        }
    };
}

from_argument!(i32, Int32);
from_argument!(i64, Int64);
from_argument!(Decimal, Decimal);
from_argument!(String, String);
from_argument!(NaiveDateTime, DateTime);

/// Ordered arguments for one invocation, consumed front to back by the invoker.
#[derive(Debug, Default)]
pub struct Arguments {
    values: std::vec::IntoIter<Argument>,
    position: usize,
}

impl Arguments {
    #[must_use]
    pub fn new(values: Vec<Argument>) -> Self {
        Self {
            values: values.into_iter(),
            position: 0,
        }
    }

    /// Take the next argument as a primitive value.
    pub fn next_value<T: FromArgument>(&mut self) -> Result<T, InvocationError> {
        let position = self.position;
        self.position += 1;
        let arg = self
            .values
            .next()
            .ok_or(InvocationError::MissingArgument { position })?;
        let found = arg.type_name();
        T::from_argument(arg).ok_or(InvocationError::ArgumentMismatch {
            position,
            expected: T::TAG.name(),
            found,
        })
    }

    /// Take the next argument as a request body and deserialize it.
    pub fn next_body<T: DeserializeOwned>(&mut self) -> Result<T, InvocationError> {
        let position = self.position;
        self.position += 1;
        match self.values.next() {
            Some(Argument::Body(raw)) => codec::deserialize(&raw).map_err(InvocationError::Decode),
            Some(other) => Err(InvocationError::ArgumentMismatch {
                position,
                expected: "body",
                found: other.type_name(),
            }),
            None => Err(InvocationError::MissingArgument { position }),
        }
    }
}
