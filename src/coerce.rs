//! Parameter coercion policy.
//!
//! Maps a raw query-string value and its declared [`TypeTag`] to a typed
//! [`Argument`]. A missing parameter is not an error: it coerces to the type's
//! zero value (`0`, `0`, `0`, `""`, `0001-01-01T00:00:00`). A present but
//! malformed value is a [`CoercionError::ParameterDecodeError`].

use crate::error::CoercionError;
use crate::introspect::ParameterDescriptor;
use crate::types::{Argument, TypeTag};
use chrono::{DateTime, NaiveDate, NaiveDateTime, NaiveTime};
use rust_decimal::Decimal;
use std::collections::HashMap;
use std::str::FromStr;

/// Accepted date/time layouts after RFC 3339, tried in order.
const DATETIME_FORMATS: &[&str] = &[
    "%Y-%m-%dT%H:%M:%S%.f",
    "%Y-%m-%d %H:%M:%S%.f",
    "%Y-%m-%dT%H:%M",
    "%Y-%m-%d %H:%M",
];

/// Coerce one raw value into its declared type.
pub fn coerce(parameter: &str, raw: Option<&str>, ty: TypeTag) -> Result<Argument, CoercionError> {
    let decode_error = |source: crate::error::BoxError| CoercionError::ParameterDecodeError {
        parameter: parameter.to_string(),
        ty,
        source,
    };

    match (ty, raw) {
        (TypeTag::Complex(_), _) => Err(CoercionError::UnsupportedParameterType {
            parameter: parameter.to_string(),
            ty,
        }),
        (_, None) => Ok(default_argument(ty)),
        (TypeTag::Int32, Some(raw)) => raw
            .trim()
            .parse::<i32>()
            .map(Argument::Int32)
            .map_err(|e| decode_error(e.into())),
        (TypeTag::Int64, Some(raw)) => raw
            .trim()
            .parse::<i64>()
            .map(Argument::Int64)
            .map_err(|e| decode_error(e.into())),
        (TypeTag::Decimal, Some(raw)) => parse_decimal(raw.trim())
            .map(Argument::Decimal)
            .map_err(|e| decode_error(e.into())),
        (TypeTag::String, Some(raw)) => Ok(Argument::String(raw.to_string())),
        (TypeTag::DateTime, Some(raw)) => parse_datetime(raw.trim())
            .map(Argument::DateTime)
            .ok_or_else(|| decode_error(format!("unrecognized date/time {raw:?}").into())),
    }
}

/// Coerce every declared parameter from the request's parameter map, in
/// declaration order.
pub fn coerce_all(
    parameters: &[ParameterDescriptor],
    values: &HashMap<String, String>,
) -> Result<Vec<Argument>, CoercionError> {
    parameters
        .iter()
        .map(|p| coerce(p.name(), values.get(p.name()).map(String::as_str), p.ty()))
        .collect()
}

/// Zero value for a primitive type.
fn default_argument(ty: TypeTag) -> Argument {
    match ty {
        TypeTag::Int32 => Argument::Int32(0),
        TypeTag::Int64 => Argument::Int64(0),
        TypeTag::Decimal => Argument::Decimal(Decimal::ZERO),
        TypeTag::DateTime => Argument::DateTime(min_datetime()),
        TypeTag::String | TypeTag::Complex(_) => Argument::String(String::new()),
    }
}

/// `0001-01-01T00:00:00`, the zero value for date/time parameters.
#[must_use]
pub fn min_datetime() -> NaiveDateTime {
    NaiveDate::from_ymd_opt(1, 1, 1)
        .unwrap_or(NaiveDate::MIN)
        .and_time(NaiveTime::MIN)
}

fn parse_decimal(raw: &str) -> Result<Decimal, rust_decimal::Error> {
    Decimal::from_str(raw).or_else(|e| Decimal::from_scientific(raw).map_err(|_| e))
}

fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    if let Ok(dt) = DateTime::parse_from_rfc3339(raw) {
        return Some(dt.naive_utc());
    }
    DATETIME_FORMATS
        .iter()
        .find_map(|fmt| NaiveDateTime::parse_from_str(raw, fmt).ok())
        .or_else(|| {
            NaiveDate::parse_from_str(raw, "%Y-%m-%d")
                .ok()
                .map(|d| d.and_time(NaiveTime::MIN))
        })
}
