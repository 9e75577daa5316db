//! Serialization boundary.
//!
//! Results are encoded as JSON text and complex arguments are decoded from the
//! raw request body. Everything goes through `serde_json`.

use crate::error::CodecError;
use serde::de::DeserializeOwned;
use serde::Serialize;

/// Encode a value as JSON text.
pub fn serialize<T: Serialize + ?Sized>(value: &T) -> Result<String, CodecError> {
    serde_json::to_string(value).map_err(CodecError::Serialize)
}

/// Decode JSON text into `T`.
pub fn deserialize<T: DeserializeOwned>(text: &str) -> Result<T, CodecError> {
    serde_json::from_str(text).map_err(|source| CodecError::Deserialize {
        target: std::any::type_name::<T>(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::NaiveDate;
    use proptest::prelude::*;
    use rust_decimal::Decimal;
    use serde::Deserialize;
    use std::collections::HashMap;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Counterparty {
        name: String,
    }

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct Trade {
        volume: Decimal,
        trade_type: i32,
        trade_date: chrono::NaiveDateTime,
        sides: Vec<Counterparty>,
        sides_by_id: HashMap<i32, Counterparty>,
    }

    #[test]
    fn test_complex_round_trip() {
        let trade = Trade {
            volume: Decimal::new(66666, 1),
            trade_type: 1,
            trade_date: NaiveDate::from_ymd_opt(2021, 1, 1)
                .and_then(|d| d.and_hms_opt(0, 0, 0))
                .unwrap(),
            sides: vec![Counterparty {
                name: "ABD".to_string(),
            }],
            sides_by_id: HashMap::from([(
                1,
                Counterparty {
                    name: "VTBC".to_string(),
                },
            )]),
        };
        let text = serialize(&trade).unwrap();
        assert!(text.contains("\"trade_date\":\"2021-01-01T00:00:00\""));
        let back: Trade = deserialize(&text).unwrap();
        assert_eq!(back, trade);
    }

    #[test]
    fn test_deserialize_error_names_target() {
        let err = deserialize::<Counterparty>("{\"nope\":1}").unwrap_err();
        assert!(err.to_string().contains("Counterparty"));
    }

    #[test]
    fn test_serialize_integer() {
        assert_eq!(serialize(&5).unwrap(), "5");
        assert_eq!(serialize("hi").unwrap(), "\"hi\"");
    }

    proptest! {
        #[test]
        fn prop_i32_round_trip(v in any::<i32>()) {
            prop_assert_eq!(deserialize::<i32>(&serialize(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_i64_round_trip(v in any::<i64>()) {
            prop_assert_eq!(deserialize::<i64>(&serialize(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_string_round_trip(v in ".*") {
            prop_assert_eq!(deserialize::<String>(&serialize(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_decimal_round_trip(mantissa in any::<i64>(), scale in 0u32..=18) {
            let v = Decimal::new(mantissa, scale);
            prop_assert_eq!(deserialize::<Decimal>(&serialize(&v).unwrap()).unwrap(), v);
        }

        #[test]
        fn prop_datetime_round_trip(secs in 0i64..4_102_444_800, nanos in 0u32..1_000_000_000) {
            let v = chrono::DateTime::from_timestamp(secs, nanos).unwrap().naive_utc();
            prop_assert_eq!(deserialize::<chrono::NaiveDateTime>(&serialize(&v).unwrap()).unwrap(), v);
        }
    }
}
