//! Coercion Engine
//!
//! Converts an opaque stored [`Value`] into a strongly-typed result.
//!
//! Resolution order, first match wins:
//! 1. the value already holds the target type
//! 2. textual or binary values are parsed with the target's primitive rules
//! 3. other shapes requested as text are JSON-encoded
//! 4. everything else round-trips through JSON
//!
//! A [`Value::Nil`] never converts; it is always a type mismatch.

use std::any::type_name;

use serde::{de::DeserializeOwned, Deserialize, Deserializer, Serialize};

use crate::error::{CacheError, Result};
use crate::value::Value;

// == Json Wrapper ==
/// Marks a type as stored and read through its serde representation.
///
/// ```ignore
/// let user: Json<User> = manager.get("user:1").await?;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Json<T>(pub T);

impl<T> Json<T> {
    pub fn into_inner(self) -> T {
        self.0
    }
}

// == FromValue ==
/// A type the coercion engine can produce from a stored value.
///
/// Only `from_direct` and the text rules normally need overriding; the
/// defaults decode through JSON.
pub trait FromValue: DeserializeOwned {
    /// Returns the value unchanged when it already holds this type.
    fn from_direct(_raw: &Value) -> Option<Self> {
        None
    }

    /// Parses a textual value.
    fn from_text(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| decode_error::<Self>(e))
    }

    /// Parses a binary value.
    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        serde_json::from_slice(bytes).map_err(|e| decode_error::<Self>(e))
    }

    /// Handles every non-text shape that was not a direct match.
    fn from_other(raw: &Value) -> Result<Self> {
        round_trip(raw)
    }
}

/// Converts `raw` into `T`.
pub fn convert<T: FromValue>(raw: &Value) -> Result<T> {
    if raw.is_nil() {
        return Err(CacheError::TypeMismatch(format!(
            "nil value cannot be read as {}",
            type_name::<T>()
        )));
    }

    if let Some(direct) = T::from_direct(raw) {
        return Ok(direct);
    }

    match raw {
        Value::Str(text) => T::from_text(text),
        Value::Bytes(bytes) => T::from_bytes(bytes),
        other => T::from_other(other),
    }
}

/// Encodes `raw` as JSON and decodes it into `T`.
pub fn round_trip<T: DeserializeOwned>(raw: &Value) -> Result<T> {
    let encoded = encode_json(raw)?;
    serde_json::from_value(encoded).map_err(|e| decode_error::<T>(e))
}

/// JSON encoding of `raw`. Non-finite floats have no JSON form and are
/// rejected rather than silently becoming `null`.
fn encode_json(raw: &Value) -> Result<serde_json::Value> {
    if let Value::Float(f) = raw {
        if !f.is_finite() {
            return Err(CacheError::Conversion(format!(
                "cannot encode source {}: {} has no JSON representation",
                raw.kind(),
                f
            )));
        }
    }
    serde_json::to_value(raw).map_err(|e| encode_error(raw, e))
}

fn encode_error(raw: &Value, err: serde_json::Error) -> CacheError {
    CacheError::Conversion(format!("cannot encode source {}: {}", raw.kind(), err))
}

fn decode_error<T>(err: serde_json::Error) -> CacheError {
    CacheError::Conversion(format!(
        "cannot decode into target {}: {}",
        type_name::<T>(),
        err
    ))
}

fn parse_error<T>(text: &str, err: impl std::fmt::Display) -> CacheError {
    CacheError::Conversion(format!(
        "cannot parse {:?} as {}: {}",
        text,
        type_name::<T>(),
        err
    ))
}

fn utf8(bytes: &[u8]) -> Result<&str> {
    std::str::from_utf8(bytes)
        .map_err(|e| CacheError::Conversion(format!("bytes are not valid utf-8: {}", e)))
}

/// Accepts `true`/`t`/`1` and `false`/`f`/`0`, ignoring case.
pub fn parse_bool(text: &str) -> Result<bool> {
    match text.to_ascii_lowercase().as_str() {
        "true" | "t" | "1" => Ok(true),
        "false" | "f" | "0" => Ok(false),
        _ => Err(parse_error::<bool>(text, "expected true/t/1 or false/f/0")),
    }
}

// == Primitive Implementations ==
impl FromValue for String {
    fn from_direct(raw: &Value) -> Option<Self> {
        match raw {
            Value::Str(s) => Some(s.clone()),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Result<Self> {
        Ok(text.to_string())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        utf8(bytes).map(str::to_string)
    }

    fn from_other(raw: &Value) -> Result<Self> {
        let encoded = encode_json(raw)?;
        serde_json::to_string(&encoded).map_err(|e| encode_error(raw, e))
    }
}

impl FromValue for bool {
    fn from_direct(raw: &Value) -> Option<Self> {
        match raw {
            Value::Bool(b) => Some(*b),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Result<Self> {
        parse_bool(text)
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        parse_bool(utf8(bytes)?)
    }
}

macro_rules! integer_from_value {
    ($($t:ty),*) => {$(
        impl FromValue for $t {
            fn from_direct(raw: &Value) -> Option<Self> {
                match raw {
                    Value::Int(i) => <$t>::try_from(*i).ok(),
                    Value::UInt(u) => <$t>::try_from(*u).ok(),
                    _ => None,
                }
            }

            fn from_text(text: &str) -> Result<Self> {
                text.parse::<$t>().map_err(|e| parse_error::<$t>(text, e))
            }

            fn from_bytes(bytes: &[u8]) -> Result<Self> {
                Self::from_text(utf8(bytes)?)
            }
        }
    )*};
}

integer_from_value!(i8, i16, i32, i64, isize, u8, u16, u32, u64, usize);

impl FromValue for f64 {
    fn from_direct(raw: &Value) -> Option<Self> {
        match raw {
            Value::Float(f) => Some(*f),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Result<Self> {
        text.parse::<f64>().map_err(|e| parse_error::<f64>(text, e))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_text(utf8(bytes)?)
    }
}

impl FromValue for f32 {
    fn from_text(text: &str) -> Result<Self> {
        text.parse::<f32>().map_err(|e| parse_error::<f32>(text, e))
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Self::from_text(utf8(bytes)?)
    }
}

impl FromValue for Vec<u8> {
    fn from_direct(raw: &Value) -> Option<Self> {
        match raw {
            Value::Bytes(b) => Some(b.clone()),
            _ => None,
        }
    }

    fn from_text(text: &str) -> Result<Self> {
        Ok(text.as_bytes().to_vec())
    }

    fn from_bytes(bytes: &[u8]) -> Result<Self> {
        Ok(bytes.to_vec())
    }
}

impl FromValue for serde_json::Value {
    fn from_direct(raw: &Value) -> Option<Self> {
        match raw {
            Value::Structured(v) => Some(v.clone()),
            _ => None,
        }
    }
}

impl FromValue for Value {
    fn from_direct(raw: &Value) -> Option<Self> {
        Some(raw.clone())
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> std::result::Result<Self, D::Error> {
        serde_json::Value::deserialize(deserializer).map(Value::from)
    }
}

impl<T: DeserializeOwned> FromValue for Json<T> {}

// == ToValue ==
/// A type that can be written into a store.
pub trait ToValue {
    fn to_value(&self) -> Result<Value>;
}

macro_rules! to_value_via_from {
    ($($t:ty),*) => {$(
        impl ToValue for $t {
            fn to_value(&self) -> Result<Value> {
                Ok(Value::from(self.clone()))
            }
        }
    )*};
}

to_value_via_from!(
    String, bool, i8, i16, i32, i64, isize, u8, u16, u32, u64, usize, f32, f64, Vec<u8>,
    serde_json::Value
);

impl ToValue for str {
    fn to_value(&self) -> Result<Value> {
        Ok(Value::from(self))
    }
}

impl ToValue for Value {
    fn to_value(&self) -> Result<Value> {
        Ok(self.clone())
    }
}

impl<T: Serialize> ToValue for Json<T> {
    fn to_value(&self) -> Result<Value> {
        Value::from_serialize(&self.0).map_err(|e| {
            CacheError::Conversion(format!(
                "cannot encode source {}: {}",
                type_name::<T>(),
                e
            ))
        })
    }
}

// == Unit Tests ==
#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    struct User {
        id: u32,
        name: String,
    }

    #[test]
    fn test_direct_values_pass_through() {
        assert_eq!(convert::<i64>(&Value::Int(42)).unwrap(), 42);
        assert_eq!(convert::<String>(&Value::from("hi")).unwrap(), "hi");
        assert!(convert::<bool>(&Value::Bool(true)).unwrap());
        assert_eq!(convert::<f64>(&Value::Float(2.5)).unwrap(), 2.5);
        assert_eq!(convert::<Vec<u8>>(&Value::Bytes(vec![1, 2])).unwrap(), vec![1, 2]);
    }

    #[test]
    fn test_text_parses_integers() {
        assert_eq!(convert::<i64>(&Value::from("-17")).unwrap(), -17);
        assert_eq!(convert::<u16>(&Value::Bytes(b"8080".to_vec())).unwrap(), 8080);
    }

    #[test]
    fn test_non_numeric_text_is_conversion_error() {
        let err = convert::<i64>(&Value::from("abc")).unwrap_err();
        assert!(matches!(err, CacheError::Conversion(_)));
        assert!(err.to_string().contains("abc"));
    }

    #[test]
    fn test_bool_text_variants() {
        for yes in ["true", "TRUE", "t", "T", "1", "True"] {
            assert!(convert::<bool>(&Value::from(yes)).unwrap(), "{yes}");
        }
        for no in ["false", "FALSE", "f", "F", "0"] {
            assert!(!convert::<bool>(&Value::from(no)).unwrap(), "{no}");
        }
        assert!(convert::<bool>(&Value::from("yes")).is_err());
    }

    #[test]
    fn test_text_decodes_structured_target() {
        let raw = Value::from(r#"{"id":1,"name":"ada"}"#);
        let user: Json<User> = convert(&raw).unwrap();
        assert_eq!(
            user.into_inner(),
            User {
                id: 1,
                name: "ada".into()
            }
        );

        let err = convert::<Json<User>>(&Value::from("not json")).unwrap_err();
        assert!(matches!(err, CacheError::Conversion(_)));
    }

    #[test]
    fn test_non_text_requested_as_string_is_encoded() {
        let raw = Value::Structured(json!({"a": [1, 2]}));
        assert_eq!(convert::<String>(&raw).unwrap(), r#"{"a":[1,2]}"#);
        assert_eq!(convert::<String>(&Value::Int(5)).unwrap(), "5");
        assert_eq!(convert::<String>(&Value::Bool(false)).unwrap(), "false");
    }

    #[test]
    fn test_round_trip_structured_into_record() {
        let raw = Value::Structured(json!({"id": 7, "name": "grace"}));
        let Json(user) = convert::<Json<User>>(&raw).unwrap();
        assert_eq!(user.id, 7);
    }

    #[test]
    fn test_round_trip_reports_decode_failure() {
        let raw = Value::Structured(json!({"id": "seven"}));
        let err = convert::<Json<User>>(&raw).unwrap_err();
        assert!(err.to_string().contains("cannot decode into target"));
    }

    #[test]
    fn test_integer_out_of_range_is_conversion_error() {
        let err = convert::<u8>(&Value::Int(300)).unwrap_err();
        assert!(matches!(err, CacheError::Conversion(_)));
    }

    #[test]
    fn test_nil_is_type_mismatch() {
        assert!(matches!(
            convert::<String>(&Value::Nil),
            Err(CacheError::TypeMismatch(_))
        ));
        assert!(matches!(
            convert::<Value>(&Value::Nil),
            Err(CacheError::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_non_finite_float_is_conversion_error() {
        for f in [f64::NAN, f64::INFINITY, f64::NEG_INFINITY] {
            let err = convert::<String>(&Value::Float(f)).unwrap_err();
            assert!(matches!(err, CacheError::Conversion(_)), "{f}");
            assert!(matches!(
                convert::<i64>(&Value::Float(f)),
                Err(CacheError::Conversion(_))
            ));
        }
        assert_eq!(convert::<String>(&Value::Float(1.5)).unwrap(), "1.5");
    }

    #[test]
    fn test_invalid_utf8_bytes_to_string() {
        let err = convert::<String>(&Value::Bytes(vec![0xff, 0xfe])).unwrap_err();
        assert!(matches!(err, CacheError::Conversion(_)));
    }

    #[test]
    fn test_to_value_json_wrapper() {
        let stored = Json(User {
            id: 3,
            name: "lin".into(),
        })
        .to_value()
        .unwrap();
        assert_eq!(stored, Value::Structured(json!({"id": 3, "name": "lin"})));
    }
}
