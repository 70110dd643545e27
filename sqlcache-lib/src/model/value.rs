//! Value enum for dynamically typed cache payloads

use std::collections::BTreeMap;

use log::warn;
use serde::Deserialize;
use serde::Serialize;
use serde::de::DeserializeOwned;

use crate::error::CacheError;

/// A dynamic value that can be stored under a cache key.
///
/// Every cached payload is one of these variants. Typed getters such as
/// [`get_int`](crate::cache::CacheHandle::get_int) narrow a stored value back
/// to a concrete Rust type and fall back to a default when the variant does
/// not match.
///
/// # Type Mapping
///
/// | Rust type | Variant |
/// |-----------|---------|
/// | `()`, `None` | `Null` |
/// | `bool` | `Bool` |
/// | `i8`..`i64`, `u8`..`u32` | `Int` |
/// | `f32`, `f64` | `Float` |
/// | `String`, `&str` | `String` |
/// | `Vec<u8>` via [`Value::bytes`] | `Bytes` |
/// | `Vec<T: Into<Value>>` | `Array` |
/// | `BTreeMap<String, T: Into<Value>>` | `Map` |
/// | any `T: Serialize` via [`Value::instance`] | `Instance` |
///
/// # Example
///
/// ```
/// use sqlcache_lib::model::Value;
///
/// let name = Value::from("Contoso");
/// let count = Value::from(42);
/// let tags = Value::from(vec!["a", "b"]);
/// let empty = Value::Null;
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, Default)]
pub enum Value {
    /// Null/empty value.
    #[default]
    Null,
    /// Boolean value.
    Bool(bool),
    /// 64-bit integer.
    Int(i64),
    /// 64-bit floating point.
    Float(f64),
    /// String value.
    String(String),
    /// Raw bytes.
    Bytes(Vec<u8>),
    /// Ordered list of values.
    Array(Vec<Value>),
    /// String-keyed map of values.
    Map(BTreeMap<String, Value>),
    /// A serialized Rust value tagged with its type name.
    Instance {
        /// `std::any::type_name` of the stored type.
        type_name: String,
        /// The instance encoded with bincode.
        data: Vec<u8>,
    },
}

impl Value {
    /// Wraps raw bytes. (`Vec<u8>` converts to `Array` through `From`.)
    pub fn bytes(data: impl Into<Vec<u8>>) -> Self {
        Value::Bytes(data.into())
    }

    /// Encodes an arbitrary serializable value as an `Instance`.
    ///
    /// The value can be read back with
    /// [`get_instance_of`](crate::cache::CacheHandle::get_instance_of).
    pub fn instance<T: Serialize>(value: &T) -> Result<Self, CacheError> {
        Ok(Value::Instance {
            type_name: std::any::type_name::<T>().to_string(),
            data: bincode::serialize(value)?,
        })
    }

    /// Returns `true` if this value is an `Instance` of `T`.
    pub fn is_instance_of<T>(&self) -> bool {
        matches!(self, Value::Instance { type_name, .. } if type_name == std::any::type_name::<T>())
    }

    /// Narrows an `Instance` back into `T`.
    ///
    /// Returns `None` when the value is not an instance of `T`. A payload
    /// tagged as `T` that no longer decodes, e.g. one written before `T`
    /// changed shape, is logged and also yields `None`.
    pub fn into_instance<T: DeserializeOwned>(self) -> Option<T> {
        match self {
            Value::Instance { type_name, data } if type_name == std::any::type_name::<T>() => {
                match bincode::deserialize(&data) {
                    Ok(value) => Some(value),
                    Err(err) => {
                        warn!("stored {type_name} does not decode, ignoring it: {err}");
                        None
                    }
                }
            }
            _ => None,
        }
    }

    /// Returns `true` if this is a null value.
    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    /// Returns the kind name of this value.
    pub fn type_name(&self) -> &str {
        match self {
            Value::Null => "null",
            Value::Bool(_) => "bool",
            Value::Int(_) => "int",
            Value::Float(_) => "float",
            Value::String(_) => "string",
            Value::Bytes(_) => "bytes",
            Value::Array(_) => "array",
            Value::Map(_) => "map",
            Value::Instance { type_name, .. } => type_name,
        }
    }

    /// Returns the integer if this is an `Int`.
    pub fn as_int(&self) -> Option<i64> {
        match self {
            Value::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Returns the string slice if this is a `String`.
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

/// Narrowing conversion from a [`Value`] to a concrete type.
///
/// Returns `None` when the value's variant does not match. There is no
/// numeric coercion: an `Int` never narrows to `f64` and vice versa.
pub trait FromValue: Sized {
    /// Attempts to narrow the value.
    fn from_value(value: Value) -> Option<Self>;
}

impl FromValue for Value {
    fn from_value(value: Value) -> Option<Self> {
        Some(value)
    }
}

impl FromValue for bool {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bool(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for i64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Int(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for f64 {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Float(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for String {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::String(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for Vec<u8> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Bytes(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for Vec<Value> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Array(v) => Some(v),
            _ => None,
        }
    }
}

impl FromValue for BTreeMap<String, Value> {
    fn from_value(value: Value) -> Option<Self> {
        match value {
            Value::Map(v) => Some(v),
            _ => None,
        }
    }
}

// =============================================================================
// From implementations
// =============================================================================

impl From<()> for Value {
    fn from(_: ()) -> Self {
        Value::Null
    }
}

impl From<bool> for Value {
    fn from(v: bool) -> Self {
        Value::Bool(v)
    }
}

macro_rules! impl_from_int {
    ($($ty:ty),*) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::Int(i64::from(v))
                }
            }
        )*
    };
}

impl_from_int!(i8, i16, i32, i64, u8, u16, u32);

impl From<f32> for Value {
    fn from(v: f32) -> Self {
        Value::Float(f64::from(v))
    }
}

impl From<f64> for Value {
    fn from(v: f64) -> Self {
        Value::Float(v)
    }
}

impl From<String> for Value {
    fn from(v: String) -> Self {
        Value::String(v)
    }
}

impl From<&str> for Value {
    fn from(v: &str) -> Self {
        Value::String(v.to_string())
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(v: Vec<T>) -> Self {
        Value::Array(v.into_iter().map(Into::into).collect())
    }
}

impl<T: Into<Value>> From<BTreeMap<String, T>> for Value {
    fn from(v: BTreeMap<String, T>) -> Self {
        Value::Map(v.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}

impl<T: Into<Value>> From<Option<T>> for Value {
    fn from(v: Option<T>) -> Self {
        match v {
            Some(inner) => inner.into(),
            None => Value::Null,
        }
    }
}

impl From<serde_json::Value> for Value {
    fn from(v: serde_json::Value) -> Self {
        match v {
            serde_json::Value::Null => Value::Null,
            serde_json::Value::Bool(b) => Value::Bool(b),
            serde_json::Value::Number(n) => match n.as_i64() {
                Some(i) => Value::Int(i),
                None => Value::Float(n.as_f64().unwrap_or(f64::NAN)),
            },
            serde_json::Value::String(s) => Value::String(s),
            serde_json::Value::Array(items) => Value::Array(items.into_iter().map(Into::into).collect()),
            serde_json::Value::Object(fields) => {
                Value::Map(fields.into_iter().map(|(k, v)| (k, v.into())).collect())
            }
        }
    }
}
