//! Argument model for cached computations.
//!
//! Arguments are a closed union: strings, numbers, booleans, arrays of those,
//! and flat string-keyed maps of those. Nesting is unrepresentable by
//! construction, so key building never has to reject a shape at render time;
//! validation happens once, at the [`serde_json::Value`] conversion boundary.
//!
//! On the wire the union is untagged, so a request body carries plain JSON
//! primitives, arrays, and objects.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use serde_json::{Number, Value};
use std::collections::BTreeMap;

/// Ordered argument list of a cached computation.
pub type Args = Vec<ArgValue>;

/// A primitive argument element: string, number, or boolean.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ScalarValue {
    Bool(bool),
    Num(Number),
    Str(String),
}

/// A single argument: a scalar, a homogeneous-shape array of scalars, or a
/// flat string-keyed map of scalars.
///
/// `Map` uses a `BTreeMap` so its JSON rendering is canonical (sorted keys)
/// without a separate normalization pass.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ArgValue {
    Bool(bool),
    Num(Number),
    Str(String),
    List(Vec<ScalarValue>),
    Map(BTreeMap<String, ScalarValue>),
}

impl ScalarValue {
    /// Render the scalar for key building: strings pass through, booleans
    /// render as `true`/`false`, numbers use default decimal formatting.
    pub fn render(&self) -> String {
        match self {
            ScalarValue::Str(s) => s.clone(),
            ScalarValue::Num(n) => n.to_string(),
            ScalarValue::Bool(b) => {
                if *b {
                    "true".to_string()
                } else {
                    "false".to_string()
                }
            }
        }
    }
}

impl ArgValue {
    /// Render the argument for key building.
    ///
    /// Scalars render as in [`ScalarValue::render`]; lists join their
    /// rendered elements with `,`; maps render as canonical JSON.
    ///
    /// # Errors
    ///
    /// Returns `Error::SerializationError` if JSON rendering of a map fails.
    pub fn render(&self) -> Result<String> {
        match self {
            ArgValue::Str(s) => Ok(s.clone()),
            ArgValue::Num(n) => Ok(n.to_string()),
            ArgValue::Bool(b) => Ok(ScalarValue::Bool(*b).render()),
            ArgValue::List(items) => Ok(items
                .iter()
                .map(ScalarValue::render)
                .collect::<Vec<_>>()
                .join(",")),
            ArgValue::Map(map) => {
                serde_json::to_string(map).map_err(|e| Error::SerializationError(e.to_string()))
            }
        }
    }
}

impl TryFrom<Value> for ScalarValue {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(ScalarValue::Str(s)),
            Value::Number(n) => Ok(ScalarValue::Num(n)),
            Value::Bool(b) => Ok(ScalarValue::Bool(b)),
            Value::Null => Err(Error::InvalidArgumentType(
                "null is not a valid argument element".to_string(),
            )),
            Value::Array(_) => Err(Error::InvalidArgumentType(
                "nested arrays are not valid argument elements".to_string(),
            )),
            Value::Object(_) => Err(Error::InvalidArgumentType(
                "nested objects are not valid argument elements".to_string(),
            )),
        }
    }
}

impl TryFrom<Value> for ArgValue {
    type Error = Error;

    fn try_from(value: Value) -> Result<Self> {
        match value {
            Value::String(s) => Ok(ArgValue::Str(s)),
            Value::Number(n) => Ok(ArgValue::Num(n)),
            Value::Bool(b) => Ok(ArgValue::Bool(b)),
            Value::Array(items) => {
                let scalars = items
                    .into_iter()
                    .map(ScalarValue::try_from)
                    .collect::<Result<Vec<_>>>()?;
                Ok(ArgValue::List(scalars))
            }
            Value::Object(map) => {
                let mut flat = BTreeMap::new();
                for (k, v) in map {
                    flat.insert(k, ScalarValue::try_from(v)?);
                }
                Ok(ArgValue::Map(flat))
            }
            Value::Null => Err(Error::InvalidArgumentType(
                "null is not a valid argument".to_string(),
            )),
        }
    }
}

/// Convert a list of JSON values into an argument list, rejecting any element
/// outside the allowed shapes.
pub fn args_from_json(values: Vec<Value>) -> Result<Args> {
    values.into_iter().map(ArgValue::try_from).collect()
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::Str(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::Str(s)
    }
}

impl From<bool> for ArgValue {
    fn from(b: bool) -> Self {
        ArgValue::Bool(b)
    }
}

impl From<i64> for ArgValue {
    fn from(n: i64) -> Self {
        ArgValue::Num(Number::from(n))
    }
}

impl From<u32> for ArgValue {
    fn from(n: u32) -> Self {
        ArgValue::Num(Number::from(n))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_render_scalars() {
        assert_eq!(ArgValue::from("abc").render().unwrap(), "abc");
        assert_eq!(ArgValue::from(true).render().unwrap(), "true");
        assert_eq!(ArgValue::from(false).render().unwrap(), "false");
        assert_eq!(ArgValue::from(42i64).render().unwrap(), "42");
    }

    #[test]
    fn test_render_float_uses_decimal_formatting() {
        let arg = ArgValue::try_from(json!(1.5)).unwrap();
        assert_eq!(arg.render().unwrap(), "1.5");
    }

    #[test]
    fn test_render_list_joins_with_comma() {
        let arg = ArgValue::try_from(json!(["a", "b", "c"])).unwrap();
        assert_eq!(arg.render().unwrap(), "a,b,c");

        let arg = ArgValue::try_from(json!([1, 2, 3])).unwrap();
        assert_eq!(arg.render().unwrap(), "1,2,3");
    }

    #[test]
    fn test_render_map_is_canonical() {
        // Key order in the input must not matter.
        let a = ArgValue::try_from(json!({"b": 2, "a": 1})).unwrap();
        let b = ArgValue::try_from(json!({"a": 1, "b": 2})).unwrap();
        assert_eq!(a.render().unwrap(), b.render().unwrap());
        assert_eq!(a.render().unwrap(), r#"{"a":1,"b":2}"#);
    }

    #[test]
    fn test_rejects_null() {
        let err = ArgValue::try_from(json!(null)).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentType(_)));
    }

    #[test]
    fn test_rejects_nested_array() {
        let err = ArgValue::try_from(json!([["nested"]])).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentType(_)));
    }

    #[test]
    fn test_rejects_nested_object_value() {
        let err = ArgValue::try_from(json!({"k": {"nested": true}})).unwrap_err();
        assert!(matches!(err, Error::InvalidArgumentType(_)));
    }

    #[test]
    fn test_args_from_json() {
        let args = args_from_json(vec![json!("a"), json!(7), json!([true, false])]).unwrap();
        assert_eq!(args.len(), 3);
        assert_eq!(args[0], ArgValue::from("a"));
    }

    #[test]
    fn test_wire_shape_is_untagged() {
        let args: Args = vec![
            ArgValue::from("a"),
            ArgValue::from(1i64),
            ArgValue::try_from(json!({"k": "v"})).unwrap(),
        ];
        let wire = serde_json::to_string(&args).unwrap();
        assert_eq!(wire, r#"["a",1,{"k":"v"}]"#);

        let back: Args = serde_json::from_str(&wire).unwrap();
        assert_eq!(back, args);
    }
}
