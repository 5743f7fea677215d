//! value representation
//!
//! Property bags handed to a provisioning backend contain the following data types
//! - boolean (true/false)
//! - integer (signed, i64)
//! - decimal (f64)
//! - string (utf-8, may contain `${...}` placeholders until resolved)
//! - array ("list" of values)
//! - object (order-preserving "map"/"dictionary", where the key is of type string)
//!
//! Additionally:
//! - there is no `null`/`None` value. Unset fields are dropped from a bag instead, so the
//!   backend only ever sees what the user declared.
//! - the only valid **implicit** conversion: every `integer` is also a `decimal`
//!
use serde::{
    de::Error as _,
    ser::{SerializeMap, SerializeSeq},
    Deserialize, Deserializer, Serializer,
};

/// A property bag: field name to value, in declaration order
pub type Properties = indexmap::IndexMap<String, Value>;

/// All possible value types
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Boolean(bool),
    Integer(i64),
    Decimal(f64),
    String(String),
    Array(Vec<Value>),
    Object(Properties),
}

impl Value {
    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    /// Textual form used when a value is spliced into the middle of a string
    ///
    /// Scalars render as they would be written by hand; arrays and objects render as JSON.
    pub fn to_template_string(&self) -> String {
        match self {
            Value::Boolean(b) => b.to_string(),
            Value::Integer(i) => i.to_string(),
            Value::Decimal(d) => d.to_string(),
            Value::String(s) => s.clone(),
            Value::Array(_) | Value::Object(_) => {
                serde_json::to_string(self).unwrap_or_else(|_| String::new())
            }
        }
    }

    /// Converts a json value, dropping every `null` it contains
    ///
    /// Returns `None` only if `value` itself is `null`.
    pub fn from_json(value: serde_json::Value) -> Option<Value> {
        use serde_json::Value as Json;

        match value {
            Json::Null => None,
            Json::Bool(b) => Some(b.into()),
            Json::Number(n) => {
                if let Some(int) = n.as_i64() {
                    return Some(Value::Integer(int));
                }
                // u64 beyond i64::MAX degrades to a decimal
                n.as_f64().map(Value::Decimal)
            }
            Json::String(s) => Some(s.into()),
            Json::Array(array) => Some(Value::Array(
                array.into_iter().filter_map(Value::from_json).collect(),
            )),
            Json::Object(object) => Some(Value::Object(
                object
                    .into_iter()
                    .filter_map(|(k, v)| Value::from_json(v).map(|v| (k, v)))
                    .collect(),
            )),
        }
    }
}

/// Dumps any serializable model into a property bag
///
/// Fields serialized as `null` are dropped. Models that do not serialize to an object produce an
/// empty bag.
pub fn to_properties<T: serde::Serialize + ?Sized>(model: &T) -> Properties {
    match serde_json::to_value(model).ok().and_then(Value::from_json) {
        Some(Value::Object(properties)) => properties,
        _ => Properties::new(),
    }
}

impl From<String> for Value {
    fn from(value: String) -> Self {
        Value::String(value)
    }
}

impl From<&str> for Value {
    fn from(value: &str) -> Self {
        Value::String(value.to_string())
    }
}

impl From<bool> for Value {
    fn from(value: bool) -> Self {
        Self::Boolean(value)
    }
}

impl From<i64> for Value {
    fn from(value: i64) -> Self {
        Self::Integer(value)
    }
}

impl From<f64> for Value {
    fn from(value: f64) -> Self {
        Self::Decimal(value)
    }
}

impl<T: Into<Value>> From<Vec<T>> for Value {
    fn from(value: Vec<T>) -> Self {
        Value::Array(value.into_iter().map(Into::into).collect())
    }
}

impl From<Properties> for Value {
    fn from(value: Properties) -> Self {
        Value::Object(value)
    }
}

impl serde::ser::Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Boolean(value) => serializer.serialize_bool(*value),
            Value::Integer(value) => serializer.serialize_i64(*value),
            Value::Decimal(value) => serializer.serialize_f64(*value),
            Value::String(value) => serializer.serialize_str(value),
            Value::Array(value) => {
                let mut ser = serializer.serialize_seq(Some(value.len()))?;
                for element in value {
                    ser.serialize_element(element)?;
                }
                ser.end()
            }
            Value::Object(value) => {
                let mut ser = serializer.serialize_map(Some(value.len()))?;
                for (element_key, element_value) in value {
                    ser.serialize_entry(element_key, element_value)?;
                }
                ser.end()
            }
        }
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        let json = serde_json::Value::deserialize(deserializer)?;
        Value::from_json(json).ok_or_else(|| D::Error::custom("null values are not supported"))
    }
}

#[cfg(test)]
mod test {
    use super::*;
    use pretty_assertions::assert_eq;

    #[test]
    fn nulls_are_dropped() {
        let value: Value =
            serde_yaml::from_str("{ a: 1, b: null, c: [true, null, 2.5], d: { e: null } }")
                .unwrap();

        let expected = Value::Object(Properties::from_iter([
            ("a".to_string(), Value::Integer(1)),
            (
                "c".to_string(),
                Value::Array(vec![Value::Boolean(true), Value::Decimal(2.5)]),
            ),
            ("d".to_string(), Value::Object(Properties::new())),
        ]));

        assert_eq!(value, expected);
    }

    #[test]
    fn top_level_null_is_rejected() {
        assert!(serde_json::from_str::<Value>("null").is_err());
    }

    #[test]
    fn template_string() {
        assert_eq!(Value::Integer(42).to_template_string(), "42");
        assert_eq!(Value::Boolean(false).to_template_string(), "false");
        assert_eq!(Value::from("x").to_template_string(), "x");
        assert_eq!(
            Value::from(vec![Value::Integer(1), "a".into()]).to_template_string(),
            r#"[1,"a"]"#
        );
    }

    #[test]
    fn model_properties_keep_field_order() {
        #[derive(serde::Serialize)]
        struct Model {
            zeta: i64,
            alpha: Option<String>,
            mid: bool,
        }

        let properties = to_properties(&Model {
            zeta: 1,
            alpha: None,
            mid: true,
        });

        assert_eq!(
            properties.keys().collect::<Vec<_>>(),
            vec!["zeta", "mid"]
        );
    }
}
