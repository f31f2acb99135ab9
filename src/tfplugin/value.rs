//! Terraform value codec
//!
//! Terraform exchanges values as `DynamicValue`, normally cty's msgpack form:
//! objects are maps keyed by attribute name, null is msgpack nil and an
//! unknown value is extension type 0. Only the flat objects of primitive
//! attributes this provider declares are supported.

use super::proto::tfplugin6::DynamicValue;
use super::schema::{Attribute, AttributeType, Block};
use crate::errors::{ProviderError, Result};
use rmpv::Value as Msgpack;
use std::collections::BTreeMap;
use tracing::warn;

/// msgpack extension code cty uses for unknown values
const UNKNOWN_EXT: i8 = 0;

static NULL: Value = Value::Null;

/// A primitive attribute value.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum Value {
    #[default]
    Null,
    /// Not known until apply
    Unknown,
    Bool(bool),
    Number(i64),
    String(String),
}

impl Value {
    pub fn string<S: Into<String>>(value: S) -> Self {
        Value::String(value.into())
    }

    /// `Null` for `None`, otherwise a string value
    pub fn from_option(value: Option<String>) -> Self {
        value.map_or(Value::Null, Value::String)
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Value::Null)
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, Value::Unknown)
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Value::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Value::Number(n) => Some(*n),
            _ => None,
        }
    }

    fn matches_type(&self, ty: AttributeType) -> bool {
        matches!(
            (self, ty),
            (Value::Null | Value::Unknown, _)
                | (Value::Bool(_), AttributeType::Bool)
                | (Value::Number(_), AttributeType::Number)
                | (Value::String(_), AttributeType::String)
        )
    }
}

/// A non-null object value. Absent attributes read as null.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct ObjectValue {
    attributes: BTreeMap<String, Value>,
}

impl ObjectValue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn get(&self, name: &str) -> &Value {
        self.attributes.get(name).unwrap_or(&NULL)
    }

    pub fn set<S: Into<String>>(&mut self, name: S, value: Value) {
        self.attributes.insert(name.into(), value);
    }

    pub fn with<S: Into<String>>(mut self, name: S, value: Value) -> Self {
        self.set(name, value);
        self
    }

    /// Known, non-null string attribute
    pub fn string(&self, name: &str) -> Option<&str> {
        self.get(name).as_str()
    }

    /// Names of attributes whose value is unknown
    pub fn unknown_attributes(&self) -> Vec<&str> {
        self.attributes
            .iter()
            .filter(|(_, value)| value.is_unknown())
            .map(|(name, _)| name.as_str())
            .collect()
    }

    /// Replace every unknown attribute with null
    pub fn resolve_unknowns(&mut self) {
        for value in self.attributes.values_mut() {
            if value.is_unknown() {
                *value = Value::Null;
            }
        }
    }
}

/// Decode a `DynamicValue` against a schema. `Ok(None)` is a null object.
pub fn decode(value: Option<&DynamicValue>, schema: &Block) -> Result<Option<ObjectValue>> {
    let Some(value) = value else {
        return Ok(None);
    };

    if !value.msgpack.is_empty() {
        let mut bytes = value.msgpack.as_slice();
        let decoded = rmpv::decode::read_value(&mut bytes)
            .map_err(|e| ProviderError::codec(format!("invalid msgpack value: {}", e)))?;
        return object_from_msgpack(decoded, schema);
    }

    if !value.json.is_empty() {
        let decoded: serde_json::Value = serde_json::from_slice(&value.json)
            .map_err(|e| ProviderError::codec(format!("invalid JSON value: {}", e)))?;
        return object_from_json(decoded, schema, false);
    }

    Ok(None)
}

/// Encode an object (or null) as msgpack, emitting every schema attribute.
pub fn encode(object: Option<&ObjectValue>, schema: &Block) -> Result<DynamicValue> {
    let value = match object {
        None => Msgpack::Nil,
        Some(object) => {
            let mut entries = Vec::with_capacity(schema.attributes.len());
            for attribute in &schema.attributes {
                let value = object.get(attribute.name);
                if !value.matches_type(attribute.ty) {
                    return Err(ProviderError::codec(format!(
                        "attribute \"{}\" holds {:?}, expected {:?}",
                        attribute.name, value, attribute.ty
                    )));
                }
                entries.push((Msgpack::from(attribute.name), value_to_msgpack(value)));
            }
            Msgpack::Map(entries)
        }
    };

    let mut msgpack = Vec::new();
    rmpv::encode::write_value(&mut msgpack, &value)
        .map_err(|e| ProviderError::codec(format!("msgpack encoding failed: {}", e)))?;

    Ok(DynamicValue { msgpack, json: Vec::new() })
}

/// Decode stored JSON state, dropping attributes the schema no longer declares.
pub fn upgrade_json_state(json: &[u8], schema: &Block) -> Result<Option<ObjectValue>> {
    let decoded: serde_json::Value = serde_json::from_slice(json)
        .map_err(|e| ProviderError::codec(format!("invalid stored state: {}", e)))?;
    object_from_json(decoded, schema, true)
}

fn value_to_msgpack(value: &Value) -> Msgpack {
    match value {
        Value::Null => Msgpack::Nil,
        Value::Unknown => Msgpack::Ext(UNKNOWN_EXT, vec![0]),
        Value::Bool(b) => Msgpack::Boolean(*b),
        Value::Number(n) => Msgpack::from(*n),
        Value::String(s) => Msgpack::from(s.as_str()),
    }
}

fn object_from_msgpack(value: Msgpack, schema: &Block) -> Result<Option<ObjectValue>> {
    let entries = match value {
        Msgpack::Nil => return Ok(None),
        Msgpack::Map(entries) => entries,
        Msgpack::Ext(..) => {
            return Err(ProviderError::codec("object value is unknown"));
        }
        other => {
            return Err(ProviderError::codec(format!("expected an object, found {}", other)));
        }
    };

    let mut object = ObjectValue::new();
    for (key, value) in entries {
        let Some(key) = key.as_str() else {
            return Err(ProviderError::codec("object key is not a string"));
        };
        let attribute = lookup(schema, key)?;
        object.set(attribute.name, attribute_from_msgpack(value, attribute)?);
    }

    Ok(Some(object))
}

fn attribute_from_msgpack(value: Msgpack, attribute: &Attribute) -> Result<Value> {
    let mismatch = |found: &Msgpack| {
        ProviderError::codec(format!(
            "attribute \"{}\": expected {:?}, found {}",
            attribute.name, attribute.ty, found
        ))
    };

    match (value, attribute.ty) {
        (Msgpack::Nil, _) => Ok(Value::Null),
        (Msgpack::Ext(..), _) => Ok(Value::Unknown),
        (Msgpack::Boolean(b), AttributeType::Bool) => Ok(Value::Bool(b)),
        (Msgpack::String(s), AttributeType::String) => s
            .into_str()
            .map(Value::String)
            .ok_or_else(|| ProviderError::codec(format!("attribute \"{}\" is not valid UTF-8", attribute.name))),
        (Msgpack::Integer(n), AttributeType::Number) => n.as_i64().map(Value::Number).ok_or_else(|| {
            ProviderError::codec(format!("attribute \"{}\": number out of range", attribute.name))
        }),
        (Msgpack::F64(f), AttributeType::Number) => integral(f, attribute),
        (Msgpack::F32(f), AttributeType::Number) => integral(f64::from(f), attribute),
        (Msgpack::String(s), AttributeType::Number) => s
            .as_str()
            .and_then(|s| s.parse::<i64>().ok())
            .map(Value::Number)
            .ok_or_else(|| {
                ProviderError::codec(format!("attribute \"{}\": expected a whole number", attribute.name))
            }),
        (other, _) => Err(mismatch(&other)),
    }
}

fn integral(f: f64, attribute: &Attribute) -> Result<Value> {
    if f.fract() == 0.0 && f >= i64::MIN as f64 && f <= i64::MAX as f64 {
        Ok(Value::Number(f as i64))
    } else {
        Err(ProviderError::codec(format!(
            "attribute \"{}\": expected a whole number, found {}",
            attribute.name, f
        )))
    }
}

fn object_from_json(
    value: serde_json::Value,
    schema: &Block,
    drop_unknown_keys: bool,
) -> Result<Option<ObjectValue>> {
    let map = match value {
        serde_json::Value::Null => return Ok(None),
        serde_json::Value::Object(map) => map,
        other => {
            return Err(ProviderError::codec(format!("expected an object, found {}", other)));
        }
    };

    let mut object = ObjectValue::new();
    for (key, value) in map {
        let attribute = match schema.attribute(&key) {
            Some(attribute) => attribute,
            None if drop_unknown_keys => {
                warn!(attribute = %key, "Dropping stored attribute not present in the current schema");
                continue;
            }
            None => return Err(unsupported(&key)),
        };
        object.set(attribute.name, attribute_from_json(value, attribute)?);
    }

    Ok(Some(object))
}

fn attribute_from_json(value: serde_json::Value, attribute: &Attribute) -> Result<Value> {
    use serde_json::Value as Json;

    match (value, attribute.ty) {
        (Json::Null, _) => Ok(Value::Null),
        (Json::Bool(b), AttributeType::Bool) => Ok(Value::Bool(b)),
        (Json::String(s), AttributeType::String) => Ok(Value::String(s)),
        (Json::Number(n), AttributeType::Number) => match n.as_i64() {
            Some(n) => Ok(Value::Number(n)),
            None => integral(n.as_f64().unwrap_or(f64::NAN), attribute),
        },
        (Json::String(s), AttributeType::Number) => s.parse::<i64>().map(Value::Number).map_err(|_| {
            ProviderError::codec(format!("attribute \"{}\": expected a whole number", attribute.name))
        }),
        (other, _) => Err(ProviderError::codec(format!(
            "attribute \"{}\": expected {:?}, found {}",
            attribute.name, attribute.ty, other
        ))),
    }
}

fn lookup<'a>(schema: &'a Block, key: &str) -> Result<&'a Attribute> {
    schema.attribute(key).ok_or_else(|| unsupported(key))
}

fn unsupported(key: &str) -> ProviderError {
    ProviderError::codec(format!("unsupported attribute \"{}\"", key))
}
