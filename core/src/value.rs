//! Tagged values for script-owned state
//!
//! Scripts store arbitrary JSON-like data in the [`ScriptStore`](crate::ScriptStore).
//! [`ScriptValue`] keeps that data language-agnostic and serializable, with one
//! extra variant over JSON: [`ScriptValue::Entity`], so entity references
//! embedded anywhere in a script's state are visible to remapping.

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::entity::EntityToken;

/// A serializable script value
///
/// Maps are `BTreeMap`s so iteration and encoding order never depend on
/// insertion history or hasher state.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum ScriptValue {
    /// Absent / empty value
    #[default]
    Null,
    Bool(bool),
    Int(i64),
    Float(f64),
    String(String),
    /// Stable reference to a simulation entity
    Entity(EntityToken),
    List(Vec<ScriptValue>),
    Map(BTreeMap<String, ScriptValue>),
}

impl ScriptValue {
    /// Create an empty map value
    pub fn map() -> Self {
        Self::Map(BTreeMap::new())
    }

    pub fn is_null(&self) -> bool {
        matches!(self, Self::Null)
    }

    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Self::Bool(b) => Some(*b),
            _ => None,
        }
    }

    pub fn as_i64(&self) -> Option<i64> {
        match self {
            Self::Int(i) => Some(*i),
            _ => None,
        }
    }

    pub fn as_f64(&self) -> Option<f64> {
        match self {
            Self::Float(f) => Some(*f),
            Self::Int(i) => Some(*i as f64),
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            Self::String(s) => Some(s),
            _ => None,
        }
    }

    pub fn as_entity(&self) -> Option<EntityToken> {
        match self {
            Self::Entity(token) => Some(*token),
            _ => None,
        }
    }

    pub fn as_list(&self) -> Option<&[ScriptValue]> {
        match self {
            Self::List(items) => Some(items),
            _ => None,
        }
    }

    /// Look up a field of a map value
    pub fn get(&self, key: &str) -> Option<&ScriptValue> {
        match self {
            Self::Map(map) => map.get(key),
            _ => None,
        }
    }

    /// Mutable lookup of a field of a map value
    pub fn get_mut(&mut self, key: &str) -> Option<&mut ScriptValue> {
        match self {
            Self::Map(map) => map.get_mut(key),
            _ => None,
        }
    }

    /// Set a field on a map value
    ///
    /// A non-map value is replaced by a map first, which matches how scripts
    /// treat a missing state object as `{}`.
    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<ScriptValue>) {
        if !matches!(self, Self::Map(_)) {
            *self = Self::map();
        }
        if let Self::Map(map) = self {
            map.insert(key.into(), value.into());
        }
    }

    /// Visit every embedded entity token, depth first
    pub fn for_each_entity(&self, f: &mut impl FnMut(EntityToken)) {
        match self {
            Self::Entity(token) => f(*token),
            Self::List(items) => items.iter().for_each(|item| item.for_each_entity(f)),
            Self::Map(map) => map.values().for_each(|item| item.for_each_entity(f)),
            _ => {}
        }
    }

    /// Rewrite every embedded entity token
    ///
    /// `f` returns the replacement token, or `None` when the entity no longer
    /// exists, in which case the reference becomes [`ScriptValue::Null`].
    pub fn rewrite_entities(&mut self, f: &mut impl FnMut(EntityToken) -> Option<EntityToken>) {
        match self {
            Self::Entity(token) => {
                *self = match f(*token) {
                    Some(new) => Self::Entity(new),
                    None => Self::Null,
                }
            }
            Self::List(items) => items.iter_mut().for_each(|item| item.rewrite_entities(f)),
            Self::Map(map) => map.values_mut().for_each(|item| item.rewrite_entities(f)),
            _ => {}
        }
    }

    /// Convert a JSON value
    ///
    /// Integers that fit in `i64` become [`ScriptValue::Int`], all other numbers
    /// become [`ScriptValue::Float`]. JSON has no entity type, so this never
    /// produces [`ScriptValue::Entity`].
    pub fn from_json(json: serde_json::Value) -> Self {
        use serde_json::Value;
        match json {
            Value::Null => Self::Null,
            Value::Bool(b) => Self::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => Self::Int(i),
                None => Self::Float(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => Self::String(s),
            Value::Array(items) => Self::List(items.into_iter().map(Self::from_json).collect()),
            Value::Object(map) => Self::Map(
                map.into_iter()
                    .map(|(k, v)| (k, Self::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// Convert to JSON for inspection
    ///
    /// Entities are written as `[index, generation]` pairs. Non-finite floats
    /// become `null`.
    pub fn to_json(&self) -> serde_json::Value {
        use serde_json::Value;
        match self {
            Self::Null => Value::Null,
            Self::Bool(b) => Value::Bool(*b),
            Self::Int(i) => Value::from(*i),
            Self::Float(f) => serde_json::Number::from_f64(*f)
                .map(Value::Number)
                .unwrap_or(Value::Null),
            Self::String(s) => Value::String(s.clone()),
            Self::Entity(token) => Value::Array(vec![
                Value::from(token.index),
                Value::from(token.generation),
            ]),
            Self::List(items) => Value::Array(items.iter().map(Self::to_json).collect()),
            Self::Map(map) => Value::Object(
                map.iter()
                    .map(|(k, v)| (k.clone(), v.to_json()))
                    .collect(),
            ),
        }
    }
}

impl From<serde_json::Value> for ScriptValue {
    fn from(json: serde_json::Value) -> Self {
        Self::from_json(json)
    }
}

impl From<bool> for ScriptValue {
    fn from(b: bool) -> Self {
        Self::Bool(b)
    }
}

impl From<i64> for ScriptValue {
    fn from(i: i64) -> Self {
        Self::Int(i)
    }
}

impl From<i32> for ScriptValue {
    fn from(i: i32) -> Self {
        Self::Int(i as i64)
    }
}

impl From<f64> for ScriptValue {
    fn from(f: f64) -> Self {
        Self::Float(f)
    }
}

impl From<&str> for ScriptValue {
    fn from(s: &str) -> Self {
        Self::String(s.to_owned())
    }
}

impl From<String> for ScriptValue {
    fn from(s: String) -> Self {
        Self::String(s)
    }
}

impl From<EntityToken> for ScriptValue {
    fn from(token: EntityToken) -> Self {
        Self::Entity(token)
    }
}

impl From<Vec<ScriptValue>> for ScriptValue {
    fn from(items: Vec<ScriptValue>) -> Self {
        Self::List(items)
    }
}
