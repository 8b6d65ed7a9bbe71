//! Declarative configuration schemas for components
//!
//! Every component variant describes its options with a [`ConfigSchema`].
//! Raw option maps ([`ComponentConfig`]) are validated against the schema
//! before a constructor runs; the constructor receives a [`ResolvedConfig`]
//! with defaults filled in.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::collections::HashMap;

use crate::domain::DomainError;

/// Value kind accepted by a config field
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FieldKind {
    Integer,
    Float,
    Boolean,
    String,
    Object,
    Array,
}

impl FieldKind {
    fn accepts(&self, value: &Value) -> bool {
        match self {
            Self::Integer => value.is_i64() || value.is_u64(),
            Self::Float => value.is_number(),
            Self::Boolean => value.is_boolean(),
            Self::String => value.is_string(),
            Self::Object => value.is_object(),
            Self::Array => value.is_array(),
        }
    }
}

/// A single option in a component schema
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ConfigField {
    pub name: String,
    pub kind: FieldKind,
    #[serde(default)]
    pub required: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub default: Option<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub min: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub max: Option<f64>,
    /// Allowed values for string fields (empty means any)
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub allowed: Vec<String>,
    #[serde(default)]
    pub description: String,
}

impl ConfigField {
    pub fn new(name: impl Into<String>, kind: FieldKind) -> Self {
        Self {
            name: name.into(),
            kind,
            required: false,
            default: None,
            min: None,
            max: None,
            allowed: Vec::new(),
            description: String::new(),
        }
    }

    pub fn integer(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Integer)
    }

    pub fn float(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Float)
    }

    pub fn boolean(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Boolean)
    }

    pub fn string(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::String)
    }

    pub fn object(name: impl Into<String>) -> Self {
        Self::new(name, FieldKind::Object)
    }

    pub fn required(mut self) -> Self {
        self.required = true;
        self
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }

    pub fn with_min(mut self, min: f64) -> Self {
        self.min = Some(min);
        self
    }

    pub fn with_max(mut self, max: f64) -> Self {
        self.max = Some(max);
        self
    }

    pub fn with_range(self, min: f64, max: f64) -> Self {
        self.with_min(min).with_max(max)
    }

    pub fn one_of(mut self, allowed: &[&str]) -> Self {
        self.allowed = allowed.iter().map(|s| s.to_string()).collect();
        self
    }

    pub fn describe(mut self, description: impl Into<String>) -> Self {
        self.description = description.into();
        self
    }

    fn check(&self, component: &str, value: &Value) -> Result<(), DomainError> {
        if !self.kind.accepts(value) {
            return Err(DomainError::validation(format!(
                "{}: field '{}' expects {:?}, got {}",
                component, self.name, self.kind, value
            )));
        }

        if let Some(number) = value.as_f64() {
            if let Some(min) = self.min {
                if number < min {
                    return Err(DomainError::validation(format!(
                        "{}: field '{}' must be >= {}, got {}",
                        component, self.name, min, number
                    )));
                }
            }

            if let Some(max) = self.max {
                if number > max {
                    return Err(DomainError::validation(format!(
                        "{}: field '{}' must be <= {}, got {}",
                        component, self.name, max, number
                    )));
                }
            }
        }

        if let (Some(s), false) = (value.as_str(), self.allowed.is_empty()) {
            if !self.allowed.iter().any(|a| a == s) {
                return Err(DomainError::validation(format!(
                    "{}: field '{}' must be one of [{}], got '{}'",
                    component,
                    self.name,
                    self.allowed.join(", "),
                    s
                )));
            }
        }

        Ok(())
    }
}

/// Schema describing the options a component accepts
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ConfigSchema {
    pub fields: Vec<ConfigField>,
}

impl ConfigSchema {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn field(mut self, field: ConfigField) -> Self {
        self.fields.push(field);
        self
    }

    /// Look up a field by name
    pub fn get(&self, name: &str) -> Option<&ConfigField> {
        self.fields.iter().find(|f| f.name == name)
    }

    /// Validate a raw option map and fill defaults.
    ///
    /// Unknown fields, wrong types, out-of-range numbers, disallowed string
    /// values and missing required fields are all rejected. A `null` value is
    /// treated as absent.
    pub fn validate(
        &self,
        component: &str,
        config: &ComponentConfig,
    ) -> Result<ResolvedConfig, DomainError> {
        let mut keys: Vec<&String> = config.values.keys().collect();
        keys.sort();

        for key in keys {
            if self.get(key).is_none() {
                return Err(DomainError::validation(format!(
                    "{}: unknown field '{}'",
                    component, key
                )));
            }
        }

        let mut values = Map::new();

        for field in &self.fields {
            match config.values.get(&field.name).filter(|v| !v.is_null()) {
                Some(value) => {
                    field.check(component, value)?;
                    values.insert(field.name.clone(), value.clone());
                }
                None => match &field.default {
                    Some(default) => {
                        values.insert(field.name.clone(), default.clone());
                    }
                    None if field.required => {
                        return Err(DomainError::validation(format!(
                            "{}: missing required field '{}'",
                            component, field.name
                        )));
                    }
                    None => {}
                },
            }
        }

        Ok(ResolvedConfig { values })
    }
}

/// Raw, unvalidated component options
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ComponentConfig {
    values: HashMap<String, Value>,
}

impl ComponentConfig {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from a JSON value, which must be an object or null
    pub fn from_value(value: Value) -> Result<Self, DomainError> {
        match value {
            Value::Null => Ok(Self::new()),
            Value::Object(map) => Ok(Self {
                values: map.into_iter().collect(),
            }),
            other => Err(DomainError::validation(format!(
                "component config must be an object, got {}",
                other
            ))),
        }
    }

    pub fn with(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.values.insert(key.into(), value.into());
        self
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.remove(key)
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Options after schema validation, defaults applied
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ResolvedConfig {
    values: Map<String, Value>,
}

impl ResolvedConfig {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    pub fn get_usize(&self, key: &str) -> Option<usize> {
        self.values
            .get(key)
            .and_then(Value::as_u64)
            .map(|v| v as usize)
    }

    pub fn get_f64(&self, key: &str) -> Option<f64> {
        self.values.get(key).and_then(Value::as_f64)
    }

    pub fn get_bool(&self, key: &str) -> Option<bool> {
        self.values.get(key).and_then(Value::as_bool)
    }

    /// Deserialize into a typed component config struct
    pub fn deserialize<T: DeserializeOwned>(&self) -> Result<T, DomainError> {
        serde_json::from_value(Value::Object(self.values.clone()))
            .map_err(|e| DomainError::configuration(format!("Invalid component config: {}", e)))
    }
}
