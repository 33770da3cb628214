//! Typed, validated device properties

use std::collections::HashMap;

use crate::error::{ConfigError, ValidationError};
use crate::value::{PropertyType, Value};

/// Constraints a property value must satisfy
#[derive(Debug, Clone, PartialEq)]
pub struct Specs {
    pub kind: PropertyType,
    pub min: Option<Value>,
    pub max: Option<Value>,
    /// Allowed values; empty means unrestricted
    pub valid: Vec<Value>,
}

impl Specs {
    /// Build specs, converting bounds and valid values to `kind`
    pub fn new(
        kind: PropertyType,
        min: Option<Value>,
        max: Option<Value>,
        valid: Vec<Value>,
    ) -> Result<Self, String> {
        let convert = |v: Value| {
            v.coerce(kind)
                .ok_or_else(|| format!("{} is not a valid {}", v, kind.name()))
        };
        Ok(Self {
            kind,
            min: min.map(convert).transpose()?,
            max: max.map(convert).transpose()?,
            valid: valid.into_iter().map(convert).collect::<Result<_, _>>()?,
        })
    }

    /// Convert and check a raw value
    pub fn validate(&self, raw: &Value) -> Result<Value, ValidationError> {
        let value = raw
            .coerce(self.kind)
            .ok_or_else(|| ValidationError::Conversion {
                value: raw.to_string(),
                kind: self.kind.name(),
            })?;

        if let Some(min) = &self.min {
            if value < *min {
                return Err(ValidationError::BelowMin {
                    value,
                    min: min.clone(),
                });
            }
        }
        if let Some(max) = &self.max {
            if value > *max {
                return Err(ValidationError::AboveMax {
                    value,
                    max: max.clone(),
                });
            }
        }
        if !self.valid.is_empty() && !self.valid.contains(&value) {
            return Err(ValidationError::NotValid(value));
        }
        Ok(value)
    }
}

#[derive(Debug, Clone)]
enum Storage {
    Single(Value),
    /// One value per channel id, each starting at the default
    PerChannel {
        default: Value,
        values: HashMap<Option<String>, Value>,
    },
}

/// A named device property
#[derive(Debug, Clone)]
pub struct Property {
    name: String,
    specs: Option<Specs>,
    storage: Storage,
}

impl Property {
    /// Create a property holding a single value
    pub fn new(
        name: impl Into<String>,
        default: Value,
        specs: Option<Specs>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let default = Self::checked_default(&name, default, specs.as_ref())?;
        Ok(Self {
            name,
            specs,
            storage: Storage::Single(default),
        })
    }

    /// Create a property holding one value per channel
    pub fn per_channel(
        name: impl Into<String>,
        default: Value,
        specs: Option<Specs>,
    ) -> Result<Self, ConfigError> {
        let name = name.into();
        let default = Self::checked_default(&name, default, specs.as_ref())?;
        Ok(Self {
            name,
            specs,
            storage: Storage::PerChannel {
                default,
                values: HashMap::new(),
            },
        })
    }

    fn checked_default(name: &str, default: Value, specs: Option<&Specs>) -> Result<Value, ConfigError> {
        match specs {
            Some(specs) => specs
                .validate(&default)
                .map_err(|source| ConfigError::InvalidDefault {
                    property: name.to_string(),
                    source,
                }),
            None => Ok(default),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn specs(&self) -> Option<&Specs> {
        self.specs.as_ref()
    }

    pub fn is_per_channel(&self) -> bool {
        matches!(self.storage, Storage::PerChannel { .. })
    }

    /// Check a raw value against the specs without storing it
    ///
    /// Without specs any value is accepted unchanged.
    pub fn validate(&self, raw: &Value) -> Result<Value, ValidationError> {
        match &self.specs {
            Some(specs) => specs.validate(raw),
            None => Ok(raw.clone()),
        }
    }

    /// Current value; `channel` is ignored by single-valued properties
    pub fn get_value(&self, channel: Option<&str>) -> &Value {
        match &self.storage {
            Storage::Single(value) => value,
            Storage::PerChannel { default, values } => values
                .get(&channel.map(str::to_string))
                .unwrap_or(default),
        }
    }

    /// Validate and store a value; the previous value survives a failure
    pub fn set_value(&mut self, channel: Option<&str>, raw: &Value) -> Result<(), ValidationError> {
        let value = self.validate(raw)?;
        match &mut self.storage {
            Storage::Single(current) => *current = value,
            Storage::PerChannel { values, .. } => {
                values.insert(channel.map(str::to_string), value);
            }
        }
        Ok(())
    }
}
