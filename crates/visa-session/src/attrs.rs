//! Per-session attribute storage
//!
//! Values are looked up by attribute; anything never stored reads back as the
//! catalogue default. Permission and applicability checks live in
//! [`Session`](crate::Session), the store itself accepts any write.

use std::collections::HashMap;

use visa_protocol::{AttrValue, ResourceAttribute};

/// Attribute values of one session
#[derive(Debug, Clone, Default)]
pub struct AttributeStore {
    values: HashMap<ResourceAttribute, AttrValue>,
}

impl AttributeStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Stored value, or the attribute's default
    pub fn get(&self, attribute: ResourceAttribute) -> AttrValue {
        self.values
            .get(&attribute)
            .cloned()
            .unwrap_or_else(|| attribute.info().default)
    }

    /// Store a value without any check
    pub fn set(&mut self, attribute: ResourceAttribute, value: impl Into<AttrValue>) {
        self.values.insert(attribute, value.into());
    }

    /// Whether a value was explicitly stored
    pub fn is_set(&self, attribute: ResourceAttribute) -> bool {
        self.values.contains_key(&attribute)
    }

    /// Integer value; non-integer attributes read as 0
    pub fn int(&self, attribute: ResourceAttribute) -> i64 {
        self.get(attribute).as_int().unwrap_or(0)
    }

    /// Boolean value; non-boolean attributes read as false
    pub fn flag(&self, attribute: ResourceAttribute) -> bool {
        self.get(attribute).as_bool().unwrap_or(false)
    }

    /// The termination character as a byte
    pub fn term_char(&self) -> u8 {
        (self.int(ResourceAttribute::TermChar) & 0xFF) as u8
    }
}
