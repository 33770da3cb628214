//! Error types for the command-matching engine

use thiserror::Error;
use visa_protocol::ResourceNameError;

use crate::value::Value;

/// A property write was rejected
///
/// Recoverable: the device answers with the setter's error text or its
/// generic `command_error` response.
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ValidationError {
    /// Raw input could not be converted to the declared type
    #[error("cannot convert {value} to {kind}")]
    Conversion { value: String, kind: &'static str },

    #[error("{value} is below the minimum {min}")]
    BelowMin { value: Value, min: Value },

    #[error("{value} is above the maximum {max}")]
    AboveMax { value: Value, max: Value },

    /// Value is not a member of the valid set
    #[error("{0} is not a valid value")]
    NotValid(Value),
}

/// A response template failed to compile or render
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid template '{template}': {reason}")]
pub struct TemplateError {
    pub template: String,
    pub reason: String,
}

impl TemplateError {
    pub(crate) fn new(template: &str, reason: impl Into<String>) -> Self {
        Self {
            template: template.to_string(),
            reason: reason.into(),
        }
    }
}

/// A setter pattern failed to compile
#[derive(Debug, Error, Clone, PartialEq, Eq)]
#[error("invalid setter pattern '{pattern}': {reason}")]
pub struct PatternError {
    pub pattern: String,
    pub reason: String,
}

impl PatternError {
    pub(crate) fn new(pattern: &str, reason: impl Into<String>) -> Self {
        Self {
            pattern: pattern.to_string(),
            reason: reason.into(),
        }
    }
}

/// Fatal errors while building devices from their definitions
#[derive(Debug, Error, Clone, PartialEq)]
pub enum ConfigError {
    /// Specs are self-contradictory (e.g. bounds that do not convert)
    #[error("invalid specs for property '{property}': {reason}")]
    InvalidSpecs { property: String, reason: String },

    /// Default value does not satisfy the property's specs
    #[error("invalid default for property '{property}': {source}")]
    InvalidDefault {
        property: String,
        #[source]
        source: ValidationError,
    },

    #[error(transparent)]
    Template(#[from] TemplateError),

    #[error(transparent)]
    Pattern(#[from] PatternError),

    /// EOM table key is not a known "INTERFACE CLASS" pair
    #[error("invalid EOM key '{key}': {source}")]
    InvalidEomKey {
        key: String,
        #[source]
        source: ResourceNameError,
    },

    /// Pre-selected channel group on a device without `selected_channel`
    #[error("channel group '{0}' needs a 'selected_channel' property on the device")]
    MissingSelectedChannel(String),

    /// Channel group declared without any ids
    #[error("channel group '{0}' has no channel ids")]
    NoChannelIds(String),

    /// Resource references a device that is not defined
    #[error("unknown device '{device}' for resource {resource}")]
    UnknownDevice { resource: String, device: String },

    #[error(transparent)]
    Device(#[from] DeviceError),
}

/// Errors raised while wiring devices to resources
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum DeviceError {
    /// A device can only be bound to one resource
    #[error("device '{device}' is already bound to {resource}")]
    AlreadyBound { device: String, resource: String },

    #[error("invalid resource name: {0}")]
    ResourceName(#[from] ResourceNameError),
}
