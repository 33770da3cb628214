//! Error types for resource names and serial shaping

use thiserror::Error;

/// Errors that can occur while parsing a resource name
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum ResourceNameError {
    /// Resource string does not follow any known layout
    #[error("malformed resource name: {0}")]
    Malformed(String),

    /// Unknown interface prefix
    #[error("unknown interface type: {0}")]
    UnknownInterface(String),

    /// Unknown resource class suffix
    #[error("unknown resource class: {0}")]
    UnknownClass(String),

    /// Interface/class pair that has no resource layout
    #[error("unsupported resource class {class} for interface {interface}")]
    UnsupportedClass { interface: String, class: String },

    /// Numeric field could not be parsed
    #[error("invalid {field} in resource name: {value}")]
    InvalidNumber { field: &'static str, value: String },
}

/// Errors that can occur while shaping bytes for a serial link
#[derive(Debug, Error, Clone, Copy, PartialEq, Eq)]
pub enum ShapeError {
    /// Data width outside 1..=8
    #[error("invalid data bits: {0} (expected 1 to 8)")]
    InvalidDataBits(u8),

    /// Forcing the end bit needs a data width
    #[error("send end requires a data bit width")]
    SendEndWithoutWidth,
}
