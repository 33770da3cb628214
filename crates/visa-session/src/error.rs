//! Error types for opening sessions

use thiserror::Error;
use visa_protocol::{InterfaceType, ResourceClass, ResourceNameError};

/// Errors that can occur while resolving or opening a session
#[derive(Debug, Error, Clone, PartialEq, Eq)]
pub enum SessionError {
    /// No transport registered for the interface/class pair
    #[error("no session class registered for {interface} {class}")]
    NoSessionClass {
        interface: InterfaceType,
        class: ResourceClass,
    },

    /// No simulated device answers on the resource
    #[error("unknown resource: {0}")]
    UnknownResource(String),

    /// Resource string could not be parsed
    #[error(transparent)]
    ResourceName(#[from] ResourceNameError),
}
