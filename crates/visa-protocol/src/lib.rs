//! Instrument I/O Protocol Library
//!
//! This crate provides the wire-level vocabulary shared by the simulated
//! instrument engine and its transport sessions:
//!
//! - **Resource names**: parsing and canonical display of VISA resource strings
//!   (`GPIB0::8::INSTR`, `ASRL1::INSTR`, `TCPIP0::host::inst0::INSTR`, ...)
//! - **Status codes**: the completion and error codes returned by framing operations
//! - **Attributes**: the catalogue of session attributes with their permissions,
//!   defaults and applicability
//! - **Serial shaping**: data-bit masking and end-bit forcing for serial links
//!
//! # Example
//!
//! ```rust
//! use visa_protocol::{InterfaceType, ResourceClass, ResourceName};
//!
//! let name: ResourceName = "gpib::8::instr".parse().unwrap();
//! assert_eq!(name.interface_type(), InterfaceType::Gpib);
//! assert_eq!(name.resource_class(), ResourceClass::Instr);
//! assert_eq!(name.to_string(), "GPIB0::8::INSTR");
//! ```

use std::fmt;
use std::str::FromStr;

pub mod attributes;
pub mod error;
pub mod resource;
pub mod serial;
pub mod status;

pub use attributes::{AttrValue, AttributeInfo, ResourceAttribute};
pub use error::{ResourceNameError, ShapeError};
pub use resource::ResourceName;
pub use serial::{shape_bytes, SerialTermination};
pub use status::StatusCode;

/// Physical interface a resource is reached through
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum InterfaceType {
    /// IEEE-488 bus
    Gpib,
    /// Serial (RS-232/RS-485)
    Asrl,
    /// Ethernet, VXI-11 or raw socket
    Tcpip,
    /// USB Test & Measurement class
    Usb,
}

impl InterfaceType {
    /// VISA numeric constant for this interface (`VI_INTF_*`)
    pub fn code(&self) -> i64 {
        match self {
            InterfaceType::Gpib => 1,
            InterfaceType::Asrl => 4,
            InterfaceType::Tcpip => 6,
            InterfaceType::Usb => 7,
        }
    }

    /// Resource-string prefix for this interface
    pub fn prefix(&self) -> &'static str {
        match self {
            InterfaceType::Gpib => "GPIB",
            InterfaceType::Asrl => "ASRL",
            InterfaceType::Tcpip => "TCPIP",
            InterfaceType::Usb => "USB",
        }
    }
}

impl fmt::Display for InterfaceType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.prefix())
    }
}

impl FromStr for InterfaceType {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "GPIB" => Ok(InterfaceType::Gpib),
            "ASRL" => Ok(InterfaceType::Asrl),
            "TCPIP" => Ok(InterfaceType::Tcpip),
            "USB" => Ok(InterfaceType::Usb),
            _ => Err(ResourceNameError::UnknownInterface(s.to_string())),
        }
    }
}

/// Class of a resource on its interface
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum ResourceClass {
    /// Message-based instrument
    Instr,
    /// Raw TCP socket
    Socket,
    /// Raw USB endpoints
    Raw,
}

impl ResourceClass {
    /// Resource-string suffix for this class
    pub fn name(&self) -> &'static str {
        match self {
            ResourceClass::Instr => "INSTR",
            ResourceClass::Socket => "SOCKET",
            ResourceClass::Raw => "RAW",
        }
    }
}

impl fmt::Display for ResourceClass {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for ResourceClass {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_uppercase().as_str() {
            "INSTR" => Ok(ResourceClass::Instr),
            "SOCKET" => Ok(ResourceClass::Socket),
            "RAW" => Ok(ResourceClass::Raw),
            _ => Err(ResourceNameError::UnknownClass(s.to_string())),
        }
    }
}

/// Parse an `"<INTERFACE> <CLASS>"` pair such as `"ASRL INSTR"`
///
/// This is the key format used by device end-of-message tables.
pub fn parse_type_class(s: &str) -> Result<(InterfaceType, ResourceClass), ResourceNameError> {
    let mut parts = s.split_whitespace();
    match (parts.next(), parts.next(), parts.next()) {
        (Some(interface), Some(class), None) => Ok((interface.parse()?, class.parse()?)),
        _ => Err(ResourceNameError::Malformed(s.to_string())),
    }
}
