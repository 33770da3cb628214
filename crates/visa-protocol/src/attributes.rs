//! Session attribute catalogue
//!
//! Every attribute a simulated session understands is listed here with its
//! VISA id, access permissions, default value and the (interface, class)
//! pairs it applies to. Sessions consult this table before touching their
//! attribute store.

use std::fmt;

use crate::serial::SerialTermination;
use crate::{InterfaceType, ResourceClass};

/// `VI_NO_SEC_ADDR`: GPIB device without secondary address
pub const NO_SECONDARY_ADDRESS: i64 = 0xFFFF;

/// Value held by a session attribute
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AttrValue {
    Bool(bool),
    Int(i64),
    Str(String),
}

impl AttrValue {
    /// Integer payload, if this is an integer attribute
    pub fn as_int(&self) -> Option<i64> {
        match self {
            AttrValue::Int(v) => Some(*v),
            _ => None,
        }
    }

    /// Boolean payload, if this is a boolean attribute
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            AttrValue::Bool(v) => Some(*v),
            _ => None,
        }
    }

    /// String payload, if this is a string attribute
    pub fn as_str(&self) -> Option<&str> {
        match self {
            AttrValue::Str(v) => Some(v),
            _ => None,
        }
    }

    fn same_kind(&self, other: &AttrValue) -> bool {
        std::mem::discriminant(self) == std::mem::discriminant(other)
    }
}

impl From<bool> for AttrValue {
    fn from(v: bool) -> Self {
        AttrValue::Bool(v)
    }
}

impl From<i64> for AttrValue {
    fn from(v: i64) -> Self {
        AttrValue::Int(v)
    }
}

impl From<&str> for AttrValue {
    fn from(v: &str) -> Self {
        AttrValue::Str(v.to_string())
    }
}

impl From<String> for AttrValue {
    fn from(v: String) -> Self {
        AttrValue::Str(v)
    }
}

impl fmt::Display for AttrValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            AttrValue::Bool(v) => write!(f, "{}", v),
            AttrValue::Int(v) => write!(f, "{}", v),
            AttrValue::Str(v) => f.write_str(v),
        }
    }
}

/// Attributes known to simulated sessions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ResourceAttribute {
    ResourceName,
    ResourceClass,
    InterfaceType,
    InterfaceNumber,
    TimeoutValue,
    TermChar,
    TermCharEnabled,
    SendEndEnabled,
    SuppressEndEnabled,
    AsrlBaud,
    AsrlDataBits,
    AsrlEndIn,
    AsrlEndOut,
    GpibPrimaryAddress,
    GpibSecondaryAddress,
    TcpipAddress,
    TcpipDeviceName,
    TcpipPort,
    ManufacturerId,
    ModelCode,
    UsbSerialNumber,
    UsbInterfaceNumber,
}

/// Which sessions an attribute applies to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Scope {
    /// Every session
    All,
    /// Every class on one interface
    Interface(InterfaceType),
    /// Exactly one (interface, class) pair
    Resource(InterfaceType, ResourceClass),
}

/// Metadata describing one attribute
#[derive(Debug, Clone, PartialEq)]
pub struct AttributeInfo {
    pub attribute: ResourceAttribute,
    /// VISA constant name
    pub name: &'static str,
    pub readable: bool,
    pub writable: bool,
    /// Value reported before anything was stored
    pub default: AttrValue,
    pub scope: Scope,
}

impl AttributeInfo {
    /// Check whether the attribute exists for a session of the given type
    pub fn applies_to(&self, interface_type: InterfaceType, resource_class: ResourceClass) -> bool {
        match self.scope {
            Scope::All => true,
            Scope::Interface(it) => it == interface_type,
            Scope::Resource(it, rc) => it == interface_type && rc == resource_class,
        }
    }

    /// Check that a value has the right kind and lies in the attribute's range
    pub fn accepts(&self, value: &AttrValue) -> bool {
        if !value.same_kind(&self.default) {
            return false;
        }
        let Some(v) = value.as_int() else {
            return true;
        };
        match self.attribute {
            ResourceAttribute::TimeoutValue => v >= 0,
            ResourceAttribute::TermChar => (0..=0xFF).contains(&v),
            ResourceAttribute::AsrlBaud => v > 0,
            ResourceAttribute::AsrlDataBits => (5..=8).contains(&v),
            ResourceAttribute::AsrlEndIn => {
                matches!(
                    SerialTermination::from_code(v),
                    Some(SerialTermination::None)
                        | Some(SerialTermination::LastBit)
                        | Some(SerialTermination::TerminationChar)
                )
            }
            ResourceAttribute::AsrlEndOut => SerialTermination::from_code(v).is_some(),
            _ => true,
        }
    }
}

impl ResourceAttribute {
    /// Every attribute in the catalogue
    pub const ALL: &'static [ResourceAttribute] = &[
        ResourceAttribute::ResourceName,
        ResourceAttribute::ResourceClass,
        ResourceAttribute::InterfaceType,
        ResourceAttribute::InterfaceNumber,
        ResourceAttribute::TimeoutValue,
        ResourceAttribute::TermChar,
        ResourceAttribute::TermCharEnabled,
        ResourceAttribute::SendEndEnabled,
        ResourceAttribute::SuppressEndEnabled,
        ResourceAttribute::AsrlBaud,
        ResourceAttribute::AsrlDataBits,
        ResourceAttribute::AsrlEndIn,
        ResourceAttribute::AsrlEndOut,
        ResourceAttribute::GpibPrimaryAddress,
        ResourceAttribute::GpibSecondaryAddress,
        ResourceAttribute::TcpipAddress,
        ResourceAttribute::TcpipDeviceName,
        ResourceAttribute::TcpipPort,
        ResourceAttribute::ManufacturerId,
        ResourceAttribute::ModelCode,
        ResourceAttribute::UsbSerialNumber,
        ResourceAttribute::UsbInterfaceNumber,
    ];

    /// VISA attribute id (`VI_ATTR_*`)
    pub fn id(&self) -> u32 {
        match self {
            ResourceAttribute::ResourceName => 0xBFFF_0002,
            ResourceAttribute::ResourceClass => 0xBFFF_0001,
            ResourceAttribute::InterfaceType => 0x3FFF_0171,
            ResourceAttribute::InterfaceNumber => 0x3FFF_0176,
            ResourceAttribute::TimeoutValue => 0x3FFF_001A,
            ResourceAttribute::TermChar => 0x3FFF_0018,
            ResourceAttribute::TermCharEnabled => 0x3FFF_0038,
            ResourceAttribute::SendEndEnabled => 0x3FFF_0016,
            ResourceAttribute::SuppressEndEnabled => 0x3FFF_0036,
            ResourceAttribute::AsrlBaud => 0x3FFF_0121,
            ResourceAttribute::AsrlDataBits => 0x3FFF_0122,
            ResourceAttribute::AsrlEndIn => 0x3FFF_00B3,
            ResourceAttribute::AsrlEndOut => 0x3FFF_00B4,
            ResourceAttribute::GpibPrimaryAddress => 0x3FFF_0172,
            ResourceAttribute::GpibSecondaryAddress => 0x3FFF_0173,
            ResourceAttribute::TcpipAddress => 0xBFFF_0195,
            ResourceAttribute::TcpipDeviceName => 0xBFFF_0199,
            ResourceAttribute::TcpipPort => 0x3FFF_0197,
            ResourceAttribute::ManufacturerId => 0x3FFF_00D9,
            ResourceAttribute::ModelCode => 0x3FFF_00DF,
            ResourceAttribute::UsbSerialNumber => 0xBFFF_01A0,
            ResourceAttribute::UsbInterfaceNumber => 0x3FFF_01A1,
        }
    }

    /// Look up an attribute by its VISA id
    pub fn from_id(id: u32) -> Option<Self> {
        Self::ALL.iter().copied().find(|a| a.id() == id)
    }

    /// Metadata for this attribute
    pub fn info(self) -> AttributeInfo {
        use AttrValue::{Bool, Int, Str};
        use InterfaceType::{Asrl, Gpib, Tcpip, Usb};

        let (name, writable, default, scope) = match self {
            ResourceAttribute::ResourceName => ("VI_ATTR_RSRC_NAME", false, Str(String::new()), Scope::All),
            ResourceAttribute::ResourceClass => ("VI_ATTR_RSRC_CLASS", false, Str(String::new()), Scope::All),
            ResourceAttribute::InterfaceType => ("VI_ATTR_INTF_TYPE", false, Int(0), Scope::All),
            ResourceAttribute::InterfaceNumber => ("VI_ATTR_INTF_NUM", false, Int(0), Scope::All),
            ResourceAttribute::TimeoutValue => ("VI_ATTR_TMO_VALUE", true, Int(2000), Scope::All),
            ResourceAttribute::TermChar => ("VI_ATTR_TERMCHAR", true, Int(0x0A), Scope::All),
            ResourceAttribute::TermCharEnabled => ("VI_ATTR_TERMCHAR_EN", true, Bool(false), Scope::All),
            ResourceAttribute::SendEndEnabled => ("VI_ATTR_SEND_END_EN", true, Bool(true), Scope::All),
            ResourceAttribute::SuppressEndEnabled => {
                ("VI_ATTR_SUPPRESS_END_EN", true, Bool(false), Scope::All)
            }
            ResourceAttribute::AsrlBaud => ("VI_ATTR_ASRL_BAUD", true, Int(9600), Scope::Interface(Asrl)),
            ResourceAttribute::AsrlDataBits => {
                ("VI_ATTR_ASRL_DATA_BITS", true, Int(8), Scope::Interface(Asrl))
            }
            ResourceAttribute::AsrlEndIn => (
                "VI_ATTR_ASRL_END_IN",
                true,
                Int(SerialTermination::TerminationChar.code()),
                Scope::Interface(Asrl),
            ),
            ResourceAttribute::AsrlEndOut => (
                "VI_ATTR_ASRL_END_OUT",
                true,
                Int(SerialTermination::None.code()),
                Scope::Interface(Asrl),
            ),
            ResourceAttribute::GpibPrimaryAddress => {
                ("VI_ATTR_GPIB_PRIMARY_ADDR", false, Int(0), Scope::Interface(Gpib))
            }
            ResourceAttribute::GpibSecondaryAddress => (
                "VI_ATTR_GPIB_SECONDARY_ADDR",
                false,
                Int(NO_SECONDARY_ADDRESS),
                Scope::Interface(Gpib),
            ),
            ResourceAttribute::TcpipAddress => {
                ("VI_ATTR_TCPIP_ADDR", false, Str(String::new()), Scope::Interface(Tcpip))
            }
            ResourceAttribute::TcpipDeviceName => (
                "VI_ATTR_TCPIP_DEVICE_NAME",
                false,
                Str(String::new()),
                Scope::Resource(Tcpip, ResourceClass::Instr),
            ),
            ResourceAttribute::TcpipPort => (
                "VI_ATTR_TCPIP_PORT",
                false,
                Int(0),
                Scope::Resource(Tcpip, ResourceClass::Socket),
            ),
            ResourceAttribute::ManufacturerId => ("VI_ATTR_MANF_ID", false, Int(0), Scope::Interface(Usb)),
            ResourceAttribute::ModelCode => ("VI_ATTR_MODEL_CODE", false, Int(0), Scope::Interface(Usb)),
            ResourceAttribute::UsbSerialNumber => {
                ("VI_ATTR_USB_SERIAL_NUM", false, Str(String::new()), Scope::Interface(Usb))
            }
            ResourceAttribute::UsbInterfaceNumber => {
                ("VI_ATTR_USB_INTFC_NUM", false, Int(0), Scope::Interface(Usb))
            }
        };

        AttributeInfo {
            attribute: self,
            name,
            readable: true,
            writable,
            default,
            scope,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_ids_are_unique() {
        for (i, a) in ResourceAttribute::ALL.iter().enumerate() {
            for b in &ResourceAttribute::ALL[i + 1..] {
                assert_ne!(a.id(), b.id(), "{:?} and {:?} share an id", a, b);
            }
            assert_eq!(ResourceAttribute::from_id(a.id()), Some(*a));
        }
        assert_eq!(ResourceAttribute::from_id(0xDEAD_BEEF), None);
    }

    #[test]
    fn test_applicability() {
        let data_bits = ResourceAttribute::AsrlDataBits.info();
        assert!(data_bits.applies_to(InterfaceType::Asrl, ResourceClass::Instr));
        assert!(!data_bits.applies_to(InterfaceType::Gpib, ResourceClass::Instr));

        let port = ResourceAttribute::TcpipPort.info();
        assert!(port.applies_to(InterfaceType::Tcpip, ResourceClass::Socket));
        assert!(!port.applies_to(InterfaceType::Tcpip, ResourceClass::Instr));

        let timeout = ResourceAttribute::TimeoutValue.info();
        assert!(timeout.applies_to(InterfaceType::Usb, ResourceClass::Raw));
    }

    #[test]
    fn test_accepts_checks_kind_and_range() {
        let data_bits = ResourceAttribute::AsrlDataBits.info();
        assert!(data_bits.accepts(&AttrValue::Int(7)));
        assert!(!data_bits.accepts(&AttrValue::Int(4)));
        assert!(!data_bits.accepts(&AttrValue::Int(9)));
        assert!(!data_bits.accepts(&AttrValue::Bool(true)));

        let end_in = ResourceAttribute::AsrlEndIn.info();
        assert!(end_in.accepts(&AttrValue::Int(SerialTermination::LastBit.code())));
        assert!(!end_in.accepts(&AttrValue::Int(SerialTermination::TerminationBreak.code())));

        let end_out = ResourceAttribute::AsrlEndOut.info();
        assert!(end_out.accepts(&AttrValue::Int(SerialTermination::TerminationBreak.code())));
        assert!(!end_out.accepts(&AttrValue::Int(42)));

        let term_en = ResourceAttribute::TermCharEnabled.info();
        assert!(term_en.accepts(&AttrValue::Bool(true)));
        assert!(!term_en.accepts(&AttrValue::Int(1)));
    }
}
