//! Resource name parsing
//!
//! Resource strings are `::`-separated. The first segment carries the
//! interface prefix and an optional board number, the last segment carries
//! the resource class:
//!
//! - `ASRL<board>::INSTR`
//! - `GPIB<board>::<primary>[::<secondary>]::INSTR`
//! - `TCPIP<board>::<host>[::<lan device>]::INSTR`
//! - `TCPIP<board>::<host>::<port>::SOCKET`
//! - `USB<board>::<manufacturer>::<model>::<serial>[::<interface>]::INSTR|RAW`
//!
//! Parsing is case-insensitive on prefix and class; [`ResourceName`]'s
//! `Display` produces the canonical upper-case form with explicit board.

use std::fmt;
use std::str::FromStr;

use crate::error::ResourceNameError;
use crate::{InterfaceType, ResourceClass};

/// Default LAN device name for TCPIP instruments
pub const DEFAULT_LAN_DEVICE: &str = "inst0";

/// A parsed resource name
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum ResourceName {
    /// Serial instrument
    AsrlInstr { board: u16 },
    /// GPIB instrument
    GpibInstr {
        board: u16,
        primary_address: u16,
        secondary_address: Option<u16>,
    },
    /// VXI-11/HiSLIP style LAN instrument
    TcpipInstr {
        board: u16,
        host_address: String,
        lan_device_name: String,
    },
    /// Raw TCP socket
    TcpipSocket {
        board: u16,
        host_address: String,
        port: u16,
    },
    /// USBTMC instrument
    UsbInstr(UsbAddress),
    /// Raw USB device
    UsbRaw(UsbAddress),
}

/// Address fields shared by USB resources
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct UsbAddress {
    pub board: u16,
    pub manufacturer_id: String,
    pub model_code: String,
    pub serial_number: String,
    pub interface_number: Option<u16>,
}

impl ResourceName {
    /// Interface the resource lives on
    pub fn interface_type(&self) -> InterfaceType {
        match self {
            ResourceName::AsrlInstr { .. } => InterfaceType::Asrl,
            ResourceName::GpibInstr { .. } => InterfaceType::Gpib,
            ResourceName::TcpipInstr { .. } | ResourceName::TcpipSocket { .. } => {
                InterfaceType::Tcpip
            }
            ResourceName::UsbInstr(_) | ResourceName::UsbRaw(_) => InterfaceType::Usb,
        }
    }

    /// Class of the resource
    pub fn resource_class(&self) -> ResourceClass {
        match self {
            ResourceName::TcpipSocket { .. } => ResourceClass::Socket,
            ResourceName::UsbRaw(_) => ResourceClass::Raw,
            _ => ResourceClass::Instr,
        }
    }

    /// Board (interface) number
    pub fn board(&self) -> u16 {
        match self {
            ResourceName::AsrlInstr { board }
            | ResourceName::GpibInstr { board, .. }
            | ResourceName::TcpipInstr { board, .. }
            | ResourceName::TcpipSocket { board, .. } => *board,
            ResourceName::UsbInstr(usb) | ResourceName::UsbRaw(usb) => usb.board,
        }
    }

    fn parse_usb(board: u16, fields: &[&str], raw: &str) -> Result<UsbAddress, ResourceNameError> {
        let interface_number = match fields.len() {
            3 => None,
            4 => Some(parse_number("USB interface number", fields[3])?),
            _ => return Err(ResourceNameError::Malformed(raw.to_string())),
        };
        Ok(UsbAddress {
            board,
            manufacturer_id: fields[0].to_string(),
            model_code: fields[1].to_string(),
            serial_number: fields[2].to_string(),
            interface_number,
        })
    }
}

impl FromStr for ResourceName {
    type Err = ResourceNameError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let parts: Vec<&str> = s.trim().split("::").collect();
        if parts.len() < 2 || parts.iter().any(|p| p.is_empty()) {
            return Err(ResourceNameError::Malformed(s.to_string()));
        }

        let head = parts[0];
        let split = head
            .find(|c: char| c.is_ascii_digit())
            .unwrap_or(head.len());
        let interface: InterfaceType = head[..split].parse()?;
        let board = if split == head.len() {
            0
        } else {
            parse_number("board", &head[split..])?
        };

        let class: ResourceClass = parts[parts.len() - 1].parse()?;
        let fields = &parts[1..parts.len() - 1];

        let unsupported = || ResourceNameError::UnsupportedClass {
            interface: interface.to_string(),
            class: class.to_string(),
        };

        match (interface, class) {
            (InterfaceType::Asrl, ResourceClass::Instr) => {
                if !fields.is_empty() {
                    return Err(ResourceNameError::Malformed(s.to_string()));
                }
                Ok(ResourceName::AsrlInstr { board })
            }
            (InterfaceType::Gpib, ResourceClass::Instr) => {
                let (primary, secondary) = match fields {
                    [p] => (p, None),
                    [p, sec] => (p, Some(parse_number("secondary address", sec)?)),
                    _ => return Err(ResourceNameError::Malformed(s.to_string())),
                };
                Ok(ResourceName::GpibInstr {
                    board,
                    primary_address: parse_number("primary address", primary)?,
                    secondary_address: secondary,
                })
            }
            (InterfaceType::Tcpip, ResourceClass::Instr) => match fields {
                [host] => Ok(ResourceName::TcpipInstr {
                    board,
                    host_address: host.to_string(),
                    lan_device_name: DEFAULT_LAN_DEVICE.to_string(),
                }),
                [host, device] => Ok(ResourceName::TcpipInstr {
                    board,
                    host_address: host.to_string(),
                    lan_device_name: device.to_string(),
                }),
                _ => Err(ResourceNameError::Malformed(s.to_string())),
            },
            (InterfaceType::Tcpip, ResourceClass::Socket) => match fields {
                [host, port] => Ok(ResourceName::TcpipSocket {
                    board,
                    host_address: host.to_string(),
                    port: parse_number("port", port)?,
                }),
                _ => Err(ResourceNameError::Malformed(s.to_string())),
            },
            (InterfaceType::Usb, ResourceClass::Instr) => {
                Ok(ResourceName::UsbInstr(Self::parse_usb(board, fields, s)?))
            }
            (InterfaceType::Usb, ResourceClass::Raw) => {
                Ok(ResourceName::UsbRaw(Self::parse_usb(board, fields, s)?))
            }
            _ => Err(unsupported()),
        }
    }
}

impl fmt::Display for ResourceName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ResourceName::AsrlInstr { board } => write!(f, "ASRL{}::INSTR", board),
            ResourceName::GpibInstr {
                board,
                primary_address,
                secondary_address,
            } => {
                write!(f, "GPIB{}::{}", board, primary_address)?;
                if let Some(sec) = secondary_address {
                    write!(f, "::{}", sec)?;
                }
                f.write_str("::INSTR")
            }
            ResourceName::TcpipInstr {
                board,
                host_address,
                lan_device_name,
            } => write!(f, "TCPIP{}::{}::{}::INSTR", board, host_address, lan_device_name),
            ResourceName::TcpipSocket {
                board,
                host_address,
                port,
            } => write!(f, "TCPIP{}::{}::{}::SOCKET", board, host_address, port),
            ResourceName::UsbInstr(usb) | ResourceName::UsbRaw(usb) => {
                write!(
                    f,
                    "USB{}::{}::{}::{}",
                    usb.board, usb.manufacturer_id, usb.model_code, usb.serial_number
                )?;
                if let Some(intf) = usb.interface_number {
                    write!(f, "::{}", intf)?;
                }
                write!(f, "::{}", self.resource_class())
            }
        }
    }
}

fn parse_number(field: &'static str, value: &str) -> Result<u16, ResourceNameError> {
    value
        .parse::<u16>()
        .map_err(|_| ResourceNameError::InvalidNumber {
            field,
            value: value.to_string(),
        })
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_asrl() {
        let name: ResourceName = "ASRL1::INSTR".parse().unwrap();
        assert_eq!(name, ResourceName::AsrlInstr { board: 1 });
        assert_eq!(name.interface_type(), InterfaceType::Asrl);
        assert_eq!(name.to_string(), "ASRL1::INSTR");
    }

    #[test]
    fn test_parse_gpib_with_secondary() {
        let name: ResourceName = "GPIB0::8::3::INSTR".parse().unwrap();
        assert_eq!(
            name,
            ResourceName::GpibInstr {
                board: 0,
                primary_address: 8,
                secondary_address: Some(3),
            }
        );
        assert_eq!(name.to_string(), "GPIB0::8::3::INSTR");
    }

    #[test]
    fn test_board_defaults_to_zero() {
        let name: ResourceName = "gpib::9::instr".parse().unwrap();
        assert_eq!(name.board(), 0);
        assert_eq!(name.to_string(), "GPIB0::9::INSTR");
    }

    #[test]
    fn test_parse_tcpip_instr_default_device() {
        let name: ResourceName = "TCPIP0::localhost:2222::INSTR".parse().unwrap();
        assert_eq!(name.to_string(), "TCPIP0::localhost:2222::inst0::INSTR");
        assert_eq!(name.resource_class(), ResourceClass::Instr);
    }

    #[test]
    fn test_parse_tcpip_socket() {
        let name: ResourceName = "TCPIP0::localhost::10001::SOCKET".parse().unwrap();
        assert_eq!(
            name,
            ResourceName::TcpipSocket {
                board: 0,
                host_address: "localhost".into(),
                port: 10001,
            }
        );
        assert_eq!(name.resource_class(), ResourceClass::Socket);
    }

    #[test]
    fn test_parse_usb() {
        let name: ResourceName = "USB0::0x1111::0x2222::0x4445::0::RAW".parse().unwrap();
        match &name {
            ResourceName::UsbRaw(usb) => {
                assert_eq!(usb.manufacturer_id, "0x1111");
                assert_eq!(usb.model_code, "0x2222");
                assert_eq!(usb.serial_number, "0x4445");
                assert_eq!(usb.interface_number, Some(0));
            }
            other => panic!("unexpected resource {:?}", other),
        }
        assert_eq!(name.to_string(), "USB0::0x1111::0x2222::0x4445::0::RAW");

        let name: ResourceName = "USB0::0x1111::0x2222::0x1234::INSTR".parse().unwrap();
        assert_eq!(name.to_string(), "USB0::0x1111::0x2222::0x1234::INSTR");
    }

    #[test]
    fn test_rejects_malformed() {
        assert!("".parse::<ResourceName>().is_err());
        assert!("GPIB0::INSTR".parse::<ResourceName>().is_err());
        assert!("GPIB0::x::INSTR".parse::<ResourceName>().is_err());
        assert!("ASRL1::2::INSTR".parse::<ResourceName>().is_err());
        assert!("FOO0::INSTR".parse::<ResourceName>().is_err());
        assert!(matches!(
            "ASRL1::SOCKET".parse::<ResourceName>(),
            Err(ResourceNameError::UnsupportedClass { .. })
        ));
    }
}
