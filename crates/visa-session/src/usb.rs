//! USB sessions: USBTMC instruments and raw devices

use tracing::warn;
use visa_protocol::resource::UsbAddress;
use visa_protocol::{ResourceAttribute, ResourceName};

use crate::attrs::AttributeStore;
use crate::transport::Transport;

/// `USB INSTR`
#[derive(Debug, Clone, Copy, Default)]
pub struct UsbInstr;

impl UsbInstr {
    pub fn boxed() -> Box<dyn Transport> {
        Box::new(Self)
    }
}

impl Transport for UsbInstr {
    fn name(&self) -> &'static str {
        "USB INSTR"
    }

    fn after_parsing(&self, resource_name: &ResourceName, attrs: &mut AttributeStore) {
        if let ResourceName::UsbInstr(address) = resource_name {
            seed_usb(address, attrs);
        }
    }
}

/// `USB RAW`
#[derive(Debug, Clone, Copy, Default)]
pub struct UsbRaw;

impl UsbRaw {
    pub fn boxed() -> Box<dyn Transport> {
        Box::new(Self)
    }
}

impl Transport for UsbRaw {
    fn name(&self) -> &'static str {
        "USB RAW"
    }

    fn after_parsing(&self, resource_name: &ResourceName, attrs: &mut AttributeStore) {
        if let ResourceName::UsbRaw(address) = resource_name {
            seed_usb(address, attrs);
        }
    }
}

fn seed_usb(address: &UsbAddress, attrs: &mut AttributeStore) {
    for (attribute, field) in [
        (ResourceAttribute::ManufacturerId, &address.manufacturer_id),
        (ResourceAttribute::ModelCode, &address.model_code),
    ] {
        match parse_id(field) {
            Some(id) => attrs.set(attribute, id),
            None => warn!(value = %field, ?attribute, "USB id is not a number"),
        }
    }
    attrs.set(ResourceAttribute::UsbSerialNumber, address.serial_number.as_str());
    attrs.set(
        ResourceAttribute::UsbInterfaceNumber,
        i64::from(address.interface_number.unwrap_or(0)),
    );
}

/// Parse a `0x`-prefixed hex or plain decimal id
fn parse_id(text: &str) -> Option<i64> {
    match text.strip_prefix("0x").or_else(|| text.strip_prefix("0X")) {
        Some(hex) => i64::from_str_radix(hex, 16).ok(),
        None => text.parse().ok(),
    }
}
