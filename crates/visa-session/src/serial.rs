//! Serial instrument sessions
//!
//! Outgoing bytes are masked to the configured data width. How the end of a
//! message is marked depends on `VI_ATTR_ASRL_END_OUT` for writes and
//! `VI_ATTR_ASRL_END_IN` for reads:
//!
//! - `none`: writes are masked only; reads never end on their own
//! - `last_bit`: the top data bit of the last written byte carries send end;
//!   reads end on a byte with that bit set
//! - `termination_char`: the termination character is appended on send end;
//!   reads end on the termination character
//! - `termination_break`: write only, the break itself is not modelled

use tracing::{trace, warn};
use visa_device::Device;
use visa_protocol::serial::last_bit_mask;
use visa_protocol::{shape_bytes, ResourceAttribute, ResourceName, SerialTermination, StatusCode};

use crate::attrs::AttributeStore;
use crate::transport::{ReadState, Transport};

/// `ASRL INSTR`
#[derive(Debug, Clone, Copy, Default)]
pub struct SerialInstr;

impl SerialInstr {
    pub fn boxed() -> Box<dyn Transport> {
        Box::new(Self)
    }
}

fn data_bits(attrs: &AttributeStore) -> u8 {
    u8::try_from(attrs.int(ResourceAttribute::AsrlDataBits)).unwrap_or(8)
}

fn termination(attrs: &AttributeStore, attribute: ResourceAttribute) -> Option<SerialTermination> {
    SerialTermination::from_code(attrs.int(attribute))
}

impl Transport for SerialInstr {
    fn name(&self) -> &'static str {
        "ASRL INSTR"
    }

    fn after_parsing(&self, _resource_name: &ResourceName, _attrs: &mut AttributeStore) {}

    fn write(&self, data: &[u8], attrs: &AttributeStore, device: &mut Device) -> (usize, StatusCode) {
        let bits = data_bits(attrs);
        let send_end = attrs.flag(ResourceAttribute::SendEndEnabled);
        let end_out = termination(attrs, ResourceAttribute::AsrlEndOut);

        let forced = match end_out {
            Some(SerialTermination::LastBit) => Some(send_end),
            _ => None,
        };
        let mut shaped = match shape_bytes(data, Some(bits), forced) {
            Ok(shaped) => shaped,
            Err(e) => {
                warn!(error = %e, "serial write rejected");
                return (0, StatusCode::ErrorNonsupportedAttributeState);
            }
        };
        if end_out == Some(SerialTermination::TerminationChar) && send_end {
            shaped.push(attrs.term_char());
        }

        trace!(?end_out, send_end, bits, len = shaped.len(), "serial write");
        device.write(&shaped);
        (shaped.len(), StatusCode::Success)
    }

    fn end_indicator(&self, byte: u8, attrs: &AttributeStore) -> Option<ReadState> {
        match termination(attrs, ResourceAttribute::AsrlEndIn)? {
            SerialTermination::LastBit if byte & last_bit_mask(data_bits(attrs)) != 0 => {
                Some(ReadState::TerminatedEom)
            }
            SerialTermination::TerminationChar if byte == attrs.term_char() => {
                Some(ReadState::TerminatedChar)
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn attrs(end_in: SerialTermination, bits: i64) -> AttributeStore {
        let mut attrs = AttributeStore::new();
        attrs.set(ResourceAttribute::AsrlEndIn, end_in.code());
        attrs.set(ResourceAttribute::AsrlDataBits, bits);
        attrs
    }

    #[test]
    fn test_end_in_none_never_ends() {
        let attrs = attrs(SerialTermination::None, 8);
        assert_eq!(SerialInstr.end_indicator(b'\n', &attrs), None);
        assert_eq!(SerialInstr.end_indicator(0xFF, &attrs), None);
    }

    #[test]
    fn test_end_in_last_bit() {
        let attrs = attrs(SerialTermination::LastBit, 7);
        assert_eq!(SerialInstr.end_indicator(0x3F, &attrs), None);
        assert_eq!(
            SerialInstr.end_indicator(0x40, &attrs),
            Some(ReadState::TerminatedEom)
        );
    }

    #[test]
    fn test_end_in_termination_char() {
        let attrs = attrs(SerialTermination::TerminationChar, 8);
        assert_eq!(
            SerialInstr.end_indicator(b'\n', &attrs),
            Some(ReadState::TerminatedChar)
        );
        assert_eq!(SerialInstr.end_indicator(b'\r', &attrs), None);
    }

    #[test]
    fn test_write_masks_to_data_bits() {
        let mut device = Device::new("sink", "");
        device.add_dialogue("A", visa_device::Response::data("masked"));
        let attrs = attrs(SerialTermination::None, 7);
        assert_eq!(SerialInstr.write(&[0xC1, 0x8A], &attrs, &mut device), (2, StatusCode::Success));
        let reply: Vec<u8> = std::iter::from_fn(|| device.read()).collect();
        assert_eq!(reply, b"masked\n");
    }

    #[test]
    fn test_write_appends_term_char() {
        let mut device = Device::new("sink", "");
        let mut attrs = attrs(SerialTermination::None, 8);
        attrs.set(ResourceAttribute::AsrlEndOut, SerialTermination::TerminationChar.code());
        assert_eq!(SerialInstr.write(b"AB", &attrs, &mut device), (3, StatusCode::Success));

        attrs.set(ResourceAttribute::SendEndEnabled, false);
        assert_eq!(SerialInstr.write(b"AB", &attrs, &mut device), (2, StatusCode::Success));
    }
}
