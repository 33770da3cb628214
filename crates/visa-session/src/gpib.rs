//! GPIB instrument sessions

use visa_protocol::attributes::NO_SECONDARY_ADDRESS;
use visa_protocol::{ResourceAttribute, ResourceName};

use crate::attrs::AttributeStore;
use crate::transport::Transport;

/// `GPIB INSTR`: plain byte relay, EOI is not modelled
#[derive(Debug, Clone, Copy, Default)]
pub struct GpibInstr;

impl GpibInstr {
    pub fn boxed() -> Box<dyn Transport> {
        Box::new(Self)
    }
}

impl Transport for GpibInstr {
    fn name(&self) -> &'static str {
        "GPIB INSTR"
    }

    fn after_parsing(&self, resource_name: &ResourceName, attrs: &mut AttributeStore) {
        if let ResourceName::GpibInstr {
            primary_address,
            secondary_address,
            ..
        } = resource_name
        {
            attrs.set(ResourceAttribute::GpibPrimaryAddress, i64::from(*primary_address));
            attrs.set(
                ResourceAttribute::GpibSecondaryAddress,
                secondary_address.map(i64::from).unwrap_or(NO_SECONDARY_ADDRESS),
            );
        }
    }
}
