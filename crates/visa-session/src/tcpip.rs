//! TCPIP sessions: LAN instruments and raw sockets

use visa_protocol::{ResourceAttribute, ResourceName};

use crate::attrs::AttributeStore;
use crate::transport::Transport;

/// `TCPIP INSTR`
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpipInstr;

impl TcpipInstr {
    pub fn boxed() -> Box<dyn Transport> {
        Box::new(Self)
    }
}

impl Transport for TcpipInstr {
    fn name(&self) -> &'static str {
        "TCPIP INSTR"
    }

    fn after_parsing(&self, resource_name: &ResourceName, attrs: &mut AttributeStore) {
        if let ResourceName::TcpipInstr {
            host_address,
            lan_device_name,
            ..
        } = resource_name
        {
            attrs.set(ResourceAttribute::TcpipAddress, host_address.as_str());
            attrs.set(ResourceAttribute::TcpipDeviceName, lan_device_name.as_str());
        }
    }
}

/// `TCPIP SOCKET`
#[derive(Debug, Clone, Copy, Default)]
pub struct TcpipSocket;

impl TcpipSocket {
    pub fn boxed() -> Box<dyn Transport> {
        Box::new(Self)
    }
}

impl Transport for TcpipSocket {
    fn name(&self) -> &'static str {
        "TCPIP SOCKET"
    }

    fn after_parsing(&self, resource_name: &ResourceName, attrs: &mut AttributeStore) {
        if let ResourceName::TcpipSocket {
            host_address, port, ..
        } = resource_name
        {
            attrs.set(ResourceAttribute::TcpipAddress, host_address.as_str());
            attrs.set(ResourceAttribute::TcpipPort, i64::from(*port));
        }
    }
}
