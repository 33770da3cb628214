//! Transport registry keyed by interface type and resource class

use std::collections::HashMap;

use tracing::{debug, warn};
use visa_device::{Device, Devices};
use visa_protocol::{InterfaceType, ResourceClass, ResourceName};

use crate::error::SessionError;
use crate::gpib::GpibInstr;
use crate::serial::SerialInstr;
use crate::session::Session;
use crate::tcpip::{TcpipInstr, TcpipSocket};
use crate::transport::TransportFactory;
use crate::usb::{UsbInstr, UsbRaw};

/// Maps (interface type, resource class) to the transport that serves it
#[derive(Debug, Clone)]
pub struct SessionRegistry {
    factories: HashMap<(InterfaceType, ResourceClass), TransportFactory>,
}

impl Default for SessionRegistry {
    fn default() -> Self {
        let mut registry = Self::empty();
        registry.register(InterfaceType::Gpib, ResourceClass::Instr, GpibInstr::boxed);
        registry.register(InterfaceType::Asrl, ResourceClass::Instr, SerialInstr::boxed);
        registry.register(InterfaceType::Tcpip, ResourceClass::Instr, TcpipInstr::boxed);
        registry.register(InterfaceType::Tcpip, ResourceClass::Socket, TcpipSocket::boxed);
        registry.register(InterfaceType::Usb, ResourceClass::Instr, UsbInstr::boxed);
        registry.register(InterfaceType::Usb, ResourceClass::Raw, UsbRaw::boxed);
        registry
    }
}

impl SessionRegistry {
    /// Registry with the built-in GPIB, serial, TCPIP and USB transports
    pub fn new() -> Self {
        Self::default()
    }

    /// Registry with nothing registered
    pub fn empty() -> Self {
        Self {
            factories: HashMap::new(),
        }
    }

    /// Register a transport, replacing any previous one for the same key
    pub fn register(
        &mut self,
        interface_type: InterfaceType,
        resource_class: ResourceClass,
        factory: TransportFactory,
    ) {
        if self
            .factories
            .insert((interface_type, resource_class), factory)
            .is_some()
        {
            warn!(
                interface = %interface_type,
                class = %resource_class,
                "overwriting registered session class"
            );
        }
    }

    /// Transport constructor for a key
    pub fn get_session_class(
        &self,
        interface_type: InterfaceType,
        resource_class: ResourceClass,
    ) -> Result<TransportFactory, SessionError> {
        self.factories
            .get(&(interface_type, resource_class))
            .copied()
            .ok_or(SessionError::NoSessionClass {
                interface: interface_type,
                class: resource_class,
            })
    }

    /// Open a session on a device of its own
    pub fn open_device<'d>(
        &self,
        resource_name: &str,
        device: &'d mut Device,
    ) -> Result<Session<'d>, SessionError> {
        let parsed: ResourceName = resource_name.parse()?;
        let factory = self.get_session_class(parsed.interface_type(), parsed.resource_class())?;
        Ok(Session::new(parsed, factory(), device))
    }

    /// Open a session on the device registered under `resource_name`
    pub fn open<'d>(
        &self,
        devices: &'d mut Devices,
        resource_name: &str,
    ) -> Result<Session<'d>, SessionError> {
        let parsed: ResourceName = resource_name.parse()?;
        let canonical = parsed.to_string();
        let factory = self.get_session_class(parsed.interface_type(), parsed.resource_class())?;
        let device = devices
            .get_mut(&canonical)
            .ok_or_else(|| SessionError::UnknownResource(canonical.clone()))?;
        debug!(resource = %canonical, "opening session");
        Ok(Session::new(parsed, factory(), device))
    }

    /// Registered keys, sorted
    pub fn keys(&self) -> Vec<(InterfaceType, ResourceClass)> {
        let mut keys: Vec<_> = self.factories.keys().copied().collect();
        keys.sort();
        keys
    }
}
