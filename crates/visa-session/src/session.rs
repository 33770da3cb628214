//! Session framing over a simulated device
//!
//! A session borrows one device for its lifetime. Writes go through the
//! session's transport; reads poll the device one byte at a time until a
//! termination condition is met or the timeout expires.

use std::thread;
use std::time::{Duration, Instant};

use tracing::debug;
use visa_device::Device;
use visa_protocol::{AttrValue, InterfaceType, ResourceAttribute, ResourceClass, ResourceName, StatusCode};

use crate::attrs::AttributeStore;
use crate::transport::{ReadState, Transport};

/// Delay between polls while the device has nothing to send
pub const POLL_INTERVAL: Duration = Duration::from_millis(10);

/// An open session on a simulated device
pub struct Session<'d> {
    resource_name: ResourceName,
    attrs: AttributeStore,
    transport: Box<dyn Transport>,
    device: &'d mut Device,
}

impl<'d> Session<'d> {
    /// Open a session and seed its resource-derived attributes
    pub fn new(resource_name: ResourceName, transport: Box<dyn Transport>, device: &'d mut Device) -> Self {
        let mut attrs = AttributeStore::new();
        attrs.set(ResourceAttribute::ResourceName, resource_name.to_string());
        attrs.set(
            ResourceAttribute::ResourceClass,
            resource_name.resource_class().name(),
        );
        attrs.set(
            ResourceAttribute::InterfaceType,
            resource_name.interface_type().code(),
        );
        attrs.set(
            ResourceAttribute::InterfaceNumber,
            i64::from(resource_name.board()),
        );
        transport.after_parsing(&resource_name, &mut attrs);

        debug!(resource = %resource_name, transport = transport.name(), device = %device.name(), "session opened");
        Self {
            resource_name,
            attrs,
            transport,
            device,
        }
    }

    pub fn resource_name(&self) -> &ResourceName {
        &self.resource_name
    }

    pub fn interface_type(&self) -> InterfaceType {
        self.resource_name.interface_type()
    }

    pub fn resource_class(&self) -> ResourceClass {
        self.resource_name.resource_class()
    }

    /// Name of the transport driving this session
    pub fn transport_name(&self) -> &'static str {
        self.transport.name()
    }

    pub fn device(&self) -> &Device {
        &*self.device
    }

    /// Read timeout from `VI_ATTR_TMO_VALUE`
    pub fn timeout(&self) -> Duration {
        let ms = self.attrs.int(ResourceAttribute::TimeoutValue).max(0);
        Duration::from_millis(ms as u64)
    }

    fn lookup(&self, id: u32) -> Result<visa_protocol::AttributeInfo, StatusCode> {
        let info = ResourceAttribute::from_id(id)
            .map(ResourceAttribute::info)
            .ok_or(StatusCode::ErrorNonsupportedAttribute)?;
        if !info.applies_to(self.interface_type(), self.resource_class()) {
            return Err(StatusCode::ErrorNonsupportedAttribute);
        }
        Ok(info)
    }

    /// Read an attribute by VISA id
    pub fn get_attribute(&self, id: u32) -> Result<AttrValue, StatusCode> {
        let info = self.lookup(id)?;
        if !info.readable {
            return Err(StatusCode::ErrorNonsupportedOperation);
        }
        Ok(self.attrs.get(info.attribute))
    }

    /// Write an attribute by VISA id
    pub fn set_attribute(&mut self, id: u32, value: AttrValue) -> StatusCode {
        let info = match self.lookup(id) {
            Ok(info) => info,
            Err(status) => return status,
        };
        if !info.writable {
            return StatusCode::ErrorAttributeReadOnly;
        }
        if !info.accepts(&value) {
            debug!(attribute = info.name, %value, "attribute value rejected");
            return StatusCode::ErrorNonsupportedAttributeState;
        }
        self.attrs.set(info.attribute, value);
        StatusCode::Success
    }

    /// Typed form of [`get_attribute`](Self::get_attribute)
    pub fn get(&self, attribute: ResourceAttribute) -> Result<AttrValue, StatusCode> {
        self.get_attribute(attribute.id())
    }

    /// Typed form of [`set_attribute`](Self::set_attribute)
    pub fn set(&mut self, attribute: ResourceAttribute, value: impl Into<AttrValue>) -> StatusCode {
        self.set_attribute(attribute.id(), value.into())
    }

    /// Read up to `count` bytes
    ///
    /// Each received byte is checked, in order, against the termination
    /// character (when enabled), the byte count and the transport's end
    /// indicator (unless suppressed). The bytes gathered so far are returned
    /// with the status of whichever condition ended the read.
    pub fn read(&mut self, count: usize) -> (Vec<u8>, StatusCode) {
        let timeout = self.timeout();
        let term_char_enabled = self.attrs.flag(ResourceAttribute::TermCharEnabled);
        let term_char = self.attrs.term_char();
        let suppress_end = self.attrs.flag(ResourceAttribute::SuppressEndEnabled);

        let start = Instant::now();
        let mut out = Vec::new();
        let mut state = ReadState::Polling;

        while state == ReadState::Polling {
            let Some(byte) = self.device.read() else {
                if start.elapsed() > timeout {
                    state = ReadState::TimedOut;
                } else {
                    thread::sleep(POLL_INTERVAL);
                }
                continue;
            };
            out.push(byte);

            if term_char_enabled && byte == term_char {
                state = ReadState::TerminatedChar;
            } else if out.len() == count {
                state = ReadState::TerminatedCount;
            } else if !suppress_end {
                if let Some(end) = self.transport.end_indicator(byte, &self.attrs) {
                    state = end;
                }
            }
        }

        debug!(
            resource = %self.resource_name,
            ?state,
            len = out.len(),
            elapsed_ms = start.elapsed().as_millis() as u64,
            "read finished"
        );
        (out, state.status())
    }

    /// Write `data` through the transport
    pub fn write(&mut self, data: &[u8]) -> (usize, StatusCode) {
        let (written, status) = self.transport.write(data, &self.attrs, self.device);
        debug!(resource = %self.resource_name, written, %status, "write finished");
        (written, status)
    }
}

impl std::fmt::Debug for Session<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Session")
            .field("resource_name", &self.resource_name.to_string())
            .field("transport", &self.transport.name())
            .field("device", &self.device.name())
            .finish()
    }
}
