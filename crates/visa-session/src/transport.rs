//! Transport seam between a session and its device
//!
//! A transport decides how a resource name seeds session attributes, how
//! outgoing bytes reach the device, and whether an incoming byte ends a
//! message on its own. The read loop and attribute checks are shared by all
//! transports and live in [`Session`](crate::Session).

use tracing::trace;
use visa_device::Device;
use visa_protocol::{ResourceAttribute, ResourceName, StatusCode};

use crate::attrs::AttributeStore;

/// Terminal and non-terminal states of a session read
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReadState {
    /// Still waiting for a termination condition
    Polling,
    /// Termination character received
    TerminatedChar,
    /// Requested byte count reached
    TerminatedCount,
    /// Transport end-of-message indicator seen
    TerminatedEom,
    /// Timeout expired
    TimedOut,
}

impl ReadState {
    /// Status reported for a read that ended in this state
    pub fn status(&self) -> StatusCode {
        match self {
            ReadState::Polling | ReadState::TerminatedEom => StatusCode::Success,
            ReadState::TerminatedChar => StatusCode::SuccessTerminationCharacterRead,
            ReadState::TerminatedCount => StatusCode::SuccessMaxCountRead,
            ReadState::TimedOut => StatusCode::ErrorTimeout,
        }
    }
}

/// Interface-specific framing behaviour
pub trait Transport: Send + Sync {
    /// Short name for logs
    fn name(&self) -> &'static str;

    /// Seed attributes derived from the parsed resource name
    fn after_parsing(&self, resource_name: &ResourceName, attrs: &mut AttributeStore);

    /// Hand `data` to the device, returning the number of bytes transferred
    ///
    /// The default relays bytes unchanged; the send-end flag is only traced.
    fn write(&self, data: &[u8], attrs: &AttributeStore, device: &mut Device) -> (usize, StatusCode) {
        device.write(data);
        trace!(
            transport = self.name(),
            send_end = attrs.flag(ResourceAttribute::SendEndEnabled),
            len = data.len(),
            "relayed bytes"
        );
        (data.len(), StatusCode::Success)
    }

    /// Terminal state signalled by the transport for the latest byte, if any
    fn end_indicator(&self, _byte: u8, _attrs: &AttributeStore) -> Option<ReadState> {
        None
    }
}

/// Constructor stored in the session registry
pub type TransportFactory = fn() -> Box<dyn Transport>;
