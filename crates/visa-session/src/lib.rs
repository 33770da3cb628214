//! Simulated Instrument Session Library
//!
//! This crate frames traffic between a caller and a simulated device the way
//! a VISA session would on real hardware:
//!
//! - **Session**: attribute access with permission checks, timeout-bounded
//!   polling reads and transport-specific writes
//! - **Transports**: GPIB, serial (with data-bit shaping and end modes),
//!   TCPIP (instrument and socket) and USB (instrument and raw)
//! - **SessionRegistry**: resolves a resource's interface type and class to
//!   the transport that serves it
//!
//! # Example
//!
//! ```rust
//! use visa_device::{Device, Response};
//! use visa_protocol::{ResourceAttribute, StatusCode};
//! use visa_session::SessionRegistry;
//!
//! let mut device = Device::new("meter", ";");
//! device.add_dialogue("*IDN?", Response::data("SIM,METER"));
//! device.bind("GPIB0::8::INSTR").unwrap();
//!
//! let registry = SessionRegistry::new();
//! let mut session = registry.open_device("GPIB0::8::INSTR", &mut device).unwrap();
//! session.set(ResourceAttribute::TermCharEnabled, true);
//!
//! session.write(b"*IDN?\n");
//! let (reply, status) = session.read(256);
//! assert_eq!(reply, b"SIM,METER\n");
//! assert_eq!(status, StatusCode::SuccessTerminationCharacterRead);
//! ```

pub mod attrs;
pub mod error;
pub mod gpib;
pub mod registry;
pub mod serial;
pub mod session;
pub mod tcpip;
pub mod transport;
pub mod usb;

pub use attrs::AttributeStore;
pub use error::SessionError;
pub use gpib::GpibInstr;
pub use registry::SessionRegistry;
pub use serial::SerialInstr;
pub use session::{Session, POLL_INTERVAL};
pub use tcpip::{TcpipInstr, TcpipSocket};
pub use transport::{ReadState, Transport, TransportFactory};
pub use usb::{UsbInstr, UsbRaw};
