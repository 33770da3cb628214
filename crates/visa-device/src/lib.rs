//! Simulated Instrument Device Library
//!
//! This crate turns incoming instrument messages into responses the way a
//! real message-based instrument would. It includes:
//!
//! - **Device**: byte-level framing, the matching order and error fan-out
//! - **Component**: dialogues, getters and setters bound to typed properties
//! - **Channels**: per-channel command sets with pre-selected or inline selection
//! - **StatusRegister / ErrorQueue**: error reporting state read back by queries
//! - **Devices**: the registry of devices keyed by resource name
//!
//! # Example
//!
//! ```rust
//! use visa_device::{Device, Response};
//!
//! let mut device = Device::new("meter", ";");
//! device.add_dialogue("*IDN?", Response::data("ACME,METER,1234,1.0"));
//! device.bind("GPIB0::8::INSTR").unwrap();
//!
//! device.write(b"*IDN?\n");
//! let reply: Vec<u8> = std::iter::from_fn(|| device.read()).collect();
//! assert_eq!(reply, b"ACME,METER,1234,1.0\n");
//! ```

pub mod channels;
pub mod component;
pub mod definition;
pub mod device;
pub mod devices;
pub mod error;
pub mod pattern;
pub mod property;
pub mod registers;
pub mod template;
pub mod value;

pub use channels::Channels;
pub use component::{Component, Getter, MatchOutcome, Response, Setter};
pub use definition::{DeviceDefinition, SimulationDefinition};
pub use device::Device;
pub use devices::Devices;
pub use error::{ConfigError, DeviceError, ValidationError};
pub use property::{Property, Specs};
pub use registers::{ErrorQueue, StatusRegister};
pub use value::{PropertyType, Value};
