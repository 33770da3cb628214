//! Simulated device
//!
//! A device receives bytes one at a time. Once the input ends with the query
//! end-of-message sequence the buffered message is split on the delimiter
//! and each part is matched in a fixed order:
//!
//! 1. dialogues
//! 2. getters
//! 3. status register queries
//! 4. error queue queries
//! 5. setters
//! 6. channel groups, in the order they were added
//!
//! Unmatched parts raise `command_error`. Responses are queued, each followed
//! by the response end-of-message, and read back one byte at a time.

use std::collections::{HashMap, VecDeque};

use tracing::{debug, warn};
use visa_protocol::{parse_type_class, InterfaceType, ResourceClass, ResourceName};

use crate::channels::{Channels, SELECTED_CHANNEL};
use crate::component::{Component, Getter, MatchOutcome, Response, Setter};
use crate::error::{ConfigError, DeviceError};
use crate::property::Property;
use crate::registers::{ErrorHandler, COMMAND_ERROR};
use crate::value::Value;

const LF: &[u8] = b"\n";

/// A simulated instrument
#[derive(Debug, Clone)]
pub struct Device {
    name: String,
    /// Splits one message into several queries; empty disables splitting
    delimiter: Vec<u8>,
    resource_name: Option<ResourceName>,
    eoms: HashMap<(InterfaceType, ResourceClass), (Vec<u8>, Vec<u8>)>,
    query_eom: Vec<u8>,
    response_eom: Vec<u8>,
    component: Component,
    channels: Vec<Channels>,
    errors: ErrorHandler,
    input: Vec<u8>,
    output: VecDeque<u8>,
}

impl Device {
    /// Create an unbound device; until bound it uses LF for both EOMs
    pub fn new(name: impl Into<String>, delimiter: impl Into<Vec<u8>>) -> Self {
        Self {
            name: name.into(),
            delimiter: delimiter.into(),
            resource_name: None,
            eoms: HashMap::new(),
            query_eom: LF.to_vec(),
            response_eom: LF.to_vec(),
            component: Component::new(),
            channels: Vec::new(),
            errors: ErrorHandler::default(),
            input: Vec::new(),
            output: VecDeque::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Resource the device is bound to
    pub fn resource_name(&self) -> Option<&ResourceName> {
        self.resource_name.as_ref()
    }

    pub fn query_eom(&self) -> &[u8] {
        &self.query_eom
    }

    pub fn response_eom(&self) -> &[u8] {
        &self.response_eom
    }

    /// Bind the device to a resource and pick the matching EOM pair
    ///
    /// A device can be bound only once. Without an EOM pair for the
    /// resource's interface type and class, LF is used both ways.
    pub fn bind(&mut self, resource_name: &str) -> Result<(), DeviceError> {
        if let Some(bound) = &self.resource_name {
            return Err(DeviceError::AlreadyBound {
                device: self.name.clone(),
                resource: bound.to_string(),
            });
        }
        let parsed: ResourceName = resource_name.parse()?;
        let key = (parsed.interface_type(), parsed.resource_class());
        match self.eoms.get(&key) {
            Some((query, response)) => {
                self.query_eom = query.clone();
                self.response_eom = response.clone();
            }
            None => {
                warn!(
                    device = %self.name,
                    interface = %key.0,
                    class = %key.1,
                    "no EOM provided, using LF"
                );
                self.query_eom = LF.to_vec();
                self.response_eom = LF.to_vec();
            }
        }
        debug!(device = %self.name, resource = %parsed, "device bound");
        self.resource_name = Some(parsed);
        Ok(())
    }

    /// Set the EOM pair for `"INTERFACE CLASS"`, e.g. `"ASRL INSTR"`
    pub fn add_eom(
        &mut self,
        type_class: &str,
        query: impl Into<Vec<u8>>,
        response: impl Into<Vec<u8>>,
    ) -> Result<(), ConfigError> {
        let key = parse_type_class(type_class).map_err(|source| ConfigError::InvalidEomKey {
            key: type_class.to_string(),
            source,
        })?;
        self.eoms.insert(key, (query.into(), response.into()));
        Ok(())
    }

    pub fn add_dialogue(&mut self, query: impl Into<Vec<u8>>, response: Response) {
        self.component.add_dialogue(query, response);
    }

    pub fn add_property(
        &mut self,
        property: Property,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Result<(), ConfigError> {
        self.component.add_property(property, getter, setter)
    }

    /// Add a channel group
    ///
    /// Pre-selected groups need a `selected_channel` property on the device.
    pub fn add_channels(&mut self, channels: Channels) -> Result<(), ConfigError> {
        if !channels.can_select() && self.component.property(SELECTED_CHANNEL).is_none() {
            return Err(ConfigError::MissingSelectedChannel(channels.name().to_string()));
        }
        self.channels.push(channels);
        Ok(())
    }

    pub fn set_error_handler(&mut self, errors: ErrorHandler) {
        self.errors = errors;
    }

    pub fn errors(&self) -> &ErrorHandler {
        &self.errors
    }

    pub fn channels(&self, name: &str) -> Option<&Channels> {
        self.channels.iter().find(|c| c.name() == name)
    }

    /// Current value of a device-level property
    pub fn property_value(&self, name: &str) -> Option<&Value> {
        self.component.property(name).map(|p| p.get_value(None))
    }

    /// Raise an error key and return its configured response
    ///
    /// Every status register and error queue that knows `key` is updated,
    /// whether or not a response text exists.
    pub fn error_response(&mut self, key: &str) -> Option<Response> {
        self.errors.error_response(key)
    }

    /// Feed bytes into the input buffer, processing each complete message
    pub fn write(&mut self, data: &[u8]) {
        for &byte in data {
            self.write_byte(byte);
        }
    }

    /// Feed a single byte into the input buffer
    pub fn write_byte(&mut self, byte: u8) {
        self.input.push(byte);
        if !self.input.ends_with(&self.query_eom) {
            return;
        }

        let mut message = std::mem::take(&mut self.input);
        debug!(device = %self.name, input = ?String::from_utf8_lossy(&message), "input buffer");
        message.truncate(message.len() - self.query_eom.len());

        let queries: Vec<Vec<u8>> = if self.delimiter.is_empty() {
            vec![message]
        } else {
            split_on(&message, &self.delimiter)
        };

        for query in queries {
            let response = match self.match_query(&query) {
                MatchOutcome::Respond(response) => Some(response),
                MatchOutcome::Rejected | MatchOutcome::NoMatch => self.error_response(COMMAND_ERROR),
            };
            if let Some(Response::Data(bytes)) = response {
                self.output.extend(bytes);
                self.output.extend(self.response_eom.iter().copied());
            }
        }
    }

    /// Pop one byte from the output buffer
    pub fn read(&mut self) -> Option<u8> {
        self.output.pop_front()
    }

    /// Bytes waiting in the output buffer
    pub fn pending(&self) -> usize {
        self.output.len()
    }

    /// Run one query through the matching order without error fallback
    pub fn match_query(&mut self, query: &[u8]) -> MatchOutcome {
        if let Some(response) = self.component.match_dialogue(query) {
            return MatchOutcome::Respond(response);
        }
        if let Some(response) = self.component.match_getter(query) {
            return MatchOutcome::Respond(response);
        }
        if let Some(response) = self.errors.match_register(query) {
            return MatchOutcome::Respond(response);
        }
        if let Some(response) = self.errors.match_queue(query) {
            return MatchOutcome::Respond(response);
        }

        let mut unused = None;
        match self.component.match_setter(query, &mut unused) {
            MatchOutcome::NoMatch => {}
            outcome => return outcome,
        }

        let selected = self
            .component
            .properties
            .get(SELECTED_CHANNEL)
            .map(|p| p.get_value(None));
        for channels in &mut self.channels {
            match channels.match_query(query, selected) {
                MatchOutcome::NoMatch => continue,
                outcome => return outcome,
            }
        }
        MatchOutcome::NoMatch
    }
}

fn split_on(message: &[u8], delimiter: &[u8]) -> Vec<Vec<u8>> {
    let mut parts = Vec::new();
    let mut start = 0;
    let mut i = 0;
    while i + delimiter.len() <= message.len() {
        if &message[i..i + delimiter.len()] == delimiter {
            parts.push(message[start..i].to_vec());
            i += delimiter.len();
            start = i;
        } else {
            i += 1;
        }
    }
    parts.push(message[start..].to_vec());
    parts
}
