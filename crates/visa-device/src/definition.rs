//! Resolved device definitions
//!
//! These records describe devices after any file loading, inheritance and
//! version checks have happened. They deserialize from any serde format; the
//! field names follow the usual instrument definition layout (`q`, `r`, `e`).

use std::collections::BTreeMap;

use serde::{Deserialize, Serialize};

use crate::channels::Channels;
use crate::component::{Getter, Response, Setter};
use crate::device::Device;
use crate::error::ConfigError;
use crate::pattern::Pattern;
use crate::property::{Property, Specs};
use crate::registers::{ErrorHandler, ErrorQueue, StatusRegister};
use crate::template::Template;
use crate::value::{PropertyType, Value};

/// Devices and the resources they are exposed under
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct SimulationDefinition {
    #[serde(default)]
    pub devices: BTreeMap<String, DeviceDefinition>,
    /// Resource name -> resource
    #[serde(default)]
    pub resources: BTreeMap<String, ResourceDefinition>,
}

/// One exposed resource
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResourceDefinition {
    /// Name of the device in [`SimulationDefinition::devices`]
    pub device: String,
    /// Per channel group ids overriding the group's own ids
    #[serde(default)]
    pub channel_ids: BTreeMap<String, Vec<Value>>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DeviceDefinition {
    #[serde(default = "default_delimiter")]
    pub delimiter: String,
    /// `"INTERFACE CLASS"` -> end-of-message pair
    #[serde(default)]
    pub eom: BTreeMap<String, EomDefinition>,
    #[serde(default)]
    pub error: ErrorDefinition,
    #[serde(default)]
    pub dialogues: Vec<DialogueDefinition>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
    #[serde(default)]
    pub channels: Vec<ChannelsDefinition>,
}

fn default_delimiter() -> String {
    ";".to_string()
}

fn default_can_select() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EomDefinition {
    pub q: String,
    pub r: String,
}

/// Error configuration: a single text or a full block
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ErrorDefinition {
    /// Same response for command and query errors
    Text(String),
    Block {
        #[serde(default)]
        response: ErrorResponses,
        #[serde(default)]
        status_register: Vec<RegisterDefinition>,
        #[serde(default)]
        error_queue: Vec<QueueDefinition>,
    },
}

impl Default for ErrorDefinition {
    fn default() -> Self {
        ErrorDefinition::Block {
            response: ErrorResponses::default(),
            status_register: Vec::new(),
            error_queue: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ErrorResponses {
    pub command_error: Option<String>,
    pub query_error: Option<String>,
}

/// A status register: its query and error key -> bit value
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegisterDefinition {
    pub q: String,
    #[serde(flatten)]
    pub bits: BTreeMap<String, i64>,
}

/// An error queue: its query, empty-queue text and error key -> message
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct QueueDefinition {
    pub q: String,
    pub default: String,
    #[serde(default)]
    pub strict: bool,
    #[serde(flatten)]
    pub messages: BTreeMap<String, String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DialogueDefinition {
    pub q: String,
    /// Absent means the query gets no response
    pub r: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PropertyDefinition {
    pub name: String,
    #[serde(default = "empty_value")]
    pub default: Value,
    pub getter: Option<GetterDefinition>,
    pub setter: Option<SetterDefinition>,
    pub specs: Option<SpecsDefinition>,
}

fn empty_value() -> Value {
    Value::Str(String::new())
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GetterDefinition {
    pub q: String,
    /// Response template
    pub r: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SetterDefinition {
    /// Query pattern
    pub q: String,
    pub r: Option<String>,
    /// Error text when validation fails
    pub e: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecsDefinition {
    #[serde(rename = "type")]
    pub kind: PropertyType,
    pub min: Option<Value>,
    pub max: Option<Value>,
    #[serde(default)]
    pub valid: Vec<Value>,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ChannelsDefinition {
    pub name: String,
    #[serde(default)]
    pub ids: Vec<Value>,
    #[serde(default = "default_can_select")]
    pub can_select: bool,
    #[serde(default)]
    pub dialogues: Vec<DialogueDefinition>,
    #[serde(default)]
    pub properties: Vec<PropertyDefinition>,
}

/// Strip surrounding spaces and expand the `\r` and `\n` escapes
pub fn unescape(text: &str) -> String {
    text.trim_matches(' ').replace("\\r", "\r").replace("\\n", "\n")
}

/// [`unescape`] into bytes
pub fn to_bytes(text: &str) -> Vec<u8> {
    unescape(text).into_bytes()
}

fn to_response(text: Option<&str>) -> Response {
    match text {
        Some(t) => Response::Data(to_bytes(t)),
        None => Response::NoResponse,
    }
}

impl SpecsDefinition {
    fn build(&self, property: &str) -> Result<Specs, ConfigError> {
        Specs::new(self.kind, self.min.clone(), self.max.clone(), self.valid.clone()).map_err(
            |reason| ConfigError::InvalidSpecs {
                property: property.to_string(),
                reason,
            },
        )
    }
}

impl PropertyDefinition {
    fn specs(&self) -> Result<Option<Specs>, ConfigError> {
        self.specs.as_ref().map(|s| s.build(&self.name)).transpose()
    }

    fn getter(&self) -> Result<Option<Getter>, ConfigError> {
        self.getter
            .as_ref()
            .map(|g| -> Result<Getter, ConfigError> {
                Ok(Getter {
                    query: unescape(&g.q),
                    response: Template::parse(g.r.trim_matches(' '))?,
                })
            })
            .transpose()
    }

    fn setter(&self) -> Result<Option<Setter>, ConfigError> {
        self.setter
            .as_ref()
            .map(|s| -> Result<Setter, ConfigError> {
                Ok(Setter {
                    query: Pattern::compile(&unescape(&s.q))?,
                    response: to_response(s.r.as_deref()),
                    error: s.e.as_deref().map(to_bytes),
                })
            })
            .transpose()
    }
}

impl ErrorDefinition {
    pub fn build(&self) -> ErrorHandler {
        match self {
            ErrorDefinition::Text(text) => ErrorHandler::plain(Response::Data(to_bytes(text))),
            ErrorDefinition::Block {
                response,
                status_register,
                error_queue,
            } => {
                let mut handler = ErrorHandler::with_responses(
                    response.command_error.as_deref().map(|t| Response::Data(to_bytes(t))),
                    response.query_error.as_deref().map(|t| Response::Data(to_bytes(t))),
                );
                for register in status_register {
                    handler.add_register(
                        to_bytes(&register.q),
                        StatusRegister::new(register.bits.iter().map(|(k, v)| (k.as_str(), *v))),
                    );
                }
                for queue in error_queue {
                    handler.add_queue(
                        to_bytes(&queue.q),
                        ErrorQueue::new(
                            queue.messages.iter().map(|(k, v)| (k.as_str(), to_bytes(v))),
                            to_bytes(&queue.default),
                        ),
                    );
                }
                handler
            }
        }
    }
}

impl ChannelsDefinition {
    /// Build the channel group, using `ids` instead of the declared ids when given
    pub fn build(&self, ids: Option<&[Value]>) -> Result<Channels, ConfigError> {
        let ids = match ids {
            Some(ids) if !ids.is_empty() => ids,
            _ => self.ids.as_slice(),
        };
        let mut channels = Channels::new(
            self.name.clone(),
            ids.iter().map(Value::to_string).collect(),
            self.can_select,
        )?;
        for dialogue in &self.dialogues {
            channels.add_dialogue(&unescape(&dialogue.q), to_response(dialogue.r.as_deref()))?;
        }
        for property in &self.properties {
            channels.add_property(
                &property.name,
                property.default.clone(),
                property.specs()?,
                property.getter()?,
                property.setter()?,
            )?;
        }
        Ok(channels)
    }
}

impl DeviceDefinition {
    /// Build an unbound device
    pub fn build(&self, name: &str, resource: Option<&ResourceDefinition>) -> Result<Device, ConfigError> {
        let mut device = Device::new(name, self.delimiter.as_bytes());
        device.set_error_handler(self.error.build());

        for (type_class, eom) in &self.eom {
            device.add_eom(type_class, to_bytes(&eom.q), to_bytes(&eom.r))?;
        }
        for dialogue in &self.dialogues {
            device.add_dialogue(to_bytes(&dialogue.q), to_response(dialogue.r.as_deref()));
        }
        for property in &self.properties {
            device.add_property(
                Property::new(property.name.clone(), property.default.clone(), property.specs()?)?,
                property.getter()?,
                property.setter()?,
            )?;
        }
        for channels in &self.channels {
            let ids = resource
                .and_then(|r| r.channel_ids.get(&channels.name))
                .map(Vec::as_slice);
            device.add_channels(channels.build(ids)?)?;
        }
        Ok(device)
    }
}
