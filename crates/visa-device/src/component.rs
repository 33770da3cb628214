//! Matching building blocks shared by devices and channel groups
//!
//! A [`Component`] owns exact-match dialogues, getters that format a property
//! into a response template, and an ordered list of setters whose patterns
//! parse a value out of the query and write it to a property.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::error::{ConfigError, ValidationError};
use crate::pattern::Pattern;
use crate::property::Property;
use crate::template::Template;
use crate::value::Value;

/// What a matched query answers with
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Response {
    /// Bytes written back, followed by the response EOM
    Data(Vec<u8>),
    /// The query is handled but nothing is sent back
    NoResponse,
}

impl Response {
    pub fn data(bytes: impl Into<Vec<u8>>) -> Self {
        Response::Data(bytes.into())
    }

    /// Response bytes, `None` for [`Response::NoResponse`]
    pub fn as_bytes(&self) -> Option<&[u8]> {
        match self {
            Response::Data(d) => Some(d),
            Response::NoResponse => None,
        }
    }
}

/// Result of trying a query against a set of rules
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum MatchOutcome {
    /// Nothing handled the query
    NoMatch,
    Respond(Response),
    /// A setter matched but validation failed and it has no error text;
    /// the device answers with its generic command error
    Rejected,
}

/// A getter: reads a property and formats it
#[derive(Debug, Clone)]
pub struct Getter {
    pub query: String,
    pub response: Template,
}

/// A setter: parses the query and writes a property
#[derive(Debug, Clone)]
pub struct Setter {
    pub query: Pattern,
    pub response: Response,
    /// Sent when validation fails; `None` falls back to the command error
    pub error: Option<Vec<u8>>,
}

#[derive(Debug, Clone)]
pub(crate) struct GetterEntry {
    pub property: String,
    pub response: Template,
}

#[derive(Debug, Clone)]
struct SetterEntry {
    property: String,
    setter: Setter,
}

/// Exact-match query tables: dialogues and getters
#[derive(Debug, Clone, Default)]
pub(crate) struct CommandTable {
    pub dialogues: HashMap<Vec<u8>, Response>,
    pub getters: HashMap<Vec<u8>, GetterEntry>,
}

impl CommandTable {
    pub fn match_dialogue(&self, query: &[u8]) -> Option<Response> {
        let response = self.dialogues.get(query)?;
        debug!(response = ?response, "found response in dialogues");
        Some(response.clone())
    }

    /// Format the bound property's value; `channel` selects per-channel values
    pub fn match_getter(
        &self,
        query: &[u8],
        properties: &HashMap<String, Property>,
        channel: Option<&str>,
    ) -> Option<Response> {
        let getter = self.getters.get(query)?;
        let property = properties.get(&getter.property)?;
        debug!(property = %getter.property, "found response in getter");
        match getter.response.format_value(property.get_value(channel)) {
            Ok(text) => Some(Response::Data(text.into_bytes())),
            Err(e) => {
                warn!(property = %getter.property, error = %e, "getter response could not be formatted");
                None
            }
        }
    }
}

/// Dialogues, properties, getters and setters of a device or channel group
#[derive(Debug, Clone, Default)]
pub struct Component {
    pub(crate) table: CommandTable,
    pub(crate) properties: HashMap<String, Property>,
    setters: Vec<SetterEntry>,
}

impl Component {
    pub fn new() -> Self {
        Self::default()
    }

    /// Answer `query` with a fixed response
    pub fn add_dialogue(&mut self, query: impl Into<Vec<u8>>, response: Response) {
        self.table.dialogues.insert(query.into(), response);
    }

    /// Register a property with its optional getter and setter
    ///
    /// The getter template is checked against the property's current value so
    /// a template that can never render is rejected here.
    pub fn add_property(
        &mut self,
        property: Property,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Result<(), ConfigError> {
        let name = property.name().to_string();
        if let Some(getter) = getter {
            getter.response.format_value(property.get_value(None))?;
            self.table.getters.insert(
                getter.query.into_bytes(),
                GetterEntry {
                    property: name.clone(),
                    response: getter.response,
                },
            );
        }
        if let Some(setter) = setter {
            self.setters.push(SetterEntry {
                property: name.clone(),
                setter,
            });
        }
        self.properties.insert(name, property);
        Ok(())
    }

    pub fn property(&self, name: &str) -> Option<&Property> {
        self.properties.get(name)
    }

    pub fn property_mut(&mut self, name: &str) -> Option<&mut Property> {
        self.properties.get_mut(name)
    }

    pub fn match_dialogue(&self, query: &[u8]) -> Option<Response> {
        self.table.match_dialogue(query)
    }

    pub fn match_getter(&self, query: &[u8]) -> Option<Response> {
        self.table.match_getter(query, &self.properties, None)
    }

    /// Scan setters in declaration order
    ///
    /// `selected` is the channel a per-channel property is written for. A
    /// pattern carrying a `ch_id` placeholder updates it before the write.
    pub fn match_setter(&mut self, query: &[u8], selected: &mut Option<String>) -> MatchOutcome {
        let Ok(text) = std::str::from_utf8(query) else {
            return MatchOutcome::NoMatch;
        };

        for entry in &self.setters {
            let Some(captures) = entry.setter.query.captures(text) else {
                continue;
            };
            debug!(property = %entry.property, "found response in setter");

            if let Some(ch_id) = captures.get("ch_id") {
                *selected = Some(ch_id.to_string());
            }

            let result = match captures.positional.as_slice() {
                [] => Ok(()),
                [value] => match self.properties.get_mut(&entry.property) {
                    Some(property) => property.set_value(selected.as_deref(), value),
                    None => Ok(()),
                },
                values => Err(ValidationError::Conversion {
                    value: values
                        .iter()
                        .map(Value::to_string)
                        .collect::<Vec<_>>()
                        .join(", "),
                    kind: "a single value",
                }),
            };

            return match result {
                Ok(()) => MatchOutcome::Respond(entry.setter.response.clone()),
                Err(e) => {
                    warn!(property = %entry.property, error = %e, "rejected setter value");
                    match &entry.setter.error {
                        Some(error) => MatchOutcome::Respond(Response::Data(error.clone())),
                        None => MatchOutcome::Rejected,
                    }
                }
            };
        }
        MatchOutcome::NoMatch
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::property::Specs;
    use crate::value::PropertyType;

    fn frequency_component() -> Component {
        let mut c = Component::new();
        c.add_dialogue("?IDN", Response::data("LSG Serial #1234"));
        let specs = Specs::new(
            PropertyType::Float,
            Some(Value::Float(1.0)),
            Some(Value::Float(100_000.0)),
            vec![],
        )
        .unwrap();
        c.add_property(
            Property::new("frequency", Value::Float(100.0), Some(specs)).unwrap(),
            Some(Getter {
                query: "?FREQ".into(),
                response: Template::parse("{:.2f}").unwrap(),
            }),
            Some(Setter {
                query: Pattern::compile("!FREQ {:.2f}").unwrap(),
                response: Response::data("OK"),
                error: Some(b"FREQ_ERROR".to_vec()),
            }),
        )
        .unwrap();
        c
    }

    #[test]
    fn test_dialogue() {
        let c = frequency_component();
        assert_eq!(c.match_dialogue(b"?IDN"), Some(Response::data("LSG Serial #1234")));
        assert_eq!(c.match_dialogue(b"?IDN "), None);
    }

    #[test]
    fn test_getter_and_setter() {
        let mut c = frequency_component();
        let mut selected = None;
        assert_eq!(c.match_getter(b"?FREQ"), Some(Response::data("100.00")));
        assert_eq!(
            c.match_setter(b"!FREQ 10.3", &mut selected),
            MatchOutcome::Respond(Response::data("OK"))
        );
        assert_eq!(c.match_getter(b"?FREQ"), Some(Response::data("10.30")));
    }

    #[test]
    fn test_setter_error_text() {
        let mut c = frequency_component();
        let mut selected = None;
        assert_eq!(
            c.match_setter(b"!FREQ 0.0", &mut selected),
            MatchOutcome::Respond(Response::data("FREQ_ERROR"))
        );
        assert_eq!(c.match_getter(b"?FREQ"), Some(Response::data("100.00")));
    }

    #[test]
    fn test_setter_without_error_text_is_rejected() {
        let mut c = Component::new();
        let specs = Specs::new(PropertyType::Int, None, None, vec![Value::Int(0), Value::Int(1)]).unwrap();
        c.add_property(
            Property::new("output", Value::Int(0), Some(specs)).unwrap(),
            None,
            Some(Setter {
                query: Pattern::compile("!OUT {:d}").unwrap(),
                response: Response::data("OK"),
                error: None,
            }),
        )
        .unwrap();
        let mut selected = None;
        assert_eq!(c.match_setter(b"!OUT 7", &mut selected), MatchOutcome::Rejected);
        assert_eq!(c.match_setter(b"?OUT", &mut selected), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_invalid_utf8_never_matches_setters() {
        let mut c = frequency_component();
        let mut selected = None;
        assert_eq!(c.match_setter(b"!FREQ \xff", &mut selected), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_getter_template_checked_on_add() {
        let mut c = Component::new();
        let err = c.add_property(
            Property::new("name", Value::from("abc"), None).unwrap(),
            Some(Getter {
                query: "NAME?".into(),
                response: Template::parse("{:d}").unwrap(),
            }),
            None,
        );
        assert!(matches!(err, Err(ConfigError::Template(_))));
    }
}
