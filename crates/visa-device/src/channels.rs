//! Multi-channel command groups
//!
//! A channel group holds one dialogue/getter template set whose query keys
//! may mention `{ch_id}`. The set is rendered for a channel id the first time
//! that id is tested and the result is cached.
//!
//! Two selection disciplines exist:
//!
//! - pre-selected (`can_select = false`): the device's `selected_channel`
//!   property decides which channel answers.
//! - inline (`can_select = true`): the query names the channel; every id is
//!   tried in order until one of its rendered commands matches.
//!
//! The selected id is both the id under test while matching and the channel
//! later unaddressed setters write to, so it persists between matches.

use std::collections::HashMap;

use tracing::{debug, warn};

use crate::component::{CommandTable, Component, GetterEntry, Getter, MatchOutcome, Response, Setter};
use crate::error::ConfigError;
use crate::property::Property;
use crate::template::Template;
use crate::value::Value;

/// Name of the device property consulted by pre-selected groups
pub const SELECTED_CHANNEL: &str = "selected_channel";

const CHANNEL_FIELD: &str = "ch_id";

/// A group of channels sharing the same command set
#[derive(Debug, Clone)]
pub struct Channels {
    name: String,
    can_select: bool,
    ids: Vec<String>,
    selected: Option<String>,
    /// Per-channel properties and the shared setters
    component: Component,
    /// Unrendered dialogue and getter keys
    templates: CommandTable,
    rendered: HashMap<String, CommandTable>,
}

impl Channels {
    pub fn new(name: impl Into<String>, ids: Vec<String>, can_select: bool) -> Result<Self, ConfigError> {
        let name = name.into();
        if ids.is_empty() {
            return Err(ConfigError::NoChannelIds(name));
        }
        Ok(Self {
            name,
            can_select,
            ids,
            selected: None,
            component: Component::new(),
            templates: CommandTable::default(),
            rendered: HashMap::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn can_select(&self) -> bool {
        self.can_select
    }

    pub fn ids(&self) -> &[String] {
        &self.ids
    }

    /// Channel currently selected, or last tested while matching
    pub fn selected(&self) -> Option<&str> {
        self.selected.as_deref()
    }

    /// Value of a channel property for the given channel id
    pub fn value(&self, property: &str, channel: &str) -> Option<&Value> {
        self.component
            .property(property)
            .map(|p| p.get_value(Some(channel)))
    }

    /// Add a dialogue whose query may contain `{ch_id}`
    pub fn add_dialogue(&mut self, query: &str, response: Response) -> Result<(), ConfigError> {
        self.check_key(query)?;
        self.templates.dialogues.insert(query.as_bytes().to_vec(), response);
        self.rendered.clear();
        Ok(())
    }

    /// Add a per-channel property
    ///
    /// The property is stored per channel regardless of how it was built; the
    /// getter query may contain `{ch_id}`.
    pub fn add_property(
        &mut self,
        name: &str,
        default: Value,
        specs: Option<crate::property::Specs>,
        getter: Option<Getter>,
        setter: Option<Setter>,
    ) -> Result<(), ConfigError> {
        let property = Property::per_channel(name, default, specs)?;
        if let Some(getter) = getter {
            self.check_key(&getter.query)?;
            getter.response.format_value(property.get_value(None))?;
            self.templates.getters.insert(
                getter.query.into_bytes(),
                GetterEntry {
                    property: name.to_string(),
                    response: getter.response,
                },
            );
            self.rendered.clear();
        }
        self.component.add_property(property, None, setter)
    }

    fn check_key(&self, query: &str) -> Result<(), ConfigError> {
        let template = Template::parse(query)?;
        for id in &self.ids {
            template.render_named(CHANNEL_FIELD, &Value::from(id.as_str()))?;
        }
        Ok(())
    }

    /// Render the command set for one channel id
    fn render(&self, id: &str) -> CommandTable {
        let ch_id = Value::from(id);
        let render_key = |key: &[u8]| -> Option<Vec<u8>> {
            let text = std::str::from_utf8(key).ok()?;
            match Template::parse(text).and_then(|t| t.render_named(CHANNEL_FIELD, &ch_id)) {
                Ok(rendered) => Some(rendered.into_bytes()),
                Err(e) => {
                    warn!(error = %e, "channel command could not be rendered");
                    None
                }
            }
        };

        let mut table = CommandTable::default();
        for (key, response) in &self.templates.dialogues {
            if let Some(key) = render_key(key) {
                table.dialogues.insert(key, response.clone());
            }
        }
        for (key, getter) in &self.templates.getters {
            if let Some(key) = render_key(key) {
                table.getters.insert(key, getter.clone());
            }
        }
        table
    }

    fn try_channel(&mut self, id: &str, query: &[u8]) -> Option<Response> {
        if !self.rendered.contains_key(id) {
            let table = self.render(id);
            self.rendered.insert(id.to_string(), table);
        }
        let table = self.rendered.get(id)?;
        table
            .match_dialogue(query)
            .or_else(|| table.match_getter(query, &self.component.properties, Some(id)))
    }

    /// Try to answer `query` from this channel group
    ///
    /// `selected_channel` is the device's `selected_channel` property value,
    /// only consulted by pre-selected groups.
    pub fn match_query(&mut self, query: &[u8], selected_channel: Option<&Value>) -> MatchOutcome {
        if !self.can_select {
            let Some(ch_id) = selected_channel.map(Value::to_string) else {
                return MatchOutcome::NoMatch;
            };
            if !self.ids.contains(&ch_id) {
                return MatchOutcome::NoMatch;
            }
            self.selected = Some(ch_id.clone());
            if let Some(response) = self.try_channel(&ch_id, query) {
                debug!(group = %self.name, channel = %ch_id, "found response in channel");
                return MatchOutcome::Respond(response);
            }
        } else {
            for id in self.ids.clone() {
                self.selected = Some(id.clone());
                if let Some(response) = self.try_channel(&id, query) {
                    debug!(group = %self.name, channel = %id, "found response in channel");
                    return MatchOutcome::Respond(response);
                }
            }
        }

        self.component.match_setter(query, &mut self.selected)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::pattern::Pattern;
    use crate::property::Specs;
    use crate::value::PropertyType;

    fn voltage_specs() -> Specs {
        Specs::new(
            PropertyType::Float,
            Some(Value::Int(1)),
            Some(Value::Int(6)),
            vec![],
        )
        .unwrap()
    }

    fn inline_group() -> Channels {
        let mut ch = Channels::new("channel", vec!["1".into(), "2".into()], true).unwrap();
        ch.add_property(
            "voltage",
            Value::Float(1.0),
            Some(voltage_specs()),
            Some(Getter {
                query: "CH {ch_id}:VOLT:IMM:AMPL?".into(),
                response: Template::parse("{:+.8E}").unwrap(),
            }),
            Some(Setter {
                query: Pattern::compile("CH {ch_id}:VOLT:IMM:AMPL {:+.8E}").unwrap(),
                response: Response::NoResponse,
                error: None,
            }),
        )
        .unwrap();
        ch
    }

    fn respond(text: &str) -> MatchOutcome {
        MatchOutcome::Respond(Response::data(text))
    }

    #[test]
    fn test_inline_selection() {
        let mut ch = inline_group();
        assert_eq!(ch.match_query(b"CH 1:VOLT:IMM:AMPL?", None), respond("+1.00000000E+00"));
        assert_eq!(ch.selected(), Some("1"));

        assert_eq!(
            ch.match_query(b"CH 2:VOLT:IMM:AMPL 2.0", None),
            MatchOutcome::Respond(Response::NoResponse)
        );
        assert_eq!(ch.selected(), Some("2"));
        assert_eq!(ch.value("voltage", "2"), Some(&Value::Float(2.0)));
        assert_eq!(ch.value("voltage", "1"), Some(&Value::Float(1.0)));

        assert_eq!(ch.match_query(b"CH 2:VOLT:IMM:AMPL?", None), respond("+2.00000000E+00"));
        assert_eq!(ch.match_query(b"CH 1:VOLT:IMM:AMPL?", None), respond("+1.00000000E+00"));
    }

    #[test]
    fn test_inline_unknown_channel_leaves_last_tested_selected() {
        let mut ch = inline_group();
        assert_eq!(ch.match_query(b"CH 3:VOLT:IMM:AMPL?", None), MatchOutcome::NoMatch);
        assert_eq!(ch.selected(), Some("2"));
    }

    #[test]
    fn test_inline_rejected_value() {
        let mut ch = inline_group();
        assert_eq!(ch.match_query(b"CH 1:VOLT:IMM:AMPL 9.0", None), MatchOutcome::Rejected);
        assert_eq!(ch.value("voltage", "1"), Some(&Value::Float(1.0)));
    }

    #[test]
    fn test_preselected() {
        let mut ch = Channels::new("channel", vec!["1".into(), "2".into(), "3".into()], false).unwrap();
        ch.add_property(
            "frequency",
            Value::Float(1.0),
            None,
            Some(Getter {
                query: "F?".into(),
                response: Template::parse("{:.3f}").unwrap(),
            }),
            Some(Setter {
                query: Pattern::compile("F {:.3f}").unwrap(),
                response: Response::NoResponse,
                error: None,
            }),
        )
        .unwrap();

        let one = Value::Int(1);
        let two = Value::Int(2);
        assert_eq!(ch.match_query(b"F?", Some(&one)), respond("1.000"));
        assert_eq!(
            ch.match_query(b"F 5.0", Some(&one)),
            MatchOutcome::Respond(Response::NoResponse)
        );
        assert_eq!(ch.match_query(b"F?", Some(&one)), respond("5.000"));
        assert_eq!(ch.match_query(b"F?", Some(&two)), respond("1.000"));
        assert_eq!(ch.match_query(b"F?", Some(&Value::Int(7))), MatchOutcome::NoMatch);
        assert_eq!(ch.match_query(b"F?", None), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_channel_dialogues_are_rendered_per_id() {
        let mut ch = Channels::new("channel", vec!["A".into(), "B".into()], true).unwrap();
        ch.add_dialogue("CH {ch_id}:NAME?", Response::data("named")).unwrap();
        assert_eq!(ch.match_query(b"CH B:NAME?", None), respond("named"));
        assert_eq!(ch.selected(), Some("B"));
        assert_eq!(ch.match_query(b"CH C:NAME?", None), MatchOutcome::NoMatch);
    }

    #[test]
    fn test_bad_channel_key_is_config_error() {
        let mut ch = Channels::new("channel", vec!["1".into()], true).unwrap();
        assert!(ch.add_dialogue("CH {ch_id:d}?", Response::NoResponse).is_err());
        assert!(ch.add_dialogue("CH {other}?", Response::NoResponse).is_err());
        assert!(Channels::new("empty", vec![], true).is_err());
    }
}
