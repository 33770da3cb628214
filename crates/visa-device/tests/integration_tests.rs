//! Integration tests for simulated devices
//!
//! These tests build devices from resolved definitions and drive them
//! through their byte-level write/read interface:
//! - Dialogues, getters and setters with validation errors
//! - Status registers and error queues fed by command errors
//! - Pre-selected and inline channel selection
//! - Multi-message splitting on the delimiter

use visa_device::{Devices, SimulationDefinition, Value};

// ============================================================================
// Helper Functions
// ============================================================================

mod helpers {
    use super::*;

    pub const INSTRUMENTS: &str = include_str!("fixtures/instruments.json");
    pub const CHANNELS: &str = include_str!("fixtures/channels.json");

    pub fn load(json: &str) -> Devices {
        let definition: SimulationDefinition = serde_json::from_str(json).unwrap();
        Devices::from_definition(&definition).unwrap()
    }

    /// Write a query followed by the device's query EOM, return the decoded reply
    /// with the trailing response EOM removed
    pub fn query(devices: &mut Devices, resource: &str, q: &str) -> String {
        let device = devices.get_mut(resource).unwrap();
        let eom = device.query_eom().to_vec();
        device.write(q.as_bytes());
        device.write(&eom);
        let reply: Vec<u8> = std::iter::from_fn(|| device.read()).collect();
        let text = String::from_utf8(reply).unwrap();
        text.strip_suffix('\n').map(str::to_string).unwrap_or(text)
    }

    /// Write a query and discard whatever comes back
    pub fn write(devices: &mut Devices, resource: &str, q: &str) {
        query(devices, resource, q);
    }
}

use helpers::*;

const DEVICE_1: &[&str] = &[
    "ASRL1::INSTR",
    "GPIB0::8::INSTR",
    "TCPIP0::localhost::inst0::INSTR",
    "TCPIP0::localhost::10001::SOCKET",
    "USB0::0x1111::0x2222::0x1234::0::INSTR",
    "USB0::0x1111::0x2222::0x4445::0::RAW",
];

const DEVICE_2: &[&str] = &[
    "ASRL2::INSTR",
    "GPIB0::9::INSTR",
    "TCPIP0::localhost:2222::inst0::INSTR",
    "USB0::0x1111::0x2222::0x2468::0::INSTR",
];

const DEVICE_3: &[&str] = &[
    "ASRL3::INSTR",
    "GPIB0::10::INSTR",
    "TCPIP0::localhost:3333::inst0::INSTR",
    "USB0::0x1111::0x2222::0x3692::0::INSTR",
];

const DEVICE_4: &[&str] = &[
    "ASRL4::INSTR",
    "GPIB0::4::INSTR",
    "TCPIP0::localhost:4444::inst0::INSTR",
    "USB0::0x1111::0x2222::0x4444::0::INSTR",
];

// ============================================================================
// Registry
// ============================================================================

#[test]
fn test_list_resources() {
    let devices = load(INSTRUMENTS);
    let mut expected: Vec<String> = DEVICE_1
        .iter()
        .chain(DEVICE_2)
        .chain(DEVICE_3)
        .chain(DEVICE_4)
        .map(|r| r.parse::<visa_protocol::ResourceName>().unwrap().to_string())
        .collect();
    expected.sort();
    assert_eq!(devices.list_resources(), expected);
}

#[test]
fn test_each_resource_gets_its_own_device() {
    let mut devices = load(INSTRUMENTS);
    assert_eq!(query(&mut devices, "GPIB0::8::INSTR", "!AMP 3.8"), "OK");
    assert_eq!(query(&mut devices, "GPIB0::8::INSTR", "?AMP"), "3.80");
    assert_eq!(query(&mut devices, "ASRL1::INSTR", "?AMP"), "1.00");
}

#[test]
fn test_serial_eom_is_crlf() {
    let devices = load(INSTRUMENTS);
    let device = devices.get("ASRL1::INSTR").unwrap();
    assert_eq!(device.query_eom(), b"\r\n");
    assert_eq!(device.response_eom(), b"\n");
}

// ============================================================================
// Dialogues, getters and setters
// ============================================================================

#[test]
fn test_instruments() {
    let mut devices = load(INSTRUMENTS);
    for resource in DEVICE_1 {
        let cases = [
            ("?IDN", "LSG Serial #1234"),
            ("?FREQ", "100.00"),
            ("!FREQ 10.3", "OK"),
            ("?FREQ", "10.30"),
            ("?AMP", "1.00"),
            ("!AMP 3.8", "OK"),
            ("?AMP", "3.80"),
            ("?OFF", "0.00"),
            ("!OFF 1.2", "OK"),
            ("?OFF", "1.20"),
            ("?OUT", "0"),
            ("!OUT 1", "OK"),
            ("?OUT", "1"),
            ("?WVF", "0"),
            ("!WVF 1", "OK"),
            ("?WVF", "1"),
            ("!CAL", "OK"),
            // Errors
            ("!WVF 23", "ERROR"),
            ("!AMP -1.0", "ERROR"),
            ("!AMP 11.0", "ERROR"),
            ("!FREQ 0.0", "FREQ_ERROR"),
            ("BOGUS_COMMAND", "ERROR"),
        ];
        for (q, expected) in cases {
            assert_eq!(query(&mut devices, resource, q), expected, "{} {:?}", resource, q);
        }
    }
}

#[test]
fn test_failed_write_keeps_value() {
    let mut devices = load(INSTRUMENTS);
    assert_eq!(query(&mut devices, "GPIB0::8::INSTR", "!AMP 3.8"), "OK");
    assert_eq!(query(&mut devices, "GPIB0::8::INSTR", "!AMP 11.0"), "ERROR");
    assert_eq!(query(&mut devices, "GPIB0::8::INSTR", "?AMP"), "3.80");
    let device = devices.get("GPIB0::8::INSTR").unwrap();
    assert_eq!(device.property_value("amplitude"), Some(&Value::Float(3.8)));
}

#[test]
fn test_multiple_messages_in_one_write() {
    let mut devices = load(INSTRUMENTS);
    assert_eq!(
        query(&mut devices, "GPIB0::8::INSTR", "?IDN;!AMP 2.5;?AMP"),
        "LSG Serial #1234\nOK\n2.50"
    );
}

// ============================================================================
// Status registers and error queues
// ============================================================================

#[test]
fn test_instruments_on_invalid_command() {
    let mut devices = load(INSTRUMENTS);
    for resource in DEVICE_3 {
        assert_eq!(query(&mut devices, resource, "FAKE_COMMAND"), "INVALID_COMMAND");
        assert_eq!(query(&mut devices, resource, "*ESR?"), "32");
        assert_eq!(query(&mut devices, resource, "*ESR?"), "0");
    }
}

#[test]
fn test_instrument_on_invalid_values() {
    let mut devices = load(INSTRUMENTS);
    for resource in DEVICE_2 {
        write(&mut devices, resource, "FAKE_COMMAND");
        assert_eq!(query(&mut devices, resource, "*ESR?"), "32", "invalid test command");

        write(&mut devices, resource, ":VOLT:IMM:AMPL 2.00");
        assert_eq!(query(&mut devices, resource, "*ESR?"), "0");
        assert_eq!(query(&mut devices, resource, ":VOLT:IMM:AMPL?"), "+2.0000E+00");

        write(&mut devices, resource, ":VOLT:IMM:AMPL 0.5");
        assert_eq!(query(&mut devices, resource, "*ESR?"), "32", "below minimum");

        write(&mut devices, resource, ":VOLT:IMM:AMPL 6.5");
        assert_eq!(query(&mut devices, resource, "*ESR?"), "32", "above maximum");
    }
}

#[test]
fn test_unmatched_query_without_error_text_sends_nothing() {
    let mut devices = load(INSTRUMENTS);
    assert_eq!(query(&mut devices, "GPIB0::9::INSTR", "FAKE_COMMAND"), "");
}

#[test]
fn test_instrument_for_error_state() {
    let mut devices = load(INSTRUMENTS);
    for resource in DEVICE_4 {
        assert_eq!(query(&mut devices, resource, ":SYST:ERR?"), "0, No Error");

        write(&mut devices, resource, "FAKE COMMAND");
        assert_eq!(query(&mut devices, resource, ":SYST:ERR?"), "1, Command error");

        write(&mut devices, resource, ":VOLT:IMM:AMPL 0");
        assert_eq!(query(&mut devices, resource, ":SYST:ERR?"), "1, Command error");
        assert_eq!(query(&mut devices, resource, ":SYST:ERR?"), "0, No Error");
    }
}

#[test]
fn test_error_queue_keeps_order() {
    let mut devices = load(INSTRUMENTS);
    let resource = "GPIB0::4::INSTR";
    write(&mut devices, resource, "FAKE 1");
    write(&mut devices, resource, "FAKE 2");
    assert_eq!(query(&mut devices, resource, ":SYST:ERR?"), "1, Command error");
    assert_eq!(query(&mut devices, resource, ":SYST:ERR?"), "1, Command error");
    assert_eq!(query(&mut devices, resource, ":SYST:ERR?"), "0, No Error");
}

// ============================================================================
// Channels
// ============================================================================

#[test]
fn test_instrument_with_channel_preselection() {
    let mut devices = load(CHANNELS);
    for resource in [
        "ASRL1::INSTR",
        "GPIB0::8::INSTR",
        "TCPIP0::localhost:1111::inst0::INSTR",
        "USB0::0x1111::0x2222::0x1234::0::INSTR",
    ] {
        assert_eq!(query(&mut devices, resource, "I?"), "1");
        assert_eq!(query(&mut devices, resource, "F?"), "1.000");

        write(&mut devices, resource, "F 5.0");
        assert_eq!(query(&mut devices, resource, "F?"), "5.000");
        assert_eq!(query(&mut devices, resource, "I 2;F?"), "1.000");
        assert_eq!(query(&mut devices, resource, "I?"), "2");

        let device = devices.get(resource).unwrap();
        let channels = device.channels("channel").unwrap();
        assert_eq!(channels.value("frequency", "1"), Some(&Value::Float(5.0)));
        assert_eq!(channels.value("frequency", "2"), Some(&Value::Float(1.0)));
    }
}

#[test]
fn test_preselection_switch_back_restores_value() {
    let mut devices = load(CHANNELS);
    let resource = "GPIB0::8::INSTR";
    write(&mut devices, resource, "F 5.0");
    write(&mut devices, resource, "I 2");
    write(&mut devices, resource, "F 7.5");
    assert_eq!(query(&mut devices, resource, "F?"), "7.500");
    write(&mut devices, resource, "I 1");
    assert_eq!(query(&mut devices, resource, "F?"), "5.000");
}

#[test]
fn test_instrument_with_inline_selection() {
    let mut devices = load(CHANNELS);
    for resource in [
        "ASRL2::INSTR",
        "GPIB0::9::INSTR",
        "TCPIP0::localhost:2222::inst0::INSTR",
        "USB0::0x1111::0x2222::0x2468::0::INSTR",
    ] {
        assert_eq!(query(&mut devices, resource, "CH 1:VOLT:IMM:AMPL?"), "+1.00000000E+00");

        write(&mut devices, resource, "CH 1:VOLT:IMM:AMPL 2.0");
        assert_eq!(query(&mut devices, resource, "CH 1:VOLT:IMM:AMPL?"), "+2.00000000E+00");
        assert_eq!(query(&mut devices, resource, "CH 2:VOLT:IMM:AMPL?"), "+1.00000000E+00");
    }
}

#[test]
fn test_inline_selection_persists_between_matches() {
    let mut devices = load(CHANNELS);
    let resource = "GPIB0::9::INSTR";

    write(&mut devices, resource, "CH 1:VOLT:IMM:AMPL 3.0");
    let selected = devices
        .get(resource)
        .and_then(|d| d.channels("channel"))
        .and_then(|c| c.selected().map(str::to_string));
    assert_eq!(selected.as_deref(), Some("1"));

    // A query that only matches the second id leaves it selected
    assert_eq!(query(&mut devices, resource, "CH 2:ID?"), "channel");
    let selected = devices
        .get(resource)
        .and_then(|d| d.channels("channel"))
        .and_then(|c| c.selected().map(str::to_string));
    assert_eq!(selected.as_deref(), Some("2"));
}

#[test]
fn test_inline_rejected_value_raises_command_error() {
    let mut devices = load(CHANNELS);
    let resource = "GPIB0::9::INSTR";
    assert_eq!(query(&mut devices, resource, "CH 1:VOLT:IMM:AMPL 9.0"), "ERROR");
    assert_eq!(query(&mut devices, resource, "CH 1:VOLT:IMM:AMPL?"), "+1.00000000E+00");
    assert_eq!(query(&mut devices, resource, "CH 3:VOLT:IMM:AMPL?"), "ERROR");
}

// ============================================================================
// Property-Based Tests
// ============================================================================

mod proptest_tests {
    use super::*;
    use proptest::prelude::*;

    proptest! {
        #[test]
        fn amplitude_round_trips_within_range(centi in 0u32..=1000) {
            let mut devices = load(INSTRUMENTS);
            let value = centi as f64 / 100.0;
            let set = format!("!AMP {:.2}", value);
            prop_assert_eq!(query(&mut devices, "GPIB0::8::INSTR", &set), "OK");
            prop_assert_eq!(query(&mut devices, "GPIB0::8::INSTR", "?AMP"), format!("{:.2}", value));
        }

        #[test]
        fn out_of_range_amplitude_is_rejected(centi in 1001u32..100_000) {
            let mut devices = load(INSTRUMENTS);
            let set = format!("!AMP {:.2}", centi as f64 / 100.0);
            prop_assert_eq!(query(&mut devices, "GPIB0::8::INSTR", &set), "ERROR");
            prop_assert_eq!(query(&mut devices, "GPIB0::8::INSTR", "?AMP"), "1.00");
        }

        #[test]
        fn unmatched_queries_count_in_register(n in 1usize..5) {
            let mut devices = load(INSTRUMENTS);
            for _ in 0..n {
                write(&mut devices, "GPIB0::10::INSTR", "NOPE");
            }
            prop_assert_eq!(query(&mut devices, "GPIB0::10::INSTR", "*ESR?"), "32");
            prop_assert_eq!(query(&mut devices, "GPIB0::10::INSTR", "*ESR?"), "0");
        }
    }
}
