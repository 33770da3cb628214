//! Setter query patterns
//!
//! A setter query such as `!FREQ {:.2f}` or `CH {ch_id}:VOLT {:+.8E}` is
//! compiled into an anchored regular expression. Placeholders keep their
//! declared conversion type; width and precision only matter for output and
//! are ignored here. Matching never fails loudly: input that does not fit the
//! pattern, or whose captured text does not convert, is simply a no-match.

use std::collections::HashMap;

use regex::Regex;

use crate::error::PatternError;
use crate::value::Value;

const INT: &str = r"[-+]?\d+";
const HEX: &str = r"[-+]?(?:0[xX])?[0-9a-fA-F]+";
const OCT: &str = r"[-+]?(?:0[oO])?[0-7]+";
const BIN: &str = r"[-+]?(?:0[bB])?[01]+";
const FLOAT: &str = r"[-+]?(?:(?:\d+\.?\d*|\.\d+)(?:[eE][-+]?\d+)?|[iI][nN][fF]|[nN][aA][nN])";
const WORD: &str = r"\w+";
const TEXT: &str = r".+?";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Conversion {
    Int,
    Hex,
    Oct,
    Bin,
    Float,
    Word,
    Text,
}

impl Conversion {
    fn from_spec(spec: &str) -> Result<Self, String> {
        let Some(kind) = spec.chars().last() else {
            return Ok(Conversion::Text);
        };
        if !kind.is_ascii_alphabetic() {
            return Ok(Conversion::Text);
        }
        match kind {
            'd' | 'n' => Ok(Conversion::Int),
            'x' | 'X' => Ok(Conversion::Hex),
            'o' => Ok(Conversion::Oct),
            'b' => Ok(Conversion::Bin),
            'f' | 'F' | 'e' | 'E' | 'g' | 'G' => Ok(Conversion::Float),
            'w' => Ok(Conversion::Word),
            's' => Ok(Conversion::Text),
            other => Err(format!("unknown conversion type '{}'", other)),
        }
    }

    fn regex(&self) -> &'static str {
        match self {
            Conversion::Int => INT,
            Conversion::Hex => HEX,
            Conversion::Oct => OCT,
            Conversion::Bin => BIN,
            Conversion::Float => FLOAT,
            Conversion::Word => WORD,
            Conversion::Text => TEXT,
        }
    }

    fn convert(&self, text: &str) -> Option<Value> {
        match self {
            Conversion::Int => text.parse().ok().map(Value::Int),
            Conversion::Hex => parse_radix(text, 16, "0x").map(Value::Int),
            Conversion::Oct => parse_radix(text, 8, "0o").map(Value::Int),
            Conversion::Bin => parse_radix(text, 2, "0b").map(Value::Int),
            Conversion::Float => text.parse().ok().map(Value::Float),
            Conversion::Word | Conversion::Text => Some(Value::Str(text.to_string())),
        }
    }
}

fn parse_radix(text: &str, radix: u32, prefix: &str) -> Option<i64> {
    let (negative, digits) = match text.as_bytes().first() {
        Some(b'-') => (true, &text[1..]),
        Some(b'+') => (false, &text[1..]),
        _ => (false, text),
    };
    let digits = if digits.len() > 2 && digits[..2].eq_ignore_ascii_case(prefix) {
        &digits[2..]
    } else {
        digits
    };
    let value = i64::from_str_radix(digits, radix).ok()?;
    Some(if negative { -value } else { value })
}

#[derive(Debug, Clone, PartialEq, Eq)]
enum Slot {
    Positional,
    Named(String),
}

/// Values extracted from a matching query
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Captures {
    /// Unnamed placeholders in order of appearance
    pub positional: Vec<Value>,
    /// Named placeholders such as `ch_id`
    pub named: HashMap<String, Value>,
}

impl Captures {
    pub fn get(&self, name: &str) -> Option<&Value> {
        self.named.get(name)
    }
}

/// A compiled setter pattern
#[derive(Debug, Clone)]
pub struct Pattern {
    source: String,
    regex: Regex,
    slots: Vec<(Slot, Conversion)>,
}

impl Pattern {
    pub fn compile(source: &str) -> Result<Self, PatternError> {
        let mut expr = String::from("^");
        let mut literal = String::new();
        let mut slots = Vec::new();
        let mut chars = source.chars().peekable();

        while let Some(c) = chars.next() {
            match c {
                '{' if chars.peek() == Some(&'{') => {
                    chars.next();
                    literal.push('{');
                }
                '}' if chars.peek() == Some(&'}') => {
                    chars.next();
                    literal.push('}');
                }
                '}' => return Err(PatternError::new(source, "single '}' encountered")),
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some(ch) => body.push(ch),
                            None => return Err(PatternError::new(source, "unterminated field")),
                        }
                    }
                    expr.push_str(&regex::escape(&std::mem::take(&mut literal)));

                    let (name, spec) = body.split_once(':').unwrap_or((body.as_str(), ""));
                    let slot = match name {
                        "" | "0" => Slot::Positional,
                        n if n.chars().all(|c| c.is_ascii_alphanumeric() || c == '_') => {
                            Slot::Named(n.to_string())
                        }
                        n => {
                            return Err(PatternError::new(
                                source,
                                format!("unsupported field name '{}'", n),
                            ))
                        }
                    };
                    let conversion =
                        Conversion::from_spec(spec).map_err(|e| PatternError::new(source, e))?;
                    expr.push('(');
                    expr.push_str(conversion.regex());
                    expr.push(')');
                    slots.push((slot, conversion));
                }
                other => literal.push(other),
            }
        }
        expr.push_str(&regex::escape(&literal));
        expr.push('$');

        let regex = Regex::new(&expr).map_err(|e| PatternError::new(source, e.to_string()))?;
        Ok(Self {
            source: source.to_string(),
            regex,
            slots,
        })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    /// Match a query, returning the typed captures or `None`
    pub fn captures(&self, query: &str) -> Option<Captures> {
        let found = self.regex.captures(query)?;
        let mut out = Captures::default();
        for (i, (slot, conversion)) in self.slots.iter().enumerate() {
            let text = found.get(i + 1)?.as_str();
            let value = conversion.convert(text)?;
            match slot {
                Slot::Positional => out.positional.push(value),
                Slot::Named(name) => {
                    out.named.insert(name.clone(), value);
                }
            }
        }
        Some(out)
    }
}

impl PartialEq for Pattern {
    fn eq(&self, other: &Self) -> bool {
        self.source == other.source
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_float_placeholder() {
        let p = Pattern::compile("!FREQ {:.2f}").unwrap();
        let c = p.captures("!FREQ 10.3").unwrap();
        assert_eq!(c.positional, vec![Value::Float(10.3)]);
        assert_eq!(p.captures("!FREQ 5").unwrap().positional, vec![Value::Float(5.0)]);
        assert_eq!(p.captures("!FREQ -1e3").unwrap().positional, vec![Value::Float(-1000.0)]);
        assert!(p.captures("!FREQ abc").is_none());
        assert!(p.captures("!FREQ 10.3 extra").is_none());
        assert!(p.captures("?FREQ").is_none());
    }

    #[test]
    fn test_int_placeholder() {
        let p = Pattern::compile("!OUT {:d}").unwrap();
        assert_eq!(p.captures("!OUT 1").unwrap().positional, vec![Value::Int(1)]);
        assert_eq!(p.captures("!OUT -23").unwrap().positional, vec![Value::Int(-23)]);
        assert!(p.captures("!OUT 1.5").is_none());
    }

    #[test]
    fn test_hex_placeholder() {
        let p = Pattern::compile("ADDR {:x}").unwrap();
        assert_eq!(p.captures("ADDR 0x1F").unwrap().positional, vec![Value::Int(31)]);
        assert_eq!(p.captures("ADDR ff").unwrap().positional, vec![Value::Int(255)]);
    }

    #[test]
    fn test_untyped_placeholder_is_text() {
        let p = Pattern::compile("NAME {}").unwrap();
        assert_eq!(
            p.captures("NAME hello world").unwrap().positional,
            vec![Value::from("hello world")]
        );
        assert!(p.captures("NAME ").is_none());
    }

    #[test]
    fn test_named_channel_placeholder() {
        let p = Pattern::compile("CH {ch_id}:VOLT:IMM:AMPL {:+.8E}").unwrap();
        let c = p.captures("CH 1:VOLT:IMM:AMPL 2.0").unwrap();
        assert_eq!(c.get("ch_id"), Some(&Value::from("1")));
        assert_eq!(c.positional, vec![Value::Float(2.0)]);
        assert!(p.captures("CH 1:VOLT:IMM:AMPL?").is_none());
    }

    #[test]
    fn test_literal_metacharacters_are_escaped() {
        let p = Pattern::compile("*SRE {:d}").unwrap();
        assert!(p.captures("*SRE 4").is_some());
        assert!(p.captures("SRE 4").is_none());

        let p = Pattern::compile(":VOLT:IMM:AMPL {:+.4E}").unwrap();
        assert_eq!(
            p.captures(":VOLT:IMM:AMPL 0").unwrap().positional,
            vec![Value::Float(0.0)]
        );
    }

    #[test]
    fn test_no_placeholders() {
        let p = Pattern::compile("!CAL").unwrap();
        assert_eq!(p.captures("!CAL"), Some(Captures::default()));
        assert!(p.captures("!CALX").is_none());
    }

    #[test]
    fn test_compile_errors() {
        assert!(Pattern::compile("X {").is_err());
        assert!(Pattern::compile("X }").is_err());
        assert!(Pattern::compile("X {:q}").is_err());
        assert!(Pattern::compile("X {a-b}").is_err());
    }
}
