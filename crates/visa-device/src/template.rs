//! Response templates
//!
//! Getter responses and per-channel command keys are written with the brace
//! format mini-language used by instrument definition files:
//!
//! ```text
//! {[field][:[[fill]align][sign][#][0][width][.precision][type]]}
//! ```
//!
//! `field` is empty or `0` for the formatted property value, or a name such as
//! `ch_id` for channel rendering. Supported types are `d x X o b` (integers),
//! `f F e E g G` (numbers) and `s` (text). `{{` and `}}` produce literal braces.

use crate::error::TemplateError;
use crate::value::Value;

/// A compiled template
#[derive(Debug, Clone, PartialEq)]
pub struct Template {
    source: String,
    pieces: Vec<Piece>,
}

#[derive(Debug, Clone, PartialEq)]
enum Piece {
    Literal(String),
    Field { field: Field, spec: FormatSpec },
}

#[derive(Debug, Clone, PartialEq)]
enum Field {
    Positional,
    Named(String),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Align {
    Left,
    Right,
    Center,
    AfterSign,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Sign {
    Minus,
    Plus,
    Space,
}

#[derive(Debug, Clone, PartialEq, Default)]
struct FormatSpec {
    fill: Option<char>,
    align: Option<Align>,
    sign: Option<Sign>,
    alternate: bool,
    width: usize,
    precision: Option<usize>,
    kind: Option<char>,
}

impl Template {
    /// Compile a template
    pub fn parse(source: &str) -> Result<Self, TemplateError> {
        let mut pieces = Vec::new();
        let mut literal = String::new();
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
                '}' => return Err(TemplateError::new(source, "single '}' encountered")),
                '{' => {
                    let mut body = String::new();
                    loop {
                        match chars.next() {
                            Some('}') => break,
                            Some('{') => {
                                return Err(TemplateError::new(source, "nested fields are not supported"))
                            }
                            Some(ch) => body.push(ch),
                            None => return Err(TemplateError::new(source, "unterminated field")),
                        }
                    }
                    if !literal.is_empty() {
                        pieces.push(Piece::Literal(std::mem::take(&mut literal)));
                    }
                    let (name, spec) = match body.split_once(':') {
                        Some((name, spec)) => (name, spec),
                        None => (body.as_str(), ""),
                    };
                    let field = match name {
                        "" | "0" => Field::Positional,
                        n if n.chars().all(|c| c.is_ascii_alphanumeric() || c == '_')
                            && !n.starts_with(|c: char| c.is_ascii_digit()) =>
                        {
                            Field::Named(n.to_string())
                        }
                        n => {
                            return Err(TemplateError::new(
                                source,
                                format!("unsupported field name '{}'", n),
                            ))
                        }
                    };
                    let spec = FormatSpec::parse(spec).map_err(|e| TemplateError::new(source, e))?;
                    pieces.push(Piece::Field { field, spec });
                }
                other => literal.push(other),
            }
        }
        if !literal.is_empty() {
            pieces.push(Piece::Literal(literal));
        }

        Ok(Self {
            source: source.to_string(),
            pieces,
        })
    }

    /// Template text as written
    pub fn source(&self) -> &str {
        &self.source
    }

    /// True when the template has no replacement fields
    pub fn is_literal(&self) -> bool {
        self.pieces.iter().all(|p| matches!(p, Piece::Literal(_)))
    }

    /// Format a single positional value into the template
    pub fn format_value(&self, value: &Value) -> Result<String, TemplateError> {
        self.render(|field| match field {
            Field::Positional => Some(value),
            Field::Named(_) => None,
        })
    }

    /// Substitute a named field, leaving no positional fields allowed
    pub fn render_named(&self, name: &str, value: &Value) -> Result<String, TemplateError> {
        self.render(|field| match field {
            Field::Named(n) if n == name => Some(value),
            _ => None,
        })
    }

    fn render<'a>(&self, lookup: impl Fn(&Field) -> Option<&'a Value>) -> Result<String, TemplateError> {
        let mut out = String::new();
        for piece in &self.pieces {
            match piece {
                Piece::Literal(s) => out.push_str(s),
                Piece::Field { field, spec } => {
                    let value = lookup(field).ok_or_else(|| {
                        let what = match field {
                            Field::Positional => "positional field".to_string(),
                            Field::Named(n) => format!("field '{}'", n),
                        };
                        TemplateError::new(&self.source, format!("no value for {}", what))
                    })?;
                    let text = spec
                        .apply(value)
                        .map_err(|e| TemplateError::new(&self.source, e))?;
                    out.push_str(&text);
                }
            }
        }
        Ok(out)
    }
}

impl FormatSpec {
    fn parse(spec: &str) -> Result<Self, String> {
        let chars: Vec<char> = spec.chars().collect();
        let mut out = FormatSpec::default();
        let mut i = 0;

        let align_of = |c: char| match c {
            '<' => Some(Align::Left),
            '>' => Some(Align::Right),
            '^' => Some(Align::Center),
            '=' => Some(Align::AfterSign),
            _ => None,
        };

        if chars.len() >= 2 && align_of(chars[1]).is_some() {
            out.fill = Some(chars[0]);
            out.align = align_of(chars[1]);
            i = 2;
        } else if let Some(align) = chars.first().and_then(|c| align_of(*c)) {
            out.align = Some(align);
            i = 1;
        }

        match chars.get(i) {
            Some('+') => out.sign = Some(Sign::Plus),
            Some('-') => out.sign = Some(Sign::Minus),
            Some(' ') => out.sign = Some(Sign::Space),
            _ => {}
        }
        if out.sign.is_some() {
            i += 1;
        }

        if chars.get(i) == Some(&'#') {
            out.alternate = true;
            i += 1;
        }

        if chars.get(i) == Some(&'0') {
            if out.fill.is_none() {
                out.fill = Some('0');
            }
            if out.align.is_none() {
                out.align = Some(Align::AfterSign);
            }
            i += 1;
        }

        let start = i;
        while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
            i += 1;
        }
        if i > start {
            out.width = chars[start..i]
                .iter()
                .collect::<String>()
                .parse()
                .map_err(|_| "invalid width".to_string())?;
        }

        if chars.get(i) == Some(&'.') {
            i += 1;
            let start = i;
            while chars.get(i).is_some_and(|c| c.is_ascii_digit()) {
                i += 1;
            }
            if i == start {
                return Err("format specifier missing precision".into());
            }
            out.precision = Some(
                chars[start..i]
                    .iter()
                    .collect::<String>()
                    .parse()
                    .map_err(|_| "invalid precision".to_string())?,
            );
        }

        if let Some(&kind) = chars.get(i) {
            if !"dxXobfFeEgGs".contains(kind) {
                return Err(format!("unknown format code '{}'", kind));
            }
            out.kind = Some(kind);
            i += 1;
        }

        if i != chars.len() {
            return Err(format!("invalid format specifier '{}'", spec));
        }
        Ok(out)
    }

    fn apply(&self, value: &Value) -> Result<String, String> {
        let incompatible = || {
            format!(
                "unknown format code '{}' for value of type {}",
                self.kind.unwrap_or(' '),
                value.kind().name()
            )
        };

        let (negative, body) = match (self.kind, value) {
            (None | Some('s'), Value::Str(s)) => {
                let text = match self.precision {
                    Some(p) => s.chars().take(p).collect(),
                    None => s.clone(),
                };
                if self.sign.is_some() {
                    return Err("sign not allowed in string format specifier".into());
                }
                return Ok(self.pad("", text, Align::Left));
            }
            (Some('s'), _) => return Err(incompatible()),
            (_, Value::Str(_)) => return Err(incompatible()),
            (None, Value::Int(v)) => match self.precision {
                Some(p) => format_general(*v as f64, Some(p), false, self.alternate),
                None => (*v < 0, v.unsigned_abs().to_string()),
            },
            (Some(k @ ('d' | 'x' | 'X' | 'o' | 'b')), Value::Int(v)) => {
                let magnitude = v.unsigned_abs();
                let digits = match k {
                    'd' => magnitude.to_string(),
                    'x' => format!("{}{:x}", if self.alternate { "0x" } else { "" }, magnitude),
                    'X' => format!("{}{:X}", if self.alternate { "0X" } else { "" }, magnitude),
                    'o' => format!("{}{:o}", if self.alternate { "0o" } else { "" }, magnitude),
                    _ => format!("{}{:b}", if self.alternate { "0b" } else { "" }, magnitude),
                };
                (*v < 0, digits)
            }
            (Some('d' | 'x' | 'X' | 'o' | 'b'), Value::Float(_)) => return Err(incompatible()),
            (None, Value::Float(v)) => match self.precision {
                Some(p) => format_general(*v, Some(p), false, self.alternate),
                None => (v.is_sign_negative() && *v != 0.0, Value::Float(v.abs()).to_string()),
            },
            (Some(k), number) => {
                let v = number.as_f64().ok_or_else(incompatible)?;
                match k {
                    'f' | 'F' => format_fixed(v, self.precision.unwrap_or(6), k == 'F'),
                    'e' | 'E' => format_exponent(v, self.precision.unwrap_or(6), k == 'E'),
                    _ => format_general(v, self.precision, k == 'G', self.alternate),
                }
            }
        };

        let sign = match (negative, self.sign) {
            (true, _) => "-",
            (false, Some(Sign::Plus)) => "+",
            (false, Some(Sign::Space)) => " ",
            (false, _) => "",
        };
        Ok(self.pad(sign, body, Align::Right))
    }

    fn pad(&self, sign: &str, body: String, default_align: Align) -> String {
        let len = sign.chars().count() + body.chars().count();
        if len >= self.width {
            return format!("{}{}", sign, body);
        }
        let fill: String = std::iter::repeat(self.fill.unwrap_or(' '))
            .take(self.width - len)
            .collect();
        match self.align.unwrap_or(default_align) {
            Align::Left => format!("{}{}{}", sign, body, fill),
            Align::Right => format!("{}{}{}", fill, sign, body),
            Align::AfterSign => format!("{}{}{}", sign, fill, body),
            Align::Center => {
                let split = fill.chars().count() / 2;
                let (before, after): (String, String) = (
                    fill.chars().take(split).collect(),
                    fill.chars().skip(split).collect(),
                );
                format!("{}{}{}{}", before, sign, body, after)
            }
        }
    }
}

fn non_finite(v: f64, upper: bool) -> Option<(bool, String)> {
    if v.is_finite() {
        return None;
    }
    let text = if v.is_nan() { "nan" } else { "inf" };
    let text = if upper { text.to_uppercase() } else { text.to_string() };
    Some((v.is_sign_negative() && !v.is_nan(), text))
}

/// Fixed-point digits of |v| and whether v is negative
fn format_fixed(v: f64, precision: usize, upper: bool) -> (bool, String) {
    if let Some(special) = non_finite(v, upper) {
        return special;
    }
    (v.is_sign_negative() && v != 0.0, format!("{:.*}", precision, v.abs()))
}

/// Scientific digits of |v| with a signed, at least two-digit exponent
fn format_exponent(v: f64, precision: usize, upper: bool) -> (bool, String) {
    if let Some(special) = non_finite(v, upper) {
        return special;
    }
    let (mantissa, exponent) = split_exponent(v.abs(), precision);
    let e = if upper { 'E' } else { 'e' };
    let sign = if exponent < 0 { '-' } else { '+' };
    (
        v.is_sign_negative() && v != 0.0,
        format!("{}{}{}{:02}", mantissa, e, sign, exponent.abs()),
    )
}

fn split_exponent(v: f64, precision: usize) -> (String, i32) {
    let formatted = format!("{:.*e}", precision, v);
    match formatted.split_once('e') {
        Some((mantissa, exp)) => (mantissa.to_string(), exp.parse().unwrap_or(0)),
        None => (formatted, 0),
    }
}

fn format_general(v: f64, precision: Option<usize>, upper: bool, keep_zeros: bool) -> (bool, String) {
    if let Some(special) = non_finite(v, upper) {
        return special;
    }
    let p = precision.unwrap_or(6).max(1);
    let negative = v.is_sign_negative() && v != 0.0;
    let magnitude = v.abs();
    let exponent = if magnitude == 0.0 {
        0
    } else {
        split_exponent(magnitude, p - 1).1
    };

    let mut text = if exponent >= -4 && (exponent as i64) < p as i64 {
        let decimals = (p as i64 - 1 - exponent as i64).max(0) as usize;
        format!("{:.*}", decimals, magnitude)
    } else {
        format_exponent(magnitude, p - 1, upper).1
    };

    if !keep_zeros {
        let (number, suffix) = match text.find(['e', 'E']) {
            Some(pos) => (text[..pos].to_string(), text[pos..].to_string()),
            None => (text.clone(), String::new()),
        };
        let number = if number.contains('.') {
            number.trim_end_matches('0').trim_end_matches('.').to_string()
        } else {
            number
        };
        text = format!("{}{}", number, suffix);
    }
    (negative, text)
}
