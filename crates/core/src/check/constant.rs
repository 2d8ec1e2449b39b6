//! Compile-time constant values and literal decoding.

use std::fmt;

use super::types::BasicKind;

#[derive(Debug, Clone, PartialEq)]
pub enum ConstValue {
    Bool(bool),
    Str(String),
    Int(i128),
    Float(f64),
}

impl ConstValue {
    pub fn as_f64(&self) -> Option<f64> {
        match self {
            ConstValue::Int(i) => Some(*i as f64),
            ConstValue::Float(f) => Some(*f),
            _ => None,
        }
    }

    /// Integer value, also for floats without a fractional part.
    pub fn as_int(&self) -> Option<i128> {
        match self {
            ConstValue::Int(i) => Some(*i),
            ConstValue::Float(f) if f.fract() == 0.0 && f.is_finite() && f.abs() < 1e38 => {
                Some(*f as i128)
            }
            _ => None,
        }
    }

    pub fn as_str(&self) -> Option<&str> {
        match self {
            ConstValue::Str(s) => Some(s),
            _ => None,
        }
    }

    pub fn is_zero(&self) -> bool {
        match self {
            ConstValue::Int(i) => *i == 0,
            ConstValue::Float(f) => *f == 0.0,
            _ => false,
        }
    }

    /// Value converted to the representation of `kind`, or `None` if it
    /// does not fit.
    pub fn represent(&self, kind: BasicKind) -> Option<ConstValue> {
        if kind.is_boolean() {
            return matches!(self, ConstValue::Bool(_)).then(|| self.clone());
        }
        if kind.is_string() {
            return matches!(self, ConstValue::Str(_)).then(|| self.clone());
        }
        if kind.is_integer() {
            let v = self.as_int()?;
            return match kind.int_range() {
                Some((lo, hi)) if v < lo || v > hi => None,
                _ => Some(ConstValue::Int(v)),
            };
        }
        if kind.is_float() {
            let v = self.as_f64()?;
            if kind == BasicKind::Float32 && v.is_finite() && v.abs() > f32::MAX as f64 {
                return None;
            }
            return Some(ConstValue::Float(v));
        }
        None
    }

    pub fn unary(op: &str, x: &ConstValue) -> Option<ConstValue> {
        Some(match (op, x) {
            ("+", v @ (ConstValue::Int(_) | ConstValue::Float(_))) => v.clone(),
            ("-", ConstValue::Int(i)) => ConstValue::Int(i.checked_neg()?),
            ("-", ConstValue::Float(f)) => ConstValue::Float(-f),
            ("^", ConstValue::Int(i)) => ConstValue::Int(!i),
            ("!", ConstValue::Bool(b)) => ConstValue::Bool(!b),
            _ => return None,
        })
    }

    /// Fold `x op y`. `integer` selects truncating division.
    pub fn binary(
        op: &str,
        x: &ConstValue,
        y: &ConstValue,
        integer: bool,
    ) -> Result<ConstValue, &'static str> {
        use ConstValue::*;
        match (x, y) {
            (Str(a), Str(b)) if op == "+" => Ok(Str(format!("{}{}", a, b))),
            (Bool(a), Bool(b)) => match op {
                "&&" => Ok(Bool(*a && *b)),
                "||" => Ok(Bool(*a || *b)),
                _ => Err("operator not defined"),
            },
            (Int(a), Int(b)) if integer || !matches!(op, "/") => {
                let (a, b) = (*a, *b);
                let v = match op {
                    "+" => a.checked_add(b),
                    "-" => a.checked_sub(b),
                    "*" => a.checked_mul(b),
                    "/" | "%" if b == 0 => return Err("division by zero"),
                    "/" => a.checked_div(b),
                    "%" => a.checked_rem(b),
                    "&" => Some(a & b),
                    "|" => Some(a | b),
                    "^" => Some(a ^ b),
                    "&^" => Some(a & !b),
                    _ => return Err("operator not defined"),
                };
                v.map(Int).ok_or("constant overflow")
            }
            _ => {
                let (a, b) = match (x.as_f64(), y.as_f64()) {
                    (Some(a), Some(b)) => (a, b),
                    _ => return Err("operator not defined"),
                };
                let v = match op {
                    "+" => a + b,
                    "-" => a - b,
                    "*" => a * b,
                    "/" if b == 0.0 => return Err("division by zero"),
                    "/" => a / b,
                    _ => return Err("operator not defined"),
                };
                Ok(Float(v))
            }
        }
    }

    pub fn compare(op: &str, x: &ConstValue, y: &ConstValue) -> Option<bool> {
        use std::cmp::Ordering;
        let ord = match (x, y) {
            (ConstValue::Str(a), ConstValue::Str(b)) => a.cmp(b),
            (ConstValue::Bool(a), ConstValue::Bool(b)) => {
                return match op {
                    "==" => Some(a == b),
                    "!=" => Some(a != b),
                    _ => None,
                }
            }
            (ConstValue::Int(a), ConstValue::Int(b)) => a.cmp(b),
            _ => x.as_f64()?.partial_cmp(&y.as_f64()?)?,
        };
        Some(match op {
            "==" => ord == Ordering::Equal,
            "!=" => ord != Ordering::Equal,
            "<" => ord == Ordering::Less,
            "<=" => ord != Ordering::Greater,
            ">" => ord == Ordering::Greater,
            ">=" => ord != Ordering::Less,
            _ => return None,
        })
    }

    pub fn shift(op: &str, x: &ConstValue, n: u32) -> Option<ConstValue> {
        let v = x.as_int()?;
        Some(ConstValue::Int(match op {
            "<<" => v.checked_shl(n).filter(|r| r >> n == v)?,
            ">>" => v.checked_shr(n).unwrap_or(if v < 0 { -1 } else { 0 }),
            _ => return None,
        }))
    }

    // -- Literal decoding --

    pub fn parse_int(raw: &str) -> Option<i128> {
        let s: String = raw.chars().filter(|c| *c != '_').collect();
        let lower = s.to_ascii_lowercase();
        if let Some(hex) = lower.strip_prefix("0x") {
            i128::from_str_radix(hex, 16).ok()
        } else if let Some(bin) = lower.strip_prefix("0b") {
            i128::from_str_radix(bin, 2).ok()
        } else if let Some(oct) = lower.strip_prefix("0o") {
            i128::from_str_radix(oct, 8).ok()
        } else if lower.len() > 1 && lower.starts_with('0') {
            i128::from_str_radix(&lower[1..], 8).ok()
        } else {
            lower.parse().ok()
        }
    }

    pub fn parse_float(raw: &str) -> Option<f64> {
        let s: String = raw.chars().filter(|c| *c != '_').collect();
        s.parse().ok()
    }

    /// Decode a rune literal including its quotes.
    pub fn parse_rune(raw: &str) -> Option<i128> {
        let inner = raw.strip_prefix('\'')?.strip_suffix('\'')?;
        let bytes = unescape(inner, '\'')?;
        let s = String::from_utf8(bytes.clone()).ok();
        match s.as_deref().map(|s| s.chars().collect::<Vec<_>>()) {
            Some(chars) if chars.len() == 1 => Some(chars[0] as i128),
            _ if bytes.len() == 1 => Some(bytes[0] as i128),
            _ => None,
        }
    }

    /// Decode an interpreted (`"..."`) or raw (`` `...` ``) string literal.
    pub fn parse_string(raw: &str) -> Option<String> {
        if let Some(inner) = raw.strip_prefix('`').and_then(|s| s.strip_suffix('`')) {
            return Some(inner.replace('\r', ""));
        }
        let inner = raw.strip_prefix('"')?.strip_suffix('"')?;
        let bytes = unescape(inner, '"')?;
        Some(String::from_utf8_lossy(&bytes).into_owned())
    }
}

impl fmt::Display for ConstValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            ConstValue::Bool(b) => write!(f, "{}", b),
            ConstValue::Str(s) => write!(f, "{}", quote(s)),
            ConstValue::Int(i) => write!(f, "{}", i),
            ConstValue::Float(v) => write!(f, "{}", v),
        }
    }
}

fn unescape(s: &str, quote_char: char) -> Option<Vec<u8>> {
    let mut out = Vec::new();
    let mut chars = s.chars().peekable();
    while let Some(c) = chars.next() {
        if c != '\\' {
            let mut buf = [0u8; 4];
            out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            continue;
        }
        let esc = chars.next()?;
        let simple = match esc {
            'a' => Some(0x07),
            'b' => Some(0x08),
            'f' => Some(0x0c),
            'n' => Some(b'\n'),
            'r' => Some(b'\r'),
            't' => Some(b'\t'),
            'v' => Some(0x0b),
            '\\' => Some(b'\\'),
            c if c == quote_char => Some(c as u8),
            _ => None,
        };
        if let Some(b) = simple {
            out.push(b);
            continue;
        }
        match esc {
            'x' => {
                let hex: String = (0..2).filter_map(|_| chars.next()).collect();
                out.push(u8::from_str_radix(&hex, 16).ok()?);
            }
            '0'..='7' => {
                let mut oct = String::from(esc);
                for _ in 0..2 {
                    oct.push(chars.next()?);
                }
                out.push(u8::from_str_radix(&oct, 8).ok()?);
            }
            'u' | 'U' => {
                let n = if esc == 'u' { 4 } else { 8 };
                let hex: String = (0..n).filter_map(|_| chars.next()).collect();
                let c = char::from_u32(u32::from_str_radix(&hex, 16).ok()?)?;
                let mut buf = [0u8; 4];
                out.extend_from_slice(c.encode_utf8(&mut buf).as_bytes());
            }
            _ => return None,
        }
    }
    Some(out)
}

/// Double-quoted Go string literal for `s`.
pub fn quote(s: &str) -> String {
    let mut out = String::with_capacity(s.len() + 2);
    out.push('"');
    for c in s.chars() {
        match c {
            '"' => out.push_str("\\\""),
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\t' => out.push_str("\\t"),
            '\r' => out.push_str("\\r"),
            '\x07' => out.push_str("\\a"),
            '\x08' => out.push_str("\\b"),
            '\x0c' => out.push_str("\\f"),
            '\x0b' => out.push_str("\\v"),
            c if c.is_control() => {
                let n = c as u32;
                if n < 0x80 {
                    out.push_str(&format!("\\x{:02x}", n));
                } else if n < 0x10000 {
                    out.push_str(&format!("\\u{:04x}", n));
                } else {
                    out.push_str(&format!("\\U{:08x}", n));
                }
            }
            c => out.push(c),
        }
    }
    out.push('"');
    out
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn integer_literal_bases() {
        assert_eq!(ConstValue::parse_int("0x1F"), Some(31));
        assert_eq!(ConstValue::parse_int("0b101"), Some(5));
        assert_eq!(ConstValue::parse_int("017"), Some(15));
        assert_eq!(ConstValue::parse_int("0o17"), Some(15));
        assert_eq!(ConstValue::parse_int("1_000"), Some(1000));
        assert_eq!(ConstValue::parse_int("0"), Some(0));
    }

    #[test]
    fn string_and_rune_escapes() {
        assert_eq!(
            ConstValue::parse_string(r#""a\tb\n\"c\"""#).as_deref(),
            Some("a\tb\n\"c\"")
        );
        assert_eq!(ConstValue::parse_string("`raw\\n`").as_deref(), Some("raw\\n"));
        assert_eq!(ConstValue::parse_rune("'a'"), Some(97));
        assert_eq!(ConstValue::parse_rune(r"'\n'"), Some(10));
        assert_eq!(ConstValue::parse_rune("'é'"), Some(0xe9));
    }

    #[test]
    fn untyped_division_depends_on_kind() {
        let five = ConstValue::Int(5);
        let two = ConstValue::Int(2);
        assert_eq!(
            ConstValue::binary("/", &five, &two, true),
            Ok(ConstValue::Int(2))
        );
        assert_eq!(
            ConstValue::binary("/", &ConstValue::Float(5.0), &two, false),
            Ok(ConstValue::Float(2.5))
        );
        assert_eq!(
            ConstValue::binary("%", &five, &ConstValue::Int(0), true),
            Err("division by zero")
        );
    }

    #[test]
    fn representability() {
        assert_eq!(
            ConstValue::Float(3.0).represent(BasicKind::Int),
            Some(ConstValue::Int(3))
        );
        assert_eq!(ConstValue::Float(2.5).represent(BasicKind::Int), None);
        assert_eq!(ConstValue::Int(300).represent(BasicKind::Int8), None);
        assert_eq!(
            ConstValue::Int(7).represent(BasicKind::Float64),
            Some(ConstValue::Float(7.0))
        );
    }

    #[test]
    fn quoting_escapes_controls() {
        assert_eq!(quote("a\"b\n"), r#""a\"b\n""#);
        assert_eq!(quote("\u{1}"), r#""\x01""#);
        assert_eq!(quote("héllo"), "\"héllo\"");
    }

    #[test]
    fn display_matches_go_constant_text() {
        assert_eq!(ConstValue::Float(2.5).to_string(), "2.5");
        assert_eq!(ConstValue::Float(10.0).to_string(), "10");
        assert_eq!(ConstValue::Str("x".into()).to_string(), "\"x\"");
    }
}
