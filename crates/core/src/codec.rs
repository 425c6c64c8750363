//! Closed set of value codecs between domain [`Value`]s and the analytical
//! store's text wire format.
//!
//! Every codec implements the round-trip law `decode(encode(v)) == v` for the
//! canonical values of its domain, and `encode` never produces a newline:
//! string-like payloads are escaped the way the store's tab-separated input
//! format expects (`\\`, `\n`, `\r`, `\0`). Tab characters are deliberately
//! left untouched so that the tab-separated serializer can reject them.

use rust_decimal::{Decimal, RoundingStrategy};
use std::fmt;
use std::net::IpAddr;
use time::macros::{date, datetime, format_description};
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

use crate::record::Record;
use crate::value::Value;

/// Fractional digits of money amounts (bus amounts are integers scaled by 10^5).
pub const MONEY_SCALE: u32 = 5;

/// Token the store uses for an empty array.
pub const EMPTY_ARRAY: &str = "[]";

/// rust_decimal carries at most 28 fractional digits.
const MAX_DECIMAL_SCALE: u32 = 28;

// ──────────────────────────────────────────────
// Errors
// ──────────────────────────────────────────────

/// Errors raised while converting between values and wire text.
#[derive(Debug, Clone, PartialEq, thiserror::Error)]
pub enum CodecError {
    /// The value's variant is outside the codec's domain.
    #[error("{codec} cannot encode a {got} value")]
    TypeMismatch { codec: String, got: &'static str },

    /// The value has the right variant but does not fit the wire type.
    #[error("value {value} is out of range for {codec}")]
    OutOfRange { codec: String, value: String },

    /// Wire text could not be parsed.
    #[error("cannot decode '{wire}' as {codec}: {message}")]
    Malformed {
        codec: String,
        wire: String,
        message: String,
    },
}

// ──────────────────────────────────────────────
// Codec
// ──────────────────────────────────────────────

/// Fixed-point decimal parameters. The three named widths are the store's
/// `Decimal32(S)`, `Decimal64(S)` and `Decimal128(S)` shorthands.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DecimalSpec {
    D32(u32),
    D64(u32),
    D128(u32),
    Custom { precision: u32, scale: u32 },
}

impl DecimalSpec {
    pub fn precision(&self) -> u32 {
        match self {
            DecimalSpec::D32(_) => 9,
            DecimalSpec::D64(_) => 18,
            DecimalSpec::D128(_) => 38,
            DecimalSpec::Custom { precision, .. } => *precision,
        }
    }

    pub fn scale(&self) -> u32 {
        match self {
            DecimalSpec::D32(s) | DecimalSpec::D64(s) | DecimalSpec::D128(s) => *s,
            DecimalSpec::Custom { scale, .. } => *scale,
        }
    }

    fn type_name(&self) -> String {
        match self {
            DecimalSpec::D32(s) => format!("Decimal32({})", s),
            DecimalSpec::D64(s) => format!("Decimal64({})", s),
            DecimalSpec::D128(s) => format!("Decimal128({})", s),
            DecimalSpec::Custom { precision, scale } => {
                format!("Decimal({}, {})", precision, scale)
            }
        }
    }
}

/// One `'name' = value` member of an `Enum8`/`Enum16` type.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnumVariant {
    pub name: String,
    pub value: i16,
}

impl EnumVariant {
    pub fn new(name: impl Into<String>, value: i16) -> Self {
        EnumVariant {
            name: name.into(),
            value,
        }
    }
}

/// A value codec. See the module docs for the wire conventions.
#[derive(Debug, Clone, PartialEq)]
pub enum Codec {
    UInt8,
    UInt16,
    UInt32,
    UInt64,
    Int8,
    Int16,
    Int32,
    Int64,
    /// Stored as `UInt8` 0/1.
    Bool,
    Float32,
    Float64,
    String,
    Enum8(Vec<EnumVariant>),
    Enum16(Vec<EnumVariant>),
    Uuid,
    /// Stored as `String`.
    IpAddress,
    Date,
    DateTime,
    Decimal(DecimalSpec),
    /// Amount only, as `Decimal64(5)`.
    Money,
    Array(Box<Codec>),
    /// String column fed from the record's open attribute map under this key.
    Dimension(String),
    /// Permissive string-like codec for wire types nobody anticipated.
    /// Keeps the reported type name so DDL stays faithful.
    Fallback(String),
}

impl fmt::Display for Codec {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.wire_type_name())
    }
}

impl Codec {
    pub fn decimal32(scale: u32) -> Self {
        Codec::Decimal(DecimalSpec::D32(scale))
    }

    pub fn decimal64(scale: u32) -> Self {
        Codec::Decimal(DecimalSpec::D64(scale))
    }

    pub fn decimal128(scale: u32) -> Self {
        Codec::Decimal(DecimalSpec::D128(scale))
    }

    pub fn decimal(precision: u32, scale: u32) -> Self {
        Codec::Decimal(DecimalSpec::Custom { precision, scale })
    }

    pub fn array(items: Codec) -> Self {
        Codec::Array(Box::new(items))
    }

    pub fn dimension(key: impl Into<String>) -> Self {
        Codec::Dimension(key.into())
    }

    /// The type name used in DDL and reported by `DESCRIBE`.
    pub fn wire_type_name(&self) -> String {
        match self {
            Codec::UInt8 | Codec::Bool => "UInt8".to_string(),
            Codec::UInt16 => "UInt16".to_string(),
            Codec::UInt32 => "UInt32".to_string(),
            Codec::UInt64 => "UInt64".to_string(),
            Codec::Int8 => "Int8".to_string(),
            Codec::Int16 => "Int16".to_string(),
            Codec::Int32 => "Int32".to_string(),
            Codec::Int64 => "Int64".to_string(),
            Codec::Float32 => "Float32".to_string(),
            Codec::Float64 => "Float64".to_string(),
            Codec::String | Codec::IpAddress | Codec::Dimension(_) => "String".to_string(),
            Codec::Enum8(variants) => enum_type_name("Enum8", variants),
            Codec::Enum16(variants) => enum_type_name("Enum16", variants),
            Codec::Uuid => "UUID".to_string(),
            Codec::Date => "Date".to_string(),
            Codec::DateTime => "DateTime".to_string(),
            Codec::Decimal(spec) => spec.type_name(),
            Codec::Money => DecimalSpec::D64(MONEY_SCALE).type_name(),
            Codec::Array(items) => format!("Array({})", items.wire_type_name()),
            Codec::Fallback(name) => name.clone(),
        }
    }

    /// Value used when a record lacks a field this codec's column expects.
    pub fn default_value(&self) -> Value {
        match self {
            Codec::UInt8 | Codec::UInt16 | Codec::UInt32 | Codec::UInt64 => Value::UInt(0),
            Codec::Int8 | Codec::Int16 | Codec::Int32 | Codec::Int64 => Value::Int(0),
            Codec::Bool => Value::Bool(false),
            Codec::Float32 | Codec::Float64 => Value::Float(0.0),
            Codec::String | Codec::Dimension(_) | Codec::Fallback(_) => Value::Text(String::new()),
            Codec::Enum8(variants) | Codec::Enum16(variants) => Value::Enum(
                variants
                    .first()
                    .map(|v| v.name.clone())
                    .unwrap_or_default(),
            ),
            Codec::Uuid => Value::Uuid(Uuid::nil()),
            Codec::IpAddress => Value::Ip(IpAddr::from([0, 0, 0, 0])),
            Codec::Date => Value::Date(date!(1970 - 01 - 01)),
            Codec::DateTime => Value::DateTime(datetime!(1970 - 01 - 01 0:00)),
            Codec::Decimal(_) | Codec::Money => Value::Decimal(Decimal::ZERO),
            Codec::Array(_) => Value::Array(Vec::new()),
        }
    }

    /// Encode a domain value into wire text.
    pub fn encode(&self, value: &Value) -> Result<String, CodecError> {
        match self {
            Codec::UInt8 => self.encode_unsigned(value, u8::MAX as u64),
            Codec::UInt16 => self.encode_unsigned(value, u16::MAX as u64),
            Codec::UInt32 => self.encode_unsigned(value, u32::MAX as u64),
            Codec::UInt64 => self.encode_unsigned(value, u64::MAX),
            Codec::Int8 => self.encode_signed(value, i8::MIN as i64, i8::MAX as i64),
            Codec::Int16 => self.encode_signed(value, i16::MIN as i64, i16::MAX as i64),
            Codec::Int32 => self.encode_signed(value, i32::MIN as i64, i32::MAX as i64),
            Codec::Int64 => self.encode_signed(value, i64::MIN, i64::MAX),
            Codec::Bool => match value {
                Value::Bool(true) => Ok("1".to_string()),
                Value::Bool(false) => Ok("0".to_string()),
                other => Err(self.mismatch(other)),
            },
            Codec::Float32 => match value {
                Value::Float(x) => Ok((*x as f32).to_string()),
                Value::Decimal(d) => Ok(d.to_string()),
                Value::Int(n) => Ok(n.to_string()),
                Value::UInt(n) => Ok(n.to_string()),
                other => Err(self.mismatch(other)),
            },
            Codec::Float64 => match value {
                Value::Float(x) => Ok(x.to_string()),
                Value::Decimal(d) => Ok(d.to_string()),
                Value::Int(n) => Ok(n.to_string()),
                Value::UInt(n) => Ok(n.to_string()),
                other => Err(self.mismatch(other)),
            },
            Codec::String | Codec::Dimension(_) => match value {
                Value::Text(s) | Value::Enum(s) => Ok(escape(s)),
                other => Err(self.mismatch(other)),
            },
            Codec::Fallback(_) => Ok(escape(&value.to_string())),
            Codec::Enum8(variants) | Codec::Enum16(variants) => match value {
                Value::Enum(s) | Value::Text(s) => {
                    if !variants.is_empty() && !variants.iter().any(|v| v.name == *s) {
                        return Err(CodecError::OutOfRange {
                            codec: self.wire_type_name(),
                            value: s.clone(),
                        });
                    }
                    Ok(escape(s))
                }
                other => Err(self.mismatch(other)),
            },
            Codec::Uuid => match value {
                Value::Uuid(u) => Ok(u.hyphenated().to_string()),
                Value::Text(s) => Uuid::parse_str(s)
                    .map(|u| u.hyphenated().to_string())
                    .map_err(|e| self.malformed(s, e)),
                other => Err(self.mismatch(other)),
            },
            Codec::IpAddress => match value {
                Value::Ip(ip) => Ok(ip.to_string()),
                Value::Text(s) => s
                    .parse::<IpAddr>()
                    .map(|ip| ip.to_string())
                    .map_err(|e| self.malformed(s, e)),
                other => Err(self.mismatch(other)),
            },
            Codec::Date => match value {
                Value::Date(d) => format_date(*d).map_err(|e| self.malformed(&d.to_string(), e)),
                Value::DateTime(dt) => {
                    format_date(dt.date()).map_err(|e| self.malformed(&dt.to_string(), e))
                }
                other => Err(self.mismatch(other)),
            },
            Codec::DateTime => match value {
                Value::DateTime(dt) => {
                    format_datetime(*dt).map_err(|e| self.malformed(&dt.to_string(), e))
                }
                other => Err(self.mismatch(other)),
            },
            Codec::Decimal(spec) => {
                let d = match value {
                    Value::Decimal(d) => *d,
                    Value::Int(n) => Decimal::from(*n),
                    Value::UInt(n) => Decimal::from(*n),
                    other => return Err(self.mismatch(other)),
                };
                self.encode_fixed(d, *spec)
            }
            Codec::Money => match value {
                Value::Money { amount, .. } | Value::Decimal(amount) => {
                    self.encode_fixed(*amount, DecimalSpec::D64(MONEY_SCALE))
                }
                other => Err(self.mismatch(other)),
            },
            Codec::Array(items) => match value {
                Value::Array(values) if values.is_empty() => Ok(EMPTY_ARRAY.to_string()),
                Value::Array(values) => {
                    let mut encoded = Vec::with_capacity(values.len());
                    for v in values {
                        let text = items.encode(v)?;
                        if items.quoted_in_array() {
                            encoded.push(format!("'{}'", text.replace('\'', "\\'")));
                        } else {
                            encoded.push(text);
                        }
                    }
                    Ok(format!("[{}]", encoded.join(",")))
                }
                other => Err(self.mismatch(other)),
            },
        }
    }

    /// Decode wire text into a domain value.
    pub fn decode(&self, wire: &str) -> Result<Value, CodecError> {
        match self {
            Codec::UInt8 => self.decode_unsigned(wire, u8::MAX as u64),
            Codec::UInt16 => self.decode_unsigned(wire, u16::MAX as u64),
            Codec::UInt32 => self.decode_unsigned(wire, u32::MAX as u64),
            Codec::UInt64 => self.decode_unsigned(wire, u64::MAX),
            Codec::Int8 => self.decode_signed(wire, i8::MIN as i64, i8::MAX as i64),
            Codec::Int16 => self.decode_signed(wire, i16::MIN as i64, i16::MAX as i64),
            Codec::Int32 => self.decode_signed(wire, i32::MIN as i64, i32::MAX as i64),
            Codec::Int64 => self.decode_signed(wire, i64::MIN, i64::MAX),
            Codec::Bool => match wire {
                "1" | "true" => Ok(Value::Bool(true)),
                "0" | "false" => Ok(Value::Bool(false)),
                _ => Err(self.malformed(wire, "expected 0 or 1")),
            },
            Codec::Float32 => wire
                .parse::<f32>()
                .map(|x| Value::Float(x as f64))
                .map_err(|e| self.malformed(wire, e)),
            Codec::Float64 => wire
                .parse::<f64>()
                .map(Value::Float)
                .map_err(|e| self.malformed(wire, e)),
            Codec::String | Codec::Dimension(_) | Codec::Fallback(_) => {
                Ok(Value::Text(unescape(wire)))
            }
            Codec::Enum8(_) | Codec::Enum16(_) => Ok(Value::Enum(unescape(wire))),
            Codec::Uuid => Uuid::parse_str(wire)
                .map(Value::Uuid)
                .map_err(|e| self.malformed(wire, e)),
            Codec::IpAddress => wire
                .parse::<IpAddr>()
                .map(Value::Ip)
                .map_err(|e| self.malformed(wire, e)),
            Codec::Date => Date::parse(wire, format_description!("[year]-[month]-[day]"))
                .map(Value::Date)
                .map_err(|e| self.malformed(wire, e)),
            Codec::DateTime => PrimitiveDateTime::parse(
                wire,
                format_description!("[year]-[month]-[day] [hour]:[minute]:[second]"),
            )
            .map(Value::DateTime)
            .map_err(|e| self.malformed(wire, e)),
            Codec::Decimal(_) | Codec::Money => wire
                .parse::<Decimal>()
                .map(Value::Decimal)
                .map_err(|e| self.malformed(wire, e)),
            Codec::Array(items) => self.decode_array(items, wire),
        }
    }

    /// Encode the value a record holds for `column`.
    ///
    /// Dimension codecs read their key from the record's attribute map and
    /// fall back to an empty string. Every other codec reads the named field
    /// and falls back to [`Codec::default_value`] when the record lacks it.
    pub fn encode_field<R: Record + ?Sized>(
        &self,
        column: &str,
        record: &R,
    ) -> Result<String, CodecError> {
        match self {
            Codec::Dimension(key) => Ok(escape(
                record
                    .dimensions()
                    .and_then(|dims| dims.get(key))
                    .map(String::as_str)
                    .unwrap_or(""),
            )),
            _ => match record.field(column) {
                Some(value) => self.encode(&value),
                None => self.encode(&self.default_value()),
            },
        }
    }

    // ── helpers ──────────────────────────────────

    fn quoted_in_array(&self) -> bool {
        matches!(
            self,
            Codec::String
                | Codec::Enum8(_)
                | Codec::Enum16(_)
                | Codec::Uuid
                | Codec::IpAddress
                | Codec::Date
                | Codec::DateTime
                | Codec::Dimension(_)
                | Codec::Fallback(_)
        )
    }

    fn mismatch(&self, value: &Value) -> CodecError {
        CodecError::TypeMismatch {
            codec: self.wire_type_name(),
            got: value.type_name(),
        }
    }

    fn malformed(&self, wire: &str, message: impl fmt::Display) -> CodecError {
        CodecError::Malformed {
            codec: self.wire_type_name(),
            wire: wire.to_string(),
            message: message.to_string(),
        }
    }

    fn out_of_range(&self, value: impl fmt::Display) -> CodecError {
        CodecError::OutOfRange {
            codec: self.wire_type_name(),
            value: value.to_string(),
        }
    }

    fn encode_unsigned(&self, value: &Value, max: u64) -> Result<String, CodecError> {
        let n = match value {
            Value::UInt(n) => *n,
            Value::Int(n) if *n >= 0 => *n as u64,
            Value::Int(n) => return Err(self.out_of_range(n)),
            other => return Err(self.mismatch(other)),
        };
        if n > max {
            return Err(self.out_of_range(n));
        }
        Ok(n.to_string())
    }

    fn encode_signed(&self, value: &Value, min: i64, max: i64) -> Result<String, CodecError> {
        let n = match value {
            Value::Int(n) => *n,
            Value::UInt(n) => i64::try_from(*n).map_err(|_| self.out_of_range(n))?,
            other => return Err(self.mismatch(other)),
        };
        if n < min || n > max {
            return Err(self.out_of_range(n));
        }
        Ok(n.to_string())
    }

    fn decode_unsigned(&self, wire: &str, max: u64) -> Result<Value, CodecError> {
        let n = wire.parse::<u64>().map_err(|e| self.malformed(wire, e))?;
        if n > max {
            return Err(self.out_of_range(n));
        }
        Ok(Value::UInt(n))
    }

    fn decode_signed(&self, wire: &str, min: i64, max: i64) -> Result<Value, CodecError> {
        let n = wire.parse::<i64>().map_err(|e| self.malformed(wire, e))?;
        if n < min || n > max {
            return Err(self.out_of_range(n));
        }
        Ok(Value::Int(n))
    }

    /// Round to the declared scale (banker's rounding), check the integer
    /// digits fit the declared precision, then pad to exactly `scale` digits.
    fn encode_fixed(&self, value: Decimal, spec: DecimalSpec) -> Result<String, CodecError> {
        let scale = spec.scale().min(MAX_DECIMAL_SCALE);
        let mut rounded = value.round_dp_with_strategy(scale, RoundingStrategy::MidpointNearestEven);
        if !fits_precision(rounded, spec.precision(), spec.scale()) {
            return Err(self.out_of_range(value));
        }
        rounded.rescale(scale);
        Ok(rounded.to_string())
    }

    fn decode_array(&self, items: &Codec, wire: &str) -> Result<Value, CodecError> {
        let inner = wire
            .trim()
            .strip_prefix('[')
            .and_then(|s| s.strip_suffix(']'))
            .ok_or_else(|| self.malformed(wire, "array must be enclosed in []"))?;
        if inner.trim().is_empty() {
            return Ok(Value::Array(Vec::new()));
        }
        let tokens = split_array_items(inner).map_err(|msg| self.malformed(wire, msg))?;
        let mut values = Vec::with_capacity(tokens.len());
        for token in tokens {
            values.push(items.decode(&token)?);
        }
        Ok(Value::Array(values))
    }
}

fn enum_type_name(base: &str, variants: &[EnumVariant]) -> String {
    if variants.is_empty() {
        return base.to_string();
    }
    let members: Vec<String> = variants
        .iter()
        .map(|v| format!("'{}' = {}", v.name.replace('\'', "\\'"), v.value))
        .collect();
    format!("{}({})", base, members.join(", "))
}

fn format_date(d: Date) -> Result<String, time::error::Format> {
    d.format(format_description!("[year]-[month]-[day]"))
}

fn format_datetime(dt: PrimitiveDateTime) -> Result<String, time::error::Format> {
    dt.format(format_description!(
        "[year]-[month]-[day] [hour]:[minute]:[second]"
    ))
}

/// Whether the integer part of `value` fits in `precision - scale` digits.
fn fits_precision(value: Decimal, precision: u32, scale: u32) -> bool {
    let int_part = value.trunc().abs();
    if precision <= scale {
        return int_part.is_zero();
    }
    let max_int_digits = precision - scale;
    // Anything representable already fits when the bound exceeds 28 digits.
    if max_int_digits > MAX_DECIMAL_SCALE {
        return true;
    }
    let mut bound = Decimal::ONE;
    for _ in 0..max_int_digits {
        match bound.checked_mul(Decimal::TEN) {
            Some(b) => bound = b,
            None => return true,
        }
    }
    int_part < bound
}

/// Split the inside of an array literal on top-level commas. Quoted items
/// are returned without their quotes with `\'` resolved; other escape pairs
/// are kept for the item codec to resolve.
fn split_array_items(inner: &str) -> Result<Vec<String>, String> {
    let mut items = Vec::new();
    let mut current = String::new();
    let mut chars = inner.chars();
    let mut in_quotes = false;
    let mut depth = 0usize;

    while let Some(c) = chars.next() {
        if in_quotes {
            match c {
                '\\' => match chars.next() {
                    Some('\'') => current.push('\''),
                    Some(next) => {
                        current.push('\\');
                        current.push(next);
                    }
                    None => return Err("dangling escape in quoted item".to_string()),
                },
                '\'' => in_quotes = false,
                _ => current.push(c),
            }
            continue;
        }
        match c {
            '\'' if depth == 0 => in_quotes = true,
            '[' => {
                depth += 1;
                current.push(c);
            }
            ']' => {
                depth = depth
                    .checked_sub(1)
                    .ok_or_else(|| "unbalanced ']'".to_string())?;
                current.push(c);
            }
            ',' if depth == 0 => items.push(std::mem::take(&mut current)),
            c if c.is_whitespace() && depth == 0 => {}
            _ => current.push(c),
        }
    }
    if in_quotes {
        return Err("unterminated quoted item".to_string());
    }
    if depth != 0 {
        return Err("unbalanced '['".to_string());
    }
    items.push(current);
    Ok(items)
}

/// Escape a string for the tab-separated input format. Tabs are kept.
pub fn escape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    for c in s.chars() {
        match c {
            '\\' => out.push_str("\\\\"),
            '\n' => out.push_str("\\n"),
            '\r' => out.push_str("\\r"),
            '\0' => out.push_str("\\0"),
            _ => out.push(c),
        }
    }
    out
}

/// Inverse of [`escape`]; also resolves `\t` and `\'` as the store emits them.
pub fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('r') => out.push('\r'),
            Some('0') => out.push('\0'),
            Some('\\') => out.push('\\'),
            Some('\'') => out.push('\''),
            Some(other) => {
                out.push('\\');
                out.push(other);
            }
            None => out.push('\\'),
        }
    }
    out
}

// ──────────────────────────────────────────────
// Tests
// ──────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use std::str::FromStr;

    fn round_trip(codec: &Codec, value: Value) {
        let wire = codec.encode(&value).unwrap();
        assert!(!wire.contains('\n'), "{} emitted a newline", codec);
        assert_eq!(codec.decode(&wire).unwrap(), value, "round trip via '{}'", wire);
    }

    #[test]
    fn integer_bounds_round_trip() {
        round_trip(&Codec::UInt8, Value::UInt(0));
        round_trip(&Codec::UInt8, Value::UInt(u8::MAX as u64));
        round_trip(&Codec::UInt16, Value::UInt(u16::MAX as u64));
        round_trip(&Codec::UInt32, Value::UInt(u32::MAX as u64));
        round_trip(&Codec::UInt64, Value::UInt(u64::MAX));
        round_trip(&Codec::Int8, Value::Int(i8::MIN as i64));
        round_trip(&Codec::Int16, Value::Int(i16::MAX as i64));
        round_trip(&Codec::Int32, Value::Int(i32::MIN as i64));
        round_trip(&Codec::Int64, Value::Int(i64::MIN));
        round_trip(&Codec::Int64, Value::Int(i64::MAX));
    }

    #[test]
    fn integer_overflow_is_rejected() {
        assert!(matches!(
            Codec::UInt8.encode(&Value::UInt(256)),
            Err(CodecError::OutOfRange { .. })
        ));
        assert!(matches!(
            Codec::UInt64.encode(&Value::Int(-1)),
            Err(CodecError::OutOfRange { .. })
        ));
        assert!(matches!(
            Codec::Int64.encode(&Value::UInt(u64::MAX)),
            Err(CodecError::OutOfRange { .. })
        ));
        assert!(matches!(
            Codec::Int8.decode("128"),
            Err(CodecError::OutOfRange { .. })
        ));
    }

    #[test]
    fn bool_is_stored_as_uint8() {
        assert_eq!(Codec::Bool.wire_type_name(), "UInt8");
        assert_eq!(Codec::Bool.encode(&Value::Bool(true)).unwrap(), "1");
        round_trip(&Codec::Bool, Value::Bool(false));
        round_trip(&Codec::Bool, Value::Bool(true));
    }

    #[test]
    fn floats_round_trip() {
        round_trip(&Codec::Float32, Value::Float(1.25));
        round_trip(&Codec::Float64, Value::Float(0.1));
        round_trip(&Codec::Float64, Value::Float(-12345.678901));
    }

    #[test]
    fn strings_keep_non_ascii_and_escape_separators() {
        round_trip(&Codec::String, Value::text(""));
        round_trip(&Codec::String, Value::text("Строка"));
        round_trip(&Codec::String, Value::text("two\nlines and a \\ backslash"));
        assert_eq!(
            Codec::String.encode(&Value::text("a\nb")).unwrap(),
            "a\\nb"
        );
    }

    #[test]
    fn string_encoding_leaves_tabs_for_the_serializer() {
        assert_eq!(Codec::String.encode(&Value::text("a\tb")).unwrap(), "a\tb");
    }

    #[test]
    fn enum_checks_declared_variants() {
        let codec = Codec::Enum8(vec![EnumVariant::new("lead", 1), EnumVariant::new("sale", 2)]);
        assert_eq!(codec.wire_type_name(), "Enum8('lead' = 1, 'sale' = 2)");
        round_trip(&codec, Value::Enum("sale".to_string()));
        assert!(matches!(
            codec.encode(&Value::Enum("refund".to_string())),
            Err(CodecError::OutOfRange { .. })
        ));
        assert_eq!(codec.default_value(), Value::Enum("lead".to_string()));
    }

    #[test]
    fn wide_enum_round_trips() {
        let codec = Codec::Enum16(vec![
            EnumVariant::new("rejected", -300),
            EnumVariant::new("approved", 1000),
        ]);
        assert_eq!(
            codec.wire_type_name(),
            "Enum16('rejected' = -300, 'approved' = 1000)"
        );
        round_trip(&codec, Value::Enum("approved".to_string()));
        round_trip(&codec, Value::Enum("rejected".to_string()));
        assert!(matches!(
            codec.encode(&Value::Enum("pending".to_string())),
            Err(CodecError::OutOfRange { .. })
        ));
    }

    #[test]
    fn dimension_round_trips_escaped_text() {
        let codec = Codec::dimension("zone");
        assert_eq!(codec.wire_type_name(), "String");
        assert_eq!(
            codec.encode(&Value::text("a\\b\nc")).unwrap(),
            "a\\\\b\\nc"
        );
        round_trip(&codec, Value::text("a\\b\nc"));
        round_trip(&codec, Value::text(""));
    }

    #[test]
    fn uuid_and_ip_round_trip() {
        let id = Uuid::parse_str("67e55044-10b1-426f-9247-bb680e5fe0c8").unwrap();
        round_trip(&Codec::Uuid, Value::Uuid(id));
        round_trip(&Codec::Uuid, Value::Uuid(Uuid::nil()));
        round_trip(&Codec::IpAddress, Value::Ip("192.168.9.40".parse().unwrap()));
        round_trip(&Codec::IpAddress, Value::Ip("::1".parse().unwrap()));
        assert_eq!(Codec::IpAddress.wire_type_name(), "String");
    }

    #[test]
    fn dates_round_trip() {
        let date = Date::from_calendar_date(2019, time::Month::February, 18).unwrap();
        round_trip(&Codec::Date, Value::Date(date));
        let dt = PrimitiveDateTime::new(date, time::Time::from_hms(18, 16, 44).unwrap());
        round_trip(&Codec::DateTime, Value::DateTime(dt));
        assert_eq!(
            Codec::DateTime.encode(&Value::DateTime(dt)).unwrap(),
            "2019-02-18 18:16:44"
        );
        assert_eq!(Codec::Date.encode(&Value::DateTime(dt)).unwrap(), "2019-02-18");
    }

    #[test]
    fn decimal_is_fixed_point_text() {
        let codec = Codec::decimal32(5);
        assert_eq!(codec.wire_type_name(), "Decimal32(5)");
        let v = Value::Decimal(Decimal::from_str("3.5555").unwrap());
        assert_eq!(codec.encode(&v).unwrap(), "3.55550");
        round_trip(&codec, v);

        let trailing = Value::Decimal(Decimal::from_str("10.500").unwrap());
        round_trip(&Codec::decimal64(3), trailing.clone());
        round_trip(&Codec::decimal128(5), trailing);
        assert_eq!(Codec::decimal(12, 4).wire_type_name(), "Decimal(12, 4)");
    }

    #[test]
    fn decimal_rounds_half_even_and_checks_precision() {
        let codec = Codec::decimal(5, 2);
        let v = Value::Decimal(Decimal::from_str("1.005").unwrap());
        assert_eq!(codec.encode(&v).unwrap(), "1.00");
        let too_big = Value::Decimal(Decimal::from_str("1000.00").unwrap());
        assert!(matches!(
            codec.encode(&too_big),
            Err(CodecError::OutOfRange { .. })
        ));
    }

    #[test]
    fn money_persists_amount_only() {
        let v = Value::Money {
            amount: Decimal::from_str("0.00086").unwrap(),
            currency: "USD".to_string(),
        };
        assert_eq!(Codec::Money.wire_type_name(), "Decimal64(5)");
        assert_eq!(Codec::Money.encode(&v).unwrap(), "0.00086");
        assert_eq!(
            Codec::Money.decode("0.00086").unwrap(),
            Value::Decimal(Decimal::from_str("0.00086").unwrap())
        );
        round_trip(&Codec::Money, Value::Decimal(Decimal::from_str("60.00000").unwrap()));
    }

    #[test]
    fn empty_array_uses_canonical_token() {
        let codec = Codec::array(Codec::UInt64);
        assert_eq!(codec.encode(&Value::Array(vec![])).unwrap(), "[]");
        round_trip(&codec, Value::Array(vec![]));
        assert_eq!(codec.wire_type_name(), "Array(UInt64)");
    }

    #[test]
    fn arrays_of_strings_do_not_eat_values() {
        let codec = Codec::array(Codec::String);
        let v = Value::Array(vec![Value::text("some"), Value::text("other")]);
        assert_eq!(codec.encode(&v).unwrap(), "['some','other']");
        round_trip(&codec, v);
        round_trip(
            &codec,
            Value::Array(vec![Value::text("it's, fine"), Value::text("back\\slash")]),
        );
    }

    #[test]
    fn arrays_of_numbers_and_nested_arrays() {
        let codec = Codec::array(Codec::Int32);
        let v = Value::Array(vec![Value::Int(1), Value::Int(-2), Value::Int(3)]);
        assert_eq!(codec.encode(&v).unwrap(), "[1,-2,3]");
        round_trip(&codec, v);
        assert_eq!(
            codec.decode("[1, 2 ,3]").unwrap(),
            Value::Array(vec![Value::Int(1), Value::Int(2), Value::Int(3)])
        );

        let nested = Codec::array(Codec::array(Codec::UInt8));
        round_trip(
            &nested,
            Value::Array(vec![
                Value::Array(vec![Value::UInt(1), Value::UInt(2)]),
                Value::Array(vec![]),
            ]),
        );
    }

    #[test]
    fn malformed_array_reports_error() {
        let codec = Codec::array(Codec::String);
        assert!(matches!(
            codec.decode("['open"),
            Err(CodecError::Malformed { .. })
        ));
        assert!(matches!(
            codec.decode("1,2"),
            Err(CodecError::Malformed { .. })
        ));
    }

    #[test]
    fn type_mismatch_names_both_sides() {
        let err = Codec::Date.encode(&Value::Bool(true)).unwrap_err();
        assert_eq!(err.to_string(), "Date cannot encode a Bool value");
    }

    #[test]
    fn fallback_is_permissive() {
        let codec = Codec::Fallback("LowCardinality(String)".to_string());
        assert_eq!(codec.wire_type_name(), "LowCardinality(String)");
        assert_eq!(codec.encode(&Value::UInt(7)).unwrap(), "7");
        round_trip(&codec, Value::text("anything"));
    }
}
