//! Domain values that codecs translate to and from the store's wire text.

use rust_decimal::Decimal;
use std::fmt;
use std::net::IpAddr;
use time::{Date, PrimitiveDateTime};
use uuid::Uuid;

/// A typed value on the domain side of a [`Codec`](crate::Codec).
///
/// Fixed-point quantities use `rust_decimal::Decimal`. Floats only appear for
/// the `Float32`/`Float64` wire types.
#[derive(Debug, Clone, PartialEq)]
pub enum Value {
    Bool(bool),
    UInt(u64),
    Int(i64),
    Float(f64),
    Decimal(Decimal),
    Text(String),
    Enum(String),
    Uuid(Uuid),
    Ip(IpAddr),
    Date(Date),
    DateTime(PrimitiveDateTime),
    /// Amount plus ISO currency code. The Money codec persists the amount
    /// only; the currency travels in its own column.
    Money { amount: Decimal, currency: String },
    Array(Vec<Value>),
}

impl Value {
    /// Returns a human-readable type name for error messages.
    pub fn type_name(&self) -> &'static str {
        match self {
            Value::Bool(_) => "Bool",
            Value::UInt(_) => "UInt",
            Value::Int(_) => "Int",
            Value::Float(_) => "Float",
            Value::Decimal(_) => "Decimal",
            Value::Text(_) => "Text",
            Value::Enum(_) => "Enum",
            Value::Uuid(_) => "Uuid",
            Value::Ip(_) => "Ip",
            Value::Date(_) => "Date",
            Value::DateTime(_) => "DateTime",
            Value::Money { .. } => "Money",
            Value::Array(_) => "Array",
        }
    }

    pub fn text(s: impl Into<String>) -> Self {
        Value::Text(s.into())
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Bool(b) => write!(f, "{}", b),
            Value::UInt(n) => write!(f, "{}", n),
            Value::Int(n) => write!(f, "{}", n),
            Value::Float(x) => write!(f, "{}", x),
            Value::Decimal(d) => write!(f, "{}", d),
            Value::Text(s) | Value::Enum(s) => f.write_str(s),
            Value::Uuid(u) => write!(f, "{}", u),
            Value::Ip(ip) => write!(f, "{}", ip),
            Value::Date(d) => write!(f, "{}", d),
            Value::DateTime(dt) => write!(f, "{}", dt),
            Value::Money { amount, currency } => write!(f, "{} {}", amount, currency),
            Value::Array(items) => {
                f.write_str("[")?;
                for (i, item) in items.iter().enumerate() {
                    if i > 0 {
                        f.write_str(",")?;
                    }
                    write!(f, "{}", item)?;
                }
                f.write_str("]")
            }
        }
    }
}

impl From<bool> for Value {
    fn from(b: bool) -> Self {
        Value::Bool(b)
    }
}

impl From<u64> for Value {
    fn from(n: u64) -> Self {
        Value::UInt(n)
    }
}

impl From<i64> for Value {
    fn from(n: i64) -> Self {
        Value::Int(n)
    }
}

impl From<Decimal> for Value {
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::Text(s.to_string())
    }
}

impl From<String> for Value {
    fn from(s: String) -> Self {
        Value::Text(s)
    }
}
