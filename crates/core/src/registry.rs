//! Maps store-reported type names to codecs.
//!
//! Lookup is total: names that parse as none of the known types resolve to a
//! [`Codec::Fallback`] carrying the original name, so a table with exotic
//! columns can still be described and appended to.

use crate::codec::{Codec, DecimalSpec, EnumVariant};

/// Resolve the codec for a type name such as `UInt64`, `Decimal(12, 4)`,
/// `Array(String)` or `Enum8('lead' = 1, 'sale' = 2)`.
pub fn codec_for_type(type_name: &str) -> Codec {
    let name = type_name.trim();
    parse_type(name).unwrap_or_else(|| Codec::Fallback(name.to_string()))
}

fn parse_type(name: &str) -> Option<Codec> {
    let simple = match name {
        "UInt8" => Some(Codec::UInt8),
        "UInt16" => Some(Codec::UInt16),
        "UInt32" => Some(Codec::UInt32),
        "UInt64" => Some(Codec::UInt64),
        "Int8" => Some(Codec::Int8),
        "Int16" => Some(Codec::Int16),
        "Int32" => Some(Codec::Int32),
        "Int64" => Some(Codec::Int64),
        "Float32" => Some(Codec::Float32),
        "Float64" => Some(Codec::Float64),
        "String" => Some(Codec::String),
        "UUID" => Some(Codec::Uuid),
        "Date" => Some(Codec::Date),
        "DateTime" => Some(Codec::DateTime),
        _ => None,
    };
    if simple.is_some() {
        return simple;
    }

    let (head, args) = split_call(name)?;
    match head {
        "Array" => {
            let inner = parse_type(args.trim())
                .unwrap_or_else(|| Codec::Fallback(args.trim().to_string()));
            Some(Codec::array(inner))
        }
        "Decimal32" => parse_u32(args).map(|s| Codec::Decimal(DecimalSpec::D32(s))),
        "Decimal64" => parse_u32(args).map(|s| Codec::Decimal(DecimalSpec::D64(s))),
        "Decimal128" => parse_u32(args).map(|s| Codec::Decimal(DecimalSpec::D128(s))),
        "Decimal" => {
            let (p, s) = args.split_once(',')?;
            Some(Codec::decimal(parse_u32(p)?, parse_u32(s)?))
        }
        "Enum8" => parse_variants(args).map(Codec::Enum8),
        "Enum16" => parse_variants(args).map(Codec::Enum16),
        _ => None,
    }
}

/// Split `Head(args)` into its parts. The closing paren must end the name.
fn split_call(name: &str) -> Option<(&str, &str)> {
    let open = name.find('(')?;
    let args = name[open + 1..].strip_suffix(')')?;
    Some((&name[..open], args))
}

fn parse_u32(s: &str) -> Option<u32> {
    s.trim().parse().ok()
}

/// Parse `'a' = 1, 'b' = 2`. Names may contain escaped quotes and commas.
fn parse_variants(args: &str) -> Option<Vec<EnumVariant>> {
    let mut variants = Vec::new();
    let mut rest = args.trim();
    while !rest.is_empty() {
        let body = rest.strip_prefix('\'')?;
        let mut name = String::new();
        let mut chars = body.char_indices();
        let mut end = None;
        while let Some((i, c)) = chars.next() {
            match c {
                '\\' => {
                    let (_, next) = chars.next()?;
                    name.push(next);
                }
                '\'' => {
                    end = Some(i);
                    break;
                }
                _ => name.push(c),
            }
        }
        let after_name = &body[end? + 1..];
        let after_eq = after_name.trim_start().strip_prefix('=')?;
        let (number, tail) = match after_eq.find(',') {
            Some(comma) => (&after_eq[..comma], &after_eq[comma + 1..]),
            None => (after_eq, ""),
        };
        let value: i16 = number.trim().parse().ok()?;
        variants.push(EnumVariant::new(name, value));
        rest = tail.trim();
    }
    Some(variants)
}
