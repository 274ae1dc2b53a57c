//! Interpretation of Extended JSON wrappers (`{"$oid": ...}` and friends).
//!
//! Objects whose keys match a known wrapper exactly become the typed value;
//! any other object, including query operators such as `{"$regex": {...}}`,
//! stays a plain document.

use alloc::{string::String, vec::Vec};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use super::parser::{JsonValue, Node};
use crate::{
    bson::{Bson, Document},
    decimal128::Decimal128,
    error::{JsonErrorKind, JsonParseError},
    oid::ObjectId,
    spec::BinarySubtype,
    types::{Binary, DateTime, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp},
};

type Entries = [(String, Node)];

fn invalid(node: &Node, what: &'static str) -> JsonParseError {
    node.error(JsonErrorKind::ExtendedJson(what))
}

pub(super) fn to_bson(node: &Node) -> Result<Bson, JsonParseError> {
    Ok(match &node.value {
        JsonValue::Null => Bson::Null,
        JsonValue::Bool(b) => Bson::Boolean(*b),
        JsonValue::Number(lexeme) => number(node, lexeme)?,
        JsonValue::String(s) => Bson::String(s.clone()),
        JsonValue::Array(items) => Bson::Array(items.iter().map(to_bson).collect::<Result<_, _>>()?),
        JsonValue::Object(entries) => match wrapper(node, entries)? {
            Some(value) => value,
            None => Bson::Document(document(entries)?),
        },
    })
}

/// Converts object entries without looking for a wrapper at this level.
pub(super) fn document(entries: &Entries) -> Result<Document, JsonParseError> {
    let mut doc = Document::new();
    for (key, value) in entries {
        doc.push(key.clone(), to_bson(value)?);
    }
    Ok(doc)
}

/// Integers that fit become `Int32` or `Int64`; everything else is a double.
fn number(node: &Node, lexeme: &str) -> Result<Bson, JsonParseError> {
    let integral = !lexeme.contains(['.', 'e', 'E']);
    if integral {
        if let Ok(v) = lexeme.parse::<i64>() {
            return Ok(match i32::try_from(v) {
                Ok(v) => Bson::Int32(v),
                Err(_) => Bson::Int64(v),
            });
        }
    }
    lexeme
        .parse::<f64>()
        .map(Bson::Double)
        .map_err(|_| node.error(JsonErrorKind::InvalidNumber))
}

fn wrapper(node: &Node, entries: &Entries) -> Result<Option<Bson>, JsonParseError> {
    if !entries.first().is_some_and(|(k, _)| k.starts_with('$')) {
        return Ok(None);
    }
    let keys: Vec<&str> = entries.iter().map(|(k, _)| k.as_str()).collect();
    let field = |name: &str| {
        entries
            .iter()
            .find(|(k, _)| k == name)
            .map(|(_, v)| v)
            .ok_or_else(|| invalid(node, "missing field"))
    };
    Ok(Some(match keys.as_slice() {
        ["$oid"] => Bson::ObjectId(object_id(field("$oid")?)?),
        ["$symbol"] => Bson::Symbol(string(field("$symbol")?)?.into()),
        ["$numberInt"] => {
            let v = field("$numberInt")?;
            Bson::Int32(string(v)?.parse().map_err(|_| invalid(v, "$numberInt must hold a 32-bit integer"))?)
        }
        ["$numberLong"] => Bson::Int64(number_long(field("$numberLong")?)?),
        ["$numberDouble"] => Bson::Double(number_double(field("$numberDouble")?)?),
        ["$numberDecimal"] => {
            let v = field("$numberDecimal")?;
            Bson::Decimal128(
                Decimal128::parse_str(string(v)?).map_err(|_| invalid(v, "invalid $numberDecimal"))?,
            )
        }
        ["$binary"] => Bson::Binary(binary_v2(field("$binary")?)?),
        ["$binary", "$type"] | ["$type", "$binary"] => {
            let data = field("$binary")?;
            if !matches!(data.value, JsonValue::String(_)) {
                return Ok(None);
            }
            Bson::Binary(Binary {
                subtype: subtype(field("$type")?)?,
                bytes: base64(data)?,
            })
        }
        ["$uuid"] => Bson::Binary(Binary {
            subtype: BinarySubtype::Uuid,
            bytes: uuid(field("$uuid")?)?,
        }),
        ["$code"] => Bson::JavaScriptCode(string(field("$code")?)?.into()),
        ["$code", "$scope"] | ["$scope", "$code"] => {
            let scope = field("$scope")?;
            Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
                code: string(field("$code")?)?.into(),
                scope: document(object(scope)?)?,
            })
        }
        ["$timestamp"] => {
            let v = field("$timestamp")?;
            let inner = object(v)?;
            match inner {
                [(t, time), (i, increment)] if t == "t" && i == "i" => Bson::Timestamp(Timestamp {
                    time: uint32(time)?,
                    increment: uint32(increment)?,
                }),
                _ => return Err(invalid(v, "$timestamp must be {\"t\": ..., \"i\": ...}")),
            }
        }
        ["$regularExpression"] => {
            let v = field("$regularExpression")?;
            match object(v)? {
                [(p, pattern), (o, options)] if p == "pattern" && o == "options" => {
                    Bson::RegularExpression(regex(string(pattern)?, string(options)?))
                }
                _ => return Err(invalid(v, "$regularExpression must be {\"pattern\": ..., \"options\": ...}")),
            }
        }
        ["$regex", "$options"] | ["$options", "$regex"] => {
            let (pattern, options) = (field("$regex")?, field("$options")?);
            match (&pattern.value, &options.value) {
                (JsonValue::String(p), JsonValue::String(o)) => Bson::RegularExpression(regex(p, o)),
                _ => return Ok(None),
            }
        }
        ["$dbPointer"] => {
            let v = field("$dbPointer")?;
            match object(v)? {
                [(r, namespace), (i, id)] if r == "$ref" && i == "$id" => {
                    let Bson::ObjectId(id) = to_bson(id)? else {
                        return Err(invalid(id, "$dbPointer.$id must be an $oid"));
                    };
                    Bson::DbPointer(DbPointer {
                        namespace: string(namespace)?.into(),
                        id,
                    })
                }
                _ => return Err(invalid(v, "$dbPointer must be {\"$ref\": ..., \"$id\": ...}")),
            }
        }
        ["$date"] => Bson::DateTime(date(field("$date")?)?),
        ["$minKey"] => {
            expect_one(field("$minKey")?)?;
            Bson::MinKey
        }
        ["$maxKey"] => {
            expect_one(field("$maxKey")?)?;
            Bson::MaxKey
        }
        ["$undefined"] => {
            let v = field("$undefined")?;
            if v.value != JsonValue::Bool(true) {
                return Err(invalid(v, "$undefined must be true"));
            }
            Bson::Undefined
        }
        _ => return Ok(None),
    }))
}

/// Options are kept in the order given so that unusual BSON survives a round
/// trip unchanged.
fn regex(pattern: &str, options: &str) -> Regex {
    Regex {
        pattern: pattern.into(),
        options: options.into(),
    }
}

fn string(node: &Node) -> Result<&str, JsonParseError> {
    match &node.value {
        JsonValue::String(s) => Ok(s),
        _ => Err(invalid(node, "expected a string")),
    }
}

fn object(node: &Node) -> Result<&Entries, JsonParseError> {
    match &node.value {
        JsonValue::Object(entries) => Ok(entries),
        _ => Err(invalid(node, "expected an object")),
    }
}

fn uint32(node: &Node) -> Result<u32, JsonParseError> {
    match &node.value {
        JsonValue::Number(lexeme) => lexeme
            .parse()
            .map_err(|_| invalid(node, "expected an unsigned 32-bit integer")),
        _ => Err(invalid(node, "expected an unsigned 32-bit integer")),
    }
}

fn expect_one(node: &Node) -> Result<(), JsonParseError> {
    match &node.value {
        JsonValue::Number(lexeme) if lexeme == "1" => Ok(()),
        _ => Err(invalid(node, "$minKey and $maxKey must be 1")),
    }
}

fn object_id(node: &Node) -> Result<ObjectId, JsonParseError> {
    ObjectId::parse_str(string(node)?).map_err(|_| invalid(node, "$oid must be 24 hex digits"))
}

fn number_long(node: &Node) -> Result<i64, JsonParseError> {
    string(node)?
        .parse()
        .map_err(|_| invalid(node, "$numberLong must hold a 64-bit integer"))
}

fn number_double(node: &Node) -> Result<f64, JsonParseError> {
    let s = string(node)?;
    match s {
        "Infinity" => Ok(f64::INFINITY),
        "-Infinity" => Ok(f64::NEG_INFINITY),
        "NaN" => Ok(f64::NAN),
        _ if s.contains(|c: char| c.is_ascii_alphabetic() && c != 'e' && c != 'E') => {
            Err(invalid(node, "invalid $numberDouble"))
        }
        _ => s.parse().map_err(|_| invalid(node, "invalid $numberDouble")),
    }
}

fn base64(node: &Node) -> Result<Vec<u8>, JsonParseError> {
    STANDARD
        .decode(string(node)?)
        .map_err(|_| invalid(node, "invalid base64 payload"))
}

fn subtype(node: &Node) -> Result<BinarySubtype, JsonParseError> {
    let s = string(node)?;
    if s.is_empty() || s.len() > 2 {
        return Err(invalid(node, "binary subtype must be one or two hex digits"));
    }
    u8::from_str_radix(s, 16)
        .map(BinarySubtype::from)
        .map_err(|_| invalid(node, "binary subtype must be one or two hex digits"))
}

fn binary_v2(node: &Node) -> Result<Binary, JsonParseError> {
    match object(node)? {
        [(b, data), (t, ty)] | [(t, ty), (b, data)] if b == "base64" && t == "subType" => Ok(Binary {
            subtype: subtype(ty)?,
            bytes: base64(data)?,
        }),
        _ => Err(invalid(node, "$binary must be {\"base64\": ..., \"subType\": ...}")),
    }
}

fn uuid(node: &Node) -> Result<Vec<u8>, JsonParseError> {
    let s = string(node)?;
    let bad = || invalid(node, "$uuid must be a hyphenated 8-4-4-4-12 hex string");
    let groups: Vec<&str> = s.split('-').collect();
    if groups.iter().map(|g| g.len()).collect::<Vec<_>>() != [8, 4, 4, 4, 12] {
        return Err(bad());
    }
    let hex: String = groups.concat();
    let mut bytes = Vec::with_capacity(16);
    for pair in hex.as_bytes().chunks(2) {
        let pair = core::str::from_utf8(pair).map_err(|_| bad())?;
        bytes.push(u8::from_str_radix(pair, 16).map_err(|_| bad())?);
    }
    Ok(bytes)
}

fn date(node: &Node) -> Result<DateTime, JsonParseError> {
    match &node.value {
        JsonValue::String(s) => {
            DateTime::parse_rfc3339(s).ok_or_else(|| invalid(node, "$date must be an ISO-8601 timestamp"))
        }
        JsonValue::Number(lexeme) => lexeme
            .parse()
            .map(DateTime::from_millis)
            .map_err(|_| invalid(node, "$date must be an integer number of milliseconds")),
        JsonValue::Object(entries) => match entries.as_slice() {
            [(k, v)] if k == "$numberLong" => number_long(v).map(DateTime::from_millis),
            _ => Err(invalid(node, "$date must be a string, a number or a $numberLong")),
        },
        _ => Err(invalid(node, "$date must be a string, a number or a $numberLong")),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::json::parser::Parser;

    fn convert(src: &str) -> Result<Bson, JsonParseError> {
        to_bson(&Parser::new(src, 100).parse_document().unwrap())
    }

    #[test]
    fn relaxed_numbers_pick_the_narrowest_type() {
        assert_eq!(convert("1"), Ok(Bson::Int32(1)));
        assert_eq!(convert("2147483648"), Ok(Bson::Int64(2_147_483_648)));
        assert_eq!(convert("9223372036854775808"), Ok(Bson::Double(9_223_372_036_854_775_808.0)));
        assert_eq!(convert("1.5"), Ok(Bson::Double(1.5)));
        assert_eq!(convert("1e2"), Ok(Bson::Double(100.0)));
    }

    #[test]
    fn query_operators_stay_documents() {
        let value = convert(r#"{"$regex": {"$in": [1]}, "$options": "i"}"#).unwrap();
        assert_eq!(value.element_type(), crate::ElementType::EmbeddedDocument);
    }

    #[test]
    fn uuid_becomes_subtype_four() {
        let value = convert(r#"{"$uuid": "00112233-4455-6677-8899-aabbccddeeff"}"#).unwrap();
        let Bson::Binary(b) = value else {
            panic!("expected binary");
        };
        assert_eq!(b.subtype, BinarySubtype::Uuid);
        assert_eq!(b.bytes[15], 0xFF);
    }

    #[test]
    fn regex_options_keep_their_order() {
        let canonical = convert(r#"{"$regularExpression": {"pattern": "^a", "options": "xi"}}"#);
        let legacy = convert(r#"{"$regex": "^a", "$options": "xi"}"#);
        let expected = Bson::RegularExpression(Regex {
            pattern: "^a".into(),
            options: "xi".into(),
        });
        assert_eq!(canonical, Ok(expected.clone()));
        assert_eq!(legacy, Ok(expected));
    }

    #[test]
    fn wrapper_errors_carry_position() {
        let err = convert("{\"a\":\n {\"$oid\": 5}}").unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::ExtendedJson("expected a string"));
        assert_eq!((err.line, err.column), (2, 11));
        let err = convert(r#"{"$oid": "xyz"}"#).unwrap_err();
        assert_eq!(err.kind, JsonErrorKind::ExtendedJson("$oid must be 24 hex digits"));
        assert_eq!((err.line, err.column), (1, 10));
    }
}
