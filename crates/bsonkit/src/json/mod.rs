//! Conversion between encoded documents and MongoDB Extended JSON v2.
//!
//! Parsing accepts both canonical and relaxed input, plus the legacy
//! `$binary`/`$type` and `$regex`/`$options` forms. Output is compact, with
//! no whitespace between tokens.

mod extended;
mod parser;
mod scanner;
mod writer;

use alloc::string::String;

use tracing::debug;

use crate::{
    bson::Document,
    error::{JsonErrorKind, JsonParseError, Result},
    options::{JsonMode, JsonOptions},
    value::{ArrayValue, DocumentValue},
    view::{ArrayView, DocumentView},
};
use parser::{JsonValue, Node, Parser};
use writer::Writer;

fn parse_top_level(json: &str, options: &JsonOptions, want_array: bool) -> Result<Node, JsonParseError> {
    let node = Parser::new(json, options.max_depth)
        .parse_document()
        .inspect_err(|err| debug!(line = err.line, column = err.column, kind = %err.kind, "invalid JSON"))?;
    match (&node.value, want_array) {
        (JsonValue::Object(_), false) | (JsonValue::Array(_), true) => Ok(node),
        (_, false) => Err(node.error(JsonErrorKind::WrongTopLevel("object"))),
        (_, true) => Err(node.error(JsonErrorKind::WrongTopLevel("array"))),
    }
}

/// Parses an Extended JSON object into an encoded document.
///
/// ```
/// let doc = bsonkit::from_json(r#"{"_id": {"$oid": "5f1b0c3a9d1e8a0b1c2d3e4f"}, "n": 1}"#)?;
/// assert_eq!(doc.get("n").get_int32()?, 1);
/// # Ok::<(), bsonkit::Error>(())
/// ```
///
/// # Errors
///
/// [`Error::JsonParse`](crate::Error::JsonParse) for malformed text or
/// wrappers, and [`Error::BuilderMisuse`](crate::Error::BuilderMisuse) for
/// keys containing NUL.
pub fn from_json(json: &str) -> Result<DocumentValue> {
    from_json_with(json, &JsonOptions::default())
}

/// [`from_json`] with an explicit nesting limit.
///
/// # Errors
///
/// See [`from_json`].
pub fn from_json_with(json: &str, options: &JsonOptions) -> Result<DocumentValue> {
    let node = parse_top_level(json, options, false)?;
    let JsonValue::Object(entries) = &node.value else {
        return Err(node.error(JsonErrorKind::WrongTopLevel("object")).into());
    };
    let document: Document = extended::document(entries)
        .inspect_err(|err| debug!(line = err.line, column = err.column, kind = %err.kind, "invalid extended JSON"))?;
    document.encode()
}

/// Parses a top-level JSON array into an encoded array.
///
/// # Errors
///
/// See [`from_json`].
pub fn array_from_json(json: &str) -> Result<ArrayValue> {
    let node = parse_top_level(json, &JsonOptions::default(), true)?;
    let JsonValue::Array(items) = &node.value else {
        return Err(node.error(JsonErrorKind::WrongTopLevel("array")).into());
    };
    let values = items
        .iter()
        .map(extended::to_bson)
        .collect::<Result<alloc::vec::Vec<_>, _>>()
        .inspect_err(|err| debug!(line = err.line, column = err.column, kind = %err.kind, "invalid extended JSON"))?;
    ArrayValue::from_values(values)
}

/// Renders a document as Extended JSON.
///
/// # Errors
///
/// [`Error::Codec`](crate::Error::Codec) if the document is malformed.
pub fn to_json(view: &DocumentView<'_>, mode: JsonMode) -> Result<String> {
    to_json_with(
        view,
        &JsonOptions {
            mode,
            ..JsonOptions::default()
        },
    )
}

/// [`to_json`] with an explicit nesting limit.
///
/// # Errors
///
/// See [`to_json`].
pub fn to_json_with(view: &DocumentView<'_>, options: &JsonOptions) -> Result<String> {
    let mut out = String::with_capacity(view.len_bytes());
    Writer::new(&mut out, *options).document(*view, 0)?;
    Ok(out)
}

/// Renders an array as an Extended JSON array.
///
/// # Errors
///
/// [`Error::Codec`](crate::Error::Codec) if the array is malformed.
pub fn array_to_json(view: &ArrayView<'_>, mode: JsonMode) -> Result<String> {
    let mut out = String::with_capacity(view.len_bytes());
    let options = JsonOptions {
        mode,
        ..JsonOptions::default()
    };
    Writer::new(&mut out, options).array(view.as_document(), 0)?;
    Ok(out)
}
