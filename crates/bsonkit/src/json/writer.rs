//! Extended JSON output, read straight from views without materialising an
//! owned copy.

use alloc::string::String;
use core::fmt::{self, Write as _};

use base64::{Engine as _, engine::general_purpose::STANDARD};

use crate::{
    error::{CodecErrorKind, Result},
    options::{JsonMode, JsonOptions},
    raw::RawValue,
    view::DocumentView,
};

/// Years 1970 through 9999 are written as ISO-8601 strings in relaxed mode.
const RELAXED_DATE_RANGE: core::ops::RangeInclusive<i64> = 0..=253_402_300_799_999;

pub(super) struct Writer<'o> {
    out: &'o mut String,
    options: JsonOptions,
}

impl<'o> Writer<'o> {
    pub(super) fn new(out: &'o mut String, options: JsonOptions) -> Self {
        Self { out, options }
    }

    fn relaxed(&self) -> bool {
        self.options.mode == JsonMode::Relaxed
    }

    /// Writing to a `String` cannot fail.
    fn display(&mut self, value: impl fmt::Display) {
        let _ = write!(self.out, "{value}");
    }

    pub(super) fn document(&mut self, view: DocumentView<'_>, depth: usize) -> Result<()> {
        self.container(view, depth, true)
    }

    pub(super) fn array(&mut self, view: DocumentView<'_>, depth: usize) -> Result<()> {
        self.container(view, depth, false)
    }

    fn container(&mut self, view: DocumentView<'_>, depth: usize, keyed: bool) -> Result<()> {
        if depth > self.options.max_depth {
            return Err(view.error_here(CodecErrorKind::MaxDepthExceeded).into());
        }
        self.out.push(if keyed { '{' } else { '[' });
        for (i, el) in view.iter().enumerate() {
            let el = el?;
            if i > 0 {
                self.out.push(',');
            }
            if keyed {
                self.string(el.key_unchecked());
                self.out.push(':');
            }
            self.value(&el.value()?, depth)?;
        }
        self.out.push(if keyed { '}' } else { ']' });
        Ok(())
    }

    fn string(&mut self, s: &str) {
        self.out.push('"');
        for c in s.chars() {
            match c {
                '"' => self.out.push_str("\\\""),
                '\\' => self.out.push_str("\\\\"),
                '\n' => self.out.push_str("\\n"),
                '\r' => self.out.push_str("\\r"),
                '\t' => self.out.push_str("\\t"),
                '\u{08}' => self.out.push_str("\\b"),
                '\u{0C}' => self.out.push_str("\\f"),
                c if u32::from(c) < 0x20 => {
                    let _ = write!(self.out, "\\u{:04x}", u32::from(c));
                }
                c => self.out.push(c),
            }
        }
        self.out.push('"');
    }

    /// `{"<name>":` followed by `body` and a closing brace.
    fn wrapped(&mut self, name: &str, body: impl FnOnce(&mut Self)) {
        self.out.push('{');
        self.string(name);
        self.out.push(':');
        body(self);
        self.out.push('}');
    }

    fn wrapped_str(&mut self, name: &str, value: &str) {
        self.wrapped(name, |w| w.string(value));
    }

    fn double(&mut self, v: f64) {
        if v.is_finite() && self.relaxed() {
            let _ = write!(self.out, "{v:?}");
            return;
        }
        let repr = if v.is_nan() {
            String::from("NaN")
        } else if v == f64::INFINITY {
            String::from("Infinity")
        } else if v == f64::NEG_INFINITY {
            String::from("-Infinity")
        } else {
            alloc::format!("{v:?}")
        };
        self.wrapped_str("$numberDouble", &repr);
    }

    fn value(&mut self, value: &RawValue<'_>, depth: usize) -> Result<()> {
        match *value {
            RawValue::Double(v) => self.double(v),
            RawValue::String(s) => self.string(s),
            RawValue::Document(d) => self.document(d, depth + 1)?,
            RawValue::Array(a) => self.array(a.as_document(), depth + 1)?,
            RawValue::Binary(b) => {
                let subtype = u8::from(b.subtype);
                let data = STANDARD.encode(b.bytes);
                self.wrapped("$binary", |w| {
                    w.out.push('{');
                    w.string("base64");
                    w.out.push(':');
                    w.string(&data);
                    w.out.push(',');
                    w.string("subType");
                    w.out.push(':');
                    w.string(&alloc::format!("{subtype:02x}"));
                    w.out.push('}');
                });
            }
            RawValue::Undefined => self.wrapped("$undefined", |w| w.out.push_str("true")),
            RawValue::ObjectId(oid) => self.wrapped_str("$oid", &oid.to_hex()),
            RawValue::Boolean(b) => self.out.push_str(if b { "true" } else { "false" }),
            RawValue::DateTime(dt) => {
                let millis = dt.timestamp_millis();
                let iso = dt.try_to_rfc3339().filter(|_| self.relaxed() && RELAXED_DATE_RANGE.contains(&millis));
                self.wrapped("$date", |w| match iso {
                    Some(iso) => w.string(&iso),
                    None => w.wrapped_str("$numberLong", &alloc::format!("{millis}")),
                });
            }
            RawValue::Null => self.out.push_str("null"),
            RawValue::RegularExpression(re) => self.wrapped("$regularExpression", |w| {
                w.out.push('{');
                w.string("pattern");
                w.out.push(':');
                w.string(re.pattern);
                w.out.push(',');
                w.string("options");
                w.out.push(':');
                w.string(re.options);
                w.out.push('}');
            }),
            RawValue::DbPointer(p) => self.wrapped("$dbPointer", |w| {
                w.out.push('{');
                w.string("$ref");
                w.out.push(':');
                w.string(p.namespace);
                w.out.push(',');
                w.string("$id");
                w.out.push(':');
                w.wrapped_str("$oid", &p.id.to_hex());
                w.out.push('}');
            }),
            RawValue::JavaScriptCode(code) => self.wrapped_str("$code", code),
            RawValue::Symbol(s) => self.wrapped_str("$symbol", s),
            RawValue::JavaScriptCodeWithScope(cws) => {
                self.out.push('{');
                self.string("$code");
                self.out.push(':');
                self.string(cws.code);
                self.out.push(',');
                self.string("$scope");
                self.out.push(':');
                self.document(cws.scope, depth + 1)?;
                self.out.push('}');
            }
            RawValue::Int32(v) => {
                if self.relaxed() {
                    self.display(v);
                } else {
                    self.wrapped_str("$numberInt", &alloc::format!("{v}"));
                }
            }
            RawValue::Timestamp(ts) => self.wrapped("$timestamp", |w| {
                let _ = write!(w.out, "{{\"t\":{},\"i\":{}}}", ts.time, ts.increment);
            }),
            RawValue::Int64(v) => {
                if self.relaxed() {
                    self.display(v);
                } else {
                    self.wrapped_str("$numberLong", &alloc::format!("{v}"));
                }
            }
            RawValue::Decimal128(d) => self.wrapped_str("$numberDecimal", &alloc::format!("{d}")),
            RawValue::MaxKey => self.wrapped("$maxKey", |w| w.out.push('1')),
            RawValue::MinKey => self.wrapped("$minKey", |w| w.out.push('1')),
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn render(value: RawValue<'_>, mode: JsonMode) -> String {
        let mut out = String::new();
        let options = JsonOptions {
            mode,
            ..JsonOptions::default()
        };
        Writer::new(&mut out, options).value(&value, 0).unwrap();
        out
    }

    #[test]
    fn escapes_control_characters() {
        assert_eq!(render(RawValue::String("a\"\\\n\u{1}"), JsonMode::Relaxed), r#""a\"\\\n\u0001""#);
    }

    #[test]
    fn doubles() {
        assert_eq!(render(RawValue::Double(1.0), JsonMode::Relaxed), "1.0");
        assert_eq!(render(RawValue::Double(1.0), JsonMode::Canonical), r#"{"$numberDouble":"1.0"}"#);
        assert_eq!(
            render(RawValue::Double(f64::NEG_INFINITY), JsonMode::Relaxed),
            r#"{"$numberDouble":"-Infinity"}"#
        );
    }

    #[test]
    fn dates_outside_range_use_number_long() {
        let before_epoch = RawValue::DateTime(crate::DateTime::from_millis(-1));
        assert_eq!(
            render(before_epoch, JsonMode::Relaxed),
            r#"{"$date":{"$numberLong":"-1"}}"#
        );
        let epoch = RawValue::DateTime(crate::DateTime::UNIX_EPOCH);
        assert_eq!(render(epoch, JsonMode::Relaxed), r#"{"$date":"1970-01-01T00:00:00.000Z"}"#);
    }
}
