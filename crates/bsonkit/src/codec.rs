//! Per-type encoding and decoding of element payloads.
//!
//! Decoding works on a whole document slice plus absolute offsets so that
//! every [`CodecError`] points at the byte where the problem was found. All
//! reads are bounds-checked against an explicit `limit`; nothing here
//! assumes the input is well formed.

use core::str;

use crate::{
    buffer::ByteBuffer,
    decimal128::Decimal128,
    error::{BuilderMisuse, CodecError, CodecErrorKind},
    oid::ObjectId,
    raw::{BinaryRef, CodeWithScopeRef, DbPointerRef, RawValue, RegexRef},
    spec::{BinarySubtype, ElementType, MIN_DOCUMENT_SIZE},
    types::{DateTime, Timestamp},
    view::{ArrayView, DocumentView},
};

pub(crate) type CodecResult<T> = Result<T, CodecError>;

/// A slice of an encoded buffer together with the absolute offset of its
/// first byte, used only for error reporting.
#[derive(Debug, Clone, Copy)]
pub(crate) struct Span<'a> {
    pub(crate) bytes: &'a [u8],
    pub(crate) base: usize,
}

impl<'a> Span<'a> {
    pub(crate) fn new(bytes: &'a [u8], base: usize) -> Self {
        Self { bytes, base }
    }

    #[inline]
    pub(crate) fn err(&self, kind: CodecErrorKind, at: usize) -> CodecError {
        CodecError::new(kind, self.base + at)
    }

    #[inline]
    fn take(&self, at: usize, n: usize, limit: usize) -> CodecResult<&'a [u8]> {
        match at.checked_add(n) {
            Some(end) if end <= limit && end <= self.bytes.len() => Ok(&self.bytes[at..end]),
            _ => Err(self.err(CodecErrorKind::Truncated, at)),
        }
    }

    #[inline]
    fn array<const N: usize>(&self, at: usize, limit: usize) -> CodecResult<[u8; N]> {
        let mut out = [0; N];
        out.copy_from_slice(self.take(at, N, limit)?);
        Ok(out)
    }

    pub(crate) fn read_i32(&self, at: usize, limit: usize) -> CodecResult<i32> {
        self.array(at, limit).map(i32::from_le_bytes)
    }

    /// Reads a NUL-terminated string starting at `at`; returns its bytes
    /// (without the NUL) and the offset just past the NUL.
    pub(crate) fn read_cstring(&self, at: usize, limit: usize) -> CodecResult<(&'a [u8], usize)> {
        let window = self
            .bytes
            .get(at..limit.min(self.bytes.len()))
            .ok_or_else(|| self.err(CodecErrorKind::Truncated, at))?;
        match window.iter().position(|&b| b == 0) {
            Some(n) => Ok((&window[..n], at + n + 1)),
            None => Err(self.err(CodecErrorKind::MissingTerminator, at)),
        }
    }

    /// Reads a length-prefixed string; returns its bytes (without the NUL)
    /// and the offset just past it.
    fn read_string_bytes(&self, at: usize, limit: usize) -> CodecResult<(&'a [u8], usize)> {
        let raw = self.read_i32(at, limit)?;
        let len = match usize::try_from(raw) {
            Ok(n) if n >= 1 => n,
            _ => return Err(self.err(CodecErrorKind::InvalidLength(raw.into()), at)),
        };
        let body = self.take(at + 4, len, limit)?;
        if body[len - 1] != 0 {
            return Err(self.err(CodecErrorKind::MissingTerminator, at + 4 + len - 1));
        }
        Ok((&body[..len - 1], at + 4 + len))
    }

    fn read_str(&self, at: usize, limit: usize) -> CodecResult<(&'a str, usize)> {
        let (bytes, end) = self.read_string_bytes(at, limit)?;
        let s = str::from_utf8(bytes).map_err(|_| self.err(CodecErrorKind::InvalidUtf8, at + 4))?;
        Ok((s, end))
    }

    fn read_cstr(&self, at: usize, limit: usize) -> CodecResult<(&'a str, usize)> {
        let (bytes, end) = self.read_cstring(at, limit)?;
        let s = str::from_utf8(bytes).map_err(|_| self.err(CodecErrorKind::InvalidUtf8, at))?;
        Ok((s, end))
    }

    /// Checks the header of an embedded document starting at `at` and returns
    /// its end offset. The document's elements are not inspected.
    pub(crate) fn read_document_bounds(&self, at: usize, limit: usize) -> CodecResult<usize> {
        let raw = self.read_i32(at, limit)?;
        let len = match usize::try_from(raw) {
            Ok(n) if n >= MIN_DOCUMENT_SIZE => n,
            _ => return Err(self.err(CodecErrorKind::InvalidLength(raw.into()), at)),
        };
        let body = self.take(at, len, limit)?;
        if body[len - 1] != 0 {
            return Err(self.err(CodecErrorKind::MissingTerminator, at + len - 1));
        }
        Ok(at + len)
    }

    fn document(&self, at: usize, end: usize) -> DocumentView<'a> {
        DocumentView::with_base(&self.bytes[at..end], self.base + at)
    }
}

/// Returns the offset one past the payload of an element of type `tag` whose
/// payload starts at `at`. Only what is needed to find the end is checked;
/// full decoding happens in [`decode_payload`].
pub(crate) fn payload_end(
    span: &Span<'_>,
    tag: ElementType,
    at: usize,
    limit: usize,
) -> CodecResult<usize> {
    if let Some(size) = tag.fixed_size() {
        span.take(at, size, limit)?;
        return Ok(at + size);
    }
    match tag {
        ElementType::String | ElementType::JavaScriptCode | ElementType::Symbol => {
            span.read_string_bytes(at, limit).map(|(_, end)| end)
        }
        ElementType::EmbeddedDocument | ElementType::Array => span.read_document_bounds(at, limit),
        ElementType::Binary => {
            let raw = span.read_i32(at, limit)?;
            let len = usize::try_from(raw)
                .map_err(|_| span.err(CodecErrorKind::InvalidLength(raw.into()), at))?;
            let total = 5 + len;
            span.take(at, total, limit)?;
            Ok(at + total)
        }
        ElementType::RegularExpression => {
            let (_, after_pattern) = span.read_cstring(at, limit)?;
            span.read_cstring(after_pattern, limit).map(|(_, end)| end)
        }
        ElementType::DbPointer => {
            let (_, after_ns) = span.read_string_bytes(at, limit)?;
            span.take(after_ns, ObjectId::LEN, limit)?;
            Ok(after_ns + ObjectId::LEN)
        }
        ElementType::JavaScriptCodeWithScope => {
            let raw = span.read_i32(at, limit)?;
            // int32 + empty string (4 + 1) + empty document (5)
            let total = match usize::try_from(raw) {
                Ok(n) if n >= 14 => n,
                _ => return Err(span.err(CodecErrorKind::InvalidLength(raw.into()), at)),
            };
            span.take(at, total, limit)?;
            Ok(at + total)
        }
        _ => unreachable!("fixed-size types handled above"),
    }
}

/// Decodes the payload occupying `at..end` of `span`.
pub(crate) fn decode_payload<'a>(
    span: &Span<'a>,
    tag: ElementType,
    at: usize,
    end: usize,
) -> CodecResult<RawValue<'a>> {
    Ok(match tag {
        ElementType::Double => RawValue::Double(f64::from_le_bytes(span.array(at, end)?)),
        ElementType::String => RawValue::String(span.read_str(at, end)?.0),
        ElementType::JavaScriptCode => RawValue::JavaScriptCode(span.read_str(at, end)?.0),
        ElementType::Symbol => RawValue::Symbol(span.read_str(at, end)?.0),
        ElementType::EmbeddedDocument => RawValue::Document(span.document(at, end)),
        ElementType::Array => RawValue::Array(ArrayView::from(span.document(at, end))),
        ElementType::Binary => RawValue::Binary(decode_binary(span, at, end)?),
        ElementType::Undefined => RawValue::Undefined,
        ElementType::ObjectId => RawValue::ObjectId(ObjectId::from_bytes(span.array(at, end)?)),
        ElementType::Boolean => match span.take(at, 1, end)?[0] {
            0 => RawValue::Boolean(false),
            1 => RawValue::Boolean(true),
            other => return Err(span.err(CodecErrorKind::InvalidBoolean(other), at)),
        },
        ElementType::DateTime => {
            RawValue::DateTime(DateTime::from_millis(i64::from_le_bytes(span.array(at, end)?)))
        }
        ElementType::Null => RawValue::Null,
        ElementType::RegularExpression => {
            let (pattern, after) = span.read_cstr(at, end)?;
            let (options, _) = span.read_cstr(after, end)?;
            RawValue::RegularExpression(RegexRef { pattern, options })
        }
        ElementType::DbPointer => {
            let (namespace, after) = span.read_str(at, end)?;
            let id = ObjectId::from_bytes(span.array(after, end)?);
            RawValue::DbPointer(DbPointerRef { namespace, id })
        }
        ElementType::JavaScriptCodeWithScope => {
            let (code, after_code) = span.read_str(at + 4, end)?;
            let scope_end = span.read_document_bounds(after_code, end)?;
            if scope_end != end {
                return Err(span.err(CodecErrorKind::LengthMismatch, at));
            }
            RawValue::JavaScriptCodeWithScope(CodeWithScopeRef {
                code,
                scope: span.document(after_code, scope_end),
            })
        }
        ElementType::Int32 => RawValue::Int32(i32::from_le_bytes(span.array(at, end)?)),
        ElementType::Timestamp => {
            let increment = u32::from_le_bytes(span.array(at, end)?);
            let time = u32::from_le_bytes(span.array(at + 4, end)?);
            RawValue::Timestamp(Timestamp { time, increment })
        }
        ElementType::Int64 => RawValue::Int64(i64::from_le_bytes(span.array(at, end)?)),
        ElementType::Decimal128 => {
            RawValue::Decimal128(Decimal128::from_bytes(span.array(at, end)?))
        }
        ElementType::MaxKey => RawValue::MaxKey,
        ElementType::MinKey => RawValue::MinKey,
    })
}

/// Structural check used when UTF-8 validation is skipped: string payloads
/// were already bounds-checked by [`payload_end`], so only nested documents
/// and fixed-layout values are decoded. Returns any nested document.
pub(crate) fn check_structure<'a>(
    span: &Span<'a>,
    tag: ElementType,
    at: usize,
    end: usize,
) -> CodecResult<Option<DocumentView<'a>>> {
    match tag {
        ElementType::String
        | ElementType::JavaScriptCode
        | ElementType::Symbol
        | ElementType::RegularExpression
        | ElementType::DbPointer => Ok(None),
        ElementType::JavaScriptCodeWithScope => {
            let (_, after_code) = span.read_string_bytes(at + 4, end)?;
            let scope_end = span.read_document_bounds(after_code, end)?;
            if scope_end != end {
                return Err(span.err(CodecErrorKind::LengthMismatch, at));
            }
            Ok(Some(span.document(after_code, scope_end)))
        }
        _ => Ok(match decode_payload(span, tag, at, end)? {
            RawValue::Document(d) => Some(d),
            RawValue::Array(a) => Some(a.as_document()),
            _ => None,
        }),
    }
}

fn decode_binary<'a>(span: &Span<'a>, at: usize, end: usize) -> CodecResult<BinaryRef<'a>> {
    let raw = span.read_i32(at, end)?;
    let len =
        usize::try_from(raw).map_err(|_| span.err(CodecErrorKind::InvalidLength(raw.into()), at))?;
    let subtype = BinarySubtype::from(span.take(at + 4, 1, end)?[0]);
    let mut bytes = span.take(at + 5, len, end)?;
    if subtype == BinarySubtype::BinaryOld {
        let inner = span.read_i32(at + 5, end)?;
        if usize::try_from(inner).ok() != len.checked_sub(4) {
            return Err(span.err(CodecErrorKind::LengthMismatch, at + 5));
        }
        bytes = &bytes[4..];
    }
    Ok(BinaryRef { subtype, bytes })
}

// ------------------------------------------------------------------------------------------------
// Encoding
// ------------------------------------------------------------------------------------------------

pub(crate) fn write_cstring(buf: &mut ByteBuffer, s: &str) -> Result<(), BuilderMisuse> {
    if s.as_bytes().contains(&0) {
        return Err(BuilderMisuse::InteriorNul);
    }
    buf.push_cstring_bytes(s.as_bytes());
    Ok(())
}

pub(crate) fn write_string(buf: &mut ByteBuffer, s: &str) -> Result<(), BuilderMisuse> {
    let len = i32::try_from(s.len() + 1).map_err(|_| BuilderMisuse::DocumentTooLarge)?;
    buf.push_i32(len);
    buf.push_bytes(s.as_bytes());
    buf.push_u8(0);
    Ok(())
}

pub(crate) fn write_binary(
    buf: &mut ByteBuffer,
    subtype: BinarySubtype,
    bytes: &[u8],
) -> Result<(), BuilderMisuse> {
    let too_large = |_| BuilderMisuse::DocumentTooLarge;
    if subtype == BinarySubtype::BinaryOld {
        let inner = i32::try_from(bytes.len()).map_err(too_large)?;
        buf.push_i32(inner.checked_add(4).ok_or(BuilderMisuse::DocumentTooLarge)?);
        buf.push_u8(subtype.into());
        buf.push_i32(inner);
    } else {
        buf.push_i32(i32::try_from(bytes.len()).map_err(too_large)?);
        buf.push_u8(subtype.into());
    }
    buf.push_bytes(bytes);
    Ok(())
}

/// Copies a borrowed document whose header is consistent. Its elements are
/// copied as they are.
fn write_embedded(buf: &mut ByteBuffer, view: DocumentView<'_>) -> Result<(), BuilderMisuse> {
    view.check_header().map_err(|_| BuilderMisuse::MalformedDocument)?;
    buf.push_bytes(view.as_bytes());
    Ok(())
}

/// Writes the payload of a borrowed value. Element headers are the caller's
/// concern.
pub(crate) fn write_payload(buf: &mut ByteBuffer, value: &RawValue<'_>) -> Result<(), BuilderMisuse> {
    match value {
        RawValue::Double(v) => buf.push_f64(*v),
        RawValue::String(s) | RawValue::JavaScriptCode(s) | RawValue::Symbol(s) => {
            write_string(buf, s)?;
        }
        RawValue::Document(d) => write_embedded(buf, *d)?,
        RawValue::Array(a) => write_embedded(buf, a.as_document())?,
        RawValue::Binary(b) => write_binary(buf, b.subtype, b.bytes)?,
        RawValue::ObjectId(oid) => buf.push_bytes(oid.as_slice()),
        RawValue::Boolean(b) => buf.push_u8(u8::from(*b)),
        RawValue::DateTime(dt) => buf.push_i64(dt.timestamp_millis()),
        RawValue::RegularExpression(re) => {
            write_cstring(buf, re.pattern)?;
            write_cstring(buf, re.options)?;
        }
        RawValue::DbPointer(p) => {
            write_string(buf, p.namespace)?;
            buf.push_bytes(p.id.as_slice());
        }
        RawValue::JavaScriptCodeWithScope(cws) => {
            let slot = buf.push_length_slot();
            write_string(buf, cws.code)?;
            write_embedded(buf, cws.scope)?;
            let total = i32::try_from(buf.len() - slot).map_err(|_| BuilderMisuse::DocumentTooLarge)?;
            buf.patch_i32(slot, total);
        }
        RawValue::Int32(v) => buf.push_i32(*v),
        RawValue::Timestamp(ts) => {
            buf.push_u32(ts.increment);
            buf.push_u32(ts.time);
        }
        RawValue::Int64(v) => buf.push_i64(*v),
        RawValue::Decimal128(d) => buf.push_bytes(&d.bytes()),
        RawValue::Undefined | RawValue::Null | RawValue::MinKey | RawValue::MaxKey => {}
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    fn span(bytes: &[u8]) -> Span<'_> {
        Span::new(bytes, 0)
    }

    #[test]
    fn string_requires_trailing_nul() {
        let bytes = [3, 0, 0, 0, b'h', b'i', b'!'];
        let err = payload_end(&span(&bytes), ElementType::String, 0, bytes.len()).unwrap_err();
        assert_eq!(err, CodecError::new(CodecErrorKind::MissingTerminator, 6));
    }

    #[test]
    fn string_length_must_fit() {
        let bytes = [9, 0, 0, 0, b'h', b'i', 0];
        let err = payload_end(&span(&bytes), ElementType::String, 0, bytes.len()).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::Truncated);
    }

    #[test]
    fn zero_length_string_is_invalid() {
        let bytes = [0, 0, 0, 0, 0];
        let err = payload_end(&span(&bytes), ElementType::String, 0, bytes.len()).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::InvalidLength(0));
    }

    #[test]
    fn strict_booleans() {
        let bytes = [2];
        let err = decode_payload(&span(&bytes), ElementType::Boolean, 0, 1).unwrap_err();
        assert_eq!(err.kind, CodecErrorKind::InvalidBoolean(2));
        assert_eq!(
            decode_payload(&span(&[1]), ElementType::Boolean, 0, 1).unwrap(),
            RawValue::Boolean(true)
        );
    }

    #[test]
    fn old_binary_carries_inner_length() {
        let mut buf = ByteBuffer::new();
        write_binary(&mut buf, BinarySubtype::BinaryOld, b"abc").unwrap();
        assert_eq!(buf.as_slice(), &[7, 0, 0, 0, 2, 3, 0, 0, 0, b'a', b'b', b'c']);
        let s = span(buf.as_slice());
        let end = payload_end(&s, ElementType::Binary, 0, buf.len()).unwrap();
        assert_eq!(end, buf.len());
        let RawValue::Binary(b) = decode_payload(&s, ElementType::Binary, 0, end).unwrap() else {
            panic!("expected binary");
        };
        assert_eq!(b.bytes, b"abc");
        assert_eq!(b.subtype, BinarySubtype::BinaryOld);
    }

    #[test]
    fn errors_report_absolute_offsets() {
        let bytes = [0xAA, 0xAA, 2, 0, 0, 0, b'x', 1];
        let s = Span::new(&bytes[2..], 100);
        let err = payload_end(&s, ElementType::String, 0, 6).unwrap_err();
        assert_eq!(err.offset, 105);
    }

    #[test]
    fn interior_nul_rejected_in_cstrings() {
        let mut buf = ByteBuffer::new();
        assert_eq!(write_cstring(&mut buf, "a\0b"), Err(BuilderMisuse::InteriorNul));
        assert!(buf.is_empty());
    }

    #[test]
    fn borrowed_documents_need_a_consistent_header() {
        let mut buf = ByteBuffer::new();
        let short = RawValue::Document(DocumentView::new(&[1, 2, 3]));
        assert_eq!(write_payload(&mut buf, &short), Err(BuilderMisuse::MalformedDocument));
        let scope = CodeWithScopeRef {
            code: "f()",
            scope: DocumentView::new(&[6, 0, 0, 0, 0]),
        };
        assert_eq!(
            write_payload(&mut buf, &RawValue::JavaScriptCodeWithScope(scope)),
            Err(BuilderMisuse::MalformedDocument)
        );
        let mut ok = ByteBuffer::new();
        let empty = RawValue::Array(ArrayView::new(&[5, 0, 0, 0, 0]));
        write_payload(&mut ok, &empty).unwrap();
        assert_eq!(ok.as_slice(), &[5, 0, 0, 0, 0]);
    }
}
