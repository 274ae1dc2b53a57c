//! Zero-copy, lazily validated views over encoded documents and arrays.
//!
//! Constructing a view never fails and never looks at the bytes. Problems
//! surface as [`Error::Codec`] values from the iterator and accessors, at the
//! point where the malformed bytes are actually read.

use alloc::{string::String, vec::Vec};
use core::{fmt, str};

use tracing::debug;

use crate::{
    bson::Document,
    codec::{self, Span},
    element::Element,
    error::{CodecError, CodecErrorKind, Error, Result},
    options::{DecodeOptions, JsonMode, Utf8Validation},
    raw::RawValue,
    spec::{ElementType, MIN_DOCUMENT_SIZE},
    value::{ArrayValue, DocumentValue},
};

/// A borrowed view over one encoded document.
///
/// Equality is byte-for-byte: two views are equal exactly when their buffers
/// are identical, regardless of whether they would decode to the same
/// logical document.
#[derive(Clone, Copy)]
pub struct DocumentView<'a> {
    span: Span<'a>,
}

const EMPTY_DOCUMENT: [u8; 5] = [5, 0, 0, 0, 0];

impl<'a> DocumentView<'a> {
    /// Wraps `bytes` without inspecting them.
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self::with_base(bytes, 0)
    }

    pub(crate) fn with_base(bytes: &'a [u8], base: usize) -> Self {
        Self {
            span: Span::new(bytes, base),
        }
    }

    /// A view over the empty document `{}`.
    #[must_use]
    pub fn empty() -> DocumentView<'static> {
        DocumentView::new(&EMPTY_DOCUMENT)
    }

    /// Wraps `bytes` after checking the outer header: at least five bytes, a
    /// length prefix equal to `bytes.len()`, and a trailing NUL. Elements are
    /// still validated lazily.
    ///
    /// # Errors
    ///
    /// [`Error::Codec`] if the header is inconsistent.
    pub fn from_slice(bytes: &'a [u8]) -> Result<Self> {
        let view = Self::new(bytes);
        view.check_header()?;
        Ok(view)
    }

    pub(crate) fn check_header(&self) -> Result<(), CodecError> {
        let bytes = self.span.bytes;
        if bytes.len() < MIN_DOCUMENT_SIZE {
            return Err(self.span.err(CodecErrorKind::Truncated, bytes.len()));
        }
        let declared = self.span.read_i32(0, bytes.len())?;
        if usize::try_from(declared).ok() != Some(bytes.len()) {
            return Err(self.span.err(CodecErrorKind::LengthMismatch, 0));
        }
        if bytes[bytes.len() - 1] != 0 {
            return Err(self.span.err(CodecErrorKind::MissingTerminator, bytes.len() - 1));
        }
        Ok(())
    }

    /// An error located at the start of this view.
    pub(crate) fn error_here(&self, kind: CodecErrorKind) -> CodecError {
        self.span.err(kind, 0)
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.span.bytes
    }

    /// Length of the viewed buffer in bytes.
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.span.bytes.len()
    }

    /// Returns `true` if iteration yields no elements. A malformed document
    /// is not empty: its first step yields an error.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.iter().next().is_none()
    }

    /// Counts the elements.
    ///
    /// # Errors
    ///
    /// The first decoding error encountered.
    pub fn element_count(&self) -> Result<usize> {
        self.iter().try_fold(0, |n, el| el.map(|_| n + 1))
    }

    /// A fresh iterator positioned at the first element. Views may be
    /// iterated any number of times, concurrently if desired.
    #[must_use]
    pub fn iter(&self) -> Iter<'a> {
        Iter {
            span: self.span,
            pos: 0,
            state: IterState::Start,
        }
    }

    /// Finds the first element whose key equals `key` byte-for-byte.
    ///
    /// # Errors
    ///
    /// A decoding error encountered before a match was found.
    pub fn try_find(&self, key: &str) -> Result<Option<Element<'a>>> {
        for el in self.iter() {
            let el = el?;
            if el.key_unchecked().as_bytes() == key.as_bytes() {
                return Ok(Some(el));
            }
        }
        Ok(None)
    }

    /// Like [`DocumentView::try_find`], treating malformed data as absence.
    #[must_use]
    pub fn find(&self, key: &str) -> Option<Element<'a>> {
        self.try_find(key).ok().flatten()
    }

    /// Looks up `key`, returning the unset element when it is absent.
    #[must_use]
    pub fn get(&self, key: &str) -> Element<'a> {
        self.find(key).unwrap_or_else(Element::unset)
    }

    /// Walks the whole document, recursing into every nested document,
    /// array and code-with-scope.
    ///
    /// # Errors
    ///
    /// The first [`Error::Codec`] found.
    pub fn validate(&self) -> Result<()> {
        self.validate_with(&DecodeOptions::default())
    }

    /// [`DocumentView::validate`] with explicit options.
    ///
    /// # Errors
    ///
    /// The first [`Error::Codec`] found.
    pub fn validate_with(&self, options: &DecodeOptions) -> Result<()> {
        self.validate_at(options, 0).map_err(|err| {
            debug!(offset = err.offset, kind = %err.kind, "document failed validation");
            Error::Codec(err)
        })
    }

    fn validate_at(&self, options: &DecodeOptions, depth: usize) -> Result<(), CodecError> {
        if depth > options.max_depth {
            return Err(self.span.err(CodecErrorKind::MaxDepthExceeded, 0));
        }
        self.check_header()?;
        for el in self.iter() {
            let el = el.map_err(|err| match err {
                Error::Codec(c) => c,
                _ => self.span.err(CodecErrorKind::Truncated, 0),
            })?;
            let nested = el.validate_payload(options.utf8 == Utf8Validation::Strict)?;
            if let Some(nested) = nested {
                nested.validate_at(options, depth + 1)?;
            }
        }
        Ok(())
    }

    /// Copies the viewed bytes into an owning [`DocumentValue`].
    #[must_use]
    pub fn to_value(&self) -> DocumentValue {
        DocumentValue::from_vec_unchecked(self.span.bytes.to_vec())
    }

    /// Decodes into the owned [`Document`] model.
    ///
    /// # Errors
    ///
    /// Any decoding error in the document or its descendants.
    pub fn to_document(&self) -> Result<Document> {
        Document::decode(*self)
    }

    /// Renders the document as Extended JSON.
    ///
    /// # Errors
    ///
    /// Any decoding error in the document or its descendants.
    pub fn to_json(&self, mode: JsonMode) -> Result<String> {
        crate::json::to_json(self, mode)
    }
}

impl PartialEq for DocumentView<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.span.bytes == other.span.bytes
    }
}

impl Eq for DocumentView<'_> {}

impl fmt::Debug for DocumentView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&DebugNested::document(*self, 0), f)
    }
}

/// Debug rendering of nested documents and arrays, cut off with `..` past
/// the default nesting limit.
struct DebugNested<'a> {
    view: DocumentView<'a>,
    keyed: bool,
    depth: usize,
}

impl<'a> DebugNested<'a> {
    fn document(view: DocumentView<'a>, depth: usize) -> Self {
        Self { view, keyed: true, depth }
    }

    fn array(view: DocumentView<'a>, depth: usize) -> Self {
        Self { view, keyed: false, depth }
    }
}

impl fmt::Debug for DebugNested<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.depth > DecodeOptions::default().max_depth {
            return f.write_str("..");
        }
        let depth = self.depth + 1;
        if self.keyed {
            let mut map = f.debug_map();
            for el in self.view.iter() {
                match el.and_then(|el| Ok((el.key()?, el.value()?))) {
                    Ok((key, value)) => map.entry(&key, &DebugValue { value, depth }),
                    Err(err) => map.entry(&"<malformed>", &err),
                };
            }
            map.finish()
        } else {
            let mut list = f.debug_list();
            for el in self.view.iter() {
                match el.and_then(|el| el.value()) {
                    Ok(value) => list.entry(&DebugValue { value, depth }),
                    Err(err) => list.entry(&err),
                };
            }
            list.finish()
        }
    }
}

struct DebugValue<'a> {
    value: RawValue<'a>,
    depth: usize,
}

impl fmt::Debug for DebugValue<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let depth = self.depth;
        match self.value {
            RawValue::Document(d) => f
                .debug_tuple("Document")
                .field(&DebugNested::document(d, depth))
                .finish(),
            RawValue::Array(a) => f
                .debug_tuple("Array")
                .field(&DebugNested::array(a.as_document(), depth))
                .finish(),
            RawValue::JavaScriptCodeWithScope(cws) => f
                .debug_struct("JavaScriptCodeWithScope")
                .field("code", &cws.code)
                .field("scope", &DebugNested::document(cws.scope, depth))
                .finish(),
            ref other => fmt::Debug::fmt(other, f),
        }
    }
}

impl<'a> IntoIterator for DocumentView<'a> {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &DocumentView<'a> {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum IterState {
    Start,
    Running,
    Done,
}

/// Forward iterator over the elements of a [`DocumentView`].
///
/// Each step decodes exactly one element header. After the first error the
/// iterator is fused and yields `None`.
#[derive(Debug, Clone)]
pub struct Iter<'a> {
    span: Span<'a>,
    pos: usize,
    state: IterState,
}

impl<'a> Iter<'a> {
    fn step(&mut self) -> Result<Option<Element<'a>>, CodecError> {
        let span = self.span;
        let len = span.bytes.len();
        if self.state == IterState::Start {
            DocumentView { span }.check_header()?;
            self.state = IterState::Running;
            self.pos = 4;
        }
        // The header check guarantees a terminator at `len - 1`.
        let terminator = len - 1;
        let start = self.pos;
        let tag_byte = span.bytes[start];
        if tag_byte == 0 {
            if start != terminator {
                return Err(span.err(CodecErrorKind::TrailingBytes, start));
            }
            return Ok(None);
        }
        let tag = ElementType::from_u8(tag_byte)
            .ok_or_else(|| span.err(CodecErrorKind::UnknownType(tag_byte), start))?;
        let (key, value_start) = span.read_cstring(start + 1, terminator)?;
        let key = str::from_utf8(key).map_err(|_| span.err(CodecErrorKind::InvalidUtf8, start + 1))?;
        let value_end = codec::payload_end(&span, tag, value_start, terminator)?;
        self.pos = value_end;
        Ok(Some(Element::new(span, start, key, tag, value_start, value_end)))
    }
}

impl<'a> Iterator for Iter<'a> {
    type Item = Result<Element<'a>>;

    fn next(&mut self) -> Option<Self::Item> {
        if self.state == IterState::Done {
            return None;
        }
        match self.step() {
            Ok(Some(el)) => Some(Ok(el)),
            Ok(None) => {
                self.state = IterState::Done;
                None
            }
            Err(err) => {
                self.state = IterState::Done;
                Some(Err(Error::Codec(err)))
            }
        }
    }
}

impl core::iter::FusedIterator for Iter<'_> {}

/// A borrowed view over an encoded array: a document whose keys are expected
/// to be `"0"`, `"1"`, ... Keys are not checked; indexing searches for the
/// decimal string of the index.
#[derive(Clone, Copy, PartialEq, Eq)]
pub struct ArrayView<'a>(DocumentView<'a>);

impl<'a> ArrayView<'a> {
    #[must_use]
    pub fn new(bytes: &'a [u8]) -> Self {
        Self(DocumentView::new(bytes))
    }

    /// See [`DocumentView::from_slice`].
    ///
    /// # Errors
    ///
    /// [`Error::Codec`] if the header is inconsistent.
    pub fn from_slice(bytes: &'a [u8]) -> Result<Self> {
        DocumentView::from_slice(bytes).map(Self)
    }

    #[must_use]
    pub fn empty() -> ArrayView<'static> {
        ArrayView(DocumentView::empty())
    }

    #[must_use]
    pub fn as_document(&self) -> DocumentView<'a> {
        self.0
    }

    #[must_use]
    pub fn as_bytes(&self) -> &'a [u8] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.0.len_bytes()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Number of elements.
    ///
    /// # Errors
    ///
    /// The first decoding error encountered.
    pub fn element_count(&self) -> Result<usize> {
        self.0.element_count()
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'a> {
        self.0.iter()
    }

    /// Iterates the decoded values, ignoring keys.
    pub fn values(&self) -> impl Iterator<Item = Result<RawValue<'a>>> + 'a {
        self.0.iter().map(|el| el.and_then(|el| el.value()))
    }

    /// Finds the element stored under the decimal key for `index`.
    ///
    /// # Errors
    ///
    /// A decoding error encountered before a match was found.
    pub fn try_find(&self, index: usize) -> Result<Option<Element<'a>>> {
        let mut buf = IndexKey::new();
        self.0.try_find(buf.format(index))
    }

    #[must_use]
    pub fn find(&self, index: usize) -> Option<Element<'a>> {
        self.try_find(index).ok().flatten()
    }

    /// Looks up `index`, returning the unset element when it is absent.
    #[must_use]
    pub fn get(&self, index: usize) -> Element<'a> {
        self.find(index).unwrap_or_else(Element::unset)
    }

    /// # Errors
    ///
    /// See [`DocumentView::validate`].
    pub fn validate(&self) -> Result<()> {
        self.0.validate()
    }

    #[must_use]
    pub fn to_value(&self) -> ArrayValue {
        ArrayValue::from(self.0.to_value())
    }

    /// Decodes every element into the owned model, dropping keys.
    ///
    /// # Errors
    ///
    /// Any decoding error in the array or its descendants.
    pub fn to_vec(&self) -> Result<Vec<crate::Bson>> {
        Ok(self.0.to_document()?.into_iter().map(|(_, v)| v).collect())
    }

    /// Renders the array as Extended JSON.
    ///
    /// # Errors
    ///
    /// Any decoding error in the array or its descendants.
    pub fn to_json(&self, mode: JsonMode) -> Result<String> {
        crate::json::array_to_json(self, mode)
    }
}

impl<'a> From<DocumentView<'a>> for ArrayView<'a> {
    fn from(view: DocumentView<'a>) -> Self {
        Self(view)
    }
}

impl<'a> From<ArrayView<'a>> for DocumentView<'a> {
    fn from(view: ArrayView<'a>) -> Self {
        view.0
    }
}

impl fmt::Debug for ArrayView<'_> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&DebugNested::array(self.0, 0), f)
    }
}

impl<'a> IntoIterator for ArrayView<'a> {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl<'a> IntoIterator for &ArrayView<'a> {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// Stack buffer for rendering array indices as keys without allocating.
pub(crate) struct IndexKey {
    buf: [u8; 20],
}

impl IndexKey {
    pub(crate) fn new() -> Self {
        Self { buf: [0; 20] }
    }

    pub(crate) fn format(&mut self, mut index: usize) -> &str {
        let mut at = self.buf.len();
        loop {
            at -= 1;
            #[allow(clippy::cast_possible_truncation)]
            let digit = (index % 10) as u8;
            self.buf[at] = b'0' + digit;
            index /= 10;
            if index == 0 {
                break;
            }
        }
        // Only ASCII digits were written.
        str::from_utf8(&self.buf[at..]).unwrap_or_default()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn index_keys() {
        let mut key = IndexKey::new();
        assert_eq!(key.format(0), "0");
        assert_eq!(key.format(10), "10");
        assert_eq!(key.format(usize::MAX), "18446744073709551615");
    }

    #[test]
    fn empty_view() {
        let view = DocumentView::empty();
        assert!(view.is_empty());
        assert_eq!(view.element_count(), Ok(0));
        view.validate().unwrap();
    }
}
