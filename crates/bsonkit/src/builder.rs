//! Incremental construction of encoded documents and arrays.
//!
//! [`Builder`] is the low-level state machine: it tracks a stack of open
//! sub-documents and sub-arrays and reports out-of-order calls as
//! [`BuilderMisuse`] errors. [`DocumentBuilder`] and [`ArrayBuilder`] wrap it
//! in closures so nesting is always balanced.

use alloc::vec::Vec;
use core::mem;

use tracing::trace;

use crate::{
    bson::{self, Bson, Document},
    buffer::ByteBuffer,
    codec,
    decimal128::Decimal128,
    error::{BuilderMisuse, Result},
    oid::ObjectId,
    raw::{BinaryRef, RawValue},
    spec::ElementType,
    types::{DateTime, Timestamp},
    value::{ArrayValue, DocumentValue},
    view::{ArrayView, DocumentView, IndexKey},
};

/// Anything a builder can append without first converting it to [`Bson`].
///
/// Borrowed views are copied byte-for-byte, owned values are encoded in
/// place.
#[derive(Debug, Clone, Copy)]
pub enum BsonRef<'a> {
    Owned(&'a Bson),
    Document(&'a Document),
    Raw(RawValue<'a>),
}

impl BsonRef<'_> {
    #[must_use]
    pub fn element_type(&self) -> ElementType {
        match self {
            BsonRef::Owned(v) => v.element_type(),
            BsonRef::Document(_) => ElementType::EmbeddedDocument,
            BsonRef::Raw(v) => v.element_type(),
        }
    }

    fn write(&self, buf: &mut ByteBuffer) -> Result<(), BuilderMisuse> {
        match self {
            BsonRef::Owned(v) => bson::write_bson(buf, v),
            BsonRef::Document(d) => bson::write_document(buf, d.iter()),
            BsonRef::Raw(v) => codec::write_payload(buf, v),
        }
    }
}

impl<'a> From<&'a Bson> for BsonRef<'a> {
    fn from(v: &'a Bson) -> Self {
        BsonRef::Owned(v)
    }
}

impl<'a> From<&'a Document> for BsonRef<'a> {
    fn from(d: &'a Document) -> Self {
        BsonRef::Document(d)
    }
}

impl<'a> From<RawValue<'a>> for BsonRef<'a> {
    fn from(v: RawValue<'a>) -> Self {
        BsonRef::Raw(v)
    }
}

impl<'a> From<&'a DocumentValue> for BsonRef<'a> {
    fn from(v: &'a DocumentValue) -> Self {
        BsonRef::Raw(RawValue::Document(v.view()))
    }
}

impl<'a> From<&'a ArrayValue> for BsonRef<'a> {
    fn from(v: &'a ArrayValue) -> Self {
        BsonRef::Raw(RawValue::Array(v.view()))
    }
}

impl<'a> From<&'a alloc::string::String> for BsonRef<'a> {
    fn from(s: &'a alloc::string::String) -> Self {
        BsonRef::Raw(RawValue::String(s))
    }
}

macro_rules! impl_from_raw {
    ($($t:ty),* $(,)?) => {
        $(
            impl<'a> From<$t> for BsonRef<'a> {
                fn from(v: $t) -> Self {
                    BsonRef::Raw(RawValue::from(v))
                }
            }
        )*
    };
}

impl_from_raw!(
    f64,
    bool,
    i32,
    i64,
    ObjectId,
    DateTime,
    Timestamp,
    Decimal128,
    &'a str,
    DocumentView<'a>,
    ArrayView<'a>,
    BinaryRef<'a>,
);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum FrameKind {
    Document,
    Array,
}

#[derive(Debug, Clone, Copy)]
struct Frame {
    kind: FrameKind,
    /// Offset of the element header that opened the frame.
    mark: usize,
    /// Offset of the frame's length slot.
    start: usize,
    /// Next decimal key for array frames.
    next_index: usize,
}

impl Frame {
    fn new(kind: FrameKind, mark: usize, start: usize) -> Self {
        Self {
            kind,
            mark,
            start,
            next_index: 0,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum State {
    Building,
    /// The root terminator and length are in place because a view was
    /// taken; the next mutation removes the terminator again.
    Terminated,
    Finalized,
}

/// Appends elements to a growing buffer.
///
/// ```
/// use bsonkit::Builder;
///
/// let mut builder = Builder::new();
/// builder.append("a", 1)?;
/// builder.open_array("b")?;
/// builder.push("x")?;
/// builder.close_array()?;
/// let doc = builder.finalize()?;
/// assert_eq!(doc.get("b").at(0).get_string()?, "x");
/// # Ok::<(), bsonkit::Error>(())
/// ```
#[derive(Debug, Clone)]
pub struct Builder {
    buf: ByteBuffer,
    root: Frame,
    /// Open sub-documents and sub-arrays, innermost last.
    frames: Vec<Frame>,
    state: State,
}

impl Default for Builder {
    fn default() -> Self {
        Self::new()
    }
}

impl Builder {
    /// A builder whose root is a document.
    #[must_use]
    pub fn new() -> Self {
        Self::with_root(FrameKind::Document)
    }

    /// A builder whose root is an array; values are appended with
    /// [`Builder::push`].
    #[must_use]
    pub fn new_array() -> Self {
        Self::with_root(FrameKind::Array)
    }

    fn with_root(kind: FrameKind) -> Self {
        let mut buf = ByteBuffer::new();
        let start = buf.push_length_slot();
        Self {
            buf,
            root: Frame::new(kind, 0, start),
            frames: Vec::new(),
            state: State::Building,
        }
    }

    /// Number of open sub-documents and sub-arrays.
    #[must_use]
    pub fn depth(&self) -> usize {
        self.frames.len()
    }

    #[must_use]
    pub fn is_finalized(&self) -> bool {
        self.state == State::Finalized
    }

    /// Bytes written so far.
    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.buf.len()
    }

    fn top(&self) -> &Frame {
        self.frames.last().unwrap_or(&self.root)
    }

    fn top_mut(&mut self) -> &mut Frame {
        self.frames.last_mut().unwrap_or(&mut self.root)
    }

    /// Prepares for a mutation and returns the kind of the innermost frame.
    fn begin(&mut self) -> Result<FrameKind, BuilderMisuse> {
        match self.state {
            State::Finalized => return Err(BuilderMisuse::Finalized),
            State::Terminated => {
                self.buf.pop();
                self.state = State::Building;
            }
            State::Building => {}
        }
        Ok(self.top().kind)
    }

    /// Writes one element header and payload, leaving the buffer untouched
    /// on failure.
    fn write_element(&mut self, key: &str, value: BsonRef<'_>) -> Result<(), BuilderMisuse> {
        let mark = self.buf.len();
        let result = write_header(&mut self.buf, value.element_type(), key)
            .and_then(|()| value.write(&mut self.buf));
        if result.is_err() {
            self.buf.truncate(mark);
        }
        result
    }

    /// Appends `value` under `key` to the innermost document.
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::KeyInArray`] inside an array,
    /// [`BuilderMisuse::InteriorNul`] if `key` contains a NUL byte,
    /// [`BuilderMisuse::MalformedDocument`] for a borrowed document or array
    /// whose header does not match its bytes, and
    /// [`BuilderMisuse::Finalized`] after [`Builder::finalize`]. Nothing is
    /// written on failure.
    pub fn append<'v>(&mut self, key: &str, value: impl Into<BsonRef<'v>>) -> Result<()> {
        if self.begin()? == FrameKind::Array {
            return Err(BuilderMisuse::KeyInArray.into());
        }
        self.write_element(key, value.into())?;
        Ok(())
    }

    /// Appends `value` to the innermost array under the next decimal key.
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::ArrayOperationOnDocument`] inside a document and
    /// [`BuilderMisuse::Finalized`] after [`Builder::finalize`].
    pub fn push<'v>(&mut self, value: impl Into<BsonRef<'v>>) -> Result<()> {
        if self.begin()? == FrameKind::Document {
            return Err(BuilderMisuse::ArrayOperationOnDocument.into());
        }
        let index = self.top().next_index;
        let mut key = IndexKey::new();
        self.write_element(key.format(index), value.into())?;
        self.top_mut().next_index += 1;
        Ok(())
    }

    /// Builds one of the payload-free types (null, undefined, min key or max
    /// key) under `key`.
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::InvalidType`] for any other type, plus the errors of
    /// [`Builder::append`].
    pub fn append_unit(&mut self, key: &str, ty: ElementType) -> Result<()> {
        let value = Bson::from_unit_type(ty)?;
        self.append(key, &value)
    }

    fn open(&mut self, key: Option<&str>, kind: FrameKind) -> Result<()> {
        let frame_kind = self.begin()?;
        let tag = match kind {
            FrameKind::Document => ElementType::EmbeddedDocument,
            FrameKind::Array => ElementType::Array,
        };
        let mark = self.buf.len();
        let mut index_key = IndexKey::new();
        let header = match (key, frame_kind) {
            (Some(_), FrameKind::Array) => Err(BuilderMisuse::KeyInArray),
            (None, FrameKind::Document) => Err(BuilderMisuse::ArrayOperationOnDocument),
            (Some(key), FrameKind::Document) => write_header(&mut self.buf, tag, key),
            (None, FrameKind::Array) => {
                let index = self.top().next_index;
                write_header(&mut self.buf, tag, index_key.format(index))
            }
        };
        if let Err(err) = header {
            self.buf.truncate(mark);
            return Err(err.into());
        }
        if frame_kind == FrameKind::Array {
            self.top_mut().next_index += 1;
        }
        let start = self.buf.push_length_slot();
        self.frames.push(Frame::new(kind, mark, start));
        Ok(())
    }

    /// Opens a sub-document under `key`.
    ///
    /// # Errors
    ///
    /// As for [`Builder::append`].
    pub fn open_document(&mut self, key: &str) -> Result<()> {
        self.open(Some(key), FrameKind::Document)
    }

    /// Opens a sub-array under `key`.
    ///
    /// # Errors
    ///
    /// As for [`Builder::append`].
    pub fn open_array(&mut self, key: &str) -> Result<()> {
        self.open(Some(key), FrameKind::Array)
    }

    /// Opens a sub-document as the next array element.
    ///
    /// # Errors
    ///
    /// As for [`Builder::push`].
    pub fn push_document(&mut self) -> Result<()> {
        self.open(None, FrameKind::Document)
    }

    /// Opens a sub-array as the next array element.
    ///
    /// # Errors
    ///
    /// As for [`Builder::push`].
    pub fn push_array(&mut self) -> Result<()> {
        self.open(None, FrameKind::Array)
    }

    fn close(&mut self, kind: FrameKind) -> Result<()> {
        if self.state == State::Finalized {
            return Err(BuilderMisuse::Finalized.into());
        }
        let Some(top) = self.frames.last().copied() else {
            return Err(match kind {
                FrameKind::Document => BuilderMisuse::NoDocumentToClose,
                FrameKind::Array => BuilderMisuse::NoArrayToClose,
            }
            .into());
        };
        match (kind, top.kind) {
            (FrameKind::Document, FrameKind::Array) => {
                return Err(BuilderMisuse::CloseDocumentInArray.into());
            }
            (FrameKind::Array, FrameKind::Document) => {
                return Err(BuilderMisuse::CloseArrayInDocument.into());
            }
            _ => {}
        }
        self.buf.push_u8(0);
        if let Err(err) = bson::patch_length(&mut self.buf, top.start) {
            self.buf.pop();
            return Err(err.into());
        }
        self.frames.pop();
        trace!(
            depth = self.frames.len(),
            bytes = self.buf.len() - top.start,
            kind = ?top.kind,
            "closed nested context"
        );
        Ok(())
    }

    /// Closes the innermost sub-document.
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::NoDocumentToClose`] when only the root is open and
    /// [`BuilderMisuse::CloseDocumentInArray`] when the innermost context is
    /// an array.
    pub fn close_document(&mut self) -> Result<()> {
        self.close(FrameKind::Document)
    }

    /// Closes the innermost sub-array.
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::NoArrayToClose`] when only the root is open and
    /// [`BuilderMisuse::CloseArrayInDocument`] when the innermost context is
    /// a document.
    pub fn close_array(&mut self) -> Result<()> {
        self.close(FrameKind::Array)
    }

    /// Copies every element of `view` into the innermost context. Documents
    /// keep the original keys; arrays renumber the elements.
    ///
    /// # Errors
    ///
    /// [`Error::Codec`](crate::Error::Codec) if `view` is malformed, in which
    /// case nothing is appended.
    pub fn concatenate(&mut self, view: DocumentView<'_>) -> Result<()> {
        let kind = self.begin()?;
        let mark = self.buf.len();
        let mut index = self.top().next_index;
        match copy_elements(&mut self.buf, kind, view, &mut index) {
            Ok(()) => {
                self.top_mut().next_index = index;
                Ok(())
            }
            Err(err) => {
                self.buf.truncate(mark);
                Err(err)
            }
        }
    }

    /// Drops every frame above `depth` together with the bytes written for
    /// it, as if the frames had never been opened.
    fn abandon(&mut self, depth: usize) {
        while self.frames.len() > depth {
            let Some(frame) = self.frames.pop() else {
                break;
            };
            self.buf.truncate(frame.mark);
            let parent = self.top_mut();
            if parent.kind == FrameKind::Array {
                parent.next_index = parent.next_index.saturating_sub(1);
            }
        }
    }

    /// Runs `f` inside a frame opened by `open`, closing it afterwards. If
    /// `f` fails the frame is abandoned and the builder is left as it was.
    fn scoped<B>(
        &mut self,
        open: impl FnOnce(&mut Self) -> Result<()>,
        f: impl FnOnce(&mut Self) -> Result<B>,
        close: impl FnOnce(&mut Self) -> Result<()>,
    ) -> Result<B> {
        let depth = self.depth();
        open(self)?;
        match f(self).and_then(|out| close(self).map(|()| out)) {
            Ok(out) => Ok(out),
            Err(err) => {
                self.abandon(depth);
                Err(err)
            }
        }
    }

    fn terminate(&mut self) -> Result<(), BuilderMisuse> {
        match self.state {
            State::Finalized => Err(BuilderMisuse::Finalized),
            _ if !self.frames.is_empty() => Err(BuilderMisuse::OpenContexts {
                depth: self.frames.len(),
            }),
            State::Terminated => Ok(()),
            State::Building => {
                self.buf.push_u8(0);
                if let Err(err) = bson::patch_length(&mut self.buf, self.root.start) {
                    self.buf.pop();
                    return Err(err);
                }
                self.state = State::Terminated;
                Ok(())
            }
        }
    }

    /// Borrows the document built so far. The builder stays usable; the
    /// next append continues where the view ends.
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::OpenContexts`] while sub-contexts are open and
    /// [`BuilderMisuse::Finalized`] after [`Builder::finalize`].
    pub fn view(&mut self) -> Result<DocumentView<'_>> {
        self.terminate()?;
        Ok(DocumentView::new(self.buf.as_slice()))
    }

    /// Completes the document and hands over the buffer. Every later call
    /// except [`Builder::clear`] fails with [`BuilderMisuse::Finalized`].
    ///
    /// # Errors
    ///
    /// [`BuilderMisuse::OpenContexts`] while sub-contexts are open,
    /// [`BuilderMisuse::Finalized`] on a second call, and
    /// [`BuilderMisuse::DocumentTooLarge`] past the size limit.
    pub fn finalize(&mut self) -> Result<DocumentValue> {
        self.terminate()?;
        let bytes = mem::take(&mut self.buf).into_vec();
        self.state = State::Finalized;
        trace!(bytes = bytes.len(), "finalized document");
        Ok(DocumentValue::from_vec_unchecked(bytes))
    }

    /// [`Builder::finalize`], typed as an array.
    ///
    /// # Errors
    ///
    /// As for [`Builder::finalize`].
    pub fn finalize_array(&mut self) -> Result<ArrayValue> {
        self.finalize().map(ArrayValue::from)
    }

    /// Discards everything and starts over with the same kind of root.
    pub fn clear(&mut self) {
        *self = Self::with_root(self.root.kind);
    }

    /// Builds a document through a scoped [`DocumentBuilder`].
    ///
    /// ```
    /// use bsonkit::Builder;
    ///
    /// let doc = Builder::build_document(|d| {
    ///     d.append("name", "ada")?;
    ///     d.array("langs", |a| {
    ///         a.push("en")?;
    ///         a.push("fr")?;
    ///         Ok(())
    ///     })?;
    ///     Ok(())
    /// })?;
    /// assert_eq!(doc.get("langs").at(1).get_string()?, "fr");
    /// # Ok::<(), bsonkit::Error>(())
    /// ```
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, and the errors of [`Builder::append`].
    pub fn build_document<F>(f: F) -> Result<DocumentValue>
    where
        F: FnOnce(&mut DocumentBuilder<'_>) -> Result<()>,
    {
        let mut builder = Builder::new();
        f(&mut DocumentBuilder {
            inner: &mut builder,
        })?;
        builder.finalize()
    }

    /// Builds an array through a scoped [`ArrayBuilder`].
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, and the errors of [`Builder::push`].
    pub fn build_array<F>(f: F) -> Result<ArrayValue>
    where
        F: FnOnce(&mut ArrayBuilder<'_>) -> Result<()>,
    {
        let mut builder = Builder::new_array();
        f(&mut ArrayBuilder {
            inner: &mut builder,
        })?;
        builder.finalize_array()
    }
}

fn write_header(buf: &mut ByteBuffer, tag: ElementType, key: &str) -> Result<(), BuilderMisuse> {
    buf.push_u8(tag as u8);
    codec::write_cstring(buf, key)
}

fn copy_elements(
    buf: &mut ByteBuffer,
    kind: FrameKind,
    view: DocumentView<'_>,
    index: &mut usize,
) -> Result<()> {
    for el in view {
        let el = el?;
        match kind {
            FrameKind::Document => buf.push_bytes(el.raw_bytes()?),
            FrameKind::Array => {
                let mut key = IndexKey::new();
                buf.push_u8(el.element_type()? as u8);
                buf.push_cstring_bytes(key.format(*index).as_bytes());
                buf.push_bytes(el.value_bytes()?);
                *index += 1;
            }
        }
    }
    Ok(())
}

/// Keyed appends into a document context.
#[derive(Debug)]
pub struct DocumentBuilder<'b> {
    inner: &'b mut Builder,
}

impl DocumentBuilder<'_> {
    /// # Errors
    ///
    /// See [`Builder::append`].
    pub fn append<'v>(&mut self, key: &str, value: impl Into<BsonRef<'v>>) -> Result<&mut Self> {
        self.inner.append(key, value)?;
        Ok(self)
    }

    /// Appends a sub-document filled in by `f`. If `f` fails, nothing of
    /// the sub-document remains.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, and the errors of [`Builder::append`].
    pub fn document<F>(&mut self, key: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut DocumentBuilder<'_>) -> Result<()>,
    {
        self.inner.scoped(
            |b| b.open_document(key),
            |b| f(&mut DocumentBuilder { inner: b }),
            Builder::close_document,
        )?;
        Ok(self)
    }

    /// Appends a sub-array filled in by `f`. If `f` fails, nothing of the
    /// sub-array remains.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, and the errors of [`Builder::append`].
    pub fn array<F>(&mut self, key: &str, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ArrayBuilder<'_>) -> Result<()>,
    {
        self.inner.scoped(
            |b| b.open_array(key),
            |b| f(&mut ArrayBuilder { inner: b }),
            Builder::close_array,
        )?;
        Ok(self)
    }

    /// # Errors
    ///
    /// See [`Builder::concatenate`].
    pub fn concatenate(&mut self, view: DocumentView<'_>) -> Result<&mut Self> {
        self.inner.concatenate(view)?;
        Ok(self)
    }
}

/// Indexed appends into an array context.
#[derive(Debug)]
pub struct ArrayBuilder<'b> {
    inner: &'b mut Builder,
}

impl ArrayBuilder<'_> {
    /// # Errors
    ///
    /// See [`Builder::push`].
    pub fn push<'v>(&mut self, value: impl Into<BsonRef<'v>>) -> Result<&mut Self> {
        self.inner.push(value)?;
        Ok(self)
    }

    /// Appends a sub-document filled in by `f`. If `f` fails, nothing of
    /// the sub-document remains.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, and the errors of [`Builder::push`].
    pub fn document<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut DocumentBuilder<'_>) -> Result<()>,
    {
        self.inner.scoped(
            Builder::push_document,
            |b| f(&mut DocumentBuilder { inner: b }),
            Builder::close_document,
        )?;
        Ok(self)
    }

    /// Appends a sub-array filled in by `f`. If `f` fails, nothing of the
    /// sub-array remains.
    ///
    /// # Errors
    ///
    /// Whatever `f` returns, and the errors of [`Builder::push`].
    pub fn array<F>(&mut self, f: F) -> Result<&mut Self>
    where
        F: FnOnce(&mut ArrayBuilder<'_>) -> Result<()>,
    {
        self.inner.scoped(
            Builder::push_array,
            |b| f(&mut ArrayBuilder { inner: b }),
            Builder::close_array,
        )?;
        Ok(self)
    }

    /// Appends the elements of `array`, renumbered.
    ///
    /// # Errors
    ///
    /// See [`Builder::concatenate`].
    pub fn concatenate(&mut self, array: ArrayView<'_>) -> Result<&mut Self> {
        self.inner.concatenate(array.as_document())?;
        Ok(self)
    }
}

/// Builds a [`Bson`] value with JSON-like syntax.
///
/// ```
/// use bsonkit::{bson, Bson};
///
/// let value = bson!({ "a": [1, null], "b": { "c": "d" } });
/// assert_eq!(value.as_document().unwrap().get("a"), Some(&bson!([1, null])));
/// ```
#[macro_export]
macro_rules! bson {
    // Array elements, accumulated in brackets.
    (@array [$($elems:expr,)*]) => {{
        let elems: $crate::Array = $crate::vec![$($elems,)*];
        elems
    }};
    (@array [$($elems:expr,)*] null $(, $($rest:tt)*)?) => {
        $crate::bson!(@array [$($elems,)* $crate::Bson::Null,] $($($rest)*)?)
    };
    (@array [$($elems:expr,)*] [$($array:tt)*] $(, $($rest:tt)*)?) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!([$($array)*]),] $($($rest)*)?)
    };
    (@array [$($elems:expr,)*] {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!({$($map)*}),] $($($rest)*)?)
    };
    (@array [$($elems:expr,)*] $next:expr, $($rest:tt)*) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!($next),] $($rest)*)
    };
    (@array [$($elems:expr,)*] $last:expr) => {
        $crate::bson!(@array [$($elems,)* $crate::bson!($last),])
    };

    // Object entries, inserted one at a time.
    (@object $doc:ident) => {};
    (@object $doc:ident $key:tt : null $(, $($rest:tt)*)?) => {
        $doc.insert($key, $crate::Bson::Null);
        $crate::bson!(@object $doc $($($rest)*)?);
    };
    (@object $doc:ident $key:tt : [$($array:tt)*] $(, $($rest:tt)*)?) => {
        $doc.insert($key, $crate::bson!([$($array)*]));
        $crate::bson!(@object $doc $($($rest)*)?);
    };
    (@object $doc:ident $key:tt : {$($map:tt)*} $(, $($rest:tt)*)?) => {
        $doc.insert($key, $crate::bson!({$($map)*}));
        $crate::bson!(@object $doc $($($rest)*)?);
    };
    (@object $doc:ident $key:tt : $value:expr, $($rest:tt)*) => {
        $doc.insert($key, $crate::bson!($value));
        $crate::bson!(@object $doc $($rest)*);
    };
    (@object $doc:ident $key:tt : $value:expr) => {
        $doc.insert($key, $crate::bson!($value));
    };

    (@document $($tt:tt)*) => {{
        let mut doc = $crate::Document::new();
        $crate::bson!(@object doc $($tt)*);
        doc
    }};

    (null) => {
        $crate::Bson::Null
    };
    ([$($tt:tt)*]) => {
        $crate::Bson::Array($crate::bson!(@array [] $($tt)*))
    };
    ({$($tt:tt)*}) => {
        $crate::Bson::Document($crate::bson!(@document $($tt)*))
    };
    ($other:expr) => {
        $crate::Bson::from($other)
    };
}

/// Builds an encoded [`DocumentValue`] with JSON-like syntax.
///
/// Evaluates to `Result<DocumentValue>`; encoding fails only for keys that
/// contain NUL bytes or documents past the size limit.
///
/// ```
/// use bsonkit::doc;
///
/// let value = doc! { "a": 1, "b": [1, 2], "c": { "d": null } }?;
/// assert_eq!(value.get("c").get("d").get_null(), Ok(()));
/// # Ok::<(), bsonkit::Error>(())
/// ```
#[macro_export]
macro_rules! doc {
    ($($tt:tt)*) => {
        $crate::Document::encode(&$crate::bson!(@document $($tt)*))
    };
}

/// Builds an encoded [`ArrayValue`] with JSON-like syntax. Evaluates to
/// `Result<ArrayValue>`.
#[macro_export]
macro_rules! array {
    ($($tt:tt)*) => {
        $crate::ArrayValue::from_values($crate::bson!(@array [] $($tt)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::Error;

    #[test]
    fn state_machine_rejects_misuse() {
        let mut b = Builder::new();
        assert_eq!(b.push(1), Err(Error::BuilderMisuse(BuilderMisuse::ArrayOperationOnDocument)));
        assert_eq!(b.close_document(), Err(Error::BuilderMisuse(BuilderMisuse::NoDocumentToClose)));
        b.open_array("xs").unwrap();
        assert_eq!(b.append("k", 1), Err(Error::BuilderMisuse(BuilderMisuse::KeyInArray)));
        assert_eq!(
            b.close_document(),
            Err(Error::BuilderMisuse(BuilderMisuse::CloseDocumentInArray))
        );
        assert_eq!(
            b.finalize(),
            Err(Error::BuilderMisuse(BuilderMisuse::OpenContexts { depth: 1 }))
        );
        b.close_array().unwrap();
        b.finalize().unwrap();
        assert_eq!(b.append("k", 1), Err(Error::BuilderMisuse(BuilderMisuse::Finalized)));
        assert_eq!(b.finalize(), Err(Error::BuilderMisuse(BuilderMisuse::Finalized)));
    }

    #[test]
    fn failed_append_leaves_buffer_untouched() {
        let mut b = Builder::new();
        b.append("a", 1).unwrap();
        let before = b.len_bytes();
        assert_eq!(b.append("b\0", 2), Err(Error::BuilderMisuse(BuilderMisuse::InteriorNul)));
        assert_eq!(b.len_bytes(), before);
    }

    #[test]
    fn view_then_continue() {
        let mut b = Builder::new();
        b.append("a", 1).unwrap();
        assert_eq!(b.view().unwrap().element_count(), Ok(1));
        b.append("b", 2).unwrap();
        let doc = b.finalize().unwrap();
        assert_eq!(doc.view().element_count(), Ok(2));
        doc.view().validate().unwrap();
    }

    #[test]
    fn concatenate_renumbers_in_arrays() {
        let source = doc! { "x": 1, "y": "two" }.unwrap();
        let mut b = Builder::new_array();
        b.push(true).unwrap();
        b.concatenate(source.view()).unwrap();
        let array = b.finalize_array().unwrap();
        let keys: Vec<_> = array
            .iter()
            .map(|el| alloc::string::String::from(el.unwrap().key().unwrap()))
            .collect();
        assert_eq!(keys, ["0", "1", "2"]);
        assert_eq!(array.get(2).get_string(), Ok("two"));
    }

    #[test]
    fn clear_resets() {
        let mut b = Builder::new();
        b.append("a", 1).unwrap();
        b.finalize().unwrap();
        b.clear();
        assert!(!b.is_finalized());
        assert_eq!(b.finalize().unwrap(), DocumentValue::empty());
    }
}
