//! Owning wrappers around encoded buffers.

use alloc::{boxed::Box, string::String, vec::Vec};
use core::fmt;

use crate::{
    bson::{Bson, Document},
    builder::Builder,
    element::Element,
    error::Result,
    options::JsonMode,
    view::{ArrayView, DocumentView, Iter},
};

/// Where the bytes of a value live. Foreign owners are dropped with the
/// value, which lets callers adopt memory from other allocators.
enum Storage {
    Vec(Vec<u8>),
    Foreign(Box<dyn AsRef<[u8]> + Send + Sync>),
}

impl Storage {
    fn as_slice(&self) -> &[u8] {
        match self {
            Storage::Vec(v) => v,
            Storage::Foreign(owner) => (**owner).as_ref(),
        }
    }
}

/// An encoded document that owns its buffer.
///
/// Cloning copies every byte. Views handed out by [`DocumentValue::view`]
/// borrow from the value and cannot outlive it.
pub struct DocumentValue {
    storage: Storage,
}

impl DocumentValue {
    /// The empty document `{}`.
    #[must_use]
    pub fn empty() -> Self {
        DocumentView::empty().to_value()
    }

    /// Takes ownership of `bytes` after checking the outer header.
    ///
    /// # Errors
    ///
    /// [`Error::Codec`](crate::Error::Codec) if the header is inconsistent.
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        DocumentView::from_slice(&bytes)?;
        Ok(Self::from_vec_unchecked(bytes))
    }

    pub(crate) fn from_vec_unchecked(bytes: Vec<u8>) -> Self {
        Self {
            storage: Storage::Vec(bytes),
        }
    }

    /// Adopts any owner of bytes, such as a buffer received from another
    /// allocator or a memory map. The owner is dropped with the value.
    ///
    /// # Errors
    ///
    /// [`Error::Codec`](crate::Error::Codec) if the header is inconsistent.
    pub fn adopt<T>(owner: T) -> Result<Self>
    where
        T: AsRef<[u8]> + Send + Sync + 'static,
    {
        DocumentView::from_slice(owner.as_ref())?;
        Ok(Self {
            storage: Storage::Foreign(Box::new(owner)),
        })
    }

    /// Builds a document from ordered `(key, value)` pairs in one step.
    ///
    /// # Errors
    ///
    /// [`Error::BuilderMisuse`](crate::Error::BuilderMisuse) if a key
    /// contains a NUL byte or the document grows past the size limit.
    pub fn from_pairs<I, K, V>(pairs: I) -> Result<Self>
    where
        I: IntoIterator<Item = (K, V)>,
        K: AsRef<str>,
        V: Into<Bson>,
    {
        let mut builder = Builder::new();
        for (key, value) in pairs {
            let value: Bson = value.into();
            builder.append(key.as_ref(), &value)?;
        }
        builder.finalize()
    }

    #[must_use]
    pub fn view(&self) -> DocumentView<'_> {
        DocumentView::new(self.storage.as_slice())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.storage.as_slice()
    }

    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.as_bytes().len()
    }

    /// Releases the buffer. Adopted buffers are copied out first.
    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        match self.storage {
            Storage::Vec(v) => v,
            Storage::Foreign(owner) => (*owner).as_ref().to_vec(),
        }
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        self.view().iter()
    }

    #[must_use]
    pub fn find(&self, key: &str) -> Option<Element<'_>> {
        self.view().find(key)
    }

    #[must_use]
    pub fn get(&self, key: &str) -> Element<'_> {
        self.view().get(key)
    }

    /// # Errors
    ///
    /// See [`DocumentView::to_document`].
    pub fn to_document(&self) -> Result<Document> {
        self.view().to_document()
    }

    /// # Errors
    ///
    /// See [`DocumentView::to_json`].
    pub fn to_json(&self, mode: JsonMode) -> Result<String> {
        self.view().to_json(mode)
    }
}

impl Clone for DocumentValue {
    fn clone(&self) -> Self {
        Self::from_vec_unchecked(self.as_bytes().to_vec())
    }
}

impl PartialEq for DocumentValue {
    fn eq(&self, other: &Self) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl Eq for DocumentValue {}

impl PartialEq<DocumentView<'_>> for DocumentValue {
    fn eq(&self, other: &DocumentView<'_>) -> bool {
        self.as_bytes() == other.as_bytes()
    }
}

impl fmt::Debug for DocumentValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}

impl AsRef<[u8]> for DocumentValue {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<'a> From<&'a DocumentValue> for DocumentView<'a> {
    fn from(value: &'a DocumentValue) -> Self {
        value.view()
    }
}

impl<'a> IntoIterator for &'a DocumentValue {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

/// An encoded array that owns its buffer.
#[derive(Clone, PartialEq, Eq)]
pub struct ArrayValue(DocumentValue);

impl ArrayValue {
    #[must_use]
    pub fn empty() -> Self {
        Self(DocumentValue::empty())
    }

    /// # Errors
    ///
    /// See [`DocumentValue::from_vec`].
    pub fn from_vec(bytes: Vec<u8>) -> Result<Self> {
        DocumentValue::from_vec(bytes).map(Self)
    }

    /// # Errors
    ///
    /// See [`DocumentValue::adopt`].
    pub fn adopt<T>(owner: T) -> Result<Self>
    where
        T: AsRef<[u8]> + Send + Sync + 'static,
    {
        DocumentValue::adopt(owner).map(Self)
    }

    /// Builds an array from values in order.
    ///
    /// # Errors
    ///
    /// See [`DocumentValue::from_pairs`].
    pub fn from_values<I, V>(values: I) -> Result<Self>
    where
        I: IntoIterator<Item = V>,
        V: Into<Bson>,
    {
        let mut builder = Builder::new_array();
        for value in values {
            let value: Bson = value.into();
            builder.push(&value)?;
        }
        builder.finalize_array()
    }

    #[must_use]
    pub fn view(&self) -> ArrayView<'_> {
        ArrayView::from(self.0.view())
    }

    #[must_use]
    pub fn as_bytes(&self) -> &[u8] {
        self.0.as_bytes()
    }

    #[must_use]
    pub fn len_bytes(&self) -> usize {
        self.0.len_bytes()
    }

    #[must_use]
    pub fn into_vec(self) -> Vec<u8> {
        self.0.into_vec()
    }

    #[must_use]
    pub fn into_document(self) -> DocumentValue {
        self.0
    }

    #[must_use]
    pub fn find(&self, index: usize) -> Option<Element<'_>> {
        self.view().find(index)
    }

    #[must_use]
    pub fn get(&self, index: usize) -> Element<'_> {
        self.view().get(index)
    }

    #[must_use]
    pub fn iter(&self) -> Iter<'_> {
        self.view().iter()
    }

    /// # Errors
    ///
    /// See [`ArrayView::to_vec`].
    pub fn to_vec(&self) -> Result<Vec<Bson>> {
        self.view().to_vec()
    }

    /// # Errors
    ///
    /// See [`ArrayView::to_json`].
    pub fn to_json(&self, mode: JsonMode) -> Result<String> {
        self.view().to_json(mode)
    }
}

impl From<DocumentValue> for ArrayValue {
    fn from(value: DocumentValue) -> Self {
        Self(value)
    }
}

impl fmt::Debug for ArrayValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        fmt::Debug::fmt(&self.view(), f)
    }
}

impl AsRef<[u8]> for ArrayValue {
    fn as_ref(&self) -> &[u8] {
        self.as_bytes()
    }
}

impl<'a> From<&'a ArrayValue> for ArrayView<'a> {
    fn from(value: &'a ArrayValue) -> Self {
        value.view()
    }
}

impl<'a> IntoIterator for &'a ArrayValue {
    type Item = Result<Element<'a>>;
    type IntoIter = Iter<'a>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

#[cfg(test)]
mod tests {
    use alloc::vec;

    use super::*;
    use crate::error::{CodecErrorKind, Error};

    #[test]
    fn clone_is_a_deep_copy() {
        let original = DocumentValue::from_pairs([("a", 1)]).unwrap();
        let copy = original.clone();
        assert_eq!(original, copy);
        assert_ne!(original.as_bytes().as_ptr(), copy.as_bytes().as_ptr());
    }

    #[test]
    fn adopts_foreign_owner() {
        struct Pinned(Box<[u8]>);
        impl AsRef<[u8]> for Pinned {
            fn as_ref(&self) -> &[u8] {
                &self.0
            }
        }
        let value = DocumentValue::adopt(Pinned(vec![5, 0, 0, 0, 0].into_boxed_slice())).unwrap();
        assert!(value.view().is_empty());
        assert_eq!(value.into_vec(), vec![5, 0, 0, 0, 0]);
    }

    #[test]
    fn from_vec_checks_header() {
        let err = DocumentValue::from_vec(vec![6, 0, 0, 0, 0]).unwrap_err();
        assert!(matches!(
            err,
            Error::Codec(c) if c.kind == CodecErrorKind::LengthMismatch
        ));
    }
}
