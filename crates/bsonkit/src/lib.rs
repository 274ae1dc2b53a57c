//! A `no_std` codec for the BSON binary document format.
//!
//! Encoded documents are read through zero-copy [`DocumentView`]s that
//! validate lazily, written through a [`Builder`], and owned as
//! [`DocumentValue`]s. [`Bson`] and [`Document`] form a mutable owned model,
//! and the [`json`] module bridges to MongoDB Extended JSON.
//!
//! ```
//! use bsonkit::{doc, DocumentView};
//!
//! let value = doc! { "hello": "world", "n": [1, 2, 3] }?;
//! let view = DocumentView::from_slice(value.as_bytes())?;
//! view.validate()?;
//! assert_eq!(view.get("n").at(2).get_int32()?, 3);
//! assert_eq!(view.to_json(bsonkit::JsonMode::Relaxed)?, r#"{"hello":"world","n":[1,2,3]}"#);
//! # Ok::<(), bsonkit::Error>(())
//! ```

#![no_std]
#![allow(missing_docs)]
extern crate alloc;

#[cfg(any(test, feature = "std"))]
extern crate std;

mod bson;
mod buffer;
mod builder;
mod codec;
mod decimal128;
mod element;
mod error;
mod oid;
mod options;
mod raw;
mod spec;
mod types;
mod value;
mod view;

pub mod json;

#[cfg(test)]
mod tests;

pub use bson::{Array, Bson, Document};
pub use buffer::ByteBuffer;
pub use builder::{ArrayBuilder, BsonRef, Builder, DocumentBuilder};
pub use decimal128::Decimal128;
pub use element::Element;
pub use error::{BuilderMisuse, CodecError, CodecErrorKind, Error, JsonErrorKind, JsonParseError, Result};
pub use json::{array_from_json, from_json, to_json};
pub use oid::{ObjectId, ObjectIdError};
pub use options::{DecodeOptions, JsonMode, JsonOptions, Utf8Validation};
pub use raw::{BinaryRef, CodeWithScopeRef, DbPointerRef, RawValue, RegexRef};
pub use spec::{BinarySubtype, ElementType, MAX_DOCUMENT_SIZE, MIN_DOCUMENT_SIZE};
pub use types::{Binary, DateTime, DbPointer, JavaScriptCodeWithScope, Regex, Timestamp};
pub use value::{ArrayValue, DocumentValue};
pub use view::{ArrayView, DocumentView, Iter};

#[doc(hidden)]
pub use alloc::vec;
