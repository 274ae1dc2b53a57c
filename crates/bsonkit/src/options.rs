/// How string payloads are treated while validating a document.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Utf8Validation {
    /// Every string, code, symbol and regex payload must be valid UTF-8.
    #[default]
    Strict,
    /// Only the structure is checked. Keys are still required to be UTF-8
    /// because they are handed out as `&str`.
    Skip,
}

/// Configuration for full-document validation and for conversion into the
/// owned [`Bson`](crate::Bson) model.
///
/// # Examples
///
/// ```rust
/// use bsonkit::{DecodeOptions, DocumentView, Utf8Validation};
///
/// let bytes = [5, 0, 0, 0, 0];
/// let options = DecodeOptions {
///     utf8: Utf8Validation::Skip,
///     ..Default::default()
/// };
/// DocumentView::new(&bytes).validate_with(&options).unwrap();
/// ```
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DecodeOptions {
    /// Deepest nesting of documents and arrays that will be followed before
    /// reporting [`CodecErrorKind::MaxDepthExceeded`](crate::CodecErrorKind).
    ///
    /// # Default
    ///
    /// `100`, the server's own nesting limit.
    pub max_depth: usize,

    /// # Default
    ///
    /// [`Utf8Validation::Strict`]
    pub utf8: Utf8Validation,
}

impl Default for DecodeOptions {
    fn default() -> Self {
        Self {
            max_depth: 100,
            utf8: Utf8Validation::Strict,
        }
    }
}

/// Which flavour of Extended JSON to produce.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum JsonMode {
    /// Type-preserving output: every number and date is wrapped
    /// (`{"$numberInt": "1"}`).
    Canonical,
    /// Human-friendly output: numbers are bare where JSON can represent them
    /// and dates in range are ISO-8601 strings.
    #[default]
    Relaxed,
}

/// Configuration for the Extended JSON bridge.
#[cfg_attr(any(test, feature = "serde"), derive(serde::Serialize, serde::Deserialize))]
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JsonOptions {
    /// # Default
    ///
    /// [`JsonMode::Relaxed`]
    pub mode: JsonMode,

    /// Deepest nesting accepted by the parser.
    ///
    /// # Default
    ///
    /// `100`
    pub max_depth: usize,
}

impl Default for JsonOptions {
    fn default() -> Self {
        Self {
            mode: JsonMode::Relaxed,
            max_depth: 100,
        }
    }
}
