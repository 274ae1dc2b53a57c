#![expect(missing_docs)]

use bsonkit::{
    CodecErrorKind, DecodeOptions, Document, DocumentValue, DocumentView, Error, RawValue,
    Utf8Validation, doc,
};
use rstest::rstest;

fn codec_kind(err: &Error) -> Option<CodecErrorKind> {
    match err {
        Error::Codec(c) => Some(c.kind),
        _ => None,
    }
}

fn samples() -> Vec<DocumentValue> {
    vec![
        doc! {}.unwrap(),
        doc! { "a": 1 }.unwrap(),
        doc! { "s": "text", "nested": { "deep": [1, 2, { "x": null }] } }.unwrap(),
        doc! { "f": 2.5, "l": 9_i64, "b": false }.unwrap(),
    ]
}

#[test]
fn removing_the_last_byte_is_always_detected() {
    for value in samples() {
        let bytes = value.as_bytes();
        let short = &bytes[..bytes.len() - 1];
        let err = DocumentView::from_slice(short).unwrap_err();
        assert!(err.is_codec(), "{err:?}");
        assert!(DocumentView::new(short).validate().is_err());
        assert!(Document::decode(DocumentView::new(short)).is_err());
    }
}

/// Walks every nested document and array and checks that its length prefix
/// matches the number of bytes it spans.
fn check_length_prefixes(view: DocumentView<'_>) {
    let bytes = view.as_bytes();
    let declared = i32::from_le_bytes([bytes[0], bytes[1], bytes[2], bytes[3]]);
    assert_eq!(usize::try_from(declared).unwrap(), bytes.len());
    for el in view {
        match el.unwrap().value().unwrap() {
            RawValue::Document(d) => check_length_prefixes(d),
            RawValue::Array(a) => check_length_prefixes(a.as_document()),
            RawValue::JavaScriptCodeWithScope(cws) => check_length_prefixes(cws.scope),
            _ => {}
        }
    }
}

#[test]
fn every_length_prefix_matches() {
    for value in samples() {
        check_length_prefixes(value.view());
    }
}

#[test]
fn corrupting_a_nested_length_is_detected() {
    let value = doc! { "d": { "x": 1 } }.unwrap();
    let mut bytes = value.into_vec();
    // The nested length prefix starts right after the `0x03 'd' 0` header.
    bytes[7] += 1;
    let err = DocumentView::new(&bytes).validate().unwrap_err();
    assert!(err.is_codec(), "{err:?}");
}

#[rstest]
#[case::negative_string_length(
    &[14, 0, 0, 0, 0x02, b's', 0, 0xFF, 0xFF, 0xFF, 0xFF, b'x', 0, 0],
    CodecErrorKind::InvalidLength(-1),
    7
)]
#[case::scope_length_mismatch(
    &[23, 0, 0, 0, 0x0F, b'c', 0, 15, 0, 0, 0, 1, 0, 0, 0, 0, 5, 0, 0, 0, 0, 0, 0],
    CodecErrorKind::LengthMismatch,
    7
)]
#[case::unknown_tag(&[8, 0, 0, 0, 0x20, b'k', 0, 0], CodecErrorKind::UnknownType(0x20), 4)]
#[case::unterminated_key(&[7, 0, 0, 0, 0x0A, b'k', 0], CodecErrorKind::MissingTerminator, 5)]
fn malformed_elements(#[case] bytes: &[u8], #[case] kind: CodecErrorKind, #[case] offset: usize) {
    let err = DocumentView::new(bytes).validate().unwrap_err();
    let Error::Codec(c) = err else {
        panic!("expected a codec error, got {err:?}");
    };
    assert_eq!((c.kind, c.offset), (kind, offset));
}

#[test]
fn utf8_checks_can_be_skipped() {
    let bytes = [14, 0, 0, 0, 0x02, b's', 0, 2, 0, 0, 0, 0xFF, 0, 0];
    let view = DocumentView::new(&bytes);
    let strict = view.validate().unwrap_err();
    assert_eq!(codec_kind(&strict), Some(CodecErrorKind::InvalidUtf8));
    let lenient = DecodeOptions {
        utf8: Utf8Validation::Skip,
        ..DecodeOptions::default()
    };
    view.validate_with(&lenient).unwrap();
    // Reading the string still requires valid UTF-8.
    assert_eq!(
        codec_kind(&view.get("s").get_string().unwrap_err()),
        Some(CodecErrorKind::InvalidUtf8)
    );
}

#[test]
fn nesting_depth_is_bounded() {
    let mut json = String::new();
    for _ in 0..20 {
        json.push_str(r#"{"n":"#);
    }
    json.push('1');
    for _ in 0..20 {
        json.push('}');
    }
    let value = bsonkit::from_json(&json).unwrap();
    let shallow = DecodeOptions {
        max_depth: 5,
        ..DecodeOptions::default()
    };
    let err = value.view().validate_with(&shallow).unwrap_err();
    assert_eq!(codec_kind(&err), Some(CodecErrorKind::MaxDepthExceeded));
    value.view().validate().unwrap();
}
