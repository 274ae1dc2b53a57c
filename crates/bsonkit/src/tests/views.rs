use alloc::{string::String, vec, vec::Vec};

use rstest::rstest;

use crate::{
    ArrayView, Builder, CodecErrorKind, DocumentView, ElementType, Error, array, doc,
};

#[test]
fn find_returns_the_first_match() {
    let mut b = Builder::new();
    b.append("k", 1).unwrap();
    b.append("other", true).unwrap();
    b.append("k", 2).unwrap();
    let doc = b.finalize().unwrap();
    assert_eq!(doc.get("k").get_int32(), Ok(1));
    assert_eq!(doc.view().element_count(), Ok(3));
}

#[test]
fn missing_keys_yield_the_unset_element() {
    let doc = doc! { "a": { "b": 1 } }.unwrap();
    let missing = doc.get("nope");
    assert!(!missing.is_valid());
    assert_eq!(missing.key(), Err(Error::UnsetElement));
    assert_eq!(missing.get_int32(), Err(Error::UnsetElement));
    // Subscripting the sentinel or a scalar stays unset.
    assert!(!missing.get("x").is_valid());
    assert!(!doc.get("a").get("b").get("c").is_valid());
    assert_eq!(doc.get("a").get("b").get_int32(), Ok(1));
}

#[test]
fn wrong_type_is_a_mismatch() {
    let doc = doc! { "n": 1 }.unwrap();
    assert_eq!(
        doc.get("n").get_string(),
        Err(Error::TypeMismatch {
            expected: ElementType::String,
            actual: ElementType::Int32,
        })
    );
}

#[test]
fn equality_is_byte_wise() {
    let ab = doc! { "a": 1, "b": 2 }.unwrap();
    let ba = doc! { "b": 2, "a": 1 }.unwrap();
    let ab_again = doc! { "a": 1, "b": 2 }.unwrap();
    assert_ne!(ab.view(), ba.view());
    assert_eq!(ab.view(), ab_again.view());
    // Same logical value, different encoding.
    let as_i64 = doc! { "a": 1_i64, "b": 2 }.unwrap();
    assert_ne!(ab.view(), as_i64.view());
}

#[test]
fn array_view_over_array_shaped_document() {
    let values = array![1, 2].unwrap();
    let view = ArrayView::from(DocumentView::new(values.as_bytes()));
    assert_eq!(view.get(0).get_int32(), Ok(1));
    assert_eq!(view.get(1).get_int32(), Ok(2));
    assert!(!view.get(2).is_valid());
    let collected: Vec<i32> = view.iter().map(|el| el.unwrap().get_int32().unwrap()).collect();
    assert_eq!(collected, vec![1, 2]);
}

#[test]
fn iteration_is_fused_after_an_error() {
    // {"a": int32 1} followed by an unknown tag.
    let bytes = [18, 0, 0, 0, 0x10, b'a', 0, 1, 0, 0, 0, 0x42, b'b', 0, 0, 0, 0, 0];
    let view = DocumentView::new(&bytes);
    let mut iter = view.iter();
    assert_eq!(iter.next().unwrap().unwrap().get_int32(), Ok(1));
    let err = iter.next().unwrap().unwrap_err();
    assert!(matches!(
        err,
        Error::Codec(c) if c.kind == CodecErrorKind::UnknownType(0x42) && c.offset == 11
    ));
    assert!(iter.next().is_none());
    assert!(view.find("b").is_none());
    assert!(view.try_find("b").is_err());
    assert!(view.validate().is_err());
}

#[rstest]
#[case::too_short(&[4, 0, 0, 0], CodecErrorKind::Truncated)]
#[case::length_mismatch(&[6, 0, 0, 0, 0], CodecErrorKind::LengthMismatch)]
#[case::missing_terminator(&[5, 0, 0, 0, 1], CodecErrorKind::MissingTerminator)]
#[case::trailing_bytes(&[6, 0, 0, 0, 0, 0], CodecErrorKind::TrailingBytes)]
#[case::bad_boolean(&[9, 0, 0, 0, 0x08, b'b', 0, 7, 0], CodecErrorKind::InvalidBoolean(7))]
fn malformed_documents(#[case] bytes: &[u8], #[case] kind: CodecErrorKind) {
    let err = DocumentView::new(bytes).validate().unwrap_err();
    assert!(matches!(err, Error::Codec(c) if c.kind == kind), "{err:?}");
}

#[test]
fn nested_errors_report_absolute_offsets() {
    // {"d": {"s": string with a bad length}}
    let bytes = [
        22, 0, 0, 0, //
        0x03, b'd', 0, //
        14, 0, 0, 0, 0x02, b's', 0, 0xFF, 0, 0, 0, b'x', 0, 0, //
        0,
    ];
    let err = DocumentView::new(&bytes).validate().unwrap_err();
    let Error::Codec(c) = err else {
        panic!("expected a codec error, got {err:?}");
    };
    assert_eq!(c.kind, CodecErrorKind::Truncated);
    assert_eq!(c.offset, 18);
}

#[test]
fn keys_must_be_utf8() {
    let bytes = [12, 0, 0, 0, 0x10, 0xFF, 0, 1, 0, 0, 0, 0];
    let err = DocumentView::new(&bytes).iter().next().unwrap().unwrap_err();
    assert!(matches!(err, Error::Codec(c) if c.kind == CodecErrorKind::InvalidUtf8 && c.offset == 5));
}

#[test]
fn debug_renders_as_map() {
    let value = doc! { "a": "x" }.unwrap();
    let rendered = alloc::format!("{:?}", value.view());
    assert_eq!(rendered, String::from(r#"{"a": String("x")}"#));
}

#[test]
fn debug_nesting_is_cut_off() {
    let mut b = Builder::new();
    for _ in 0..150 {
        b.open_document("d").unwrap();
    }
    b.open_array("xs").unwrap();
    b.push(1).unwrap();
    b.close_array().unwrap();
    for _ in 0..150 {
        b.close_document().unwrap();
    }
    let value = b.finalize().unwrap();
    let rendered = alloc::format!("{:?}", value.view());
    assert!(rendered.starts_with(r#"{"d": Document({"d": Document("#));
    assert!(rendered.contains(".."));
    assert!(!rendered.contains("Int32"));

    let shallow = doc! { "xs": [1, { "k": null }] }.unwrap();
    assert_eq!(
        alloc::format!("{:?}", shallow.get("xs").get_array().unwrap()),
        r#"[Int32(1), Document({"k": Null})]"#
    );
}
