use quickcheck::{QuickCheck, TestResult};

use super::arbitrary::ArbDocument;
use crate::{Bson, Document, DocumentView, JsonMode, from_json};

fn tests() -> u64 {
    #[cfg(not(miri))]
    let tests = if is_ci::cached() { 10_000 } else { 1_000 };
    #[cfg(miri)]
    let tests = 10;
    tests
}

/// Property: decoding an encoded document yields the document back, and
/// re-encoding the decoded form reproduces the bytes exactly.
#[test]
fn encode_decode_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(doc: ArbDocument) -> bool {
        let encoded = doc.0.encode().unwrap();
        let view = DocumentView::from_slice(encoded.as_bytes()).unwrap();
        view.validate().unwrap();
        let decoded = Document::decode(view).unwrap();
        decoded == doc.0 && decoded.encode().unwrap().as_bytes() == encoded.as_bytes()
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(ArbDocument) -> bool);
}

/// Property: every proper prefix of an encoded document is rejected.
#[test]
fn truncated_input_is_rejected_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(doc: ArbDocument, cut: usize) -> bool {
        let encoded = doc.0.encode().unwrap();
        let bytes = encoded.as_bytes();
        let prefix = &bytes[..cut % bytes.len()];
        DocumentView::from_slice(prefix).is_err() && DocumentView::new(prefix).validate().is_err()
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(ArbDocument, usize) -> bool);
}

fn json_safe(value: &Bson) -> bool {
    match value {
        Bson::Double(v) => !v.is_nan(),
        Bson::Decimal128(_) => false,
        Bson::Document(doc) => doc.iter().all(|(_, v)| json_safe(v)),
        Bson::Array(values) => values.iter().all(json_safe),
        Bson::JavaScriptCodeWithScope(cws) => cws.scope.iter().all(|(_, v)| json_safe(v)),
        _ => true,
    }
}

/// Property: canonical Extended JSON preserves every type and value, so
/// parsing it back reproduces the original bytes.
#[test]
fn canonical_json_roundtrip_quickcheck() {
    #[allow(clippy::needless_pass_by_value)]
    fn prop(doc: ArbDocument) -> TestResult {
        if !doc.0.iter().all(|(k, v)| !k.starts_with('$') && json_safe(v)) {
            return TestResult::discard();
        }
        let encoded = doc.0.encode().unwrap();
        let json = encoded.to_json(JsonMode::Canonical).unwrap();
        let parsed = from_json(&json).unwrap();
        TestResult::from_bool(parsed == encoded)
    }

    QuickCheck::new()
        .tests(tests())
        .quickcheck(prop as fn(ArbDocument) -> TestResult);
}
