#![no_main]
use bsonkit::{Document, DocumentView, JsonMode};
use libfuzzer_sys::fuzz_target;

/// Arbitrary bytes must never panic. Whatever validates must convert to the
/// owned model and render as JSON, and re-encoding must preserve the model.
/// Bytes may differ because array keys are renumbered.
fn decode(data: &[u8]) {
    let view = DocumentView::new(data);
    for el in view.iter() {
        let Ok(el) = el else { break };
        let _ = el.value();
    }
    if view.validate().is_err() {
        return;
    }
    let doc = Document::decode(view).expect("validated documents decode");
    let encoded = doc.encode().expect("decoded documents re-encode");
    let again = Document::decode(encoded.view()).expect("re-encoded documents decode");
    assert_eq!(again, doc, "re-encoding changed the document");
    view.to_json(JsonMode::Relaxed).expect("validated documents render");
    view.to_json(JsonMode::Canonical).expect("validated documents render");
}

fuzz_target!(|data: &[u8]| decode(data));
