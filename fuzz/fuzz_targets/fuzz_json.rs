#![no_main]
use bsonkit::{JsonMode, from_json};
use libfuzzer_sys::fuzz_target;

/// Anything the JSON parser accepts must survive a canonical round trip.
fn parse(data: &[u8]) {
    let Ok(text) = std::str::from_utf8(data) else {
        return;
    };
    let Ok(value) = from_json(text) else {
        return;
    };
    let canonical = value.to_json(JsonMode::Canonical).expect("parsed documents render");
    let reparsed = from_json(&canonical).expect("canonical output parses");
    assert_eq!(reparsed, value, "canonical round trip changed the document: {canonical}");
}

fuzz_target!(|data: &[u8]| parse(data));
