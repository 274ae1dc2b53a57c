#![expect(missing_docs)]
#![expect(clippy::needless_raw_string_hashes)]

use bsonkit::{
    Binary, BinarySubtype, Bson, DateTime, Decimal128, Document, JavaScriptCodeWithScope,
    JsonMode, ObjectId, Regex, Timestamp, array_from_json, doc, from_json,
};

fn scalars() -> bsonkit::DocumentValue {
    doc! {
        "s": "hi",
        "i": 1,
        "l": 5_i64,
        "d": 1.5,
        "b": true,
        "n": null,
        "arr": [1, "x"],
        "sub": { "k": "v" }
    }
    .unwrap()
}

fn special() -> bsonkit::DocumentValue {
    let mut scope = Document::new();
    scope.insert("x", 1);
    let mut doc = Document::new();
    doc.insert("oid", ObjectId::parse_str("5f1b0c3a9d1e8a0b1c2d3e4f").unwrap());
    doc.insert("date", DateTime::from_millis(1_356_351_330_501));
    doc.insert(
        "bin",
        Binary {
            subtype: BinarySubtype::Generic,
            bytes: b"hello".to_vec(),
        },
    );
    doc.insert("re", Regex::new("^a", "xi"));
    doc.insert("ts", Timestamp { time: 1, increment: 2 });
    doc.insert("dec", Decimal128::parse_str("1.5").unwrap());
    doc.insert("lo", Bson::MinKey);
    doc.insert("hi", Bson::MaxKey);
    doc.insert("u", Bson::Undefined);
    doc.insert("code", Bson::JavaScriptCode("f()".into()));
    doc.insert(
        "cws",
        JavaScriptCodeWithScope {
            code: "f()".into(),
            scope,
        },
    );
    doc.insert("inf", f64::INFINITY);
    doc.encode().unwrap()
}

#[test]
fn snapshot_scalars() {
    let value = scalars();
    insta::assert_snapshot!(value.to_json(JsonMode::Relaxed).unwrap(), @r#"{"s":"hi","i":1,"l":5,"d":1.5,"b":true,"n":null,"arr":[1,"x"],"sub":{"k":"v"}}"#);
    insta::assert_snapshot!(value.to_json(JsonMode::Canonical).unwrap(), @r#"{"s":"hi","i":{"$numberInt":"1"},"l":{"$numberLong":"5"},"d":{"$numberDouble":"1.5"},"b":true,"n":null,"arr":[{"$numberInt":"1"},"x"],"sub":{"k":"v"}}"#);
}

#[test]
fn snapshot_special_types() {
    let value = special();
    insta::assert_snapshot!(value.to_json(JsonMode::Relaxed).unwrap(), @r#"{"oid":{"$oid":"5f1b0c3a9d1e8a0b1c2d3e4f"},"date":{"$date":"2012-12-24T12:15:30.501Z"},"bin":{"$binary":{"base64":"aGVsbG8=","subType":"00"}},"re":{"$regularExpression":{"pattern":"^a","options":"ix"}},"ts":{"$timestamp":{"t":1,"i":2}},"dec":{"$numberDecimal":"1.5"},"lo":{"$minKey":1},"hi":{"$maxKey":1},"u":{"$undefined":true},"code":{"$code":"f()"},"cws":{"$code":"f()","$scope":{"x":1}},"inf":{"$numberDouble":"Infinity"}}"#);
    insta::assert_snapshot!(
        value.to_json(JsonMode::Canonical).unwrap(),
        @r#"{"oid":{"$oid":"5f1b0c3a9d1e8a0b1c2d3e4f"},"date":{"$date":{"$numberLong":"1356351330501"}},"bin":{"$binary":{"base64":"aGVsbG8=","subType":"00"}},"re":{"$regularExpression":{"pattern":"^a","options":"ix"}},"ts":{"$timestamp":{"t":1,"i":2}},"dec":{"$numberDecimal":"1.5"},"lo":{"$minKey":1},"hi":{"$maxKey":1},"u":{"$undefined":true},"code":{"$code":"f()"},"cws":{"$code":"f()","$scope":{"x":{"$numberInt":"1"}}},"inf":{"$numberDouble":"Infinity"}}"#
    );
}

#[test]
fn canonical_output_parses_back_to_the_same_bytes() {
    for value in [scalars(), special()] {
        let json = value.to_json(JsonMode::Canonical).unwrap();
        assert_eq!(from_json(&json).unwrap(), value, "{json}");
    }
}

#[test]
fn relaxed_output_is_plain_json() {
    let json = scalars().to_json(JsonMode::Relaxed).unwrap();
    let parsed: serde_json::Value = serde_json::from_str(&json).unwrap();
    assert_eq!(
        parsed,
        serde_json::json!({
            "s": "hi",
            "i": 1,
            "l": 5,
            "d": 1.5,
            "b": true,
            "n": null,
            "arr": [1, "x"],
            "sub": { "k": "v" }
        })
    );
}

#[test]
fn legacy_and_relaxed_inputs() {
    let value = from_json(
        r#"{
            "bin": {"$binary": "AQI=", "$type": "80"},
            "re": {"$regex": "^x", "$options": "mi"},
            "date": {"$date": "1970-01-01T00:00:01Z"},
            "millis": {"$date": 1000},
            "big": 4294967296,
            "neg": {"$numberDouble": "-Infinity"}
        }"#,
    )
    .unwrap();
    insta::assert_snapshot!(value.to_json(JsonMode::Canonical).unwrap(), @r#"{"bin":{"$binary":{"base64":"AQI=","subType":"80"}},"re":{"$regularExpression":{"pattern":"^x","options":"im"}},"date":{"$date":{"$numberLong":"1000"}},"millis":{"$date":{"$numberLong":"1000"}},"big":{"$numberLong":"4294967296"},"neg":{"$numberDouble":"-Infinity"}}"#);
}

#[test]
fn snapshot_errors() {
    let render = |json: &str| from_json(json).unwrap_err().to_string();
    insta::assert_snapshot!(render(r#"{"a": tru}"#), @"invalid character '}' at 1:10");
    insta::assert_snapshot!(render(r#"{"d": {"$date": true}}"#), @"invalid extended JSON: $date must be a string, a number or a $numberLong at 1:17");
    insta::assert_snapshot!(render("[1]"), @"expected a top-level object at 1:1");
    insta::assert_snapshot!(render("{\"a\": 1,\n}"), @"invalid character '}' at 2:1");
}

#[test]
fn arrays_round_trip() {
    let value = array_from_json(r#"[1, "two", {"three": 3}]"#).unwrap();
    assert_eq!(value.to_json(JsonMode::Relaxed).unwrap(), r#"[1,"two",{"three":3}]"#);
    assert_eq!(value.get(2).get("three").get_int32(), Ok(3));
}

#[test]
fn unsorted_regex_options_survive_a_round_trip() {
    let mut doc = Document::new();
    doc.insert(
        "re",
        Regex {
            pattern: "^a".into(),
            options: "xi".into(),
        },
    );
    let value = doc.encode().unwrap();
    let json = value.to_json(JsonMode::Canonical).unwrap();
    insta::assert_snapshot!(json, @r#"{"re":{"$regularExpression":{"pattern":"^a","options":"xi"}}}"#);
    assert_eq!(from_json(&json).unwrap(), value);
}
