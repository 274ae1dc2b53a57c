use alloc::{string::String, vec::Vec};

use quickcheck::{Arbitrary, Gen};

use crate::{
    Binary, BinarySubtype, Bson, DateTime, DbPointer, Decimal128, Document,
    JavaScriptCodeWithScope, ObjectId, Regex, Timestamp,
};

/// A document with at most a few levels of nesting.
#[derive(Debug, Clone, PartialEq)]
pub(crate) struct ArbDocument(pub(crate) Document);

impl Arbitrary for ArbDocument {
    fn arbitrary(g: &mut Gen) -> Self {
        let depth = usize::arbitrary(g) % 3;
        Self(gen_document(g, depth))
    }
}

/// Keys and regex parts are C strings on the wire and may not contain NUL.
fn cstring(g: &mut Gen) -> String {
    String::arbitrary(g).chars().filter(|&c| c != '\0').collect()
}

fn bytes<const N: usize>(g: &mut Gen) -> [u8; N] {
    let mut out = [0; N];
    for b in &mut out {
        *b = u8::arbitrary(g);
    }
    out
}

fn gen_document(g: &mut Gen, depth: usize) -> Document {
    let len = usize::arbitrary(g) % 4;
    let mut doc = Document::new();
    for _ in 0..len {
        doc.insert(cstring(g), gen_value(g, depth));
    }
    doc
}

fn gen_value(g: &mut Gen, depth: usize) -> Bson {
    let choices = if depth == 0 { 18 } else { 21 };
    match usize::arbitrary(g) % choices {
        0 => Bson::Double(f64::arbitrary(g)),
        1 => Bson::String(String::arbitrary(g)),
        2 => Bson::Binary(Binary {
            subtype: BinarySubtype::from(u8::arbitrary(g)),
            bytes: Vec::arbitrary(g),
        }),
        3 => Bson::Undefined,
        4 => Bson::ObjectId(ObjectId::from_bytes(bytes(g))),
        5 => Bson::Boolean(bool::arbitrary(g)),
        6 => Bson::DateTime(DateTime::from_millis(i64::arbitrary(g))),
        7 => Bson::Null,
        8 => {
            // Options come in any order; only `Regex::new` sorts them.
            let options: String = "xusmi".chars().filter(|_| bool::arbitrary(g)).collect();
            Bson::RegularExpression(Regex {
                pattern: cstring(g),
                options,
            })
        }
        9 => Bson::DbPointer(DbPointer {
            namespace: String::arbitrary(g),
            id: ObjectId::from_bytes(bytes(g)),
        }),
        10 => Bson::JavaScriptCode(String::arbitrary(g)),
        11 => Bson::Symbol(String::arbitrary(g)),
        12 => Bson::Int32(i32::arbitrary(g)),
        13 => Bson::Timestamp(Timestamp {
            time: u32::arbitrary(g),
            increment: u32::arbitrary(g),
        }),
        14 => Bson::Int64(i64::arbitrary(g)),
        15 => Bson::Decimal128(Decimal128::from_bytes(bytes(g))),
        16 => Bson::MaxKey,
        17 => Bson::MinKey,
        18 => Bson::Document(gen_document(g, depth - 1)),
        19 => {
            let len = usize::arbitrary(g) % 4;
            Bson::Array((0..len).map(|_| gen_value(g, depth - 1)).collect())
        }
        _ => Bson::JavaScriptCodeWithScope(JavaScriptCodeWithScope {
            code: String::arbitrary(g),
            scope: gen_document(g, depth - 1),
        }),
    }
}
