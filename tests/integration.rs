//! Integration tests: schema-driven encode/decode, and agreement with the typed API.

use smecodec::{parse, record, serialize, serialize_with, Codec, CodecError, Endianness, ResolvedSchema, Value};
use std::collections::HashMap;

const SCHEMA: &str = r#"
syntax 1.0.0
package example

struct NestedStruct {
    uint32 field1
    int64 field2
    double field3, field4
}

struct ExampleClass1 {
    uint32 field1
    int64 field2
    double field3, field4
    string field5
    list[uint32] field6
    NestedStruct field7
    list[NestedStruct] field8
}

struct WithMaps {
    map[uint32, uint32] counts
    map[uint32, NestedStruct] parts
}

struct Node {
    list[Node] kids
}

struct Defaults {
    uint16 port = 8080
    string host = "localhost"
    bool secure = true
    float ratio = 0.5
    NestedStruct inner
}
"#;

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct NestedStruct {
        pub field1: u32,
        pub field2: i64,
        pub field3: f64,
        pub field4: f64,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct ExampleClass1 {
        pub field1: u32,
        pub field2: i64,
        pub field3: f64,
        pub field4: f64,
        pub field5: String,
        pub field6: Vec<u32>,
        pub field7: NestedStruct,
        pub field8: Vec<NestedStruct>,
    }
}

record! {
    #[derive(Debug, Clone, PartialEq)]
    pub struct WithMaps {
        pub counts: HashMap<u32, u32>,
        pub parts: HashMap<u32, NestedStruct>,
    }
}

fn codec(endianness: Endianness) -> Codec {
    let schema = parse(SCHEMA).expect("parse");
    let resolved = ResolvedSchema::resolve(vec![schema]).expect("resolve");
    Codec::new(resolved, endianness)
}

fn nested() -> NestedStruct {
    NestedStruct {
        field1: 4,
        field2: 6,
        field3: 1.5,
        field4: 4.8,
    }
}

fn nested_values() -> HashMap<String, Value> {
    let mut m = HashMap::new();
    m.insert("field1".to_string(), Value::U32(4));
    m.insert("field2".to_string(), Value::I64(6));
    m.insert("field3".to_string(), Value::Double(1.5));
    m.insert("field4".to_string(), Value::Double(4.8));
    m
}

fn example_values() -> HashMap<String, Value> {
    let mut m = nested_values();
    m.insert("field5".to_string(), Value::from("abacaba"));
    m.insert("field6".to_string(), Value::List((0u32..5).map(Value::U32).collect()));
    m.insert("field7".to_string(), Value::Struct(nested_values()));
    m.insert("field8".to_string(), Value::List(vec![Value::Struct(nested_values())]));
    m
}

fn typed_example() -> ExampleClass1 {
    ExampleClass1 {
        field1: 4,
        field2: 6,
        field3: 1.5,
        field4: 4.8,
        field5: "abacaba".to_string(),
        field6: vec![0, 1, 2, 3, 4],
        field7: nested(),
        field8: vec![nested()],
    }
}

#[test]
fn dynamic_and_typed_encodings_are_identical() {
    for order in [Endianness::Little, Endianness::Big] {
        let c = codec(order);
        let dynamic = c.encode_struct("ExampleClass1", &example_values()).expect("encode");
        let typed = serialize_with(&typed_example(), order).expect("serialize");
        assert_eq!(dynamic.len(), 123);
        assert_eq!(dynamic, typed);
    }
}

#[test]
fn decode_typed_bytes_dynamically() {
    let c = codec(Endianness::Little);
    let bytes = serialize(&typed_example()).expect("serialize");
    let decoded = c.decode_struct("example.ExampleClass1", &bytes).expect("decode");
    assert_eq!(decoded, example_values());
    assert_eq!(decoded["field5"].as_str(), Some("abacaba"));
    assert_eq!(decoded["field8"].as_list().map(|l| l.len()), Some(1));
}

#[test]
fn maps_agree_with_typed_api() {
    let mut typed = WithMaps::default();
    typed.counts.insert(2, 20);
    typed.counts.insert(1, 10);
    typed.parts.insert(5, nested());
    let bytes = serialize(&typed).expect("serialize");

    let c = codec(Endianness::Little);
    let decoded = c.decode_struct("WithMaps", &bytes).expect("decode");
    let counts = &decoded["counts"];
    assert_eq!(counts.map_get(&Value::U32(1)), Some(&Value::U32(10)));
    assert_eq!(counts.map_get(&Value::U32(2)), Some(&Value::U32(20)));
    assert_eq!(
        decoded["parts"].map_get(&Value::U32(5)),
        Some(&Value::Struct(nested_values()))
    );
    assert_eq!(c.encode_struct("WithMaps", &decoded).expect("encode"), bytes);
}

#[test]
fn dynamic_maps_encode_in_key_order() {
    let mut typed = WithMaps::default();
    for k in [40u32, 3, 17, 0, u32::MAX] {
        typed.counts.insert(k, k / 2);
    }
    typed.parts.insert(9, nested());
    typed.parts.insert(2, nested());

    let mut values = HashMap::new();
    values.insert(
        "counts".to_string(),
        Value::Map(
            [17u32, u32::MAX, 0, 40, 3]
                .into_iter()
                .map(|k| (Value::U32(k), Value::U32(k / 2)))
                .collect(),
        ),
    );
    values.insert(
        "parts".to_string(),
        Value::Map(vec![
            (Value::U32(9), Value::Struct(nested_values())),
            (Value::U32(2), Value::Struct(nested_values())),
        ]),
    );
    let c = codec(Endianness::Little);
    assert_eq!(
        c.encode_struct("WithMaps", &values).expect("encode"),
        serialize(&typed).expect("serialize")
    );
}

#[test]
fn large_dynamic_maps_decode_with_last_value_winning() {
    let n = 60_000u32;
    let mut b = Vec::new();
    b.extend_from_slice(&(n + 1).to_le_bytes());
    for k in 0..n {
        b.extend_from_slice(&k.to_le_bytes());
        b.extend_from_slice(&k.to_le_bytes());
    }
    b.extend_from_slice(&7u32.to_le_bytes());
    b.extend_from_slice(&70u32.to_le_bytes());
    b.extend_from_slice(&0u32.to_le_bytes());

    let decoded = codec(Endianness::Little).decode_struct("WithMaps", &b).expect("decode");
    let counts = decoded["counts"].as_map().expect("map");
    assert_eq!(counts.len(), n as usize);
    assert_eq!(counts[7], (Value::U32(7), Value::U32(70)));
    assert_eq!(counts[n as usize - 1], (Value::U32(n - 1), Value::U32(n - 1)));
}

#[test]
fn deep_dynamic_chains_are_malformed() {
    let c = codec(Endianness::Little);
    let mut b = Vec::new();
    for _ in 0..200_000 {
        b.extend_from_slice(&1u32.to_le_bytes());
    }
    b.extend_from_slice(&0u32.to_le_bytes());
    let err = c.decode_struct("Node", &b).unwrap_err();
    assert!(err.is_malformed(), "{}", err);

    let (consumed, result) = c.decode_struct_with_extent("Node", &b);
    assert!(result.is_err());
    assert!(consumed < 1024, "stopped at {}", consumed);

    let shallow = [1u8, 0, 0, 0, 1, 0, 0, 0, 0, 0, 0, 0];
    let decoded = c.decode_struct("Node", &shallow).expect("decode");
    assert_eq!(c.encode_struct("Node", &decoded).expect("encode"), shallow);
}

#[test]
fn dynamic_map_decode_keeps_last_duplicate() {
    let mut b = Vec::new();
    b.extend_from_slice(&2u32.to_le_bytes());
    for (k, v) in [(7u32, 1u32), (7, 2)] {
        b.extend_from_slice(&k.to_le_bytes());
        b.extend_from_slice(&v.to_le_bytes());
    }
    b.extend_from_slice(&0u32.to_le_bytes());
    let decoded = codec(Endianness::Little).decode_struct("WithMaps", &b).expect("decode");
    assert_eq!(decoded["counts"], Value::Map(vec![(Value::U32(7), Value::U32(2))]));
}

#[test]
fn default_struct_uses_schema_defaults() {
    let c = codec(Endianness::Little);
    let d = c.default_struct("Defaults").expect("default");
    assert_eq!(d["port"], Value::U16(8080));
    assert_eq!(d["host"].as_str(), Some("localhost"));
    assert_eq!(d["secure"], Value::Bool(true));
    assert_eq!(d["ratio"], Value::Float(0.5));
    assert_eq!(d["inner"].as_struct().map(|s| s.len()), Some(4));

    let from_defaults = c.encode_struct("Defaults", &d).expect("encode");
    let from_empty = c.encode_struct("Defaults", &HashMap::new()).expect("encode");
    assert_eq!(from_defaults, from_empty);
    assert_eq!(&from_empty[..2], &8080u16.to_le_bytes());
    assert_eq!(from_empty.len(), 2 + 4 + 9 + 1 + 4 + 28);
}

#[test]
fn unknown_struct_and_field() {
    let c = codec(Endianness::Little);
    assert!(matches!(
        c.encode_struct("Nope", &HashMap::new()),
        Err(CodecError::UnknownStruct(_))
    ));
    assert!(matches!(c.decode_struct("Nope", &[]), Err(CodecError::UnknownStruct(_))));

    let mut values = nested_values();
    values.insert("field9".to_string(), Value::U8(0));
    match c.encode_struct("NestedStruct", &values) {
        Err(CodecError::UnknownField(f)) => assert_eq!(f, "NestedStruct.field9"),
        other => panic!("expected unknown field, got {:?}", other),
    }
}

#[test]
fn type_mismatch_names_the_field() {
    let c = codec(Endianness::Little);
    let mut values = example_values();
    values.insert("field6".to_string(), Value::from("not a list"));
    match c.encode_struct("ExampleClass1", &values) {
        Err(CodecError::TypeMismatch { field, expected, found }) => {
            assert_eq!(field, "ExampleClass1.field6");
            assert_eq!(expected, "list[uint32]");
            assert_eq!(found, "string");
        }
        other => panic!("expected type mismatch, got {:?}", other),
    }

    let mut nested = nested_values();
    nested.insert("field3".to_string(), Value::Bool(true));
    values = example_values();
    values.insert("field8".to_string(), Value::List(vec![Value::Struct(nested)]));
    let err = c.encode_struct("ExampleClass1", &values).unwrap_err();
    assert!(matches!(err, CodecError::TypeMismatch { ref field, .. } if field == "NestedStruct.field3"), "{}", err);
}

#[test]
fn truncated_and_trailing_input() {
    let c = codec(Endianness::Little);
    let bytes = c.encode_struct("ExampleClass1", &example_values()).expect("encode");
    for n in [0, 3, 40, 122] {
        let err = c.decode_struct("ExampleClass1", &bytes[..n]).unwrap_err();
        assert!(err.is_truncated(), "{} bytes: {}", n, err);
    }
    let mut long = bytes.clone();
    long.extend_from_slice(&[1, 2]);
    assert!(c.decode_struct("ExampleClass1", &long).unwrap_err().is_malformed());
    let (consumed, result) = c.decode_struct_with_extent("ExampleClass1", &long);
    assert_eq!(consumed, 123);
    assert!(result.is_ok());
}

#[test]
fn bad_bool_byte_is_malformed() {
    let c = codec(Endianness::Little);
    let mut bytes = c.encode_struct("Defaults", &HashMap::new()).expect("encode");
    // port (2) + host (4 + 9), then `secure`
    bytes[15] = 7;
    let err = c.decode_struct("Defaults", &bytes).unwrap_err();
    assert!(err.is_malformed(), "{}", err);
}

#[test]
fn codec_is_shareable_across_threads() {
    fn assert_send_sync<T: Send + Sync>() {}
    assert_send_sync::<Codec>();
    assert_send_sync::<ResolvedSchema>();

    let c = std::sync::Arc::new(codec(Endianness::Little));
    let handles: Vec<_> = (0..4u32)
        .map(|i| {
            let c = c.clone();
            std::thread::spawn(move || {
                let mut values = nested_values();
                values.insert("field1".to_string(), Value::U32(i));
                let bytes = c.encode_struct("NestedStruct", &values).expect("encode");
                c.decode_struct("NestedStruct", &bytes).expect("decode")["field1"].clone()
            })
        })
        .collect();
    for (i, h) in handles.into_iter().enumerate() {
        assert_eq!(h.join().expect("join"), Value::U32(i as u32));
    }
}
