//! Benchmark: typed serialize/deserialize vs schema-driven encode/decode of the
//! same record, a stream of back-to-back records, and schema parsing.

use criterion::{black_box, criterion_group, criterion_main, Criterion};
use smecodec::{deserialize, deserialize_prefix, parse, record, serialize, Codec, Endianness, ResolvedSchema};

const SCHEMA: &str = r#"
syntax 1.0.0
package bench

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

fn sample() -> ExampleClass1 {
    let nested = |i: u32| NestedStruct {
        field1: i,
        field2: -(i as i64),
        field3: i as f64 * 0.5,
        field4: 4.8,
    };
    ExampleClass1 {
        field1: 4,
        field2: 6,
        field3: 1.5,
        field4: 4.8,
        field5: "abacaba".repeat(8),
        field6: (0..64).collect(),
        field7: nested(0),
        field8: (0..16).map(nested).collect(),
    }
}

/// Decode every record in a buffer of back-to-back records.
fn decode_stream(bytes: &[u8]) -> usize {
    let mut offset = 0usize;
    let mut records = 0usize;
    while offset < bytes.len() {
        match deserialize_prefix::<ExampleClass1>(&bytes[offset..], Endianness::Little) {
            Ok((_, consumed)) => {
                offset += consumed;
                records += 1;
            }
            Err(_) => break,
        }
    }
    records
}

fn bench_codec(c: &mut Criterion) {
    let record = sample();
    let bytes = serialize(&record).expect("serialize");

    let resolved = ResolvedSchema::resolve(vec![parse(SCHEMA).expect("parse")]).expect("resolve");
    let codec = Codec::new(resolved, Endianness::Little);
    let values = codec.decode_struct("ExampleClass1", &bytes).expect("decode");
    assert_eq!(codec.encode_struct("ExampleClass1", &values).expect("encode"), bytes);

    let stream: Vec<u8> = std::iter::repeat(bytes.as_slice()).take(256).flatten().copied().collect();
    eprintln!("codec: {} bytes per record, {} bytes per stream", bytes.len(), stream.len());

    c.bench_function("typed_serialize", |b| b.iter(|| serialize(black_box(&record))));

    c.bench_function("typed_deserialize", |b| {
        b.iter(|| deserialize::<ExampleClass1>(black_box(&bytes)))
    });

    c.bench_function("typed_decode_stream_256", |b| {
        b.iter(|| black_box(decode_stream(black_box(&stream))))
    });

    c.bench_function("dynamic_encode", |b| {
        b.iter(|| codec.encode_struct(black_box("ExampleClass1"), black_box(&values)))
    });

    c.bench_function("dynamic_decode", |b| {
        b.iter(|| codec.decode_struct(black_box("ExampleClass1"), black_box(&bytes)))
    });

    c.bench_function("parse_and_resolve_schema", |b| {
        b.iter(|| ResolvedSchema::resolve(vec![parse(black_box(SCHEMA)).expect("parse")]))
    });
}

criterion_group!(benches, bench_codec);
criterion_main!(benches);
