//! Decoder fuzz target: arbitrary bytes through the typed and schema-driven decoders.
//! Decoding must fail cleanly (Truncated / Malformed) and never panic or over-allocate.
//! Whatever decodes must re-encode identically through both APIs.
//! Build with: cargo fuzz run decode_fuzz (requires nightly and cargo fuzz).

#![cfg_attr(fuzzing, no_main)]

#[cfg(fuzzing)]
use libfuzzer_sys::fuzz_target;

#[cfg(fuzzing)]
mod target {
    use smecodec::{deserialize, deserialize_prefix, parse, record, serialize, Codec, Endianness, ResolvedSchema};
    use std::collections::BTreeMap;
    use std::sync::OnceLock;

    const SCHEMA: &str = r#"
syntax 1.0.0
package fuzz
struct Inner {
    bool flag
    string name
}
struct Outer {
    int16 id
    list[Inner] items
    map[uint8, Inner] by_key
}
"#;

    record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Inner {
            pub flag: bool,
            pub name: Vec<u8>,
        }
    }

    record! {
        #[derive(Debug, Clone, PartialEq)]
        pub struct Outer {
            pub id: i16,
            pub items: Vec<Inner>,
            pub by_key: BTreeMap<u8, Inner>,
        }
    }

    fn codec() -> &'static Codec {
        static CODEC: OnceLock<Codec> = OnceLock::new();
        CODEC.get_or_init(|| {
            let schema = parse(SCHEMA).expect("fuzz schema parses");
            Codec::new(ResolvedSchema::resolve(vec![schema]).expect("fuzz schema resolves"), Endianness::Little)
        })
    }

    pub fn run(data: &[u8]) {
        let typed = deserialize_prefix::<Outer>(data, Endianness::Little);
        let (consumed, dynamic) = codec().decode_struct_with_extent("Outer", data);
        assert_eq!(typed.is_ok(), dynamic.is_ok());
        if let (Ok((record, n)), Ok(values)) = (typed, dynamic) {
            assert_eq!(n, consumed);
            // Both sides sort map keys and collapse duplicates, so they agree byte for byte.
            let bytes = serialize(&record).expect("re-encode");
            let wire = codec().encode_struct("Outer", &values).expect("re-encode");
            assert_eq!(wire, bytes);
            assert!(bytes.len() <= n);
            assert_eq!(deserialize::<Outer>(&bytes).expect("decode re-encoded"), record);
        }
    }
}

#[cfg(fuzzing)]
fuzz_target!(|data: &[u8]| {
    target::run(data);
});

#[cfg(not(fuzzing))]
fn main() {
    eprintln!("Build with: cargo fuzz run decode_fuzz");
}
