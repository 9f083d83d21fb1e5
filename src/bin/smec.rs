//! Inspect schemas and encoded records.
//!
//! Usage:
//!   smec check <SCHEMA_PATH>...
//!   smec decode [--big-endian] <SCHEMA_PATH> <STRUCT> <FILE|->
//!   smec default [--big-endian] <SCHEMA_PATH> <STRUCT>
//!
//! A schema path is either a single schema file or a directory searched
//! recursively for `.sme` / `.smep` files.

use anyhow::{bail, Context};
use smecodec::dump::{hex_string, struct_to_dump};
use smecodec::{load_dir, Codec, Endianness, ResolvedSchema};
use std::io::{self, Read};
use std::path::Path;

const USAGE: &str = "usage:
  smec check <SCHEMA_PATH>...
  smec decode [--big-endian] <SCHEMA_PATH> <STRUCT> <FILE|->
  smec default [--big-endian] <SCHEMA_PATH> <STRUCT>";

fn load(path: &str) -> anyhow::Result<ResolvedSchema> {
    let schemas = load_dir(Path::new(path)).with_context(|| format!("loading {}", path))?;
    let resolved = ResolvedSchema::resolve(schemas).with_context(|| format!("resolving {}", path))?;
    Ok(resolved)
}

fn check(paths: &[String]) -> anyhow::Result<bool> {
    let mut ok = true;
    for path in paths {
        let resolved = match load(path) {
            Ok(r) => r,
            Err(e) => {
                eprintln!("{}: {:#}", path, e);
                ok = false;
                continue;
            }
        };
        println!("{}: {} schema file(s)", path, resolved.schemas.len());
        for name in resolved.struct_names() {
            let Some(def) = resolved.get_struct(&name) else {
                continue;
            };
            let ty = smecodec::FieldType::StructRef(name.clone());
            let size = match resolved.fixed_size(&ty) {
                Some(n) => format!("{} bytes", n),
                None => format!(">= {} bytes", resolved.min_encoded_len(&ty)),
            };
            println!("  {} ({} field(s), {})", name, def.fields.len(), size);
        }
    }
    Ok(ok)
}

fn read_input(path: &str) -> anyhow::Result<Vec<u8>> {
    let mut buf = Vec::new();
    if path == "-" {
        io::stdin().read_to_end(&mut buf).context("reading stdin")?;
    } else {
        buf = std::fs::read(path).with_context(|| format!("reading {}", path))?;
    }
    Ok(buf)
}

fn main() -> anyhow::Result<()> {
    let mut args: Vec<String> = std::env::args().skip(1).collect();
    let endianness = if let Some(pos) = args.iter().position(|a| a == "--big-endian" || a == "-b") {
        args.remove(pos);
        Endianness::Big
    } else {
        Endianness::Little
    };
    if args.is_empty() {
        bail!("{}", USAGE);
    }
    let command = args.remove(0);

    match (command.as_str(), args.as_slice()) {
        ("check", paths) if !paths.is_empty() => {
            if !check(paths)? {
                std::process::exit(1);
            }
        }
        ("decode", [schema, name, input]) => {
            let codec = Codec::new(load(schema)?, endianness);
            let bytes = read_input(input)?;
            let values = codec
                .decode_struct(name, &bytes)
                .with_context(|| format!("decoding {} from {}", name, input))?;
            println!("{}", struct_to_dump(codec.resolved(), name, &values));
        }
        ("default", [schema, name]) => {
            let codec = Codec::new(load(schema)?, endianness);
            let values = codec.default_struct(name)?;
            let bytes = codec.encode_struct(name, &values)?;
            println!("{}", hex_string(&bytes));
        }
        _ => bail!("{}", USAGE),
    }
    Ok(())
}
