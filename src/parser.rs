//! Parse schema source into AST using PEST.

use crate::ast::*;
use crate::error::SchemaError;
use pest::Parser;
use pest_derive::Parser as PestParser;
use std::path::Path;

#[derive(PestParser)]
#[grammar = "grammar.pest"]
struct SchemaParser;

/// File extensions picked up by [`load_dir`].
pub const SCHEMA_EXTENSIONS: &[&str] = &["sme", "smep"];

/// Parse schema source into AST.
pub fn parse(source: &str) -> Result<Schema, SchemaError> {
    let pairs = SchemaParser::parse(Rule::schema, source).map_err(|e| SchemaError::Syntax(e.to_string()))?;
    let pair = pairs
        .into_iter()
        .next()
        .ok_or_else(|| SchemaError::Syntax("Empty parse".to_string()))?;
    build_schema(pair).map_err(SchemaError::Syntax)
}

/// Read and parse one schema file.
pub fn parse_file(path: impl AsRef<Path>) -> Result<Schema, SchemaError> {
    let path = path.as_ref();
    let source = std::fs::read_to_string(path).map_err(|source| SchemaError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    log::debug!("parsing schema file {}", path.display());
    parse(&source).map_err(|e| match e {
        SchemaError::Syntax(msg) => SchemaError::Syntax(format!("{}: {}", path.display(), msg)),
        other => other,
    })
}

/// Parse every schema file under `dir`, recursively, in path order.
/// A plain file path is parsed on its own.
pub fn load_dir(dir: impl AsRef<Path>) -> Result<Vec<Schema>, SchemaError> {
    let dir = dir.as_ref();
    if dir.is_file() {
        return Ok(vec![parse_file(dir)?]);
    }
    let mut files = Vec::new();
    collect_schema_files(dir, &mut files)?;
    files.sort();
    log::debug!("found {} schema file(s) under {}", files.len(), dir.display());
    files.iter().map(|p| parse_file(p)).collect()
}

fn collect_schema_files(dir: &Path, out: &mut Vec<std::path::PathBuf>) -> Result<(), SchemaError> {
    let io_err = |source| SchemaError::Io {
        path: dir.to_path_buf(),
        source,
    };
    for entry in std::fs::read_dir(dir).map_err(io_err)? {
        let path = entry.map_err(io_err)?.path();
        if path.is_dir() {
            collect_schema_files(&path, out)?;
        } else if path
            .extension()
            .and_then(|e| e.to_str())
            .is_some_and(|e| SCHEMA_EXTENSIONS.contains(&e))
        {
            out.push(path);
        }
    }
    Ok(())
}

fn build_schema(pair: pest::iterators::Pair<Rule>) -> Result<Schema, String> {
    let mut syntax = String::new();
    let mut package = String::new();
    let mut structs = Vec::new();

    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::syntax_decl => {
                syntax = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::version)
                    .map(|p| p.as_str().to_string())
                    .ok_or("syntax: missing version")?;
            }
            Rule::package_decl => {
                package = inner
                    .into_inner()
                    .find(|p| p.as_rule() == Rule::ident)
                    .map(|p| p.as_str().to_string())
                    .ok_or("package: missing name")?;
            }
            Rule::struct_def => structs.push(build_struct(inner)?),
            _ => {}
        }
    }

    Ok(Schema {
        syntax,
        package,
        structs,
    })
}

fn build_struct(pair: pest::iterators::Pair<Rule>) -> Result<StructDef, String> {
    let mut name = String::new();
    let mut fields = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::ident => name = inner.as_str().to_string(),
            Rule::field_decl => fields.extend(build_field_decl(inner)?),
            _ => {}
        }
    }
    Ok(StructDef { name, fields })
}

/// One declaration line may declare several fields of the same type.
fn build_field_decl(pair: pest::iterators::Pair<Rule>) -> Result<Vec<FieldDef>, String> {
    let mut ty = None;
    let mut is_char = false;
    let mut fields = Vec::new();
    for inner in pair.into_inner() {
        match inner.as_rule() {
            Rule::type_expr => {
                is_char = inner.as_str().trim() == "char";
                ty = Some(build_type_expr(inner)?);
            }
            Rule::field_item => {
                let ty = ty.clone().ok_or("field declaration: missing type")?;
                let mut it = inner.into_inner();
                let name = it.next().ok_or("field: missing name")?.as_str().to_string();
                let default = match it.next() {
                    Some(lit) => Some(parse_literal(lit)?),
                    None => None,
                };
                // `char c = "a"` stores the byte; longer strings fail at resolve.
                let default = match default {
                    Some(Literal::String(text)) if is_char => match text.as_bytes() {
                        [b] => Some(Literal::Int(i64::from(*b))),
                        _ => Some(Literal::String(text)),
                    },
                    other => other,
                };
                fields.push(FieldDef { name, ty, default });
            }
            _ => {}
        }
    }
    Ok(fields)
}

fn build_type_expr(pair: pest::iterators::Pair<Rule>) -> Result<FieldType, String> {
    let inner = pair.into_inner().next().ok_or("Empty type_expr")?;
    match inner.as_rule() {
        Rule::scalar_type => Ok(FieldType::Scalar(parse_scalar_type(inner.as_str())?)),
        Rule::string_type => Ok(FieldType::String),
        Rule::struct_ref => Ok(FieldType::StructRef(inner.as_str().to_string())),
        Rule::list_type => {
            let elem = inner.into_inner().next().ok_or("list[T]")?;
            Ok(FieldType::List(Box::new(build_type_expr(elem)?)))
        }
        Rule::map_type => {
            let mut it = inner.into_inner();
            let key = it.next().ok_or("map[K, V]: key")?;
            let value = it.next().ok_or("map[K, V]: value")?;
            Ok(FieldType::Map(
                Box::new(build_type_expr(key)?),
                Box::new(build_type_expr(value)?),
            ))
        }
        _ => Err(format!("Unhandled type rule: {:?}", inner.as_rule())),
    }
}

fn parse_scalar_type(s: &str) -> Result<ScalarType, String> {
    match s {
        "uint8" | "byte" | "char" => Ok(ScalarType::U8),
        "uint16" => Ok(ScalarType::U16),
        "uint32" => Ok(ScalarType::U32),
        "uint64" => Ok(ScalarType::U64),
        "int8" => Ok(ScalarType::I8),
        "int16" => Ok(ScalarType::I16),
        "int32" => Ok(ScalarType::I32),
        "int64" => Ok(ScalarType::I64),
        "bool" => Ok(ScalarType::Bool),
        "float" => Ok(ScalarType::Float),
        "double" => Ok(ScalarType::Double),
        _ => Err(format!("Unknown scalar type: {}", s)),
    }
}

fn parse_literal(pair: pest::iterators::Pair<Rule>) -> Result<Literal, String> {
    let inner = pair.into_inner().next().ok_or("Empty literal")?;
    let s = inner.as_str();
    match inner.as_rule() {
        Rule::bool_lit => Ok(Literal::Bool(s == "true")),
        Rule::int_lit => s
            .parse::<i64>()
            .map(Literal::Int)
            .map_err(|_| format!("integer literal out of range: {}", s)),
        Rule::float_lit => s
            .parse::<f64>()
            .map(Literal::Float)
            .map_err(|_| format!("invalid float literal: {}", s)),
        Rule::string_lit => {
            let body = &s[1..s.len() - 1];
            Ok(Literal::String(unescape(body)))
        }
        _ => Err(format!("Unhandled literal rule: {:?}", inner.as_rule())),
    }
}

fn unescape(s: &str) -> String {
    let mut out = String::with_capacity(s.len());
    let mut chars = s.chars();
    while let Some(c) = chars.next() {
        if c != '\\' {
            out.push(c);
            continue;
        }
        match chars.next() {
            Some('n') => out.push('\n'),
            Some('t') => out.push('\t'),
            Some('0') => out.push('\0'),
            Some(other) => out.push(other),
            None => out.push('\\'),
        }
    }
    out
}
