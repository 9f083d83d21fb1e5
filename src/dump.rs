//! Format decoded values for display. Struct fields are listed in schema order.

use crate::ast::{FieldType, ResolvedSchema};
use crate::value::Value;
use std::collections::HashMap;

/// Raw scalar string.
pub fn format_scalar_raw(v: &Value) -> String {
    match v {
        Value::U8(x) => format!("{}", x),
        Value::U16(x) => format!("{}", x),
        Value::U32(x) => format!("{}", x),
        Value::U64(x) => format!("{}", x),
        Value::I8(x) => format!("{}", x),
        Value::I16(x) => format!("{}", x),
        Value::I32(x) => format!("{}", x),
        Value::I64(x) => format!("{}", x),
        Value::Bool(x) => format!("{}", x),
        Value::Float(x) => format!("{}", x),
        Value::Double(x) => format!("{}", x),
        _ => format!("{:?}", v),
    }
}

pub fn hex_string(b: &[u8]) -> String {
    b.iter().map(|x| format!("{:02x}", x)).collect::<Vec<_>>().join(" ")
}

/// Strings print quoted when they are UTF-8, as hex otherwise.
fn format_string(b: &[u8]) -> String {
    match std::str::from_utf8(b) {
        Ok(s) => format!("{:?}", s),
        Err(_) => format!("hex({})", hex_string(b)),
    }
}

/// Multi-line dump of a decoded struct.
pub fn struct_to_dump(resolved: &ResolvedSchema, struct_name: &str, fields: &HashMap<String, Value>) -> String {
    value_to_dump(resolved, &FieldType::StructRef(struct_name.to_string()), &Value::Struct(fields.clone()), 0)
}

/// Format `v`, declared as `ty`, at the given indent depth.
pub fn value_to_dump(resolved: &ResolvedSchema, ty: &FieldType, v: &Value, indent: usize) -> String {
    let pad = "  ".repeat(indent);
    match v {
        Value::Str(b) => format!("{}{}", pad, format_string(b)),
        Value::Struct(m) => {
            let def = match ty {
                FieldType::StructRef(name) => resolved.get_struct(name),
                _ => None,
            };
            let mut lines = vec![format!("{}{} {{", pad, def.map(|d| d.name.as_str()).unwrap_or("struct"))];
            match def {
                Some(def) => {
                    for f in &def.fields {
                        if let Some(val) = m.get(&f.name) {
                            let sub = value_to_dump(resolved, &f.ty, val, indent + 1);
                            lines.push(format!("{}  {}: {}", pad, f.name, sub.trim_start()));
                        }
                    }
                }
                None => {
                    let mut keys: Vec<_> = m.keys().collect();
                    keys.sort();
                    for k in keys {
                        let sub = value_to_dump(resolved, ty, &m[k], indent + 1);
                        lines.push(format!("{}  {}: {}", pad, k, sub.trim_start()));
                    }
                }
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
        Value::List(lst) => {
            let elem_ty = match ty {
                FieldType::List(t) => t.as_ref(),
                other => other,
            };
            if lst.is_empty() {
                return format!("{}[]", pad);
            }
            let mut lines = vec![format!("{}[", pad)];
            for (i, item) in lst.iter().enumerate() {
                let sub = value_to_dump(resolved, elem_ty, item, indent + 1);
                lines.push(format!("{}  [{}] {}", pad, i, sub.trim_start()));
            }
            lines.push(format!("{}]", pad));
            lines.join("\n")
        }
        Value::Map(entries) => {
            let value_ty = match ty {
                FieldType::Map(_, t) => t.as_ref(),
                other => other,
            };
            if entries.is_empty() {
                return format!("{}{{}}", pad);
            }
            let mut lines = vec![format!("{}{{", pad)];
            for (k, val) in entries {
                let sub = value_to_dump(resolved, value_ty, val, indent + 1);
                lines.push(format!("{}  {} => {}", pad, format_scalar_raw(k), sub.trim_start()));
            }
            lines.push(format!("{}}}", pad));
            lines.join("\n")
        }
        _ => format!("{}{}", pad, format_scalar_raw(v)),
    }
}

/// First line of `value_to_dump`.
pub fn value_summary_line(resolved: &ResolvedSchema, ty: &FieldType, v: &Value) -> String {
    let full = value_to_dump(resolved, ty, v, 0);
    full.lines().next().map(|s| s.trim().to_string()).unwrap_or_default()
}
