//! Abstract Syntax Tree for schema files, plus name resolution.

use crate::error::SchemaError;
use std::collections::{HashMap, HashSet};

/// One parsed schema file: `syntax`, `package`, then struct definitions.
#[derive(Debug, Clone, PartialEq)]
pub struct Schema {
    pub syntax: String,
    pub package: String,
    pub structs: Vec<StructDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct StructDef {
    pub name: String,
    pub fields: Vec<FieldDef>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct FieldDef {
    pub name: String,
    pub ty: FieldType,
    pub default: Option<Literal>,
}

/// Fixed-width scalar kinds. `byte` and `char` parse as `U8`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ScalarType {
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    Bool,
    Float,
    Double,
}

impl ScalarType {
    /// Encoded width in bytes.
    pub fn size(self) -> usize {
        match self {
            ScalarType::U8 | ScalarType::I8 | ScalarType::Bool => 1,
            ScalarType::U16 | ScalarType::I16 => 2,
            ScalarType::U32 | ScalarType::I32 | ScalarType::Float => 4,
            ScalarType::U64 | ScalarType::I64 | ScalarType::Double => 8,
        }
    }

    pub fn is_float(self) -> bool {
        matches!(self, ScalarType::Float | ScalarType::Double)
    }

    pub fn name(self) -> &'static str {
        match self {
            ScalarType::U8 => "uint8",
            ScalarType::U16 => "uint16",
            ScalarType::U32 => "uint32",
            ScalarType::U64 => "uint64",
            ScalarType::I8 => "int8",
            ScalarType::I16 => "int16",
            ScalarType::I32 => "int32",
            ScalarType::I64 => "int64",
            ScalarType::Bool => "bool",
            ScalarType::Float => "float",
            ScalarType::Double => "double",
        }
    }
}

/// Field type.
#[derive(Debug, Clone, PartialEq)]
pub enum FieldType {
    Scalar(ScalarType),
    String,
    List(Box<FieldType>),
    Map(Box<FieldType>, Box<FieldType>),
    /// Reference to a struct. Fully qualified (`package.Name`) after resolution.
    StructRef(String),
}

impl FieldType {
    pub fn describe(&self) -> String {
        match self {
            FieldType::Scalar(s) => s.name().to_string(),
            FieldType::String => "string".to_string(),
            FieldType::List(t) => format!("list[{}]", t.describe()),
            FieldType::Map(k, v) => format!("map[{}, {}]", k.describe(), v.describe()),
            FieldType::StructRef(name) => name.clone(),
        }
    }
}

#[derive(Debug, Clone, PartialEq)]
pub enum Literal {
    Int(i64),
    Float(f64),
    Bool(bool),
    String(String),
}

/// All loaded schemas with every struct reference resolved.
#[derive(Debug, Clone)]
pub struct ResolvedSchema {
    pub schemas: Vec<Schema>,
    /// `package.Name` -> (schema index, struct index)
    structs_by_name: HashMap<String, (usize, usize)>,
}

impl ResolvedSchema {
    pub fn resolve(mut schemas: Vec<Schema>) -> Result<Self, SchemaError> {
        let mut structs_by_name = HashMap::new();
        for (si, schema) in schemas.iter().enumerate() {
            for (di, s) in schema.structs.iter().enumerate() {
                let qualified = format!("{}.{}", schema.package, s.name);
                if structs_by_name.insert(qualified.clone(), (si, di)).is_some() {
                    return Err(SchemaError::DuplicateStruct(qualified));
                }
            }
        }

        for schema in schemas.iter_mut() {
            let package = schema.package.clone();
            for s in schema.structs.iter_mut() {
                let mut seen = HashSet::new();
                for f in s.fields.iter_mut() {
                    if !seen.insert(f.name.clone()) {
                        return Err(SchemaError::DuplicateField {
                            structure: s.name.clone(),
                            field: f.name.clone(),
                        });
                    }
                    qualify(&mut f.ty, &package, &s.name, &f.name, &structs_by_name)?;
                    if let Some(ref lit) = f.default {
                        check_default(&f.ty, lit).map_err(|reason| SchemaError::InvalidDefault {
                            structure: s.name.clone(),
                            field: f.name.clone(),
                            reason,
                        })?;
                    }
                }
            }
        }

        let resolved = ResolvedSchema {
            schemas,
            structs_by_name,
        };
        resolved.check_direct_nesting()?;
        log::debug!(
            "resolved {} schema(s), {} struct(s)",
            resolved.schemas.len(),
            resolved.structs_by_name.len()
        );
        Ok(resolved)
    }

    /// Look a struct up by `package.Name`, or by bare name when it is unambiguous.
    pub fn get_struct(&self, name: &str) -> Option<&StructDef> {
        self.qualified_name(name).and_then(|q| {
            self.structs_by_name
                .get(&q)
                .map(|&(si, di)| &self.schemas[si].structs[di])
        })
    }

    /// Fully qualified name for `name`, if it names exactly one struct.
    pub fn qualified_name(&self, name: &str) -> Option<String> {
        if self.structs_by_name.contains_key(name) {
            return Some(name.to_string());
        }
        let suffix = format!(".{}", name);
        let mut matches = self.structs_by_name.keys().filter(|k| k.ends_with(&suffix));
        let first = matches.next()?;
        if matches.next().is_some() {
            return None;
        }
        Some(first.clone())
    }

    /// Qualified names of every struct, sorted.
    pub fn struct_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.structs_by_name.keys().cloned().collect();
        names.sort();
        names
    }

    /// Encoded size of `ty` when it does not depend on the value.
    pub fn fixed_size(&self, ty: &FieldType) -> Option<usize> {
        match ty {
            FieldType::Scalar(s) => Some(s.size()),
            FieldType::String | FieldType::List(_) | FieldType::Map(_, _) => None,
            FieldType::StructRef(name) => {
                let s = self.get_struct(name)?;
                s.fields.iter().map(|f| self.fixed_size(&f.ty)).sum()
            }
        }
    }

    /// Smallest possible encoding of `ty`: empty strings and containers.
    pub fn min_encoded_len(&self, ty: &FieldType) -> usize {
        match ty {
            FieldType::Scalar(s) => s.size(),
            FieldType::String | FieldType::List(_) | FieldType::Map(_, _) => 4,
            FieldType::StructRef(name) => self
                .get_struct(name)
                .map(|s| s.fields.iter().map(|f| self.min_encoded_len(&f.ty)).sum())
                .unwrap_or(0),
        }
    }

    /// A struct that holds itself through plain nested fields would be infinitely
    /// large. Nesting through a list or map is fine: those may be empty.
    fn check_direct_nesting(&self) -> Result<(), SchemaError> {
        fn visit(
            resolved: &ResolvedSchema,
            name: &str,
            path: &mut Vec<String>,
            done: &mut HashSet<String>,
        ) -> Result<(), SchemaError> {
            if done.contains(name) {
                return Ok(());
            }
            if path.iter().any(|p| p == name) {
                return Err(SchemaError::RecursiveStruct(name.to_string()));
            }
            path.push(name.to_string());
            if let Some(s) = resolved.get_struct(name) {
                for f in &s.fields {
                    if let FieldType::StructRef(ref child) = f.ty {
                        visit(resolved, child, path, done)?;
                    }
                }
            }
            path.pop();
            done.insert(name.to_string());
            Ok(())
        }

        let mut done = HashSet::new();
        for name in self.struct_names() {
            visit(self, &name, &mut Vec::new(), &mut done)?;
        }
        Ok(())
    }
}

fn qualify(
    ty: &mut FieldType,
    package: &str,
    structure: &str,
    field: &str,
    structs_by_name: &HashMap<String, (usize, usize)>,
) -> Result<(), SchemaError> {
    match ty {
        FieldType::Scalar(_) | FieldType::String => Ok(()),
        FieldType::List(elem) => qualify(elem, package, structure, field, structs_by_name),
        FieldType::Map(key, value) => {
            match key.as_ref() {
                FieldType::Scalar(s) if !s.is_float() => {}
                _ => {
                    return Err(SchemaError::InvalidMapKey {
                        structure: structure.to_string(),
                        field: field.to_string(),
                    })
                }
            }
            qualify(value, package, structure, field, structs_by_name)
        }
        FieldType::StructRef(name) => {
            let qualified = if name.contains('.') {
                name.clone()
            } else {
                format!("{}.{}", package, name)
            };
            if !structs_by_name.contains_key(&qualified) {
                return Err(SchemaError::UnknownType {
                    structure: structure.to_string(),
                    name: name.clone(),
                });
            }
            *name = qualified;
            Ok(())
        }
    }
}

fn check_default(ty: &FieldType, lit: &Literal) -> Result<(), String> {
    let scalar = match ty {
        FieldType::String => {
            return match lit {
                Literal::String(_) => Ok(()),
                _ => Err("string field needs a string literal".to_string()),
            }
        }
        FieldType::Scalar(s) => *s,
        other => return Err(format!("{} fields cannot have a default", other.describe())),
    };
    match (scalar, lit) {
        (ScalarType::Bool, Literal::Bool(_)) => Ok(()),
        (ScalarType::Bool, Literal::Int(0 | 1)) => Ok(()),
        (ScalarType::Float | ScalarType::Double, Literal::Float(_) | Literal::Int(_)) => Ok(()),
        (s, Literal::Int(i)) if !s.is_float() && s != ScalarType::Bool => {
            if int_fits(s, *i) {
                Ok(())
            } else {
                Err(format!("{} out of range for {}", i, s.name()))
            }
        }
        (s, other) => Err(format!("{:?} is not a valid {}", other, s.name())),
    }
}

fn int_fits(s: ScalarType, i: i64) -> bool {
    match s {
        ScalarType::U8 => u8::try_from(i).is_ok(),
        ScalarType::U16 => u16::try_from(i).is_ok(),
        ScalarType::U32 => u32::try_from(i).is_ok(),
        ScalarType::U64 => u64::try_from(i).is_ok(),
        ScalarType::I8 => i8::try_from(i).is_ok(),
        ScalarType::I16 => i16::try_from(i).is_ok(),
        ScalarType::I32 => i32::try_from(i).is_ok(),
        ScalarType::I64 => true,
        _ => false,
    }
}
