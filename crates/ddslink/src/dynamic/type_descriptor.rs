// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Type descriptors for runtime type information.

use crate::dynamic::DynamicValue;
use std::collections::HashMap;
use std::sync::Arc;

/// Primitive type kinds.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum PrimitiveKind {
    Bool,
    U8,
    U16,
    U32,
    U64,
    I8,
    I16,
    I32,
    I64,
    F32,
    F64,
    Char,
    String { max_length: Option<usize> },
}

impl PrimitiveKind {
    /// True for kinds the number accessors apply to (chars count as their
    /// code point, matching the original binding).
    pub fn is_numeric(&self) -> bool {
        !matches!(self, Self::Bool | Self::String { .. })
    }
}

/// Type kind enumeration.
#[derive(Debug, Clone, PartialEq)]
pub enum TypeKind {
    /// Primitive type.
    Primitive(PrimitiveKind),
    /// Struct with named fields.
    Struct(Vec<FieldDescriptor>),
    /// Sequence (dynamic length).
    Sequence {
        element_type: Arc<TypeDescriptor>,
        max_length: Option<usize>,
    },
}

/// A complete type descriptor.
#[derive(Debug, Clone, PartialEq)]
pub struct TypeDescriptor {
    /// Type name.
    pub name: String,
    /// Type kind.
    pub kind: TypeKind,
}

impl TypeDescriptor {
    /// Create a new type descriptor.
    pub fn new(name: impl Into<String>, kind: TypeKind) -> Self {
        Self {
            name: name.into(),
            kind,
        }
    }

    /// Create a primitive type descriptor.
    pub fn primitive(name: impl Into<String>, kind: PrimitiveKind) -> Self {
        Self::new(name, TypeKind::Primitive(kind))
    }

    /// Create a struct type descriptor.
    pub fn struct_type(name: impl Into<String>, fields: Vec<FieldDescriptor>) -> Self {
        Self::new(name, TypeKind::Struct(fields))
    }

    /// Check if this is a struct type.
    pub fn is_struct(&self) -> bool {
        matches!(self.kind, TypeKind::Struct(_))
    }

    /// Get fields if this is a struct.
    pub fn fields(&self) -> Option<&[FieldDescriptor]> {
        match &self.kind {
            TypeKind::Struct(fields) => Some(fields),
            _ => None,
        }
    }

    /// Get field by name.
    pub fn field(&self, name: &str) -> Option<&FieldDescriptor> {
        self.fields()?.iter().find(|f| f.name == name)
    }

    /// Create the default value for this type: zeros, empty strings, empty
    /// sequences, structs with all fields defaulted.
    pub fn default_value(&self) -> DynamicValue {
        match &self.kind {
            TypeKind::Primitive(p) => Self::default_primitive(*p),
            TypeKind::Struct(fields) => {
                let mut map = HashMap::new();
                for field in fields {
                    map.insert(field.name.clone(), field.type_desc.default_value());
                }
                DynamicValue::Struct(map)
            }
            TypeKind::Sequence { .. } => DynamicValue::Sequence(Vec::new()),
        }
    }

    fn default_primitive(kind: PrimitiveKind) -> DynamicValue {
        match kind {
            PrimitiveKind::Bool => DynamicValue::Bool(false),
            PrimitiveKind::U8 => DynamicValue::U8(0),
            PrimitiveKind::U16 => DynamicValue::U16(0),
            PrimitiveKind::U32 => DynamicValue::U32(0),
            PrimitiveKind::U64 => DynamicValue::U64(0),
            PrimitiveKind::I8 => DynamicValue::I8(0),
            PrimitiveKind::I16 => DynamicValue::I16(0),
            PrimitiveKind::I32 => DynamicValue::I32(0),
            PrimitiveKind::I64 => DynamicValue::I64(0),
            PrimitiveKind::F32 => DynamicValue::F32(0.0),
            PrimitiveKind::F64 => DynamicValue::F64(0.0),
            PrimitiveKind::Char => DynamicValue::Char('\0'),
            PrimitiveKind::String { .. } => DynamicValue::String(String::new()),
        }
    }
}

/// Field descriptor for struct members.
#[derive(Debug, Clone, PartialEq)]
pub struct FieldDescriptor {
    /// Field name.
    pub name: String,
    /// Field type.
    pub type_desc: Arc<TypeDescriptor>,
}

impl FieldDescriptor {
    /// Create a new field descriptor.
    pub fn new(name: impl Into<String>, type_desc: Arc<TypeDescriptor>) -> Self {
        Self {
            name: name.into(),
            type_desc,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_type_descriptor_struct() {
        let u32_type = Arc::new(TypeDescriptor::primitive("unsignedLong", PrimitiveKind::U32));
        let f64_type = Arc::new(TypeDescriptor::primitive("double", PrimitiveKind::F64));

        let fields = vec![
            FieldDescriptor::new("x", u32_type),
            FieldDescriptor::new("y", f64_type),
        ];

        let desc = TypeDescriptor::struct_type("Point", fields);
        assert!(desc.is_struct());
        assert_eq!(desc.fields().map(<[FieldDescriptor]>::len), Some(2));
        assert!(desc.field("x").is_some());
        assert!(desc.field("z").is_none());
    }

    #[test]
    fn test_default_value_struct() {
        let desc = TypeDescriptor::struct_type(
            "Sample",
            vec![
                FieldDescriptor::new(
                    "count",
                    Arc::new(TypeDescriptor::primitive("long", PrimitiveKind::I32)),
                ),
                FieldDescriptor::new(
                    "label",
                    Arc::new(TypeDescriptor::primitive(
                        "string",
                        PrimitiveKind::String { max_length: None },
                    )),
                ),
            ],
        );

        let v = desc.default_value();
        assert_eq!(v.get_field("count"), Some(&DynamicValue::I32(0)));
        assert_eq!(
            v.get_field("label"),
            Some(&DynamicValue::String(String::new()))
        );
    }

    #[test]
    fn test_default_value_sequence_is_empty() {
        let desc = TypeDescriptor::new(
            "Values",
            TypeKind::Sequence {
                element_type: Arc::new(TypeDescriptor::primitive("double", PrimitiveKind::F64)),
                max_length: Some(16),
            },
        );
        assert_eq!(desc.default_value(), DynamicValue::Sequence(Vec::new()));
    }

    #[test]
    fn test_numeric_kinds() {
        assert!(PrimitiveKind::F64.is_numeric());
        assert!(PrimitiveKind::Char.is_numeric());
        assert!(!PrimitiveKind::Bool.is_numeric());
        assert!(!PrimitiveKind::String { max_length: None }.is_numeric());
    }
}
