// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Dotted member-path resolution over a descriptor/value pair.
//!
//! Paths address scalar or nested fields inside a dynamically-shaped value,
//! e.g. `"position.x"`. Descriptor and value are walked in lockstep so every
//! access is validated against the declared type before the value is touched.

use crate::dynamic::{DynamicValue, PrimitiveKind, TypeDescriptor, TypeKind};
use crate::error::{Error, Result};

/// Resolve a path to the leaf descriptor and value.
pub fn resolve<'a>(
    desc: &'a TypeDescriptor,
    value: &'a DynamicValue,
    path: &str,
) -> Result<(&'a TypeDescriptor, &'a DynamicValue)> {
    let mut cur_desc = desc;
    let mut cur_value = value;

    for segment in segments(path)? {
        let field = cur_desc
            .field(segment)
            .ok_or_else(|| Error::MemberNotFound(path.to_string()))?;
        cur_value = cur_value
            .get_field(segment)
            .ok_or_else(|| Error::MemberNotFound(path.to_string()))?;
        cur_desc = &field.type_desc;
    }

    Ok((cur_desc, cur_value))
}

/// Resolve a path to the leaf descriptor and a mutable value slot.
fn resolve_mut<'a>(
    desc: &'a TypeDescriptor,
    value: &'a mut DynamicValue,
    path: &str,
) -> Result<(&'a TypeDescriptor, &'a mut DynamicValue)> {
    let mut cur_desc = desc;
    let mut cur_value = value;

    for segment in segments(path)? {
        let field = cur_desc
            .field(segment)
            .ok_or_else(|| Error::MemberNotFound(path.to_string()))?;
        cur_value = cur_value
            .get_field_mut(segment)
            .ok_or_else(|| Error::MemberNotFound(path.to_string()))?;
        cur_desc = &field.type_desc;
    }

    Ok((cur_desc, cur_value))
}

fn segments(path: &str) -> Result<impl Iterator<Item = &str>> {
    if path.is_empty() || path.split('.').any(str::is_empty) {
        return Err(Error::MemberNotFound(path.to_string()));
    }
    Ok(path.split('.'))
}

/// Read a numeric member as f64, widening from the declared width.
pub fn get_number(desc: &TypeDescriptor, value: &DynamicValue, path: &str) -> Result<f64> {
    let (leaf_desc, leaf) = resolve(desc, value, path)?;
    match &leaf_desc.kind {
        TypeKind::Primitive(p) if p.is_numeric() => leaf
            .as_number()
            .ok_or_else(|| type_mismatch(path, "number", leaf)),
        _ => Err(type_mismatch(path, "number", leaf)),
    }
}

/// Read a boolean member.
pub fn get_boolean(desc: &TypeDescriptor, value: &DynamicValue, path: &str) -> Result<bool> {
    let (_, leaf) = resolve(desc, value, path)?;
    leaf.as_bool()
        .ok_or_else(|| type_mismatch(path, "boolean", leaf))
}

/// Read a string member.
pub fn get_string(desc: &TypeDescriptor, value: &DynamicValue, path: &str) -> Result<String> {
    let (_, leaf) = resolve(desc, value, path)?;
    leaf.as_str()
        .map(str::to_string)
        .ok_or_else(|| type_mismatch(path, "string", leaf))
}

/// Write a numeric member, narrowing f64 to the declared width with standard
/// IEEE-754 conversion (saturating on overflow, precision loss possible).
pub fn set_number(
    desc: &TypeDescriptor,
    value: &mut DynamicValue,
    path: &str,
    number: f64,
) -> Result<()> {
    let (leaf_desc, slot) = resolve_mut(desc, value, path)?;
    let kind = match &leaf_desc.kind {
        TypeKind::Primitive(p) if p.is_numeric() => *p,
        _ => {
            return Err(Error::TypeMismatch(format!(
                "member '{}' is not numeric",
                path
            )))
        }
    };

    *slot = match kind {
        PrimitiveKind::U8 => DynamicValue::U8(number as u8),
        PrimitiveKind::U16 => DynamicValue::U16(number as u16),
        PrimitiveKind::U32 => DynamicValue::U32(number as u32),
        PrimitiveKind::U64 => DynamicValue::U64(number as u64),
        PrimitiveKind::I8 => DynamicValue::I8(number as i8),
        PrimitiveKind::I16 => DynamicValue::I16(number as i16),
        PrimitiveKind::I32 => DynamicValue::I32(number as i32),
        PrimitiveKind::I64 => DynamicValue::I64(number as i64),
        PrimitiveKind::F32 => DynamicValue::F32(number as f32),
        PrimitiveKind::F64 => DynamicValue::F64(number),
        PrimitiveKind::Char => {
            let code = number as u32;
            let ch = char::from_u32(code).ok_or_else(|| {
                Error::TypeMismatch(format!("member '{}': {} is not a character code", path, code))
            })?;
            DynamicValue::Char(ch)
        }
        PrimitiveKind::Bool | PrimitiveKind::String { .. } => unreachable!(),
    };
    Ok(())
}

/// Write a boolean member.
pub fn set_boolean(
    desc: &TypeDescriptor,
    value: &mut DynamicValue,
    path: &str,
    b: bool,
) -> Result<()> {
    let (leaf_desc, slot) = resolve_mut(desc, value, path)?;
    match &leaf_desc.kind {
        TypeKind::Primitive(PrimitiveKind::Bool) => {
            *slot = DynamicValue::Bool(b);
            Ok(())
        }
        _ => Err(Error::TypeMismatch(format!(
            "member '{}' is not boolean",
            path
        ))),
    }
}

/// Write a string member, honoring the declared bound.
pub fn set_string(
    desc: &TypeDescriptor,
    value: &mut DynamicValue,
    path: &str,
    s: &str,
) -> Result<()> {
    let (leaf_desc, slot) = resolve_mut(desc, value, path)?;
    match &leaf_desc.kind {
        TypeKind::Primitive(PrimitiveKind::String { max_length }) => {
            if let Some(max) = max_length {
                if s.chars().count() > *max {
                    return Err(Error::TypeMismatch(format!(
                        "member '{}': string exceeds bound {}",
                        path, max
                    )));
                }
            }
            *slot = DynamicValue::String(s.to_string());
            Ok(())
        }
        _ => Err(Error::TypeMismatch(format!(
            "member '{}' is not a string",
            path
        ))),
    }
}

/// Reset one member to its type default.
pub fn clear_member(desc: &TypeDescriptor, value: &mut DynamicValue, path: &str) -> Result<()> {
    let (leaf_desc, slot) = resolve_mut(desc, value, path)?;
    *slot = leaf_desc.default_value();
    Ok(())
}

fn type_mismatch(path: &str, wanted: &str, got: &DynamicValue) -> Error {
    Error::TypeMismatch(format!(
        "member '{}': expected {}, found {}",
        path,
        wanted,
        got.kind_name()
    ))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dynamic::FieldDescriptor;
    use std::sync::Arc;

    fn point_type() -> TypeDescriptor {
        let f64_type = Arc::new(TypeDescriptor::primitive("double", PrimitiveKind::F64));
        TypeDescriptor::struct_type(
            "Point",
            vec![
                FieldDescriptor::new("x", f64_type.clone()),
                FieldDescriptor::new("y", f64_type),
            ],
        )
    }

    fn shape_type() -> TypeDescriptor {
        TypeDescriptor::struct_type(
            "Shape",
            vec![
                FieldDescriptor::new(
                    "color",
                    Arc::new(TypeDescriptor::primitive(
                        "string",
                        PrimitiveKind::String {
                            max_length: Some(16),
                        },
                    )),
                ),
                FieldDescriptor::new("origin", Arc::new(point_type())),
                FieldDescriptor::new(
                    "filled",
                    Arc::new(TypeDescriptor::primitive("boolean", PrimitiveKind::Bool)),
                ),
            ],
        )
    }

    #[test]
    fn test_nested_set_and_get() {
        let desc = shape_type();
        let mut value = desc.default_value();

        set_number(&desc, &mut value, "origin.x", 12.5).expect("set origin.x");
        set_string(&desc, &mut value, "color", "GREEN").expect("set color");
        set_boolean(&desc, &mut value, "filled", true).expect("set filled");

        assert_eq!(get_number(&desc, &value, "origin.x").expect("x"), 12.5);
        assert_eq!(get_number(&desc, &value, "origin.y").expect("y"), 0.0);
        assert_eq!(get_string(&desc, &value, "color").expect("color"), "GREEN");
        assert!(get_boolean(&desc, &value, "filled").expect("filled"));
    }

    #[test]
    fn test_member_not_found() {
        let desc = shape_type();
        let value = desc.default_value();

        assert!(matches!(
            get_number(&desc, &value, "origin.z"),
            Err(Error::MemberNotFound(_))
        ));
        assert!(matches!(
            get_number(&desc, &value, "bogus"),
            Err(Error::MemberNotFound(_))
        ));
        assert!(matches!(
            get_number(&desc, &value, ""),
            Err(Error::MemberNotFound(_))
        ));
    }

    #[test]
    fn test_accessor_kind_mismatch() {
        let desc = shape_type();
        let mut value = desc.default_value();

        assert!(matches!(
            get_number(&desc, &value, "color"),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            get_boolean(&desc, &value, "origin.x"),
            Err(Error::TypeMismatch(_))
        ));
        assert!(matches!(
            set_string(&desc, &mut value, "filled", "yes"),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_narrowing_conversion() {
        let desc = TypeDescriptor::struct_type(
            "Narrow",
            vec![FieldDescriptor::new(
                "b",
                Arc::new(TypeDescriptor::primitive("octet", PrimitiveKind::U8)),
            )],
        );
        let mut value = desc.default_value();

        set_number(&desc, &mut value, "b", 300.9).expect("set b");
        // f64 -> u8 saturates at the type bound
        assert_eq!(get_number(&desc, &value, "b").expect("b"), 255.0);
    }

    #[test]
    fn test_string_bound_enforced() {
        let desc = shape_type();
        let mut value = desc.default_value();

        let long = "x".repeat(17);
        assert!(matches!(
            set_string(&desc, &mut value, "color", &long),
            Err(Error::TypeMismatch(_))
        ));
    }

    #[test]
    fn test_clear_member_resets_default() {
        let desc = shape_type();
        let mut value = desc.default_value();

        set_number(&desc, &mut value, "origin.x", 5.0).expect("set");
        clear_member(&desc, &mut value, "origin").expect("clear");
        assert_eq!(get_number(&desc, &value, "origin.x").expect("x"), 0.0);
    }
}
