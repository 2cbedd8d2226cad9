// SPDX-License-Identifier: Apache-2.0 OR MIT
// Copyright (c) 2025-2026 naskel.com

//! Schema-aware JSON conversion for dynamic values.
//!
//! JSON is the structured interchange format of the connector surface: whole
//! samples are exported with [`to_json`], and write instances are populated
//! with [`merge`], which validates the document against the declared type.
//! Unknown fields are rejected rather than ignored, so a typo in a field name
//! surfaces as an error instead of a silently dropped value.

use crate::dynamic::{DynamicValue, PrimitiveKind, TypeDescriptor, TypeKind};
use crate::error::{Error, Result};
use serde_json::Value as Json;

/// Convert a dynamic value to its JSON representation.
pub fn to_json(value: &DynamicValue) -> Json {
    match value {
        DynamicValue::Bool(v) => Json::Bool(*v),
        DynamicValue::U8(v) => Json::from(*v),
        DynamicValue::U16(v) => Json::from(*v),
        DynamicValue::U32(v) => Json::from(*v),
        DynamicValue::U64(v) => Json::from(*v),
        DynamicValue::I8(v) => Json::from(*v),
        DynamicValue::I16(v) => Json::from(*v),
        DynamicValue::I32(v) => Json::from(*v),
        DynamicValue::I64(v) => Json::from(*v),
        DynamicValue::F32(v) => Json::from(f64::from(*v)),
        DynamicValue::F64(v) => Json::from(*v),
        DynamicValue::Char(v) => Json::String(v.to_string()),
        DynamicValue::String(v) => Json::String(v.clone()),
        DynamicValue::Struct(fields) => {
            let mut map = serde_json::Map::new();
            for (name, field) in fields {
                map.insert(name.clone(), to_json(field));
            }
            Json::Object(map)
        }
        DynamicValue::Sequence(items) => Json::Array(items.iter().map(to_json).collect()),
        DynamicValue::Null => Json::Null,
    }
}

/// Serialize a dynamic value to JSON text.
pub fn to_json_text(value: &DynamicValue) -> Result<String> {
    serde_json::to_string(&to_json(value)).map_err(|e| Error::SchemaMismatch(e.to_string()))
}

/// Build a fully-populated value from a JSON document: defaults first, then
/// the document merged on top.
pub fn from_json(desc: &TypeDescriptor, json: &Json) -> Result<DynamicValue> {
    let mut value = desc.default_value();
    merge(desc, &mut value, json)?;
    Ok(value)
}

/// Parse JSON text against a descriptor.
pub fn from_json_text(desc: &TypeDescriptor, text: &str) -> Result<DynamicValue> {
    let json: Json =
        serde_json::from_str(text).map_err(|e| Error::SchemaMismatch(e.to_string()))?;
    from_json(desc, &json)
}

/// Merge a JSON document into an existing value.
///
/// Struct merging is member-wise: fields present in the document are
/// replaced, fields absent keep their current value, unknown fields fail
/// with [`Error::SchemaMismatch`]. A JSON `null` resets the member to its
/// type default. Sequences are replaced wholesale.
pub fn merge(desc: &TypeDescriptor, value: &mut DynamicValue, json: &Json) -> Result<()> {
    if json.is_null() {
        *value = desc.default_value();
        return Ok(());
    }

    match &desc.kind {
        TypeKind::Primitive(p) => {
            *value = primitive_from_json(*p, json, &desc.name)?;
            Ok(())
        }
        TypeKind::Struct(fields) => {
            let obj = json.as_object().ok_or_else(|| {
                Error::SchemaMismatch(format!("'{}' expects a JSON object", desc.name))
            })?;

            for key in obj.keys() {
                if !fields.iter().any(|f| &f.name == key) {
                    return Err(Error::SchemaMismatch(format!(
                        "unknown field '{}' for type '{}'",
                        key, desc.name
                    )));
                }
            }

            for field in fields {
                if let Some(member_json) = obj.get(&field.name) {
                    let slot = value.get_field_mut(&field.name).ok_or_else(|| {
                        Error::SchemaMismatch(format!("value missing field '{}'", field.name))
                    })?;
                    merge(&field.type_desc, slot, member_json)?;
                }
            }
            Ok(())
        }
        TypeKind::Sequence {
            element_type,
            max_length,
        } => {
            let arr = json.as_array().ok_or_else(|| {
                Error::SchemaMismatch(format!("'{}' expects a JSON array", desc.name))
            })?;
            if let Some(max) = max_length {
                if arr.len() > *max {
                    return Err(Error::SchemaMismatch(format!(
                        "sequence '{}' exceeds bound {}",
                        desc.name, max
                    )));
                }
            }
            let mut items = Vec::with_capacity(arr.len());
            for item in arr {
                items.push(from_json(element_type, item)?);
            }
            *value = DynamicValue::Sequence(items);
            Ok(())
        }
    }
}

fn primitive_from_json(kind: PrimitiveKind, json: &Json, type_name: &str) -> Result<DynamicValue> {
    let mismatch = || {
        Error::SchemaMismatch(format!(
            "incompatible JSON value for '{}' member",
            type_name
        ))
    };

    Ok(match kind {
        PrimitiveKind::Bool => DynamicValue::Bool(json.as_bool().ok_or_else(mismatch)?),
        PrimitiveKind::U8 => DynamicValue::U8(json_number(json).ok_or_else(mismatch)? as u8),
        PrimitiveKind::U16 => DynamicValue::U16(json_number(json).ok_or_else(mismatch)? as u16),
        PrimitiveKind::U32 => DynamicValue::U32(json_number(json).ok_or_else(mismatch)? as u32),
        PrimitiveKind::U64 => match json.as_u64() {
            Some(v) => DynamicValue::U64(v),
            None => DynamicValue::U64(json_number(json).ok_or_else(mismatch)? as u64),
        },
        PrimitiveKind::I8 => DynamicValue::I8(json_number(json).ok_or_else(mismatch)? as i8),
        PrimitiveKind::I16 => DynamicValue::I16(json_number(json).ok_or_else(mismatch)? as i16),
        PrimitiveKind::I32 => DynamicValue::I32(json_number(json).ok_or_else(mismatch)? as i32),
        PrimitiveKind::I64 => match json.as_i64() {
            Some(v) => DynamicValue::I64(v),
            None => DynamicValue::I64(json_number(json).ok_or_else(mismatch)? as i64),
        },
        PrimitiveKind::F32 => DynamicValue::F32(json_number(json).ok_or_else(mismatch)? as f32),
        PrimitiveKind::F64 => DynamicValue::F64(json_number(json).ok_or_else(mismatch)?),
        PrimitiveKind::Char => {
            // Chars travel as one-character JSON strings, or as a code point.
            if let Some(s) = json.as_str() {
                let mut chars = s.chars();
                match (chars.next(), chars.next()) {
                    (Some(c), None) => DynamicValue::Char(c),
                    _ => return Err(mismatch()),
                }
            } else {
                let code = json_number(json).ok_or_else(mismatch)? as u32;
                DynamicValue::Char(char::from_u32(code).ok_or_else(mismatch)?)
            }
        }
        PrimitiveKind::String { max_length } => {
            let s = json.as_str().ok_or_else(mismatch)?;
            if let Some(max) = max_length {
                if s.chars().count() > max {
                    return Err(Error::SchemaMismatch(format!(
                        "string for '{}' member exceeds bound {}",
                        type_name, max
                    )));
                }
            }
            DynamicValue::String(s.to_string())
        }
    })
}

fn json_number(json: &Json) -> Option<f64> {
    json.as_f64()
}
