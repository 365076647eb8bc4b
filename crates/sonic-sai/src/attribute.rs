//! Typed attribute values and their schema-driven textual form.

use crate::error::{SaiError, SaiResult};
use crate::metadata::{AttrId, AttrMetadata, AttrSchema, AttrValueType};
use crate::types::{deserialize_object_id, serialize_object_id, ObjectType, RawSaiObjectId};
use std::net::IpAddr;

/// A decoded attribute value.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum AttrValue {
    ObjectId(RawSaiObjectId),
    Int32(i32),
    Uint32(u32),
    Bool(bool),
    IpAddress(IpAddr),
}

impl AttrValue {
    /// Returns the value type this value was built as.
    pub fn value_type(&self) -> AttrValueType {
        match self {
            AttrValue::ObjectId(_) => AttrValueType::ObjectId,
            AttrValue::Int32(_) => AttrValueType::Int32,
            AttrValue::Uint32(_) => AttrValueType::Uint32,
            AttrValue::Bool(_) => AttrValueType::Bool,
            AttrValue::IpAddress(_) => AttrValueType::IpAddress,
        }
    }

    pub fn as_object_id(&self) -> Option<RawSaiObjectId> {
        match self {
            AttrValue::ObjectId(oid) => Some(*oid),
            _ => None,
        }
    }

    pub fn as_i32(&self) -> Option<i32> {
        match self {
            AttrValue::Int32(v) => Some(*v),
            _ => None,
        }
    }
}

/// An `(id, value)` attribute pair.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Attribute {
    pub id: AttrId,
    pub value: AttrValue,
}

impl Attribute {
    pub fn new(id: AttrId, value: AttrValue) -> Self {
        Self { id, value }
    }
}

/// Serializes an attribute value according to its metadata.
///
/// Enum values are written by symbolic name when the enum knows the value,
/// otherwise as a plain number.
pub fn serialize_attr_value(meta: &AttrMetadata, value: &AttrValue) -> SaiResult<String> {
    if value.value_type() != meta.value_type {
        return Err(SaiError::encode(format!(
            "{} expects {:?}, got {:?}",
            meta.attr_id_name, meta.value_type, value
        )));
    }

    let s = match value {
        AttrValue::ObjectId(oid) => serialize_object_id(*oid),
        AttrValue::Int32(v) => match meta.enum_metadata.and_then(|e| e.name_of(*v)) {
            Some(name) => name.to_string(),
            None => v.to_string(),
        },
        AttrValue::Uint32(v) => v.to_string(),
        AttrValue::Bool(v) => v.to_string(),
        AttrValue::IpAddress(ip) => ip.to_string(),
    };

    Ok(s)
}

/// Parses the textual form of an attribute value according to its metadata.
pub fn deserialize_attr_value(meta: &AttrMetadata, s: &str) -> SaiResult<AttrValue> {
    let invalid = || {
        SaiError::invalid_parameter(format!("invalid value for {}: {}", meta.attr_id_name, s))
    };

    let value = match meta.value_type {
        AttrValueType::ObjectId => AttrValue::ObjectId(deserialize_object_id(s)?),
        AttrValueType::Int32 => {
            let by_name = meta.enum_metadata.and_then(|e| e.value_of(s));
            match by_name {
                Some(v) => AttrValue::Int32(v),
                None => AttrValue::Int32(s.parse().map_err(|_| invalid())?),
            }
        }
        AttrValueType::Uint32 => AttrValue::Uint32(s.parse().map_err(|_| invalid())?),
        AttrValueType::Bool => match s {
            "true" => AttrValue::Bool(true),
            "false" => AttrValue::Bool(false),
            _ => return Err(invalid()),
        },
        AttrValueType::IpAddress => AttrValue::IpAddress(s.parse().map_err(|_| invalid())?),
    };

    Ok(value)
}

/// Serializes an attribute list into `(attr name, value)` field tuples.
///
/// The first attribute without metadata aborts the whole list.
pub fn serialize_attr_list(
    schema: &AttrSchema,
    object_type: ObjectType,
    attrs: &[Attribute],
) -> SaiResult<Vec<(String, String)>> {
    attrs
        .iter()
        .map(|attr| {
            let meta = schema.get(object_type, attr.id)?;
            let value = serialize_attr_value(meta, &attr.value)?;
            Ok((meta.attr_id_name.to_string(), value))
        })
        .collect()
}
