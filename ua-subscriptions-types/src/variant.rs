// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the definition of `Variant`, restricted to the scalar types
//! that notification payloads and condition event fields carry.

use serde::{Deserialize, Serialize};

use crate::{ByteString, DateTimeUtc, LocalizedText, NodeId, QualifiedName, StatusCode};

/// A value of one of the OPC UA built-in types.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum Variant {
    /// An empty value.
    #[default]
    Empty,
    /// A boolean value.
    Boolean(bool),
    /// A signed 32 bit integer.
    Int32(i32),
    /// An unsigned 32 bit integer.
    UInt32(u32),
    /// A double precision floating point value.
    Double(f64),
    /// A string value.
    String(String),
    /// A timestamp.
    DateTime(DateTimeUtc),
    /// A byte string value.
    ByteString(ByteString),
    /// A status code value.
    StatusCode(StatusCode),
    /// A node id value.
    NodeId(Box<NodeId>),
    /// A qualified name value.
    QualifiedName(Box<QualifiedName>),
    /// A localized text value.
    LocalizedText(Box<LocalizedText>),
}

impl Variant {
    /// Whether the variant is empty.
    pub fn is_empty(&self) -> bool {
        matches!(self, Variant::Empty)
    }

    /// The name of the contained type, for diagnostics.
    pub fn type_name(&self) -> &'static str {
        match self {
            Variant::Empty => "Empty",
            Variant::Boolean(_) => "Boolean",
            Variant::Int32(_) => "Int32",
            Variant::UInt32(_) => "UInt32",
            Variant::Double(_) => "Double",
            Variant::String(_) => "String",
            Variant::DateTime(_) => "DateTime",
            Variant::ByteString(_) => "ByteString",
            Variant::StatusCode(_) => "StatusCode",
            Variant::NodeId(_) => "NodeId",
            Variant::QualifiedName(_) => "QualifiedName",
            Variant::LocalizedText(_) => "LocalizedText",
        }
    }

    /// The boolean value, if the variant holds one.
    pub fn as_bool(&self) -> Option<bool> {
        match self {
            Variant::Boolean(v) => Some(*v),
            _ => None,
        }
    }
}

impl From<bool> for Variant {
    fn from(v: bool) -> Self {
        Variant::Boolean(v)
    }
}

impl From<i32> for Variant {
    fn from(v: i32) -> Self {
        Variant::Int32(v)
    }
}

impl From<u32> for Variant {
    fn from(v: u32) -> Self {
        Variant::UInt32(v)
    }
}

impl From<f64> for Variant {
    fn from(v: f64) -> Self {
        Variant::Double(v)
    }
}

impl From<&str> for Variant {
    fn from(v: &str) -> Self {
        Variant::String(v.to_string())
    }
}

impl From<String> for Variant {
    fn from(v: String) -> Self {
        Variant::String(v)
    }
}

impl From<DateTimeUtc> for Variant {
    fn from(v: DateTimeUtc) -> Self {
        Variant::DateTime(v)
    }
}

impl From<ByteString> for Variant {
    fn from(v: ByteString) -> Self {
        Variant::ByteString(v)
    }
}

impl From<StatusCode> for Variant {
    fn from(v: StatusCode) -> Self {
        Variant::StatusCode(v)
    }
}

impl From<NodeId> for Variant {
    fn from(v: NodeId) -> Self {
        Variant::NodeId(Box::new(v))
    }
}

impl From<QualifiedName> for Variant {
    fn from(v: QualifiedName) -> Self {
        Variant::QualifiedName(Box::new(v))
    }
}

impl From<LocalizedText> for Variant {
    fn from(v: LocalizedText) -> Self {
        Variant::LocalizedText(Box::new(v))
    }
}

#[cfg(test)]
mod tests {
    use super::Variant;
    use crate::LocalizedText;

    #[test]
    fn conversions() {
        assert_eq!(Variant::from(true).as_bool(), Some(true));
        assert_eq!(Variant::from(1i32), Variant::Int32(1));
        assert!(Variant::Empty.is_empty());
        assert_eq!(
            Variant::from(LocalizedText::from("Acknowledged")).type_name(),
            "LocalizedText"
        );
    }
}
