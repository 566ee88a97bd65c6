// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the definition of `NodeId`.

use std::fmt;

use serde::{Deserialize, Serialize};
use uuid::Uuid;

use crate::byte_string::ByteString;

/// The identifier part of a node id.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Identifier {
    /// A numeric identifier.
    Numeric(u32),
    /// A string identifier.
    String(String),
    /// A GUID identifier.
    Guid(Uuid),
    /// An opaque (byte string) identifier.
    Opaque(ByteString),
}

impl Default for Identifier {
    fn default() -> Self {
        Identifier::Numeric(0)
    }
}

impl fmt::Display for Identifier {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Identifier::Numeric(v) => write!(f, "i={v}"),
            Identifier::String(v) => write!(f, "s={v}"),
            Identifier::Guid(v) => write!(f, "g={v}"),
            Identifier::Opaque(v) => write!(f, "b={v:?}"),
        }
    }
}

/// An identifier for a node in the address space of an OPC UA server.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct NodeId {
    /// The index of the namespace the node belongs to.
    pub namespace: u16,
    /// The identifier, unique within its namespace.
    pub identifier: Identifier,
}

impl NodeId {
    /// Create a new node id from a namespace index and an identifier.
    pub fn new(namespace: u16, identifier: impl Into<Identifier>) -> NodeId {
        NodeId {
            namespace,
            identifier: identifier.into(),
        }
    }

    /// The null node id, `ns=0;i=0`.
    pub fn null() -> NodeId {
        NodeId::default()
    }

    /// Whether this is the null node id.
    pub fn is_null(&self) -> bool {
        self.namespace == 0 && self.identifier == Identifier::Numeric(0)
    }

    /// Create a node id with a freshly generated GUID identifier.
    pub fn new_guid(namespace: u16) -> NodeId {
        NodeId {
            namespace,
            identifier: Identifier::Guid(Uuid::new_v4()),
        }
    }
}

impl fmt::Display for NodeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "ns={};{}", self.namespace, self.identifier)
    }
}

impl From<u32> for Identifier {
    fn from(v: u32) -> Self {
        Identifier::Numeric(v)
    }
}

impl From<i32> for Identifier {
    fn from(v: i32) -> Self {
        Identifier::Numeric(v as u32)
    }
}

impl From<&str> for Identifier {
    fn from(v: &str) -> Self {
        Identifier::String(v.to_string())
    }
}

impl From<String> for Identifier {
    fn from(v: String) -> Self {
        Identifier::String(v)
    }
}

impl From<Uuid> for Identifier {
    fn from(v: Uuid) -> Self {
        Identifier::Guid(v)
    }
}
