// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the definition of `QualifiedName`.

use std::fmt;

use serde::{Deserialize, Serialize};

/// A name qualified by a namespace index, e.g. a browse name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct QualifiedName {
    /// The index of the namespace the name belongs to.
    pub namespace_index: u16,
    /// The unqualified name.
    pub name: String,
}

impl QualifiedName {
    /// Create a new QualifiedName.
    pub fn new(namespace_index: u16, name: impl Into<String>) -> QualifiedName {
        QualifiedName {
            namespace_index,
            name: name.into(),
        }
    }

    /// Create a null QualifiedName.
    pub fn null() -> QualifiedName {
        QualifiedName::default()
    }

    /// Whether the name is empty and the namespace index zero.
    pub fn is_null(&self) -> bool {
        self.namespace_index == 0 && self.name.is_empty()
    }
}

impl From<&str> for QualifiedName {
    fn from(value: &str) -> Self {
        QualifiedName {
            namespace_index: 0,
            name: value.to_string(),
        }
    }
}

impl fmt::Display for QualifiedName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.namespace_index == 0 {
            write!(f, "{}", self.name)
        } else {
            write!(f, "{}:{}", self.namespace_index, self.name)
        }
    }
}
