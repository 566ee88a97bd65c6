// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the definition of `ByteString`.

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// A sequence of octets, distinct from a string. A byte string can be
/// null, which is distinct from being empty.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct ByteString {
    /// The raw bytes, `None` for the null byte string.
    pub value: Option<Vec<u8>>,
}

impl ByteString {
    /// The null byte string.
    pub fn null() -> ByteString {
        ByteString { value: None }
    }

    /// Whether this is the null byte string.
    pub fn is_null(&self) -> bool {
        self.value.is_none()
    }

    /// Whether this byte string is null or has zero length.
    pub fn is_null_or_empty(&self) -> bool {
        self.value.as_ref().map(|v| v.is_empty()).unwrap_or(true)
    }

    /// A freshly generated 16 byte random value, suitable for event ids.
    pub fn random() -> ByteString {
        ByteString::from(Uuid::new_v4().as_bytes().to_vec())
    }

    /// The bytes of the value, an empty slice when null.
    pub fn as_ref(&self) -> &[u8] {
        self.value.as_deref().unwrap_or(&[])
    }
}

impl From<Vec<u8>> for ByteString {
    fn from(value: Vec<u8>) -> Self {
        ByteString { value: Some(value) }
    }
}

impl From<&[u8]> for ByteString {
    fn from(value: &[u8]) -> Self {
        ByteString {
            value: Some(value.to_vec()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::ByteString;

    #[test]
    fn null_and_empty() {
        assert!(ByteString::null().is_null());
        assert!(ByteString::null().is_null_or_empty());
        assert!(ByteString::from(vec![]).is_null_or_empty());
        assert!(!ByteString::from(vec![]).is_null());
        assert!(!ByteString::from(vec![1u8]).is_null_or_empty());
    }

    #[test]
    fn random_ids_differ() {
        assert_ne!(ByteString::random(), ByteString::random());
        assert_eq!(ByteString::random().as_ref().len(), 16);
    }
}
