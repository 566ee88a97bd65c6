// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the definition of `AttributeId`.

use serde::{Deserialize, Serialize};

use crate::StatusCode;

/// The attributes a node may have, per OPC UA Part 3.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(u32)]
pub enum AttributeId {
    /// The node id attribute.
    NodeId = 1,
    /// The node class attribute.
    NodeClass = 2,
    /// The browse name attribute.
    BrowseName = 3,
    /// The display name attribute.
    DisplayName = 4,
    /// The description attribute.
    Description = 5,
    /// The write mask attribute.
    WriteMask = 6,
    /// The user write mask attribute.
    UserWriteMask = 7,
    /// The is-abstract attribute.
    IsAbstract = 8,
    /// The symmetric attribute.
    Symmetric = 9,
    /// The inverse name attribute.
    InverseName = 10,
    /// The contains-no-loops attribute.
    ContainsNoLoops = 11,
    /// The event notifier attribute; monitored for events.
    EventNotifier = 12,
    /// The value attribute; monitored for data changes.
    Value = 13,
    /// The data type attribute.
    DataType = 14,
    /// The value rank attribute.
    ValueRank = 15,
    /// The array dimensions attribute.
    ArrayDimensions = 16,
    /// The access level attribute.
    AccessLevel = 17,
    /// The user access level attribute.
    UserAccessLevel = 18,
    /// The minimum sampling interval attribute.
    MinimumSamplingInterval = 19,
    /// The historizing attribute.
    Historizing = 20,
    /// The executable attribute.
    Executable = 21,
    /// The user executable attribute.
    UserExecutable = 22,
}

impl AttributeId {
    /// Parse an attribute id from its numeric service representation.
    /// Values outside the defined range fail with
    /// `BadAttributeIdInvalid`.
    pub fn from_u32(value: u32) -> Result<AttributeId, StatusCode> {
        let id = match value {
            1 => AttributeId::NodeId,
            2 => AttributeId::NodeClass,
            3 => AttributeId::BrowseName,
            4 => AttributeId::DisplayName,
            5 => AttributeId::Description,
            6 => AttributeId::WriteMask,
            7 => AttributeId::UserWriteMask,
            8 => AttributeId::IsAbstract,
            9 => AttributeId::Symmetric,
            10 => AttributeId::InverseName,
            11 => AttributeId::ContainsNoLoops,
            12 => AttributeId::EventNotifier,
            13 => AttributeId::Value,
            14 => AttributeId::DataType,
            15 => AttributeId::ValueRank,
            16 => AttributeId::ArrayDimensions,
            17 => AttributeId::AccessLevel,
            18 => AttributeId::UserAccessLevel,
            19 => AttributeId::MinimumSamplingInterval,
            20 => AttributeId::Historizing,
            21 => AttributeId::Executable,
            22 => AttributeId::UserExecutable,
            _ => return Err(StatusCode::BadAttributeIdInvalid),
        };
        Ok(id)
    }
}
