// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Acknowledgeable conditions: the state overlay OPC UA Part 9 layers on
//! top of event notifications. A condition carries per branch
//! acknowledged / confirmed / retained state in two state variables;
//! operator actions raise audit events through the same notification
//! pipeline.

mod acknowledgeable;
mod audit;
mod snapshot;
mod two_state;

pub use acknowledgeable::{AcknowledgeableCondition, ConditionError};
pub use audit::{
    AuditConditionAcknowledgeEventType, AuditConditionCommentEventType,
    AuditConditionConfirmEventType, AuditConditionEvent, AuditConditionEventType,
};
pub use snapshot::{ConditionEventSink, ConditionSnapshot, ConditionVariable};
pub use two_state::TwoStateVariable;
