// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Service parameter types for creating monitored items.

use serde::{Deserialize, Serialize};

use crate::{MonitoringFilter, MonitoringMode, NodeId, QualifiedName, StatusCode};

/// Identifies the attribute of a node that a service operates on.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReadValueId {
    /// The node to read or monitor.
    pub node_id: NodeId,
    /// The attribute, as its raw numeric service value.
    pub attribute_id: u32,
    /// The index range string, empty for none.
    pub index_range: String,
    /// The requested data encoding, null for the default.
    pub data_encoding: QualifiedName,
}

impl ReadValueId {
    /// Monitor the value attribute of a node with no range or encoding.
    pub fn value_of(node_id: NodeId) -> ReadValueId {
        ReadValueId {
            node_id,
            attribute_id: crate::AttributeId::Value as u32,
            index_range: String::new(),
            data_encoding: QualifiedName::null(),
        }
    }

    /// Monitor the event notifier attribute of a node.
    pub fn events_of(node_id: NodeId) -> ReadValueId {
        ReadValueId {
            node_id,
            attribute_id: crate::AttributeId::EventNotifier as u32,
            index_range: String::new(),
            data_encoding: QualifiedName::null(),
        }
    }
}

/// Client requested monitoring parameters.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoringParameters {
    /// The client supplied handle returned in notifications.
    pub client_handle: u32,
    /// The requested sampling interval in milliseconds. Negative means
    /// the publishing interval; zero means the fastest the node allows.
    pub sampling_interval: f64,
    /// The requested notification queue depth.
    pub queue_size: u32,
    /// Whether the oldest notification is discarded on queue overflow.
    pub discard_oldest: bool,
    /// The monitoring filter.
    pub filter: MonitoringFilter,
}

impl Default for MonitoringParameters {
    fn default() -> Self {
        MonitoringParameters {
            client_handle: 0,
            sampling_interval: -1.0,
            queue_size: 1,
            discard_oldest: true,
            filter: MonitoringFilter::None,
        }
    }
}

/// A request to create one monitored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateRequest {
    /// What to monitor.
    pub item_to_monitor: ReadValueId,
    /// The initial monitoring mode.
    pub monitoring_mode: MonitoringMode,
    /// The requested parameters.
    pub requested_parameters: MonitoringParameters,
}

/// The per item result of a create monitored items operation.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemCreateResult {
    /// The outcome for this item.
    pub status_code: StatusCode,
    /// The server assigned item id, zero on failure.
    pub monitored_item_id: u32,
    /// The sampling interval the server will actually use.
    pub revised_sampling_interval: f64,
    /// The queue size the server will actually use.
    pub revised_queue_size: u32,
    /// The revised filter, when the filter was adjusted.
    pub filter_result: MonitoringFilter,
}

impl MonitoredItemCreateResult {
    /// An error result carrying only a status code.
    pub fn error(status_code: StatusCode) -> MonitoredItemCreateResult {
        MonitoredItemCreateResult {
            status_code,
            monitored_item_id: 0,
            revised_sampling_interval: 0.0,
            revised_queue_size: 0,
            filter_result: MonitoringFilter::None,
        }
    }
}
