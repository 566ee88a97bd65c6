// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

#![warn(missing_docs)]

//! In-memory renditions of the OPC UA data types consumed by the
//! subscription engine: status codes, node identifiers, variants, and the
//! notification model of OPC UA Part 4. Wire-level encoding is out of
//! scope here; these types exist to be manipulated by the server and
//! handed to a publish engine.

mod attribute;
mod byte_string;
mod data_value;
mod localized_text;
mod monitoring;
mod node_id;
mod notification;
mod numeric_range;
mod qualified_name;
mod service;
mod status_code;
mod variant;

pub use attribute::AttributeId;
pub use byte_string::ByteString;
pub use data_value::DataValue;
pub use localized_text::LocalizedText;
pub use monitoring::{DeadbandType, MonitoringFilter, MonitoringMode, TimestampsToReturn};
pub use node_id::{Identifier, NodeId};
pub use notification::{
    DataChangeNotification, EventFieldList, EventNotificationList, MonitoredItemNotification,
    Notification, NotificationData, NotificationMessage, StatusChangeNotification,
};
pub use numeric_range::NumericRange;
pub use qualified_name::QualifiedName;
pub use service::{
    MonitoredItemCreateRequest, MonitoredItemCreateResult, MonitoringParameters, ReadValueId,
};
pub use status_code::StatusCode;
pub use variant::Variant;

/// UTC timestamp used throughout the subscription engine.
pub type DateTimeUtc = chrono::DateTime<chrono::Utc>;
