// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the definition of `DataValue`.

use serde::{Deserialize, Serialize};

use crate::{DateTimeUtc, StatusCode, Variant};

/// A value with an associated status code and timestamps, as carried by
/// data change notifications.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataValue {
    /// The value, absent when the status code alone is meaningful.
    pub value: Option<Variant>,
    /// The status associated with the value, absent means `Good`.
    pub status: Option<StatusCode>,
    /// The time the source produced the value.
    pub source_timestamp: Option<DateTimeUtc>,
    /// The time the server obtained the value.
    pub server_timestamp: Option<DateTimeUtc>,
}

impl DataValue {
    /// Create a value stamped with the current time.
    pub fn new_now(value: impl Into<Variant>) -> DataValue {
        DataValue::new_at(value, chrono::Utc::now())
    }

    /// Create a value stamped with the supplied time.
    pub fn new_at(value: impl Into<Variant>, time: DateTimeUtc) -> DataValue {
        DataValue {
            value: Some(value.into()),
            status: Some(StatusCode::Good),
            source_timestamp: Some(time),
            server_timestamp: Some(time),
        }
    }

    /// The status of the value, `Good` when unset.
    pub fn status(&self) -> StatusCode {
        self.status.unwrap_or(StatusCode::Good)
    }
}
