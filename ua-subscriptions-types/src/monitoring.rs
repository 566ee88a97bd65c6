// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Monitoring related enumerations and filters.

use serde::{Deserialize, Serialize};

use crate::{AttributeId, QualifiedName, StatusCode};

/// The monitoring mode of a monitored item.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum MonitoringMode {
    /// The item neither samples nor reports.
    Disabled,
    /// The item samples but queues nothing for publishing.
    Sampling,
    /// The item samples and reports notifications.
    Reporting,
}

/// Which timestamps the server should return with values.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum TimestampsToReturn {
    /// Source timestamp only.
    Source,
    /// Server timestamp only.
    Server,
    /// Both timestamps.
    #[default]
    Both,
    /// No timestamps.
    Neither,
}

/// The deadband applied by a data change filter.
#[derive(Debug, Copy, Clone, PartialEq, Serialize, Deserialize)]
pub enum DeadbandType {
    /// Report every change.
    None,
    /// Report changes exceeding an absolute delta.
    Absolute,
    /// Report changes exceeding a percentage of the node's EURange.
    Percent,
}

/// A filter restricting which samples or events a monitored item reports.
///
/// Filter internals (deadband evaluation, event select clauses) belong to
/// the sampling layer; the subscription engine only validates that a
/// filter is legal for the attribute being monitored.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub enum MonitoringFilter {
    /// No filtering.
    #[default]
    None,
    /// A data change filter with a deadband.
    DataChange {
        /// The deadband type.
        deadband_type: DeadbandType,
        /// The deadband value; absolute delta or percentage.
        deadband_value: f64,
    },
    /// An event filter selecting event fields.
    Event {
        /// Browse paths of the fields to select.
        select_clauses: Vec<QualifiedName>,
    },
}

impl MonitoringFilter {
    /// Validate this filter against the attribute it would be applied
    /// to. Failures surface their own status code through the create
    /// result.
    pub fn validate(&self, attribute_id: AttributeId) -> Result<(), StatusCode> {
        match self {
            MonitoringFilter::None => Ok(()),
            MonitoringFilter::DataChange { deadband_value, .. } => {
                if attribute_id != AttributeId::Value {
                    Err(StatusCode::BadFilterNotAllowed)
                } else if *deadband_value < 0.0 || !deadband_value.is_finite() {
                    Err(StatusCode::BadMonitoredItemFilterInvalid)
                } else {
                    Ok(())
                }
            }
            MonitoringFilter::Event { select_clauses } => {
                if attribute_id != AttributeId::EventNotifier {
                    Err(StatusCode::BadFilterNotAllowed)
                } else if select_clauses.is_empty() {
                    Err(StatusCode::BadMonitoredItemFilterInvalid)
                } else {
                    Ok(())
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{DeadbandType, MonitoringFilter};
    use crate::{AttributeId, StatusCode};

    #[test]
    fn data_change_filter_on_value_only() {
        let filter = MonitoringFilter::DataChange {
            deadband_type: DeadbandType::Absolute,
            deadband_value: 1.0,
        };
        assert!(filter.validate(AttributeId::Value).is_ok());
        assert_eq!(
            filter.validate(AttributeId::EventNotifier),
            Err(StatusCode::BadFilterNotAllowed)
        );
    }

    #[test]
    fn negative_deadband_rejected() {
        let filter = MonitoringFilter::DataChange {
            deadband_type: DeadbandType::Absolute,
            deadband_value: -1.0,
        };
        assert_eq!(
            filter.validate(AttributeId::Value),
            Err(StatusCode::BadMonitoredItemFilterInvalid)
        );
    }

    #[test]
    fn event_filter_needs_select_clauses() {
        let filter = MonitoringFilter::Event {
            select_clauses: vec![],
        };
        assert_eq!(
            filter.validate(AttributeId::EventNotifier),
            Err(StatusCode::BadMonitoredItemFilterInvalid)
        );
    }
}
