// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The notification model of OPC UA Part 4: the sequenced
//! `NotificationMessage` envelope and the notification payloads it can
//! carry.

use serde::{Deserialize, Serialize};

use crate::{DataValue, DateTimeUtc, StatusCode, Variant};

/// A single data change produced by a monitored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MonitoredItemNotification {
    /// The client supplied handle of the monitored item.
    pub client_handle: u32,
    /// The changed value.
    pub value: DataValue,
}

/// The selected fields of a single event produced by a monitored item.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EventFieldList {
    /// The client supplied handle of the monitored item.
    pub client_handle: u32,
    /// The field values, in select clause order.
    pub event_fields: Vec<Variant>,
}

/// A notification element extracted from a monitored item. Consumers
/// partition on the variant.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Notification {
    /// A data change notification element.
    DataChange(MonitoredItemNotification),
    /// An event notification element.
    Event(EventFieldList),
}

/// A list of data changes bound for one notification message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct DataChangeNotification {
    /// The data changes, in harvest order.
    pub monitored_items: Vec<MonitoredItemNotification>,
}

/// A list of events bound for one notification message.
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct EventNotificationList {
    /// The events, in harvest order.
    pub events: Vec<EventFieldList>,
}

/// Notifies the client of a change in the status of the subscription
/// itself, e.g. expiration or transfer.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StatusChangeNotification {
    /// The new status of the subscription.
    pub status: StatusCode,
}

/// One notification payload within a notification message.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum NotificationData {
    /// A batch of data changes.
    DataChange(DataChangeNotification),
    /// A batch of events.
    Events(EventNotificationList),
    /// A subscription status change.
    StatusChange(StatusChangeNotification),
}

/// A sequenced message carrying notifications to the client. A harvested
/// message holds one or two payloads (data changes and/or events); a
/// status change message holds exactly one; a keep alive holds none.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct NotificationMessage {
    /// The sequence number allocated to this message.
    pub sequence_number: u32,
    /// The time the message was prepared for publishing.
    pub publish_time: DateTimeUtc,
    /// The notification payloads.
    pub notification_data: Vec<NotificationData>,
}

impl NotificationMessage {
    /// Create a message from harvested data changes and events. The data
    /// change payload, when present, precedes the event payload.
    pub fn data_change(
        sequence_number: u32,
        publish_time: DateTimeUtc,
        data_changes: Vec<MonitoredItemNotification>,
        events: Vec<EventFieldList>,
    ) -> NotificationMessage {
        debug_assert!(!data_changes.is_empty() || !events.is_empty());
        let mut notification_data = Vec::with_capacity(2);
        if !data_changes.is_empty() {
            notification_data.push(NotificationData::DataChange(DataChangeNotification {
                monitored_items: data_changes,
            }));
        }
        if !events.is_empty() {
            notification_data.push(NotificationData::Events(EventNotificationList { events }));
        }
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data,
        }
    }

    /// Create a status change message.
    pub fn status_change(
        sequence_number: u32,
        publish_time: DateTimeUtc,
        status: StatusCode,
    ) -> NotificationMessage {
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: vec![NotificationData::StatusChange(StatusChangeNotification {
                status,
            })],
        }
    }

    /// Create a keep alive message. The sequence number is the next one
    /// that will be allocated, not a consumed value.
    pub fn keep_alive(sequence_number: u32, publish_time: DateTimeUtc) -> NotificationMessage {
        NotificationMessage {
            sequence_number,
            publish_time,
            notification_data: Vec::new(),
        }
    }

    /// Total number of notification elements across all payloads.
    pub fn notification_count(&self) -> usize {
        self.notification_data
            .iter()
            .map(|data| match data {
                NotificationData::DataChange(dc) => dc.monitored_items.len(),
                NotificationData::Events(ev) => ev.events.len(),
                NotificationData::StatusChange(_) => 1,
            })
            .sum()
    }
}

#[cfg(test)]
mod tests {
    use super::{MonitoredItemNotification, NotificationData, NotificationMessage};
    use crate::{DataValue, StatusCode};

    fn data_change(client_handle: u32) -> MonitoredItemNotification {
        MonitoredItemNotification {
            client_handle,
            value: DataValue::new_now(1i32),
        }
    }

    #[test]
    fn data_change_payload_order() {
        let msg = NotificationMessage::data_change(
            1,
            chrono::Utc::now(),
            vec![data_change(1), data_change(2)],
            vec![crate::EventFieldList {
                client_handle: 3,
                event_fields: vec![],
            }],
        );
        assert_eq!(msg.notification_data.len(), 2);
        assert!(matches!(
            msg.notification_data[0],
            NotificationData::DataChange(_)
        ));
        assert!(matches!(
            msg.notification_data[1],
            NotificationData::Events(_)
        ));
        assert_eq!(msg.notification_count(), 3);
    }

    #[test]
    fn keep_alive_has_no_payload() {
        let msg = NotificationMessage::keep_alive(5, chrono::Utc::now());
        assert!(msg.notification_data.is_empty());
        assert_eq!(msg.notification_count(), 0);
    }

    #[test]
    fn status_change_payload() {
        let msg = NotificationMessage::status_change(2, chrono::Utc::now(), StatusCode::BadTimeout);
        assert_eq!(msg.notification_data.len(), 1);
        let NotificationData::StatusChange(ref sc) = msg.notification_data[0] else {
            panic!("expected status change");
        };
        assert_eq!(sc.status, StatusCode::BadTimeout);
    }
}
