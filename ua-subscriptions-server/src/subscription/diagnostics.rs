//! Live diagnostics counters for one subscription.

use serde::Serialize;

/// Counters reflecting the runtime state of a subscription. Users with
/// appropriate permissions can read a serialized snapshot; the
/// subscription updates the counters as it runs and stops exposing them
/// once it terminates.
#[derive(Debug, Clone, Default, Serialize)]
pub struct SubscriptionDiagnostics {
    /// The id of the subscription.
    pub subscription_id: u32,
    /// The relative priority of the subscription.
    pub priority: u8,
    /// The revised publishing interval in milliseconds.
    pub publishing_interval_ms: f64,
    /// The revised max keep alive count.
    pub max_keep_alive_count: u32,
    /// The revised lifetime count.
    pub max_lifetime_count: u32,
    /// The revised max notifications per publish, zero for unlimited.
    pub max_notifications_per_publish: u32,
    /// Whether publishing is enabled.
    pub publishing_enabled: bool,
    /// The number of publishing timer expirations.
    pub publish_interval_count: u32,
    /// The number of notification messages sent.
    pub notification_message_count: u32,
    /// The number of data change notification elements sent.
    pub data_change_notifications_count: u32,
    /// The number of event notification elements sent.
    pub event_notifications_count: u32,
    /// The number of keep alive responses sent.
    pub keep_alive_count: u32,
    /// The number of ticks the subscription found itself late.
    pub late_publish_request_count: u32,
    /// Sent messages not yet acknowledged by the client.
    pub unacknowledged_message_count: u32,
    /// The number of monitored items owned by the subscription.
    pub monitored_item_count: u32,
    /// The number of monitored items with monitoring disabled.
    pub disabled_monitored_item_count: u32,
    /// Whether the counters are still being updated. Cleared when the
    /// subscription terminates.
    pub exposed: bool,
}

impl SubscriptionDiagnostics {
    pub(crate) fn on_publish_interval(&mut self) {
        self.publish_interval_count += 1;
    }

    pub(crate) fn on_notification_message(&mut self, data_changes: u32, events: u32) {
        self.notification_message_count += 1;
        self.data_change_notifications_count += data_changes;
        self.event_notifications_count += events;
    }

    pub(crate) fn on_keep_alive(&mut self) {
        self.keep_alive_count += 1;
    }

    pub(crate) fn on_late(&mut self) {
        self.late_publish_request_count += 1;
    }

    pub(crate) fn set_unacknowledged_message_count(&mut self, count: u32) {
        self.unacknowledged_message_count = count;
    }

    pub(crate) fn set_monitored_item_counts(&mut self, total: u32, disabled: u32) {
        self.monitored_item_count = total;
        self.disabled_monitored_item_count = disabled;
    }

    pub(crate) fn unexpose(&mut self) {
        self.exposed = false;
    }
}

#[cfg(test)]
mod tests {
    use super::SubscriptionDiagnostics;

    #[test]
    fn counters_accumulate() {
        let mut diagnostics = SubscriptionDiagnostics {
            exposed: true,
            ..Default::default()
        };
        diagnostics.on_publish_interval();
        diagnostics.on_publish_interval();
        diagnostics.on_notification_message(3, 1);
        diagnostics.on_keep_alive();
        diagnostics.set_unacknowledged_message_count(1);

        assert_eq!(diagnostics.publish_interval_count, 2);
        assert_eq!(diagnostics.notification_message_count, 1);
        assert_eq!(diagnostics.data_change_notifications_count, 3);
        assert_eq!(diagnostics.event_notifications_count, 1);
        assert_eq!(diagnostics.keep_alive_count, 1);
        assert_eq!(diagnostics.unacknowledged_message_count, 1);

        diagnostics.unexpose();
        assert!(!diagnostics.exposed);
    }

    #[test]
    fn serializes_to_json() {
        let diagnostics = SubscriptionDiagnostics {
            subscription_id: 7,
            exposed: true,
            ..Default::default()
        };
        let value = serde_json::to_value(&diagnostics).unwrap();
        assert_eq!(value["subscription_id"], 7);
        assert_eq!(value["exposed"], true);
    }
}
