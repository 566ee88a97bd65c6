// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The contract between a subscription and its monitored items. Sampling
//! internals live behind this trait; the subscription only drains
//! accumulated notifications and steers the monitoring mode.

use subscription_types::{MonitoringMode, Notification};

/// A monitored item as seen from its owning subscription.
///
/// Items are disposed by dropping them; a subscription calls
/// [`MonitoredItem::terminate`] first so the item can stop sampling.
pub trait MonitoredItem: Send {
    /// The server assigned id of the item, unique across subscriptions.
    fn id(&self) -> u32;

    /// The client supplied handle returned in notifications.
    fn client_handle(&self) -> u32;

    /// The current monitoring mode.
    fn monitoring_mode(&self) -> MonitoringMode;

    /// The revised sampling interval in milliseconds.
    fn sampling_interval(&self) -> f64;

    /// The revised notification queue depth.
    fn queue_size(&self) -> usize;

    /// Whether the item has notifications waiting to be harvested.
    fn has_notifications(&self) -> bool;

    /// Drain the accumulated notifications in arrival order.
    fn extract_notifications(&mut self) -> Vec<Notification>;

    /// Change the monitoring mode.
    fn set_monitoring_mode(&mut self, mode: MonitoringMode);

    /// Stop sampling. Called once, before the item is dropped.
    fn terminate(&mut self);
}

/// Parameters handed to a [`MonitoredItemFactory`] after validation and
/// revision.
#[derive(Debug, Clone)]
pub struct CreateMonitoredItemContext {
    /// The server assigned id for the new item.
    pub monitored_item_id: u32,
    /// The subscription the item will belong to.
    pub subscription_id: u32,
    /// The client supplied handle.
    pub client_handle: u32,
    /// The sampling interval the item must use, in milliseconds.
    pub revised_sampling_interval: f64,
    /// The queue depth the item must use.
    pub revised_queue_size: usize,
    /// Whether the oldest notification is discarded on queue overflow.
    pub discard_oldest: bool,
}

/// Constructs monitored items once the subscription has validated the
/// request. The sampling layer implements this.
pub trait MonitoredItemFactory {
    /// Build an item from the revised parameters.
    fn create(&mut self, context: &CreateMonitoredItemContext) -> Box<dyn MonitoredItem>;
}
