// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The seam between subscriptions and the publish engine that owns the
//! client's queued publish requests and performs the wire level send.
//!
//! The engine may deliver further publish requests re-entrantly while a
//! send is in progress, so the subscription evaluates its pre and post
//! conditions around each call instead of assuming the queue is frozen.

use subscription_types::NotificationMessage;

/// A notification message handed to the publish engine together with the
/// response metadata the engine needs.
#[derive(Debug, Clone, PartialEq)]
pub struct PublishedNotification {
    /// The subscription the message belongs to.
    pub subscription_id: u32,
    /// The message, already sequenced.
    pub message: NotificationMessage,
    /// Whether further messages are already queued behind this one.
    pub more_notifications: bool,
    /// The sequence numbers currently held for retransmission,
    /// including this message.
    pub available_sequence_numbers: Vec<u32>,
}

/// The publish engine as seen from a subscription.
///
/// The send methods return whether a queued publish request was consumed
/// to carry the response.
pub trait PublishEngine {
    /// Number of publish requests queued and not yet consumed.
    fn pending_publish_request_count(&self) -> usize;

    /// Send a notification message. `initial` is set when the message is
    /// the first communication on this subscription for the session,
    /// e.g. the status change sent to the old session on transfer.
    fn send_notification_message(
        &mut self,
        notification: PublishedNotification,
        initial: bool,
    ) -> bool;

    /// Send a keep alive response carrying the sequence number the next
    /// real message will use.
    fn send_keep_alive_response(&mut self, subscription_id: u32, future_sequence_number: u32)
        -> bool;

    /// The subscription has closed and will not call again.
    fn on_close_subscription(&mut self, subscription_id: u32);

    /// Hook invoked once per subscription tick.
    fn on_tick(&mut self) {}
}
