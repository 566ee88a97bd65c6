//! The subscription state machine: the periodic publishing cycle, keep
//! alive and lifetime handling, notification assembly, and publish
//! request reconciliation, per OPC UA Part 4 5.13.

use std::collections::VecDeque;
use std::time::Duration;

use hashbrown::HashMap;
use tracing::{debug, info, trace, warn};

use subscription_types::{
    AttributeId, DateTimeUtc, EventFieldList, MonitoredItemCreateRequest,
    MonitoredItemCreateResult, MonitoredItemNotification, MonitoringMode, NodeId, Notification,
    NotificationMessage, NumericRange, ReadValueId, StatusCode,
};

use crate::{
    address_space::{NodeClass, NodeDirectory, NodeSummary},
    constants,
    monitored_item::{CreateMonitoredItemContext, MonitoredItem, MonitoredItemFactory},
    publish::{PublishEngine, PublishedNotification},
};

use super::{
    diagnostics::SubscriptionDiagnostics, retransmission::RetransmissionQueue,
    sequence_number::SequenceNumberGenerator, set::MonitoredItemIdHandle,
};

/// The state of the subscription.
///
/// `Closed` and `Terminated` are terminal: once either is entered, only
/// terminal states follow and ticks do nothing. A self terminated
/// subscription passes through `Terminated` on its way to `Closed`
/// within the same tick.
#[derive(Debug, Copy, Clone, PartialEq, Eq, serde::Serialize)]
pub enum SubscriptionState {
    /// Torn down; timer inactive and no monitored items remain.
    Closed,
    /// Initial state; the first tick creates the first message.
    Creating,
    /// Periodic harvesting; the keep alive counter is inactive.
    Normal,
    /// The publishing interval elapsed with material to send but no
    /// publish request available. The next arriving publish request is
    /// serviced immediately.
    Late,
    /// Idle; counting down to a forced keep alive.
    KeepAlive,
    /// Terminated by lifetime expiration, teardown in progress.
    Terminated,
}

/// Why a tick is being processed.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum TickReason {
    /// The publishing timer fired.
    TickTimerFired,
    /// A publish request arrived from the client.
    ReceivedPublishRequest,
}

/// What a tick left behind for the scheduler.
#[derive(Debug, Copy, Clone, Default)]
pub struct TickResult {
    /// More notification messages are queued and the subscription is in
    /// the normal state: the caller should schedule an immediate extra
    /// tick to drain them back to back.
    pub more_to_send: bool,
}

/// Subscription parameters as requested by the client, before revision.
#[derive(Debug, Copy, Clone)]
pub struct RequestedSubscriptionParameters {
    /// Requested publishing interval in milliseconds. NaN requests the
    /// server default.
    pub publishing_interval_ms: f64,
    /// Requested lifetime count.
    pub lifetime_count: u32,
    /// Requested max keep alive count.
    pub max_keep_alive_count: u32,
    /// Requested max notifications per publish, zero for unlimited.
    pub max_notifications_per_publish: u32,
    /// Requested priority.
    pub priority: u8,
    /// Whether publishing starts enabled.
    pub publishing_enabled: bool,
}

impl Default for RequestedSubscriptionParameters {
    fn default() -> Self {
        RequestedSubscriptionParameters {
            publishing_interval_ms: f64::NAN,
            lifetime_count: 1,
            max_keep_alive_count: constants::MIN_KEEP_ALIVE_COUNT,
            max_notifications_per_publish: 0,
            priority: 0,
            publishing_enabled: true,
        }
    }
}

/// Revised subscription parameters, as the subscription runs with them.
#[derive(Debug, Copy, Clone, PartialEq)]
pub struct SubscriptionParameters {
    /// The publishing interval.
    pub publishing_interval: Duration,
    /// Publishing timer expirations without client activity before the
    /// subscription terminates itself.
    pub lifetime_count: u32,
    /// Idle publishing timer expirations before a keep alive is forced.
    pub max_keep_alive_count: u32,
    /// Most notification elements of one kind per message, zero for
    /// unlimited.
    pub max_notifications_per_publish: u32,
    /// Relative priority against the session's other subscriptions.
    pub priority: u8,
    /// Whether publishing is enabled.
    pub publishing_enabled: bool,
}

impl SubscriptionParameters {
    /// Revise requested parameters to the ranges the server supports:
    /// the publishing interval is clamped to [50 ms, 15 days] with a
    /// default of one second, the keep alive count to [2, 12000], and
    /// the lifetime count raised to at least three keep alive periods
    /// and at least five seconds of wall clock.
    pub fn revise(requested: &RequestedSubscriptionParameters) -> SubscriptionParameters {
        let publishing_interval_ms = if requested.publishing_interval_ms.is_nan() {
            constants::DEFAULT_PUBLISHING_INTERVAL_MS
        } else {
            requested.publishing_interval_ms
        }
        .clamp(
            constants::MIN_PUBLISHING_INTERVAL_MS,
            constants::MAX_PUBLISHING_INTERVAL_MS,
        );
        let max_keep_alive_count = requested
            .max_keep_alive_count
            .clamp(constants::MIN_KEEP_ALIVE_COUNT, constants::MAX_KEEP_ALIVE_COUNT);
        let min_lifetime_count =
            (constants::MIN_LIFETIME_DURATION_MS / publishing_interval_ms).ceil() as u32;
        let lifetime_count = requested
            .lifetime_count
            .max(1)
            .max(3 * max_keep_alive_count)
            .max(min_lifetime_count);
        SubscriptionParameters {
            publishing_interval: Duration::from_micros((publishing_interval_ms * 1000.0) as u64),
            lifetime_count,
            max_keep_alive_count,
            max_notifications_per_publish: requested.max_notifications_per_publish,
            priority: requested.priority,
            publishing_enabled: requested.publishing_enabled,
        }
    }
}

/// Receives the events a subscription raises synchronously from its
/// transition sites. All methods default to doing nothing; implement the
/// ones you care about.
#[allow(unused_variables)]
pub trait SubscriptionObserver: Send {
    /// Notifications were harvested into the pending queue.
    fn on_notification(&mut self, subscription_id: u32) {}

    /// A notification message was handed to the publish engine.
    fn on_notification_message(&mut self, message: &NotificationMessage) {}

    /// A keep alive was sent carrying the future sequence number.
    fn on_keep_alive(&mut self, future_sequence_number: u32) {}

    /// The subscription's lifetime expired.
    fn on_expired(&mut self, subscription_id: u32) {}

    /// The subscription terminated.
    fn on_terminated(&mut self, subscription_id: u32) {}

    /// A monitored item was created on the subscription.
    fn on_monitored_item_created(&mut self, item_id: u32, item_to_monitor: &ReadValueId) {}

    /// A monitored item was removed from the subscription.
    fn on_monitored_item_removed(&mut self, item_id: u32) {}
}

struct NullObserver;

impl SubscriptionObserver for NullObserver {}

/// A server side subscription: owns its monitored items, assembles and
/// sequences notification messages, reconciles them with the publish
/// engine's queued publish requests, and terminates itself when its
/// lifetime expires.
pub struct Subscription {
    subscription_id: u32,
    session_id: NodeId,
    publishing_interval: Duration,
    lifetime_count: u32,
    max_keep_alive_count: u32,
    max_notifications_per_publish: u32,
    priority: u8,
    publishing_enabled: bool,
    /// Set once either a notification message or a keep alive has been
    /// sent, so that one of the two goes out the first time the
    /// publishing timer expires.
    message_sent: bool,
    aborted: bool,
    state: SubscriptionState,
    lifetime_counter: u32,
    keep_alive_counter: u32,
    sequence_numbers: SequenceNumberGenerator,
    pending: VecDeque<NotificationMessage>,
    sent: RetransmissionQueue,
    monitored_items: HashMap<u32, Box<dyn MonitoredItem>>,
    item_ids: MonitoredItemIdHandle,
    /// Lazily computed "some item has notifications" flag, reset on each
    /// harvest.
    has_item_notifications: bool,
    diagnostics: SubscriptionDiagnostics,
    observer: Box<dyn SubscriptionObserver>,
}

impl Subscription {
    /// Create a subscription from already revised parameters. Service
    /// layers revise client input with [`SubscriptionParameters::revise`]
    /// first.
    pub fn new(
        subscription_id: u32,
        session_id: NodeId,
        parameters: SubscriptionParameters,
        item_ids: MonitoredItemIdHandle,
    ) -> Subscription {
        let diagnostics = SubscriptionDiagnostics {
            subscription_id,
            priority: parameters.priority,
            publishing_interval_ms: parameters.publishing_interval.as_secs_f64() * 1000.0,
            max_keep_alive_count: parameters.max_keep_alive_count,
            max_lifetime_count: parameters.lifetime_count,
            max_notifications_per_publish: parameters.max_notifications_per_publish,
            publishing_enabled: parameters.publishing_enabled,
            exposed: true,
            ..Default::default()
        };
        Subscription {
            subscription_id,
            session_id,
            publishing_interval: parameters.publishing_interval,
            lifetime_count: parameters.lifetime_count,
            max_keep_alive_count: parameters.max_keep_alive_count,
            max_notifications_per_publish: parameters.max_notifications_per_publish,
            priority: parameters.priority,
            publishing_enabled: parameters.publishing_enabled,
            message_sent: false,
            aborted: false,
            state: SubscriptionState::Creating,
            lifetime_counter: 0,
            keep_alive_counter: 0,
            sequence_numbers: SequenceNumberGenerator::new(),
            pending: VecDeque::new(),
            sent: RetransmissionQueue::new(),
            monitored_items: HashMap::with_capacity(constants::DEFAULT_MONITORED_ITEM_CAPACITY),
            item_ids,
            has_item_notifications: false,
            diagnostics,
            observer: Box::new(NullObserver),
        }
    }

    /// Install the observer receiving this subscription's events.
    pub fn set_observer(&mut self, observer: Box<dyn SubscriptionObserver>) {
        self.observer = observer;
    }

    /// The subscription id.
    pub fn id(&self) -> u32 {
        self.subscription_id
    }

    /// The id of the session the subscription currently belongs to.
    pub fn session_id(&self) -> &NodeId {
        &self.session_id
    }

    /// The current state.
    pub fn state(&self) -> SubscriptionState {
        self.state
    }

    /// Whether the state is terminal.
    pub fn is_terminal(&self) -> bool {
        matches!(
            self.state,
            SubscriptionState::Closed | SubscriptionState::Terminated
        )
    }

    /// The revised publishing interval.
    pub fn publishing_interval(&self) -> Duration {
        self.publishing_interval
    }

    /// The revised lifetime count.
    pub fn lifetime_count(&self) -> u32 {
        self.lifetime_count
    }

    /// The revised max keep alive count.
    pub fn max_keep_alive_count(&self) -> u32 {
        self.max_keep_alive_count
    }

    /// The revised max notifications per publish, zero for unlimited.
    pub fn max_notifications_per_publish(&self) -> u32 {
        self.max_notifications_per_publish
    }

    /// The subscription priority.
    pub fn priority(&self) -> u8 {
        self.priority
    }

    /// Whether publishing is enabled.
    pub fn publishing_enabled(&self) -> bool {
        self.publishing_enabled
    }

    /// Whether a message or keep alive has been sent yet.
    pub fn message_sent(&self) -> bool {
        self.message_sent
    }

    /// Whether the owning session reported itself aborted.
    pub fn aborted(&self) -> bool {
        self.aborted
    }

    /// Record that the owning session aborted. The subscription keeps
    /// counting lifetime normally.
    pub fn set_aborted(&mut self) {
        self.aborted = true;
    }

    /// The number of monitored items.
    pub fn len(&self) -> usize {
        self.monitored_items.len()
    }

    /// Whether the subscription has no monitored items.
    pub fn is_empty(&self) -> bool {
        self.monitored_items.is_empty()
    }

    /// Look up a monitored item by id.
    pub fn monitored_item(&self, monitored_item_id: u32) -> Option<&dyn MonitoredItem> {
        self.monitored_items
            .get(&monitored_item_id)
            .map(|item| item.as_ref())
    }

    /// The current lifetime counter value.
    pub fn lifetime_counter(&self) -> u32 {
        self.lifetime_counter
    }

    /// The current keep alive counter value.
    pub fn keep_alive_counter(&self) -> u32 {
        self.keep_alive_counter
    }

    /// Time left until the subscription expires if no client activity
    /// resets its lifetime.
    pub fn time_to_expiration(&self) -> Duration {
        let remaining = self.lifetime_count.saturating_sub(self.lifetime_counter);
        self.publishing_interval * remaining
    }

    /// Whether assembled messages are waiting to be sent.
    pub fn has_pending_notifications(&self) -> bool {
        !self.pending.is_empty()
    }

    /// Sent messages not yet acknowledged by the client.
    pub fn unacknowledged_message_count(&self) -> usize {
        self.sent.len()
    }

    /// The sequence numbers currently held for retransmission.
    pub fn available_sequence_numbers(&self) -> Vec<u32> {
        self.sent.sequence_numbers()
    }

    /// The sequence number the next notification message will use.
    pub fn future_sequence_number(&self) -> u32 {
        self.sequence_numbers.future()
    }

    /// The live diagnostics of the subscription.
    pub fn diagnostics(&self) -> &SubscriptionDiagnostics {
        &self.diagnostics
    }

    /// Whether any monitored item in reporting mode has notifications
    /// waiting. The result is cached until the next harvest.
    pub fn has_monitored_item_notifications(&mut self) -> bool {
        if !self.has_item_notifications {
            self.has_item_notifications = self.monitored_items.values().any(|item| {
                item.monitoring_mode() == MonitoringMode::Reporting
                    && item.has_notifications()
            });
        }
        self.has_item_notifications
    }

    /// Inject an already assembled message into the pending queue, e.g.
    /// a status change notification.
    pub fn enqueue_notification(&mut self, message: NotificationMessage) {
        self.pending.push_back(message);
    }

    /// Allocate the next sequence number. Messages injected with
    /// [`Self::enqueue_notification`] should be sequenced from here.
    pub fn next_sequence_number(&mut self) -> u32 {
        self.sequence_numbers.next()
    }

    /// Process one tick of the publishing cycle.
    ///
    /// Timer ticks advance the lifetime and may expire the subscription;
    /// publish request ticks service a late subscription immediately.
    /// The publish engine may deliver further publish requests
    /// re-entrantly from its send methods; conditions are re-evaluated
    /// after each call rather than cached across it.
    pub fn tick(
        &mut self,
        now: DateTimeUtc,
        reason: TickReason,
        engine: &mut dyn PublishEngine,
    ) -> TickResult {
        if self.is_terminal() {
            return TickResult::default();
        }
        engine.on_tick();
        self.sent.discard_old();
        self.diagnostics
            .set_unacknowledged_message_count(self.sent.len() as u32);

        if reason == TickReason::TickTimerFired {
            self.diagnostics.on_publish_interval();
            self.lifetime_counter += 1;
            trace!(
                "subscription {} tick: state {:?}, keep_alive {}/{}, lifetime {}/{}, message_sent {}",
                self.subscription_id,
                self.state,
                self.keep_alive_counter,
                self.max_keep_alive_count,
                self.lifetime_counter,
                self.lifetime_count,
                self.message_sent,
            );
            if self.lifetime_counter >= self.lifetime_count {
                self.expire(now, engine);
                return TickResult::default();
            }
            if self.state == SubscriptionState::Creating {
                self.state = SubscriptionState::Normal;
            }
        } else if self.state != SubscriptionState::Late
            && !(self.publishing_enabled && self.has_pending_notifications())
        {
            // A publish request with nothing waiting stays queued for the
            // next timer tick.
            return TickResult::default();
        }

        let requests_available = engine.pending_publish_request_count() > 0;
        let notifications_available =
            self.has_pending_notifications() || self.has_monitored_item_notifications();

        if !requests_available {
            if notifications_available {
                debug!(
                    "subscription {} has notifications but no publish request, going late",
                    self.subscription_id
                );
                self.diagnostics.on_late();
                self.state = SubscriptionState::Late;
            }
            return TickResult::default();
        }

        let serviced_late =
            reason == TickReason::ReceivedPublishRequest && self.state == SubscriptionState::Late;
        if self.publishing_enabled && self.has_pending_notifications() {
            self.send_one(engine);
        } else if self.publishing_enabled && self.has_monitored_item_notifications() {
            self.harvest_monitored_items(now);
            if self.has_pending_notifications() {
                self.send_one(engine);
            }
        } else {
            self.tick_keep_alive(
                now,
                engine,
                reason == TickReason::TickTimerFired,
                serviced_late,
            );
        }

        TickResult {
            more_to_send: self.state == SubscriptionState::Normal
                && self.has_pending_notifications(),
        }
    }

    /// Acknowledge a sent notification message. Returns `Good` and
    /// forgets the message on a hit, `BadSequenceNumberUnknown` without
    /// mutation on a miss.
    pub fn acknowledge(&mut self, sequence_number: u32) -> StatusCode {
        match self.sent.acknowledge(sequence_number) {
            Ok(_) => {
                self.diagnostics
                    .set_unacknowledged_message_count(self.sent.len() as u32);
                StatusCode::Good
            }
            Err(status) => {
                warn!(
                    "subscription {} acknowledge of unknown sequence number {}",
                    self.subscription_id, sequence_number
                );
                status
            }
        }
    }

    /// Retrieve a retained message for republishing.
    pub fn republish(&self, sequence_number: u32) -> Result<&NotificationMessage, StatusCode> {
        self.sent
            .find(sequence_number)
            .ok_or(StatusCode::BadMessageNotAvailable)
    }

    /// Enable or disable publishing. Disabling a live subscription drops
    /// it back to the normal state: the cycle keeps running but only
    /// keep alives go out.
    pub fn set_publishing_mode(&mut self, publishing_enabled: bool) {
        self.publishing_enabled = publishing_enabled;
        self.diagnostics.publishing_enabled = publishing_enabled;
        if !publishing_enabled && !self.is_terminal() {
            self.state = SubscriptionState::Normal;
        }
    }

    /// Apply revised parameters from a modify subscription request. Both
    /// counters reset; the caller restarts the publishing timer.
    pub fn modify(
        &mut self,
        requested: &RequestedSubscriptionParameters,
    ) -> SubscriptionParameters {
        let revised = SubscriptionParameters::revise(requested);
        self.publishing_interval = revised.publishing_interval;
        self.lifetime_count = revised.lifetime_count;
        self.max_keep_alive_count = revised.max_keep_alive_count;
        self.max_notifications_per_publish = revised.max_notifications_per_publish;
        self.priority = revised.priority;
        self.reset_lifetime_and_keep_alive_counters();
        self.diagnostics.publishing_interval_ms = revised.publishing_interval.as_secs_f64() * 1000.0;
        self.diagnostics.max_lifetime_count = revised.lifetime_count;
        self.diagnostics.max_keep_alive_count = revised.max_keep_alive_count;
        self.diagnostics.max_notifications_per_publish = revised.max_notifications_per_publish;
        self.diagnostics.priority = revised.priority;
        revised
    }

    /// Send the old session a transfer status change through its publish
    /// engine. Called on the subscription while it still belongs to the
    /// session losing it.
    pub fn notify_transfer(&mut self, engine: &mut dyn PublishEngine) {
        let message = NotificationMessage::status_change(
            self.sequence_numbers.next(),
            chrono::Utc::now(),
            StatusCode::GoodSubscriptionTransferred,
        );
        let notification = PublishedNotification {
            subscription_id: self.subscription_id,
            message,
            more_notifications: false,
            available_sequence_numbers: self.sent.sequence_numbers(),
        };
        if !engine.send_notification_message(notification, true) {
            debug!(
                "subscription {} transfer status change could not be sent",
                self.subscription_id
            );
        }
    }

    /// Move the subscription to another session.
    pub fn set_session_id(&mut self, session_id: NodeId) {
        self.session_id = session_id;
    }

    /// Tear the subscription down: terminate and drop every monitored
    /// item, stop exposing diagnostics, and notify the publish engine.
    pub fn terminate(&mut self, engine: &mut dyn PublishEngine) {
        if self.state == SubscriptionState::Closed {
            return;
        }
        for (_, mut item) in self.monitored_items.drain() {
            item.terminate();
            self.observer.on_monitored_item_removed(item.id());
        }
        self.has_item_notifications = false;
        self.diagnostics.set_monitored_item_counts(0, 0);
        self.diagnostics.unexpose();
        self.state = SubscriptionState::Closed;
        info!("subscription {} terminated", self.subscription_id);
        self.observer.on_terminated(self.subscription_id);
        engine.on_close_subscription(self.subscription_id);
    }

    /// Create a monitored item on the subscription. Validation failures
    /// return their status code in the result and leave the subscription
    /// untouched.
    pub fn create_monitored_item(
        &mut self,
        directory: &dyn NodeDirectory,
        request: &MonitoredItemCreateRequest,
        factory: &mut dyn MonitoredItemFactory,
    ) -> MonitoredItemCreateResult {
        self.reset_lifetime_counter();
        let item_to_monitor = &request.item_to_monitor;

        let Some(node) = directory.find_node(&item_to_monitor.node_id) else {
            return MonitoredItemCreateResult::error(StatusCode::BadNodeIdUnknown);
        };
        let attribute_id = match AttributeId::from_u32(item_to_monitor.attribute_id) {
            Ok(attribute_id) => attribute_id,
            Err(status) => return MonitoredItemCreateResult::error(status),
        };
        if attribute_id == AttributeId::Value && node.node_class != NodeClass::Variable {
            return MonitoredItemCreateResult::error(StatusCode::BadAttributeIdInvalid);
        }
        if let Err(status) = NumericRange::parse(&item_to_monitor.index_range) {
            return MonitoredItemCreateResult::error(status);
        }
        if !item_to_monitor.data_encoding.name.is_empty() {
            if attribute_id != AttributeId::Value {
                return MonitoredItemCreateResult::error(StatusCode::BadDataEncodingInvalid);
            }
            if item_to_monitor.data_encoding.name != "Default Binary" {
                return MonitoredItemCreateResult::error(StatusCode::BadDataEncodingUnsupported);
            }
        }
        if let Err(status) = request.requested_parameters.filter.validate(attribute_id) {
            return MonitoredItemCreateResult::error(status);
        }

        let monitored_item_id = self.item_ids.next();
        let revised_sampling_interval =
            self.adjust_sampling_interval(request.requested_parameters.sampling_interval, &node);
        let revised_queue_size = request.requested_parameters.queue_size.max(1) as usize;

        let mut item = factory.create(&CreateMonitoredItemContext {
            monitored_item_id,
            subscription_id: self.subscription_id,
            client_handle: request.requested_parameters.client_handle,
            revised_sampling_interval,
            revised_queue_size,
            discard_oldest: request.requested_parameters.discard_oldest,
        });
        item.set_monitoring_mode(request.monitoring_mode);
        debug_assert_eq!(item.id(), monitored_item_id);
        self.monitored_items.insert(monitored_item_id, item);
        self.update_item_diagnostics();
        self.observer
            .on_monitored_item_created(monitored_item_id, item_to_monitor);

        MonitoredItemCreateResult {
            status_code: StatusCode::Good,
            monitored_item_id,
            revised_sampling_interval,
            revised_queue_size: revised_queue_size as u32,
            filter_result: request.requested_parameters.filter.clone(),
        }
    }

    /// Delete a monitored item by id.
    pub fn delete_monitored_item(&mut self, monitored_item_id: u32) -> StatusCode {
        self.reset_lifetime_counter();
        match self.monitored_items.remove(&monitored_item_id) {
            Some(mut item) => {
                item.terminate();
                self.update_item_diagnostics();
                self.observer.on_monitored_item_removed(monitored_item_id);
                StatusCode::Good
            }
            None => StatusCode::BadMonitoredItemIdInvalid,
        }
    }

    /// Change the monitoring mode of a monitored item.
    pub fn set_monitoring_mode(
        &mut self,
        monitored_item_id: u32,
        mode: MonitoringMode,
    ) -> StatusCode {
        self.reset_lifetime_counter();
        match self.monitored_items.get_mut(&monitored_item_id) {
            Some(item) => {
                item.set_monitoring_mode(mode);
                self.update_item_diagnostics();
                StatusCode::Good
            }
            None => StatusCode::BadMonitoredItemIdInvalid,
        }
    }

    /// Server and client handles of every monitored item, for the
    /// GetMonitoredItems method.
    pub fn get_handles(&self) -> (Vec<u32>, Vec<u32>) {
        let server_handles = self.monitored_items.values().map(|i| i.id()).collect();
        let client_handles = self
            .monitored_items
            .values()
            .map(|i| i.client_handle())
            .collect();
        (server_handles, client_handles)
    }

    /// Reset the keep alive counter to zero.
    pub fn reset_keep_alive_counter(&mut self) {
        self.keep_alive_counter = 0;
    }

    /// Reset the lifetime counter to zero, recording client activity.
    pub fn reset_lifetime_counter(&mut self) {
        self.lifetime_counter = 0;
    }

    fn reset_lifetime_and_keep_alive_counters(&mut self) {
        self.reset_lifetime_counter();
        self.reset_keep_alive_counter();
    }

    fn publishing_interval_ms(&self) -> f64 {
        self.publishing_interval.as_secs_f64() * 1000.0
    }

    /// Revise a requested sampling interval against the publishing
    /// interval, the engine limits, and the node's own minimum.
    fn adjust_sampling_interval(&self, requested: f64, node: &NodeSummary) -> f64 {
        // A malformed node minimum is treated as absent.
        let node_minimum = node.minimum_sampling_interval.unwrap_or(0.0).max(0.0);
        let mut interval = if requested < 0.0 || requested.is_nan() {
            self.publishing_interval_ms()
        } else if requested == 0.0 {
            // Zero asks for the fastest the node supports; a node
            // minimum of zero means exception based reporting.
            node_minimum
        } else {
            requested
        };
        if interval > 0.0 {
            interval = interval.clamp(
                constants::MIN_SAMPLING_INTERVAL_MS,
                constants::MAX_SAMPLING_INTERVAL_MS,
            );
        }
        interval.max(node_minimum)
    }

    fn update_item_diagnostics(&mut self) {
        let total = self.monitored_items.len() as u32;
        let disabled = self
            .monitored_items
            .values()
            .filter(|i| i.monitoring_mode() == MonitoringMode::Disabled)
            .count() as u32;
        self.diagnostics.set_monitored_item_counts(total, disabled);
    }

    /// Drain every reporting item into the pending queue as sequenced
    /// notification messages.
    fn harvest_monitored_items(&mut self, now: DateTimeUtc) {
        let mut item_ids: Vec<u32> = self.monitored_items.keys().copied().collect();
        item_ids.sort_unstable();

        let mut notifications = Vec::new();
        for item_id in item_ids {
            let item = self.monitored_items.get_mut(&item_id).unwrap();
            if item.monitoring_mode() != MonitoringMode::Reporting {
                continue;
            }
            notifications.append(&mut item.extract_notifications());
        }
        self.has_item_notifications = false;
        if notifications.is_empty() {
            return;
        }

        for (data_changes, events) in
            chunk_notifications(notifications, self.max_notifications_per_publish as usize)
        {
            let sequence_number = self.sequence_numbers.next();
            debug!(
                "subscription {} assembling notification message {}",
                self.subscription_id, sequence_number
            );
            self.pending.push_back(NotificationMessage::data_change(
                sequence_number,
                now,
                data_changes,
                events,
            ));
        }
        self.observer.on_notification(self.subscription_id);
    }

    /// Move the head of the pending queue to the retransmission queue
    /// and hand it to the publish engine.
    fn send_one(&mut self, engine: &mut dyn PublishEngine) {
        let Some(message) = self.pending.pop_front() else {
            return;
        };
        let sequence_number = message.sequence_number;
        let (data_changes, events) = payload_counts(&message);
        self.sent.enqueue(message.clone());
        let notification = PublishedNotification {
            subscription_id: self.subscription_id,
            message,
            more_notifications: !self.pending.is_empty(),
            available_sequence_numbers: self.sent.sequence_numbers(),
        };
        if !engine.send_notification_message(notification, false) {
            // The engine had no request to consume after all; undo and
            // wait for one.
            let message = self.sent.acknowledge(sequence_number).unwrap();
            self.pending.push_front(message);
            self.diagnostics.on_late();
            self.state = SubscriptionState::Late;
            return;
        }
        debug!(
            "subscription {} sent notification message {}",
            self.subscription_id, sequence_number
        );
        self.diagnostics.on_notification_message(data_changes, events);
        self.diagnostics
            .set_unacknowledged_message_count(self.sent.len() as u32);
        self.message_sent = true;
        self.reset_lifetime_and_keep_alive_counters();
        if !self.is_terminal() {
            self.state = SubscriptionState::Normal;
        }
        let sent_message = self.sent.find(sequence_number).unwrap();
        self.observer.on_notification_message(sent_message);
    }

    /// Advance the keep alive counter and send a keep alive when it is
    /// due: the first time the timer ever expires, when the counter
    /// reaches its maximum, or when a late subscription is serviced by
    /// an arriving publish request.
    fn tick_keep_alive(
        &mut self,
        _now: DateTimeUtc,
        engine: &mut dyn PublishEngine,
        increment: bool,
        force: bool,
    ) {
        if increment {
            self.keep_alive_counter += 1;
        }
        let due =
            force || !self.message_sent || self.keep_alive_counter >= self.max_keep_alive_count;
        if !due {
            return;
        }
        let future_sequence_number = self.sequence_numbers.future();
        if engine.send_keep_alive_response(self.subscription_id, future_sequence_number) {
            debug!(
                "subscription {} sent keep alive, future sequence number {}",
                self.subscription_id, future_sequence_number
            );
            self.message_sent = true;
            if !self.is_terminal() {
                self.state = SubscriptionState::KeepAlive;
            }
            self.reset_lifetime_and_keep_alive_counters();
            self.diagnostics.on_keep_alive();
            self.observer.on_keep_alive(future_sequence_number);
        } else {
            self.diagnostics.on_late();
            self.state = SubscriptionState::Late;
        }
    }

    /// The lifetime ran out: push a timeout status change for the client
    /// and tear down.
    fn expire(&mut self, now: DateTimeUtc, engine: &mut dyn PublishEngine) {
        info!(
            "subscription {} expired after {} publishing intervals without client activity",
            self.subscription_id, self.lifetime_counter
        );
        let sequence_number = self.sequence_numbers.next();
        self.pending.push_back(NotificationMessage::status_change(
            sequence_number,
            now,
            StatusCode::BadTimeout,
        ));
        self.observer.on_expired(self.subscription_id);
        self.state = SubscriptionState::Terminated;
        self.terminate(engine);
    }
}

impl std::fmt::Debug for Subscription {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Subscription")
            .field("subscription_id", &self.subscription_id)
            .field("session_id", &self.session_id)
            .field("state", &self.state)
            .field("publishing_interval", &self.publishing_interval)
            .field("lifetime", &(self.lifetime_counter, self.lifetime_count))
            .field(
                "keep_alive",
                &(self.keep_alive_counter, self.max_keep_alive_count),
            )
            .field("pending", &self.pending.len())
            .field("sent", &self.sent.len())
            .field("monitored_items", &self.monitored_items.len())
            .finish()
    }
}

/// Split harvested notifications into per message payloads. No single
/// payload of one kind exceeds `max` entries (zero means unlimited); the
/// running chunk is flushed whenever the incoming entry's kind is full.
/// Within a chunk data changes precede events.
fn chunk_notifications(
    notifications: Vec<Notification>,
    max: usize,
) -> Vec<(Vec<MonitoredItemNotification>, Vec<EventFieldList>)> {
    let mut chunks = Vec::new();
    let mut data_changes: Vec<MonitoredItemNotification> = Vec::new();
    let mut events: Vec<EventFieldList> = Vec::new();
    for notification in notifications {
        match notification {
            Notification::DataChange(data_change) => {
                if max > 0 && data_changes.len() >= max {
                    chunks.push((std::mem::take(&mut data_changes), std::mem::take(&mut events)));
                }
                data_changes.push(data_change);
            }
            Notification::Event(event) => {
                if max > 0 && events.len() >= max {
                    chunks.push((std::mem::take(&mut data_changes), std::mem::take(&mut events)));
                }
                events.push(event);
            }
        }
    }
    if !data_changes.is_empty() || !events.is_empty() {
        chunks.push((data_changes, events));
    }
    chunks
}

fn payload_counts(message: &NotificationMessage) -> (u32, u32) {
    use subscription_types::NotificationData;
    let mut data_changes = 0;
    let mut events = 0;
    for data in &message.notification_data {
        match data {
            NotificationData::DataChange(dc) => data_changes += dc.monitored_items.len() as u32,
            NotificationData::Events(ev) => events += ev.events.len() as u32,
            NotificationData::StatusChange(_) => {}
        }
    }
    (data_changes, events)
}

#[cfg(test)]
mod tests {
    use super::{
        chunk_notifications, RequestedSubscriptionParameters, SubscriptionParameters,
    };
    use crate::constants;
    use std::time::Duration;
    use subscription_types::{
        DataValue, EventFieldList, MonitoredItemNotification, Notification,
    };

    fn data_change(client_handle: u32) -> Notification {
        Notification::DataChange(MonitoredItemNotification {
            client_handle,
            value: DataValue::new_now(0i32),
        })
    }

    fn event(client_handle: u32) -> Notification {
        Notification::Event(EventFieldList {
            client_handle,
            event_fields: vec![],
        })
    }

    #[test]
    fn revise_defaults() {
        let revised = SubscriptionParameters::revise(&RequestedSubscriptionParameters::default());
        assert_eq!(revised.publishing_interval, Duration::from_secs(1));
        assert_eq!(revised.max_keep_alive_count, 2);
        // max(1, 3 * 2, ceil(5000 / 1000))
        assert_eq!(revised.lifetime_count, 6);
    }

    #[test]
    fn revise_clamps_publishing_interval() {
        let revised = SubscriptionParameters::revise(&RequestedSubscriptionParameters {
            publishing_interval_ms: 1.0,
            ..Default::default()
        });
        assert_eq!(revised.publishing_interval, Duration::from_millis(50));

        let revised = SubscriptionParameters::revise(&RequestedSubscriptionParameters {
            publishing_interval_ms: f64::INFINITY,
            ..Default::default()
        });
        assert_eq!(
            revised.publishing_interval,
            Duration::from_millis(15 * 24 * 3600 * 1000)
        );
    }

    #[test]
    fn revise_raises_lifetime_count() {
        // Lifetime must cover three keep alive periods.
        let revised = SubscriptionParameters::revise(&RequestedSubscriptionParameters {
            publishing_interval_ms: 1000.0,
            lifetime_count: 1,
            max_keep_alive_count: 20,
            ..Default::default()
        });
        assert_eq!(revised.max_keep_alive_count, 20);
        assert_eq!(revised.lifetime_count, 60);

        // And at least five seconds of wall clock.
        let revised = SubscriptionParameters::revise(&RequestedSubscriptionParameters {
            publishing_interval_ms: 50.0,
            lifetime_count: 1,
            max_keep_alive_count: 2,
            ..Default::default()
        });
        assert_eq!(revised.lifetime_count, 100);
    }

    #[test]
    fn revise_clamps_keep_alive_count() {
        let revised = SubscriptionParameters::revise(&RequestedSubscriptionParameters {
            max_keep_alive_count: 0,
            ..Default::default()
        });
        assert_eq!(revised.max_keep_alive_count, constants::MIN_KEEP_ALIVE_COUNT);

        let revised = SubscriptionParameters::revise(&RequestedSubscriptionParameters {
            max_keep_alive_count: u32::MAX,
            ..Default::default()
        });
        assert_eq!(revised.max_keep_alive_count, constants::MAX_KEEP_ALIVE_COUNT);
    }

    #[test]
    fn chunking_respects_per_kind_limit() {
        // Five data changes followed by three events, two per kind per
        // message: (2,0) (2,0) (1,2) (0,1).
        let notifications = (0..5)
            .map(data_change)
            .chain((5..8).map(event))
            .collect::<Vec<_>>();
        let chunks = chunk_notifications(notifications, 2);
        let shape: Vec<(usize, usize)> = chunks.iter().map(|(d, e)| (d.len(), e.len())).collect();
        assert_eq!(shape, vec![(2, 0), (2, 0), (1, 2), (0, 1)]);
    }

    #[test]
    fn chunking_unlimited_is_one_chunk() {
        let notifications = (0..5)
            .map(data_change)
            .chain((5..8).map(event))
            .collect::<Vec<_>>();
        let chunks = chunk_notifications(notifications, 0);
        assert_eq!(chunks.len(), 1);
        assert_eq!(chunks[0].0.len(), 5);
        assert_eq!(chunks[0].1.len(), 3);
    }

    #[test]
    fn chunking_preserves_order() {
        let notifications = vec![data_change(1), event(2), data_change(3)];
        let chunks = chunk_notifications(notifications, 0);
        assert_eq!(chunks[0].0[0].client_handle, 1);
        assert_eq!(chunks[0].0[1].client_handle, 3);
        assert_eq!(chunks[0].1[0].client_handle, 2);
    }
}
