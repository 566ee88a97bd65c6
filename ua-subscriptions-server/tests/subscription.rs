//! Scenario tests for the subscription publishing cycle: keep alives,
//! lifetime expiration, late recovery, chunked harvesting, publish
//! reconciliation and acknowledgement.

use std::collections::VecDeque;
use std::sync::{Arc, Mutex};
use std::time::Duration;

use subscription_server::{
    address_space::{NodeClass, NodeDirectory, NodeSummary},
    monitored_item::{CreateMonitoredItemContext, MonitoredItem, MonitoredItemFactory},
    publish::{PublishEngine, PublishedNotification},
    subscription::{
        MonitoredItemIdHandle, RequestedSubscriptionParameters, SessionSubscriptions,
        Subscription, SubscriptionAcknowledgement, SubscriptionObserver, SubscriptionParameters,
        SubscriptionState, SubscriptionTicker, TickReason,
    },
};
use subscription_server::types::{
    DataValue, DateTimeUtc, EventFieldList, MonitoredItemCreateRequest,
    MonitoredItemNotification, MonitoringFilter, MonitoringMode, MonitoringParameters, NodeId,
    Notification, NotificationData, NotificationMessage, QualifiedName, ReadValueId, StatusCode,
};

fn now() -> DateTimeUtc {
    chrono::Utc::now()
}

fn params(
    interval_ms: u64,
    max_keep_alive_count: u32,
    lifetime_count: u32,
) -> SubscriptionParameters {
    SubscriptionParameters {
        publishing_interval: Duration::from_millis(interval_ms),
        lifetime_count,
        max_keep_alive_count,
        max_notifications_per_publish: 0,
        priority: 0,
        publishing_enabled: true,
    }
}

fn subscription(parameters: SubscriptionParameters) -> Subscription {
    Subscription::new(1, NodeId::new(1, 1000), parameters, MonitoredItemIdHandle::new())
}

#[derive(Default)]
struct RecordingPublishEngine {
    pending_requests: usize,
    sent: Vec<(PublishedNotification, bool)>,
    keep_alives: Vec<(u32, u32)>,
    closed: Vec<u32>,
    ticks: usize,
}

impl RecordingPublishEngine {
    fn with_requests(pending_requests: usize) -> Self {
        RecordingPublishEngine {
            pending_requests,
            ..Default::default()
        }
    }
}

impl PublishEngine for RecordingPublishEngine {
    fn pending_publish_request_count(&self) -> usize {
        self.pending_requests
    }

    fn send_notification_message(
        &mut self,
        notification: PublishedNotification,
        initial: bool,
    ) -> bool {
        if !initial {
            if self.pending_requests == 0 {
                return false;
            }
            self.pending_requests -= 1;
        }
        self.sent.push((notification, initial));
        true
    }

    fn send_keep_alive_response(
        &mut self,
        subscription_id: u32,
        future_sequence_number: u32,
    ) -> bool {
        if self.pending_requests == 0 {
            return false;
        }
        self.pending_requests -= 1;
        self.keep_alives.push((subscription_id, future_sequence_number));
        true
    }

    fn on_close_subscription(&mut self, subscription_id: u32) {
        self.closed.push(subscription_id);
    }

    fn on_tick(&mut self) {
        self.ticks += 1;
    }
}

#[derive(Clone, Default)]
struct SharedQueue(Arc<Mutex<VecDeque<Notification>>>);

impl SharedQueue {
    fn push_data_change(&self, client_handle: u32, value: i32) {
        self.0
            .lock()
            .unwrap()
            .push_back(Notification::DataChange(MonitoredItemNotification {
                client_handle,
                value: DataValue::new_now(value),
            }));
    }

    fn push_event(&self, client_handle: u32) {
        self.0
            .lock()
            .unwrap()
            .push_back(Notification::Event(EventFieldList {
                client_handle,
                event_fields: vec![],
            }));
    }
}

struct QueueItem {
    id: u32,
    client_handle: u32,
    mode: MonitoringMode,
    sampling_interval: f64,
    queue_size: usize,
    queue: SharedQueue,
}

impl MonitoredItem for QueueItem {
    fn id(&self) -> u32 {
        self.id
    }
    fn client_handle(&self) -> u32 {
        self.client_handle
    }
    fn monitoring_mode(&self) -> MonitoringMode {
        self.mode
    }
    fn sampling_interval(&self) -> f64 {
        self.sampling_interval
    }
    fn queue_size(&self) -> usize {
        self.queue_size
    }
    fn has_notifications(&self) -> bool {
        !self.queue.0.lock().unwrap().is_empty()
    }
    fn extract_notifications(&mut self) -> Vec<Notification> {
        self.queue.0.lock().unwrap().drain(..).collect()
    }
    fn set_monitoring_mode(&mut self, mode: MonitoringMode) {
        self.mode = mode;
    }
    fn terminate(&mut self) {
        self.queue.0.lock().unwrap().clear();
    }
}

struct QueueItemFactory {
    queue: SharedQueue,
}

impl MonitoredItemFactory for QueueItemFactory {
    fn create(&mut self, context: &CreateMonitoredItemContext) -> Box<dyn MonitoredItem> {
        Box::new(QueueItem {
            id: context.monitored_item_id,
            client_handle: context.client_handle,
            mode: MonitoringMode::Reporting,
            sampling_interval: context.revised_sampling_interval,
            queue_size: context.revised_queue_size,
            queue: self.queue.clone(),
        })
    }
}

struct StaticDirectory(Vec<(NodeId, NodeSummary)>);

impl NodeDirectory for StaticDirectory {
    fn find_node(&self, node_id: &NodeId) -> Option<NodeSummary> {
        self.0
            .iter()
            .find(|(id, _)| id == node_id)
            .map(|(_, summary)| summary.clone())
    }
}

#[derive(Clone, Default)]
struct RecordingObserver(Arc<Mutex<Vec<String>>>);

impl RecordingObserver {
    fn events(&self) -> Vec<String> {
        self.0.lock().unwrap().clone()
    }
}

impl SubscriptionObserver for RecordingObserver {
    fn on_notification(&mut self, _subscription_id: u32) {
        self.0.lock().unwrap().push("notification".into());
    }
    fn on_notification_message(&mut self, message: &NotificationMessage) {
        self.0
            .lock()
            .unwrap()
            .push(format!("notificationMessage {}", message.sequence_number));
    }
    fn on_keep_alive(&mut self, future_sequence_number: u32) {
        self.0
            .lock()
            .unwrap()
            .push(format!("keepalive {future_sequence_number}"));
    }
    fn on_expired(&mut self, _subscription_id: u32) {
        self.0.lock().unwrap().push("expired".into());
    }
    fn on_terminated(&mut self, _subscription_id: u32) {
        self.0.lock().unwrap().push("terminated".into());
    }
}

/// Create a monitored item fed from the returned shared queue.
fn add_queue_item(subscription: &mut Subscription, node_id: NodeId, client_handle: u32) -> SharedQueue {
    let queue = SharedQueue::default();
    let directory = StaticDirectory(vec![(node_id.clone(), NodeSummary::variable())]);
    let mut factory = QueueItemFactory {
        queue: queue.clone(),
    };
    let result = subscription.create_monitored_item(
        &directory,
        &MonitoredItemCreateRequest {
            item_to_monitor: ReadValueId::value_of(node_id),
            monitoring_mode: MonitoringMode::Reporting,
            requested_parameters: MonitoringParameters {
                client_handle,
                sampling_interval: 100.0,
                queue_size: 10,
                ..Default::default()
            },
        },
        &mut factory,
    );
    assert_eq!(result.status_code, StatusCode::Good);
    queue
}

fn payload_shape(message: &NotificationMessage) -> (usize, usize) {
    let mut shape = (0, 0);
    for data in &message.notification_data {
        match data {
            NotificationData::DataChange(dc) => shape.0 += dc.monitored_items.len(),
            NotificationData::Events(ev) => shape.1 += ev.events.len(),
            NotificationData::StatusChange(_) => {}
        }
    }
    shape
}

#[test]
fn keep_alive_fires_after_silent_interval() {
    // Publishing interval 100 ms, keep alive every 3 ticks, publish
    // requests always available, no monitored items.
    let mut sub = subscription(params(100, 3, 9));
    let observer = RecordingObserver::default();
    sub.set_observer(Box::new(observer.clone()));
    let mut engine = RecordingPublishEngine::with_requests(100);

    // The first tick must produce a keep alive with the future sequence
    // number 1.
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(engine.keep_alives, vec![(1, 1)]);
    assert_eq!(sub.state(), SubscriptionState::KeepAlive);
    assert!(sub.message_sent());

    // The next two ticks do nothing externally.
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(engine.keep_alives.len(), 1);

    // The keep alive counter reaches its maximum on the third silent
    // tick and forces another keep alive.
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(engine.keep_alives, vec![(1, 1), (1, 1)]);
    assert_eq!(sub.state(), SubscriptionState::KeepAlive);
    assert_eq!(observer.events(), vec!["keepalive 1", "keepalive 1"]);
    // No sequence number was ever consumed, and the engine's tick hook
    // ran once per cycle.
    assert_eq!(sub.future_sequence_number(), 1);
    assert_eq!(engine.ticks, 4);
}

#[test]
fn expiration_terminates_subscription() {
    // Same parameters, but no publish requests ever arrive.
    let mut sub = subscription(params(100, 3, 9));
    let observer = RecordingObserver::default();
    sub.set_observer(Box::new(observer.clone()));
    let mut engine = RecordingPublishEngine::with_requests(0);

    for tick in 1..=8 {
        sub.tick(now(), TickReason::TickTimerFired, &mut engine);
        assert_eq!(sub.lifetime_counter(), tick);
        assert!(!sub.is_terminal());
    }

    // The ninth tick exhausts the lifetime.
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(sub.state(), SubscriptionState::Closed);
    assert!(sub.is_empty());
    assert_eq!(engine.closed, vec![1]);
    assert_eq!(observer.events(), vec!["expired", "terminated"]);

    // A timeout status change was queued for the client.
    assert!(sub.has_pending_notifications());

    // Terminal states are absorbing.
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(sub.state(), SubscriptionState::Closed);
    assert_eq!(engine.keep_alives.len(), 0);
}

#[test]
fn late_subscription_recovers_on_publish_request() {
    let mut sub = subscription(params(50, 2, 6));
    let mut engine = RecordingPublishEngine::with_requests(0);
    let queue = add_queue_item(&mut sub, NodeId::new(2, 1), 7);
    queue.push_data_change(7, 42);

    // Material to send but no publish request: the subscription goes
    // late.
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(sub.state(), SubscriptionState::Late);

    // An arriving publish request is serviced immediately.
    engine.pending_requests = 1;
    sub.tick(now(), TickReason::ReceivedPublishRequest, &mut engine);
    assert_eq!(sub.state(), SubscriptionState::Normal);
    assert_eq!(engine.sent.len(), 1);
    let (notification, initial) = &engine.sent[0];
    assert!(!initial);
    assert_eq!(notification.message.sequence_number, 1);
    assert!(!notification.more_notifications);
    assert_eq!(notification.available_sequence_numbers, vec![1]);
    assert_eq!(sub.lifetime_counter(), 0);
    assert_eq!(sub.keep_alive_counter(), 0);
}

#[test]
fn harvest_chunks_by_max_notifications_per_publish() {
    let mut sub = subscription(SubscriptionParameters {
        max_notifications_per_publish: 2,
        ..params(100, 3, 50)
    });
    let mut engine = RecordingPublishEngine::with_requests(100);
    let data_queue = add_queue_item(&mut sub, NodeId::new(2, 1), 1);
    let event_queue = add_queue_item(&mut sub, NodeId::new(2, 2), 2);

    for value in 0..5 {
        data_queue.push_data_change(1, value);
    }
    for _ in 0..3 {
        event_queue.push_event(2);
    }

    // First tick harvests everything and sends the first message; the
    // remaining ones drain back to back.
    let result = sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert!(result.more_to_send);
    while sub
        .tick(now(), TickReason::TickTimerFired, &mut engine)
        .more_to_send
    {}

    let shapes: Vec<(usize, usize)> = engine
        .sent
        .iter()
        .map(|(n, _)| payload_shape(&n.message))
        .collect();
    assert_eq!(shapes, vec![(2, 0), (2, 0), (1, 2), (0, 1)]);

    let sequence_numbers: Vec<u32> = engine
        .sent
        .iter()
        .map(|(n, _)| n.message.sequence_number)
        .collect();
    assert_eq!(sequence_numbers, vec![1, 2, 3, 4]);

    // Only the last message reported nothing more to come.
    let more: Vec<bool> = engine.sent.iter().map(|(n, _)| n.more_notifications).collect();
    assert_eq!(more, vec![true, true, true, false]);
}

#[test]
fn publish_round_trip_drains_acknowledged_messages() {
    let mut sub = subscription(params(100, 3, 50));
    let mut engine = RecordingPublishEngine::with_requests(0);

    // Inject five messages by direct injection.
    for _ in 0..5 {
        let sequence_number = sub.next_sequence_number();
        sub.enqueue_notification(NotificationMessage::status_change(
            sequence_number,
            now(),
            StatusCode::Good,
        ));
    }

    // Five publish requests deliver them in allocation order.
    engine.pending_requests = 5;
    for _ in 0..5 {
        sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    }
    let sequence_numbers: Vec<u32> = engine
        .sent
        .iter()
        .map(|(n, _)| n.message.sequence_number)
        .collect();
    assert_eq!(sequence_numbers, vec![1, 2, 3, 4, 5]);
    assert_eq!(sub.unacknowledged_message_count(), 5);
    assert_eq!(sub.available_sequence_numbers(), vec![1, 2, 3, 4, 5]);

    // Acknowledge each; the retransmission queue drains.
    for sequence_number in 1..=5 {
        assert_eq!(sub.acknowledge(sequence_number), StatusCode::Good);
    }
    assert_eq!(sub.unacknowledged_message_count(), 0);
    assert!(sub.available_sequence_numbers().is_empty());
}

#[test]
fn acknowledge_unknown_sequence_number_is_effect_free() {
    let mut sub = subscription(params(100, 3, 50));
    let mut engine = RecordingPublishEngine::with_requests(1);
    let sequence_number = sub.next_sequence_number();
    sub.enqueue_notification(NotificationMessage::status_change(
        sequence_number,
        now(),
        StatusCode::Good,
    ));
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(sub.unacknowledged_message_count(), 1);

    assert_eq!(
        sub.acknowledge(99),
        StatusCode::BadSequenceNumberUnknown
    );
    assert_eq!(
        sub.acknowledge(99),
        StatusCode::BadSequenceNumberUnknown
    );
    assert_eq!(sub.unacknowledged_message_count(), 1);
    assert_eq!(sub.available_sequence_numbers(), vec![1]);
}

#[test]
fn modify_revises_parameters_and_resets_counters() {
    let mut sub = subscription(params(100, 3, 9));
    let mut engine = RecordingPublishEngine::with_requests(0);
    for _ in 0..4 {
        sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    }
    assert_eq!(sub.lifetime_counter(), 4);

    let revised = sub.modify(&RequestedSubscriptionParameters {
        publishing_interval_ms: 10.0,
        lifetime_count: 1,
        max_keep_alive_count: 0,
        max_notifications_per_publish: 7,
        priority: 3,
        publishing_enabled: true,
    });

    // Clamped per the revision formulas.
    assert_eq!(revised.publishing_interval, Duration::from_millis(50));
    assert_eq!(revised.max_keep_alive_count, 2);
    assert_eq!(revised.lifetime_count, 100);
    assert_eq!(sub.publishing_interval(), Duration::from_millis(50));
    assert_eq!(sub.max_notifications_per_publish(), 7);
    assert_eq!(sub.priority(), 3);
    assert_eq!(sub.lifetime_counter(), 0);
    assert_eq!(sub.keep_alive_counter(), 0);
}

#[test]
fn disabling_publishing_returns_to_normal_and_keeps_alive() {
    let mut sub = subscription(params(100, 2, 50));
    let mut engine = RecordingPublishEngine::with_requests(100);
    let queue = add_queue_item(&mut sub, NodeId::new(2, 1), 1);

    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(sub.state(), SubscriptionState::KeepAlive);

    sub.set_publishing_mode(false);
    assert_eq!(sub.state(), SubscriptionState::Normal);
    assert!(!sub.publishing_enabled());

    // Queued notifications are not published while disabled; the cycle
    // emits keep alives instead.
    queue.push_data_change(1, 1);
    let keep_alives_before = engine.keep_alives.len();
    for _ in 0..2 {
        sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    }
    assert!(engine.sent.is_empty());
    assert!(engine.keep_alives.len() > keep_alives_before);
}

#[test]
fn create_monitored_item_status_ladder() {
    let mut sub = subscription(params(100, 3, 50));
    let variable = NodeId::new(2, 1);
    let object = NodeId::new(2, 2);
    let directory = StaticDirectory(vec![
        (variable.clone(), NodeSummary::variable()),
        (object.clone(), NodeSummary::object()),
    ]);
    let mut factory = QueueItemFactory {
        queue: SharedQueue::default(),
    };

    let request = |item_to_monitor: ReadValueId| MonitoredItemCreateRequest {
        item_to_monitor,
        monitoring_mode: MonitoringMode::Reporting,
        requested_parameters: MonitoringParameters::default(),
    };

    // Unknown node.
    let result = sub.create_monitored_item(
        &directory,
        &request(ReadValueId::value_of(NodeId::new(2, 99))),
        &mut factory,
    );
    assert_eq!(result.status_code, StatusCode::BadNodeIdUnknown);

    // Value attribute on a non variable node.
    let result = sub.create_monitored_item(
        &directory,
        &request(ReadValueId::value_of(object.clone())),
        &mut factory,
    );
    assert_eq!(result.status_code, StatusCode::BadAttributeIdInvalid);

    // Attribute id outside the defined range.
    let mut item = ReadValueId::value_of(variable.clone());
    item.attribute_id = 99;
    let result = sub.create_monitored_item(&directory, &request(item), &mut factory);
    assert_eq!(result.status_code, StatusCode::BadAttributeIdInvalid);

    // Malformed index range.
    let mut item = ReadValueId::value_of(variable.clone());
    item.index_range = "2:1".to_string();
    let result = sub.create_monitored_item(&directory, &request(item), &mut factory);
    assert_eq!(result.status_code, StatusCode::BadIndexRangeInvalid);

    // Data encoding on a non value attribute.
    let mut item = ReadValueId::events_of(object.clone());
    item.data_encoding = QualifiedName::new(0, "Default Binary");
    let result = sub.create_monitored_item(&directory, &request(item), &mut factory);
    assert_eq!(result.status_code, StatusCode::BadDataEncodingInvalid);

    // Unsupported data encoding.
    let mut item = ReadValueId::value_of(variable.clone());
    item.data_encoding = QualifiedName::new(0, "Default XML");
    let result = sub.create_monitored_item(&directory, &request(item), &mut factory);
    assert_eq!(result.status_code, StatusCode::BadDataEncodingUnsupported);

    // A filter that is not legal for the attribute returns its own
    // status code.
    let mut bad_filter = request(ReadValueId::value_of(variable.clone()));
    bad_filter.requested_parameters.filter = MonitoringFilter::Event {
        select_clauses: vec![QualifiedName::from("EventId")],
    };
    let result = sub.create_monitored_item(&directory, &bad_filter, &mut factory);
    assert_eq!(result.status_code, StatusCode::BadFilterNotAllowed);

    // A valid request gets a fresh id and revised parameters.
    let mut good = request(ReadValueId::value_of(variable.clone()));
    good.requested_parameters.client_handle = 5;
    good.requested_parameters.queue_size = 0;
    let result = sub.create_monitored_item(&directory, &good, &mut factory);
    assert_eq!(result.status_code, StatusCode::Good);
    assert!(result.monitored_item_id > 0);
    // Negative requested interval falls back to the publishing interval.
    assert_eq!(result.revised_sampling_interval, 100.0);
    assert_eq!(result.revised_queue_size, 1);
    assert_eq!(sub.len(), 1);
    let item = sub.monitored_item(result.monitored_item_id).unwrap();
    assert_eq!(item.client_handle(), 5);
    assert_eq!(item.monitoring_mode(), MonitoringMode::Reporting);
}

#[test]
fn sampling_interval_adjustment() {
    let mut sub = subscription(params(200, 3, 50));
    let mut factory = QueueItemFactory {
        queue: SharedQueue::default(),
    };
    let fast = NodeId::new(2, 1);
    let exception_based = NodeId::new(2, 2);
    let slow_minimum = NodeId::new(2, 3);
    let directory = StaticDirectory(vec![
        (fast.clone(), NodeSummary::variable()),
        (
            exception_based.clone(),
            NodeSummary {
                node_class: NodeClass::Variable,
                minimum_sampling_interval: Some(0.0),
            },
        ),
        (
            slow_minimum.clone(),
            NodeSummary {
                node_class: NodeClass::Variable,
                minimum_sampling_interval: Some(500.0),
            },
        ),
    ]);

    let request = |node_id: &NodeId, sampling_interval: f64| MonitoredItemCreateRequest {
        item_to_monitor: ReadValueId::value_of(node_id.clone()),
        monitoring_mode: MonitoringMode::Reporting,
        requested_parameters: MonitoringParameters {
            sampling_interval,
            queue_size: 1,
            ..Default::default()
        },
    };

    // Negative requests the publishing interval.
    let result = sub.create_monitored_item(&directory, &request(&fast, -1.0), &mut factory);
    assert_eq!(result.revised_sampling_interval, 200.0);

    // A request below the engine minimum is clamped up.
    let result = sub.create_monitored_item(&directory, &request(&fast, 10.0), &mut factory);
    assert_eq!(result.revised_sampling_interval, 50.0);

    // Zero with a zero node minimum stays zero: exception based.
    let result =
        sub.create_monitored_item(&directory, &request(&exception_based, 0.0), &mut factory);
    assert_eq!(result.revised_sampling_interval, 0.0);

    // Zero without node metadata stays zero as well.
    let result = sub.create_monitored_item(&directory, &request(&fast, 0.0), &mut factory);
    assert_eq!(result.revised_sampling_interval, 0.0);

    // The node minimum floors whatever was requested.
    let result =
        sub.create_monitored_item(&directory, &request(&slow_minimum, 100.0), &mut factory);
    assert_eq!(result.revised_sampling_interval, 500.0);
}

#[test]
fn session_container_routes_publish_requests() {
    let session_id = NodeId::new(1, 1000);
    let mut subs =
        SessionSubscriptions::new(session_id, MonitoredItemIdHandle::new(), 10);
    let mut engine = RecordingPublishEngine::with_requests(0);

    let (subscription_id, revised) = subs
        .create_subscription(&RequestedSubscriptionParameters {
            publishing_interval_ms: 50.0,
            lifetime_count: 1,
            max_keep_alive_count: 2,
            ..Default::default()
        })
        .unwrap();
    assert_eq!(revised.publishing_interval, Duration::from_millis(50));

    let queue = {
        let sub = subs.get_mut(subscription_id).unwrap();
        add_queue_item(sub, NodeId::new(2, 1), 3)
    };
    queue.push_data_change(3, 9);

    // Timer tick with no requests: late.
    subs.get_mut(subscription_id)
        .unwrap()
        .tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(
        subs.get(subscription_id).unwrap().state(),
        SubscriptionState::Late
    );

    // A publish request acknowledges nothing valid and is consumed by
    // the late subscription.
    engine.pending_requests = 1;
    let ack_results = subs.on_publish_request(
        now(),
        &[
            SubscriptionAcknowledgement {
                subscription_id,
                sequence_number: 42,
            },
            SubscriptionAcknowledgement {
                subscription_id: 9999,
                sequence_number: 1,
            },
        ],
        &mut engine,
    );
    assert_eq!(
        ack_results,
        vec![
            StatusCode::BadSequenceNumberUnknown,
            StatusCode::BadSubscriptionIdInvalid
        ]
    );
    assert_eq!(engine.sent.len(), 1);
    assert_eq!(
        subs.get(subscription_id).unwrap().state(),
        SubscriptionState::Normal
    );

    // Now a valid acknowledgement drains the retransmission queue.
    let sequence_number = engine.sent[0].0.message.sequence_number;
    let ack_results = subs.on_publish_request(
        now(),
        &[SubscriptionAcknowledgement {
            subscription_id,
            sequence_number,
        }],
        &mut engine,
    );
    assert_eq!(ack_results, vec![StatusCode::Good]);
    assert_eq!(
        subs.get(subscription_id)
            .unwrap()
            .unacknowledged_message_count(),
        0
    );
}

#[test]
fn session_container_enforces_subscription_limit() {
    let mut subs = SessionSubscriptions::new(
        NodeId::new(1, 1000),
        MonitoredItemIdHandle::new(),
        2,
    );
    subs.create_subscription(&RequestedSubscriptionParameters::default())
        .unwrap();
    subs.create_subscription(&RequestedSubscriptionParameters::default())
        .unwrap();
    let err = subs
        .create_subscription(&RequestedSubscriptionParameters::default())
        .unwrap_err();
    assert_eq!(err, StatusCode::BadTooManySubscriptions);
}

#[test]
fn transfer_notifies_old_session_with_status_change() {
    let mut old_session = SessionSubscriptions::new(
        NodeId::new(1, 1000),
        MonitoredItemIdHandle::new(),
        10,
    );
    let mut new_session = SessionSubscriptions::new(
        NodeId::new(1, 2000),
        MonitoredItemIdHandle::new(),
        10,
    );
    let mut engine = RecordingPublishEngine::with_requests(0);

    let (subscription_id, _) = old_session
        .create_subscription(&RequestedSubscriptionParameters::default())
        .unwrap();

    let moved = old_session.transfer_out(subscription_id, &mut engine).unwrap();
    assert!(old_session.is_empty());

    // The old session got a GoodSubscriptionTransferred status change
    // with the initial flag set.
    assert_eq!(engine.sent.len(), 1);
    let (notification, initial) = &engine.sent[0];
    assert!(initial);
    let NotificationData::StatusChange(ref status_change) =
        notification.message.notification_data[0]
    else {
        panic!("expected a status change notification");
    };
    assert_eq!(status_change.status, StatusCode::GoodSubscriptionTransferred);

    new_session.transfer_in(moved);
    let adopted = new_session.get(subscription_id).unwrap();
    assert_eq!(adopted.session_id(), &NodeId::new(1, 2000));
    assert!(!adopted.is_terminal());
}

#[test]
fn session_abort_is_observable_and_lifetime_keeps_counting() {
    let mut sub = subscription(params(100, 3, 9));
    let mut engine = RecordingPublishEngine::with_requests(0);
    assert!(!sub.aborted());
    sub.set_aborted();
    assert!(sub.aborted());

    sub.tick(now(), TickReason::TickTimerFired, &mut engine);
    assert_eq!(sub.lifetime_counter(), 1);
    assert!(!sub.is_terminal());
}

#[test]
fn republish_serves_retained_messages_only() {
    let mut sub = subscription(params(100, 3, 50));
    let mut engine = RecordingPublishEngine::with_requests(1);
    let sequence_number = sub.next_sequence_number();
    sub.enqueue_notification(NotificationMessage::status_change(
        sequence_number,
        now(),
        StatusCode::Good,
    ));
    sub.tick(now(), TickReason::TickTimerFired, &mut engine);

    assert!(sub.republish(sequence_number).is_ok());
    assert_eq!(
        sub.republish(77).unwrap_err(),
        StatusCode::BadMessageNotAvailable
    );

    sub.acknowledge(sequence_number);
    assert!(sub.republish(sequence_number).is_err());
}

#[tokio::test(start_paused = true)]
async fn ticker_drives_keep_alives_and_stops_on_terminate() {
    use subscription_server::sync::Mutex as SyncMutex;

    let sub = Arc::new(SyncMutex::new(subscription(params(100, 2, 5000))));
    let engine: Arc<SyncMutex<dyn PublishEngine + Send>> =
        Arc::new(SyncMutex::new(RecordingPublishEngine::with_requests(1000)));

    let ticker = SubscriptionTicker::new(sub.clone(), engine.clone());
    let handle = tokio::spawn(ticker.run());

    // Simulated time: the first keep alive goes out on the first tick.
    tokio::time::sleep(Duration::from_millis(550)).await;
    {
        let sub = sub.lock();
        assert!(sub.message_sent());
        assert_eq!(sub.state(), SubscriptionState::KeepAlive);
    }

    // Terminating the subscription stops the ticker.
    {
        let mut sub = sub.lock();
        let mut engine = engine.lock();
        sub.terminate(&mut *engine);
    }
    tokio::time::timeout(Duration::from_secs(2), handle)
        .await
        .expect("ticker should stop after terminate")
        .unwrap();
}
