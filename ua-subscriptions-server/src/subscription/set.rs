//! The per session subscription container: id allocation, parameter
//! revision, publish request routing, transfer, and teardown.

use std::sync::atomic::{AtomicU32, Ordering};
use std::sync::Arc;

use hashbrown::HashMap;
use tracing::debug;

use subscription_types::{DateTimeUtc, NodeId, StatusCode};

use crate::publish::PublishEngine;

use super::subscription::{
    RequestedSubscriptionParameters, Subscription, SubscriptionParameters, SubscriptionState,
    TickReason,
};

/// Allocates monitored item ids unique across every subscription of the
/// server. Cheap to clone; clones share the counter.
#[derive(Debug, Clone)]
pub struct MonitoredItemIdHandle(Arc<AtomicU32>);

impl Default for MonitoredItemIdHandle {
    fn default() -> Self {
        Self::new()
    }
}

impl MonitoredItemIdHandle {
    /// Create a handle whose first allocation will be 1.
    pub fn new() -> Self {
        MonitoredItemIdHandle(Arc::new(AtomicU32::new(1)))
    }

    /// Allocate the next monitored item id.
    pub fn next(&self) -> u32 {
        self.0.fetch_add(1, Ordering::Relaxed)
    }
}

/// One acknowledgement from a publish request.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub struct SubscriptionAcknowledgement {
    /// The subscription that sent the message.
    pub subscription_id: u32,
    /// The sequence number being acknowledged.
    pub sequence_number: u32,
}

/// The subscriptions belonging to one session.
///
/// Owns the subscriptions exclusively; callers serialize access through
/// a [`crate::sync::Mutex`]. Cross subscription operations, transfer and
/// session teardown among them, arrive here on the same serialization
/// domain as the ticks.
pub struct SessionSubscriptions {
    session_id: NodeId,
    subscriptions: HashMap<u32, Subscription>,
    next_subscription_id: u32,
    item_ids: MonitoredItemIdHandle,
    max_subscriptions: usize,
}

impl SessionSubscriptions {
    /// Create a container for the given session. `max_subscriptions`
    /// bounds how many subscriptions the session may hold, zero meaning
    /// no limit.
    pub fn new(
        session_id: NodeId,
        item_ids: MonitoredItemIdHandle,
        max_subscriptions: usize,
    ) -> SessionSubscriptions {
        SessionSubscriptions {
            session_id,
            subscriptions: HashMap::new(),
            next_subscription_id: 1,
            item_ids,
            max_subscriptions,
        }
    }

    /// The id of the owning session.
    pub fn session_id(&self) -> &NodeId {
        &self.session_id
    }

    /// Number of subscriptions in the container.
    pub fn len(&self) -> usize {
        self.subscriptions.len()
    }

    /// Whether the container holds no subscriptions.
    pub fn is_empty(&self) -> bool {
        self.subscriptions.is_empty()
    }

    /// Look up a subscription.
    pub fn get(&self, subscription_id: u32) -> Option<&Subscription> {
        self.subscriptions.get(&subscription_id)
    }

    /// Look up a subscription for mutation.
    pub fn get_mut(&mut self, subscription_id: u32) -> Option<&mut Subscription> {
        self.subscriptions.get_mut(&subscription_id)
    }

    /// Create a subscription from client requested parameters. Returns
    /// the new id and the revised parameters.
    pub fn create_subscription(
        &mut self,
        requested: &RequestedSubscriptionParameters,
    ) -> Result<(u32, SubscriptionParameters), StatusCode> {
        if self.max_subscriptions > 0 && self.subscriptions.len() >= self.max_subscriptions {
            return Err(StatusCode::BadTooManySubscriptions);
        }
        let revised = SubscriptionParameters::revise(requested);
        let subscription_id = self.next_subscription_id;
        self.next_subscription_id += 1;
        let subscription = Subscription::new(
            subscription_id,
            self.session_id.clone(),
            revised,
            self.item_ids.clone(),
        );
        debug!(
            "session {} created subscription {subscription_id}",
            self.session_id
        );
        self.subscriptions.insert(subscription_id, subscription);
        Ok((subscription_id, revised))
    }

    /// Modify a subscription with client requested parameters,
    /// returning the revised values. The caller restarts the
    /// subscription's publishing timer.
    pub fn modify_subscription(
        &mut self,
        subscription_id: u32,
        requested: &RequestedSubscriptionParameters,
    ) -> Result<SubscriptionParameters, StatusCode> {
        let subscription = self
            .subscriptions
            .get_mut(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        Ok(subscription.modify(requested))
    }

    /// Delete subscriptions by id, terminating each.
    pub fn delete_subscriptions(
        &mut self,
        subscription_ids: &[u32],
        engine: &mut dyn PublishEngine,
    ) -> Vec<StatusCode> {
        subscription_ids
            .iter()
            .map(|id| match self.subscriptions.remove(id) {
                Some(mut subscription) => {
                    subscription.terminate(engine);
                    StatusCode::Good
                }
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect()
    }

    /// Enable or disable publishing on the listed subscriptions.
    pub fn set_publishing_mode(
        &mut self,
        subscription_ids: &[u32],
        publishing_enabled: bool,
    ) -> Vec<StatusCode> {
        subscription_ids
            .iter()
            .map(|id| match self.subscriptions.get_mut(id) {
                Some(subscription) => {
                    subscription.set_publishing_mode(publishing_enabled);
                    StatusCode::Good
                }
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect()
    }

    /// Reconcile an arriving publish request: apply its
    /// acknowledgements, then let the highest priority late subscription
    /// consume the request immediately. Returns the per acknowledgement
    /// results.
    pub fn on_publish_request(
        &mut self,
        now: DateTimeUtc,
        acknowledgements: &[SubscriptionAcknowledgement],
        engine: &mut dyn PublishEngine,
    ) -> Vec<StatusCode> {
        let results = acknowledgements
            .iter()
            .map(|ack| match self.subscriptions.get_mut(&ack.subscription_id) {
                Some(subscription) => subscription.acknowledge(ack.sequence_number),
                None => StatusCode::BadSubscriptionIdInvalid,
            })
            .collect();

        let mut late: Vec<_> = self
            .subscriptions
            .values_mut()
            .filter(|s| s.state() == SubscriptionState::Late)
            .collect();
        late.sort_by(|a, b| b.priority().cmp(&a.priority()));
        if let Some(subscription) = late.into_iter().next() {
            subscription.tick(now, TickReason::ReceivedPublishRequest, engine);
        }

        results
    }

    /// Propagate a session abort to every subscription. Lifetimes keep
    /// counting; the subscriptions expire unless the session is
    /// re-established or they are transferred.
    pub fn on_session_abort(&mut self) {
        for subscription in self.subscriptions.values_mut() {
            subscription.set_aborted();
        }
    }

    /// Remove a subscription for transfer to another session. The old
    /// session is told with a `GoodSubscriptionTransferred` status
    /// change sent through its publish engine.
    pub fn transfer_out(
        &mut self,
        subscription_id: u32,
        engine: &mut dyn PublishEngine,
    ) -> Result<Subscription, StatusCode> {
        let mut subscription = self
            .subscriptions
            .remove(&subscription_id)
            .ok_or(StatusCode::BadSubscriptionIdInvalid)?;
        subscription.notify_transfer(engine);
        Ok(subscription)
    }

    /// Adopt a subscription transferred from another session.
    pub fn transfer_in(&mut self, mut subscription: Subscription) {
        debug!(
            "session {} adopted subscription {}",
            self.session_id,
            subscription.id()
        );
        subscription.set_session_id(self.session_id.clone());
        self.subscriptions.insert(subscription.id(), subscription);
    }

    /// Terminate every subscription, e.g. on session close.
    pub fn terminate_all(&mut self, engine: &mut dyn PublishEngine) {
        for (_, mut subscription) in self.subscriptions.drain() {
            subscription.terminate(engine);
        }
    }
}

#[cfg(test)]
mod tests {
    use super::MonitoredItemIdHandle;

    #[test]
    fn item_ids_are_unique_across_clones() {
        let handle = MonitoredItemIdHandle::new();
        let clone = handle.clone();
        assert_eq!(handle.next(), 1);
        assert_eq!(clone.next(), 2);
        assert_eq!(handle.next(), 3);
    }
}
