//! Drives one subscription's periodic tick on the tokio runtime.

use std::sync::Arc;

use tokio::time::{interval, MissedTickBehavior};
use tracing::debug;

use subscription_types::DateTimeUtc;

use crate::{publish::PublishEngine, sync::Mutex};

use super::subscription::{Subscription, TickReason};

type Clock = Box<dyn Fn() -> DateTimeUtc + Send>;

/// The periodic tick loop of one subscription. Fires every publishing
/// interval, restarts itself when a modify changes the interval, drains
/// back to back when a tick leaves more messages ready, and exits once
/// the subscription reaches a terminal state.
pub struct SubscriptionTicker {
    subscription: Arc<Mutex<Subscription>>,
    engine: Arc<Mutex<dyn PublishEngine + Send>>,
    clock: Clock,
}

impl SubscriptionTicker {
    /// Create a ticker over a shared subscription and publish engine,
    /// using the wall clock.
    pub fn new(
        subscription: Arc<Mutex<Subscription>>,
        engine: Arc<Mutex<dyn PublishEngine + Send>>,
    ) -> SubscriptionTicker {
        Self::new_with_clock(subscription, engine, Box::new(chrono::Utc::now))
    }

    /// Create a ticker with an injected clock, so tests can drive
    /// simulated time.
    pub fn new_with_clock(
        subscription: Arc<Mutex<Subscription>>,
        engine: Arc<Mutex<dyn PublishEngine + Send>>,
        clock: Clock,
    ) -> SubscriptionTicker {
        SubscriptionTicker {
            subscription,
            engine,
            clock,
        }
    }

    /// Run the tick loop until the subscription terminates.
    pub async fn run(self) {
        let (subscription_id, mut publishing_interval) = {
            let subscription = self.subscription.lock();
            (subscription.id(), subscription.publishing_interval())
        };
        let mut timer = interval(publishing_interval);
        timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
        // The first interval tick completes immediately; skip it so the
        // first subscription tick happens one publishing interval in.
        timer.tick().await;

        loop {
            timer.tick().await;
            loop {
                let result = {
                    let mut subscription = self.subscription.lock();
                    let mut engine = self.engine.lock();
                    subscription.tick((self.clock)(), TickReason::TickTimerFired, &mut *engine)
                };
                if !result.more_to_send {
                    break;
                }
                // Back to back drain: tick again without waiting for the
                // timer.
                tokio::task::yield_now().await;
            }

            let (terminal, current_interval) = {
                let subscription = self.subscription.lock();
                (subscription.is_terminal(), subscription.publishing_interval())
            };
            if terminal {
                debug!("subscription {subscription_id} ticker stopping");
                break;
            }
            if current_interval != publishing_interval {
                publishing_interval = current_interval;
                debug!(
                    "subscription {subscription_id} ticker restarting at {publishing_interval:?}"
                );
                timer = interval(publishing_interval);
                timer.set_missed_tick_behavior(MissedTickBehavior::Delay);
                timer.tick().await;
            }
        }
    }
}
