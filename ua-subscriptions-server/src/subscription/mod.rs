// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! The subscription state machine and its supporting parts: sequence
//! number allocation, the retransmission queue, live diagnostics, the
//! per session container, and the tokio tick driver.

mod diagnostics;
mod retransmission;
mod sequence_number;
mod set;
#[allow(clippy::module_inception)]
mod subscription;
mod ticker;

pub use diagnostics::SubscriptionDiagnostics;
pub use retransmission::RetransmissionQueue;
pub use sequence_number::SequenceNumberGenerator;
pub use set::{MonitoredItemIdHandle, SessionSubscriptions, SubscriptionAcknowledgement};
pub use subscription::{
    RequestedSubscriptionParameters, Subscription, SubscriptionObserver, SubscriptionParameters,
    SubscriptionState, TickReason, TickResult,
};
pub use ticker::SubscriptionTicker;
