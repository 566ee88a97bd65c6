// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

#![warn(missing_docs)]

//! Server side subscription engine for OPC UA: the per subscription
//! publishing cycle with keep alive and lifetime handling, notification
//! assembly and sequencing, publish request reconciliation, a bounded
//! retransmission queue, and the acknowledgeable condition overlay
//! (two state variables, branches, acknowledge / confirm, audit events).
//!
//! Wire encoding, the address space, and monitored item sampling are
//! external collaborators reached through the traits in
//! [`publish`], [`address_space`] and [`monitored_item`].

pub mod address_space;
pub mod conditions;
pub mod monitored_item;
pub mod publish;
pub mod subscription;

/// Re-export of the data types crate.
pub use subscription_types as types;

/// Contains engine wide constants.
pub mod constants {
    /// The shortest publishing interval a subscription will be revised to.
    pub const MIN_PUBLISHING_INTERVAL_MS: f64 = 50.0;
    /// The longest publishing interval a subscription will be revised to,
    /// 15 days.
    pub const MAX_PUBLISHING_INTERVAL_MS: f64 = 15.0 * 24.0 * 3600.0 * 1000.0;
    /// The publishing interval used when the client requests none.
    pub const DEFAULT_PUBLISHING_INTERVAL_MS: f64 = 1000.0;
    /// The smallest permitted max keep alive count.
    pub const MIN_KEEP_ALIVE_COUNT: u32 = 2;
    /// The largest permitted max keep alive count.
    pub const MAX_KEEP_ALIVE_COUNT: u32 = 12000;
    /// A subscription must survive at least this long without client
    /// activity, used to raise requested lifetime counts.
    pub const MIN_LIFETIME_DURATION_MS: f64 = 5000.0;
    /// How many sent notification messages are retained for
    /// retransmission before the oldest are discarded.
    pub const MAX_RETRANSMISSION_QUEUE_SIZE: usize = 100;
    /// The fastest sampling interval a monitored item will be revised to.
    pub const MIN_SAMPLING_INTERVAL_MS: f64 = 50.0;
    /// The slowest sampling interval a monitored item will be revised to,
    /// one hour.
    pub const MAX_SAMPLING_INTERVAL_MS: f64 = 3600.0 * 1000.0;
    /// Initial capacity of the monitored item map of a subscription.
    pub const DEFAULT_MONITORED_ITEM_CAPACITY: usize = 100;
}

/// Common synchronous locks. Re-exports locks from parking_lot used
/// internally.
pub mod sync {
    /// Read-write lock. Use this if you usually only need to read the value.
    pub type RwLock<T> = parking_lot::RwLock<T>;
    /// Mutually exclusive lock. Use this if you need both read and write often.
    pub type Mutex<T> = parking_lot::Mutex<T>;
}
