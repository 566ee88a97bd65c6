// OPCUA for Rust
// SPDX-License-Identifier: MPL-2.0
// Copyright (C) 2017-2024 Adam Lock

//! Contains the definition of `StatusCode`, the 32 bit status values
//! defined by OPC UA Part 6. Only the codes the subscription and
//! condition services actually return are named here.

use std::fmt;

use serde::{Deserialize, Serialize};

/// An OPC UA status code. The top two bits hold the severity: `00` is
/// good, `01` is uncertain, `10` is bad.
#[derive(Debug, Copy, Clone, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(transparent)]
pub struct StatusCode(u32);

#[allow(non_upper_case_globals)]
impl StatusCode {
    /// The operation succeeded.
    pub const Good: StatusCode = StatusCode(0x0000_0000);
    /// The subscription was transferred to another session.
    pub const GoodSubscriptionTransferred: StatusCode = StatusCode(0x002D_0000);
    /// The operation timed out.
    pub const BadTimeout: StatusCode = StatusCode(0x800A_0000);
    /// There was nothing to do because the request specified no items.
    pub const BadNothingToDo: StatusCode = StatusCode(0x800F_0000);
    /// The request contained too many operations.
    pub const BadTooManyOperations: StatusCode = StatusCode(0x8010_0000);
    /// The subscription id is not valid.
    pub const BadSubscriptionIdInvalid: StatusCode = StatusCode(0x8028_0000);
    /// The node id refers to a node that does not exist.
    pub const BadNodeIdUnknown: StatusCode = StatusCode(0x8034_0000);
    /// The attribute is not supported for the specified node.
    pub const BadAttributeIdInvalid: StatusCode = StatusCode(0x8035_0000);
    /// The syntax of the index range parameter is invalid.
    pub const BadIndexRangeInvalid: StatusCode = StatusCode(0x8036_0000);
    /// The data encoding is invalid.
    pub const BadDataEncodingInvalid: StatusCode = StatusCode(0x8038_0000);
    /// The server does not support the requested data encoding for the node.
    pub const BadDataEncodingUnsupported: StatusCode = StatusCode(0x8039_0000);
    /// The monitoring mode is invalid.
    pub const BadMonitoringModeInvalid: StatusCode = StatusCode(0x8041_0000);
    /// The monitored item id does not refer to a valid monitored item.
    pub const BadMonitoredItemIdInvalid: StatusCode = StatusCode(0x8042_0000);
    /// The monitored item filter parameter is not valid.
    pub const BadMonitoredItemFilterInvalid: StatusCode = StatusCode(0x8043_0000);
    /// The server does not support the requested monitored item filter.
    pub const BadMonitoredItemFilterUnsupported: StatusCode = StatusCode(0x8044_0000);
    /// A monitoring filter cannot be used in combination with the attribute specified.
    pub const BadFilterNotAllowed: StatusCode = StatusCode(0x8045_0000);
    /// The method id does not refer to a method for the specified object.
    pub const BadMethodInvalid: StatusCode = StatusCode(0x8075_0000);
    /// The server has reached its maximum number of subscriptions.
    pub const BadTooManySubscriptions: StatusCode = StatusCode(0x8077_0000);
    /// The sequence number is unknown to the server.
    pub const BadSequenceNumberUnknown: StatusCode = StatusCode(0x807A_0000);
    /// The requested notification message is no longer available.
    pub const BadMessageNotAvailable: StatusCode = StatusCode(0x807B_0000);
    /// The specified event id is not recognized.
    pub const BadEventIdUnknown: StatusCode = StatusCode(0x809A_0000);
    /// The condition branch has already been acknowledged.
    pub const BadConditionBranchAlreadyAcked: StatusCode = StatusCode(0x80D3_0000);
    /// The condition branch has already been confirmed.
    pub const BadConditionBranchAlreadyConfirmed: StatusCode = StatusCode(0x80D4_0000);

    /// Create a status code from raw bits.
    pub fn from_bits(bits: u32) -> StatusCode {
        StatusCode(bits)
    }

    /// The raw 32 bit value of the status code.
    pub fn bits(&self) -> u32 {
        self.0
    }

    /// Whether the severity of the code is good.
    pub fn is_good(&self) -> bool {
        self.0 & 0xC000_0000 == 0
    }

    /// Whether the severity of the code is bad.
    pub fn is_bad(&self) -> bool {
        self.0 & 0x8000_0000 != 0
    }

    /// The symbolic name of the code, or `"Unknown"` for values this
    /// crate does not name.
    pub fn name(&self) -> &'static str {
        match *self {
            StatusCode::Good => "Good",
            StatusCode::GoodSubscriptionTransferred => "GoodSubscriptionTransferred",
            StatusCode::BadTimeout => "BadTimeout",
            StatusCode::BadNothingToDo => "BadNothingToDo",
            StatusCode::BadTooManyOperations => "BadTooManyOperations",
            StatusCode::BadSubscriptionIdInvalid => "BadSubscriptionIdInvalid",
            StatusCode::BadNodeIdUnknown => "BadNodeIdUnknown",
            StatusCode::BadAttributeIdInvalid => "BadAttributeIdInvalid",
            StatusCode::BadIndexRangeInvalid => "BadIndexRangeInvalid",
            StatusCode::BadDataEncodingInvalid => "BadDataEncodingInvalid",
            StatusCode::BadDataEncodingUnsupported => "BadDataEncodingUnsupported",
            StatusCode::BadMonitoringModeInvalid => "BadMonitoringModeInvalid",
            StatusCode::BadMonitoredItemIdInvalid => "BadMonitoredItemIdInvalid",
            StatusCode::BadMonitoredItemFilterInvalid => "BadMonitoredItemFilterInvalid",
            StatusCode::BadMonitoredItemFilterUnsupported => "BadMonitoredItemFilterUnsupported",
            StatusCode::BadFilterNotAllowed => "BadFilterNotAllowed",
            StatusCode::BadMethodInvalid => "BadMethodInvalid",
            StatusCode::BadTooManySubscriptions => "BadTooManySubscriptions",
            StatusCode::BadSequenceNumberUnknown => "BadSequenceNumberUnknown",
            StatusCode::BadMessageNotAvailable => "BadMessageNotAvailable",
            StatusCode::BadEventIdUnknown => "BadEventIdUnknown",
            StatusCode::BadConditionBranchAlreadyAcked => "BadConditionBranchAlreadyAcked",
            StatusCode::BadConditionBranchAlreadyConfirmed => "BadConditionBranchAlreadyConfirmed",
            _ => "Unknown",
        }
    }
}

impl fmt::Display for StatusCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = self.name();
        if name == "Unknown" {
            write!(f, "StatusCode(0x{:08X})", self.0)
        } else {
            write!(f, "{name}")
        }
    }
}

#[cfg(test)]
mod tests {
    use super::StatusCode;

    #[test]
    fn severity() {
        assert!(StatusCode::Good.is_good());
        assert!(StatusCode::GoodSubscriptionTransferred.is_good());
        assert!(!StatusCode::GoodSubscriptionTransferred.is_bad());
        assert!(StatusCode::BadTimeout.is_bad());
        assert!(!StatusCode::BadSequenceNumberUnknown.is_good());
    }

    #[test]
    fn names() {
        assert_eq!(StatusCode::Good.name(), "Good");
        assert_eq!(
            StatusCode::BadConditionBranchAlreadyAcked.to_string(),
            "BadConditionBranchAlreadyAcked"
        );
        assert_eq!(
            StatusCode::from_bits(0xDEAD_0000).to_string(),
            "StatusCode(0xDEAD0000)"
        );
    }
}
