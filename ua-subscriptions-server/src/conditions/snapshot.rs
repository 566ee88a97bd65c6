//! Contains `ConditionSnapshot`, the mutable per branch state of a
//! condition.

use tracing::trace;
use subscription_types::{
    ByteString, DateTimeUtc, LocalizedText, NodeId, StatusCode, Variant,
};

use super::{audit::AuditConditionEvent, two_state::TwoStateVariable};

/// Names the condition variable a change event refers to.
#[derive(Debug, Copy, Clone, PartialEq, Eq)]
pub enum ConditionVariable {
    /// The boolean id of the acknowledged state.
    AckedStateId,
    /// The boolean id of the confirmed state.
    ConfirmedStateId,
    /// The comment.
    Comment,
    /// The retain flag.
    Retain,
}

/// Receives the events condition state changes raise synchronously. All
/// methods default to doing nothing.
///
/// `value_changed` for a snapshot on the current branch (null branch id)
/// is the server's cue to mirror the value onto the live condition node.
#[allow(unused_variables)]
pub trait ConditionEventSink: Send {
    /// A condition variable changed value on the given branch.
    fn value_changed(&mut self, branch_id: &NodeId, variable: ConditionVariable, value: Variant) {}

    /// A branch's state should be republished as an event notification.
    fn new_branch_state(&mut self, snapshot: &ConditionSnapshot) {}

    /// An audit event was raised.
    fn audit_event(&mut self, event: AuditConditionEvent) {}

    /// A branch was acknowledged.
    fn acknowledged(&mut self, event_id: &ByteString, comment: &LocalizedText, branch_id: &NodeId) {
    }

    /// A branch was confirmed.
    fn confirmed(&mut self, event_id: &ByteString, comment: &LocalizedText, branch_id: &NodeId) {}
}

/// A copy of a condition's properties at the moment a branch was
/// captured: the current branch carries a null branch id, historical
/// branches a generated one. Mutated by acknowledge and confirm
/// operations, published as event data, and destroyed once confirmed and
/// no longer retained.
#[derive(Debug, Clone)]
pub struct ConditionSnapshot {
    branch_id: NodeId,
    event_id: ByteString,
    message: LocalizedText,
    comment: LocalizedText,
    retain: bool,
    time: DateTimeUtc,
    acked_state: TwoStateVariable,
    confirmed_state: Option<TwoStateVariable>,
}

impl ConditionSnapshot {
    /// Create the initial current branch state of a condition.
    pub(super) fn new(supports_confirmation: bool) -> ConditionSnapshot {
        ConditionSnapshot {
            branch_id: NodeId::null(),
            event_id: ByteString::random(),
            message: LocalizedText::null(),
            comment: LocalizedText::null(),
            retain: false,
            time: chrono::Utc::now(),
            acked_state: TwoStateVariable::new("Acknowledged", "Unacknowledged"),
            confirmed_state: supports_confirmation
                .then(|| TwoStateVariable::new("Confirmed", "Unconfirmed")),
        }
    }

    /// The branch id; null for the current branch.
    pub fn branch_id(&self) -> &NodeId {
        &self.branch_id
    }

    /// Whether this snapshot is the condition's current branch.
    pub fn is_current_branch(&self) -> bool {
        self.branch_id.is_null()
    }

    /// The id of the event this branch state was last published under.
    pub fn event_id(&self) -> &ByteString {
        &self.event_id
    }

    /// The message of the condition at capture time.
    pub fn message(&self) -> &LocalizedText {
        &self.message
    }

    /// The comment last applied to the branch.
    pub fn comment(&self) -> &LocalizedText {
        &self.comment
    }

    /// Whether the branch is still of interest to clients.
    pub fn retain(&self) -> bool {
        self.retain
    }

    /// When the branch state last changed.
    pub fn time(&self) -> DateTimeUtc {
        self.time
    }

    /// The acknowledged state id.
    pub fn acked_state(&self) -> bool {
        self.acked_state.id()
    }

    /// The acknowledged state variable.
    pub fn acked_state_variable(&self) -> &TwoStateVariable {
        &self.acked_state
    }

    /// The confirmed state id, `None` when the condition does not
    /// support confirmation.
    pub fn confirmed_state(&self) -> Option<bool> {
        self.confirmed_state.as_ref().map(|v| v.id())
    }

    /// The confirmed state variable, when supported.
    pub fn confirmed_state_variable(&self) -> Option<&TwoStateVariable> {
        self.confirmed_state.as_ref()
    }

    pub(super) fn set_branch_id(&mut self, branch_id: NodeId) {
        self.branch_id = branch_id;
    }

    pub(super) fn set_event_id(&mut self, event_id: ByteString) {
        self.event_id = event_id;
    }

    pub(super) fn set_message(&mut self, message: LocalizedText) {
        self.message = message;
    }

    /// Set the acknowledged state. Acknowledging an already acknowledged
    /// branch fails with `BadConditionBranchAlreadyAcked` and changes
    /// nothing.
    pub(super) fn set_acked_state(
        &mut self,
        value: bool,
        sink: &mut dyn ConditionEventSink,
    ) -> StatusCode {
        if value && self.acked_state.id() {
            return StatusCode::BadConditionBranchAlreadyAcked;
        }
        self.acked_state.set_id(value);
        self.touch();
        trace!("branch {} acked state set to {}", self.branch_id, value);
        sink.value_changed(
            &self.branch_id,
            ConditionVariable::AckedStateId,
            Variant::Boolean(value),
        );
        StatusCode::Good
    }

    /// Set the confirmed state. Only called on conditions that support
    /// confirmation.
    pub(super) fn set_confirmed_state(&mut self, value: bool, sink: &mut dyn ConditionEventSink) {
        let Some(confirmed_state) = self.confirmed_state.as_mut() else {
            debug_assert!(false, "condition does not carry a confirmed state");
            return;
        };
        confirmed_state.set_id(value);
        self.touch();
        sink.value_changed(
            &self.branch_id,
            ConditionVariable::ConfirmedStateId,
            Variant::Boolean(value),
        );
    }

    pub(super) fn set_comment(&mut self, comment: LocalizedText, sink: &mut dyn ConditionEventSink) {
        self.comment = comment.clone();
        self.touch();
        sink.value_changed(
            &self.branch_id,
            ConditionVariable::Comment,
            Variant::LocalizedText(Box::new(comment)),
        );
    }

    pub(super) fn set_retain(&mut self, retain: bool, sink: &mut dyn ConditionEventSink) {
        self.retain = retain;
        self.touch();
        sink.value_changed(
            &self.branch_id,
            ConditionVariable::Retain,
            Variant::Boolean(retain),
        );
    }

    fn touch(&mut self) {
        self.time = chrono::Utc::now();
    }
}
