//! Contains `AcknowledgeableCondition`, the acknowledge / confirm state
//! overlay on top of an event emitting condition.

use hashbrown::HashMap;
use thiserror::Error;
use tracing::{debug, trace};

use subscription_types::{ByteString, LocalizedText, NodeId, StatusCode};

use super::{
    audit::{
        AuditConditionAcknowledgeEventType, AuditConditionCommentEventType,
        AuditConditionConfirmEventType, AuditConditionEvent, AuditConditionEventType,
    },
    snapshot::{ConditionEventSink, ConditionSnapshot},
};

/// Why an acknowledge or confirm operation was rejected.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ConditionError {
    /// No branch of this condition carries the given event id.
    #[error("no condition branch carries the given event id")]
    UnknownEventId,
    /// The branch has already been acknowledged.
    #[error("the condition branch has already been acknowledged")]
    AlreadyAcknowledged,
    /// The branch has already been confirmed.
    #[error("the condition branch has already been confirmed")]
    AlreadyConfirmed,
    /// The condition was instantiated without confirmation support.
    #[error("the condition does not expose a confirm method")]
    ConfirmNotSupported,
}

impl From<ConditionError> for StatusCode {
    fn from(error: ConditionError) -> StatusCode {
        match error {
            ConditionError::UnknownEventId => StatusCode::BadEventIdUnknown,
            ConditionError::AlreadyAcknowledged => StatusCode::BadConditionBranchAlreadyAcked,
            ConditionError::AlreadyConfirmed => StatusCode::BadConditionBranchAlreadyConfirmed,
            ConditionError::ConfirmNotSupported => StatusCode::BadMethodInvalid,
        }
    }
}

struct NullSink;

impl ConditionEventSink for NullSink {}

/// A condition whose events an operator acknowledges and, optionally,
/// confirms.
///
/// The condition owns its current branch (null branch id) and the
/// historical branches still awaiting acknowledgement or confirmation,
/// keyed by the event id they were published under. The confirm
/// capability is fixed at instantiation; a condition built without it
/// rejects confirm calls the way a node without the method would.
pub struct AcknowledgeableCondition {
    node_id: NodeId,
    condition_name: String,
    current: ConditionSnapshot,
    branches: HashMap<ByteString, ConditionSnapshot>,
    has_confirmed_state: bool,
    sink: Box<dyn ConditionEventSink>,
}

impl AcknowledgeableCondition {
    /// Instantiate a condition. `supports_confirmation` installs the
    /// confirmed state machinery and the confirm method binding.
    pub fn new(
        node_id: NodeId,
        condition_name: impl Into<String>,
        supports_confirmation: bool,
    ) -> AcknowledgeableCondition {
        AcknowledgeableCondition {
            node_id,
            condition_name: condition_name.into(),
            current: ConditionSnapshot::new(supports_confirmation),
            branches: HashMap::new(),
            has_confirmed_state: supports_confirmation,
            sink: Box::new(NullSink),
        }
    }

    /// Install the sink receiving this condition's events.
    pub fn set_sink(&mut self, sink: Box<dyn ConditionEventSink>) {
        self.sink = sink;
    }

    /// The node id of the condition.
    pub fn node_id(&self) -> &NodeId {
        &self.node_id
    }

    /// The condition name.
    pub fn condition_name(&self) -> &str {
        &self.condition_name
    }

    /// Whether the condition supports confirmation.
    pub fn supports_confirmation(&self) -> bool {
        self.has_confirmed_state
    }

    /// The current branch state.
    pub fn current_branch(&self) -> &ConditionSnapshot {
        &self.current
    }

    /// The historical branches, in no particular order.
    pub fn branches(&self) -> impl Iterator<Item = &ConditionSnapshot> {
        self.branches.values()
    }

    /// The branches still retained for clients.
    pub fn retained_branches(&self) -> impl Iterator<Item = &ConditionSnapshot> {
        self.branches.values().filter(|b| b.retain())
    }

    /// Look up a branch by the event id it was published under, current
    /// branch included.
    pub fn branch(&self, event_id: &ByteString) -> Option<&ConditionSnapshot> {
        if self.current.event_id() == event_id {
            Some(&self.current)
        } else {
            self.branches.get(event_id)
        }
    }

    /// Capture the current state as a historical branch and give the
    /// current branch a fresh event id. Returns the event id keying the
    /// new branch.
    pub fn create_branch(&mut self) -> ByteString {
        let mut branch = self.current.clone();
        branch.set_branch_id(NodeId::new_guid(self.node_id.namespace));
        let event_id = branch.event_id().clone();
        debug!(
            "condition {} created branch {} for event {:?}",
            self.condition_name,
            branch.branch_id(),
            event_id
        );
        self.sink.new_branch_state(&branch);
        self.branches.insert(event_id.clone(), branch);
        self.current.set_event_id(ByteString::random());
        event_id
    }

    /// Update the message published with the current branch.
    pub fn set_message(&mut self, message: impl Into<LocalizedText>) {
        self.current.set_message(message.into());
    }

    /// Acknowledge the branch carrying the given event id, as invoked by
    /// the client facing Acknowledge method.
    pub fn acknowledge(
        &mut self,
        event_id: &ByteString,
        comment: LocalizedText,
    ) -> Result<(), ConditionError> {
        self.acknowledge_branch(event_id, comment, "Method/Acknowledged")
    }

    /// Confirm the branch carrying the given event id, as invoked by the
    /// client facing Confirm method.
    pub fn confirm(
        &mut self,
        event_id: &ByteString,
        comment: LocalizedText,
    ) -> Result<(), ConditionError> {
        if !self.has_confirmed_state {
            return Err(ConditionError::ConfirmNotSupported);
        }
        let branch = Self::resolve(&mut self.current, &mut self.branches, event_id)
            .ok_or(ConditionError::UnknownEventId)?;
        if branch.confirmed_state() == Some(true) {
            return Err(ConditionError::AlreadyConfirmed);
        }
        self.confirm_branch(event_id, comment, "Method/Confirm")
    }

    /// Confirm a branch on the server's own initiative. The branch must
    /// be awaiting confirmation.
    pub fn auto_confirm_branch(
        &mut self,
        event_id: &ByteString,
        comment: LocalizedText,
    ) -> Result<(), ConditionError> {
        assert!(
            self.has_confirmed_state,
            "auto confirm on a condition without confirmed state"
        );
        let branch = Self::resolve(&mut self.current, &mut self.branches, event_id)
            .ok_or(ConditionError::UnknownEventId)?;
        assert_eq!(
            branch.confirmed_state(),
            Some(false),
            "auto confirm requires a branch awaiting confirmation"
        );
        self.confirm_branch(event_id, comment, "Server/Confirm")
    }

    /// Acknowledge a branch and immediately confirm it, both on the
    /// server's own initiative.
    pub fn acknowledge_and_auto_confirm_branch(
        &mut self,
        event_id: &ByteString,
        comment: LocalizedText,
    ) -> Result<(), ConditionError> {
        self.acknowledge_branch(event_id, comment.clone(), "Server/Acknowledge")?;
        self.auto_confirm_branch(event_id, comment)
    }

    fn resolve<'a>(
        current: &'a mut ConditionSnapshot,
        branches: &'a mut HashMap<ByteString, ConditionSnapshot>,
        event_id: &ByteString,
    ) -> Option<&'a mut ConditionSnapshot> {
        if current.event_id() == event_id {
            Some(current)
        } else {
            branches.get_mut(event_id)
        }
    }

    fn acknowledge_branch(
        &mut self,
        event_id: &ByteString,
        comment: LocalizedText,
        message: &str,
    ) -> Result<(), ConditionError> {
        let has_confirmed_state = self.has_confirmed_state;
        let sink = self.sink.as_mut();
        let branch = Self::resolve(&mut self.current, &mut self.branches, event_id)
            .ok_or(ConditionError::UnknownEventId)?;

        // An acknowledged branch either starts waiting for confirmation
        // or stops being of interest.
        if has_confirmed_state {
            branch.set_confirmed_state(false, sink);
            branch.set_retain(true, sink);
        } else {
            branch.set_retain(false, sink);
        }
        if branch.set_acked_state(true, sink) != StatusCode::Good {
            return Err(ConditionError::AlreadyAcknowledged);
        }
        branch.set_comment(comment.clone(), sink);
        sink.new_branch_state(branch);

        let branch_id = branch.branch_id().clone();
        trace!("condition branch {branch_id} acknowledged: {message}");
        sink.audit_event(AuditConditionEvent::Acknowledge(
            AuditConditionAcknowledgeEventType {
                base: AuditConditionEventType::new_now(
                    message,
                    event_id.clone(),
                    comment.clone(),
                ),
            },
        ));
        sink.acknowledged(event_id, &comment, &branch_id);
        Ok(())
    }

    fn confirm_branch(
        &mut self,
        event_id: &ByteString,
        comment: LocalizedText,
        message: &str,
    ) -> Result<(), ConditionError> {
        let sink = self.sink.as_mut();
        let branch = Self::resolve(&mut self.current, &mut self.branches, event_id)
            .ok_or(ConditionError::UnknownEventId)?;
        debug_assert_eq!(
            branch.event_id(),
            event_id,
            "confirm resolved a branch with a different event id"
        );

        branch.set_confirmed_state(true, sink);
        branch.set_retain(false, sink);
        branch.set_comment(comment.clone(), sink);

        let branch_id = branch.branch_id().clone();
        trace!("condition branch {branch_id} confirmed: {message}");
        sink.audit_event(AuditConditionEvent::Comment(AuditConditionCommentEventType {
            base: AuditConditionEventType::new_now(message, event_id.clone(), comment.clone()),
        }));
        sink.audit_event(AuditConditionEvent::Confirm(AuditConditionConfirmEventType {
            base: AuditConditionEventType::new_now(message, event_id.clone(), comment.clone()),
        }));
        sink.new_branch_state(branch);
        sink.confirmed(event_id, &comment, &branch_id);

        // A confirmed branch that is no longer retained is done for.
        if !branch_id.is_null() {
            self.branches.remove(event_id);
            debug!(
                "condition {} dropped confirmed branch {branch_id}",
                self.condition_name
            );
        }
        Ok(())
    }
}

impl std::fmt::Debug for AcknowledgeableCondition {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AcknowledgeableCondition")
            .field("node_id", &self.node_id)
            .field("condition_name", &self.condition_name)
            .field("has_confirmed_state", &self.has_confirmed_state)
            .field("branches", &self.branches.len())
            .finish()
    }
}
