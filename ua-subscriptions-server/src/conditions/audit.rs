//! The audit events raised by operator and server actions on
//! acknowledgeable conditions. Type names follow the OPC UA nodeset.

use subscription_types::{ByteString, DateTimeUtc, LocalizedText, NodeId, StatusCode, Variant};

/// The fields shared by all condition audit events, corresponding to
/// AuditConditionEventType in OPC UA Part 9.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConditionEventType {
    /// A unique identifier for this audit event.
    pub event_id: ByteString,
    /// When the audited action was performed.
    pub action_time_stamp: DateTimeUtc,
    /// The outcome of the audited action.
    pub status: StatusCode,
    /// A human readable description of the action, e.g.
    /// "Method/Acknowledge".
    pub message: LocalizedText,
    /// The event id of the condition branch the action applied to.
    pub condition_event_id: ByteString,
    /// The comment supplied with the action.
    pub comment: LocalizedText,
    /// The server the action was performed on, when known.
    pub server_id: Option<String>,
    /// The client audit entry id, when supplied.
    pub client_audit_entry_id: Option<String>,
    /// The user the client session ran as, when known.
    pub client_user_id: Option<String>,
    /// The method invoked, for method initiated actions.
    pub method_id: Option<NodeId>,
    /// The input arguments of the method invocation.
    pub input_arguments: Vec<Variant>,
}

impl AuditConditionEventType {
    /// Create an audit event stamped with the current time.
    pub fn new_now(
        message: impl Into<LocalizedText>,
        condition_event_id: ByteString,
        comment: LocalizedText,
    ) -> AuditConditionEventType {
        AuditConditionEventType {
            event_id: ByteString::random(),
            action_time_stamp: chrono::Utc::now(),
            status: StatusCode::Good,
            message: message.into(),
            condition_event_id,
            comment,
            server_id: None,
            client_audit_entry_id: None,
            client_user_id: None,
            method_id: None,
            input_arguments: Vec::new(),
        }
    }

    /// Set the user the action was performed by.
    pub fn set_client_user_id(mut self, client_user_id: impl Into<String>) -> Self {
        self.client_user_id = Some(client_user_id.into());
        self
    }

    /// Set the method the action was invoked through.
    pub fn set_method_id(mut self, method_id: NodeId) -> Self {
        self.method_id = Some(method_id);
        self
    }
}

/// Raised when a condition branch is acknowledged.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConditionAcknowledgeEventType {
    /// The common audit fields.
    pub base: AuditConditionEventType,
}

/// Raised when a condition branch is confirmed.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConditionConfirmEventType {
    /// The common audit fields.
    pub base: AuditConditionEventType,
}

/// Raised when a comment is added to a condition branch.
#[derive(Debug, Clone, PartialEq)]
pub struct AuditConditionCommentEventType {
    /// The common audit fields.
    pub base: AuditConditionEventType,
}

/// Any audit event a condition can raise.
#[derive(Debug, Clone, PartialEq)]
pub enum AuditConditionEvent {
    /// An acknowledge action.
    Acknowledge(AuditConditionAcknowledgeEventType),
    /// A confirm action.
    Confirm(AuditConditionConfirmEventType),
    /// A comment action.
    Comment(AuditConditionCommentEventType),
}

impl AuditConditionEvent {
    /// The common audit fields of the event.
    pub fn base(&self) -> &AuditConditionEventType {
        match self {
            AuditConditionEvent::Acknowledge(e) => &e.base,
            AuditConditionEvent::Confirm(e) => &e.base,
            AuditConditionEvent::Comment(e) => &e.base,
        }
    }

    /// The nodeset name of the event type.
    pub fn type_name(&self) -> &'static str {
        match self {
            AuditConditionEvent::Acknowledge(_) => "AuditConditionAcknowledgeEventType",
            AuditConditionEvent::Confirm(_) => "AuditConditionConfirmEventType",
            AuditConditionEvent::Comment(_) => "AuditConditionCommentEventType",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::{AuditConditionAcknowledgeEventType, AuditConditionEvent, AuditConditionEventType};
    use subscription_types::{ByteString, LocalizedText, StatusCode};

    #[test]
    fn new_now_defaults() {
        let condition_event_id = ByteString::random();
        let audit = AuditConditionEventType::new_now(
            "Method/Acknowledge",
            condition_event_id.clone(),
            LocalizedText::from("looked into it"),
        );
        assert_eq!(audit.status, StatusCode::Good);
        assert_eq!(audit.condition_event_id, condition_event_id);
        assert!(!audit.event_id.is_null());
        assert!(audit.client_user_id.is_none());
    }

    #[test]
    fn type_names_match_nodeset() {
        let event = AuditConditionEvent::Acknowledge(AuditConditionAcknowledgeEventType {
            base: AuditConditionEventType::new_now(
                "Method/Acknowledge",
                ByteString::random(),
                LocalizedText::null(),
            ),
        });
        assert_eq!(event.type_name(), "AuditConditionAcknowledgeEventType");
    }
}
