//! Contains the definition of `TwoStateVariable`.

use subscription_types::LocalizedText;

/// A boolean variable displayed as one of two localized text labels,
/// e.g. "Acknowledged" / "Unacknowledged". The visible value is always
/// the label selected by the boolean id.
#[derive(Debug, Clone, PartialEq)]
pub struct TwoStateVariable {
    id: bool,
    true_state: LocalizedText,
    false_state: LocalizedText,
}

impl TwoStateVariable {
    /// Create a variable with the given labels, initially false.
    pub fn new(
        true_state: impl Into<LocalizedText>,
        false_state: impl Into<LocalizedText>,
    ) -> TwoStateVariable {
        TwoStateVariable {
            id: false,
            true_state: true_state.into(),
            false_state: false_state.into(),
        }
    }

    /// The boolean id.
    pub fn id(&self) -> bool {
        self.id
    }

    /// The visible value: the label selected by the id.
    pub fn value(&self) -> &LocalizedText {
        if self.id {
            &self.true_state
        } else {
            &self.false_state
        }
    }

    /// The label shown while the id is true.
    pub fn true_state(&self) -> &LocalizedText {
        &self.true_state
    }

    /// The label shown while the id is false.
    pub fn false_state(&self) -> &LocalizedText {
        &self.false_state
    }

    /// Set the boolean id.
    pub fn set_id(&mut self, id: bool) {
        self.id = id;
    }
}
