//! Continuation state: everything a ceremony remembers between two stateless
//! requests. Serialized into the `state` claim of the continuation token and
//! nowhere else.

use serde::{Deserialize, Serialize};
use serde_json::Map;

/// Payload of the signed continuation token.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ContinuationState {
    /// Identity being authenticated or registered, once known.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identity_id: Option<String>,

    /// Component ids completed so far, in completion order. The sole
    /// progress cursor.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub completed: Vec<String>,

    /// Scope strings requested when the authentication ceremony began.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub scope: Vec<String>,

    /// Registration only: identity component drafts collected so far, not
    /// yet persisted anywhere.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub pending: Vec<PendingComponent>,
}

impl ContinuationState {
    /// Ids of the accumulated registration drafts, in order.
    #[must_use]
    pub fn pending_ids(&self) -> Vec<String> {
        self.pending
            .iter()
            .map(|component| component.component_id.clone())
            .collect()
    }
}

/// One identity component draft accumulated during registration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct PendingComponent {
    pub component_id: String,

    /// Globally unique handle (e.g. an email address), when the component
    /// has one. Enforced at commit time through the identification index.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<String>,

    /// Whether the component's value has been proven. Registration never
    /// advances past an unconfirmed draft.
    #[serde(default)]
    pub confirmed: bool,

    /// Provider-defined payload persisted with the component.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::{ContinuationState, PendingComponent};

    #[test]
    fn default_state_is_empty() {
        let state = ContinuationState::default();
        assert!(state.identity_id.is_none());
        assert!(state.completed.is_empty());
        assert!(state.scope.is_empty());
        assert!(state.pending.is_empty());
    }

    #[test]
    fn empty_state_serializes_to_empty_object() {
        let json = serde_json::to_value(ContinuationState::default()).unwrap();
        assert_eq!(json, serde_json::json!({}));
    }

    #[test]
    fn state_round_trips_through_json() {
        let state = ContinuationState {
            identity_id: Some("identity-1".into()),
            completed: vec!["email".into()],
            scope: vec!["profile".into()],
            pending: vec![PendingComponent {
                component_id: "email".into(),
                identification: Some("a@example.com".into()),
                confirmed: false,
                data: serde_json::Map::new(),
            }],
        };
        let json = serde_json::to_string(&state).unwrap();
        let back: ContinuationState = serde_json::from_str(&json).unwrap();
        assert_eq!(back, state);
    }
}
