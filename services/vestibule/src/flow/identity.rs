//! Identity documents and the registration commit batch.
//!
//! Document layout, all under the document store:
//!
//! - `identities/{identity_id}` — the identity itself,
//! - `identities/{identity_id}/components/{component_id}` — one credential
//!   component,
//! - `identifications/{component_id}/{identification}` — uniqueness index
//!   mapping a handle (e.g. an email address) to the identity that owns it.

use crate::flow::error::FlowError;
use crate::flow::state::PendingComponent;
use crate::store::{DocumentAtomic, DocumentStore, StoreError};
use serde::{Deserialize, Serialize};
use serde_json::Map;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub identity_id: String,
    /// Profile payload embedded in id tokens.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, serde_json::Value>,
}

/// Persisted form of one credential component.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct IdentityComponent {
    pub identity_id: String,
    pub component_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub identification: Option<String>,
    #[serde(default)]
    pub confirmed: bool,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub data: Map<String, serde_json::Value>,
}

pub fn identity_path(identity_id: &str) -> Vec<String> {
    vec!["identities".to_string(), identity_id.to_string()]
}

pub fn component_path(identity_id: &str, component_id: &str) -> Vec<String> {
    vec![
        "identities".to_string(),
        identity_id.to_string(),
        "components".to_string(),
        component_id.to_string(),
    ]
}

pub fn identification_path(component_id: &str, identification: &str) -> Vec<String> {
    vec![
        "identifications".to_string(),
        component_id.to_string(),
        identification.to_string(),
    ]
}

/// Load an identity; a missing document is [`FlowError::Forbidden`] because
/// every caller reaching this point holds a verified claim to the id.
pub async fn load_identity(
    documents: &dyn DocumentStore,
    identity_id: &str,
) -> Result<Identity, FlowError> {
    match documents.get(&identity_path(identity_id)).await {
        Ok(document) => Ok(serde_json::from_value(document.data)?),
        Err(StoreError::NotFound) => Err(FlowError::Forbidden),
        Err(err) => Err(err.into()),
    }
}

/// Load one identity component, `None` when it was never created.
pub async fn load_component(
    documents: &dyn DocumentStore,
    identity_id: &str,
    component_id: &str,
) -> Result<Option<IdentityComponent>, FlowError> {
    match documents.get(&component_path(identity_id, component_id)).await {
        Ok(document) => Ok(Some(serde_json::from_value(document.data)?)),
        Err(StoreError::NotFound) => Ok(None),
        Err(err) => Err(err.into()),
    }
}

/// Build the single atomic batch that materializes a registration: the
/// identity, every accumulated component, and one index entry per non-empty
/// identification. Not-exists checks on the identity and each index entry
/// make two racing registrations for the same handle mutually exclusive.
pub fn registration_commit(
    identity: &Identity,
    pending: &[PendingComponent],
) -> Result<DocumentAtomic, FlowError> {
    let identity_id = identity.identity_id.as_str();
    let mut atomic = DocumentAtomic::new()
        .check(identity_path(identity_id), None)
        .set(identity_path(identity_id), serde_json::to_value(identity)?);

    for draft in pending {
        let component = IdentityComponent {
            identity_id: identity_id.to_string(),
            component_id: draft.component_id.clone(),
            identification: draft.identification.clone(),
            confirmed: draft.confirmed,
            data: draft.data.clone(),
        };
        atomic = atomic.set(
            component_path(identity_id, &draft.component_id),
            serde_json::to_value(&component)?,
        );

        if let Some(identification) = draft.identification.as_deref() {
            if !identification.is_empty() {
                let index = identification_path(&draft.component_id, identification);
                atomic = atomic
                    .check(index.clone(), None)
                    .set(index, serde_json::json!({ "identity_id": identity_id }));
            }
        }
    }
    Ok(atomic)
}
