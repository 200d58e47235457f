//! Identity component provider contract and registry.
//!
//! A provider implements one credential type's behavior: how to prompt for
//! it, verify a submitted value, set it up during registration, and confirm
//! it. The ceremony core never knows what a credential *is*; it only
//! dispatches through this contract.

use crate::flow::error::FlowError;
use crate::flow::identity::IdentityComponent;
use crate::flow::state::PendingComponent;
use crate::flow::types::ComponentPrompt;
use crate::store::{DocumentStore, Notifier};
use async_trait::async_trait;
use ceremony::CeremonyNode;
use regex::Regex;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

/// What a provider learned from a submitted sign-in value.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SignInVerification {
    /// Wrong value; the caller may retry the same step.
    Denied,
    /// Accepted for the identity already carried in the state.
    Granted,
    /// Accepted, and the provider itself discovered which identity is
    /// authenticating (e.g. by email lookup).
    Identified(String),
}

/// Collaborators a provider may reach during a call.
pub struct ProviderContext<'a> {
    /// Identity in progress, once known.
    pub identity_id: Option<&'a str>,
    pub documents: &'a dyn DocumentStore,
    pub notifier: &'a dyn Notifier,
}

/// Capability contract for one credential component type.
///
/// Only `sign_in_prompt`/`verify_sign_in` (authentication) and
/// `setup_prompt`/`setup_component` (registration) are mandatory; the rest
/// default to "not supported". A provider whose `setup_component` returns
/// unconfirmed drafts must also implement the validation methods, since
/// registration freezes on an unconfirmed draft until one confirms it.
#[async_trait]
pub trait IdentityComponentProvider: Send + Sync {
    /// Describe what the client must present to sign in with this component.
    async fn sign_in_prompt(&self, ctx: &ProviderContext<'_>) -> Result<ComponentPrompt, FlowError>;

    /// Verify a submitted sign-in value.
    async fn verify_sign_in(
        &self,
        ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<SignInVerification, FlowError>;

    /// Adaptive flows: return `true` when the existing component makes the
    /// prompt unnecessary (e.g. a policy already accepted).
    async fn skip_sign_in(
        &self,
        _ctx: &ProviderContext<'_>,
        _component: &IdentityComponent,
    ) -> Result<bool, FlowError> {
        Ok(false)
    }

    /// Deliver an out-of-band challenge (e.g. an OTP). Returns whether
    /// delivery was accepted.
    async fn send_sign_in_prompt(
        &self,
        _ctx: &ProviderContext<'_>,
        _locale: Option<&str>,
    ) -> Result<bool, FlowError> {
        Ok(false)
    }

    /// Describe what the client must present to set this component up.
    async fn setup_prompt(&self, ctx: &ProviderContext<'_>) -> Result<ComponentPrompt, FlowError>;

    /// Build a component draft from a submitted setup value. Return it
    /// unconfirmed to require a validation round before registration may
    /// advance.
    async fn setup_component(
        &self,
        ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<PendingComponent, FlowError>;

    /// Prompt shown while an unconfirmed draft awaits its code.
    async fn validation_prompt(
        &self,
        _ctx: &ProviderContext<'_>,
        _draft: &PendingComponent,
    ) -> Result<Option<ComponentPrompt>, FlowError> {
        Ok(None)
    }

    /// Deliver a validation code for an unconfirmed draft.
    async fn send_validation_code(
        &self,
        _ctx: &ProviderContext<'_>,
        _draft: &PendingComponent,
        _locale: Option<&str>,
    ) -> Result<bool, FlowError> {
        Ok(false)
    }

    /// Check a submitted validation code against an unconfirmed draft.
    async fn verify_validation_code(
        &self,
        _ctx: &ProviderContext<'_>,
        _draft: &PendingComponent,
        _value: &Value,
    ) -> Result<bool, FlowError> {
        Ok(false)
    }
}

fn is_valid_component_id(id: &str) -> bool {
    Regex::new(r"^[a-z0-9][a-z0-9_-]*$").is_ok_and(|regex| regex.is_match(id))
}

/// Component id → provider mapping, assembled once at startup.
#[derive(Default)]
pub struct ProviderRegistry {
    providers: HashMap<String, Arc<dyn IdentityComponentProvider>>,
}

impl ProviderRegistry {
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn register(
        mut self,
        component_id: impl Into<String>,
        provider: Arc<dyn IdentityComponentProvider>,
    ) -> Self {
        self.providers.insert(component_id.into(), provider);
        self
    }

    /// Look up the provider for a component id.
    ///
    /// # Errors
    ///
    /// [`FlowError::UnknownIdentityComponent`] when no provider is
    /// registered under that id.
    pub fn get(&self, component_id: &str) -> Result<&Arc<dyn IdentityComponentProvider>, FlowError> {
        self.providers
            .get(component_id)
            .ok_or_else(|| FlowError::UnknownIdentityComponent(component_id.to_string()))
    }

    /// Startup check: every leaf of the ceremony must name a registered
    /// provider with a well-formed id.
    ///
    /// # Errors
    ///
    /// [`FlowError::UnknownIdentityComponent`] for the first offending id.
    pub fn validate(&self, ceremony: &CeremonyNode) -> Result<(), FlowError> {
        for id in ceremony.leaf_ids() {
            if !is_valid_component_id(&id) {
                return Err(FlowError::UnknownIdentityComponent(id));
            }
            self.get(&id)?;
        }
        Ok(())
    }
}

/// Generic provider for static wiring and development servers: a configured
/// prompt kind and an optional shared secret, with no credential-type
/// semantics of its own.
pub struct StaticProvider {
    component_id: String,
    prompt: String,
    secret: Option<String>,
}

impl StaticProvider {
    #[must_use]
    pub fn new(component_id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            component_id: component_id.into(),
            prompt: prompt.into(),
            secret: None,
        }
    }

    #[must_use]
    pub fn with_secret(mut self, secret: impl Into<String>) -> Self {
        self.secret = Some(secret.into());
        self
    }

    fn accepts(&self, value: &Value) -> bool {
        match &self.secret {
            Some(secret) => value.as_str() == Some(secret.as_str()),
            None => true,
        }
    }
}

#[async_trait]
impl IdentityComponentProvider for StaticProvider {
    async fn sign_in_prompt(
        &self,
        _ctx: &ProviderContext<'_>,
    ) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new(&self.component_id, &self.prompt))
    }

    async fn verify_sign_in(
        &self,
        _ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<SignInVerification, FlowError> {
        if self.accepts(value) {
            Ok(SignInVerification::Granted)
        } else {
            Ok(SignInVerification::Denied)
        }
    }

    async fn setup_prompt(&self, _ctx: &ProviderContext<'_>) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new(&self.component_id, &self.prompt))
    }

    async fn setup_component(
        &self,
        _ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<PendingComponent, FlowError> {
        if !self.accepts(value) {
            return Err(FlowError::RegistrationSubmitPrompt);
        }
        Ok(PendingComponent {
            component_id: self.component_id.clone(),
            identification: None,
            confirmed: true,
            data: serde_json::Map::new(),
        })
    }
}
