//! Shared harness for integration tests: stub credential providers wired
//! over the in-memory stores.

#![allow(dead_code)]

use async_trait::async_trait;
use ceremony::CeremonyNode;
use flow_token::SigningKeys;
use serde_json::{json, Map, Value};
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;
use vestibule::flow::identity::{identification_path, load_component, registration_commit, Identity};
use vestibule::flow::{
    AuthenticationOutcome, AuthenticationStep, ComponentPrompt, CurrentPrompt, FlowConfig,
    FlowError, FlowState, IdentityComponentProvider, PendingComponent, ProviderContext,
    ProviderRegistry, RegistrationOutcome, RegistrationStep, SignInVerification, StaticProvider,
    Tokens,
};
use vestibule::store::memory::{MemoryDocumentStore, MemorySessionStore};
use vestibule::store::{DocumentStore, Notification, StoreError};

pub const VALIDATION_CODE: &str = "424242";

/// Email: identifies the account by address, requires code validation.
pub struct EmailProvider;

#[async_trait]
impl IdentityComponentProvider for EmailProvider {
    async fn sign_in_prompt(
        &self,
        _ctx: &ProviderContext<'_>,
    ) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new("email", "email"))
    }

    async fn verify_sign_in(
        &self,
        ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<SignInVerification, FlowError> {
        let Some(address) = value.as_str() else {
            return Ok(SignInVerification::Denied);
        };
        match ctx.documents.get(&identification_path("email", address)).await {
            Ok(document) => {
                let identity_id = document
                    .data
                    .get("identity_id")
                    .and_then(Value::as_str)
                    .ok_or(FlowError::AuthenticationSubmitPrompt)?;
                Ok(SignInVerification::Identified(identity_id.to_string()))
            }
            Err(StoreError::NotFound) => Ok(SignInVerification::Denied),
            Err(err) => Err(err.into()),
        }
    }

    async fn setup_prompt(&self, _ctx: &ProviderContext<'_>) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new("email", "email"))
    }

    async fn setup_component(
        &self,
        _ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<PendingComponent, FlowError> {
        let address = value
            .as_str()
            .ok_or(FlowError::RegistrationSubmitPrompt)?
            .to_lowercase();
        Ok(PendingComponent {
            component_id: "email".to_string(),
            identification: Some(address),
            confirmed: false,
            data: Map::new(),
        })
    }

    async fn validation_prompt(
        &self,
        _ctx: &ProviderContext<'_>,
        _draft: &PendingComponent,
    ) -> Result<Option<ComponentPrompt>, FlowError> {
        Ok(Some(ComponentPrompt::new("email", "validation-code")))
    }

    async fn send_validation_code(
        &self,
        ctx: &ProviderContext<'_>,
        _draft: &PendingComponent,
        _locale: Option<&str>,
    ) -> Result<bool, FlowError> {
        let identity_id = ctx.identity_id.unwrap_or("pending");
        let notification = Notification {
            subject: "Your validation code".to_string(),
            content: HashMap::from([("text/plain".to_string(), VALIDATION_CODE.to_string())]),
        };
        Ok(ctx.notifier.notify(identity_id, &notification).await)
    }

    async fn verify_validation_code(
        &self,
        _ctx: &ProviderContext<'_>,
        _draft: &PendingComponent,
        value: &Value,
    ) -> Result<bool, FlowError> {
        Ok(value.as_str() == Some(VALIDATION_CODE))
    }
}

/// Password: compares against the stored component.
pub struct PasswordProvider;

#[async_trait]
impl IdentityComponentProvider for PasswordProvider {
    async fn sign_in_prompt(
        &self,
        _ctx: &ProviderContext<'_>,
    ) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new("password", "password"))
    }

    async fn verify_sign_in(
        &self,
        ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<SignInVerification, FlowError> {
        let Some(identity_id) = ctx.identity_id else {
            return Ok(SignInVerification::Denied);
        };
        let Some(component) = load_component(ctx.documents, identity_id, "password").await? else {
            return Ok(SignInVerification::Denied);
        };
        if component.data.get("password") == Some(value) {
            Ok(SignInVerification::Granted)
        } else {
            Ok(SignInVerification::Denied)
        }
    }

    async fn setup_prompt(&self, _ctx: &ProviderContext<'_>) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new("password", "password"))
    }

    async fn setup_component(
        &self,
        _ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<PendingComponent, FlowError> {
        if value.as_str().map_or(true, str::is_empty) {
            return Err(FlowError::RegistrationSubmitPrompt);
        }
        let mut data = Map::new();
        data.insert("password".to_string(), value.clone());
        Ok(PendingComponent {
            component_id: "password".to_string(),
            identification: None,
            confirmed: true,
            data,
        })
    }
}

/// Policy: an accepted policy is skipped on later sign-ins.
pub struct PolicyProvider;

#[async_trait]
impl IdentityComponentProvider for PolicyProvider {
    async fn sign_in_prompt(
        &self,
        _ctx: &ProviderContext<'_>,
    ) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new("policy", "policy"))
    }

    async fn verify_sign_in(
        &self,
        _ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<SignInVerification, FlowError> {
        if value.as_bool() == Some(true) {
            Ok(SignInVerification::Granted)
        } else {
            Ok(SignInVerification::Denied)
        }
    }

    async fn skip_sign_in(
        &self,
        _ctx: &ProviderContext<'_>,
        component: &vestibule::flow::identity::IdentityComponent,
    ) -> Result<bool, FlowError> {
        Ok(component.data.get("accepted").and_then(Value::as_bool) == Some(true))
    }

    async fn setup_prompt(&self, _ctx: &ProviderContext<'_>) -> Result<ComponentPrompt, FlowError> {
        Ok(ComponentPrompt::new("policy", "policy"))
    }

    async fn setup_component(
        &self,
        _ctx: &ProviderContext<'_>,
        value: &Value,
    ) -> Result<PendingComponent, FlowError> {
        if value.as_bool() != Some(true) {
            return Err(FlowError::RegistrationSubmitPrompt);
        }
        let mut data = Map::new();
        data.insert("accepted".to_string(), json!(true));
        Ok(PendingComponent {
            component_id: "policy".to_string(),
            identification: None,
            confirmed: true,
            data,
        })
    }
}

pub struct Harness {
    pub flow: Arc<FlowState>,
    pub documents: Arc<MemoryDocumentStore>,
    pub sessions: Arc<MemorySessionStore>,
}

pub fn harness(ceremony: &CeremonyNode) -> Harness {
    harness_with_ttl(ceremony, Duration::from_secs(300))
}

pub fn harness_with_ttl(ceremony: &CeremonyNode, ceremony_ttl: Duration) -> Harness {
    let documents = Arc::new(MemoryDocumentStore::new());
    let sessions = Arc::new(MemorySessionStore::new());

    let registry = ProviderRegistry::new()
        .register("email", Arc::new(EmailProvider))
        .register("password", Arc::new(PasswordProvider))
        .register("policy", Arc::new(PolicyProvider))
        .register("pin", Arc::new(StaticProvider::new("pin", "pin").with_secret("1234")));

    let config = FlowConfig::new(ceremony, "https://vestibule.test")
        .with_ceremony_ttl(ceremony_ttl);
    let flow = FlowState::new(
        config,
        registry,
        Arc::new(SigningKeys::generate().expect("key generation")),
        Arc::clone(&documents) as Arc<dyn vestibule::store::DocumentStore>,
        Arc::clone(&sessions) as Arc<dyn vestibule::store::SessionStore>,
        Arc::new(vestibule::store::LogNotifier),
    )
    .expect("flow state");

    Harness {
        flow: Arc::new(flow),
        documents,
        sessions,
    }
}

/// Persist an identity with the given component drafts, as a completed
/// registration would.
pub async fn seed_identity(
    documents: &MemoryDocumentStore,
    identity_id: &str,
    drafts: Vec<PendingComponent>,
) {
    let identity = Identity {
        identity_id: identity_id.to_string(),
        data: Map::new(),
    };
    let atomic = registration_commit(&identity, &drafts).expect("commit batch");
    documents.commit(atomic).await.expect("seed identity");
}

pub fn email_draft(address: &str, confirmed: bool) -> PendingComponent {
    PendingComponent {
        component_id: "email".to_string(),
        identification: Some(address.to_string()),
        confirmed,
        data: Map::new(),
    }
}

pub fn password_draft(password: &str) -> PendingComponent {
    let mut data = Map::new();
    data.insert("password".to_string(), json!(password));
    PendingComponent {
        component_id: "password".to_string(),
        identification: None,
        confirmed: true,
        data,
    }
}

pub fn policy_draft(accepted: bool) -> PendingComponent {
    let mut data = Map::new();
    data.insert("accepted".to_string(), json!(accepted));
    PendingComponent {
        component_id: "policy".to_string(),
        identification: None,
        confirmed: true,
        data,
    }
}

pub fn auth_step(outcome: AuthenticationOutcome) -> AuthenticationStep {
    match outcome {
        AuthenticationOutcome::Step(step) => step,
        AuthenticationOutcome::Tokens(_) => panic!("expected a step, got tokens"),
    }
}

pub fn auth_tokens(outcome: AuthenticationOutcome) -> Tokens {
    match outcome {
        AuthenticationOutcome::Tokens(tokens) => tokens,
        AuthenticationOutcome::Step(step) => {
            panic!("expected tokens, got step: {:?}", step.current)
        }
    }
}

pub fn registration_step(outcome: RegistrationOutcome) -> RegistrationStep {
    match outcome {
        RegistrationOutcome::Step(step) => step,
        RegistrationOutcome::Tokens(_) => panic!("expected a step, got tokens"),
    }
}

pub fn registration_tokens(outcome: RegistrationOutcome) -> Tokens {
    match outcome {
        RegistrationOutcome::Tokens(tokens) => tokens,
        RegistrationOutcome::Step(step) => {
            panic!("expected tokens, got step: {:?}", step.current)
        }
    }
}

/// Component ids offered by a step's current prompt.
pub fn current_ids(current: &CurrentPrompt) -> Vec<String> {
    match current {
        CurrentPrompt::Component(prompt) => vec![prompt.id.clone()],
        CurrentPrompt::Choice(choice) => {
            choice.prompts.iter().map(|prompt| prompt.id.clone()).collect()
        }
    }
}
