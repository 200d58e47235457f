//! Ceremony flows: authentication resolution, registration orchestration,
//! and session issuance, all driven off the signed continuation token.

pub mod config;
pub mod error;
pub mod identity;
pub mod provider;
mod registration;
mod resolver;
pub mod session;
pub mod state;
pub mod types;

pub use config::FlowConfig;
pub use error::FlowError;
pub use provider::{
    IdentityComponentProvider, ProviderContext, ProviderRegistry, SignInVerification,
    StaticProvider,
};
pub use state::{ContinuationState, PendingComponent};
pub use types::{
    AuthenticationOutcome, AuthenticationStep, BeginAuthenticationRequest, ComponentPrompt,
    CurrentPrompt, PromptChoice, RefreshAccessTokenRequest, RegistrationOutcome, RegistrationStep,
    SendPromptRequest, SubmitPromptRequest, Tokens,
};

use crate::store::{DocumentStore, Notifier, SessionStore};
use flow_token::{ContinuationCodec, SigningKeys};
use session::SessionIssuer;
use std::sync::Arc;
use tracing::debug;

/// Everything a request handler needs to run a ceremony step. Assembled
/// once at startup and shared via `Arc`; holds no per-request state.
pub struct FlowState {
    config: FlowConfig,
    registry: ProviderRegistry,
    codec: ContinuationCodec,
    issuer: SessionIssuer,
    documents: Arc<dyn DocumentStore>,
    notifier: Arc<dyn Notifier>,
}

impl FlowState {
    /// Wire the flows together, validating that both ceremonies only name
    /// registered providers.
    ///
    /// # Errors
    ///
    /// [`FlowError::UnknownIdentityComponent`] when a ceremony leaf has no
    /// provider.
    pub fn new(
        config: FlowConfig,
        registry: ProviderRegistry,
        keys: Arc<SigningKeys>,
        documents: Arc<dyn DocumentStore>,
        sessions: Arc<dyn SessionStore>,
        notifier: Arc<dyn Notifier>,
    ) -> Result<Self, FlowError> {
        registry.validate(config.authentication())?;
        registry.validate(config.registration())?;

        let codec = ContinuationCodec::new(
            Arc::clone(&keys),
            config.issuer(),
            config.ceremony_ttl(),
        );
        let issuer = SessionIssuer::new(
            keys,
            config.issuer(),
            config.access_ttl(),
            config.refresh_ttl(),
            sessions,
            Arc::clone(&documents),
        );

        Ok(Self {
            config,
            registry,
            codec,
            issuer,
            documents,
            notifier,
        })
    }

    #[must_use]
    pub const fn config(&self) -> &FlowConfig {
        &self.config
    }

    #[must_use]
    pub const fn issuer(&self) -> &SessionIssuer {
        &self.issuer
    }

    pub(crate) fn context<'a>(&'a self, identity_id: Option<&'a str>) -> ProviderContext<'a> {
        ProviderContext {
            identity_id,
            documents: &*self.documents,
            notifier: &*self.notifier,
        }
    }

    pub(crate) fn documents(&self) -> &dyn DocumentStore {
        &*self.documents
    }

    pub(crate) fn encode_state(&self, state: &ContinuationState) -> Result<String, FlowError> {
        Ok(self.codec.encode(state)?)
    }

    /// Rebuild ceremony progress from the caller-supplied token.
    ///
    /// Absent or malformed tokens degrade to the empty state (a fresh
    /// start); an authentic token past its TTL is surfaced as
    /// [`FlowError::ExpiredState`] so the client can say so instead of
    /// silently restarting.
    pub(crate) fn decode_state(&self, token: Option<&str>) -> Result<ContinuationState, FlowError> {
        let Some(token) = token.filter(|token| !token.is_empty()) else {
            return Ok(ContinuationState::default());
        };
        match self.codec.decode(token) {
            Ok(state) => Ok(state),
            Err(flow_token::Error::Expired) => Err(FlowError::ExpiredState),
            Err(err) => {
                debug!("Discarding continuation token: {}", err);
                Ok(ContinuationState::default())
            }
        }
    }
}
