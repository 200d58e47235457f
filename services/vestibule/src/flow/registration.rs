//! Registration orchestrator: a ceremony variant where no persisted
//! identity exists yet. Component drafts accumulate inside the continuation
//! token and only materialize, atomically, when the ceremony completes.

use crate::flow::error::FlowError;
use crate::flow::identity::{registration_commit, Identity};
use crate::flow::resolver::candidate_ids;
use crate::flow::state::ContinuationState;
use crate::flow::types::{ComponentPrompt, CurrentPrompt, RegistrationOutcome, RegistrationStep};
use crate::flow::FlowState;
use crate::store::StoreError;
use ceremony::{resolve_step_at_path, CeremonyNode, ResolvedStep};
use serde_json::Value;
use tracing::{debug, info};
use uuid::Uuid;

/// Where a registration state sits. An unconfirmed last draft freezes the
/// ceremony on its validation prompt regardless of the tree.
enum Resolution {
    Validating(String),
    Candidates(CeremonyNode),
    Complete,
}

impl FlowState {
    /// Start a registration ceremony, minting the identity id the drafts
    /// will be committed under.
    ///
    /// # Errors
    ///
    /// Propagates resolution, provider, and signing failures.
    pub async fn begin_registration(&self) -> Result<RegistrationOutcome, FlowError> {
        let state = ContinuationState {
            identity_id: Some(Uuid::new_v4().to_string()),
            ..ContinuationState::default()
        };
        self.advance_registration(state).await
    }

    /// Set up a component from a submitted value and advance.
    ///
    /// # Errors
    ///
    /// - [`FlowError::InvalidRegistrationState`] when the component is not a
    ///   current candidate or the ceremony is frozen on validation,
    /// - [`FlowError::RegistrationSubmitPrompt`] when the provider rejects
    ///   the value.
    pub async fn submit_registration_prompt(
        &self,
        component_id: &str,
        value: &Value,
        token: Option<&str>,
    ) -> Result<RegistrationOutcome, FlowError> {
        let mut state = self.decode_state(token)?;
        let Resolution::Candidates(node) = self.resolve_registration(&state)? else {
            return Err(FlowError::InvalidRegistrationState);
        };
        if !candidate_ids(&node).iter().any(|id| id == component_id) {
            return Err(FlowError::InvalidRegistrationState);
        }

        let provider = self.registry.get(component_id)?;
        let ctx = self.context(state.identity_id.as_deref());
        let mut draft = provider.setup_component(&ctx, value).await?;
        draft.component_id = component_id.to_string();
        debug!(component_id, confirmed = draft.confirmed, "Component set up");
        state.pending.push(draft);

        self.advance_registration(state).await
    }

    /// Deliver a validation code for the draft currently awaiting
    /// confirmation.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidRegistrationState`] unless the ceremony is frozen
    /// on exactly this component.
    pub async fn send_registration_validation_code(
        &self,
        component_id: &str,
        locale: Option<&str>,
        token: Option<&str>,
    ) -> Result<bool, FlowError> {
        let state = self.decode_state(token)?;
        self.require_validating(&state, component_id)?;

        let provider = self.registry.get(component_id)?;
        let ctx = self.context(state.identity_id.as_deref());
        let draft = state
            .pending
            .last()
            .ok_or(FlowError::InvalidRegistrationState)?;
        provider.send_validation_code(&ctx, draft, locale).await
    }

    /// Check a validation code; on success the draft confirms and the
    /// ceremony resumes.
    ///
    /// # Errors
    ///
    /// - [`FlowError::InvalidRegistrationState`] unless frozen on this
    ///   component,
    /// - [`FlowError::RegistrationSubmitPrompt`] for a wrong code.
    pub async fn submit_registration_validation_code(
        &self,
        component_id: &str,
        value: &Value,
        token: Option<&str>,
    ) -> Result<RegistrationOutcome, FlowError> {
        let mut state = self.decode_state(token)?;
        self.require_validating(&state, component_id)?;

        let provider = self.registry.get(component_id)?;
        let accepted = {
            let ctx = self.context(state.identity_id.as_deref());
            let draft = state
                .pending
                .last()
                .ok_or(FlowError::InvalidRegistrationState)?;
            provider.verify_validation_code(&ctx, draft, value).await?
        };
        if !accepted {
            return Err(FlowError::RegistrationSubmitPrompt);
        }

        if let Some(draft) = state.pending.last_mut() {
            draft.confirmed = true;
        }
        self.advance_registration(state).await
    }

    fn require_validating(
        &self,
        state: &ContinuationState,
        component_id: &str,
    ) -> Result<(), FlowError> {
        match self.resolve_registration(state)? {
            Resolution::Validating(pending_id) if pending_id == component_id => Ok(()),
            _ => Err(FlowError::InvalidRegistrationState),
        }
    }

    fn resolve_registration(&self, state: &ContinuationState) -> Result<Resolution, FlowError> {
        if let Some(last) = state.pending.last() {
            if !last.confirmed {
                return Ok(Resolution::Validating(last.component_id.clone()));
            }
        }
        match resolve_step_at_path(self.config().registration(), &state.pending_ids()) {
            ResolvedStep::Pending(node) => Ok(Resolution::Candidates(node)),
            ResolvedStep::Complete => Ok(Resolution::Complete),
            ResolvedStep::NotFound => Err(FlowError::InvalidRegistrationState),
        }
    }

    async fn advance_registration(
        &self,
        state: ContinuationState,
    ) -> Result<RegistrationOutcome, FlowError> {
        match self.resolve_registration(&state)? {
            Resolution::Complete => self.complete_registration(state).await,
            resolution => Ok(RegistrationOutcome::Step(
                self.registration_step(&state, &resolution).await?,
            )),
        }
    }

    async fn registration_step(
        &self,
        state: &ContinuationState,
        resolution: &Resolution,
    ) -> Result<RegistrationStep, FlowError> {
        let ctx = self.context(state.identity_id.as_deref());
        let (current, validating) = match resolution {
            Resolution::Validating(component_id) => {
                let provider = self.registry.get(component_id)?;
                let draft = state
                    .pending
                    .last()
                    .ok_or(FlowError::InvalidRegistrationState)?;
                let prompt = provider
                    .validation_prompt(&ctx, draft)
                    .await?
                    .unwrap_or_else(|| ComponentPrompt::new(component_id, "validation"));
                (CurrentPrompt::Component(prompt), true)
            }
            Resolution::Candidates(node) => {
                let mut prompts = Vec::new();
                for candidate in candidate_ids(node) {
                    let provider = self.registry.get(&candidate)?;
                    prompts.push(provider.setup_prompt(&ctx).await?);
                }
                let current = match prompts.len() {
                    1 => CurrentPrompt::Component(prompts.remove(0)),
                    _ => CurrentPrompt::choice(prompts),
                };
                (current, false)
            }
            Resolution::Complete => return Err(FlowError::InvalidRegistrationState),
        };

        Ok(RegistrationStep {
            state: self.encode_state(state)?,
            ceremony: serde_json::to_value(self.config().registration())?,
            current,
            validating,
        })
    }

    /// Materialize the registration in one conditional batch, then issue a
    /// session for the new identity.
    async fn complete_registration(
        &self,
        state: ContinuationState,
    ) -> Result<RegistrationOutcome, FlowError> {
        let identity_id = state
            .identity_id
            .ok_or(FlowError::InvalidRegistrationState)?;
        let identity = Identity {
            identity_id,
            data: serde_json::Map::new(),
        };

        let atomic = registration_commit(&identity, &state.pending)?;
        match self.documents().commit(atomic).await {
            Ok(()) => {}
            Err(StoreError::CommitConflict) => return Err(FlowError::DocumentAtomicCommit),
            Err(err) => return Err(err.into()),
        }
        info!(identity_id = %identity.identity_id, "Identity registered");

        let tokens = self.issuer().issue(&identity, state.scope).await?;
        Ok(RegistrationOutcome::Tokens(tokens))
    }
}
