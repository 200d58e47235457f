//! Authentication resolver: maps continuation state to the next pending
//! prompt, runs the adaptive skip loop, and hands completed ceremonies to
//! the session issuer.

use crate::flow::error::FlowError;
use crate::flow::identity::{load_component, load_identity};
use crate::flow::provider::SignInVerification;
use crate::flow::state::ContinuationState;
use crate::flow::types::{AuthenticationOutcome, AuthenticationStep, CurrentPrompt};
use crate::flow::FlowState;
use ceremony::{resolve_step_at_path, CeremonyNode, ResolvedStep};
use serde_json::Value;
use tracing::debug;

/// Leaf component ids a resolved pending step offers, in tree order.
pub(crate) fn candidate_ids(node: &CeremonyNode) -> Vec<String> {
    match node {
        CeremonyNode::Component { id } => vec![id.clone()],
        CeremonyNode::Choice { children } => children
            .iter()
            .filter_map(|child| child.component_id().map(str::to_string))
            .collect(),
        _ => Vec::new(),
    }
}

impl FlowState {
    /// Start an authentication ceremony for the requested scope.
    ///
    /// # Errors
    ///
    /// Propagates resolution, provider, and signing failures.
    pub async fn begin_authentication(
        &self,
        scope: Vec<String>,
    ) -> Result<AuthenticationOutcome, FlowError> {
        let state = ContinuationState {
            scope,
            ..ContinuationState::default()
        };
        self.advance_authentication(state).await
    }

    /// Verify a submitted credential value and advance the ceremony.
    ///
    /// # Errors
    ///
    /// - [`FlowError::InvalidAuthenticationState`] when the component is not
    ///   currently pending,
    /// - [`FlowError::AuthenticationSubmitPrompt`] for a rejected value, an
    ///   unresolved identity, or an unconfirmed component,
    /// - plus anything `begin_authentication` can raise.
    pub async fn submit_authentication_prompt(
        &self,
        component_id: &str,
        value: &Value,
        token: Option<&str>,
    ) -> Result<AuthenticationOutcome, FlowError> {
        let mut state = self.decode_state(token)?;
        let pending = self.resolve_authentication(&mut state).await?;
        let ResolvedStep::Pending(node) = pending else {
            return Err(FlowError::InvalidAuthenticationState);
        };
        if !candidate_ids(&node).iter().any(|id| id == component_id) {
            return Err(FlowError::InvalidAuthenticationState);
        }

        let provider = self.registry.get(component_id)?;
        let ctx = self.context(state.identity_id.as_deref());
        match provider.verify_sign_in(&ctx, value).await? {
            SignInVerification::Denied => {
                debug!(component_id, "Sign-in prompt denied");
                return Err(FlowError::AuthenticationSubmitPrompt);
            }
            SignInVerification::Granted => {}
            SignInVerification::Identified(identity_id) => match &state.identity_id {
                Some(existing) if *existing != identity_id => {
                    return Err(FlowError::AuthenticationSubmitPrompt);
                }
                _ => state.identity_id = Some(identity_id),
            },
        }

        // Every accepted step must belong to a known identity; a provider
        // that grants without identifying anyone cannot be the first step.
        let identity_id = state
            .identity_id
            .clone()
            .ok_or(FlowError::AuthenticationSubmitPrompt)?;

        // A component still mid-registration-validation cannot sign in.
        if let Some(component) = load_component(self.documents(), &identity_id, component_id).await?
        {
            if !component.confirmed {
                return Err(FlowError::AuthenticationSubmitPrompt);
            }
        }

        state.completed.push(component_id.to_string());
        self.advance_authentication(state).await
    }

    /// Deliver an out-of-band challenge for a currently pending component.
    ///
    /// # Errors
    ///
    /// [`FlowError::InvalidAuthenticationState`] when the component is not
    /// pending; provider failures propagate.
    pub async fn send_authentication_prompt(
        &self,
        component_id: &str,
        locale: Option<&str>,
        token: Option<&str>,
    ) -> Result<bool, FlowError> {
        let mut state = self.decode_state(token)?;
        let pending = self.resolve_authentication(&mut state).await?;
        let ResolvedStep::Pending(node) = pending else {
            return Err(FlowError::InvalidAuthenticationState);
        };
        if !candidate_ids(&node).iter().any(|id| id == component_id) {
            return Err(FlowError::InvalidAuthenticationState);
        }

        let provider = self.registry.get(component_id)?;
        let ctx = self.context(state.identity_id.as_deref());
        provider.send_sign_in_prompt(&ctx, locale).await
    }

    async fn advance_authentication(
        &self,
        mut state: ContinuationState,
    ) -> Result<AuthenticationOutcome, FlowError> {
        match self.resolve_authentication(&mut state).await? {
            ResolvedStep::Complete => {
                let identity_id = state.identity_id.ok_or(FlowError::Forbidden)?;
                let identity = load_identity(self.documents(), &identity_id).await?;
                let tokens = self.issuer().issue(&identity, state.scope).await?;
                Ok(AuthenticationOutcome::Tokens(tokens))
            }
            ResolvedStep::Pending(node) => Ok(AuthenticationOutcome::Step(
                self.authentication_step(&state, &node).await?,
            )),
            ResolvedStep::NotFound => Err(FlowError::InvalidAuthenticationState),
        }
    }

    /// Resolve the pending step, consuming skippable components as it goes.
    /// Terminates because `completed` strictly grows and the tree is finite.
    async fn resolve_authentication(
        &self,
        state: &mut ContinuationState,
    ) -> Result<ResolvedStep, FlowError> {
        loop {
            let step = resolve_step_at_path(self.config().authentication(), &state.completed);
            let ResolvedStep::Pending(node) = &step else {
                return Ok(step);
            };

            let Some(skipped) = self.skippable_candidate(state, node).await? else {
                return Ok(step);
            };
            debug!(component_id = %skipped, "Skipping sign-in prompt");
            state.completed.push(skipped);
        }
    }

    /// First candidate whose existing identity component makes the prompt
    /// unnecessary. Skip decisions only apply once the identity is known.
    async fn skippable_candidate(
        &self,
        state: &ContinuationState,
        node: &CeremonyNode,
    ) -> Result<Option<String>, FlowError> {
        let Some(identity_id) = state.identity_id.as_deref() else {
            return Ok(None);
        };
        for candidate in candidate_ids(node) {
            let provider = self.registry.get(&candidate)?;
            let Some(component) = load_component(self.documents(), identity_id, &candidate).await?
            else {
                continue;
            };
            let ctx = self.context(Some(identity_id));
            if provider.skip_sign_in(&ctx, &component).await? {
                return Ok(Some(candidate));
            }
        }
        Ok(None)
    }

    async fn authentication_step(
        &self,
        state: &ContinuationState,
        node: &CeremonyNode,
    ) -> Result<AuthenticationStep, FlowError> {
        let ctx = self.context(state.identity_id.as_deref());
        let mut prompts = Vec::new();
        for candidate in candidate_ids(node) {
            let provider = self.registry.get(&candidate)?;
            prompts.push(provider.sign_in_prompt(&ctx).await?);
        }

        let current = match prompts.len() {
            1 => CurrentPrompt::Component(prompts.remove(0)),
            _ => CurrentPrompt::choice(prompts),
        };
        Ok(AuthenticationStep {
            state: self.encode_state(state)?,
            ceremony: serde_json::to_value(self.config().authentication())?,
            current,
        })
    }
}
