//! Wire-facing request and response shapes for the ceremony RPC surface.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use utoipa::ToSchema;

fn component_kind() -> String {
    "component".to_string()
}

fn choice_kind() -> String {
    "choice".to_string()
}

/// Provider-supplied description of what the client must present next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct ComponentPrompt {
    /// Component id within the ceremony.
    pub id: String,
    /// Discriminator, always `"component"`.
    #[serde(default = "component_kind")]
    pub kind: String,
    /// Provider-declared prompt kind, e.g. `"email"` or `"password"`.
    pub prompt: String,
    /// Provider-defined rendering hints.
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    #[schema(value_type = Object)]
    pub options: Map<String, Value>,
}

impl ComponentPrompt {
    #[must_use]
    pub fn new(id: impl Into<String>, prompt: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: component_kind(),
            prompt: prompt.into(),
            options: Map::new(),
        }
    }

    #[must_use]
    pub fn with_option(mut self, key: impl Into<String>, value: Value) -> Self {
        self.options.insert(key.into(), value);
        self
    }
}

/// More than one component is eligible; the caller may satisfy any one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
pub struct PromptChoice {
    /// Discriminator, always `"choice"`.
    #[serde(default = "choice_kind")]
    pub kind: String,
    pub prompts: Vec<ComponentPrompt>,
}

/// The step a client must complete next.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, ToSchema)]
#[serde(untagged)]
pub enum CurrentPrompt {
    Component(ComponentPrompt),
    Choice(PromptChoice),
}

impl CurrentPrompt {
    #[must_use]
    pub fn choice(prompts: Vec<ComponentPrompt>) -> Self {
        Self::Choice(PromptChoice {
            kind: choice_kind(),
            prompts,
        })
    }
}

/// One authentication step: the re-encoded continuation token, the ceremony
/// definition for rendering, and the pending prompt.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct AuthenticationStep {
    /// Opaque continuation token to echo back on the next request.
    pub state: String,
    #[schema(value_type = Object)]
    pub ceremony: Value,
    pub current: CurrentPrompt,
}

/// One registration step. `validating` marks the confirmation sub-state of
/// the most recently set-up component.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct RegistrationStep {
    pub state: String,
    #[schema(value_type = Object)]
    pub ceremony: Value,
    pub current: CurrentPrompt,
    pub validating: bool,
}

/// Signed session tokens issued at ceremony completion or refresh.
#[derive(Debug, Clone, Serialize, Deserialize, ToSchema)]
pub struct Tokens {
    pub access_token: String,
    pub id_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
}

/// Either the next step or, on completion, the issued tokens.
#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum AuthenticationOutcome {
    Step(AuthenticationStep),
    Tokens(Tokens),
}

#[derive(Debug, Clone, Serialize, ToSchema)]
#[serde(untagged)]
pub enum RegistrationOutcome {
    Step(RegistrationStep),
    Tokens(Tokens),
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BeginAuthenticationRequest {
    /// Scope strings requested for the resulting session.
    #[serde(default)]
    pub scope: Vec<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SubmitPromptRequest {
    /// Component id being answered.
    pub id: String,
    /// Credential value; shape is provider-defined.
    #[schema(value_type = Object)]
    pub value: Value,
    /// Continuation token from the previous step, absent on a fresh start.
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct SendPromptRequest {
    pub id: String,
    #[serde(default)]
    pub locale: Option<String>,
    #[serde(default)]
    pub state: Option<String>,
}

#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct RefreshAccessTokenRequest {
    pub refresh_token: String,
}
