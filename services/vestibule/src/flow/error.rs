use crate::store::StoreError;
use thiserror::Error;

/// Errors surfaced by the authentication and registration flows.
///
/// The transport layer maps each variant to a structured `{error, message}`
/// body; none of them carry internals the caller should not see.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The ceremony references a component id with no registered provider.
    /// Configuration error, not a user mistake.
    #[error("no identity component provider registered for '{0}'")]
    UnknownIdentityComponent(String),

    /// The continuation state matches no walk of the authentication
    /// ceremony. The caller must restart.
    #[error("authentication state does not match the ceremony")]
    InvalidAuthenticationState,

    /// The continuation state matches no walk of the registration ceremony.
    #[error("registration state does not match the ceremony")]
    InvalidRegistrationState,

    /// Wrong credential value, or an unconfirmed component used to sign in.
    /// Retryable at the same step.
    #[error("sign-in prompt was not accepted")]
    AuthenticationSubmitPrompt,

    /// Wrong setup or validation value during registration.
    #[error("registration prompt was not accepted")]
    RegistrationSubmitPrompt,

    /// Authentic continuation token past its TTL. The ceremony must be
    /// restarted from the beginning.
    #[error("ceremony state has expired")]
    ExpiredState,

    /// A bearer or refresh token failed verification, or the session it
    /// names no longer exists.
    #[error("forbidden")]
    Forbidden,

    /// Registration commit lost a uniqueness race: the identification is
    /// already claimed by another identity.
    #[error("identification is already registered")]
    DocumentAtomicCommit,

    #[error("store: {0}")]
    Store(#[from] StoreError),

    #[error("token: {0}")]
    Token(#[from] flow_token::Error),

    #[error("encoding: {0}")]
    Encoding(#[from] serde_json::Error),
}
