//! Session records and token issuance.
//!
//! Three tokens, separated by audience: access (short-lived, subject is the
//! session id), id (identity data, subject is the identity id), refresh
//! (long-lived, subject is the session id, issued-at pinned to the original
//! authorization time so rotation never extends the horizon).

use crate::flow::error::FlowError;
use crate::flow::identity::{load_identity, Identity};
use crate::flow::types::Tokens;
use crate::store::{DocumentStore, SessionStore};
use flow_token::{rfc3339_from_unix, sign, string_claim, verify, Expectations, SigningKeys};
use pasetors::claims::Claims;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Duration;
use time::OffsetDateTime;
use tracing::{info, warn};
use ulid::Ulid;

const ACCESS_AUDIENCE: &str = "access";
const ID_AUDIENCE: &str = "id";
const REFRESH_AUDIENCE: &str = "refresh";

const SCOPE_CLAIM: &str = "scope";
const AUTHORIZED_AT_CLAIM: &str = "aat";
const DATA_CLAIM: &str = "data";

/// Server-side record binding token subjects to an identity.
///
/// `authorized_at` is the unix time of the original ceremony completion and
/// survives every refresh unchanged.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Session {
    pub session_id: String,
    pub identity_id: String,
    pub scope: Vec<String>,
    pub authorized_at: i64,
}

pub struct SessionIssuer {
    keys: Arc<SigningKeys>,
    issuer: String,
    access_ttl: Duration,
    refresh_ttl: Duration,
    sessions: Arc<dyn SessionStore>,
    documents: Arc<dyn DocumentStore>,
}

impl SessionIssuer {
    #[must_use]
    pub fn new(
        keys: Arc<SigningKeys>,
        issuer: impl Into<String>,
        access_ttl: Duration,
        refresh_ttl: Duration,
        sessions: Arc<dyn SessionStore>,
        documents: Arc<dyn DocumentStore>,
    ) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            access_ttl,
            refresh_ttl,
            sessions,
            documents,
        }
    }

    /// Create a session for a completed ceremony and sign the full token
    /// set. The session record lives as long as the refresh token.
    ///
    /// # Errors
    ///
    /// Propagates store and signing failures.
    pub async fn issue(&self, identity: &Identity, scope: Vec<String>) -> Result<Tokens, FlowError> {
        let session = Session {
            session_id: Ulid::new().to_string(),
            identity_id: identity.identity_id.clone(),
            scope,
            authorized_at: OffsetDateTime::now_utc().unix_timestamp(),
        };
        self.sessions
            .put(
                &session.session_id,
                serde_json::to_value(&session)?,
                self.refresh_ttl,
            )
            .await?;

        info!(
            session_id = %session.session_id,
            identity_id = %session.identity_id,
            "Session created"
        );

        Ok(Tokens {
            access_token: self.sign_access(&session)?,
            id_token: self.sign_id(&session, identity)?,
            refresh_token: Some(self.sign_refresh(&session)?),
        })
    }

    /// Rotate a refresh token: verify it, load its session fail-closed,
    /// extend the session record's TTL, and re-sign access and id tokens
    /// from the stored scope and authorization time. The refresh token
    /// itself is returned unchanged.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] for any verification or lookup failure.
    pub async fn refresh(&self, refresh_token: &str) -> Result<Tokens, FlowError> {
        let claims = verify(
            &self.keys,
            refresh_token,
            &Expectations {
                issuer: Some(&self.issuer),
                audience: Some(REFRESH_AUDIENCE),
                subject: None,
            },
        )
        .map_err(|_| FlowError::Forbidden)?;
        let session_id = string_claim(&claims, "sub").ok_or(FlowError::Forbidden)?;

        let session = self.assert_session(session_id).await?;
        self.sessions
            .put(
                &session.session_id,
                serde_json::to_value(&session)?,
                self.refresh_ttl,
            )
            .await?;
        let identity = load_identity(&*self.documents, &session.identity_id).await?;

        Ok(Tokens {
            access_token: self.sign_access(&session)?,
            id_token: self.sign_id(&session, &identity)?,
            refresh_token: Some(refresh_token.to_string()),
        })
    }

    /// Delete the session named by a verified access token. Idempotent:
    /// returns `false` when no session was present.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] when the access token fails verification.
    pub async fn sign_out(&self, access_token: &str) -> Result<bool, FlowError> {
        let session_id = self.verify_access(access_token)?;
        let deleted = self.sessions.delete(&session_id).await?;
        if deleted {
            info!(session_id = %session_id, "Session deleted");
        }
        Ok(deleted)
    }

    /// Verify an access token and return its session id.
    ///
    /// # Errors
    ///
    /// [`FlowError::Forbidden`] on any verification failure.
    pub fn verify_access(&self, access_token: &str) -> Result<String, FlowError> {
        let claims = verify(
            &self.keys,
            access_token,
            &Expectations {
                issuer: Some(&self.issuer),
                audience: Some(ACCESS_AUDIENCE),
                subject: None,
            },
        )
        .map_err(|_| FlowError::Forbidden)?;
        string_claim(&claims, "sub")
            .map(str::to_string)
            .ok_or(FlowError::Forbidden)
    }

    /// Fail-closed session lookup: a missing or malformed record means the
    /// caller's token no longer names a live session.
    async fn assert_session(&self, session_id: &str) -> Result<Session, FlowError> {
        let Some(value) = self.sessions.get(session_id).await? else {
            warn!(session_id = %session_id, "Refresh for unknown session");
            return Err(FlowError::Forbidden);
        };
        serde_json::from_value(value).map_err(|_| FlowError::Forbidden)
    }

    fn sign_access(&self, session: &Session) -> Result<String, FlowError> {
        let mut claims =
            Claims::new_expires_in(&self.access_ttl).map_err(|_| flow_token::Error::Claim)?;
        claims.issuer(&self.issuer).map_err(|_| flow_token::Error::Claim)?;
        claims
            .audience(ACCESS_AUDIENCE)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .subject(&session.session_id)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .add_additional(SCOPE_CLAIM, serde_json::to_value(&session.scope)?)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .add_additional(AUTHORIZED_AT_CLAIM, session.authorized_at)
            .map_err(|_| flow_token::Error::Claim)?;
        Ok(sign(&self.keys, &claims)?)
    }

    fn sign_id(&self, session: &Session, identity: &Identity) -> Result<String, FlowError> {
        let mut claims =
            Claims::new_expires_in(&self.access_ttl).map_err(|_| flow_token::Error::Claim)?;
        claims.issuer(&self.issuer).map_err(|_| flow_token::Error::Claim)?;
        claims
            .audience(ID_AUDIENCE)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .subject(&session.identity_id)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .add_additional(DATA_CLAIM, serde_json::Value::Object(identity.data.clone()))
            .map_err(|_| flow_token::Error::Claim)?;
        Ok(sign(&self.keys, &claims)?)
    }

    // Refresh claims are pinned to the original authorization time: iat and
    // nbf at `aat`, exp at `aat + refresh_ttl`. Re-signing from a stored
    // session therefore reproduces the same validity window.
    fn sign_refresh(&self, session: &Session) -> Result<String, FlowError> {
        let issued_at = rfc3339_from_unix(session.authorized_at)?;
        let ttl = i64::try_from(self.refresh_ttl.as_secs()).unwrap_or(i64::MAX);
        let expiration = rfc3339_from_unix(session.authorized_at.saturating_add(ttl))?;

        let mut claims = Claims::new().map_err(|_| flow_token::Error::Claim)?;
        claims.issuer(&self.issuer).map_err(|_| flow_token::Error::Claim)?;
        claims
            .audience(REFRESH_AUDIENCE)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .subject(&session.session_id)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .issued_at(&issued_at)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .not_before(&issued_at)
            .map_err(|_| flow_token::Error::Claim)?;
        claims
            .expiration(&expiration)
            .map_err(|_| flow_token::Error::Claim)?;
        Ok(sign(&self.keys, &claims)?)
    }
}
