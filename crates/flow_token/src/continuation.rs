//! Continuation-token codec: ceremony progress signed into a short-lived
//! `v4.public` token so the server holds no per-ceremony state.

use crate::{sign, verify, Error, Expectations, SigningKeys};
use pasetors::claims::Claims;
use serde::de::DeserializeOwned;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

const CEREMONY_AUDIENCE: &str = "ceremony";
const STATE_CLAIM: &str = "state";

/// Signs and verifies the opaque continuation token carried by the caller
/// between ceremony steps.
pub struct ContinuationCodec {
    keys: Arc<SigningKeys>,
    issuer: String,
    ttl: Duration,
}

impl ContinuationCodec {
    #[must_use]
    pub fn new(keys: Arc<SigningKeys>, issuer: impl Into<String>, ttl: Duration) -> Self {
        Self {
            keys,
            issuer: issuer.into(),
            ttl,
        }
    }

    /// Sign `state` into a ceremony token expiring after the configured TTL.
    ///
    /// # Errors
    ///
    /// Returns an error if claim encoding or signing fails.
    pub fn encode<T: Serialize>(&self, state: &T) -> Result<String, Error> {
        let mut claims = Claims::new_expires_in(&self.ttl).map_err(|_| Error::Claim)?;
        claims.issuer(&self.issuer).map_err(|_| Error::Claim)?;
        claims
            .audience(CEREMONY_AUDIENCE)
            .map_err(|_| Error::Claim)?;
        claims
            .add_additional(STATE_CLAIM, serde_json::to_value(state)?)
            .map_err(|_| Error::Claim)?;
        sign(&self.keys, &claims)
    }

    /// Verify a ceremony token and extract its state payload.
    ///
    /// # Errors
    ///
    /// [`Error::Expired`] for a stale-but-authentic token; any other error
    /// means the token is malformed, tampered with, or of the wrong kind.
    /// The caller decides whether a failure degrades to a fresh state.
    pub fn decode<T: DeserializeOwned>(&self, token: &str) -> Result<T, Error> {
        let claims = verify(
            &self.keys,
            token,
            &Expectations {
                issuer: Some(&self.issuer),
                audience: Some(CEREMONY_AUDIENCE),
                subject: None,
            },
        )?;
        let state = claims
            .get_claim(STATE_CLAIM)
            .ok_or(Error::MissingClaim(STATE_CLAIM))?;
        Ok(serde_json::from_value(state.clone())?)
    }
}
