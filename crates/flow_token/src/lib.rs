//! PASETO `v4.public` signing and verification for ceremony state.
//!
//! One Ed25519 key pair, supplied at configuration time, backs both the
//! continuation-token codec and the session token issuer. Tokens are
//! separated by audience (`ceremony`, `access`, `id`, `refresh`) so a token
//! of one kind can never be replayed as another.

mod continuation;
mod error;

pub use continuation::ContinuationCodec;
pub use error::Error;

use pasetors::claims::{Claims, ClaimsValidationRules};
use pasetors::errors::Error as PasetorsError;
use pasetors::keys::{AsymmetricPublicKey, AsymmetricSecretKey};
use pasetors::token::UntrustedToken;
use pasetors::version4::V4;
use pasetors::{public, Public};
use time::format_description::well_known::Rfc3339;
use time::OffsetDateTime;

/// Ed25519 key pair in the layout PASETO v4 expects.
pub struct SigningKeys {
    secret: AsymmetricSecretKey<V4>,
    public: AsymmetricPublicKey<V4>,
}

impl SigningKeys {
    /// Build the key pair from a raw 32-byte Ed25519 seed.
    ///
    /// # Errors
    ///
    /// Returns an error if the derived key material is rejected.
    pub fn from_seed(seed: &[u8; 32]) -> Result<Self, Error> {
        let signing = ed25519_dalek::SigningKey::from_bytes(seed);
        let secret = AsymmetricSecretKey::from(&signing.to_keypair_bytes())
            .map_err(|_| Error::InvalidKey)?;
        let public = AsymmetricPublicKey::from(signing.verifying_key().as_bytes())
            .map_err(|_| Error::InvalidKey)?;
        Ok(Self { secret, public })
    }

    /// Generate a fresh random key pair (development and tests).
    ///
    /// # Errors
    ///
    /// Returns an error if the derived key material is rejected.
    pub fn generate() -> Result<Self, Error> {
        let signing = ed25519_dalek::SigningKey::generate(&mut rand::rngs::OsRng);
        Self::from_seed(&signing.to_bytes())
    }
}

/// Expected registered claims for [`verify`].
#[derive(Debug, Default)]
pub struct Expectations<'a> {
    pub issuer: Option<&'a str>,
    pub audience: Option<&'a str>,
    pub subject: Option<&'a str>,
}

/// Sign a claims set as a `v4.public` token.
///
/// # Errors
///
/// Returns an error if signing fails.
pub fn sign(keys: &SigningKeys, claims: &Claims) -> Result<String, Error> {
    public::sign(&keys.secret, claims, None, None).map_err(|err| map_paseto_error(&err))
}

/// Verify a `v4.public` token: signature first, then time claims, then the
/// expected registered claims.
///
/// # Errors
///
/// - [`Error::InvalidSignature`] / [`Error::TokenFormat`] for a tampered or
///   malformed token,
/// - [`Error::Expired`] when the signature is valid but `exp`/`nbf`/`iat`
///   are out of range,
/// - [`Error::InvalidIssuer`] / [`Error::InvalidAudience`] /
///   [`Error::InvalidSubject`] on claim mismatch.
pub fn verify(keys: &SigningKeys, token: &str, expected: &Expectations<'_>) -> Result<Claims, Error> {
    let untrusted =
        UntrustedToken::<Public, V4>::try_from(token).map_err(|err| map_paseto_error(&err))?;

    // Default rules only check the time claims; signature is checked before
    // claims, so a ClaimValidation failure here means "valid but stale".
    let rules = ClaimsValidationRules::new();
    let trusted = public::verify(&keys.public, &untrusted, &rules, None, None)
        .map_err(|err| map_paseto_error(&err))?;
    let claims = trusted.payload_claims().ok_or(Error::TokenFormat)?.clone();

    if let Some(issuer) = expected.issuer {
        if string_claim(&claims, "iss") != Some(issuer) {
            return Err(Error::InvalidIssuer);
        }
    }
    if let Some(audience) = expected.audience {
        if string_claim(&claims, "aud") != Some(audience) {
            return Err(Error::InvalidAudience);
        }
    }
    if let Some(subject) = expected.subject {
        if string_claim(&claims, "sub") != Some(subject) {
            return Err(Error::InvalidSubject);
        }
    }
    Ok(claims)
}

/// Registered or additional claim as a string slice, if present.
#[must_use]
pub fn string_claim<'a>(claims: &'a Claims, name: &str) -> Option<&'a str> {
    claims.get_claim(name).and_then(serde_json::Value::as_str)
}

/// Convert a unix timestamp to RFC3339.
///
/// # Errors
///
/// Returns an error if formatting fails.
pub fn rfc3339_from_unix(unix_seconds: i64) -> Result<String, Error> {
    let dt = OffsetDateTime::from_unix_timestamp(unix_seconds).map_err(|_| Error::TimeFormat)?;
    dt.format(&Rfc3339).map_err(|_| Error::TimeFormat)
}

/// Parse an RFC3339 timestamp into unix seconds.
///
/// # Errors
///
/// Returns an error if parsing fails.
pub fn unix_from_rfc3339(value: &str) -> Result<i64, Error> {
    let dt = OffsetDateTime::parse(value, &Rfc3339).map_err(|_| Error::TimeParse)?;
    Ok(dt.unix_timestamp())
}

fn map_paseto_error(err: &PasetorsError) -> Error {
    match err {
        PasetorsError::Base64 => Error::Base64,
        PasetorsError::TokenValidation => Error::InvalidSignature,
        PasetorsError::ClaimValidation(_) => Error::Expired,
        PasetorsError::Key => Error::InvalidKey,
        _ => Error::TokenFormat,
    }
}

#[cfg(test)]
mod tests {
    use super::{
        rfc3339_from_unix, sign, string_claim, unix_from_rfc3339, verify, Error, Expectations,
        SigningKeys,
    };
    use pasetors::claims::Claims;
    use std::time::Duration;

    fn keys() -> Result<SigningKeys, Error> {
        SigningKeys::from_seed(&[7u8; 32])
    }

    fn claims_for(audience: &str) -> Result<Claims, Error> {
        let mut claims =
            Claims::new_expires_in(&Duration::from_secs(300)).map_err(|_| Error::Claim)?;
        claims.issuer("vestibule.test").map_err(|_| Error::Claim)?;
        claims.audience(audience).map_err(|_| Error::Claim)?;
        claims.subject("session-1").map_err(|_| Error::Claim)?;
        Ok(claims)
    }

    #[test]
    fn sign_and_verify_round_trip() -> Result<(), Error> {
        let keys = keys()?;
        let token = sign(&keys, &claims_for("access")?)?;

        let verified = verify(
            &keys,
            &token,
            &Expectations {
                issuer: Some("vestibule.test"),
                audience: Some("access"),
                subject: Some("session-1"),
            },
        )?;
        assert_eq!(string_claim(&verified, "aud"), Some("access"));
        Ok(())
    }

    #[test]
    fn verify_rejects_wrong_key() -> Result<(), Error> {
        let token = sign(&keys()?, &claims_for("access")?)?;
        let other = SigningKeys::from_seed(&[9u8; 32])?;
        let result = verify(&other, &token, &Expectations::default());
        assert!(matches!(result, Err(Error::InvalidSignature)));
        Ok(())
    }

    #[test]
    fn verify_rejects_tampered_token() -> Result<(), Error> {
        let keys = keys()?;
        let mut token = sign(&keys, &claims_for("access")?)?;
        // Flip a character in the signed body.
        let flipped = if token.ends_with('A') { 'B' } else { 'A' };
        token.pop();
        token.push(flipped);
        assert!(verify(&keys, &token, &Expectations::default()).is_err());
        Ok(())
    }

    #[test]
    fn verify_rejects_audience_confusion() -> Result<(), Error> {
        let keys = keys()?;
        let token = sign(&keys, &claims_for("refresh")?)?;
        let result = verify(
            &keys,
            &token,
            &Expectations {
                issuer: None,
                audience: Some("access"),
                subject: None,
            },
        );
        assert!(matches!(result, Err(Error::InvalidAudience)));
        Ok(())
    }

    #[test]
    fn verify_rejects_expired_token_as_expired() -> Result<(), Error> {
        let keys = keys()?;
        let mut claims = Claims::new().map_err(|_| Error::Claim)?;
        let past = rfc3339_from_unix(1_600_000_000)?;
        let soon_after = rfc3339_from_unix(1_600_000_060)?;
        claims.issued_at(&past).map_err(|_| Error::Claim)?;
        claims.not_before(&past).map_err(|_| Error::Claim)?;
        claims.expiration(&soon_after).map_err(|_| Error::Claim)?;
        let token = sign(&keys, &claims)?;

        let result = verify(&keys, &token, &Expectations::default());
        assert!(matches!(result, Err(Error::Expired)));
        Ok(())
    }

    #[test]
    fn unix_rfc3339_round_trip() -> Result<(), Error> {
        let unix = 1_700_000_000;
        let formatted = rfc3339_from_unix(unix)?;
        assert_eq!(unix_from_rfc3339(&formatted)?, unix);
        Ok(())
    }
}
