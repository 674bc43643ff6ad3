use std::collections::HashMap;

use chrono::{serde::ts_seconds, DateTime, Utc};
use jsonwebtoken::{Algorithm, DecodingKey, EncodingKey, Header, Validation};
use rocket::serde::json::Value;
use serde::{Deserialize, Serialize};

use crate::config::Config;
use crate::error::{Error, Result, INVALID_ACCESS_CODE_MESSAGE};

/// Who an access token was issued for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Subject {
    /// The email the candidate registered with.
    Email(String),
    /// The candidate's registry ID.
    SequentialId(String),
}

/// A stateless access token granting the right to edit one candidature.
///
/// Tokens are HMAC-signed JWTs (HS256 when issued here) carrying either an
/// `email` or a `seqid` claim plus an expiry. Nothing is stored server side:
/// a token is valid iff its signature checks out and it has not expired.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AccessToken {
    pub subject: Subject,
}

/// Token claims: the subject plus an expiry datetime.
#[derive(Serialize, Deserialize)]
struct Claims {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    email: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    seqid: Option<String>,
    #[serde(rename = "exp", with = "ts_seconds")]
    expire_at: DateTime<Utc>,
}

impl AccessToken {
    pub fn new(subject: Subject) -> Self {
        Self { subject }
    }

    /// Sign a new token for this subject, valid for the configured time.
    pub fn issue(&self, config: &Config) -> Result<String> {
        self.issue_with_expiry(config, Utc::now() + config.access_ttl())
    }

    /// Sign a new token for this subject expiring at the given time.
    pub fn issue_with_expiry(&self, config: &Config, expire_at: DateTime<Utc>) -> Result<String> {
        let (email, seqid) = match &self.subject {
            Subject::Email(email) => (Some(email.clone()), None),
            Subject::SequentialId(id) => (None, Some(id.clone())),
        };
        let claims = Claims {
            email,
            seqid,
            expire_at,
        };
        let token = jsonwebtoken::encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(config.jwt_secret()),
        )?;
        Ok(token)
    }

    /// Does this token carry a valid signature and an expiry in the future?
    ///
    /// Any HMAC signature made with the configured secret is accepted. Never fails.
    pub fn is_valid(token: &str, config: &Config) -> bool {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.algorithms = vec![Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];
        validation.leeway = 0;
        match jsonwebtoken::decode::<HashMap<String, Value>>(
            token,
            &DecodingKey::from_secret(config.jwt_secret()),
            &validation,
        ) {
            Ok(_) => true,
            Err(err) => {
                debug!("Invalid access token: {err}");
                false
            }
        }
    }

    /// Read every claim but the expiry, without checking the signature.
    ///
    /// Non-string claims are returned in their JSON form.
    pub fn claims(token: &str) -> Result<HashMap<String, String>> {
        let mut validation = Validation::new(Algorithm::HS256);
        validation.insecure_disable_signature_validation();
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = jsonwebtoken::decode::<HashMap<String, Value>>(
            token,
            &DecodingKey::from_secret(&[]),
            &validation,
        )
        .map_err(|err| Error::ClaimsExtraction(err.to_string()))?;

        Ok(data
            .claims
            .into_iter()
            .filter(|(name, _)| name != "exp")
            .map(|(name, value)| match value {
                Value::String(value) => (name, value),
                value => (name, value.to_string()),
            })
            .collect())
    }

    /// Check a token and work out who it was issued for.
    ///
    /// A registry ID takes precedence over an email when both are present.
    /// Every failure surfaces as [`Error::Unauthorized`].
    pub fn verify(token: &str, config: &Config) -> Result<Self> {
        if !Self::is_valid(token, config) {
            return Err(Error::Unauthorized(INVALID_ACCESS_CODE_MESSAGE.to_string()));
        }
        let mut claims = Self::claims(token).map_err(|err| {
            debug!("{err}");
            Error::Unauthorized(INVALID_ACCESS_CODE_MESSAGE.to_string())
        })?;

        let non_empty = |value: Option<String>| value.filter(|value| !value.trim().is_empty());
        if let Some(id) = non_empty(claims.remove("seqid")) {
            Ok(Self::new(Subject::SequentialId(id)))
        } else if let Some(email) = non_empty(claims.remove("email")) {
            Ok(Self::new(Subject::Email(email)))
        } else {
            debug!("Access token has no subject");
            Err(Error::Unauthorized(INVALID_ACCESS_CODE_MESSAGE.to_string()))
        }
    }
}
