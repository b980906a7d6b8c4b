use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum SessionScope {
    /// Browsing session, 24 h TTL.
    General,
    /// Checkout session, 30 min TTL.
    Booking,
}

/// Claims carried by the signed session token: id, CSRF token, timestamps
/// and client fingerprint.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionClaims {
    pub sid: String,
    pub csrf: String,
    pub scope: SessionScope,
    pub ip: String,
    pub ua: String,
    pub iat: i64,
    pub exp: i64,
}

#[derive(Debug, Clone)]
pub struct IssuedSession {
    pub token: String,
    pub claims: SessionClaims,
}

#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    #[error("Invalid session token: {0}")]
    Invalid(String),
    #[error("Session expired")]
    Expired,
}

/// Signs and verifies HS256 session tokens. Verification is a pure function
/// of (token, secret, now) so it is unit-testable without an HTTP layer.
#[derive(Clone)]
pub struct SessionManager {
    secret: String,
    general_ttl: Duration,
    booking_ttl: Duration,
}

impl SessionManager {
    pub fn new(secret: String, general_ttl_seconds: i64, booking_ttl_seconds: i64) -> Self {
        Self {
            secret,
            general_ttl: Duration::seconds(general_ttl_seconds),
            booking_ttl: Duration::seconds(booking_ttl_seconds),
        }
    }

    fn ttl(&self, scope: SessionScope) -> Duration {
        match scope {
            SessionScope::General => self.general_ttl,
            SessionScope::Booking => self.booking_ttl,
        }
    }

    pub fn issue(
        &self,
        scope: SessionScope,
        ip: &str,
        user_agent: &str,
        now: DateTime<Utc>,
    ) -> Result<IssuedSession, SessionError> {
        let claims = SessionClaims {
            sid: Uuid::new_v4().simple().to_string(),
            csrf: Uuid::new_v4().simple().to_string(),
            scope,
            ip: ip.to_string(),
            ua: user_agent.to_string(),
            iat: now.timestamp(),
            exp: (now + self.ttl(scope)).timestamp(),
        };

        let token = encode(
            &Header::new(Algorithm::HS256),
            &claims,
            &EncodingKey::from_secret(self.secret.as_bytes()),
        )
        .map_err(|e| SessionError::Invalid(e.to_string()))?;

        Ok(IssuedSession { token, claims })
    }

    /// Verify signature, embedded expiry and elapsed age against the scope
    /// TTL. The age check guards a token whose exp claim was somehow issued
    /// beyond the intended lifetime.
    pub fn verify(&self, token: &str, now: DateTime<Utc>) -> Result<SessionClaims, SessionError> {
        // Expiry is checked explicitly against the caller's clock.
        let mut validation = Validation::new(Algorithm::HS256);
        validation.validate_exp = false;
        validation.required_spec_claims.clear();

        let data = decode::<SessionClaims>(
            token,
            &DecodingKey::from_secret(self.secret.as_bytes()),
            &validation,
        )
        .map_err(|e| SessionError::Invalid(e.to_string()))?;

        let claims = data.claims;
        if now.timestamp() >= claims.exp {
            return Err(SessionError::Expired);
        }
        let age = now.timestamp() - claims.iat;
        if age > self.ttl(claims.scope).num_seconds() {
            return Err(SessionError::Expired);
        }

        Ok(claims)
    }
}

/// CSRF double-submit check: the token embedded in the signed session must
/// equal the one echoed back in the request header.
pub fn csrf_matches(claims: &SessionClaims, header_value: &str) -> bool {
    !claims.csrf.is_empty() && claims.csrf == header_value
}
