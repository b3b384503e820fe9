use std::sync::Arc;

use chrono::{Duration, Utc};
use dashmap::DashMap;
use jsonwebtoken::{decode, encode, Algorithm, Header, Validation};
use uuid::Uuid;

use crate::entities::session::{IssuedSession, SessionClaims};
use crate::errors::AuthError;
use crate::settings::{AppConfig, SessionKeys};

const SESSION_ALGORITHM: Algorithm = Algorithm::HS256;

/// Nonces of logged-out sessions, kept until the token would have expired
/// anyway.
#[derive(Clone, Default)]
pub struct RevocationList {
    revoked: Arc<DashMap<String, usize>>,
}

impl RevocationList {
    pub fn revoke(&self, jti: &str, exp: usize) {
        self.revoked.insert(jti.to_string(), exp);
    }

    pub fn is_revoked(&self, jti: &str) -> bool {
        self.revoked.contains_key(jti)
    }

    /// Drops entries whose token has expired. Returns how many were removed.
    pub fn purge_expired(&self, now: usize) -> usize {
        let before = self.revoked.len();
        self.revoked.retain(|_, exp| *exp > now);
        before.saturating_sub(self.revoked.len())
    }

    pub fn len(&self) -> usize {
        self.revoked.len()
    }

    pub fn is_empty(&self) -> bool {
        self.revoked.is_empty()
    }
}

/// Issues and verifies the signed admin session token.
#[derive(Clone)]
pub struct SessionService {
    keys: SessionKeys,
    ttl: Duration,
    revocations: RevocationList,
}

impl SessionService {
    pub fn new(config: &AppConfig) -> Self {
        SessionService {
            keys: SessionKeys::from(config),
            ttl: Duration::hours(config.session_ttl_hours),
            revocations: RevocationList::default(),
        }
    }

    pub fn ttl(&self) -> Duration {
        self.ttl
    }

    pub fn revocations(&self) -> &RevocationList {
        &self.revocations
    }

    pub fn issue(&self, username: &str) -> Result<IssuedSession, AuthError> {
        let now = Utc::now();
        let claims = SessionClaims {
            sub: username.to_string(),
            iat: now.timestamp() as usize,
            exp: (now + self.ttl).timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };

        let token = encode(&Header::new(SESSION_ALGORITHM), &claims, &self.keys.encoding)
            .map_err(|_| AuthError::TokenCreation)?;

        Ok(IssuedSession { token, claims })
    }

    /// Checks signature, expiry and revocation.
    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        let mut validation = Validation::new(SESSION_ALGORITHM);
        validation.validate_exp = true;
        validation.leeway = 0;
        validation.set_required_spec_claims(&["exp", "sub"]);

        let claims = decode::<SessionClaims>(token, &self.keys.decoding, &validation)?.claims;

        if self.revocations.is_revoked(&claims.jti) {
            return Err(AuthError::TokenRevoked);
        }

        Ok(claims)
    }

    pub fn revoke(&self, claims: &SessionClaims) {
        self.revocations.revoke(&claims.jti, claims.exp);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn config() -> AppConfig {
        AppConfig {
            session_secret: "unit-test-session-secret-0123456789abcdef".into(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn issued_sessions_verify() {
        let service = SessionService::new(&config());
        let session = service.issue("admin").unwrap();

        let claims = service.verify(&session.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[test]
    fn tokens_signed_with_another_secret_are_rejected() {
        let service = SessionService::new(&config());
        let other = SessionService::new(&AppConfig {
            session_secret: "a-completely-different-secret-0123456789".into(),
            ..AppConfig::default()
        });

        let session = other.issue("admin").unwrap();
        assert!(matches!(service.verify(&session.token), Err(AuthError::InvalidToken)));
    }

    #[test]
    fn expired_tokens_are_rejected() {
        let service = SessionService::new(&config());
        let past = Utc::now() - Duration::hours(2);
        let claims = SessionClaims {
            sub: "admin".into(),
            iat: past.timestamp() as usize,
            exp: (past + Duration::hours(1)).timestamp() as usize,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(&Header::new(SESSION_ALGORITHM), &claims, &service.keys.encoding).unwrap();

        assert!(matches!(service.verify(&token), Err(AuthError::TokenExpired)));
    }

    #[test]
    fn revoked_sessions_are_rejected_until_purged() {
        let service = SessionService::new(&config());
        let session = service.issue("admin").unwrap();

        service.revoke(&session.claims);
        assert!(matches!(service.verify(&session.token), Err(AuthError::TokenRevoked)));

        assert_eq!(service.revocations().purge_expired(session.claims.exp - 1), 0);
        assert_eq!(service.revocations().purge_expired(session.claims.exp), 1);
        assert!(service.revocations().is_empty());
    }

    #[test]
    fn garbage_is_an_invalid_token() {
        let service = SessionService::new(&config());
        assert!(matches!(service.verify("not.a.token"), Err(AuthError::InvalidToken)));
    }
}
