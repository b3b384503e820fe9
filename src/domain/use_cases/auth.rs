use validator::Validate;

use crate::{
    auth::{password::AdminCredential, session::SessionService},
    entities::session::{IssuedSession, LoginRequest, SessionClaims, SessionStatus},
    errors::AuthError,
};

pub struct AdminAuthHandler {
    pub sessions: SessionService,
    pub credential: AdminCredential,
    pub admin_username: String,
}

impl AdminAuthHandler {
    pub fn new(sessions: SessionService, credential: AdminCredential, admin_username: &str) -> Self {
        AdminAuthHandler {
            sessions,
            credential,
            admin_username: admin_username.to_string(),
        }
    }

    /// Checks the single admin account and issues a session token.
    pub async fn login(&self, request: LoginRequest) -> Result<IssuedSession, AuthError> {
        request.validate()?;

        let credential = self.credential.clone();
        let password = request.password;
        // bcrypt verification blocks
        let password_ok = tokio::task::spawn_blocking(move || credential.verify(&password))
            .await
            .map_err(|e| AuthError::PasswordError(e.to_string()))?
            .unwrap_or_else(|e| {
                tracing::error!(error = %e, "Stored admin hash could not be checked");
                false
            });

        if request.username != self.admin_username || !password_ok {
            tracing::warn!(username = %request.username, "Admin login rejected");
            return Err(AuthError::WrongCredentials);
        }

        let session = self.sessions.issue(&self.admin_username)?;
        tracing::info!(username = %session.claims.sub, "Admin logged in");
        Ok(session)
    }

    pub fn logout(&self, claims: Option<&SessionClaims>) {
        if let Some(claims) = claims {
            self.sessions.revoke(claims);
            tracing::info!(username = %claims.sub, "Admin logged out");
        }
    }

    pub fn status(&self, claims: &SessionClaims) -> SessionStatus {
        SessionStatus {
            authenticated: true,
            username: claims.sub.clone(),
            expires_at: claims.expires_at(),
        }
    }

    pub fn verify(&self, token: &str) -> Result<SessionClaims, AuthError> {
        self.sessions.verify(token)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::auth::password::hash_password;
    use crate::settings::AppConfig;

    fn sessions() -> SessionService {
        SessionService::new(&AppConfig {
            session_secret: "auth-handler-test-secret-0123456789abcdef".into(),
            ..AppConfig::default()
        })
    }

    fn login(username: &str, password: &str) -> LoginRequest {
        LoginRequest { username: username.into(), password: password.into() }
    }

    #[actix_rt::test]
    async fn correct_credentials_issue_a_verifiable_session() {
        let hash = hash_password("darkroom").unwrap();
        let handler = AdminAuthHandler::new(sessions(), AdminCredential::Hash(hash), "admin");

        let session = handler.login(login("admin", "darkroom")).await.unwrap();
        let claims = handler.verify(&session.token).unwrap();
        assert_eq!(claims.sub, "admin");
        assert_eq!(claims.exp - claims.iat, 24 * 60 * 60);
    }

    #[actix_rt::test]
    async fn wrong_password_or_user_is_rejected() {
        let hash = hash_password("darkroom").unwrap();
        let handler = AdminAuthHandler::new(sessions(), AdminCredential::Hash(hash), "admin");

        assert!(matches!(handler.login(login("admin", "lightroom")).await, Err(AuthError::WrongCredentials)));
        assert!(matches!(handler.login(login("root", "darkroom")).await, Err(AuthError::WrongCredentials)));
    }

    #[actix_rt::test]
    async fn development_fallback_accepts_fixed_password() {
        let handler = AdminAuthHandler::new(sessions(), AdminCredential::DevelopmentFallback, "admin");
        assert!(handler.login(login("admin", "admin123")).await.is_ok());

        let disabled = AdminAuthHandler::new(sessions(), AdminCredential::Disabled, "admin");
        assert!(disabled.login(login("admin", "admin123")).await.is_err());
    }

    #[actix_rt::test]
    async fn logout_revokes_the_session() {
        let handler = AdminAuthHandler::new(sessions(), AdminCredential::DevelopmentFallback, "admin");
        let session = handler.login(login("admin", "admin123")).await.unwrap();

        handler.logout(Some(&session.claims));
        assert!(matches!(handler.verify(&session.token), Err(AuthError::TokenRevoked)));
    }
}
