use crate::errors::PasswordError;

/// Cost used for stored admin hashes.
pub const BCRYPT_COST: u32 = 10;

/// Accepted admin password when no hash is configured. Only honoured in the
/// development environment.
pub const DEVELOPMENT_PASSWORD: &str = "admin123";

pub fn hash_password(password: &str) -> Result<String, PasswordError> {
    if password.is_empty() {
        return Err(PasswordError::Empty);
    }
    bcrypt::hash(password, BCRYPT_COST).map_err(|e| PasswordError::HashingError(e.to_string()))
}

pub fn verify_password(password: &str, hashed: &str) -> Result<bool, PasswordError> {
    bcrypt::verify(password, hashed).map_err(|e| PasswordError::InvalidHashFormat(e.to_string()))
}

/// How the admin password is checked.
#[derive(Clone)]
pub enum AdminCredential {
    Hash(String),
    /// No hash configured, development only.
    DevelopmentFallback,
    /// No hash configured outside development; every login fails.
    Disabled,
}

impl AdminCredential {
    pub fn from_config(hash: Option<&str>, is_development: bool) -> Self {
        match hash.map(str::trim).filter(|h| !h.is_empty()) {
            Some(hash) => AdminCredential::Hash(hash.to_string()),
            None if is_development => {
                tracing::warn!("ADMIN_PASSWORD_HASH not set, accepting the development password");
                AdminCredential::DevelopmentFallback
            }
            None => {
                tracing::error!("ADMIN_PASSWORD_HASH not set, admin login is disabled");
                AdminCredential::Disabled
            }
        }
    }

    pub fn verify(&self, password: &str) -> Result<bool, PasswordError> {
        match self {
            AdminCredential::Hash(hash) => verify_password(password, hash),
            AdminCredential::DevelopmentFallback => Ok(password == DEVELOPMENT_PASSWORD),
            AdminCredential::Disabled => Ok(false),
        }
    }
}

impl std::fmt::Debug for AdminCredential {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            AdminCredential::Hash(_) => f.write_str("Hash([REDACTED])"),
            AdminCredential::DevelopmentFallback => f.write_str("DevelopmentFallback"),
            AdminCredential::Disabled => f.write_str("Disabled"),
        }
    }
}
