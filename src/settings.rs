use config::{Config, ConfigError, Environment, File};
use serde::Deserialize;
use dotenv::dotenv;
use jsonwebtoken::{DecodingKey, EncodingKey};
use std::{env, fmt, str::FromStr};
use zeroize::Zeroizing;

#[derive(Debug, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum AppEnvironment {
    Development,
    Production,
    Testing,
}

impl FromStr for AppEnvironment {
    type Err = ConfigError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "development" => Ok(AppEnvironment::Development),
            "production" => Ok(AppEnvironment::Production),
            "testing" => Ok(AppEnvironment::Testing),
            _ => Err(ConfigError::Message(format!("Invalid environment: {}", s))),
        }
    }
}

#[derive(Debug, Deserialize, Clone, Copy, PartialEq)]
#[serde(rename_all = "lowercase")]
pub enum StorageBackend {
    Supabase,
    Local,
}

#[derive(Deserialize, Clone)]
#[serde(rename_all = "snake_case")]
pub struct AppConfig {
    #[serde(default = "default_env")]
    pub env: AppEnvironment,

    #[serde(default = "default_name")]
    pub name: String,

    #[serde(default = "default_port")]
    pub port: u16,

    #[serde(default = "default_host")]
    pub host: String,

    #[serde(default = "default_worker_count")]
    pub worker_count: usize,

    #[serde(default)]
    pub database_url: String,

    #[serde(default = "default_database_max_connections")]
    pub database_max_connections: u32,

    #[serde(default)]
    pub redis_url: Option<String>,

    #[serde(default = "default_cors_origins")]
    pub cors_allowed_origins: Vec<String>,

    #[serde(default = "default_true")]
    pub trust_x_forwarded_for: bool,

    // ── Admin session ──
    #[serde(default)]
    pub session_secret: String,

    #[serde(default = "default_session_cookie_name")]
    pub session_cookie_name: String,

    #[serde(default = "default_session_ttl_hours")]
    pub session_ttl_hours: i64,

    #[serde(default = "default_admin_username")]
    pub admin_username: String,

    #[serde(default)]
    pub admin_password_hash: Option<String>,

    // ── Uploads ──
    #[serde(default = "default_max_upload_bytes")]
    pub max_upload_bytes: u64,

    #[serde(default = "default_thumbnail_max_dimension")]
    pub thumbnail_max_dimension: u32,

    #[serde(default = "default_thumbnail_jpeg_quality")]
    pub thumbnail_jpeg_quality: u8,

    // ── Object storage ──
    #[serde(default = "default_storage_backend")]
    pub storage_backend: StorageBackend,

    #[serde(default)]
    pub supabase_url: Option<String>,

    #[serde(default)]
    pub supabase_service_key: Option<String>,

    #[serde(default = "default_photos_bucket")]
    pub photos_bucket: String,

    #[serde(default = "default_thumbnails_bucket")]
    pub thumbnails_bucket: String,

    #[serde(default = "default_local_storage_dir")]
    pub local_storage_dir: String,

    #[serde(default = "default_public_base_url")]
    pub public_base_url: String,

    // ── Email ──
    #[serde(default)]
    pub resend_api_key: Option<String>,

    #[serde(default = "default_contact_email")]
    pub contact_email: String,

    #[serde(default = "default_email_from")]
    pub email_from: String,

    #[serde(default = "default_site_name")]
    pub site_name: String,

    #[serde(default = "default_site_url")]
    pub site_url: String,

    #[serde(default = "default_contact_rate_limit")]
    pub contact_rate_limit: u64,

    #[serde(default = "default_contact_rate_window_secs")]
    pub contact_rate_window_secs: u64,

    // ── Cache invalidation ──
    #[serde(default)]
    pub revalidate_secret: Option<String>,

    #[serde(default)]
    pub revalidate_webhook_url: Option<String>,
}

fn default_env() -> AppEnvironment {
    AppEnvironment::Development
}
fn default_name() -> String {
    "Photo-Portfolio-API".to_string()
}
fn default_port() -> u16 {
    8080
}
fn default_host() -> String {
    "127.0.0.1".to_string()
}
fn default_worker_count() -> usize {
    num_cpus::get()
}
fn default_database_max_connections() -> u32 {
    10
}
fn default_cors_origins() -> Vec<String> {
    vec!["*".to_string()]
}
fn default_true() -> bool {
    true
}
fn default_session_cookie_name() -> String {
    "tonalfocus_admin_session".to_string()
}
fn default_session_ttl_hours() -> i64 {
    24
}
fn default_admin_username() -> String {
    "admin".to_string()
}
fn default_max_upload_bytes() -> u64 {
    10 * 1024 * 1024
}
fn default_thumbnail_max_dimension() -> u32 {
    1200
}
fn default_thumbnail_jpeg_quality() -> u8 {
    85
}
fn default_storage_backend() -> StorageBackend {
    StorageBackend::Local
}
fn default_photos_bucket() -> String {
    "photos".to_string()
}
fn default_thumbnails_bucket() -> String {
    "thumbnails".to_string()
}
fn default_local_storage_dir() -> String {
    "./uploads".to_string()
}
fn default_public_base_url() -> String {
    "http://127.0.0.1:8080".to_string()
}
fn default_contact_email() -> String {
    "info@tonalfocus.com".to_string()
}
fn default_email_from() -> String {
    "noreply@tonalfocus.com".to_string()
}
fn default_site_name() -> String {
    "TonalFocus Photography".to_string()
}
fn default_site_url() -> String {
    "https://tonalfocus.com".to_string()
}
fn default_contact_rate_limit() -> u64 {
    5
}
fn default_contact_rate_window_secs() -> u64 {
    60 * 60
}

impl Default for AppConfig {
    fn default() -> Self {
        AppConfig {
            env: default_env(),
            name: default_name(),
            port: default_port(),
            host: default_host(),
            worker_count: default_worker_count(),
            database_url: String::new(),
            database_max_connections: default_database_max_connections(),
            redis_url: None,
            cors_allowed_origins: default_cors_origins(),
            trust_x_forwarded_for: default_true(),
            session_secret: String::new(),
            session_cookie_name: default_session_cookie_name(),
            session_ttl_hours: default_session_ttl_hours(),
            admin_username: default_admin_username(),
            admin_password_hash: None,
            max_upload_bytes: default_max_upload_bytes(),
            thumbnail_max_dimension: default_thumbnail_max_dimension(),
            thumbnail_jpeg_quality: default_thumbnail_jpeg_quality(),
            storage_backend: default_storage_backend(),
            supabase_url: None,
            supabase_service_key: None,
            photos_bucket: default_photos_bucket(),
            thumbnails_bucket: default_thumbnails_bucket(),
            local_storage_dir: default_local_storage_dir(),
            public_base_url: default_public_base_url(),
            resend_api_key: None,
            contact_email: default_contact_email(),
            email_from: default_email_from(),
            site_name: default_site_name(),
            site_url: default_site_url(),
            contact_rate_limit: default_contact_rate_limit(),
            contact_rate_window_secs: default_contact_rate_window_secs(),
            revalidate_secret: None,
            revalidate_webhook_url: None,
        }
    }
}

impl AppConfig {
    pub fn new() -> Result<Self, ConfigError> {
        dotenv().ok();

        let raw_env = env::var("APP_ENV").unwrap_or_else(|_| "development".into());
        let env_name = AppEnvironment::from_str(&raw_env)
            .map_err(|_| ConfigError::Message(format!("Invalid APP_ENV value: {}", raw_env)))?;

        let builder = Config::builder()
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env_name)).required(false))
            .add_source(
                Environment::with_prefix("APP")
                    .prefix_separator("_")
                    .separator("__")
                    .try_parsing(true)
                    .list_separator(",")
                    .with_list_parse_key("cors_allowed_origins")
                    .ignore_empty(true),
            );

        let mut config: Self = builder.build()?.try_deserialize()?;

        config.env = env_name;

        // Inject critical env values if missing
        config.database_url = fill_or_env(config.database_url, "APP_DATABASE_URL")?;
        config.session_secret = fill_or_env(config.session_secret, "APP_SESSION_SECRET")?;

        if config.redis_url.is_none() {
            config.redis_url = env::var("APP_REDIS_URL").ok();
        }

        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let mut errors = Vec::new();

        if self.database_url.trim().is_empty() {
            errors.push("DATABASE_URL cannot be empty");
        }
        if self.session_secret.len() < 32 {
            errors.push("SESSION_SECRET must be at least 32 characters");
        }
        if self.database_max_connections == 0 {
            errors.push("DATABASE_MAX_CONNECTIONS must be positive");
        }
        if self.session_ttl_hours <= 0 {
            errors.push("SESSION_TTL_HOURS must be positive");
        }
        if self.max_upload_bytes == 0 {
            errors.push("MAX_UPLOAD_BYTES must be positive");
        }
        if self.thumbnail_max_dimension == 0 {
            errors.push("THUMBNAIL_MAX_DIMENSION must be positive");
        }
        if !(1..=100).contains(&self.thumbnail_jpeg_quality) {
            errors.push("THUMBNAIL_JPEG_QUALITY must be between 1 and 100");
        }
        if self.is_production() && self.cors_origins().iter().any(|o| o == "*") {
            errors.push("Wildcard CORS (*) is not allowed in production");
        }
        if self.is_production() && self.admin_password_hash.as_deref().is_none_or(str::is_empty) {
            errors.push("ADMIN_PASSWORD_HASH must be set in production");
        }
        if url::Url::parse(&self.public_base_url).is_err() {
            errors.push("PUBLIC_BASE_URL must be an absolute URL");
        }
        if self.revalidate_webhook_url.as_deref().is_some_and(|u| !u.trim().is_empty() && url::Url::parse(u).is_err()) {
            errors.push("REVALIDATE_WEBHOOK_URL must be an absolute URL");
        }
        if self.storage_backend == StorageBackend::Supabase {
            if self.supabase_url.as_deref().is_none_or(str::is_empty) {
                errors.push("SUPABASE_URL must be set for the supabase storage backend");
            }
            if self.supabase_service_key.as_deref().is_none_or(str::is_empty) {
                errors.push("SUPABASE_SERVICE_KEY must be set for the supabase storage backend");
            }
        }

        if errors.is_empty() {
            Ok(())
        } else {
            Err(ConfigError::Message(errors.join(", ")))
        }
    }

    pub fn is_production(&self) -> bool {
        self.env == AppEnvironment::Production
    }

    pub fn is_development(&self) -> bool {
        self.env == AppEnvironment::Development
    }

    pub fn cors_origins(&self) -> Vec<String> {
        self.cors_allowed_origins
            .iter()
            .flat_map(|origin| origin.split(','))
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect()
    }

    /// Upper bound for a whole multipart upload request. Files between
    /// `max_upload_bytes` and this limit still reach the upload validator,
    /// which reports both sizes.
    pub fn multipart_total_limit(&self) -> usize {
        (self.max_upload_bytes as usize).saturating_mul(2)
    }
}

fn fill_or_env(current: String, env_key: &str) -> Result<String, ConfigError> {
    if current.trim().is_empty() {
        env::var(env_key).map_err(|_| ConfigError::Message(format!("{env_key} must be set")))
    } else {
        Ok(current)
    }
}

impl fmt::Display for AppEnvironment {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AppEnvironment::Development => "development",
            AppEnvironment::Production => "production",
            AppEnvironment::Testing => "testing",
        };
        write!(f, "{s}")
    }
}

impl fmt::Display for StorageBackend {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            StorageBackend::Supabase => "supabase",
            StorageBackend::Local => "local",
        };
        write!(f, "{s}")
    }
}

trait Redact {
    fn redact(&self) -> &str;
}

impl Redact for str {
    fn redact(&self) -> &str {
        if self.is_empty() {
            "[MISSING]"
        } else if self.len() < 32 {
            "[TOO_SHORT]"
        } else {
            "[REDACTED]"
        }
    }
}

impl Redact for String {
    fn redact(&self) -> &str {
        self.as_str().redact()
    }
}

impl Redact for Option<String> {
    fn redact(&self) -> &str {
        match self {
            Some(value) if !value.is_empty() => "[REDACTED]",
            _ => "[MISSING]",
        }
    }
}

impl fmt::Debug for AppConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("AppConfig")
            .field("env", &self.env)
            .field("name", &self.name)
            .field("port", &self.port)
            .field("host", &self.host)
            .field("worker_count", &self.worker_count)
            .field("database_url", &self.database_url.redact())
            .field("database_max_connections", &self.database_max_connections)
            .field("redis_url", &self.redis_url.redact())
            .field("cors_allowed_origins", &self.cors_allowed_origins)
            .field("trust_x_forwarded_for", &self.trust_x_forwarded_for)
            .field("session_secret", &self.session_secret.redact())
            .field("session_cookie_name", &self.session_cookie_name)
            .field("session_ttl_hours", &self.session_ttl_hours)
            .field("admin_username", &self.admin_username)
            .field("admin_password_hash", &self.admin_password_hash.redact())
            .field("max_upload_bytes", &self.max_upload_bytes)
            .field("thumbnail_max_dimension", &self.thumbnail_max_dimension)
            .field("thumbnail_jpeg_quality", &self.thumbnail_jpeg_quality)
            .field("storage_backend", &self.storage_backend)
            .field("supabase_url", &self.supabase_url)
            .field("supabase_service_key", &self.supabase_service_key.redact())
            .field("photos_bucket", &self.photos_bucket)
            .field("thumbnails_bucket", &self.thumbnails_bucket)
            .field("local_storage_dir", &self.local_storage_dir)
            .field("public_base_url", &self.public_base_url)
            .field("resend_api_key", &self.resend_api_key.redact())
            .field("contact_email", &self.contact_email)
            .field("contact_rate_limit", &self.contact_rate_limit)
            .field("contact_rate_window_secs", &self.contact_rate_window_secs)
            .field("revalidate_secret", &self.revalidate_secret.redact())
            .field("revalidate_webhook_url", &self.revalidate_webhook_url)
            .finish()
    }
}

#[derive(Clone)]
pub struct SessionKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
}

impl From<&AppConfig> for SessionKeys {
    fn from(config: &AppConfig) -> Self {
        let secret = Zeroizing::new(config.session_secret.clone());

        SessionKeys {
            encoding: EncodingKey::from_secret(secret.as_bytes()),
            decoding: DecodingKey::from_secret(secret.as_bytes()),
        }
    }
}

impl fmt::Debug for SessionKeys {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SessionKeys")
            .field("encoding", &"[REDACTED]")
            .field("decoding", &"[REDACTED]")
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn valid_config() -> AppConfig {
        AppConfig {
            database_url: "postgres://localhost/photos".into(),
            session_secret: "a-session-secret-that-is-long-enough-123".into(),
            ..AppConfig::default()
        }
    }

    #[test]
    fn default_config_with_secrets_is_valid() {
        assert!(valid_config().validate().is_ok());
    }

    #[test]
    fn short_session_secret_is_rejected() {
        let config = AppConfig {
            session_secret: "short".into(),
            ..valid_config()
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("SESSION_SECRET"));
    }

    #[test]
    fn production_requires_password_hash_and_explicit_origins() {
        let config = AppConfig {
            env: AppEnvironment::Production,
            ..valid_config()
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("Wildcard CORS"));
        assert!(err.contains("ADMIN_PASSWORD_HASH"));
    }

    #[test]
    fn supabase_backend_requires_credentials() {
        let config = AppConfig {
            storage_backend: StorageBackend::Supabase,
            ..valid_config()
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("SUPABASE_URL"));
        assert!(err.contains("SUPABASE_SERVICE_KEY"));
    }

    #[test]
    fn relative_urls_are_rejected() {
        let config = AppConfig {
            public_base_url: "/media".into(),
            revalidate_webhook_url: Some("renderer/revalidate".into()),
            ..valid_config()
        };

        let err = config.validate().unwrap_err().to_string();
        assert!(err.contains("PUBLIC_BASE_URL"));
        assert!(err.contains("REVALIDATE_WEBHOOK_URL"));
    }

    #[test]
    fn cors_origins_split_comma_lists() {
        let config = AppConfig {
            cors_allowed_origins: vec!["https://a.com, https://b.com".into(), " ".into()],
            ..valid_config()
        };

        assert_eq!(config.cors_origins(), vec!["https://a.com", "https://b.com"]);
    }

    #[test]
    fn debug_output_redacts_secrets() {
        let rendered = format!("{:?}", valid_config());
        assert!(!rendered.contains("a-session-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
