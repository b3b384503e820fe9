use std::{sync::Arc, time::Duration};

use deadpool_redis::Pool as RedisPool;

mod domain;
mod interfaces;
mod infrastructure;
pub mod errors;
pub mod settings;
pub mod constants;
pub mod graceful_shutdown;
pub mod background_task;

pub use domain::{entities, ordering, use_cases};
pub use interfaces::{handlers, middlewares, repositories, routes};
pub use infrastructure::{auth, db, imaging, limiter, mail, revalidate, storage, utils};

use auth::{password::AdminCredential, session::SessionService};
use limiter::{FixedWindowLimiter, RateLimiter, RedisFixedWindowLimiter};
use mail::{Mailer, ResendMailer, UnconfiguredMailer};
use repositories::{
    category::CategoryRepository,
    photo::PhotoRepository,
    sqlx_repo::{SqlxCategoryRepo, SqlxPhotoRepo},
};
use revalidate::{CacheInvalidator, LogOnlyInvalidator, WebhookInvalidator};
use settings::{AppConfig, StorageBackend};
use storage::{LocalStorage, ObjectStorage, SupabaseStorage};
use use_cases::{
    auth::AdminAuthHandler,
    category::CategoryHandler,
    contact::{ContactHandler, ContactSettings},
    photo::PhotoHandler,
    upload::{UploadHandler, UploadSettings},
};

/// The collaborators behind every use case. Production wiring comes from
/// [`AppServices::from_config`]; tests pass in-memory doubles.
pub struct AppServices {
    pub category_repo: Arc<dyn CategoryRepository>,
    pub photo_repo: Arc<dyn PhotoRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    /// Set when objects live on the local filesystem and are served by `/media`.
    pub local_storage: Option<LocalStorage>,
    pub mailer: Arc<dyn Mailer>,
    pub invalidator: Arc<dyn CacheInvalidator>,
    pub limiter: Arc<dyn RateLimiter>,
    pub redis_pool: Option<RedisPool>,
}

impl AppServices {
    pub fn from_config(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Self> {
        let (storage, local_storage): (Arc<dyn ObjectStorage>, Option<LocalStorage>) = match config.storage_backend {
            StorageBackend::Supabase => {
                let url = config.supabase_url.as_deref().unwrap_or_default();
                let key = config.supabase_service_key.as_deref().unwrap_or_default();
                let supabase = SupabaseStorage::new(url, key)
                    .map_err(|e| anyhow::anyhow!("Supabase storage setup failed: {}", e))?;
                (Arc::new(supabase), None)
            }
            StorageBackend::Local => {
                let local = LocalStorage::new(&config.local_storage_dir, &config.public_base_url);
                (Arc::new(local.clone()), Some(local))
            }
        };

        let mailer: Arc<dyn Mailer> = match config.resend_api_key.as_deref().filter(|k| !k.trim().is_empty()) {
            Some(key) => Arc::new(
                ResendMailer::new(key).map_err(|e| anyhow::anyhow!("Mailer setup failed: {}", e))?,
            ),
            None => {
                tracing::warn!("RESEND_API_KEY not set, contact form will answer 503");
                Arc::new(UnconfiguredMailer)
            }
        };

        let invalidator: Arc<dyn CacheInvalidator> = match config.revalidate_webhook_url.as_deref() {
            Some(url) if !url.trim().is_empty() => Arc::new(
                WebhookInvalidator::new(url, config.revalidate_secret.as_deref())
                    .map_err(|e| anyhow::anyhow!("Revalidation hook setup failed: {}", e))?,
            ),
            _ => Arc::new(LogOnlyInvalidator),
        };

        let redis_pool = match config.redis_url.as_deref() {
            Some(url) if !url.trim().is_empty() => {
                let pool = deadpool_redis::Config::from_url(url)
                    .create_pool(Some(deadpool_redis::Runtime::Tokio1))
                    .map_err(|e| anyhow::anyhow!("Redis pool setup failed: {}", e))?;
                Some(pool)
            }
            _ => None,
        };

        let window = Duration::from_secs(config.contact_rate_window_secs);
        let limiter: Arc<dyn RateLimiter> = match &redis_pool {
            Some(pool) => Arc::new(RedisFixedWindowLimiter::new(
                pool.clone(),
                "contact",
                config.contact_rate_limit,
                window,
            )),
            None => Arc::new(FixedWindowLimiter::new(config.contact_rate_limit, window)),
        };

        Ok(AppServices {
            category_repo: Arc::new(SqlxCategoryRepo::new(pool.clone())),
            photo_repo: Arc::new(SqlxPhotoRepo::new(pool)),
            storage,
            local_storage,
            mailer,
            invalidator,
            limiter,
            redis_pool,
        })
    }
}

/// Request-level settings the HTTP layer needs.
#[derive(Debug, Clone)]
pub struct WebSettings {
    pub session_cookie_name: String,
    pub secure_cookies: bool,
    pub trust_x_forwarded_for: bool,
    pub revalidate_secret: Option<String>,
    pub app_name: String,
}

impl From<&AppConfig> for WebSettings {
    fn from(config: &AppConfig) -> Self {
        WebSettings {
            session_cookie_name: config.session_cookie_name.clone(),
            secure_cookies: config.is_production(),
            trust_x_forwarded_for: config.trust_x_forwarded_for,
            revalidate_secret: config.revalidate_secret.clone().filter(|s| !s.is_empty()),
            app_name: config.name.clone(),
        }
    }
}

pub struct AppState {
    pub auth_handler: AdminAuthHandler,
    pub category_handler: CategoryHandler,
    pub photo_handler: PhotoHandler,
    pub upload_handler: UploadHandler,
    pub contact_handler: ContactHandler,
    pub invalidator: Arc<dyn CacheInvalidator>,
    pub local_storage: Option<LocalStorage>,
    pub redis_pool: Option<RedisPool>,
    pub web: WebSettings,
}

impl AppState {
    pub fn new(config: &AppConfig, pool: sqlx::PgPool) -> anyhow::Result<Self> {
        Ok(Self::with_services(config, AppServices::from_config(config, pool)?))
    }

    pub fn with_services(config: &AppConfig, services: AppServices) -> Self {
        let credential = AdminCredential::from_config(
            config.admin_password_hash.as_deref(),
            config.is_development(),
        );
        let auth_handler = AdminAuthHandler::new(SessionService::new(config), credential, &config.admin_username);

        let category_handler = CategoryHandler::new(services.category_repo.clone(), services.invalidator.clone());

        let photo_handler = PhotoHandler::new(
            services.photo_repo.clone(),
            services.category_repo.clone(),
            services.storage.clone(),
            services.invalidator.clone(),
            &config.photos_bucket,
            &config.thumbnails_bucket,
        );

        let upload_handler = UploadHandler::new(
            services.photo_repo,
            services.category_repo,
            services.storage,
            services.invalidator.clone(),
            UploadSettings::from(config),
        );

        let contact_handler = ContactHandler::new(services.limiter, services.mailer, ContactSettings::from(config));

        AppState {
            auth_handler,
            category_handler,
            photo_handler,
            upload_handler,
            contact_handler,
            invalidator: services.invalidator,
            local_storage: services.local_storage,
            redis_pool: services.redis_pool,
            web: WebSettings::from(config),
        }
    }

    pub fn storage_backend(&self) -> &'static str {
        self.upload_handler.storage.backend_name()
    }
}
