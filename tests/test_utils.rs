#![allow(dead_code)]

use std::{
    collections::HashMap,
    io::Cursor,
    sync::{
        atomic::{AtomicBool, Ordering},
        Arc,
    },
    time::Duration,
};

use actix_web::web;
use async_trait::async_trait;
use chrono::Utc;
use image::{ImageFormat, Rgb, RgbImage};
use parking_lot::Mutex;
use sqlx::types::Json;
use uuid::Uuid;

use photo_portfolio::{
    auth::password::hash_password,
    entities::{
        category::{Category, CategoryChanges, NewCategory},
        photo::{ColorMode, ColorView, NewPhoto, Photo, PhotoChanges, PhotoFilter, PhotoWithCategory},
    },
    errors::AppError,
    limiter::FixedWindowLimiter,
    mail::{MailError, Mailer, OutgoingEmail},
    ordering::{assign_positions, plan_move, validate_reorder},
    repositories::{category::CategoryRepository, photo::PhotoRepository},
    revalidate::{CacheInvalidator, InvalidationError},
    settings::{AppConfig, AppEnvironment},
    storage::{ObjectStorage, StorageError, StoredObject},
    AppServices, AppState,
};

pub const ADMIN_USERNAME: &str = "admin";
pub const ADMIN_PASSWORD: &str = "correct-horse-battery";
pub const BOUNDARY: &str = "----portfolio-test-boundary";

/// Builds the real app (routes, session middleware, multipart limits)
/// around the given state, ready for `actix_web::test` calls.
macro_rules! test_app {
    ($state:expr) => {
        actix_web::test::init_service(
            actix_web::App::new()
                .app_data($state.clone())
                .app_data(photo_portfolio::routes::multipart_config(1024 * 1024, 2 * 1024 * 1024))
                .wrap(photo_portfolio::middlewares::auth::AdminSessionMiddleware)
                .wrap(actix_web::middleware::NormalizePath::trim())
                .configure(photo_portfolio::routes::configure_routes),
        )
        .await
    };
}

/// Logs in as the configured admin and returns the session cookie.
macro_rules! admin_cookie {
    ($app:expr, $ctx:expr) => {{
        let req = actix_web::test::TestRequest::post()
            .uri("/api/admin/auth/login")
            .set_json(serde_json::json!({
                "username": crate::test_utils::ADMIN_USERNAME,
                "password": crate::test_utils::ADMIN_PASSWORD,
            }))
            .to_request();
        let resp = actix_web::test::call_service(&$app, req).await;
        assert_eq!(resp.status(), actix_web::http::StatusCode::OK);
        resp.response()
            .cookies()
            .find(|c| c.name() == $ctx.config.session_cookie_name)
            .map(|c| c.into_owned())
            .expect("login sets the session cookie")
    }};
}

// ---- in-memory database -------------------------------------------------

#[derive(Default)]
struct Tables {
    categories: Vec<Category>,
    photos: Vec<Photo>,
}

/// Both repositories over one shared store so that category guards see
/// photo references.
#[derive(Default)]
pub struct MemoryDb {
    tables: Mutex<Tables>,
    pub fail_inserts: AtomicBool,
}

fn sort_photos(photos: &mut [Photo]) {
    photos.sort_by(|a, b| {
        a.display_order
            .cmp(&b.display_order)
            .then(b.is_black_white.cmp(&a.is_black_white))
            .then(a.created_at.cmp(&b.created_at))
    });
}

impl MemoryDb {
    pub fn photos(&self) -> Vec<Photo> {
        let mut photos = self.tables.lock().photos.clone();
        sort_photos(&mut photos);
        photos
    }

    pub fn categories(&self) -> Vec<Category> {
        self.tables.lock().categories.clone()
    }

    pub fn seed_category(&self, name: &str, slug: &str) -> Category {
        let category = Category {
            id: Uuid::new_v4(),
            name: name.into(),
            slug: slug.into(),
            description: None,
            display_order: 0,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().categories.push(category.clone());
        category
    }

    pub fn seed_photo(&self, title: &str, display_order: i32, category_id: Option<Uuid>, is_black_white: bool) -> Photo {
        let photo = Photo {
            id: Uuid::new_v4(),
            title: title.into(),
            description: None,
            category_id,
            filename: format!("{}.jpg", title),
            file_size: 1024,
            width: 800,
            height: 600,
            storage_path: format!("2024/{}.jpg", title),
            public_url: format!("http://localhost/media/photos/2024/{}.jpg", title),
            thumbnail_path: format!("2024/{}-thumb.jpg", title),
            thumbnail_url: format!("http://localhost/media/thumbnails/2024/{}-thumb.jpg", title),
            is_featured: false,
            is_black_white,
            display_order,
            metadata: Json(photo_portfolio::entities::photo::PhotoMetadata::new(
                &format!("{}.jpg", title),
                "image/jpeg",
                Default::default(),
                is_black_white,
            )),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().photos.push(photo.clone());
        photo
    }

    fn apply_order(tables: &mut Tables, ordered: &[Uuid]) {
        let (ids, positions) = assign_positions(ordered);
        for (id, position) in ids.iter().zip(positions) {
            if let Some(photo) = tables.photos.iter_mut().find(|p| p.id == *id) {
                photo.display_order = position;
            }
        }
    }

    fn current_order(tables: &Tables) -> Vec<Uuid> {
        let mut photos = tables.photos.clone();
        sort_photos(&mut photos);
        photos.into_iter().map(|p| p.id).collect()
    }
}

#[async_trait]
impl CategoryRepository for MemoryDb {
    async fn list_categories(&self) -> Result<Vec<Category>, AppError> {
        let mut categories = self.categories();
        categories.sort_by(|a, b| a.display_order.cmp(&b.display_order).then(a.name.cmp(&b.name)));
        Ok(categories)
    }

    async fn get_category(&self, id: &Uuid) -> Result<Category, AppError> {
        self.categories()
            .into_iter()
            .find(|c| c.id == *id)
            .ok_or_else(|| AppError::NotFound("Category not found".into()))
    }

    async fn find_category_by_slug(&self, slug: &str) -> Result<Option<Category>, AppError> {
        Ok(self.categories().into_iter().find(|c| c.slug == slug))
    }

    async fn category_exists(&self, id: &Uuid) -> Result<bool, AppError> {
        Ok(self.categories().iter().any(|c| c.id == *id))
    }

    async fn create_category(&self, category: &NewCategory) -> Result<Category, AppError> {
        let mut tables = self.tables.lock();
        if tables.categories.iter().any(|c| c.slug == category.slug) {
            return Err(AppError::Conflict("A category with this slug already exists".into()));
        }
        let created = Category {
            id: Uuid::new_v4(),
            name: category.name.clone(),
            slug: category.slug.clone(),
            description: category.description.clone(),
            display_order: category.display_order,
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        tables.categories.push(created.clone());
        Ok(created)
    }

    async fn update_category(&self, id: &Uuid, changes: &CategoryChanges) -> Result<Category, AppError> {
        let mut tables = self.tables.lock();
        if let Some(slug) = &changes.slug {
            if tables.categories.iter().any(|c| c.slug == *slug && c.id != *id) {
                return Err(AppError::Conflict("A category with this slug already exists".into()));
            }
        }
        let category = tables
            .categories
            .iter_mut()
            .find(|c| c.id == *id)
            .ok_or_else(|| AppError::NotFound("Category not found".into()))?;

        if let Some(name) = &changes.name {
            category.name = name.clone();
        }
        if let Some(slug) = &changes.slug {
            category.slug = slug.clone();
        }
        if let Some(description) = &changes.description {
            category.description = description.clone();
        }
        if let Some(order) = changes.display_order {
            category.display_order = order;
        }
        category.updated_at = Utc::now();
        Ok(category.clone())
    }

    async fn delete_category(&self, id: &Uuid) -> Result<(), AppError> {
        let mut tables = self.tables.lock();
        if !tables.categories.iter().any(|c| c.id == *id) {
            return Err(AppError::NotFound("Category not found".into()));
        }
        let in_use = tables.photos.iter().filter(|p| p.category_id == Some(*id)).count();
        if in_use > 0 {
            return Err(AppError::ReferenceInUse(format!(
                "Cannot delete category: {} photo(s) are still assigned to it",
                in_use
            )));
        }
        tables.categories.retain(|c| c.id != *id);
        Ok(())
    }

    async fn check_connection(&self) -> Result<(), AppError> {
        Ok(())
    }
}

#[async_trait]
impl PhotoRepository for MemoryDb {
    async fn list_photos(&self, filter: &PhotoFilter) -> Result<Vec<PhotoWithCategory>, AppError> {
        let categories = self.categories();
        let photos = self
            .photos()
            .into_iter()
            .filter(|p| filter.category_id.is_none() || p.category_id == filter.category_id)
            .filter(|p| match filter.view {
                ColorView::All => true,
                ColorView::Color => !p.is_black_white,
                ColorView::Bw => p.is_black_white,
            })
            .filter(|p| !filter.featured_only || p.is_featured)
            .skip(filter.offset as usize)
            .take(filter.limit as usize)
            .map(|photo| {
                let category = photo
                    .category_id
                    .and_then(|id| categories.iter().find(|c| c.id == id).cloned());
                PhotoWithCategory { photo, category }
            })
            .collect();
        Ok(photos)
    }

    async fn get_photo(&self, id: &Uuid) -> Result<Photo, AppError> {
        self.photos()
            .into_iter()
            .find(|p| p.id == *id)
            .ok_or_else(|| AppError::NotFound("Photo not found".into()))
    }

    async fn insert_photo(&self, photo: &NewPhoto) -> Result<Photo, AppError> {
        if self.fail_inserts.load(Ordering::SeqCst) {
            return Err(AppError::InternalError("insert failed".into()));
        }
        let inserted = Photo {
            id: Uuid::new_v4(),
            title: photo.title.clone(),
            description: photo.description.clone(),
            category_id: photo.category_id,
            filename: photo.filename.clone(),
            file_size: photo.file_size,
            width: photo.width,
            height: photo.height,
            storage_path: photo.storage_path.clone(),
            public_url: photo.public_url.clone(),
            thumbnail_path: photo.thumbnail_path.clone(),
            thumbnail_url: photo.thumbnail_url.clone(),
            is_featured: photo.is_featured,
            is_black_white: photo.is_black_white,
            display_order: photo.display_order,
            metadata: Json(photo.metadata.clone()),
            created_at: Utc::now(),
            updated_at: Utc::now(),
        };
        self.tables.lock().photos.push(inserted.clone());
        Ok(inserted)
    }

    async fn update_photo(&self, id: &Uuid, changes: &PhotoChanges) -> Result<Photo, AppError> {
        let mut tables = self.tables.lock();
        let photo = tables
            .photos
            .iter_mut()
            .find(|p| p.id == *id)
            .ok_or_else(|| AppError::NotFound("Photo not found".into()))?;

        if let Some(title) = &changes.title {
            photo.title = title.clone();
        }
        if let Some(description) = &changes.description {
            photo.description = description.clone();
        }
        if let Some(category_id) = changes.category_id {
            photo.category_id = category_id;
        }
        if let Some(featured) = changes.is_featured {
            photo.is_featured = featured;
        }
        if let Some(bw) = changes.is_black_white {
            photo.is_black_white = bw;
            photo.metadata.0.color_mode = ColorMode::from_black_white(bw);
        }
        if let Some(order) = changes.display_order {
            photo.display_order = order;
        }
        photo.updated_at = Utc::now();
        Ok(photo.clone())
    }

    async fn delete_photo(&self, id: &Uuid) -> Result<Photo, AppError> {
        let mut tables = self.tables.lock();
        let index = tables
            .photos
            .iter()
            .position(|p| p.id == *id)
            .ok_or_else(|| AppError::NotFound("Photo not found".into()))?;
        Ok(tables.photos.remove(index))
    }

    async fn reorder_photos(&self, ordered_ids: &[Uuid]) -> Result<(), AppError> {
        let mut tables = self.tables.lock();
        let current = Self::current_order(&tables);
        validate_reorder(&current, ordered_ids)?;
        Self::apply_order(&mut tables, ordered_ids);
        Ok(())
    }

    async fn move_photo(&self, id: &Uuid, to_index: usize) -> Result<Vec<Uuid>, AppError> {
        let mut tables = self.tables.lock();
        let current = Self::current_order(&tables);
        let planned = plan_move(&current, *id, to_index)?;
        Self::apply_order(&mut tables, &planned);
        Ok(planned)
    }
}

// ---- storage, mail, invalidation ----------------------------------------

#[derive(Default)]
pub struct MemoryStorage {
    objects: Mutex<HashMap<(String, String), Vec<u8>>>,
    pub fail_deletes: AtomicBool,
}

impl MemoryStorage {
    pub fn object_count(&self) -> usize {
        self.objects.lock().len()
    }

    pub fn contains(&self, bucket: &str, path: &str) -> bool {
        self.objects.lock().contains_key(&(bucket.to_string(), path.to_string()))
    }
}

#[async_trait]
impl ObjectStorage for MemoryStorage {
    async fn upload(&self, bucket: &str, path: &str, bytes: Vec<u8>, _content_type: &str) -> Result<StoredObject, StorageError> {
        self.objects.lock().insert((bucket.to_string(), path.to_string()), bytes);
        Ok(StoredObject {
            bucket: bucket.to_string(),
            path: path.to_string(),
            public_url: self.public_url(bucket, path),
        })
    }

    async fn delete(&self, bucket: &str, path: &str) -> Result<(), StorageError> {
        if self.fail_deletes.load(Ordering::SeqCst) {
            return Err(StorageError::Delete("storage offline".into()));
        }
        self.objects.lock().remove(&(bucket.to_string(), path.to_string()));
        Ok(())
    }

    fn public_url(&self, bucket: &str, path: &str) -> String {
        format!("http://storage.test/{}/{}", bucket, path)
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}

#[derive(Default)]
pub struct RecordingMailer {
    pub sent: Mutex<Vec<OutgoingEmail>>,
    pub unconfigured: AtomicBool,
}

#[async_trait]
impl Mailer for RecordingMailer {
    async fn send(&self, email: &OutgoingEmail) -> Result<(), MailError> {
        if self.unconfigured.load(Ordering::SeqCst) {
            return Err(MailError::NotConfigured);
        }
        self.sent.lock().push(email.clone());
        Ok(())
    }
}

#[derive(Default)]
pub struct RecordingInvalidator {
    pub calls: Mutex<Vec<Vec<String>>>,
}

impl RecordingInvalidator {
    pub fn call_count(&self) -> usize {
        self.calls.lock().len()
    }
}

#[async_trait]
impl CacheInvalidator for RecordingInvalidator {
    async fn invalidate(&self, paths: &[String]) -> Result<(), InvalidationError> {
        self.calls.lock().push(paths.to_vec());
        Ok(())
    }
}

// ---- harness ------------------------------------------------------------

pub struct TestContext {
    pub state: web::Data<AppState>,
    pub db: Arc<MemoryDb>,
    pub storage: Arc<MemoryStorage>,
    pub mailer: Arc<RecordingMailer>,
    pub invalidator: Arc<RecordingInvalidator>,
    pub config: AppConfig,
}

pub fn test_config() -> AppConfig {
    AppConfig {
        env: AppEnvironment::Testing,
        name: "Photo Portfolio Test".into(),
        session_secret: "integration-test-session-secret-0123456789".into(),
        admin_username: ADMIN_USERNAME.into(),
        admin_password_hash: Some(hash_password(ADMIN_PASSWORD).expect("hash admin password")),
        revalidate_secret: Some("revalidate-secret".into()),
        max_upload_bytes: 1024 * 1024,
        ..AppConfig::default()
    }
}

impl TestContext {
    pub fn new() -> Self {
        Self::with_config(test_config())
    }

    pub fn with_config(config: AppConfig) -> Self {
        let db = Arc::new(MemoryDb::default());
        let storage = Arc::new(MemoryStorage::default());
        let mailer = Arc::new(RecordingMailer::default());
        let invalidator = Arc::new(RecordingInvalidator::default());

        let services = AppServices {
            category_repo: db.clone(),
            photo_repo: db.clone(),
            storage: storage.clone(),
            local_storage: None,
            mailer: mailer.clone(),
            invalidator: invalidator.clone(),
            limiter: Arc::new(FixedWindowLimiter::new(
                config.contact_rate_limit,
                Duration::from_secs(config.contact_rate_window_secs),
            )),
            redis_pool: None,
        };

        let state = web::Data::new(AppState::with_services(&config, services));

        TestContext { state, db, storage, mailer, invalidator, config }
    }
}

// ---- request bodies ------------------------------------------------------

pub fn png_bytes(width: u32, height: u32, color: [u8; 3]) -> Vec<u8> {
    let img = RgbImage::from_pixel(width, height, Rgb(color));
    let mut out = Cursor::new(Vec::new());
    img.write_to(&mut out, ImageFormat::Png).expect("encode png");
    out.into_inner()
}

pub enum Part<'a> {
    Text(&'a str, &'a str),
    File { name: &'a str, filename: &'a str, content_type: &'a str, bytes: &'a [u8] },
}

pub fn multipart_body(parts: &[Part<'_>]) -> Vec<u8> {
    let mut body = Vec::new();
    for part in parts {
        body.extend_from_slice(format!("--{}\r\n", BOUNDARY).as_bytes());
        match part {
            Part::Text(name, value) => {
                body.extend_from_slice(
                    format!("Content-Disposition: form-data; name=\"{}\"\r\n\r\n{}\r\n", name, value).as_bytes(),
                );
            }
            Part::File { name, filename, content_type, bytes } => {
                body.extend_from_slice(
                    format!(
                        "Content-Disposition: form-data; name=\"{}\"; filename=\"{}\"\r\nContent-Type: {}\r\n\r\n",
                        name, filename, content_type
                    )
                    .as_bytes(),
                );
                body.extend_from_slice(bytes);
                body.extend_from_slice(b"\r\n");
            }
        }
    }
    body.extend_from_slice(format!("--{}--\r\n", BOUNDARY).as_bytes());
    body
}

pub fn multipart_content_type() -> String {
    format!("multipart/form-data; boundary={}", BOUNDARY)
}
