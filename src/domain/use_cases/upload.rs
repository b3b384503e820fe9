use std::sync::Arc;

use derive_more::Display;
use uuid::Uuid;

use crate::{
    entities::photo::{ExifData, NewPhoto, Photo, PhotoMetadata, SENTINEL_DISPLAY_ORDER},
    errors::AppError,
    imaging::{dimensions_or_fallback, extract_exif, is_color_image, make_thumbnail, Dimensions, Thumbnail},
    repositories::{category::CategoryRepository, photo::PhotoRepository},
    revalidate::{invalidate_best_effort, CacheInvalidator},
    settings::AppConfig,
    storage::{file_extension, generate_storage_key, ObjectStorage, StorageError, StoredObject},
};

pub const ALLOWED_MIME_TYPES: [&str; 4] = ["image/jpeg", "image/jpg", "image/png", "image/webp"];

/// Matches the `photos.title` column width.
pub const MAX_TITLE_CHARS: usize = 200;

fn megabytes(bytes: u64) -> f64 {
    bytes as f64 / (1024.0 * 1024.0)
}

#[derive(Debug, Display)]
pub enum UploadError {
    #[display("File and title are required fields.")]
    MissingFields,

    #[display("Invalid file type. Allowed types: {}.", ALLOWED_MIME_TYPES.join(", "))]
    InvalidType { content_type: String },

    #[display("File size ({:.1} MB) exceeds the {:.1} MB limit.", megabytes(*size), megabytes(*max))]
    TooLarge { size: u64, max: u64 },

    #[display("Title must be at most {max} characters.")]
    TitleTooLong { max: usize },

    #[display("Invalid category: {_0}")]
    InvalidCategory(String),

    #[display("{_0}")]
    Storage(StorageError),

    #[display("{_0}")]
    Database(AppError),

    #[display("Image processing failed: {_0}")]
    Processing(String),
}

/// The file part of an upload form.
#[derive(Debug, Clone, Default)]
pub struct UploadedFile {
    pub bytes: Vec<u8>,
    pub filename: String,
    pub content_type: Option<String>,
}

/// Raw upload form fields, before validation.
#[derive(Debug, Clone, Default)]
pub struct UploadRequest {
    pub file: Option<UploadedFile>,
    pub title: Option<String>,
    pub description: Option<String>,
    pub category_id: Option<String>,
    pub is_featured: bool,
    pub is_black_white: Option<bool>,
}

/// An upload that passed every check that needs no I/O.
#[derive(Debug)]
struct CheckedUpload {
    file: UploadedFile,
    content_type: String,
    title: String,
    description: Option<String>,
    category_id: Option<Uuid>,
    is_featured: bool,
    is_black_white: Option<bool>,
}

fn non_blank(value: Option<String>) -> Option<String> {
    value.map(|v| v.trim().to_string()).filter(|v| !v.is_empty())
}

/// Presence, type, size and title length, in that order.
fn check_request(request: UploadRequest, max_bytes: u64) -> Result<CheckedUpload, UploadError> {
    let title = non_blank(request.title);
    let (file, title) = match (request.file, title) {
        (Some(file), Some(title)) if !file.bytes.is_empty() => (file, title),
        _ => return Err(UploadError::MissingFields),
    };

    let content_type = file
        .content_type
        .as_deref()
        .map(|ct| ct.trim().to_ascii_lowercase())
        .unwrap_or_default();
    if !ALLOWED_MIME_TYPES.contains(&content_type.as_str()) {
        return Err(UploadError::InvalidType { content_type });
    }

    let size = file.bytes.len() as u64;
    if size > max_bytes {
        return Err(UploadError::TooLarge { size, max: max_bytes });
    }

    if title.chars().count() > MAX_TITLE_CHARS {
        return Err(UploadError::TitleTooLong { max: MAX_TITLE_CHARS });
    }

    let category_id = match non_blank(request.category_id) {
        Some(raw) => Some(
            Uuid::parse_str(&raw).map_err(|_| UploadError::InvalidCategory(raw.clone()))?,
        ),
        None => None,
    };

    Ok(CheckedUpload {
        file,
        content_type,
        title,
        description: non_blank(request.description),
        category_id,
        is_featured: request.is_featured,
        is_black_white: request.is_black_white,
    })
}

/// Everything derived from the image bytes on the blocking pool.
struct ImageAnalysis {
    bytes: Vec<u8>,
    dimensions: Dimensions,
    exif: ExifData,
    is_black_white: bool,
    thumbnail: Thumbnail,
}

fn analyze(bytes: Vec<u8>, content_type: &str, manual_black_white: Option<bool>, max_dimension: u32, quality: u8) -> ImageAnalysis {
    let dimensions = dimensions_or_fallback(&bytes);
    let exif = extract_exif(&bytes);
    let is_black_white = manual_black_white.unwrap_or_else(|| !is_color_image(&bytes));
    let thumbnail = make_thumbnail(&bytes, content_type, max_dimension, quality);

    ImageAnalysis { bytes, dimensions, exif, is_black_white, thumbnail }
}

/// Storage writes made so far by one upload, undone if a later step fails.
struct Compensation<'a> {
    storage: &'a dyn ObjectStorage,
    written: Vec<StoredObject>,
}

impl<'a> Compensation<'a> {
    fn new(storage: &'a dyn ObjectStorage) -> Self {
        Compensation { storage, written: Vec::new() }
    }

    fn record(&mut self, object: &StoredObject) {
        self.written.push(object.clone());
    }

    async fn rollback(self) {
        for object in self.written.iter().rev() {
            match self.storage.delete(&object.bucket, &object.path).await {
                Ok(()) => tracing::info!(bucket = %object.bucket, path = %object.path, "Rolled back stored object"),
                Err(e) => tracing::error!(
                    bucket = %object.bucket,
                    path = %object.path,
                    error = %e,
                    "Failed to roll back stored object, it is now orphaned"
                ),
            }
        }
    }
}

#[derive(Debug, Clone)]
pub struct UploadSettings {
    pub photos_bucket: String,
    pub thumbnails_bucket: String,
    pub max_upload_bytes: u64,
    pub thumbnail_max_dimension: u32,
    pub thumbnail_jpeg_quality: u8,
}

impl From<&AppConfig> for UploadSettings {
    fn from(config: &AppConfig) -> Self {
        UploadSettings {
            photos_bucket: config.photos_bucket.clone(),
            thumbnails_bucket: config.thumbnails_bucket.clone(),
            max_upload_bytes: config.max_upload_bytes,
            thumbnail_max_dimension: config.thumbnail_max_dimension,
            thumbnail_jpeg_quality: config.thumbnail_jpeg_quality,
        }
    }
}

pub struct UploadHandler {
    pub photo_repo: Arc<dyn PhotoRepository>,
    pub category_repo: Arc<dyn CategoryRepository>,
    pub storage: Arc<dyn ObjectStorage>,
    pub invalidator: Arc<dyn CacheInvalidator>,
    pub settings: UploadSettings,
}

impl UploadHandler {
    pub fn new(
        photo_repo: Arc<dyn PhotoRepository>,
        category_repo: Arc<dyn CategoryRepository>,
        storage: Arc<dyn ObjectStorage>,
        invalidator: Arc<dyn CacheInvalidator>,
        settings: UploadSettings,
    ) -> Self {
        UploadHandler { photo_repo, category_repo, storage, invalidator, settings }
    }

    /// Validates, stores original and thumbnail, then records the photo at
    /// the tail of the display order. Stored objects are removed again if a
    /// later step fails.
    pub async fn upload_photo(&self, request: UploadRequest) -> Result<Photo, UploadError> {
        let mut checked = check_request(request, self.settings.max_upload_bytes)?;

        if let Some(category_id) = checked.category_id {
            let exists = self
                .category_repo
                .category_exists(&category_id)
                .await
                .map_err(UploadError::Database)?;
            if !exists {
                return Err(UploadError::InvalidCategory(category_id.to_string()));
            }
        }

        let content_type = checked.content_type.clone();
        let manual = checked.is_black_white;
        let max_dimension = self.settings.thumbnail_max_dimension;
        let quality = self.settings.thumbnail_jpeg_quality;
        let bytes = std::mem::take(&mut checked.file.bytes);

        let analysis = tokio::task::spawn_blocking(move || analyze(bytes, &content_type, manual, max_dimension, quality))
            .await
            .map_err(|e| UploadError::Processing(e.to_string()))?;

        let mut compensation = Compensation::new(self.storage.as_ref());
        let result = self.store_and_record(&checked, analysis, &mut compensation).await;

        let photo = match result {
            Ok(photo) => photo,
            Err(e) => {
                tracing::error!(error = %e, filename = %checked.file.filename, "Upload failed, rolling back");
                compensation.rollback().await;
                return Err(e);
            }
        };

        tracing::info!(
            photo_id = %photo.id,
            filename = %photo.filename,
            is_black_white = photo.is_black_white,
            "Photo uploaded"
        );

        invalidate_best_effort(self.invalidator.as_ref()).await;
        Ok(photo)
    }

    async fn store_and_record(
        &self,
        checked: &CheckedUpload,
        analysis: ImageAnalysis,
        compensation: &mut Compensation<'_>,
    ) -> Result<Photo, UploadError> {
        let extension = file_extension(&checked.file.filename);
        let file_size = analysis.bytes.len() as i64;

        let original = self
            .storage
            .upload(
                &self.settings.photos_bucket,
                &generate_storage_key(&extension),
                analysis.bytes,
                &checked.content_type,
            )
            .await
            .map_err(UploadError::Storage)?;
        compensation.record(&original);

        let thumbnail_extension = if analysis.thumbnail.derived { "jpg" } else { extension.as_str() };
        if !analysis.thumbnail.derived {
            tracing::warn!(filename = %checked.file.filename, "Could not derive a thumbnail, storing the original instead");
        }

        let thumbnail = self
            .storage
            .upload(
                &self.settings.thumbnails_bucket,
                &generate_storage_key(thumbnail_extension),
                analysis.thumbnail.bytes,
                analysis.thumbnail.content_type,
            )
            .await
            .map_err(UploadError::Storage)?;
        compensation.record(&thumbnail);

        let new_photo = NewPhoto {
            title: checked.title.clone(),
            description: checked.description.clone(),
            category_id: checked.category_id,
            filename: checked.file.filename.clone(),
            file_size,
            width: analysis.dimensions.width as i32,
            height: analysis.dimensions.height as i32,
            storage_path: original.path,
            public_url: original.public_url,
            thumbnail_path: thumbnail.path,
            thumbnail_url: thumbnail.public_url,
            is_featured: checked.is_featured,
            is_black_white: analysis.is_black_white,
            display_order: SENTINEL_DISPLAY_ORDER,
            metadata: PhotoMetadata::new(
                &checked.file.filename,
                &checked.content_type,
                analysis.exif,
                analysis.is_black_white,
            ),
        };

        self.photo_repo
            .insert_photo(&new_photo)
            .await
            .map_err(UploadError::Database)
    }

    /// Advisory color check for the admin form. Undecodable images count as color.
    pub async fn classify(&self, bytes: Vec<u8>) -> Result<bool, UploadError> {
        tokio::task::spawn_blocking(move || is_color_image(&bytes))
            .await
            .map_err(|e| UploadError::Processing(e.to_string()))
    }
}
