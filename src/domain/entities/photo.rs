use actix_multipart::form::{tempfile::TempFile, text::Text, MultipartForm};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::types::Json;
use uuid::Uuid;
use validator::Validate;

use crate::entities::category::Category;
use crate::entities::option_fields::{OptionField, PatchString};

/// Order given to freshly uploaded photos so they land after every
/// explicitly ordered one.
pub const SENTINEL_DISPLAY_ORDER: i32 = 999;

pub const METADATA_VERSION: u32 = 1;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ColorMode {
    Color,
    BlackWhite,
}

impl ColorMode {
    pub fn from_black_white(is_black_white: bool) -> Self {
        if is_black_white {
            ColorMode::BlackWhite
        } else {
            ColorMode::Color
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            ColorMode::Color => "color",
            ColorMode::BlackWhite => "black_white",
        }
    }
}

/// Camera settings read from an image's EXIF block. Missing tags are omitted
/// from the serialized form.
#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct ExifData {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub camera: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub lens: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub focal_length: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub aperture: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub shutter_speed: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub iso: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date_time: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub latitude: Option<f64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub longitude: Option<f64>,
}

impl ExifData {
    pub fn is_empty(&self) -> bool {
        *self == ExifData::default()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct PhotoMetadata {
    #[serde(default = "metadata_version")]
    pub version: u32,
    pub original_name: String,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub exif: ExifData,
    pub color_mode: ColorMode,
}

fn metadata_version() -> u32 {
    METADATA_VERSION
}

impl PhotoMetadata {
    pub fn new(original_name: &str, mime_type: &str, exif: ExifData, is_black_white: bool) -> Self {
        PhotoMetadata {
            version: METADATA_VERSION,
            original_name: original_name.to_string(),
            mime_type: mime_type.to_string(),
            uploaded_at: Utc::now(),
            exif,
            color_mode: ColorMode::from_black_white(is_black_white),
        }
    }
}

#[derive(Debug, Clone, Serialize, sqlx::FromRow, PartialEq)]
pub struct Photo {
    pub id: Uuid,
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub filename: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub storage_path: String,
    pub public_url: String,
    pub thumbnail_path: String,
    pub thumbnail_url: String,
    pub is_featured: bool,
    pub is_black_white: bool,
    pub display_order: i32,
    pub metadata: Json<PhotoMetadata>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A photo as served by the public listing, with its category joined in.
#[derive(Debug, Clone, Serialize, PartialEq)]
pub struct PhotoWithCategory {
    #[serde(flatten)]
    pub photo: Photo,
    pub category: Option<Category>,
}

/// Everything the upload pipeline knows once both objects are stored.
#[derive(Debug, Clone)]
pub struct NewPhoto {
    pub title: String,
    pub description: Option<String>,
    pub category_id: Option<Uuid>,
    pub filename: String,
    pub file_size: i64,
    pub width: i32,
    pub height: i32,
    pub storage_path: String,
    pub public_url: String,
    pub thumbnail_path: String,
    pub thumbnail_url: String,
    pub is_featured: bool,
    pub is_black_white: bool,
    pub display_order: i32,
    pub metadata: PhotoMetadata,
}

#[derive(Debug, Clone, Copy, Default, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ColorView {
    #[default]
    All,
    Color,
    Bw,
}

#[derive(Debug, Deserialize)]
pub struct PhotoListQuery {
    pub category: Option<String>,
    #[serde(default)]
    pub view: ColorView,
    pub featured: Option<bool>,
    pub limit: Option<i64>,
    pub offset: Option<i64>,
}

pub const DEFAULT_PAGE_SIZE: i64 = 20;
pub const MAX_PAGE_SIZE: i64 = 100;

/// Resolved listing filter handed to the repository.
#[derive(Debug, Clone, PartialEq)]
pub struct PhotoFilter {
    pub category_id: Option<Uuid>,
    pub view: ColorView,
    pub featured_only: bool,
    pub limit: i64,
    pub offset: i64,
}

impl Default for PhotoFilter {
    fn default() -> Self {
        PhotoFilter {
            category_id: None,
            view: ColorView::All,
            featured_only: false,
            limit: DEFAULT_PAGE_SIZE,
            offset: 0,
        }
    }
}

impl PhotoListQuery {
    pub fn page(&self) -> (i64, i64) {
        let limit = self.limit.unwrap_or(DEFAULT_PAGE_SIZE).clamp(1, MAX_PAGE_SIZE);
        let offset = self.offset.unwrap_or(0).max(0);
        (limit, offset)
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdatePhotoRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Title must be between 1 and 200 characters"))]
    pub title: OptionField<String>,

    #[serde(default)]
    #[validate(length(max = 2000, message = "Description must be at most 2000 characters"))]
    pub description: PatchString,

    #[serde(default)]
    pub category_id: OptionField<Uuid>,

    #[serde(default)]
    pub is_featured: OptionField<bool>,

    #[serde(default)]
    pub is_black_white: OptionField<bool>,

    #[serde(default)]
    pub display_order: OptionField<i32>,
}

/// Resolved column changes for a photo update. A change to `is_black_white`
/// is mirrored into `metadata.colorMode` by the repository.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PhotoChanges {
    pub title: Option<String>,
    pub description: Option<Option<String>>,
    pub category_id: Option<Option<Uuid>>,
    pub is_featured: Option<bool>,
    pub is_black_white: Option<bool>,
    pub display_order: Option<i32>,
}

impl PhotoChanges {
    pub fn is_empty(&self) -> bool {
        *self == PhotoChanges::default()
    }
}

/// Admin upload form. Every field is optional here so that missing ones are
/// reported by the upload validation rather than the extractor.
#[derive(Debug, MultipartForm)]
pub struct PhotoUploadForm {
    pub file: Option<TempFile>,
    pub title: Option<Text<String>>,
    pub description: Option<Text<String>>,
    pub category_id: Option<Text<String>>,
    pub is_featured: Option<Text<String>>,
    pub is_black_white: Option<Text<String>>,
}

#[derive(Debug, MultipartForm)]
pub struct ClassifyForm {
    pub file: TempFile,
}

/// Form checkbox semantics: `true`, `1`, `on` and `yes` are set. Blank means
/// not supplied.
pub fn parse_form_flag(raw: &str) -> Option<bool> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "" => None,
        "true" | "1" | "on" | "yes" => Some(true),
        _ => Some(false),
    }
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderRequest {
    pub photo_ids: Vec<Uuid>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MoveRequest {
    pub to_index: usize,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Pagination {
    pub limit: i64,
    pub offset: i64,
    pub has_more: bool,
}

#[derive(Debug, Serialize)]
pub struct PhotoListResponse {
    pub photos: Vec<PhotoWithCategory>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize)]
pub struct PhotoResponse {
    pub photo: Photo,
}

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub success: bool,
    pub photo: Photo,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ClassifyResponse {
    pub is_color: bool,
    pub is_black_white: bool,
}
