use actix_multipart::form::{tempfile::TempFile, MultipartForm};
use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::photo::{
        parse_form_flag, ClassifyForm, ClassifyResponse, MoveRequest, PhotoListQuery, PhotoResponse,
        PhotoUploadForm, ReorderRequest, UpdatePhotoRequest, UploadResponse,
    },
    errors::AppError,
    use_cases::{
        extractors::AdminSession,
        upload::{UploadRequest, UploadedFile},
    },
    AppState,
};

#[instrument(skip(state))]
pub async fn list_photos(
    state: web::Data<AppState>,
    query: web::Query<PhotoListQuery>,
) -> Result<impl Responder, AppError> {
    let response = state.photo_handler.list_photos(query.into_inner()).await?;
    Ok(HttpResponse::Ok().json(response))
}

async fn read_temp_file(file: &TempFile) -> Result<UploadedFile, AppError> {
    let bytes = tokio::fs::read(file.file.path()).await.map_err(|e| {
        AppError::InternalError(format!("Failed to read uploaded file: {}", e))
    })?;

    Ok(UploadedFile {
        bytes,
        filename: file.file_name.clone().unwrap_or_else(|| "upload".to_string()),
        content_type: file.content_type.as_ref().map(|m| m.essence_str().to_string()),
    })
}

#[instrument(skip(_session, state, form))]
pub async fn upload_photo(
    _session: AdminSession,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<PhotoUploadForm>,
) -> Result<impl Responder, AppError> {
    let file = match &form.file {
        Some(file) => Some(read_temp_file(file).await?),
        None => None,
    };

    let request = UploadRequest {
        file,
        title: form.title.map(|t| t.into_inner()),
        description: form.description.map(|t| t.into_inner()),
        category_id: form.category_id.map(|t| t.into_inner()),
        is_featured: form
            .is_featured
            .and_then(|t| parse_form_flag(&t))
            .unwrap_or(false),
        is_black_white: form.is_black_white.and_then(|t| parse_form_flag(&t)),
    };

    let photo = state.upload_handler.upload_photo(request).await?;
    Ok(HttpResponse::Created().json(UploadResponse { success: true, photo }))
}

#[instrument(skip(_session, state, form))]
pub async fn classify_photo(
    _session: AdminSession,
    state: web::Data<AppState>,
    MultipartForm(form): MultipartForm<ClassifyForm>,
) -> Result<impl Responder, AppError> {
    let file = read_temp_file(&form.file).await?;
    let is_color = state.upload_handler.classify(file.bytes).await?;

    Ok(HttpResponse::Ok().json(ClassifyResponse {
        is_color,
        is_black_white: !is_color,
    }))
}

#[instrument(skip(_session, state, data))]
pub async fn update_photo(
    _session: AdminSession,
    photo_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdatePhotoRequest>,
) -> Result<impl Responder, AppError> {
    let photo = state.photo_handler.update_photo(&photo_id, data.into_inner()).await?;
    Ok(HttpResponse::Ok().json(PhotoResponse { photo }))
}

#[instrument(skip(_session, state))]
pub async fn delete_photo(
    _session: AdminSession,
    photo_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.photo_handler.delete_photo(&photo_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[instrument(skip(_session, state, data))]
pub async fn reorder_photos(
    _session: AdminSession,
    state: web::Data<AppState>,
    data: web::Json<ReorderRequest>,
) -> Result<impl Responder, AppError> {
    state.photo_handler.reorder_photos(data.into_inner().photo_ids).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}

#[instrument(skip(_session, state, data))]
pub async fn move_photo(
    _session: AdminSession,
    photo_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<MoveRequest>,
) -> Result<impl Responder, AppError> {
    let photo_ids = state.photo_handler.move_photo(&photo_id, data.to_index).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true, "photoIds": photo_ids })))
}
