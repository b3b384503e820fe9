use actix_web::{http::header, web, HttpResponse, Responder};

use crate::{errors::AppError, AppState};

/// Serves objects written by the local storage backend. Answers 404 when
/// objects live in a hosted bucket instead.
pub async fn serve_media(
    path: web::Path<(String, String)>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    let Some(storage) = &state.local_storage else {
        return Err(AppError::NotFound("Media is not served by this instance".into()));
    };

    let (bucket, object) = path.into_inner();
    let bytes = storage.read(&bucket, &object).await?;

    let content_type = infer::get(&bytes)
        .map(|kind| kind.mime_type())
        .unwrap_or("application/octet-stream");

    Ok(HttpResponse::Ok()
        .content_type(content_type)
        .insert_header((header::CACHE_CONTROL, "public, max-age=31536000, immutable"))
        .body(bytes))
}
