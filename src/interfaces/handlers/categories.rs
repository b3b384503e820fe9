use actix_web::{web, HttpResponse, Responder};
use tracing::instrument;

use crate::{
    entities::category::{CategoryResponse, CreateCategoryRequest, UpdateCategoryRequest},
    errors::AppError,
    use_cases::extractors::AdminSession,
    AppState,
};

#[instrument(skip(state))]
pub async fn list_categories(state: web::Data<AppState>) -> Result<impl Responder, AppError> {
    let response = state.category_handler.list_categories().await?;
    Ok(HttpResponse::Ok().json(response))
}

#[instrument(skip(_session, state, data))]
pub async fn create_category(
    _session: AdminSession,
    state: web::Data<AppState>,
    data: web::Json<CreateCategoryRequest>,
) -> Result<impl Responder, AppError> {
    let category = state.category_handler.create_category(data.into_inner()).await?;
    Ok(HttpResponse::Created().json(CategoryResponse { category }))
}

#[instrument(skip(_session, state, data))]
pub async fn update_category(
    _session: AdminSession,
    category_id: web::Path<String>,
    state: web::Data<AppState>,
    data: web::Json<UpdateCategoryRequest>,
) -> Result<impl Responder, AppError> {
    let category = state
        .category_handler
        .update_category(&category_id, data.into_inner())
        .await?;
    Ok(HttpResponse::Ok().json(CategoryResponse { category }))
}

#[instrument(skip(_session, state))]
pub async fn delete_category(
    _session: AdminSession,
    category_id: web::Path<String>,
    state: web::Data<AppState>,
) -> Result<impl Responder, AppError> {
    state.category_handler.delete_category(&category_id).await?;
    Ok(HttpResponse::Ok().json(serde_json::json!({ "success": true })))
}
