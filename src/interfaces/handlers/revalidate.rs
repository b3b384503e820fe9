use actix_web::{web, HttpRequest, HttpResponse, Responder};
use serde::Deserialize;
use subtle::ConstantTimeEq;
use tracing::instrument;

use crate::{
    errors::AppError,
    revalidate::{default_paths, REVALIDATE_TOKEN_HEADER},
    AppState,
};

#[derive(Debug, Default, Deserialize)]
pub struct RevalidateRequest {
    pub secret: Option<String>,
    pub paths: Option<Vec<String>>,
}

fn token_matches(token: Option<&str>, secret: &str) -> bool {
    token.is_some_and(|t| bool::from(t.as_bytes().ct_eq(secret.as_bytes())))
}

/// Lets the renderer (or an operator) refresh cached public pages. The shared
/// secret may come from the header or the body.
#[instrument(skip(req, state, body))]
pub async fn revalidate(
    req: HttpRequest,
    state: web::Data<AppState>,
    body: Option<web::Json<RevalidateRequest>>,
) -> Result<impl Responder, AppError> {
    let body = body.map(|b| b.into_inner()).unwrap_or_default();

    let Some(secret) = state.web.revalidate_secret.as_deref() else {
        tracing::warn!("REVALIDATE_SECRET is not configured, skipping revalidation");
        return Ok(HttpResponse::InternalServerError().json(serde_json::json!({ "skipped": true })));
    };

    let token = req
        .headers()
        .get(REVALIDATE_TOKEN_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::to_string)
        .or(body.secret);

    if !token_matches(token.as_deref(), secret) {
        tracing::warn!("Revalidation rejected, bad or missing token");
        return Err(AppError::UnauthorizedAccess);
    }

    let paths = body
        .paths
        .filter(|p| !p.is_empty())
        .unwrap_or_else(default_paths);

    state
        .invalidator
        .invalidate(&paths)
        .await
        .map_err(|e| AppError::Upstream(e.to_string()))?;

    Ok(HttpResponse::Ok().json(serde_json::json!({ "revalidated": true, "paths": paths })))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_must_match_exactly() {
        assert!(token_matches(Some("revalidate-secret"), "revalidate-secret"));
        assert!(!token_matches(Some("revalidate-secreT"), "revalidate-secret"));
        assert!(!token_matches(Some("revalidate"), "revalidate-secret"));
        assert!(!token_matches(Some(""), "revalidate-secret"));
        assert!(!token_matches(None, "revalidate-secret"));
    }
}
