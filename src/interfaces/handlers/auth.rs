use actix_web::{
    cookie::{time::Duration as CookieDuration, Cookie, SameSite},
    web, HttpRequest, HttpResponse, Responder,
};
use tracing::instrument;

use crate::{
    entities::session::LoginRequest,
    errors::AuthError,
    use_cases::extractors::AdminSession,
    AppState, WebSettings,
};

fn session_cookie<'c>(settings: &WebSettings, value: String, max_age_secs: i64) -> Cookie<'c> {
    Cookie::build(settings.session_cookie_name.clone(), value)
        .path("/")
        .http_only(true)
        .same_site(SameSite::Lax)
        .secure(settings.secure_cookies)
        .max_age(CookieDuration::seconds(max_age_secs))
        .finish()
}

#[instrument(skip(state, data))]
pub async fn login(
    state: web::Data<AppState>,
    data: web::Json<LoginRequest>,
) -> Result<impl Responder, AuthError> {
    let session = state.auth_handler.login(data.into_inner()).await?;

    let max_age = state.auth_handler.sessions.ttl().num_seconds();
    let cookie = session_cookie(&state.web, session.token, max_age);

    Ok(HttpResponse::Ok().cookie(cookie).json(serde_json::json!({
        "success": true,
        "status": state.auth_handler.status(&session.claims),
    })))
}

/// Always clears the cookie. A still-valid session is also revoked.
#[instrument(skip(req, state))]
pub async fn logout(req: HttpRequest, state: web::Data<AppState>) -> impl Responder {
    let claims = req
        .cookie(&state.web.session_cookie_name)
        .and_then(|c| state.auth_handler.verify(c.value()).ok());
    state.auth_handler.logout(claims.as_ref());

    let mut removal = session_cookie(&state.web, String::new(), 0);
    removal.make_removal();

    HttpResponse::Ok().cookie(removal).json(serde_json::json!({ "success": true }))
}

#[instrument(skip(session, state))]
pub async fn session_status(session: AdminSession, state: web::Data<AppState>) -> impl Responder {
    HttpResponse::Ok().json(state.auth_handler.status(&session.0))
}
