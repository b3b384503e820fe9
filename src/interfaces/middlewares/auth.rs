use actix_web::{
    body::BoxBody,
    dev::{Service, ServiceRequest, ServiceResponse, Transform},
    web, Error, HttpMessage, HttpResponse,
};
use futures_util::future::{ok, LocalBoxFuture, Ready};
use std::{rc::Rc, task::{Context, Poll}};

use crate::AppState;

const ADMIN_PREFIX: &str = "/api/admin";

/// Requires a valid admin session cookie on every `/api/admin` route except
/// login and logout. Verified claims are stored in request extensions.
pub struct AdminSessionMiddleware;

impl<S> Transform<S, ServiceRequest> for AdminSessionMiddleware
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type InitError = ();
    type Transform = AdminSessionMiddlewareService<S>;
    type Future = Ready<Result<Self::Transform, Self::InitError>>;

    fn new_transform(&self, service: S) -> Self::Future {
        ok(AdminSessionMiddlewareService {
            service: Rc::new(service),
        })
    }
}

pub struct AdminSessionMiddlewareService<S> {
    service: Rc<S>,
}

impl<S> Service<ServiceRequest> for AdminSessionMiddlewareService<S>
where
    S: Service<ServiceRequest, Response = ServiceResponse<BoxBody>, Error = Error> + 'static,
{
    type Response = ServiceResponse<BoxBody>;
    type Error = Error;
    type Future = LocalBoxFuture<'static, Result<Self::Response, Self::Error>>;

    fn poll_ready(&self, ctx: &mut Context<'_>) -> Poll<Result<(), Self::Error>> {
        self.service.poll_ready(ctx)
    }

    fn call(&self, req: ServiceRequest) -> Self::Future {
        let service = Rc::clone(&self.service);

        Box::pin(async move {
            if !requires_session(req.path(), req.method().as_str()) {
                return service.call(req).await;
            }

            let Some(state) = req.app_data::<web::Data<AppState>>().cloned() else {
                tracing::error!("AppState missing in session middleware");
                return Ok(req.into_response(
                    HttpResponse::InternalServerError().json(serde_json::json!({"error": "Internal server error"})),
                ));
            };

            let token = req
                .cookie(&state.web.session_cookie_name)
                .map(|c| c.value().to_string());

            let claims = match token.as_deref().map(|t| state.auth_handler.verify(t)) {
                Some(Ok(claims)) => claims,
                Some(Err(e)) => {
                    tracing::warn!(path = %req.path(), error = %e, "Rejected admin session");
                    return Ok(unauthorized(req));
                }
                None => {
                    tracing::debug!(path = %req.path(), "No admin session cookie");
                    return Ok(unauthorized(req));
                }
            };

            req.extensions_mut().insert(claims);
            service.call(req).await
        })
    }
}

fn requires_session(path: &str, method: &str) -> bool {
    if method == "OPTIONS" {
        return false;
    }

    let admin_path = path == ADMIN_PREFIX || path.starts_with(&format!("{}/", ADMIN_PREFIX));
    admin_path
        && !matches!(
            (path, method),
            ("/api/admin/auth/login", "POST") | ("/api/admin/auth/logout", "POST")
        )
}

fn unauthorized(req: ServiceRequest) -> ServiceResponse<BoxBody> {
    req.into_response(HttpResponse::Unauthorized().json(serde_json::json!({"error": "Unauthorized"})))
}
