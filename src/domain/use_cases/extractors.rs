use actix_web::{FromRequest, HttpMessage, HttpRequest};
use futures_util::future::{ready, Ready};

use crate::{entities::session::SessionClaims, errors::AppError};

/// Claims of the logged-in admin, placed in request extensions by the
/// session middleware. Returns 401 when absent.
#[derive(Debug)]
pub struct AdminSession(pub SessionClaims);

impl FromRequest for AdminSession {
    type Error = actix_web::Error;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut actix_web::dev::Payload) -> Self::Future {
        match req.extensions().get::<SessionClaims>() {
            Some(claims) => ready(Ok(AdminSession(claims.clone()))),
            None => ready(Err(AppError::UnauthorizedAccess.into())),
        }
    }
}
