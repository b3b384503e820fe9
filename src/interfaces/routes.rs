use actix_multipart::{form::MultipartFormConfig, MultipartError};
use actix_web::{
    error::PayloadError,
    http::header::CONTENT_LENGTH,
    web, HttpRequest,
};

use crate::{errors::AppError, handlers::home::home, use_cases::upload::UploadError};

mod admin;
mod json_error;
mod media;
mod public;

pub fn configure_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(home);

    cfg.service(
        web::scope("/api")
            .configure(public::config_routes)
            .configure(admin::config_routes)
    );

    cfg.configure(media::config_routes);
    cfg.configure(json_error::config_routes);
}

/// Multipart limits for uploads. `total_limit` sits above the upload ceiling
/// so oversized files still reach validation and get a descriptive error.
/// Bodies past `total_limit` get the same size message, sized from
/// `Content-Length`.
pub fn multipart_config(max_upload_bytes: u64, total_limit: usize) -> MultipartFormConfig {
    MultipartFormConfig::default()
        .total_limit(total_limit)
        .error_handler(move |err, req| {
            tracing::warn!(error = %err, "Rejected multipart payload");
            multipart_error(err, req, max_upload_bytes, total_limit).into()
        })
}

fn multipart_error(
    err: MultipartError,
    req: &HttpRequest,
    max_upload_bytes: u64,
    total_limit: usize,
) -> AppError {
    match err {
        MultipartError::Payload(PayloadError::Overflow) => {
            let size = req
                .headers()
                .get(CONTENT_LENGTH)
                .and_then(|v| v.to_str().ok())
                .and_then(|v| v.parse::<u64>().ok())
                .unwrap_or(total_limit as u64);
            AppError::from(UploadError::TooLarge { size, max: max_upload_bytes })
        }
        other => AppError::from(other),
    }
}
