use actix_web::web;

use crate::handlers::json_error::json_error_handler;

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.app_data(web::JsonConfig::default().error_handler(json_error_handler));
}
