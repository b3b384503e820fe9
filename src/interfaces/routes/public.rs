use actix_web::web;

use crate::handlers::{categories, contact, photos, revalidate, system};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(system::health_check)
        .service(
            web::resource("/categories")
                .route(web::get().to(categories::list_categories))
        )
        .service(
            web::resource("/photos")
                .route(web::get().to(photos::list_photos))
        )
        .service(
            web::resource("/contact")
                .route(web::post().to(contact::submit_contact_form))
        )
        .service(
            web::resource("/revalidate")
                .route(web::post().to(revalidate::revalidate))
        );
}
