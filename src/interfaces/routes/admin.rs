use actix_web::web;

use crate::handlers::{auth, categories, photos};

pub fn config_routes(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/admin")
            .service(
                web::scope("/auth")
                    .route("/login", web::post().to(auth::login))
                    .route("/logout", web::post().to(auth::logout))
                    .route("/session", web::get().to(auth::session_status))
            )
            .service(
                web::resource("/categories")
                    .route(web::post().to(categories::create_category))
            )
            .service(
                web::resource("/categories/{category_id}")
                    .route(web::put().to(categories::update_category))
                    .route(web::delete().to(categories::delete_category))
            )
            .service(
                web::resource("/photos")
                    .route(web::post().to(photos::upload_photo))
            )
            .service(
                web::resource("/photos/reorder")
                    .route(web::post().to(photos::reorder_photos))
            )
            .service(
                web::resource("/photos/classify")
                    .route(web::post().to(photos::classify_photo))
            )
            .service(
                web::resource("/photos/{photo_id}")
                    .route(web::put().to(photos::update_photo))
                    .route(web::delete().to(photos::delete_photo))
            )
            .service(
                web::resource("/photos/{photo_id}/move")
                    .route(web::post().to(photos::move_photo))
            )
    );
}
