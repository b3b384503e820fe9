pub mod category;
pub mod photo;
pub mod sqlx_repo;
