pub mod auth;
pub mod category;
pub mod contact;
pub mod extractors;
pub mod photo;
pub mod upload;
