pub mod auth;
pub mod categories;
pub mod contact;
pub mod home;
pub mod json_error;
pub mod media;
pub mod photos;
pub mod revalidate;
pub mod system;
