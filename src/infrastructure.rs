pub mod auth;
pub mod db;
pub mod imaging;
pub mod limiter;
pub mod mail;
pub mod revalidate;
pub mod storage;
pub mod utils;
