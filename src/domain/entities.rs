pub mod category;
pub mod contact;
pub mod option_fields;
pub mod photo;
pub mod session;
