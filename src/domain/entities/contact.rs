use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use validator::Validate;

/// `local@domain.tld`, no whitespace anywhere.
pub static EMAIL_PATTERN: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"^[^\s@]+@[^\s@]+\.[^\s@]+$").unwrap());

#[derive(Debug, Default, Deserialize, Validate)]
pub struct ContactForm {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name is required and must be at most 100 characters"))]
    pub name: String,

    #[serde(default)]
    #[validate(regex(path = *EMAIL_PATTERN, message = "Invalid email address"))]
    pub email: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 200, message = "Subject is required and must be at most 200 characters"))]
    pub subject: String,

    #[serde(default)]
    #[validate(length(min = 1, max = 5000, message = "Message is required and must be at most 5000 characters"))]
    pub message: String,

    /// Honeypot. Hidden in the page, so only bots fill it in.
    #[serde(default)]
    pub website: Option<String>,
}

impl ContactForm {
    /// Any value in the hidden `website` field, whitespace included.
    pub fn is_spam(&self) -> bool {
        self.website.as_deref().is_some_and(|w| !w.is_empty())
    }
}

#[derive(Debug, Serialize)]
pub struct ContactResponse {
    pub success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}
