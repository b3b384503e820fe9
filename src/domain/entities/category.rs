use chrono::{DateTime, Utc};
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::entities::option_fields::{OptionField, PatchString};

static NON_SLUG_CHARS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^a-z0-9\s-]").unwrap());
static WHITESPACE_RUNS: Lazy<Regex> = Lazy::new(|| Regex::new(r"\s+").unwrap());

/// URL-safe identifier derived from a category name.
///
/// `"Black & White!!"` becomes `"black-white"`. Returns an empty string when
/// nothing slug-worthy is left; callers reject that.
pub fn slugify(name: &str) -> String {
    let lowered = name.to_lowercase();
    let stripped = NON_SLUG_CHARS.replace_all(&lowered, "");
    let hyphenated = WHITESPACE_RUNS.replace_all(stripped.trim(), "-");
    hyphenated.trim_matches('-').to_string()
}

#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow, PartialEq)]
pub struct Category {
    pub id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i32,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

#[derive(Debug, Deserialize, Validate)]
pub struct CreateCategoryRequest {
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: String,

    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: Option<String>,

    pub display_order: Option<i32>,
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct UpdateCategoryRequest {
    #[serde(default)]
    #[validate(length(min = 1, max = 100, message = "Name must be between 1 and 100 characters"))]
    pub name: OptionField<String>,

    #[serde(default)]
    #[validate(length(max = 1000, message = "Description must be at most 1000 characters"))]
    pub description: PatchString,

    #[serde(default)]
    pub display_order: OptionField<i32>,
}

/// Row values for a new category, slug already derived.
#[derive(Debug, Clone)]
pub struct NewCategory {
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub display_order: i32,
}

/// Resolved column changes for an update. `None` leaves a column untouched;
/// `description: Some(None)` clears it.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct CategoryChanges {
    pub name: Option<String>,
    pub slug: Option<String>,
    pub description: Option<Option<String>>,
    pub display_order: Option<i32>,
}

impl CategoryChanges {
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.slug.is_none()
            && self.description.is_none()
            && self.display_order.is_none()
    }
}

#[derive(Debug, Serialize)]
pub struct CategoryResponse {
    pub category: Category,
}

#[derive(Debug, Serialize)]
pub struct CategoryListResponse {
    pub categories: Vec<Category>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn slugify_lowercases_single_words() {
        assert_eq!(slugify("Landscape"), "landscape");
    }

    #[test]
    fn slugify_strips_symbols_and_collapses_whitespace() {
        assert_eq!(slugify("Black & White!!"), "black-white");
        assert_eq!(slugify("  Street   Life  "), "street-life");
    }

    #[test]
    fn slugify_keeps_existing_hyphens_and_trims_edges() {
        assert_eq!(slugify("-Fine-Art Nudes-"), "fine-art-nudes");
    }

    #[test]
    fn slugify_drops_non_ascii_letters() {
        assert_eq!(slugify("Café Noir"), "caf-noir");
    }

    #[test]
    fn slugify_of_symbols_only_is_empty() {
        assert_eq!(slugify("!!! ???"), "");
    }

    #[test]
    fn overlong_name_in_update_fails_validation() {
        let req = UpdateCategoryRequest {
            name: OptionField::SetToValue("x".repeat(101)),
            ..UpdateCategoryRequest::default()
        };

        let errors = req.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("name"));
    }

    #[test]
    fn cleared_description_passes_validation() {
        let req = UpdateCategoryRequest {
            description: OptionField::SetToNull,
            ..UpdateCategoryRequest::default()
        };

        assert!(req.validate().is_ok());
    }

    #[test]
    fn update_request_distinguishes_cleared_description() {
        let req: UpdateCategoryRequest =
            serde_json::from_str(r#"{"description": null}"#).unwrap();
        assert!(req.name.is_unchanged());
        assert_eq!(req.description, OptionField::SetToNull);
    }
}
