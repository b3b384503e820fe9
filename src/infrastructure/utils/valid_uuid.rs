use uuid::Uuid;

use crate::errors::AppError;

/// Parses a path or form id, rejecting malformed values with a 400.
pub fn valid_uuid(id: &str, what: &str) -> Result<Uuid, AppError> {
    Uuid::parse_str(id.trim()).map_err(|_| AppError::InvalidInput(format!("Invalid {what} id")))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_trimmed_ids() {
        let id = Uuid::new_v4();
        assert_eq!(valid_uuid(&format!(" {id} "), "photo").unwrap(), id);
    }

    #[test]
    fn malformed_ids_name_the_resource() {
        let err = valid_uuid("42", "category").unwrap_err();
        assert_eq!(err.to_string(), "Invalid category id");
    }
}
