use serde::{Deserialize, Deserializer, Serialize};
use validator::ValidateLength;

/// Tri-state field for partial updates.
///
/// - `Unchanged` → key absent from the payload
/// - `SetToNull` → key present with `null`
/// - `SetToValue` → key present with a value
///
/// Use with `#[serde(default)]` so an absent key stays `Unchanged`.
#[derive(Debug, Clone, PartialEq, Default, Serialize)]
pub enum OptionField<T> {
    #[default]
    Unchanged,
    SetToNull,
    SetToValue(T),
}

impl<'de, T> Deserialize<'de> for OptionField<T>
where
    T: Deserialize<'de>,
{
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: Deserializer<'de>,
    {
        Ok(match Option::<T>::deserialize(deserializer)? {
            Some(value) => OptionField::SetToValue(value),
            None => OptionField::SetToNull,
        })
    }
}

impl<T> ValidateLength<u64> for OptionField<T>
where
    T: ValidateLength<u64>
{
    fn length(&self) -> Option<u64> {
        match self {
            OptionField::SetToValue(value) => value.length(),
            _ => None,
        }
    }
}

impl<T> OptionField<T> {
    /// - `None` → unchanged
    /// - `Some(None)` → set null
    /// - `Some(Some(T))` → set to value
    pub fn into_option(self) -> Option<Option<T>> {
        match self {
            Self::Unchanged => None,
            Self::SetToNull => Some(None),
            Self::SetToValue(v) => Some(Some(v)),
        }
    }

    pub fn is_unchanged(&self) -> bool {
        matches!(self, Self::Unchanged)
    }
}

impl OptionField<String> {
    /// Blank strings clear the column, mirroring how the admin forms submit
    /// an emptied text box.
    pub fn blank_as_null(self) -> Self {
        match self {
            OptionField::SetToValue(s) if s.trim().is_empty() => OptionField::SetToNull,
            other => other,
        }
    }
}

pub type PatchString = OptionField<String>;

#[cfg(test)]
mod tests {
    use super::*;

    #[derive(Debug, Deserialize)]
    struct Patch {
        #[serde(default)]
        description: PatchString,
    }

    #[test]
    fn absent_null_and_value_are_distinguished() {
        let absent: Patch = serde_json::from_str("{}").unwrap();
        let null: Patch = serde_json::from_str(r#"{"description": null}"#).unwrap();
        let value: Patch = serde_json::from_str(r#"{"description": "golden hour"}"#).unwrap();

        assert_eq!(absent.description, OptionField::Unchanged);
        assert_eq!(null.description, OptionField::SetToNull);
        assert_eq!(value.description, OptionField::SetToValue("golden hour".to_string()));
    }

    #[test]
    fn blank_strings_become_null() {
        let field = OptionField::SetToValue("   ".to_string()).blank_as_null();
        assert_eq!(field, OptionField::SetToNull);
    }
}
