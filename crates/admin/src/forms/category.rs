//! Category form.

use boutique_core::{CategoryInput, FieldErrors};

/// Check a category name and build the payload. The name is trimmed.
///
/// # Errors
///
/// Returns a `name` field error when the name is blank.
pub fn category_input(name: &str) -> Result<CategoryInput, FieldErrors> {
    let mut errors = FieldErrors::new();
    errors.require("name", name, "Le nom est requis");
    errors.into_result(CategoryInput {
        name: name.trim().to_string(),
    })
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_name_trimmed() {
        assert_eq!(category_input("  Audio ").unwrap().name, "Audio");
    }

    #[test]
    fn test_blank_name_rejected() {
        let errors = category_input(" \t").unwrap_err();
        assert_eq!(errors.get("name"), Some("Le nom est requis"));
    }
}
