use std::collections::HashSet;

use crate::error::FieldErrors;

/// Field name used for genre id lists in forms and error maps.
pub const GENRE_FIELD: &str = "genre_id";

/// Trim a required text field, recording an error when it is absent or blank.
pub fn validate_required(
    field: &str,
    value: Option<String>,
    errors: &mut FieldErrors,
) -> Option<String> {
    match value.map(|v| v.trim().to_string()) {
        Some(v) if !v.is_empty() => Some(v),
        _ => {
            errors.add(field, format!("The {field} field is required."));
            None
        }
    }
}

/// Validate a genre id list: positive ids, no duplicates, and non-empty when
/// `required` is set.
pub fn validate_genre_ids(ids: &[i32], required: bool, errors: &mut FieldErrors) {
    if required && ids.is_empty() {
        errors.add(GENRE_FIELD, format!("The {GENRE_FIELD} field is required."));
        return;
    }
    let mut seen = HashSet::new();
    for &id in ids {
        if id <= 0 {
            errors.add(GENRE_FIELD, format!("The selected {GENRE_FIELD} {id} is invalid."));
        } else if !seen.insert(id) {
            errors.add(
                GENRE_FIELD,
                format!("The {GENRE_FIELD} field has a duplicate value: {id}."),
            );
        }
    }
}
