use serde::{Deserialize, Serialize};

pub const TITLE_MAX_LEN: usize = 150;
pub const AUTHOR_MAX_LEN: usize = 100;
pub const DESCRIPTION_MAX_LEN: usize = 250;

/// A book managed by the library.
///
/// Missing string fields deserialize as empty strings so that `validate`
/// reports them instead of the JSON extractor.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct Book {
    /// Primary key; zero on creation requests unless the client picks one
    #[serde(default)]
    pub id: i64,
    #[serde(default)]
    pub title: String,
    #[serde(default)]
    pub author: String,
    #[serde(default)]
    pub description: String,
}

/// A single field that failed validation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FieldError {
    pub field: &'static str,
    pub error: String,
}

impl Book {
    /// Check required fields and maximum lengths.
    pub fn validate(&self) -> Result<(), Vec<FieldError>> {
        let errors: Vec<FieldError> = [
            ("title", self.title.as_str(), TITLE_MAX_LEN),
            ("author", self.author.as_str(), AUTHOR_MAX_LEN),
            ("description", self.description.as_str(), DESCRIPTION_MAX_LEN),
        ]
        .into_iter()
        .filter_map(|(field, value, max)| check_text(field, value, max))
        .collect();

        if errors.is_empty() {
            Ok(())
        } else {
            Err(errors)
        }
    }
}

fn check_text(field: &'static str, value: &str, max: usize) -> Option<FieldError> {
    if value.trim().is_empty() {
        return Some(FieldError {
            field,
            error: format!("The {field} field is required."),
        });
    }
    if value.chars().count() > max {
        return Some(FieldError {
            field,
            error: format!("The {field} field must not exceed {max} characters."),
        });
    }
    None
}
