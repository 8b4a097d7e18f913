//! Form binding and validation
//!
//! Field rules that only look at the submitted value use the `validator`
//! derive. Rules that need storage (group existence, unique usernames) or the
//! payload (image decoding) are checked by hand and reported the same way.

mod auth;
mod comment;
mod post;

pub use auth::{LoginForm, SignupForm};
pub use comment::CommentForm;
pub use post::{PostFormBody, PostSubmission, ValidPost};

use std::collections::BTreeMap;
use validator::ValidationErrors;

pub const REQUIRED: &str = "This field is required.";

/// Longest post or comment text accepted, in bytes
pub const MAX_TEXT_BYTES: usize = 256 * 1024;
/// Body cap for urlencoded forms; leaves room for percent-encoding of a full text
pub const FORM_BODY_LIMIT: usize = 4 * MAX_TEXT_BYTES;

pub fn text_too_long() -> String {
    format!("Ensure this value has at most {} bytes.", MAX_TEXT_BYTES)
}
pub const INVALID_CHOICE: &str =
    "Select a valid choice. That choice is not one of the available choices.";

/// Messages per field name; `__all__` holds form-wide errors
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FieldErrors(BTreeMap<String, Vec<String>>);

impl FieldErrors {
    pub const NON_FIELD: &'static str = "__all__";

    pub fn new() -> Self {
        Self::default()
    }

    pub fn add(&mut self, field: &str, message: impl Into<String>) {
        self.0
            .entry(field.to_string())
            .or_default()
            .push(message.into());
    }

    /// Replace every message of `field` with a single one
    pub fn set(&mut self, field: &str, message: impl Into<String>) {
        self.0.insert(field.to_string(), vec![message.into()]);
    }

    /// Messages for `field`, empty when it is valid
    pub fn get(&self, field: &str) -> Vec<String> {
        self.0.get(field).cloned().unwrap_or_default()
    }

    pub fn has(&self, field: &str) -> bool {
        self.0.contains_key(field)
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn merge(&mut self, other: FieldErrors) {
        for (field, messages) in other.0 {
            self.0.entry(field).or_default().extend(messages);
        }
    }
}

impl From<ValidationErrors> for FieldErrors {
    fn from(errors: ValidationErrors) -> Self {
        let mut out = FieldErrors::new();
        for (field, field_errors) in errors.field_errors() {
            for error in field_errors.iter() {
                let message = error
                    .message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("Invalid value ({})", error.code));
                out.add(&field.to_string(), message);
            }
        }
        out
    }
}
