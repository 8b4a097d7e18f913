use serde::Deserialize;
use validator::Validate;

use super::{text_too_long, FieldErrors, MAX_TEXT_BYTES};

#[derive(Debug, Default, Deserialize, Validate)]
pub struct CommentForm {
    #[serde(default)]
    #[validate(length(min = 1, message = "This field is required."))]
    pub text: String,
}

impl CommentForm {
    /// Trimmed comment text, or the field errors
    pub fn cleaned(&self) -> Result<String, FieldErrors> {
        let form = CommentForm {
            text: self.text.trim().to_string(),
        };
        form.validate()?;
        if form.text.len() > MAX_TEXT_BYTES {
            let mut errors = FieldErrors::new();
            errors.add("text", text_too_long());
            return Err(errors);
        }
        Ok(form.text)
    }
}
