use serde::Deserialize;
use validator::Validate;

use super::{FieldErrors, REQUIRED};

const USERNAME_HELP: &str = "Enter a valid username. This value may contain only letters, \
                             numbers, and @/./+/-/_ characters.";

#[derive(Debug, Default, Deserialize)]
pub struct LoginForm {
    #[serde(default)]
    pub username: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub next: Option<String>,
}

impl LoginForm {
    pub fn is_complete(&self) -> bool {
        !self.username.trim().is_empty() && !self.password.is_empty()
    }
}

#[derive(Debug, Default, Deserialize, Validate)]
pub struct SignupForm {
    #[serde(default)]
    #[validate(length(
        max = 150,
        message = "Ensure this value has at most 150 characters."
    ))]
    pub username: String,
    #[serde(default)]
    #[validate(length(
        min = 8,
        message = "This password is too short. It must contain at least 8 characters."
    ))]
    pub password1: String,
    #[serde(default)]
    pub password2: String,
}

impl SignupForm {
    /// Field checks that do not need storage; an empty result means valid
    pub fn check(&self) -> FieldErrors {
        let mut errors: FieldErrors = match self.validate() {
            Ok(()) => FieldErrors::new(),
            Err(e) => e.into(),
        };

        if self.username.is_empty() {
            errors.set("username", REQUIRED);
        } else if !self.username.chars().all(is_username_char) {
            errors.add("username", USERNAME_HELP);
        }

        if self.password1.is_empty() {
            errors.set("password1", REQUIRED);
        } else if self.password1.chars().all(|c| c.is_ascii_digit()) {
            errors.add("password1", "This password is entirely numeric.");
        }

        if self.password2.is_empty() {
            errors.set("password2", REQUIRED);
        } else if !self.password1.is_empty() && self.password1 != self.password2 {
            errors.add("password2", "The two password fields didn't match.");
        }

        errors
    }
}

fn is_username_char(c: char) -> bool {
    c.is_ascii_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_')
}

#[cfg(test)]
mod tests {
    use super::*;

    fn form(username: &str, p1: &str, p2: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: p1.to_string(),
            password2: p2.to_string(),
        }
    }

    #[test]
    fn valid_signup() {
        assert!(form("leo.tolstoy", "war-and-peace", "war-and-peace")
            .check()
            .is_empty());
    }

    #[test]
    fn username_rules() {
        assert_eq!(
            form("", "pass-word", "pass-word").check().get("username"),
            vec![REQUIRED.to_string()]
        );
        assert!(form("bad name", "pass-word", "pass-word").check().has("username"));
        assert!(form(&"a".repeat(151), "pass-word", "pass-word").check().has("username"));
    }

    #[test]
    fn password_rules() {
        assert!(form("leo", "short", "short").check().has("password1"));
        assert_eq!(
            form("leo", "", "").check().get("password1"),
            vec![REQUIRED.to_string()]
        );
        assert!(form("leo", "1234567890", "1234567890").check().has("password1"));
        let errors = form("leo", "pass-word", "pass-w0rd").check();
        assert_eq!(
            errors.get("password2"),
            vec!["The two password fields didn't match.".to_string()]
        );
    }

    #[test]
    fn login_needs_both_fields() {
        let login = LoginForm {
            username: "leo".to_string(),
            password: String::new(),
            next: None,
        };
        assert!(!login.is_complete());
    }
}
