/// Account service - signup and credential checks
use std::sync::Arc;
use tracing::{info, warn};

use crate::auth::{password, CurrentUser};
use crate::db::BlogRepository;
use crate::error::{AppError, Result};
use crate::forms::{FieldErrors, SignupForm};
use crate::models::NewUser;

pub const USERNAME_TAKEN: &str = "A user with that username already exists.";

pub struct AccountService {
    repo: Arc<dyn BlogRepository>,
}

impl AccountService {
    pub fn new(repo: Arc<dyn BlogRepository>) -> Self {
        Self { repo }
    }

    /// Register a new account; form problems come back as field errors
    pub async fn signup(
        &self,
        form: &SignupForm,
    ) -> Result<std::result::Result<CurrentUser, FieldErrors>> {
        let mut errors = form.check();
        if errors.is_empty()
            && self
                .repo
                .find_user_by_username(&form.username)
                .await?
                .is_some()
        {
            errors.add("username", USERNAME_TAKEN);
        }
        if !errors.is_empty() {
            return Ok(Err(errors));
        }

        let password_hash = password::hash_password(&form.password1)?;
        let user = match self
            .repo
            .create_user(NewUser {
                username: form.username.clone(),
                password_hash,
            })
            .await
        {
            Ok(user) => user,
            Err(AppError::Conflict(_)) => {
                let mut errors = FieldErrors::new();
                errors.add("username", USERNAME_TAKEN);
                return Ok(Err(errors));
            }
            Err(e) => return Err(e),
        };

        info!(user_id = %user.id, username = %user.username, "User signed up");
        Ok(Ok(CurrentUser {
            id: user.id,
            username: user.username,
        }))
    }

    /// `None` for an unknown username or a wrong password
    pub async fn authenticate(&self, username: &str, password: &str) -> Result<Option<CurrentUser>> {
        let Some(user) = self.repo.find_user_by_username(username).await? else {
            warn!(username = %username, "Login attempt for unknown user");
            return Ok(None);
        };

        if !password::verify_password(password, &user.password_hash)? {
            warn!(username = %username, "Login attempt with wrong password");
            return Ok(None);
        }

        Ok(Some(CurrentUser {
            id: user.id,
            username: user.username,
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::MemoryRepository;

    fn signup_form(username: &str) -> SignupForm {
        SignupForm {
            username: username.to_string(),
            password1: "long enough".to_string(),
            password2: "long enough".to_string(),
        }
    }

    #[tokio::test]
    async fn signup_then_authenticate() {
        let service = AccountService::new(Arc::new(MemoryRepository::new()));
        let user = service.signup(&signup_form("leo")).await.unwrap().unwrap();
        assert_eq!(user.username, "leo");

        let found = service.authenticate("leo", "long enough").await.unwrap();
        assert_eq!(found, Some(user));
        assert_eq!(service.authenticate("leo", "wrong").await.unwrap(), None);
        assert_eq!(service.authenticate("nobody", "x").await.unwrap(), None);
    }

    #[tokio::test]
    async fn duplicate_username_is_a_field_error() {
        let service = AccountService::new(Arc::new(MemoryRepository::new()));
        service.signup(&signup_form("leo")).await.unwrap().unwrap();

        let errors = service.signup(&signup_form("leo")).await.unwrap().unwrap_err();
        assert_eq!(errors.get("username"), vec![USERNAME_TAKEN.to_string()]);
    }
}
