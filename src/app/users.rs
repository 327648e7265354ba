use anyhow::Result;
use std::sync::Arc;

use crate::app::forms::{cleaned, FieldErrors, REQUIRED};
use crate::domain::user::{NewUser, User};
use crate::infra::store::Store;

const MAX_USERNAME_LEN: usize = 150;

#[derive(Debug)]
pub enum Provisioned {
    Created(User),
    Taken,
    Invalid(FieldErrors),
}

#[derive(Clone)]
pub struct UserService {
    store: Arc<dyn Store>,
}

impl UserService {
    pub fn new(store: Arc<dyn Store>) -> Self {
        Self { store }
    }

    pub async fn get_user(&self, user_id: i64) -> Result<Option<User>> {
        self.store.find_user(user_id).await
    }

    /// Registers an identity handed over by the identity provider.
    pub async fn provision(&self, username: Option<&str>, full_name: Option<&str>) -> Result<Provisioned> {
        let mut errors = FieldErrors::new();
        let username = cleaned(username);
        match username.as_deref() {
            None => errors.add("username", REQUIRED),
            Some(name) if !is_valid_username(name) => errors.add(
                "username",
                "Enter a valid username. This value may contain only letters, numbers, and @/./+/-/_ characters.",
            ),
            Some(_) => {}
        }

        let Some(username) = username.filter(|_| errors.is_empty()) else {
            return Ok(Provisioned::Invalid(errors));
        };

        let new_user = NewUser {
            username,
            full_name: cleaned(full_name).unwrap_or_default(),
        };
        match self.store.create_user(new_user).await? {
            Some(user) => {
                tracing::info!(user_id = user.id, username = %user.username, "user provisioned");
                Ok(Provisioned::Created(user))
            }
            None => Ok(Provisioned::Taken),
        }
    }
}

fn is_valid_username(username: &str) -> bool {
    username.chars().count() <= MAX_USERNAME_LEN
        && username
            .chars()
            .all(|c| c.is_alphanumeric() || matches!(c, '@' | '.' | '+' | '-' | '_'))
}
