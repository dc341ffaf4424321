use std::sync::Arc;

use anyhow::Context;
use tracing::{info, warn};

use crate::{
    auth::{
        password::{hash_password, verify_password},
        repo_types::User,
    },
    error::{AppError, AppResult},
    storage::FileStore,
};

/// Registration, profile updates and password checks over the users collection.
#[derive(Clone)]
pub struct Credentials {
    users: FileStore<User>,
    // verified against when the email is unknown so both paths cost one Argon2 run
    dummy_hash: Arc<str>,
}

impl Credentials {
    pub fn new(users: FileStore<User>) -> anyhow::Result<Self> {
        let dummy_hash = hash_password("chirpy-dummy-password").context("hash dummy password")?;
        Ok(Self {
            users,
            dummy_hash: dummy_hash.into(),
        })
    }

    /// Create a user; the email must not be registered yet (exact match).
    pub async fn create_user(&self, email: &str, password: &str) -> AppResult<User> {
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .update(|users| {
                if users.iter().any(|u| u.email == email) {
                    return Err(AppError::DuplicateEmail);
                }
                let user = User {
                    id: users.len() as u64 + 1,
                    email: email.to_string(),
                    password_hash,
                };
                users.push(user.clone());
                Ok(user)
            })
            .await
            .inspect_err(|e| {
                if matches!(e, AppError::DuplicateEmail) {
                    warn!(email, "email already registered");
                }
            })?;

        info!(user_id = user.id, email = %user.email, "user registered");
        Ok(user)
    }

    /// Replace email and password of an existing user. Nothing is written if
    /// the id is unknown.
    pub async fn update_user(&self, user_id: u64, email: &str, password: &str) -> AppResult<User> {
        let password_hash = hash_password(password)?;

        let user = self
            .users
            .update(|users| {
                if users.iter().any(|u| u.email == email && u.id != user_id) {
                    return Err(AppError::DuplicateEmail);
                }
                let user = users
                    .iter_mut()
                    .find(|u| u.id == user_id)
                    .ok_or(AppError::NotFound)?;
                user.email = email.to_string();
                user.password_hash = password_hash;
                Ok(user.clone())
            })
            .await?;

        info!(user_id, email = %user.email, "user updated");
        Ok(user)
    }

    /// Returns the user when `password` matches the stored hash for `email`.
    pub async fn verify_password(&self, email: &str, password: &str) -> AppResult<Option<User>> {
        let user = self.find_by_email(email).await?;
        let hash = user
            .as_ref()
            .map(|u| u.password_hash.as_str())
            .unwrap_or(&*self.dummy_hash);

        let matched = verify_password(password, hash)?;
        match user {
            Some(user) if matched => Ok(Some(user)),
            _ => {
                warn!(email, "password check failed");
                Ok(None)
            }
        }
    }

    pub async fn find_by_email(&self, email: &str) -> AppResult<Option<User>> {
        let users = self.users.load().await?;
        Ok(users.into_iter().find(|u| u.email == email))
    }

    pub async fn find_by_id(&self, user_id: u64) -> AppResult<Option<User>> {
        let users = self.users.load().await?;
        Ok(users.into_iter().find(|u| u.id == user_id))
    }
}
