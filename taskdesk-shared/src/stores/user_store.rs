/// User accounts

use std::sync::Arc;

use chrono::Utc;
use tracing::{debug, info, warn};
use uuid::Uuid;

use crate::db::repository::UserRepository;
use crate::error::{StoreError, StoreResult};
use crate::models::user::{NewUser, User, UserChanges, UserStats};
use crate::pagination::{Page, Pagination};
use crate::password::{self, PasswordPolicy};

/// Creates, reads, updates and soft-deletes users
#[derive(Clone)]
pub struct UserStore {
    users: Arc<dyn UserRepository>,
    policy: PasswordPolicy,
}

impl UserStore {
    pub fn new(users: Arc<dyn UserRepository>, policy: PasswordPolicy) -> Self {
        Self { users, policy }
    }

    /// One page of users, newest first
    pub async fn list_users(&self, pagination: Pagination) -> StoreResult<Page<User>> {
        let items = self
            .users
            .list(pagination.limit(), pagination.offset())
            .await?;
        let total = self.users.count().await?;

        debug!(
            page = pagination.page(),
            limit = pagination.limit(),
            total,
            "Listed users"
        );

        Ok(Page {
            items,
            meta: pagination.meta(total),
        })
    }

    pub async fn get_user(&self, id: Uuid) -> StoreResult<User> {
        self.users
            .find_by_id(id)
            .await?
            .ok_or(StoreError::NotFound("User"))
    }

    /// Validates, checks the email is free, hashes the password and persists
    pub async fn create_user(&self, input: NewUser) -> StoreResult<User> {
        let (profile, plaintext) = input.into_fields().map_err(|violations| {
            warn!(%violations, "Rejected user creation");
            StoreError::Validation(violations)
        })?;

        if self.users.find_by_email(&profile.email).await?.is_some() {
            warn!(email = %profile.email, "Email already registered");
            return Err(StoreError::DuplicateEmail);
        }

        let password_hash = self.hash(plaintext).await?;
        let user = User::new(profile, password_hash, Utc::now());
        self.users.insert(&user).await?;

        info!(user_id = %user.id, role = user.role.as_str(), "User created");
        Ok(user)
    }

    /// Applies a partial update; the merged record is validated as a whole
    pub async fn update_user(&self, id: Uuid, changes: UserChanges) -> StoreResult<User> {
        let mut user = self.get_user(id).await?;
        let is_active = changes.is_active;

        let (profile, plaintext) = changes.merge_onto(&user).map_err(|violations| {
            warn!(user_id = %id, %violations, "Rejected user update");
            StoreError::Validation(violations)
        })?;

        if profile.email != user.email {
            if let Some(other) = self.users.find_by_email(&profile.email).await? {
                if other.id != id {
                    warn!(user_id = %id, email = %profile.email, "Email already taken");
                    return Err(StoreError::DuplicateEmail);
                }
            }
        }

        if let Some(plaintext) = plaintext {
            user.password_hash = self.hash(plaintext).await?;
            debug!(user_id = %id, "Password re-hashed");
        }

        user.name = profile.name;
        user.email = profile.email;
        user.role = profile.role;
        if let Some(is_active) = is_active {
            user.is_active = is_active;
        }
        user.updated_at = Utc::now();

        self.save(&user).await?;
        info!(user_id = %id, "User updated");
        Ok(user)
    }

    /// Soft delete: the record stays and remains a valid task reference
    ///
    /// Deleting an already inactive user succeeds without writing.
    pub async fn delete_user(&self, id: Uuid) -> StoreResult<()> {
        let mut user = self.get_user(id).await?;
        if !user.is_active {
            debug!(user_id = %id, "User already inactive");
            return Ok(());
        }

        user.is_active = false;
        user.updated_at = Utc::now();
        self.save(&user).await?;

        info!(user_id = %id, "User deactivated");
        Ok(())
    }

    /// Compares a candidate password with the stored hash
    ///
    /// A mismatch is `Ok(false)`. A stored hash that cannot be compared at
    /// all is `PasswordComparison`.
    pub async fn match_password(&self, user: &User, candidate: &str) -> StoreResult<bool> {
        let hash = user.password_hash.clone();
        let candidate = candidate.to_string();

        tokio::task::spawn_blocking(move || password::verify_password(&candidate, &hash))
            .await?
            .map_err(|e| {
                warn!(user_id = %user.id, error = %e, "Password comparison failed");
                StoreError::PasswordComparison(e)
            })
    }

    /// Case-insensitive lookup
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        self.users.find_by_email(email.trim()).await
    }

    pub async fn get_stats(&self) -> StoreResult<UserStats> {
        let total_users = self.users.count().await?;
        let stats = self.users.count_by_role().await?;
        Ok(UserStats { total_users, stats })
    }

    /// Stamps `last_login` with the current time
    pub async fn record_login(&self, id: Uuid) -> StoreResult<User> {
        let mut user = self.get_user(id).await?;
        let now = Utc::now();
        user.last_login = Some(now);
        user.updated_at = now;
        self.save(&user).await?;

        debug!(user_id = %id, "Recorded login");
        Ok(user)
    }

    async fn save(&self, user: &User) -> StoreResult<()> {
        if self.users.update(user).await? {
            Ok(())
        } else {
            Err(StoreError::NotFound("User"))
        }
    }

    /// Argon2 is CPU-bound; keep it off the async workers
    async fn hash(&self, plaintext: String) -> StoreResult<String> {
        let policy = self.policy;
        tokio::task::spawn_blocking(move || password::hash_password(&plaintext, &policy))
            .await?
            .map_err(StoreError::PasswordHash)
    }
}
