/// User model, input drafts and validation
///
/// # Schema
///
/// ```sql
/// CREATE TYPE user_role AS ENUM ('user', 'admin');
///
/// CREATE TABLE users (
///     id UUID PRIMARY KEY,
///     name VARCHAR(50) NOT NULL,
///     email VARCHAR(255) NOT NULL,
///     password_hash VARCHAR(255) NOT NULL,
///     role user_role NOT NULL DEFAULT 'user',
///     is_active BOOLEAN NOT NULL DEFAULT TRUE,
///     last_login TIMESTAMPTZ,
///     created_at TIMESTAMPTZ NOT NULL DEFAULT NOW(),
///     updated_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
/// );
///
/// CREATE UNIQUE INDEX users_email_key ON users (LOWER(email));
/// ```
///
/// # Example
///
/// ```
/// use taskdesk_shared::models::user::NewUser;
///
/// let draft = NewUser {
///     name: Some("  John Doe ".to_string()),
///     email: Some("John@Example.com".to_string()),
///     password: Some("password123".to_string()),
///     role: None,
/// };
///
/// let (profile, _password) = draft.into_fields().unwrap();
/// assert_eq!(profile.name, "John Doe");
/// assert_eq!(profile.email, "john@example.com");
/// ```

use super::{clean, UnknownVariant};
use crate::validation::{self, FieldViolation, Violations};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::str::FromStr;
use uuid::Uuid;
use validator::Validate;

const NAME_REQUIRED: &str = "Please add a name";
const PASSWORD_REQUIRED: &str = "Please add a password";

/// Role of a user account
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize, sqlx::Type,
)]
#[sqlx(type_name = "user_role", rename_all = "lowercase")]
#[serde(rename_all = "lowercase")]
pub enum UserRole {
    #[default]
    User,
    Admin,
}

impl UserRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            UserRole::User => "user",
            UserRole::Admin => "admin",
        }
    }
}

impl FromStr for UserRole {
    type Err = UnknownVariant;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "user" => Ok(UserRole::User),
            "admin" => Ok(UserRole::Admin),
            other => Err(UnknownVariant {
                kind: "role",
                value: other.to_string(),
            }),
        }
    }
}

/// A user account
///
/// Serializes as the public profile: the password hash is skipped, so no
/// read path can leak it.
#[derive(Debug, Clone, Serialize, sqlx::FromRow)]
#[serde(rename_all = "camelCase")]
pub struct User {
    pub id: Uuid,

    pub name: String,

    /// Stored trimmed and lowercased; unique across all users
    pub email: String,

    /// Argon2id PHC string
    #[serde(skip_serializing)]
    pub password_hash: String,

    pub role: UserRole,

    /// False once the user has been soft-deleted
    pub is_active: bool,

    pub last_login: Option<DateTime<Utc>>,

    pub created_at: DateTime<Utc>,

    pub updated_at: DateTime<Utc>,
}

impl User {
    /// Builds a fresh active account from validated fields
    pub fn new(profile: UserProfile, password_hash: String, now: DateTime<Utc>) -> Self {
        Self {
            id: Uuid::new_v4(),
            name: profile.name,
            email: profile.email,
            password_hash,
            role: profile.role,
            is_active: true,
            last_login: None,
            created_at: now,
            updated_at: now,
        }
    }

    pub fn summary(&self) -> UserSummary {
        UserSummary {
            id: self.id,
            name: self.name.clone(),
            email: self.email.clone(),
        }
    }

    pub fn author(&self) -> CommentAuthor {
        CommentAuthor {
            id: self.id,
            name: self.name.clone(),
        }
    }
}

/// Minimal projection used when a task references a user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct UserSummary {
    pub id: Uuid,
    pub name: String,
    pub email: String,
}

/// Projection of a comment author
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CommentAuthor {
    pub id: Uuid,
    pub name: String,
}

/// Validated, normalized profile fields
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UserProfile {
    pub name: String,
    pub email: String,
    pub role: UserRole,
}

/// Request body for creating a user
///
/// Every field is optional at the type level so that missing fields are
/// reported together with the other violations instead of failing
/// deserialization on the first one.
#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
pub struct NewUser {
    #[validate(
        required(message = "Please add a name"),
        length(max = 50, message = "Name cannot be more than 50 characters")
    )]
    pub name: Option<String>,

    #[validate(
        required(message = "Please add an email"),
        email(message = "Please add a valid email")
    )]
    pub email: Option<String>,

    #[validate(length(min = 6, message = "Password must be at least 6 characters"))]
    pub password: Option<String>,

    pub role: Option<String>,
}

impl NewUser {
    /// Trims text fields and lowercases the email; blank values become `None`
    ///
    /// Passwords are not trimmed, only dropped when empty.
    pub fn normalized(self) -> Self {
        Self {
            name: clean(self.name),
            email: clean(self.email).map(|e| e.to_lowercase()),
            password: self.password.filter(|p| !p.is_empty()),
            role: clean(self.role),
        }
    }

    /// Lists every violated field of an already normalized draft
    pub fn violations(&self, require_password: bool) -> Vec<FieldViolation> {
        let mut violations = match self.validate() {
            Ok(()) => Vec::new(),
            Err(errors) => validation::from_validator_errors(&errors, &[]),
        };

        if require_password && self.password.is_none() {
            violations.push(FieldViolation::new("password", PASSWORD_REQUIRED));
        }

        if let Some(raw) = self.role.as_deref() {
            if let Err(err) = raw.parse::<UserRole>() {
                violations.push(FieldViolation::new("role", err.to_string()));
            }
        }

        violations
    }

    /// Validates a creation draft, returning the profile and plaintext password
    pub fn into_fields(self) -> Result<(UserProfile, String), Violations> {
        let (profile, password) = self.normalized().check(true)?;
        match password {
            Some(password) => Ok((profile, password)),
            None => Err(Violations::single("password", PASSWORD_REQUIRED)),
        }
    }

    fn check(self, require_password: bool) -> Result<(UserProfile, Option<String>), Violations> {
        validation::finish(self.violations(require_password))?;

        let role = match self.role.as_deref() {
            Some(raw) => raw
                .parse()
                .map_err(|e: UnknownVariant| Violations::single("role", e.to_string()))?,
            None => UserRole::default(),
        };

        match (self.name, self.email) {
            (Some(name), Some(email)) => Ok((UserProfile { name, email, role }, self.password)),
            (None, _) => Err(Violations::single("name", NAME_REQUIRED)),
            (_, None) => Err(Violations::single("email", "Please add an email")),
        }
    }
}

/// Request body for a partial user update
///
/// Absent fields keep their stored value. An absent or empty password leaves
/// the stored hash untouched.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserChanges {
    pub name: Option<String>,
    pub email: Option<String>,
    pub password: Option<String>,
    pub role: Option<String>,
    pub is_active: Option<bool>,
}

impl UserChanges {
    /// Merges the changes onto `user` and validates the resulting record
    ///
    /// Returns the merged profile and the new plaintext password, if any.
    pub fn merge_onto(self, user: &User) -> Result<(UserProfile, Option<String>), Violations> {
        // Supplied-but-blank text stays blank so the required rules fire
        let draft = NewUser {
            name: Some(self.name.unwrap_or_else(|| user.name.clone())),
            email: Some(self.email.unwrap_or_else(|| user.email.clone())),
            password: self.password,
            role: Some(self.role.unwrap_or_else(|| user.role.as_str().to_string())),
        };
        draft.normalized().check(false)
    }
}

/// Number of users holding one role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, sqlx::FromRow)]
pub struct RoleCount {
    pub role: UserRole,
    pub count: i64,
}

/// Aggregate user statistics
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserStats {
    pub total_users: i64,
    pub stats: Vec<RoleCount>,
}
