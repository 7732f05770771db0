//! Credential store — records and the persistence seam
//!
//! The rest of the crate only ever talks to [`CredentialStore`]; the
//! bundled [`MemoryStore`] backs tests and development, and a relational
//! implementation slots in behind the same trait.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use crate::error::Result;

pub mod memory;

pub use memory::MemoryStore;

/// Stamp recorded on rows the service creates itself
pub const SYSTEM_ACTOR: &str = "admin";

/// User identity row
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct User {
    pub id: i64,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub created_by: String,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Named role
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    pub id: i64,
    pub name: String,
}

/// Link between a user and a role, written once at registration
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub user_id: i64,
    pub role_id: i64,
    pub is_active: bool,
    pub created_at: DateTime<Utc>,
}

/// Refresh-token row. Flipping `is_revoked` is the only permitted
/// mutation; physical deletion belongs to the janitor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RefreshTokenRow {
    pub id: i64,
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: i64,
    pub is_revoked: bool,
    pub created_at: DateTime<Utc>,
    pub updated_by: Option<String>,
    pub updated_at: Option<DateTime<Utc>>,
}

/// Opaque named secret (integration credentials and the like)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Secret {
    pub name: String,
    pub value: String,
}

/// Input for user creation; the store persists the row and its role
/// assignment as one logical unit
#[derive(Debug, Clone)]
pub struct NewUser {
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role_id: i64,
}

/// Input for refresh-token creation
#[derive(Debug, Clone)]
pub struct NewRefreshToken {
    pub token: String,
    pub expires_at: DateTime<Utc>,
    pub user_id: i64,
}

/// Deletion scope for refresh-token purges
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TokenPurge {
    /// Every token owned by one user, revoked or not (logout)
    ForUser(i64),
    /// Every revoked token regardless of owner (janitor sweep)
    Revoked,
}

/// Persistence seam for users, roles, refresh tokens, and secrets.
///
/// Implementations must guarantee that only one caller can observe a
/// given token string with `is_revoked == false` and transition it
/// through the find/update pair the rotation protocol uses.
#[async_trait]
pub trait CredentialStore: Send + Sync {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>>;

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>>;

    /// Insert the user row plus an active role assignment
    async fn insert_user(&self, new_user: NewUser) -> Result<User>;

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>>;

    /// The role behind the user's first active assignment
    async fn primary_role(&self, user_id: i64) -> Result<Option<Role>>;

    async fn insert_refresh_token(&self, new_token: NewRefreshToken) -> Result<RefreshTokenRow>;

    async fn find_non_revoked_token(&self, token: &str) -> Result<Option<RefreshTokenRow>>;

    async fn list_non_revoked_tokens(&self, user_id: i64) -> Result<Vec<RefreshTokenRow>>;

    async fn update_refresh_token(&self, row: &RefreshTokenRow) -> Result<()>;

    /// Delete refresh tokens in the given scope, returning the count
    async fn delete_refresh_tokens(&self, scope: TokenPurge) -> Result<u64>;

    async fn list_secrets(&self) -> Result<Vec<Secret>>;
}
