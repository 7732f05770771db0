//! In-memory reference implementation of the credential store
//!
//! Rows live in plain vectors behind one mutex; every trait call takes the
//! lock once and never holds it across an await point.

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use crate::error::{AuthError, Result};

use super::{
    CredentialStore, NewRefreshToken, NewUser, RefreshTokenRow, Role, RoleAssignment, Secret,
    TokenPurge, User, SYSTEM_ACTOR,
};

#[derive(Default)]
struct Tables {
    users: Vec<User>,
    roles: Vec<Role>,
    assignments: Vec<RoleAssignment>,
    tokens: Vec<RefreshTokenRow>,
    secrets: Vec<Secret>,
    last_user_id: i64,
    last_role_id: i64,
    last_token_id: i64,
}

fn next_id(counter: &mut i64) -> i64 {
    *counter += 1;
    *counter
}

/// Thread-safe in-memory store
#[derive(Default)]
pub struct MemoryStore {
    tables: Mutex<Tables>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed a role, returning the stored row. Seeding the same name twice
    /// returns the existing row.
    pub fn add_role(&self, name: &str) -> Role {
        let mut t = self.tables.lock();
        if let Some(existing) = t.roles.iter().find(|r| r.name == name) {
            return existing.clone();
        }
        let id = next_id(&mut t.last_role_id);
        let role = Role {
            id,
            name: name.to_string(),
        };
        t.roles.push(role.clone());
        role
    }

    /// Seed a named secret
    pub fn add_secret(&self, name: &str, value: &str) {
        self.tables.lock().secrets.push(Secret {
            name: name.to_string(),
            value: value.to_string(),
        });
    }
}

#[async_trait]
impl CredentialStore for MemoryStore {
    async fn find_user_by_email(&self, email: &str) -> Result<Option<User>> {
        Ok(self
            .tables
            .lock()
            .users
            .iter()
            .find(|u| u.email == email)
            .cloned())
    }

    async fn find_user_by_id(&self, id: i64) -> Result<Option<User>> {
        Ok(self
            .tables
            .lock()
            .users
            .iter()
            .find(|u| u.id == id)
            .cloned())
    }

    async fn insert_user(&self, new_user: NewUser) -> Result<User> {
        let mut t = self.tables.lock();
        if t.users.iter().any(|u| u.email == new_user.email) {
            return Err(AuthError::EmailTaken(new_user.email));
        }
        if !t.roles.iter().any(|r| r.id == new_user.role_id) {
            return Err(AuthError::Store(format!(
                "role id {} does not exist",
                new_user.role_id
            )));
        }

        let now = Utc::now();
        let id = next_id(&mut t.last_user_id);
        let user = User {
            id,
            name: new_user.name,
            email: new_user.email,
            password_hash: new_user.password_hash,
            created_by: SYSTEM_ACTOR.to_string(),
            created_at: now,
            updated_by: None,
            updated_at: None,
        };
        t.users.push(user.clone());
        t.assignments.push(RoleAssignment {
            user_id: user.id,
            role_id: new_user.role_id,
            is_active: true,
            created_at: now,
        });
        Ok(user)
    }

    async fn find_role_by_name(&self, name: &str) -> Result<Option<Role>> {
        Ok(self
            .tables
            .lock()
            .roles
            .iter()
            .find(|r| r.name == name)
            .cloned())
    }

    async fn primary_role(&self, user_id: i64) -> Result<Option<Role>> {
        let t = self.tables.lock();
        let Some(assignment) = t
            .assignments
            .iter()
            .find(|a| a.user_id == user_id && a.is_active)
        else {
            return Ok(None);
        };
        Ok(t.roles.iter().find(|r| r.id == assignment.role_id).cloned())
    }

    async fn insert_refresh_token(&self, new_token: NewRefreshToken) -> Result<RefreshTokenRow> {
        let mut t = self.tables.lock();
        let id = next_id(&mut t.last_token_id);
        let row = RefreshTokenRow {
            id,
            token: new_token.token,
            expires_at: new_token.expires_at,
            user_id: new_token.user_id,
            is_revoked: false,
            created_at: Utc::now(),
            updated_by: None,
            updated_at: None,
        };
        t.tokens.push(row.clone());
        Ok(row)
    }

    async fn find_non_revoked_token(&self, token: &str) -> Result<Option<RefreshTokenRow>> {
        Ok(self
            .tables
            .lock()
            .tokens
            .iter()
            .find(|r| r.token == token && !r.is_revoked)
            .cloned())
    }

    async fn list_non_revoked_tokens(&self, user_id: i64) -> Result<Vec<RefreshTokenRow>> {
        Ok(self
            .tables
            .lock()
            .tokens
            .iter()
            .filter(|r| r.user_id == user_id && !r.is_revoked)
            .cloned()
            .collect())
    }

    async fn update_refresh_token(&self, row: &RefreshTokenRow) -> Result<()> {
        let mut t = self.tables.lock();
        let Some(stored) = t.tokens.iter_mut().find(|r| r.id == row.id) else {
            return Err(AuthError::Store(format!(
                "refresh token id {} does not exist",
                row.id
            )));
        };
        *stored = row.clone();
        stored.updated_by = Some(SYSTEM_ACTOR.to_string());
        stored.updated_at = Some(Utc::now());
        Ok(())
    }

    async fn delete_refresh_tokens(&self, scope: TokenPurge) -> Result<u64> {
        let mut t = self.tables.lock();
        let before = t.tokens.len();
        match scope {
            TokenPurge::ForUser(user_id) => t.tokens.retain(|r| r.user_id != user_id),
            TokenPurge::Revoked => t.tokens.retain(|r| !r.is_revoked),
        }
        Ok((before - t.tokens.len()) as u64)
    }

    async fn list_secrets(&self) -> Result<Vec<Secret>> {
        Ok(self.tables.lock().secrets.clone())
    }
}
