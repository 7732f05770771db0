//! SessionActor — Tokio actor for the session-token lifecycle
//!
//! Registration, login, refresh rotation, lookup, and logout are processed
//! sequentially via an mpsc channel. Serializing the writes is what makes
//! the rotation protocol atomic: only one caller can ever observe a live
//! refresh token and burn it.
//!
//! # Usage
//!
//! ```rust,no_run
//! use std::sync::Arc;
//! use gatehouse::{AuthConfig, MemoryStore, SessionActor};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = AuthConfig::new().with_jwt_secret("my-production-secret");
//!     let store = Arc::new(MemoryStore::new());
//!     store.add_role("User");
//!
//!     let sessions = SessionActor::spawn(store, &config, None);
//!
//!     // The password is generated server-side and delivered out-of-band
//!     let user = sessions
//!         .register("Alice".into(), "alice@example.com".into(), "User".into())
//!         .await?;
//!     println!("registered user {}", user.user_id);
//!
//!     Ok(())
//! }
//! ```

use std::collections::HashMap;
use std::sync::Arc;

use chrono::{Duration, Utc};
use tokio::sync::{mpsc, oneshot};
use tracing::{debug, info, warn};

use crate::config::AuthConfig;
use crate::error::{AuthError, Result};
use crate::notify::RegistrationNotifier;
use crate::password;
use crate::store::{CredentialStore, NewRefreshToken, NewUser, Role, TokenPurge, User};
use crate::token::{TokenIssuer, TOKEN_TYPE};

use super::types::*;

// ─── Actor Messages ───

enum SessionMsg {
    Register {
        name: String,
        email: String,
        role_name: String,
        reply: oneshot::Sender<Result<UserDetails>>,
    },
    Login {
        email: String,
        password: String,
        reply: oneshot::Sender<Result<TokenPair>>,
    },
    Refresh {
        token: String,
        reply: oneshot::Sender<Result<TokenPair>>,
    },
    FetchUser {
        credential: String,
        reply: oneshot::Sender<Result<UserDetails>>,
    },
    Logout {
        user_id: i64,
        reply: oneshot::Sender<Result<u64>>,
    },
    FetchSecrets {
        reply: oneshot::Sender<Result<HashMap<String, String>>>,
    },
}

// ─── Actor ───

/// Processes the session-token lifecycle sequentially
pub struct SessionActor {
    store: Arc<dyn CredentialStore>,
    issuer: TokenIssuer,
    refresh_ttl: Duration,
    password_len: usize,
    notifier: Option<Arc<dyn RegistrationNotifier>>,
    rx: mpsc::Receiver<SessionMsg>,
}

impl SessionActor {
    /// Spawn the session actor and return a handle for sending messages
    pub fn spawn(
        store: Arc<dyn CredentialStore>,
        config: &AuthConfig,
        notifier: Option<Arc<dyn RegistrationNotifier>>,
    ) -> SessionHandle {
        let (tx, rx) = mpsc::channel(256);
        let actor = Self {
            store,
            issuer: TokenIssuer::new(config),
            refresh_ttl: Duration::minutes(config.refresh_ttl_minutes),
            password_len: config.generated_password_len,
            notifier,
            rx,
        };

        tokio::spawn(actor.run());
        info!("SessionActor spawned");
        SessionHandle { tx }
    }

    /// Main event loop
    async fn run(mut self) {
        while let Some(msg) = self.rx.recv().await {
            match msg {
                SessionMsg::Register { name, email, role_name, reply } => {
                    let _ = reply.send(self.handle_register(name, email, role_name).await);
                }
                SessionMsg::Login { email, password, reply } => {
                    let _ = reply.send(self.handle_login(email, password).await);
                }
                SessionMsg::Refresh { token, reply } => {
                    let _ = reply.send(self.handle_refresh(token).await);
                }
                SessionMsg::FetchUser { credential, reply } => {
                    let _ = reply.send(self.handle_fetch_user(credential).await);
                }
                SessionMsg::Logout { user_id, reply } => {
                    let _ = reply.send(self.handle_logout(user_id).await);
                }
                SessionMsg::FetchSecrets { reply } => {
                    let _ = reply.send(self.handle_fetch_secrets().await);
                }
            }
        }
        info!("SessionActor stopped");
    }

    // ─── Handler Implementations ───

    async fn handle_register(
        &self,
        name: String,
        email: String,
        role_name: String,
    ) -> Result<UserDetails> {
        if self.store.find_user_by_email(&email).await?.is_some() {
            return Err(AuthError::EmailTaken(email));
        }

        // The plaintext lives only on this stack frame and in the
        // notifier payload; it is never stored or logged.
        let generated = password::generate_password(self.password_len);
        let password_hash = password::hash_password(&generated)?;

        let role = self
            .store
            .find_role_by_name(&role_name)
            .await?
            .ok_or(AuthError::RoleNotFound(role_name))?;

        let user = self
            .store
            .insert_user(NewUser {
                name,
                email,
                password_hash,
                role_id: role.id,
            })
            .await?;

        if let Some(notifier) = &self.notifier {
            let notifier = Arc::clone(notifier);
            let (user_name, user_email) = (user.name.clone(), user.email.clone());
            tokio::spawn(async move {
                if let Err(e) = notifier
                    .credentials_issued(&user_name, &user_email, &generated)
                    .await
                {
                    warn!(email = %user_email, error = ?e, "Credential delivery failed");
                }
            });
        }

        info!(user_id = user.id, email = %user.email, role = %role.name, "User registered");
        Ok(UserDetails {
            user_id: user.id,
            user_name: user.name,
            email: user.email,
            role_id: role.id,
        })
    }

    async fn handle_login(&self, email: String, password: String) -> Result<TokenPair> {
        let user = self
            .store
            .find_user_by_email(&email)
            .await?
            .ok_or(AuthError::UnknownAccount(email))?;

        password::verify_password(&password, &user.password_hash)?;

        let role = self.primary_role_of(&user).await?;
        let pair = self.issue_tokens(&user, &role).await?;

        info!(user_id = user.id, "Login successful");
        Ok(pair)
    }

    async fn handle_refresh(&self, token: String) -> Result<TokenPair> {
        let mut row = self
            .store
            .find_non_revoked_token(&token)
            .await?
            .ok_or(AuthError::RefreshTokenConsumed)?;

        // Burn the token before anything else is checked. A replay always
        // fails at the lookup above, and an expired token stays revoked.
        row.is_revoked = true;
        self.store.update_refresh_token(&row).await?;

        if row.expires_at <= Utc::now() {
            debug!(user_id = row.user_id, "Refresh token expired");
            return Err(AuthError::RefreshTokenExpired);
        }

        let user = self
            .store
            .find_user_by_id(row.user_id)
            .await?
            .ok_or_else(|| {
                AuthError::Internal(format!("refresh token {} has no owning user", row.id))
            })?;

        let role = self.primary_role_of(&user).await?;
        let pair = self.issue_tokens(&user, &role).await?;

        info!(user_id = user.id, "Refresh token rotated");
        Ok(pair)
    }

    async fn handle_fetch_user(&self, credential: String) -> Result<UserDetails> {
        let user = match UserLookup::classify(&credential) {
            UserLookup::ByEmail(email) => self.store.find_user_by_email(&email).await?,
            UserLookup::ById(id) => self.store.find_user_by_id(id).await?,
            UserLookup::Unmatchable => None,
        }
        .ok_or(AuthError::UserNotFound(credential))?;

        let role = self.primary_role_of(&user).await?;
        Ok(UserDetails {
            user_id: user.id,
            user_name: user.name,
            email: user.email,
            role_id: role.id,
        })
    }

    async fn handle_logout(&self, user_id: i64) -> Result<u64> {
        let deleted = self
            .store
            .delete_refresh_tokens(TokenPurge::ForUser(user_id))
            .await?;
        info!(user_id, deleted, "Logged out");
        Ok(deleted)
    }

    async fn handle_fetch_secrets(&self) -> Result<HashMap<String, String>> {
        let secrets = self.store.list_secrets().await?;
        Ok(secrets.into_iter().map(|s| (s.name, s.value)).collect())
    }

    // ─── Helpers ───

    /// The user's operational role. A missing assignment is a data fault,
    /// surfaced as an internal error rather than a panic.
    async fn primary_role_of(&self, user: &User) -> Result<Role> {
        self.store.primary_role(user.id).await?.ok_or_else(|| {
            AuthError::Internal(format!("user {} has no active role assignment", user.id))
        })
    }

    /// Revoke whatever is outstanding, then mint and persist a new pair.
    /// Every issuance path goes through here, which is what keeps at most
    /// one live refresh token per user.
    async fn issue_tokens(&self, user: &User, role: &Role) -> Result<TokenPair> {
        for mut outstanding in self.store.list_non_revoked_tokens(user.id).await? {
            outstanding.is_revoked = true;
            self.store.update_refresh_token(&outstanding).await?;
        }

        let access_token = self.issuer.mint(user, &role.name)?;
        let refresh_token = TokenIssuer::new_refresh_token();
        self.store
            .insert_refresh_token(NewRefreshToken {
                token: refresh_token.clone(),
                expires_at: Utc::now() + self.refresh_ttl,
                user_id: user.id,
            })
            .await?;

        Ok(TokenPair {
            access_token,
            refresh_token,
            token_type: TOKEN_TYPE.to_string(),
        })
    }
}

// ─── Handle (client-facing API) ───

/// Thread-safe handle to communicate with the SessionActor
#[derive(Clone)]
pub struct SessionHandle {
    tx: mpsc::Sender<SessionMsg>,
}

impl SessionHandle {
    pub async fn register(
        &self,
        name: String,
        email: String,
        role_name: String,
    ) -> Result<UserDetails> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Register { name, email, role_name, reply })
            .await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor dropped".into()))?
    }

    pub async fn login(&self, email: String, password: String) -> Result<TokenPair> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Login { email, password, reply })
            .await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor dropped".into()))?
    }

    pub async fn refresh(&self, token: String) -> Result<TokenPair> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Refresh { token, reply })
            .await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor dropped".into()))?
    }

    pub async fn fetch_user_details(&self, credential: String) -> Result<UserDetails> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::FetchUser { credential, reply })
            .await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor dropped".into()))?
    }

    pub async fn logout(&self, user_id: i64) -> Result<u64> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::Logout { user_id, reply })
            .await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor dropped".into()))?
    }

    pub async fn fetch_secrets(&self) -> Result<HashMap<String, String>> {
        let (reply, rx) = oneshot::channel();
        self.tx
            .send(SessionMsg::FetchSecrets { reply })
            .await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor".into()))?;
        rx.await
            .map_err(|_| AuthError::ActorUnavailable("SessionActor dropped".into()))?
    }
}
