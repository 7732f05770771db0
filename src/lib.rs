//! # Gatehouse
//!
//! Session-token authentication backend: registration with generated
//! credentials, login, single-use refresh-token rotation, user lookup,
//! and background cleanup of revoked tokens.
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────┐
//! │                   gatehouse                     │
//! ├───────────────┬───────────────┬─────────────────┤
//! │   HTTP API    │ SessionActor  │  TokenJanitor   │
//! │  (envelope,   │ (register,    │  (periodic      │
//! │   bearer      │  login,       │   sweep of      │
//! │   gate)       │  rotation)    │   revoked rows) │
//! ├───────────────┴───────────────┴─────────────────┤
//! │             CredentialStore (trait)             │
//! │    users · roles · refresh tokens · secrets     │
//! └─────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
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
//!     let user = sessions
//!         .register("Alice".into(), "alice@example.com".into(), "User".into())
//!         .await?;
//!     println!("registered: {}", user.email);
//!     Ok(())
//! }
//! ```
//!
//! ## Design
//!
//! - **Single-use refresh tokens**: a refresh token is revoked the moment
//!   it is looked up, before expiry is even checked, so replay always
//!   fails and an expired token can never be resurrected.
//! - **One live session lineage per user**: every issuance revokes all
//!   outstanding refresh tokens first.
//! - **Railway Programming**: all operations return `Result<T, AuthError>`.

pub mod config;
pub mod error;
pub mod http;
pub mod janitor;
pub mod notify;
pub mod password;
pub mod session;
pub mod store;
pub mod token;

// Re-exports for convenience
pub use config::AuthConfig;
pub use error::{AuthError, Result};
pub use janitor::TokenJanitor;
pub use notify::{RegistrationNotifier, WebhookNotifier};
pub use session::{SessionActor, SessionHandle, TokenPair, UserDetails, UserLookup};
pub use store::{CredentialStore, MemoryStore};
pub use token::{AccessClaims, TokenIssuer};
