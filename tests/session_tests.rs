//! SessionActor integration tests — register, login, refresh rotation, lookup, logout

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use parking_lot::Mutex;

use gatehouse::store::{CredentialStore, NewRefreshToken};
use gatehouse::{
    AuthConfig, AuthError, MemoryStore, RegistrationNotifier, SessionActor, SessionHandle,
    TokenIssuer, TokenJanitor,
};

fn test_config() -> AuthConfig {
    AuthConfig::new()
        .with_jwt_secret("test-secret-for-sessions")
        .with_access_ttl_minutes(5)
        .with_refresh_ttl_minutes(60)
}

fn seeded_store() -> Arc<MemoryStore> {
    let store = Arc::new(MemoryStore::new());
    store.add_role("Admin");
    store.add_role("User");
    store
}

fn spawn_sessions() -> (SessionHandle, Arc<MemoryStore>) {
    let store = seeded_store();
    let handle = SessionActor::spawn(
        Arc::clone(&store) as Arc<dyn CredentialStore>,
        &test_config(),
        None,
    );
    (handle, store)
}

/// Captures the generated password the actor hands to the notifier.
#[derive(Default)]
struct RecordingNotifier {
    delivered: Mutex<Option<(String, String, String)>>,
}

#[async_trait]
impl RegistrationNotifier for RecordingNotifier {
    async fn credentials_issued(&self, name: &str, email: &str, password: &str) -> gatehouse::Result<()> {
        *self.delivered.lock() = Some((name.to_string(), email.to_string(), password.to_string()));
        Ok(())
    }
}

fn spawn_with_notifier() -> (SessionHandle, Arc<MemoryStore>, Arc<RecordingNotifier>) {
    let store = seeded_store();
    let notifier = Arc::new(RecordingNotifier::default());
    let handle = SessionActor::spawn(
        Arc::clone(&store) as Arc<dyn CredentialStore>,
        &test_config(),
        Some(Arc::clone(&notifier) as Arc<dyn RegistrationNotifier>),
    );
    (handle, store, notifier)
}

/// Delivery runs on a spawned task, so poll briefly instead of racing it.
async fn wait_for_password(notifier: &RecordingNotifier) -> String {
    for _ in 0..50 {
        if let Some((_, _, password)) = notifier.delivered.lock().take() {
            return password;
        }
        tokio::time::sleep(std::time::Duration::from_millis(10)).await;
    }
    panic!("credential delivery never arrived");
}

#[tokio::test]
async fn test_register_resolves_role() {
    let (sessions, _store) = spawn_sessions();

    let user = sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();

    assert_eq!(user.user_id, 1);
    assert_eq!(user.user_name, "Alice");
    assert_eq!(user.email, "alice@example.com");
    assert_eq!(user.role_id, 2); // Admin seeded first, User second
}

#[tokio::test]
async fn test_register_duplicate_email() {
    let (sessions, _store) = spawn_sessions();

    sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();

    let result = sessions
        .register("Impostor".into(), "alice@example.com".into(), "Admin".into())
        .await;
    assert!(matches!(result, Err(AuthError::EmailTaken(_))));

    // First registration untouched
    let details = sessions
        .fetch_user_details("alice@example.com".into())
        .await
        .unwrap();
    assert_eq!(details.user_name, "Alice");
}

#[tokio::test]
async fn test_register_unknown_role() {
    let (sessions, _store) = spawn_sessions();

    let result = sessions
        .register("Alice".into(), "alice@example.com".into(), "Wizard".into())
        .await;
    assert!(matches!(result, Err(AuthError::RoleNotFound(_))));
}

#[tokio::test]
async fn test_login_unknown_account() {
    let (sessions, _store) = spawn_sessions();

    let result = sessions
        .login("ghost@example.com".into(), "whatever".into())
        .await;
    assert!(matches!(result, Err(AuthError::UnknownAccount(_))));
}

#[tokio::test]
async fn test_login_wrong_password() {
    let (sessions, _store, notifier) = spawn_with_notifier();

    sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();
    wait_for_password(&notifier).await;

    let result = sessions
        .login("alice@example.com".into(), "not-the-generated-one".into())
        .await;
    assert!(matches!(result, Err(AuthError::InvalidCredentials)));
}

#[tokio::test]
async fn test_login_issues_verifiable_pair() {
    let (sessions, _store, notifier) = spawn_with_notifier();

    let user = sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();
    let password = wait_for_password(&notifier).await;

    let pair = sessions
        .login("alice@example.com".into(), password)
        .await
        .unwrap();

    assert_eq!(pair.token_type, "Bearer");
    assert_eq!(pair.refresh_token.len(), 32);

    // The access token carries the identity and is verifiable with the
    // same secret
    let claims = TokenIssuer::new(&test_config())
        .verify(&pair.access_token)
        .unwrap();
    assert_eq!(claims.sub, "alice@example.com");
    assert_eq!(claims.user_id, user.user_id);
    assert_eq!(claims.role, "User");
}

#[tokio::test]
async fn test_repeated_login_keeps_one_live_token() {
    let (sessions, store, notifier) = spawn_with_notifier();

    let user = sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();
    let password = wait_for_password(&notifier).await;

    sessions
        .login("alice@example.com".into(), password.clone())
        .await
        .unwrap();
    let second = sessions
        .login("alice@example.com".into(), password)
        .await
        .unwrap();

    // Only the latest refresh token survives
    let live = store.list_non_revoked_tokens(user.user_id).await.unwrap();
    assert_eq!(live.len(), 1);
    assert_eq!(live[0].token, second.refresh_token);
}

#[tokio::test]
async fn test_refresh_rotates_and_burns() {
    let (sessions, _store, notifier) = spawn_with_notifier();

    sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();
    let password = wait_for_password(&notifier).await;
    let pair = sessions
        .login("alice@example.com".into(), password)
        .await
        .unwrap();

    // Rotate
    let rotated = sessions.refresh(pair.refresh_token.clone()).await.unwrap();
    assert_ne!(rotated.refresh_token, pair.refresh_token);

    // Replaying the consumed token fails
    let replay = sessions.refresh(pair.refresh_token).await;
    assert!(matches!(replay, Err(AuthError::RefreshTokenConsumed)));

    // The failed replay did not disturb the live token
    sessions.refresh(rotated.refresh_token).await.unwrap();
}

#[tokio::test]
async fn test_expired_refresh_token_is_burned() {
    let (sessions, store) = spawn_sessions();

    let user = sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();

    // Craft a stale row directly in the store
    store
        .insert_refresh_token(NewRefreshToken {
            token: "stale-refresh-token".into(),
            expires_at: Utc::now() - chrono::Duration::minutes(5),
            user_id: user.user_id,
        })
        .await
        .unwrap();

    let result = sessions.refresh("stale-refresh-token".into()).await;
    assert!(matches!(result, Err(AuthError::RefreshTokenExpired)));

    // Revoked on the way out; a retry cannot resurrect it
    assert!(store
        .find_non_revoked_token("stale-refresh-token")
        .await
        .unwrap()
        .is_none());
    let retry = sessions.refresh("stale-refresh-token".into()).await;
    assert!(matches!(retry, Err(AuthError::RefreshTokenConsumed)));
}

#[tokio::test]
async fn test_logout_collapses_sessions() {
    let (sessions, store, notifier) = spawn_with_notifier();

    let user = sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();
    let password = wait_for_password(&notifier).await;
    let pair = sessions
        .login("alice@example.com".into(), password)
        .await
        .unwrap();

    let deleted = sessions.logout(user.user_id).await.unwrap();
    assert!(deleted >= 1);

    // The deleted refresh token no longer rotates
    let result = sessions.refresh(pair.refresh_token).await;
    assert!(matches!(result, Err(AuthError::RefreshTokenConsumed)));
    assert!(store
        .list_non_revoked_tokens(user.user_id)
        .await
        .unwrap()
        .is_empty());
}

#[tokio::test]
async fn test_fetch_user_by_email_and_by_id() {
    let (sessions, _store) = spawn_sessions();

    let user = sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();

    let by_email = sessions
        .fetch_user_details("alice@example.com".into())
        .await
        .unwrap();
    let by_id = sessions
        .fetch_user_details(user.user_id.to_string())
        .await
        .unwrap();

    assert_eq!(by_email.user_id, user.user_id);
    assert_eq!(by_id.email, "alice@example.com");
    assert_eq!(by_id.role_id, by_email.role_id);
}

#[tokio::test]
async fn test_fetch_unknown_user() {
    let (sessions, _store) = spawn_sessions();

    // Neither email- nor id-shaped: no store call can match it
    let result = sessions.fetch_user_details("no-such-user".into()).await;
    assert!(matches!(result, Err(AuthError::UserNotFound(_))));

    // Id-shaped but absent
    let result = sessions.fetch_user_details("999".into()).await;
    assert!(matches!(result, Err(AuthError::UserNotFound(_))));
}

#[tokio::test]
async fn test_fetch_secrets() {
    let (sessions, store) = spawn_sessions();
    store.add_secret("workflow_key", "wf-123");
    store.add_secret("api_key", "abc");

    let secrets = sessions.fetch_secrets().await.unwrap();
    assert_eq!(secrets.len(), 2);
    assert_eq!(secrets.get("workflow_key").map(String::as_str), Some("wf-123"));
}

#[tokio::test]
async fn test_actor_and_janitor_share_one_store() {
    // Same wiring as the server binary: seed through the concrete store,
    // then hand both components clones of one trait object
    let store: Arc<dyn CredentialStore> = seeded_store();
    let sessions = SessionActor::spawn(Arc::clone(&store), &test_config(), None);
    let mut janitor = TokenJanitor::new(Arc::clone(&store));

    let user = sessions
        .register("Alice".into(), "alice@example.com".into(), "User".into())
        .await
        .unwrap();
    assert_eq!(user.user_id, 1);

    // Nothing revoked yet, so the sweep finds no work
    assert_eq!(TokenJanitor::run_once(store.as_ref()).await.unwrap(), 0);
    janitor.stop();
}
