//! gatehouse-server — HTTP entry point
//!
//! Boot order: logging, config, store seeding, session actor, janitor,
//! then the axum server. The janitor lives on this stack so it stops with
//! the process instead of leaking a global task.

use std::sync::Arc;

use tracing::info;
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

use gatehouse::http::{self, AppState};
use gatehouse::{
    AuthConfig, CredentialStore, MemoryStore, RegistrationNotifier, SessionActor, TokenIssuer,
    TokenJanitor, WebhookNotifier,
};

#[tokio::main]
async fn main() -> gatehouse::Result<()> {
    tracing_subscriber::registry()
        .with(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| "gatehouse=info,tower_http=info".into()),
        )
        .with(tracing_subscriber::fmt::layer())
        .init();

    let config = AuthConfig::from_env()?;

    let store = Arc::new(MemoryStore::new());
    for role in &config.seed_roles {
        let seeded = store.add_role(role);
        info!(role_id = seeded.id, role = %seeded.name, "Role seeded");
    }
    for (name, value) in &config.seed_secrets {
        store.add_secret(name, value);
    }
    if !config.seed_secrets.is_empty() {
        // names and values stay out of the log
        info!(count = config.seed_secrets.len(), "Secrets seeded");
    }
    // seeding needs the concrete store; everything below shares it as a trait object
    let store: Arc<dyn CredentialStore> = store;

    let notifier: Option<Arc<dyn RegistrationNotifier>> = config
        .notify_webhook_url
        .clone()
        .map(|url| Arc::new(WebhookNotifier::new(url)) as Arc<dyn RegistrationNotifier>);

    let issuer = TokenIssuer::new(&config);
    let sessions = SessionActor::spawn(Arc::clone(&store), &config, notifier);

    let mut janitor = TokenJanitor::new(Arc::clone(&store));
    janitor.start(std::time::Duration::from_secs(config.sweep_interval_secs));

    let app = http::router(AppState { sessions, issuer });

    let listener = tokio::net::TcpListener::bind(&config.bind_addr).await?;
    info!(addr = %config.bind_addr, "Gatehouse listening");
    axum::serve(listener, app).await?;

    janitor.stop();
    Ok(())
}
