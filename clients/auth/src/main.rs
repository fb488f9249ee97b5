use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Result;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use auth::storage::{SecureSessionStorage, SessionStorage, WebSessionStorage};
use auth::{
    ClientConfig, GuardOutcome, HttpAuthBackend, Platform, RouteGuard, SessionManager,
    TracingNotifier,
};
use common::{FileStore, MemoryStore};

#[tokio::main]
async fn main() -> Result<ExitCode> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter(
            EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")),
        )
        .init();

    info!("Starting session probe");

    let config = ClientConfig::from_env()?;
    info!(
        "Probing {} as a {:?} client, store at {}",
        config.base_url,
        config.platform,
        config.store_path.display()
    );

    let durable = Arc::new(FileStore::open(&config.store_path));
    let storage: Arc<dyn SessionStorage> = match config.platform {
        Platform::Web => Arc::new(WebSessionStorage::new(durable, Arc::new(MemoryStore::new()))),
        Platform::Mobile => Arc::new(SecureSessionStorage::with_fallback(
            durable,
            Arc::new(MemoryStore::new()),
        )),
    };

    let backend = HttpAuthBackend::new(config.clone())?;
    let session = SessionManager::new(
        Arc::new(backend),
        storage,
        config.platform.refresh_policy(),
        Arc::new(TracingNotifier),
    );

    let phase = session.bootstrap().await;
    info!("Bootstrap finished in phase {}", phase);

    let guard = RouteGuard::from_config(session, &config);
    match guard.require_authenticated().await {
        GuardOutcome::Allow(user) => {
            info!(
                "Session restored for {} <{}> ({})",
                user.name,
                user.email,
                user.role.as_str()
            );
            Ok(ExitCode::SUCCESS)
        }
        GuardOutcome::Redirect(route) => {
            error!("No usable session (phase: {}, redirect: {:?})", phase, route);
            Ok(ExitCode::FAILURE)
        }
    }
}
