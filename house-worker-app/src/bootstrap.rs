use crate::config::{AuthMode, Config, StoreBackend};
use anyhow::{Context, Result};
use house_worker_auth::{AuthVerifier, GatewayVerifier, IdTokenVerifier};
use house_worker_core::{DocumentStore, HouseHandler};
use house_worker_store::{FirestoreConfig, FirestoreStore, MemoryStore, TokenSource};
use std::sync::{Arc, OnceLock};

static APP: OnceLock<Arc<AppState>> = OnceLock::new();

/// Everything a request needs, built once per process.
pub struct AppState {
    pub config: Config,
    pub store: Arc<dyn DocumentStore>,
    pub verifier: Arc<dyn AuthVerifier>,
    pub handler: HouseHandler,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn DocumentStore>, verifier: Arc<dyn AuthVerifier>) -> Self {
        let handler = HouseHandler::new(store.clone(), config.house_id_strategy());
        Self {
            config,
            store,
            verifier,
            handler,
        }
    }

    /// Builds the store and verifier named by `config`.
    pub fn from_config(config: Config) -> Result<Self> {
        let store = build_store(&config)?;
        let verifier = build_verifier(&config)?;

        tracing::info!(
            store = store.name(),
            auth = verifier.name(),
            house_id = ?config.house_id_strategy(),
            "Application initialized"
        );

        Ok(Self::new(config, store, verifier))
    }
}

/// Initializes the process-wide application state.
///
/// Only the first call builds anything; later calls return the same state.
pub fn initialize_app(config: Config) -> Result<Arc<AppState>> {
    if let Some(app) = APP.get() {
        tracing::debug!("Application already initialized");
        return Ok(app.clone());
    }

    let state = Arc::new(AppState::from_config(config)?);
    Ok(APP.get_or_init(|| state).clone())
}

fn build_store(config: &Config) -> Result<Arc<dyn DocumentStore>> {
    match config.store.backend {
        StoreBackend::Memory => {
            tracing::warn!("Using in-memory store; data is lost on restart");
            Ok(Arc::new(MemoryStore::new()))
        }
        StoreBackend::Firestore => {
            let project_id = config
                .project_id
                .clone()
                .context("project_id is required for the firestore store")?;

            let (mut firestore_config, tokens) = match &config.store.emulator_host {
                Some(host) => {
                    tracing::info!("Using Firestore emulator at {}", host);
                    (FirestoreConfig::emulator(project_id, host), TokenSource::emulator())
                }
                None => {
                    let tokens = match &config.store.access_token {
                        Some(token) => TokenSource::Static(token.clone()),
                        None => TokenSource::metadata(),
                    };
                    (FirestoreConfig::new(project_id), tokens)
                }
            };
            firestore_config.database_id = config.store.database_id.clone();
            firestore_config.timeout_secs = config.store.timeout_secs;

            let store = FirestoreStore::new(firestore_config, tokens)
                .context("Failed to create Firestore client")?;
            Ok(Arc::new(store))
        }
    }
}

fn build_verifier(config: &Config) -> Result<Arc<dyn AuthVerifier>> {
    match config.auth {
        AuthMode::Gateway => {
            tracing::info!("Trusting gateway user info; the service must only be reachable through the gateway");
            Ok(Arc::new(GatewayVerifier))
        }
        AuthMode::IdToken => {
            let project_id = config
                .project_id
                .clone()
                .context("project_id is required for id_token auth")?;
            match &config.auth_emulator_host {
                Some(host) => {
                    tracing::warn!("Using Auth emulator at {}; ID token signatures are not checked", host);
                    Ok(Arc::new(IdTokenVerifier::emulator(project_id)))
                }
                None => Ok(Arc::new(IdTokenVerifier::new(project_id))),
            }
        }
    }
}
