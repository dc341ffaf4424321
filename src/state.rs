use std::sync::Arc;

use anyhow::Context;

use crate::{
    admin::HitCounter,
    auth::{Credentials, JwtKeys, RevokedToken, TokenService, User},
    chirps::{Chirp, Chirps},
    clock::{Clock, SystemClock},
    config::AppConfig,
    storage::{self, FileStore, StorageError},
};

/// One long-lived store per collection. Everything that touches a collection
/// goes through these handles so each file has exactly one lock.
#[derive(Clone)]
pub struct Stores {
    pub users: FileStore<User>,
    pub chirps: FileStore<Chirp>,
    pub revoked: FileStore<RevokedToken>,
}

impl Stores {
    pub async fn open(config: &AppConfig) -> Result<Self, StorageError> {
        Ok(Self {
            users: FileStore::open(config.users_path()).await?,
            chirps: FileStore::open(config.chirps_path()).await?,
            revoked: FileStore::open(config.revoked_tokens_path()).await?,
        })
    }

    /// Wipe all collections. Only used for the debug bootstrap.
    pub async fn reset(config: &AppConfig) -> Result<(), StorageError> {
        storage::reset(&[
            config.users_path(),
            config.chirps_path(),
            config.revoked_tokens_path(),
        ])
        .await
    }
}

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<AppConfig>,
    pub credentials: Credentials,
    pub tokens: TokenService,
    pub chirps: Chirps,
    pub hits: HitCounter,
}

impl AppState {
    pub async fn init(config: AppConfig) -> anyhow::Result<Self> {
        Self::with_clock(config, Arc::new(SystemClock)).await
    }

    pub async fn with_clock(config: AppConfig, clock: Arc<dyn Clock>) -> anyhow::Result<Self> {
        if config.debug {
            tracing::warn!(data_dir = %config.data_dir.display(), "debug mode: resetting data");
            Stores::reset(&config)
                .await
                .context("reset data stores")?;
        }

        let stores = Stores::open(&config)
            .await
            .context("open data stores")?;

        let credentials = Credentials::new(stores.users.clone())?;
        let keys = JwtKeys::try_from(&config.jwt).context("invalid jwt configuration")?;
        let tokens = TokenService::new(keys, stores.revoked.clone(), clock);
        let chirps = Chirps::new(stores.chirps.clone());

        Ok(Self {
            config: Arc::new(config),
            credentials,
            tokens,
            chirps,
            hits: HitCounter::default(),
        })
    }
}
