use tracing::{debug, info, warn};

use crate::{
    chirps::{dto::Chirp, filter::clean_body},
    error::{AppError, AppResult},
    storage::FileStore,
};

pub const MAX_CHIRP_LEN: usize = 140;

/// Append-only chirp collection.
#[derive(Clone)]
pub struct Chirps {
    store: FileStore<Chirp>,
}

impl Chirps {
    pub fn new(store: FileStore<Chirp>) -> Self {
        Self { store }
    }

    pub async fn post(&self, raw_body: &str) -> AppResult<Chirp> {
        let len = raw_body.chars().count();
        if len > MAX_CHIRP_LEN {
            warn!(len, "chirp too long");
            return Err(AppError::TooLong);
        }
        let body = clean_body(raw_body);

        let chirp = self
            .store
            .update(|chirps| {
                let chirp = Chirp {
                    id: chirps.len() as u64 + 1,
                    body,
                };
                chirps.push(chirp.clone());
                Ok::<_, AppError>(chirp)
            })
            .await?;

        info!(chirp_id = chirp.id, "chirp created");
        Ok(chirp)
    }

    pub async fn get(&self, id: u64) -> AppResult<Chirp> {
        let chirps = self.store.load().await?;
        chirps.into_iter().find(|c| c.id == id).ok_or_else(|| {
            debug!(chirp_id = id, "chirp not found");
            AppError::NotFound
        })
    }

    /// All chirps in storage order, which is ascending id order.
    pub async fn list(&self) -> AppResult<Vec<Chirp>> {
        Ok(self.store.load().await?)
    }
}
