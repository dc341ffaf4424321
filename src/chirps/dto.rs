use serde::{Deserialize, Serialize};

/// Stored chirp. Immutable once created.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Chirp {
    pub id: u64,
    pub body: String,
}

#[derive(Debug, Deserialize)]
pub struct CreateChirpRequest {
    pub body: String,
}
