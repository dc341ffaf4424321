use serde::{Deserialize, Serialize};
use time::OffsetDateTime;

/// User record as persisted in the users collection.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct User {
    pub id: u64,
    pub email: String,
    pub password_hash: String, // Argon2 PHC string, never sent to clients
}

/// Refresh token that must no longer be accepted.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct RevokedToken {
    pub token: String,
    #[serde(with = "time::serde::rfc3339")]
    pub revoked_at: OffsetDateTime,
}
