use crate::state::AppState;
use axum::Router;

pub mod claims;
pub mod dto;
pub mod extractors;
pub mod handlers;
pub mod jwt;
mod password;
pub mod repo;
pub mod repo_types;

pub use claims::TokenKind;
pub use extractors::AuthUser;
pub use jwt::{JwtKeys, TokenService, VerifiedToken};
pub use repo::Credentials;
pub use repo_types::{RevokedToken, User};

pub fn router() -> Router<AppState> {
    Router::new()
        .merge(handlers::user_routes())
        .merge(handlers::token_routes())
}
