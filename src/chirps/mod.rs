pub mod dto;
pub mod filter;
pub mod handlers;
pub mod repo;

pub use dto::Chirp;
pub use repo::{Chirps, MAX_CHIRP_LEN};

use crate::state::AppState;
use axum::Router;

pub fn router() -> Router<AppState> {
    handlers::chirp_routes()
}
