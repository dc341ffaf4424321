//! Micro-blog API: users, short messages ("chirps") and JWT sessions, persisted
//! as flat JSON files.

pub mod admin;
pub mod app;
pub mod auth;
pub mod chirps;
pub mod clock;
pub mod config;
pub mod error;
pub mod extract;
pub mod state;
pub mod storage;

pub use config::AppConfig;
pub use error::{AppError, AppResult};
pub use state::AppState;
