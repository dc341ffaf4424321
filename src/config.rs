use std::path::PathBuf;

use anyhow::Context;
use serde::Deserialize;

use crate::storage::{CHIRPS_FILE, REVOKED_TOKENS_FILE, USERS_FILE};

/// Upper bound for token lifetimes: ten years.
pub const MAX_TTL_MINUTES: i64 = 60 * 24 * 365 * 10;

#[derive(Debug, Clone, Deserialize)]
pub struct JwtConfig {
    pub secret: String,
    pub ttl_minutes: i64,
    pub refresh_ttl_minutes: i64,
}

impl JwtConfig {
    pub fn validate(&self) -> anyhow::Result<()> {
        anyhow::ensure!(!self.secret.is_empty(), "JWT_SECRET must not be empty");
        for (name, ttl) in [
            ("access", self.ttl_minutes),
            ("refresh", self.refresh_ttl_minutes),
        ] {
            anyhow::ensure!(
                (1..=MAX_TTL_MINUTES).contains(&ttl),
                "{name} token ttl must be between 1 and {MAX_TTL_MINUTES} minutes, got {ttl}"
            );
        }
        Ok(())
    }
}

#[derive(Debug, Clone, Deserialize)]
pub struct AppConfig {
    pub host: String,
    pub port: u16,
    pub data_dir: PathBuf,
    pub static_dir: PathBuf,
    pub jwt: JwtConfig,
    pub debug: bool,
}

impl AppConfig {
    pub fn from_env() -> anyhow::Result<Self> {
        let jwt = JwtConfig {
            secret: std::env::var("JWT_SECRET").context("JWT_SECRET must be set")?,
            ttl_minutes: parse_minutes(
                "JWT_ACCESS_TTL_MINUTES",
                std::env::var("JWT_ACCESS_TTL_MINUTES").ok(),
                60,
            )?,
            refresh_ttl_minutes: parse_minutes(
                "JWT_REFRESH_TTL_MINUTES",
                std::env::var("JWT_REFRESH_TTL_MINUTES").ok(),
                60 * 24 * 60,
            )?,
        };
        jwt.validate()?;

        let debug = std::env::var("DEBUG")
            .map(|v| v == "1" || v.eq_ignore_ascii_case("true"))
            .unwrap_or(false)
            || std::env::args().any(|a| a == "--debug");

        Ok(Self {
            host: std::env::var("APP_HOST").unwrap_or_else(|_| "0.0.0.0".into()),
            port: std::env::var("APP_PORT")
                .unwrap_or_else(|_| "8080".into())
                .parse()
                .context("APP_PORT must be a port number")?,
            data_dir: std::env::var("DATA_DIR")
                .unwrap_or_else(|_| "./data".into())
                .into(),
            static_dir: std::env::var("STATIC_DIR")
                .unwrap_or_else(|_| ".".into())
                .into(),
            jwt,
            debug,
        })
    }

    pub fn users_path(&self) -> PathBuf {
        self.data_dir.join(USERS_FILE)
    }

    pub fn chirps_path(&self) -> PathBuf {
        self.data_dir.join(CHIRPS_FILE)
    }

    pub fn revoked_tokens_path(&self) -> PathBuf {
        self.data_dir.join(REVOKED_TOKENS_FILE)
    }
}

fn parse_minutes(key: &str, raw: Option<String>, default: i64) -> anyhow::Result<i64> {
    match raw {
        None => Ok(default),
        Some(v) => v
            .trim()
            .parse::<i64>()
            .with_context(|| format!("{key} must be a whole number of minutes, got {v:?}")),
    }
}
