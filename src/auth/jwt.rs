use std::sync::Arc;

use axum::extract::FromRef;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use time::Duration;
use tracing::{debug, info, warn};

use crate::{
    auth::{
        claims::{Claims, TokenKind},
        repo_types::RevokedToken,
    },
    clock::Clock,
    config::JwtConfig,
    error::{AppError, AppResult},
    state::AppState,
    storage::FileStore,
};

/// HMAC keys and lifetimes, derived once from the server secret.
#[derive(Clone)]
pub struct JwtKeys {
    pub encoding: EncodingKey,
    pub decoding: DecodingKey,
    pub access_ttl: Duration,
    pub refresh_ttl: Duration,
}

impl TryFrom<&JwtConfig> for JwtKeys {
    type Error = anyhow::Error;

    fn try_from(cfg: &JwtConfig) -> anyhow::Result<Self> {
        cfg.validate()?;
        Ok(Self {
            encoding: EncodingKey::from_secret(cfg.secret.as_bytes()),
            decoding: DecodingKey::from_secret(cfg.secret.as_bytes()),
            access_ttl: Duration::minutes(cfg.ttl_minutes),
            refresh_ttl: Duration::minutes(cfg.refresh_ttl_minutes),
        })
    }
}

impl JwtKeys {
    fn ttl(&self, kind: TokenKind) -> Duration {
        match kind {
            TokenKind::Access => self.access_ttl,
            TokenKind::Refresh => self.refresh_ttl,
        }
    }
}

/// Subject and kind of a token that passed verification.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct VerifiedToken {
    pub user_id: u64,
    pub kind: TokenKind,
}

/// Issues, verifies and revokes access/refresh tokens.
///
/// Tokens move from valid to expired or revoked and never back. Revocation is
/// consulted whenever a refresh token is verified.
#[derive(Clone)]
pub struct TokenService {
    keys: JwtKeys,
    revoked: FileStore<RevokedToken>,
    clock: Arc<dyn Clock>,
}

impl FromRef<AppState> for TokenService {
    fn from_ref(state: &AppState) -> Self {
        state.tokens.clone()
    }
}

impl TokenService {
    pub fn new(keys: JwtKeys, revoked: FileStore<RevokedToken>, clock: Arc<dyn Clock>) -> Self {
        Self {
            keys,
            revoked,
            clock,
        }
    }

    pub fn issue(&self, user_id: u64, kind: TokenKind) -> AppResult<String> {
        let now = self.clock.now();
        let exp = now
            .checked_add(self.keys.ttl(kind))
            .ok_or_else(|| anyhow::anyhow!("{kind} token expiry out of range"))?;
        let claims = Claims {
            iss: kind,
            sub: user_id.to_string(),
            iat: now.unix_timestamp(),
            exp: exp.unix_timestamp(),
            jti: format!("{:032x}", rand::random::<u128>()),
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &self.keys.encoding)
            .map_err(anyhow::Error::from)?;
        debug!(user_id, %kind, "jwt signed");
        Ok(token)
    }

    pub fn issue_access(&self, user_id: u64) -> AppResult<String> {
        self.issue(user_id, TokenKind::Access)
    }

    pub fn issue_refresh(&self, user_id: u64) -> AppResult<String> {
        self.issue(user_id, TokenKind::Refresh)
    }

    /// Check signature and expiry. Does not look at the kind or revocation.
    pub fn verify(&self, token: &str) -> AppResult<VerifiedToken> {
        let mut validation = Validation::new(Algorithm::HS256);
        // expiry is checked against the injected clock below
        validation.validate_exp = false;
        validation.validate_aud = false;
        validation.leeway = 0;

        let data = decode::<Claims>(token, &self.keys.decoding, &validation).map_err(|e| {
            warn!(error = %e, "jwt rejected");
            AppError::InvalidSignature
        })?;
        let claims = data.claims;

        if claims.exp <= self.clock.now().unix_timestamp() {
            warn!(kind = %claims.iss, "jwt expired");
            return Err(AppError::Expired);
        }

        let user_id = claims
            .sub
            .parse::<u64>()
            .map_err(|_| AppError::InvalidSignature)?;

        debug!(user_id, kind = %claims.iss, "jwt verified");
        Ok(VerifiedToken {
            user_id,
            kind: claims.iss,
        })
    }

    /// Verify and require a specific kind; refresh tokens must not be revoked.
    pub async fn verify_kind(&self, token: &str, expected: TokenKind) -> AppResult<u64> {
        let verified = self.verify(token)?;
        if verified.kind != expected {
            warn!(user_id = verified.user_id, got = %verified.kind, %expected, "wrong token kind");
            return Err(AppError::WrongKind);
        }
        if expected == TokenKind::Refresh && self.is_revoked(token).await? {
            warn!(user_id = verified.user_id, "revoked refresh token presented");
            return Err(AppError::Revoked);
        }
        Ok(verified.user_id)
    }

    pub async fn verify_access(&self, token: &str) -> AppResult<u64> {
        self.verify_kind(token, TokenKind::Access).await
    }

    pub async fn verify_refresh(&self, token: &str) -> AppResult<u64> {
        self.verify_kind(token, TokenKind::Refresh).await
    }

    pub async fn is_revoked(&self, token: &str) -> AppResult<bool> {
        let revoked = self.revoked.load().await?;
        Ok(revoked.iter().any(|r| r.token == token))
    }

    /// Record the raw token as revoked. Revoking twice keeps a single record.
    pub async fn revoke(&self, token: &str) -> AppResult<()> {
        let revoked_at = self.clock.now();
        let inserted = self
            .revoked
            .update(|revoked| {
                if revoked.iter().any(|r| r.token == token) {
                    return Ok::<_, AppError>(false);
                }
                revoked.push(RevokedToken {
                    token: token.to_string(),
                    revoked_at,
                });
                Ok(true)
            })
            .await?;
        if inserted {
            info!("refresh token revoked");
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::clock::ManualClock;

    struct Fixture {
        _dir: tempfile::TempDir,
        clock: ManualClock,
        tokens: TokenService,
    }

    async fn fixture(secret: &str) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let revoked = FileStore::open(dir.path().join("revoked_tokens.json"))
            .await
            .unwrap();
        let clock = ManualClock::default();
        let keys = JwtKeys::try_from(&JwtConfig {
            secret: secret.into(),
            ttl_minutes: 60,
            refresh_ttl_minutes: 60 * 24 * 60,
        })
        .unwrap();
        let tokens = TokenService::new(keys, revoked, Arc::new(clock.clone()));
        Fixture {
            _dir: dir,
            clock,
            tokens,
        }
    }

    #[tokio::test]
    async fn issue_then_verify_access() {
        let f = fixture("dev-secret").await;
        let token = f.tokens.issue_access(7).unwrap();

        let verified = f.tokens.verify(&token).unwrap();
        assert_eq!(verified, VerifiedToken { user_id: 7, kind: TokenKind::Access });
        assert_eq!(f.tokens.verify_access(&token).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn access_token_expires_after_one_hour() {
        let f = fixture("dev-secret").await;
        let token = f.tokens.issue_access(1).unwrap();

        f.clock.advance(Duration::minutes(59));
        assert!(f.tokens.verify(&token).is_ok());

        f.clock.advance(Duration::minutes(1));
        assert!(matches!(f.tokens.verify(&token), Err(AppError::Expired)));
    }

    #[tokio::test]
    async fn refresh_token_outlives_access_ttl() {
        let f = fixture("dev-secret").await;
        let token = f.tokens.issue_refresh(3).unwrap();

        f.clock.advance(Duration::days(59));
        assert_eq!(f.tokens.verify_refresh(&token).await.unwrap(), 3);

        f.clock.advance(Duration::days(1));
        assert!(matches!(
            f.tokens.verify_refresh(&token).await,
            Err(AppError::Expired)
        ));
    }

    #[tokio::test]
    async fn kinds_are_not_interchangeable() {
        let f = fixture("dev-secret").await;
        let access = f.tokens.issue_access(1).unwrap();
        let refresh = f.tokens.issue_refresh(1).unwrap();

        assert!(matches!(
            f.tokens.verify_refresh(&access).await,
            Err(AppError::WrongKind)
        ));
        assert!(matches!(
            f.tokens.verify_access(&refresh).await,
            Err(AppError::WrongKind)
        ));
    }

    #[tokio::test]
    async fn tampered_or_foreign_tokens_are_rejected() {
        let f = fixture("dev-secret").await;
        let other = fixture("other-secret").await;

        let foreign = other.tokens.issue_access(1).unwrap();
        assert!(matches!(
            f.tokens.verify(&foreign),
            Err(AppError::InvalidSignature)
        ));

        let mut token = f.tokens.issue_access(1).unwrap();
        token.push('x');
        assert!(matches!(
            f.tokens.verify(&token),
            Err(AppError::InvalidSignature)
        ));

        assert!(matches!(
            f.tokens.verify("not.a.jwt"),
            Err(AppError::InvalidSignature)
        ));
    }

    #[tokio::test]
    async fn revoked_refresh_token_is_rejected_before_expiry() {
        let f = fixture("dev-secret").await;
        let token = f.tokens.issue_refresh(9).unwrap();
        assert_eq!(f.tokens.verify_refresh(&token).await.unwrap(), 9);

        f.tokens.revoke(&token).await.unwrap();
        f.tokens.revoke(&token).await.unwrap();

        assert!(f.tokens.is_revoked(&token).await.unwrap());
        assert!(matches!(
            f.tokens.verify_refresh(&token).await,
            Err(AppError::Revoked)
        ));
        assert_eq!(f.tokens.revoked.load().await.unwrap().len(), 1);
    }

    #[tokio::test]
    async fn reissue_after_revoke_in_same_instant_is_valid() {
        let f = fixture("dev-secret").await;
        let first = f.tokens.issue_refresh(1).unwrap();
        f.tokens.revoke(&first).await.unwrap();

        let second = f.tokens.issue_refresh(1).unwrap();
        assert_ne!(first, second);
        assert_eq!(f.tokens.verify_refresh(&second).await.unwrap(), 1);
        assert!(matches!(
            f.tokens.verify_refresh(&first).await,
            Err(AppError::Revoked)
        ));
    }

    #[test]
    fn out_of_range_ttl_is_rejected_not_panicking() {
        let cfg = JwtConfig {
            secret: "dev-secret".into(),
            ttl_minutes: i64::MAX,
            refresh_ttl_minutes: 60,
        };
        assert!(JwtKeys::try_from(&cfg).is_err());
    }

    #[tokio::test]
    async fn expiry_overflow_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let revoked = FileStore::open(dir.path().join("revoked_tokens.json"))
            .await
            .unwrap();
        let keys = JwtKeys::try_from(&JwtConfig {
            secret: "dev-secret".into(),
            ttl_minutes: 60,
            refresh_ttl_minutes: 60,
        })
        .unwrap();
        let clock = ManualClock::new(time::PrimitiveDateTime::MAX.assume_utc());
        let tokens = TokenService::new(keys, revoked, Arc::new(clock));

        assert!(matches!(tokens.issue_access(1), Err(AppError::Internal(_))));
    }
}
