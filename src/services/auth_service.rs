//! Account registration, password hashing and access tokens.

use std::time::{Duration, SystemTime};

use argon2::{
    Argon2,
    password_hash::{PasswordHash, PasswordHasher, PasswordVerifier, SaltString},
};
use jsonwebtoken::{
    Algorithm, DecodingKey, EncodingKey, Header, Validation, decode, encode,
    get_current_timestamp,
};
use rand::Rng;
use serde::{Deserialize, Serialize};
use tracing::{info, warn};

use crate::{
    config::AppConfig,
    dao::{
        models::{RecordKind, UserEntity},
        storage::StorageError,
    },
    dto::auth::{LoginForm, RegisterRequest, TokenResponse, UserSummary},
    error::ServiceError,
    state::SharedState,
};

const INVALID_CREDENTIALS: &str = "invalid credentials";

/// Claims carried by an access token.
#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    /// User id, as a string.
    pub sub: String,
    /// Expiry, seconds since the Unix epoch.
    pub exp: u64,
    /// Issue time, seconds since the Unix epoch.
    pub iat: u64,
}

/// Signing material derived from the configuration.
pub struct TokenKeys {
    encoding: EncodingKey,
    decoding: DecodingKey,
    algorithm: Algorithm,
    ttl: Duration,
}

impl TokenKeys {
    /// Derive HMAC keys, algorithm and token lifetime from the configuration.
    pub fn from_config(config: &AppConfig) -> Self {
        let secret = config.secret_key.as_bytes();
        Self {
            encoding: EncodingKey::from_secret(secret),
            decoding: DecodingKey::from_secret(secret),
            algorithm: config.algorithm,
            ttl: config.access_token_ttl,
        }
    }

    /// Sign a token whose subject is `user_id`.
    pub fn create_access_token(&self, user_id: i64) -> Result<String, ServiceError> {
        let iat = get_current_timestamp();
        let claims = Claims {
            sub: user_id.to_string(),
            exp: iat.saturating_add(self.ttl.as_secs()),
            iat,
        };
        encode(&Header::new(self.algorithm), &claims, &self.encoding).map_err(|err| {
            warn!(error = %err, "failed to sign access token");
            ServiceError::Internal("failed to issue token".into())
        })
    }

    /// Verify signature and expiry, returning the user id from `sub`.
    pub fn decode_access_token(&self, token: &str) -> Result<i64, ServiceError> {
        let validation = Validation::new(self.algorithm);
        let data = decode::<Claims>(token, &self.decoding, &validation)
            .map_err(|_| ServiceError::Unauthorized(INVALID_CREDENTIALS.into()))?;
        data.claims
            .sub
            .parse::<i64>()
            .map_err(|_| ServiceError::Unauthorized(INVALID_CREDENTIALS.into()))
    }
}

/// Hash a password with Argon2id and a random salt, returning the PHC string.
pub fn hash_password(password: &str) -> Result<String, ServiceError> {
    let mut salt_bytes = [0u8; 16];
    rand::rng().fill(&mut salt_bytes);
    let salt = SaltString::encode_b64(&salt_bytes)
        .map_err(|err| ServiceError::Internal(format!("encode salt: {err}")))?;

    Argon2::default()
        .hash_password(password.as_bytes(), &salt)
        .map(|hash| hash.to_string())
        .map_err(|err| ServiceError::Internal(format!("hash password: {err}")))
}

/// Check `password` against a stored PHC string. Unparseable hashes never match.
pub fn verify_password(password: &str, hash: &str) -> bool {
    let Ok(parsed) = PasswordHash::new(hash) else {
        return false;
    };
    Argon2::default()
        .verify_password(password.as_bytes(), &parsed)
        .is_ok()
}

async fn run_blocking<T, F>(work: F) -> Result<T, ServiceError>
where
    F: FnOnce() -> Result<T, ServiceError> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(work)
        .await
        .map_err(|err| ServiceError::Internal(format!("hashing task failed: {err}")))?
}

fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

/// Create an account. The e-mail is stored lowercased and must be unused.
pub async fn register(
    state: &SharedState,
    request: RegisterRequest,
) -> Result<UserSummary, ServiceError> {
    let store = state.require_med_store().await?;
    let email = normalize_email(&request.email);

    if store.find_user_by_email(email.clone()).await?.is_some() {
        return Err(ServiceError::InvalidInput("email already registered".into()));
    }

    let password = request.password;
    let password_hash = run_blocking(move || hash_password(&password)).await?;

    let user = UserEntity {
        id: store.next_id(RecordKind::Users).await?,
        name: request.name.trim().to_owned(),
        email,
        password_hash,
        created_at: SystemTime::now(),
    };

    match store.create_user(user.clone()).await {
        Ok(()) => {}
        Err(StorageError::Duplicate { .. }) => {
            return Err(ServiceError::InvalidInput("email already registered".into()));
        }
        Err(err) => return Err(err.into()),
    }

    info!(user_id = user.id, "registered user");
    Ok(user.into())
}

/// Exchange e-mail and password for a bearer token.
pub async fn login(state: &SharedState, form: LoginForm) -> Result<TokenResponse, ServiceError> {
    let store = state.require_med_store().await?;
    let Some(user) = store.find_user_by_email(normalize_email(&form.username)).await? else {
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    };

    let password = form.password;
    let hash = user.password_hash.clone();
    let matches = run_blocking(move || Ok(verify_password(&password, &hash))).await?;
    if !matches {
        warn!(user_id = user.id, "rejected login with wrong password");
        return Err(ServiceError::Unauthorized(INVALID_CREDENTIALS.into()));
    }

    let token = state.tokens().create_access_token(user.id)?;
    info!(user_id = user.id, "issued access token");
    Ok(TokenResponse::bearer(token))
}

/// All accounts, without password hashes.
pub async fn list_users(state: &SharedState) -> Result<Vec<UserSummary>, ServiceError> {
    let store = state.require_med_store().await?;
    let users = store.list_users().await?;
    Ok(users.into_iter().map(UserSummary::from).collect())
}

/// Resolve a bearer token to its user. Unknown users are rejected like bad tokens.
pub async fn current_user(state: &SharedState, token: &str) -> Result<UserEntity, ServiceError> {
    let user_id = state.tokens().decode_access_token(token)?;
    let store = state.require_med_store().await?;
    store
        .find_user(user_id)
        .await?
        .ok_or_else(|| ServiceError::Unauthorized(INVALID_CREDENTIALS.into()))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(algorithm: Algorithm, ttl: Duration) -> TokenKeys {
        let config = AppConfig {
            secret_key: "test-secret".into(),
            algorithm,
            access_token_ttl: ttl,
            ..AppConfig::default()
        };
        TokenKeys::from_config(&config)
    }

    #[test]
    fn test_password_hash_roundtrip() {
        let hash = hash_password("correct horse").unwrap();
        assert!(hash.starts_with("$argon2id$"));
        assert!(verify_password("correct horse", &hash));
        assert!(!verify_password("wrong horse", &hash));
        assert!(!verify_password("correct horse", "not-a-hash"));
    }

    #[test]
    fn test_salts_differ() {
        assert_ne!(hash_password("same").unwrap(), hash_password("same").unwrap());
    }

    #[test]
    fn test_token_carries_user_id() {
        let keys = keys(Algorithm::HS384, Duration::from_secs(600));
        let token = keys.create_access_token(42).unwrap();
        assert_eq!(keys.decode_access_token(&token).unwrap(), 42);
    }

    #[test]
    fn test_token_rejected_with_other_secret() {
        let issuer = keys(Algorithm::HS256, Duration::from_secs(600));
        let token = issuer.create_access_token(1).unwrap();

        let other = TokenKeys::from_config(&AppConfig {
            secret_key: "another-secret".into(),
            ..AppConfig::default()
        });
        assert!(matches!(
            other.decode_access_token(&token),
            Err(ServiceError::Unauthorized(_))
        ));
    }

    #[test]
    fn test_expired_token_rejected() {
        let keys = keys(Algorithm::HS256, Duration::ZERO);
        let now = get_current_timestamp();
        let claims = Claims {
            sub: "7".into(),
            exp: now - 3600,
            iat: now - 7200,
        };
        let token = encode(&Header::new(Algorithm::HS256), &claims, &keys.encoding).unwrap();
        assert!(keys.decode_access_token(&token).is_err());
        assert!(keys.decode_access_token("garbage").is_err());
    }
}
