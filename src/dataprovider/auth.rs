use super::validation::parse_authorized_key;
use super::DataProvider;
use crate::core::error::{ProviderError, ProviderResult};
use crate::models::user::User;
use crate::utils::auth::constant_time_eq;
use argon2::password_hash::{self, PasswordHash, PasswordVerifier};
use argon2::Argon2;
use tracing::{debug, warn};

/// Marker of an argon2id PHC string.
pub const ARGON2_PREFIX: &str = "$argon2id$";

/// Markers of the bcrypt variants we accept.
pub const BCRYPT_PREFIXES: &[&str] = &["$2a$", "$2b$", "$2y$"];

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum PasswordScheme {
    Argon2id,
    Bcrypt,
    Plaintext,
}

impl PasswordScheme {
    fn detect(stored: &str) -> Self {
        if stored.starts_with(ARGON2_PREFIX) {
            Self::Argon2id
        } else if BCRYPT_PREFIXES.iter().any(|p| stored.starts_with(p)) {
            Self::Bcrypt
        } else {
            Self::Plaintext
        }
    }
}

impl DataProvider {
    /// Authenticate `username` with a password.
    ///
    /// The stored value's prefix selects the scheme. Values without a known
    /// prefix are legacy plaintext and only match when
    /// `allow_plaintext_passwords` is enabled.
    pub async fn validate_user_and_password(
        &self,
        username: &str,
        password: &str,
    ) -> ProviderResult<User> {
        if password.is_empty() {
            return Err(ProviderError::InvalidInput(
                "credentials cannot be null or empty".to_string(),
            ));
        }

        let user = self
            .get_user_by_username(username)
            .await
            .inspect_err(|e| log_lookup_failure(username, e))?;

        let scheme = PasswordScheme::detect(&user.password);
        let matched = match scheme {
            PasswordScheme::Argon2id => verify_argon2(password, &user.password)
                .await
                .inspect_err(|e| warn!(username, error = %e, "Error comparing password with argon2 hash"))?,
            PasswordScheme::Bcrypt => verify_bcrypt(password, &user.password).await,
            PasswordScheme::Plaintext if !self.allow_plaintext_passwords => {
                warn!(username, "Stored password has no hash scheme and plaintext passwords are disabled");
                false
            }
            PasswordScheme::Plaintext => {
                !user.password.is_empty()
                    && constant_time_eq(password.as_bytes(), user.password.as_bytes())
            }
        };

        if !matched {
            debug!(username, ?scheme, "Password mismatch");
            return Err(ProviderError::InvalidCredentials);
        }

        Ok(user)
    }

    /// Authenticate `username` with a public key given in SSH wire format.
    pub async fn validate_user_and_public_key(
        &self,
        username: &str,
        public_key: &[u8],
    ) -> ProviderResult<User> {
        if public_key.is_empty() {
            return Err(ProviderError::InvalidInput(
                "credentials cannot be null or empty".to_string(),
            ));
        }

        let user = self
            .get_user_by_username(username)
            .await
            .inspect_err(|e| log_lookup_failure(username, e))?;

        if user.public_key.is_empty() {
            debug!(username, "User has no public key");
            return Err(ProviderError::InvalidCredentials);
        }

        let stored = parse_authorized_key(&user.public_key)
            .and_then(|key| key.to_bytes())
            .map_err(|e| {
                warn!(username, error = %e, "Error parsing stored public key");
                ProviderError::Configuration(format!(
                    "stored public key for user {username} is invalid: {e}"
                ))
            })?;

        if stored != public_key {
            debug!(username, "Public key mismatch");
            return Err(ProviderError::InvalidCredentials);
        }

        Ok(user)
    }
}

fn log_lookup_failure(username: &str, err: &ProviderError) {
    match err {
        ProviderError::NotFound(_) => debug!(username, "Authentication for unknown user"),
        _ => warn!(username, error = %err, "Error authenticating user"),
    }
}

/// A mismatch is `Ok(false)`; anything else the primitive reports is a
/// hashing error.
async fn verify_argon2(password: &str, hash: &str) -> ProviderResult<bool> {
    let password = password.to_string();
    let hash = hash.to_string();

    tokio::task::spawn_blocking(move || {
        let parsed =
            PasswordHash::new(&hash).map_err(|e| ProviderError::Hashing(e.to_string()))?;
        // A PHC string without salt or output parses, but can never verify
        if parsed.salt.is_none() || parsed.hash.is_none() {
            return Err(ProviderError::Hashing(
                "argon2 hash is missing its salt or output".to_string(),
            ));
        }
        match Argon2::default().verify_password(password.as_bytes(), &parsed) {
            Ok(()) => Ok(true),
            Err(password_hash::Error::Password) => Ok(false),
            Err(e) => Err(ProviderError::Hashing(e.to_string())),
        }
    })
    .await
    .map_err(|e| ProviderError::Hashing(format!("task join error: {e}")))?
}

/// Any bcrypt failure, malformed hash included, counts as a mismatch.
async fn verify_bcrypt(password: &str, hash: &str) -> bool {
    let password = password.to_string();
    let hash = hash.to_string();

    let result = tokio::task::spawn_blocking(move || bcrypt::verify(password, &hash)).await;
    match result {
        Ok(Ok(matched)) => matched,
        Ok(Err(e)) => {
            warn!(error = %e, "Error comparing password with bcrypt hash");
            false
        }
        Err(e) => {
            warn!(error = %e, "bcrypt verification task failed");
            false
        }
    }
}
