//! Storefront configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Local storage
//! - `VOGUE_DATA_DIR` - Directory holding the per-device key-value files (default: .vogue)
//! - `VOGUE_STORAGE_QUOTA_BYTES` - Byte quota across all stored keys (default: 5 MiB)
//!
//! ## Firestore (optional; offline mode when `FIRESTORE_PROJECT_ID` is unset)
//! - `FIRESTORE_PROJECT_ID` - Google Cloud project ID
//! - `FIRESTORE_API_KEY` - Web API key (required when a project is set)
//! - `FIRESTORE_DATABASE` - Database ID (default: (default))
//! - `VOGUE_ID_TOKEN` - ID token of the signed-in user, sent as a bearer token
//!
//! ## Signed-in identity (handed over by the identity provider)
//! - `VOGUE_USER_ID` - User ID
//! - `VOGUE_USER_EMAIL` - Email address
//! - `VOGUE_USER_NAME` - Display name
//!
//! ## Other
//! - `VOGUE_CHECKOUT_DELAY_MS` - Simulated payment delay (default: 2500)
//! - `VOGUE_CATALOG_CACHE_TTL_SECS` - Product list cache lifetime (default: 300)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use thiserror::Error;

use crate::profile::AuthenticatedUser;

const DEFAULT_STORAGE_QUOTA_BYTES: u64 = 5 * 1024 * 1024;
const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
    "secret",
    "password",
    "xxx",
    "todo",
    "fixme",
    "insert",
    "enter-",
    "put-your",
    "add-your",
];

/// Configuration errors that can occur during loading.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Missing environment variable: {0}")]
    MissingEnvVar(String),
    #[error("Invalid environment variable {0}: {1}")]
    InvalidEnvVar(String, String),
    #[error("Insecure secret in {0}: {1}")]
    InsecureSecret(String, String),
}

/// Storefront configuration.
#[derive(Debug, Clone)]
pub struct StorefrontConfig {
    /// Directory for the per-device key-value files
    pub data_dir: PathBuf,
    /// Byte quota across all stored keys
    pub storage_quota_bytes: u64,
    /// Simulated payment gateway delay
    pub checkout_delay: Duration,
    /// Product list cache lifetime
    pub catalog_cache_ttl: Duration,
    /// Firestore connection, if configured
    pub firestore: Option<FirestoreConfig>,
    /// Signed-in user, if any
    pub user: Option<UserConfig>,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// Firestore REST API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct FirestoreConfig {
    /// Google Cloud project ID
    pub project_id: String,
    /// Database ID
    pub database: String,
    /// Web API key
    pub api_key: SecretString,
    /// ID token of the signed-in user
    pub id_token: Option<SecretString>,
}

impl std::fmt::Debug for FirestoreConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FirestoreConfig")
            .field("project_id", &self.project_id)
            .field("database", &self.database)
            .field("api_key", &"[REDACTED]")
            .field("id_token", &self.id_token.as_ref().map(|_| "[REDACTED]"))
            .finish()
    }
}

/// Identity of the signed-in user.
#[derive(Debug, Clone)]
pub struct UserConfig {
    pub id: String,
    pub email: Option<String>,
    pub display_name: Option<String>,
}

impl UserConfig {
    /// Convert to the identity type used by profile sync.
    #[must_use]
    pub fn to_user(&self) -> AuthenticatedUser {
        AuthenticatedUser {
            id: self.id.clone().into(),
            email: self.email.clone(),
            display_name: self.display_name.clone(),
            photo_url: None,
        }
    }
}

impl StorefrontConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if a variable is invalid, or if Firestore is
    /// configured with a missing or insecure API key.
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let data_dir = PathBuf::from(get_env_or_default("VOGUE_DATA_DIR", ".vogue"));
        let storage_quota_bytes = get_parsed_or_default(
            "VOGUE_STORAGE_QUOTA_BYTES",
            DEFAULT_STORAGE_QUOTA_BYTES,
        )?;
        let checkout_delay =
            Duration::from_millis(get_parsed_or_default("VOGUE_CHECKOUT_DELAY_MS", 2500)?);
        let catalog_cache_ttl =
            Duration::from_secs(get_parsed_or_default("VOGUE_CATALOG_CACHE_TTL_SECS", 300)?);

        let firestore = FirestoreConfig::from_env()?;
        let user = UserConfig::from_env();

        Ok(Self {
            data_dir,
            storage_quota_bytes,
            checkout_delay,
            catalog_cache_ttl,
            firestore,
            user,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }
}

impl FirestoreConfig {
    fn from_env() -> Result<Option<Self>, ConfigError> {
        let Some(project_id) = get_optional_env("FIRESTORE_PROJECT_ID") else {
            return Ok(None);
        };
        Ok(Some(Self {
            project_id,
            database: get_env_or_default("FIRESTORE_DATABASE", "(default)"),
            api_key: get_validated_secret("FIRESTORE_API_KEY")?,
            id_token: get_optional_env("VOGUE_ID_TOKEN").map(SecretString::from),
        }))
    }

    /// Bearer token value, if a user token is configured.
    #[must_use]
    pub fn bearer(&self) -> Option<&str> {
        self.id_token.as_ref().map(ExposeSecret::expose_secret)
    }
}

impl UserConfig {
    fn from_env() -> Option<Self> {
        Some(Self {
            id: get_optional_env("VOGUE_USER_ID")?,
            email: get_optional_env("VOGUE_USER_EMAIL"),
            display_name: get_optional_env("VOGUE_USER_NAME"),
        })
    }
}

// =============================================================================
// Helper Functions
// =============================================================================

/// Get a required environment variable.
fn get_required_env(key: &str) -> Result<String, ConfigError> {
    std::env::var(key).map_err(|_| ConfigError::MissingEnvVar(key.to_string()))
}

/// Get an optional environment variable. Empty values count as unset.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|value| !value.is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse an environment variable, falling back to a default when unset.
fn get_parsed_or_default<T>(key: &str, default: T) -> Result<T, ConfigError>
where
    T: FromStr,
    T::Err: std::fmt::Display,
{
    get_optional_env(key).map_or(Ok(default), |raw| {
        raw.trim()
            .parse()
            .map_err(|e: T::Err| ConfigError::InvalidEnvVar(key.to_string(), e.to_string()))
    })
}

/// Calculate Shannon entropy in bits per character.
fn shannon_entropy(s: &str) -> f64 {
    if s.is_empty() {
        return 0.0;
    }

    let mut freq: HashMap<char, usize> = HashMap::new();
    for c in s.chars() {
        *freq.entry(c).or_insert(0) += 1;
    }

    #[allow(clippy::cast_precision_loss)] // String length will never exceed f64 precision
    let len = s.len() as f64;
    freq.values()
        .map(|&count| {
            #[allow(clippy::cast_precision_loss)] // Character count will never exceed f64 precision
            let p = count as f64 / len;
            -p * p.log2()
        })
        .sum()
}

/// Validate that a secret is not a placeholder and has sufficient entropy.
fn validate_secret_strength(secret: &str, var_name: &str) -> Result<(), ConfigError> {
    let lower = secret.to_lowercase();

    for pattern in PLACEHOLDER_PATTERNS {
        if lower.contains(pattern) {
            return Err(ConfigError::InsecureSecret(
                var_name.to_string(),
                format!("appears to be a placeholder (contains '{pattern}')"),
            ));
        }
    }

    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1}). Use the key issued by the Firebase console."
            ),
        ));
    }

    Ok(())
}

/// Load and validate a secret from environment.
fn get_validated_secret(key: &str) -> Result<SecretString, ConfigError> {
    let value = get_required_env(key)?;
    validate_secret_strength(&value, key)?;
    Ok(SecretString::from(value))
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;

    #[test]
    fn test_shannon_entropy_empty() {
        assert!((shannon_entropy("") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_single_char() {
        assert!((shannon_entropy("aaaaaaa") - 0.0).abs() < f64::EPSILON);
    }

    #[test]
    fn test_shannon_entropy_two_chars() {
        let entropy = shannon_entropy("ab");
        assert!((entropy - 1.0).abs() < 0.01);
    }

    #[test]
    fn test_validate_secret_strength_placeholder() {
        let result = validate_secret_strength("your-api-key-here", "TEST_VAR");
        assert!(matches!(result.unwrap_err(), ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_low_entropy() {
        let result = validate_secret_strength("aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa", "TEST_VAR");
        assert!(matches!(result.unwrap_err(), ConfigError::InsecureSecret(_, _)));
    }

    #[test]
    fn test_validate_secret_strength_api_key_shape() {
        let result = validate_secret_strength("AIzaSyD4f9kQ2xL7mN3pR8tV1wB6cE0hJ5gU", "TEST_VAR");
        assert!(result.is_ok());
    }

    #[test]
    fn test_firestore_config_debug_redacts_secrets() {
        let config = FirestoreConfig {
            project_id: "vogue-store".to_string(),
            database: "(default)".to_string(),
            api_key: SecretString::from("AIzaSyD4f9kQ2xL7mN3pR8tV1wB6cE0hJ5gU"),
            id_token: Some(SecretString::from("eyJhbGciOiJSUzI1NiJ9.payload")),
        };

        let debug_output = format!("{config:?}");

        assert!(debug_output.contains("vogue-store"));
        assert!(debug_output.contains("[REDACTED]"));
        assert!(!debug_output.contains("AIzaSy"));
        assert!(!debug_output.contains("eyJhbGci"));
    }

    #[test]
    fn test_user_config_to_user() {
        let user = UserConfig {
            id: "uid-42".to_string(),
            email: Some("shopper@vogue.example".to_string()),
            display_name: None,
        }
        .to_user();
        assert_eq!(user.id.as_str(), "uid-42");
        assert_eq!(user.email.as_deref(), Some("shopper@vogue.example"));
    }
}
