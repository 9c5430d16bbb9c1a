//! Relay configuration loaded from environment variables.
//!
//! # Environment Variables
//!
//! ## Required
//! - `SHOPIFY_STORE` - Shopify store domain (e.g., your-store.myshopify.com, or
//!   just `your-store`)
//! - `SHOPIFY_ADMIN_API_TOKEN` - Admin API access token
//! - `AIRTABLE_API_KEY` - Airtable personal access token
//! - `AIRTABLE_BASE_ID` - Airtable base holding the submissions table
//! - `AIRTABLE_TABLE_ID` - Airtable table receiving one row per submission
//!
//! ## Optional
//! - `RELAY_HOST` - Bind address (default: 127.0.0.1)
//! - `RELAY_PORT` - Listen port (default: 8888)
//! - `ALLOWED_ORIGINS` - Comma-separated hosts allowed to post the form
//! - `ORIGIN_POLICY` - `strict` (default) or `permissive`
//! - `SHOPIFY_API_VERSION` - Admin API version (default: 2024-07)
//! - `SHOPIFY_DRAFT_ORDER_TAGS` - Tags put on created draft orders
//! - `AIRTABLE_API_URL` - Airtable API root (default: <https://api.airtable.com/v0>)
//! - `UPSTREAM_TIMEOUT_SECS` - Deadline for each outbound call (default: 10)
//! - `SENTRY_DSN` - Sentry error tracking DSN
//! - `SENTRY_ENVIRONMENT` - Sentry environment name

use std::collections::HashMap;
use std::net::{IpAddr, SocketAddr};
use std::str::FromStr;
use std::time::Duration;

use secrecy::SecretString;
use thiserror::Error;
use url::Url;

const MIN_ENTROPY_BITS_PER_CHAR: f64 = 3.3;
const DEFAULT_SHOPIFY_API_VERSION: &str = "2024-07";
const DEFAULT_DRAFT_ORDER_TAGS: &str = "form-submission";
const DEFAULT_AIRTABLE_API_URL: &str = "https://api.airtable.com/v0";
const DEFAULT_UPSTREAM_TIMEOUT_SECS: &str = "10";

/// Blocklist of common placeholder patterns (case-insensitive)
const PLACEHOLDER_PATTERNS: &[&str] = &[
    "your-",
    "changeme",
    "replace",
    "placeholder",
    "example",
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

/// Relay application configuration.
#[derive(Debug, Clone)]
pub struct RelayConfig {
    /// IP address to bind the server to
    pub host: IpAddr,
    /// Port to listen on
    pub port: u16,
    /// Browser origin policy for the intake endpoint
    pub cors: CorsConfig,
    /// Shopify Admin API configuration
    pub shopify: ShopifyConfig,
    /// Airtable API configuration
    pub airtable: AirtableConfig,
    /// Deadline applied to every outbound HTTP call
    pub upstream_timeout: Duration,
    /// Sentry DSN for error tracking
    pub sentry_dsn: Option<String>,
    /// Sentry environment name
    pub sentry_environment: Option<String>,
}

/// What to do with a form post from an origin that is not allowed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum OriginPolicy {
    /// Reject with 403 before reading the body.
    #[default]
    Strict,
    /// Process the request but omit `Access-Control-Allow-Origin`.
    Permissive,
}

impl FromStr for OriginPolicy {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "strict" => Ok(Self::Strict),
            "permissive" => Ok(Self::Permissive),
            other => Err(format!("expected 'strict' or 'permissive', got '{other}'")),
        }
    }
}

/// Allowed browser origins for the intake endpoint.
#[derive(Debug, Clone, Default)]
pub struct CorsConfig {
    /// Serialized origins, e.g. `https://shop.example.com`
    pub allowed_origins: Vec<String>,
    /// Handling of origins not in the list
    pub policy: OriginPolicy,
}

impl CorsConfig {
    /// Returns `true` if `origin` exactly matches an allowed origin.
    #[must_use]
    pub fn allows(&self, origin: &str) -> bool {
        self.allowed_origins.iter().any(|allowed| allowed == origin)
    }
}

/// Shopify Admin API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct ShopifyConfig {
    /// Shopify store domain (e.g., your-store.myshopify.com)
    pub store: String,
    /// Shopify API version (e.g., 2024-07)
    pub api_version: String,
    /// Admin API access token
    pub access_token: SecretString,
    /// Comma-separated tags applied to created draft orders
    pub draft_order_tags: String,
}

impl std::fmt::Debug for ShopifyConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ShopifyConfig")
            .field("store", &self.store)
            .field("api_version", &self.api_version)
            .field("access_token", &"[REDACTED]")
            .field("draft_order_tags", &self.draft_order_tags)
            .finish()
    }
}

impl ShopifyConfig {
    /// Base URL of the REST Admin API for this store and version.
    #[must_use]
    pub fn admin_api_url(&self) -> String {
        format!("https://{}/admin/api/{}", self.store, self.api_version)
    }
}

/// Airtable API configuration.
///
/// Implements `Debug` manually to redact secret fields.
#[derive(Clone)]
pub struct AirtableConfig {
    /// API root, without trailing slash
    pub api_url: String,
    /// Personal access token
    pub api_key: SecretString,
    /// Base ID (app...)
    pub base_id: String,
    /// Table ID or name (tbl...)
    pub table_id: String,
}

impl std::fmt::Debug for AirtableConfig {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AirtableConfig")
            .field("api_url", &self.api_url)
            .field("api_key", &"[REDACTED]")
            .field("base_id", &self.base_id)
            .field("table_id", &self.table_id)
            .finish()
    }
}

impl AirtableConfig {
    /// Endpoint that accepts new records for the configured table.
    #[must_use]
    pub fn table_url(&self) -> String {
        format!("{}/{}/{}", self.api_url, self.base_id, self.table_id)
    }
}

impl RelayConfig {
    /// Load configuration from environment variables.
    ///
    /// Calls `dotenvy::dotenv()` to load from `.env` file if present.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError` if required variables are missing, invalid, or
    /// if secrets fail validation (placeholder detection, entropy check).
    pub fn from_env() -> Result<Self, ConfigError> {
        // Load .env file if present (ignore errors if not found)
        let _ = dotenvy::dotenv();

        let host = get_env_or_default("RELAY_HOST", "127.0.0.1")
            .parse::<IpAddr>()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_HOST".to_string(), e.to_string()))?;
        let port = get_env_or_default("RELAY_PORT", "8888")
            .parse::<u16>()
            .map_err(|e| ConfigError::InvalidEnvVar("RELAY_PORT".to_string(), e.to_string()))?;

        let cors = CorsConfig::from_env()?;
        let shopify = ShopifyConfig::from_env()?;
        let airtable = AirtableConfig::from_env()?;
        let upstream_timeout = parse_timeout(&get_env_or_default(
            "UPSTREAM_TIMEOUT_SECS",
            DEFAULT_UPSTREAM_TIMEOUT_SECS,
        ))?;

        Ok(Self {
            host,
            port,
            cors,
            shopify,
            airtable,
            upstream_timeout,
            sentry_dsn: get_optional_env("SENTRY_DSN"),
            sentry_environment: get_optional_env("SENTRY_ENVIRONMENT"),
        })
    }

    /// Returns the socket address for binding the server.
    #[must_use]
    pub const fn socket_addr(&self) -> SocketAddr {
        SocketAddr::new(self.host, self.port)
    }
}

impl CorsConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let allowed_origins = parse_allowed_origins(&get_env_or_default("ALLOWED_ORIGINS", ""))?;
        let policy = get_env_or_default("ORIGIN_POLICY", "strict")
            .parse::<OriginPolicy>()
            .map_err(|e| ConfigError::InvalidEnvVar("ORIGIN_POLICY".to_string(), e))?;

        if allowed_origins.is_empty() {
            tracing::warn!("ALLOWED_ORIGINS is empty, no browser origin will be permitted");
        }

        Ok(Self {
            allowed_origins,
            policy,
        })
    }
}

impl ShopifyConfig {
    fn from_env() -> Result<Self, ConfigError> {
        Ok(Self {
            store: normalize_store_domain(&get_required_env("SHOPIFY_STORE")?)?,
            api_version: get_env_or_default("SHOPIFY_API_VERSION", DEFAULT_SHOPIFY_API_VERSION),
            access_token: get_validated_secret("SHOPIFY_ADMIN_API_TOKEN")?,
            draft_order_tags: get_env_or_default(
                "SHOPIFY_DRAFT_ORDER_TAGS",
                DEFAULT_DRAFT_ORDER_TAGS,
            ),
        })
    }
}

impl AirtableConfig {
    fn from_env() -> Result<Self, ConfigError> {
        let api_url = get_env_or_default("AIRTABLE_API_URL", DEFAULT_AIRTABLE_API_URL);
        Url::parse(&api_url)
            .map_err(|e| ConfigError::InvalidEnvVar("AIRTABLE_API_URL".to_string(), e.to_string()))?;

        Ok(Self {
            api_url: api_url.trim_end_matches('/').to_string(),
            api_key: get_validated_secret("AIRTABLE_API_KEY")?,
            base_id: get_required_env("AIRTABLE_BASE_ID")?,
            table_id: get_required_env("AIRTABLE_TABLE_ID")?,
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

/// Get an optional environment variable.
fn get_optional_env(key: &str) -> Option<String> {
    std::env::var(key).ok().filter(|v| !v.trim().is_empty())
}

/// Get an environment variable with a default value.
fn get_env_or_default(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.to_string())
}

/// Parse the `ALLOWED_ORIGINS` host list into serialized origins.
///
/// Entries without a scheme are assumed to be HTTPS hosts.
fn parse_allowed_origins(raw: &str) -> Result<Vec<String>, ConfigError> {
    raw.split(',')
        .map(str::trim)
        .filter(|entry| !entry.is_empty())
        .map(|entry| {
            let candidate = if entry.contains("://") {
                entry.to_string()
            } else {
                format!("https://{entry}")
            };
            let invalid = |reason: String| {
                ConfigError::InvalidEnvVar("ALLOWED_ORIGINS".to_string(), reason)
            };
            let url = Url::parse(&candidate).map_err(|e| invalid(format!("{entry}: {e}")))?;
            let origin = url.origin();
            if !origin.is_tuple() {
                return Err(invalid(format!("{entry}: not a web origin")));
            }
            Ok(origin.ascii_serialization())
        })
        .collect()
}

/// Accept either a bare shop name or a full domain.
fn normalize_store_domain(raw: &str) -> Result<String, ConfigError> {
    let store = raw
        .trim()
        .trim_start_matches("https://")
        .trim_end_matches('/');

    if store.is_empty() || store.contains('/') {
        return Err(ConfigError::InvalidEnvVar(
            "SHOPIFY_STORE".to_string(),
            format!("expected a store domain, got '{raw}'"),
        ));
    }

    if store.contains('.') {
        Ok(store.to_string())
    } else {
        Ok(format!("{store}.myshopify.com"))
    }
}

fn parse_timeout(raw: &str) -> Result<Duration, ConfigError> {
    match raw.trim().parse::<u64>() {
        Ok(secs) if secs > 0 => Ok(Duration::from_secs(secs)),
        Ok(_) => Err(ConfigError::InvalidEnvVar(
            "UPSTREAM_TIMEOUT_SECS".to_string(),
            "must be greater than zero".to_string(),
        )),
        Err(e) => Err(ConfigError::InvalidEnvVar(
            "UPSTREAM_TIMEOUT_SECS".to_string(),
            e.to_string(),
        )),
    }
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

    // API tokens are random; low entropy means someone typed a dummy value
    let entropy = shannon_entropy(secret);
    if entropy < MIN_ENTROPY_BITS_PER_CHAR {
        return Err(ConfigError::InsecureSecret(
            var_name.to_string(),
            format!(
                "entropy too low ({entropy:.2} bits/char, need >= {MIN_ENTROPY_BITS_PER_CHAR:.1})."
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
