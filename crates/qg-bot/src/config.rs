//! Application configuration.

use std::path::Path;
use std::time::Duration;

use qg_core::{Asset, LedgerAsset, LedgerPair, OrderConstraints, TradingPair};
use qg_filter::SubmitMode;
use qg_gateway::{Credentials, EgressRoute, GatewayConfig, RetryPolicy};
use qg_venue::{ExchangeOptions, VenueKind, WithdrawKeys};
use rust_decimal::Decimal;
use serde::Deserialize;
use tracing::warn;

use crate::error::{AppError, AppResult};

/// Default config file location.
pub const DEFAULT_CONFIG_PATH: &str = "config/default.toml";

/// Environment variable naming the config file.
pub const CONFIG_ENV_VAR: &str = "QG_CONFIG";

/// Main application configuration.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct AppConfig {
    #[serde(default)]
    pub venue: VenueConfig,
    #[serde(default)]
    pub gateway: GatewaySettings,
    #[serde(default)]
    pub egress: EgressConfig,
    #[serde(default)]
    pub filter: FilterConfig,
    /// Constraint overrides layered on top of the venue's built-in table.
    #[serde(default)]
    pub precision: Vec<PrecisionOverride>,
}

/// Venue connector selection.
#[derive(Debug, Clone, Deserialize)]
pub struct VenueConfig {
    #[serde(default = "default_venue_kind")]
    pub kind: String,
    /// Venue API root; the connector default when unset.
    #[serde(default)]
    pub base_url: Option<String>,
    /// Validate orders without placing them.
    #[serde(default)]
    pub simulated: bool,
    #[serde(default)]
    pub delimiter: Option<String>,
    #[serde(default)]
    pub credentials: Vec<CredentialConfig>,
    #[serde(default)]
    pub withdraw_keys: Vec<WithdrawKeyConfig>,
}

/// Withdrawal key the venue registered for one destination address.
#[derive(Debug, Clone, Deserialize)]
pub struct WithdrawKeyConfig {
    pub asset: String,
    pub address: String,
    pub key: String,
}

fn default_venue_kind() -> String {
    "p2pb2b".to_string()
}

impl Default for VenueConfig {
    fn default() -> Self {
        Self {
            kind: default_venue_kind(),
            base_url: None,
            simulated: false,
            delimiter: None,
            credentials: Vec::new(),
            withdraw_keys: Vec::new(),
        }
    }
}

/// One API key pair, given inline or through environment variables.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct CredentialConfig {
    #[serde(default)]
    pub key: Option<String>,
    #[serde(default)]
    pub secret: Option<String>,
    #[serde(default)]
    pub key_env: Option<String>,
    #[serde(default)]
    pub secret_env: Option<String>,
}

impl CredentialConfig {
    /// Resolve to signing credentials. Inline values win over env vars.
    pub fn resolve(&self) -> AppResult<Credentials> {
        let key = resolve_value("key", self.key.as_deref(), self.key_env.as_deref())?;
        let secret = resolve_value("secret", self.secret.as_deref(), self.secret_env.as_deref())?;
        Ok(Credentials::new(key, secret))
    }
}

fn resolve_value(field: &str, inline: Option<&str>, env_var: Option<&str>) -> AppResult<String> {
    if let Some(value) = inline.filter(|v| !v.is_empty()) {
        return Ok(value.to_string());
    }
    match env_var {
        Some(var) => std::env::var(var)
            .ok()
            .filter(|v| !v.is_empty())
            .ok_or_else(|| AppError::Config(format!("credential {field}: {var} is not set"))),
        None => Err(AppError::Config(format!(
            "credential {field} needs a value or an env var"
        ))),
    }
}

/// Retry, deadline and HTTP timeout settings for the gateway.
#[derive(Debug, Clone, Deserialize)]
pub struct GatewaySettings {
    #[serde(default = "default_max_attempts")]
    pub max_attempts: u32,
    #[serde(default = "default_initial_backoff_ms")]
    pub initial_backoff_ms: u64,
    #[serde(default = "default_backoff_growth")]
    pub backoff_growth: f64,
    #[serde(default = "default_deadline_ms")]
    pub deadline_ms: u64,
    #[serde(default = "default_request_timeout_ms")]
    pub request_timeout_ms: u64,
}

fn default_max_attempts() -> u32 {
    4
}

fn default_initial_backoff_ms() -> u64 {
    5_000
}

fn default_backoff_growth() -> f64 {
    1.5
}

fn default_deadline_ms() -> u64 {
    60_000
}

fn default_request_timeout_ms() -> u64 {
    10_000
}

impl Default for GatewaySettings {
    fn default() -> Self {
        Self {
            max_attempts: default_max_attempts(),
            initial_backoff_ms: default_initial_backoff_ms(),
            backoff_growth: default_backoff_growth(),
            deadline_ms: default_deadline_ms(),
            request_timeout_ms: default_request_timeout_ms(),
        }
    }
}

impl GatewaySettings {
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy {
            max_attempts: self.max_attempts,
            initial_backoff: Duration::from_millis(self.initial_backoff_ms),
            growth: self.backoff_growth,
        }
    }

    pub fn deadline(&self) -> Duration {
        Duration::from_millis(self.deadline_ms)
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_millis(self.request_timeout_ms)
    }

    pub fn gateway_config(&self, base_url: impl Into<String>) -> GatewayConfig {
        GatewayConfig::new(base_url)
            .with_retry(self.retry_policy())
            .with_deadline(self.deadline())
    }
}

/// Egress routes and the command that recycles their tunnels.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct EgressConfig {
    /// Recycle program; routes are treated as static when unset.
    #[serde(default)]
    pub command: Option<String>,
    #[serde(default)]
    pub args: Vec<String>,
    /// Directory identity files are resolved against.
    #[serde(default)]
    pub workdir: Option<String>,
    #[serde(default)]
    pub routes: Vec<EgressRoute>,
}

/// Submit filter settings.
#[derive(Debug, Clone, Deserialize)]
pub struct FilterConfig {
    #[serde(default)]
    pub submit_mode: SubmitMode,
    /// Venue pair as `BASE/QUOTE`.
    #[serde(default = "default_pair")]
    pub pair: String,
    #[serde(default = "default_base_asset")]
    pub base_asset: LedgerAsset,
    #[serde(default)]
    pub quote_asset: Option<LedgerAsset>,
    #[serde(default = "default_book_depth")]
    pub book_depth: usize,
}

fn default_pair() -> String {
    "XLM/BTC".to_string()
}

fn default_base_asset() -> LedgerAsset {
    LedgerAsset::Native
}

fn default_book_depth() -> usize {
    qg_filter::maker_mode::DEFAULT_BOOK_DEPTH
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            submit_mode: SubmitMode::default(),
            pair: default_pair(),
            base_asset: default_base_asset(),
            quote_asset: None,
            book_depth: default_book_depth(),
        }
    }
}

impl FilterConfig {
    pub fn trading_pair(&self) -> AppResult<TradingPair> {
        Ok(TradingPair::from_market(&self.pair, "/")?)
    }

    pub fn ledger_pair(&self) -> AppResult<LedgerPair> {
        let quote = self
            .quote_asset
            .clone()
            .ok_or_else(|| AppError::Config("filter.quote_asset is required".to_string()))?;
        Ok(LedgerPair::new(self.base_asset.clone(), quote))
    }
}

/// Constraint override for one pair.
#[derive(Debug, Clone, Deserialize)]
pub struct PrecisionOverride {
    /// Pair as `BASE/QUOTE`.
    pub pair: String,
    pub price_precision: u32,
    pub volume_precision: u32,
    pub min_base_volume: Decimal,
}

impl AppConfig {
    /// Load configuration from a TOML file.
    pub fn from_file(path: &str) -> AppResult<Self> {
        let content = std::fs::read_to_string(path)
            .map_err(|e| AppError::Config(format!("Failed to read config: {e}")))?;

        toml::from_str(&content)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {e}")))
    }

    /// Load from `path`, falling back to defaults when the default file is
    /// absent. An explicitly named file must exist.
    pub fn load(path: Option<String>) -> AppResult<Self> {
        let explicit = path.or_else(|| std::env::var(CONFIG_ENV_VAR).ok());
        match explicit {
            Some(path) => Self::from_file(&path),
            None if Path::new(DEFAULT_CONFIG_PATH).exists() => {
                Self::from_file(DEFAULT_CONFIG_PATH)
            }
            None => {
                warn!(
                    path = DEFAULT_CONFIG_PATH,
                    "Config file not found, using defaults"
                );
                Ok(Self::default())
            }
        }
    }

    /// Check cross-field constraints that serde cannot express.
    pub fn validate(&self) -> AppResult<()> {
        self.venue_kind()?;
        self.filter.trading_pair()?;

        if self.gateway.max_attempts == 0 {
            return Err(AppError::Config(
                "gateway.max_attempts must be at least 1".to_string(),
            ));
        }
        let growth = self.gateway.backoff_growth;
        if !growth.is_finite() || growth < 1.0 {
            return Err(AppError::Config(
                "gateway.backoff_growth must be >= 1.0".to_string(),
            ));
        }
        if self.gateway.deadline_ms == 0 {
            return Err(AppError::Config(
                "gateway.deadline_ms must be positive".to_string(),
            ));
        }
        if self.filter.book_depth == 0 {
            return Err(AppError::Config(
                "filter.book_depth must be positive".to_string(),
            ));
        }
        if self.filter.submit_mode == SubmitMode::MakerOnly {
            self.filter.ledger_pair()?;
        }
        for o in &self.precision {
            TradingPair::from_market(&o.pair, "/")?;
        }
        Ok(())
    }

    pub fn venue_kind(&self) -> AppResult<VenueKind> {
        Ok(self.venue.kind.parse::<VenueKind>()?)
    }

    pub fn base_url(&self) -> AppResult<String> {
        match &self.venue.base_url {
            Some(url) => Ok(url.clone()),
            None => Ok(self.venue_kind()?.default_base_url().to_string()),
        }
    }

    pub fn credentials(&self) -> AppResult<Vec<Credentials>> {
        self.venue
            .credentials
            .iter()
            .map(CredentialConfig::resolve)
            .collect()
    }

    pub fn exchange_options(&self) -> AppResult<ExchangeOptions> {
        let precision_overrides = self
            .precision
            .iter()
            .map(|o| {
                Ok((
                    TradingPair::from_market(&o.pair, "/")?,
                    OrderConstraints::new(o.price_precision, o.volume_precision, o.min_base_volume),
                ))
            })
            .collect::<AppResult<Vec<_>>>()?;

        let mut withdraw_keys = WithdrawKeys::default();
        for k in &self.venue.withdraw_keys {
            withdraw_keys.insert(Asset::new(k.asset.as_str()), k.address.as_str(), k.key.as_str());
        }

        Ok(ExchangeOptions {
            simulated: self.venue.simulated,
            delimiter: self.venue.delimiter.clone(),
            precision_overrides,
            withdraw_keys,
        })
    }
}

#[cfg(test)]
mod tests {
    use rust_decimal_macros::dec;
    use tokio_test::{assert_err, assert_ok};

    use super::*;

    const SAMPLE: &str = r#"
[venue]
kind = "p2pb2b"
simulated = true

[[venue.credentials]]
key = "key-a"
secret = "secret-a"

[[venue.credentials]]
key = "key-b"
secret = "secret-b"

[[venue.withdraw_keys]]
asset = "XLM"
address = "GDEST"
key = "cold-wallet"

[gateway]
max_attempts = 3
initial_backoff_ms = 250
deadline_ms = 20000

[egress]
command = "/usr/local/bin/recycle-tunnel"
args = ["--quiet"]
workdir = "/etc/tunnels"

[[egress.routes]]
name = "frankfurt"
port = 8081
identity = "fra.conf"

[[egress.routes]]
name = "tokyo"
port = 8082

[filter]
submit_mode = "maker_only"
pair = "XLM/BTC"
book_depth = 20
base_asset = { type = "native" }
quote_asset = { type = "credit", code = "BTC", issuer = "GISSUER" }

[[precision]]
pair = "XLM/BTC"
price_precision = 7
volume_precision = 1
min_base_volume = "50"
"#;

    #[test]
    fn test_default_config() {
        let config = AppConfig::default();
        assert_eq!(config.venue.kind, "p2pb2b");
        assert_eq!(config.gateway.max_attempts, 4);
        assert_eq!(config.gateway.initial_backoff_ms, 5_000);
        assert_eq!(config.gateway.deadline_ms, 60_000);
        assert_eq!(config.filter.submit_mode, SubmitMode::Both);
        assert_eq!(config.filter.book_depth, 50);
        assert!(config.egress.routes.is_empty());
        config.validate().unwrap();
    }

    #[test]
    fn test_parse_full_config() {
        let config: AppConfig = toml::from_str(SAMPLE).unwrap();
        assert_ok!(config.validate());

        assert!(config.venue.simulated);
        assert_eq!(config.credentials().unwrap().len(), 2);
        assert_eq!(config.gateway.max_attempts, 3);
        assert_eq!(config.gateway.backoff_growth, 1.5);
        assert_eq!(
            config.gateway.retry_policy().initial_backoff,
            Duration::from_millis(250)
        );
        assert_eq!(config.egress.routes.len(), 2);
        assert_eq!(config.egress.routes[1].identity, "");
        assert_eq!(config.filter.submit_mode, SubmitMode::MakerOnly);
        assert_eq!(
            config.filter.ledger_pair().unwrap().quote,
            LedgerAsset::credit("BTC", "GISSUER")
        );
        assert_eq!(
            config.base_url().unwrap(),
            qg_venue::p2b::DEFAULT_BASE_URL
        );

        let options = config.exchange_options().unwrap();
        assert_eq!(options.precision_overrides.len(), 1);
        assert_eq!(options.precision_overrides[0].1.min_base_volume, dec!(50));
        assert_eq!(
            options.withdraw_keys.key(&Asset::new("XLM"), "GDEST").unwrap(),
            "cold-wallet"
        );
    }

    #[test]
    fn test_partial_gateway_section_keeps_defaults() {
        let config: AppConfig = toml::from_str("[gateway]\nmax_attempts = 1\n").unwrap();
        assert_eq!(config.gateway.max_attempts, 1);
        assert_eq!(config.gateway.request_timeout_ms, 10_000);
        assert_eq!(config.gateway.backoff_growth, 1.5);
    }

    #[test]
    fn test_validate_rejects_bad_values() {
        let mut config = AppConfig::default();
        config.gateway.max_attempts = 0;
        assert_err!(config.validate());

        let mut config = AppConfig::default();
        config.gateway.backoff_growth = 0.5;
        assert_err!(config.validate());

        let mut config = AppConfig::default();
        config.venue.kind = "nowhere".to_string();
        assert_err!(config.validate());

        // maker mode needs a quote asset
        let mut config = AppConfig::default();
        config.filter.submit_mode = SubmitMode::MakerOnly;
        assert_err!(config.validate());

        let mut config = AppConfig::default();
        config.filter.pair = "XLMBTC".to_string();
        assert_err!(config.validate());
    }

    #[test]
    fn test_credentials_from_env() {
        std::env::set_var("QG_TEST_CRED_KEY", "env-key");
        std::env::set_var("QG_TEST_CRED_SECRET", "env-secret");
        let cred = CredentialConfig {
            key_env: Some("QG_TEST_CRED_KEY".to_string()),
            secret_env: Some("QG_TEST_CRED_SECRET".to_string()),
            ..Default::default()
        };
        assert_eq!(cred.resolve().unwrap().key(), "env-key");

        let missing = CredentialConfig {
            key: Some("inline".to_string()),
            secret_env: Some("QG_TEST_CRED_UNSET".to_string()),
            ..Default::default()
        };
        assert_err!(missing.resolve());
    }

    #[test]
    fn test_from_file_missing() {
        let err = AppConfig::from_file("/nonexistent/quoteguard.toml").unwrap_err();
        assert!(err.to_string().contains("Failed to read config"));
    }
}
