use anyhow::Context;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Shipped configuration, written out on first run
pub const DEFAULT_CONFIG: &str = include_str!("default.yaml");

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    pub listening: String,
    pub redis: RedisConfig,
    #[serde(default)]
    pub client_ip: ClientIpConfig,
    #[serde(default)]
    pub callback: CallbackConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RedisConfig {
    pub addr: String,
    #[serde(default)]
    pub password: String,
    #[serde(default)]
    pub db: i64,
    /// Key namespace. Normalized to end in ':' when the key namer is built.
    #[serde(default)]
    pub prefix: String,
    #[serde(default = "RedisConfig::default_connect_retries")]
    pub connect_retries: u32,
    #[serde(default = "RedisConfig::default_retry_delay_secs")]
    pub retry_delay_secs: u64,
    #[serde(default = "RedisConfig::default_response_timeout_ms")]
    pub response_timeout_ms: u64,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TrustedProxyMode {
    /// Use the socket peer address only
    #[default]
    None,
    /// Forwarded, X-Forwarded-For, X-Real-IP
    Standard,
    /// CF-Connecting-IP
    Cloudflare,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ClientIpConfig {
    #[serde(default)]
    pub trusted_proxy_mode: TrustedProxyMode,
    /// Number of reverse proxies in front of the service (X-Forwarded-For hops to skip)
    #[serde(default)]
    pub num_trusted_proxies: Option<usize>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CallbackConfig {
    #[serde(default = "CallbackConfig::default_strict")]
    pub strict: bool,
}

impl RedisConfig {
    const fn default_connect_retries() -> u32 {
        3
    }

    const fn default_retry_delay_secs() -> u64 {
        5
    }

    const fn default_response_timeout_ms() -> u64 {
        1000
    }
}

impl CallbackConfig {
    const fn default_strict() -> bool {
        true
    }
}

impl Default for CallbackConfig {
    fn default() -> Self {
        Self {
            strict: Self::default_strict(),
        }
    }
}

/// Result of [`Config::load`]
#[derive(Debug)]
pub enum LoadOutcome {
    Loaded(Config),
    /// No file existed, so the default one was written to this path
    Bootstrapped(PathBuf),
}

impl Config {
    /// Load the YAML file at `path`, overlaid with `TALLY__*` environment variables.
    ///
    /// When the file is missing the embedded default is written there instead and
    /// `LoadOutcome::Bootstrapped` is returned so the caller can stop and let the
    /// operator edit it.
    pub fn load(path: &Path) -> anyhow::Result<LoadOutcome> {
        dotenvy::dotenv().ok();

        if !path.exists() {
            std::fs::write(path, DEFAULT_CONFIG)
                .with_context(|| format!("failed to write default config to {}", path.display()))?;
            return Ok(LoadOutcome::Bootstrapped(path.to_path_buf()));
        }

        let config = config::Config::builder()
            .add_source(config::File::from(path).format(config::FileFormat::Yaml))
            .add_source(
                config::Environment::with_prefix("TALLY")
                    .prefix_separator("__")
                    .separator("__")
                    .try_parsing(true),
            )
            .build()
            .with_context(|| format!("failed to read config from {}", path.display()))?
            .try_deserialize::<Config>()
            .context("invalid configuration")?;

        Ok(LoadOutcome::Loaded(config))
    }

    /// Parse configuration from YAML text, without environment overrides
    pub fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        config::Config::builder()
            .add_source(config::File::from_str(text, config::FileFormat::Yaml))
            .build()?
            .try_deserialize::<Config>()
            .context("invalid configuration")
    }
}
