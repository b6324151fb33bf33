use serde::Deserialize;
use std::fmt;
use std::path::Path;
use std::time::Duration;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("failed to read config file: {0}")]
    Io(#[from] std::io::Error),
    #[error("failed to parse config: {0}")]
    Parse(#[from] toml::de::Error),
    #[error("missing required env var: {0}")]
    MissingEnv(String),
    #[error("invalid {field}: {reason}")]
    Invalid { field: &'static str, reason: String },
}

#[derive(Debug, Clone, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub chain: ChainConfig,
    #[serde(default)]
    pub reaction: ReactionConfig,
    #[serde(default)]
    pub logging: LoggingConfig,
}

#[derive(Clone, Deserialize)]
pub struct ChainConfig {
    /// JSON-RPC endpoint (http(s):// polls, ws(s):// subscribes) - env RPC_URL
    #[serde(default)]
    pub rpc_url: String,
    /// Hex private key of the burning account - env PRIVATE_KEY
    #[serde(default)]
    pub private_key: String,
    /// Token contract emitting Mint and accepting burn - env CONTRACT_ADDRESS
    #[serde(default)]
    pub contract_address: String,
    /// Confirmations to wait for before a burn counts as confirmed.
    #[serde(default = "default_confirmations")]
    pub required_confirmations: u64,
    /// Filter poll interval for HTTP endpoints, in milliseconds.
    #[serde(default = "default_poll_interval_ms")]
    pub poll_interval_ms: u64,
}

#[derive(Debug, Clone, Deserialize)]
pub struct ReactionConfig {
    /// Delay between observing a Mint and firing the burn trigger.
    #[serde(default = "default_delay_secs")]
    pub delay_secs: u64,
    #[serde(default)]
    pub trigger_policy: TriggerPolicy,
}

/// What a firing trigger acts on.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TriggerPolicy {
    /// Act on whatever reaction is pending when the trigger fires.
    #[default]
    ActOnLatest,
    /// A trigger whose reaction was overwritten is cancelled; each reaction
    /// fires on its own timer.
    Supersede,
}

#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    #[serde(default = "default_log_level")]
    pub level: String,
    #[serde(default)]
    pub json: bool,
}

fn default_confirmations() -> u64 {
    1
}
fn default_poll_interval_ms() -> u64 {
    4000
}
fn default_delay_secs() -> u64 {
    60
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for ChainConfig {
    fn default() -> Self {
        Self {
            rpc_url: String::new(),
            private_key: String::new(),
            contract_address: String::new(),
            required_confirmations: default_confirmations(),
            poll_interval_ms: default_poll_interval_ms(),
        }
    }
}

impl Default for ReactionConfig {
    fn default() -> Self {
        Self {
            delay_secs: default_delay_secs(),
            trigger_policy: TriggerPolicy::default(),
        }
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: default_log_level(),
            json: false,
        }
    }
}

// Keeps the signing key out of logs and panic messages.
impl fmt::Debug for ChainConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ChainConfig")
            .field("rpc_url", &self.rpc_url)
            .field("private_key", &"<redacted>")
            .field("contract_address", &self.contract_address)
            .field("required_confirmations", &self.required_confirmations)
            .field("poll_interval_ms", &self.poll_interval_ms)
            .finish()
    }
}

impl ChainConfig {
    pub fn poll_interval(&self) -> Duration {
        Duration::from_millis(self.poll_interval_ms)
    }
}

impl ReactionConfig {
    pub fn delay(&self) -> Duration {
        Duration::from_secs(self.delay_secs)
    }
}

impl Config {
    /// Load config from a TOML file, then overlay environment variables for secrets.
    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let contents = std::fs::read_to_string(path)?;
        let mut config = Self::parse(&contents)?;
        config.apply_env();
        config.validate()?;
        Ok(config)
    }

    /// Build config from the environment alone (no file needed).
    pub fn from_env() -> Result<Self, ConfigError> {
        let config = Config {
            chain: ChainConfig {
                rpc_url: require_env("RPC_URL")?,
                private_key: require_env("PRIVATE_KEY")?,
                contract_address: require_env("CONTRACT_ADDRESS")?,
                ..ChainConfig::default()
            },
            reaction: ReactionConfig::default(),
            logging: LoggingConfig::default(),
        };
        config.validate()?;
        Ok(config)
    }

    pub fn parse(contents: &str) -> Result<Self, ConfigError> {
        Ok(toml::from_str(contents)?)
    }

    // Secrets and endpoints from the environment always win over the file.
    fn apply_env(&mut self) {
        if let Ok(url) = std::env::var("RPC_URL") {
            self.chain.rpc_url = url;
        }
        if let Ok(key) = std::env::var("PRIVATE_KEY") {
            self.chain.private_key = key;
        }
        if let Ok(address) = std::env::var("CONTRACT_ADDRESS") {
            self.chain.contract_address = address;
        }
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        let required = [
            ("chain.rpc_url", &self.chain.rpc_url),
            ("chain.private_key", &self.chain.private_key),
            ("chain.contract_address", &self.chain.contract_address),
        ];
        for (field, value) in required {
            if value.trim().is_empty() {
                return Err(ConfigError::Invalid {
                    field,
                    reason: "must not be empty".to_string(),
                });
            }
        }
        if self.chain.required_confirmations == 0 {
            return Err(ConfigError::Invalid {
                field: "chain.required_confirmations",
                reason: "must be at least 1".to_string(),
            });
        }
        if self.reaction.delay_secs == 0 {
            return Err(ConfigError::Invalid {
                field: "reaction.delay_secs",
                reason: "must be at least 1 second".to_string(),
            });
        }
        Ok(())
    }
}

fn require_env(name: &str) -> Result<String, ConfigError> {
    std::env::var(name).map_err(|_| ConfigError::MissingEnv(name.to_string()))
}
