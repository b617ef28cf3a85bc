use anyhow::{Context, Result};
use config::{Config, Environment, File};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;

/// Main configuration structure for Stagehand
#[derive(Debug, Clone, Default, Deserialize, Serialize)]
#[serde(default)]
pub struct StagehandConfig {
    /// Where the configuration tree is stored
    pub store: StoreConfig,
    /// How agents are reached
    pub agents: AgentRpcConfig,
    /// Polling loop settings
    pub scheduler: SchedulerConfig,
    /// Logging settings
    pub observability: ObservabilityConfig,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct StoreConfig {
    /// Path of the JSON configuration document
    pub path: String,
}

impl Default for StoreConfig {
    fn default() -> Self {
        Self {
            path: ".stagehand/config.json".to_string(),
        }
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct AgentRpcConfig {
    /// Bridge program invoked as `<cmd> <host> <port> <operation> <args...>`
    pub rpc_command: String,
    /// Upper bound for a single agent call
    pub call_timeout_seconds: u64,
}

impl Default for AgentRpcConfig {
    fn default() -> Self {
        Self {
            rpc_command: "stagehand-agent-rpc".to_string(),
            call_timeout_seconds: 300, // updates can take a while
        }
    }
}

impl AgentRpcConfig {
    pub fn call_timeout(&self) -> Duration {
        Duration::from_secs(self.call_timeout_seconds.max(1))
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SchedulerConfig {
    /// Interval between two polls of pending operations
    pub tick_interval_millis: u64,
    /// How long to wait for in-flight operations on shutdown
    pub drain_timeout_seconds: u64,
}

impl Default for SchedulerConfig {
    fn default() -> Self {
        Self {
            tick_interval_millis: 10_000,
            drain_timeout_seconds: 330,
        }
    }
}

impl SchedulerConfig {
    pub fn tick_interval(&self) -> Duration {
        Duration::from_millis(self.tick_interval_millis.max(1))
    }

    pub fn drain_timeout(&self) -> Duration {
        Duration::from_secs(self.drain_timeout_seconds)
    }
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ObservabilityConfig {
    /// Log level, overridden by RUST_LOG
    pub log_level: String,
    /// Emit JSON lines instead of human-readable logs
    pub json_logs: bool,
    /// Log operation counters when the process exits
    pub metrics_enabled: bool,
}

impl Default for ObservabilityConfig {
    fn default() -> Self {
        Self {
            log_level: "info".to_string(),
            json_logs: false,
            metrics_enabled: true,
        }
    }
}

impl StagehandConfig {
    /// Load configuration from multiple sources with precedence:
    /// 1. Default values
    /// 2. Configuration files (stagehand.toml, .stagehand-rc)
    /// 3. Environment variables (prefixed with STAGEHAND_, nested keys joined by __)
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new("."))
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        let mut builder = Config::builder();

        let main_file = dir.join("stagehand.toml");
        if main_file.exists() {
            builder = builder.add_source(File::from(main_file));
        }

        let rc_file = dir.join(".stagehand-rc");
        if rc_file.exists() {
            builder = builder.add_source(File::from(rc_file).format(config::FileFormat::Toml));
        }

        builder = builder.add_source(
            Environment::with_prefix("STAGEHAND")
                .prefix_separator("_")
                .separator("__")
                .try_parsing(true),
        );

        let config = builder.build().context("Failed to assemble configuration")?;
        let stagehand_config: StagehandConfig = config
            .try_deserialize()
            .context("Failed to parse configuration")?;

        Ok(stagehand_config)
    }

    /// Save configuration to file
    pub fn save_to_file<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let toml_content = toml::to_string_pretty(self)?;
        std::fs::write(path, toml_content)?;
        Ok(())
    }

    /// Load .env file if it exists
    pub fn load_env_file() -> Result<()> {
        if Path::new(".env").exists() {
            dotenvy::dotenv()?;
            tracing::info!("Loaded environment variables from .env file");
        }
        Ok(())
    }
}

/// Global configuration instance
static CONFIG: std::sync::LazyLock<Result<StagehandConfig, anyhow::Error>> =
    std::sync::LazyLock::new(|| {
        // Load .env file first
        let _ = StagehandConfig::load_env_file();
        StagehandConfig::load()
    });

/// Get the global configuration
pub fn config() -> Result<&'static StagehandConfig> {
    CONFIG
        .as_ref()
        .map_err(|e| anyhow::anyhow!("Failed to load configuration: {}", e))
}

/// Initialize configuration (called at startup)
pub fn init_config() -> Result<()> {
    let _config = config()?;
    tracing::info!("Configuration loaded successfully");
    Ok(())
}
