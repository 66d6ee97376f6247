//! Configuration — YAML config + env var overrides.

use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::Duration;

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};

use crate::delay::{DelayBoundary, DelayStrategy, UniformDelay};
use crate::error::TurnResult;
use crate::store::{FileStateStore, MemoryStateStore, StateStore};

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum StoreKind {
    #[default]
    Memory,
    File,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Completion delay is drawn from [1, max_delay_seconds)
    #[serde(default = "default_max_delay")]
    pub max_delay_seconds: u64,

    /// Seconds between "typing" notifications / flag polls
    #[serde(default = "default_poll_interval")]
    pub poll_interval_seconds: u64,

    /// Give up on a stalled completion after this long (null = never)
    #[serde(default = "default_max_wait")]
    pub max_wait_seconds: Option<u64>,

    /// What to do when max_delay_seconds leaves an empty range
    #[serde(default)]
    pub delay_boundary: DelayBoundary,

    /// "memory" | "file"
    #[serde(default)]
    pub store: StoreKind,

    /// Directory for the file store (relative paths resolve against the config dir)
    #[serde(default = "default_state_dir")]
    pub state_dir: String,

    /// Resolved project root (set at load time, not serialized from YAML)
    #[serde(skip)]
    pub project_root: PathBuf,
}

fn default_max_delay() -> u64 {
    30
}
fn default_poll_interval() -> u64 {
    5
}
fn default_max_wait() -> Option<u64> {
    Some(300)
}
fn default_state_dir() -> String {
    "state".into()
}

/// Timing knobs handed to every turn's workers.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TurnSettings {
    pub poll_interval: Duration,
    pub max_wait: Option<Duration>,
}

impl Config {
    /// Load config from a YAML file with env var overrides.
    pub fn load(config_path: &Path) -> Result<Self> {
        let content = std::fs::read_to_string(config_path)
            .with_context(|| format!("Failed to read config: {}", config_path.display()))?;

        let mut config: Config =
            serde_yaml::from_str(&content).context("Failed to parse config.yaml")?;

        config.project_root = config_path
            .parent()
            .unwrap_or(Path::new("."))
            .to_path_buf()
            .canonicalize()
            .unwrap_or_else(|_| {
                config_path
                    .parent()
                    .unwrap_or(Path::new("."))
                    .to_path_buf()
            });

        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    /// Load config from the default location (project_root/config.yaml)
    pub fn load_from_dir(project_root: &Path) -> Result<Self> {
        Self::load(&project_root.join("config.yaml"))
    }

    /// Like `load_from_dir`, but a missing config.yaml means defaults (env
    /// overrides still apply). A present but broken file is still an error.
    pub fn load_or_default(project_root: &Path) -> Result<Self> {
        let config_path = project_root.join("config.yaml");
        if config_path.is_file() {
            return Self::load(&config_path);
        }
        let mut config = Config {
            project_root: project_root.to_path_buf(),
            ..Config::default()
        };
        config.apply_env()?;
        config.validate()?;
        Ok(config)
    }

    fn apply_env(&mut self) -> Result<()> {
        if let Ok(v) = std::env::var("HOURGLASS_MAX_DELAY") {
            self.max_delay_seconds = v.parse().context("HOURGLASS_MAX_DELAY must be an integer")?;
        }
        if let Ok(v) = std::env::var("HOURGLASS_POLL_INTERVAL") {
            self.poll_interval_seconds =
                v.parse().context("HOURGLASS_POLL_INTERVAL must be an integer")?;
        }
        if let Ok(v) = std::env::var("HOURGLASS_MAX_WAIT") {
            let secs: u64 = v.parse().context("HOURGLASS_MAX_WAIT must be an integer")?;
            // 0 means "wait forever"
            self.max_wait_seconds = (secs > 0).then_some(secs);
        }
        if let Ok(v) = std::env::var("HOURGLASS_STORE") {
            self.store = match v.as_str() {
                "memory" => StoreKind::Memory,
                "file" => StoreKind::File,
                other => anyhow::bail!("HOURGLASS_STORE must be 'memory' or 'file', got '{}'", other),
            };
        }
        if let Ok(dir) = std::env::var("HOURGLASS_STATE_DIR") {
            self.state_dir = dir;
        }
        Ok(())
    }

    fn validate(&self) -> Result<()> {
        if self.poll_interval_seconds == 0 {
            anyhow::bail!("poll_interval_seconds must be at least 1");
        }
        self.delay_strategy()
            .context("max_delay_seconds leaves no valid completion delay")?;
        Ok(())
    }

    pub fn turn_settings(&self) -> TurnSettings {
        TurnSettings {
            poll_interval: Duration::from_secs(self.poll_interval_seconds),
            max_wait: self.max_wait_seconds.map(Duration::from_secs),
        }
    }

    pub fn delay_strategy(&self) -> TurnResult<Arc<dyn DelayStrategy>> {
        let delay = UniformDelay::new(self.max_delay_seconds, self.delay_boundary)?;
        Ok(Arc::new(delay))
    }

    /// Resolve the file store directory
    pub fn resolve_state_dir(&self) -> PathBuf {
        let p = Path::new(&self.state_dir);
        if p.is_absolute() {
            p.to_path_buf()
        } else {
            self.project_root.join(p)
        }
    }

    /// Build the configured state store.
    pub fn open_store(&self) -> Result<Arc<dyn StateStore>> {
        match self.store {
            StoreKind::Memory => Ok(Arc::new(MemoryStateStore::new())),
            StoreKind::File => {
                let dir = self.resolve_state_dir();
                let store = FileStateStore::open(&dir)
                    .with_context(|| format!("Failed to open state dir: {}", dir.display()))?;
                Ok(Arc::new(store))
            }
        }
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_delay_seconds: default_max_delay(),
            poll_interval_seconds: default_poll_interval(),
            max_wait_seconds: default_max_wait(),
            delay_boundary: DelayBoundary::default(),
            store: StoreKind::default(),
            state_dir: default_state_dir(),
            project_root: PathBuf::new(),
        }
    }
}
