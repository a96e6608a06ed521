//! Poll configuration
//!
//! [`PollConfig`] is what a wait runs with. [`PollSettings`] and
//! [`PollProfiles`] are its file form: second-granular fields with defaults,
//! plus named per-operation overrides loaded from YAML.

use crate::error::{ConfigError, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use std::time::Duration;

/// Environment variable pointing at a poll profile file
pub const CONFIG_PATH_ENV: &str = "OPWAIT_CONFIG_PATH";

pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(10 * 60);
pub const DEFAULT_INTERVAL: Duration = Duration::from_secs(30);

/// Runtime configuration of a single wait
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PollConfig {
    /// Upper bound on the whole wait, initial delay included
    pub timeout: Duration,
    /// Pause between two probes
    pub interval: Duration,
    /// Pause before the first probe; `None` means `interval`
    pub delay: Option<Duration>,
    /// Consecutive success classifications needed before completing
    pub required_consecutive_successes: u32,
    /// Treat a not-found probe as completion (delete waits)
    pub not_found_is_success: bool,
}

impl Default for PollConfig {
    fn default() -> Self {
        Self {
            timeout: DEFAULT_TIMEOUT,
            interval: DEFAULT_INTERVAL,
            delay: None,
            required_consecutive_successes: 1,
            not_found_is_success: false,
        }
    }
}

impl PollConfig {
    pub fn new(timeout: Duration) -> Self {
        Self {
            timeout,
            ..Self::default()
        }
    }

    pub fn with_interval(mut self, interval: Duration) -> Self {
        self.interval = interval;
        self
    }

    pub fn with_delay(mut self, delay: Duration) -> Self {
        self.delay = Some(delay);
        self
    }

    pub fn stabilize(mut self, required_consecutive_successes: u32) -> Self {
        self.required_consecutive_successes = required_consecutive_successes;
        self
    }

    pub fn not_found_is_success(mut self) -> Self {
        self.not_found_is_success = true;
        self
    }

    pub fn first_delay(&self) -> Duration {
        self.delay.unwrap_or(self.interval)
    }

    pub fn validate(&self) -> Result<()> {
        if self.timeout.is_zero() {
            return Err(ConfigError::ZeroTimeout);
        }
        if self.required_consecutive_successes == 0 {
            return Err(ConfigError::ZeroStabilization);
        }
        Ok(())
    }
}

/// File form of [`PollConfig`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollSettings {
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_interval_secs")]
    pub interval_secs: u64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub delay_secs: Option<u64>,
    #[serde(default = "default_stabilize")]
    pub stabilize: u32,
    #[serde(default)]
    pub not_found_is_success: bool,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT.as_secs()
}
fn default_interval_secs() -> u64 {
    DEFAULT_INTERVAL.as_secs()
}
fn default_stabilize() -> u32 {
    1
}

impl Default for PollSettings {
    fn default() -> Self {
        Self {
            timeout_secs: default_timeout_secs(),
            interval_secs: default_interval_secs(),
            delay_secs: None,
            stabilize: default_stabilize(),
            not_found_is_success: false,
        }
    }
}

impl From<&PollSettings> for PollConfig {
    fn from(settings: &PollSettings) -> Self {
        Self {
            timeout: Duration::from_secs(settings.timeout_secs),
            interval: Duration::from_secs(settings.interval_secs),
            delay: settings.delay_secs.map(Duration::from_secs),
            required_consecutive_successes: settings.stabilize,
            not_found_is_success: settings.not_found_is_success,
        }
    }
}

/// Partial [`PollSettings`] for one named operation
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub struct PollOverride {
    pub timeout_secs: Option<u64>,
    pub interval_secs: Option<u64>,
    pub delay_secs: Option<u64>,
    pub stabilize: Option<u32>,
    pub not_found_is_success: Option<bool>,
}

impl PollOverride {
    pub fn apply(&self, base: &PollSettings) -> PollSettings {
        PollSettings {
            timeout_secs: self.timeout_secs.unwrap_or(base.timeout_secs),
            interval_secs: self.interval_secs.unwrap_or(base.interval_secs),
            delay_secs: self.delay_secs.or(base.delay_secs),
            stabilize: self.stabilize.unwrap_or(base.stabilize),
            not_found_is_success: self
                .not_found_is_success
                .unwrap_or(base.not_found_is_success),
        }
    }
}

/// Named poll configurations, one per operation kind
///
/// ```yaml
/// defaults:
///   interval-secs: 30
/// operations:
///   graph-delete:
///     timeout-secs: 1800
///     stabilize: 3
///     not-found-is-success: true
/// ```
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct PollProfiles {
    #[serde(default)]
    pub defaults: PollSettings,
    #[serde(default)]
    pub operations: HashMap<String, PollOverride>,
}

impl PollProfiles {
    pub fn from_yaml_str(content: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(ConfigError::FileNotFound(path.to_path_buf()));
        }
        let content = std::fs::read_to_string(path)?;
        let profiles = Self::from_yaml_str(&content)?;
        tracing::debug!(
            "Loaded {} poll profiles from {}",
            profiles.operations.len(),
            path.display()
        );
        Ok(profiles)
    }

    /// Load the file named by `OPWAIT_CONFIG_PATH`, if the variable is set
    pub fn discover() -> Result<Option<Self>> {
        match std::env::var_os(CONFIG_PATH_ENV) {
            Some(path) => Self::load(PathBuf::from(path)).map(Some),
            None => Ok(None),
        }
    }

    pub fn resolve(&self, operation: &str) -> Result<PollConfig> {
        let overrides = self
            .operations
            .get(operation)
            .ok_or_else(|| ConfigError::UnknownProfile(operation.to_string()))?;
        let config = PollConfig::from(&overrides.apply(&self.defaults));
        config.validate()?;
        Ok(config)
    }

    /// Like [`resolve`](Self::resolve), falling back to `defaults` for unnamed operations
    pub fn resolve_or_default(&self, operation: &str) -> Result<PollConfig> {
        match self.resolve(operation) {
            Err(ConfigError::UnknownProfile(_)) => {
                let config = PollConfig::from(&self.defaults);
                config.validate()?;
                Ok(config)
            }
            other => other,
        }
    }
}

/// Lifecycle phase a wait belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    Create,
    Update,
    Delete,
}

impl std::fmt::Display for Phase {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Phase::Create => write!(f, "Create"),
            Phase::Update => write!(f, "Update"),
            Phase::Delete => write!(f, "Delete"),
        }
    }
}

/// Per-phase operation timeouts of a resource
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResourceTimeouts {
    pub create: Duration,
    pub update: Duration,
    pub delete: Duration,
}

impl Default for ResourceTimeouts {
    fn default() -> Self {
        Self {
            create: DEFAULT_TIMEOUT,
            update: DEFAULT_TIMEOUT,
            delete: DEFAULT_TIMEOUT,
        }
    }
}

impl ResourceTimeouts {
    pub fn new(create: Duration, update: Duration, delete: Duration) -> Self {
        Self {
            create,
            update,
            delete,
        }
    }

    pub fn for_phase(&self, phase: Phase) -> Duration {
        match phase {
            Phase::Create => self.create,
            Phase::Update => self.update,
            Phase::Delete => self.delete,
        }
    }

    /// Default [`PollConfig`] bounded by this phase's timeout
    ///
    /// Delete waits also treat a vanished resource as done.
    pub fn poll_config(&self, phase: Phase) -> PollConfig {
        let config = PollConfig::new(self.for_phase(phase));
        match phase {
            Phase::Delete => config.not_found_is_success(),
            Phase::Create | Phase::Update => config,
        }
    }
}
