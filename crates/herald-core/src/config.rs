//! AgentConfig - 実行時設定
//!
//! 読み込み順（後勝ち）: デフォルト -> YAML ファイル（任意）-> `HERALD_*` 環境変数。
//! CLI フラグは CLI 側で最後に適用する。

use std::path::Path;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::app::PollConfig;
use crate::error::ConfigError;
use crate::impls::DEFAULT_RESULT;

pub const ENV_PREFIX: &str = "HERALD_";

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct AgentConfig {
    pub workers: usize,
    pub queue_capacity: usize,
    pub work_duration_ms: u64,
    pub result_text: String,
    pub poll_interval_ms: u64,
    pub poll_timeout_ms: Option<u64>,
    /// Finished tasks older than this are evicted. `None` keeps them forever.
    pub retention_ms: Option<u64>,
    pub eviction_interval_ms: u64,
}

impl Default for AgentConfig {
    fn default() -> Self {
        Self {
            workers: 2,
            queue_capacity: 64,
            work_duration_ms: 2000,
            result_text: DEFAULT_RESULT.into(),
            poll_interval_ms: 1000,
            poll_timeout_ms: None,
            retention_ms: None,
            eviction_interval_ms: 30_000,
        }
    }
}

impl AgentConfig {
    /// Parse a YAML document. Missing keys keep their defaults.
    pub fn from_yaml(content: &str) -> Result<Self, ConfigError> {
        if content.trim().is_empty() {
            return Ok(Self::default());
        }
        Ok(serde_yaml::from_str(content)?)
    }

    pub fn load(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_yaml(&content)
    }

    /// Defaults, then `path` if given, then the process environment.
    pub fn resolve(path: Option<&Path>) -> Result<Self, ConfigError> {
        let config = match path {
            Some(path) => Self::load(path)?,
            None => Self::default(),
        };
        config.with_env(|key| std::env::var(key).ok())
    }

    /// Apply `HERALD_*` overrides read through `var`.
    pub fn with_env(mut self, var: impl Fn(&str) -> Option<String>) -> Result<Self, ConfigError> {
        let lookup = |suffix: &str| var(&format!("{ENV_PREFIX}{suffix}"));

        if let Some(v) = lookup("WORKERS") {
            self.workers = parse_num("workers", &v)?;
        }
        if let Some(v) = lookup("QUEUE_CAPACITY") {
            self.queue_capacity = parse_num("queue_capacity", &v)?;
        }
        if let Some(v) = lookup("WORK_DURATION_MS") {
            self.work_duration_ms = parse_num("work_duration_ms", &v)?;
        }
        if let Some(v) = lookup("RESULT_TEXT") {
            self.result_text = v;
        }
        if let Some(v) = lookup("POLL_INTERVAL_MS") {
            self.poll_interval_ms = parse_num("poll_interval_ms", &v)?;
        }
        if let Some(v) = lookup("POLL_TIMEOUT_MS") {
            self.poll_timeout_ms = Some(parse_num("poll_timeout_ms", &v)?);
        }
        if let Some(v) = lookup("RETENTION_MS") {
            self.retention_ms = Some(parse_num("retention_ms", &v)?);
        }
        if let Some(v) = lookup("EVICTION_INTERVAL_MS") {
            self.eviction_interval_ms = parse_num("eviction_interval_ms", &v)?;
        }
        Ok(self)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.workers == 0 {
            return Err(ConfigError::Zero("workers"));
        }
        if self.queue_capacity == 0 {
            return Err(ConfigError::Zero("queue_capacity"));
        }
        if self.poll_interval_ms == 0 {
            return Err(ConfigError::Zero("poll_interval_ms"));
        }
        if self.retention_ms.is_some() && self.eviction_interval_ms == 0 {
            return Err(ConfigError::Zero("eviction_interval_ms"));
        }
        Ok(())
    }

    pub fn work_duration(&self) -> Duration {
        Duration::from_millis(self.work_duration_ms)
    }

    pub fn poll(&self) -> PollConfig {
        PollConfig {
            interval: Duration::from_millis(self.poll_interval_ms),
            timeout: self.poll_timeout_ms.map(Duration::from_millis),
        }
    }

    pub fn retention(&self) -> Option<Duration> {
        self.retention_ms.map(Duration::from_millis)
    }

    pub fn eviction_interval(&self) -> Duration {
        Duration::from_millis(self.eviction_interval_ms)
    }
}

fn parse_num<T: std::str::FromStr>(key: &'static str, value: &str) -> Result<T, ConfigError> {
    value.trim().parse().map_err(|_| ConfigError::InvalidValue {
        key,
        value: value.to_string(),
    })
}
