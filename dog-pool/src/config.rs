use std::env;
use std::str::FromStr;
use std::time::Duration;

use serde::{Deserialize, Serialize};

use crate::{PoolError, PoolResult, types::DEFAULT_PRIORITY_THRESHOLD};

/// Configuration for a worker pool
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct PoolConfig {
    /// Number of worker tasks spawned by `start()`
    pub workers: usize,
    /// Capacity of each input lane
    pub queue_capacity: usize,
    /// Capacity of the result channel (defaults to `queue_capacity`)
    pub result_capacity: Option<usize>,
    /// Jobs with `priority >= priority_threshold` use the high lane
    pub priority_threshold: i32,
    /// Deadline after which the pool signal fires on its own, measured from construction
    pub deadline: Option<Duration>,
    /// How long `stop()` waits for workers before canceling them
    pub shutdown_timeout: Option<Duration>,
    /// Events buffered per subscriber before lagging
    pub event_capacity: usize,
}

impl Default for PoolConfig {
    fn default() -> Self {
        Self {
            workers: 4,
            queue_capacity: 100,
            result_capacity: None,
            priority_threshold: DEFAULT_PRIORITY_THRESHOLD,
            deadline: None,
            shutdown_timeout: None,
            event_capacity: 1024,
        }
    }
}

impl PoolConfig {
    /// Config with the given worker count and per-lane capacity
    pub fn new(workers: usize, queue_capacity: usize) -> Self {
        Self {
            workers,
            queue_capacity,
            ..Self::default()
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.workers = workers;
        self
    }

    pub fn with_queue_capacity(mut self, capacity: usize) -> Self {
        self.queue_capacity = capacity;
        self
    }

    pub fn with_result_capacity(mut self, capacity: usize) -> Self {
        self.result_capacity = Some(capacity);
        self
    }

    pub fn with_priority_threshold(mut self, threshold: i32) -> Self {
        self.priority_threshold = threshold;
        self
    }

    pub fn with_deadline(mut self, deadline: Duration) -> Self {
        self.deadline = Some(deadline);
        self
    }

    pub fn with_shutdown_timeout(mut self, timeout: Duration) -> Self {
        self.shutdown_timeout = Some(timeout);
        self
    }

    pub fn with_event_capacity(mut self, capacity: usize) -> Self {
        self.event_capacity = capacity;
        self
    }

    /// Effective result channel capacity
    pub fn result_capacity(&self) -> usize {
        self.result_capacity.unwrap_or(self.queue_capacity)
    }

    /// Reject configurations a pool cannot run with
    pub fn validate(&self) -> PoolResult<()> {
        if self.workers == 0 {
            return Err(PoolError::InvalidConfig("workers must be greater than 0".to_string()));
        }
        if self.queue_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "queue_capacity must be greater than 0".to_string(),
            ));
        }
        if self.result_capacity() == 0 {
            return Err(PoolError::InvalidConfig(
                "result_capacity must be greater than 0".to_string(),
            ));
        }
        if self.event_capacity == 0 {
            return Err(PoolError::InvalidConfig(
                "event_capacity must be greater than 0".to_string(),
            ));
        }
        Ok(())
    }

    /// Defaults overridden by `{prefix}*` environment variables
    ///
    /// Recognized keys: `WORKERS`, `QUEUE_CAPACITY`, `RESULT_CAPACITY`,
    /// `PRIORITY_THRESHOLD`, `DEADLINE_MS`, `SHUTDOWN_TIMEOUT_MS`,
    /// `EVENT_CAPACITY`. With prefix `DOGPOOL_`, `DOGPOOL_WORKERS=8` sets
    /// eight workers.
    pub fn from_env(prefix: &str) -> PoolResult<Self> {
        Self::from_lookup(prefix, |key| env::var(key).ok())
    }

    fn from_lookup<F>(prefix: &str, lookup: F) -> PoolResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let read = |name: &str| lookup(&format!("{}{}", prefix, name));
        let mut config = Self::default();

        if let Some(value) = read("WORKERS") {
            config.workers = parse("WORKERS", &value)?;
        }
        if let Some(value) = read("QUEUE_CAPACITY") {
            config.queue_capacity = parse("QUEUE_CAPACITY", &value)?;
        }
        if let Some(value) = read("RESULT_CAPACITY") {
            config.result_capacity = Some(parse("RESULT_CAPACITY", &value)?);
        }
        if let Some(value) = read("PRIORITY_THRESHOLD") {
            config.priority_threshold = parse("PRIORITY_THRESHOLD", &value)?;
        }
        if let Some(value) = read("DEADLINE_MS") {
            config.deadline = Some(Duration::from_millis(parse("DEADLINE_MS", &value)?));
        }
        if let Some(value) = read("SHUTDOWN_TIMEOUT_MS") {
            config.shutdown_timeout =
                Some(Duration::from_millis(parse("SHUTDOWN_TIMEOUT_MS", &value)?));
        }
        if let Some(value) = read("EVENT_CAPACITY") {
            config.event_capacity = parse("EVENT_CAPACITY", &value)?;
        }

        config.validate()?;
        Ok(config)
    }
}

fn parse<T: FromStr>(key: &str, value: &str) -> PoolResult<T> {
    value
        .trim()
        .parse()
        .map_err(|_| PoolError::InvalidConfig(format!("{} has invalid value '{}'", key, value)))
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| (k.to_string(), v.to_string()))
            .collect();
        move |key: &str| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults_are_valid() {
        let config = PoolConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.result_capacity(), 100);
        assert_eq!(config.priority_threshold, 5);
    }

    #[test]
    fn test_validation_rejects_zero_sizes() {
        assert!(PoolConfig::new(0, 10).validate().is_err());
        assert!(PoolConfig::new(2, 0).validate().is_err());
        assert!(PoolConfig::new(2, 10).with_result_capacity(0).validate().is_err());
        assert!(PoolConfig::new(2, 10).with_event_capacity(0).validate().is_err());
    }

    #[test]
    fn test_env_overrides() {
        let config = PoolConfig::from_lookup(
            "DOGPOOL_",
            lookup(&[
                ("DOGPOOL_WORKERS", "8"),
                ("DOGPOOL_QUEUE_CAPACITY", " 32 "),
                ("DOGPOOL_PRIORITY_THRESHOLD", "-2"),
                ("DOGPOOL_DEADLINE_MS", "1500"),
                ("OTHER_WORKERS", "99"),
            ]),
        )
        .unwrap();

        assert_eq!(config.workers, 8);
        assert_eq!(config.queue_capacity, 32);
        assert_eq!(config.priority_threshold, -2);
        assert_eq!(config.deadline, Some(Duration::from_millis(1500)));
        assert_eq!(config.shutdown_timeout, None);
    }

    #[test]
    fn test_env_parse_errors() {
        let err = PoolConfig::from_lookup("P_", lookup(&[("P_WORKERS", "many")])).unwrap_err();
        assert_eq!(
            err,
            PoolError::InvalidConfig("WORKERS has invalid value 'many'".to_string())
        );

        let err = PoolConfig::from_lookup("P_", lookup(&[("P_WORKERS", "0")])).unwrap_err();
        assert!(matches!(err, PoolError::InvalidConfig(_)));
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: PoolConfig =
            serde_json::from_str(r#"{ "workers": 3, "queue_capacity": 10 }"#).unwrap();

        assert_eq!(config, PoolConfig::new(3, 10));
    }
}
