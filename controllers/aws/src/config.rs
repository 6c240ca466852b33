//! Controller configuration read from the environment at start-up.

use std::env;
use std::time::Duration;

use crate::error::ControllerError;

/// Runtime settings of the controller
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ControllerConfig {
    /// Namespace to watch, `None` for all namespaces
    pub namespace: Option<String>,
    /// Requeue interval of records that reconciled cleanly
    pub poll_interval: Duration,
    /// Requeue interval of records that are creating or deleting
    pub short_wait: Duration,
    /// Maximum concurrent reconciliations per kind
    pub concurrency: u16,
    /// Debounce window applied to watch events
    pub debounce: Duration,
    /// First retry delay after an error
    pub backoff_min_seconds: u64,
    /// Cap of the retry delay
    pub backoff_max_seconds: u64,
}

impl Default for ControllerConfig {
    fn default() -> Self {
        Self {
            namespace: None,
            poll_interval: Duration::from_secs(60),
            short_wait: Duration::from_secs(10),
            concurrency: 3,
            debounce: Duration::from_secs(5),
            backoff_min_seconds: 5,
            backoff_max_seconds: 300,
        }
    }
}

impl ControllerConfig {
    /// Read the configuration from process environment variables
    pub fn from_env() -> Result<Self, ControllerError> {
        Self::from_lookup(|key| env::var(key).ok())
    }

    /// Read the configuration through `lookup`, falling back to defaults for unset keys
    pub fn from_lookup<F>(lookup: F) -> Result<Self, ControllerError>
    where
        F: Fn(&str) -> Option<String>,
    {
        let defaults = Self::default();

        let namespace = lookup("WATCH_NAMESPACE").filter(|ns| !ns.trim().is_empty());
        let poll_interval = parse_u64(&lookup, "POLL_INTERVAL_SECONDS", defaults.poll_interval.as_secs())?;
        let concurrency = parse_u64(&lookup, "RECONCILE_CONCURRENCY", u64::from(defaults.concurrency))?;
        let debounce = parse_u64(&lookup, "DEBOUNCE_SECONDS", defaults.debounce.as_secs())?;
        let backoff_min_seconds = parse_u64(&lookup, "BACKOFF_MIN_SECONDS", defaults.backoff_min_seconds)?;
        let backoff_max_seconds = parse_u64(&lookup, "BACKOFF_MAX_SECONDS", defaults.backoff_max_seconds)?;

        if poll_interval == 0 {
            return Err(ControllerError::InvalidConfig(
                "POLL_INTERVAL_SECONDS must be greater than zero".to_string(),
            ));
        }
        let concurrency = u16::try_from(concurrency)
            .ok()
            .filter(|c| *c > 0)
            .ok_or_else(|| {
                ControllerError::InvalidConfig(format!(
                    "RECONCILE_CONCURRENCY must be between 1 and {}, got {}",
                    u16::MAX,
                    concurrency
                ))
            })?;
        if backoff_min_seconds == 0 || backoff_min_seconds > backoff_max_seconds {
            return Err(ControllerError::InvalidConfig(format!(
                "BACKOFF_MIN_SECONDS ({backoff_min_seconds}) must be positive and not exceed BACKOFF_MAX_SECONDS ({backoff_max_seconds})"
            )));
        }

        Ok(Self {
            namespace,
            poll_interval: Duration::from_secs(poll_interval),
            short_wait: defaults.short_wait.min(Duration::from_secs(poll_interval)),
            concurrency,
            debounce: Duration::from_secs(debounce),
            backoff_min_seconds,
            backoff_max_seconds,
        })
    }
}

fn parse_u64<F>(lookup: &F, key: &str, default: u64) -> Result<u64, ControllerError>
where
    F: Fn(&str) -> Option<String>,
{
    match lookup(key) {
        None => Ok(default),
        Some(raw) => raw.trim().parse::<u64>().map_err(|e| {
            ControllerError::InvalidConfig(format!("{key} must be a non-negative integer, got {raw:?}: {e}"))
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::collections::HashMap;

    fn lookup(vars: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let vars: HashMap<String, String> = vars
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| vars.get(key).cloned()
    }

    #[test]
    fn test_defaults() {
        let config = ControllerConfig::from_lookup(lookup(&[])).unwrap();
        assert_eq!(config, ControllerConfig::default());
        assert_eq!(config.namespace, None);
        assert_eq!(config.poll_interval, Duration::from_secs(60));
        assert_eq!(config.concurrency, 3);
    }

    #[test]
    fn test_overrides() {
        let config = ControllerConfig::from_lookup(lookup(&[
            ("WATCH_NAMESPACE", "apps"),
            ("POLL_INTERVAL_SECONDS", "120"),
            ("RECONCILE_CONCURRENCY", "8"),
            ("DEBOUNCE_SECONDS", "0"),
            ("BACKOFF_MIN_SECONDS", "1"),
            ("BACKOFF_MAX_SECONDS", "60"),
        ]))
        .unwrap();
        assert_eq!(config.namespace.as_deref(), Some("apps"));
        assert_eq!(config.poll_interval, Duration::from_secs(120));
        assert_eq!(config.concurrency, 8);
        assert_eq!(config.debounce, Duration::ZERO);
        assert_eq!(config.backoff_min_seconds, 1);
        assert_eq!(config.backoff_max_seconds, 60);
    }

    #[test]
    fn test_blank_namespace_watches_all() {
        let config = ControllerConfig::from_lookup(lookup(&[("WATCH_NAMESPACE", " ")])).unwrap();
        assert_eq!(config.namespace, None);
    }

    #[test]
    fn test_short_wait_never_exceeds_poll_interval() {
        let config = ControllerConfig::from_lookup(lookup(&[("POLL_INTERVAL_SECONDS", "3")])).unwrap();
        assert_eq!(config.short_wait, Duration::from_secs(3));
    }

    #[test]
    fn test_invalid_values_are_rejected() {
        for vars in [
            [("POLL_INTERVAL_SECONDS", "soon")],
            [("POLL_INTERVAL_SECONDS", "0")],
            [("RECONCILE_CONCURRENCY", "0")],
            [("RECONCILE_CONCURRENCY", "70000")],
            [("BACKOFF_MIN_SECONDS", "600")],
        ] {
            let result = ControllerConfig::from_lookup(lookup(&vars));
            assert!(
                matches!(result, Err(ControllerError::InvalidConfig(_))),
                "{vars:?} should be rejected"
            );
        }
    }
}
