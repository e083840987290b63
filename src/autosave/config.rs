/// Quiescence window between the most recent edit and the save it triggers.
pub(crate) const DEFAULT_WINDOW_MS: i64 = 1000;

/// What to do after a save request fails.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub(crate) enum RetryPolicy {
    /// Stay dirty until the next edit starts a new debounce cycle.
    #[default]
    OnNextEdit,
    /// Re-attempt the save after a fixed delay, for as long as the note stays dirty.
    After { delay_ms: i64 },
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub(crate) struct AutosaveConfig {
    pub window_ms: i64,
    pub retry: RetryPolicy,
}

impl Default for AutosaveConfig {
    fn default() -> Self {
        Self {
            window_ms: DEFAULT_WINDOW_MS,
            retry: RetryPolicy::default(),
        }
    }
}

impl AutosaveConfig {
    /// Build from optional raw settings. Non-positive values fall back to defaults.
    pub fn from_parts(window_ms: Option<i64>, retry_ms: Option<i64>) -> Self {
        let window_ms = window_ms.filter(|ms| *ms > 0).unwrap_or(DEFAULT_WINDOW_MS);
        let retry = match retry_ms {
            Some(delay_ms) if delay_ms > 0 => RetryPolicy::After { delay_ms },
            _ => RetryPolicy::OnNextEdit,
        };
        Self { window_ms, retry }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config() {
        let c = AutosaveConfig::default();
        assert_eq!(c.window_ms, 1000);
        assert_eq!(c.retry, RetryPolicy::OnNextEdit);
    }

    #[test]
    fn test_from_parts() {
        assert_eq!(AutosaveConfig::from_parts(None, None), AutosaveConfig::default());
        assert_eq!(AutosaveConfig::from_parts(Some(0), Some(0)), AutosaveConfig::default());

        let c = AutosaveConfig::from_parts(Some(750), Some(5000));
        assert_eq!(c.window_ms, 750);
        assert_eq!(c.retry, RetryPolicy::After { delay_ms: 5000 });

        let c = AutosaveConfig::from_parts(Some(-3), Some(-1));
        assert_eq!(c.window_ms, DEFAULT_WINDOW_MS);
        assert_eq!(c.retry, RetryPolicy::OnNextEdit);
    }
}
