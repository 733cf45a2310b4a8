use std::fmt;
use std::rc::Rc;
use std::time::Duration;

use serde::{Deserialize, Serialize};
use vireo_types::Path;

use crate::error::ConfigError;
use crate::lifecycle::KeyPolicy;
use crate::schedule::{Scheduler, TaskQueue};

fn default_drain_method() -> Rc<dyn Scheduler> {
    Rc::new(TaskQueue::shared())
}

/// Configuration for a collection reconciler.
#[derive(Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct GroupConfig {
    /// Name of the state property holding the model array.
    pub property: String,
    /// Whether large changes may be spread across scheduled drain steps.
    pub async_render: bool,
    /// Log a warning the first time an asynchronous drain begins.
    pub show_warning: bool,
    /// Number of pending indices above which reconciliation goes async.
    pub large_change: usize,
    /// Continuations scheduled after each asynchronous drain step.
    pub drain_growth: usize,
    /// Delay hint passed to the drain method, in milliseconds.
    pub delay_ms: u64,
    /// How models find their views.
    pub key: KeyPolicy,
    /// Scheduler for asynchronous drain steps.
    ///
    /// Defaults to [`TaskQueue::shared`], which runs nothing on its own: the
    /// host must pump it, e.g. with `TaskQueue::shared().run_until_idle()`,
    /// or a change larger than `large_change` never finishes rendering.
    #[serde(skip, default = "default_drain_method")]
    pub drain_method: Rc<dyn Scheduler>,
}

impl Default for GroupConfig {
    fn default() -> Self {
        Self {
            property: "data".to_string(),
            async_render: true,
            show_warning: true,
            large_change: 1000,
            drain_growth: 4,
            delay_ms: 0,
            key: KeyPolicy::ByIndex,
            drain_method: default_drain_method(),
        }
    }
}

impl GroupConfig {
    /// Parse a configuration from TOML. Missing fields take their defaults.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(source)?;
        config.validate()?;
        Ok(config)
    }

    /// Check that the collection property is a usable path.
    pub fn validate(&self) -> Result<(), ConfigError> {
        Path::parse(&self.property)?;
        Ok(())
    }

    /// A configuration that always reconciles within the `set` call.
    pub fn synchronous() -> Self {
        Self {
            async_render: false,
            ..Default::default()
        }
    }

    pub fn with_property(mut self, property: impl Into<String>) -> Self {
        self.property = property.into();
        self
    }

    pub fn with_key(mut self, key: KeyPolicy) -> Self {
        self.key = key;
        self
    }

    pub fn with_drain_method(mut self, scheduler: impl Scheduler + 'static) -> Self {
        self.drain_method = Rc::new(scheduler);
        self
    }

    pub fn delay(&self) -> Duration {
        Duration::from_millis(self.delay_ms)
    }
}

impl fmt::Debug for GroupConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GroupConfig")
            .field("property", &self.property)
            .field("async_render", &self.async_render)
            .field("show_warning", &self.show_warning)
            .field("large_change", &self.large_change)
            .field("drain_growth", &self.drain_growth)
            .field("delay_ms", &self.delay_ms)
            .field("key", &self.key)
            .finish_non_exhaustive()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults() {
        let config = GroupConfig::default();
        assert_eq!(config.property, "data");
        assert!(config.async_render);
        assert!(config.show_warning);
        assert_eq!(config.large_change, 1000);
        assert_eq!(config.drain_growth, 4);
        assert_eq!(config.delay(), Duration::ZERO);
        assert_eq!(config.key, KeyPolicy::ByIndex);
    }

    #[test]
    fn from_toml_fills_missing_fields() {
        let config = GroupConfig::from_toml_str(
            r#"
            large_change = 0
            drain_growth = 0
            delay_ms = 16

            [key]
            policy = "by_id"
            field = "id"
            "#,
        )
        .unwrap();
        assert_eq!(config.large_change, 0);
        assert_eq!(config.drain_growth, 0);
        assert_eq!(config.delay(), Duration::from_millis(16));
        assert_eq!(config.key, KeyPolicy::by_id());
        assert!(config.async_render);
        assert_eq!(config.property, "data");
    }

    #[test]
    fn from_toml_rejects_bad_input() {
        assert!(matches!(
            GroupConfig::from_toml_str("large_change = \"many\""),
            Err(ConfigError::Parse(_))
        ));
        assert!(matches!(
            GroupConfig::from_toml_str("property = \"rows..items\""),
            Err(ConfigError::Property(_))
        ));
    }

    #[test]
    fn serializes_without_drain_method() {
        let text = toml::to_string(&GroupConfig::synchronous()).unwrap();
        assert!(text.contains("async_render = false"));
        assert!(!text.contains("drain_method"));
    }
}
