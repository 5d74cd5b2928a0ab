//! Container configuration.
//!
//! Configuration is fixed when the root container is created and shared by
//! every scope derived from it. It can be built in code, read from the
//! environment, or (with the `config` feature) deserialized from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

/// Environment variable prefix read by [`ContainerConfig::from_env`].
pub const ENV_PREFIX: &str = "TIERED_DI";

/// Settings for a container tree.
///
/// # Examples
///
/// ```rust
/// use tiered_di::{Container, ContainerConfig};
///
/// let config = ContainerConfig::default()
///     .with_label("billing")
///     .with_trace_resolutions(true);
///
/// let container = Container::with_config(config);
/// assert_eq!(container.config().label, "billing");
/// assert!(container.create_scope().config().trace_resolutions);
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerConfig {
    /// Name attached to log events emitted by this container tree.
    pub label: String,
    /// Attach a [`TracingObserver`](crate::TracingObserver) at creation.
    pub trace_resolutions: bool,
}

impl Default for ContainerConfig {
    fn default() -> Self {
        Self {
            label: "root".to_string(),
            trace_resolutions: false,
        }
    }
}

impl ContainerConfig {
    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn with_trace_resolutions(mut self, enabled: bool) -> Self {
        self.trace_resolutions = enabled;
        self
    }

    /// Reads `TIERED_DI_LABEL` and `TIERED_DI_TRACE_RESOLUTIONS`, falling back
    /// to the defaults for anything unset or unparsable.
    pub fn from_env() -> Self {
        Self::from_env_with_prefix(ENV_PREFIX)
    }

    pub fn from_env_with_prefix(prefix: &str) -> Self {
        let var = |key: &str| env::var(format!("{}_{}", prefix.to_uppercase(), key)).ok();
        let mut config = Self::default();

        if let Some(label) = var("LABEL").filter(|label| !label.is_empty()) {
            config.label = label;
        }
        if let Some(flag) = var("TRACE_RESOLUTIONS").and_then(|value| parse_flag(&value)) {
            config.trace_resolutions = flag;
        }
        config
    }

    /// Parses a JSON document; missing fields take their default values.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> Result<Self, serde_json::Error> {
        serde_json::from_str(json)
    }
}

fn parse_flag(value: &str) -> Option<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Some(true),
        "0" | "false" | "no" | "off" => Some(false),
        _ => None,
    }
}
