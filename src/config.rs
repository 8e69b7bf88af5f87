//! Container configuration.
//!
//! Options can be built in code, read from prefixed environment variables,
//! or (with the `config` feature) deserialized from JSON.

use std::env;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::injector::ConstructorPolicy;
use crate::lifetime::Sharing;
use crate::{DiError, DiResult};

/// Prefix used by [`ContainerOptions::from_env`].
pub const DEFAULT_ENV_PREFIX: &str = "BINDGRAPH";

/// Behavioural options of a container.
///
/// # Examples
///
/// ```rust
/// use bindgraph::{Container, ContainerOptions, ConstructorPolicy, Sharing};
///
/// let options = ContainerOptions {
///     name: Some("app".to_string()),
///     default_sharing: Sharing::Unshared,
///     constructor_policy: ConstructorPolicy::Skip,
///     ..ContainerOptions::default()
/// };
/// let container = Container::with_options(options);
/// assert_eq!(container.name(), Some("app"));
/// ```
#[derive(Debug, Clone, PartialEq, Eq)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(default))]
pub struct ContainerOptions {
    /// Name used in diagnostics
    pub name: Option<String>,
    /// Sharing of `to_new_instance` bindings that do not opt out
    pub default_sharing: Sharing,
    /// Handling of constructors with misordered parameters
    pub constructor_policy: ConstructorPolicy,
    /// Run `Initialize` hooks after each resolve pass
    pub run_initializers: bool,
}

impl Default for ContainerOptions {
    fn default() -> Self {
        ContainerOptions {
            name: None,
            default_sharing: Sharing::Shared,
            constructor_policy: ConstructorPolicy::Reject,
            run_initializers: true,
        }
    }
}

impl ContainerOptions {
    pub fn named(name: impl Into<String>) -> Self {
        ContainerOptions {
            name: Some(name.into()),
            ..ContainerOptions::default()
        }
    }

    /// Options from `BINDGRAPH_*` environment variables.
    pub fn from_env() -> DiResult<Self> {
        Self::from_env_with_prefix(DEFAULT_ENV_PREFIX)
    }

    /// Options from `<PREFIX>_NAME`, `<PREFIX>_DEFAULT_SHARING`,
    /// `<PREFIX>_CONSTRUCTOR_POLICY` and `<PREFIX>_RUN_INITIALIZERS`.
    /// Unset variables keep their defaults.
    pub fn from_env_with_prefix(prefix: &str) -> DiResult<Self> {
        let source = EnvironmentSource::with_prefix(prefix);
        let mut options = ContainerOptions::default();

        if let Some(name) = source.get("name") {
            options.name = Some(name);
        }
        if let Some(sharing) = source.get("default_sharing") {
            options.default_sharing = sharing.parse()?;
        }
        if let Some(policy) = source.get("constructor_policy") {
            options.constructor_policy = policy.parse()?;
        }
        if let Some(flag) = source.get("run_initializers") {
            options.run_initializers = parse_bool(&source.variable("run_initializers"), &flag)?;
        }

        Ok(options)
    }

    /// Options from a JSON document; missing fields keep their defaults.
    #[cfg(feature = "config")]
    pub fn from_json(json: &str) -> DiResult<Self> {
        serde_json::from_str(json)
            .map_err(|e| DiError::configuration(format!("invalid container options: {}", e)))
    }
}

/// Environment variables under an upper-cased prefix.
#[derive(Debug)]
struct EnvironmentSource {
    prefix: String,
}

impl EnvironmentSource {
    fn with_prefix(prefix: &str) -> Self {
        EnvironmentSource {
            prefix: prefix.to_uppercase(),
        }
    }

    fn variable(&self, key: &str) -> String {
        format!("{}_{}", self.prefix, key.to_uppercase())
    }

    fn get(&self, key: &str) -> Option<String> {
        env::var(self.variable(key))
            .ok()
            .filter(|value| !value.trim().is_empty())
    }
}

fn parse_bool(variable: &str, value: &str) -> DiResult<bool> {
    match value.trim().to_ascii_lowercase().as_str() {
        "1" | "true" | "yes" | "on" => Ok(true),
        "0" | "false" | "no" | "off" => Ok(false),
        other => Err(DiError::configuration(format!(
            "{} must be a boolean, got '{}'",
            variable, other
        ))),
    }
}
