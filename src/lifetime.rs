//! Instance sharing and container phase definitions.

use std::fmt;
use std::str::FromStr;

#[cfg(feature = "config")]
use serde::{Deserialize, Serialize};

use crate::error::DiError;

/// Whether instances created by `to_new_instance` are shared.
///
/// - **Shared**: one instance per implementation type (and qualifier),
///   reused by every binding of it and reference counted per bound key
/// - **Unshared**: each binding constructs and keeps its own instance
///
/// # Examples
///
/// ```rust
/// use bindgraph::Sharing;
///
/// assert_eq!(Sharing::default(), Sharing::Shared);
/// assert_eq!("unshared".parse::<Sharing>().unwrap(), Sharing::Unshared);
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
#[cfg_attr(feature = "config", derive(Serialize, Deserialize))]
#[cfg_attr(feature = "config", serde(rename_all = "lowercase"))]
pub enum Sharing {
    #[default]
    Shared,
    Unshared,
}

impl fmt::Display for Sharing {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Sharing::Shared => f.write_str("shared"),
            Sharing::Unshared => f.write_str("unshared"),
        }
    }
}

impl FromStr for Sharing {
    type Err = DiError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "shared" => Ok(Sharing::Shared),
            "unshared" => Ok(Sharing::Unshared),
            other => Err(DiError::configuration(format!(
                "unknown sharing mode '{}', expected 'shared' or 'unshared'",
                other
            ))),
        }
    }
}

/// Container phase.
///
/// Binding a key moves the container back to `Binding`; a successful
/// resolve pass moves it to `Resolved`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Phase {
    #[default]
    Binding,
    Resolved,
}
