//! Service identity.
//!
//! A [`ServiceKey`] names one remote service binding by its
//! `(group, interface, version)` triple. The canonical string form
//! `group/interface:version` is used both as the proxy cache identity and as
//! the line format of the recovery log.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use super::error::{BridgeError, Result};

/// Unique identity of a remote service binding.
///
/// # Example
///
/// ```
/// use rpcbridge_common::protocol::ServiceKey;
///
/// let key = ServiceKey::new("grp", "com.example.Svc", "1.0");
/// assert_eq!(key.to_string(), "grp/com.example.Svc:1.0");
///
/// let parsed: ServiceKey = "grp/com.example.Svc:1.0".parse().unwrap();
/// assert_eq!(parsed, key);
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct ServiceKey {
    pub group: String,
    pub interface_name: String,
    pub version: String,
}

impl ServiceKey {
    pub fn new(
        group: impl Into<String>,
        interface_name: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        ServiceKey {
            group: group.into(),
            interface_name: interface_name.into(),
            version: version.into(),
        }
    }

    /// Parses the canonical `group/interface:version` form.
    ///
    /// The string is split at the first `/` and at the first `:` that
    /// follows it, so the version may itself contain `/` or `:`.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidKey`] if either separator is missing.
    pub fn parse(item: &str) -> Result<Self> {
        let (group, rest) = item
            .split_once('/')
            .ok_or_else(|| BridgeError::InvalidKey(format!("missing '/' in '{}'", item)))?;
        let (interface_name, version) = rest
            .split_once(':')
            .ok_or_else(|| BridgeError::InvalidKey(format!("missing ':' in '{}'", item)))?;

        Ok(ServiceKey::new(group, interface_name, version))
    }

    /// The canonical string form.
    pub fn canonical(&self) -> String {
        self.to_string()
    }

    /// Keys without an interface name are never registered.
    pub fn has_interface(&self) -> bool {
        !self.interface_name.is_empty()
    }
}

impl fmt::Display for ServiceKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}:{}", self.group, self.interface_name, self.version)
    }
}

impl FromStr for ServiceKey {
    type Err = BridgeError;

    fn from_str(s: &str) -> Result<Self> {
        ServiceKey::parse(s)
    }
}
