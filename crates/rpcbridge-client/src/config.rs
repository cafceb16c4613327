use rpcbridge_common::protocol::error::{BridgeError, Result};
use rpcbridge_common::protocol::metadata::{PROPERTY_SUBSCRIBERS, PROPERTY_TIMEOUT};
use rpcbridge_common::protocol::ServiceKey;
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::time::Duration;

/// Call timeout used when none is configured.
pub const DEFAULT_TIMEOUT_MS: u64 = 3000;

pub const DEFAULT_PROTOCOL: &str = "dubbo";
pub const DEFAULT_LOAD_BALANCE: &str = "random";
pub const DEFAULT_CLUSTER: &str = "failover";

/// Everything a [`ReferenceFactory`](crate::ReferenceFactory) needs to build
/// the remote reference for one service key.
///
/// Built once per registration and validated before use.
///
/// # Default Configuration
///
/// - `protocol`: `dubbo`
/// - `load_balance`: `random`
/// - `cluster`: `failover`
/// - `retries`: 0 (the bridge never retries)
/// - `check`: false (do not require providers at reference time)
/// - `generic` and `proxy`: true
/// - `request_timeout_ms`: 3000
///
/// # Example
///
/// ```rust
/// use rpcbridge_client::ReferenceConfig;
/// use rpcbridge_common::ServiceKey;
///
/// let config = ReferenceConfig::for_key(ServiceKey::new("grp", "com.example.Svc", "1.0"));
/// assert!(config.validate().is_ok());
/// assert_eq!(config.retries, 0);
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ReferenceConfig {
    pub key: ServiceKey,
    pub protocol: String,
    pub load_balance: String,
    pub cluster: String,
    pub retries: u32,
    pub check: bool,
    pub params: HashMap<String, String>,
    pub generic: bool,
    pub proxy: bool,
    pub request_timeout_ms: u64,
}

impl ReferenceConfig {
    pub fn for_key(key: ServiceKey) -> Self {
        ReferenceConfig {
            key,
            protocol: DEFAULT_PROTOCOL.to_string(),
            load_balance: DEFAULT_LOAD_BALANCE.to_string(),
            cluster: DEFAULT_CLUSTER.to_string(),
            retries: 0,
            check: false,
            params: HashMap::new(),
            generic: true,
            proxy: true,
            request_timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }

    /// Checks that the configuration names a service and a way to reach it.
    pub fn validate(&self) -> Result<()> {
        if !self.key.has_interface() {
            return Err(BridgeError::InvalidMetadata(format!(
                "reference {} has no interface name",
                self.key
            )));
        }
        if self.protocol.is_empty() {
            return Err(BridgeError::InvalidMetadata(format!(
                "reference {} has no protocol",
                self.key
            )));
        }
        if self.cluster.is_empty() || self.load_balance.is_empty() {
            return Err(BridgeError::InvalidMetadata(format!(
                "reference {} needs a cluster and load balance strategy",
                self.key
            )));
        }
        Ok(())
    }
}

/// Binding configuration read from the hosting framework's properties.
///
/// # Fields
///
/// - `subscribers`: services to register at startup
/// - `timeout_ms`: per-call budget handed to the invoker
#[derive(Debug, Clone, PartialEq)]
pub struct BindingConfig {
    pub subscribers: Vec<ServiceKey>,
    pub timeout_ms: u64,
}

impl Default for BindingConfig {
    fn default() -> Self {
        Self {
            subscribers: Vec::new(),
            timeout_ms: DEFAULT_TIMEOUT_MS,
        }
    }
}

impl BindingConfig {
    /// Reads `subscribers` and `timeout` from binding properties.
    ///
    /// A missing, non-numeric or zero timeout falls back to
    /// [`DEFAULT_TIMEOUT_MS`]. Empty subscriber entries are skipped.
    ///
    /// # Errors
    ///
    /// Returns [`BridgeError::InvalidMetadata`] if a subscriber entry is not
    /// a `group/interface:version` key.
    pub fn from_properties(properties: &HashMap<String, String>) -> Result<Self> {
        let timeout_ms = properties
            .get(PROPERTY_TIMEOUT)
            .and_then(|t| t.trim().parse::<u64>().ok())
            .filter(|&t| t > 0)
            .unwrap_or(DEFAULT_TIMEOUT_MS);

        let subscribers = match properties.get(PROPERTY_SUBSCRIBERS) {
            Some(list) => parse_subscribers(list)?,
            None => Vec::new(),
        };

        Ok(Self {
            subscribers,
            timeout_ms,
        })
    }

    pub fn timeout(&self) -> Duration {
        Duration::from_millis(self.timeout_ms)
    }
}

fn parse_subscribers(list: &str) -> Result<Vec<ServiceKey>> {
    list.split(',')
        .filter(|item| !item.is_empty())
        .map(|item| {
            ServiceKey::parse(item).map_err(|e| {
                BridgeError::InvalidMetadata(format!("bad subscriber '{}': {}", item, e))
            })
        })
        .collect()
}
