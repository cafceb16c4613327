// Copyright 2025 RpcBridge Authors
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use rpcbridge_common::protocol::error::{BridgeError, Result};
use rpcbridge_common::protocol::ServiceKey;
use std::collections::HashMap;
use std::sync::{Arc, PoisonError, RwLock};
use tokio::sync::Mutex;

use crate::config::ReferenceConfig;
use crate::invoker::ReferenceFactory;
use crate::proxy::ProxyHandle;
use crate::recovery::RecoveryLog;

/// Cache of proxy handles, one per service key.
///
/// The registry builds each remote reference lazily the first time a key is
/// requested and hands out the same [`ProxyHandle`] afterwards.
///
/// # Architecture
///
/// - Handles live in a map behind a std `RwLock`; lookups only take the
///   read side and never wait on registrations in progress
/// - Registrations are serialized by a single async mutex. A miss re-checks
///   the map under that mutex before building, so concurrent first callers
///   for the same key trigger exactly one construction
/// - New registrations are appended to the [`RecoveryLog`] while the mutex
///   is still held, so log lines never interleave
/// - Recovery log reads and writes run on tokio's blocking pool
/// - Invocations never touch either lock
///
/// # Lifecycle
///
/// [`init`](Self::init) replays the recovery log, the registry then serves
/// any number of [`get_proxy`](Self::get_proxy) calls, and
/// [`shutdown`](Self::shutdown) drops every cached handle.
///
/// # Example
///
/// ```rust,no_run
/// use rpcbridge_client::{RecoveryLog, ReferenceFactory, ServiceRegistry};
/// use rpcbridge_common::ServiceKey;
/// use std::sync::Arc;
///
/// # async fn run(factory: Arc<dyn ReferenceFactory>) -> rpcbridge_common::Result<()> {
/// let registry = ServiceRegistry::new(factory, RecoveryLog::default());
/// registry.init().await?;
///
/// let proxy = registry
///     .get_proxy(&ServiceKey::new("grp", "com.example.Svc", "1.0"))
///     .await?;
/// # Ok(())
/// # }
/// ```
pub struct ServiceRegistry {
    factory: Arc<dyn ReferenceFactory>,
    recovery: RecoveryLog,
    services: RwLock<HashMap<ServiceKey, Arc<ProxyHandle>>>,
    register_lock: Mutex<()>,
}

impl ServiceRegistry {
    pub fn new(factory: Arc<dyn ReferenceFactory>, recovery: RecoveryLog) -> Self {
        Self {
            factory,
            recovery,
            services: RwLock::new(HashMap::new()),
            register_lock: Mutex::new(()),
        }
    }

    /// Restores every service recorded in the recovery log.
    ///
    /// Entries are registered without persisting, so replay never grows the
    /// log. Unparseable entries and failed references are logged and
    /// skipped.
    ///
    /// # Returns
    ///
    /// The number of services restored.
    ///
    /// # Errors
    ///
    /// Returns an error only if the recovery log exists but cannot be read.
    pub async fn init(&self) -> Result<usize> {
        let log = self.recovery.clone();
        let entries = blocking(move || log.load()).await?;
        let mut restored = 0;

        for entry in &entries {
            let key = match ServiceKey::parse(entry) {
                Ok(key) => key,
                Err(e) => {
                    tracing::warn!(entry = %entry, "Skipping recovery entry: {}", e);
                    continue;
                }
            };

            match self.register(&key, false).await {
                Ok(true) => restored += 1,
                Ok(false) => {}
                Err(e) => tracing::warn!(service = %key, "Failed to restore service: {}", e),
            }
        }

        tracing::info!(
            entries = entries.len(),
            restored,
            path = %self.recovery.path().display(),
            "Recovery log replayed"
        );
        Ok(restored)
    }

    /// Returns the proxy for `key`, registering it on first use.
    ///
    /// A first-time registration is persisted to the recovery log.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UninitializedProxy`] if the key has no interface
    ///   name and so can never be registered
    /// - Any error from building the remote reference
    pub async fn get_proxy(&self, key: &ServiceKey) -> Result<Arc<ProxyHandle>> {
        if let Some(handle) = self.lookup(key) {
            return Ok(handle);
        }

        self.register(key, true).await?;

        self.lookup(key).ok_or_else(|| {
            BridgeError::UninitializedProxy(format!("service {} is not registered", key))
        })
    }

    /// Registers `key` if it is not cached yet.
    ///
    /// Idempotent and safe to call concurrently. A key with an empty
    /// interface name is ignored. When `persist` is true a new registration
    /// is appended to the recovery log; a failed append is logged and does
    /// not undo the registration.
    ///
    /// # Returns
    ///
    /// `true` only when this call built a new proxy; `false` when the key
    /// was already cached or has no interface name.
    ///
    /// # Errors
    ///
    /// Returns the reference factory's error, or an invalid configuration
    /// error. Nothing is cached or persisted in that case.
    pub async fn register(&self, key: &ServiceKey, persist: bool) -> Result<bool> {
        if !key.has_interface() {
            tracing::info!(service = %key, "Ignoring registration with empty interface name");
            return Ok(false);
        }
        if self.contains(key) {
            return Ok(false);
        }

        let _guard = self.register_lock.lock().await;
        if self.contains(key) {
            return Ok(false);
        }

        let config = ReferenceConfig::for_key(key.clone());
        config.validate()?;

        let handle = ProxyHandle::new(key.clone());
        handle.mark_registering();
        tracing::debug!(service = %key, "Building remote reference");

        let invoker = self.factory.refer(&config).await?;
        handle.bind(invoker);

        if persist {
            let log = self.recovery.clone();
            let line = key.canonical();
            if let Err(e) = blocking(move || log.append(&line)).await {
                tracing::warn!(
                    service = %key,
                    path = %self.recovery.path().display(),
                    "Failed to persist registration: {}",
                    e
                );
            }
        }

        self.services
            .write()
            .unwrap_or_else(PoisonError::into_inner)
            .insert(key.clone(), Arc::new(handle));

        tracing::info!(service = %key, persist, "Service registered");
        Ok(true)
    }

    /// Returns the cached proxy without registering.
    pub fn lookup(&self, key: &ServiceKey) -> Option<Arc<ProxyHandle>> {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .get(key)
            .cloned()
    }

    pub fn contains(&self, key: &ServiceKey) -> bool {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Registered keys in canonical order.
    pub fn keys(&self) -> Vec<ServiceKey> {
        let mut keys: Vec<_> = self
            .services
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .keys()
            .cloned()
            .collect();
        keys.sort();
        keys
    }

    pub fn recovery_log(&self) -> &RecoveryLog {
        &self.recovery
    }

    /// Drops every cached proxy. The recovery log is left untouched.
    pub async fn shutdown(&self) {
        let _guard = self.register_lock.lock().await;
        let mut services = self
            .services
            .write()
            .unwrap_or_else(PoisonError::into_inner);
        let count = services.len();
        services.clear();
        tracing::info!(count, "Service registry shut down");
    }
}

/// Runs recovery log file I/O off the async worker threads.
async fn blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| BridgeError::Io(std::io::Error::new(std::io::ErrorKind::Other, e)))?
}
