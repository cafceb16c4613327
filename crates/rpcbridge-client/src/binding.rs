//! Output binding: the hosting application's entry point.
//!
//! An [`InvokeRequest`] carries the target service and method in its metadata
//! and the positional arguments as one frame-codec buffer. The binding
//! validates the metadata, resolves the cached proxy through the
//! [`ServiceRegistry`] and hands the decoded arguments to it.

use rpcbridge_common::protocol::error::{BridgeError, Result};
use rpcbridge_common::protocol::metadata::{
    RPC_GENERIC, RPC_GROUP, RPC_INTERFACE, RPC_METHOD_NAME, RPC_METHOD_PARAMETER_TYPES,
    RPC_PASS_THROUGH, RPC_SERIALIZATION_TYPE, RPC_VERSION, SERIALIZE_TYPE_KEY,
};
use rpcbridge_common::protocol::types::parse_type_hints;
use rpcbridge_common::protocol::ServiceKey;
use rpcbridge_common::transport::FrameCodec;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;

use crate::config::BindingConfig;
use crate::invoker::{Attachments, CallContext};
use crate::registry::ServiceRegistry;

/// Operations a binding supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum OperationKind {
    Create,
}

/// A call request from the hosting application.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvokeRequest {
    /// Frame-codec encoded arguments
    pub data: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

impl InvokeRequest {
    pub fn new(data: Vec<u8>) -> Self {
        InvokeRequest {
            data,
            metadata: HashMap::new(),
        }
    }

    pub fn with_metadata(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.metadata.insert(key.into(), value.into());
        self
    }
}

/// Reply payload plus any attachments the remote side returned.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct InvokeResponse {
    pub data: Vec<u8>,
    pub metadata: HashMap<String, String>,
}

/// Binds the hosting application to remote services.
///
/// # Example
///
/// ```rust,no_run
/// use rpcbridge_client::{InvokeRequest, OutputBinding, ServiceRegistry};
/// use rpcbridge_common::FrameCodec;
/// use std::collections::HashMap;
/// use std::sync::Arc;
///
/// # async fn run(registry: Arc<ServiceRegistry>) -> rpcbridge_common::Result<()> {
/// let mut binding = OutputBinding::new(registry);
/// binding.init(&HashMap::new()).await?;
///
/// let request = InvokeRequest::new(FrameCodec::encode(&[b"world"])?)
///     .with_metadata("rpc-group", "grp")
///     .with_metadata("rpc-interface-name", "com.example.Greeter")
///     .with_metadata("rpc-version", "1.0")
///     .with_metadata("rpc-method-name", "sayHello")
///     .with_metadata("rpc-pass-through", "true")
///     .with_metadata("rpc-serialization-type", "hessian2");
///
/// let response = binding.invoke(request).await?;
/// # Ok(())
/// # }
/// ```
pub struct OutputBinding {
    registry: Arc<ServiceRegistry>,
    config: BindingConfig,
}

impl OutputBinding {
    pub fn new(registry: Arc<ServiceRegistry>) -> Self {
        OutputBinding {
            registry,
            config: BindingConfig::default(),
        }
    }

    pub fn config(&self) -> &BindingConfig {
        &self.config
    }

    pub fn registry(&self) -> &Arc<ServiceRegistry> {
        &self.registry
    }

    /// Applies binding properties and warms the registry.
    ///
    /// Replays the recovery log, then registers every configured subscriber
    /// without persisting it. A subscriber that cannot be referenced is
    /// logged and skipped.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidMetadata`] for a malformed `subscribers` entry
    /// - [`BridgeError::Io`] if the recovery log cannot be read
    pub async fn init(&mut self, properties: &HashMap<String, String>) -> Result<()> {
        self.config = BindingConfig::from_properties(properties)?;

        let restored = self.registry.init().await?;

        for key in &self.config.subscribers {
            if let Err(e) = self.registry.register(key, false).await {
                tracing::warn!(service = %key, "Failed to register subscriber: {}", e);
            }
        }

        tracing::info!(
            restored,
            subscribers = self.config.subscribers.len(),
            timeout_ms = self.config.timeout_ms,
            "Output binding initialized"
        );
        Ok(())
    }

    /// Performs one remote call.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::InvalidMetadata`] if group, interface, version or
    ///   method is missing, pass-through is not enabled, or no serializer is
    ///   named
    /// - [`BridgeError::MalformedFrame`] if the payload fails to decode
    /// - Any registry or invocation error
    pub async fn invoke(&self, request: InvokeRequest) -> Result<InvokeResponse> {
        let metadata = &request.metadata;
        let key = ServiceKey::new(
            required(metadata, RPC_GROUP)?,
            required(metadata, RPC_INTERFACE)?,
            required(metadata, RPC_VERSION)?,
        );
        let method = required(metadata, RPC_METHOD_NAME)?;

        if metadata.get(RPC_PASS_THROUGH).map(String::as_str) != Some("true") {
            return Err(BridgeError::InvalidMetadata(format!(
                "{} must be \"true\"",
                RPC_PASS_THROUGH
            )));
        }
        let serializer = match metadata.get(RPC_SERIALIZATION_TYPE) {
            Some(s) if !s.is_empty() => s,
            _ => {
                return Err(BridgeError::InvalidMetadata(format!(
                    "{} is required for pass-through calls",
                    RPC_SERIALIZATION_TYPE
                )))
            }
        };

        let type_hints = metadata
            .get(RPC_METHOD_PARAMETER_TYPES)
            .map(|list| parse_type_hints(list))
            .unwrap_or_default();
        let generic = metadata.get(RPC_GENERIC).map(String::as_str) == Some("true");

        let args = FrameCodec::decode(&request.data)?;
        let proxy = self.registry.get_proxy(&key).await?;

        let mut sent = HashMap::new();
        sent.insert(
            SERIALIZE_TYPE_KEY.to_string(),
            Value::String(serializer.clone()),
        );
        let mut ctx = CallContext::new(self.config.timeout())
            .with_generic(generic)
            .with_attachments(Attachments::Values(sent));

        tracing::debug!(service = %key, method, args = args.len(), "Invoking");
        let reply = proxy
            .invoke_with_reply(&mut ctx, method, &type_hints, args)
            .await?;

        Ok(InvokeResponse {
            data: reply.data,
            metadata: stringify(reply.attachments),
        })
    }

    /// Registers the service named in `metadata` and persists it.
    ///
    /// Reads the same group, interface and version keys as
    /// [`invoke`](Self::invoke). An empty interface name is ignored.
    pub async fn subscribe(&self, metadata: &HashMap<String, String>) -> Result<()> {
        let get = |k: &str| metadata.get(k).cloned().unwrap_or_default();
        let key = ServiceKey::new(get(RPC_GROUP), get(RPC_INTERFACE), get(RPC_VERSION));
        self.registry.register(&key, true).await?;
        Ok(())
    }

    pub fn operations(&self) -> Vec<OperationKind> {
        vec![OperationKind::Create]
    }

    pub async fn shutdown(&self) {
        self.registry.shutdown().await;
    }
}

fn required<'a>(metadata: &'a HashMap<String, String>, key: &str) -> Result<&'a str> {
    match metadata.get(key) {
        Some(v) if !v.is_empty() => Ok(v.as_str()),
        _ => {
            tracing::warn!(key, "Missing required metadata");
            Err(BridgeError::InvalidMetadata(format!(
                "missing required metadata '{}'",
                key
            )))
        }
    }
}

fn stringify(attachments: HashMap<String, Value>) -> HashMap<String, String> {
    attachments
        .into_iter()
        .map(|(k, v)| match v {
            Value::String(s) => (k, s),
            other => (k, other.to_string()),
        })
        .collect()
}
