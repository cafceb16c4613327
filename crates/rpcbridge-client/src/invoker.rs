//! Seams to the remote framework.
//!
//! The bridge never opens connections itself. An [`Invoker`] performs one
//! remote call from a prepared [`Invocation`] envelope, and a
//! [`ReferenceFactory`] turns a [`ReferenceConfig`] into such an invoker
//! (discovery, connection setup and load balancing all live behind it).

use async_trait::async_trait;
use rpcbridge_common::protocol::error::Result;
use rpcbridge_common::protocol::metadata::PARAMETER_TYPE_KEY;
use rpcbridge_common::protocol::TypeDescriptor;
use serde_json::Value;
use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use crate::config::{ReferenceConfig, DEFAULT_TIMEOUT_MS};

/// Out-of-band key/value metadata carried alongside a call.
///
/// Callers written against either convention are accepted: plain string
/// maps and maps of arbitrary JSON values. Both are merged into the
/// envelope key by key.
#[derive(Debug, Clone, PartialEq)]
pub enum Attachments {
    Strings(HashMap<String, String>),
    Values(HashMap<String, Value>),
}

impl Attachments {
    pub fn len(&self) -> usize {
        match self {
            Attachments::Strings(m) => m.len(),
            Attachments::Values(m) => m.len(),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Looks up an attachment, converting string entries to JSON strings.
    pub fn get(&self, key: &str) -> Option<Value> {
        match self {
            Attachments::Strings(m) => m.get(key).cloned().map(Value::String),
            Attachments::Values(m) => m.get(key).cloned(),
        }
    }

    /// Inserts a value, widening a string map if the value is not a string.
    pub fn insert(&mut self, key: impl Into<String>, value: Value) {
        if matches!(self, Attachments::Strings(_)) && !value.is_string() {
            *self = Attachments::Values(self.to_values());
        }
        match self {
            Attachments::Strings(m) => {
                if let Value::String(s) = value {
                    m.insert(key.into(), s);
                }
            }
            Attachments::Values(m) => {
                m.insert(key.into(), value);
            }
        }
    }

    /// Every entry as a JSON value.
    pub fn to_values(&self) -> HashMap<String, Value> {
        match self {
            Attachments::Strings(m) => m
                .iter()
                .map(|(k, v)| (k.clone(), Value::String(v.clone())))
                .collect(),
            Attachments::Values(m) => m.clone(),
        }
    }
}

impl Default for Attachments {
    fn default() -> Self {
        Attachments::Values(HashMap::new())
    }
}

impl From<HashMap<String, String>> for Attachments {
    fn from(m: HashMap<String, String>) -> Self {
        Attachments::Strings(m)
    }
}

impl From<HashMap<String, Value>> for Attachments {
    fn from(m: HashMap<String, Value>) -> Self {
        Attachments::Values(m)
    }
}

/// Per-call context handed to the invoker.
///
/// Timeouts and cancellation are the invoker's business; the bridge only
/// carries the configured budget. After a call, `attachments` holds whatever
/// the remote side sent back, if it sent anything.
#[derive(Debug, Clone)]
pub struct CallContext {
    pub timeout: Duration,
    pub generic: bool,
    pub attachments: Attachments,
}

impl CallContext {
    pub fn new(timeout: Duration) -> Self {
        CallContext {
            timeout,
            generic: false,
            attachments: Attachments::default(),
        }
    }

    pub fn with_attachments(mut self, attachments: impl Into<Attachments>) -> Self {
        self.attachments = attachments.into();
        self
    }

    pub fn with_generic(mut self, generic: bool) -> Self {
        self.generic = generic;
        self
    }
}

impl Default for CallContext {
    fn default() -> Self {
        CallContext::new(Duration::from_millis(DEFAULT_TIMEOUT_MS))
    }
}

/// The call envelope submitted to an [`Invoker`].
///
/// The reply comes back in [`InvocationResult::value`].
#[derive(Debug, Clone, PartialEq)]
pub struct Invocation {
    pub method_name: String,
    pub arguments: Vec<Vec<u8>>,
    /// Type names exactly as the caller declared them
    pub parameter_type_names: Vec<String>,
    /// Resolved remote parameter types
    pub parameter_types: Vec<TypeDescriptor>,
    pub attachments: HashMap<String, Value>,
}

impl Invocation {
    pub fn new(
        method_name: impl Into<String>,
        arguments: Vec<Vec<u8>>,
        parameter_type_names: Vec<String>,
    ) -> Self {
        Invocation {
            method_name: method_name.into(),
            arguments,
            parameter_type_names,
            parameter_types: Vec::new(),
            attachments: HashMap::new(),
        }
    }

    /// Sets the resolved parameter types and mirrors them into the
    /// `parameter-type-key` attachment.
    pub fn set_parameter_types(&mut self, types: Vec<TypeDescriptor>) {
        let names = types.iter().map(|t| Value::String(t.to_string())).collect();
        self.attachments
            .insert(PARAMETER_TYPE_KEY.to_string(), Value::Array(names));
        self.parameter_types = types;
    }

    pub fn set_attachment(&mut self, key: impl Into<String>, value: Value) {
        self.attachments.insert(key.into(), value);
    }

    pub fn attachment(&self, key: &str) -> Option<&Value> {
        self.attachments.get(key)
    }
}

/// Application-level failure reported by the remote side.
///
/// `stack_trace` is present when the remote framework delivered a thrown
/// exception with its stack elements rather than a bare message.
#[derive(Debug, Clone, PartialEq)]
pub struct RemoteException {
    pub message: String,
    pub stack_trace: Option<Vec<String>>,
}

impl RemoteException {
    pub fn message(message: impl Into<String>) -> Self {
        RemoteException {
            message: message.into(),
            stack_trace: None,
        }
    }

    pub fn thrown(message: impl Into<String>, stack_trace: Vec<String>) -> Self {
        RemoteException {
            message: message.into(),
            stack_trace: Some(stack_trace),
        }
    }
}

/// Outcome of one remote call.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct InvocationResult {
    value: Option<Vec<u8>>,
    error: Option<RemoteException>,
    attachments: HashMap<String, Value>,
}

impl InvocationResult {
    pub fn success(value: Vec<u8>) -> Self {
        InvocationResult {
            value: Some(value),
            ..Default::default()
        }
    }

    pub fn failure(error: RemoteException) -> Self {
        InvocationResult {
            error: Some(error),
            ..Default::default()
        }
    }

    pub fn with_attachments(mut self, attachments: HashMap<String, Value>) -> Self {
        self.attachments = attachments;
        self
    }

    pub fn value(&self) -> Option<&[u8]> {
        self.value.as_deref()
    }

    pub fn error(&self) -> Option<&RemoteException> {
        self.error.as_ref()
    }

    pub fn attachments(&self) -> &HashMap<String, Value> {
        &self.attachments
    }

    pub fn into_parts(
        self,
    ) -> (Option<Vec<u8>>, Option<RemoteException>, HashMap<String, Value>) {
        (self.value, self.error, self.attachments)
    }
}

/// Performs a single remote call.
#[async_trait]
pub trait Invoker: Send + Sync {
    async fn invoke(&self, ctx: &CallContext, invocation: Invocation) -> InvocationResult;
}

/// Builds the remote reference for one service binding.
///
/// Called at most once per service key by the registry, while its
/// registration lock is held.
#[async_trait]
pub trait ReferenceFactory: Send + Sync {
    async fn refer(&self, config: &ReferenceConfig) -> Result<Arc<dyn Invoker>>;
}
