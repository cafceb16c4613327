use rpcbridge_common::protocol::error::{BridgeError, Result};
use rpcbridge_common::protocol::metadata::GENERIC_KEY;
use rpcbridge_common::protocol::{resolve_byte_types, ServiceKey};
use rpcbridge_common::transport::ArgumentFrame;
use serde_json::Value;
use std::collections::HashMap;
use std::fmt;
use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, OnceLock};

use crate::invoker::{Attachments, CallContext, Invocation, Invoker};

/// Lifecycle of a proxy handle.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ProxyState {
    /// Created, no remote reference yet
    Uninitialized,
    /// The remote reference is being built
    Registering,
    /// Bound to an invoker and usable
    Ready,
}

impl ProxyState {
    fn from_u8(v: u8) -> Self {
        match v {
            1 => ProxyState::Registering,
            2 => ProxyState::Ready,
            _ => ProxyState::Uninitialized,
        }
    }

    fn as_u8(self) -> u8 {
        match self {
            ProxyState::Uninitialized => 0,
            ProxyState::Registering => 1,
            ProxyState::Ready => 2,
        }
    }
}

/// A successful reply together with the attachments the remote side sent
/// back. `attachments` is empty when the remote side returned none.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct ProxyReply {
    pub data: Vec<u8>,
    pub attachments: HashMap<String, Value>,
}

/// A cached, reusable handle bound to one remote invoker for one service.
///
/// Handles are created and owned by the
/// [`ServiceRegistry`](crate::ServiceRegistry); callers get an `Arc` and can
/// only invoke through it. The invoker is bound at most once.
pub struct ProxyHandle {
    key: ServiceKey,
    invoker: OnceLock<Arc<dyn Invoker>>,
    state: AtomicU8,
}

impl ProxyHandle {
    pub fn new(key: ServiceKey) -> Self {
        ProxyHandle {
            key,
            invoker: OnceLock::new(),
            state: AtomicU8::new(ProxyState::Uninitialized.as_u8()),
        }
    }

    pub fn key(&self) -> &ServiceKey {
        &self.key
    }

    pub fn state(&self) -> ProxyState {
        ProxyState::from_u8(self.state.load(Ordering::Acquire))
    }

    pub fn is_ready(&self) -> bool {
        self.state() == ProxyState::Ready
    }

    pub(crate) fn mark_registering(&self) {
        self.state
            .store(ProxyState::Registering.as_u8(), Ordering::Release);
    }

    /// Binds the remote invoker. Returns false if one was already bound.
    pub fn bind(&self, invoker: Arc<dyn Invoker>) -> bool {
        if self.invoker.set(invoker).is_err() {
            return false;
        }
        self.state.store(ProxyState::Ready.as_u8(), Ordering::Release);
        true
    }

    /// Invokes `method` with already-serialized positional arguments.
    ///
    /// Shorthand for [`invoke_with_reply`](Self::invoke_with_reply) that
    /// keeps only the reply payload.
    pub async fn invoke_with_bytes(
        &self,
        ctx: &mut CallContext,
        method: &str,
        type_hints: &[String],
        args: ArgumentFrame,
    ) -> Result<Vec<u8>> {
        self.invoke_with_reply(ctx, method, type_hints, args)
            .await
            .map(|reply| reply.data)
    }

    /// Invokes `method` and returns the payload with the reply attachments.
    ///
    /// # Flow
    ///
    /// 1. Resolve parameter types from `type_hints`; unhinted arguments are
    ///    byte arrays
    /// 2. Build the invocation envelope and merge `ctx.attachments` into it
    /// 3. Submit it to the bound invoker
    /// 4. Replace `ctx.attachments` with the reply attachments, if any
    /// 5. Classify and log a remote failure
    ///
    /// Remote failures are returned as-is; nothing is retried here.
    ///
    /// # Errors
    ///
    /// - [`BridgeError::UninitializedProxy`] if no invoker is bound
    /// - [`BridgeError::RemoteInvocation`] if the remote side reports an error
    pub async fn invoke_with_reply(
        &self,
        ctx: &mut CallContext,
        method: &str,
        type_hints: &[String],
        args: ArgumentFrame,
    ) -> Result<ProxyReply> {
        let invoker = self.invoker.get().ok_or_else(|| {
            BridgeError::UninitializedProxy(format!(
                "no invoker bound for {}, register the service first",
                self.key
            ))
        })?;

        let types = resolve_byte_types(args.len(), type_hints, ctx.generic);

        let mut invocation = Invocation::new(method, args, type_hints.to_vec());
        invocation.set_parameter_types(types);
        if ctx.generic {
            invocation.set_attachment(GENERIC_KEY, Value::String("true".to_string()));
        }
        for (k, v) in ctx.attachments.to_values() {
            invocation.set_attachment(k, v);
        }

        let result = invoker.invoke(ctx, invocation).await;
        let (value, error, attachments) = result.into_parts();

        if !attachments.is_empty() {
            ctx.attachments = Attachments::Values(attachments.clone());
        }

        match error {
            Some(exception) => {
                match &exception.stack_trace {
                    Some(stack) => tracing::warn!(
                        service = %self.key,
                        method,
                        stack_trace = ?stack,
                        "Invoke service threw exception: {}",
                        exception.message
                    ),
                    None => tracing::warn!(
                        service = %self.key,
                        method,
                        "Invoke result error: {}",
                        exception.message
                    ),
                }
                Err(BridgeError::RemoteInvocation {
                    message: exception.message,
                    stack_trace: exception.stack_trace,
                })
            }
            None => {
                let data = value.unwrap_or_default();
                tracing::debug!(
                    service = %self.key,
                    method,
                    reply_len = data.len(),
                    "Proxy invocation completed"
                );
                Ok(ProxyReply { data, attachments })
            }
        }
    }
}

impl fmt::Debug for ProxyHandle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ProxyHandle")
            .field("key", &self.key)
            .field("state", &self.state())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::invoker::{InvocationResult, RemoteException};
    use async_trait::async_trait;
    use rpcbridge_common::protocol::metadata::PARAMETER_TYPE_KEY;
    use serde_json::json;
    use std::collections::HashMap;
    use std::sync::Mutex;

    /// Records the last envelope and answers with a canned result.
    struct RecordingInvoker {
        last: Mutex<Option<Invocation>>,
        reply: InvocationResult,
    }

    impl RecordingInvoker {
        fn new(reply: InvocationResult) -> Arc<Self> {
            Arc::new(Self {
                last: Mutex::new(None),
                reply,
            })
        }

        fn last(&self) -> Invocation {
            self.last.lock().unwrap().clone().expect("no invocation recorded")
        }
    }

    #[async_trait]
    impl Invoker for RecordingInvoker {
        async fn invoke(&self, _ctx: &CallContext, invocation: Invocation) -> InvocationResult {
            *self.last.lock().unwrap() = Some(invocation);
            self.reply.clone()
        }
    }

    fn bound(reply: InvocationResult) -> (ProxyHandle, Arc<RecordingInvoker>) {
        let invoker = RecordingInvoker::new(reply);
        let handle = ProxyHandle::new(ServiceKey::new("g", "com.example.Svc", "1.0"));
        assert!(handle.bind(invoker.clone()));
        (handle, invoker)
    }

    #[test]
    fn test_state_transitions() {
        let handle = ProxyHandle::new(ServiceKey::new("g", "Svc", "1"));
        assert_eq!(handle.state(), ProxyState::Uninitialized);

        handle.mark_registering();
        assert_eq!(handle.state(), ProxyState::Registering);

        assert!(handle.bind(RecordingInvoker::new(InvocationResult::default())));
        assert!(handle.is_ready());

        // Second bind is refused
        assert!(!handle.bind(RecordingInvoker::new(InvocationResult::default())));
    }

    #[tokio::test]
    async fn test_uninitialized_proxy() {
        let handle = ProxyHandle::new(ServiceKey::new("g", "Svc", "1"));
        let mut ctx = CallContext::default();

        let result = handle.invoke_with_bytes(&mut ctx, "m", &[], vec![]).await;
        assert!(matches!(result, Err(BridgeError::UninitializedProxy(_))));
    }

    #[tokio::test]
    async fn test_envelope_contents() {
        let (handle, invoker) = bound(InvocationResult::success(b"pong".to_vec()));
        let mut ctx = CallContext::default();

        let reply = handle
            .invoke_with_bytes(&mut ctx, "ping", &[], vec![b"a".to_vec(), b"b".to_vec()])
            .await
            .unwrap();
        assert_eq!(reply, b"pong");

        let inv = invoker.last();
        assert_eq!(inv.method_name, "ping");
        assert_eq!(inv.arguments, vec![b"a".to_vec(), b"b".to_vec()]);
        assert!(inv.parameter_type_names.is_empty());
        assert_eq!(inv.parameter_types.len(), 2);
        assert!(inv.parameter_types.iter().all(|t| t.as_str() == "[byte;"));
        assert_eq!(inv.attachment(PARAMETER_TYPE_KEY), Some(&json!(["[byte;", "[byte;"])));
        assert!(inv.attachment(GENERIC_KEY).is_none());
    }

    #[tokio::test]
    async fn test_hints_reach_envelope() {
        let (handle, invoker) = bound(InvocationResult::success(vec![]));
        let mut ctx = CallContext::default();
        let hints = vec!["java.lang.String".to_string()];

        handle
            .invoke_with_bytes(&mut ctx, "m", &hints, vec![b"\"x\"".to_vec()])
            .await
            .unwrap();

        let inv = invoker.last();
        assert_eq!(inv.parameter_type_names, hints);
        assert_eq!(inv.parameter_types[0], "java.lang.String");
    }

    #[tokio::test]
    async fn test_generic_context() {
        let (handle, invoker) = bound(InvocationResult::success(vec![]));
        let mut ctx = CallContext::default().with_generic(true);

        handle
            .invoke_with_bytes(&mut ctx, "$invoke", &[], vec![b"x".to_vec()])
            .await
            .unwrap();

        let inv = invoker.last();
        assert_eq!(inv.parameter_types.len(), 3);
        assert_eq!(inv.attachment(GENERIC_KEY), Some(&json!("true")));
    }

    #[tokio::test]
    async fn test_both_attachment_conventions_merge() {
        let mut strings = HashMap::new();
        strings.insert("s".to_string(), "v".to_string());

        let mut values = HashMap::new();
        values.insert("n".to_string(), json!(3));

        for attachments in [Attachments::Strings(strings), Attachments::Values(values)] {
            let (handle, invoker) = bound(InvocationResult::success(vec![]));
            let expected = attachments.to_values();
            let mut ctx = CallContext::default().with_attachments(attachments);

            handle.invoke_with_bytes(&mut ctx, "m", &[], vec![]).await.unwrap();

            let inv = invoker.last();
            for (k, v) in expected {
                assert_eq!(inv.attachment(&k), Some(&v));
            }
        }
    }

    #[tokio::test]
    async fn test_reply_attachments_replace_context() {
        let mut reply_attachments = HashMap::new();
        reply_attachments.insert("server".to_string(), json!("node-1"));
        let (handle, _) = bound(
            InvocationResult::success(vec![]).with_attachments(reply_attachments.clone()),
        );

        let mut sent = HashMap::new();
        sent.insert("client".to_string(), "c".to_string());
        let mut ctx = CallContext::default().with_attachments(sent);

        handle.invoke_with_bytes(&mut ctx, "m", &[], vec![]).await.unwrap();

        assert_eq!(ctx.attachments, Attachments::Values(reply_attachments));
    }

    #[tokio::test]
    async fn test_reply_carries_only_remote_attachments() {
        let mut echoed = HashMap::new();
        echoed.insert("client".to_string(), json!("c"));
        let (handle, _) =
            bound(InvocationResult::success(b"r".to_vec()).with_attachments(echoed.clone()));

        let mut sent = HashMap::new();
        sent.insert("client".to_string(), "c".to_string());
        let mut ctx = CallContext::default().with_attachments(sent);

        let reply = handle.invoke_with_reply(&mut ctx, "m", &[], vec![]).await.unwrap();
        assert_eq!(reply.data, b"r");
        assert_eq!(reply.attachments, echoed);

        // Nothing back means nothing in the reply, whatever was sent
        let (handle, _) = bound(InvocationResult::success(vec![]));
        let reply = handle.invoke_with_reply(&mut ctx, "m", &[], vec![]).await.unwrap();
        assert!(reply.attachments.is_empty());
    }

    #[tokio::test]
    async fn test_empty_reply_attachments_keep_context() {
        let (handle, _) = bound(InvocationResult::success(vec![]));

        let mut sent = HashMap::new();
        sent.insert("client".to_string(), "c".to_string());
        let mut ctx = CallContext::default().with_attachments(sent.clone());

        handle.invoke_with_bytes(&mut ctx, "m", &[], vec![]).await.unwrap();

        assert_eq!(ctx.attachments, Attachments::Strings(sent));
    }

    #[tokio::test]
    async fn test_remote_exception_with_stack() {
        let stack = vec!["at com.example.Svc.call(Svc.java:42)".to_string()];
        let (handle, _) = bound(InvocationResult::failure(RemoteException::thrown(
            "java.lang.IllegalStateException",
            stack.clone(),
        )));
        let mut ctx = CallContext::default();

        let err = handle
            .invoke_with_bytes(&mut ctx, "m", &[], vec![])
            .await
            .unwrap_err();

        match err {
            BridgeError::RemoteInvocation { message, stack_trace } => {
                assert_eq!(message, "java.lang.IllegalStateException");
                assert_eq!(stack_trace, Some(stack));
            }
            other => panic!("Expected RemoteInvocation, got {:?}", other),
        }
    }

    #[tokio::test]
    async fn test_remote_plain_error() {
        let (handle, _) = bound(InvocationResult::failure(RemoteException::message("timeout")));
        let mut ctx = CallContext::default();

        let err = handle
            .invoke_with_bytes(&mut ctx, "m", &[], vec![])
            .await
            .unwrap_err();

        assert!(matches!(
            err,
            BridgeError::RemoteInvocation { stack_trace: None, .. }
        ));
    }

    #[tokio::test]
    async fn test_missing_reply_is_empty() {
        let (handle, _) = bound(InvocationResult::default());
        let mut ctx = CallContext::default();

        let reply = handle.invoke_with_bytes(&mut ctx, "m", &[], vec![]).await.unwrap();
        assert!(reply.is_empty());
    }
}
