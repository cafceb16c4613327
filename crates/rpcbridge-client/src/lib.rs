pub mod binding;
pub mod config;
pub mod invoker;
pub mod proxy;
pub mod recovery;
pub mod registry;

pub use binding::{InvokeRequest, InvokeResponse, OperationKind, OutputBinding};
pub use config::{BindingConfig, ReferenceConfig, DEFAULT_TIMEOUT_MS};
pub use invoker::{
    Attachments, CallContext, Invocation, InvocationResult, Invoker, ReferenceFactory,
    RemoteException,
};
pub use proxy::{ProxyHandle, ProxyReply, ProxyState};
pub use recovery::RecoveryLog;
pub use registry::ServiceRegistry;
