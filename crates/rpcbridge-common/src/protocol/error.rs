use thiserror::Error;

#[derive(Error, Debug)]
pub enum BridgeError {
    #[error("Malformed frame: {0}")]
    MalformedFrame(String),

    #[error("Cannot resolve remote type of argument {index} ({shape})")]
    UnresolvableType { index: usize, shape: String },

    #[error("Proxy not initialized: {0}")]
    UninitializedProxy(String),

    #[error("Invalid metadata: {0}")]
    InvalidMetadata(String),

    #[error("Invalid service key: {0}")]
    InvalidKey(String),

    #[error("Remote invocation failed: {message}")]
    RemoteInvocation {
        message: String,
        /// Stack trace elements when the remote side threw a structured exception
        stack_trace: Option<Vec<String>>,
    },

    #[error("Reference error: {0}")]
    Reference(String),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl BridgeError {
    /// Returns true when the failure came back from the remote service
    /// rather than from local validation.
    pub fn is_remote(&self) -> bool {
        matches!(self, BridgeError::RemoteInvocation { .. })
    }
}

pub type Result<T> = std::result::Result<T, BridgeError>;
