//! RpcBridge Common Types and Framing
//!
//! This crate provides the protocol definitions and argument framing shared
//! by every RpcBridge component.
//!
//! # Overview
//!
//! RpcBridge lets an event-driven application call methods on services that
//! live behind a statically typed, cross-language RPC framework. The
//! application sends untyped byte payloads; the bridge works out the remote
//! type signature, resolves a cached proxy and performs the call. This crate
//! contains the pieces that need no runtime:
//!
//! - **Protocol Layer**: service keys, error handling, remote type resolution
//!   and metadata keys
//! - **Transport Layer**: the binary argument frame codec
//!
//! # Components
//!
//! - [`protocol`] - Core protocol types (ServiceKey, ArgValue, BridgeError)
//! - [`transport`] - Argument frame codec
//!
//! # Example
//!
//! ```
//! use rpcbridge_common::{resolve_types, ArgValue, FrameCodec, ServiceKey};
//!
//! let key: ServiceKey = "grp/com.example.Svc:1.0".parse().unwrap();
//!
//! let payload = FrameCodec::encode(&[b"arg".to_vec()]).unwrap();
//! let frames = FrameCodec::decode(&payload).unwrap();
//!
//! let args: Vec<ArgValue> = frames.into_iter().map(ArgValue::from).collect();
//! let types = resolve_types(&args, &[], false).unwrap();
//! assert_eq!(types[0], "[byte;");
//! ```

pub mod protocol;
pub mod transport;

pub use protocol::*;
pub use transport::{ArgumentFrame, FrameCodec};
