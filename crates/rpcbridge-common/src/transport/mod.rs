//! RpcBridge Transport Layer
//!
//! This module packs positional call arguments into the single binary
//! payload that travels between the hosting application and the bridge.
//!
//! # Wire Format
//!
//! - **Count**: 4-byte big-endian `i32` number of frames
//! - **Lengths**: one 4-byte big-endian `i32` per frame
//! - **Payloads**: frame bytes concatenated in order, no padding
//!
//! Decoding is all-or-nothing: a buffer whose header and declared lengths
//! do not account for every byte is rejected.
//!
//! # Example
//!
//! ```
//! use rpcbridge_common::transport::FrameCodec;
//!
//! let payload = FrameCodec::encode(&[b"{\"id\":1}".to_vec()]).unwrap();
//! let frames = FrameCodec::decode(&payload).unwrap();
//! assert_eq!(frames.len(), 1);
//! ```

pub mod codec;

pub use codec::{ArgumentFrame, FrameCodec};

#[cfg(test)]
mod tests;
