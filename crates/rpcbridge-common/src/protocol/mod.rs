pub mod error;
pub mod key;
pub mod metadata;
pub mod types;


pub use error::{BridgeError, Result};
pub use key::ServiceKey;
pub use types::{
    resolve_byte_types, resolve_types, ArgValue, Composite, TypeDescriptor, GENERIC_SIGNATURE,
};
