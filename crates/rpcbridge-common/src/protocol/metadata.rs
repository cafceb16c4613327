//! Metadata and attachment keys shared with the hosting application and the
//! remote framework.

/// Group of the target service.
pub const RPC_GROUP: &str = "rpc-group";
/// Version of the target service.
pub const RPC_VERSION: &str = "rpc-version";
/// Fully qualified interface name of the target service.
pub const RPC_INTERFACE: &str = "rpc-interface-name";
/// Method to invoke.
pub const RPC_METHOD_NAME: &str = "rpc-method-name";
/// Optional comma-separated parameter type names.
pub const RPC_METHOD_PARAMETER_TYPES: &str = "rpc-method-parameter-types";
/// `"true"` when the payload is already serialized by the caller.
pub const RPC_PASS_THROUGH: &str = "rpc-pass-through";
/// `"true"` for generic invocations.
pub const RPC_GENERIC: &str = "rpc-generic";
/// Serializer used for pass-through payloads. Required with pass-through.
pub const RPC_SERIALIZATION_TYPE: &str = "rpc-serialization-type";

/// Binding property: comma-separated `group/interface:version` list.
pub const PROPERTY_SUBSCRIBERS: &str = "subscribers";
/// Binding property: call timeout in milliseconds.
pub const PROPERTY_TIMEOUT: &str = "timeout";

/// Attachment carrying the pass-through serializer name.
pub const SERIALIZE_TYPE_KEY: &str = "_SERIALIZETYPE";
/// Attachment carrying the resolved parameter type descriptors.
pub const PARAMETER_TYPE_KEY: &str = "parameter-type-key";
/// Attachment marking a generic invocation.
pub const GENERIC_KEY: &str = "generic";
