//! Remote type resolution.
//!
//! The remote framework describes every positional argument with a Java type
//! name. Callers on this side hold untyped values, so this module derives the
//! descriptor list for a call either from explicit hints or from the shape
//! of each [`ArgValue`].
//!
//! # Precedence
//!
//! 1. Generic calls always use the fixed [`GENERIC_SIGNATURE`].
//! 2. No arguments resolve to no descriptors.
//! 3. A hint list with exactly one hint per argument is used verbatim.
//! 4. Otherwise every argument is classified by shape. A partial hint list
//!    is ignored rather than merged.

use serde::{Deserialize, Serialize};
use std::fmt;
use std::time::SystemTime;

use super::error::{BridgeError, Result};

pub const VOID: &str = "V";
pub const BOOL: &str = "bool";
pub const BOOL_ARRAY: &str = "[bool;";
pub const BYTE: &str = "byte";
pub const BYTE_ARRAY: &str = "[byte;";
pub const SHORT: &str = "short";
pub const SHORT_ARRAY: &str = "[short;";
pub const CHAR: &str = "char";
pub const CHAR_ARRAY: &str = "[char;";
pub const INT: &str = "int";
pub const INT_ARRAY: &str = "[int;";
pub const LONG: &str = "long";
pub const LONG_ARRAY: &str = "[long;";
pub const FLOAT: &str = "float";
pub const FLOAT_ARRAY: &str = "[float;";
pub const DOUBLE: &str = "double";
pub const DOUBLE_ARRAY: &str = "[double;";
pub const STRING: &str = "java.lang.String";
pub const STRING_ARRAY: &str = "[Ljava.lang.String;";
pub const DATE: &str = "java.util.Date";
pub const DATE_ARRAY: &str = "[Ljava.util.Date;";
pub const OBJECT: &str = "java.lang.Object";
pub const OBJECT_ARRAY: &str = "[Ljava.lang.Object;";
pub const LIST: &str = "java.util.List";
pub const MAP: &str = "java.util.Map";

/// Signature of a generic invocation: method name, parameter type names,
/// argument values.
pub const GENERIC_SIGNATURE: [&str; 3] = [STRING, STRING_ARRAY, OBJECT_ARRAY];

/// A remote-visible type name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct TypeDescriptor(String);

impl TypeDescriptor {
    pub fn new(name: impl Into<String>) -> Self {
        TypeDescriptor(name.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }

    pub fn into_string(self) -> String {
        self.0
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for TypeDescriptor {
    fn from(name: &str) -> Self {
        TypeDescriptor::new(name)
    }
}

impl From<String> for TypeDescriptor {
    fn from(name: String) -> Self {
        TypeDescriptor(name)
    }
}

impl PartialEq<&str> for TypeDescriptor {
    fn eq(&self, other: &&str) -> bool {
        self.0 == *other
    }
}

/// A struct-like argument.
///
/// `class_name` is set when the value knows the remote class it maps to;
/// anonymous composites are sent as `java.lang.Object`.
#[derive(Debug, Clone, PartialEq, Default)]
pub struct Composite {
    pub class_name: Option<String>,
    pub fields: Vec<(String, ArgValue)>,
}

impl Composite {
    pub fn named(class_name: impl Into<String>) -> Self {
        Composite {
            class_name: Some(class_name.into()),
            fields: Vec::new(),
        }
    }

    pub fn with_field(mut self, name: impl Into<String>, value: ArgValue) -> Self {
        self.fields.push((name.into(), value));
        self
    }
}

/// An untyped call argument, classified by shape.
#[derive(Debug, Clone, PartialEq)]
pub enum ArgValue {
    Null,
    Bool(bool),
    Bools(Vec<bool>),
    Byte(i8),
    Bytes(Vec<u8>),
    Short(i16),
    Shorts(Vec<i16>),
    /// UTF-16 code unit, the remote `char`
    Char(u16),
    Chars(Vec<u16>),
    Int(i32),
    Ints(Vec<i32>),
    Long(i64),
    Longs(Vec<i64>),
    Float(f32),
    Floats(Vec<f32>),
    Double(f64),
    Doubles(Vec<f64>),
    String(String),
    Strings(Vec<String>),
    Date(SystemTime),
    Dates(Vec<SystemTime>),
    Object(Composite),
    Objects(Vec<Composite>),
    List(Vec<ArgValue>),
    Map(Vec<(ArgValue, ArgValue)>),
    /// A host value with no remote-visible shape (handles, callbacks, ...).
    Opaque(String),
}

impl ArgValue {
    /// Short shape name used in diagnostics.
    pub fn shape(&self) -> &str {
        match self {
            ArgValue::Null => "null",
            ArgValue::Bool(_) => "bool",
            ArgValue::Bools(_) => "bool[]",
            ArgValue::Byte(_) => "byte",
            ArgValue::Bytes(_) => "byte[]",
            ArgValue::Short(_) => "short",
            ArgValue::Shorts(_) => "short[]",
            ArgValue::Char(_) => "char",
            ArgValue::Chars(_) => "char[]",
            ArgValue::Int(_) => "int",
            ArgValue::Ints(_) => "int[]",
            ArgValue::Long(_) => "long",
            ArgValue::Longs(_) => "long[]",
            ArgValue::Float(_) => "float",
            ArgValue::Floats(_) => "float[]",
            ArgValue::Double(_) => "double",
            ArgValue::Doubles(_) => "double[]",
            ArgValue::String(_) => "string",
            ArgValue::Strings(_) => "string[]",
            ArgValue::Date(_) => "date",
            ArgValue::Dates(_) => "date[]",
            ArgValue::Object(_) => "object",
            ArgValue::Objects(_) => "object[]",
            ArgValue::List(_) => "list",
            ArgValue::Map(_) => "map",
            ArgValue::Opaque(kind) => kind,
        }
    }

    /// Classifies the value, or `None` when its shape has no remote type.
    pub fn type_descriptor(&self) -> Option<TypeDescriptor> {
        let name = match self {
            ArgValue::Null => VOID,
            ArgValue::Bool(_) => BOOL,
            ArgValue::Bools(_) => BOOL_ARRAY,
            ArgValue::Byte(_) => BYTE,
            ArgValue::Bytes(_) => BYTE_ARRAY,
            ArgValue::Short(_) => SHORT,
            ArgValue::Shorts(_) => SHORT_ARRAY,
            ArgValue::Char(_) => CHAR,
            ArgValue::Chars(_) => CHAR_ARRAY,
            ArgValue::Int(_) => INT,
            ArgValue::Ints(_) => INT_ARRAY,
            ArgValue::Long(_) => LONG,
            ArgValue::Longs(_) => LONG_ARRAY,
            ArgValue::Float(_) => FLOAT,
            ArgValue::Floats(_) => FLOAT_ARRAY,
            ArgValue::Double(_) => DOUBLE,
            ArgValue::Doubles(_) => DOUBLE_ARRAY,
            ArgValue::String(_) => STRING,
            ArgValue::Strings(_) => STRING_ARRAY,
            ArgValue::Date(_) => DATE,
            ArgValue::Dates(_) => DATE_ARRAY,
            ArgValue::Object(Composite {
                class_name: Some(class_name),
                ..
            }) => return Some(TypeDescriptor::new(class_name.clone())),
            ArgValue::Object(_) => OBJECT,
            ArgValue::Objects(_) => OBJECT_ARRAY,
            ArgValue::List(_) => LIST,
            ArgValue::Map(_) => MAP,
            ArgValue::Opaque(_) => return None,
        };
        Some(TypeDescriptor::from(name))
    }
}

impl From<Vec<u8>> for ArgValue {
    fn from(bytes: Vec<u8>) -> Self {
        ArgValue::Bytes(bytes)
    }
}

impl From<&str> for ArgValue {
    fn from(s: &str) -> Self {
        ArgValue::String(s.to_string())
    }
}

impl From<String> for ArgValue {
    fn from(s: String) -> Self {
        ArgValue::String(s)
    }
}

impl From<serde_json::Value> for ArgValue {
    fn from(value: serde_json::Value) -> Self {
        use serde_json::Value;

        match value {
            Value::Null => ArgValue::Null,
            Value::Bool(b) => ArgValue::Bool(b),
            Value::Number(n) => match n.as_i64() {
                Some(i) => ArgValue::Long(i),
                None => ArgValue::Double(n.as_f64().unwrap_or_default()),
            },
            Value::String(s) => ArgValue::String(s),
            Value::Array(items) => array_from_json(items),
            Value::Object(map) => ArgValue::Object(
                map.into_iter()
                    .fold(Composite::default(), |c, (k, v)| c.with_field(k, ArgValue::from(v))),
            ),
        }
    }
}

/// Uniform arrays of primitives become typed arrays, arrays of objects become
/// object arrays, anything else is a list.
fn array_from_json(items: Vec<serde_json::Value>) -> ArgValue {
    use serde_json::Value;

    if items.is_empty() {
        return ArgValue::List(Vec::new());
    }
    if items.iter().all(Value::is_boolean) {
        return ArgValue::Bools(items.iter().filter_map(Value::as_bool).collect());
    }
    if items.iter().all(Value::is_i64) {
        return ArgValue::Longs(items.iter().filter_map(Value::as_i64).collect());
    }
    if items.iter().all(Value::is_number) {
        return ArgValue::Doubles(items.iter().filter_map(Value::as_f64).collect());
    }
    if items.iter().all(Value::is_string) {
        return ArgValue::Strings(
            items
                .into_iter()
                .filter_map(|v| match v {
                    Value::String(s) => Some(s),
                    _ => None,
                })
                .collect(),
        );
    }
    if items.iter().all(Value::is_object) {
        return ArgValue::Objects(
            items
                .into_iter()
                .filter_map(|v| match ArgValue::from(v) {
                    ArgValue::Object(c) => Some(c),
                    _ => None,
                })
                .collect(),
        );
    }
    ArgValue::List(items.into_iter().map(ArgValue::from).collect())
}

/// Resolves the remote parameter types of a call.
///
/// # Arguments
///
/// * `args` - The positional argument values
/// * `hints` - Caller-declared type names, used only when there is exactly
///   one per argument
/// * `generic` - Whether the call uses the generic invocation convention
///
/// # Errors
///
/// Returns [`BridgeError::UnresolvableType`] naming the first argument whose
/// shape cannot be classified.
///
/// # Example
///
/// ```
/// use rpcbridge_common::protocol::types::{resolve_types, ArgValue};
///
/// let types = resolve_types(&[ArgValue::Int(1), ArgValue::from("a")], &[], false).unwrap();
/// assert_eq!(types[0], "int");
/// assert_eq!(types[1], "java.lang.String");
/// ```
pub fn resolve_types(
    args: &[ArgValue],
    hints: &[String],
    generic: bool,
) -> Result<Vec<TypeDescriptor>> {
    if let Some(types) = declared_types(args.len(), hints, generic) {
        return Ok(types);
    }

    args.iter()
        .enumerate()
        .map(|(index, arg)| {
            arg.type_descriptor().ok_or_else(|| BridgeError::UnresolvableType {
                index,
                shape: arg.shape().to_string(),
            })
        })
        .collect()
}

/// Resolves the parameter types of `count` raw byte-array arguments.
///
/// Follows the same precedence as [`resolve_types`] without needing the
/// argument values: every unhinted argument is a `[byte;`.
pub fn resolve_byte_types(count: usize, hints: &[String], generic: bool) -> Vec<TypeDescriptor> {
    declared_types(count, hints, generic)
        .unwrap_or_else(|| vec![TypeDescriptor::from(BYTE_ARRAY); count])
}

/// Steps 1 to 3 of the precedence; `None` means classify each argument.
fn declared_types(count: usize, hints: &[String], generic: bool) -> Option<Vec<TypeDescriptor>> {
    if generic {
        return Some(GENERIC_SIGNATURE.iter().map(|&t| TypeDescriptor::from(t)).collect());
    }
    if count == 0 {
        return Some(Vec::new());
    }
    if hints.len() == count {
        return Some(hints.iter().cloned().map(TypeDescriptor::from).collect());
    }
    None
}

/// Splits a comma-separated parameter type list. An empty string yields no
/// hints.
pub fn parse_type_hints(list: &str) -> Vec<String> {
    if list.is_empty() {
        return Vec::new();
    }
    list.split(',').map(str::to_string).collect()
}
