//! DAP collaborator contracts.
//!
//! The DAP client/transport library is an external collaborator: this crate
//! never speaks the wire format itself. This module defines the request
//! contract it consumes (`DapConnection`, `Connect`) and the data model its
//! responses are expressed in: the metadata schema (DDS), the attribute
//! tree (DAS) and the constrained data response.
//!
//! Attribute and container maps are BTreeMaps so iteration order, and with
//! it the order normalized projection parameters are applied in, is
//! deterministic.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use crate::error::Result;

/// Element types a DAP server can declare for an array variable.
///
/// Only the numeric subset maps onto a raster pixel type; `String` and
/// `Url` variables are rejected during descriptor resolution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ElementType {
    Byte,
    Int16,
    UInt16,
    Int32,
    UInt32,
    Float32,
    Float64,
    String,
    Url,
}

impl ElementType {
    /// Stable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            ElementType::Byte => "Byte",
            ElementType::Int16 => "Int16",
            ElementType::UInt16 => "UInt16",
            ElementType::Int32 => "Int32",
            ElementType::UInt32 => "UInt32",
            ElementType::Float32 => "Float32",
            ElementType::Float64 => "Float64",
            ElementType::String => "String",
            ElementType::Url => "Url",
        }
    }
}

/// Shape and element type of an array-like variable, or of a grid-like
/// variable's data-array member.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArraySchema {
    /// Element type of the flattened payload
    pub element: ElementType,
    /// Declared dimension sizes, outermost first
    pub shape: Vec<usize>,
}

impl ArraySchema {
    /// Number of dimensions of the variable.
    pub fn rank(&self) -> usize {
        self.shape.len()
    }
}

/// The kind of a served variable, resolved once when a response is built.
///
/// A grid-like container bundles one data array with per-dimension
/// coordinate arrays; only its data-array member matters here, so the
/// variant carries that member directly.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum VariableKind {
    /// Bare array-like variable
    Array(ArraySchema),
    /// Grid-like container; the schema describes its data-array member
    Grid(ArraySchema),
    /// Structure container (not mappable onto a raster)
    Structure,
    /// Sequence container (not mappable onto a raster)
    Sequence,
}

impl VariableKind {
    /// The array member if this kind is array-like or grid-like.
    pub fn as_array(&self) -> Option<&ArraySchema> {
        match self {
            VariableKind::Array(schema) | VariableKind::Grid(schema) => Some(schema),
            _ => None,
        }
    }

    /// Stable name used in error messages.
    pub fn name(&self) -> &'static str {
        match self {
            VariableKind::Array(_) => "Array",
            VariableKind::Grid(_) => "Grid",
            VariableKind::Structure => "Structure",
            VariableKind::Sequence => "Sequence",
        }
    }
}

/// One variable entry in the server's metadata schema.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SchemaVariable {
    /// Fully qualified variable name as the server reports it
    pub name: String,
    /// Resolved kind of the variable
    pub kind: VariableKind,
}

/// The server's metadata schema (DDS): the declared variables, in server
/// order.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct MetadataSchema {
    /// Declared variables, in server order
    pub variables: Vec<SchemaVariable>,
}

/// One variable in a constrained data response, with its flattened payload.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DataVariable {
    /// Variable name as the server reports it in the response
    pub name: String,
    /// Resolved kind; for grid-like variables the schema describes the
    /// data-array member whose payload is carried below
    pub kind: VariableKind,
    /// Flattened payload bytes in native word order
    pub values: Vec<u8>,
}

/// The server's response to a constrained data request.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct DataResponse {
    /// Variables present in the constrained response
    pub variables: Vec<DataVariable>,
}

/// The leaf suffix after the last `.` of a fully qualified name.
fn leaf_name(name: &str) -> &str {
    name.rsplit('.').next().unwrap_or(name)
}

impl MetadataSchema {
    /// Look up a declared variable by exact name first, then by its leaf
    /// suffix. Some servers flatten Grid nesting when asked for a single
    /// array member and report `ARRAY_NAME` instead of
    /// `GRID_NAME.ARRAY_NAME`; the suffix lookup tolerates that.
    pub fn variable(&self, name: &str) -> Option<&SchemaVariable> {
        self.variables.iter().find(|v| v.name == name).or_else(|| {
            self.variables.iter().find(|v| v.name == leaf_name(name))
        })
    }
}

impl DataResponse {
    /// Look up a response variable by name (exact, then leaf suffix; the
    /// same rule as [`MetadataSchema::variable`]).
    pub fn variable(&self, name: &str) -> Option<&DataVariable> {
        self.variables.iter().find(|v| v.name == name).or_else(|| {
            self.variables.iter().find(|v| v.name == leaf_name(name))
        })
    }
}

/// An attribute value of `""` or the literal `"None"` means "absent".
pub fn attribute_present(value: &str) -> bool {
    !value.is_empty() && value != "None"
}

/// One named attribute container in the attribute tree, possibly with
/// nested containers (used for normalized projection parameters).
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeContainer {
    attributes: BTreeMap<String, String>,
    containers: BTreeMap<String, AttributeContainer>,
}

impl AttributeContainer {
    /// Raw attribute value, if the key exists at all.
    pub fn attribute(&self, key: &str) -> Option<&str> {
        self.attributes.get(key).map(String::as_str)
    }

    /// Attribute value, treating `""` and `"None"` as absent.
    pub fn present_attribute(&self, key: &str) -> Option<&str> {
        self.attribute(key).filter(|v| attribute_present(v))
    }

    /// Nested container by name.
    pub fn find_container(&self, name: &str) -> Option<&AttributeContainer> {
        self.containers.get(name)
    }

    /// Set an attribute value (used by client libraries and tests).
    pub fn set_attribute(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.attributes.insert(key.into(), value.into());
    }

    /// Insert a nested container.
    pub fn insert_container(&mut self, name: impl Into<String>, container: AttributeContainer) {
        self.containers.insert(name.into(), container);
    }

    /// Iterate attributes in deterministic (sorted) order.
    pub fn iter_attributes(&self) -> impl Iterator<Item = (&str, &str)> {
        self.attributes.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

/// The server's attribute tree (DAS): top-level containers keyed by name.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct AttributeTree {
    containers: BTreeMap<String, AttributeContainer>,
}

impl AttributeTree {
    /// Top-level container by name.
    pub fn find_container(&self, name: &str) -> Option<&AttributeContainer> {
        self.containers.get(name)
    }

    /// Insert a top-level container.
    pub fn insert_container(&mut self, name: impl Into<String>, container: AttributeContainer) {
        self.containers.insert(name.into(), container);
    }
}

/// One open, persistent connection to a DAP server.
///
/// The connection is exclusively owned by the dataset that opened it and
/// every request is a synchronous, blocking round trip. Implementations
/// live in the client library; this crate only calls them.
pub trait DapConnection {
    /// The server's protocol version string.
    fn request_version(&mut self) -> Result<String>;

    /// The server's metadata schema (DDS).
    fn request_metadata_schema(&mut self) -> Result<MetadataSchema>;

    /// The server's attribute tree (DAS).
    fn request_attributes(&mut self) -> Result<AttributeTree>;

    /// The constrained data response for a subset expression.
    fn request_data(&mut self, constraint: &str) -> Result<DataResponse>;
}

/// Factory that opens a [`DapConnection`] for a server URL.
pub trait Connect {
    /// Open a persistent connection to `url`.
    fn connect(&self, url: &str) -> Result<Box<dyn DapConnection>>;
}
