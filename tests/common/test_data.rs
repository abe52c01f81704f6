//! Fixture builders shared by the integration tests.

use dapraster::dap::{
    ArraySchema, DataResponse, DataVariable, ElementType, SchemaVariable, VariableKind,
};
use dapraster::georef;
use dapraster::{AttributeContainer, AttributeTree, MetadataSchema};

/// A schema declaring one array-like variable.
pub fn array_schema(name: &str, element: ElementType, shape: &[usize]) -> MetadataSchema {
    MetadataSchema {
        variables: vec![SchemaVariable {
            name: name.to_string(),
            kind: VariableKind::Array(ArraySchema {
                element,
                shape: shape.to_vec(),
            }),
        }],
    }
}

/// A schema declaring one grid-like variable (the shape describes its
/// data-array member).
pub fn grid_schema(name: &str, element: ElementType, shape: &[usize]) -> MetadataSchema {
    MetadataSchema {
        variables: vec![SchemaVariable {
            name: name.to_string(),
            kind: VariableKind::Grid(ArraySchema {
                element,
                shape: shape.to_vec(),
            }),
        }],
    }
}

/// A constrained response carrying one array-like variable.
pub fn array_response(
    name: &str,
    element: ElementType,
    shape: &[usize],
    values: Vec<u8>,
) -> DataResponse {
    DataResponse {
        variables: vec![DataVariable {
            name: name.to_string(),
            kind: VariableKind::Array(ArraySchema {
                element,
                shape: shape.to_vec(),
            }),
            values,
        }],
    }
}

/// An attribute tree with a fully-populated geo-referencing container
/// under `container_name`.
pub fn geo_attribute_tree(container_name: &str) -> AttributeTree {
    let mut container = AttributeContainer::default();
    container.set_attribute(georef::NORTHERNMOST_LATITUDE, "40.0");
    container.set_attribute(georef::SOUTHERNMOST_LATITUDE, "20.0");
    container.set_attribute(georef::EASTERNMOST_LONGITUDE, "-60.0");
    container.set_attribute(georef::WESTERNMOST_LONGITUDE, "-120.0");
    container.set_attribute(georef::PROJECTION_CS, "Plate_Carree");
    container.set_attribute(georef::GEOGRAPHIC_CS, "WGS84");

    let mut tree = AttributeTree::default();
    tree.insert_container(container_name, container);
    tree
}

pub fn f32_bytes(values: &[f32]) -> Vec<u8> {
    values.iter().flat_map(|v| v.to_ne_bytes()).collect()
}

pub fn f32_values(bytes: &[u8]) -> Vec<f32> {
    bytes
        .chunks_exact(4)
        .map(|c| f32::from_ne_bytes([c[0], c[1], c[2], c[3]]))
        .collect()
}

pub fn i16_values(bytes: &[u8]) -> Vec<i16> {
    bytes
        .chunks_exact(2)
        .map(|c| i16::from_ne_bytes([c[0], c[1]]))
        .collect()
}
