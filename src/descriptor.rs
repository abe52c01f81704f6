//! Remote-variable to raster mapping.
//!
//! Validates the parsed dimension specifiers against the remote variable's
//! declared rank and shape, then derives the raster geometry: which
//! dimension is Y (latitude), which is X (longitude), how many bands a
//! range specifier selects, and which pixel type the element type maps to.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dap::{ElementType, MetadataSchema};
use crate::error::{Error, Result};
use crate::locator::{DimSpec, Locator};
use crate::pixel::PixelType;

/// Raster-facing description of the remote variable. Derived once at open
/// time; immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RasterDescriptor {
    /// Rank of the remote Array/Grid variable
    pub rank: usize,
    /// Raster width in pixels (size of the longitude dimension)
    pub width: usize,
    /// Raster height in pixels (size of the latitude dimension)
    pub height: usize,
    /// Number of bands (range length, or 1 without a range specifier)
    pub band_count: usize,
    /// Pixel type mapped from the remote element type
    pub pixel_type: PixelType,
}

impl RasterDescriptor {
    /// Resolve the locator's dimension specifiers against the server's
    /// metadata schema.
    pub fn resolve(locator: &Locator, schema: &MetadataSchema) -> Result<RasterDescriptor> {
        let variable = schema
            .variable(&locator.variable)
            .ok_or_else(|| Error::Validation {
                message: format!(
                    "The variable '{}' could not be found in the data source.",
                    locator.variable
                ),
            })?;

        let array = variable.kind.as_array().ok_or_else(|| Error::UnsupportedType {
            message: format!(
                "The variable '{}' is a {} container; only Array and Grid variables are supported.",
                locator.variable,
                variable.kind.name()
            ),
        })?;

        let rank = array.rank();
        verify_dim_specs(locator, rank)?;

        // The verified spec has exactly one lat and one lon entry.
        let mut lat_index = 0;
        let mut lon_index = 0;
        let mut band_count = 1;
        for (index, spec) in locator.dim_specs.iter().enumerate() {
            match spec {
                DimSpec::Latitude => lat_index = index,
                DimSpec::Longitude => lon_index = index,
                DimSpec::Range { start, stop } => {
                    if stop < start {
                        return Err(Error::Validation {
                            message: format!(
                                "Reversed range [{}:{}] in layer specification: {}",
                                start, stop, locator.band_expression
                            ),
                        });
                    }
                    band_count = (stop - start + 1) as usize;
                }
                _ => {}
            }
        }

        // X is longitude, Y is latitude.
        let width = array.shape[lon_index];
        let height = array.shape[lat_index];
        let pixel_type = pixel_type_for(array.element, &locator.variable)?;

        debug!(
            variable = %locator.variable,
            width,
            height,
            band_count,
            pixel_type = pixel_type.name(),
            "Resolved raster descriptor"
        );

        Ok(RasterDescriptor {
            rank,
            width,
            height,
            band_count,
            pixel_type,
        })
    }
}

/// Check the dimension specifiers against the variable's rank. Every
/// violation names the offending band expression.
fn verify_dim_specs(locator: &Locator, rank: usize) -> Result<()> {
    if locator.dim_specs.is_empty() {
        return Err(Error::Internal {
            message: format!(
                "The layer specification has not been parsed: {}",
                locator.band_expression
            ),
        });
    }

    let mut lat_count = 0;
    let mut lon_count = 0;
    let mut index_count = 0;
    let mut range_count = 0;
    for spec in &locator.dim_specs {
        match spec {
            DimSpec::Latitude => lat_count += 1,
            DimSpec::Longitude => lon_count += 1,
            DimSpec::Index(_) => index_count += 1,
            DimSpec::Range { .. } => range_count += 1,
            DimSpec::Unknown(text) => {
                return Err(Error::Validation {
                    message: format!(
                        "In the layer specification {} the sub-expression '[{}]' could not be parsed.",
                        locator.band_expression, text
                    ),
                });
            }
        }
    }

    if lat_count != 1 {
        return Err(Error::Validation {
            message: format!(
                "Missing 'lat' in layer specification: {}",
                locator.band_expression
            ),
        });
    }
    if lon_count != 1 {
        return Err(Error::Validation {
            message: format!(
                "Missing 'lon' in layer specification: {}",
                locator.band_expression
            ),
        });
    }
    if range_count > 1 {
        return Err(Error::Validation {
            message: format!(
                "More than one range in layer specification: {}",
                locator.band_expression
            ),
        });
    }
    if index_count + range_count + 2 != rank {
        return Err(Error::Validation {
            message: format!(
                "Not all dimensions accounted for in '{}', given that the variable '{}' has rank {}",
                locator.band_expression, locator.variable, rank
            ),
        });
    }

    Ok(())
}

/// Map a remote element type onto a pixel type; non-numeric types are
/// unsupported.
pub(crate) fn pixel_type_for(element: ElementType, variable: &str) -> Result<PixelType> {
    match element {
        ElementType::Byte => Ok(PixelType::Byte),
        ElementType::Int16 => Ok(PixelType::Int16),
        ElementType::UInt16 => Ok(PixelType::UInt16),
        ElementType::Int32 => Ok(PixelType::Int32),
        ElementType::UInt32 => Ok(PixelType::UInt32),
        ElementType::Float32 => Ok(PixelType::Float32),
        ElementType::Float64 => Ok(PixelType::Float64),
        ElementType::String | ElementType::Url => Err(Error::UnsupportedType {
            message: format!(
                "The variable '{}' has element type {}; only numeric element types are supported.",
                variable,
                element.name()
            ),
        }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::dap::{ArraySchema, SchemaVariable, VariableKind};

    fn locator(spec: &str) -> Locator {
        Locator::parse(spec).unwrap()
    }

    fn schema_of(name: &str, kind: VariableKind) -> MetadataSchema {
        MetadataSchema {
            variables: vec![SchemaVariable {
                name: name.to_string(),
                kind,
            }],
        }
    }

    fn array(element: ElementType, shape: &[usize]) -> VariableKind {
        VariableKind::Array(ArraySchema {
            element,
            shape: shape.to_vec(),
        })
    }

    #[test]
    fn test_resolve_banded_variable() {
        let locator = locator("http://s/d?SST[0:2][lat][lon]");
        let schema = schema_of("SST", array(ElementType::Float32, &[8, 256, 512]));

        let descriptor = RasterDescriptor::resolve(&locator, &schema).unwrap();
        assert_eq!(descriptor.rank, 3);
        assert_eq!(descriptor.width, 512);
        assert_eq!(descriptor.height, 256);
        assert_eq!(descriptor.band_count, 3);
        assert_eq!(descriptor.pixel_type, PixelType::Float32);
    }

    #[test]
    fn test_resolve_single_band_grid() {
        let locator = locator("http://s/d?elev[lat][lon]");
        let schema = schema_of(
            "elev",
            VariableKind::Grid(ArraySchema {
                element: ElementType::Int16,
                shape: vec![180, 360],
            }),
        );

        let descriptor = RasterDescriptor::resolve(&locator, &schema).unwrap();
        assert_eq!(descriptor.band_count, 1);
        assert_eq!(descriptor.width, 360);
        assert_eq!(descriptor.height, 180);
        assert_eq!(descriptor.pixel_type, PixelType::Int16);
    }

    #[test]
    fn test_resolve_looks_up_leaf_suffix() {
        let locator = locator("http://s/d?grid.SST[lat][lon]");
        let schema = schema_of("SST", array(ElementType::Float64, &[10, 20]));

        let descriptor = RasterDescriptor::resolve(&locator, &schema).unwrap();
        assert_eq!(descriptor.width, 20);
        assert_eq!(descriptor.height, 10);
    }

    #[test]
    fn test_resolve_unknown_variable() {
        let locator = locator("http://s/d?missing[lat][lon]");
        let schema = schema_of("SST", array(ElementType::Float32, &[10, 20]));

        match RasterDescriptor::resolve(&locator, &schema).unwrap_err() {
            Error::Validation { message } => assert!(message.contains("missing")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_structure_variable() {
        let locator = locator("http://s/d?s[lat][lon]");
        let schema = schema_of("s", VariableKind::Structure);

        match RasterDescriptor::resolve(&locator, &schema).unwrap_err() {
            Error::UnsupportedType { message } => {
                assert!(message.contains("Structure"));
            }
            other => panic!("Expected UnsupportedType error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_non_numeric_element() {
        let locator = locator("http://s/d?names[lat][lon]");
        let schema = schema_of("names", array(ElementType::String, &[10, 20]));

        assert!(matches!(
            RasterDescriptor::resolve(&locator, &schema),
            Err(Error::UnsupportedType { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_missing_lat() {
        let locator = locator("http://s/d?v[0][lon]");
        let schema = schema_of("v", array(ElementType::Float32, &[2, 20]));

        match RasterDescriptor::resolve(&locator, &schema).unwrap_err() {
            Error::Validation { message } => assert!(message.contains("Missing 'lat'")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_rejects_duplicate_lat() {
        let locator = locator("http://s/d?v[lat][lat][lon]");
        let schema = schema_of("v", array(ElementType::Float32, &[2, 3, 4]));

        assert!(matches!(
            RasterDescriptor::resolve(&locator, &schema),
            Err(Error::Validation { .. })
        ));
    }

    #[test]
    fn test_verify_rejects_missing_lon() {
        let locator = locator("http://s/d?v[0][lat]");
        let schema = schema_of("v", array(ElementType::Float32, &[2, 20]));

        match RasterDescriptor::resolve(&locator, &schema).unwrap_err() {
            Error::Validation { message } => assert!(message.contains("Missing 'lon'")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_rejects_two_ranges() {
        let locator = locator("http://s/d?v[0:1][2:3][lat][lon]");
        let schema = schema_of("v", array(ElementType::Float32, &[2, 2, 3, 4]));

        match RasterDescriptor::resolve(&locator, &schema).unwrap_err() {
            Error::Validation { message } => assert!(message.contains("More than one range")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_rejects_unknown_spec() {
        let locator = locator("http://s/d?v[bogus][lat][lon]");
        let schema = schema_of("v", array(ElementType::Float32, &[2, 3, 4]));

        match RasterDescriptor::resolve(&locator, &schema).unwrap_err() {
            Error::Validation { message } => assert!(message.contains("[bogus]")),
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_verify_rejects_rank_mismatch() {
        // Two specifiers against a rank-3 variable.
        let locator = locator("http://s/d?v[lat][lon]");
        let schema = schema_of("v", array(ElementType::Float32, &[2, 3, 4]));

        match RasterDescriptor::resolve(&locator, &schema).unwrap_err() {
            Error::Validation { message } => {
                assert!(message.contains("rank 3"));
            }
            other => panic!("Expected Validation error, got {:?}", other),
        }
    }

    #[test]
    fn test_resolve_rejects_reversed_range() {
        let locator = locator("http://s/d?v[5:2][lat][lon]");
        let schema = schema_of("v", array(ElementType::Float32, &[8, 3, 4]));

        assert!(matches!(
            RasterDescriptor::resolve(&locator, &schema),
            Err(Error::Validation { .. })
        ));
    }
}
