//! Subset-expression construction.
//!
//! Translates a pixel-space read request into the textual constraint sent
//! to the remote server. DAP dimension constraints are zero-based and
//! inclusive on both ends: an X offset of 4 with an X size of 4 produces
//! `[4:7]`, the four elements 4, 5, 6 and 7. Band numbers are 1-based on
//! the raster side and translate to the zero-based absolute index inside
//! the served range, so a range starting at 10 with band number 2 emits
//! index 11. The index arithmetic here must match the server exactly; an
//! off-by-one silently fetches the wrong band or row.

use crate::error::{Error, Result};
use crate::locator::DimSpec;

/// Build the constraint expression for one sub-region of one band.
///
/// `dim_specs` is the parsed specifier sequence in its original order; one
/// bracket group is emitted per specifier position.
#[allow(clippy::too_many_arguments)]
pub fn build_constraint(
    variable: &str,
    dim_specs: &[DimSpec],
    x_off: usize,
    y_off: usize,
    x_size: usize,
    y_size: usize,
    band_number: usize,
    width: usize,
    height: usize,
) -> Result<String> {
    if x_size == 0 || y_size == 0 {
        return Err(Error::Range {
            message: format!(
                "While processing a request for '{}', band number {}: a zero-sized window was requested.",
                variable, band_number
            ),
        });
    }

    // Raster sizes are element counts, constraint endpoints are maximum
    // index values.
    if x_off + x_size - 1 > width || y_off + y_size - 1 > height {
        return Err(Error::Range {
            message: format!(
                "While processing a request for '{}', band number {}: the offset and/or size values exceed the size of the layer.",
                variable, band_number
            ),
        });
    }

    let mut expression = String::from(variable);
    for spec in dim_specs {
        match spec {
            DimSpec::Latitude => {
                expression.push_str(&format!("[{}:{}]", y_off, y_off + y_size - 1));
            }
            DimSpec::Longitude => {
                expression.push_str(&format!("[{}:{}]", x_off, x_off + x_size - 1));
            }
            DimSpec::Index(value) => {
                expression.push_str(&format!("[{}]", value));
            }
            DimSpec::Range { start, .. } => {
                // Bands are 1-based on the raster side, zero-based on the
                // wire.
                expression.push_str(&format!("[{}]", start + band_number as i64 - 1));
            }
            DimSpec::Unknown(text) => {
                return Err(Error::Internal {
                    message: format!(
                        "An unparsed sub-expression '[{}]' survived validation.",
                        text
                    ),
                });
            }
        }
    }

    Ok(expression)
}
