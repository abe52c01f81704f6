//! Constrained data retrieval.
//!
//! Issues a subset request over the dataset's persistent connection,
//! re-locates the requested variable in the constrained response, and
//! copies its flattened payload into the caller's buffer. The response
//! lookup uses the same exact-name-then-leaf-suffix rule as descriptor
//! resolution, because servers that flatten Grid nesting do so in data
//! responses too.

use tracing::debug;

use crate::dap::DapConnection;
use crate::descriptor::pixel_type_for;
use crate::error::{Error, Result};
use crate::pixel::PixelType;

/// Fetch the sub-region selected by `constraint` into `out`.
///
/// `out` must be exactly `x_size * y_size * pixel_type.size_bytes()` bytes;
/// the server payload is verified against the expected element type and
/// byte length before any copy happens.
pub fn fetch_into(
    connection: &mut dyn DapConnection,
    constraint: &str,
    variable: &str,
    url: &str,
    pixel_type: PixelType,
    out: &mut [u8],
) -> Result<()> {
    debug!(constraint = constraint, "Requesting constrained data");
    let response = connection.request_data(constraint)?;

    let data_var = response.variable(variable).ok_or_else(|| Error::Fetch {
        message: format!(
            "Could not read the variable '{}' from the data source at: {}",
            variable, url
        ),
    })?;

    let array = data_var.kind.as_array().ok_or_else(|| Error::Fetch {
        message: format!(
            "The response for '{}' from {} was a {} container; expected an Array or Grid variable.",
            variable,
            url,
            data_var.kind.name()
        ),
    })?;

    let element_matches = pixel_type_for(array.element, variable)
        .map(|t| t == pixel_type)
        .unwrap_or(false);
    if !element_matches {
        return Err(Error::Fetch {
            message: format!(
                "The response for '{}' from {} carries element type {}; expected {}.",
                variable,
                url,
                array.element.name(),
                pixel_type.name()
            ),
        });
    }

    if data_var.values.len() != out.len() {
        return Err(Error::Fetch {
            message: format!(
                "The response payload for '{}' from {} holds {} bytes; expected {}.",
                variable,
                url,
                data_var.values.len(),
                out.len()
            ),
        });
    }

    out.copy_from_slice(&data_var.values);
    Ok(())
}
