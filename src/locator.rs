//! Server/layer specification parsing.
//!
//! A dataset is addressed by a single locator string combining the server
//! URL, a variable name and an ordered list of bracketed dimension
//! specifiers:
//!
//! ```text
//! <url> '?' <variable> ('[' <dimspec> ']')+
//! dimspec := "lat" | "lon" | <integer> | <integer> ':' <integer>
//! ```
//!
//! Example: `http://server/path?SST[0:2][lat][lon]` selects the variable `SST`, a
//! three-band range first, then latitude, then longitude. The specifier
//! order mirrors the remote variable's dimension order and is reused
//! verbatim when subset expressions are built.

use serde::{Deserialize, Serialize};

use crate::error::{Error, Result};

/// One bracketed dimension specifier, in the position it was written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum DimSpec {
    /// The latitude dimension (raster Y axis)
    Latitude,
    /// The longitude dimension (raster X axis)
    Longitude,
    /// A fixed index into one dimension
    Index(i64),
    /// An inclusive index range selecting the raster bands
    Range { start: i64, stop: i64 },
    /// Unparseable specifier text, kept verbatim for the validation error
    Unknown(String),
}

impl DimSpec {
    /// Classify the text between one `[` `]` pair.
    fn classify(text: &str) -> DimSpec {
        if text == "lat" {
            return DimSpec::Latitude;
        }
        if text == "lon" {
            return DimSpec::Longitude;
        }
        if let Ok(value) = text.parse::<i64>() {
            return DimSpec::Index(value);
        }
        if let Some((start, stop)) = text.split_once(':') {
            if let (Ok(start), Ok(stop)) = (start.parse::<i64>(), stop.parse::<i64>()) {
                return DimSpec::Range { start, stop };
            }
        }
        DimSpec::Unknown(text.to_string())
    }
}

/// The parsed server/layer specification. Produced once at open time and
/// immutable afterwards.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Locator {
    /// DAP server URL (everything before the `?`)
    pub url: String,
    /// Variable name (between the `?` and the first `[`)
    pub variable: String,
    /// Raw dimension specifier text (from the first `[` to the end)
    pub band_expression: String,
    /// Parsed specifiers in written order
    pub dim_specs: Vec<DimSpec>,
}

impl Locator {
    /// Parse a combined server/layer specification string.
    pub fn parse(spec: &str) -> Result<Locator> {
        let q_mark = spec.find('?').ok_or_else(|| Error::Parse {
            message: format!(
                "Failed to find '?' delimiter in the DAP server/layer specification: {}",
                spec
            ),
        })?;

        let url = &spec[..q_mark];
        if url.is_empty() {
            return Err(Error::Parse {
                message: format!(
                    "Failed to find a DAP server URL in the DAP server/layer specification: {}",
                    spec
                ),
            });
        }

        let bracket = spec[q_mark + 1..]
            .find('[')
            .map(|i| q_mark + 1 + i)
            .ok_or_else(|| Error::Parse {
                message: format!(
                    "Failed to find '[' delimiter in the DAP server/layer specification: {}",
                    spec
                ),
            })?;

        let variable = &spec[q_mark + 1..bracket];
        if variable.is_empty() {
            return Err(Error::Parse {
                message: format!(
                    "Failed to find a variable name in the DAP server/layer specification: {}",
                    spec
                ),
            });
        }

        let band_expression = &spec[bracket..];

        // Scan matched bracket pairs left to right. Text outside a matched
        // pair is ignored; an unterminated group ends the scan.
        let mut dim_specs = Vec::new();
        let mut pos = 0;
        while let Some(open) = band_expression[pos..].find('[') {
            let open = pos + open;
            match band_expression[open..].find(']') {
                Some(close) => {
                    let close = open + close;
                    dim_specs.push(DimSpec::classify(&band_expression[open + 1..close]));
                    pos = close + 1;
                }
                None => break,
            }
        }

        Ok(Locator {
            url: url.to_string(),
            variable: variable.to_string(),
            band_expression: band_expression.to_string(),
            dim_specs,
        })
    }
}
