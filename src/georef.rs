//! Geo-referencing resolution.
//!
//! Corner coordinates and the spatial reference come from well-known
//! attributes bound to the served variable (the same convention MODIS
//! Level 3 products use, with underscores for spaces). A variable's own
//! attribute container takes precedence; a fixed global container supplies
//! defaults. When the required attributes are missing or malformed the
//! resolver substitutes a fixed pixel-space fallback instead of failing;
//! absent geo-metadata is never fatal to opening a dataset.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::dap::{AttributeContainer, AttributeTree};
use crate::error::{Error, Result};

/// Well-known attribute keys carrying geo-referencing information.
pub const NORTHERNMOST_LATITUDE: &str = "Northernmost_Latitude";
pub const SOUTHERNMOST_LATITUDE: &str = "Southernmost_Latitude";
pub const WESTERNMOST_LONGITUDE: &str = "Westernmost_Longitude";
pub const EASTERNMOST_LONGITUDE: &str = "Easternmost_Longitude";
pub const GEOGRAPHIC_CS: &str = "GeographicCS";
pub const PROJECTION_CS: &str = "ProjectionCS";
pub const NORM_PROJ_PARAM: &str = "Norm_Proj_Param";

/// Global attribute container consulted when a variable has no usable
/// container of its own.
pub const GLOBAL_CONTAINER: &str = "opendap_org_gdal";

/// Spatial-reference builder contract, consumed from the WKT export
/// collaborator. Implementations accumulate coordinate-system names and
/// normalized projection parameters, then serialize to well-known text.
pub trait SpatialReference {
    /// Name the projected coordinate system.
    fn set_projected_cs(&mut self, name: &str);
    /// Name the geographic coordinate system.
    fn set_geographic_cs(&mut self, name: &str);
    /// Apply one normalized projection parameter.
    fn set_normalized_param(&mut self, name: &str, value: f64);
    /// Serialize to well-known text.
    fn export_to_wkt(&self) -> String;
}

/// Minimal structural WKT builder used when no real projection library is
/// plugged in. Emits `PROJCS[...]` wrapping a `GEOGCS[...]` and the applied
/// `PARAMETER[...]` entries.
#[derive(Debug, Clone, Default)]
pub struct WktSpatialReference {
    projected_cs: Option<String>,
    geographic_cs: Option<String>,
    params: Vec<(String, f64)>,
}

impl SpatialReference for WktSpatialReference {
    fn set_projected_cs(&mut self, name: &str) {
        self.projected_cs = Some(name.to_string());
    }

    fn set_geographic_cs(&mut self, name: &str) {
        self.geographic_cs = Some(name.to_string());
    }

    fn set_normalized_param(&mut self, name: &str, value: f64) {
        self.params.push((name.to_string(), value));
    }

    fn export_to_wkt(&self) -> String {
        let geogcs = self
            .geographic_cs
            .as_ref()
            .map(|name| format!("GEOGCS[\"{}\"]", name))
            .unwrap_or_default();

        let mut wkt = match &self.projected_cs {
            Some(name) => {
                let mut s = format!("PROJCS[\"{}\"", name);
                if !geogcs.is_empty() {
                    s.push(',');
                    s.push_str(&geogcs);
                }
                s
            }
            None => return geogcs,
        };

        for (name, value) in &self.params {
            wkt.push_str(&format!(",PARAMETER[\"{}\",{}]", name, value));
        }
        wkt.push(']');
        wkt
    }
}

/// Corner coordinates and spatial reference of the raster.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GeoReference {
    /// Latitude of the upper-right (northernmost) edge
    pub ur_lat: f64,
    /// Latitude of the lower-left (southernmost) edge
    pub ll_lat: f64,
    /// Longitude of the upper-right (easternmost) edge
    pub ur_lon: f64,
    /// Longitude of the lower-left (westernmost) edge
    pub ll_lon: f64,
    /// Spatial reference as well-known text ("" when unknown)
    pub wkt: String,
}

impl GeoReference {
    /// The fixed pixel-space fallback used whenever the attribute-driven
    /// path fails, whatever the specific missing field was.
    pub fn fallback(width: usize, height: usize) -> GeoReference {
        GeoReference {
            ur_lat: 0.0,
            ll_lat: height as f64,
            ur_lon: width as f64,
            ll_lon: 0.0,
            wkt: String::new(),
        }
    }

    /// Resolve geo-referencing for `variable` from the server's attribute
    /// tree. Total: any failure in the attribute-driven path substitutes
    /// the fallback.
    pub fn resolve(
        variable: &str,
        attributes: &AttributeTree,
        width: usize,
        height: usize,
    ) -> GeoReference {
        let mut srs = WktSpatialReference::default();
        match Self::try_resolve(variable, attributes, &mut srs) {
            Ok(geo) => geo,
            Err(error) => {
                debug!(
                    variable = variable,
                    error = %error,
                    "Geo-referencing unavailable, using pixel-space fallback"
                );
                GeoReference::fallback(width, height)
            }
        }
    }

    /// The attribute-driven resolution path. Errors here are caught by
    /// [`GeoReference::resolve`]; they never propagate out of open.
    pub fn try_resolve(
        variable: &str,
        attributes: &AttributeTree,
        srs: &mut dyn SpatialReference,
    ) -> Result<GeoReference> {
        // A variable's own container wins so per-layer values can override
        // the global defaults, but only if it holds the first required key.
        let variable_container = attributes
            .find_container(variable)
            .filter(|c| c.present_attribute(NORTHERNMOST_LATITUDE).is_some());

        let container = match variable_container {
            Some(container) => container,
            None => attributes
                .find_container(GLOBAL_CONTAINER)
                .ok_or_else(|| Error::GeoReference {
                    message: format!(
                        "Could not find the geo-referencing information for '{}' and could not \
                         find default geo-referencing information in the '{}' attribute container.",
                        variable, GLOBAL_CONTAINER
                    ),
                })?,
        };

        let ur_lat = required_double(container, NORTHERNMOST_LATITUDE, variable)?;
        let ll_lat = required_double(container, SOUTHERNMOST_LATITUDE, variable)?;
        let ur_lon = required_double(container, EASTERNMOST_LONGITUDE, variable)?;
        let ll_lon = required_double(container, WESTERNMOST_LONGITUDE, variable)?;

        srs.set_projected_cs(required_value(container, PROJECTION_CS, variable)?);
        srs.set_geographic_cs(required_value(container, GEOGRAPHIC_CS, variable)?);

        if let Some(params) = container.find_container(NORM_PROJ_PARAM) {
            for (name, value) in params.iter_attributes() {
                srs.set_normalized_param(name, parse_double(value));
            }
        }

        Ok(GeoReference {
            ur_lat,
            ll_lat,
            ur_lon,
            ll_lon,
            wkt: srs.export_to_wkt(),
        })
    }

    /// The affine pixel-to-geographic transform:
    /// `[origin_lon, pixel_width, 0, origin_lat, 0, -pixel_height]`.
    pub fn geo_transform(&self, width: usize, height: usize) -> [f64; 6] {
        [
            self.ll_lon,
            (self.ur_lon - self.ll_lon) / width as f64,
            0.0,
            self.ur_lat,
            0.0,
            -(self.ur_lat - self.ll_lat) / height as f64,
        ]
    }
}

fn required_value<'a>(
    container: &'a AttributeContainer,
    key: &str,
    variable: &str,
) -> Result<&'a str> {
    container
        .present_attribute(key)
        .ok_or_else(|| Error::GeoReference {
            message: format!(
                "While reading geo-referencing information for '{}' the value for '{}' was not found.",
                variable, key
            ),
        })
}

fn required_double(container: &AttributeContainer, key: &str, variable: &str) -> Result<f64> {
    required_value(container, key, variable).map(parse_double)
}

/// strtod semantics: text that does not parse as a number reads as zero.
fn parse_double(value: &str) -> f64 {
    value.trim().parse().unwrap_or(0.0)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn geo_container() -> AttributeContainer {
        let mut container = AttributeContainer::default();
        container.set_attribute(NORTHERNMOST_LATITUDE, "71.0");
        container.set_attribute(SOUTHERNMOST_LATITUDE, "18.0");
        container.set_attribute(EASTERNMOST_LONGITUDE, "-66.0");
        container.set_attribute(WESTERNMOST_LONGITUDE, "-125.0");
        container.set_attribute(PROJECTION_CS, "Plate_Carree");
        container.set_attribute(GEOGRAPHIC_CS, "WGS84");
        container
    }

    #[test]
    fn test_resolve_from_variable_container() {
        let mut tree = AttributeTree::default();
        tree.insert_container("SST", geo_container());

        let geo = GeoReference::resolve("SST", &tree, 512, 256);
        assert_eq!(geo.ur_lat, 71.0);
        assert_eq!(geo.ll_lat, 18.0);
        assert_eq!(geo.ur_lon, -66.0);
        assert_eq!(geo.ll_lon, -125.0);
        assert!(geo.wkt.contains("Plate_Carree"));
        assert!(geo.wkt.contains("WGS84"));
    }

    #[test]
    fn test_resolve_falls_back_to_global_container() {
        let mut tree = AttributeTree::default();
        tree.insert_container(GLOBAL_CONTAINER, geo_container());

        let geo = GeoReference::resolve("SST", &tree, 512, 256);
        assert_eq!(geo.ur_lat, 71.0);
    }

    #[test]
    fn test_variable_container_without_first_key_defers_to_global() {
        // A container that exists but lacks the northern latitude does not
        // shadow the global defaults.
        let mut partial = AttributeContainer::default();
        partial.set_attribute(NORTHERNMOST_LATITUDE, "None");

        let mut tree = AttributeTree::default();
        tree.insert_container("SST", partial);
        tree.insert_container(GLOBAL_CONTAINER, geo_container());

        let geo = GeoReference::resolve("SST", &tree, 512, 256);
        assert_eq!(geo.ll_lat, 18.0);
    }

    #[test]
    fn test_resolve_never_fails_without_metadata() {
        let geo = GeoReference::resolve("SST", &AttributeTree::default(), 512, 256);
        assert_eq!(geo.ur_lon, 512.0);
        assert_eq!(geo.ur_lat, 0.0);
        assert_eq!(geo.ll_lon, 0.0);
        assert_eq!(geo.ll_lat, 256.0);
        assert_eq!(geo.wkt, "");
    }

    #[test]
    fn test_missing_required_key_substitutes_whole_fallback() {
        // One absent corner abandons the attribute path entirely; no mixed
        // half-resolved state.
        let mut container = geo_container();
        container.set_attribute(SOUTHERNMOST_LATITUDE, "");
        let mut tree = AttributeTree::default();
        tree.insert_container("SST", container);

        let geo = GeoReference::resolve("SST", &tree, 100, 50);
        assert_eq!(geo, GeoReference::fallback(100, 50));
    }

    #[test]
    fn test_try_resolve_reports_missing_key() {
        let mut container = geo_container();
        container.set_attribute(PROJECTION_CS, "None");
        let mut tree = AttributeTree::default();
        tree.insert_container("SST", container);

        let mut srs = WktSpatialReference::default();
        match GeoReference::try_resolve("SST", &tree, &mut srs).unwrap_err() {
            Error::GeoReference { message } => {
                assert!(message.contains(PROJECTION_CS));
                assert!(message.contains("SST"));
            }
            other => panic!("Expected GeoReference error, got {:?}", other),
        }
    }

    #[test]
    fn test_normalized_params_reach_the_wkt() {
        let mut params = AttributeContainer::default();
        params.set_attribute("central_meridian", "-95.5");
        params.set_attribute("false_easting", "0");

        let mut container = geo_container();
        container.insert_container(NORM_PROJ_PARAM, params);
        let mut tree = AttributeTree::default();
        tree.insert_container("SST", container);

        let geo = GeoReference::resolve("SST", &tree, 512, 256);
        assert!(geo.wkt.contains("PARAMETER[\"central_meridian\",-95.5]"));
        assert!(geo.wkt.contains("PARAMETER[\"false_easting\",0]"));
    }

    #[test]
    fn test_geo_transform() {
        let mut tree = AttributeTree::default();
        tree.insert_container("SST", geo_container());
        let geo = GeoReference::resolve("SST", &tree, 512, 256);

        let gt = geo.geo_transform(512, 256);
        assert_eq!(gt[0], -125.0);
        assert_eq!(gt[1], (-66.0 - -125.0) / 512.0);
        assert_eq!(gt[2], 0.0);
        assert_eq!(gt[3], 71.0);
        assert_eq!(gt[4], 0.0);
        assert_eq!(gt[5], -(71.0 - 18.0) / 256.0);
    }

    #[test]
    fn test_unparseable_double_reads_as_zero() {
        assert_eq!(parse_double("garbage"), 0.0);
        assert_eq!(parse_double(" 42.5 "), 42.5);
    }
}
