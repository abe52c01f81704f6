//! Dataset and band handles.
//!
//! `Dataset::open` is the capability entry point: it parses the combined
//! server/layer specification, opens one persistent connection to the
//! server, checks the protocol version, retrieves the attribute tree and
//! metadata schema, and resolves the raster descriptor and geo-referencing.
//! The connection is owned by the dataset for its whole lifetime and reused
//! for every read; read-time failures leave both intact.

use std::cell::RefCell;

use tracing::{debug, info};

use crate::constraint::build_constraint;
use crate::dap::{Connect, DapConnection};
use crate::descriptor::RasterDescriptor;
use crate::error::{Error, Result};
use crate::fetch::fetch_into;
use crate::georef::GeoReference;
use crate::locator::Locator;
use crate::logging::log_timed_operation;
use crate::pixel::PixelType;
use crate::raster_io::Window;

/// An open, read-only raster view of one remote DAP variable.
pub struct Dataset {
    locator: Locator,
    descriptor: RasterDescriptor,
    geo: GeoReference,
    connection: RefCell<Box<dyn DapConnection>>,
}

impl Dataset {
    /// Open a dataset from a combined server/layer specification, e.g.
    /// `http://server/path?SST[0:2][lat][lon]`.
    ///
    /// `connector` supplies the DAP client implementation. Every error
    /// returned here is fatal to open; a dataset is either fully resolved
    /// or not constructed at all. Missing geo-referencing metadata is not
    /// an error; the pixel-space fallback is substituted instead.
    pub fn open(spec: &str, connector: &dyn Connect) -> Result<Dataset> {
        let locator = Locator::parse(spec)?;

        if !locator.url.starts_with("http://") && !locator.url.starts_with("https://") {
            return Err(Error::Connection {
                message: format!(
                    "The URL '{}' does not start with 'http' or 'https'; not trying to connect.",
                    locator.url
                ),
            });
        }

        info!(
            url = %locator.url,
            variable = %locator.variable,
            "Opening DAP raster dataset"
        );

        let mut connection = connector.connect(&locator.url)?;

        let version = connection.request_version()?;
        if version.is_empty() || !version.contains("/3.") {
            return Err(Error::Connection {
                message: format!(
                    "Connected to {} but could not get a DAP 3.x version string from the server (got '{}').",
                    locator.url, version
                ),
            });
        }
        debug!(version = %version, "Server version accepted");

        let (attributes, schema) = log_timed_operation("fetch_metadata", || {
            let attributes = connection.request_attributes()?;
            let schema = connection.request_metadata_schema()?;
            Ok::<_, Error>((attributes, schema))
        })?;

        let descriptor = RasterDescriptor::resolve(&locator, &schema)?;
        let geo = GeoReference::resolve(
            &locator.variable,
            &attributes,
            descriptor.width,
            descriptor.height,
        );

        info!(
            width = descriptor.width,
            height = descriptor.height,
            bands = descriptor.band_count,
            pixel_type = descriptor.pixel_type.name(),
            "Dataset ready"
        );

        Ok(Dataset {
            locator,
            descriptor,
            geo,
            connection: RefCell::new(connection),
        })
    }

    /// Raster width in pixels.
    pub fn width(&self) -> usize {
        self.descriptor.width
    }

    /// Raster height in lines.
    pub fn height(&self) -> usize {
        self.descriptor.height
    }

    /// Number of bands.
    pub fn band_count(&self) -> usize {
        self.descriptor.band_count
    }

    /// Pixel type shared by every band.
    pub fn pixel_type(&self) -> PixelType {
        self.descriptor.pixel_type
    }

    /// The served variable name.
    pub fn variable(&self) -> &str {
        &self.locator.variable
    }

    /// The server URL.
    pub fn url(&self) -> &str {
        &self.locator.url
    }

    /// The resolved raster descriptor.
    pub fn descriptor(&self) -> &RasterDescriptor {
        &self.descriptor
    }

    /// The resolved (or fallback) geo-referencing.
    pub fn geo_reference(&self) -> &GeoReference {
        &self.geo
    }

    /// The affine pixel-to-geographic transform for this raster.
    pub fn geo_transform(&self) -> [f64; 6] {
        self.geo
            .geo_transform(self.descriptor.width, self.descriptor.height)
    }

    /// The spatial reference as well-known text ("" when unknown).
    pub fn projection_wkt(&self) -> &str {
        &self.geo.wkt
    }

    /// Handle for one band. Band numbers are 1-based.
    pub fn band(&self, number: usize) -> Result<Band<'_>> {
        if number == 0 || number > self.descriptor.band_count {
            return Err(Error::Range {
                message: format!(
                    "Band number {} is out of range; '{}' has {} band(s).",
                    number, self.locator.variable, self.descriptor.band_count
                ),
            });
        }
        Ok(Band {
            dataset: self,
            number,
        })
    }

    /// Handles for all bands, numbered 1..=band_count.
    pub fn bands(&self) -> impl Iterator<Item = Band<'_>> {
        (1..=self.descriptor.band_count).map(move |number| Band {
            dataset: self,
            number,
        })
    }

    /// Fetch one band's sub-window into `out`: build the subset expression
    /// and run it over the persistent connection.
    pub(crate) fn fetch_raster(
        &self,
        window: Window,
        band_number: usize,
        out: &mut [u8],
    ) -> Result<()> {
        let expression = build_constraint(
            &self.locator.variable,
            &self.locator.dim_specs,
            window.x_off,
            window.y_off,
            window.x_size,
            window.y_size,
            band_number,
            self.descriptor.width,
            self.descriptor.height,
        )?;

        let mut connection = self.connection.borrow_mut();
        fetch_into(
            connection.as_mut(),
            &expression,
            &self.locator.variable,
            &self.locator.url,
            self.descriptor.pixel_type,
            out,
        )
    }
}

impl std::fmt::Debug for Dataset {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Dataset")
            .field("locator", &self.locator)
            .field("descriptor", &self.descriptor)
            .field("geo", &self.geo)
            .finish_non_exhaustive()
    }
}

/// One raster band, numbered from 1. Borrows its owning dataset; the
/// read entry points live in [`crate::raster_io`].
#[derive(Debug, Clone, Copy)]
pub struct Band<'a> {
    dataset: &'a Dataset,
    number: usize,
}

impl<'a> Band<'a> {
    /// This band's 1-based number.
    pub fn number(&self) -> usize {
        self.number
    }

    /// The owning dataset.
    pub fn dataset(&self) -> &'a Dataset {
        self.dataset
    }

    /// Pixel type, inherited from the dataset.
    pub fn pixel_type(&self) -> PixelType {
        self.dataset.descriptor.pixel_type
    }

    /// Block dimensions: one block spans the entire raster.
    pub fn block_size(&self) -> (usize, usize) {
        (self.dataset.descriptor.width, self.dataset.descriptor.height)
    }
}
