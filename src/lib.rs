//! # dapraster
//!
//! Read remote OPeNDAP/DAP 3.x server variables as ordinary 2-D rasters.
//!
//! A dataset is addressed by a single locator string combining the server
//! URL, a variable name and an ordered dimension specification:
//!
//! ```text
//! http://server/path?SST[0:2][lat][lon]
//! ```
//!
//! Opening a dataset connects to the server, validates the specification
//! against the served variable's rank and shape, and resolves the raster
//! geometry (size, bands, pixel type) and geo-referencing. Pixel data is
//! then fetched on demand, one rectangular sub-region per request, through
//! block and windowed reads with on-the-fly type conversion and
//! nearest-neighbor resampling.
//!
//! ## Architecture
//!
//! - **Locator layer**: parses the server/layer specification grammar
//! - **Resolution layer**: maps the remote variable onto raster geometry
//!   and geo-referencing at open time
//! - **Read layer**: builds per-request subset expressions and copies the
//!   constrained responses into caller buffers
//!
//! The DAP client/transport and the spatial-reference export library are
//! external collaborators, consumed through the traits in [`dap`] and
//! [`georef`]; this crate never speaks the wire format itself.

pub mod constraint;
pub mod dap;
pub mod dataset;
pub mod descriptor;
pub mod error;
pub mod fetch;
pub mod georef;
pub mod locator;
pub mod logging;
pub mod pixel;
pub mod raster_io;

pub use dap::{AttributeContainer, AttributeTree, Connect, DapConnection, MetadataSchema};
pub use dataset::{Band, Dataset};
pub use descriptor::RasterDescriptor;
pub use error::{Error, Result};
pub use georef::{GeoReference, SpatialReference, WktSpatialReference};
pub use locator::{DimSpec, Locator};
pub use logging::init_tracing;
pub use pixel::PixelType;
pub use raster_io::{Window, WindowBuffer};
