//! Error types for dapraster.
//!
//! One enum covers every failure mode in the crate. The variants preserve a
//! hard distinction between errors that are fatal to opening a dataset
//! (parse, validation, connection) and errors that fail only a single read
//! call (range, fetch) while leaving the dataset and its connection usable.

use thiserror::Error;

/// The main error type for dapraster operations.
#[derive(Error, Debug)]
pub enum Error {
    /// Malformed server/layer specification string. Fatal to open.
    #[error("Layer specification error: {message}")]
    Parse { message: String },

    /// Dimension specification inconsistent with the remote variable.
    /// Fatal to open.
    #[error("Layer validation error: {message}")]
    Validation { message: String },

    /// Unreachable server or unsupported protocol version. Fatal to open.
    #[error("Connection error: {message}")]
    Connection { message: String },

    /// Missing or malformed geo-referencing metadata. Never escapes the
    /// geo-reference resolver; callers substitute the documented fallback.
    #[error("Geo-referencing error: {message}")]
    GeoReference { message: String },

    /// Requested window exceeds the raster extent. Fails one read call.
    #[error("Range error: {message}")]
    Range { message: String },

    /// The server's data response could not be mapped back onto the
    /// requested variable. Fails one read call.
    #[error("Fetch error: {message}")]
    Fetch { message: String },

    /// Remote element type or caller buffer layout is not supported.
    #[error("Unsupported type: {message}")]
    UnsupportedType { message: String },

    /// Internal consistency violation; indicates a bug in the caller or in
    /// this crate, not in the remote server.
    #[error("Internal error: {message}")]
    Internal { message: String },
}

/// Convenience type alias for Results with dapraster's Error
pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    /// True for errors that abort dataset construction, false for errors
    /// that fail only the read call that raised them.
    pub fn is_fatal_to_open(&self) -> bool {
        matches!(
            self,
            Error::Parse { .. } | Error::Validation { .. } | Error::Connection { .. }
        )
    }
}
