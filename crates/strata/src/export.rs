//! Export of laid-out timelines.
//!
//! The [`Exporter`] trait turns a [`Scene`] into an output format. The only
//! backend is [`svg`].
//!
//! Export operations return [`Error`], which converts into
//! [`StrataError::Export`](crate::StrataError::Export) at the crate boundary.

pub mod svg;

use crate::scene::Scene;

/// Abstraction for timeline export backends.
pub trait Exporter {
    /// Writes `scene` in the backend's output format.
    ///
    /// # Errors
    ///
    /// Returns [`Error::Render`] if the scene cannot be converted, or
    /// [`Error::Io`] if writing the output fails.
    fn export_scene(&mut self, scene: &Scene) -> Result<(), Error>;
}

/// Errors that can occur during export.
#[derive(Debug)]
pub enum Error {
    /// A rendering or conversion failure described by `message`.
    Render(String),
    /// An I/O error encountered while writing output.
    Io(std::io::Error),
}

impl std::fmt::Display for Error {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Render(msg) => write!(f, "Render error: {msg}"),
            Self::Io(err) => write!(f, "I/O error: {err}"),
        }
    }
}

impl std::error::Error for Error {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            Self::Render(_) => None,
            Self::Io(err) => Some(err),
        }
    }
}
