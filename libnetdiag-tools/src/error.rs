use std::io;

use thiserror::Error;

/// Errors surfaced by the capture control plane.
///
/// Data-plane failures (a single frame failing to decode, a transient read
/// error) are absorbed inside the capture loop and never reach callers;
/// `FrameRead` only travels between a frame source and the loop.
#[derive(Debug, Error)]
pub enum Error {
    #[error("capture already running")]
    AlreadyRunning,
    #[error("capture not running")]
    NotRunning,
    #[error("could not open interface: {0}")]
    InterfaceOpen(String),
    #[error("could not list interfaces: {0}")]
    InterfaceList(String),
    #[error("could not apply filter: {0}")]
    Filter(String),
    #[error("frame read failed: {0}")]
    FrameRead(String),
    #[error("{0}")]
    Generic(&'static str),
    #[error(transparent)]
    Io(#[from] io::Error),
}

impl From<&'static str> for Error {
    fn from(s: &'static str) -> Self {
        Error::Generic(s)
    }
}
