/// A type alias for handling errors throughout meshoptimize
pub type Result<T> = std::result::Result<T, Error>;

/// An error that can occur.
///
/// Most entry points in this crate have total contracts (see the crate-level
/// docs): malformed buffers are a caller bug, not a recoverable error. This
/// type exists for the handful of constructors (`VertexDataAdapter::new`)
/// that validate shape before handing back a borrowed view.
#[derive(Debug, thiserror::Error)]
#[non_exhaustive]
pub enum Error {
    /// An error that occurred while accessing or allocating memory
    #[error("memory error: {0}")]
    Memory(std::borrow::Cow<'static, str>),

    /// Generally, these errors correspond to bugs in this library.
    #[error("BUG: Please report this bug with a backtrace to https://github.com/gwihlidal/meshopt-rs\n{0}")]
    Bug(String),

    /// An unexpected I/O error occurred.
    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl Error {
    #[inline]
    pub(crate) fn memory(msg: &'static str) -> Self {
        Self::Memory(std::borrow::Cow::Borrowed(msg))
    }

    #[inline]
    pub(crate) fn memory_dynamic(msg: String) -> Self {
        Self::Memory(std::borrow::Cow::Owned(msg))
    }
}
