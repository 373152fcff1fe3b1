//! Error types for the allocation layer.
//!
//! None of these are meant to be handled by ordinary callers. Every public
//! fail-fast operation hands them to the fatal handler together with the
//! caller's [`Site`](crate::Site); only [`try_allocate`](crate::try_allocate)
//! returns one, for callers that want to recover from exhaustion.

use std::fmt;

/// Conditions that end in process termination.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Error {
    /// The underlying allocator could not satisfy a request.
    OutOfMemory {
        /// Bytes requested by the caller.
        size: usize,
    },

    /// More fragments were passed to a concatenation than it accepts.
    TooManyFragments {
        /// The fragment cap.
        max: usize,
    },

    /// A `Display` implementation reported an error while formatting.
    FormatFailed,

    /// A table was grown with a bump increment of zero.
    ZeroBump,
}

impl Error {
    /// True for conditions caused by calling code rather than the runtime.
    #[must_use]
    pub const fn is_misuse(&self) -> bool {
        !matches!(self, Error::OutOfMemory { .. })
    }
}

impl fmt::Display for Error {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Error::OutOfMemory { size } => {
                write!(f, "memory allocation failed ({size} bytes requested)")
            }
            Error::TooManyFragments { max } => {
                write!(f, "more than {max} fragments to concatenate")
            }
            Error::FormatFailed => write!(f, "formatting trait implementation returned an error"),
            Error::ZeroBump => write!(f, "table bump increment must be non-zero"),
        }
    }
}

impl std::error::Error for Error {}

/// Result type for the few fallible entry points.
pub type Result<T> = std::result::Result<T, Error>;
