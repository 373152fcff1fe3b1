//! The fatal-reporting path.
//!
//! Allocation failure and programming misuse never come back to the caller.
//! They are packaged as a [`Fatal`] report and handed to the installed
//! [`FatalHandler`], whose type guarantees it does not return.
//!
//! The default handler logs the report through `failloc-log` and aborts.
//! Embedders install their own with [`set_fatal_handler`], typically at
//! startup; test suites install one that panics so divergence can be
//! observed with `#[should_panic]` or `catch_unwind`.
//!
//! ```should_panic
//! use failloc_mem::{Fatal, set_fatal_handler};
//!
//! fn panic_handler(report: &Fatal) -> ! {
//!     panic!("{report}");
//! }
//!
//! set_fatal_handler(panic_handler);
//! let _ = failloc_mem::allocate(usize::MAX);
//! ```

use std::fmt;
use std::sync::{PoisonError, RwLock};

use crate::error::{Error, Result};
use crate::location::Site;

/// A diverging sink for fatal reports.
pub type FatalHandler = fn(&Fatal) -> !;

static HANDLER: RwLock<FatalHandler> = RwLock::new(abort_handler);

/// What went wrong, and where.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Fatal {
    site: Site,
    error: Error,
}

impl Fatal {
    /// Creates a report.
    #[must_use]
    pub const fn new(site: Site, error: Error) -> Self {
        Self { site, error }
    }

    /// Call site of the failed operation.
    #[must_use]
    pub const fn site(&self) -> Site {
        self.site
    }

    /// The failure.
    #[must_use]
    pub const fn error(&self) -> Error {
        self.error
    }
}

impl fmt::Display for Fatal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}: {}", self.site, self.error)
    }
}

impl std::error::Error for Fatal {}

/// Installs `handler` and returns the previous one.
pub fn set_fatal_handler(handler: FatalHandler) -> FatalHandler {
    let mut slot = HANDLER.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, handler)
}

/// Reports `error` at `site` and never returns.
pub fn fatal(site: Site, error: Error) -> ! {
    // Copy the handler out so the lock is released before it runs.
    let handler = *HANDLER.read().unwrap_or_else(PoisonError::into_inner);
    handler(&Fatal::new(site, error))
}

/// The default handler: log at error level, then abort the process.
pub fn abort_handler(report: &Fatal) -> ! {
    failloc_log::error!("{report}");

    #[cfg(feature = "fatal-backtrace")]
    {
        let trace = backtrace::Backtrace::new();
        failloc_log::error!("backtrace:\n{trace:?}");
    }

    std::process::abort()
}

/// Turns a [`Result`] from this crate into its value or a fatal report.
///
/// This is how the single `Result`-returning primitive keeps the fail-fast
/// contract when ordinary code calls it.
pub trait OrFatal<T> {
    /// The `Ok` value, or a fatal report at the caller's site.
    #[track_caller]
    fn or_fatal(self) -> T;
}

impl<T> OrFatal<T> for Result<T> {
    #[track_caller]
    fn or_fatal(self) -> T {
        match self {
            Ok(value) => value,
            Err(error) => fatal(Site::caller(), error),
        }
    }
}
