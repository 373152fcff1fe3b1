//! Fail-fast allocation primitives.
//!
//! Every function here either returns what was asked for or reports a
//! [`Fatal`](crate::Fatal) through the installed handler and never returns.
//! Callers never check for allocation failure.
//!
//! Requests go to the global allocator through `try_reserve_exact`, which
//! is the only place a failure can surface as a value. Every public entry
//! point is `#[track_caller]`, so the site in a fatal report and in the
//! hook brackets is the caller's.
//!
//! # Examples
//!
//! ```
//! use failloc_mem::{allocate, duplicate_string, reallocate_as_new};
//!
//! let region = allocate(0);
//! assert_eq!(region.len(), 1); // never zero-sized
//!
//! let bigger = reallocate_as_new(region, 4096);
//! assert_eq!(bigger.len(), 4096);
//!
//! let name = duplicate_string("holding disk");
//! assert_eq!(&*name, "holding disk");
//! ```

use std::fmt;
use std::ops::{Deref, DerefMut};

use crate::error::{Error, Result};
use crate::fatal::fatal;
use crate::hooks::Bracket;
use crate::location::Site;

/// An owned, zero-initialised byte region of at least one byte.
///
/// Regions are move-only: the replace operations take the old region by
/// value, so it cannot be used after it has been released.
pub struct Region {
    bytes: Box<[u8]>,
}

impl Region {
    /// Size in bytes. Always at least 1.
    #[must_use]
    pub fn len(&self) -> usize {
        self.bytes.len()
    }

    /// Always false; kept for API symmetry with slices.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.bytes.is_empty()
    }

    /// Start of the region.
    #[must_use]
    pub fn as_ptr(&self) -> *const u8 {
        self.bytes.as_ptr()
    }

    /// Gives up the region as a boxed slice.
    #[must_use]
    pub fn into_boxed_slice(self) -> Box<[u8]> {
        self.bytes
    }
}

impl Deref for Region {
    type Target = [u8];

    fn deref(&self) -> &[u8] {
        &self.bytes
    }
}

impl DerefMut for Region {
    fn deref_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl AsRef<[u8]> for Region {
    fn as_ref(&self) -> &[u8] {
        &self.bytes
    }
}

impl AsMut<[u8]> for Region {
    fn as_mut(&mut self) -> &mut [u8] {
        &mut self.bytes
    }
}

impl fmt::Debug for Region {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Region").field("len", &self.len()).finish()
    }
}

/// Reserves `max(size, 1)` zeroed bytes, or reports why not.
///
/// This is the one primitive with an error channel. Its only error is
/// [`Error::OutOfMemory`], and ordinary callers must treat it as fatal (see
/// [`OrFatal`](crate::OrFatal)). Code that wants to degrade instead of
/// terminating can match on it.
pub fn try_allocate(size: usize) -> Result<Region> {
    let len = size.max(1);
    let mut bytes = Vec::new();
    bytes
        .try_reserve_exact(len)
        .map_err(|_| Error::OutOfMemory { size })?;
    bytes.resize(len, 0);
    Ok(Region {
        bytes: bytes.into_boxed_slice(),
    })
}

pub(crate) fn allocate_at(site: Site, size: usize) -> Region {
    match try_allocate(size) {
        Ok(region) => {
            failloc_log::trace!("{site}: {} bytes", region.len());
            region
        }
        Err(error) => fatal(site, error),
    }
}

/// An empty `String` able to hold exactly `len` bytes without growing.
pub(crate) fn string_with_capacity(site: Site, len: usize) -> String {
    let mut out = String::new();
    if out.try_reserve_exact(len).is_err() {
        fatal(site, Error::OutOfMemory { size: len })
    }
    out
}

pub(crate) fn duplicate_at(site: Site, s: &str) -> Box<str> {
    let mut out = string_with_capacity(site, s.len());
    out.push_str(s);
    out.into_boxed_str()
}

/// Allocates `max(size, 1)` zeroed bytes.
///
/// Never returns on allocation failure.
#[must_use]
#[track_caller]
pub fn allocate(size: usize) -> Region {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    allocate_at(site, size)
}

/// Allocates a fresh region and releases `old`.
///
/// The contents of `old` are not carried over: this is a replace, not a
/// resize. The new region is obtained before `old` is released.
#[must_use]
#[track_caller]
pub fn reallocate_as_new(old: Region, size: usize) -> Region {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    let fresh = allocate_at(site, size);
    drop(old);
    fresh
}

/// Copies `s` into a new, exactly sized string.
#[must_use]
#[track_caller]
pub fn duplicate_string(s: &str) -> Box<str> {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    duplicate_at(site, s)
}

/// Copies `s` into a new string and releases `old`.
#[must_use]
#[track_caller]
pub fn replace_string(old: Box<str>, s: &str) -> Box<str> {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    let fresh = duplicate_at(site, s);
    drop(old);
    fresh
}
