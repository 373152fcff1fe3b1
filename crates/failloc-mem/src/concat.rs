//! Multi-fragment string concatenation.
//!
//! Concatenation runs in two passes over a fixed array of fragment slots:
//! the first pass measures and collects the fragments, the second copies
//! them into one allocation of exactly the total length. Nothing is
//! reallocated while copying.
//!
//! The first fragment always takes a slot. Further fragments take a slot
//! only when non-empty, so empty fragments are free: they add no bytes and
//! do not count against [`MAX_FRAGMENTS`]. Passing more than that many
//! counted fragments is a programming error and is fatal.
//!
//! The macros give the variadic call shape:
//!
//! ```
//! use failloc_mem::{concat_str, extend_str};
//!
//! let host = "amanda";
//! let path = concat_str!("/var/lib/", host, "/", "curinfo");
//! assert_eq!(&*path, "/var/lib/amanda/curinfo");
//!
//! let mut line = None;
//! extend_str!(line, "DUMP ", host);
//! extend_str!(line, " level=", 0.to_string());
//! assert_eq!(line.as_deref(), Some("DUMP amanda level=0"));
//! ```

use crate::alloc::string_with_capacity;
use crate::error::Error;
use crate::fatal::fatal;
use crate::hooks::Bracket;
use crate::location::Site;

/// Most fragments one concatenation accepts, first fragment included.
pub const MAX_FRAGMENTS: usize = 32;

pub(crate) fn concat_at(site: Site, first: &str, rest: &[&str]) -> Box<str> {
    let mut parts: [&str; MAX_FRAGMENTS] = [""; MAX_FRAGMENTS];
    parts[0] = first;
    let mut count = 1;
    let mut total = first.len();

    for &fragment in rest {
        if fragment.is_empty() {
            continue;
        }
        if count >= MAX_FRAGMENTS {
            fatal(site, Error::TooManyFragments { max: MAX_FRAGMENTS })
        }
        total = match total.checked_add(fragment.len()) {
            Some(total) => total,
            None => fatal(site, Error::OutOfMemory { size: usize::MAX }),
        };
        parts[count] = fragment;
        count += 1;
    }

    let mut out = string_with_capacity(site, total);
    for part in &parts[..count] {
        out.push_str(part);
    }
    debug_assert_eq!(out.len(), total);
    out.into_boxed_str()
}

/// Joins `first` and `fragments`, in order, into one exactly sized string.
#[must_use]
#[track_caller]
pub fn concat(first: &str, fragments: &[&str]) -> Box<str> {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    concat_at(site, first, fragments)
}

/// Like [`concat`], then releases `old`.
///
/// The fragments may not borrow from `old`; it is moved in and dropped
/// once the new string exists.
#[must_use]
#[track_caller]
pub fn concat_replace(old: Box<str>, first: &str, fragments: &[&str]) -> Box<str> {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    let fresh = concat_at(site, first, fragments);
    drop(old);
    fresh
}

/// Appends `fragments` to `target`, replacing its value.
///
/// `None` counts as the empty string. The previous value is released and
/// the new one is stored back and returned.
#[track_caller]
pub fn extend<'a>(target: &'a mut Option<Box<str>>, fragments: &[&str]) -> &'a str {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    let fresh = concat_at(site, target.as_deref().unwrap_or(""), fragments);
    target.insert(fresh)
}

/// Variadic form of [`concat`]. Fragments can be anything `AsRef<str>`.
#[macro_export]
macro_rules! concat_str {
    ($first:expr $(, $fragment:expr)* $(,)?) => {
        $crate::concat(
            ::core::convert::AsRef::<str>::as_ref(&$first),
            &[$(::core::convert::AsRef::<str>::as_ref(&$fragment)),*],
        )
    };
}

/// Variadic form of [`concat_replace`].
#[macro_export]
macro_rules! concat_replace {
    ($old:expr, $first:expr $(, $fragment:expr)* $(,)?) => {
        $crate::concat_replace(
            $old,
            ::core::convert::AsRef::<str>::as_ref(&$first),
            &[$(::core::convert::AsRef::<str>::as_ref(&$fragment)),*],
        )
    };
}

/// Variadic form of [`extend`]. `$target` must be a place of type
/// `Option<Box<str>>`.
#[macro_export]
macro_rules! extend_str {
    ($target:expr $(, $fragment:expr)* $(,)?) => {
        $crate::extend(
            &mut $target,
            &[$(::core::convert::AsRef::<str>::as_ref(&$fragment)),*],
        )
    };
}
