//! Two-pass formatting into exactly sized strings.
//!
//! The first pass renders into a [`PROBE_SIZE`]-byte scratch buffer while
//! measuring the full length. Short output is copied out as is. Longer
//! output is rendered a second time into a buffer reserved for exactly the
//! measured length, so nothing is ever truncated and nothing grows
//! mid-render.
//!
//! Both passes consume the same `fmt::Arguments`. `Arguments` is `Copy`, so
//! each pass gets a fresh argument sequence.
//!
//! ```
//! use failloc_mem::{format_replace, format_str};
//!
//! let msg = format_str!("{}:{} level {}", "host", "/usr", 1);
//! assert_eq!(&*msg, "host:/usr level 1");
//!
//! let msg = format_replace!(msg, "{:>70}", "right-aligned");
//! assert_eq!(msg.len(), 70);
//! ```

use std::fmt::{self, Write};

use crate::alloc::{duplicate_at, string_with_capacity};
use crate::error::Error;
use crate::fatal::fatal;
use crate::hooks::Bracket;
use crate::location::Site;
use crate::scratch::Probe;

/// Size of the first-pass scratch buffer. Output shorter than this is
/// produced with a single rendering pass.
pub const PROBE_SIZE: usize = 64;

pub(crate) fn format_at(site: Site, args: fmt::Arguments<'_>) -> Box<str> {
    let mut scratch = [0u8; PROBE_SIZE];
    let mut probe = Probe::new(&mut scratch);
    if probe.write_fmt(args).is_err() {
        fatal(site, Error::FormatFailed)
    }

    let required = probe.required();
    if required < PROBE_SIZE {
        return duplicate_at(site, probe.as_str());
    }

    failloc_log::debug!("{site}: {required} bytes, formatting again");
    let mut out = string_with_capacity(site, required);
    if out.write_fmt(args).is_err() {
        fatal(site, Error::FormatFailed)
    }
    if out.len() != required {
        failloc_log::warn!(
            "{site}: second pass rendered {} bytes, first pass measured {required}",
            out.len()
        );
    }
    out.into_boxed_str()
}

/// Renders `args` into a new, exactly sized string.
///
/// Usually called through [`format_str!`](crate::format_str).
#[must_use]
#[track_caller]
pub fn format(args: fmt::Arguments<'_>) -> Box<str> {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    format_at(site, args)
}

/// Renders `args` into a new string, then releases `old`.
#[must_use]
#[track_caller]
pub fn format_replace(old: Box<str>, args: fmt::Arguments<'_>) -> Box<str> {
    let site = Site::caller();
    let _bracket = Bracket::enter(site);
    let fresh = format_at(site, args);
    drop(old);
    fresh
}

/// `format!` with fail-fast, exactly sized output.
#[macro_export]
macro_rules! format_str {
    ($($arg:tt)*) => {
        $crate::format(::core::format_args!($($arg)*))
    };
}

/// Formats a new string and releases `$old`.
#[macro_export]
macro_rules! format_replace {
    ($old:expr, $($arg:tt)*) => {
        $crate::format_replace($old, ::core::format_args!($($arg)*))
    };
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_short_output_single_pass() {
        let out = format_str!("{}-{:03}", "tape", 7);
        assert_eq!(&*out, "tape-007");
    }

    #[test]
    fn test_probe_boundary() {
        // 63 bytes fits the probe, 64 needs the second pass.
        let fits = "a".repeat(PROBE_SIZE - 1);
        let spills = "b".repeat(PROBE_SIZE);

        let out = format_str!("{fits}");
        assert_eq!(&*out, fits);
        assert_eq!(out.len(), PROBE_SIZE - 1);

        let out = format_str!("{spills}");
        assert_eq!(&*out, spills);
        assert_eq!(out.len(), PROBE_SIZE);
    }

    #[test]
    fn test_long_output_not_truncated() {
        let parts: Vec<String> = (0..100).map(|i| i.to_string()).collect();
        let expected = parts.join(",");
        let out = format_str!("{}", parts.join(","));
        assert_eq!(&*out, expected);
        assert_eq!(out.into_string().capacity(), expected.len());
    }

    #[test]
    fn test_multibyte_around_boundary() {
        // 62 ASCII bytes then a 3-byte char straddles the probe limit.
        let text = format!("{}€ and more", "x".repeat(62));
        let out = format_str!("{text}");
        assert_eq!(&*out, text);
    }

    #[test]
    fn test_empty_format() {
        let out = format_str!("");
        assert!(out.is_empty());
    }

    #[test]
    fn test_format_replace() {
        let old = format_str!("old {}", 1);
        let new = format_replace!(old, "new {}", 2);
        assert_eq!(&*new, "new 2");
    }

    #[test]
    fn test_format_function_direct() {
        let out = format(format_args!("{:?}", [1, 2]));
        assert_eq!(&*out, "[1, 2]");
    }
}
