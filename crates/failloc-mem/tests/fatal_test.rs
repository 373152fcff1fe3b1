//! Fatal paths: every fail-fast operation diverges through the installed
//! handler and reports the caller's site.

mod common;

use std::fmt;
use std::panic::AssertUnwindSafe;

use common::{expect_fatal, fragments, oom};
use failloc_mem::{
    Error, MAX_FRAGMENTS, OrFatal, Table, allocate, concat, concat_str, extend, format_str,
    reallocate_as_new, try_allocate,
};

struct Broken;

impl fmt::Display for Broken {
    fn fmt(&self, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        Err(fmt::Error)
    }
}

/// Fails only once it has written past the probe.
struct BrokenLate;

impl fmt::Display for BrokenLate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&"y".repeat(100))?;
        Err(fmt::Error)
    }
}

#[test]
fn test_allocate_exhaustion_reports_caller() {
    let line = line!() + 1;
    let report = expect_fatal(|| allocate(usize::MAX));
    assert_eq!(report.error(), oom(usize::MAX));
    assert_eq!(report.site().line(), line);
    assert_eq!(report.site().basename(), "fatal_test.rs");
}

#[test]
fn test_reallocate_exhaustion_is_fatal() {
    let report = expect_fatal(|| reallocate_as_new(allocate(4), usize::MAX));
    assert_eq!(report.error(), oom(usize::MAX));
}

#[test]
fn test_or_fatal_uses_caller_site() {
    let line = line!() + 1;
    let report = expect_fatal(|| try_allocate(usize::MAX).or_fatal());
    assert_eq!(report.site().line(), line);
    assert!(!report.error().is_misuse());
}

#[test]
fn test_too_many_fragments() {
    let rest = fragments(MAX_FRAGMENTS);
    let report = expect_fatal(|| concat("first", &rest));
    assert_eq!(report.error(), Error::TooManyFragments { max: MAX_FRAGMENTS });
    assert!(report.error().is_misuse());
}

#[test]
fn test_cap_counts_first_fragment_even_if_empty() {
    // An empty first fragment still takes a slot.
    let rest = fragments(MAX_FRAGMENTS);
    let report = expect_fatal(|| concat("", &rest));
    assert_eq!(report.error(), Error::TooManyFragments { max: MAX_FRAGMENTS });

    let rest = fragments(MAX_FRAGMENTS - 1);
    assert_eq!(concat("", &rest).len(), MAX_FRAGMENTS - 1);
}

#[test]
fn test_extend_over_cap_leaves_target() {
    let rest = fragments(MAX_FRAGMENTS);
    let mut target = Some(Box::<str>::from("keep"));
    let report = expect_fatal(AssertUnwindSafe(|| extend(&mut target, &rest).len()));
    assert_eq!(report.error(), Error::TooManyFragments { max: MAX_FRAGMENTS });
    assert_eq!(target.as_deref(), Some("keep"));
}

#[test]
fn test_macro_over_cap() {
    let report = expect_fatal(|| {
        concat_str!(
            "0", "1", "2", "3", "4", "5", "6", "7", "8", "9", "a", "b", "c", "d", "e", "f", "g",
            "h", "i", "j", "k", "l", "m", "n", "o", "p", "q", "r", "s", "t", "u", "v", "w"
        )
    });
    assert_eq!(report.error(), Error::TooManyFragments { max: MAX_FRAGMENTS });
}

#[test]
fn test_failing_display_is_fatal() {
    let report = expect_fatal(|| format_str!("value: {}", Broken));
    assert_eq!(report.error(), Error::FormatFailed);

    let report = expect_fatal(|| format_str!("{}", BrokenLate));
    assert_eq!(report.error(), Error::FormatFailed);
}

#[test]
fn test_zero_bump_is_fatal() {
    let report = expect_fatal(|| {
        let mut table: Table<u32> = Table::new();
        table.grow(0, 0)
    });
    assert_eq!(report.error(), Error::ZeroBump);
}

#[test]
fn test_table_exhaustion_is_fatal() {
    let report = expect_fatal(|| {
        let mut table: Table<u64> = Table::new();
        table.grow(usize::MAX / 4, 1)
    });
    assert!(matches!(report.error(), Error::OutOfMemory { .. }));
}

#[test]
fn test_report_display_names_site() {
    let report = expect_fatal(|| allocate(usize::MAX));
    let text = report.to_string();
    assert!(text.contains("fatal_test.rs@"), "{text}");
    assert!(text.ends_with(&format!("({} bytes requested)", usize::MAX)), "{text}");
}
