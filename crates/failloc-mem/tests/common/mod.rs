// Common test utilities for integration tests
//
// The default fatal handler aborts the process. Every test binary that
// exercises a fatal path installs the panicking handler below first so the
// divergence can be observed with `#[should_panic]` or `catch_unwind`.

#![allow(dead_code)]

use std::panic::{self, UnwindSafe};
use std::sync::Once;

use failloc_mem::{Error, Fatal, set_fatal_handler};

/// Panic payload carrying the fatal report.
#[derive(Debug)]
pub struct Diverged(pub Fatal);

fn panic_handler(report: &Fatal) -> ! {
    panic::panic_any(Diverged(*report))
}

/// Installs the panicking fatal handler once per test binary.
pub fn install_panic_handler() {
    static INSTALL: Once = Once::new();
    INSTALL.call_once(|| {
        set_fatal_handler(panic_handler);
    });
}

/// Runs `f`, which must diverge through the fatal handler, and returns the
/// report it produced.
pub fn expect_fatal<R>(f: impl FnOnce() -> R + UnwindSafe) -> Fatal {
    install_panic_handler();
    match panic::catch_unwind(f) {
        Ok(_) => panic!("operation returned instead of diverging"),
        Err(payload) => match payload.downcast::<Diverged>() {
            Ok(diverged) => diverged.0,
            Err(_) => panic!("operation panicked without a fatal report"),
        },
    }
}

/// `count` single-byte fragments.
pub fn fragments(count: usize) -> Vec<&'static str> {
    std::iter::repeat_n("x", count).collect()
}

/// Shorthand for the out-of-memory error.
pub fn oom(size: usize) -> Error {
    Error::OutOfMemory { size }
}
