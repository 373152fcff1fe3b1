//! Fail-fast memory and string allocation with caller attribution
//!
//! This crate provides the allocation layer for long-running daemons and
//! their helper programs, where running out of memory is not something
//! callers should have to check for:
//!
//! - **Allocation**: zeroed regions and exactly sized strings that either
//!   succeed or terminate through a fatal handler ([`alloc`])
//! - **String building**: multi-fragment concatenation ([`concat`](mod@concat)) and
//!   two-pass formatting ([`format`](mod@format))
//! - **Tables**: contiguous storage grown in multiples of a bump ([`table`])
//! - **Caller locations**: an interned, recency-ordered cache of
//!   `file@line` tokens used for diagnostics ([`location`], [`hooks`])
//! - **Safe environments**: privilege-aware copies of the process
//!   environment for spawning helpers ([`env`])
//!
//! Every fatal report names the caller's file and line, captured with
//! `#[track_caller]`.
//!
//! ```
//! use failloc_mem::{concat_str, format_str, Table};
//!
//! let path = concat_str!("/etc/", "amanda", "/", "daily");
//! let msg = format_str!("reading {path}");
//! assert_eq!(&*msg, "reading /etc/amanda/daily");
//!
//! let mut table: Table<u32> = Table::new();
//! table.grow(10, 8);
//! assert_eq!(table.capacity(), 16);
//! ```
//!
//! # Features
//!
//! - `fast-hash` (default): hashbrown + fxhash index for the location cache
//! - `path-env`: keep `PATH` in the privileged environment allow-list
//! - `fatal-backtrace`: print a backtrace from the default fatal handler

pub mod alloc;
pub mod concat;
pub mod env;
pub mod error;
pub mod fatal;
pub mod format;
pub mod hooks;
pub mod location;
mod scratch;
pub mod table;

pub use alloc::{Region, allocate, duplicate_string, reallocate_as_new, replace_string, try_allocate};
pub use concat::{MAX_FRAGMENTS, concat, concat_replace, extend};
pub use env::{EnvSource, Identity, MapEnv, ProcessEnv, SafeEnvironment, build_safe_environment};
pub use error::{Error, Result};
pub use fatal::{Fatal, FatalHandler, OrFatal, abort_handler, set_fatal_handler};
pub use format::{PROBE_SIZE, format, format_replace};
pub use hooks::{CallHooks, LogHooks, set_hooks};
pub use location::{LOCATION_CAPACITY, LocationCache, LocationToken, Site, UNKNOWN_LOCATION};
pub use table::{Table, Zeroed};
