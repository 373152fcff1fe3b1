//! Caller-location interning.
//!
//! Every public operation in this crate knows the [`Site`] it was called
//! from. Diagnostic hooks want a stable, printable identity for that site,
//! and they want the *same* identity every time so they can compare by
//! address. [`LocationCache`] hands out one leaked `"<basename>@<line>"`
//! string per distinct site and keeps the entries in recency order.
//!
//! # Design
//!
//! - Nodes live in a `Vec` and are linked through indices into a doubly
//!   linked list, most recently used first. Promoting a hit to the head is
//!   an O(1) unlink/relink.
//! - A hash index from site string to node index replaces the linear scan.
//!   With the `fast-hash` feature it is a hashbrown map with the Fx hasher,
//!   otherwise `std::collections::HashMap`.
//! - Tokens are leaked and never freed, so they outlive the cache and any
//!   [`LocationCache::reset`].
//!
//! Interning never reaches the fatal handler. If a node or token cannot be
//! allocated the caller gets [`UNKNOWN_LOCATION`] instead, because this path
//! runs around allocation diagnostics and must not recurse into them.
//!
//! # Examples
//!
//! ```
//! use failloc_mem::LocationCache;
//!
//! let mut cache = LocationCache::new();
//!
//! let a = cache.intern("src/io/dumper.rs", 120);
//! let b = cache.intern("other/dumper.rs", 120);
//! assert_eq!(a.as_str(), "dumper.rs@120");
//! assert!(a.ptr_eq(b)); // same basename and line, same token
//!
//! cache.intern("driver.rs", 7);
//! assert_eq!(cache.head().unwrap().as_str(), "driver.rs@7");
//! ```

use std::fmt::{self, Write};
use std::panic::Location;
use std::sync::{Mutex, OnceLock, PoisonError};

use crate::scratch::Probe;

#[cfg(feature = "fast-hash")]
type Index = hashbrown::HashMap<&'static str, usize, fxhash::FxBuildHasher>;

#[cfg(not(feature = "fast-hash"))]
type Index = std::collections::HashMap<&'static str, usize>;

/// Size of the scratch buffer a site string is formatted into.
///
/// One byte is reserved, so at most 255 bytes of `"<basename>@<line>"` are
/// kept. Longer combinations are silently truncated.
pub const LOCATION_CAPACITY: usize = 256;

/// Placeholder returned when the cache cannot allocate a new entry.
pub const UNKNOWN_LOCATION: &str = "??";

/// The source position of a call into this crate.
///
/// Captured with `#[track_caller]`, so the file and line are those of the
/// code calling the public operation, not of this crate.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct Site {
    file: &'static str,
    line: u32,
}

impl Site {
    /// Creates a site from explicit parts.
    #[must_use]
    pub const fn new(file: &'static str, line: u32) -> Self {
        Self { file, line }
    }

    /// The site of whoever called the enclosing `#[track_caller]` function.
    #[must_use]
    #[track_caller]
    pub fn caller() -> Self {
        Location::caller().into()
    }

    /// Full source path as recorded by the compiler.
    #[must_use]
    pub const fn file(&self) -> &'static str {
        self.file
    }

    /// Source line.
    #[must_use]
    pub const fn line(&self) -> u32 {
        self.line
    }

    /// The last path element of [`Site::file`].
    #[must_use]
    pub fn basename(&self) -> &'static str {
        basename(self.file)
    }

    /// Interns this site in the process-wide cache.
    #[must_use]
    pub fn token(&self) -> LocationToken {
        intern(self.file, self.line)
    }
}

impl From<&'static Location<'static>> for Site {
    fn from(loc: &'static Location<'static>) -> Self {
        Self::new(loc.file(), loc.line())
    }
}

impl fmt::Display for Site {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}@{}", self.file, self.line)
    }
}

/// An interned `"<basename>@<line>"` string.
///
/// Tokens compare by address: two tokens are equal exactly when they came
/// from the same cache entry. The [`UNKNOWN_LOCATION`] placeholder is the
/// exception and compares by content; no interned site string can spell
/// it, as every one contains `'@'`.
#[derive(Debug, Clone, Copy)]
pub struct LocationToken(&'static str);

impl LocationToken {
    /// The placeholder token.
    pub const UNKNOWN: LocationToken = LocationToken(UNKNOWN_LOCATION);

    /// The site string.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        self.0
    }

    /// Whether both tokens point at the same interned string.
    #[must_use]
    pub fn ptr_eq(self, other: LocationToken) -> bool {
        std::ptr::eq(self.0, other.0)
    }

    /// Whether this is the allocation-failure placeholder.
    #[must_use]
    pub fn is_unknown(self) -> bool {
        self.0 == UNKNOWN_LOCATION
    }
}

impl PartialEq for LocationToken {
    fn eq(&self, other: &Self) -> bool {
        self.ptr_eq(*other) || (self.is_unknown() && other.is_unknown())
    }
}

impl Eq for LocationToken {}

impl fmt::Display for LocationToken {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.0)
    }
}

impl AsRef<str> for LocationToken {
    fn as_ref(&self) -> &str {
        self.0
    }
}

struct Node {
    token: &'static str,
    prev: Option<usize>,
    next: Option<usize>,
}

/// Recency-ordered interning table of site strings.
///
/// A `LocationCache` is a plain single-owner value: mutation goes through
/// `&mut self`. The process-wide instance behind [`intern`] is wrapped in a
/// `Mutex`.
pub struct LocationCache {
    nodes: Vec<Node>,
    index: Index,
    head: Option<usize>,
}

impl LocationCache {
    /// Creates an empty cache.
    #[must_use]
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            index: Index::default(),
            head: None,
        }
    }

    /// Returns the token for `file` and `line`, creating it on first use.
    ///
    /// Directory components of `file` are ignored. A hit moves the entry to
    /// the head of the recency order; a miss inserts a new entry there.
    pub fn intern(&mut self, file: &str, line: u32) -> LocationToken {
        let mut scratch = [0u8; LOCATION_CAPACITY];
        let mut probe = Probe::new(&mut scratch);
        // Probe never fails, it truncates.
        let _ = write!(probe, "{}@{}", basename(file), line);
        let loc = probe.as_str();

        if let Some(&idx) = self.index.get(loc) {
            self.promote(idx);
            return LocationToken(self.nodes[idx].token);
        }

        match self.insert(loc) {
            Some(token) => LocationToken(token),
            None => {
                failloc_log::warn!("no memory to intern {loc}, using {UNKNOWN_LOCATION}");
                LocationToken::UNKNOWN
            }
        }
    }

    /// Forgets every entry.
    ///
    /// Tokens already handed out stay valid; interning the same site again
    /// creates a new token.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.index.clear();
        self.head = None;
    }

    /// Number of distinct sites.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// True if nothing has been interned since creation or the last reset.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// The most recently used token.
    #[must_use]
    pub fn head(&self) -> Option<LocationToken> {
        self.head.map(|idx| LocationToken(self.nodes[idx].token))
    }

    /// Whether a site string (`"<basename>@<line>"`) is cached.
    #[must_use]
    pub fn contains(&self, loc: &str) -> bool {
        self.index.contains_key(loc)
    }

    /// Tokens from most to least recently used.
    pub fn iter(&self) -> Iter<'_> {
        Iter {
            cache: self,
            cursor: self.head,
        }
    }

    fn insert(&mut self, loc: &str) -> Option<&'static str> {
        self.nodes.try_reserve(1).ok()?;
        self.index.try_reserve(1).ok()?;

        let mut owned = String::new();
        owned.try_reserve_exact(loc.len()).ok()?;
        owned.push_str(loc);
        let token: &'static str = Box::leak(owned.into_boxed_str());

        let idx = self.nodes.len();
        self.nodes.push(Node {
            token,
            prev: None,
            next: None,
        });
        self.index.insert(token, idx);
        self.link_front(idx);
        Some(token)
    }

    fn promote(&mut self, idx: usize) {
        if self.head == Some(idx) {
            return;
        }
        self.unlink(idx);
        self.link_front(idx);
    }

    fn unlink(&mut self, idx: usize) {
        let (prev, next) = (self.nodes[idx].prev, self.nodes[idx].next);
        match prev {
            Some(p) => self.nodes[p].next = next,
            None => self.head = next,
        }
        if let Some(n) = next {
            self.nodes[n].prev = prev;
        }
        self.nodes[idx].prev = None;
        self.nodes[idx].next = None;
    }

    fn link_front(&mut self, idx: usize) {
        let old = self.head;
        self.nodes[idx].prev = None;
        self.nodes[idx].next = old;
        if let Some(h) = old {
            self.nodes[h].prev = Some(idx);
        }
        self.head = Some(idx);
    }
}

impl Default for LocationCache {
    fn default() -> Self {
        Self::new()
    }
}

impl fmt::Debug for LocationCache {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter().map(LocationToken::as_str)).finish()
    }
}

/// Recency-order iterator over a [`LocationCache`].
pub struct Iter<'a> {
    cache: &'a LocationCache,
    cursor: Option<usize>,
}

impl Iterator for Iter<'_> {
    type Item = LocationToken;

    fn next(&mut self) -> Option<Self::Item> {
        let node = &self.cache.nodes[self.cursor?];
        self.cursor = node.next;
        Some(LocationToken(node.token))
    }
}

fn basename(file: &str) -> &str {
    file.rfind(|c: char| c == '/' || c == '\\')
        .map_or(file, |i| &file[i + 1..])
}

fn global() -> &'static Mutex<LocationCache> {
    static CACHE: OnceLock<Mutex<LocationCache>> = OnceLock::new();
    CACHE.get_or_init(|| Mutex::new(LocationCache::new()))
}

/// Interns `file` and `line` in the process-wide cache.
///
/// Tokens from this function are pointer-identical across threads for the
/// same site.
pub fn intern(file: &str, line: u32) -> LocationToken {
    global()
        .lock()
        .unwrap_or_else(PoisonError::into_inner)
        .intern(file, line)
}

/// Runs `f` with the process-wide cache locked.
pub fn with_global_cache<R>(f: impl FnOnce(&mut LocationCache) -> R) -> R {
    f(&mut global().lock().unwrap_or_else(PoisonError::into_inner))
}
