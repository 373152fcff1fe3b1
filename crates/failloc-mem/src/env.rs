//! Privilege-aware copies of the process environment.
//!
//! Helper programs should not inherit an environment they were not meant to
//! see. [`SafeEnvironment`] builds an independent `NAME=VALUE` list:
//!
//! - Without privilege elevation (real and effective user and group ids
//!   equal) it copies everything except `LANG` and `LC_*`, in order.
//! - With elevation it copies only an allow-list ([`safe_names`]) of
//!   variables that are actually set, in allow-list order.
//!
//! Building never terminates the process. If memory runs out part way the
//! list built so far is returned.
//!
//! ```
//! use failloc_mem::env::{Identity, MapEnv, SafeEnvironment};
//!
//! let source = MapEnv::new(Identity::unprivileged(1000, 1000))
//!     .with("TZ", "UTC")
//!     .with("LANG", "en_US")
//!     .with("PATH", "/bin");
//!
//! let env = SafeEnvironment::build(&source);
//! let entries: Vec<_> = env.iter().collect();
//! assert_eq!(entries, ["TZ=UTC", "PATH=/bin"]);
//! ```

use std::ffi::{OsStr, OsString};
use std::process::Command;

/// Allow-list candidates and whether this build includes them.
const SAFE_NAMES: [(&str, bool); 4] = [
    ("TZ", true),
    ("SYSTEMROOT", cfg!(windows)),
    ("PATH", cfg!(feature = "path-env")),
    ("DISPLAY", true),
];

/// Variable names copied into the environment of an elevated process.
pub fn safe_names() -> impl Iterator<Item = &'static str> {
    SAFE_NAMES.iter().filter(|(_, on)| *on).map(|(name, _)| *name)
}

/// Real and effective user and group ids.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Identity {
    /// Real user id.
    pub uid: u32,
    /// Effective user id.
    pub euid: u32,
    /// Real group id.
    pub gid: u32,
    /// Effective group id.
    pub egid: u32,
}

impl Identity {
    /// An identity whose real and effective ids match.
    #[must_use]
    pub const fn unprivileged(uid: u32, gid: u32) -> Self {
        Self {
            uid,
            euid: uid,
            gid,
            egid: gid,
        }
    }

    /// The identity of the running process.
    #[cfg(unix)]
    #[must_use]
    pub fn current() -> Self {
        // SAFETY: these calls have no preconditions and cannot fail.
        unsafe {
            Self {
                uid: libc::getuid(),
                euid: libc::geteuid(),
                gid: libc::getgid(),
                egid: libc::getegid(),
            }
        }
    }

    /// The identity of the running process. Without set-id semantics there
    /// is never an elevation.
    #[cfg(not(unix))]
    #[must_use]
    pub fn current() -> Self {
        Self::unprivileged(0, 0)
    }

    /// Whether effective ids differ from real ones.
    #[must_use]
    pub const fn is_elevated(&self) -> bool {
        self.uid != self.euid || self.gid != self.egid
    }
}

/// Read-only view of an environment store.
pub trait EnvSource {
    /// All variables, in store order.
    fn vars(&self) -> impl Iterator<Item = (OsString, OsString)> + '_;

    /// One variable's value.
    fn var(&self, name: &str) -> Option<OsString>;

    /// Who the process runs as.
    fn identity(&self) -> Identity;
}

/// The real process environment.
#[derive(Debug, Default, Clone, Copy)]
pub struct ProcessEnv;

impl EnvSource for ProcessEnv {
    fn vars(&self) -> impl Iterator<Item = (OsString, OsString)> + '_ {
        std::env::vars_os()
    }

    fn var(&self, name: &str) -> Option<OsString> {
        std::env::var_os(name)
    }

    fn identity(&self) -> Identity {
        Identity::current()
    }
}

/// An in-memory environment, for tests and for building child environments
/// from explicit data.
#[derive(Debug, Clone)]
pub struct MapEnv {
    vars: Vec<(OsString, OsString)>,
    identity: Identity,
}

impl MapEnv {
    /// An empty environment seen by `identity`.
    #[must_use]
    pub fn new(identity: Identity) -> Self {
        Self {
            vars: Vec::new(),
            identity,
        }
    }

    /// Adds or overwrites a variable, keeping first-insertion order.
    #[must_use]
    pub fn with(mut self, name: impl Into<OsString>, value: impl Into<OsString>) -> Self {
        let (name, value) = (name.into(), value.into());
        match self.vars.iter_mut().find(|(n, _)| *n == name) {
            Some(slot) => slot.1 = value,
            None => self.vars.push((name, value)),
        }
        self
    }
}

impl EnvSource for MapEnv {
    fn vars(&self) -> impl Iterator<Item = (OsString, OsString)> + '_ {
        self.vars.iter().cloned()
    }

    fn var(&self, name: &str) -> Option<OsString> {
        self.vars
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, v)| v.clone())
    }

    fn identity(&self) -> Identity {
        self.identity
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
struct Entry {
    text: OsString,
    name_len: usize,
}

impl Entry {
    fn new(name: &OsStr, value: &OsStr) -> Option<Self> {
        let mut text = OsString::new();
        text.try_reserve_exact(name.len() + 1 + value.len()).ok()?;
        text.push(name);
        text.push("=");
        text.push(value);
        Some(Self {
            text,
            name_len: name.len(),
        })
    }

    fn split(&self) -> (&OsStr, &OsStr) {
        let bytes = self.text.as_encoded_bytes();
        // SAFETY: `name_len` is the length of the name pushed first and is
        // followed by an ASCII '='; splitting around it lands on boundaries
        // that `from_encoded_bytes_unchecked` accepts.
        unsafe {
            (
                OsStr::from_encoded_bytes_unchecked(&bytes[..self.name_len]),
                OsStr::from_encoded_bytes_unchecked(&bytes[self.name_len + 1..]),
            )
        }
    }
}

/// An independent, ordered list of `NAME=VALUE` entries.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SafeEnvironment {
    entries: Vec<Entry>,
}

impl SafeEnvironment {
    /// Builds from `source` with the default allow-list.
    #[must_use]
    pub fn build(source: &impl EnvSource) -> Self {
        Self::build_with(source, safe_names())
    }

    /// Builds from `source`, consulting `allow_list` only when the process
    /// runs with elevated privileges.
    #[must_use]
    pub fn build_with<'a>(
        source: &impl EnvSource,
        allow_list: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        let identity = source.identity();
        let mut env = Self::default();

        let complete = if identity.is_elevated() {
            allow_list
                .into_iter()
                .filter_map(|name| source.var(name).map(|value| (OsString::from(name), value)))
                .all(|(name, value)| env.push(&name, &value))
        } else {
            source
                .vars()
                .filter(|(name, _)| !is_locale(name))
                .all(|(name, value)| env.push(&name, &value))
        };

        if !complete {
            failloc_log::warn!("out of memory building safe environment, keeping {} entries", env.len());
        }
        failloc_log::debug!(
            "safe environment: {} entries (elevated: {})",
            env.len(),
            identity.is_elevated()
        );
        env
    }

    fn push(&mut self, name: &OsStr, value: &OsStr) -> bool {
        if self.entries.try_reserve(1).is_err() {
            return false;
        }
        match Entry::new(name, value) {
            Some(entry) => {
                self.entries.push(entry);
                true
            }
            None => false,
        }
    }

    /// Number of entries.
    #[must_use]
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    /// True when no variable was copied.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// `NAME=VALUE` entries in order.
    pub fn iter(&self) -> impl Iterator<Item = &OsStr> + '_ {
        self.entries.iter().map(|e| e.text.as_os_str())
    }

    /// `(NAME, VALUE)` pairs in order.
    pub fn pairs(&self) -> impl Iterator<Item = (&OsStr, &OsStr)> + '_ {
        self.entries.iter().map(Entry::split)
    }

    /// Value of `name`, if copied.
    #[must_use]
    pub fn get(&self, name: &str) -> Option<&OsStr> {
        self.pairs().find(|(n, _)| *n == name).map(|(_, v)| v)
    }

    /// Replaces `command`'s environment with this list.
    pub fn apply<'c>(&self, command: &'c mut Command) -> &'c mut Command {
        command.env_clear().envs(self.pairs())
    }

    /// The entries as owned `NAME=VALUE` strings.
    #[must_use]
    pub fn into_vec(self) -> Vec<OsString> {
        self.entries.into_iter().map(|e| e.text).collect()
    }
}

fn is_locale(name: &OsStr) -> bool {
    name == "LANG" || name.as_encoded_bytes().starts_with(b"LC_")
}

/// Builds a [`SafeEnvironment`] from the running process.
#[must_use]
pub fn build_safe_environment() -> SafeEnvironment {
    SafeEnvironment::build(&ProcessEnv)
}
