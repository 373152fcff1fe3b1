//! Diagnostic call-stack hooks.
//!
//! An installed [`CallHooks`] observer sees an `enter` and a matching
//! `leave` around every public operation, tagged with the caller's interned
//! [`LocationToken`]. Hooks are pure observers and cannot change an
//! operation's outcome. Internal work done on behalf of an operation (a
//! concatenation allocating its result) is not bracketed separately.
//!
//! With no hooks installed nothing is interned and the bracket costs one
//! uncontended read lock.
//!
//! Hooks may call back into this crate. Operations run from inside a hook
//! callback, on the same thread, are not bracketed.

use std::cell::Cell;
use std::sync::{Arc, PoisonError, RwLock};

use crate::location::{LocationToken, Site};

/// Observer notified around each public operation.
pub trait CallHooks: Send + Sync {
    /// Called before the operation does any work.
    fn enter(&self, token: LocationToken);

    /// Called once the operation has produced its result.
    fn leave(&self, token: LocationToken);
}

static HOOKS: RwLock<Option<Arc<dyn CallHooks>>> = RwLock::new(None);

thread_local! {
    static IN_HOOK: Cell<bool> = const { Cell::new(false) };
}

/// Marks the current thread as running a hook until dropped.
struct HookScope;

impl HookScope {
    fn run(f: impl FnOnce()) {
        IN_HOOK.set(true);
        let _scope = HookScope;
        f();
    }
}

impl Drop for HookScope {
    fn drop(&mut self) {
        IN_HOOK.set(false);
    }
}

/// Installs (or with `None`, removes) the process-wide hooks.
///
/// Returns the previously installed hooks.
pub fn set_hooks(hooks: Option<Arc<dyn CallHooks>>) -> Option<Arc<dyn CallHooks>> {
    let mut slot = HOOKS.write().unwrap_or_else(PoisonError::into_inner);
    std::mem::replace(&mut *slot, hooks)
}

/// Hooks that trace every bracket through `failloc-log`.
#[derive(Debug, Default, Clone, Copy)]
pub struct LogHooks;

impl CallHooks for LogHooks {
    fn enter(&self, token: LocationToken) {
        failloc_log::trace!("enter {token}");
    }

    fn leave(&self, token: LocationToken) {
        failloc_log::trace!("leave {token}");
    }
}

/// RAII bracket: `enter` on creation, `leave` on drop.
pub(crate) struct Bracket {
    active: Option<(Arc<dyn CallHooks>, LocationToken)>,
}

impl Bracket {
    pub(crate) fn enter(site: Site) -> Self {
        if IN_HOOK.get() {
            return Self { active: None };
        }
        let hooks = HOOKS.read().unwrap_or_else(PoisonError::into_inner).clone();
        let active = hooks.map(|hooks| {
            let token = site.token();
            HookScope::run(|| hooks.enter(token));
            (hooks, token)
        });
        Self { active }
    }
}

impl Drop for Bracket {
    fn drop(&mut self) {
        if let Some((hooks, token)) = self.active.take() {
            HookScope::run(|| hooks.leave(token));
        }
    }
}
