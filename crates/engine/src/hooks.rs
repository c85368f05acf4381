//! Before/after hooks attached to particles, flows, and individual steps.
//!
//! A hook is either *named*, a method on the owning type referenced together
//! with a name used in logs and introspection, or *inline*, a closure over the
//! context. Hooks run in declaration order; each is skipped once the context
//! is halted, and a hook that returns a stop [`Outcome`] ends the sequence.

use std::{fmt, sync::Arc};

use tracing::trace;

use crate::{
    context::{Context, Outcome},
    error::FlowError,
};

/// Result type shared by hooks and work functions.
pub type HookResult = anyhow::Result<Outcome>;

type InlineHook = Arc<dyn Fn(&mut Context) -> HookResult + Send + Sync>;

/// A single callback owned by `T`.
pub enum Hook<T> {
    Named { name: &'static str, method: fn(&T, &mut Context) -> HookResult },
    Inline(InlineHook),
}

impl<T> Hook<T> {
    pub fn named(name: &'static str, method: fn(&T, &mut Context) -> HookResult) -> Self {
        Hook::Named { name, method }
    }

    pub fn inline<C>(callback: C) -> Self
    where
        C: Fn(&mut Context) -> HookResult + Send + Sync + 'static,
    {
        Hook::Inline(Arc::new(callback))
    }

    /// Display name; inline hooks are reported as `<inline>`.
    pub fn name(&self) -> &str {
        match self {
            Hook::Named { name, .. } => *name,
            Hook::Inline(_) => "<inline>",
        }
    }

    pub(crate) fn call(&self, owner: &T, ctx: &mut Context) -> HookResult {
        match self {
            Hook::Named { method, .. } => method(owner, ctx),
            Hook::Inline(callback) => callback(ctx),
        }
    }
}

impl<T> Clone for Hook<T> {
    fn clone(&self) -> Self {
        match self {
            Hook::Named { name, method } => Hook::Named { name: *name, method: *method },
            Hook::Inline(callback) => Hook::Inline(Arc::clone(callback)),
        }
    }
}

impl<T> fmt::Debug for Hook<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Hook").field(&self.name()).finish()
    }
}

/// Ordered before and after hook lists.
pub struct Hooks<T> {
    before: Vec<Hook<T>>,
    after: Vec<Hook<T>>,
}

impl<T> Hooks<T> {
    pub fn new() -> Self {
        Self { before: Vec::new(), after: Vec::new() }
    }

    /// Appends a hook that runs before the work function.
    pub fn before(mut self, hook: Hook<T>) -> Self {
        self.before.push(hook);
        self
    }

    /// Appends a hook that runs after the work function.
    pub fn after(mut self, hook: Hook<T>) -> Self {
        self.after.push(hook);
        self
    }

    pub fn before_hooks(&self) -> &[Hook<T>] {
        &self.before
    }

    pub fn after_hooks(&self) -> &[Hook<T>] {
        &self.after
    }

    pub fn is_empty(&self) -> bool {
        self.before.is_empty() && self.after.is_empty()
    }
}

impl<T> Default for Hooks<T> {
    fn default() -> Self {
        Self::new()
    }
}

impl<T> Clone for Hooks<T> {
    fn clone(&self) -> Self {
        Self { before: self.before.clone(), after: self.after.clone() }
    }
}

impl<T> fmt::Debug for Hooks<T> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Hooks").field("before", &self.before).field("after", &self.after).finish()
    }
}

/// Runs `hooks` in order against `owner`.
///
/// Stops early once the context is halted or a hook returns a stop outcome;
/// the returned outcome is that stop signal, already applied to `ctx`.
pub(crate) fn run_hooks<T>(hooks: &[Hook<T>], owner: &T, ctx: &mut Context) -> Result<Outcome, FlowError> {
    for hook in hooks {
        if ctx.is_halted() {
            break;
        }
        trace!(hook = %hook.name(), "running hook");
        let failed_before = ctx.is_failed();
        let outcome = hook.call(owner, ctx)?;
        let outcome = ctx.absorb(outcome, failed_before);
        if outcome.is_stop() {
            return Ok(outcome);
        }
    }
    Ok(Outcome::Continue)
}
