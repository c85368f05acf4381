//! Branches: guarded transitions from one step to the next.

use std::{fmt, sync::Arc};

use crate::context::{Context, Truthy};

/// Where a branch leads.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Target {
    /// Another step, by name.
    Step(String),
    /// Terminate the flow normally.
    End,
}

impl Target {
    pub fn step_name(&self) -> Option<&str> {
        match self {
            Target::Step(name) => Some(name),
            Target::End => None,
        }
    }
}

impl fmt::Display for Target {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Target::Step(name) => f.write_str(name),
            Target::End => f.write_str("endflow"),
        }
    }
}

impl From<&str> for Target {
    fn from(name: &str) -> Self {
        Target::Step(name.to_string())
    }
}

impl From<String> for Target {
    fn from(name: String) -> Self {
        Target::Step(name)
    }
}

/// How a guard's result selects the branch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Polarity {
    /// Taken when the guard is truthy.
    If,
    /// Taken when the guard is falsy.
    Unless,
}

type NamedGuard<F> = Arc<dyn Fn(&F, &Context) -> bool + Send + Sync>;
type InlineGuard = Arc<dyn Fn(&Context) -> bool + Send + Sync>;

/// A branch condition evaluated against the flow instance or the context.
pub enum Guard<F> {
    /// A method on the flow type, referenced by name.
    Named { name: &'static str, method: NamedGuard<F> },
    /// A closure over the context.
    Inline(InlineGuard),
}

impl<F: 'static> Guard<F> {
    pub fn named<R>(name: &'static str, method: fn(&F, &Context) -> R) -> Self
    where
        R: Truthy + 'static,
    {
        Guard::Named { name, method: Arc::new(move |flow: &F, ctx: &Context| method(flow, ctx).is_truthy()) }
    }
}

impl<F> Guard<F> {
    pub fn inline<R, C>(guard: C) -> Self
    where
        R: Truthy,
        C: Fn(&Context) -> R + Send + Sync + 'static,
    {
        Guard::Inline(Arc::new(move |ctx: &Context| guard(ctx).is_truthy()))
    }

    /// Display name; inline guards are reported as `<inline>`.
    pub fn name(&self) -> &str {
        match self {
            Guard::Named { name, .. } => *name,
            Guard::Inline(_) => "<inline>",
        }
    }

    pub fn evaluate(&self, flow: &F, ctx: &Context) -> bool {
        match self {
            Guard::Named { method, .. } => method(flow, ctx),
            Guard::Inline(guard) => guard(ctx),
        }
    }
}

impl<F> Clone for Guard<F> {
    fn clone(&self) -> Self {
        match self {
            Guard::Named { name, method } => Guard::Named { name: *name, method: Arc::clone(method) },
            Guard::Inline(guard) => Guard::Inline(Arc::clone(guard)),
        }
    }
}

impl<F> fmt::Debug for Guard<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Guard").field(&self.name()).finish()
    }
}

/// Options accepted by `branch`, `goto` and `endflow` in a step block.
pub struct BranchOptions<F> {
    condition: Option<(Polarity, Guard<F>)>,
}

impl<F> BranchOptions<F> {
    /// Unconditional.
    pub fn always() -> Self {
        Self { condition: None }
    }

    /// Taken when `guard` is truthy.
    pub fn when(guard: Guard<F>) -> Self {
        Self { condition: Some((Polarity::If, guard)) }
    }

    /// Taken when `guard` is falsy.
    pub fn unless(guard: Guard<F>) -> Self {
        Self { condition: Some((Polarity::Unless, guard)) }
    }
}

impl<F> Default for BranchOptions<F> {
    fn default() -> Self {
        Self::always()
    }
}

/// A transition out of a step.
pub struct Branch<F> {
    target: Target,
    condition: Option<(Polarity, Guard<F>)>,
}

impl<F> Branch<F> {
    pub fn new(target: impl Into<Target>, options: BranchOptions<F>) -> Self {
        Self { target: target.into(), condition: options.condition }
    }

    /// An unconditional branch, used for the implicit fallthrough.
    pub fn always(target: impl Into<Target>) -> Self {
        Self::new(target, BranchOptions::always())
    }

    pub fn target(&self) -> &Target {
        &self.target
    }

    pub fn polarity(&self) -> Option<Polarity> {
        self.condition.as_ref().map(|(polarity, _)| *polarity)
    }

    pub fn guard(&self) -> Option<&Guard<F>> {
        self.condition.as_ref().map(|(_, guard)| guard)
    }

    pub fn is_conditional(&self) -> bool {
        self.condition.is_some()
    }

    /// True when the branch applies to the current context.
    pub fn meets_condition(&self, flow: &F, ctx: &Context) -> bool {
        match &self.condition {
            None => true,
            Some((Polarity::If, guard)) => guard.evaluate(flow, ctx),
            Some((Polarity::Unless, guard)) => !guard.evaluate(flow, ctx),
        }
    }
}

impl<F> Clone for Branch<F> {
    fn clone(&self) -> Self {
        Self { target: self.target.clone(), condition: self.condition.clone() }
    }
}

impl<F> fmt::Debug for Branch<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Branch")
            .field("target", &self.target)
            .field("polarity", &self.polarity())
            .field("guard", &self.guard().map(Guard::name))
            .finish()
    }
}

impl<F> fmt::Display for Branch<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.condition {
            None => write!(f, "-> {}", self.target),
            Some((Polarity::If, guard)) => write!(f, "-> {} if {}", self.target, guard.name()),
            Some((Polarity::Unless, guard)) => write!(f, "-> {} unless {}", self.target, guard.name()),
        }
    }
}
