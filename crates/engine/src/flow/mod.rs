//! Flows: ordered, branching sequences of particles over one context.
//!
//! A [`Flow`] pairs a flow instance `F` (the value named guards and hooks are
//! called on) with a shared [`Specification`]. Running a flow:
//!
//! 1. builds the context from the input;
//! 2. runs the flow's own before hooks;
//! 3. checks the specification's required keys;
//! 4. walks the steps from the first declared one. For each step it runs the
//!    `before_each` hooks, the step's before hooks, the particle, the step's
//!    after hooks and the `after_each` hooks, then stops if the context is
//!    halted or follows the first branch whose condition holds;
//! 5. runs the flow's own after hooks.
//!
//! A flow with no specification returns its context unchanged apart from its
//! own hooks. Flows implement [`WorkUnit`], so one can be registered and used
//! as a step of another flow.

pub mod branch;
pub mod specification;
pub mod step;

use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    context::{Context, Outcome},
    error::{BuildError, FlowError},
    flow::{branch::Target, specification::Specification, step::Step},
    hooks::{Hooks, run_hooks},
    particle::WorkUnit,
};

/// A runnable flow.
pub struct Flow<F> {
    name: String,
    instance: F,
    specification: Option<Arc<Specification<F>>>,
    hooks: Hooks<F>,
}

impl<F: Send + Sync + 'static> Flow<F> {
    pub fn new(name: impl Into<String>, instance: F, specification: impl Into<Arc<Specification<F>>>) -> Self {
        Self {
            name: name.into(),
            instance,
            specification: Some(specification.into()),
            hooks: Hooks::new(),
        }
    }

    /// A flow with no steps; running it only runs its own hooks.
    pub fn without_specification(name: impl Into<String>, instance: F) -> Self {
        Self { name: name.into(), instance, specification: None, hooks: Hooks::new() }
    }

    /// Hooks that wrap the whole run, as particle hooks wrap a work function.
    pub fn with_hooks(mut self, hooks: Hooks<F>) -> Self {
        self.hooks = hooks;
        self
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn instance(&self) -> &F {
        &self.instance
    }

    pub fn specification(&self) -> Option<&Specification<F>> {
        self.specification.as_deref()
    }

    pub fn hooks(&self) -> &Hooks<F> {
        &self.hooks
    }

    /// Runs the flow and returns the final context.
    ///
    /// Halting or failing is reported through the context flags only.
    pub fn call(&self, input: impl Into<Context>) -> Result<Context, FlowError> {
        self.invoke(Context::build(input))
    }

    /// Runs the flow; a halt/fail signal surfaces as [`FlowError::Stopped`].
    pub fn call_signaling(&self, input: impl Into<Context>) -> Result<Context, FlowError> {
        self.invoke_signaling(Context::build(input))
    }

    fn walk(&self, spec: &Specification<F>, ctx: &mut Context) -> Result<Outcome, FlowError> {
        spec.validate_context(&self.name, ctx)?;

        let Some(mut current) = spec.first_step().and_then(|name| spec.step(name)) else {
            debug!(flow = %self.name, "flow has no steps");
            return Ok(Outcome::Continue);
        };

        loop {
            debug!(flow = %self.name, step = %current.name(), particle = %current.particle_name(), "running step");
            let outcome = self.visit(spec, current, ctx)?;
            if outcome.is_stop() {
                debug!(flow = %self.name, step = %current.name(), ?outcome, "step signalled stop");
                return Ok(outcome);
            }
            if ctx.is_halted() {
                debug!(flow = %self.name, step = %current.name(), failed = ctx.is_failed(), "context halted; ending flow");
                return Ok(Outcome::Continue);
            }

            current = match current.next_target(&self.instance, ctx) {
                None | Some(Target::End) => {
                    debug!(flow = %self.name, step = %current.name(), "flow complete");
                    return Ok(Outcome::Continue);
                }
                Some(Target::Step(next)) => spec.step(next).ok_or_else(|| BuildError::DanglingTarget {
                    step: current.name().to_string(),
                    target: next.clone(),
                })?,
            };
        }
    }

    /// Runs one step with its surrounding hooks.
    fn visit(&self, spec: &Specification<F>, step: &Step<F>, ctx: &mut Context) -> Result<Outcome, FlowError> {
        let outcome = run_hooks(spec.before_each_callbacks(), &self.instance, ctx)?;
        if outcome.is_stop() {
            return Ok(outcome);
        }
        let outcome = run_hooks(step.before_callbacks(), &self.instance, ctx)?;
        if outcome.is_stop() {
            return Ok(outcome);
        }
        if !ctx.is_halted() {
            let failed_before = ctx.is_failed();
            let outcome = step.particle().run(ctx)?;
            let outcome = ctx.absorb(outcome, failed_before);
            if outcome.is_stop() {
                return Ok(outcome);
            }
        }
        let outcome = run_hooks(step.after_callbacks(), &self.instance, ctx)?;
        if outcome.is_stop() {
            return Ok(outcome);
        }
        run_hooks(spec.after_each_callbacks(), &self.instance, ctx)
    }
}

impl<F: Send + Sync + 'static> WorkUnit for Flow<F> {
    fn type_name(&self) -> &str {
        &self.name
    }

    fn required_keys(&self) -> Vec<String> {
        self.specification.as_ref().map(|spec| spec.required_keys().to_vec()).unwrap_or_default()
    }

    fn run(&self, ctx: &mut Context) -> Result<Outcome, FlowError> {
        let outcome = run_hooks(self.hooks.before_hooks(), &self.instance, ctx)?;
        if outcome.is_stop() {
            return Ok(outcome);
        }
        if ctx.is_halted() {
            return Ok(Outcome::Continue);
        }

        if let Some(spec) = &self.specification {
            let outcome = self.walk(spec, ctx)?;
            if outcome.is_stop() {
                return Ok(outcome);
            }
        }

        run_hooks(self.hooks.after_hooks(), &self.instance, ctx)
    }
}

impl<F: fmt::Debug> fmt::Debug for Flow<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Flow")
            .field("name", &self.name)
            .field("instance", &self.instance)
            .field("specification", &self.specification)
            .field("hooks", &self.hooks)
            .finish()
    }
}
