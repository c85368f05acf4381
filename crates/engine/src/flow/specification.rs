//! Flow specifications and the builder that declares them.
//!
//! A [`Specification`] is the static description of a flow: its steps in
//! declaration order, each with branches and hooks, the context keys the flow
//! requires, and hooks that wrap every step. It is built once per flow type
//! and shared by every run.
//!
//! # Declaration
//!
//! ```rust
//! use laminar_engine::{
//!     Args, BranchOptions, Context, Guard, Outcome, Particle, ParticleRegistry, Specification, StepOptions,
//! };
//!
//! #[derive(Default)]
//! struct Validate;
//! impl Particle for Validate {}
//!
//! #[derive(Default)]
//! struct Ship;
//! impl Particle for Ship {}
//!
//! let mut registry = ParticleRegistry::new();
//! registry.register::<Validate>()?.register::<Ship>()?;
//!
//! let spec = Specification::<()>::builder(&registry)
//!     .context_must_have(["order_id"])
//!     .step_with("validate", StepOptions::new(), |step| {
//!         step.endflow(BranchOptions::unless(Guard::inline(|ctx: &Context| ctx.is_truthy("valid"))));
//!     })
//!     .step("ship")
//!     .build()?;
//!
//! assert_eq!(spec.first_step(), Some("validate"));
//! assert_eq!(spec.step("validate").map(|s| s.branches().len()), Some(2));
//! # Ok::<(), laminar_engine::BuildError>(())
//! ```
//!
//! Declaring a step appends an unconditional branch to the previously
//! declared step pointing at the new one, so steps fall through in order
//! unless an earlier branch matches first.

use std::fmt;

use indexmap::IndexMap;
use tracing::debug;

use crate::{
    context::Context,
    error::{BuildError, MissingContext},
    flow::{
        branch::{Branch, Target},
        step::{Step, StepBuilder, StepOptions},
    },
    hooks::Hook,
    particle::registry::ParticleRegistry,
};

/// Static description of a flow.
pub struct Specification<F> {
    steps: IndexMap<String, Step<F>>,
    first_step: Option<String>,
    required_keys: Vec<String>,
    before_each: Vec<Hook<F>>,
    after_each: Vec<Hook<F>>,
}

impl<F> Specification<F> {
    pub fn builder(registry: &ParticleRegistry) -> SpecificationBuilder<'_, F> {
        SpecificationBuilder {
            registry,
            spec: Specification {
                steps: IndexMap::new(),
                first_step: None,
                required_keys: Vec::new(),
                before_each: Vec::new(),
                after_each: Vec::new(),
            },
            previous: None,
            error: None,
        }
    }

    /// Steps in declaration order.
    pub fn steps(&self) -> impl Iterator<Item = &Step<F>> {
        self.steps.values()
    }

    pub fn step(&self, name: &str) -> Option<&Step<F>> {
        self.steps.get(name)
    }

    pub fn step_count(&self) -> usize {
        self.steps.len()
    }

    pub fn first_step(&self) -> Option<&str> {
        self.first_step.as_deref()
    }

    pub fn required_keys(&self) -> &[String] {
        &self.required_keys
    }

    pub fn before_each_callbacks(&self) -> &[Hook<F>] {
        &self.before_each
    }

    pub fn after_each_callbacks(&self) -> &[Hook<F>] {
        &self.after_each
    }

    /// Required keys absent from `ctx`, in declaration order.
    pub fn missing_keys(&self, ctx: &Context) -> Vec<String> {
        self.required_keys.iter().filter(|key| !ctx.contains_key(key)).cloned().collect()
    }

    /// Checks that every required key is present.
    pub fn validate_context(&self, owner: &str, ctx: &Context) -> Result<(), MissingContext> {
        let missing = self.missing_keys(ctx);
        if missing.is_empty() {
            Ok(())
        } else {
            Err(MissingContext { owner: owner.to_string(), keys: missing })
        }
    }
}

impl<F> fmt::Debug for Specification<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Specification")
            .field("steps", &self.steps.values().collect::<Vec<_>>())
            .field("first_step", &self.first_step)
            .field("required_keys", &self.required_keys)
            .field("before_each", &self.before_each)
            .field("after_each", &self.after_each)
            .finish()
    }
}

/// Chained declaration of a [`Specification`].
///
/// The first declaration error is kept and returned from
/// [`SpecificationBuilder::build`]; later declarations are ignored once one
/// has failed.
pub struct SpecificationBuilder<'r, F> {
    registry: &'r ParticleRegistry,
    spec: Specification<F>,
    previous: Option<String>,
    error: Option<BuildError>,
}

impl<'r, F> SpecificationBuilder<'r, F> {
    /// Declares a step whose particle is derived from its name.
    pub fn step(self, name: &str) -> Self {
        self.step_with(name, StepOptions::new(), |_| {})
    }

    /// Declares a step with options and a block that adds branches and hooks.
    pub fn step_with<B>(mut self, name: &str, options: StepOptions, block: B) -> Self
    where
        B: FnOnce(&mut StepBuilder<'_, F>),
    {
        if self.error.is_none()
            && let Err(err) = self.add_step(name, &options, block)
        {
            self.error = Some(err);
        }
        self
    }

    fn add_step<B>(&mut self, name: &str, options: &StepOptions, block: B) -> Result<(), BuildError>
    where
        B: FnOnce(&mut StepBuilder<'_, F>),
    {
        validate_step_name(name)?;
        if self.spec.steps.contains_key(name) {
            return Err(BuildError::DuplicateStep { name: name.to_string() });
        }

        let mut step = Step::resolve(name, options, self.registry)?;
        block(&mut StepBuilder::new(&mut step));

        if let Some(previous) = self.previous.as_deref()
            && let Some(previous) = self.spec.steps.get_mut(previous)
        {
            previous.push_branch(Branch::always(name));
        }
        if self.spec.first_step.is_none() {
            self.spec.first_step = Some(name.to_string());
        }

        debug!(step = %name, particle = %step.particle_name(), branches = step.branches().len(), "declared step");
        self.spec.steps.insert(name.to_string(), step);
        self.previous = Some(name.to_string());
        Ok(())
    }

    /// Adds keys every run must provide. Repeated calls accumulate.
    pub fn context_must_have<I, K>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = K>,
        K: Into<String>,
    {
        for key in keys {
            let key = key.into();
            if !self.spec.required_keys.contains(&key) {
                self.spec.required_keys.push(key);
            }
        }
        self
    }

    /// Adds a hook that runs before every step.
    pub fn before_each(mut self, hook: Hook<F>) -> Self {
        self.spec.before_each.push(hook);
        self
    }

    /// Adds a hook that runs after every step.
    pub fn after_each(mut self, hook: Hook<F>) -> Self {
        self.spec.after_each.push(hook);
        self
    }

    /// Finishes the declaration, checking that every branch target exists.
    pub fn build(self) -> Result<Specification<F>, BuildError> {
        if let Some(err) = self.error {
            return Err(err);
        }
        for step in self.spec.steps.values() {
            for branch in step.branches() {
                if let Target::Step(target) = branch.target()
                    && !self.spec.steps.contains_key(target)
                {
                    return Err(BuildError::DanglingTarget { step: step.name().to_string(), target: target.clone() });
                }
            }
        }
        Ok(self.spec)
    }
}

fn validate_step_name(name: &str) -> Result<(), BuildError> {
    if name.trim().is_empty() {
        return Err(BuildError::InvalidName { name: name.to_string(), reason: "step names must not be blank" });
    }
    if name == "endflow" {
        return Err(BuildError::InvalidName { name: name.to_string(), reason: "'endflow' is reserved for terminating branches" });
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        flow::branch::{BranchOptions, Guard},
        particle::Particle,
    };

    #[derive(Default)]
    struct Alpha;
    impl Particle for Alpha {}

    #[derive(Default)]
    struct Beta;
    impl Particle for Beta {}

    fn registry() -> ParticleRegistry {
        let mut registry = ParticleRegistry::new();
        registry.register::<Alpha>().expect("register Alpha");
        registry.register::<Beta>().expect("register Beta");
        registry
    }

    #[test]
    fn fallthrough_is_appended_after_declared_branches() {
        let registry = registry();
        let spec = Specification::<()>::builder(&registry)
            .step_with("alpha", StepOptions::new(), |step| {
                step.goto("gamma", BranchOptions::when(Guard::inline(|ctx| ctx.is_truthy("jump"))));
            })
            .step("beta")
            .step_with("gamma", StepOptions::particle("beta"), |_| {})
            .build()
            .expect("valid specification");

        let alpha = spec.step("alpha").expect("alpha declared");
        let targets: Vec<String> = alpha.branches().iter().map(|b| b.target().to_string()).collect();
        assert_eq!(targets, vec!["gamma", "beta"]);
        assert_eq!(spec.first_step(), Some("alpha"));
        assert_eq!(spec.steps().map(Step::name).collect::<Vec<_>>(), vec!["alpha", "beta", "gamma"]);
        assert!(spec.step("gamma").expect("gamma declared").branches().is_empty());
    }

    #[test]
    fn duplicate_steps_are_rejected() {
        let registry = registry();
        let err = Specification::<()>::builder(&registry).step("alpha").step("alpha").build().expect_err("duplicate");
        assert_eq!(err, BuildError::DuplicateStep { name: "alpha".into() });
    }

    #[test]
    fn dangling_targets_are_rejected() {
        let registry = registry();
        let err = Specification::<()>::builder(&registry)
            .step_with("alpha", StepOptions::new(), |step| {
                step.goto("nowhere", BranchOptions::always());
            })
            .build()
            .expect_err("dangling");
        assert_eq!(err, BuildError::DanglingTarget { step: "alpha".into(), target: "nowhere".into() });
    }

    #[test]
    fn first_error_wins() {
        let registry = registry();
        let err = Specification::<()>::builder(&registry).step("unknown").step("alpha").step("alpha").build().expect_err("unresolved");
        assert!(matches!(err, BuildError::UnresolvedParticle { .. }));
    }

    #[test]
    fn reserved_and_blank_names_are_rejected() {
        let registry = registry();
        let err = Specification::<()>::builder(&registry).step("endflow").build().expect_err("reserved");
        assert!(matches!(err, BuildError::InvalidName { .. }));
        let err = Specification::<()>::builder(&registry).step("  ").build().expect_err("blank");
        assert!(matches!(err, BuildError::InvalidName { .. }));
    }

    #[test]
    fn required_keys_accumulate_without_duplicates() {
        let registry = registry();
        let spec = Specification::<()>::builder(&registry)
            .context_must_have(["param1", "param2"])
            .context_must_have(vec!["param2".to_string(), "param3".to_string()])
            .build()
            .expect("empty specification is valid");
        assert_eq!(spec.required_keys(), ["param1", "param2", "param3"]);

        let ctx = Context::build([("param1", 1)]);
        let err = spec.validate_context("Needy", &ctx).expect_err("two keys missing");
        assert_eq!(err.keys, vec!["param2", "param3"]);
        assert_eq!(spec.first_step(), None);
    }
}
