//! Steps: named nodes of a flow, each bound to a particle.

use std::{fmt, sync::Arc};

use tracing::debug;

use crate::{
    context::Context,
    error::BuildError,
    flow::branch::{Branch, BranchOptions, Target},
    hooks::Hook,
    particle::{WorkUnit, registry::ParticleRegistry},
};

/// Options accepted when declaring a step.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StepOptions {
    particle: Option<String>,
}

impl StepOptions {
    pub fn new() -> Self {
        Self::default()
    }

    /// Overrides the particle name derived from the step name.
    pub fn particle(name: impl Into<String>) -> Self {
        Self { particle: Some(name.into()) }
    }

    pub fn particle_name(&self) -> Option<&str> {
        self.particle.as_deref()
    }
}

/// A named node in a flow, with its particle, branches and step hooks.
pub struct Step<F> {
    name: String,
    particle_name: String,
    particle: Arc<dyn WorkUnit>,
    branches: Vec<Branch<F>>,
    before: Vec<Hook<F>>,
    after: Vec<Hook<F>>,
}

impl<F> Step<F> {
    /// Resolves the step's particle and creates a step with no branches.
    pub(crate) fn resolve(name: &str, options: &StepOptions, registry: &ParticleRegistry) -> Result<Self, BuildError> {
        let requested = options.particle_name().unwrap_or(name);
        let particle = registry.resolve(requested).ok_or_else(|| BuildError::UnresolvedParticle {
            step: name.to_string(),
            particle: requested.to_string(),
        })?;
        Ok(Self {
            name: name.to_string(),
            particle_name: particle.type_name().to_string(),
            particle,
            branches: Vec::new(),
            before: Vec::new(),
            after: Vec::new(),
        })
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Canonical type name of the particle this step invokes.
    pub fn particle_name(&self) -> &str {
        &self.particle_name
    }

    pub fn particle(&self) -> &Arc<dyn WorkUnit> {
        &self.particle
    }

    pub fn branches(&self) -> &[Branch<F>] {
        &self.branches
    }

    pub fn before_callbacks(&self) -> &[Hook<F>] {
        &self.before
    }

    pub fn after_callbacks(&self) -> &[Hook<F>] {
        &self.after
    }

    /// The first branch, in declaration order, whose condition holds.
    pub fn first_applicable_branch(&self, flow: &F, ctx: &Context) -> Option<&Branch<F>> {
        self.branches.iter().find(|branch| branch.meets_condition(flow, ctx))
    }

    /// Where the flow goes after this step; `None` ends the flow.
    pub fn next_target(&self, flow: &F, ctx: &Context) -> Option<&Target> {
        let branch = self.first_applicable_branch(flow, ctx)?;
        debug!(step = %self.name, target = %branch.target(), conditional = branch.is_conditional(), "selected branch");
        Some(branch.target())
    }

    pub(crate) fn push_branch(&mut self, branch: Branch<F>) {
        self.branches.push(branch);
    }
}

impl<F> fmt::Debug for Step<F> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Step")
            .field("name", &self.name)
            .field("particle", &self.particle_name)
            .field("branches", &self.branches)
            .field("before", &self.before)
            .field("after", &self.after)
            .finish()
    }
}

/// Handle passed to a step's declaration block.
///
/// Branches are appended in call order, ahead of the implicit fallthrough the
/// builder adds when the next step is declared.
pub struct StepBuilder<'s, F> {
    step: &'s mut Step<F>,
}

impl<'s, F> StepBuilder<'s, F> {
    pub(crate) fn new(step: &'s mut Step<F>) -> Self {
        Self { step }
    }

    pub fn name(&self) -> &str {
        self.step.name()
    }

    pub fn branch(&mut self, target: impl Into<Target>, options: BranchOptions<F>) -> &mut Self {
        self.step.push_branch(Branch::new(target, options));
        self
    }

    /// Alias of [`StepBuilder::branch`].
    pub fn goto(&mut self, target: impl Into<Target>, options: BranchOptions<F>) -> &mut Self {
        self.branch(target, options)
    }

    /// Branch that terminates the flow.
    pub fn endflow(&mut self, options: BranchOptions<F>) -> &mut Self {
        self.branch(Target::End, options)
    }

    pub fn before(&mut self, hook: Hook<F>) -> &mut Self {
        self.step.before.push(hook);
        self
    }

    pub fn after(&mut self, hook: Hook<F>) -> &mut Self {
        self.step.after.push(hook);
        self
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{
        context::Outcome,
        flow::branch::Guard,
        particle::{Args, Particle},
    };

    #[derive(Default)]
    struct Noop;

    impl Particle for Noop {}

    #[derive(Default)]
    struct Other;

    impl Particle for Other {
        fn call(&self, _ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
            Ok(Outcome::Continue)
        }
    }

    fn registry() -> ParticleRegistry {
        let mut registry = ParticleRegistry::new();
        registry.register::<Noop>().expect("register Noop");
        registry.register::<Other>().expect("register Other");
        registry
    }

    #[test]
    fn particle_name_defaults_to_the_camelised_step_name() {
        let step: Step<()> = Step::resolve("noop", &StepOptions::new(), &registry()).expect("resolves");
        assert_eq!(step.particle_name(), "Noop");
        assert_eq!(step.particle().type_name(), "Noop");
    }

    #[test]
    fn particle_option_overrides_the_step_name() {
        let step: Step<()> = Step::resolve("anything", &StepOptions::particle("other"), &registry()).expect("resolves");
        assert_eq!(step.name(), "anything");
        assert_eq!(step.particle_name(), "Other");
    }

    #[test]
    fn unknown_particles_are_reported_with_their_step() {
        let err = Step::<()>::resolve("mystery", &StepOptions::new(), &registry()).err().expect("unresolved");
        assert_eq!(err, BuildError::UnresolvedParticle { step: "mystery".into(), particle: "mystery".into() });
    }

    #[test]
    fn first_matching_branch_wins() {
        let mut step: Step<()> = Step::resolve("noop", &StepOptions::new(), &registry()).expect("resolves");
        StepBuilder::new(&mut step)
            .goto("skipped", BranchOptions::when(Guard::inline(|ctx| ctx.is_truthy("never"))))
            .goto("chosen", BranchOptions::unless(Guard::inline(|ctx| ctx.is_truthy("never"))))
            .endflow(BranchOptions::always());

        let ctx = Context::new();
        assert_eq!(step.next_target(&(), &ctx), Some(&Target::Step("chosen".into())));
        assert_eq!(step.branches().len(), 3);
    }

    #[test]
    fn no_branches_means_no_next_step() {
        let step: Step<()> = Step::resolve("noop", &StepOptions::new(), &registry()).expect("resolves");
        assert!(step.next_target(&(), &Context::new()).is_none());
    }
}
