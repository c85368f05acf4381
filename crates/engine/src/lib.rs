//! # Laminar Engine
//!
//! Laminar composes small units of work, called *particles*, into *flows*:
//! ordered, optionally branching sequences of steps that share one
//! [`Context`].
//!
//! ## Key Features
//!
//! - **Shared context**: an insertion-ordered JSON map with `halted`/`failed`
//!   flags that every step reads and updates
//! - **Declared signatures**: particles receive only the context keys they ask
//!   for, and missing required keys are reported together
//! - **Hooks**: before/after callbacks on particles, steps, every step of a
//!   flow, and whole flows
//! - **Branching**: guarded `goto`/`endflow` transitions evaluated in
//!   declaration order, with an implicit fallthrough to the next step
//! - **Composition**: flows are work units themselves and can be used as steps
//!   of other flows
//!
//! ## Usage
//!
//! ```rust
//! use laminar_engine::{
//!     Args, BranchOptions, Context, Flow, Guard, Outcome, Param, Particle, ParticleRegistry, Signature, Specification,
//!     StepOptions,
//! };
//!
//! #[derive(Default)]
//! struct CheckAge;
//!
//! impl Particle for CheckAge {
//!     fn signature() -> Signature {
//!         Signature::params([Param::required("age")])
//!     }
//!
//!     fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
//!         let age: u32 = args.get_as("age")?;
//!         ctx.insert("adult", age >= 18);
//!         Ok(Outcome::Continue)
//!     }
//! }
//!
//! #[derive(Default)]
//! struct ServeDrink;
//!
//! impl Particle for ServeDrink {
//!     fn call(&self, ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
//!         ctx.insert("served", true);
//!         Ok(Outcome::Continue)
//!     }
//! }
//!
//! let mut registry = ParticleRegistry::new();
//! registry.register::<CheckAge>()?.register::<ServeDrink>()?;
//!
//! let spec = Specification::<()>::builder(&registry)
//!     .step_with("check_age", StepOptions::new(), |step| {
//!         step.endflow(BranchOptions::unless(Guard::inline(|ctx: &Context| ctx.is_truthy("adult"))));
//!     })
//!     .step("serve_drink")
//!     .build()?;
//! let bar = Flow::new("Bar", (), spec);
//!
//! let ctx = bar.call([("age", 21)])?;
//! assert_eq!(ctx.get("served"), Some(&serde_json::json!(true)));
//!
//! let ctx = bar.call([("age", 16)])?;
//! assert!(!ctx.contains_key("served"));
//! # Ok::<(), Box<dyn std::error::Error>>(())
//! ```
//!
//! ## Architecture
//!
//! - **`context`**: the shared [`Context`] and the [`Outcome`] signal
//! - **`particle`**: the [`Particle`] trait, signatures, the type-erased
//!   [`WorkUnit`] and the [`ParticleRegistry`]
//! - **`hooks`**: before/after callbacks
//! - **`flow`**: branches, steps, [`Specification`]s and the [`Flow`] driver
//! - **`error`**: [`FlowError`] and its parts

pub mod context;
pub mod error;
pub mod flow;
pub mod hooks;
pub mod particle;

// Re-export commonly used types for convenience
pub use context::{Context, IntoEntries, Outcome, Truthy};
pub use error::{BuildError, ContextError, FlowError, FlowResult, MissingContext, StopSignal};
pub use flow::{
    Flow,
    branch::{Branch, BranchOptions, Guard, Polarity, Target},
    specification::{Specification, SpecificationBuilder},
    step::{Step, StepBuilder, StepOptions},
};
pub use hooks::{Hook, HookResult, Hooks};
pub use particle::{
    Args, Param, Particle, ParticleType, Signature, WorkUnit,
    registry::{ParticleRegistry, canonical_type_name},
};
