//! Particles: single units of work that read and update a [`Context`].
//!
//! # Declaring a particle
//!
//! A particle is a type implementing [`Particle`]. Its [`Particle::signature`]
//! declares which context keys the work function receives, and
//! [`Particle::hooks`] declares before/after callbacks. Both are read once,
//! when the particle type is wrapped in a [`ParticleType`], and are shared by
//! every invocation.
//!
//! ```rust
//! use laminar_engine::{Args, Context, Outcome, Param, Particle, ParticleType, Signature, WorkUnit};
//!
//! #[derive(Default)]
//! struct Greet;
//!
//! impl Particle for Greet {
//!     fn signature() -> Signature {
//!         Signature::params([Param::required("name"), Param::optional("greeting")])
//!     }
//!
//!     fn call(&self, ctx: &mut Context, args: Args) -> anyhow::Result<Outcome> {
//!         let name: String = args.get_as("name")?;
//!         let greeting = args.get_as::<String>("greeting").unwrap_or_else(|_| "Hello".into());
//!         ctx.insert("message", format!("{greeting}, {name}!"));
//!         Ok(Outcome::Continue)
//!     }
//! }
//!
//! let greet = ParticleType::<Greet>::with_default("Greet");
//! let ctx = greet.invoke(Context::build([("name", "Ada")]))?;
//! assert_eq!(ctx.get_str("message"), Some("Hello, Ada!"));
//! # Ok::<(), laminar_engine::FlowError>(())
//! ```
//!
//! # Invocation protocol
//!
//! [`WorkUnit::run`] drives one invocation against a context:
//!
//! 1. Before hooks run in order, each skipped if the context is halted.
//! 2. If the context is now halted, the invocation ends without calling the
//!    work function.
//! 3. Arguments are sliced from the context according to the signature;
//!    absent required keys are reported together as [`MissingContext`].
//! 4. The work function runs.
//! 5. After hooks run under the same rules as before hooks.
//!
//! A stop [`Outcome`] from a hook or the work function ends the invocation at
//! that point. [`WorkUnit::invoke`] swallows it and returns the context;
//! [`WorkUnit::invoke_signaling`] turns it into [`FlowError::Stopped`].

pub mod registry;

use std::fmt;

use indexmap::IndexMap;
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::{debug, trace};

use crate::{
    context::{self, Context, Outcome},
    error::{ContextError, FlowError, MissingContext, StopSignal},
    hooks::{Hooks, run_hooks},
};

/// A unit of work that reads and writes a shared context.
pub trait Particle: Sized + Send + Sync + 'static {
    /// Context keys the work function receives. Defaults to none.
    fn signature() -> Signature {
        Signature::None
    }

    /// Before/after callbacks. Defaults to none.
    fn hooks() -> Hooks<Self> {
        Hooks::new()
    }

    /// The work function. The default does nothing.
    fn call(&self, _ctx: &mut Context, _args: Args) -> anyhow::Result<Outcome> {
        Ok(Outcome::Continue)
    }
}

/// Declared parameters of a work function.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum Signature {
    /// The work function takes no arguments.
    #[default]
    None,
    /// The work function receives every context entry.
    Rest,
    /// The work function receives the listed keys that are present.
    Named(Vec<Param>),
}

/// A single named parameter.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Param {
    name: String,
    required: bool,
}

impl Param {
    pub fn required(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: true }
    }

    pub fn optional(name: impl Into<String>) -> Self {
        Self { name: name.into(), required: false }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn is_required(&self) -> bool {
        self.required
    }
}

impl Signature {
    pub fn rest() -> Self {
        Signature::Rest
    }

    pub fn params(params: impl IntoIterator<Item = Param>) -> Self {
        Signature::Named(params.into_iter().collect())
    }

    /// Names of required parameters, in declaration order.
    pub fn required_keys(&self) -> Vec<&str> {
        match self {
            Signature::Named(params) => params.iter().filter(|p| p.required).map(Param::name).collect(),
            Signature::None | Signature::Rest => Vec::new(),
        }
    }

    /// Selects the arguments for `owner` out of `ctx`.
    pub fn slice(&self, owner: &str, ctx: &Context) -> Result<Args, MissingContext> {
        let params = match self {
            Signature::None => return Ok(Args::default()),
            Signature::Rest => return Ok(Args(ctx.values().clone())),
            Signature::Named(params) => params,
        };

        let missing: Vec<String> = params
            .iter()
            .filter(|param| param.required && !ctx.contains_key(&param.name))
            .map(|param| param.name.clone())
            .collect();
        if !missing.is_empty() {
            return Err(MissingContext { owner: owner.to_string(), keys: missing });
        }

        let values = params
            .iter()
            .filter_map(|param| ctx.get(&param.name).map(|value| (param.name.clone(), value.clone())))
            .collect();
        Ok(Args(values))
    }
}

/// Arguments handed to a work function.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Args(IndexMap<String, Value>);

impl Args {
    pub fn get(&self, key: &str) -> Option<&Value> {
        self.0.get(key)
    }

    /// Deserializes the argument under `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContextError> {
        context::read_as(&self.0, key)
    }

    pub fn contains(&self, key: &str) -> bool {
        self.0.contains_key(key)
    }

    pub fn len(&self) -> usize {
        self.0.len()
    }

    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &Value)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v))
    }

    pub fn into_inner(self) -> IndexMap<String, Value> {
        self.0
    }
}

/// Type-erased entry point shared by particles and flows.
///
/// Steps hold an `Arc<dyn WorkUnit>`, which lets a flow be registered and used
/// as a step of another flow.
pub trait WorkUnit: Send + Sync {
    /// Canonical type name, used in logs and error messages.
    fn type_name(&self) -> &str;

    /// Required context keys checked before the work starts.
    fn required_keys(&self) -> Vec<String> {
        Vec::new()
    }

    /// Runs one invocation in place and reports how it ended.
    fn run(&self, ctx: &mut Context) -> Result<Outcome, FlowError>;

    /// Runs against `context` and returns it, swallowing halt/fail signals.
    fn invoke(&self, context: Context) -> Result<Context, FlowError> {
        let mut context = context;
        let outcome = self.run(&mut context)?;
        if outcome.is_stop() {
            debug!(unit = %self.type_name(), ?outcome, "invocation stopped");
        }
        Ok(context)
    }

    /// Runs against `context`; a halt/fail signal surfaces as [`FlowError::Stopped`].
    fn invoke_signaling(&self, context: Context) -> Result<Context, FlowError> {
        let mut context = context;
        match self.run(&mut context)? {
            Outcome::Continue => Ok(context),
            Outcome::Halt | Outcome::Fail => Err(StopSignal::new(context).into()),
        }
    }
}

type Factory<P> = Box<dyn Fn() -> P + Send + Sync>;

/// A particle type ready to be invoked: a factory plus its declared
/// signature and hooks.
pub struct ParticleType<P: Particle> {
    type_name: String,
    factory: Factory<P>,
    signature: Signature,
    hooks: Hooks<P>,
}

impl<P: Particle> ParticleType<P> {
    /// Wraps a factory producing a fresh particle per invocation.
    pub fn new<F>(type_name: impl Into<String>, factory: F) -> Self
    where
        F: Fn() -> P + Send + Sync + 'static,
    {
        Self {
            type_name: type_name.into(),
            factory: Box::new(factory),
            signature: P::signature(),
            hooks: P::hooks(),
        }
    }

    pub fn with_default(type_name: impl Into<String>) -> Self
    where
        P: Default,
    {
        Self::new(type_name, P::default)
    }

    pub fn signature(&self) -> &Signature {
        &self.signature
    }

    pub fn hooks(&self) -> &Hooks<P> {
        &self.hooks
    }
}

impl<P: Particle> fmt::Debug for ParticleType<P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleType")
            .field("type_name", &self.type_name)
            .field("signature", &self.signature)
            .field("hooks", &self.hooks)
            .finish()
    }
}

impl<P: Particle> WorkUnit for ParticleType<P> {
    fn type_name(&self) -> &str {
        &self.type_name
    }

    fn required_keys(&self) -> Vec<String> {
        self.signature.required_keys().into_iter().map(str::to_string).collect()
    }

    fn run(&self, ctx: &mut Context) -> Result<Outcome, FlowError> {
        let instance = (self.factory)();

        let outcome = run_hooks(self.hooks.before_hooks(), &instance, ctx)?;
        if outcome.is_stop() {
            return Ok(outcome);
        }
        if ctx.is_halted() {
            debug!(particle = %self.type_name, "context halted before work function; skipping");
            return Ok(Outcome::Continue);
        }

        let args = self.signature.slice(&self.type_name, ctx)?;
        trace!(particle = %self.type_name, args = args.len(), "calling work function");
        let failed_before = ctx.is_failed();
        let outcome = instance.call(ctx, args)?;
        let outcome = ctx.absorb(outcome, failed_before);
        if outcome.is_stop() {
            return Ok(outcome);
        }

        run_hooks(self.hooks.after_hooks(), &instance, ctx)
    }
}
