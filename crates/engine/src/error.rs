//! Error types surfaced by the flow engine.
//!
//! Errors fall into three groups:
//!
//! - [`BuildError`]: configuration defects found while declaring a flow or
//!   registering particles (duplicate steps, dangling branch targets, names
//!   that resolve to nothing).
//! - [`MissingContext`]: required context keys that were absent when a flow or
//!   particle started.
//! - [`StopSignal`]: the halt/fail signal raised by the signaling entry points
//!   ([`crate::Flow::call_signaling`], [`crate::WorkUnit::invoke_signaling`]).
//!
//! [`FlowError`] unifies them together with arbitrary errors returned by work
//! functions and hooks.

use std::fmt;

use thiserror::Error;

use crate::context::Context;

/// Convenience alias for results produced by the engine.
pub type FlowResult<T> = Result<T, FlowError>;

/// Any failure that can escape a flow or particle invocation.
#[derive(Debug, Error)]
pub enum FlowError {
    /// The flow specification or particle registry is misconfigured.
    #[error(transparent)]
    Build(#[from] BuildError),
    /// Required context keys were absent.
    #[error(transparent)]
    MissingContext(#[from] MissingContext),
    /// A halt or failure signal raised by a signaling entry point.
    #[error(transparent)]
    Stopped(#[from] StopSignal),
    /// An error returned by a work function or hook.
    #[error(transparent)]
    Particle(#[from] anyhow::Error),
}

impl FlowError {
    /// Returns the stop signal when this error is one.
    pub fn as_stop_signal(&self) -> Option<&StopSignal> {
        match self {
            FlowError::Stopped(signal) => Some(signal),
            _ => None,
        }
    }
}

/// Configuration-time defects.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum BuildError {
    #[error("step '{name}' defined twice")]
    DuplicateStep { name: String },
    #[error("step '{step}' branches to undefined step '{target}'")]
    DanglingTarget { step: String, target: String },
    #[error("step '{step}' refers to particle '{particle}', which is not registered")]
    UnresolvedParticle { step: String, particle: String },
    #[error("invalid name {name:?}: {reason}")]
    InvalidName { name: String, reason: &'static str },
    #[error("particle '{particle}' registered twice")]
    DuplicateParticle { particle: String },
}

/// Required context keys that were absent when `owner` started.
///
/// `keys` lists every missing key in declaration order, so a single error
/// reports all of them.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("{owner} is missing required context: {}", .keys.join(", "))]
pub struct MissingContext {
    pub owner: String,
    pub keys: Vec<String>,
}

/// Errors raised while reading typed values out of a context or argument map.
#[derive(Debug, Error)]
pub enum ContextError {
    #[error("context key '{key}' is not present")]
    Missing { key: String },
    #[error("context key '{key}' has an unexpected shape: {source}")]
    Type {
        key: String,
        #[source]
        source: serde_json::Error,
    },
    #[error("a context can only be built from a JSON object, got {kind}")]
    NotAnObject { kind: &'static str },
}

/// The halt or failure signal carried out of a signaling invocation.
///
/// The context travels with the signal so callers can inspect whatever the
/// particle or hook merged in before stopping.
#[derive(Debug)]
pub struct StopSignal {
    context: Box<Context>,
}

impl StopSignal {
    pub(crate) fn new(context: Context) -> Self {
        Self { context: Box::new(context) }
    }

    /// True when the context was failed rather than merely halted.
    pub fn is_failed(&self) -> bool {
        self.context.is_failed()
    }

    pub fn context(&self) -> &Context {
        &self.context
    }

    pub fn into_context(self) -> Context {
        *self.context
    }
}

impl fmt::Display for StopSignal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if self.is_failed() {
            write!(f, "execution failed")
        } else {
            write!(f, "execution halted")
        }
    }
}

impl std::error::Error for StopSignal {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn missing_context_lists_every_key() {
        let err = MissingContext {
            owner: "WithRequired".into(),
            keys: vec!["param2".into(), "param3".into()],
        };
        assert_eq!(err.to_string(), "WithRequired is missing required context: param2, param3");
    }

    #[test]
    fn stop_signal_reports_failure_from_its_context() {
        let mut context = Context::new();
        let _ = context.fail([("error", "boom")]);
        let signal = StopSignal::new(context);
        assert!(signal.is_failed());
        assert_eq!(signal.to_string(), "execution failed");
        assert_eq!(signal.into_context().get_str("error"), Some("boom"));
    }

    #[test]
    fn flow_error_wraps_particle_errors_transparently() {
        let err: FlowError = anyhow::anyhow!("database unavailable").into();
        assert_eq!(err.to_string(), "database unavailable");
        assert!(err.as_stop_signal().is_none());
    }
}
