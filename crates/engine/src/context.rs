//! The execution context shared by every step of a flow.
//!
//! A [`Context`] is an insertion-ordered map of string keys to JSON values
//! plus two status flags:
//!
//! - `halted`: no further steps or hooks should run.
//! - `failed`: the run ended unsuccessfully. Failing always halts.
//!
//! Both flags only ever go from `false` to `true`.
//!
//! Stopping comes in two flavours. [`Context::halt`] is a *soft* halt: it sets
//! the flag and lets the current work function run to completion.
//! [`Context::halt_signaling`] and [`Context::fail`] return an [`Outcome`]
//! which work functions and hooks hand back to the engine so the remainder of
//! the current invocation is skipped:
//!
//! ```rust
//! use laminar_engine::{Context, Outcome};
//!
//! fn check_stock(ctx: &mut Context) -> Outcome {
//!     if ctx.get_as::<u32>("quantity").unwrap_or(0) == 0 {
//!         return ctx.fail([("error", "nothing to reserve")]);
//!     }
//!     Outcome::Continue
//! }
//!
//! let mut ctx = Context::build([("quantity", 0)]);
//! assert_eq!(check_stock(&mut ctx), Outcome::Fail);
//! assert!(ctx.is_halted() && ctx.is_failed());
//! ```

use indexmap::IndexMap;
use serde::{Deserialize, Serialize, de::DeserializeOwned};
use serde_json::{Map, Value};

use crate::error::ContextError;

/// Signal returned by work functions and hooks.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Outcome {
    /// Keep going.
    #[default]
    Continue,
    /// Stop the current invocation; the context is halted.
    Halt,
    /// Stop the current invocation; the context is failed and halted.
    Fail,
}

impl Outcome {
    /// True for [`Outcome::Halt`] and [`Outcome::Fail`].
    pub fn is_stop(self) -> bool {
        !matches!(self, Outcome::Continue)
    }
}

/// Insertion-ordered key/value store with halt and failure flags.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(from = "ContextRepr")]
pub struct Context {
    values: IndexMap<String, Value>,
    halted: bool,
    failed: bool,
}

/// Wire shape of a context; normalises the flags on the way in.
#[derive(Deserialize)]
struct ContextRepr {
    #[serde(default)]
    values: IndexMap<String, Value>,
    #[serde(default)]
    halted: bool,
    #[serde(default)]
    failed: bool,
}

impl From<ContextRepr> for Context {
    fn from(repr: ContextRepr) -> Self {
        Self {
            values: repr.values,
            halted: repr.halted || repr.failed,
            failed: repr.failed,
        }
    }
}

impl Context {
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a context from any supported input.
    ///
    /// An existing [`Context`] passes through unchanged, the very same value
    /// with its flags intact. Maps, arrays and vectors of pairs produce a fresh
    /// context with both flags cleared.
    pub fn build(input: impl Into<Context>) -> Self {
        input.into()
    }

    /// True while the context has not been failed.
    pub fn is_success(&self) -> bool {
        !self.failed
    }

    pub fn is_halted(&self) -> bool {
        self.halted
    }

    pub fn is_failed(&self) -> bool {
        self.failed
    }

    /// Merges `partial` and sets `halted` without interrupting the caller.
    pub fn halt(&mut self, partial: impl IntoEntries) {
        self.merge(partial);
        self.halted = true;
    }

    /// Merges `partial`, sets `halted`, and returns the halt signal.
    #[must_use = "return the outcome so the engine stops the current invocation"]
    pub fn halt_signaling(&mut self, partial: impl IntoEntries) -> Outcome {
        self.halt(partial);
        Outcome::Halt
    }

    /// Merges `partial`, sets `failed` and `halted`, and returns the failure signal.
    #[must_use = "return the outcome so the engine stops the current invocation"]
    pub fn fail(&mut self, partial: impl IntoEntries) -> Outcome {
        self.failed = true;
        self.halt(partial);
        Outcome::Fail
    }

    /// Applies a signal returned from user code to the flags.
    ///
    /// Keeps the flags consistent when a work function hands back
    /// [`Outcome::Halt`] or [`Outcome::Fail`] directly instead of going through
    /// [`Context::halt_signaling`] or [`Context::fail`]. A context that became
    /// failed during the call always yields [`Outcome::Fail`], whatever the
    /// call returned; `failed_before` is the flag as it was before the call.
    pub(crate) fn absorb(&mut self, outcome: Outcome, failed_before: bool) -> Outcome {
        match outcome {
            Outcome::Continue | Outcome::Halt if self.failed && !failed_before => Outcome::Fail,
            Outcome::Continue => Outcome::Continue,
            Outcome::Halt => {
                self.halted = true;
                Outcome::Halt
            }
            Outcome::Fail => {
                self.failed = true;
                self.halted = true;
                Outcome::Fail
            }
        }
    }

    pub fn get(&self, key: &str) -> Option<&Value> {
        self.values.get(key)
    }

    pub fn get_str(&self, key: &str) -> Option<&str> {
        self.values.get(key).and_then(Value::as_str)
    }

    /// Deserializes the value under `key` into `T`.
    pub fn get_as<T: DeserializeOwned>(&self, key: &str) -> Result<T, ContextError> {
        read_as(&self.values, key)
    }

    /// True when `key` holds anything other than `null` or `false`.
    pub fn is_truthy(&self, key: &str) -> bool {
        self.values.get(key).is_truthy()
    }

    pub fn contains_key(&self, key: &str) -> bool {
        self.values.contains_key(key)
    }

    pub fn insert(&mut self, key: impl Into<String>, value: impl Into<Value>) -> Option<Value> {
        self.values.insert(key.into(), value.into())
    }

    pub fn remove(&mut self, key: &str) -> Option<Value> {
        self.values.shift_remove(key)
    }

    /// Inserts every entry, overwriting existing keys in place.
    pub fn merge(&mut self, entries: impl IntoEntries) {
        self.values.extend(entries.into_entries());
    }

    pub fn keys(&self) -> impl Iterator<Item = &str> {
        self.values.keys().map(String::as_str)
    }

    pub fn values(&self) -> &IndexMap<String, Value> {
        &self.values
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Renders the entries as a JSON object, dropping the flags.
    pub fn to_json(&self) -> Value {
        Value::Object(self.values.iter().map(|(k, v)| (k.clone(), v.clone())).collect())
    }
}

pub(crate) fn read_as<T: DeserializeOwned>(values: &IndexMap<String, Value>, key: &str) -> Result<T, ContextError> {
    let value = values.get(key).ok_or_else(|| ContextError::Missing { key: key.to_string() })?;
    serde_json::from_value(value.clone()).map_err(|source| ContextError::Type {
        key: key.to_string(),
        source,
    })
}

/// Anything that can be merged into a [`Context`] as key/value pairs.
pub trait IntoEntries {
    fn into_entries(self) -> Vec<(String, Value)>;
}

impl IntoEntries for () {
    fn into_entries(self) -> Vec<(String, Value)> {
        Vec::new()
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> IntoEntries for [(K, V); N] {
    fn into_entries(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl<K: Into<String>, V: Into<Value>> IntoEntries for Vec<(K, V)> {
    fn into_entries(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl IntoEntries for Map<String, Value> {
    fn into_entries(self) -> Vec<(String, Value)> {
        self.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>, S> IntoEntries for IndexMap<K, V, S> {
    fn into_entries(self) -> Vec<(String, Value)> {
        self.into_iter().map(|(k, v)| (k.into(), v.into())).collect()
    }
}

impl From<()> for Context {
    fn from(_: ()) -> Self {
        Self::default()
    }
}

impl From<Map<String, Value>> for Context {
    fn from(map: Map<String, Value>) -> Self {
        map.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>, const N: usize> From<[(K, V); N]> for Context {
    fn from(entries: [(K, V); N]) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>> From<Vec<(K, V)>> for Context {
    fn from(entries: Vec<(K, V)>) -> Self {
        entries.into_iter().collect()
    }
}

impl<K: Into<String>, V: Into<Value>, S> From<IndexMap<K, V, S>> for Context {
    fn from(entries: IndexMap<K, V, S>) -> Self {
        entries.into_iter().collect()
    }
}

impl TryFrom<Value> for Context {
    type Error = ContextError;

    /// Accepts a JSON object or `null`.
    fn try_from(value: Value) -> Result<Self, Self::Error> {
        match value {
            Value::Object(map) => Ok(map.into()),
            Value::Null => Ok(Self::default()),
            other => Err(ContextError::NotAnObject { kind: json_kind(&other) }),
        }
    }
}

impl<K: Into<String>, V: Into<Value>> FromIterator<(K, V)> for Context {
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().map(|(k, v)| (k.into(), v.into())).collect(),
            halted: false,
            failed: false,
        }
    }
}

fn json_kind(value: &Value) -> &'static str {
    match value {
        Value::Null => "null",
        Value::Bool(_) => "a boolean",
        Value::Number(_) => "a number",
        Value::String(_) => "a string",
        Value::Array(_) => "an array",
        Value::Object(_) => "an object",
    }
}

/// Truthiness as branch guards see it: only absence, `null` and `false` are falsy.
pub trait Truthy {
    fn is_truthy(&self) -> bool;
}

impl Truthy for bool {
    fn is_truthy(&self) -> bool {
        *self
    }
}

impl Truthy for Value {
    fn is_truthy(&self) -> bool {
        !matches!(self, Value::Null | Value::Bool(false))
    }
}

impl<T: Truthy> Truthy for Option<T> {
    fn is_truthy(&self) -> bool {
        self.as_ref().is_some_and(Truthy::is_truthy)
    }
}

impl<T: Truthy + ?Sized> Truthy for &T {
    fn is_truthy(&self) -> bool {
        (**self).is_truthy()
    }
}
