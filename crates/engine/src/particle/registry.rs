//! Name-to-type lookup for particles.
//!
//! Steps refer to particles by name. A step called `validate_order` resolves
//! to the particle registered as `ValidateOrder`; names are canonicalised with
//! [`canonical_type_name`] on both registration and lookup, so either spelling
//! finds the same entry. Namespaced names use `::` or `/` as separators
//! (`billing/charge_card` and `Billing::ChargeCard` are the same particle).

use std::{fmt, sync::Arc};

use heck::ToUpperCamelCase;
use indexmap::IndexMap;
use tracing::debug;

use super::{Particle, ParticleType, WorkUnit};
use crate::error::BuildError;

/// Registry of invocable particle types keyed by canonical type name.
#[derive(Clone, Default)]
pub struct ParticleRegistry {
    units: IndexMap<String, Arc<dyn WorkUnit>>,
}

impl ParticleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Registers `P` under its own type name (for example `ValidateOrder`).
    pub fn register<P: Particle + Default>(&mut self) -> Result<&mut Self, BuildError> {
        self.register_as::<P>(short_type_name::<P>())
    }

    /// Registers `P` under an explicit name.
    pub fn register_as<P: Particle + Default>(&mut self, name: &str) -> Result<&mut Self, BuildError> {
        self.register_with(name, P::default)
    }

    /// Registers `P` with a factory that builds one instance per invocation.
    pub fn register_with<P, F>(&mut self, name: &str, factory: F) -> Result<&mut Self, BuildError>
    where
        P: Particle,
        F: Fn() -> P + Send + Sync + 'static,
    {
        let canonical = checked_name(name)?;
        let unit = ParticleType::new(canonical.clone(), factory);
        self.insert(canonical, Arc::new(unit))
    }

    /// Registers an already type-erased unit, typically a [`crate::Flow`].
    pub fn register_unit(&mut self, name: &str, unit: Arc<dyn WorkUnit>) -> Result<&mut Self, BuildError> {
        let canonical = checked_name(name)?;
        self.insert(canonical, unit)
    }

    fn insert(&mut self, canonical: String, unit: Arc<dyn WorkUnit>) -> Result<&mut Self, BuildError> {
        if self.units.contains_key(&canonical) {
            return Err(BuildError::DuplicateParticle { particle: canonical });
        }
        debug!(particle = %canonical, "registered particle");
        self.units.insert(canonical, unit);
        Ok(self)
    }

    /// Looks up a particle by any spelling of its name.
    pub fn resolve(&self, name: &str) -> Option<Arc<dyn WorkUnit>> {
        self.units.get(&canonical_type_name(name)).cloned()
    }

    pub fn contains(&self, name: &str) -> bool {
        self.units.contains_key(&canonical_type_name(name))
    }

    /// Canonical names in registration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.units.keys().map(String::as_str)
    }

    pub fn len(&self) -> usize {
        self.units.len()
    }

    pub fn is_empty(&self) -> bool {
        self.units.is_empty()
    }
}

impl fmt::Debug for ParticleRegistry {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ParticleRegistry").field("particles", &self.units.keys().collect::<Vec<_>>()).finish()
    }
}

/// Converts a step or particle name into its canonical type name.
///
/// Each `::`/`/` separated segment is converted to UpperCamelCase and the
/// segments are joined with `::`. Empty segments are dropped.
///
/// ```rust
/// use laminar_engine::canonical_type_name;
///
/// assert_eq!(canonical_type_name("with_no_args"), "WithNoArgs");
/// assert_eq!(canonical_type_name("billing/charge_card"), "Billing::ChargeCard");
/// assert_eq!(canonical_type_name("Mock::Halts"), "Mock::Halts");
/// ```
pub fn canonical_type_name(name: &str) -> String {
    name.split("::")
        .flat_map(|segment| segment.split('/'))
        .map(str::trim)
        .filter(|segment| !segment.is_empty())
        .map(|segment| segment.to_upper_camel_case())
        .collect::<Vec<_>>()
        .join("::")
}

fn checked_name(name: &str) -> Result<String, BuildError> {
    let canonical = canonical_type_name(name);
    if canonical.is_empty() {
        return Err(BuildError::InvalidName {
            name: name.to_string(),
            reason: "particle names must contain at least one identifier segment",
        });
    }
    Ok(canonical)
}

/// Last path segment of `P`'s Rust type name, without generic arguments.
fn short_type_name<P>() -> &'static str {
    let full = std::any::type_name::<P>();
    let base = full.split('<').next().unwrap_or(full);
    base.rsplit("::").next().unwrap_or(base)
}
