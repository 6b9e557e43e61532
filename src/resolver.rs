//! Dry-run dependency resolution.
//!
//! Resolution walks a test's fixtures depth-first looking for the canonical `funparam` fixture. A fixture is
//! *related* when `funparam` is reachable through it; only related fixtures are built, with
//! [`Slot::StandIn`] in place of each unrelated input. Unrelated subtrees are pruned before any builder runs, so
//! their builders can neither fail nor cause side effects during the dry run.

use std::collections::{HashMap, HashSet};

use funparam_core::lang::fixtures::FUNPARAM_FIXTURE;

use crate::errors::{FunparamError, FunparamResult};
use crate::fixtures::{Builder, FixtureDef, FixtureRegistry, FixtureValue, Request, Slot};
use crate::instrument::Funparam;

/// Outcome of resolving one fixture for the dry run.
#[derive(Debug, Clone)]
pub enum Resolved {
    /// `funparam` is reachable; this is the really-built value.
    Related(FixtureValue),
    Unrelated,
}

impl Resolved {
    pub fn is_related(&self) -> bool {
        matches!(self, Resolved::Related(_))
    }

    fn into_slot(self) -> Slot {
        match self {
            Resolved::Related(value) => Slot::Real(value),
            Resolved::Unrelated => Slot::StandIn,
        }
    }
}

/// Resolves fixtures against one dry-run instrument.
///
/// Each fixture is resolved at most once per resolver.
pub struct DryRunResolver<'a> {
    registry: &'a FixtureRegistry,
    instrument: &'a Funparam,
    memo: HashMap<String, Resolved>,
    in_progress: HashSet<String>,
}

impl<'a> DryRunResolver<'a> {
    pub fn new(registry: &'a FixtureRegistry, instrument: &'a Funparam) -> Self {
        Self {
            registry,
            instrument,
            memo: HashMap::new(),
            in_progress: HashSet::new(),
        }
    }

    /// Resolve `name`.
    ///
    /// Unknown names are unrelated, not errors. Errors come only from builders on the related path and from
    /// dependency cycles.
    pub fn resolve(&mut self, name: &str) -> FunparamResult<Resolved> {
        if let Some(resolved) = self.memo.get(name) {
            return Ok(resolved.clone());
        }
        let registry = self.registry;
        let Some(def) = registry.lookup(name) else {
            tracing::trace!(fixture = name, "unknown fixture treated as unrelated");
            return Ok(Resolved::Unrelated);
        };
        if def.name() == FUNPARAM_FIXTURE || def.builder().is_canonical_funparam() {
            return Ok(self.anchor(def));
        }

        if !self.in_progress.insert(name.to_string()) {
            return Err(FunparamError::FixtureCycle { name: name.to_string() });
        }
        let resolved = self.resolve_def(def);
        self.in_progress.remove(name);

        let resolved = resolved?;
        self.memo.insert(name.to_string(), resolved.clone());
        Ok(resolved)
    }

    /// Values built so far on the related path.
    pub fn built_values(&self) -> impl Iterator<Item = FixtureValue> + '_ {
        self.memo.values().filter_map(|resolved| match resolved {
            Resolved::Related(value) => Some(value.clone()),
            Resolved::Unrelated => None,
        })
    }

    fn anchor(&self, def: &FixtureDef) -> Resolved {
        if def.builder().is_canonical_funparam() {
            Resolved::Related(FixtureValue::new(self.instrument.clone()))
        } else {
            tracing::trace!(fixture = def.name(), "user-defined 'funparam' shadows the instrument");
            Resolved::Unrelated
        }
    }

    fn resolve_def(&mut self, def: &FixtureDef) -> FunparamResult<Resolved> {
        let mut inputs = Vec::with_capacity(def.argnames().len());
        for arg in def.argnames() {
            let resolved = self.resolve(arg)?;
            inputs.push((arg.clone(), resolved));
        }

        if !inputs.iter().any(|(_, resolved)| resolved.is_related()) {
            tracing::trace!(fixture = def.name(), "pruned fixture unrelated to funparam");
            return Ok(Resolved::Unrelated);
        }

        let Builder::Custom(build) = def.builder() else {
            return Ok(self.anchor(def));
        };
        let mut request = Request::new(def.name());
        for (arg, resolved) in inputs {
            request.insert(arg, resolved.into_slot());
        }
        tracing::trace!(fixture = def.name(), "building fixture on the funparam path");
        Ok(Resolved::Related(build(&request)?))
    }
}

/// Resolve the inputs of a test for its dry run.
///
/// Returns `Ok(None)` when none of `argnames` leads to `funparam`: the test does not use the mechanism and must
/// be left alone. Otherwise every related input holds its built value and every other input is a stand-in.
pub fn generate_kwargs(
    registry: &FixtureRegistry,
    owner: &str,
    argnames: &[String],
    instrument: &Funparam,
) -> FunparamResult<Option<Request>> {
    let mut resolver = DryRunResolver::new(registry, instrument);
    let mut inputs = Vec::with_capacity(argnames.len());
    for name in argnames {
        let resolved = resolver.resolve(name)?;
        inputs.push((name.clone(), resolved));
    }

    if !inputs.iter().any(|(_, resolved)| resolved.is_related()) {
        return Ok(None);
    }

    let mut request = Request::new(owner);
    for (name, resolved) in inputs {
        request.insert(name, resolved.into_slot());
    }
    request.retain_graph(resolver.built_values());
    Ok(Some(request))
}
