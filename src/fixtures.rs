//! Fixture declarations and real fixture building.
//!
//! A test declares the fixtures it needs by name. Each fixture is a [`FixtureDef`]: a name, the names of the
//! fixtures it depends on, and a [`Builder`]. Builders and test bodies read their inputs from a [`Request`].
//!
//! ## Stand-ins
//!
//! During the dry run only fixtures on the path to `funparam` are built. Every other input is a
//! [`Slot::StandIn`]: asking for it never fails, it just yields [`Dep::StandIn`] instead of a value.
//!
//! ## Real building
//!
//! [`build_request`] is the host side of dependency injection: every generated case gets a freshly built graph,
//! with each fixture built at most once per case.

use std::any::{Any, type_name};
use std::collections::{HashMap, HashSet};
use std::fmt;
use std::rc::Rc;

use funparam_core::errors::missing_call_number_hint;
use funparam_core::lang::fixtures::{CALL_NUMBER_PARAM, FUNPARAM_FIXTURE, is_reserved};

use crate::errors::{FunparamError, FunparamResult};
use crate::instrument::Funparam;

/// A built fixture value, type-erased.
#[derive(Clone)]
pub struct FixtureValue(Rc<dyn Any>);

impl FixtureValue {
    pub fn new<T: Any>(value: T) -> Self {
        FixtureValue(Rc::new(value))
    }

    /// Clone the value out if it has type `T`.
    pub fn downcast<T: Any + Clone>(&self) -> Option<T> {
        self.0.downcast_ref::<T>().cloned()
    }
}

impl fmt::Debug for FixtureValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("FixtureValue(..)")
    }
}

/// One named input of a [`Request`].
#[derive(Debug, Clone)]
pub enum Slot {
    Real(FixtureValue),
    StandIn,
}

/// What a builder or test body gets back when it asks for a named input.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Dep<T> {
    Real(T),
    StandIn,
}

impl<T> Dep<T> {
    pub fn is_stand_in(&self) -> bool {
        matches!(self, Dep::StandIn)
    }

    pub fn real(self) -> Option<T> {
        match self {
            Dep::Real(value) => Some(value),
            Dep::StandIn => None,
        }
    }

    pub fn as_real(&self) -> Option<&T> {
        match self {
            Dep::Real(value) => Some(value),
            Dep::StandIn => None,
        }
    }
}

/// The named inputs of one builder or test-body invocation.
///
/// A request also owns every value built for it, including indirect dependencies, so that handles into the
/// graph (such as verifiers holding a weak reference to the instrument) stay valid for the whole run.
#[derive(Debug, Clone)]
pub struct Request {
    owner: String,
    slots: Vec<(String, Slot)>,
    graph: Vec<FixtureValue>,
}

impl Request {
    pub(crate) fn new(owner: impl Into<String>) -> Self {
        Self {
            owner: owner.into(),
            slots: Vec::new(),
            graph: Vec::new(),
        }
    }

    pub(crate) fn insert(&mut self, name: impl Into<String>, slot: Slot) {
        self.slots.push((name.into(), slot));
    }

    pub(crate) fn retain_graph(&mut self, values: impl IntoIterator<Item = FixtureValue>) {
        self.graph.extend(values);
    }

    /// Input names, in declaration order.
    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.slots.iter().map(|(name, _)| name.as_str())
    }

    pub fn slot(&self, name: &str) -> Option<&Slot> {
        self.slots.iter().find(|(n, _)| n == name).map(|(_, slot)| slot)
    }

    pub fn is_stand_in(&self, name: &str) -> bool {
        matches!(self.slot(name), Some(Slot::StandIn))
    }

    /// Look up a named input.
    ///
    /// ## Errors
    /// - `UndeclaredInput` if `name` is not among the inputs declared by the owner.
    /// - `TypeMismatch` if the real value is not a `T`.
    pub fn get<T: Any + Clone>(&self, name: &str) -> FunparamResult<Dep<T>> {
        match self.slot(name) {
            None => Err(FunparamError::UndeclaredInput {
                owner: self.owner.clone(),
                name: name.to_string(),
                declared: self.names().collect::<Vec<_>>().join(", "),
            }),
            Some(Slot::StandIn) => Ok(Dep::StandIn),
            Some(Slot::Real(value)) => value.downcast::<T>().map(Dep::Real).ok_or(FunparamError::TypeMismatch {
                name: name.to_string(),
                expected: type_name::<T>(),
            }),
        }
    }

    /// Look up a named input that must have a real value.
    pub fn require<T: Any + Clone>(&self, name: &str) -> FunparamResult<T> {
        self.get(name)?.real().ok_or_else(|| FunparamError::StandIn {
            name: name.to_string(),
        })
    }

    /// Shorthand for `require::<Funparam>("funparam")`.
    pub fn funparam(&self) -> FunparamResult<Funparam> {
        self.require(FUNPARAM_FIXTURE)
    }
}

/// A fixture builder function.
pub type BuildFn = dyn Fn(&Request) -> FunparamResult<FixtureValue>;

/// How a fixture is built.
#[derive(Clone)]
pub enum Builder {
    /// The canonical `funparam` builder; yields the instrument for the current run.
    Funparam,
    Custom(Rc<BuildFn>),
}

impl Builder {
    pub fn is_canonical_funparam(&self) -> bool {
        matches!(self, Builder::Funparam)
    }
}

impl fmt::Debug for Builder {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Builder::Funparam => f.write_str("Builder::Funparam"),
            Builder::Custom(_) => f.write_str("Builder::Custom(..)"),
        }
    }
}

/// A named fixture declaration.
#[derive(Debug, Clone)]
pub struct FixtureDef {
    name: String,
    argnames: Vec<String>,
    builder: Builder,
}

impl FixtureDef {
    /// Declare a fixture named `name` that depends on `argnames`.
    ///
    /// ## Examples
    /// ```rust
    /// use funparam::fixtures::FixtureDef;
    ///
    /// let def = FixtureDef::new("answer", &[], |_req| Ok(42_i32));
    /// assert_eq!(def.name(), "answer");
    /// assert!(def.argnames().is_empty());
    /// ```
    pub fn new<T, F>(name: impl Into<String>, argnames: &[&str], build: F) -> Self
    where
        T: Any,
        F: Fn(&Request) -> FunparamResult<T> + 'static,
    {
        Self {
            name: name.into(),
            argnames: argnames.iter().map(|s| s.to_string()).collect(),
            builder: Builder::Custom(Rc::new(move |req: &Request| build(req).map(FixtureValue::new))),
        }
    }

    /// The canonical `funparam` fixture.
    pub fn funparam() -> Self {
        Self {
            name: FUNPARAM_FIXTURE.to_string(),
            argnames: vec![CALL_NUMBER_PARAM.to_string()],
            builder: Builder::Funparam,
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    pub fn argnames(&self) -> &[String] {
        &self.argnames
    }

    pub fn builder(&self) -> &Builder {
        &self.builder
    }
}

/// All fixture definitions visible to a suite, by name.
///
/// A name may be defined several times; the last definition overrides the earlier ones.
#[derive(Debug, Clone)]
pub struct FixtureRegistry {
    defs: HashMap<String, Vec<FixtureDef>>,
}

impl Default for FixtureRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl FixtureRegistry {
    /// Create a registry holding only the canonical `funparam` fixture.
    pub fn new() -> Self {
        let mut defs = HashMap::new();
        defs.insert(FUNPARAM_FIXTURE.to_string(), vec![FixtureDef::funparam()]);
        Self { defs }
    }

    /// Add a definition, overriding earlier definitions with the same name.
    pub fn register(&mut self, def: FixtureDef) -> FunparamResult<()> {
        if is_reserved(def.name()) {
            return Err(FunparamError::ReservedName {
                name: def.name().to_string(),
            });
        }
        self.defs.entry(def.name().to_string()).or_default().push(def);
        Ok(())
    }

    /// The effective definition for `name`.
    pub fn lookup(&self, name: &str) -> Option<&FixtureDef> {
        self.defs.get(name).and_then(|defs| defs.last())
    }

    /// All defined names, sorted.
    pub fn names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self.defs.keys().map(String::as_str).collect();
        names.sort_unstable();
        names
    }

    /// Every name reachable from `argnames`, depth-first, without duplicates.
    ///
    /// Unknown names are included but not expanded. This is the cheap check used before a dry run: it never
    /// invokes a builder.
    pub fn closure(&self, argnames: &[String]) -> Vec<String> {
        let mut seen = HashSet::new();
        let mut out = Vec::new();
        let mut stack: Vec<&str> = argnames.iter().rev().map(String::as_str).collect();
        while let Some(name) = stack.pop() {
            if !seen.insert(name) {
                continue;
            }
            out.push(name.to_string());
            if let Some(def) = self.lookup(name) {
                stack.extend(def.argnames().iter().rev().map(String::as_str));
            }
        }
        out
    }
}

/// Build the inputs of `owner` for a real run.
///
/// `params` holds the case parameters (e.g. `_funparam_call_number`); they take precedence over fixtures of
/// the same name. Each fixture is built at most once per call.
pub fn build_request(
    registry: &FixtureRegistry,
    owner: &str,
    argnames: &[String],
    params: &HashMap<String, FixtureValue>,
) -> FunparamResult<Request> {
    let mut builder = RealBuilder {
        registry,
        params,
        cache: HashMap::new(),
        in_progress: HashSet::new(),
    };
    let mut request = Request::new(owner);
    for name in argnames {
        let value = builder.build(name)?;
        request.insert(name.clone(), Slot::Real(value));
    }
    request.retain_graph(builder.cache.into_values());
    Ok(request)
}

struct RealBuilder<'a> {
    registry: &'a FixtureRegistry,
    params: &'a HashMap<String, FixtureValue>,
    cache: HashMap<String, FixtureValue>,
    in_progress: HashSet<String>,
}

impl RealBuilder<'_> {
    fn build(&mut self, name: &str) -> FunparamResult<FixtureValue> {
        if let Some(value) = self.params.get(name).or_else(|| self.cache.get(name)) {
            return Ok(value.clone());
        }
        let registry = self.registry;
        let def = registry.lookup(name).ok_or_else(|| FunparamError::UnknownFixture {
            name: name.to_string(),
            available: registry.names().join(", "),
        })?;
        if !self.in_progress.insert(name.to_string()) {
            return Err(FunparamError::FixtureCycle { name: name.to_string() });
        }
        let built = self.build_def(def);
        self.in_progress.remove(name);
        let value = built?;
        self.cache.insert(name.to_string(), value.clone());
        Ok(value)
    }

    fn build_def(&mut self, def: &FixtureDef) -> FunparamResult<FixtureValue> {
        match def.builder() {
            Builder::Funparam => {
                let call_number = self
                    .params
                    .get(CALL_NUMBER_PARAM)
                    .and_then(FixtureValue::downcast::<usize>)
                    .ok_or_else(|| FunparamError::MissingCallNumber {
                        hint: missing_call_number_hint(),
                    })?;
                Ok(FixtureValue::new(Funparam::replay(call_number)))
            }
            Builder::Custom(build) => {
                let mut request = Request::new(def.name());
                for arg in def.argnames() {
                    let value = self.build(arg)?;
                    request.insert(arg.clone(), Slot::Real(value));
                }
                build(&request)
            }
        }
    }
}
