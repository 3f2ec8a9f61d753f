//! The resolution engine.
//!
//! Every identifier being built is pushed onto a per-thread in-flight stack,
//! tagged with the registry that owns it, for as long as its factory runs.
//! Checking that stack before a factory runs is how cycles are caught, no
//! matter which handle the nested lookup went through: the factory context,
//! `FactoryContext::registry()`, or a registry captured by a plain closure.

use crate::definition::{DecoratorDef, Definition, ServiceDef};
use crate::error::{BoxError, Error, FactoryFailure, Result};
use crate::factory::{Factory, FactoryContext};
use crate::inject;
use crate::registry::Registry;
use crate::value::Value;
use std::cell::RefCell;
use std::fmt;

thread_local! {
  // Identifiers currently being built on this thread, oldest first.
  static IN_FLIGHT: RefCell<Vec<(usize, String)>> = RefCell::new(Vec::new());
}

/// An RAII guard marking an identifier as in flight on this thread.
///
/// Popped on drop, so a panicking factory never leaves a stale entry.
struct InFlightGuard;

impl InFlightGuard {
  fn enter(registry: usize, id: &str) -> Self {
    IN_FLIGHT.with(|stack| stack.borrow_mut().push((registry, id.to_owned())));
    InFlightGuard
  }
}

impl Drop for InFlightGuard {
  fn drop(&mut self) {
    IN_FLIGHT.with(|stack| {
      stack.borrow_mut().pop();
    });
  }
}

/// One identifier on a reported dependency cycle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathNode {
  pub id: String,
  /// Targets decorated by the definition under `id`, outermost first.
  pub decorates: Vec<String>,
}

impl fmt::Display for PathNode {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    write!(f, "\"{}\"", self.id)?;
    if !self.decorates.is_empty() {
      let targets: Vec<String> = self.decorates.iter().map(|t| format!("\"{t}\"")).collect();
      write!(f, ":decorates({})", targets.join(", "))?;
    }
    Ok(())
  }
}

/// The ordered identifiers of a dependency cycle, oldest first, ending with
/// the identifier that was requested again.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ResolutionPath {
  nodes: Vec<PathNode>,
}

impl ResolutionPath {
  pub fn nodes(&self) -> &[PathNode] {
    &self.nodes
  }

  pub fn ids(&self) -> Vec<&str> {
    self.nodes.iter().map(|node| node.id.as_str()).collect()
  }
}

impl fmt::Display for ResolutionPath {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    for (i, node) in self.nodes.iter().enumerate() {
      if i > 0 {
        f.write_str(" -> ")?;
      }
      write!(f, "{node}")?;
    }
    Ok(())
  }
}

/// A lookup scope over one registry.
pub(crate) struct ResolutionView<'a> {
  registry: &'a Registry,
}

impl<'a> ResolutionView<'a> {
  pub(crate) fn root(registry: &'a Registry) -> Self {
    Self { registry }
  }

  pub(crate) fn registry(&self) -> &'a Registry {
    self.registry
  }

  /// Identifiers of this registry in flight on this thread, oldest first.
  fn chain(&self) -> Vec<String> {
    let key = self.registry.key();
    IN_FLIGHT.with(|stack| {
      stack
        .borrow()
        .iter()
        .filter(|(owner, _)| *owner == key)
        .map(|(_, id)| id.clone())
        .collect()
    })
  }

  fn is_resolving(&self, id: &str) -> bool {
    let key = self.registry.key();
    IN_FLIGHT.with(|stack| {
      stack
        .borrow()
        .iter()
        .any(|(owner, in_flight)| *owner == key && in_flight == id)
    })
  }

  fn ensure_acyclic(&self, id: &str) -> Result<()> {
    if !self.is_resolving(id) {
      return Ok(());
    }

    let mut ids = self.chain();
    ids.push(id.to_owned());
    let nodes = ids
      .into_iter()
      .map(|node_id| {
        let decorates = self
          .registry
          .load(&node_id)
          .map(|def| def.decorates_chain().into_iter().map(str::to_owned).collect())
          .unwrap_or_default();
        PathNode {
          id: node_id,
          decorates,
        }
      })
      .collect();
    let path = ResolutionPath { nodes };

    tracing::warn!(%path, "circular dependency detected");
    Err(Error::CircularDependency { path })
  }

  pub(crate) fn get(&self, id: &str) -> Result<Value> {
    let def = self
      .registry
      .load(id)
      .ok_or_else(|| Error::UnknownService(id.to_owned()))?;

    match def {
      Definition::Parameter(param) => Ok(param.value().clone()),
      Definition::Service(service) => {
        if let Some(instance) = service.instance() {
          tracing::trace!(id, "service cache hit");
          return Ok(instance.clone());
        }
        self.ensure_acyclic(id)?;
        let _guard = InFlightGuard::enter(self.registry.key(), id);
        self.build_service(id, service)
      }
      Definition::Decorator(decorator) => {
        if let Some(instance) = decorator.instance() {
          tracing::trace!(id, "decorator cache hit");
          return Ok(instance.clone());
        }
        self.ensure_acyclic(id)?;
        let _guard = InFlightGuard::enter(self.registry.key(), id);
        self.build_decoration(id, decorator)
      }
    }
  }

  fn build_service(&self, id: &str, def: ServiceDef) -> Result<Value> {
    let instance = self.invoke(id, def.factory(), None)?;
    self.inject(&instance)?;

    self
      .registry
      .store(id, Definition::Service(def.with_instance(instance.clone())));
    tracing::trace!(id, type_name = instance.type_name(), "service constructed");

    Ok(instance)
  }

  fn build_decoration(&self, id: &str, def: DecoratorDef) -> Result<Value> {
    let target = def.decorates();
    self.ensure_acyclic(target)?;

    let decorated = self.get(target)?;
    let prior = self
      .registry
      .load(target)
      .ok_or_else(|| Error::UnknownService(target.to_owned()))?;

    let instance = self.invoke(id, def.factory(), Some(decorated))?;
    self.inject(&instance)?;

    // Every identifier already answering for the target now yields the new
    // outermost value, including decorators applied before this one.
    let mut aliases = vec![id.to_owned(), target.to_owned()];
    let mut link = Some(&prior);
    while let Some(Definition::Decorator(earlier)) = link {
      aliases.push(earlier.id().to_owned());
      link = earlier.decorated();
    }

    let resolved = Definition::Decorator(def.with_instance(instance.clone()).with_decorated(prior));
    for alias in aliases {
      self.registry.store(&alias, resolved.clone());
    }
    tracing::debug!(id, target, "decorator applied");

    Ok(instance)
  }

  fn invoke(&self, id: &str, factory: &Factory, decorated: Option<Value>) -> Result<Value> {
    match factory {
      Factory::Instance(value) => Ok(value.clone()),
      Factory::Fn(f) => f().ok_or_else(|| Error::factory_failed(id, FactoryFailure::NoValue)),
      Factory::ErrorFn(f) => f().map_err(|err| constructor_error(id, err)),
      Factory::ContextFn(f) => {
        let ctx = FactoryContext::new(self, id, decorated);
        f(&ctx).map_err(|err| constructor_error(id, err))
      }
    }
  }

  pub(crate) fn inject(&self, instance: &Value) -> Result<()> {
    match instance.fields() {
      Some(fields) => inject::inject_fields(fields, |dep| self.get(dep)),
      None => Ok(()),
    }
  }
}

// Registry errors raised by nested lookups pass through unchanged.
fn constructor_error(id: &str, err: BoxError) -> Error {
  match err.downcast::<Error>() {
    Ok(inner) => *inner,
    Err(other) => Error::factory_failed(id, FactoryFailure::Constructor(other)),
  }
}

#[cfg(test)]
mod tests {
  use super::*;
  use pretty_assertions::assert_eq;

  fn node(id: &str, decorates: &[&str]) -> PathNode {
    PathNode {
      id: id.to_owned(),
      decorates: decorates.iter().map(|t| t.to_string()).collect(),
    }
  }

  #[test]
  fn path_renders_oldest_first() {
    let path = ResolutionPath {
      nodes: vec![node("a", &[]), node("b", &[]), node("a", &[])],
    };
    assert_eq!(path.to_string(), r#""a" -> "b" -> "a""#);
    assert_eq!(path.ids(), vec!["a", "b", "a"]);
  }

  #[test]
  fn path_annotates_decorators() {
    let path = ResolutionPath {
      nodes: vec![
        node("log.tagged", &["log.timed", "log"]),
        node("log", &[]),
        node("log.tagged", &["log.timed", "log"]),
      ],
    };
    assert_eq!(
      path.to_string(),
      r#""log.tagged":decorates("log.timed", "log") -> "log" -> "log.tagged":decorates("log.timed", "log")"#
    );
  }

  #[test]
  fn in_flight_identifiers_form_the_chain() {
    let registry = Registry::new();
    let other = Registry::new();
    let view = ResolutionView::root(&registry);

    {
      let _a = InFlightGuard::enter(registry.key(), "a");
      let _foreign = InFlightGuard::enter(other.key(), "x");
      let _b = InFlightGuard::enter(registry.key(), "b");

      assert_eq!(view.chain(), vec!["a", "b"]);
      assert!(view.is_resolving("a"));
      assert!(!view.is_resolving("x"));
      assert!(ResolutionView::root(&other).is_resolving("x"));

      let err = view.ensure_acyclic("a").unwrap_err();
      assert_eq!(err.cycle_path().unwrap().ids(), vec!["a", "b", "a"]);
    }

    assert!(view.chain().is_empty());
    assert!(view.ensure_acyclic("a").is_ok());
  }
}
