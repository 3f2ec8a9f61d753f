//! Registry entries: parameters, services and decorators.
//!
//! Definitions are immutable. Every `with_*` method returns an updated copy,
//! which is how the registry records memoized instances.

use crate::factory::Factory;
use crate::value::Value;
use std::any::Any;
use std::fmt;

/// The three kinds of definition a registry knows about.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum DefinitionKind {
  Parameter,
  Service,
  Decorator,
}

impl fmt::Display for DefinitionKind {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      DefinitionKind::Parameter => f.write_str("parameter"),
      DefinitionKind::Service => f.write_str("service"),
      DefinitionKind::Decorator => f.write_str("decorator"),
    }
  }
}

/// A named entry describing how to obtain a value.
#[derive(Debug, Clone)]
pub enum Definition {
  Parameter(ParameterDef),
  Service(ServiceDef),
  Decorator(DecoratorDef),
}

impl Definition {
  /// A plain value, returned unchanged on every lookup.
  pub fn parameter<T: Any + Send + Sync>(id: impl Into<String>, value: T) -> Self {
    Definition::Parameter(ParameterDef::new(id, Value::new(value)))
  }

  /// A lazily constructed value, built at most once.
  pub fn service(id: impl Into<String>, factory: Factory) -> Self {
    Definition::Service(ServiceDef::new(id, factory))
  }

  /// A value that wraps and replaces the resolved value of `decorates`.
  pub fn decorator(id: impl Into<String>, decorates: impl Into<String>, factory: Factory) -> Self {
    Definition::Decorator(DecoratorDef::new(id, decorates, factory))
  }

  pub fn id(&self) -> &str {
    match self {
      Definition::Parameter(def) => def.id(),
      Definition::Service(def) => def.id(),
      Definition::Decorator(def) => def.id(),
    }
  }

  pub fn kind(&self) -> DefinitionKind {
    match self {
      Definition::Parameter(_) => DefinitionKind::Parameter,
      Definition::Service(_) => DefinitionKind::Service,
      Definition::Decorator(_) => DefinitionKind::Decorator,
    }
  }

  /// The resolved value, if there is one yet.
  ///
  /// Parameters always have one.
  pub fn instance(&self) -> Option<&Value> {
    match self {
      Definition::Parameter(def) => Some(def.value()),
      Definition::Service(def) => def.instance(),
      Definition::Decorator(def) => def.instance(),
    }
  }

  pub fn with_id(&self, id: impl Into<String>) -> Self {
    match self {
      Definition::Parameter(def) => Definition::Parameter(def.with_id(id)),
      Definition::Service(def) => Definition::Service(def.with_id(id)),
      Definition::Decorator(def) => Definition::Decorator(def.with_id(id)),
    }
  }

  pub fn as_decorator(&self) -> Option<&DecoratorDef> {
    match self {
      Definition::Decorator(def) => Some(def),
      _ => None,
    }
  }

  /// The targets this definition decorates, outermost first.
  ///
  /// Follows the `decorated` back-references of a resolved decorator chain.
  pub fn decorates_chain(&self) -> Vec<&str> {
    let mut chain = Vec::new();
    let mut current = self;
    while let Definition::Decorator(def) = current {
      chain.push(def.decorates());
      match def.decorated() {
        Some(next) => current = next,
        None => break,
      }
    }
    chain
  }
}

impl From<ParameterDef> for Definition {
  fn from(def: ParameterDef) -> Self {
    Definition::Parameter(def)
  }
}

impl From<ServiceDef> for Definition {
  fn from(def: ServiceDef) -> Self {
    Definition::Service(def)
  }
}

impl From<DecoratorDef> for Definition {
  fn from(def: DecoratorDef) -> Self {
    Definition::Decorator(def)
  }
}

#[derive(Debug, Clone)]
pub struct ParameterDef {
  id: String,
  value: Value,
}

impl ParameterDef {
  pub fn new(id: impl Into<String>, value: Value) -> Self {
    Self {
      id: id.into(),
      value,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn value(&self) -> &Value {
    &self.value
  }

  pub fn with_id(&self, id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..self.clone()
    }
  }

  pub fn with_value(&self, value: Value) -> Self {
    Self {
      value,
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone)]
pub struct ServiceDef {
  id: String,
  factory: Factory,
  instance: Option<Value>,
}

impl ServiceDef {
  pub fn new(id: impl Into<String>, factory: Factory) -> Self {
    Self {
      id: id.into(),
      factory,
      instance: None,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  pub fn factory(&self) -> &Factory {
    &self.factory
  }

  pub fn instance(&self) -> Option<&Value> {
    self.instance.as_ref()
  }

  pub fn with_id(&self, id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..self.clone()
    }
  }

  pub fn with_factory(&self, factory: Factory) -> Self {
    Self {
      factory,
      ..self.clone()
    }
  }

  pub fn with_instance(&self, instance: Value) -> Self {
    Self {
      instance: Some(instance),
      ..self.clone()
    }
  }
}

#[derive(Debug, Clone)]
pub struct DecoratorDef {
  id: String,
  decorates: String,
  factory: Factory,
  instance: Option<Value>,
  decorated: Option<Box<Definition>>,
}

impl DecoratorDef {
  pub fn new(id: impl Into<String>, decorates: impl Into<String>, factory: Factory) -> Self {
    Self {
      id: id.into(),
      decorates: decorates.into(),
      factory,
      instance: None,
      decorated: None,
    }
  }

  pub fn id(&self) -> &str {
    &self.id
  }

  /// The identifier of the decorated target.
  pub fn decorates(&self) -> &str {
    &self.decorates
  }

  pub fn factory(&self) -> &Factory {
    &self.factory
  }

  pub fn instance(&self) -> Option<&Value> {
    self.instance.as_ref()
  }

  /// The target's definition this decorator replaced. Set once resolved.
  pub fn decorated(&self) -> Option<&Definition> {
    self.decorated.as_deref()
  }

  pub fn with_id(&self, id: impl Into<String>) -> Self {
    Self {
      id: id.into(),
      ..self.clone()
    }
  }

  pub fn with_decorates(&self, decorates: impl Into<String>) -> Self {
    Self {
      decorates: decorates.into(),
      ..self.clone()
    }
  }

  pub fn with_factory(&self, factory: Factory) -> Self {
    Self {
      factory,
      ..self.clone()
    }
  }

  pub fn with_instance(&self, instance: Value) -> Self {
    Self {
      instance: Some(instance),
      ..self.clone()
    }
  }

  pub fn with_decorated(&self, decorated: Definition) -> Self {
    Self {
      decorated: Some(Box::new(decorated)),
      ..self.clone()
    }
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn with_methods_leave_the_original_untouched() {
    let original = ServiceDef::new("svc", Factory::new(|| 1u8));
    let resolved = original.with_instance(Value::new(1u8));

    assert!(original.instance().is_none());
    assert!(resolved.instance().is_some());
    assert_eq!(resolved.id(), "svc");

    let renamed = resolved.with_id("other");
    assert_eq!(renamed.id(), "other");
    assert_eq!(resolved.id(), "svc");
  }

  #[test]
  fn parameters_always_expose_their_value() {
    let def = Definition::parameter("answer", 42i32);
    assert_eq!(def.kind(), DefinitionKind::Parameter);
    assert_eq!(*def.instance().unwrap().downcast::<i32>().unwrap(), 42);

    let Definition::Parameter(param) = def else {
      panic!("expected a parameter");
    };
    let changed = param.with_value(Value::new(7i32));
    assert_eq!(*changed.value().downcast::<i32>().unwrap(), 7);
    assert_eq!(*param.value().downcast::<i32>().unwrap(), 42);
  }

  #[test]
  fn decorates_chain_follows_back_references() {
    let service = Definition::service("logger", Factory::new(|| 0u8));
    let first = DecoratorDef::new("logger.timed", "logger", Factory::new(|| 1u8))
      .with_decorated(service);
    let second = DecoratorDef::new("logger.tagged", "logger.timed", Factory::new(|| 2u8))
      .with_decorated(first.into());

    let def = Definition::from(second);
    assert_eq!(def.kind(), DefinitionKind::Decorator);
    assert_eq!(def.decorates_chain(), vec!["logger.timed", "logger"]);
  }

  #[test]
  fn unresolved_decorator_lists_only_its_target() {
    let def = Definition::decorator("cache.metrics", "cache", Factory::new(|| 0u8));
    assert_eq!(def.decorates_chain(), vec!["cache"]);
    assert!(def.instance().is_none());
    assert_eq!(def.as_decorator().unwrap().decorates(), "cache");
  }
}
