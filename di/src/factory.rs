//! Construction strategies and the context handed to context-aware factories.

use crate::error::{BoxError, Result};
use crate::inject::Injectable;
use crate::registry::Registry;
use crate::resolution::ResolutionView;
use crate::value::{self, Value};
use std::any::Any;
use std::fmt;
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

type PlainFactoryFn = dyn Fn() -> Option<Value> + Send + Sync;
type FallibleFactoryFn = dyn Fn() -> Result<Value, BoxError> + Send + Sync;
type ContextFactoryFn = dyn Fn(&FactoryContext<'_>) -> Result<Value, BoxError> + Send + Sync;

/// How a service or decorator obtains its instance.
#[derive(Clone)]
pub enum Factory {
  /// A ready-made instance, returned as is.
  Instance(Value),
  /// A constructor without arguments. Returning `None` is a construction failure.
  Fn(Arc<PlainFactoryFn>),
  /// A constructor without arguments that may fail.
  ErrorFn(Arc<FallibleFactoryFn>),
  /// A constructor that receives the resolution context.
  ContextFn(Arc<ContextFactoryFn>),
}

impl Factory {
  pub fn instance(value: Value) -> Self {
    Factory::Instance(value)
  }

  pub fn func(f: impl Fn() -> Option<Value> + Send + Sync + 'static) -> Self {
    Factory::Fn(Arc::new(f))
  }

  /// A typed plain constructor; every call builds a fresh `T`.
  pub fn new<T: Any + Send + Sync>(f: impl Fn() -> T + Send + Sync + 'static) -> Self {
    Factory::Fn(Arc::new(move || Some(Value::new(f()))))
  }

  /// A typed plain constructor for records with injectable fields.
  pub fn injectable<T: Injectable>(f: impl Fn() -> T + Send + Sync + 'static) -> Self {
    Factory::Fn(Arc::new(move || Some(Value::injectable(f()))))
  }

  pub fn fallible<E>(f: impl Fn() -> Result<Value, E> + Send + Sync + 'static) -> Self
  where
    E: Into<BoxError>,
  {
    Factory::ErrorFn(Arc::new(move || f().map_err(Into::into)))
  }

  pub fn contextual<E>(
    f: impl Fn(&FactoryContext<'_>) -> Result<Value, E> + Send + Sync + 'static,
  ) -> Self
  where
    E: Into<BoxError>,
  {
    Factory::ContextFn(Arc::new(move |ctx: &FactoryContext<'_>| {
      f(ctx).map_err(Into::into)
    }))
  }

  pub(crate) fn variant_name(&self) -> &'static str {
    match self {
      Factory::Instance(_) => "Instance",
      Factory::Fn(_) => "Fn",
      Factory::ErrorFn(_) => "ErrorFn",
      Factory::ContextFn(_) => "ContextFn",
    }
  }
}

impl fmt::Debug for Factory {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    match self {
      Factory::Instance(value) => f.debug_tuple("Instance").field(value).finish(),
      other => f.write_str(other.variant_name()),
    }
  }
}

/// The handle a [`Factory::ContextFn`] receives while its service is resolved.
///
/// Lookups made through the context continue the resolution chain of the
/// service being built, so a dependency that leads back to it is reported
/// as [`Error::CircularDependency`](crate::Error::CircularDependency)
/// instead of recursing forever.
pub struct FactoryContext<'a> {
  view: &'a ResolutionView<'a>,
  service_id: &'a str,
  decorated: Option<Value>,
}

impl<'a> FactoryContext<'a> {
  pub(crate) fn new(
    view: &'a ResolutionView<'a>,
    service_id: &'a str,
    decorated: Option<Value>,
  ) -> Self {
    Self {
      view,
      service_id,
      decorated,
    }
  }

  /// The identifier being resolved.
  pub fn service_id(&self) -> &str {
    self.service_id
  }

  /// The value being decorated, when this factory belongs to a decorator.
  pub fn decorated(&self) -> Option<&Value> {
    self.decorated.as_ref()
  }

  pub fn decorated_as<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.decorated.as_ref().and_then(Value::downcast::<T>)
  }

  pub fn get(&self, id: &str) -> crate::Result<Value> {
    self.view.get(id)
  }

  pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> crate::Result<Arc<T>> {
    value::typed(id, self.view.get(id)?)
  }

  /// Like [`FactoryContext::get`], panicking on failure.
  pub fn must_get(&self, id: &str) -> Value {
    self.get(id).unwrap_or_else(|err| panic!("{err}"))
  }

  pub fn must_get_as<T: Any + Send + Sync>(&self, id: &str) -> Arc<T> {
    self.get_as::<T>(id).unwrap_or_else(|err| panic!("{err}"))
  }

  pub fn has(&self, id: &str) -> bool {
    self.view.registry().has(id)
  }

  /// The owning registry. Lookups through it stay on the same resolution
  /// chain, so cycles are still reported.
  pub fn registry(&self) -> &Registry {
    self.view.registry()
  }

  /// The lifetime signal of the owning registry. The registry never checks
  /// it; long-running factories may.
  pub fn cancellation(&self) -> &CancellationToken {
    self.view.registry().cancellation()
  }

  pub fn is_cancelled(&self) -> bool {
    self.cancellation().is_cancelled()
  }
}
