//! The type-erased handle used for every resolved instance.

use crate::error::{Error, Result};
use crate::inject::Injectable;
use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;

/// A shared, type-erased instance held by the registry.
///
/// Cloning a `Value` clones the handle, never the instance behind it, so
/// every clone compares equal under [`Value::ptr_eq`].
#[derive(Clone)]
pub struct Value {
  inner: Arc<dyn Any + Send + Sync>,
  // Same allocation as `inner`, present only for values built with `injectable`.
  fields: Option<Arc<dyn Injectable>>,
  type_name: &'static str,
}

impl Value {
  /// Wraps a plain instance.
  pub fn new<T: Any + Send + Sync>(instance: T) -> Self {
    Self::from_arc(Arc::new(instance))
  }

  /// Wraps an instance that is already shared.
  pub fn from_arc<T: Any + Send + Sync>(instance: Arc<T>) -> Self {
    Self {
      inner: instance,
      fields: None,
      type_name: any::type_name::<T>(),
    }
  }

  /// Wraps an instance whose annotated fields the registry populates after
  /// construction.
  pub fn injectable<T: Injectable>(instance: T) -> Self {
    Self::injectable_arc(Arc::new(instance))
  }

  /// Like [`Value::injectable`], for an instance that is already shared.
  pub fn injectable_arc<T: Injectable>(instance: Arc<T>) -> Self {
    let fields: Arc<dyn Injectable> = instance.clone();
    Self {
      inner: instance,
      fields: Some(fields),
      type_name: any::type_name::<T>(),
    }
  }

  /// Returns a typed handle if the instance is a `T`.
  pub fn downcast<T: Any + Send + Sync>(&self) -> Option<Arc<T>> {
    self.inner.clone().downcast::<T>().ok()
  }

  pub fn downcast_ref<T: Any>(&self) -> Option<&T> {
    self.inner.downcast_ref::<T>()
  }

  pub fn is<T: Any>(&self) -> bool {
    self.inner.is::<T>()
  }

  /// The concrete type name of the instance.
  pub fn type_name(&self) -> &'static str {
    self.type_name
  }

  pub fn is_injectable(&self) -> bool {
    self.fields.is_some()
  }

  pub(crate) fn fields(&self) -> Option<&dyn Injectable> {
    self.fields.as_deref()
  }

  /// Whether both handles point at the same instance.
  pub fn ptr_eq(&self, other: &Value) -> bool {
    std::ptr::eq(
      Arc::as_ptr(&self.inner) as *const (),
      Arc::as_ptr(&other.inner) as *const (),
    )
  }
}

/// Downcasts a resolved value, reporting a mismatch against `id`.
pub(crate) fn typed<T: Any + Send + Sync>(id: &str, value: Value) -> Result<Arc<T>> {
  value.downcast::<T>().ok_or_else(|| Error::TypeMismatch {
    id: id.to_owned(),
    expected: any::type_name::<T>(),
    found: value.type_name(),
  })
}

impl fmt::Debug for Value {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Value")
      .field("type", &self.type_name)
      .field("injectable", &self.fields.is_some())
      .finish()
  }
}

#[cfg(test)]
mod tests {
  use super::*;

  #[test]
  fn clones_share_the_instance() {
    let a = Value::new(String::from("shared"));
    let b = a.clone();
    assert!(a.ptr_eq(&b));
    assert!(!a.ptr_eq(&Value::new(String::from("shared"))));
  }

  #[test]
  fn downcast_checks_the_concrete_type() {
    let value = Value::new(42u32);
    assert_eq!(*value.downcast::<u32>().unwrap(), 42);
    assert!(value.downcast::<i64>().is_none());
    assert!(value.is::<u32>());
    assert_eq!(value.type_name(), "u32");
  }

  #[test]
  fn from_arc_keeps_identity() {
    let shared = Arc::new(7u8);
    let value = Value::from_arc(shared.clone());
    assert!(Arc::ptr_eq(&shared, &value.downcast::<u8>().unwrap()));
    assert!(!value.is_injectable());
  }
}
