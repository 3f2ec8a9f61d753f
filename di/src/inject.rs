//! Field injection by identifier.
//!
//! Rust has no runtime field reflection, so a record describes its annotated
//! fields through the [`Injectable`] trait. The [`injectable!`](crate::injectable)
//! macro generates that table from `#[inject("id")]` annotations.

use crate::error::{Error, Result};
use crate::value::Value;
use parking_lot::RwLock;
use std::any::{self, Any};
use std::fmt;
use std::sync::Arc;

/// A field the registry can write a resolved value into.
pub trait FieldSlot: Send + Sync {
  /// Stores `value` in the field. Returns `false` if the value does not fit
  /// the field's type.
  fn assign(&self, value: &Value) -> bool;

  /// The type name the field accepts, used in diagnostics.
  fn expected_type(&self) -> &'static str;
}

/// One annotated field of an injectable record.
pub struct InjectionPoint<'a> {
  pub field: &'static str,
  pub id: &'static str,
  pub slot: &'a dyn FieldSlot,
}

impl<'a> InjectionPoint<'a> {
  pub fn new(field: &'static str, id: &'static str, slot: &'a dyn FieldSlot) -> Self {
    Self { field, id, slot }
  }
}

/// A record with identifier-annotated fields.
pub trait Injectable: Any + Send + Sync {
  /// The annotated fields in declaration order.
  fn injection_points(&self) -> Vec<InjectionPoint<'_>>;
}

/// Holder for an injected dependency.
///
/// Slots are written through a shared reference, so records stay usable
/// behind an `Arc` while the registry fills them in.
pub struct Slot<T> {
  value: RwLock<Option<Arc<T>>>,
}

impl<T: Any + Send + Sync> Slot<T> {
  pub fn new() -> Self {
    Self {
      value: RwLock::new(None),
    }
  }

  /// Returns the injected value.
  ///
  /// # Panics
  ///
  /// Panics if nothing has been injected yet.
  pub fn get(&self) -> Arc<T> {
    self.try_get().unwrap_or_else(|| {
      panic!(
        "slot of type {} read before injection",
        any::type_name::<T>()
      )
    })
  }

  pub fn try_get(&self) -> Option<Arc<T>> {
    self.value.read().clone()
  }

  pub fn is_set(&self) -> bool {
    self.value.read().is_some()
  }

  pub fn set(&self, value: Arc<T>) {
    *self.value.write() = Some(value);
  }
}

impl<T: Any + Send + Sync> Default for Slot<T> {
  fn default() -> Self {
    Self::new()
  }
}

impl<T: Any + Send + Sync> FieldSlot for Slot<T> {
  fn assign(&self, value: &Value) -> bool {
    match value.downcast::<T>() {
      Some(typed) => {
        self.set(typed);
        true
      }
      None => false,
    }
  }

  fn expected_type(&self) -> &'static str {
    any::type_name::<T>()
  }
}

impl<T: Any + Send + Sync + fmt::Debug> fmt::Debug for Slot<T> {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_tuple("Slot").field(&self.try_get()).finish()
  }
}

/// Resolves every annotated field of `target` through `resolve` and assigns it.
///
/// Resolution errors are returned unchanged.
pub(crate) fn inject_fields<F>(target: &dyn Injectable, mut resolve: F) -> Result<()>
where
  F: FnMut(&str) -> Result<Value>,
{
  for point in target.injection_points() {
    let value = resolve(point.id)?;
    if !point.slot.assign(&value) {
      return Err(Error::FieldNotAssignable {
        field: point.field,
        id: point.id.to_owned(),
        expected: point.slot.expected_type(),
      });
    }
    tracing::trace!(field = point.field, id = point.id, "injected field");
  }
  Ok(())
}
