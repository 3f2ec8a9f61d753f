//! The `Registry` handle and its public operations.

use crate::builder::RegistryBuilder;
use crate::definition::{Definition, DefinitionKind};
use crate::error::{Error, Result};
use crate::inject::{self, Injectable};
use crate::resolution::ResolutionView;
use crate::value::{self, Value};
use dashmap::DashMap;
use parking_lot::{Mutex, ReentrantMutex};
use std::any::Any;
use std::cell::Cell;
use std::fmt;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio_util::sync::CancellationToken;

struct Shared {
  definitions: DashMap<String, Definition>,
  order: Mutex<Vec<String>>,
  // Closes registration. Set by the first lookup or `boot`.
  booted: AtomicBool,
  // Set only once every decorator has been applied.
  decorated: AtomicBool,
  // Serializes the decorator pass. The cell marks a pass running on the
  // holding thread, so its factories can look up through the registry.
  decorator_pass: ReentrantMutex<Cell<bool>>,
  cancellation: CancellationToken,
}

/// A catalog of named definitions resolved on demand.
///
/// `Registry` is a cheap handle: clones share the same definitions and
/// cached instances. Independent registries never see each other's entries.
///
/// Map locks are held only for the read or write itself, never while a
/// factory runs, so factories may freely look up other identifiers. Two
/// threads asking for the same unresolved service at once may both build
/// it, and the last one to finish is kept. Call [`Registry::boot`] before
/// sharing the registry when a service must be constructed exactly once.
///
/// Decorators are applied exactly once, under a lock that concurrent first
/// lookups wait on, so no caller ever sees an undecorated target.
#[derive(Clone)]
pub struct Registry {
  shared: Arc<Shared>,
}

impl Default for Registry {
  fn default() -> Self {
    Self::with_cancellation(CancellationToken::new())
  }
}

impl Registry {
  /// Creates a new, empty `Registry`.
  pub fn new() -> Self {
    Self::default()
  }

  /// Creates an empty registry whose factories observe `token`.
  pub fn with_cancellation(token: CancellationToken) -> Self {
    Self {
      shared: Arc::new(Shared {
        definitions: DashMap::new(),
        order: Mutex::new(Vec::new()),
        booted: AtomicBool::new(false),
        decorated: AtomicBool::new(false),
        decorator_pass: ReentrantMutex::new(Cell::new(false)),
        cancellation: token,
      }),
    }
  }

  pub fn builder() -> RegistryBuilder {
    RegistryBuilder::new()
  }

  // --- Registration ---

  /// Adds `definition` under its own identifier, replacing any previous one.
  ///
  /// Fails with [`Error::AlreadyBooted`] once the registry was booted, either
  /// explicitly or by the first lookup.
  pub fn add(&self, definition: impl Into<Definition>) -> Result<()> {
    let definition = definition.into();
    let id = definition.id().to_owned();
    self.insert(id, definition)
  }

  /// Adds `definition` under `id`, renaming it.
  pub fn add_as(&self, id: impl Into<String>, definition: impl Into<Definition>) -> Result<()> {
    let id = id.into();
    let definition = definition.into().with_id(id.clone());
    self.insert(id, definition)
  }

  fn insert(&self, id: String, definition: Definition) -> Result<()> {
    if self.is_booted() {
      return Err(Error::AlreadyBooted { id });
    }

    let kind = definition.kind();
    let mut order = self.shared.order.lock();
    if self.shared.definitions.insert(id.clone(), definition).is_some() {
      tracing::warn!(id = %id, %kind, "definition replaced");
    } else {
      tracing::debug!(id = %id, %kind, "definition added");
      order.push(id);
    }
    Ok(())
  }

  // --- Resolution ---

  /// Resolves `id` to its value, building and caching it if needed.
  ///
  /// The first lookup on a registry that was never booted resolves every
  /// decorator first, since applying a decorator rewrites its target. If a
  /// decorator fails, every later lookup retries the pass and reports its
  /// error until it succeeds.
  pub fn get(&self, id: &str) -> Result<Value> {
    self.prepare()?;
    ResolutionView::root(self).get(id)
  }

  /// Resolves `id` and downcasts the value to `T`.
  pub fn get_as<T: Any + Send + Sync>(&self, id: &str) -> Result<Arc<T>> {
    value::typed(id, self.get(id)?)
  }

  /// Resolves `id`, panicking if it cannot be resolved.
  ///
  /// Meant for start-up wiring where a missing or cyclic dependency is a
  /// programming error.
  pub fn must_get(&self, id: &str) -> Value {
    self.get(id).unwrap_or_else(|err| panic!("{err}"))
  }

  pub fn must_get_as<T: Any + Send + Sync>(&self, id: &str) -> Arc<T> {
    self.get_as::<T>(id).unwrap_or_else(|err| panic!("{err}"))
  }

  pub fn has(&self, id: &str) -> bool {
    self.shared.definitions.contains_key(id)
  }

  /// Returns a copy of the definition currently stored under `id`.
  pub fn definition(&self, id: &str) -> Option<Definition> {
    self.load(id)
  }

  // --- Boot ---

  /// Resolves every decorator, then every service, in registration order.
  ///
  /// Stops at the first error. Cached instances are never rebuilt, so calling
  /// `boot` again is cheap and invokes no factory.
  pub fn boot(&self) -> Result<()> {
    tracing::debug!(definitions = self.len(), "booting registry");

    self.prepare()?;
    self.resolve_all(DefinitionKind::Service)?;

    tracing::debug!("registry booted");
    Ok(())
  }

  pub fn is_booted(&self) -> bool {
    self.shared.booted.load(Ordering::SeqCst)
  }

  // Closes registration and applies every decorator, unless that already
  // succeeded. A failed pass is retried by the next call. Lookups made by
  // decorator factories while the pass runs on this thread skip it.
  pub(crate) fn prepare(&self) -> Result<()> {
    self.shared.booted.store(true, Ordering::SeqCst);
    if self.shared.decorated.load(Ordering::Acquire) {
      return Ok(());
    }

    let running = self.shared.decorator_pass.lock();
    if running.get() || self.shared.decorated.load(Ordering::Acquire) {
      return Ok(());
    }

    tracing::debug!("applying decorators");
    let result = {
      let _pass = PassMarker::set(&running);
      self.resolve_all(DefinitionKind::Decorator)
    };

    match &result {
      Ok(()) => self.shared.decorated.store(true, Ordering::Release),
      Err(err) => tracing::warn!(error = %err, "decorator pass failed"),
    }
    result
  }

  fn resolve_all(&self, kind: DefinitionKind) -> Result<()> {
    let ids: Vec<String> = self
      .ids()
      .into_iter()
      .filter(|id| self.load(id).is_some_and(|def| def.kind() == kind))
      .collect();

    let root = ResolutionView::root(self);
    for id in &ids {
      root.get(id)?;
    }
    Ok(())
  }

  // --- Injection ---

  /// Populates the annotated fields of `target` with resolved values.
  ///
  /// Works on records that were never registered.
  pub fn inject<T: Injectable>(&self, target: &T) -> Result<()> {
    inject::inject_fields(target, |id| self.get(id))
  }

  /// Like [`Registry::inject`] for a type-erased value.
  ///
  /// Fails with [`Error::InvalidInjectionTarget`] if the value was not built
  /// with [`Value::injectable`].
  pub fn inject_value(&self, target: &Value) -> Result<()> {
    let fields = target.fields().ok_or(Error::InvalidInjectionTarget {
      type_name: target.type_name(),
    })?;
    inject::inject_fields(fields, |id| self.get(id))
  }

  // --- Introspection ---

  /// Registered identifiers in registration order.
  pub fn ids(&self) -> Vec<String> {
    self.shared.order.lock().clone()
  }

  pub fn len(&self) -> usize {
    self.shared.definitions.len()
  }

  pub fn is_empty(&self) -> bool {
    self.shared.definitions.is_empty()
  }

  /// The lifetime signal handed to context-aware factories.
  pub fn cancellation(&self) -> &CancellationToken {
    &self.shared.cancellation
  }

  pub fn cancel(&self) {
    self.shared.cancellation.cancel();
  }

  // --- Storage, used by the resolution engine ---

  // Identity of the shared state, tagging in-flight identifiers per registry.
  pub(crate) fn key(&self) -> usize {
    Arc::as_ptr(&self.shared) as usize
  }

  pub(crate) fn load(&self, id: &str) -> Option<Definition> {
    self.shared.definitions.get(id).map(|entry| entry.value().clone())
  }

  pub(crate) fn store(&self, id: &str, definition: Definition) {
    self.shared.definitions.insert(id.to_owned(), definition);
  }
}

// Marks a decorator pass as running until dropped, even on unwind.
struct PassMarker<'a>(&'a Cell<bool>);

impl<'a> PassMarker<'a> {
  fn set(cell: &'a Cell<bool>) -> Self {
    cell.set(true);
    PassMarker(cell)
  }
}

impl Drop for PassMarker<'_> {
  fn drop(&mut self) {
    self.0.set(false);
  }
}

impl fmt::Debug for Registry {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    f.debug_struct("Registry")
      .field("ids", &self.ids())
      .field("booted", &self.is_booted())
      .finish()
  }
}
