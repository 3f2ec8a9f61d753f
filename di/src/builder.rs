use crate::definition::Definition;
use crate::error::Result;
use crate::registry::Registry;
use std::fmt;
use tokio_util::sync::CancellationToken;

/// A builder for creating a `Registry` from a set of definitions.
///
/// Building always resolves the registered decorators, so every decorated
/// identifier already answers with its decorated value and the registry is
/// closed for further registration.
#[derive(Default)]
pub struct RegistryBuilder {
  definitions: Vec<Definition>,
  cancellation: Option<CancellationToken>,
  boot_on_build: bool,
}

impl fmt::Debug for RegistryBuilder {
  fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
    let ids: Vec<&str> = self.definitions.iter().map(Definition::id).collect();
    f.debug_struct("RegistryBuilder")
      .field("definitions", &ids)
      .field("has_cancellation", &self.cancellation.is_some())
      .field("boot_on_build", &self.boot_on_build)
      .finish()
  }
}

impl RegistryBuilder {
  pub fn new() -> Self {
    Self::default()
  }

  /// Adds a definition. A later definition with the same identifier
  /// replaces an earlier one.
  pub fn definition(mut self, definition: impl Into<Definition>) -> Self {
    self.definitions.push(definition.into());
    self
  }

  pub fn definitions<I>(mut self, definitions: I) -> Self
  where
    I: IntoIterator<Item = Definition>,
  {
    self.definitions.extend(definitions);
    self
  }

  /// Sets the lifetime signal handed to context-aware factories.
  ///
  /// Defaults to a fresh token that is never cancelled unless
  /// [`Registry::cancel`] is called.
  pub fn cancellation(mut self, token: CancellationToken) -> Self {
    self.cancellation = Some(token);
    self
  }

  /// Also constructs every service while building.
  pub fn boot_on_build(mut self, boot: bool) -> Self {
    self.boot_on_build = boot;
    self
  }

  pub fn build(self) -> Result<Registry> {
    let token = self.cancellation.unwrap_or_else(CancellationToken::new);
    let registry = Registry::with_cancellation(token);
    for definition in self.definitions {
      registry.add(definition)?;
    }

    if self.boot_on_build {
      registry.boot()?;
    } else {
      registry.prepare()?;
    }
    Ok(registry)
  }
}
