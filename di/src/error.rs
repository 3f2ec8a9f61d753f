use crate::resolution::ResolutionPath;
use thiserror::Error;

/// A boxed error returned by fallible factories.
pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

/// The main error type for the `fibre_di` library.
#[derive(Debug, Error)]
pub enum Error {
  /// No definition is registered under the requested identifier.
  #[error("unknown service: cannot find definition for \"{0}\"")]
  UnknownService(String),

  /// Resolving an identifier led back to an identifier already being resolved.
  #[error("circular dependency detected: {path}")]
  CircularDependency { path: ResolutionPath },

  /// A factory could not produce an instance.
  #[error("factory failed to instantiate service \"{id}\": {source}")]
  FactoryFailed {
    id: String,
    #[source]
    source: FactoryFailure,
  },

  /// The value handed to `inject_value` carries no field annotations.
  #[error("unable to inject into target of type \"{type_name}\": it has no injectable fields")]
  InvalidInjectionTarget { type_name: &'static str },

  /// A resolved value does not fit the type of the annotated field.
  #[error("unable to inject \"{id}\" into field \"{field}\": expected a value of type \"{expected}\"")]
  FieldNotAssignable {
    field: &'static str,
    id: String,
    expected: &'static str,
  },

  /// A definition was added after the registry was booted.
  #[error("registry already booted: cannot add definition \"{id}\"")]
  AlreadyBooted { id: String },

  /// A typed accessor found a value of another type.
  #[error("illegal type assertion for service \"{id}\": expected \"{expected}\", found \"{found}\"")]
  TypeMismatch {
    id: String,
    expected: &'static str,
    found: &'static str,
  },
}

/// Why a factory failed to produce an instance.
#[derive(Debug, Error)]
pub enum FactoryFailure {
  /// A plain factory returned nothing.
  #[error("factory returned no value")]
  NoValue,

  /// A fallible or context-aware factory returned an error.
  #[error("{0}")]
  Constructor(#[source] BoxError),
}

impl Error {
  pub(crate) fn factory_failed(id: &str, failure: FactoryFailure) -> Self {
    Error::FactoryFailed {
      id: id.to_owned(),
      source: failure,
    }
  }

  /// Returns the identifier path when this is a circular dependency error.
  pub fn cycle_path(&self) -> Option<&ResolutionPath> {
    match self {
      Error::CircularDependency { path } => Some(path),
      _ => None,
    }
  }
}

/// A specialized `Result` type for `fibre_di` operations.
pub type Result<T, E = Error> = std::result::Result<T, E>;
