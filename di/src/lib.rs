//! # Fibre DI
//!
//! A definition-driven dependency injection registry for Rust.
//!
//! A [`Registry`] holds named [`Definition`]s and turns them into values on
//! demand. Values are built once and cached, dependency cycles are reported
//! with their full path instead of overflowing the stack, and decorators can
//! wrap a service so that everyone asking for it gets the wrapped version.
//!
//! ## Core Concepts
//!
//! - **Parameter**: a plain value, returned as is.
//! - **Service**: a value built lazily by a [`Factory`] and cached.
//! - **Decorator**: a factory that receives an already resolved service and
//!   replaces it under the original identifier.
//! - **Boot**: eager construction of every decorator, then every service.
//!   Once booted (explicitly, or implicitly by the first lookup) a registry
//!   accepts no new definitions.
//! - **Field injection**: records declared with [`injectable!`] get their
//!   `#[inject("id")]` fields populated with resolved values.
//!
//! ## Quick Start
//!
//! ```
//! use fibre_di::{Definition, Factory, Registry, Value};
//! use std::sync::Arc;
//!
//! trait Greeter: Send + Sync {
//!   fn greet(&self) -> String;
//! }
//!
//! struct EnglishGreeter {
//!   name: String,
//! }
//!
//! impl Greeter for EnglishGreeter {
//!   fn greet(&self) -> String {
//!     format!("Hello, {}!", self.name)
//!   }
//! }
//!
//! struct LoudGreeter {
//!   inner: Arc<dyn Greeter>,
//! }
//!
//! impl Greeter for LoudGreeter {
//!   fn greet(&self) -> String {
//!     self.inner.greet().to_uppercase()
//!   }
//! }
//!
//! let registry = Registry::new();
//! registry.add(Definition::parameter("name", String::from("World"))).unwrap();
//!
//! // Trait objects are stored as `Arc<dyn Trait>` values.
//! registry
//!   .add(Definition::service(
//!     "greeter",
//!     Factory::contextual(|ctx| {
//!       let name = ctx.get_as::<String>("name")?;
//!       let greeter: Arc<dyn Greeter> = Arc::new(EnglishGreeter { name: (*name).clone() });
//!       Ok::<_, fibre_di::Error>(Value::new(greeter))
//!     }),
//!   ))
//!   .unwrap();
//!
//! // The decorator sees the original greeter and replaces it.
//! registry
//!   .add(Definition::decorator(
//!     "greeter.loud",
//!     "greeter",
//!     Factory::contextual(|ctx| {
//!       let inner = ctx.decorated_as::<Arc<dyn Greeter>>().expect("greeter");
//!       let loud: Arc<dyn Greeter> = Arc::new(LoudGreeter { inner: (*inner).clone() });
//!       Ok::<_, fibre_di::Error>(Value::new(loud))
//!     }),
//!   ))
//!   .unwrap();
//!
//! let greeter = registry.get_as::<Arc<dyn Greeter>>("greeter").unwrap();
//! assert_eq!(greeter.greet(), "HELLO, WORLD!");
//! ```

mod builder;
mod definition;
mod error;
mod factory;
mod inject;
mod macros;
mod registry;
mod resolution;
mod value;

pub use builder::RegistryBuilder;
pub use definition::{DecoratorDef, Definition, DefinitionKind, ParameterDef, ServiceDef};
pub use error::{BoxError, Error, FactoryFailure, Result};
pub use factory::{Factory, FactoryContext};
pub use inject::{FieldSlot, Injectable, InjectionPoint, Slot};
pub use registry::Registry;
pub use resolution::{PathNode, ResolutionPath};
pub use value::Value;

pub use tokio_util::sync::CancellationToken;
