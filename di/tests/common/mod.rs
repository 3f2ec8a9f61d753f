#![allow(dead_code)]

use once_cell::sync::Lazy;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

static TRACING: Lazy<()> = Lazy::new(|| {
  let _ = tracing_subscriber::fmt()
    .with_env_filter(tracing_subscriber::EnvFilter::from_default_env())
    .with_test_writer()
    .try_init();
});

/// Routes library events to the test output. Filter with `RUST_LOG`.
pub fn init_tracing() {
  Lazy::force(&TRACING);
}

// Something that can say its name, and every decorator around it appends its own.
pub trait Named: Send + Sync {
  fn name(&self) -> String;
}

pub struct Plain(pub &'static str);

impl Named for Plain {
  fn name(&self) -> String {
    self.0.to_string()
  }
}

pub struct Wrapped {
  pub inner: Arc<dyn Named>,
  pub suffix: &'static str,
}

impl Named for Wrapped {
  fn name(&self) -> String {
    format!("{}{}", self.inner.name(), self.suffix)
  }
}

/// Counts how often a factory ran.
#[derive(Clone, Default)]
pub struct Calls(Arc<AtomicUsize>);

impl Calls {
  pub fn hit(&self) {
    self.0.fetch_add(1, Ordering::SeqCst);
  }

  pub fn count(&self) -> usize {
    self.0.load(Ordering::SeqCst)
  }
}
