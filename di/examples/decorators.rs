use fibre_di::{Definition, Error, Factory, Registry, Value};
use std::sync::Arc;

// 1. The abstraction every caller depends on
trait Storage: Send + Sync {
  fn read(&self, key: &str) -> String;
}

// 2. The real implementation
struct DiskStorage {
  root: String,
}

impl Storage for DiskStorage {
  fn read(&self, key: &str) -> String {
    format!("{}/{}", self.root, key)
  }
}

// 3. A decorator that wraps whatever storage it is given
struct LoggedStorage {
  inner: Arc<dyn Storage>,
}

impl Storage for LoggedStorage {
  fn read(&self, key: &str) -> String {
    println!("[STORAGE]: reading {}", key);
    self.inner.read(key)
  }
}

fn main() -> Result<(), Error> {
  let registry = Registry::new();

  // --- Registration ---
  registry.add(Definition::parameter("storage.root", String::from("/var/data")))?;

  registry.add(Definition::service(
    "storage",
    Factory::contextual(|ctx| {
      let root = ctx.get_as::<String>("storage.root")?;
      let storage: Arc<dyn Storage> = Arc::new(DiskStorage {
        root: (*root).clone(),
      });
      Ok::<_, Error>(Value::new(storage))
    }),
  ))?;

  // The decorator receives the resolved "storage" and takes over its identifier.
  registry.add(Definition::decorator(
    "storage.logged",
    "storage",
    Factory::contextual(|ctx| {
      let inner = ctx
        .decorated_as::<Arc<dyn Storage>>()
        .ok_or("nothing to decorate")?;
      let logged: Arc<dyn Storage> = Arc::new(LoggedStorage {
        inner: (*inner).clone(),
      });
      Ok::<_, &str>(Value::new(logged))
    }),
  ))?;

  // --- Boot and use ---
  registry.boot()?;

  // Asking for "storage" yields the logged version.
  let storage = registry.get_as::<Arc<dyn Storage>>("storage")?;
  println!("Resolved path: {}", storage.read("report.csv"));

  Ok(())
}
