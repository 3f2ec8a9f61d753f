use fibre_di::{injectable, Definition, Factory, Registry, Slot};

struct Mailer {
  host: String,
}

injectable! {
  // Only the annotated fields are touched by the registry.
  struct SignupHandler {
    #[inject("mailer")]
    mailer: Slot<Mailer>,
    #[inject("config.sender")]
    sender: Slot<String>,
    attempts: u32,
  }
}

impl SignupHandler {
  fn new() -> Self {
    Self {
      mailer: Slot::new(),
      sender: Slot::new(),
      attempts: 0,
    }
  }

  fn handle(&self, user: &str) {
    println!(
      "Sending welcome mail to {} from {} via {} (attempt {})",
      user,
      self.sender.get(),
      self.mailer.get().host,
      self.attempts + 1
    );
  }
}

fn main() {
  let registry = Registry::new();
  registry
    .add(Definition::service(
      "mailer",
      Factory::new(|| Mailer {
        host: String::from("smtp.example.org"),
      }),
    ))
    .unwrap();
  registry
    .add(Definition::parameter("config.sender", String::from("hello@example.org")))
    .unwrap();

  // A registered record is injected right after its factory runs.
  registry
    .add(Definition::service("handler", Factory::injectable(SignupHandler::new)))
    .unwrap();
  let handler = registry.get_as::<SignupHandler>("handler").unwrap();
  handler.handle("ada");

  // A record the registry never constructed can still be populated.
  let standalone = SignupHandler::new();
  registry.inject(&standalone).unwrap();
  standalone.handle("grace");

  // Both share the same cached mailer.
  println!(
    "Same mailer: {}",
    std::sync::Arc::ptr_eq(&handler.mailer.get(), &standalone.mailer.get())
  );
}
