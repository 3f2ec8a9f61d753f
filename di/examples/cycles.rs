use fibre_di::{Definition, Error, Factory, FactoryContext, Registry, Value};

// Every service asks for the next one while it is being built.
fn needs(next: &'static str) -> Factory {
  Factory::contextual(move |ctx: &FactoryContext<'_>| {
    let dep = ctx.get(next)?;
    Ok::<_, Error>(Value::new(dep))
  })
}

fn main() {
  let registry = Registry::new();
  registry.add(Definition::service("orders", needs("billing"))).unwrap();
  registry.add(Definition::service("billing", needs("customers"))).unwrap();
  registry.add(Definition::service("customers", needs("orders"))).unwrap();

  // Instead of overflowing the stack, the lookup reports the whole loop.
  match registry.get("orders") {
    Ok(_) => println!("Unexpectedly resolved a cyclic graph."),
    Err(err) => {
      println!("Resolution failed: {}", err);
      if let Some(path) = err.cycle_path() {
        println!("Services involved: {:?}", path.ids());
      }
    }
  }
}
