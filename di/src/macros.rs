//! Public macros for ergonomic resolution and field annotation.

/// Resolves an identifier from a registry, panicking if it cannot be resolved.
///
/// `resolve!(registry, "id")` yields a [`Value`](crate::Value);
/// `resolve!(registry, "id" => Type)` yields an `Arc<Type>`.
///
/// # Panics
///
/// Panics if the identifier is unknown, its construction fails, it is part
/// of a cycle, or (in the typed form) it resolves to another type. For a
/// non-panicking version, use `Registry::get` or `Registry::get_as`.
///
/// # Examples
///
/// ```
/// use fibre_di::{resolve, Definition, Factory, Registry};
///
/// let registry = Registry::new();
/// registry.add(Definition::parameter("greeting", String::from("hello"))).unwrap();
/// registry.add(Definition::service("answer", Factory::new(|| 42u32))).unwrap();
///
/// let greeting = resolve!(registry, "greeting" => String);
/// assert_eq!(*greeting, "hello");
///
/// let answer = resolve!(registry, "answer");
/// assert_eq!(answer.downcast_ref::<u32>(), Some(&42));
/// ```
#[macro_export]
macro_rules! resolve {
  ($registry:expr, $id:expr => $type:ty) => {
    $registry
      .get_as::<$type>($id)
      .unwrap_or_else(|err| panic!("Failed to resolve required service '{}': {}", $id, err))
  };

  ($registry:expr, $id:expr) => {
    $registry
      .get($id)
      .unwrap_or_else(|err| panic!("Failed to resolve required service '{}': {}", $id, err))
  };
}

/// Declares a struct whose `#[inject("id")]` fields the registry fills in.
///
/// Annotated fields must be [`Slot`](crate::Slot)s (or any other
/// [`FieldSlot`](crate::FieldSlot)). Other fields are left alone. The
/// generated [`Injectable`](crate::Injectable) impl lists the annotated
/// fields in declaration order.
///
/// # Examples
///
/// ```
/// use fibre_di::{injectable, Definition, Registry, Slot};
///
/// injectable! {
///   pub struct Clock {
///     #[inject("config.time_format")]
///     pub format: Slot<String>,
///     pub ticks: u64,
///   }
/// }
///
/// let registry = Registry::new();
/// registry.add(Definition::parameter("config.time_format", String::from("%H:%M"))).unwrap();
///
/// let clock = Clock { format: Slot::new(), ticks: 0 };
/// registry.inject(&clock).unwrap();
/// assert_eq!(*clock.format.get(), "%H:%M");
/// ```
#[macro_export]
macro_rules! injectable {
  (
    $(#[$meta:meta])*
    $vis:vis struct $name:ident {
      $(
        $(#[inject($id:literal)])?
        $fvis:vis $field:ident : $fty:ty
      ),* $(,)?
    }
  ) => {
    $(#[$meta])*
    $vis struct $name {
      $($fvis $field: $fty,)*
    }

    impl $crate::Injectable for $name {
      fn injection_points(&self) -> ::std::vec::Vec<$crate::InjectionPoint<'_>> {
        #[allow(unused_mut)]
        let mut points = ::std::vec::Vec::new();
        $($(
          points.push($crate::InjectionPoint::new(stringify!($field), $id, &self.$field));
        )?)*
        points
      }
    }
  };
}
