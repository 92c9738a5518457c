/// Constructs a [`struct@Union`] type from a list of payload types.
///
/// # Examples
///
/// ```rust
/// use tunion::{tag::U1, Union};
///
/// type MyUnion = Union![i32, i32, f64];
/// let u = MyUnion::create::<U1>(42);
/// assert_eq!(u.tag(), 1);
/// ```
#[macro_export]
macro_rules! Union {
    [$($t:ty),* $(,)?] => [$crate::Union::<$crate::T![$($t,)*]>];
}

/// Constructs a type-level cons list from a list of types.
///
/// Used for alternative lists and for the routes of hand-written handlers.
///
/// # Examples
///
/// ```rust
/// use tunion::T;
///
/// type MyList = T![i32, u32, f64];
/// let list: MyList = (42i32, (42u32, (42.0f64, ())));
/// ```
#[macro_export]
macro_rules! T {
    [] => [()];
    [$head:ty $(, $t:ty)* $(,)?] => [($head, $crate::T!($($t,)*))];
}
