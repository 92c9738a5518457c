//! The pattern-match layer.
//!
//! A [`Matcher`] is a [`Combined`] handler bound to the value it will be
//! applied to. Binding the value first lets closure parameters be inferred
//! from the union's payload types, so cases need no annotations:
//!
//! ```rust
//! use tunion::{
//!     tag::{Witness, U0, U1},
//!     Tagged, Union,
//! };
//!
//! type Num = Union![i64, f64, ()];
//!
//! let n = Num::create::<U1>(2.5);
//! let doubled = n
//!     .matcher()
//!     .case(Witness::<U0>::new(), |i| *i as f64 * 2.0)
//!     .case(Witness::<U1>::new(), |f| f * 2.0)
//!     .otherwise(|_| f64::NAN)
//!     .run();
//! assert_eq!(doubled, 5.0);
//! ```
//!
//! Without a default, every alternative needs a case unless the result is
//! `()`:
//!
//! ```rust,compile_fail
//! use tunion::{
//!     tag::{Witness, U0},
//!     Tagged, Union,
//! };
//!
//! let n = <Union![i64, f64]>::create::<U0>(1);
//! let _: i64 = n.matcher().case(Witness::<U0>::new(), |i| *i).run();
//! ```

use crate::{
    combine::{Append, Case, Combined, NoDefault, Otherwise},
    tag::{Index, UTerm, Witness},
    visit::{dispatch, Convention, Declared, Project, Tagged, Walk},
};

/// A pattern match over a value of `V` in calling convention `C`, collecting
/// cases `Cases` and default `D` that all produce `R`.
pub struct Matcher<'a, V, C, Cases, D, R>
where
    V: Tagged,
    C: Convention<'a, V>,
{
    value: C::Value,
    handler: Combined<Cases, D, R>,
}

impl<'a, V, C, R> Matcher<'a, V, C, (), NoDefault, R>
where
    V: Tagged + 'a,
    C: Convention<'a, V>,
{
    pub fn new(value: C::Value) -> Self {
        Matcher {
            value,
            handler: Combined::new(),
        }
    }
}

impl<'a, V, C, Cases, D, R> Matcher<'a, V, C, Cases, D, R>
where
    V: Tagged + 'a,
    C: Convention<'a, V>,
{
    /// The tag witnesses of the declared alternatives.
    pub fn names(&self) -> V::Names
    where
        V: Declared,
    {
        V::NAMES
    }

    /// Adds a case for the alternative at `U`.
    pub fn case<U, F>(self, tag: Witness<U>, f: F) -> Matcher<'a, V, C, Cases::Output, D, R>
    where
        U: Index,
        C: Project<'a, V, U>,
        F: FnOnce(<C as Project<'a, V, U>>::Payload) -> R,
        Cases: Append<Case<U, F>>,
    {
        Matcher {
            value: self.value,
            handler: self.handler.case(tag, f),
        }
    }

    /// Runs the match.
    pub fn run(self) -> R
    where
        V::List: Walk<'a, V, UTerm, C, Combined<Cases, D, R>>,
    {
        dispatch::<V, C, _>(self.value, self.handler)
    }
}

impl<'a, V, C, Cases, R> Matcher<'a, V, C, Cases, NoDefault, R>
where
    V: Tagged + 'a,
    C: Convention<'a, V>,
{
    /// Sets the default, receiving the whole value for every alternative
    /// without a case.
    pub fn otherwise<F>(self, f: F) -> Matcher<'a, V, C, Cases, Otherwise<F>, R>
    where
        F: FnOnce(C::Value) -> R,
    {
        Matcher {
            value: self.value,
            handler: self.handler.otherwise(f),
        }
    }
}
