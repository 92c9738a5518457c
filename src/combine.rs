//! Combined handlers: one dispatchable object assembled from single-case
//! handlers plus an optional default.
//!
//! A [`Combined`] is independent of any union type. Its route for the
//! alternative at `Idx` is computed by looking `Idx` up in the case list:
//!
//! * a case for `Idx` exists: [`Specific`], and the first declared case wins;
//! * otherwise, with an [`Otherwise`] default: [`Whole`];
//! * otherwise: [`Skip`], which only compiles for a `()` result.
//!
//! ```rust
//! use tunion::{
//!     combine::Combined,
//!     tag::{Witness, U0, U2},
//!     Tagged, Union,
//! };
//!
//! type Token = Union![u32, char, &'static str];
//!
//! let h = || {
//!     Combined::<_, _, usize>::new()
//!         .case(Witness::<U0>::new(), |n: &u32| *n as usize)
//!         .case(Witness::<U2>::new(), |s: &&str| s.len())
//!         .otherwise(|_: &Token| 0)
//! };
//!
//! assert_eq!(Token::create::<U0>(7).visit(h()), 7);
//! assert_eq!(Token::create::<U2>("four").visit(h()), 4);
//! assert_eq!(Token::create::<tunion::tag::U1>('c').visit(h()), 0);
//! ```

use core::marker::PhantomData;

use crate::{
    tag::{Bit, Index, Or, Same, Witness, B0, B1},
    visit::{Route, Skip, Specific, VisitTag, VisitWhole, Visitor, Whole},
};

/// A handler for the single alternative at `U`.
pub struct Case<U, F> {
    f: F,
    _tag: PhantomData<fn() -> U>,
}

impl<U: Index, F> Case<U, F> {
    pub fn new(_: Witness<U>, f: F) -> Self {
        Case { f, _tag: PhantomData }
    }
}

/// The default handler, receiving the whole value.
pub struct Otherwise<F>(F);

/// The absence of a default handler.
pub struct NoDefault;

/// A handler combining a case list `C`, a default `D` and a result type `R`.
pub struct Combined<C, D, R> {
    cases: C,
    default: D,
    _output: PhantomData<fn() -> R>,
}

impl<R> Combined<(), NoDefault, R> {
    pub fn new() -> Self {
        Combined {
            cases: (),
            default: NoDefault,
            _output: PhantomData,
        }
    }
}

impl<R> Default for Combined<(), NoDefault, R> {
    fn default() -> Self {
        Self::new()
    }
}

impl<C, D, R> Combined<C, D, R> {
    /// Appends a handler for the alternative at `U`.
    pub fn case<U: Index, F>(self, tag: Witness<U>, f: F) -> Combined<C::Output, D, R>
    where
        C: Append<Case<U, F>>,
    {
        Combined {
            cases: self.cases.append(Case::new(tag, f)),
            default: self.default,
            _output: PhantomData,
        }
    }
}

impl<C, R> Combined<C, NoDefault, R> {
    /// Sets the default handler.
    pub fn otherwise<F>(self, f: F) -> Combined<C, Otherwise<F>, R> {
        Combined {
            cases: self.cases,
            default: Otherwise(f),
            _output: PhantomData,
        }
    }
}

impl<C, D, R> Visitor for Combined<C, D, R> {
    type Output = R;
}

impl<C, D, R, U, P> VisitTag<U, P> for Combined<C, D, R>
where
    U: Index,
    C: CallCase<U, P, R>,
{
    fn visit_tag(self, _: Witness<U>, payload: P) -> R {
        self.cases.call_case(payload)
    }
}

impl<C, F, R, V> VisitWhole<V> for Combined<C, Otherwise<F>, R>
where
    F: FnOnce(V) -> R,
{
    fn visit_whole(self, value: V) -> R {
        (self.default.0)(value)
    }
}

impl<C, D, R, Idx> Route<Idx> for Combined<C, D, R>
where
    Idx: Index,
    C: Find<Idx>,
    D: Fallback<<C as Find<Idx>>::Found>,
{
    type Strategy = <D as Fallback<<C as Find<Idx>>::Found>>::Strategy;
}

/// Appends `X` to the end of a cons list.
pub trait Append<X> {
    type Output;

    fn append(self, x: X) -> Self::Output;
}

impl<X> Append<X> for () {
    type Output = (X, ());

    fn append(self, x: X) -> (X, ()) {
        (x, ())
    }
}

impl<Head, Tail: Append<X>, X> Append<X> for (Head, Tail) {
    type Output = (Head, Tail::Output);

    fn append(self, x: X) -> Self::Output {
        (self.0, self.1.append(x))
    }
}

/// Whether a case list has a case for `Idx`.
pub trait Find<Idx> {
    type Found: Bit;
}

impl<Idx> Find<Idx> for () {
    type Found = B0;
}

impl<U, F, Tail, Idx> Find<Idx> for (Case<U, F>, Tail)
where
    U: Same<Idx>,
    Tail: Find<Idx>,
    <U as Same<Idx>>::Output: Or<<Tail as Find<Idx>>::Found>,
{
    type Found = <<U as Same<Idx>>::Output as Or<<Tail as Find<Idx>>::Found>>::Output;
}

/// The strategy of the default `Self`, given whether a case was found.
pub trait Fallback<Found> {
    type Strategy;
}

impl<D> Fallback<B1> for D {
    type Strategy = Specific;
}

impl<F> Fallback<B0> for Otherwise<F> {
    type Strategy = Whole;
}

impl Fallback<B0> for NoDefault {
    type Strategy = Skip;
}

/// Calls the first case of a case list handling `Idx`.
pub trait CallCase<Idx, P, R> {
    fn call_case(self, payload: P) -> R;
}

impl<U, F, Tail, Idx, P, R> CallCase<Idx, P, R> for (Case<U, F>, Tail)
where
    U: Same<Idx>,
    Self: CallAt<<U as Same<Idx>>::Output, Idx, P, R>,
{
    fn call_case(self, payload: P) -> R {
        <Self as CallAt<<U as Same<Idx>>::Output, Idx, P, R>>::call_at(self, payload)
    }
}

#[doc(hidden)]
pub trait CallAt<B, Idx, P, R> {
    fn call_at(self, payload: P) -> R;
}

impl<U, F, Tail, Idx, P, R> CallAt<B1, Idx, P, R> for (Case<U, F>, Tail)
where
    F: FnOnce(P) -> R,
{
    fn call_at(self, payload: P) -> R {
        (self.0.f)(payload)
    }
}

impl<U, F, Tail, Idx, P, R> CallAt<B0, Idx, P, R> for (Case<U, F>, Tail)
where
    Tail: CallCase<Idx, P, R>,
{
    fn call_at(self, payload: P) -> R {
        self.1.call_case(payload)
    }
}

#[cfg(test)]
mod tests {
    use std::{string::String, vec::Vec};

    use super::*;
    use crate::{tag::*, Tagged, Union, T};

    type L = T![i32, i32, String];

    fn found<C: Find<Idx>, Idx>() -> bool {
        <C::Found as Bit>::VALUE
    }

    #[test]
    fn lookup_by_index() {
        type Cases = T![Case<U0, ()>, Case<U2, ()>];
        assert!(found::<Cases, U0>());
        assert!(!found::<Cases, U1>());
        assert!(found::<Cases, U2>());
        assert!(!found::<(), U0>());
    }

    #[test]
    fn first_declared_case_wins() {
        let h = Combined::<_, _, &str>::new()
            .case(Witness::<U1>::new(), |_: &i32| "first")
            .case(Witness::<U1>::new(), |_: &i32| "second")
            .otherwise(|_: &Union<L>| "default");

        assert_eq!(Union::<L>::create::<U1>(0).visit(h), "first");
    }

    #[test]
    fn case_preferred_over_default() {
        let h = || {
            Combined::<_, _, i32>::new()
                .case(Witness::<U0>::new(), |v: &i32| *v)
                .otherwise(|u: &Union<L>| -i32::from(u.tag()))
        };

        assert_eq!(Union::<L>::create::<U0>(10).visit(h()), 10);
        assert_eq!(Union::<L>::create::<U1>(10).visit(h()), -1);
        assert_eq!(Union::<L>::create::<U2>(String::new()).visit(h()), -2);
    }

    #[test]
    fn unit_result_without_default() {
        let mut seen = Vec::new();
        for u in [Union::<L>::create::<U0>(1), Union::<L>::create::<U1>(2)] {
            u.into_visit(Combined::<_, _, ()>::new().case(Witness::<U1>::new(), |v: i32| seen.push(v)));
        }
        assert_eq!(seen, [2]);
    }
}
