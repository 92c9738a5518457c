//! The dispatch engine.
//!
//! [`dispatch`] applies a handler to the active alternative of a union. For
//! every alternative the handler picks one of three strategies, resolved at
//! compile time and independently per alternative through [`Route`]:
//!
//! 1. [`Specific`]: the handler implements [`VisitTag`] for that
//!    alternative and receives `(Witness<U>, payload)`.
//! 2. [`Whole`]: the handler implements [`VisitWhole`] and receives the union
//!    value itself.
//! 3. [`Skip`]: the handler does nothing for that alternative. This is only
//!    accepted when the handler's output is `()`; for any other output type
//!    it is a compile error, never a made-up value.
//!
//! Hand-written handlers state their routes with [`Routed`]. The routes are
//! followed as written, so an alternative routed to [`Whole`] receives the
//! whole value even if the handler also implements [`VisitTag`] for it.
//! Preferring the tag-specific form is a rule of combined handlers
//! ([`combine::Combined`](crate::combine::Combined)), which compute their
//! routes from their cases:
//!
//! ```rust
//! use tunion::{
//!     tag::{Witness, U0, U1},
//!     visit::{Routed, Specific, VisitTag, VisitWhole, Visitor, Whole},
//!     Tagged, Union, T,
//! };
//!
//! type Shape = Union![u32, (u32, u32), f64];
//!
//! struct Area;
//!
//! impl Visitor for Area {
//!     type Output = f64;
//! }
//!
//! impl Routed for Area {
//!     type Routes = T![Specific, Specific, Whole];
//! }
//!
//! impl VisitTag<U0, &u32> for Area {
//!     fn visit_tag(self, _: Witness<U0>, side: &u32) -> f64 {
//!         f64::from(side * side)
//!     }
//! }
//!
//! impl VisitTag<U1, &(u32, u32)> for Area {
//!     fn visit_tag(self, _: Witness<U1>, &(w, h): &(u32, u32)) -> f64 {
//!         f64::from(w * h)
//!     }
//! }
//!
//! impl VisitWhole<&Shape> for Area {
//!     fn visit_whole(self, shape: &Shape) -> f64 {
//!         shape.get_ptr::<tunion::tag::U2>().copied().unwrap_or_default()
//!     }
//! }
//!
//! assert_eq!(Shape::create::<U1>((2, 3)).visit(Area), 6.0);
//! assert_eq!(Shape::create::<tunion::tag::U2>(1.5).visit(Area), 1.5);
//! ```
//!
//! A handler whose output is not `()` and which leaves an alternative without
//! a strategy does not compile:
//!
//! ```rust,compile_fail
//! use tunion::{
//!     tag::{Witness, U0},
//!     visit::{Routed, Skip, Specific, VisitTag, Visitor},
//!     Tagged, Union, T,
//! };
//!
//! struct First;
//!
//! impl Visitor for First {
//!     type Output = i32;
//! }
//!
//! impl Routed for First {
//!     type Routes = T![Specific, Skip];
//! }
//!
//! impl VisitTag<U0, &i32> for First {
//!     fn visit_tag(self, _: Witness<U0>, v: &i32) -> i32 {
//!         *v
//!     }
//! }
//!
//! let u = <Union![i32, i32]>::create::<U0>(1);
//! let _ = u.visit(First);
//! ```

use crate::{
    combine::NoDefault,
    matcher::Matcher,
    repr::{AltList, Slot},
    tag::{Index, UInt, UTerm, Witness},
    Union,
};

/// A type that is, or transparently wraps, a [`Union`].
///
/// # Safety
///
/// `as_union`, `as_union_mut` and `into_union` must all return the same
/// union, and must not change its tag between a call and the projection
/// that follows it. Dispatch reads the tag through one accessor and the
/// payload through another without checking again.
///
/// Implementing it without `unsafe` is rejected:
///
/// ```compile_fail
/// use tunion::{Tagged, Union, T};
///
/// struct Plain(Union<T![u8]>);
///
/// impl Tagged for Plain {
///     type List = T![u8];
///     fn as_union(&self) -> &Union<T![u8]> { &self.0 }
///     fn as_union_mut(&mut self) -> &mut Union<T![u8]> { &mut self.0 }
///     fn into_union(self) -> Union<T![u8]> { self.0 }
/// }
/// ```
pub unsafe trait Tagged: Sized {
    /// The alternative list of the underlying union.
    type List: AltList;

    fn as_union(&self) -> &Union<Self::List>;

    fn as_union_mut(&mut self) -> &mut Union<Self::List>;

    fn into_union(self) -> Union<Self::List>;

    /// Applies `handler` to the active alternative by shared reference.
    fn visit<'a, H>(&'a self, handler: H) -> H::Output
    where
        Self: 'a,
        H: Visitor,
        Self::List: Walk<'a, Self, UTerm, ByRef, H>,
    {
        dispatch::<Self, ByRef, H>(self, handler)
    }

    /// Applies `handler` to the active alternative by exclusive reference.
    fn visit_mut<'a, H>(&'a mut self, handler: H) -> H::Output
    where
        Self: 'a,
        H: Visitor,
        Self::List: Walk<'a, Self, UTerm, ByMut, H>,
    {
        dispatch::<Self, ByMut, H>(self, handler)
    }

    /// Applies `handler` to the active alternative, moving the payload (or the
    /// whole value) into it.
    fn into_visit<'a, H>(self, handler: H) -> H::Output
    where
        Self: 'a,
        H: Visitor,
        Self::List: Walk<'a, Self, UTerm, ByValue, H>,
    {
        dispatch::<Self, ByValue, H>(self, handler)
    }

    /// Starts a pattern match by shared reference.
    fn matcher<'a, R>(&'a self) -> Matcher<'a, Self, ByRef, (), NoDefault, R>
    where
        Self: 'a,
    {
        Matcher::new(self)
    }

    /// Starts a pattern match by exclusive reference.
    fn matcher_mut<'a, R>(&'a mut self) -> Matcher<'a, Self, ByMut, (), NoDefault, R>
    where
        Self: 'a,
    {
        Matcher::new(self)
    }

    /// Starts a pattern match that consumes the value.
    fn into_matcher<'a, R>(self) -> Matcher<'a, Self, ByValue, (), NoDefault, R>
    where
        Self: 'a,
    {
        Matcher::new(self)
    }
}

unsafe impl<L: AltList> Tagged for Union<L> {
    type List = L;

    fn as_union(&self) -> &Union<L> {
        self
    }

    fn as_union_mut(&mut self) -> &mut Union<L> {
        self
    }

    fn into_union(self) -> Union<L> {
        self
    }
}

/// A [`Tagged`] type produced from a named declaration.
pub trait Declared: Tagged {
    /// The enumeration of the declared alternative names.
    type Tag: Copy + Eq + core::fmt::Debug;

    /// A struct holding one tag witness per declared name.
    type Names: Copy;

    const NAMES: Self::Names;

    fn get_tag(&self) -> Self::Tag;
}

/// A handler with a single result type.
pub trait Visitor {
    type Output;
}

/// The tag-specific strategy for the alternative at `U`, receiving the payload
/// as `P` (`&T`, `&mut T` or `T`).
pub trait VisitTag<U: Index, P>: Visitor {
    fn visit_tag(self, tag: Witness<U>, payload: P) -> Self::Output;
}

/// The whole-value strategy, receiving the union as `V` (`&T`, `&mut T` or
/// `T`).
pub trait VisitWhole<V>: Visitor {
    fn visit_whole(self, value: V) -> Self::Output;
}

/// Visit the payload through [`VisitTag`].
pub struct Specific;

/// Visit the whole value through [`VisitWhole`].
pub struct Whole;

/// Do nothing; requires a `()` output.
pub struct Skip;

/// The strategy a handler uses for the alternative at `Idx`.
pub trait Route<Idx: Index> {
    type Strategy;
}

/// Per-alternative routes for a hand-written handler, one strategy marker per
/// alternative in declaration order.
///
/// Routes are authoritative. Dispatch never inspects which visit traits the
/// handler implements.
pub trait Routed {
    type Routes;
}

#[doc(hidden)]
pub trait RouteAt<Idx> {
    type Strategy;
}

impl<S, Tail> RouteAt<UTerm> for (S, Tail) {
    type Strategy = S;
}

impl<S, Tail: RouteAt<U>, U> RouteAt<UInt<U>> for (S, Tail) {
    type Strategy = Tail::Strategy;
}

impl<H: Routed, Idx: Index> Route<Idx> for H
where
    H::Routes: RouteAt<Idx>,
{
    type Strategy = <H::Routes as RouteAt<Idx>>::Strategy;
}

/// The output type of handlers that may leave alternatives unhandled.
#[diagnostic::on_unimplemented(
    message = "non-exhaustive dispatch: an alternative has no handler and the result type `{Self}` is not `()`",
    label = "no case covers every alternative",
    note = "add a case for every alternative or supply a default"
)]
pub trait Unit {
    fn unit() -> Self;
}

impl Unit for () {
    fn unit() {}
}

/// Calling conventions: how the value and its payload reach the handler.
pub trait Convention<'a, V: Tagged + 'a> {
    /// The form the whole value takes.
    type Value;

    fn tag(value: &Self::Value) -> u8;
}

/// Payload projection of a [`Convention`] for the alternative at `U`.
pub trait Project<'a, V: Tagged + 'a, U: Index>: Convention<'a, V> {
    /// The form the payload takes.
    type Payload;

    /// # Safety
    ///
    /// The alternative at `U` must be the active one.
    unsafe fn project(value: Self::Value) -> Self::Payload;
}

/// By shared reference.
pub struct ByRef;

/// By exclusive reference.
pub struct ByMut;

/// By value.
pub struct ByValue;

impl<'a, V: Tagged + 'a> Convention<'a, V> for ByRef {
    type Value = &'a V;

    fn tag(value: &&'a V) -> u8 {
        value.as_union().tag()
    }
}

impl<'a, V, U> Project<'a, V, U> for ByRef
where
    V: Tagged + 'a,
    U: Index,
    V::List: Slot<U>,
    <V::List as Slot<U>>::Payload: 'a,
{
    type Payload = &'a <V::List as Slot<U>>::Payload;

    unsafe fn project(value: &'a V) -> Self::Payload {
        unsafe { value.as_union().get_unchecked::<U>() }
    }
}

impl<'a, V: Tagged + 'a> Convention<'a, V> for ByMut {
    type Value = &'a mut V;

    fn tag(value: &&'a mut V) -> u8 {
        value.as_union().tag()
    }
}

impl<'a, V, U> Project<'a, V, U> for ByMut
where
    V: Tagged + 'a,
    U: Index,
    V::List: Slot<U>,
    <V::List as Slot<U>>::Payload: 'a,
{
    type Payload = &'a mut <V::List as Slot<U>>::Payload;

    unsafe fn project(value: &'a mut V) -> Self::Payload {
        unsafe { value.as_union_mut().get_unchecked_mut::<U>() }
    }
}

impl<'a, V: Tagged + 'a> Convention<'a, V> for ByValue {
    type Value = V;

    fn tag(value: &V) -> u8 {
        value.as_union().tag()
    }
}

impl<'a, V, U> Project<'a, V, U> for ByValue
where
    V: Tagged + 'a,
    U: Index,
    V::List: Slot<U>,
{
    type Payload = <V::List as Slot<U>>::Payload;

    unsafe fn project(value: V) -> Self::Payload {
        unsafe { value.into_union().into_unchecked::<U>() }
    }
}

/// Executes one strategy for the alternative at `U`.
pub trait Apply<'a, V: Tagged + 'a, U: Index, C: Convention<'a, V>, H: Visitor> {
    /// # Safety
    ///
    /// The alternative at `U` must be the active one.
    unsafe fn apply(value: C::Value, handler: H) -> H::Output;
}

impl<'a, V, U, C, H> Apply<'a, V, U, C, H> for Specific
where
    V: Tagged + 'a,
    U: Index,
    C: Project<'a, V, U>,
    H: VisitTag<U, <C as Project<'a, V, U>>::Payload>,
{
    unsafe fn apply(value: <C as Convention<'a, V>>::Value, handler: H) -> H::Output {
        let payload = unsafe { <C as Project<'a, V, U>>::project(value) };
        handler.visit_tag(Witness::new(), payload)
    }
}

impl<'a, V, U, C, H> Apply<'a, V, U, C, H> for Whole
where
    V: Tagged + 'a,
    U: Index,
    C: Convention<'a, V>,
    H: VisitWhole<<C as Convention<'a, V>>::Value>,
{
    unsafe fn apply(value: <C as Convention<'a, V>>::Value, handler: H) -> H::Output {
        handler.visit_whole(value)
    }
}

impl<'a, V, U, C, H> Apply<'a, V, U, C, H> for Skip
where
    V: Tagged + 'a,
    U: Index,
    C: Convention<'a, V>,
    H: Visitor,
    H::Output: Unit,
{
    unsafe fn apply(value: <C as Convention<'a, V>>::Value, handler: H) -> H::Output {
        drop(value);
        drop(handler);
        <H::Output as Unit>::unit()
    }
}

/// The per-tag dispatch table, walked over the alternative list starting at
/// index `Idx`.
pub trait Walk<'a, V: Tagged + 'a, Idx: Index, C: Convention<'a, V>, H: Visitor> {
    /// # Safety
    ///
    /// `tag` must be the discriminator of the active alternative of `value`.
    unsafe fn walk(tag: u8, value: C::Value, handler: H) -> H::Output;
}

impl<'a, V, Idx, C, H> Walk<'a, V, Idx, C, H> for ()
where
    V: Tagged + 'a,
    Idx: Index,
    C: Convention<'a, V>,
    H: Visitor,
{
    unsafe fn walk(tag: u8, _: C::Value, _: H) -> H::Output {
        unreachable!("dispatching tag {tag} past the last alternative")
    }
}

impl<'a, V, Idx, C, H, Head, Tail> Walk<'a, V, Idx, C, H> for (Head, Tail)
where
    V: Tagged + 'a,
    Idx: Index,
    C: Convention<'a, V>,
    H: Visitor + Route<Idx>,
    <H as Route<Idx>>::Strategy: Apply<'a, V, Idx, C, H>,
    Tail: Walk<'a, V, UInt<Idx>, C, H>,
{
    unsafe fn walk(tag: u8, value: C::Value, handler: H) -> H::Output {
        if tag == Idx::TAG {
            unsafe { <<H as Route<Idx>>::Strategy as Apply<'a, V, Idx, C, H>>::apply(value, handler) }
        } else {
            unsafe { Tail::walk(tag, value, handler) }
        }
    }
}

/// Applies `handler` to the active alternative of `value` under the calling
/// convention `C`.
pub fn dispatch<'a, V, C, H>(value: C::Value, handler: H) -> H::Output
where
    V: Tagged + 'a,
    C: Convention<'a, V>,
    H: Visitor,
    V::List: Walk<'a, V, UTerm, C, H>,
{
    let tag = C::tag(&value);
    debug_assert!(usize::from(tag) < <V::List as AltList>::LEN);
    unsafe { <V::List as Walk<'a, V, UTerm, C, H>>::walk(tag, value, handler) }
}

#[cfg(test)]
mod tests {
    use std::{
        format,
        string::{String, ToString},
        vec::Vec,
    };

    use super::*;
    use crate::{tag::*, T};

    type L = T![i32, i32, String];

    /// Prefers the tag-specific strategy for the first two alternatives even
    /// though it also accepts the whole value.
    struct Describe;

    impl Visitor for Describe {
        type Output = String;
    }

    impl Routed for Describe {
        type Routes = T![Specific, Specific, Whole];
    }

    impl VisitTag<U0, &i32> for Describe {
        fn visit_tag(self, _: Witness<U0>, v: &i32) -> String {
            format!("index {v}")
        }
    }

    impl VisitTag<U1, &i32> for Describe {
        fn visit_tag(self, _: Witness<U1>, v: &i32) -> String {
            format!("value {v}")
        }
    }

    impl VisitWhole<&Union<L>> for Describe {
        fn visit_whole(self, u: &Union<L>) -> String {
            format!("tag {}", u.tag())
        }
    }

    #[test]
    fn same_payload_type_dispatches_by_tag() {
        assert_eq!(Union::<L>::create::<U0>(3).visit(Describe), "index 3");
        assert_eq!(Union::<L>::create::<U1>(3).visit(Describe), "value 3");
        assert_eq!(Union::<L>::create::<U2>("x".to_string()).visit(Describe), "tag 2");
    }

    struct Bump<'a>(&'a mut Vec<u8>);

    impl Visitor for Bump<'_> {
        type Output = ();
    }

    impl Routed for Bump<'_> {
        type Routes = T![Specific, Skip, Whole];
    }

    impl VisitTag<U0, &mut i32> for Bump<'_> {
        fn visit_tag(self, w: Witness<U0>, v: &mut i32) {
            *v += 1;
            self.0.push(w.tag());
        }
    }

    impl VisitWhole<&mut Union<L>> for Bump<'_> {
        fn visit_whole(self, u: &mut Union<L>) {
            u.emplace::<U1>(-1);
            self.0.push(2);
        }
    }

    #[test]
    fn unit_output_may_skip() {
        let mut log = Vec::new();

        let mut u = Union::<L>::create::<U0>(1);
        u.visit_mut(Bump(&mut log));
        assert_eq!(u.get_ptr::<U0>(), Some(&2));

        let mut u = Union::<L>::create::<U1>(1);
        u.visit_mut(Bump(&mut log));
        assert_eq!(u.get_ptr::<U1>(), Some(&1));

        let mut u = Union::<L>::create::<U2>(String::new());
        u.visit_mut(Bump(&mut log));
        assert_eq!(u.get_ptr::<U1>(), Some(&-1));

        assert_eq!(log, [0, 2]);
    }

    struct Consume;

    impl Visitor for Consume {
        type Output = String;
    }

    impl Routed for Consume {
        type Routes = T![Whole, Whole, Specific];
    }

    impl VisitTag<U2, String> for Consume {
        fn visit_tag(self, _: Witness<U2>, mut s: String) -> String {
            s.push('!');
            s
        }
    }

    impl VisitWhole<Union<L>> for Consume {
        fn visit_whole(self, u: Union<L>) -> String {
            u.tag().to_string()
        }
    }

    #[test]
    fn by_value_moves_payload() {
        assert_eq!(Union::<L>::create::<U2>("hey".to_string()).into_visit(Consume), "hey!");
        assert_eq!(Union::<L>::create::<U1>(0).into_visit(Consume), "1");
    }

    /// Implements both forms for the first alternative but routes it whole.
    struct Pinned;

    impl Visitor for Pinned {
        type Output = &'static str;
    }

    impl Routed for Pinned {
        type Routes = T![Whole, Whole, Whole];
    }

    impl VisitTag<U0, &i32> for Pinned {
        fn visit_tag(self, _: Witness<U0>, _: &i32) -> &'static str {
            "specific"
        }
    }

    impl VisitWhole<&Union<L>> for Pinned {
        fn visit_whole(self, _: &Union<L>) -> &'static str {
            "whole"
        }
    }

    #[test]
    fn routes_are_followed_as_written() {
        assert_eq!(Union::<L>::create::<U0>(1).visit(Pinned), "whole");
        assert_eq!(Union::<L>::create::<U1>(1).visit(Pinned), "whole");
    }

    struct Wrapped(Union<L>);

    unsafe impl Tagged for Wrapped {
        type List = L;

        fn as_union(&self) -> &Union<L> {
            &self.0
        }

        fn as_union_mut(&mut self) -> &mut Union<L> {
            &mut self.0
        }

        fn into_union(self) -> Union<L> {
            self.0
        }
    }

    struct Label;

    impl Visitor for Label {
        type Output = String;
    }

    impl Routed for Label {
        type Routes = T![Specific, Whole, Specific];
    }

    impl VisitTag<U0, &i32> for Label {
        fn visit_tag(self, _: Witness<U0>, v: &i32) -> String {
            format!("index {v}")
        }
    }

    impl VisitTag<U2, &String> for Label {
        fn visit_tag(self, _: Witness<U2>, s: &String) -> String {
            s.clone()
        }
    }

    impl VisitWhole<&Wrapped> for Label {
        fn visit_whole(self, w: &Wrapped) -> String {
            format!("wrapped {}", w.0.tag())
        }
    }

    #[test]
    fn wrapper_dispatches_through_its_union() {
        assert_eq!(Wrapped(Union::create::<U0>(4)).visit(Label), "index 4");
        assert_eq!(Wrapped(Union::create::<U1>(4)).visit(Label), "wrapped 1");
        assert_eq!(Wrapped(Union::create::<U2>("w".to_string())).visit(Label), "w");
    }
}
