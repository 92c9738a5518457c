//! Type-level indices naming the alternatives of a [`Union`].
//!
//! An alternative is identified by its position in the declaration, encoded
//! as a Peano number: [`UTerm`] is the first alternative, `UInt<UTerm>` the
//! second, and so on. Keying by position rather than by payload type is what
//! lets the same payload type appear under several names.
//!
//! [`Union`]: crate::Union

use core::{fmt, marker::PhantomData};

/// The index of the first alternative.
pub struct UTerm;

/// The index right after `U`.
pub struct UInt<U>(PhantomData<U>);

/// A type-level alternative index.
pub trait Index: 'static {
    /// The runtime discriminator of the alternative at this index.
    const TAG: u8;
}

impl Index for UTerm {
    const TAG: u8 = 0;
}

impl<U: Index> Index for UInt<U> {
    const TAG: u8 = 1 + U::TAG;
}

pub type U0 = UTerm;
pub type U1 = UInt<U0>;
pub type U2 = UInt<U1>;
pub type U3 = UInt<U2>;
pub type U4 = UInt<U3>;
pub type U5 = UInt<U4>;
pub type U6 = UInt<U5>;
pub type U7 = UInt<U6>;
pub type U8 = UInt<U7>;
pub type U9 = UInt<U8>;

pub type U10 = UInt<U9>;
pub type U11 = UInt<U10>;
pub type U12 = UInt<U11>;
pub type U13 = UInt<U12>;
pub type U14 = UInt<U13>;
pub type U15 = UInt<U14>;

/// A type-level boolean.
pub trait Bit {
    const VALUE: bool;
}

pub struct B0;
pub struct B1;

impl Bit for B0 {
    const VALUE: bool = false;
}

impl Bit for B1 {
    const VALUE: bool = true;
}

/// Type-level disjunction.
pub trait Or<B: Bit>: Bit {
    type Output: Bit;
}

impl<B: Bit> Or<B> for B0 {
    type Output = B;
}

impl<B: Bit> Or<B> for B1 {
    type Output = B1;
}

/// Type-level index equality: `Output` is [`B1`] iff `Self` and `B` name the
/// same alternative.
pub trait Same<B> {
    type Output: Bit;
}

impl Same<UTerm> for UTerm {
    type Output = B1;
}

impl<B> Same<UInt<B>> for UTerm {
    type Output = B0;
}

impl<A> Same<UTerm> for UInt<A> {
    type Output = B0;
}

impl<A: Same<B>, B> Same<UInt<B>> for UInt<A> {
    type Output = <A as Same<B>>::Output;
}

/// A zero-sized token standing for the single alternative at index `U`.
///
/// Handlers receive a witness alongside the payload so that one handler type
/// can offer different logic per alternative, even when several alternatives
/// share a payload type.
///
/// # Examples
///
/// ```rust
/// use tunion::tag::{Witness, U2};
///
/// let w = Witness::<U2>::new();
/// assert_eq!(w.tag(), 2);
/// assert_eq!(core::mem::size_of_val(&w), 0);
/// ```
pub struct Witness<U>(PhantomData<fn() -> U>);

impl<U: Index> Witness<U> {
    pub const fn new() -> Self {
        Witness(PhantomData)
    }

    pub const fn tag(self) -> u8 {
        U::TAG
    }
}

impl<U: Index> Default for Witness<U> {
    fn default() -> Self {
        Self::new()
    }
}

impl<U> Clone for Witness<U> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<U> Copy for Witness<U> {}

impl<U: Index> fmt::Debug for Witness<U> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "Witness<{}>", U::TAG)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn same<A: Same<B>, B>() -> bool {
        <A as Same<B>>::Output::VALUE
    }

    fn or<A: Or<B>, B: Bit>() -> bool {
        <A as Or<B>>::Output::VALUE
    }

    #[test]
    fn tags_count_up() {
        assert_eq!(U0::TAG, 0);
        assert_eq!(U1::TAG, 1);
        assert_eq!(U9::TAG, 9);
        assert_eq!(U15::TAG, 15);
    }

    #[test]
    fn index_equality() {
        assert!(same::<U0, U0>());
        assert!(same::<U7, U7>());
        assert!(!same::<U0, U1>());
        assert!(!same::<U3, U2>());
        assert!(!same::<U2, U12>());
    }

    #[test]
    fn disjunction() {
        assert!(!or::<B0, B0>());
        assert!(or::<B0, B1>());
        assert!(or::<B1, B0>());
        assert!(or::<B1, B1>());
    }
}
