#![doc = include_str!("../README.md")]
#![no_std]
#![deny(future_incompatible)]
#![deny(rust_2018_idioms)]

#[cfg(test)]
extern crate std;

use core::{
    fmt,
    hash::{Hash, Hasher},
    mem::{self, ManuallyDrop},
};

pub mod combine;
mod derive;
mod error;
mod macros;
pub mod matcher;
pub mod repr;
pub mod tag;
pub mod visit;

pub use tunion_macros::{match_union, tagged_union};

pub use self::{
    derive::{AltClone, AltDebug, AltHash, AltOrd, AltPartialEq, AltPartialOrd},
    error::WrongTag,
    matcher::Matcher,
    visit::{Declared, Tagged},
};
use self::{
    repr::{AltList, Cell, Slot},
    tag::Index,
};

/// The payload type of the alternative at `U` in the list `L`.
pub type Payload<L, U> = <L as Slot<U>>::Payload;

/// A tagged union over the alternative list `L`.
///
/// Exactly one alternative is alive at any time, and it is always the one
/// named by [`tag`](Union::tag). Alternatives are addressed by their
/// [index](tag), so the same payload type may appear more than once.
pub struct Union<L: AltList> {
    tag: u8,
    cell: Cell<L>,
}

impl<L: AltList> Union<L> {
    /// Builds the alternative at `U`.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tunion::{tag::U1, Union};
    ///
    /// let u = <Union![i32, i32]>::create::<U1>(3);
    /// assert!(u.holds::<U1>());
    /// assert_eq!(u.get_ptr::<tunion::tag::U0>(), None);
    /// ```
    pub fn create<U>(value: Payload<L, U>) -> Self
    where
        U: Index,
        L: Slot<U>,
    {
        let mut cell = Cell::uninit();
        cell.construct::<U>(value);
        Union { tag: U::TAG, cell }
    }

    pub fn create_with<U, F>(f: F) -> Self
    where
        U: Index,
        L: Slot<U>,
        F: FnOnce() -> Payload<L, U>,
    {
        Self::create::<U>(f())
    }

    /// Replaces the active alternative with the alternative at `U`.
    ///
    /// The new payload is fully built before the old one is destroyed, so
    /// the union always holds exactly one live payload.
    pub fn emplace<U>(&mut self, value: Payload<L, U>) -> &mut Payload<L, U>
    where
        U: Index,
        L: Slot<U>,
    {
        *self = Self::create::<U>(value);
        unsafe { self.cell.raw_get_mut::<U>() }
    }

    /// Like [`emplace`](Union::emplace), building the payload with `f`.
    ///
    /// If `f` panics the union is left untouched.
    pub fn emplace_with<U, F>(&mut self, f: F) -> &mut Payload<L, U>
    where
        U: Index,
        L: Slot<U>,
        F: FnOnce() -> Payload<L, U>,
    {
        let value = f();
        self.emplace::<U>(value)
    }

    /// Emplaces the alternative at `U`, returning the previous value.
    pub fn replace<U>(&mut self, value: Payload<L, U>) -> Self
    where
        U: Index,
        L: Slot<U>,
    {
        mem::replace(self, Self::create::<U>(value))
    }

    /// The discriminator of the active alternative.
    pub fn tag(&self) -> u8 {
        self.tag
    }

    pub fn holds<U: Index>(&self) -> bool
    where
        L: Slot<U>,
    {
        self.tag == U::TAG
    }

    /// Checked access: the payload at `U` if it is the active one.
    pub fn get_ptr<U: Index>(&self) -> Option<&Payload<L, U>>
    where
        L: Slot<U>,
    {
        self.holds::<U>().then(|| unsafe { self.cell.raw_get::<U>() })
    }

    pub fn get_mut<U: Index>(&mut self) -> Option<&mut Payload<L, U>>
    where
        L: Slot<U>,
    {
        if self.holds::<U>() {
            Some(unsafe { self.cell.raw_get_mut::<U>() })
        } else {
            None
        }
    }

    /// Unchecked access.
    ///
    /// # Safety
    ///
    /// The alternative at `U` must be the active one.
    pub unsafe fn get_unchecked<U: Index>(&self) -> &Payload<L, U>
    where
        L: Slot<U>,
    {
        debug_assert!(self.holds::<U>());
        unsafe { self.cell.raw_get::<U>() }
    }

    /// # Safety
    ///
    /// The alternative at `U` must be the active one.
    pub unsafe fn get_unchecked_mut<U: Index>(&mut self) -> &mut Payload<L, U>
    where
        L: Slot<U>,
    {
        debug_assert!(self.holds::<U>());
        unsafe { self.cell.raw_get_mut::<U>() }
    }

    /// Moves the payload out without checking the tag.
    ///
    /// # Safety
    ///
    /// The alternative at `U` must be the active one.
    pub unsafe fn into_unchecked<U: Index>(self) -> Payload<L, U>
    where
        L: Slot<U>,
    {
        debug_assert!(self.holds::<U>());
        let mut this = ManuallyDrop::new(self);
        unsafe { this.cell.take::<U>() }
    }

    /// Checked move-out. On a mismatch the union comes back in the error.
    ///
    /// # Examples
    ///
    /// ```rust
    /// use tunion::{tag::{U0, U1}, Union};
    ///
    /// let u = <Union![i32, char]>::create::<U1>('x');
    /// let err = u.into_alt::<U0>().unwrap_err();
    /// assert_eq!((err.expected(), err.found()), (0, 1));
    /// assert_eq!(err.into_inner().into_alt::<U1>().ok(), Some('x'));
    /// ```
    pub fn into_alt<U: Index>(self) -> Result<Payload<L, U>, WrongTag<Self>>
    where
        L: Slot<U>,
    {
        if self.holds::<U>() {
            Ok(unsafe { self.into_unchecked::<U>() })
        } else {
            let found = self.tag;
            Err(WrongTag::new(self, U::TAG, found))
        }
    }

    pub fn inspect<U, F>(self, f: F) -> Self
    where
        U: Index,
        L: Slot<U>,
        F: FnOnce(&Payload<L, U>),
    {
        if let Some(value) = self.get_ptr::<U>() {
            f(value);
        }
        self
    }

    pub fn inspect_mut<U, F>(mut self, f: F) -> Self
    where
        U: Index,
        L: Slot<U>,
        F: FnOnce(&mut Payload<L, U>),
    {
        if let Some(value) = self.get_mut::<U>() {
            f(value);
        }
        self
    }
}

impl<L: AltList> Drop for Union<L> {
    fn drop(&mut self) {
        unsafe { self.cell.destroy_at(self.tag) }
    }
}

impl<L: AltClone> Clone for Union<L> {
    fn clone(&self) -> Self {
        let mut cell = Cell::uninit();
        unsafe { L::clone_at(self.cell.as_ptr(), cell.as_mut_ptr(), self.tag) };
        Union { tag: self.tag, cell }
    }

    /// Clones `source` aside first, then swaps it in.
    fn clone_from(&mut self, source: &Self) {
        *self = source.clone();
    }
}

impl<L: AltPartialEq> PartialEq for Union<L> {
    fn eq(&self, other: &Self) -> bool {
        self.tag == other.tag && unsafe { L::eq_at(self.cell.as_ptr(), other.cell.as_ptr(), self.tag) }
    }
}

impl<L: AltPartialEq + Eq> Eq for Union<L> {}

impl<L: AltPartialOrd> PartialOrd for Union<L> {
    fn partial_cmp(&self, other: &Self) -> Option<core::cmp::Ordering> {
        match self.tag.cmp(&other.tag) {
            core::cmp::Ordering::Equal => unsafe {
                L::partial_cmp_at(self.cell.as_ptr(), other.cell.as_ptr(), self.tag)
            },
            other => Some(other),
        }
    }
}

impl<L: AltOrd + Eq> Ord for Union<L> {
    fn cmp(&self, other: &Self) -> core::cmp::Ordering {
        self.tag
            .cmp(&other.tag)
            .then_with(|| unsafe { L::cmp_at(self.cell.as_ptr(), other.cell.as_ptr(), self.tag) })
    }
}

impl<L: AltHash> Hash for Union<L> {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.tag.hash(state);
        unsafe { L::hash_at(self.cell.as_ptr(), self.tag, state) }
    }
}

impl<L: AltDebug> fmt::Debug for Union<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        struct Active<'a, L: AltDebug>(&'a Union<L>);

        impl<L: AltDebug> fmt::Debug for Active<'_, L> {
            fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
                unsafe { L::fmt_at(self.0.cell.as_ptr(), self.0.tag, f) }
            }
        }

        f.debug_tuple("Union").field(&self.tag).field(&Active(self)).finish()
    }
}
