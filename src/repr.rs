//! The storage cell underlying the [`Union`] type.
//!
//! # Implementation details
//!
//! The payload lives in a hand-written nested union, so the memory layout is
//! that of a tagged union without a heap allocation:
//!
//! ```rust,no_run
//! # use core::convert::Infallible;
//! # use core::mem::{ManuallyDrop, MaybeUninit};
//!
//! struct Nil(Infallible);
//! #[repr(C)]
//! union Cons<T, Next> {
//!     data: ManuallyDrop<T>,
//!     next: ManuallyDrop<Next>,
//! }
//!
//! // For example only. Not actually defined.
//! struct RawUnion2<T1, T2> {
//!     tag: u8,
//!     cell: MaybeUninit<Cons<T1, Cons<T2, Nil>>>,
//! }
//! ```
//!
//! Every level is `#[repr(C)]`, so every payload starts at offset 0 of the
//! cell. The [`Cell`] itself knows nothing about which payload is alive; that
//! bookkeeping belongs to [`Union`].
//!
//! [`Union`]: crate::Union

use core::{
    convert::Infallible,
    mem::{ManuallyDrop, MaybeUninit},
    ptr,
};

use crate::tag::{Index, UInt, UTerm};

/// The terminator type of the underlying union.
pub struct Nil(#[allow(dead_code)] pub(crate) Infallible);

/// The accumulator type of the underlying union.
#[repr(C)]
pub union Cons<T, U> {
    pub(crate) data: ManuallyDrop<T>,
    pub(crate) next: ManuallyDrop<U>,
}

/// The trait that alternative lists implement to get a tagged union
/// representation.
///
/// # Safety
///
/// `Repr` must be large and aligned enough for every alternative, and
/// `drop_at` must drop exactly the alternative at `tag`.
pub unsafe trait AltList {
    /// The underlying representation of the storage cell.
    type Repr;

    /// The number of alternatives.
    const LEN: usize;

    #[doc(hidden)]
    unsafe fn drop_at(this: *mut Self::Repr, tag: u8);
}

unsafe impl AltList for () {
    type Repr = Nil;
    const LEN: usize = 0;

    unsafe fn drop_at(_: *mut Nil, tag: u8) {
        unreachable!("dropping tag {tag} past the last alternative")
    }
}

unsafe impl<Head, Tail> AltList for (Head, Tail)
where
    Tail: AltList,
{
    type Repr = Cons<Head, Tail::Repr>;
    const LEN: usize = 1 + Tail::LEN;

    unsafe fn drop_at(this: *mut Self::Repr, tag: u8) {
        if tag == 0 {
            unsafe { ptr::drop_in_place(ptr::addr_of_mut!((*this).data).cast::<Head>()) }
        } else {
            unsafe { Tail::drop_at(ptr::addr_of_mut!((*this).next).cast(), tag - 1) }
        }
    }
}

/// The trait that alternative lists implement to locate the payload marked by
/// index `U`.
///
/// # Safety
///
/// `as_ptr` and `as_mut_ptr` must return a pointer into `this` that is valid
/// and aligned for `Payload`.
pub unsafe trait Slot<U: Index>: AltList {
    /// The payload type of the alternative at index `U`.
    type Payload;

    #[doc(hidden)]
    unsafe fn as_ptr(this: *const Self::Repr) -> *const Self::Payload;

    #[doc(hidden)]
    unsafe fn as_mut_ptr(this: *mut Self::Repr) -> *mut Self::Payload;
}

unsafe impl<Head, Tail> Slot<UTerm> for (Head, Tail)
where
    Tail: AltList,
{
    type Payload = Head;

    unsafe fn as_ptr(this: *const Self::Repr) -> *const Head {
        let ptr = unsafe { ptr::addr_of!((*this).data) }.cast::<Head>();
        debug_assert_eq!(ptr.cast(), this);
        ptr
    }

    unsafe fn as_mut_ptr(this: *mut Self::Repr) -> *mut Head {
        let ptr = unsafe { ptr::addr_of_mut!((*this).data) }.cast::<Head>();
        debug_assert_eq!(ptr.cast(), this);
        ptr
    }
}

unsafe impl<Head, Tail, U: Index> Slot<UInt<U>> for (Head, Tail)
where
    Tail: Slot<U>,
{
    type Payload = Tail::Payload;

    unsafe fn as_ptr(this: *const Self::Repr) -> *const Self::Payload {
        let ptr = unsafe { Tail::as_ptr(ptr::addr_of!((*this).next).cast()) };
        debug_assert_eq!(ptr.cast(), this);
        ptr
    }

    unsafe fn as_mut_ptr(this: *mut Self::Repr) -> *mut Self::Payload {
        let ptr = unsafe { Tail::as_mut_ptr(ptr::addr_of_mut!((*this).next).cast()) };
        debug_assert_eq!(ptr.cast(), this);
        ptr
    }
}

/// Raw space able to hold any one alternative of `L` in place.
///
/// A cell is a raw union: it never drops its contents and never checks which
/// alternative it holds. Every accessor except [`construct`] requires the
/// caller to know the live alternative.
///
/// [`construct`]: Cell::construct
pub struct Cell<L: AltList> {
    data: MaybeUninit<L::Repr>,
}

impl<L: AltList> Cell<L> {
    /// An empty cell.
    pub const fn uninit() -> Self {
        Cell {
            data: MaybeUninit::uninit(),
        }
    }

    /// Builds the alternative at `U` in place and returns a reference to it.
    ///
    /// Constructing over a live payload leaks that payload; it is never
    /// dropped twice.
    pub fn construct<U: Index>(&mut self, value: <L as Slot<U>>::Payload) -> &mut <L as Slot<U>>::Payload
    where
        L: Slot<U>,
    {
        unsafe {
            let slot = <L as Slot<U>>::as_mut_ptr(self.data.as_mut_ptr());
            slot.write(value);
            &mut *slot
        }
    }

    /// Destroys the alternative at `U` in place.
    ///
    /// # Safety
    ///
    /// The alternative at `U` must be the one currently alive. The cell is
    /// empty afterwards.
    pub unsafe fn destroy<U: Index>(&mut self)
    where
        L: Slot<U>,
    {
        unsafe { ptr::drop_in_place(<L as Slot<U>>::as_mut_ptr(self.data.as_mut_ptr())) }
    }

    /// Destroys the alternative whose discriminator is `tag`.
    ///
    /// # Safety
    ///
    /// The alternative numbered `tag` must be the one currently alive.
    pub unsafe fn destroy_at(&mut self, tag: u8) {
        debug_assert!(usize::from(tag) < L::LEN);
        unsafe { L::drop_at(self.data.as_mut_ptr(), tag) }
    }

    /// Reinterprets the cell as the payload at `U`.
    ///
    /// # Safety
    ///
    /// The alternative at `U` must be the one currently alive.
    pub unsafe fn raw_get<U: Index>(&self) -> &<L as Slot<U>>::Payload
    where
        L: Slot<U>,
    {
        unsafe { &*<L as Slot<U>>::as_ptr(self.data.as_ptr()) }
    }

    /// Mutable version of [`raw_get`](Cell::raw_get).
    ///
    /// # Safety
    ///
    /// The alternative at `U` must be the one currently alive.
    pub unsafe fn raw_get_mut<U: Index>(&mut self) -> &mut <L as Slot<U>>::Payload
    where
        L: Slot<U>,
    {
        unsafe { &mut *<L as Slot<U>>::as_mut_ptr(self.data.as_mut_ptr()) }
    }

    /// Moves the payload at `U` out, leaving the cell empty.
    ///
    /// # Safety
    ///
    /// The alternative at `U` must be the one currently alive.
    pub unsafe fn take<U: Index>(&mut self) -> <L as Slot<U>>::Payload
    where
        L: Slot<U>,
    {
        unsafe { ptr::read(<L as Slot<U>>::as_ptr(self.data.as_ptr())) }
    }

    pub(crate) fn as_ptr(&self) -> *const L::Repr {
        self.data.as_ptr()
    }

    pub(crate) fn as_mut_ptr(&mut self) -> *mut L::Repr {
        self.data.as_mut_ptr()
    }
}

#[cfg(test)]
mod tests {
    use core::mem;
    use std::{cell::Cell as Counter, rc::Rc, string::String};

    use super::*;
    use crate::{tag::*, T};

    struct Loud(Rc<Counter<usize>>);

    impl Drop for Loud {
        fn drop(&mut self) {
            self.0.set(self.0.get() + 1);
        }
    }

    #[test]
    fn layout_fits_largest() {
        type L = T![u8, u64, [u8; 3]];
        assert_eq!(mem::size_of::<Cell<L>>(), mem::size_of::<u64>());
        assert_eq!(mem::align_of::<Cell<L>>(), mem::align_of::<u64>());
        assert_eq!(<L as AltList>::LEN, 3);
    }

    #[test]
    fn construct_read_destroy() {
        let drops = Rc::new(Counter::new(0));
        let mut cell = Cell::<T![i32, Loud, String]>::uninit();

        *cell.construct::<U0>(7) += 1;
        assert_eq!(unsafe { *cell.raw_get::<U0>() }, 8);

        cell.construct::<U1>(Loud(drops.clone()));
        assert_eq!(drops.get(), 0);
        unsafe { cell.destroy::<U1>() };
        assert_eq!(drops.get(), 1);

        cell.construct::<U1>(Loud(drops.clone()));
        unsafe { cell.destroy_at(1) };
        assert_eq!(drops.get(), 2);
    }

    #[test]
    fn take_moves_out() {
        let mut cell = Cell::<T![i32, String]>::uninit();
        cell.construct::<U1>("cell".into());
        unsafe { cell.raw_get_mut::<U1>().push('!') };
        let s = unsafe { cell.take::<U1>() };
        assert_eq!(s, "cell!");
    }

    #[test]
    fn same_payload_type_distinct_slots() {
        let mut cell = Cell::<T![i32, i32]>::uninit();
        cell.construct::<U1>(5);
        // Both slots alias the same bytes; the index only selects the type.
        assert_eq!(unsafe { *cell.raw_get::<U1>() }, 5);
        assert_eq!(cell.as_ptr().cast::<i32>(), unsafe { cell.raw_get::<U1>() } as *const i32);
    }
}
