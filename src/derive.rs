//! Per-alternative implementations of the standard traits, dispatched on the
//! runtime tag.

use core::{
    cmp::Ordering,
    fmt,
    hash::{Hash, Hasher},
};

use crate::repr::AltList;

/// # Safety
///
/// `clone_at` must initialize the alternative at `tag` in `dst`.
pub unsafe trait AltClone: AltList {
    #[doc(hidden)]
    unsafe fn clone_at(src: *const Self::Repr, dst: *mut Self::Repr, tag: u8);
}

unsafe impl AltClone for () {
    unsafe fn clone_at(_: *const Self::Repr, _: *mut Self::Repr, tag: u8) {
        unreachable!("cloning tag {tag} past the last alternative")
    }
}

unsafe impl<Head: Clone, Tail: AltClone> AltClone for (Head, Tail) {
    unsafe fn clone_at(src: *const Self::Repr, dst: *mut Self::Repr, tag: u8) {
        if tag == 0 {
            unsafe { dst.cast::<Head>().write((*src.cast::<Head>()).clone()) }
        } else {
            unsafe { Tail::clone_at(src.cast(), dst.cast(), tag - 1) }
        }
    }
}

pub trait AltPartialEq: AltList {
    #[doc(hidden)]
    unsafe fn eq_at(a: *const Self::Repr, b: *const Self::Repr, tag: u8) -> bool;
}

impl AltPartialEq for () {
    unsafe fn eq_at(_: *const Self::Repr, _: *const Self::Repr, tag: u8) -> bool {
        unreachable!("comparing tag {tag} past the last alternative")
    }
}

impl<Head: PartialEq, Tail: AltPartialEq> AltPartialEq for (Head, Tail) {
    unsafe fn eq_at(a: *const Self::Repr, b: *const Self::Repr, tag: u8) -> bool {
        if tag == 0 {
            unsafe { *a.cast::<Head>() == *b.cast::<Head>() }
        } else {
            unsafe { Tail::eq_at(a.cast(), b.cast(), tag - 1) }
        }
    }
}

pub trait AltPartialOrd: AltPartialEq {
    #[doc(hidden)]
    unsafe fn partial_cmp_at(a: *const Self::Repr, b: *const Self::Repr, tag: u8) -> Option<Ordering>;
}

impl AltPartialOrd for () {
    unsafe fn partial_cmp_at(_: *const Self::Repr, _: *const Self::Repr, tag: u8) -> Option<Ordering> {
        unreachable!("comparing tag {tag} past the last alternative")
    }
}

impl<Head: PartialOrd, Tail: AltPartialOrd> AltPartialOrd for (Head, Tail) {
    unsafe fn partial_cmp_at(a: *const Self::Repr, b: *const Self::Repr, tag: u8) -> Option<Ordering> {
        if tag == 0 {
            unsafe { (*a.cast::<Head>()).partial_cmp(&*b.cast::<Head>()) }
        } else {
            unsafe { Tail::partial_cmp_at(a.cast(), b.cast(), tag - 1) }
        }
    }
}

pub trait AltOrd: AltPartialOrd {
    #[doc(hidden)]
    unsafe fn cmp_at(a: *const Self::Repr, b: *const Self::Repr, tag: u8) -> Ordering;
}

impl AltOrd for () {
    unsafe fn cmp_at(_: *const Self::Repr, _: *const Self::Repr, tag: u8) -> Ordering {
        unreachable!("comparing tag {tag} past the last alternative")
    }
}

impl<Head: Ord, Tail: AltOrd> AltOrd for (Head, Tail) {
    unsafe fn cmp_at(a: *const Self::Repr, b: *const Self::Repr, tag: u8) -> Ordering {
        if tag == 0 {
            unsafe { (*a.cast::<Head>()).cmp(&*b.cast::<Head>()) }
        } else {
            unsafe { Tail::cmp_at(a.cast(), b.cast(), tag - 1) }
        }
    }
}

pub trait AltHash: AltList {
    #[doc(hidden)]
    unsafe fn hash_at<H: Hasher>(this: *const Self::Repr, tag: u8, state: &mut H);
}

impl AltHash for () {
    unsafe fn hash_at<H: Hasher>(_: *const Self::Repr, tag: u8, _: &mut H) {
        unreachable!("hashing tag {tag} past the last alternative")
    }
}

impl<Head: Hash, Tail: AltHash> AltHash for (Head, Tail) {
    unsafe fn hash_at<H: Hasher>(this: *const Self::Repr, tag: u8, state: &mut H) {
        if tag == 0 {
            unsafe { (*this.cast::<Head>()).hash(state) }
        } else {
            unsafe { Tail::hash_at(this.cast(), tag - 1, state) }
        }
    }
}

pub trait AltDebug: AltList {
    #[doc(hidden)]
    unsafe fn fmt_at(this: *const Self::Repr, tag: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result;
}

impl AltDebug for () {
    unsafe fn fmt_at(_: *const Self::Repr, tag: u8, _: &mut fmt::Formatter<'_>) -> fmt::Result {
        unreachable!("formatting tag {tag} past the last alternative")
    }
}

impl<Head: fmt::Debug, Tail: AltDebug> AltDebug for (Head, Tail) {
    unsafe fn fmt_at(this: *const Self::Repr, tag: u8, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if tag == 0 {
            unsafe { fmt::Debug::fmt(&*this.cast::<Head>(), f) }
        } else {
            unsafe { Tail::fmt_at(this.cast(), tag - 1, f) }
        }
    }
}
