//! Per-type operation tables for clone-capable policies.
//!
//! Destruction and access ride the payload's native vtable; the only
//! operations a trait object cannot express are cloning the concrete type,
//! so those two live here. One table is built per concrete payload type,
//! promoted to `&'static`, and shared by every container holding that type.

use core::alloc::Layout;
use core::mem;

#[cfg(not(feature = "std"))]
use alloc::alloc::{alloc, handle_alloc_error};
#[cfg(feature = "std")]
use std::alloc::{alloc, handle_alloc_error};

use crate::fatptr;

/// Type-erased clone operations for one concrete payload type.
///
/// Not part of the public API; only the constructor macros name this type.
#[doc(hidden)]
pub struct CloneTable {
    clone_into: unsafe fn(*const u8, *mut u8),
    heap_clone: unsafe fn(*const u8) -> *mut u8,
}

impl CloneTable {
    /// Returns the table for payload type `U`.
    pub(crate) const fn of<U: Clone>() -> &'static Self {
        const {
            &Self {
                clone_into: clone_into::<U>,
                heap_clone: heap_clone::<U>,
            }
        }
    }

    /// Clone-constructs the payload behind `src` into the buffer at `dst`.
    ///
    /// May panic (a payload `Clone` is the one fallible table operation);
    /// on panic, nothing has been written to `dst`.
    ///
    /// # Safety
    ///
    /// `src` must point to a live value of the table's payload type. `dst`
    /// must be valid for writes of that type, properly aligned, and must
    /// not overlap `src`.
    pub(crate) unsafe fn clone_into(&self, src: *const u8, dst: *mut u8) {
        unsafe { (self.clone_into)(src, dst) }
    }

    /// Clones the payload behind `src` into a freshly allocated heap block.
    ///
    /// The clone runs before the allocation, so a panicking `Clone` leaks
    /// nothing. Zero-sized payloads get a dangling, aligned pointer and no
    /// allocation.
    ///
    /// # Safety
    ///
    /// `src` must point to a live value of the table's payload type.
    pub(crate) unsafe fn heap_clone(&self, src: *const u8) -> *mut u8 {
        unsafe { (self.heap_clone)(src) }
    }
}

unsafe fn clone_into<U: Clone>(src: *const u8, dst: *mut u8) {
    let copy = unsafe { &*src.cast::<U>() }.clone();
    unsafe { dst.cast::<U>().write(copy) };
}

unsafe fn heap_clone<U: Clone>(src: *const u8) -> *mut u8 {
    let copy = unsafe { &*src.cast::<U>() }.clone();

    let layout = Layout::new::<U>();
    if layout.size() == 0 {
        mem::forget(copy);
        return fatptr::dangling(layout.align());
    }

    let block = unsafe { alloc(layout) };
    if block.is_null() {
        handle_alloc_error(layout);
    }
    unsafe { block.cast::<U>().write(copy) };
    block
}

#[cfg(test)]
mod tests {
    use super::*;

    #[cfg(not(feature = "std"))]
    use alloc::alloc::dealloc;
    #[cfg(feature = "std")]
    use std::alloc::dealloc;

    #[test]
    fn tables_are_shared_per_type() {
        let a: *const CloneTable = CloneTable::of::<u32>();
        let b: *const CloneTable = CloneTable::of::<u32>();
        assert!(core::ptr::eq(a, b));
    }

    #[test]
    fn heap_clone_round_trips() {
        let table = CloneTable::of::<alloc::string::String>();
        let original = alloc::string::String::from("payload");

        let block = unsafe { table.heap_clone(core::ptr::addr_of!(original).cast()) };
        let clone = unsafe { block.cast::<alloc::string::String>().read() };
        assert_eq!(clone, "payload");
        drop(clone);

        unsafe { dealloc(block, Layout::new::<alloc::string::String>()) };
    }

    #[test]
    fn zero_sized_heap_clone_does_not_allocate_garbage() {
        struct Zst;
        impl Clone for Zst {
            fn clone(&self) -> Self {
                Zst
            }
        }

        let table = CloneTable::of::<Zst>();
        let src = Zst;
        let block = unsafe { table.heap_clone(core::ptr::addr_of!(src).cast()) };
        assert!(!block.is_null());
    }
}
