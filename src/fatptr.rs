//! Fat-pointer address surgery.
//!
//! An occupied inline `PolyBox` keeps a fat pointer whose metadata half is
//! live and whose address half is stale (the buffer moves with the
//! container). `repoint` swaps in the current buffer address while leaving
//! the metadata untouched. `build.rs` verifies the (address, metadata)
//! layout this relies on.

/// Returns `meta` with its address half replaced by `addr`.
///
/// The metadata half (vtable pointer, slice length, or nothing for thin
/// pointers) is preserved. The result carries the provenance of `addr`.
pub(crate) fn repoint<M: ?Sized>(mut meta: *const M, addr: *mut u8) -> *mut M {
    // Fat pointers store the address in their first word. Writing a typed
    // pointer rather than a usize keeps the provenance of `addr`.
    unsafe {
        core::ptr::addr_of_mut!(meta).cast::<*mut u8>().write(addr);
    }
    meta.cast_mut()
}

/// A well-aligned, invalid pointer for zero-sized payloads.
#[allow(clippy::as_conversions)]
pub(crate) fn dangling(align: usize) -> *mut u8 {
    align as *mut u8
}
