//! Build-time validation of the pointer layout this crate depends on.
//!
//! `polybox` re-seats inline payloads by overwriting the address half of a
//! fat pointer while keeping its metadata half. That only works if fat
//! pointers are laid out as (address, metadata), which the unsafe code
//! guidelines specify but the language does not yet formally guarantee.
//! Probe both fat pointer kinds here and fail the build loudly if the
//! assumption ever stops holding.

use std::ptr;

trait Probe {
    fn probe(&self) -> usize {
        0
    }
}

struct Payload(#[allow(dead_code)] usize);

impl Probe for Payload {}

fn layout_broken(kind: &str) -> ! {
    panic!(
        "fat pointer layout for {kind} is not (address, metadata); \
         polybox cannot re-seat inline payloads on this toolchain"
    );
}

fn check_trait_object_layout() {
    #[repr(C)]
    struct Raw {
        addr: *const u8,
        meta: *const u8,
    }

    let boxed = Box::new(Payload(7));
    let addr = Box::into_raw(boxed);
    let fat: *const dyn Probe = addr;

    let raw: Raw = unsafe { ptr::read(ptr::addr_of!(fat).cast()) };
    if !ptr::eq(raw.addr, addr.cast()) {
        layout_broken("trait objects");
    }

    let boxed = unsafe { Box::from_raw(addr) };
    boxed.probe();
}

fn check_slice_layout() {
    #[repr(C)]
    struct Raw {
        addr: *const u8,
        len: usize,
    }

    let array = [1u8, 2, 3];
    let slice: &[u8] = &array;

    let raw: Raw = unsafe { ptr::read(ptr::addr_of!(slice).cast()) };
    if !ptr::eq(raw.addr, slice.as_ptr()) || raw.len != slice.len() {
        layout_broken("slices");
    }
}

fn main() {
    // A host/target layout mismatch or a new fat pointer kind would slip
    // past these probes; they catch the realistic failure mode, which is a
    // toolchain changing the (address, metadata) ordering.
    check_trait_object_layout();
    check_slice_layout();
}
