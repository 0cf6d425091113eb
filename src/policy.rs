//! Capability policies.
//!
//! A [`PolyBox`](crate::PolyBox) is parameterized by a policy choosing three
//! independent capabilities, fixed for the container type:
//!
//! - **movable** — the payload may be transferred out ([`take`]); without it
//!   the container is `!Unpin` and offers pinned access instead.
//! - **cloneable** — the container is `Clone`; payload types must then be
//!   `Clone` themselves. Cloneable implies movable.
//! - **heap fallback** — payloads that do not fit the inline buffer go to a
//!   dedicated heap block; without it, an oversized payload is a build
//!   error.
//!
//! The six markers here are the meaningful combinations. Capability traits
//! ([`Movable`], [`Cloneable`], [`HeapFallback`], [`Anchored`]) gate the
//! corresponding API surface, so a missing capability is a compile error at
//! the call site rather than anything checked at run time.
//!
//! [`take`]: crate::PolyBox::take

use core::marker::PhantomPinned;

use crate::table::CloneTable;

mod sealed {
    pub trait Sealed {}

    impl Sealed for super::Pinned {}
    impl Sealed for super::PinnedHeap {}
    impl Sealed for super::Unique {}
    impl Sealed for super::UniqueHeap {}
    impl Sealed for super::Value {}
    impl Sealed for super::ValueHeap {}
}

/// A capability selection for [`PolyBox`](crate::PolyBox).
///
/// Sealed; the six policy types in this module are the only implementors.
pub trait Policy: sealed::Sealed + 'static {
    /// Whether the payload may be transferred out of the container.
    const MOVABLE: bool;
    /// Whether the container is `Clone`.
    const CLONEABLE: bool;
    /// Whether oversized payloads fall back to the heap.
    const ALLOW_HEAP: bool;

    #[doc(hidden)]
    type Pinning;
}

/// No capabilities: payload stays where constructed, inline only.
///
/// The container is `!Unpin`; pin it to use
/// [`as_pin_mut`](crate::PolyBox::as_pin_mut).
pub enum Pinned {}

/// Pinned payload with heap fallback for payloads the buffer cannot hold.
pub enum PinnedHeap {}

/// Movable payload, inline only.
pub enum Unique {}

/// Movable payload with heap fallback.
pub enum UniqueHeap {}

/// Movable, cloneable payload, inline only.
pub enum Value {}

/// Movable, cloneable payload with heap fallback. The default policy.
pub enum ValueHeap {}

impl Policy for Pinned {
    const MOVABLE: bool = false;
    const CLONEABLE: bool = false;
    const ALLOW_HEAP: bool = false;
    type Pinning = PhantomPinned;
}

impl Policy for PinnedHeap {
    const MOVABLE: bool = false;
    const CLONEABLE: bool = false;
    const ALLOW_HEAP: bool = true;
    type Pinning = PhantomPinned;
}

impl Policy for Unique {
    const MOVABLE: bool = true;
    const CLONEABLE: bool = false;
    const ALLOW_HEAP: bool = false;
    type Pinning = ();
}

impl Policy for UniqueHeap {
    const MOVABLE: bool = true;
    const CLONEABLE: bool = false;
    const ALLOW_HEAP: bool = true;
    type Pinning = ();
}

impl Policy for Value {
    const MOVABLE: bool = true;
    const CLONEABLE: bool = true;
    const ALLOW_HEAP: bool = false;
    type Pinning = ();
}

impl Policy for ValueHeap {
    const MOVABLE: bool = true;
    const CLONEABLE: bool = true;
    const ALLOW_HEAP: bool = true;
    type Pinning = ();
}

/// Policies whose payload may be transferred out of the container.
pub trait Movable: Policy {}

impl Movable for Unique {}
impl Movable for UniqueHeap {}
impl Movable for Value {}
impl Movable for ValueHeap {}

/// Policies whose containers are `Clone`. Cloneable implies [`Movable`].
pub trait Cloneable: Movable {}

impl Cloneable for Value {}
impl Cloneable for ValueHeap {}

/// Policies that spill oversized payloads to the heap.
pub trait HeapFallback: Policy {}

impl HeapFallback for PinnedHeap {}
impl HeapFallback for UniqueHeap {}
impl HeapFallback for ValueHeap {}

/// Policies whose payload never moves once constructed.
///
/// Containers under these policies are `!Unpin` and expose
/// [`as_pin_mut`](crate::PolyBox::as_pin_mut).
pub trait Anchored: Policy {}

impl Anchored for Pinned {}
impl Anchored for PinnedHeap {}

/// Payload types admissible under policy `P`.
///
/// Blanket-implemented per policy: clone-capable policies require the
/// payload to be `Clone`, the others accept any type. Trying to store a
/// non-`Clone` payload in a [`Value`] or [`ValueHeap`] box fails to compile
/// with a missing `Storable` bound.
pub trait Storable<P: Policy> {
    #[doc(hidden)]
    fn table() -> Option<&'static CloneTable>;
}

impl<U> Storable<Pinned> for U {
    fn table() -> Option<&'static CloneTable> {
        None
    }
}

impl<U> Storable<PinnedHeap> for U {
    fn table() -> Option<&'static CloneTable> {
        None
    }
}

impl<U> Storable<Unique> for U {
    fn table() -> Option<&'static CloneTable> {
        None
    }
}

impl<U> Storable<UniqueHeap> for U {
    fn table() -> Option<&'static CloneTable> {
        None
    }
}

impl<U: Clone> Storable<Value> for U {
    fn table() -> Option<&'static CloneTable> {
        Some(CloneTable::of::<U>())
    }
}

impl<U: Clone> Storable<ValueHeap> for U {
    fn table() -> Option<&'static CloneTable> {
        Some(CloneTable::of::<U>())
    }
}
