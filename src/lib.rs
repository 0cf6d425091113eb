//! # PolyBox: Polymorphic Values Without the Pointer Chase
//!
//! [`PolyBox`] is a nullable, value-semantic container for payloads reached
//! through an interface type, usually a trait object. Small payloads live in
//! an inline buffer inside the container; larger ones fall back to a
//! dedicated heap allocation when the chosen policy permits. The result
//! behaves like a value (movable, cloneable, comparable) while erasing the
//! concrete payload type the way `Box<dyn Trait>` does.
//!
//! ## Core Concept
//!
//! `Box<dyn Trait>` always heap-allocates and always has reference-like
//! semantics. [`PolyBox`] uses a configurable inline capacity, only touches
//! the allocator when the payload exceeds it, and lets a type-level policy
//! decide which capabilities the container offers:
//!
//! | Policy | movable | cloneable | heap fallback |
//! |------------------------------------|---------|-----------|---------------|
//! | [`Pinned`](policy::Pinned) | | | |
//! | [`PinnedHeap`](policy::PinnedHeap) | | | ✓ |
//! | [`Unique`](policy::Unique) | ✓ | | |
//! | [`UniqueHeap`](policy::UniqueHeap) | ✓ | | ✓ |
//! | [`Value`](policy::Value) | ✓ | ✓ | |
//! | [`ValueHeap`](policy::ValueHeap) | ✓ | ✓ | ✓ |
//!
//! ## Quick Start
//!
//! Add PolyBox to your `Cargo.toml`:
//!
//! ```toml
//! [dependencies]
//! polybox = "0.1"
//! ```
//!
//! Basic usage:
//!
//! ```rust
//! use std::fmt::Debug;
//!
//! use polybox::polybox;
//! use polybox::space::S4;
//! use polybox::PolyBox;
//!
//! // Small payloads are stored inline
//! let small: PolyBox<dyn Debug, S4> = polybox!([1u32, 2]);
//! assert!(!small.is_heap());
//!
//! // Large payloads automatically use heap allocation
//! let large: PolyBox<dyn Debug, S4> = polybox!([0u32; 32]);
//! assert!(large.is_heap());
//!
//! // Use like a regular Box, plus an empty state
//! println!("Values: {small:?} and {large:?}");
//! let empty: PolyBox<dyn Debug, S4> = PolyBox::empty();
//! assert!(empty.is_empty());
//! ```
//!
//! ## Choosing a Policy
//!
//! The third type parameter fixes the container's capabilities for the
//! container type; every capability mismatch is a build error, never a
//! runtime check.
//!
//! ```rust
//! use polybox::policy::Unique;
//! use polybox::space::S2;
//! use polybox::{polybox, PolyBox};
//!
//! // Movable but not cloneable, inline only
//! let mut cell: PolyBox<dyn ToString, S2, Unique> = polybox!(42u32);
//! let moved = cell.take();
//! assert!(cell.is_empty());
//! assert_eq!(moved.to_string(), "42");
//! ```
//!
//! Clone-capable policies only admit `Clone` payloads:
//!
//! ```compile_fail
//! use std::fmt::Debug;
//!
//! use polybox::space::S4;
//! use polybox::{polybox, PolyBox};
//!
//! #[derive(Debug)]
//! struct NotClone(Vec<u8>);
//!
//! // The default policy is ValueHeap, which requires Clone payloads
//! let b: PolyBox<dyn Debug, S4> = polybox!(NotClone(vec![]));
//! ```
//!
//! No-heap policies reject oversized payloads at build time:
//!
//! ```compile_fail
//! use std::fmt::Debug;
//!
//! use polybox::policy::Unique;
//! use polybox::space::S1;
//! use polybox::{polybox, PolyBox};
//!
//! let b: PolyBox<dyn Debug, S1, Unique> = polybox!([0u64; 4]);
//! ```
//!
//! ## Pinned Policies
//!
//! Under [`Pinned`](policy::Pinned) and [`PinnedHeap`](policy::PinnedHeap)
//! the container is `!Unpin`: once pinned, the payload address is stable for
//! the payload's lifetime and [`as_pin_mut`](PolyBox::as_pin_mut) hands out
//! `Pin<&mut T>`.
//!
//! ```rust
//! use std::pin::pin;
//!
//! use polybox::policy::Pinned;
//! use polybox::space::S4;
//! use polybox::{polybox, PolyBox};
//!
//! let slot: PolyBox<dyn ToString, S4, Pinned> = polybox!(7u64);
//! let mut slot = pin!(slot);
//! let payload = slot.as_mut().as_pin_mut().unwrap();
//! assert_eq!(payload.to_string(), "7");
//! ```
//!
//! ## Custom Space Types
//!
//! Any type works as a capacity marker; only its size and alignment are
//! used:
//!
//! ```rust
//! use polybox::PolyBox;
//!
//! // Custom 128-byte capacity
//! type MySpace = [u8; 128];
//! type MyBox<T> = PolyBox<T, MySpace>;
//!
//! let value: MyBox<[u8; 100]> = PolyBox::new([0; 100]);
//! assert!(!value.is_heap()); // fits in custom space
//! ```
//!
//! **Important**: space alignment matters! A payload more aligned than the
//! space goes to the heap (or fails the build under a no-heap policy)
//! regardless of its size.
//!
//! ## No-std Usage
//!
//! PolyBox works in `#![no_std]` environments with `alloc`:
//!
//! ```toml
//! [dependencies]
//! polybox = { version = "0.1", default-features = false }
//! ```

#![cfg_attr(not(feature = "std"), no_std)]
#![deny(missing_docs)]
#![deny(clippy::as_conversions)]

extern crate alloc;

mod fatptr;
mod poly;
pub mod policy;
pub mod space;
mod table;

pub use crate::poly::PolyBox;
#[doc(hidden)]
pub use crate::table::CloneTable;
