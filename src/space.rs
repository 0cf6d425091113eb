//! Capacity markers for the inline buffer.
//!
//! The `Space` parameter of [`PolyBox`](crate::PolyBox) only contributes its
//! size and alignment; no value of it is ever created. The types here cover
//! the common word-multiple capacities, but any type works as a capacity
//! marker, including one of your own with a stricter alignment.

/// One machine word of inline capacity.
pub struct S1 {
    _inner: [usize; 1],
}

/// Two machine words of inline capacity.
pub struct S2 {
    _inner: [usize; 2],
}

/// Four machine words of inline capacity.
pub struct S4 {
    _inner: [usize; 4],
}

/// Eight machine words of inline capacity.
pub struct S8 {
    _inner: [usize; 8],
}

/// Sixteen machine words of inline capacity.
pub struct S16 {
    _inner: [usize; 16],
}

/// Thirty-two machine words of inline capacity.
pub struct S32 {
    _inner: [usize; 32],
}

/// Sixty-four machine words of inline capacity.
pub struct S64 {
    _inner: [usize; 64],
}
