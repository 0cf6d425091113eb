use core::fmt;
use core::marker::PhantomData;
use core::mem::{self, MaybeUninit};
use core::ops;
use core::pin::Pin;
use core::ptr::{self, NonNull};

use core::alloc::Layout;

#[cfg(not(feature = "std"))]
use alloc::alloc::{alloc, dealloc, handle_alloc_error};
#[cfg(feature = "std")]
use std::alloc::{alloc, dealloc, handle_alloc_error};

use crate::fatptr;
use crate::policy::{Anchored, Cloneable, Movable, Policy, Storable, ValueHeap};
use crate::space::S4;
use crate::table::CloneTable;

/// Construct an occupied [`PolyBox`], placing the value inline or on the
/// heap depending on its size.
///
/// This is the primary constructor. It relaxes the `T: Sized` constraint of
/// [`PolyBox::new`] by checking the coercion from the expression type to the
/// interface type at the call site, so it can build boxes of trait objects
/// and slices on stable Rust. An invalid coercion is a compile error.
///
/// Think of it as having the signature
/// `polybox!<U: Storable<P>, T: ?Sized>(val: U) -> PolyBox<T, Space, P>`.
///
/// # Example
///
/// ```
/// use std::any::Any;
///
/// use polybox::polybox;
/// use polybox::space::*;
/// use polybox::PolyBox;
///
/// let small: PolyBox<dyn Any, S4> = polybox!(42u32);
/// let large: PolyBox<[usize], S4> = polybox!([1usize; 8]);
///
/// assert!(!small.is_heap());
/// assert!(large.is_heap());
/// assert_eq!(large.len(), 8);
/// ```
#[macro_export]
macro_rules! polybox {
    ($val:expr) => {{
        let val = $val;
        let ptr = &val as *const _;
        #[allow(unsafe_code)]
        unsafe {
            $crate::PolyBox::new_unchecked(val, ptr)
        }
    }};
}

/// Replace the payload of a [`PolyBox`] with a new value.
///
/// The current payload is destroyed **first** and the new value is placed
/// afterwards, so the old payload's heap block (if any) is already freed
/// when the new one is seated. If placing the new value panics, the box is
/// left empty rather than holding either payload; use
/// [`clone_from`](Clone::clone_from) when the rollback guarantee matters.
///
/// Accepts any value admissible under the box's policy, like [`polybox!`].
///
/// # Example
///
/// ```
/// use polybox::space::S2;
/// use polybox::{emplace, polybox, PolyBox};
///
/// let mut slot: PolyBox<dyn ToString, S2> = polybox!(1u8);
/// emplace!(slot, "two");
/// assert_eq!(slot.to_string(), "two");
/// ```
#[macro_export]
macro_rules! emplace {
    ($slot:expr, $val:expr) => {{
        let val = $val;
        let ptr = &val as *const _;
        #[allow(unsafe_code)]
        unsafe {
            $crate::PolyBox::emplace_unchecked(&mut $slot, val, ptr)
        }
    }};
}

/// A nullable, value-semantic box for payloads reached through interface
/// type `T`, stored inline when they fit in `Space`.
///
/// `T` is usually a trait object such as `dyn Widget`; slices and sized
/// types work as well. Payloads no larger and no more aligned than `Space`
/// live inside the container itself; bigger ones go to a dedicated heap
/// block when the policy `P` permits, and fail to compile when it does not.
/// A payload never moves between the two placements once constructed.
///
/// The policy parameter selects capabilities at the type level; see the
/// [`policy`](crate::policy) module. The default, [`ValueHeap`], gives full
/// value semantics with heap fallback.
///
/// # Example
///
/// ```
/// use std::fmt::Display;
///
/// use polybox::polybox;
/// use polybox::space::S2;
/// use polybox::PolyBox;
///
/// let mut slot: PolyBox<dyn Display, S2> = PolyBox::empty();
/// assert!(slot.is_empty());
///
/// slot = polybox!(1234u32);
/// assert_eq!(slot.to_string(), "1234");
///
/// let copy = slot.clone();
/// assert!(copy != slot); // equality is payload identity, not value
/// ```
pub struct PolyBox<T: ?Sized, Space = S4, P: Policy = ValueHeap> {
    space: MaybeUninit<Space>,
    // `None` iff empty. When occupied, the metadata half is authoritative;
    // the address half is live for heap payloads and stale for inline ones
    // (re-derived from `space` on every access).
    ptr: Option<NonNull<T>>,
    table: Option<&'static CloneTable>,
    on_heap: bool,
    _own: PhantomData<T>,
    _pin: PhantomData<P::Pinning>,
}

impl<T: ?Sized, Space, P: Policy> PolyBox<T, Space, P> {
    /// Creates an empty box. Never allocates, never fails.
    ///
    /// # Example
    ///
    /// ```
    /// use polybox::space::S1;
    /// use polybox::PolyBox;
    ///
    /// let empty: PolyBox<dyn std::fmt::Debug, S1> = PolyBox::empty();
    /// assert!(empty.get().is_none());
    /// ```
    pub const fn empty() -> Self {
        PolyBox {
            space: MaybeUninit::uninit(),
            ptr: None,
            table: None,
            on_heap: false,
            _own: PhantomData,
            _pin: PhantomData,
        }
    }

    /// Boxes a value of the interface type itself.
    ///
    /// Use [`polybox!`] to box a concrete value behind a trait object or
    /// slice interface.
    ///
    /// # Example
    ///
    /// ```
    /// use polybox::space::S4;
    /// use polybox::PolyBox;
    ///
    /// let small: PolyBox<[usize; 2], S4> = PolyBox::new([0, 1]);
    /// let large: PolyBox<[usize; 8], S4> = PolyBox::new([0; 8]);
    ///
    /// assert!(!small.is_heap());
    /// assert!(large.is_heap());
    /// ```
    pub fn new(val: T) -> Self
    where
        T: Sized + Storable<P>,
    {
        polybox!(val)
    }

    #[doc(hidden)]
    pub unsafe fn new_unchecked<U>(val: U, ptr: *const T) -> Self
    where
        U: Storable<P>,
    {
        let mut boxed = Self::empty();
        unsafe { boxed.place(val, ptr) };
        boxed
    }

    #[doc(hidden)]
    pub unsafe fn emplace_unchecked<U>(&mut self, val: U, ptr: *const T)
    where
        U: Storable<P>,
    {
        self.reset();
        unsafe { self.place(val, ptr) };
    }

    /// Seats `val` in the empty container. `ptr` must carry the metadata of
    /// `val` seen as a `T`.
    unsafe fn place<U>(&mut self, val: U, ptr: *const T)
    where
        U: Storable<P>,
    {
        const {
            assert!(
                P::ALLOW_HEAP
                    || (mem::size_of::<U>() <= mem::size_of::<Space>()
                        && mem::align_of::<U>() <= mem::align_of::<Space>()),
                "payload does not fit the inline buffer of a no-heap PolyBox: \
                 grow the Space parameter or switch to a heap-fallback policy"
            );
        }

        let fits = mem::size_of::<U>() <= mem::size_of::<Space>()
            && mem::align_of::<U>() <= mem::align_of::<Space>();

        let stored: *mut T = if fits {
            unsafe { self.space.as_mut_ptr().cast::<U>().write(val) };
            self.on_heap = false;
            // Stale address, live metadata; re-derived on access.
            ptr.cast_mut()
        } else if mem::size_of::<U>() == 0 {
            // Over-aligned ZST: no bytes to store, but references handed out
            // must be aligned, which the buffer cannot guarantee.
            mem::forget(val);
            self.on_heap = true;
            fatptr::repoint(ptr, fatptr::dangling(mem::align_of::<U>()))
        } else {
            let layout = Layout::new::<U>();
            let block = unsafe { alloc(layout) };
            if block.is_null() {
                handle_alloc_error(layout);
            }
            unsafe { block.cast::<U>().write(val) };
            self.on_heap = true;
            fatptr::repoint(ptr, block)
        };

        self.table = U::table();
        self.ptr = Some(unsafe { NonNull::new_unchecked(stored) });
    }

    /// The payload's current address: the stored pointer for heap payloads,
    /// the inline buffer for the rest.
    fn resolved(&self, stored: NonNull<T>) -> *const T {
        if self.on_heap {
            stored.as_ptr().cast_const()
        } else {
            let addr = self.space.as_ptr().cast::<u8>().cast_mut();
            fatptr::repoint(stored.as_ptr().cast_const(), addr).cast_const()
        }
    }

    /// Returns a reference to the payload, or `None` if the box is empty.
    pub fn get(&self) -> Option<&T> {
        let stored = self.ptr?;
        Some(unsafe { &*self.resolved(stored) })
    }

    /// Returns a mutable reference to the payload, or `None` if the box is
    /// empty.
    pub fn get_mut(&mut self) -> Option<&mut T> {
        let stored = self.ptr?;
        Some(unsafe { &mut *self.resolved(stored).cast_mut() })
    }

    /// Returns true if the box holds no payload.
    pub fn is_empty(&self) -> bool {
        self.ptr.is_none()
    }

    /// Returns true if the payload lives in a heap block.
    pub fn is_heap(&self) -> bool {
        self.ptr.is_some() && self.on_heap
    }

    /// Destroys the payload, leaving the box empty. Never fails; on an
    /// empty box it does nothing.
    ///
    /// The box is marked empty before the payload's destructor runs, so a
    /// panicking destructor still leaves an empty, usable box (the heap
    /// block, if any, is leaked in that case).
    pub fn reset(&mut self) {
        let Some(stored) = self.ptr else { return };
        let payload = self.resolved(stored).cast_mut();
        let on_heap = self.on_heap;

        self.ptr = None;
        self.table = None;
        self.on_heap = false;

        unsafe {
            let layout = Layout::for_value(&*payload);
            ptr::drop_in_place(payload);
            if on_heap && layout.size() != 0 {
                dealloc(payload.cast::<u8>(), layout);
            }
        }
    }
}

impl<T: ?Sized, Space, P: Movable> PolyBox<T, Space, P> {
    /// Transfers the payload out, leaving this box empty.
    ///
    /// The payload stays at its placement class: a heap block changes hands
    /// untouched, inline bytes move with the returned box.
    ///
    /// # Example
    ///
    /// ```
    /// use polybox::space::S2;
    /// use polybox::{polybox, PolyBox};
    ///
    /// let mut a: PolyBox<dyn ToString, S2> = polybox!(7u32);
    /// let b = a.take();
    ///
    /// assert!(a.is_empty());
    /// assert_eq!(b.to_string(), "7");
    /// ```
    pub fn take(&mut self) -> Self {
        mem::replace(self, Self::empty())
    }
}

impl<T: ?Sized, Space, P: Anchored> PolyBox<T, Space, P> {
    /// Returns pinned access to the payload of a pinned box.
    ///
    /// Boxes under anchored policies are `!Unpin`, so once pinned they can
    /// soundly promise their payload will not move again.
    ///
    /// # Example
    ///
    /// ```
    /// use std::pin::pin;
    ///
    /// use polybox::policy::Pinned;
    /// use polybox::space::S2;
    /// use polybox::{polybox, PolyBox};
    ///
    /// let slot: PolyBox<dyn ToString, S2, Pinned> = polybox!(5u16);
    /// let mut slot = pin!(slot);
    /// let payload = slot.as_mut().as_pin_mut().unwrap();
    /// assert_eq!(payload.to_string(), "5");
    /// ```
    pub fn as_pin_mut(self: Pin<&mut Self>) -> Option<Pin<&mut T>> {
        // The payload of an anchored box never relocates, and the box
        // itself is !Unpin, so the pin cannot be escaped and re-moved.
        unsafe {
            let this = self.get_unchecked_mut();
            let payload = this.get_mut()?;
            Some(Pin::new_unchecked(payload))
        }
    }
}

impl<T: ?Sized, Space, P: Policy> Default for PolyBox<T, Space, P> {
    fn default() -> Self {
        Self::empty()
    }
}

impl<T: ?Sized, Space, P: Policy> Drop for PolyBox<T, Space, P> {
    fn drop(&mut self) {
        self.reset();
    }
}

impl<T: ?Sized, Space, P: Cloneable> Clone for PolyBox<T, Space, P> {
    /// Clones the payload at the source's placement class; an empty box
    /// clones to an empty box. Clone-capable policies only admit `Clone`
    /// payload types, so the table entry is always present.
    fn clone(&self) -> Self {
        let (Some(stored), Some(table)) = (self.ptr, self.table) else {
            return Self::empty();
        };
        let src = self.resolved(stored).cast::<u8>();

        let mut out = Self::empty();
        if self.on_heap {
            let block = unsafe { table.heap_clone(src) };
            let fat = fatptr::repoint(stored.as_ptr().cast_const(), block);
            out.ptr = Some(unsafe { NonNull::new_unchecked(fat) });
        } else {
            // Write the payload before marking `out` occupied, so a
            // panicking payload `Clone` leaves `out` empty and droppable.
            unsafe { table.clone_into(src, out.space.as_mut_ptr().cast::<u8>()) };
            out.ptr = Some(stored);
        }
        out.table = Some(table);
        out.on_heap = self.on_heap;
        out
    }

    /// Clone with the strong guarantee: the new payload is fully
    /// constructed before the old one is destroyed, so a panicking payload
    /// `Clone` leaves `self` exactly as it was.
    fn clone_from(&mut self, source: &Self) {
        if ptr::eq(self, source) {
            return;
        }
        *self = source.clone();
    }
}

impl<T: ?Sized, Space, P: Policy> ops::Deref for PolyBox<T, Space, P> {
    type Target = T;

    /// # Panics
    ///
    /// Panics if the box is empty. Use [`PolyBox::get`] for a fallible
    /// lookup.
    fn deref(&self) -> &T {
        self.get().expect("dereferenced an empty PolyBox")
    }
}

impl<T: ?Sized, Space, P: Policy> ops::DerefMut for PolyBox<T, Space, P> {
    fn deref_mut(&mut self) -> &mut T {
        self.get_mut().expect("dereferenced an empty PolyBox")
    }
}

impl<T: ?Sized, Space, P: Policy> PartialEq for PolyBox<T, Space, P> {
    /// Payload identity: two boxes are equal iff both are empty or both
    /// view the same payload address. Clones therefore compare unequal.
    fn eq(&self, other: &Self) -> bool {
        match (self.ptr, other.ptr) {
            (None, None) => true,
            (Some(a), Some(b)) => {
                ptr::eq(self.resolved(a).cast::<u8>(), other.resolved(b).cast::<u8>())
            }
            _ => false,
        }
    }
}

impl<T: ?Sized, Space, P: Policy> Eq for PolyBox<T, Space, P> {}

impl<T: ?Sized + fmt::Debug, Space, P: Policy> fmt::Debug for PolyBox<T, Space, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(payload) => fmt::Debug::fmt(payload, f),
            None => f.write_str("<empty>"),
        }
    }
}

impl<T: ?Sized + fmt::Display, Space, P: Policy> fmt::Display for PolyBox<T, Space, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.get() {
            Some(payload) => fmt::Display::fmt(payload, f),
            None => f.write_str("<empty>"),
        }
    }
}

impl<T: ?Sized, Space, P: Policy> fmt::Pointer for PolyBox<T, Space, P> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let payload: *const u8 = match self.ptr {
            Some(stored) => self.resolved(stored).cast(),
            None => ptr::null(),
        };
        fmt::Pointer::fmt(&payload, f)
    }
}

unsafe impl<T: ?Sized + Send, Space, P: Policy> Send for PolyBox<T, Space, P> {}
unsafe impl<T: ?Sized + Sync, Space, P: Policy> Sync for PolyBox<T, Space, P> {}

#[cfg(test)]
mod tests {
    use std::any::Any;
    use std::cell::Cell;

    use super::PolyBox;
    use crate::policy::{Pinned, Unique, ValueHeap};
    use crate::space::*;

    #[test]
    fn test_basic() {
        let inline: PolyBox<usize, S1> = PolyBox::new(1234usize);
        assert!(*inline == 1234);
        assert!(!inline.is_heap());

        let heaped: PolyBox<(usize, usize), S1> = PolyBox::new((0, 1));
        assert!(*heaped == (0, 1));
        assert!(heaped.is_heap());
    }

    #[test]
    fn test_empty() {
        let empty: PolyBox<dyn Any, S1> = PolyBox::empty();
        assert!(empty.is_empty());
        assert!(!empty.is_heap());
        assert!(empty.get().is_none());

        let defaulted: PolyBox<dyn Any, S1> = PolyBox::default();
        assert!(defaulted.is_empty());
    }

    #[test]
    fn test_macro() {
        let inline: PolyBox<dyn Any, S1> = polybox!(1234usize);
        if let Some(num) = inline.get().unwrap().downcast_ref::<usize>() {
            assert_eq!(*num, 1234);
        } else {
            unreachable!();
        }

        let heaped: PolyBox<dyn Any, S1> = polybox!([0usize, 1]);
        if let Some(array) = heaped.get().unwrap().downcast_ref::<[usize; 2]>() {
            assert_eq!(*array, [0, 1]);
        } else {
            unreachable!();
        }

        let is_even: PolyBox<dyn Fn(u8) -> bool, S1> = polybox!(|num: u8| num % 2 == 0);
        assert!(!is_even(5));
        assert!(is_even(6));
    }

    #[test]
    fn test_emplace() {
        let mut slot: PolyBox<dyn ToString, S2> = polybox!(1u8);
        assert_eq!(slot.to_string(), "1");

        emplace!(slot, 2.5f64);
        assert_eq!(slot.to_string(), "2.5");

        emplace!(slot, String::from("a payload bigger than the buffer"));
        assert!(slot.is_heap());
        assert_eq!(slot.to_string(), "a payload bigger than the buffer");

        slot.reset();
        assert!(slot.is_empty());
        slot.reset();
        assert!(slot.is_empty());
    }

    #[test]
    fn test_drop() {
        #[derive(Clone)]
        struct Tracked<'a>(&'a Cell<bool>);
        impl Drop for Tracked<'_> {
            fn drop(&mut self) {
                self.0.set(true);
            }
        }

        let flag = Cell::new(false);
        let val: PolyBox<Tracked<'_>, S2> = PolyBox::new(Tracked(&flag));
        assert!(!flag.get());
        drop(val);
        assert!(flag.get());

        let flag = Cell::new(false);
        let mut val: PolyBox<Tracked<'_>, S2> = PolyBox::new(Tracked(&flag));
        val.reset();
        assert!(flag.get());
    }

    #[test]
    fn test_dont_drop_space() {
        struct NoDrop(S1);
        impl Drop for NoDrop {
            fn drop(&mut self) {
                unreachable!();
            }
        }

        drop(PolyBox::<_, NoDrop>::new([true]));
        drop(PolyBox::<[bool; 1], NoDrop>::empty());
    }

    #[test]
    fn test_oversize() {
        let fit = PolyBox::<_, S1>::new([0usize; 1]);
        let oversize = PolyBox::<_, S1>::new([0usize; 2]);
        assert!(!fit.is_heap());
        assert!(oversize.is_heap());
    }

    #[test]
    fn test_clone() {
        let inline: PolyBox<[usize; 2], S2> = polybox!([0usize, 1]);
        let copy = inline.clone();
        assert_eq!(*copy, *inline);
        assert!(copy != inline);
        assert!(!copy.is_heap());

        let heaped: PolyBox<[usize; 8], S2> = polybox!([7usize; 8]);
        let copy = heaped.clone();
        assert_eq!(*copy, *heaped);
        assert!(copy.is_heap());
    }

    #[test]
    fn test_take() {
        let mut a: PolyBox<dyn ToString, S2, Unique> = polybox!(7u32);
        let b = a.take();
        assert!(a.is_empty());
        assert_eq!(b.to_string(), "7");

        let mut empty: PolyBox<dyn ToString, S2, Unique> = PolyBox::empty();
        assert!(empty.take().is_empty());
    }

    #[test]
    fn test_pinned_access() {
        use std::pin::pin;

        let slot: PolyBox<dyn ToString, S2, Pinned> = polybox!(5u16);
        let mut slot = pin!(slot);
        assert_eq!(slot.as_mut().as_pin_mut().unwrap().to_string(), "5");

        let empty: PolyBox<dyn ToString, S2, Pinned> = PolyBox::empty();
        let empty = pin!(empty);
        assert!(empty.as_pin_mut().is_none());
    }

    #[test]
    fn test_zst() {
        struct ZSpace;

        let zst: PolyBox<[usize], S1> = polybox!([0usize; 0]);
        assert_eq!(*zst, [0usize; 0]);

        let zst: PolyBox<[usize], ZSpace> = polybox!([0usize; 0]);
        assert_eq!(*zst, [0usize; 0]);
        let spilled: PolyBox<[usize], ZSpace> = polybox!([0usize; 2]);
        assert_eq!(*spilled, [0usize; 2]);
    }

    #[test]
    fn test_equality() {
        let a: PolyBox<dyn Any, S2, ValueHeap> = polybox!(1u32);
        let b = a.clone();
        assert!(a == a);
        assert!(a != b);

        let x: PolyBox<dyn Any, S2> = PolyBox::empty();
        let y: PolyBox<dyn Any, S2> = PolyBox::empty();
        assert!(x == y);
        assert!(x != a);
    }

    #[test]
    fn test_formatting() {
        let slot: PolyBox<dyn std::fmt::Debug, S2> = polybox!("hi");
        assert_eq!(format!("{slot:?}"), "\"hi\"");

        let empty: PolyBox<dyn std::fmt::Debug, S2> = PolyBox::empty();
        assert_eq!(format!("{empty:?}"), "<empty>");
        assert_eq!(format!("{empty:p}"), format!("{:p}", std::ptr::null::<u8>()));
    }

    #[test]
    #[should_panic(expected = "dereferenced an empty PolyBox")]
    fn test_deref_empty() {
        let empty: PolyBox<dyn Any, S1> = PolyBox::empty();
        let _ = &*empty;
    }
}
