//! The single-owner handle.
//!
//! An [`Own<T>`] uniquely owns one heap allocation. It keeps two addresses:
//! the *view* it currently exposes as `T`, and the *origin* where the
//! allocation actually begins together with the disposer chosen when the
//! object was allocated. Conversions only ever change the view, and disposal
//! only ever uses the origin, so a handle can be widened, projected or fully
//! erased without losing track of how to free what it owns.
//!
//! ```
//! use sole::prelude::*;
//!
//! struct Header {
//!     id: u32,
//! }
//!
//! struct Packet {
//!     payload: Vec<u8>,
//!     header: Header,
//! }
//!
//! let packet: Own<Packet> = Own::new(Packet {
//!     payload: vec![1, 2, 3],
//!     header: Header { id: 7 },
//! });
//! let origin = packet.origin_addr();
//!
//! // Keep only the header in view; the whole packet stays owned
//! let header: Own<Header> = packet.project_mut(|packet| &mut packet.header);
//! assert_eq!(header.id, 7);
//! assert_eq!(header.origin_addr(), origin);
//!
//! // Erasing the type goes back to the start of the allocation
//! let opaque: Own<markers::Opaque> = header.into_opaque();
//! assert_eq!(opaque.addr(), origin);
//! ```

mod attach;
mod convert;
#[cfg(feature = "std")]
mod io;

use alloc::boxed::Box;
use core::{any::TypeId, pin::Pin, ptr::NonNull};

use sole_internals::{AllocError, RawOwn};

pub use self::{attach::Attachments, convert::Upcast};
use crate::{
    hooks::observer::{self, Phase},
    markers::{Local, Mutable, ObjectMarkerFor, ReadOnly, SendSync, ThreadSafetyMarker},
};

/// FIXME: Once rust-lang/rust#132922 gets resolved, we can make the fields
/// unsafe fields and remove this module.
mod limit_field_access {
    use core::{marker::PhantomData, mem::ManuallyDrop, ptr::NonNull};

    use sole_internals::RawOwn;

    use crate::markers::{Mutable, SendSync};

    /// A uniquely owned heap object, viewed as a `T`.
    ///
    /// `Own` is move-only: it implements neither [`Copy`] nor [`Clone`].
    /// Dropping it disposes the owned object exactly once, using the disposer
    /// that was selected for the object's concrete type when it was
    /// allocated, no matter which view the handle exposes at that point.
    ///
    /// An empty handle is spelled `Option<Own<T>>`; see
    /// [`OptionOwnExt`](crate::option_ext::OptionOwnExt) for the reset and
    /// assignment helpers.
    ///
    /// # Type Parameters
    /// - `T`: The view of the object. This can be the allocated type itself,
    ///   a component of it (see [`Upcast`](crate::Upcast)), a `dyn Trait`, or
    ///   [`Opaque`](crate::markers::Opaque).
    /// - `Access`: [`Mutable`] (default) or
    ///   [`ReadOnly`](crate::markers::ReadOnly).
    /// - `ThreadSafety`: [`SendSync`] (default) or
    ///   [`Local`](crate::markers::Local).
    pub struct Own<T: ?Sized + 'static, Access: 'static = Mutable, ThreadSafety: 'static = SendSync>
    {
        /// The view exposed by this handle
        ///
        /// # Safety
        ///
        /// The following safety invariants are guaranteed to be upheld as long
        /// as this struct exists:
        ///
        /// 1. The pointer is valid for reads of a `T` for as long as `raw` is
        ///    alive, and no other pointer is used to mutate the pointee.
        /// 2. If `Access = Mutable`: the pointer is also valid for writes, and
        ///    no other pointer is used to access the pointee at all.
        /// 3. The pointer either points into memory owned (directly or
        ///    transitively) by `raw`, or to memory that lives for `'static`.
        exposed: NonNull<T>,

        /// The original allocation and its disposer
        ///
        /// # Safety
        ///
        /// 1. If `ThreadSafety = SendSync`: every object owned by `raw`,
        ///    including attached ones, is `Send + Sync`, and so is the pointee
        ///    of `exposed`.
        /// 2. `raw` is only dropped by the `Drop` implementation of this type.
        raw: ManuallyDrop<RawOwn>,

        _view: PhantomData<T>,
        _access: PhantomData<Access>,
        _thread_safety: PhantomData<ThreadSafety>,
    }

    impl<T: ?Sized, A, S> Own<T, A, S> {
        /// Creates a new handle from an exposed view and the owner of the
        /// allocation behind it.
        ///
        /// # Safety
        ///
        /// The caller must ensure:
        ///
        /// 1. `exposed` is valid for reads of a `T` for as long as `raw` is
        ///    alive, and no other pointer is used to mutate the pointee.
        /// 2. If `A = Mutable`: `exposed` is also valid for writes, and no
        ///    other pointer is used to access the pointee.
        /// 3. `exposed` points into memory owned by `raw` or to `'static`
        ///    memory.
        /// 4. If `S = SendSync`: every object owned by `raw` is `Send + Sync`,
        ///    and so is the pointee of `exposed`.
        #[must_use]
        pub(crate) unsafe fn from_parts(exposed: NonNull<T>, raw: RawOwn) -> Self {
            // SAFETY: We must uphold the safety invariants of the fields:
            // 1. Guaranteed by the caller
            // 2. Guaranteed by the caller
            // 3. Guaranteed by the caller
            // 4. Guaranteed by the caller
            Own {
                exposed,
                raw: ManuallyDrop::new(raw),
                _view: PhantomData,
                _access: PhantomData,
                _thread_safety: PhantomData,
            }
        }

        /// Consumes the handle without disposing anything, returning the
        /// exposed view and the owner of the allocation.
        #[must_use]
        pub(crate) fn into_parts(self) -> (NonNull<T>, RawOwn) {
            let mut this = ManuallyDrop::new(self);
            let exposed = this.exposed;

            // SAFETY: `this` is never used again and its `Drop` implementation
            // will not run, so the owner is moved out exactly once.
            let raw = unsafe { ManuallyDrop::take(&mut this.raw) };

            (exposed, raw)
        }

        /// Returns the exposed view.
        #[inline]
        #[must_use]
        pub(crate) fn exposed(&self) -> NonNull<T> {
            self.exposed
        }

        /// Returns the owner of the allocation.
        #[inline]
        #[must_use]
        pub(crate) fn raw(&self) -> &RawOwn {
            &self.raw
        }
    }

    impl<T: ?Sized + 'static, A: 'static, S: 'static> Drop for Own<T, A, S> {
        fn drop(&mut self) {
            // SAFETY: We are in the drop function, so `raw` is never accessed
            // again after being taken.
            let raw = unsafe { ManuallyDrop::take(&mut self.raw) };

            // `raw` is owned by this frame, so it is disposed even if an
            // observer panics.
            crate::hooks::observer::dispatch(&raw, crate::hooks::observer::Phase::Dispose);
            drop(raw);
        }
    }
}
pub use limit_field_access::Own;

impl<T: Sized, S: ThreadSafetyMarker> Own<T, Mutable, S> {
    /// Moves `value` into a new heap allocation and returns its handle.
    ///
    /// The handle exposes the object itself, so [`addr`](Own::addr) and
    /// [`origin_addr`](Own::origin_addr) agree. If the allocator cannot provide
    /// the memory, the process aborts, exactly like [`Box::new`]; use
    /// [`Own::try_new`] to handle that case.
    ///
    /// # Examples
    /// ```
    /// use sole::prelude::*;
    ///
    /// let value: Own<i32> = Own::new(2);
    /// assert_eq!(*value, 2);
    /// assert_eq!(value.addr(), value.origin_addr());
    /// ```
    #[must_use]
    pub fn new(value: T) -> Self
    where
        T: ObjectMarkerFor<S>,
    {
        Self::adopt(RawOwn::new(value))
    }

    /// Moves `value` into a new heap allocation, returning an [`AllocError`]
    /// instead of aborting when the allocator cannot provide the memory.
    ///
    /// # Examples
    /// ```
    /// use sole::prelude::*;
    ///
    /// let value: Own<[u8; 64]> = Own::try_new([0; 64]).expect("out of memory");
    /// assert_eq!(value.len(), 64);
    /// ```
    pub fn try_new(value: T) -> Result<Self, AllocError>
    where
        T: ObjectMarkerFor<S>,
    {
        Ok(Self::adopt(RawOwn::try_new(value)?))
    }

    /// Takes over the allocation of an existing [`Box`].
    ///
    /// The object is not moved: the handle exposes the same address the box
    /// did.
    #[must_use]
    pub fn from_box(boxed: Box<T>) -> Self
    where
        T: ObjectMarkerFor<S>,
    {
        Self::adopt(RawOwn::from_box(boxed))
    }

    /// Wraps a freshly created owner of a `T` in a handle.
    fn adopt(raw: RawOwn) -> Self
    where
        T: ObjectMarkerFor<S>,
    {
        debug_assert_eq!(raw.origin_type_id(), TypeId::of::<T>());
        observer::dispatch(&raw, Phase::Allocate);

        let exposed: NonNull<T> = raw.origin().cast::<T>();

        // SAFETY:
        // 1. `raw` was just created from a `Box<T>` and nothing else points to it.
        // 2. The same holds for writes, and no other pointer exists.
        // 3. The pointer is the origin of `raw` itself.
        // 4. If `S = SendSync`, the bound `T: ObjectMarkerFor<SendSync>` guarantees
        //    that `T` is `Send + Sync`.
        unsafe { Own::from_parts(exposed, raw) }
    }
}

impl<T: Sized + Send + Sync> Own<T, Mutable, SendSync> {
    /// Creates a new handle with [`SendSync`] thread safety.
    ///
    /// This is a convenience method that calls [`Own::new`] with explicit
    /// [`SendSync`] thread safety. Use this method when you're having trouble
    /// with type inference for the thread safety parameter.
    #[must_use]
    pub fn new_sendsync(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: Sized> Own<T, Mutable, Local> {
    /// Creates a new handle with [`Local`] thread safety.
    ///
    /// This is a convenience method that calls [`Own::new`] with explicit
    /// [`Local`] thread safety. Use this method when you're having trouble
    /// with type inference for the thread safety parameter, or when `T` is
    /// not `Send + Sync`.
    #[must_use]
    pub fn new_local(value: T) -> Self {
        Self::new(value)
    }
}

impl<T: ?Sized, A, S> Own<T, A, S> {
    /// Returns the exposed pointer without giving up ownership.
    ///
    /// The pointer must not outlive the handle, and must never be used to
    /// free the object.
    #[inline]
    #[must_use]
    pub fn as_ptr(&self) -> *const T {
        self.exposed().as_ptr().cast_const()
    }

    /// Returns the exposed address, without any pointer metadata.
    #[inline]
    #[must_use]
    pub fn addr(&self) -> *const () {
        self.as_ptr().cast::<()>()
    }

    /// Returns the address at which the owned allocation begins.
    ///
    /// This is the address that will be handed to the disposer. It stays the
    /// same across every conversion and attachment of this handle.
    #[inline]
    #[must_use]
    pub fn origin_addr(&self) -> *const () {
        self.raw().origin().as_ptr().cast_const()
    }

    /// Returns `true` if the handle exposes exactly the address `ptr`.
    ///
    /// Pointer metadata (slice lengths, vtables) is ignored.
    #[inline]
    #[must_use]
    pub fn ptr_eq(this: &Self, ptr: *const T) -> bool {
        core::ptr::addr_eq(this.as_ptr(), ptr)
    }

    /// Returns the [`TypeId`] of the object that was originally allocated.
    #[inline]
    #[must_use]
    pub fn origin_type_id(&self) -> TypeId {
        self.raw().origin_type_id()
    }

    /// Returns the [`core::any::type_name`] of the object that was
    /// originally allocated.
    #[inline]
    #[must_use]
    pub fn origin_type_name(&self) -> &'static str {
        self.raw().origin_type_name()
    }

    /// Returns how many handles have been [attached](Own::attach) to this
    /// one.
    #[inline]
    #[must_use]
    pub fn attached_len(&self) -> usize {
        self.raw().attached_len()
    }

    /// Pins the handle. The object lives on the heap and is never moved by
    /// the handle, so this is free.
    #[inline]
    #[must_use]
    pub fn into_pin(self) -> Pin<Self> {
        // SAFETY: The pointee is never moved out of its allocation by `Own`. It is
        // only ever dropped in place by the disposer.
        unsafe { Pin::new_unchecked(self) }
    }
}

impl<T: ?Sized, S> Own<T, Mutable, S> {
    /// Consumes the handle without disposing anything and returns a mutable
    /// reference to the exposed view.
    ///
    /// Everything the handle owns, including attachments, is leaked.
    ///
    /// # Examples
    /// ```
    /// use sole::prelude::*;
    ///
    /// let config: &'static mut Vec<&str> = Own::<_>::new(vec!["verbose"]).leak();
    /// config.push("color");
    /// assert_eq!(config.len(), 2);
    /// ```
    #[must_use]
    pub fn leak(self) -> &'static mut T {
        let (exposed, raw) = self.into_parts();
        core::mem::forget(raw);

        // SAFETY: The allocation is never disposed since its owner was forgotten,
        // and the handle guaranteed unique write access to the view.
        unsafe { &mut *exposed.as_ptr() }
    }
}

impl<T: ?Sized, S> Own<T, ReadOnly, S> {
    /// Consumes the handle without disposing anything and returns a shared
    /// reference to the exposed view.
    ///
    /// Everything the handle owns, including attachments, is leaked.
    #[must_use]
    pub fn leak(self) -> &'static T {
        let (exposed, raw) = self.into_parts();
        core::mem::forget(raw);

        // SAFETY: The allocation is never disposed since its owner was forgotten,
        // and nothing mutates the view.
        unsafe { &*exposed.as_ptr() }
    }
}

impl<T: ?Sized, A, S> core::ops::Deref for Own<T, A, S> {
    type Target = T;

    #[inline]
    fn deref(&self) -> &T {
        // SAFETY: The exposed pointer is valid for reads and nothing mutates the
        // pointee while this shared borrow exists.
        unsafe { self.exposed().as_ref() }
    }
}

impl<T: ?Sized, S> core::ops::DerefMut for Own<T, Mutable, S> {
    #[inline]
    fn deref_mut(&mut self) -> &mut T {
        let mut exposed = self.exposed();

        // SAFETY: For `Mutable` handles the exposed pointer is valid for writes and
        // unique, and we hold the handle mutably.
        unsafe { exposed.as_mut() }
    }
}

impl<T: ?Sized, A, S> AsRef<T> for Own<T, A, S> {
    fn as_ref(&self) -> &T {
        self
    }
}

impl<T: ?Sized, S> AsMut<T> for Own<T, Mutable, S> {
    fn as_mut(&mut self) -> &mut T {
        self
    }
}

impl<T: ?Sized, A, S> core::borrow::Borrow<T> for Own<T, A, S> {
    fn borrow(&self) -> &T {
        self
    }
}

impl<T: ?Sized, S> core::borrow::BorrowMut<T> for Own<T, Mutable, S> {
    fn borrow_mut(&mut self) -> &mut T {
        self
    }
}

impl<T: ?Sized + core::fmt::Display, A, S> core::fmt::Display for Own<T, A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Display::fmt(&**self, f)
    }
}

impl<T: ?Sized + core::fmt::Debug, A, S> core::fmt::Debug for Own<T, A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Debug::fmt(&**self, f)
    }
}

impl<T: ?Sized, A, S> core::fmt::Pointer for Own<T, A, S> {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        core::fmt::Pointer::fmt(&self.as_ptr(), f)
    }
}

impl<T: Sized, S: ThreadSafetyMarker> From<Box<T>> for Own<T, Mutable, S>
where
    T: ObjectMarkerFor<S>,
{
    fn from(boxed: Box<T>) -> Self {
        Own::from_box(boxed)
    }
}

impl<T: ?Sized, A, S> From<Own<T, A, S>> for Pin<Own<T, A, S>> {
    fn from(own: Own<T, A, S>) -> Self {
        own.into_pin()
    }
}

// SAFETY: The `SendSync` marker indicates that everything owned by the handle
// is `Send + Sync`, and the handle is the only way to reach it. Therefore it is
// safe to implement `Send` for the handle itself.
unsafe impl<T: ?Sized, A> Send for Own<T, A, SendSync> {}

// SAFETY: The `SendSync` marker indicates that everything owned by the handle
// is `Send + Sync`. Shared access to the handle only gives shared access to the
// exposed view, so it is safe to implement `Sync` for the handle itself.
unsafe impl<T: ?Sized, A> Sync for Own<T, A, SendSync> {}

impl<T: ?Sized, A, S> Unpin for Own<T, A, S> {}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String};
    use core::cell::Cell;

    use super::*;

    #[allow(dead_code)]
    struct NonSend(*const ());
    static_assertions::assert_not_impl_any!(NonSend: Send, Sync);

    struct DropFlag(Rc<Cell<bool>>);

    impl Drop for DropFlag {
        fn drop(&mut self) {
            assert!(!self.0.replace(true), "disposed twice");
        }
    }

    #[test]
    fn test_own_send_sync() {
        static_assertions::assert_impl_all!(Own<(), Mutable, SendSync>: Send, Sync);
        static_assertions::assert_impl_all!(Own<String, ReadOnly, SendSync>: Send, Sync);
        static_assertions::assert_impl_all!(Own<dyn core::any::Any, Mutable, SendSync>: Send, Sync);

        static_assertions::assert_not_impl_any!(Own<(), Mutable, Local>: Send, Sync);
        static_assertions::assert_not_impl_any!(Own<String, ReadOnly, Local>: Send, Sync);
        static_assertions::assert_not_impl_any!(Own<NonSend, Mutable, Local>: Send, Sync);
    }

    #[test]
    fn test_own_not_copy_clone() {
        static_assertions::assert_not_impl_any!(Own<(), Mutable, SendSync>: Copy, Clone);
        static_assertions::assert_not_impl_any!(Own<String, ReadOnly, Local>: Copy, Clone);
        static_assertions::assert_impl_all!(Own<NonSend, Mutable, Local>: Unpin);
    }

    #[test]
    fn test_own_size() {
        assert_eq!(
            core::mem::size_of::<Own<u64>>(),
            3 * core::mem::size_of::<usize>()
        );
        assert_eq!(
            core::mem::size_of::<Option<Own<u64>>>(),
            core::mem::size_of::<Own<u64>>()
        );
        assert_eq!(
            core::mem::size_of::<Own<[u8]>>(),
            4 * core::mem::size_of::<usize>()
        );
    }

    #[test]
    fn test_new_exposes_origin() {
        let value: Own<String> = Own::new(String::from("origin"));
        assert_eq!(value.addr(), value.origin_addr());
        assert!(Own::ptr_eq(&value, &*value));
        assert_eq!(value.origin_type_id(), TypeId::of::<String>());
        assert_eq!(value.attached_len(), 0);
        assert_eq!(&*value, "origin");
    }

    #[test]
    fn test_from_box_keeps_address() {
        let boxed = Box::new(5_u16);
        let addr: *const u16 = &*boxed;
        let value: Own<u16> = Own::from(boxed);
        assert_eq!(value.as_ptr(), addr);
    }

    #[test]
    fn test_deref_mut() {
        let mut value: Own<String> = Own::new(String::from("a"));
        value.push('b');
        value.as_mut().push('c');
        assert_eq!(value.as_ref(), "abc");
        assert_eq!(alloc::format!("{value} {value:?}"), "abc \"abc\"");
    }

    #[test]
    fn test_drop_disposes_once() {
        let flag = Rc::new(Cell::new(false));
        let value = Own::new_local(DropFlag(flag.clone()));
        let moved = value;
        assert!(!flag.get());
        drop(moved);
        assert!(flag.get());
    }

    #[test]
    fn test_leak_never_disposes() {
        let flag = Rc::new(Cell::new(false));
        let leaked: &'static mut DropFlag = Own::new_local(DropFlag(flag.clone())).leak();
        assert!(!flag.get());
        assert!(Rc::ptr_eq(&leaked.0, &flag));
    }

    #[test]
    fn test_into_pin() {
        let pinned: Pin<Own<i32>> = Own::new(9).into();
        assert_eq!(*pinned, 9);
    }
}
