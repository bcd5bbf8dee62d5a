//! Type-erased ownership record.
//!
//! This module encapsulates the `ptr` and `vtable` fields of [`RawOwn`],
//! ensuring they are only visible within this module. This visibility
//! restriction guarantees the safety invariant: **the pointer always comes
//! from `Box<T>`, and the vtable was instantiated for that same `T`**.
//!
//! # Safety Invariant
//!
//! Since the fields can only be set via [`RawOwn::from_box`] (which creates
//! the pointer from `Box::into_raw` and picks the vtable for the same `T`),
//! and cannot be modified afterward (no `pub` or `pub(crate)` fields), the
//! pair remains consistent throughout the value's lifetime.
//!
//! The [`RawOwn::drop`] implementation relies on this invariant to safely
//! reconstruct the `Box` and deallocate the memory.
//!
//! # Type Erasure
//!
//! The concrete type `T` is erased by casting the pointer to `Erased`. Unlike
//! a `dyn` pointer, the vtable does not travel inside a fat pointer; it is
//! stored next to the address so that callers can freely change how they
//! *view* the object without ever touching the disposal pair.

use alloc::{alloc::Layout, boxed::Box};
use core::{any::TypeId, ptr::NonNull};

use crate::{disposer::vtable::DisposerVtable, error::AllocError, util::Erased};

/// The start address of a heap allocation of some type `T`, paired with the
/// disposer for `T`, though we do not know which actual `T` it is.
///
/// Dropping a [`RawOwn`] disposes the allocation exactly once: it runs the
/// destructor of `T` and frees the memory.
///
/// We cannot use a [`Box<T>`] directly, because that does not allow us to
/// type-erase the `T`.
pub struct RawOwn {
    /// Pointer to the start of the allocation
    ///
    /// # Safety
    ///
    /// The following safety invariants are guaranteed to be upheld as long as
    /// this struct exists:
    ///
    /// 1. The pointer must have been created from a `Box<T>` for some `T`
    ///    using `Box::into_raw`.
    /// 2. The pointer will point to the same `T` for the entire lifetime of
    ///    this object.
    /// 3. The pointee is properly initialized for the entire lifetime of this
    ///    object, except during the execution of the `Drop` implementation.
    ptr: NonNull<Erased>,

    /// Disposer of the allocation
    ///
    /// # Safety
    ///
    /// 1. The vtable was created by `DisposerVtable::new::<T>()` for the same
    ///    `T` that the pointer was created from.
    vtable: &'static DisposerVtable,
}

impl RawOwn {
    /// Moves `value` into a new heap allocation and returns its owner.
    ///
    /// Allocation failure aborts the process, exactly like [`Box::new`]. See
    /// [`RawOwn::try_new`] for a fallible version.
    #[inline]
    pub fn new<T: 'static>(value: T) -> Self {
        Self::from_box(Box::new(value))
    }

    /// Takes over ownership of an existing [`Box`].
    #[inline]
    pub fn from_box<T: 'static>(boxed: Box<T>) -> Self {
        let ptr: *mut T = Box::into_raw(boxed);
        let ptr: *mut Erased = ptr.cast::<Erased>();

        // SAFETY: `Box::into_raw` returns a non-null pointer
        let ptr: NonNull<Erased> = unsafe { NonNull::new_unchecked(ptr) };

        Self {
            // SAFETY:
            // 1. We just created the pointer using `Box::into_raw`.
            // 2. We are creating the object here and we are not changing the pointer.
            // 3. The `Box` was initialized.
            ptr,
            // SAFETY:
            // 1. The vtable is instantiated for the same `T` as the `Box`.
            vtable: DisposerVtable::new::<T>(),
        }
    }

    /// Moves `value` into a new heap allocation, returning an [`AllocError`]
    /// instead of aborting when the allocator cannot provide the memory.
    ///
    /// On failure `value` is dropped before this function returns.
    pub fn try_new<T: 'static>(value: T) -> Result<Self, AllocError> {
        let layout = Layout::new::<T>();
        if layout.size() == 0 {
            // Zero-sized values never touch the allocator
            return Ok(Self::new(value));
        }

        // SAFETY: `layout` has a non-zero size, as checked above
        let ptr: *mut u8 = unsafe { alloc::alloc::alloc(layout) };
        let Some(ptr) = NonNull::new(ptr.cast::<T>()) else {
            return Err(AllocError::new(layout));
        };

        // SAFETY: The memory was just allocated with the layout of `T`, so it is
        // valid for writes and properly aligned.
        unsafe {
            ptr.as_ptr().write(value);
        }

        // SAFETY: The memory was allocated by the global allocator with
        // `Layout::new::<T>()` and holds an initialized `T`, which is exactly the
        // memory layout `Box<T>` uses.
        let boxed = unsafe { Box::from_raw(ptr.as_ptr()) };

        Ok(Self::from_box(boxed))
    }

    /// Returns the address where the owned allocation begins.
    ///
    /// For an attachment bundle this is the address of the bundle's own
    /// record, not of the primary object. Use [`RawOwn::origin`] for the
    /// latter.
    #[inline]
    pub(crate) fn allocation(&self) -> NonNull<Erased> {
        self.ptr
    }

    /// Returns the [`TypeId`] of the type stored in the allocation.
    #[inline]
    pub(crate) fn allocation_type_id(&self) -> TypeId {
        self.vtable.type_id()
    }

    /// Returns the [`core::any::type_name`] of the type stored in the
    /// allocation.
    #[inline]
    pub(crate) fn allocation_type_name(&self) -> &'static str {
        self.vtable.type_name()
    }

    /// Returns a reference to the allocation if it holds a `T`.
    #[inline]
    pub(crate) fn downcast_ref<T: 'static>(&self) -> Option<&T> {
        if self.allocation_type_id() != TypeId::of::<T>() {
            return None;
        }

        // SAFETY:
        // - The pointer is non-null, properly aligned, and points to an initialized
        //   `T` (guaranteed by the invariants of this type and the type check above)
        // - Shared access is allowed, as we hold a shared borrow of the owner
        let value = unsafe { self.ptr.cast::<T>().as_ref() };
        Some(value)
    }

    /// Returns a mutable reference to the allocation if it holds a `T`.
    #[inline]
    pub(crate) fn downcast_mut<T: 'static>(&mut self) -> Option<&mut T> {
        if self.allocation_type_id() != TypeId::of::<T>() {
            return None;
        }

        // SAFETY:
        // - The pointer is non-null, properly aligned, and points to an initialized
        //   `T` (guaranteed by the invariants of this type and the type check above)
        // - Exclusive access is guaranteed since we hold a mutable borrow of the
        //   unique owner
        let value = unsafe { self.ptr.cast::<T>().as_mut() };
        Some(value)
    }
}

impl core::ops::Drop for RawOwn {
    #[inline]
    fn drop(&mut self) {
        // SAFETY:
        // 1. The pointer comes from `Box::into_raw` (guaranteed by
        //    `RawOwn::from_box`)
        // 2. The vtable was created for the type stored at the pointer.
        // 3. The pointer is initialized and has not been previously disposed as
        //    guaranteed by the invariants on this type. We are correctly transferring
        //    ownership here and the pointer is not used afterwards, as we are in the
        //    drop function.
        unsafe {
            self.vtable.dispose(self.ptr);
        }
    }
}

impl core::fmt::Debug for RawOwn {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("RawOwn")
            .field("origin", &self.origin())
            .field("type", &self.origin_type_name())
            .field("attached", &self.attached_len())
            .finish()
    }
}
