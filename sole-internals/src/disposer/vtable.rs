//! Vtable for type-erased disposal.
//!
//! This module contains the [`DisposerVtable`] which knows how to destroy and
//! free an allocation after its concrete type `T` has been erased. One vtable
//! exists per `T`, as a `&'static` constant selected at allocation time.
//!
//! This module encapsulates the fields of [`DisposerVtable`] so they cannot
//! be accessed directly. This visibility restriction guarantees the safety
//! invariant: **the vtable's type parameter must match the actual type of the
//! allocation it is paired with**.
//!
//! # Safety Invariant
//!
//! This invariant is maintained because vtables are created as `&'static`
//! references via [`DisposerVtable::new`], which pairs the function pointers
//! with a specific type `T` at compile time.

use alloc::boxed::Box;
use core::{any::TypeId, ptr::NonNull};

use crate::util::Erased;

/// Vtable for type-erased disposal.
///
/// # Safety Invariant
///
/// The fields `type_id`, `type_name` and `dispose` are guaranteed to point to
/// the functions instantiated with the type `T` that was used to create this
/// [`DisposerVtable`].
pub(crate) struct DisposerVtable {
    /// Gets the [`TypeId`] of the type that was used to create this
    /// [`DisposerVtable`].
    type_id: fn() -> TypeId,
    /// Gets the [`core::any::type_name`] of the type that was used to create
    /// this [`DisposerVtable`].
    type_name: fn() -> &'static str,
    /// Drops the [`Box<T>`] instance pointed to by this pointer.
    dispose: unsafe fn(NonNull<Erased>),
}

impl DisposerVtable {
    /// Creates a new [`DisposerVtable`] for the type `T`.
    pub(super) const fn new<T: 'static>() -> &'static Self {
        const {
            &Self {
                type_id: TypeId::of::<T>,
                type_name: core::any::type_name::<T>,
                dispose: dispose::<T>,
            }
        }
    }

    /// Gets the [`TypeId`] of the type that was used to create this
    /// [`DisposerVtable`].
    #[inline]
    pub(super) fn type_id(&self) -> TypeId {
        (self.type_id)()
    }

    /// Gets the [`core::any::type_name`] of the type that was used to create
    /// this [`DisposerVtable`].
    #[inline]
    pub(super) fn type_name(&self) -> &'static str {
        (self.type_name)()
    }

    /// Drops the `Box<T>` instance pointed to by this pointer.
    ///
    /// # Safety
    ///
    /// The caller must ensure:
    ///
    /// 1. The pointer comes from [`Box<T>`] via [`Box::into_raw`]
    /// 2. This [`DisposerVtable`] must be a vtable for the type stored at the
    ///    pointer.
    /// 3. This method drops the [`Box<T>`], so the caller must ensure that
    ///    the pointer has not previously been disposed, that it is able to
    ///    transfer ownership of the pointer, and that it will not use the
    ///    pointer after calling this method.
    #[inline]
    pub(super) unsafe fn dispose(&self, ptr: NonNull<Erased>) {
        // SAFETY: We know that `self.dispose` points to the function `dispose::<T>`
        // below. That function's safety requirements are upheld:
        // 1. Guaranteed by the caller
        // 2. Guaranteed by the caller
        // 3. Guaranteed by the caller
        unsafe {
            (self.dispose)(ptr);
        }
    }
}

/// Drops the [`Box<T>`] instance pointed to by this pointer.
///
/// # Safety
///
/// The caller must ensure:
///
/// 1. The pointer comes from [`Box<T>`] via [`Box::into_raw`]
/// 2. The type `T` matches the actual type stored at the pointer
/// 3. This method drops the [`Box<T>`], so the caller must ensure that the
///    pointer has not previously been disposed, that it is able to transfer
///    ownership of the pointer, and that it will not use the pointer after
///    calling this method.
unsafe fn dispose<T: 'static>(ptr: NonNull<Erased>) {
    let ptr: NonNull<T> = ptr.cast::<T>();
    let ptr: *mut T = ptr.as_ptr();
    // SAFETY: Our pointer has the correct type as guaranteed by the caller, and it
    // came from a call to `Box::into_raw` as also guaranteed by our caller.
    let boxed = unsafe { Box::from_raw(ptr) };
    core::mem::drop(boxed);
}
