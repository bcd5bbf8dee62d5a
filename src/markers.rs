//! Marker types and traits for defining access and thread-safety semantics.
//!
//! These markers are used as generic parameters of [`Own<T, A,
//! S>`](crate::Own) to encode compile-time guarantees about how the owned
//! object can be accessed and moved between threads.
//!
//! # Design Philosophy
//!
//! The constraints encoded by these markers are enforced at construction time.
//! It is impossible to construct an [`Own`](crate::Own) that violates the
//! invariants associated with its marker types. This means you can trust that
//! an `Own<_, _, SendSync>` truly owns only `Send + Sync` objects, including
//! everything that was attached to it.
//!
//! # Access Markers
//!
//! - [`Mutable`]: The handle dereferences to `&mut T` as well as `&T`
//! - [`ReadOnly`]: The handle only dereferences to `&T`. Converting a
//!   [`Mutable`] handle into a [`ReadOnly`] one is free and one-way.
//!
//! # Thread Safety Markers
//!
//! - [`SendSync`]: Everything owned by the handle is `Send + Sync`, so the
//!   handle can cross thread boundaries.
//! - [`Local`]: The handle may own non-thread-safe data (like `Rc`) and cannot
//!   be sent between threads.
//!
//! # The Opaque View
//!
//! [`Opaque`] is the view of a handle whose object type has been fully
//! erased. An `Own<Opaque>` still disposes its object correctly, but the only
//! thing it can tell you about it is where it lives.
//!
//! # Examples
//!
//! ```
//! use std::rc::Rc;
//!
//! use sole::prelude::*;
//!
//! // Thread-safe and mutable by default
//! let mut counter: Own<u32> = Own::new(1);
//! *counter += 1;
//!
//! // A read-only view of the same allocation
//! let counter: Own<u32, markers::ReadOnly> = counter.into_read_only();
//! assert_eq!(*counter, 2);
//!
//! // `Rc` is not thread-safe, so the handle has to be local
//! let local: Own<Rc<str>, markers::Mutable, markers::Local> = Own::new_local(Rc::from("local"));
//! # let _ = local;
//! ```

/// Marker type for handles that give out mutable access to their object.
///
/// This is the default access marker. With `Mutable` access, you can:
/// - Dereference the handle mutably through [`DerefMut`](core::ops::DerefMut)
/// - Project into a component with
///   [`project_mut`](crate::Own::project_mut)
/// - Convert into a [`ReadOnly`] handle with
///   [`into_read_only`](crate::Own::into_read_only)
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Mutable;

/// Marker type for handles that only give out shared access to their object.
///
/// This is the counterpart of a pointer-to-const: the handle still uniquely
/// owns the object and still disposes it, but it no longer hands out `&mut`
/// references to it.
///
/// # Examples
///
/// ```
/// use sole::prelude::*;
///
/// let value: Own<String, markers::ReadOnly> = Own::new("frozen".to_string()).into_read_only();
/// assert_eq!(value.len(), 6);
/// // value.push('!'); // ❌ Won't compile - no DerefMut for ReadOnly handles
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct ReadOnly;

/// Marker type indicating that everything owned by a handle is `Send +
/// Sync`.
///
/// Handles with this marker can be sent to other threads and shared between
/// them. Only `Send + Sync` objects can be placed in such a handle, and only
/// other `SendSync` handles can be attached to it.
///
/// # Examples
///
/// ```
/// use sole::prelude::*;
///
/// let value: Own<String, markers::Mutable, markers::SendSync> = Own::new("hello".to_string());
///
/// std::thread::spawn(move || {
///     assert_eq!(*value, "hello");
/// })
/// .join()
/// .unwrap();
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct SendSync;

/// Marker type indicating that a handle may own objects that are not `Send +
/// Sync`.
///
/// Handles with this marker stay on the thread that created them. Any handle
/// can be converted to `Local` with [`into_local`](crate::Own::into_local),
/// but not back.
///
/// # Examples
///
/// ```
/// use std::{cell::Cell, rc::Rc};
///
/// use sole::prelude::*;
///
/// let shared = Rc::new(Cell::new(0));
/// let handle: Own<Rc<Cell<i32>>, markers::Mutable, markers::Local> = Own::new_local(shared.clone());
/// handle.set(7);
/// assert_eq!(shared.get(), 7);
///
/// // std::thread::spawn(move || drop(handle)); // ❌ Won't compile
/// ```
#[derive(Copy, Clone, PartialEq, Eq, PartialOrd, Ord, Debug, Default, Hash)]
pub struct Local;

/// The fully type-erased view of an owned object.
///
/// An [`Own<Opaque>`](crate::Own) exposes only the address at which the
/// original allocation begins. It is obtained through
/// [`into_opaque`](crate::Own::into_opaque) and is mostly useful for keeping
/// objects alive, for instance by [attaching](crate::Own::attach) them to
/// another handle.
///
/// No value of this type is ever created; it only appears behind pointers.
#[allow(missing_copy_implementations)]
pub struct Opaque {
    _private: [u8; 0],
}

mod sealed_thread_safety_marker {
    use super::*;

    pub trait Sealed: 'static {}

    impl Sealed for SendSync {}
    impl Sealed for Local {}
}

/// Marker trait for the thread safety markers [`SendSync`] and [`Local`].
///
/// This trait is sealed and cannot be implemented outside this crate.
pub trait ThreadSafetyMarker: sealed_thread_safety_marker::Sealed {}

impl ThreadSafetyMarker for SendSync {}
impl ThreadSafetyMarker for Local {}

/// Marker trait combining an object type with a thread safety marker.
///
/// Every `'static` type implements `ObjectMarkerFor<Local>`, while only types
/// that are `Send + Sync` implement `ObjectMarkerFor<SendSync>`. Constructors
/// of [`Own`](crate::Own) use this bound to make sure a [`SendSync`] handle
/// never owns anything that must stay on its thread.
pub trait ObjectMarkerFor<T: ThreadSafetyMarker>: 'static {}

impl<O: ?Sized + 'static> ObjectMarkerFor<Local> for O {}

impl<O: ?Sized + 'static> ObjectMarkerFor<SendSync> for O where O: Send + Sync {}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, string::String};

    use super::*;

    #[test]
    fn test_object_markers() {
        static_assertions::assert_impl_all!(String: ObjectMarkerFor<SendSync>, ObjectMarkerFor<Local>);
        static_assertions::assert_impl_all!(Rc<String>: ObjectMarkerFor<Local>);
        static_assertions::assert_not_impl_any!(Rc<String>: ObjectMarkerFor<SendSync>);
        static_assertions::assert_impl_all!(Opaque: ObjectMarkerFor<Local>);
    }

    #[test]
    fn test_opaque_is_zero_sized() {
        assert_eq!(core::mem::size_of::<Opaque>(), 0);
        assert_eq!(core::mem::align_of::<Opaque>(), 1);
    }
}
