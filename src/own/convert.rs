//! Changing the view of a handle.
//!
//! Every conversion in this module keeps the owner of the allocation as it
//! is and only replaces the pointer the handle exposes. The origin address
//! and the disposer therefore survive any chain of conversions unchanged.

use core::ptr::NonNull;

use crate::{
    Own,
    markers::{Local, Mutable, ObjectMarkerFor, Opaque, ReadOnly, SendSync, ThreadSafetyMarker},
};

/// Access to a component of `Self` viewed as a `U`.
///
/// This is how a composite type declares which of its parts can be exposed
/// on their own. A handle to `Self` can then be turned into a handle to `U`
/// with [`Own::upcast`], and the resulting handle still disposes the whole
/// `Self` it came from.
///
/// Every type is trivially an upcast of itself.
///
/// # Examples
///
/// ```
/// use sole::prelude::*;
///
/// trait Named {
///     fn name(&self) -> &str;
/// }
///
/// struct Label(&'static str);
///
/// impl Named for Label {
///     fn name(&self) -> &str {
///         self.0
///     }
/// }
///
/// struct Widget {
///     id: u64,
///     label: Label,
/// }
///
/// impl Upcast<Label> for Widget {
///     fn upcast_ref(&self) -> &Label {
///         &self.label
///     }
///
///     fn upcast_mut(&mut self) -> &mut Label {
///         &mut self.label
///     }
/// }
///
/// let widget: Own<Widget> = Own::new(Widget {
///     id: 3,
///     label: Label("ok"),
/// });
/// let origin = widget.origin_addr();
///
/// let label: Own<Label> = widget.upcast();
/// assert_eq!(label.name(), "ok");
/// assert_eq!(label.origin_addr(), origin);
/// ```
pub trait Upcast<U: ?Sized> {
    /// Returns the `U` component of `self`.
    fn upcast_ref(&self) -> &U;

    /// Returns the `U` component of `self` mutably.
    fn upcast_mut(&mut self) -> &mut U;
}

impl<T: ?Sized> Upcast<T> for T {
    #[inline]
    fn upcast_ref(&self) -> &T {
        self
    }

    #[inline]
    fn upcast_mut(&mut self) -> &mut T {
        self
    }
}

impl<T: ?Sized, A, S> Own<T, A, S> {
    /// Erases the type of the handle completely.
    ///
    /// The returned handle exposes the address at which the original
    /// allocation begins, whatever view `self` exposed. This is the address
    /// of the most-derived object, not of the component `self` happened to
    /// be looking at.
    ///
    /// # Examples
    /// ```
    /// use sole::prelude::*;
    ///
    /// let pair: Own<(u8, u64)> = Own::new((1, 2));
    /// let origin = pair.origin_addr();
    ///
    /// let second: Own<u64> = pair.project_mut(|pair| &mut pair.1);
    /// let opaque: Own<markers::Opaque> = second.into_opaque();
    /// assert_eq!(opaque.addr(), origin);
    /// ```
    #[must_use]
    pub fn into_opaque(self) -> Own<Opaque, A, S> {
        let (_exposed, raw) = self.into_parts();
        let exposed: NonNull<Opaque> = raw.origin().cast::<Opaque>();

        // SAFETY:
        // 1. `Opaque` is zero-sized with an alignment of 1, so any non-null pointer
        //    is valid for reads of it.
        // 2. The same holds for writes, and zero-sized accesses cannot conflict with
        //    any other pointer.
        // 3. The pointer is the origin of `raw`.
        // 4. `raw` is unchanged, and `Opaque` is `Send + Sync`.
        unsafe { Own::from_parts(exposed, raw) }
    }

    /// Gives up the [`SendSync`] guarantee of the handle.
    ///
    /// This is mostly useful for attaching the handle to a [`Local`] one, or
    /// for storing it next to other local handles.
    #[must_use]
    pub fn into_local(self) -> Own<T, A, Local> {
        let (exposed, raw) = self.into_parts();

        // SAFETY:
        // 1. Unchanged from `self`.
        // 2. Unchanged from `self`.
        // 3. Unchanged from `self`.
        // 4. `S = Local`, so there is nothing to uphold.
        unsafe { Own::from_parts(exposed, raw) }
    }
}

impl<T: ?Sized, S> Own<T, Mutable, S> {
    /// Gives up mutable access to the object.
    ///
    /// The conversion is one-way: there is no method to turn a [`ReadOnly`]
    /// handle back into a [`Mutable`] one.
    #[must_use]
    pub fn into_read_only(self) -> Own<T, ReadOnly, S> {
        let (exposed, raw) = self.into_parts();

        // SAFETY:
        // 1. Unchanged from `self`.
        // 2. `A = ReadOnly`, so there is nothing to uphold.
        // 3. Unchanged from `self`.
        // 4. Unchanged from `self`.
        unsafe { Own::from_parts(exposed, raw) }
    }
}

impl<T: ?Sized, S: ThreadSafetyMarker> Own<T, Mutable, S> {
    /// Narrows the view of the handle to a part of the object.
    ///
    /// `f` receives the current view and returns the part the new handle
    /// should expose. The allocation, its disposer and any attachments are
    /// carried over untouched, so the whole object is still disposed when
    /// the new handle is dropped.
    ///
    /// # Examples
    /// ```
    /// use sole::prelude::*;
    ///
    /// let record: Own<(String, Vec<u8>)> = Own::new(("name".to_string(), vec![1, 2]));
    /// let mut bytes: Own<[u8]> = record.project_mut(|(_, bytes)| bytes.as_mut_slice());
    /// bytes[0] = 9;
    /// assert_eq!(&*bytes, &[9, 2]);
    /// ```
    pub fn project_mut<U>(self, f: impl FnOnce(&mut T) -> &mut U) -> Own<U, Mutable, S>
    where
        U: ?Sized + ObjectMarkerFor<S>,
    {
        let (exposed, raw) = self.into_parts();

        // SAFETY: The exposed pointer is valid for writes and unique, and `raw`
        // keeps it alive for the rest of this function.
        let view: &mut T = unsafe { &mut *exposed.as_ptr() };
        let projected: NonNull<U> = NonNull::from(f(view));

        // SAFETY:
        // 1. The projection was borrowed from the unique view of `self`, so it is valid
        //    for as long as the memory the view reached into, which `raw` owns.
        // 2. The old view is gone, so the projection is the only pointer left.
        // 3. `f` can only return memory reachable from the view or `'static` memory.
        // 4. `raw` is unchanged, and `U: ObjectMarkerFor<S>` covers the new view.
        unsafe { Own::from_parts(projected, raw) }
    }

    /// Exposes the `U` component of the object.
    ///
    /// See [`Upcast`] for an example.
    pub fn upcast<U>(self) -> Own<U, Mutable, S>
    where
        T: Upcast<U>,
        U: ?Sized + ObjectMarkerFor<S>,
    {
        self.project_mut(|value| <T as Upcast<U>>::upcast_mut(value))
    }
}

impl<T: ?Sized, S: ThreadSafetyMarker> Own<T, ReadOnly, S> {
    /// Narrows the view of a read-only handle to a part of the object.
    ///
    /// This is the [`ReadOnly`] counterpart of [`Own::project_mut`].
    pub fn project<U>(self, f: impl FnOnce(&T) -> &U) -> Own<U, ReadOnly, S>
    where
        U: ?Sized + ObjectMarkerFor<S>,
    {
        let (exposed, raw) = self.into_parts();

        // SAFETY: The exposed pointer is valid for reads and `raw` keeps it alive for
        // the rest of this function.
        let view: &T = unsafe { &*exposed.as_ptr() };
        let projected: NonNull<U> = NonNull::from(f(view));

        // SAFETY:
        // 1. The projection was borrowed from the view of `self` and nothing mutates
        //    it, so it stays valid for reads while `raw` is alive.
        // 2. `A = ReadOnly`, so there is nothing to uphold.
        // 3. `f` can only return memory reachable from the view or `'static` memory.
        // 4. `raw` is unchanged, and `U: ObjectMarkerFor<S>` covers the new view.
        unsafe { Own::from_parts(projected, raw) }
    }

    /// Exposes the `U` component of the object.
    pub fn upcast<U>(self) -> Own<U, ReadOnly, S>
    where
        T: Upcast<U>,
        U: ?Sized + ObjectMarkerFor<S>,
    {
        self.project(|value| <T as Upcast<U>>::upcast_ref(value))
    }
}

// SAFETY:
// - `as_sized_ptr` returns the exposed pointer of the handle.
// - `replace_ptr` only receives the unsized version of that same pointer, so
//   it addresses the same object and inherits every guarantee the old view had.
unsafe impl<T, U, A, S> unsize::CoerciblePtr<U> for Own<T, A, S>
where
    T: 'static,
    U: ?Sized + 'static,
    A: 'static,
    S: 'static,
{
    type Pointee = T;
    type Output = Own<U, A, S>;

    fn as_sized_ptr(&mut self) -> *mut T {
        self.exposed().as_ptr()
    }

    unsafe fn replace_ptr(self, new: *mut U) -> Own<U, A, S> {
        let (_exposed, raw) = self.into_parts();

        // SAFETY: `new` is derived from the exposed pointer, which is non-null
        let exposed: NonNull<U> = unsafe { NonNull::new_unchecked(new) };

        // SAFETY:
        // 1. `new` addresses the same object as the old view.
        // 2. The old view is gone, so `new` is the only pointer left.
        // 3. Unchanged from `self`.
        // 4. `raw` is unchanged, and unsizing only adds metadata to a pointer to an
        //    object the thread safety marker already covered.
        unsafe { Own::from_parts(exposed, raw) }
    }
}

macro_rules! from_impls {
    ($(
        <$($param:ident),*>: $access1:ty => $access2:ty, $thread_safety1:ty => $thread_safety2:ty, [$($op:ident),*]
    ),* $(,)?) => {
        $(
            impl<T: ?Sized, $($param),*> From<Own<T, $access1, $thread_safety1>> for Own<T, $access2, $thread_safety2> {
                #[inline(always)]
                fn from(own: Own<T, $access1, $thread_safety1>) -> Self {
                    own
                        $(
                            .$op()
                        )*
                }
            }
        )*
    };
}

from_impls!(
    <S>: Mutable => ReadOnly, S => S, [into_read_only],
    <A>: A => A, SendSync => Local, [into_local],
    <>: Mutable => ReadOnly, SendSync => Local, [into_read_only, into_local],
);

#[cfg(test)]
mod tests {
    use alloc::{boxed::Box, string::String, vec, vec::Vec};
    use core::any::TypeId;

    use super::*;

    struct Base(u32);

    struct Derived {
        _pad: [u64; 2],
        base: Base,
    }

    impl Upcast<Base> for Derived {
        fn upcast_ref(&self) -> &Base {
            &self.base
        }

        fn upcast_mut(&mut self) -> &mut Base {
            &mut self.base
        }
    }

    fn derived() -> Own<Derived> {
        Own::new(Derived {
            _pad: [0; 2],
            base: Base(5),
        })
    }

    #[test]
    fn test_upcast_keeps_origin() {
        let value = derived();
        let origin = value.origin_addr();

        let base: Own<Base> = value.upcast();
        assert_ne!(base.addr(), origin);
        assert_eq!(base.origin_addr(), origin);
        assert_eq!(base.origin_type_id(), TypeId::of::<Derived>());
        assert_eq!(base.0, 5);

        let opaque = base.into_opaque();
        assert_eq!(opaque.addr(), origin);
    }

    #[test]
    fn test_identity_upcast() {
        let value: Own<String> = Own::new(String::from("same"));
        let addr = value.addr();
        let value: Own<String> = value.upcast();
        assert_eq!(value.addr(), addr);
    }

    #[test]
    fn test_read_only_project() {
        let value = derived().into_read_only();
        let origin = value.origin_addr();
        let base: Own<Base, ReadOnly> = value.project(|derived| &derived.base);
        assert_eq!(base.0, 5);
        assert_eq!(base.origin_addr(), origin);

        let base: Own<Base, ReadOnly> = derived().into_read_only().upcast();
        assert_eq!(base.0, 5);
    }

    #[test]
    fn test_project_into_owned_buffer() {
        let value: Own<Vec<u8>> = Own::new(vec![1, 2, 3]);
        let bytes: Own<[u8]> = value.project_mut(|bytes| bytes.as_mut_slice());
        assert_eq!(bytes.len(), 3);
        assert_eq!(bytes.origin_type_id(), TypeId::of::<Vec<u8>>());
    }

    #[test]
    fn test_unsize_to_dyn() {
        use core::fmt::Display;

        use unsize::CoerceUnsize;

        let value: Own<String> = Own::new(String::from("dyn"));
        let addr = value.addr();
        let value: Own<dyn Display> = value.unsize(unsize::Coercion!(to dyn Display));
        assert_eq!(value.addr(), addr);
        assert_eq!(alloc::format!("{value}"), "dyn");
    }

    #[test]
    fn test_from_impls() {
        let boxed: Box<u8> = Box::new(1);
        let value: Own<u8> = boxed.into();
        let value: Own<u8, ReadOnly, Local> = value.into();
        assert_eq!(*value, 1);

        let value: Own<u8, Mutable, Local> = Own::<u8>::new(2).into();
        let value: Own<u8, ReadOnly, Local> = value.into();
        assert_eq!(*value, 2);
    }
}
