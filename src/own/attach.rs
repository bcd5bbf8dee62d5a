use alloc::vec::Vec;

use sole_internals::RawOwn;

use crate::{
    Own,
    hooks::observer::{self, Phase},
    markers::{Local, SendSync, ThreadSafetyMarker},
};

mod sealed {
    use alloc::vec::Vec;

    use sole_internals::RawOwn;

    pub trait Sealed<S> {
        /// Moves every owner in `self` to the back of `list`, in order.
        fn push_owners(self, list: &mut Vec<RawOwn>);
    }
}

/// Values that can be [attached](Own::attach) to a handle with thread safety
/// `S`.
///
/// This is implemented for:
/// - Single handles. A [`SendSync`] handle only accepts other [`SendSync`]
///   handles, while a [`Local`] handle accepts any handle.
/// - `Option`s of attachments, where `None` attaches nothing.
/// - Tuples of up to twelve attachments, including the empty tuple.
/// - Arrays and `Vec`s of attachments.
///
/// Attachments are released in the order they appear in, so a tuple
/// `(a, b)` releases `a` before `b`.
///
/// This trait is sealed and cannot be implemented outside this crate.
pub trait Attachments<S: ThreadSafetyMarker>: sealed::Sealed<S> {}

impl<U: ?Sized, A> sealed::Sealed<SendSync> for Own<U, A, SendSync> {
    fn push_owners(self, list: &mut Vec<RawOwn>) {
        let (_exposed, raw) = self.into_parts();
        list.push(raw);
    }
}
impl<U: ?Sized, A> Attachments<SendSync> for Own<U, A, SendSync> {}

impl<U: ?Sized, A, S> sealed::Sealed<Local> for Own<U, A, S> {
    fn push_owners(self, list: &mut Vec<RawOwn>) {
        let (_exposed, raw) = self.into_parts();
        list.push(raw);
    }
}
impl<U: ?Sized, A, S> Attachments<Local> for Own<U, A, S> {}

impl<S: ThreadSafetyMarker, X: Attachments<S>> sealed::Sealed<S> for Option<X> {
    fn push_owners(self, list: &mut Vec<RawOwn>) {
        if let Some(attachments) = self {
            attachments.push_owners(list);
        }
    }
}
impl<S: ThreadSafetyMarker, X: Attachments<S>> Attachments<S> for Option<X> {}

impl<S: ThreadSafetyMarker, X: Attachments<S>, const N: usize> sealed::Sealed<S> for [X; N] {
    fn push_owners(self, list: &mut Vec<RawOwn>) {
        list.reserve(N);
        for attachments in self {
            attachments.push_owners(list);
        }
    }
}
impl<S: ThreadSafetyMarker, X: Attachments<S>, const N: usize> Attachments<S> for [X; N] {}

impl<S: ThreadSafetyMarker, X: Attachments<S>> sealed::Sealed<S> for Vec<X> {
    fn push_owners(self, list: &mut Vec<RawOwn>) {
        list.reserve(self.len());
        for attachments in self {
            attachments.push_owners(list);
        }
    }
}
impl<S: ThreadSafetyMarker, X: Attachments<S>> Attachments<S> for Vec<X> {}

macro_rules! tuple_impls {
    ($($name:ident),*) => {
        impl<S: ThreadSafetyMarker, $($name: Attachments<S>),*> sealed::Sealed<S> for ($($name,)*) {
            #[allow(non_snake_case, unused_variables)]
            fn push_owners(self, list: &mut Vec<RawOwn>) {
                let ($($name,)*) = self;
                $(
                    $name.push_owners(list);
                )*
            }
        }
        impl<S: ThreadSafetyMarker, $($name: Attachments<S>),*> Attachments<S> for ($($name,)*) {}
    };
}

tuple_impls!();
tuple_impls!(A1);
tuple_impls!(A1, A2);
tuple_impls!(A1, A2, A3);
tuple_impls!(A1, A2, A3, A4);
tuple_impls!(A1, A2, A3, A4, A5);
tuple_impls!(A1, A2, A3, A4, A5, A6);
tuple_impls!(A1, A2, A3, A4, A5, A6, A7);
tuple_impls!(A1, A2, A3, A4, A5, A6, A7, A8);
tuple_impls!(A1, A2, A3, A4, A5, A6, A7, A8, A9);
tuple_impls!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10);
tuple_impls!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11);
tuple_impls!(A1, A2, A3, A4, A5, A6, A7, A8, A9, A10, A11, A12);

impl<T: ?Sized, A, S: ThreadSafetyMarker> Own<T, A, S> {
    /// Ties the lifetime of other handles to this one.
    ///
    /// The returned handle exposes exactly what `self` exposed and has the
    /// same origin. When it is dropped, the object of `self` is disposed
    /// first, and then everything in `attachments`, in order. Attaching more
    /// handles later appends to the same release order.
    ///
    /// Attaching nothing (an empty tuple, array or `Vec`, or `None`) returns
    /// `self` unchanged.
    ///
    /// # Examples
    /// ```
    /// use sole::prelude::*;
    ///
    /// let buffer: Own<Vec<u8>> = Own::new(vec![0; 16]);
    /// let cursor: Own<usize> = Own::new(4);
    /// let addr = cursor.addr();
    ///
    /// // The cursor keeps the buffer alive
    /// let cursor = cursor.attach(buffer);
    /// assert_eq!(*cursor, 4);
    /// assert_eq!(cursor.addr(), addr);
    /// assert_eq!(cursor.attached_len(), 1);
    /// ```
    #[must_use]
    pub fn attach<B: Attachments<S>>(self, attachments: B) -> Self {
        let mut owners = Vec::new();
        attachments.push_owners(&mut owners);
        if owners.is_empty() {
            return self;
        }

        let (exposed, raw) = self.into_parts();
        let raw = raw.attach(owners);
        observer::dispatch(&raw, Phase::Attach);

        // SAFETY:
        // 1. The object behind `exposed` is still owned by the primary of `raw`, and
        //    attaching never moves it.
        // 2. Unchanged from `self`.
        // 3. Memory owned by the old owner is now owned transitively by `raw`.
        // 4. If `S = SendSync`, the `Attachments<SendSync>` bound only admits handles
        //    that are `SendSync` themselves.
        unsafe { Own::from_parts(exposed, raw) }
    }
}
