//! Attachment bundles.
//!
//! Attaching owners to a primary [`RawOwn`] moves all of them into a single
//! heap-allocated [`ReleaseList`], which is itself owned by a new [`RawOwn`].
//! Disposing that owner drops the list, which releases the primary first and
//! then every attached owner in the order it was attached.
//!
//! Attaching to an owner that already is a bundle does not nest a second
//! list: the new owners are appended to the existing one. A release list
//! therefore never contains another release list as its primary, and the
//! origin of a bundle is always reachable in one step.

use alloc::vec::Vec;
use core::{any::TypeId, ptr::NonNull};

use crate::disposer::RawOwn;

/// The allocation behind an attachment bundle.
///
/// Field order is the release order.
pub(crate) struct ReleaseList {
    /// The owner whose object the bundle exposes. Released first.
    primary: RawOwn,
    /// Owners whose lifetime was tied to `primary`, released front to back
    /// after it.
    attached: Vec<RawOwn>,
}

impl RawOwn {
    /// Returns the release list backing this owner, if it is a bundle.
    #[inline]
    fn release_list(&self) -> Option<&ReleaseList> {
        self.downcast_ref::<ReleaseList>()
    }

    /// Returns the owner of the object this owner exposes.
    ///
    /// This is `self` unless `self` is a bundle, in which case it is the
    /// bundle's primary.
    #[inline]
    fn primary(&self) -> &RawOwn {
        match self.release_list() {
            Some(list) => &list.primary,
            None => self,
        }
    }

    /// Returns the address at which the owned object begins.
    ///
    /// For a bundle this is the origin of its primary, so attaching never
    /// changes the origin of a handle.
    #[inline]
    pub fn origin(&self) -> NonNull<()> {
        self.primary().allocation().cast::<()>()
    }

    /// Returns the [`TypeId`] of the object that was originally allocated.
    #[inline]
    pub fn origin_type_id(&self) -> TypeId {
        self.primary().allocation_type_id()
    }

    /// Returns the [`core::any::type_name`] of the object that was originally
    /// allocated.
    #[inline]
    pub fn origin_type_name(&self) -> &'static str {
        self.primary().allocation_type_name()
    }

    /// Returns `true` if this owner is an attachment bundle.
    #[inline]
    pub fn is_bundle(&self) -> bool {
        self.release_list().is_some()
    }

    /// Returns the number of owners attached to this one.
    #[inline]
    pub fn attached_len(&self) -> usize {
        self.release_list().map_or(0, |list| list.attached.len())
    }

    /// Ties the lifetime of every owner in `attached` to `self`.
    ///
    /// The returned owner has the same [`origin`](RawOwn::origin) as `self`.
    /// When it is dropped, `self` is disposed first, followed by each
    /// attached owner in iteration order. Attaching to a bundle appends to it.
    ///
    /// If `attached` is empty, `self` is returned unchanged and nothing is
    /// allocated.
    pub fn attach<I>(mut self, attached: I) -> RawOwn
    where
        I: IntoIterator<Item = RawOwn>,
    {
        let mut attached = attached.into_iter().peekable();
        if attached.peek().is_none() {
            return self;
        }

        if let Some(list) = self.downcast_mut::<ReleaseList>() {
            list.attached.extend(attached);
            return self;
        }

        RawOwn::new(ReleaseList {
            primary: self,
            attached: attached.collect(),
        })
    }
}

#[cfg(test)]
mod tests {
    use alloc::{rc::Rc, vec, vec::Vec};
    use core::cell::RefCell;

    use super::*;

    struct Recorder {
        id: u32,
        log: Rc<RefCell<Vec<u32>>>,
    }

    impl Drop for Recorder {
        fn drop(&mut self) {
            self.log.borrow_mut().push(self.id);
        }
    }

    fn recorder(id: u32, log: &Rc<RefCell<Vec<u32>>>) -> RawOwn {
        RawOwn::new(Recorder {
            id,
            log: log.clone(),
        })
    }

    #[test]
    fn test_attach_nothing_is_identity() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let owner = recorder(1, &log);
        let origin = owner.origin();

        let owner = owner.attach(core::iter::empty());
        assert!(!owner.is_bundle());
        assert_eq!(owner.origin(), origin);
        assert_eq!(owner.origin_type_id(), TypeId::of::<Recorder>());
    }

    #[test]
    fn test_attach_release_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let primary = recorder(1, &log);
        let origin = primary.origin();

        let bundle = primary.attach([recorder(2, &log), recorder(3, &log)]);
        assert!(bundle.is_bundle());
        assert_eq!(bundle.attached_len(), 2);
        assert_eq!(bundle.origin(), origin);
        assert_eq!(bundle.origin_type_id(), TypeId::of::<Recorder>());
        assert_ne!(bundle.allocation().cast::<()>(), origin);
        assert!(log.borrow().is_empty());

        drop(bundle);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_chained_attach_is_flattened() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let bundle = recorder(1, &log)
            .attach([recorder(2, &log)])
            .attach([recorder(3, &log)]);

        // One flat list, not a list inside a list
        assert_eq!(bundle.attached_len(), 2);
        assert_eq!(bundle.origin_type_name(), core::any::type_name::<Recorder>());

        drop(bundle);
        assert_eq!(*log.borrow(), vec![1, 2, 3]);
    }

    #[test]
    fn test_attached_bundle_keeps_its_order() {
        let log = Rc::new(RefCell::new(Vec::new()));
        let inner = recorder(2, &log).attach([recorder(3, &log)]);
        let outer = recorder(1, &log).attach([inner, recorder(4, &log)]);
        assert_eq!(outer.attached_len(), 2);

        drop(outer);
        assert_eq!(*log.borrow(), vec![1, 2, 3, 4]);
    }
}
