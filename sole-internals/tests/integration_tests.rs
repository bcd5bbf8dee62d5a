//! Integration tests for the type-erased owner of sole-internals.
//!
//! ## Disposal
//! - `test_dispose_uses_original_type`: an owner created for a type with a
//!   nontrivial destructor runs exactly that destructor once
//! - `test_dispose_zero_sized`: zero-sized objects get an owner and a disposer
//!   like any other type
//!
//! ## Bundles
//! - `test_bundle_origin_and_order`: the origin of a bundle is the origin of
//!   its primary, and the release order is primary first
//! - `test_bundle_of_bundles`: attaching bundles to bundles keeps every
//!   nested order intact
//! - `test_bundle_release_under_panic`: a panicking destructor in the primary
//!   still releases the attached owners

use std::{
    any::TypeId,
    cell::RefCell,
    panic::{AssertUnwindSafe, catch_unwind},
    rc::Rc,
};

use sole_internals::RawOwn;

type Log = Rc<RefCell<Vec<&'static str>>>;

struct Named {
    name: &'static str,
    log: Log,
}

impl Drop for Named {
    fn drop(&mut self) {
        self.log.borrow_mut().push(self.name);
    }
}

fn named(name: &'static str, log: &Log) -> RawOwn {
    RawOwn::new(Named {
        name,
        log: log.clone(),
    })
}

#[test]
fn test_dispose_uses_original_type() {
    let log = Log::default();
    let owner = named("only", &log);
    assert_eq!(owner.origin_type_id(), TypeId::of::<Named>());
    assert_eq!(owner.origin_type_name(), std::any::type_name::<Named>());
    assert!(!owner.is_bundle());

    drop(owner);
    assert_eq!(*log.borrow(), ["only"]);
}

#[test]
fn test_dispose_zero_sized() {
    struct Marker;

    let owner = RawOwn::new(Marker);
    assert_eq!(owner.origin_type_id(), TypeId::of::<Marker>());
    let owner = RawOwn::try_new(Marker).unwrap();
    assert_eq!(owner.attached_len(), 0);
}

#[test]
fn test_bundle_origin_and_order() {
    let log = Log::default();
    let primary = named("primary", &log);
    let origin = primary.origin();

    let bundle = primary.attach([named("first", &log), named("second", &log)]);
    assert!(bundle.is_bundle());
    assert_eq!(bundle.origin(), origin);
    assert_eq!(bundle.origin_type_id(), TypeId::of::<Named>());
    assert_eq!(bundle.attached_len(), 2);

    let bundle = bundle.attach(Some(named("third", &log)));
    assert_eq!(bundle.attached_len(), 3);

    drop(bundle);
    assert_eq!(*log.borrow(), ["primary", "first", "second", "third"]);
}

#[test]
fn test_bundle_of_bundles() {
    let log = Log::default();
    let left = named("a", &log).attach([named("b", &log)]);
    let right = named("c", &log).attach([named("d", &log)]);
    let outer = named("root", &log).attach([left, right]);
    assert_eq!(outer.attached_len(), 2);

    drop(outer);
    assert_eq!(*log.borrow(), ["root", "a", "b", "c", "d"]);
}

#[test]
fn test_bundle_release_under_panic() {
    struct Exploding;

    impl Drop for Exploding {
        fn drop(&mut self) {
            panic!("exploding destructor");
        }
    }

    let log = Log::default();
    let bundle = RawOwn::new(Exploding).attach([named("survivor", &log)]);

    let result = catch_unwind(AssertUnwindSafe(move || drop(bundle)));
    assert!(result.is_err());
    assert_eq!(*log.borrow(), ["survivor"]);
}
