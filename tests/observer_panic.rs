use std::{
    panic::{AssertUnwindSafe, catch_unwind},
    sync::{
        Arc,
        atomic::{AtomicUsize, Ordering},
    },
};

use sole::{
    hooks::{Hooks, OwnEvent, OwnObserver},
    prelude::*,
};

struct Counted(Arc<AtomicUsize>);

impl Drop for Counted {
    fn drop(&mut self) {
        self.0.fetch_add(1, Ordering::SeqCst);
    }
}

struct PanickingObserver;

impl OwnObserver for PanickingObserver {
    fn on_dispose(&self, _event: &OwnEvent) {
        panic!("observer failed");
    }
}

// Hooks are global, so everything runs in a single test
#[test]
fn test_dispose_completes_when_observer_panics() {
    Hooks::new()
        .observer_for::<Counted, _>(PanickingObserver)
        .install()
        .unwrap();

    let drops = Arc::new(AtomicUsize::new(0));
    let value: Own<Counted> = Own::new(Counted(drops.clone()));
    let result = catch_unwind(AssertUnwindSafe(move || drop(value)));
    assert!(result.is_err());
    assert_eq!(drops.load(Ordering::SeqCst), 1);

    // Attached handles are released along with the primary
    let attached = Arc::new(AtomicUsize::new(0));
    let value: Own<Counted> = Own::new(Counted(drops.clone()));
    let bundle = value.attach((
        Own::<Counted>::new(Counted(attached.clone())),
        Own::<Counted>::new(Counted(attached.clone())),
    ));
    let result = catch_unwind(AssertUnwindSafe(move || drop(bundle)));
    assert!(result.is_err());
    assert_eq!(drops.load(Ordering::SeqCst), 2);
    assert_eq!(attached.load(Ordering::SeqCst), 2);
}
