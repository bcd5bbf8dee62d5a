//! Process-wide observation of handle lifecycles.
//!
//! Hooks let an application watch every [`Own`](crate::Own) as it is
//! allocated, bundled with attachments and finally disposed. Nothing is
//! observed until hooks are installed, and handles created before
//! installation are reported from that point on.
//!
//! # Quick Start
//!
//! ```rust
//! use std::sync::atomic::{AtomicUsize, Ordering};
//!
//! use sole::{
//!     hooks::{Hooks, OwnEvent, OwnObserver},
//!     prelude::*,
//! };
//!
//! static LIVE: AtomicUsize = AtomicUsize::new(0);
//!
//! struct LiveCounter;
//!
//! impl OwnObserver for LiveCounter {
//!     fn on_allocate(&self, _event: &OwnEvent) {
//!         LIVE.fetch_add(1, Ordering::Relaxed);
//!     }
//!
//!     fn on_dispose(&self, _event: &OwnEvent) {
//!         LIVE.fetch_sub(1, Ordering::Relaxed);
//!     }
//! }
//!
//! Hooks::new()
//!     .observer(LiveCounter)
//!     .install()
//!     .expect("failed to install hooks");
//!
//! let value: Own<u32> = Own::new(1);
//! assert_eq!(LIVE.load(Ordering::Relaxed), 1);
//! drop(value);
//! assert_eq!(LIVE.load(Ordering::Relaxed), 0);
//! ```
//!
//! Observers run synchronously on the thread that triggers the event, so
//! they should be quick. They may create and drop handles themselves.

pub(crate) mod observer;

use alloc::{boxed::Box, vec::Vec};
use core::{
    any::TypeId,
    panic::Location,
    ptr::NonNull,
    sync::atomic::{AtomicPtr, Ordering},
};

use hashbrown::HashMap;
use triomphe::Arc;
use unsize::CoerceUnsize;

pub use self::observer::{OwnEvent, OwnObserver};

type StoredObserver = Arc<dyn OwnObserver>;

/// Builder for configuring and installing hooks globally.
///
/// # Examples
///
/// Observing every handle, plus a second observer for a single type:
/// ```rust
/// use sole::hooks::{Hooks, OwnEvent, OwnObserver};
///
/// struct Everything;
/// impl OwnObserver for Everything {}
///
/// struct Sessions;
/// impl OwnObserver for Sessions {
///     fn on_dispose(&self, event: &OwnEvent) {
///         println!("session at {:p} closed", event.origin());
///     }
/// }
///
/// struct Session;
///
/// Hooks::new()
///     .observer(Everything)
///     .observer_for::<Session, _>(Sessions)
///     .install()
///     .expect("failed to install hooks");
/// ```
#[derive(Clone)]
pub struct Hooks(Box<HookData>);

impl Default for Hooks {
    fn default() -> Self {
        Self::new()
    }
}

impl core::fmt::Debug for Hooks {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("Hooks")
            .field("observers", &self.0.observers.len())
            .field("typed_observers", &self.0.typed_observers.len())
            .field("created_at", &self.0.created_at)
            .finish()
    }
}

#[derive(Clone)]
pub(crate) struct HookData {
    observers: Vec<StoredObserver>,
    typed_observers: HashMap<TypeId, Vec<StoredObserver>, rustc_hash::FxBuildHasher>,
    created_at: &'static Location<'static>,
}

/// Error returned when attempting to install hooks when they're already
/// installed.
///
/// Contains the hooks that were attempted to be installed, allowing you to
/// recover them if needed.
pub struct HooksAlreadyInstalledError(pub Hooks);

impl core::fmt::Debug for HooksAlreadyInstalledError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        f.debug_struct("HooksAlreadyInstalledError").finish()
    }
}

impl core::fmt::Display for HooksAlreadyInstalledError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(f, "hooks are already installed globally")
    }
}

impl core::error::Error for HooksAlreadyInstalledError {}

impl Hooks {
    /// Creates an empty `Hooks` builder.
    #[track_caller]
    #[must_use]
    pub fn new() -> Self {
        Self(Box::new(HookData {
            observers: Vec::new(),
            typed_observers: HashMap::default(),
            created_at: Location::caller(),
        }))
    }

    /// Registers an observer for every handle, whatever it owns.
    ///
    /// Observers are notified in the order they were registered.
    #[must_use]
    pub fn observer<O>(mut self, observer: O) -> Self
    where
        O: OwnObserver,
    {
        self.0.observers.push(store(observer));
        self
    }

    /// Registers an observer for handles whose originally allocated object
    /// is a `T`.
    ///
    /// The type is matched against the origin of the handle, so the observer
    /// still fires after the handle has been projected, erased or bundled.
    /// Typed observers are notified after the observers registered with
    /// [`observer`](Self::observer).
    #[must_use]
    pub fn observer_for<T, O>(mut self, observer: O) -> Self
    where
        T: 'static,
        O: OwnObserver,
    {
        self.0
            .typed_observers
            .entry(TypeId::of::<T>())
            .or_default()
            .push(store(observer));
        self
    }

    /// Returns `true` if no observer has been registered.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    /// Installs the hooks globally.
    ///
    /// If hooks are already installed, returns an error
    /// [`HooksAlreadyInstalledError`], containing the hooks that were attempted
    /// to be installed.
    ///
    /// See also [`replace`](Self::replace) which will replace any existing
    /// hooks without erroring.
    ///
    /// # Memory Management
    ///
    /// After installing hooks globally, the memory for the hooks will be
    /// leaked and remain for the lifetime of the program. This happens even
    /// if the hooks are later replaced with other hooks.
    pub fn install(self) -> Result<(), HooksAlreadyInstalledError> {
        let leaked = self.leak();
        if INSTALLED.install_if_empty(leaked.hook_data) {
            return Ok(());
        }

        // SAFETY: The slot was occupied, so `leaked` was never published and
        // this is the only handle to it.
        let hooks = unsafe { leaked.reclaim() };
        Err(HooksAlreadyInstalledError(hooks))
    }

    /// Replaces the currently installed hooks with `self`.
    ///
    /// Returns the previously installed hooks, if any, as a [`LeakedHooks`]
    /// handle.
    ///
    /// # Memory Management
    ///
    /// The same as for [`install`](Self::install): the hooks are leaked.
    pub fn replace(self) -> Option<LeakedHooks> {
        self.leak().replace()
    }

    /// Leaks the hooks, returning a [`LeakedHooks`] handle.
    ///
    /// This is useful for installing the hooks later using
    /// [`LeakedHooks::replace`].
    #[must_use]
    pub fn leak(self) -> LeakedHooks {
        let hook_data = NonNull::from(Box::leak(self.0));
        LeakedHooks { hook_data }
    }
}

/// Hooks living in static memory, ready to be swapped in and out of the
/// global slot.
#[derive(Copy, Clone, Debug)]
pub struct LeakedHooks {
    /// Comes from `Box::leak` and stays valid until [`LeakedHooks::reclaim`].
    hook_data: NonNull<HookData>,
}

impl LeakedHooks {
    /// Fetches the currently installed hooks, if any.
    #[must_use]
    pub fn fetch_current_hooks() -> Option<Self> {
        INSTALLED.current().map(|hook_data| Self { hook_data })
    }

    /// Replaces the currently installed hooks with `self`.
    ///
    /// Returns the previously installed hooks, if any.
    pub fn replace(self) -> Option<LeakedHooks> {
        INSTALLED
            .swap(self.hook_data)
            .map(|hook_data| Self { hook_data })
    }

    /// Turns the leaked hooks back into an owned [`Hooks`], freeing them once
    /// it is dropped.
    ///
    /// # Safety
    ///
    /// The hooks must not be installed, no observer call made while they were
    /// installed may still be running, and no copy of this `LeakedHooks` may
    /// be used afterwards.
    pub unsafe fn reclaim(self) -> Hooks {
        // SAFETY: `hook_data` came from `Box::leak` and the caller guarantees
        // it is no longer shared.
        Hooks(unsafe { Box::from_raw(self.hook_data.as_ptr()) })
    }
}

fn store<O: OwnObserver>(observer: O) -> StoredObserver {
    Arc::new(observer).unsize(unsize::Coercion!(to dyn OwnObserver))
}

impl HookData {
    fn is_empty(&self) -> bool {
        self.observers.is_empty() && self.typed_observers.is_empty()
    }

    /// Fetches the globally installed hooks, unless none are installed or
    /// none of them observe anything.
    pub(crate) fn fetch() -> Option<&'static HookData> {
        let ptr = INSTALLED.current()?;

        // SAFETY: Installed pointers come from `Box::leak`, and `reclaim`
        // forbids freeing them while they may still be read here.
        let hooks = unsafe { ptr.as_ref() };

        (!hooks.is_empty()).then_some(hooks)
    }

    /// Returns every observer interested in objects of type `type_id`, in
    /// notification order.
    pub(crate) fn observers_for(&self, type_id: TypeId) -> impl Iterator<Item = &dyn OwnObserver> {
        let typed = self
            .typed_observers
            .get(&type_id)
            .map(Vec::as_slice)
            .unwrap_or_default();

        self.observers
            .iter()
            .chain(typed)
            .map(|observer| &**observer)
    }
}

/// The process-wide slot for the installed hooks.
///
/// Holds null or a pointer obtained from [`LeakedHooks`]. Stores publish with
/// release ordering and loads use acquire, so observers see fully built
/// [`HookData`].
struct HookSlot(AtomicPtr<HookData>);

impl HookSlot {
    fn current(&self) -> Option<NonNull<HookData>> {
        NonNull::new(self.0.load(Ordering::Acquire))
    }

    /// Stores `hooks` if the slot is empty. Returns whether it was stored.
    fn install_if_empty(&self, hooks: NonNull<HookData>) -> bool {
        self.0
            .compare_exchange(
                core::ptr::null_mut(),
                hooks.as_ptr(),
                Ordering::Release,
                Ordering::Relaxed,
            )
            .is_ok()
    }

    fn swap(&self, hooks: NonNull<HookData>) -> Option<NonNull<HookData>> {
        NonNull::new(self.0.swap(hooks.as_ptr(), Ordering::AcqRel))
    }
}

static INSTALLED: HookSlot = HookSlot(AtomicPtr::new(core::ptr::null_mut()));

#[cfg(test)]
mod tests {
    use super::*;

    struct Silent;
    impl OwnObserver for Silent {}

    #[test]
    fn test_hooks_send_sync() {
        static_assertions::assert_impl_all!(Hooks: Send, Sync, Clone);
        static_assertions::assert_impl_all!(HooksAlreadyInstalledError: core::error::Error);
    }

    #[test]
    fn test_builder() {
        let hooks = Hooks::new();
        assert!(hooks.is_empty());

        let hooks = hooks
            .observer(Silent)
            .observer_for::<u8, _>(Silent)
            .observer_for::<u8, _>(Silent);
        assert!(!hooks.is_empty());
        assert_eq!(hooks.0.observers_for(TypeId::of::<u8>()).count(), 3);
        assert_eq!(hooks.0.observers_for(TypeId::of::<u16>()).count(), 1);

        // Never installed, so it can be reclaimed
        let leaked = hooks.leak();
        // SAFETY: The hooks were never installed and `leaked` is not used again.
        let hooks = unsafe { leaked.reclaim() };
        assert_eq!(hooks.0.observers.len(), 1);
    }

    #[test]
    fn test_already_installed_error() {
        let error = HooksAlreadyInstalledError(Hooks::new());
        assert_eq!(
            alloc::format!("{error}"),
            "hooks are already installed globally"
        );
    }
}
