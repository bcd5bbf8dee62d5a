use core::any::TypeId;

use sole_internals::RawOwn;

use super::HookData;

/// A lifecycle event of a handle.
///
/// Events describe the *origin* of the handle: the object that was
/// originally allocated, regardless of what view the handle currently
/// exposes.
#[derive(Copy, Clone, Debug)]
pub struct OwnEvent {
    origin: *const (),
    type_id: TypeId,
    type_name: &'static str,
    attached: usize,
}

impl OwnEvent {
    fn from_raw(raw: &RawOwn) -> Self {
        Self {
            origin: raw.origin().as_ptr().cast_const(),
            type_id: raw.origin_type_id(),
            type_name: raw.origin_type_name(),
            attached: raw.attached_len(),
        }
    }

    /// The address at which the originally allocated object begins.
    ///
    /// The address is only meaningful for identifying the object; it must
    /// not be dereferenced.
    #[must_use]
    pub fn origin(&self) -> *const () {
        self.origin
    }

    /// The [`TypeId`] of the originally allocated object.
    #[must_use]
    pub fn type_id(&self) -> TypeId {
        self.type_id
    }

    /// The [`core::any::type_name`] of the originally allocated object.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }

    /// How many handles are attached to the handle at this point.
    #[must_use]
    pub fn attached(&self) -> usize {
        self.attached
    }
}

/// Receives lifecycle events of handles.
///
/// All methods do nothing by default, so an observer only needs to implement
/// the events it is interested in.
pub trait OwnObserver: Send + Sync + 'static {
    /// Called after a new object has been allocated and wrapped in a handle.
    fn on_allocate(&self, event: &OwnEvent) {
        let _ = event;
    }

    /// Called after handles have been attached to a handle.
    ///
    /// [`OwnEvent::attached`] is the total number of attached handles,
    /// including those attached earlier.
    fn on_attach(&self, event: &OwnEvent) {
        let _ = event;
    }

    /// Called right before a handle disposes everything it owns.
    ///
    /// Handles that were attached to another handle are not reported
    /// individually; they are disposed as part of the handle they were
    /// attached to.
    fn on_dispose(&self, event: &OwnEvent) {
        let _ = event;
    }
}

#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub(crate) enum Phase {
    Allocate,
    Attach,
    Dispose,
}

/// Notifies the installed observers about `raw`.
#[inline]
pub(crate) fn dispatch(raw: &RawOwn, phase: Phase) {
    let Some(hooks) = HookData::fetch() else {
        return;
    };

    let event = OwnEvent::from_raw(raw);
    for observer in hooks.observers_for(event.type_id) {
        match phase {
            Phase::Allocate => observer.on_allocate(&event),
            Phase::Attach => observer.on_attach(&event),
            Phase::Dispose => observer.on_dispose(&event),
        }
    }
}

#[cfg(test)]
mod tests {
    use alloc::string::String;

    use super::*;

    #[test]
    fn test_event_from_raw() {
        let raw = RawOwn::new(String::from("event"));
        let event = OwnEvent::from_raw(&raw);
        assert_eq!(event.origin(), raw.origin().as_ptr().cast_const());
        assert_eq!(event.type_id(), TypeId::of::<String>());
        assert_eq!(event.type_name(), core::any::type_name::<String>());
        assert_eq!(event.attached(), 0);

        let raw = raw.attach([RawOwn::new(1_u8)]);
        let event = OwnEvent::from_raw(&raw);
        assert_eq!(event.type_id(), TypeId::of::<String>());
        assert_eq!(event.attached(), 1);
    }
}
