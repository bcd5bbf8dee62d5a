//! Empty handles.
//!
//! A handle that owns nothing is an `Option<Own<T>>` holding `None`. The
//! niche of the exposed pointer makes the `Option` exactly as large as the
//! handle itself. The [`OptionOwnExt`] trait adds the operations an optional
//! owner needs on top of what `Option` already provides.
//!
//! # Quick Start
//!
//! ```
//! use sole::{option_ext::OptionOwnExt, prelude::*};
//!
//! let mut slot: Option<Own<String>> = None;
//! assert!(slot.get_ptr().is_null());
//!
//! slot.assign(Own::new("first".to_string()));
//! slot.assign(Own::new("second".to_string())); // "first" is disposed here
//! assert_eq!(slot.as_deref().map(String::as_str), Some("second"));
//!
//! slot.reset();
//! assert!(slot.ok_or_empty().is_err());
//! ```

use crate::Own;

/// Error returned by [`OptionOwnExt::ok_or_empty`] for an empty handle.
///
/// # Examples
///
/// ```
/// use sole::option_ext::EmptyHandleError;
///
/// let error = EmptyHandleError::new::<String>();
/// assert!(format!("{error}").contains("String"));
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct EmptyHandleError {
    /// The type name of the view the handle would have exposed.
    type_name: &'static str,
}

impl EmptyHandleError {
    /// Creates a new `EmptyHandleError` for a handle viewing a `T`.
    #[must_use]
    pub fn new<T: ?Sized>() -> Self {
        Self {
            type_name: core::any::type_name::<T>(),
        }
    }

    /// Returns the type name of the view the handle would have exposed.
    #[must_use]
    pub fn type_name(&self) -> &'static str {
        self.type_name
    }
}

impl core::fmt::Display for EmptyHandleError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "Expected a handle to {}, but the handle is empty",
            self.type_name
        )
    }
}

impl core::error::Error for EmptyHandleError {}

/// Extension trait for optional handles.
pub trait OptionOwnExt<T: ?Sized + 'static, A: 'static, S: 'static> {
    /// Disposes the owned object, if any, and leaves the handle empty.
    ///
    /// Resetting an empty handle does nothing.
    fn reset(&mut self);

    /// Disposes the owned object, if any, and then takes ownership of
    /// `value`.
    ///
    /// The old object is gone before the new one is stored, so a destructor
    /// that inspects the slot sees it empty rather than already replaced.
    fn assign(&mut self, value: Own<T, A, S>);

    /// Returns the exposed pointer, or null for an empty handle.
    fn get_ptr(&self) -> *const T
    where
        T: Sized;

    /// Converts an empty handle into an [`EmptyHandleError`].
    ///
    /// # Examples
    ///
    /// ```
    /// use sole::{option_ext::OptionOwnExt, prelude::*};
    ///
    /// let slot: Option<Own<u8>> = None;
    /// let error = slot.ok_or_empty().unwrap_err();
    /// assert_eq!(error.type_name(), "u8");
    /// ```
    fn ok_or_empty(self) -> Result<Own<T, A, S>, EmptyHandleError>;
}

impl<T: ?Sized + 'static, A: 'static, S: 'static> OptionOwnExt<T, A, S> for Option<Own<T, A, S>> {
    #[inline]
    fn reset(&mut self) {
        drop(self.take());
    }

    fn assign(&mut self, value: Own<T, A, S>) {
        self.reset();
        *self = Some(value);
    }

    #[inline]
    fn get_ptr(&self) -> *const T
    where
        T: Sized,
    {
        self.as_ref().map_or(core::ptr::null(), Own::as_ptr)
    }

    #[inline]
    fn ok_or_empty(self) -> Result<Own<T, A, S>, EmptyHandleError> {
        self.ok_or_else(EmptyHandleError::new::<T>)
    }
}
