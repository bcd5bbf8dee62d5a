//! Errors surfaced by the allocation primitive.

use core::alloc::Layout;

/// The global allocator could not provide memory for a new handle.
///
/// Returned by [`RawOwn::try_new`](crate::RawOwn::try_new). The value that
/// was meant to be moved into the allocation has already been dropped when
/// this error is returned.
#[derive(Clone, Copy, PartialEq, Eq, Debug)]
pub struct AllocError {
    /// The layout that was requested from the allocator.
    layout: Layout,
}

impl AllocError {
    /// Creates an [`AllocError`] for a failed request of the given layout.
    #[inline]
    pub(crate) const fn new(layout: Layout) -> Self {
        Self { layout }
    }

    /// The layout that the allocator failed to provide.
    #[inline]
    #[must_use]
    pub const fn layout(&self) -> Layout {
        self.layout
    }
}

impl core::fmt::Display for AllocError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        write!(
            f,
            "memory allocation of {} bytes (align {}) failed",
            self.layout.size(),
            self.layout.align()
        )
    }
}

impl core::error::Error for AllocError {}

#[cfg(test)]
mod tests {
    use alloc::string::ToString;

    use super::*;

    #[test]
    fn test_alloc_error_display() {
        let layout = Layout::from_size_align(8, 8).unwrap();
        let error = AllocError::new(layout);
        assert_eq!(error.layout(), layout);
        assert_eq!(
            error.to_string(),
            "memory allocation of 8 bytes (align 8) failed"
        );
    }
}
