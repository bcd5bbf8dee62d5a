//! Internal utility types.

/// Marker type used when type-erasing owned allocations.
///
/// This zero-sized type serves as a placeholder in pointer types when the
/// actual concrete type has been erased. For example, `NonNull<Erased>`
/// points at the start of an allocation whose concrete type is unknown at the
/// current scope.
///
/// Using a distinct marker type (rather than `()`) makes the intent clearer
/// in type signatures and error messages.
pub(crate) struct Erased;
