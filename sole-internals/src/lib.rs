#![no_std]
#![forbid(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::missing_docs_in_private_items,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
#![allow(rustdoc::private_intra_doc_links)]
//! Internal implementation crate for [`sole`].
//!
//! # Overview
//!
//! This crate contains the low-level, type-erased ownership record and the
//! unsafe operations that power the [`sole`] handle library. The typed
//! `Own<T>` handle in [`sole`] is a thin wrapper that pairs a [`RawOwn`] with
//! a pointer to whatever view of the object the caller currently holds.
//!
//! **This crate is an implementation detail.** No semantic versioning guarantees
//! are provided. Users should depend on the [`sole`] crate, not this one.
//!
//! # Architecture
//!
//! - **[`disposer`]**: Type-erased ownership of a single heap allocation
//!   - [`RawOwn`]: The original allocation address paired with its disposer
//!   - [`DisposerVtable`]: Function pointers for type-erased disposal
//!
//! - **[`release_list`]**: The allocation backing an attachment bundle
//!   - [`ReleaseList`]: A primary [`RawOwn`] followed by the owners attached
//!     to it, released in that order
//!
//! - **[`error`]**: [`AllocError`], returned by fallible allocation
//!
//! # Safety Strategy
//!
//! A [`RawOwn`] never knows the type of the object it owns. It only knows the
//! address where the allocation begins and a `&'static` vtable that was
//! instantiated for the concrete type at allocation time. Disposal always goes
//! through that pair, so later changes to the *view* of the object (a field
//! projection, a `dyn Trait` coercion, full erasure) can never cause the wrong
//! destructor to run or the wrong address to be freed.
//!
//! The invariants are kept local through module-private fields: the pointer
//! and vtable of a [`RawOwn`] can only be set by the constructors in
//! [`disposer::raw`], and cannot be modified afterward.
//!
//! [`sole`]: https://docs.rs/sole/latest/sole/
//! [`DisposerVtable`]: disposer::vtable::DisposerVtable
//! [`ReleaseList`]: release_list::ReleaseList

extern crate alloc;

mod disposer;
mod error;
mod release_list;
mod util;

pub use disposer::RawOwn;
pub use error::AllocError;
