#![cfg_attr(not(doc), no_std)]
#![deny(
    missing_docs,
    clippy::alloc_instead_of_core,
    clippy::std_instead_of_alloc,
    clippy::std_instead_of_core,
    clippy::missing_safety_doc,
    clippy::undocumented_unsafe_blocks,
    clippy::multiple_unsafe_ops_per_block,
    clippy::as_ptr_cast_mut,
    clippy::ptr_as_ptr,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]
// Extra checks on nightly
#![cfg_attr(nightly_extra_checks, feature(rustdoc_missing_doc_code_examples))]
#![cfg_attr(nightly_extra_checks, forbid(rustdoc::missing_doc_code_examples))]
// Make docs.rs generate better docs
#![cfg_attr(docsrs, feature(doc_cfg))]

//! Single-owner heap handles that remember how to dispose of what they own.
//!
//! ## Overview
//!
//! An [`Own<T>`] is a move-only handle to one heap object. Like a
//! [`Box<T>`](alloc::boxed::Box) it disposes that object exactly once when it
//! goes out of scope. Unlike a `Box`, the view it exposes can drift away from
//! the object it owns:
//!
//! - It can be narrowed to a component of the object with
//!   [`project_mut`](Own::project_mut) or [`upcast`](Own::upcast), even when
//!   that component does not start at the beginning of the allocation.
//! - It can be turned into a `dyn Trait` handle through [`CoerceUnsize`].
//! - It can be erased down to an [`Own<Opaque>`](markers::Opaque) that
//!   exposes the address where the original allocation begins.
//! - It can carry other handles along with [`attach`](Own::attach), releasing
//!   them after its own object, in the order they were attached.
//!
//! Whatever happens to the view, the handle keeps the original start address
//! and the disposer chosen for the original type, and uses exactly those when
//! it is dropped.
//!
//! [`CoerceUnsize`]: unsize::CoerceUnsize
//!
//! ## Quick Example
//!
//! ```
//! use sole::prelude::*;
//!
//! trait Shape {
//!     fn area(&self) -> f64;
//! }
//!
//! struct Square(f64);
//!
//! impl Shape for Square {
//!     fn area(&self) -> f64 {
//!         self.0 * self.0
//!     }
//! }
//!
//! let square: Own<Square> = Own::new(Square(3.0));
//! let origin = square.origin_addr();
//!
//! // Any `dyn Trait` works, the disposer of `Square` is kept
//! let shape: Own<dyn Shape> = square.unsize(sole::unsize::Coercion!(to dyn Shape));
//! assert_eq!(shape.area(), 9.0);
//!
//! // Keep a buffer alive for as long as the shape
//! let shape = shape.attach(Own::<Vec<u8>>::new(vec![0; 32]));
//! assert_eq!(shape.origin_addr(), origin);
//! ```
//!
//! ## Type Parameters
//!
//! The [`Own`] type is generic over three parameters, of which only the first
//! usually needs to be spelled out:
//!
//! - `T`: the view. Either the allocated type, a component of it, a
//!   `dyn Trait`, or [`Opaque`](markers::Opaque).
//! - `Access`: [`Mutable`](markers::Mutable) (default) or
//!   [`ReadOnly`](markers::ReadOnly).
//! - `ThreadSafety`: [`SendSync`](markers::SendSync) (default) or
//!   [`Local`](markers::Local).
//!
//! See the [`markers`] module for details.
//!
//! ## Observing Handles
//!
//! The [`hooks`] module lets an application install observers that are
//! notified whenever a handle is allocated, bundled with attachments or
//! disposed. The companion crate [`sole-tracing`] turns those notifications
//! into `tracing` events.
//!
//! [`sole-tracing`]: https://docs.rs/sole-tracing
//!
//! ## Features
//!
//! - `std`: forwards [`std::io::Read`] and [`std::io::Write`] through mutable
//!   handles.
//!
//! For implementation details, see the [`sole-internals`] crate.
//!
//! [`sole-internals`]: sole_internals

extern crate alloc;

#[cfg(all(feature = "std", not(doc)))]
extern crate std;

pub mod hooks;
pub mod markers;
pub mod option_ext;
mod own;
pub mod prelude;

pub use sole_internals::AllocError;
pub use unsize;

pub use self::own::{Attachments, Own, Upcast};
