//! Commonly used items for convenient importing.
//!
//! ```rust
//! use sole::prelude::*;
//!
//! let value: Own<Vec<u8>> = Own::new(vec![1, 2, 3]);
//! let view: Own<[u8], markers::ReadOnly> = value
//!     .project_mut(|bytes| bytes.as_mut_slice())
//!     .into_read_only();
//! assert_eq!(view.len(), 3);
//! ```
//!
//! # What's Included
//!
//! - **[`Own`]**: The single-owner handle
//! - **[`Upcast`]**: Exposing a component of an object
//! - **[`OptionOwnExt`]**: Extension methods for empty handles
//! - **[`markers`]**: Access and thread safety markers
//! - **[`CoerceUnsize`]**: Turning handles into `dyn Trait` handles

pub use unsize::CoerceUnsize;

pub use crate::{Own, Upcast, markers, option_ext::OptionOwnExt};
