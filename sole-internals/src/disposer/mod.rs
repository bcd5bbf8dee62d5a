//! Module containing the type-erased ownership record

mod raw;
mod vtable;

pub use self::raw::RawOwn;
