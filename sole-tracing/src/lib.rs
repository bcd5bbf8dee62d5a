#![deny(
    missing_docs,
    unsafe_code,
    rustdoc::invalid_rust_codeblocks,
    rustdoc::broken_intra_doc_links,
    missing_copy_implementations,
    unused_doc_comments
)]

//! Tracing events for the lifecycle of sole handles.
//!
//! This crate turns the lifecycle notifications of [`sole::hooks`] into
//! [`tracing`] events, so that allocations, attachments and disposals of
//! [`Own`](sole::Own) handles show up next to the rest of your logs.
//!
//! Every event is emitted at `TRACE` level with the target `sole`, and
//! carries these fields:
//!
//! - `origin`: the address at which the owned object begins
//! - `type_name`: the type that was originally allocated
//! - `attached`: how many handles are attached to the handle
//!
//! # Quick Start
//!
//! ```
//! use sole::prelude::*;
//!
//! tracing_subscriber::fmt()
//!     .with_max_level(tracing::Level::TRACE)
//!     .init();
//!
//! sole_tracing::install().expect("failed to install hooks");
//!
//! let value: Own<u32> = Own::new(7);
//! drop(value);
//! ```
//!
//! Output:
//! ```text
//! TRACE sole: allocated origin=0x600000c04010 type_name="u32" attached=0
//! TRACE sole: disposed origin=0x600000c04010 type_name="u32" attached=0
//! ```
//!
//! # Environment Variables
//!
//! - `SOLE_TRACING` - Comma-separated list of the events to emit:
//!   - `allocate` - A new object was placed in a handle
//!   - `attach` - Handles were attached to a handle
//!   - `dispose` - A handle is about to dispose what it owns
//!
//!   All events are emitted when the variable is unset.

use std::sync::OnceLock;

use sole::hooks::{Hooks, HooksAlreadyInstalledError, OwnEvent, OwnObserver};

/// The target of every event emitted by this crate.
pub const TARGET: &str = "sole";

/// Observer that emits a [`tracing`] event for every lifecycle event of a
/// handle.
///
/// # Examples
///
/// Only tracing disposals, whatever `SOLE_TRACING` says:
///
/// ```
/// use sole::hooks::Hooks;
/// use sole_tracing::TracingObserver;
///
/// let observer = TracingObserver {
///     allocations: false,
///     attachments: false,
///     disposals: true,
/// };
///
/// Hooks::new()
///     .observer(observer)
///     .install()
///     .expect("failed to install hooks");
/// ```
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct TracingObserver {
    /// Whether to emit an event when a new object is placed in a handle.
    pub allocations: bool,
    /// Whether to emit an event when handles are attached to a handle.
    pub attachments: bool,
    /// Whether to emit an event right before a handle disposes what it owns.
    pub disposals: bool,
}

#[derive(Debug)]
struct SoleTracingEnvOptions {
    allocations: bool,
    attachments: bool,
    disposals: bool,
}

impl SoleTracingEnvOptions {
    fn get() -> &'static Self {
        static SOLE_TRACING_FLAGS: OnceLock<SoleTracingEnvOptions> = OnceLock::new();

        SOLE_TRACING_FLAGS.get_or_init(|| match std::env::var_os("SOLE_TRACING") {
            Some(var) => Self::parse(&var.to_string_lossy()),
            None => SoleTracingEnvOptions {
                allocations: true,
                attachments: true,
                disposals: true,
            },
        })
    }

    fn parse(var: &str) -> Self {
        let mut options = SoleTracingEnvOptions {
            allocations: false,
            attachments: false,
            disposals: false,
        };

        for v in var.split(',').map(str::trim) {
            if v.eq_ignore_ascii_case("allocate") {
                options.allocations = true;
            } else if v.eq_ignore_ascii_case("attach") {
                options.attachments = true;
            } else if v.eq_ignore_ascii_case("dispose") {
                options.disposals = true;
            }
        }

        options
    }
}

impl TracingObserver {
    /// Creates a new [`TracingObserver`] configured from the environment.
    ///
    /// # Environment Variables
    ///
    /// - `SOLE_TRACING` - Comma-separated list of the events to emit:
    ///   `allocate`, `attach` and `dispose`. All events are emitted when the
    ///   variable is unset.
    ///
    /// The variable is read only once per process.
    #[must_use]
    pub fn new() -> Self {
        let env_options = SoleTracingEnvOptions::get();

        Self {
            allocations: env_options.allocations,
            attachments: env_options.attachments,
            disposals: env_options.disposals,
        }
    }
}

impl Default for TracingObserver {
    fn default() -> Self {
        Self::new()
    }
}

impl OwnObserver for TracingObserver {
    fn on_allocate(&self, event: &OwnEvent) {
        if self.allocations {
            tracing::trace!(
                target: TARGET,
                origin = ?event.origin(),
                type_name = event.type_name(),
                attached = event.attached(),
                "allocated"
            );
        }
    }

    fn on_attach(&self, event: &OwnEvent) {
        if self.attachments {
            tracing::trace!(
                target: TARGET,
                origin = ?event.origin(),
                type_name = event.type_name(),
                attached = event.attached(),
                "attached"
            );
        }
    }

    fn on_dispose(&self, event: &OwnEvent) {
        if self.disposals {
            tracing::trace!(
                target: TARGET,
                origin = ?event.origin(),
                type_name = event.type_name(),
                attached = event.attached(),
                "disposed"
            );
        }
    }
}

/// Installs a [`TracingObserver`] configured from the environment as the
/// only global hook.
///
/// Use [`Hooks::observer`] directly to combine it with other observers.
pub fn install() -> Result<(), HooksAlreadyInstalledError> {
    Hooks::new().observer(TracingObserver::new()).install()
}
