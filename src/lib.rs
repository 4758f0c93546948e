//! sigmux - configurable Unix signal dispatch.
//!
//! [`resolve`] canonicalizes user-supplied signal tokens (names in any case,
//! with or without the `SIG` prefix, or decimal numbers) into the uppercase
//! `SIG`-prefixed form, rejecting anything that is not a genuine signal on
//! the running platform. [`SignalRegistry`] takes a mapping from canonical
//! names to ordered callback chains, traps the corresponding signals via
//! `sigaction`, fans each delivery out to the chain in registration order,
//! and restores the previous dispositions on uninstall.
//!
//! Callbacks run in OS signal-handler context. The crate adds no mutual
//! exclusion and no async-signal-safety on top of what the platform
//! provides; a panicking callback aborts the process.

#![deny(unsafe_op_in_unsafe_fn)]

#[cfg(not(unix))]
compile_error!("sigmux supports Unix-like targets only");

mod registry;
mod resolve;

pub use registry::{RegistryError, SignalCallback, SignalRegistry};
pub use resolve::{ResolveError, resolve, signal_for_name};
