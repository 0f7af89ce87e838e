// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Tephra renderer backend for orogen.
//!
//! This crate binds the asynchronous query surface of the Tephra renderer
//! (the `HdTephra` shared library) and correlates its completions back to
//! host-supplied handlers:
//!
//! - [`TephraApi`]: resolved native entry points, loaded at runtime
//! - [`Binding`] / [`TephraBinding`]: host-owned handle carrying the
//!   pending-request registries and the dispatch/completion logic
//! - completion routing: two fixed trampolines registered with the engine,
//!   reaching the owning binding through a process-wide indirection table
//!
//! # Lifecycle
//!
//! The binding is an explicit value owned by the host's composition root —
//! there is no ambient singleton. [`TephraBinding::load`] resolves the
//! library and registers the completion callbacks; dropping the binding
//! detaches completion routing, and requests still pending at that point are
//! discarded without their handlers ever running. Loading again afterwards
//! produces a fresh binding with empty registries.
//!
//! When the library (or any required symbol) is missing, [`TephraBinding::load`]
//! still succeeds: it returns a *disabled* binding that logs one warning up
//! front and turns every operation into a logged no-op, so the host stays
//! usable with picking and highlighting switched off.
//!
//! # Threading
//!
//! The engine invokes completions on threads of its own choosing, at times
//! of its own choosing. All registry access is serialized behind one mutex
//! per binding; pending handlers are always invoked with that mutex
//! released, so a handler may freely dispatch follow-up requests (the
//! combined scene query depends on this).

#![expect(
    unsafe_code,
    reason = "Tephra backend requires C FFI for requests and completion callbacks"
)]

mod binding;
mod router;
mod symbols;

pub use binding::{Binding, TephraBinding};
pub use symbols::{ApiLoadError, TephraApi};

pub use orogen_core::engine::EngineOps;
pub use orogen_core::query::QueryMode;
