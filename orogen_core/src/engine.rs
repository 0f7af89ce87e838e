// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Engine contract for native renderer integrations.
//!
//! The bridge talks to the renderer through this trait rather than calling
//! the foreign entry points directly. The FFI backend implements it over the
//! resolved `HdTephra` symbols; test doubles implement it over a call log.
//! Completions travel the other way — they are *delivered to* the bridge by
//! the backend's trampolines, so no completion surface appears here.
//!
//! Every operation is fire-and-forget and infallible by signature: the
//! native calls return nothing, and a failure to reach the engine is a
//! deployment condition handled one level up (the bridge's disabled state),
//! not a per-call error.

use alloc::string::String;

use crate::request::{PickRect, RequestId};

/// The four native operations a renderer backend must provide.
pub trait EngineOps {
    /// Asks the engine for the world position under pixel `(x, y)`.
    ///
    /// The completion for this request carries `id` back; the bridge uses it
    /// to find the pending handler.
    fn request_world_position(&self, id: RequestId, x: i32, y: i32);

    /// Asks the engine to pick every object intersecting `rect`.
    ///
    /// Picking completions carry no id; see
    /// [`OBJECT_PICKING_REQUEST_ID`](crate::request::OBJECT_PICKING_REQUEST_ID).
    fn request_object_picking(&self, rect: PickRect);

    /// Replaces the engine's highlight set with `paths`, in order.
    fn highlight_paths(&self, paths: &[String]);

    /// Pushes one configuration key/value pair into the engine.
    fn set_config_variable(&self, key: &str, value: &str);
}
