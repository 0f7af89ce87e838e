// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Correlation model and engine contract for the Tephra renderer bridge.
//!
//! The Tephra renderer answers screen-space queries (world position under a
//! pixel, object picking inside a rectangle) asynchronously: a request call
//! returns immediately, and the engine reports the result later through a
//! registered completion callback, on a thread of its choosing. This crate
//! owns the pieces that match each completion back to the request that
//! produced it:
//!
//! ```text
//!   caller ──► dispatcher ──► CountedRegistry::push ──► EngineOps request
//!                                                            │
//!                                         [Tephra engine, async]
//!                                                            │
//!   caller's handler ◄── CountedRegistry::pop ◄── completion ┘
//! ```
//!
//! **[`registry`]** — [`CountedRegistry`], the reference-counted keyed table
//! that holds a pending completion handler per [`RequestId`], tolerating
//! duplicate in-flight requests under the same key.
//!
//! **[`request`]** — [`RequestId`] and its deterministic derivation from
//! handler identity and pixel coordinates, plus the small geometry types
//! that cross the boundary.
//!
//! **[`handler`]** — cheaply-clonable completion handler types with
//! *identity* equality, so the registry can distinguish "same request again"
//! from "colliding key".
//!
//! **[`engine`]** — the [`EngineOps`](engine::EngineOps) trait that backend
//! crates implement over the native entry points, enabling test doubles.
//!
//! **[`query`]** — [`QueryMode`](query::QueryMode) for the combined
//! path/world-position convenience query.
//!
//! This crate performs no FFI and no locking; the backend crate serializes
//! access around it. It is `no_std` compatible (with `alloc`).

#![no_std]

extern crate alloc;

pub mod engine;
pub mod handler;
pub mod query;
pub mod registry;
pub mod request;

pub use handler::{PickHandler, SceneQueryHandler, WorldPosHandler};
pub use registry::CountedRegistry;
pub use request::{OBJECT_PICKING_REQUEST_ID, PickRect, PixelPos, RequestId, WorldPoint};
