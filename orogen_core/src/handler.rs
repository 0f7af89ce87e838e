// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Completion handler types.
//!
//! Handlers are `Arc`'d closures so they can sit in the pending-request
//! registry while a clone travels through composed queries. Equality is
//! *identity* ([`Arc::ptr_eq`]): two clones of one handler are equal, two
//! separately-created handlers never are, even with identical bodies. The
//! registry relies on this to tell a duplicate request apart from a key
//! collision, and [`WorldPosHandler::token`] feeds the same identity into
//! request-id derivation.

use alloc::collections::BTreeSet;
use alloc::string::String;
use alloc::sync::Arc;
use core::fmt;

use crate::request::{PixelPos, WorldPoint};

/// Handler for a world-position completion.
///
/// Invoked with the queried pixel and the world coordinates under it, as
/// reported by the engine.
#[derive(Clone)]
pub struct WorldPosHandler(Arc<dyn Fn(i32, i32, f32, f32, f32) + Send + Sync>);

impl WorldPosHandler {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(i32, i32, f32, f32, f32) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Identity token for request-id derivation. Stable across clones.
    #[must_use]
    pub fn token(&self) -> u64 {
        Arc::as_ptr(&self.0) as *const () as u64
    }

    /// Invokes the handler with a decoded completion payload.
    pub fn invoke(&self, pixel_x: i32, pixel_y: i32, world_x: f32, world_y: f32, world_z: f32) {
        (self.0)(pixel_x, pixel_y, world_x, world_y, world_z);
    }
}

impl PartialEq for WorldPosHandler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for WorldPosHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("WorldPosHandler").finish_non_exhaustive()
    }
}

/// Handler for an object-picking completion.
///
/// Invoked with the set of object paths inside the picked rectangle.
#[derive(Clone)]
pub struct PickHandler(Arc<dyn Fn(&BTreeSet<String>) + Send + Sync>);

impl PickHandler {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&BTreeSet<String>) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the handler with the decoded path set.
    pub fn invoke(&self, paths: &BTreeSet<String>) {
        (self.0)(paths);
    }
}

impl PartialEq for PickHandler {
    fn eq(&self, other: &Self) -> bool {
        Arc::ptr_eq(&self.0, &other.0)
    }
}

impl fmt::Debug for PickHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PickHandler").finish_non_exhaustive()
    }
}

/// Handler for the combined scene query.
///
/// Invoked with the resolved object path (empty when nothing was picked),
/// the world position when the selected mode produced one, and the pixel the
/// query was issued for.
#[derive(Clone)]
pub struct SceneQueryHandler(Arc<dyn Fn(&str, Option<WorldPoint>, PixelPos) + Send + Sync>);

impl SceneQueryHandler {
    /// Wraps a closure.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(&str, Option<WorldPoint>, PixelPos) + Send + Sync + 'static,
    {
        Self(Arc::new(f))
    }

    /// Invokes the handler with a resolved query result.
    pub fn invoke(&self, path: &str, world: Option<WorldPoint>, pixel: PixelPos) {
        (self.0)(path, world, pixel);
    }
}

impl fmt::Debug for SceneQueryHandler {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SceneQueryHandler").finish_non_exhaustive()
    }
}
