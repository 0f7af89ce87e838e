// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Request identity and the small value types that cross the boundary.

/// Correlation token matching a dispatched request to its completion.
///
/// World-position ids are derived by [`world_position_request_id`] and are
/// non-negative by construction. Object-picking requests all share
/// [`OBJECT_PICKING_REQUEST_ID`].
#[derive(Clone, Copy, Debug, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct RequestId(pub i32);

/// The fixed id used for every object-picking request.
///
/// The engine reports picking completions without an id of their own, so the
/// bridge funnels all picking requests through one shared registry slot.
/// Overlapping picking requests are therefore not independently addressable:
/// they reference-count onto this entry, and a later request with a
/// different handler displaces the earlier one.
pub const OBJECT_PICKING_REQUEST_ID: RequestId = RequestId(0);

/// A screen pixel, origin top-left.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PixelPos {
    /// Horizontal pixel coordinate.
    pub x: u32,
    /// Vertical pixel coordinate.
    pub y: u32,
}

impl PixelPos {
    /// Creates a pixel position.
    #[must_use]
    pub const fn new(x: u32, y: u32) -> Self {
        Self { x, y }
    }

    /// The 1×1 picking rectangle covering exactly this pixel.
    ///
    /// Saturates at the edge of the coordinate space: a pixel at `u32::MAX`
    /// yields an empty rectangle rather than overflowing.
    #[must_use]
    pub const fn pick_rect(self) -> PickRect {
        PickRect {
            x0: self.x,
            y0: self.y,
            x1: self.x.saturating_add(1),
            y1: self.y.saturating_add(1),
        }
    }
}

/// Screen-space rectangle for object-picking queries.
///
/// Half-open in both axes: `x1`/`y1` are exclusive.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub struct PickRect {
    /// Left edge, inclusive.
    pub x0: u32,
    /// Top edge, inclusive.
    pub y0: u32,
    /// Right edge, exclusive.
    pub x1: u32,
    /// Bottom edge, exclusive.
    pub y1: u32,
}

/// A world-space position reported by the engine.
///
/// The engine delivers single-precision components; they are widened here so
/// hosts that accumulate or compare positions don't compound the loss.
#[derive(Clone, Copy, Debug, Default, PartialEq)]
pub struct WorldPoint {
    /// World X.
    pub x: f64,
    /// World Y.
    pub y: f64,
    /// World Z.
    pub z: f64,
}

impl WorldPoint {
    /// Widens the engine's single-precision components.
    #[must_use]
    pub fn from_f32(x: f32, y: f32, z: f32) -> Self {
        Self {
            x: f64::from(x),
            y: f64::from(y),
            z: f64::from(z),
        }
    }
}

/// Derives the [`RequestId`] for a world-position request.
///
/// Deterministic in `(handler identity, x, y)`: re-requesting the same pixel
/// with the same handler before the first completion arrives produces the
/// same id, so the duplicates coalesce onto one reference-counted registry
/// entry. The pixel is folded in to spread ids for a handler that queries
/// many pixels; collisions across unrelated handlers remain possible and
/// are handled by the registry's overwrite policy.
#[must_use]
pub fn world_position_request_id(handler_token: u64, x: i32, y: i32) -> RequestId {
    let folded = handler_token
        .wrapping_add((x as u64).wrapping_mul(10))
        .wrapping_add(y as u64);
    // Fold into the non-negative i32 range the engine expects.
    RequestId((mix64(folded) & 0x7FFF_FFFF) as i32)
}

/// SplitMix64 finalizer.
const fn mix64(mut z: u64) -> u64 {
    z = z.wrapping_add(0x9E37_79B9_7F4A_7C15);
    z = (z ^ (z >> 30)).wrapping_mul(0xBF58_476D_1CE4_E5B9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94D0_49BB_1331_11EB);
    z ^ (z >> 31)
}
