// Copyright 2026 the Orogen Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Combined scene-query selection.

/// Which results the combined scene query should resolve.
///
/// The combined query composes the two primitive requests; each mode issues
/// only the native calls it needs (see the backend's `request_scene_query`).
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, Hash)]
pub enum QueryMode {
    /// Resolve the object path first, then the world position under the
    /// pixel. The caller's handler fires once, after the position
    /// completion, carrying both.
    #[default]
    PathAndPosition,
    /// Resolve only the world position; the path is reported empty.
    PositionOnly,
    /// Resolve only the object path; no world position is reported.
    PathOnly,
}
