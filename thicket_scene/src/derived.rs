// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-node derived-state cache record.
//!
//! One `Derived` exists per node, created lazily on the node's first query
//! or first tree-attachment. Outside the resolver, only the invalidation
//! engine touches it: setters never write cached geometry directly.
//!
//! Freshness is tracked with monotonic u64 counters compared by equality
//! rather than plain dirty booleans, because a node must be able to detect
//! "my parent recomposed even though I did not change" — a boolean per node
//! cannot encode whose version it last observed.

use kurbo::{Affine, Rect};

use crate::types::{DirtyFlags, VersionStamps};

#[derive(Clone, Debug)]
pub(crate) struct Derived {
    /// Pending invalidation categories. Each bit has exactly one clearing
    /// site: `TRANSFORM` in the local-transform resolver,
    /// `TRANSFORMED_BOUNDS` and `BOUNDS` in the bounds resolvers, and the
    /// render categories in the render snapshot.
    pub(crate) dirty: DirtyFlags,

    /// Cached local transform (position/rotation/scale as one affine).
    pub(crate) local_transform: Affine,
    /// Bumped once per effective transform-property write.
    pub(crate) local_transform_version: u64,
    /// Bumped once per intrinsic-bounds invalidation.
    pub(crate) local_bounds_version: u64,
    /// Bumped once per appearance, clip, or child-list invalidation.
    pub(crate) appearance_version: u64,

    /// Cached local→world transform.
    pub(crate) world_transform: Affine,
    /// Bumped on every actual recomposition of `world_transform`, so
    /// descendants observe ancestor movement purely through version math.
    pub(crate) world_transform_version: u64,
    /// `local_transform_version` at the time of the last recomposition.
    pub(crate) world_local_seen: u64,
    /// The parent's `world_transform_version` observed at the last
    /// recomposition; 0 when composed without a parent.
    pub(crate) parent_world_seen: u64,

    /// Local bounds through the local transform: bounds in parent space.
    pub(crate) bounds: Rect,
    pub(crate) bounds_transform_seen: u64,
    pub(crate) bounds_content_seen: u64,

    /// Local bounds through the world transform.
    pub(crate) world_bounds: Rect,
    pub(crate) world_bounds_transform_seen: u64,
    pub(crate) world_bounds_content_seen: u64,

    /// Memoized rotation trig: the angle the cached sine/cosine belong to.
    pub(crate) rot_degrees: f64,
    pub(crate) rot_sin: f64,
    pub(crate) rot_cos: f64,
}

impl Derived {
    /// A freshly materialized cache: born fully dirty, with all observed
    /// markers behind the live counters so every first resolve recomputes.
    pub(crate) fn new() -> Self {
        Self {
            dirty: DirtyFlags::TRANSFORM | DirtyFlags::TRANSFORMED_BOUNDS,
            local_transform: Affine::IDENTITY,
            local_transform_version: 1,
            local_bounds_version: 1,
            appearance_version: 1,
            world_transform: Affine::IDENTITY,
            world_transform_version: 0,
            world_local_seen: 0,
            parent_world_seen: 0,
            bounds: Rect::ZERO,
            bounds_transform_seen: 0,
            bounds_content_seen: 0,
            world_bounds: Rect::ZERO,
            world_bounds_transform_seen: 0,
            world_bounds_content_seen: 0,
            rot_degrees: 0.0,
            rot_sin: 0.0,
            rot_cos: 1.0,
        }
    }

    pub(crate) fn stamps(&self) -> VersionStamps {
        VersionStamps {
            appearance: self.appearance_version,
            world_transform: self.world_transform_version,
            local_bounds: self.local_bounds_version,
        }
    }
}
