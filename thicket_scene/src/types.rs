// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Public types for the scene graph: node identifiers, properties, dirty
//! categories, version stamps, and errors.

use kurbo::Rect;

/// Identifier for a node in the scene (generational).
#[derive(Copy, Clone, Debug, Eq, PartialEq, Hash)]
pub struct NodeId(pub(crate) u32, pub(crate) u32);

impl NodeId {
    pub(crate) const fn new(idx: u32, generation: u32) -> Self {
        Self(idx, generation)
    }

    pub(crate) const fn idx(self) -> usize {
        self.0 as usize
    }
}

bitflags::bitflags! {
    /// Invalidation categories recorded in a node's derived-state dirty word.
    ///
    /// Property setters and structural operations feed these into
    /// [`Scene::invalidate`](crate::Scene::invalidate); resolvers and the
    /// render snapshot consume them. Setting [`DirtyFlags::TRANSFORM`] or
    /// [`DirtyFlags::BOUNDS`] also implies [`DirtyFlags::TRANSFORMED_BOUNDS`].
    #[derive(Clone, Copy, Debug, PartialEq, Eq, Hash)]
    pub struct DirtyFlags: u8 {
        /// The local transform inputs (position, rotation, scale) changed.
        const TRANSFORM = 0b0000_0001;
        /// The drawable's intrinsic local bounds changed.
        const BOUNDS = 0b0000_0010;
        /// A render property (alpha, blend mode, visibility, opaque background) changed.
        const APPEARANCE = 0b0000_0100;
        /// A clipping input (scroll rect, mask) changed.
        const CLIP = 0b0000_1000;
        /// The ordered child list changed.
        const CHILDREN = 0b0001_0000;
        /// A cached transformed bounding box is stale.
        const TRANSFORMED_BOUNDS = 0b0010_0000;
        /// Everything that affects a node's rendered output short of its transform.
        const RENDER = Self::APPEARANCE.bits() | Self::CLIP.bits();
    }
}

/// Pixel blend mode applied when a node is composited.
///
/// The core records the mode and hands it to the renderer unchanged; mapping
/// onto a backend's blend equations is the backend's concern.
#[derive(Copy, Clone, Debug, Default, PartialEq, Eq, Hash)]
pub enum BlendMode {
    /// Source-over compositing.
    #[default]
    Normal,
    /// The node and its children composite as one offscreen group.
    Layer,
    /// Additive.
    Add,
    /// Subtractive.
    Subtract,
    /// Multiply.
    Multiply,
    /// Screen.
    Screen,
    /// Per-channel maximum.
    Lighten,
    /// Per-channel minimum.
    Darken,
    /// Absolute difference.
    Difference,
    /// Overlay.
    Overlay,
    /// Hard light.
    HardLight,
    /// Channel inversion of the backdrop.
    Invert,
    /// The node's alpha erases the backdrop.
    Erase,
}

/// Property bundle a node is created with.
///
/// After creation, individual properties are mutated through the guarded
/// setters on [`Scene`](crate::Scene), which route every effective change
/// through the invalidation engine.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct NodeProps {
    /// Horizontal position in the parent's coordinate space.
    pub x: f64,
    /// Vertical position in the parent's coordinate space.
    pub y: f64,
    /// Rotation in degrees, normalized into `(-180, 180]`.
    pub rotation: f64,
    /// Horizontal scale factor.
    pub scale_x: f64,
    /// Vertical scale factor.
    pub scale_y: f64,
    /// Whether the node (and its subtree) renders.
    pub visible: bool,
    /// Opacity in `[0, 1]`, multiplied down the tree during traversal.
    pub alpha: f64,
    /// Blend mode handed through to the renderer.
    pub blend_mode: BlendMode,
    /// Opaque background color (0xRRGGBB). Doubles as the hit-target marker:
    /// a node without one never hit-tests positively.
    pub opaque_background: Option<u32>,
    /// Optional scroll rectangle, clipping the subtree in local space.
    pub scroll_rect: Option<Rect>,
    /// Optional mask node (non-owning; a stale id behaves as no mask).
    pub mask: Option<NodeId>,
    /// Intrinsic bounding box in the node's own coordinate space, supplied
    /// by the concrete drawable. Update via
    /// [`Scene::set_local_bounds`](crate::Scene::set_local_bounds).
    pub local_bounds: Rect,
}

impl Default for NodeProps {
    fn default() -> Self {
        Self {
            x: 0.0,
            y: 0.0,
            rotation: 0.0,
            scale_x: 1.0,
            scale_y: 1.0,
            visible: true,
            alpha: 1.0,
            blend_mode: BlendMode::Normal,
            opaque_background: None,
            scroll_rect: None,
            mask: None,
            local_bounds: Rect::ZERO,
        }
    }
}

/// The three version counters the render queue tracks per node.
///
/// Counters are monotonic and compared by equality; any mismatch against a
/// cache's last-seen stamps means the node changed since that cache was
/// refreshed.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub struct VersionStamps {
    /// Bumped on appearance, clip, and child-list invalidations.
    pub appearance: u64,
    /// Bumped each time the world transform is actually recomposed.
    pub world_transform: u64,
    /// Bumped each time the intrinsic local bounds are invalidated.
    pub local_bounds: u64,
}

/// Errors surfaced by structural (container) operations.
///
/// Stale identifiers on query paths yield `None` instead; errors are
/// reserved for mutations the caller asked for and cannot have.
#[derive(Copy, Clone, Debug, PartialEq, Eq)]
pub enum SceneError {
    /// A structural argument was rejected: stale id, self-parenting,
    /// parenting a root node, or attaching an ancestor.
    InvalidArgument,
    /// An index or range fell outside the container's child list.
    OutOfRange,
}

impl core::fmt::Display for SceneError {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        match self {
            Self::InvalidArgument => f.write_str("invalid argument"),
            Self::OutOfRange => f.write_str("index or range out of bounds"),
        }
    }
}

impl core::error::Error for SceneError {}
