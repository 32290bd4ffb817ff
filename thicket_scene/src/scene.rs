// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Core scene implementation: node storage, mutation, invalidation,
//! lazy resolution, and geometry queries.

use alloc::boxed::Box;
use alloc::vec::Vec;
use kurbo::{Affine, Point, Rect};

use crate::derived::Derived;
use crate::types::{BlendMode, DirtyFlags, NodeId, NodeProps, SceneError, VersionStamps};
use crate::util::{
    invert_affine, normalize_degrees, rects_overlap_open, sin_cos_degrees, transform_rect_bbox,
};

/// A retained tree of positioned, transformable nodes with lazily
/// recomputed derived geometry.
///
/// Property writes are cheap: an effective change records dirty flags and
/// bumps version counters on the written node only, never walking the
/// subtree. Geometry queries (`world_transform`, `bounds_in`, hit tests)
/// pull the cached values back up to date, walking ancestors only as far as
/// stale version stamps require. A query immediately after a mutation always
/// observes that mutation — the cache is synchronously coherent.
///
/// ## Example
///
/// ```rust
/// use kurbo::{Point, Rect};
/// use thicket_scene::{NodeProps, Scene};
///
/// let mut scene = Scene::new();
/// let root = scene.create_root(NodeProps::default());
/// let child = scene.create_node(NodeProps {
///     local_bounds: Rect::new(0.0, 0.0, 100.0, 100.0),
///     ..NodeProps::default()
/// });
/// scene.add_child(root, child).unwrap();
///
/// scene.set_x(child, 10.0);
/// let p = scene.local_to_world(child, Point::new(0.0, 0.0)).unwrap();
/// assert_eq!(p, Point::new(10.0, 0.0));
/// ```
pub struct Scene {
    /// slots
    nodes: Vec<Option<Node>>,
    /// last generation per slot (persists across frees)
    generations: Vec<u32>,
    free_list: Vec<usize>,
}

impl core::fmt::Debug for Scene {
    fn fmt(&self, f: &mut core::fmt::Formatter<'_>) -> core::fmt::Result {
        let total = self.nodes.len();
        let alive = self.nodes.iter().filter(|n| n.is_some()).count();
        f.debug_struct("Scene")
            .field("nodes_total", &total)
            .field("nodes_alive", &alive)
            .field("free_list", &self.free_list.len())
            .finish_non_exhaustive()
    }
}

impl Default for Scene {
    fn default() -> Self {
        Self::new()
    }
}

#[derive(Clone, Debug)]
struct Node {
    generation: u32,
    /// Stage-like nodes are created as roots and may never become children.
    root: bool,
    parent: Option<NodeId>,
    children: Vec<NodeId>,
    props: NodeProps,
    /// Created lazily on first query or first tree-attachment.
    derived: Option<Box<Derived>>,
}

impl Node {
    fn new(generation: u32, root: bool, props: NodeProps) -> Self {
        Self {
            generation,
            root,
            parent: None,
            children: Vec::new(),
            props,
            derived: None,
        }
    }
}

/// Everything the render queue needs from one node, resolved in one call.
///
/// Taking a snapshot consumes the node's pending appearance/clip/children
/// dirty bits; the version stamps remain for the caller's own staleness
/// comparison.
#[derive(Copy, Clone, Debug)]
pub struct RenderSnapshot {
    /// Resolved local→world transform.
    pub world_transform: Affine,
    /// Resolved world-space AABB of the node's local bounds.
    pub world_bounds: Rect,
    /// The three counters a per-renderer cache compares.
    pub stamps: VersionStamps,
    /// Whether the node renders (and expands to its children).
    pub visible: bool,
    /// The node's own alpha, not yet multiplied by ancestors.
    pub alpha: f64,
    /// Blend mode handed through to the renderer.
    pub blend_mode: BlendMode,
    /// Optional local-space scroll/clip rectangle.
    pub scroll_rect: Option<Rect>,
    /// Optional mask node reference.
    pub mask: Option<NodeId>,
}

impl Scene {
    /// Create an empty scene.
    pub fn new() -> Self {
        Self {
            nodes: Vec::new(),
            generations: Vec::new(),
            free_list: Vec::new(),
        }
    }

    fn alloc(&mut self, root: bool, props: NodeProps) -> NodeId {
        let (idx, generation) = if let Some(idx) = self.free_list.pop() {
            let generation = self.generations[idx].saturating_add(1);
            self.generations[idx] = generation;
            self.nodes[idx] = Some(Node::new(generation, root, props));
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            (idx as u32, generation)
        } else {
            let generation = 1_u32;
            self.nodes.push(Some(Node::new(generation, root, props)));
            self.generations.push(generation);
            #[allow(
                clippy::cast_possible_truncation,
                reason = "NodeId uses 32-bit indices by design."
            )]
            ((self.nodes.len() - 1) as u32, generation)
        };
        NodeId::new(idx, generation)
    }

    /// Create a detached node. It participates in queries immediately but
    /// renders only once attached under a root.
    pub fn create_node(&mut self, props: NodeProps) -> NodeId {
        self.alloc(false, props)
    }

    /// Create a root ("stage-like") node. Roots may never become children.
    pub fn create_root(&mut self, props: NodeProps) -> NodeId {
        self.alloc(true, props)
    }

    /// Destroy a node and its whole subtree. Identifiers into the destroyed
    /// subtree become stale; non-owning references to it (masks) are
    /// detected as stale wherever they are next read.
    pub fn remove(&mut self, id: NodeId) {
        if !self.is_alive(id) {
            return;
        }
        if let Some(parent) = self.node(id).parent {
            self.unlink_child(parent, id);
        }
        self.remove_subtree(id);
    }

    fn remove_subtree(&mut self, id: NodeId) {
        let children = core::mem::take(&mut self.node_mut(id).children);
        for child in children {
            self.remove_subtree(child);
        }
        self.nodes[id.idx()] = None;
        self.free_list.push(id.idx());
    }

    // --- liveness and structure accessors ---

    /// Returns true if `id` refers to a live node: the slot exists and its
    /// generation matches the identifier's.
    pub fn is_alive(&self, id: NodeId) -> bool {
        self.nodes
            .get(id.idx())
            .and_then(|n| n.as_ref())
            .is_some_and(|n| n.generation == id.1)
    }

    /// Whether a live node is a root ("stage-like") node.
    pub fn is_root(&self, id: NodeId) -> Option<bool> {
        self.node_opt(id).map(|n| n.root)
    }

    /// The parent of a live node, or `None` for detached nodes, roots, and
    /// stale ids. `parent` is writable only through container operations.
    pub fn parent_of(&self, id: NodeId) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.parent)
    }

    /// The ordered children of a node, or an empty slice for stale ids.
    pub fn children_of(&self, id: NodeId) -> &[NodeId] {
        match self.node_opt(id) {
            Some(n) => &n.children,
            None => &[],
        }
    }

    /// Number of children, or `None` for stale ids.
    pub fn child_count(&self, id: NodeId) -> Option<usize> {
        self.node_opt(id).map(|n| n.children.len())
    }

    /// The child at `index`, or `None` when stale or out of range.
    pub fn child_at(&self, id: NodeId, index: usize) -> Option<NodeId> {
        self.node_opt(id).and_then(|n| n.children.get(index).copied())
    }

    /// Position of `child` in `container`'s child list.
    pub fn child_index(&self, container: NodeId, child: NodeId) -> Option<usize> {
        self.node_opt(container)
            .and_then(|n| n.children.iter().position(|&c| c == child))
    }

    /// Whether `id` is `container` itself or one of its descendants.
    pub fn contains(&self, container: NodeId, id: NodeId) -> bool {
        if !self.is_alive(container) || !self.is_alive(id) {
            return false;
        }
        let mut current = Some(id);
        while let Some(c) = current {
            if c == container {
                return true;
            }
            current = self.node(c).parent;
        }
        false
    }

    // --- property getters ---

    /// Horizontal position in the parent's space.
    pub fn x(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.props.x)
    }

    /// Vertical position in the parent's space.
    pub fn y(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.props.y)
    }

    /// Rotation in degrees, normalized into `(-180, 180]`.
    pub fn rotation(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.props.rotation)
    }

    /// Horizontal scale factor.
    pub fn scale_x(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.props.scale_x)
    }

    /// Vertical scale factor.
    pub fn scale_y(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.props.scale_y)
    }

    /// Visibility flag.
    pub fn visible(&self, id: NodeId) -> Option<bool> {
        self.node_opt(id).map(|n| n.props.visible)
    }

    /// Opacity in `[0, 1]`.
    pub fn alpha(&self, id: NodeId) -> Option<f64> {
        self.node_opt(id).map(|n| n.props.alpha)
    }

    /// Blend mode.
    pub fn blend_mode(&self, id: NodeId) -> Option<BlendMode> {
        self.node_opt(id).map(|n| n.props.blend_mode)
    }

    /// Opaque background color, if set.
    pub fn opaque_background(&self, id: NodeId) -> Option<Option<u32>> {
        self.node_opt(id).map(|n| n.props.opaque_background)
    }

    /// Scroll rectangle, if set.
    pub fn scroll_rect(&self, id: NodeId) -> Option<Option<Rect>> {
        self.node_opt(id).map(|n| n.props.scroll_rect)
    }

    /// Mask node reference, if set.
    pub fn mask(&self, id: NodeId) -> Option<Option<NodeId>> {
        self.node_opt(id).map(|n| n.props.mask)
    }

    /// Intrinsic local bounds as last supplied by the drawable.
    pub fn local_bounds(&self, id: NodeId) -> Option<Rect> {
        self.node_opt(id).map(|n| n.props.local_bounds)
    }

    // --- guarded property setters ---
    //
    // Every setter is a guarded write: storing a value bit-identical to the
    // current one is a no-op and must not invalidate anything, so repeated
    // writes of the same value keep version counters stable.

    /// Set the horizontal position. NaN coerces to 0.
    pub fn set_x(&mut self, id: NodeId, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value };
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.x.to_bits() == value.to_bits() {
            return;
        }
        n.props.x = value;
        self.invalidate(id, DirtyFlags::TRANSFORM);
    }

    /// Set the vertical position. NaN coerces to 0.
    pub fn set_y(&mut self, id: NodeId, value: f64) {
        let value = if value.is_nan() { 0.0 } else { value };
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.y.to_bits() == value.to_bits() {
            return;
        }
        n.props.y = value;
        self.invalidate(id, DirtyFlags::TRANSFORM);
    }

    /// Set the rotation in degrees; the stored value is normalized into
    /// `(-180, 180]` before the guarded compare.
    pub fn set_rotation(&mut self, id: NodeId, degrees: f64) {
        let degrees = normalize_degrees(degrees);
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.rotation.to_bits() == degrees.to_bits() {
            return;
        }
        n.props.rotation = degrees;
        self.invalidate(id, DirtyFlags::TRANSFORM);
    }

    /// Set the horizontal scale factor.
    pub fn set_scale_x(&mut self, id: NodeId, value: f64) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.scale_x.to_bits() == value.to_bits() {
            return;
        }
        n.props.scale_x = value;
        self.invalidate(id, DirtyFlags::TRANSFORM);
    }

    /// Set the vertical scale factor.
    pub fn set_scale_y(&mut self, id: NodeId, value: f64) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.scale_y.to_bits() == value.to_bits() {
            return;
        }
        n.props.scale_y = value;
        self.invalidate(id, DirtyFlags::TRANSFORM);
    }

    /// Set the opacity, clamped into `[0, 1]` before the guarded compare.
    pub fn set_alpha(&mut self, id: NodeId, value: f64) {
        let value = value.clamp(0.0, 1.0);
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.alpha.to_bits() == value.to_bits() {
            return;
        }
        n.props.alpha = value;
        self.invalidate(id, DirtyFlags::APPEARANCE);
    }

    /// Set the visibility flag.
    pub fn set_visible(&mut self, id: NodeId, value: bool) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.visible == value {
            return;
        }
        n.props.visible = value;
        self.invalidate(id, DirtyFlags::APPEARANCE);
    }

    /// Set the blend mode.
    pub fn set_blend_mode(&mut self, id: NodeId, value: BlendMode) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.blend_mode == value {
            return;
        }
        n.props.blend_mode = value;
        self.invalidate(id, DirtyFlags::APPEARANCE);
    }

    /// Set or clear the opaque background color.
    pub fn set_opaque_background(&mut self, id: NodeId, value: Option<u32>) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.opaque_background == value {
            return;
        }
        n.props.opaque_background = value;
        self.invalidate(id, DirtyFlags::APPEARANCE);
    }

    /// Set or clear the scroll rectangle.
    pub fn set_scroll_rect(&mut self, id: NodeId, value: Option<Rect>) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.scroll_rect == value {
            return;
        }
        n.props.scroll_rect = value;
        self.invalidate(id, DirtyFlags::CLIP);
    }

    /// Set or clear the mask reference. The reference is non-owning.
    pub fn set_mask(&mut self, id: NodeId, value: Option<NodeId>) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.mask == value {
            return;
        }
        n.props.mask = value;
        self.invalidate(id, DirtyFlags::CLIP);
    }

    /// Update the intrinsic local bounds. This is the drawable layer's
    /// input; the core reacts only through [`DirtyFlags::BOUNDS`]
    /// invalidation.
    pub fn set_local_bounds(&mut self, id: NodeId, bounds: Rect) {
        let Some(n) = self.node_opt_mut(id) else { return };
        if n.props.local_bounds == bounds {
            return;
        }
        n.props.local_bounds = bounds;
        self.invalidate(id, DirtyFlags::BOUNDS);
    }

    // --- invalidation engine ---

    /// Record an invalidation on one node.
    ///
    /// Idempotent: when the dirty word already contains `flags` the call
    /// returns without bumping any counter. Otherwise the flags are OR-ed
    /// in and category propagation applies locally — [`DirtyFlags::TRANSFORM`]
    /// and [`DirtyFlags::BOUNDS`] imply [`DirtyFlags::TRANSFORMED_BOUNDS`]
    /// and bump their version counters; the render categories bump the
    /// appearance counter. Never walks parents or children: the cost of a
    /// mutation is O(1) regardless of subtree size, and descendant staleness
    /// is discovered by version mismatch at query time.
    ///
    /// A node whose derived state has not been materialized yet ignores
    /// invalidations — the state is born fully dirty when first created.
    pub fn invalidate(&mut self, id: NodeId, flags: DirtyFlags) {
        let Some(n) = self.node_opt_mut(id) else { return };
        let Some(d) = n.derived.as_deref_mut() else { return };
        if d.dirty.contains(flags) {
            return;
        }
        d.dirty |= flags;
        if flags.intersects(DirtyFlags::TRANSFORM) {
            d.dirty |= DirtyFlags::TRANSFORMED_BOUNDS;
            d.local_transform_version += 1;
        }
        if flags.intersects(DirtyFlags::BOUNDS) {
            d.dirty |= DirtyFlags::TRANSFORMED_BOUNDS;
            d.local_bounds_version += 1;
        }
        if flags.intersects(DirtyFlags::APPEARANCE | DirtyFlags::CLIP | DirtyFlags::CHILDREN) {
            d.appearance_version += 1;
        }
    }

    /// Current version counters, or `None` for stale ids and nodes whose
    /// derived state has not been materialized yet.
    pub fn version_stamps(&self, id: NodeId) -> Option<VersionStamps> {
        self.node_opt(id)
            .and_then(|n| n.derived.as_deref())
            .map(Derived::stamps)
    }

    /// The local-transform version counter, with the same `None` cases as
    /// [`Scene::version_stamps`]. Bumped once per effective transform write
    /// while the transform is clean; writes landing on an already-dirty
    /// transform are absorbed by the pending flag.
    pub fn local_transform_version(&self, id: NodeId) -> Option<u64> {
        self.node_opt(id)
            .and_then(|n| n.derived.as_deref())
            .map(|d| d.local_transform_version)
    }

    /// Current dirty word, with the same `None` cases as
    /// [`Scene::version_stamps`].
    pub fn dirty_flags(&self, id: NodeId) -> Option<DirtyFlags> {
        self.node_opt(id)
            .and_then(|n| n.derived.as_deref())
            .map(|d| d.dirty)
    }

    // --- resolver (pull-based recomputation) ---

    /// Resolved local transform (position/rotation/scale as one affine).
    pub fn local_transform(&mut self, id: NodeId) -> Option<Affine> {
        if !self.is_alive(id) {
            return None;
        }
        self.ensure_derived(id);
        self.resolve_local(id);
        Some(self.derived_ref(id).local_transform)
    }

    /// Resolved local→world transform, composed through every ancestor.
    pub fn world_transform(&mut self, id: NodeId) -> Option<Affine> {
        if !self.is_alive(id) {
            return None;
        }
        self.resolve_world(id);
        Some(self.derived_ref(id).world_transform)
    }

    /// Resolved bounds in the parent's coordinate space (local bounds
    /// through the local transform).
    pub fn bounds(&mut self, id: NodeId) -> Option<Rect> {
        if !self.is_alive(id) {
            return None;
        }
        self.resolve_bounds_cache(id);
        Some(self.derived_ref(id).bounds)
    }

    /// Resolved world-space AABB of the local bounds.
    pub fn world_bounds(&mut self, id: NodeId) -> Option<Rect> {
        if !self.is_alive(id) {
            return None;
        }
        self.resolve_world_bounds_cache(id);
        Some(self.derived_ref(id).world_bounds)
    }

    /// Bounds of `id` expressed in `target`'s coordinate space.
    ///
    /// `None` target (or `target == id`) is the identity space and returns
    /// the stored local bounds exactly. Otherwise both world transforms are
    /// resolved and the local bounds go through
    /// `invert(target.world) * id.world` corner-wise, so rotation yields a
    /// conservative AABB rather than a naively scaled rectangle.
    pub fn bounds_in(&mut self, id: NodeId, target: Option<NodeId>) -> Option<Rect> {
        if !self.is_alive(id) {
            return None;
        }
        match target {
            None => Some(self.node(id).props.local_bounds),
            Some(t) if t == id => Some(self.node(id).props.local_bounds),
            Some(t) => {
                if !self.is_alive(t) {
                    return None;
                }
                self.resolve_world(id);
                self.resolve_world(t);
                let to_world = self.derived_ref(id).world_transform;
                let from_world = invert_affine(self.derived_ref(t).world_transform);
                Some(transform_rect_bbox(
                    from_world * to_world,
                    self.node(id).props.local_bounds,
                ))
            }
        }
    }

    /// Map a point from `id`'s local space into world space.
    pub fn local_to_world(&mut self, id: NodeId, point: Point) -> Option<Point> {
        Some(self.world_transform(id)? * point)
    }

    /// Map a world-space point into `id`'s local space. A singular world
    /// transform degrades to the collapsed point rather than failing.
    pub fn world_to_local(&mut self, id: NodeId, point: Point) -> Option<Point> {
        Some(invert_affine(self.world_transform(id)?) * point)
    }

    // --- hit testing ---

    /// Test a world-space point against this node's local bounds.
    ///
    /// A node that is invisible or has no opaque background set is not a
    /// hit target and always reports `false`. Containment is half-open:
    /// the minimum edges are inside, the maximum edges are outside.
    pub fn hit_test_point(&mut self, id: NodeId, point: Point) -> bool {
        let Some(n) = self.node_opt(id) else {
            return false;
        };
        if !n.props.visible || n.props.opaque_background.is_none() {
            return false;
        }
        self.resolve_world(id);
        let local = invert_affine(self.derived_ref(id).world_transform) * point;
        self.node(id).props.local_bounds.contains(local)
    }

    /// Test whether two nodes' bounds overlap.
    ///
    /// Only attached content participates: if either node has no parent the
    /// result is `false`. The overlap test is open-interval — rectangles
    /// touching along an edge do not intersect.
    pub fn hit_test_node(&mut self, a: NodeId, b: NodeId) -> bool {
        if !self.is_alive(a) || !self.is_alive(b) {
            return false;
        }
        if self.node(a).parent.is_none() || self.node(b).parent.is_none() {
            return false;
        }
        let Some(b_in_a) = self.bounds_in(b, Some(a)) else {
            return false;
        };
        rects_overlap_open(self.node(a).props.local_bounds, b_in_a)
    }

    // --- container (structural) operations ---

    /// Append `child` to `container`'s child list.
    ///
    /// Equivalent to [`Scene::add_child_at`] with the current child count;
    /// if `child` already belongs to `container` it moves to the end.
    pub fn add_child(&mut self, container: NodeId, child: NodeId) -> Result<(), SceneError> {
        let count = self
            .child_count(container)
            .ok_or(SceneError::InvalidArgument)?;
        self.add_child_at(container, child, count)
    }

    /// Insert `child` into `container`'s child list at `index`.
    ///
    /// Errors with [`SceneError::InvalidArgument`] for stale ids,
    /// self-parenting, parenting a root node, or attaching an ancestor of
    /// `container` (which would create a cycle), and with
    /// [`SceneError::OutOfRange`] when `index` exceeds the child count.
    ///
    /// A child already under `container` is repositioned (removed, then
    /// re-inserted); a child under a different parent is detached from it
    /// first, so the single-parent invariant holds by construction.
    pub fn add_child_at(
        &mut self,
        container: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        if !self.is_alive(container) || !self.is_alive(child) {
            return Err(SceneError::InvalidArgument);
        }
        if child == container || self.node(child).root {
            return Err(SceneError::InvalidArgument);
        }
        // Attaching an ancestor (or self) of the container would make a node
        // its own ancestor.
        if self.contains(child, container) {
            return Err(SceneError::InvalidArgument);
        }
        if index > self.node(container).children.len() {
            return Err(SceneError::OutOfRange);
        }
        if let Some(current) = self.node(child).parent {
            self.unlink_child(current, child);
        }
        // First tree-attachment materializes the derived state.
        self.ensure_derived(child);
        let position = index.min(self.node(container).children.len());
        self.node_mut(container).children.insert(position, child);
        self.node_mut(child).parent = Some(container);
        self.invalidate(container, DirtyFlags::CHILDREN);
        self.invalidate(child, DirtyFlags::TRANSFORM | DirtyFlags::RENDER);
        Ok(())
    }

    /// Remove `child` from `container` if it is currently one of its
    /// children. Returns the removed id, or `None` when it was not.
    pub fn remove_child(&mut self, container: NodeId, child: NodeId) -> Option<NodeId> {
        if self.child_index(container, child).is_some() {
            self.unlink_child(container, child);
            Some(child)
        } else {
            None
        }
    }

    /// Remove the child at `index`. An out-of-range index is a no-op
    /// returning `None`.
    pub fn remove_child_at(&mut self, container: NodeId, index: usize) -> Option<NodeId> {
        let child = self.child_at(container, index)?;
        self.unlink_child(container, child);
        Some(child)
    }

    /// Remove the children in the half-open index range `[begin, end)`.
    ///
    /// Errors with [`SceneError::OutOfRange`] when `begin > end` or `end`
    /// exceeds the child count; a stale container is
    /// [`SceneError::InvalidArgument`].
    pub fn remove_children(
        &mut self,
        container: NodeId,
        begin: usize,
        end: usize,
    ) -> Result<(), SceneError> {
        if !self.is_alive(container) {
            return Err(SceneError::InvalidArgument);
        }
        let len = self.node(container).children.len();
        if begin > end || end > len {
            return Err(SceneError::OutOfRange);
        }
        let removed: Vec<NodeId> = self.node(container).children[begin..end].to_vec();
        for child in removed {
            self.unlink_child(container, child);
        }
        Ok(())
    }

    /// Move an existing child to a new position in the list.
    ///
    /// A `child` that is not currently a child of `container` is silently
    /// ignored; an `index` beyond the last child errors with
    /// [`SceneError::OutOfRange`].
    pub fn set_child_index(
        &mut self,
        container: NodeId,
        child: NodeId,
        index: usize,
    ) -> Result<(), SceneError> {
        let Some(position) = self.child_index(container, child) else {
            return Ok(());
        };
        if index >= self.node(container).children.len() {
            return Err(SceneError::OutOfRange);
        }
        if position != index {
            let c = self.node_mut(container);
            c.children.remove(position);
            c.children.insert(index, child);
            self.invalidate(container, DirtyFlags::CHILDREN);
        }
        Ok(())
    }

    /// Swap the positions of two children. Silently a no-op when either
    /// node is not a child of `container`.
    pub fn swap_children(&mut self, container: NodeId, a: NodeId, b: NodeId) {
        let (Some(i), Some(j)) = (
            self.child_index(container, a),
            self.child_index(container, b),
        ) else {
            return;
        };
        if i != j {
            self.node_mut(container).children.swap(i, j);
            self.invalidate(container, DirtyFlags::CHILDREN);
        }
    }

    /// Swap the children at two indices. Unlike the name-based
    /// [`Scene::swap_children`], invalid indices error with
    /// [`SceneError::OutOfRange`].
    pub fn swap_children_at(
        &mut self,
        container: NodeId,
        i: usize,
        j: usize,
    ) -> Result<(), SceneError> {
        if !self.is_alive(container) {
            return Err(SceneError::InvalidArgument);
        }
        let len = self.node(container).children.len();
        if i >= len || j >= len {
            return Err(SceneError::OutOfRange);
        }
        if i != j {
            self.node_mut(container).children.swap(i, j);
            self.invalidate(container, DirtyFlags::CHILDREN);
        }
        Ok(())
    }

    // --- render seam ---

    /// Resolve and bundle everything the render traversal needs from one
    /// node. Consumes the pending appearance/clip/children dirty bits.
    pub fn render_snapshot(&mut self, id: NodeId) -> Option<RenderSnapshot> {
        if !self.is_alive(id) {
            return None;
        }
        self.resolve_world_bounds_cache(id);
        let n = self.node_mut(id);
        let props = n.props;
        let d = n
            .derived
            .as_deref_mut()
            .expect("derived state not materialized");
        d.dirty
            .remove(DirtyFlags::APPEARANCE | DirtyFlags::CLIP | DirtyFlags::CHILDREN);
        Some(RenderSnapshot {
            world_transform: d.world_transform,
            world_bounds: d.world_bounds,
            stamps: d.stamps(),
            visible: props.visible,
            alpha: props.alpha,
            blend_mode: props.blend_mode,
            scroll_rect: props.scroll_rect,
            mask: props.mask,
        })
    }

    // --- internals ---

    /// Access a node; panics if `id` is stale.
    fn node(&self, id: NodeId) -> &Node {
        self.nodes[id.idx()].as_ref().expect("dangling NodeId")
    }

    /// Access a node mutably; panics if `id` is stale.
    fn node_mut(&mut self, id: NodeId) -> &mut Node {
        self.nodes[id.idx()].as_mut().expect("dangling NodeId")
    }

    fn node_opt(&self, id: NodeId) -> Option<&Node> {
        let n = self.nodes.get(id.idx())?.as_ref()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn node_opt_mut(&mut self, id: NodeId) -> Option<&mut Node> {
        let n = self.nodes.get_mut(id.idx())?.as_mut()?;
        if n.generation != id.1 {
            return None;
        }
        Some(n)
    }

    fn derived_ref(&self, id: NodeId) -> &Derived {
        self.node(id)
            .derived
            .as_deref()
            .expect("derived state not materialized")
    }

    fn derived_mut(&mut self, id: NodeId) -> &mut Derived {
        self.node_mut(id)
            .derived
            .as_deref_mut()
            .expect("derived state not materialized")
    }

    fn ensure_derived(&mut self, id: NodeId) {
        let n = self.node_mut(id);
        if n.derived.is_none() {
            n.derived = Some(Box::new(Derived::new()));
        }
    }

    fn unlink_child(&mut self, container: NodeId, child: NodeId) {
        self.node_mut(container).children.retain(|&c| c != child);
        self.node_mut(child).parent = None;
        self.invalidate(container, DirtyFlags::CHILDREN);
        // The orphan's world position and visibility guarantees no longer
        // hold, so it takes the full render-affecting flag set.
        self.invalidate(child, DirtyFlags::TRANSFORM | DirtyFlags::RENDER);
    }

    fn resolve_local(&mut self, id: NodeId) {
        let n = self.node_mut(id);
        let props = n.props;
        let Some(d) = n.derived.as_deref_mut() else {
            return;
        };
        if !d.dirty.contains(DirtyFlags::TRANSFORM) {
            return;
        }
        if props.rotation != d.rot_degrees {
            let (sin, cos) = sin_cos_degrees(props.rotation);
            d.rot_degrees = props.rotation;
            d.rot_sin = sin;
            d.rot_cos = cos;
        }
        // translate(x, y) * rotate(θ) * scale(sx, sy), written out.
        d.local_transform = Affine::new([
            d.rot_cos * props.scale_x,
            d.rot_sin * props.scale_x,
            -d.rot_sin * props.scale_y,
            d.rot_cos * props.scale_y,
            props.x,
            props.y,
        ]);
        d.dirty.remove(DirtyFlags::TRANSFORM);
    }

    /// Resolve the world transform, parents first. This is the one place
    /// recursion is unavoidable; it is bounded by tree depth, not subtree
    /// size, and recomposes only where the observed-version markers say the
    /// cached composition went stale.
    fn resolve_world(&mut self, id: NodeId) {
        let parent = self.node(id).parent;
        if let Some(p) = parent {
            self.resolve_world(p);
        }
        self.ensure_derived(id);
        self.resolve_local(id);
        let (parent_tf, parent_version) = match parent {
            Some(p) => {
                let pd = self.derived_ref(p);
                (pd.world_transform, pd.world_transform_version)
            }
            None => (Affine::IDENTITY, 0),
        };
        let d = self.derived_mut(id);
        if d.world_local_seen != d.local_transform_version
            || d.parent_world_seen != parent_version
        {
            d.world_transform = parent_tf * d.local_transform;
            d.world_transform_version += 1;
            d.world_local_seen = d.local_transform_version;
            d.parent_world_seen = parent_version;
        }
    }

    fn resolve_bounds_cache(&mut self, id: NodeId) {
        self.ensure_derived(id);
        self.resolve_local(id);
        let n = self.node_mut(id);
        let local_bounds = n.props.local_bounds;
        let d = n
            .derived
            .as_deref_mut()
            .expect("derived state not materialized");
        if d.dirty
            .intersects(DirtyFlags::TRANSFORMED_BOUNDS | DirtyFlags::BOUNDS)
            || d.bounds_transform_seen != d.local_transform_version
            || d.bounds_content_seen != d.local_bounds_version
        {
            d.bounds = transform_rect_bbox(d.local_transform, local_bounds);
            d.bounds_transform_seen = d.local_transform_version;
            d.bounds_content_seen = d.local_bounds_version;
            d.dirty
                .remove(DirtyFlags::TRANSFORMED_BOUNDS | DirtyFlags::BOUNDS);
        }
    }

    fn resolve_world_bounds_cache(&mut self, id: NodeId) {
        self.resolve_world(id);
        let n = self.node_mut(id);
        let local_bounds = n.props.local_bounds;
        let d = n
            .derived
            .as_deref_mut()
            .expect("derived state not materialized");
        if d.dirty.intersects(DirtyFlags::BOUNDS)
            || d.world_bounds_transform_seen != d.world_transform_version
            || d.world_bounds_content_seen != d.local_bounds_version
        {
            d.world_bounds = transform_rect_bbox(d.world_transform, local_bounds);
            d.world_bounds_transform_seen = d.world_transform_version;
            d.world_bounds_content_seen = d.local_bounds_version;
            d.dirty.remove(DirtyFlags::BOUNDS);
        }
    }
}
