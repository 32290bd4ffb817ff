// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! The per-frame traversal: dirty detection and draw-list collection.

use alloc::vec::Vec;
use hashbrown::HashMap;
use hashbrown::hash_map::Entry;
use kurbo::{Affine, Rect};
use thicket_scene::{BlendMode, NodeId, RenderSnapshot, Scene, VersionStamps};

/// One node's contribution to the ordered draw list.
#[derive(Clone, Copy, Debug)]
pub struct RenderItem {
    /// The node to draw.
    pub node: NodeId,
    /// Resolved render (local→world) transform.
    pub transform: Affine,
    /// Accumulated alpha: the product of this node's alpha and every
    /// ancestor's, threaded down the traversal.
    pub alpha: f64,
    /// Blend mode for the backend to map.
    pub blend_mode: BlendMode,
    /// Optional local-space scroll/clip rectangle.
    pub scroll_rect: Option<Rect>,
    /// Optional mask node; its resolved transform sits in the queue's side
    /// cache.
    pub mask: Option<NodeId>,
    /// Resolved world-space AABB, usable for culling.
    pub world_bounds: Rect,
}

/// Result of one traversal.
#[derive(Debug)]
pub struct Frame<'a> {
    /// Whether anything changed since the previous traversal. When `false`
    /// the caller can skip the clear+draw pass entirely.
    pub dirty: bool,
    /// The ordered draw list, front-to-back in pre-order.
    pub items: &'a [RenderItem],
}

#[derive(Clone, Copy, Debug)]
struct CacheEntry {
    stamps: VersionStamps,
    render_transform: Affine,
    /// Traversal counter at the last visit; entries left behind by nodes
    /// that dropped out of the tree are evicted after each frame.
    last_visit: u64,
}

/// Per-renderer cache driving the redraw decision.
///
/// One `RenderQueue` belongs to one renderer of one scene. Each
/// [`RenderQueue::traverse`] walks the tree once, compares every node's
/// version stamps against the entry stored here, and reports whether the
/// frame needs redrawing at all — the main payoff of the whole caching
/// design is that an unchanged tree costs one stamp comparison per node
/// and zero drawing.
#[derive(Debug, Default)]
pub struct RenderQueue {
    entries: HashMap<NodeId, CacheEntry>,
    /// Mask state, keyed by the *masked* node. Masks live outside the
    /// drawn tree, so they get a side entry rather than a draw item.
    mask_entries: HashMap<NodeId, CacheEntry>,
    items: Vec<RenderItem>,
    frame: u64,
}

impl RenderQueue {
    /// Create an empty queue.
    pub fn new() -> Self {
        Self::default()
    }

    /// Walk the tree under `root` once, refreshing the per-node cache and
    /// collecting the ordered draw list.
    ///
    /// Depth-first with an explicit stack (stack depth is bounded by the
    /// widest sibling list, not tree depth), pre-order, children pushed in
    /// reverse so visitation follows child-index order front-to-back.
    /// Invisible nodes are dirty-checked but neither emitted nor expanded.
    pub fn traverse(&mut self, scene: &mut Scene, root: NodeId) -> Frame<'_> {
        self.frame += 1;
        self.items.clear();
        let mut dirty = false;

        let mut stack: Vec<(NodeId, f64)> = Vec::new();
        stack.push((root, 1.0));
        while let Some((id, inherited_alpha)) = stack.pop() {
            let Some(snap) = scene.render_snapshot(id) else {
                continue;
            };
            dirty |= refresh_entry(&mut self.entries, self.frame, id, &snap);
            dirty |= self.refresh_mask(scene, id, snap.mask);

            if !snap.visible {
                continue;
            }
            let alpha = inherited_alpha * snap.alpha;
            self.items.push(RenderItem {
                node: id,
                transform: snap.world_transform,
                alpha,
                blend_mode: snap.blend_mode,
                scroll_rect: snap.scroll_rect,
                mask: snap.mask,
                world_bounds: snap.world_bounds,
            });
            for &child in scene.children_of(id).iter().rev() {
                stack.push((child, alpha));
            }
        }

        // Anything not visited this frame left the tree since the last one.
        let frame = self.frame;
        let before = self.entries.len() + self.mask_entries.len();
        self.entries.retain(|_, e| e.last_visit == frame);
        self.mask_entries.retain(|_, e| e.last_visit == frame);
        if self.entries.len() + self.mask_entries.len() != before {
            dirty = true;
        }

        Frame {
            dirty,
            items: &self.items,
        }
    }

    fn refresh_mask(&mut self, scene: &mut Scene, masked: NodeId, mask: Option<NodeId>) -> bool {
        let Some(mask_id) = mask else {
            // A lingering side entry from a cleared mask is caught by the
            // end-of-frame eviction.
            return false;
        };
        let Some(snap) = scene.render_snapshot(mask_id) else {
            // A stale mask reference behaves as no mask.
            return false;
        };
        refresh_entry(&mut self.mask_entries, self.frame, masked, &snap)
    }
}

/// Fetch-or-create the cache entry for `id` and report whether its stamps
/// moved since the last refresh. A newly created entry counts as changed.
fn refresh_entry(
    map: &mut HashMap<NodeId, CacheEntry>,
    frame: u64,
    id: NodeId,
    snap: &RenderSnapshot,
) -> bool {
    match map.entry(id) {
        Entry::Occupied(mut occupied) => {
            let entry = occupied.get_mut();
            let changed = entry.stamps != snap.stamps;
            if changed {
                entry.stamps = snap.stamps;
                entry.render_transform = snap.world_transform;
            }
            entry.last_visit = frame;
            changed
        }
        Entry::Vacant(vacant) => {
            vacant.insert(CacheEntry {
                stamps: snap.stamps,
                render_transform: snap.world_transform,
                last_visit: frame,
            });
            true
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use kurbo::Rect;
    use thicket_scene::NodeProps;

    fn node_with_bounds(scene: &mut Scene, bounds: Rect) -> NodeId {
        scene.create_node(NodeProps {
            local_bounds: bounds,
            ..NodeProps::default()
        })
    }

    fn small_tree() -> (Scene, NodeId, NodeId, NodeId) {
        let mut scene = Scene::new();
        let root = scene.create_root(NodeProps::default());
        let a = node_with_bounds(&mut scene, Rect::new(0.0, 0.0, 10.0, 10.0));
        let b = node_with_bounds(&mut scene, Rect::new(0.0, 0.0, 10.0, 10.0));
        scene.add_child(root, a).unwrap();
        scene.add_child(root, b).unwrap();
        (scene, root, a, b)
    }

    #[test]
    fn unchanged_tree_skips_the_redraw() {
        let (mut scene, root, _, _) = small_tree();
        let mut queue = RenderQueue::new();

        let first = queue.traverse(&mut scene, root);
        assert!(first.dirty, "everything is new on the first frame");
        assert_eq!(first.items.len(), 3);

        let second = queue.traverse(&mut scene, root);
        assert!(!second.dirty, "no mutations, no redraw");
        assert_eq!(second.items.len(), 3, "the draw list is still available");
    }

    #[test]
    fn effective_mutation_dirties_one_frame() {
        let (mut scene, root, a, _) = small_tree();
        let mut queue = RenderQueue::new();
        let _ = queue.traverse(&mut scene, root);

        scene.set_x(a, 25.0);
        assert!(queue.traverse(&mut scene, root).dirty);
        assert!(!queue.traverse(&mut scene, root).dirty);

        // A write of the stored value is a no-op end to end.
        scene.set_x(a, 25.0);
        assert!(!queue.traverse(&mut scene, root).dirty);
    }

    #[test]
    fn items_are_preorder_front_to_back() {
        let mut scene = Scene::new();
        let root = scene.create_root(NodeProps::default());
        let a = scene.create_node(NodeProps::default());
        let b = scene.create_node(NodeProps::default());
        let c = scene.create_node(NodeProps::default());
        scene.add_child(root, a).unwrap();
        scene.add_child(root, b).unwrap();
        scene.add_child(a, c).unwrap();

        let mut queue = RenderQueue::new();
        let frame = queue.traverse(&mut scene, root);
        let order: Vec<NodeId> = frame.items.iter().map(|i| i.node).collect();
        assert_eq!(order, [root, a, c, b]);
    }

    #[test]
    fn alpha_accumulates_down_the_tree() {
        let (mut scene, root, a, _) = small_tree();
        let leaf = scene.create_node(NodeProps::default());
        scene.add_child(a, leaf).unwrap();
        scene.set_alpha(root, 0.5);
        scene.set_alpha(a, 0.5);
        scene.set_alpha(leaf, 0.8);

        let mut queue = RenderQueue::new();
        let frame = queue.traverse(&mut scene, root);
        let alpha_of = |id: NodeId| {
            frame
                .items
                .iter()
                .find(|i| i.node == id)
                .map(|i| i.alpha)
                .unwrap()
        };
        assert_eq!(alpha_of(root), 0.5);
        assert_eq!(alpha_of(a), 0.25);
        assert!((alpha_of(leaf) - 0.2).abs() < 1e-12);
    }

    #[test]
    fn invisible_subtree_is_not_drawn_but_still_detected() {
        let (mut scene, root, a, b) = small_tree();
        let leaf = scene.create_node(NodeProps::default());
        scene.add_child(a, leaf).unwrap();

        let mut queue = RenderQueue::new();
        let _ = queue.traverse(&mut scene, root);

        scene.set_visible(a, false);
        let frame = queue.traverse(&mut scene, root);
        assert!(frame.dirty);
        let drawn: Vec<NodeId> = frame.items.iter().map(|i| i.node).collect();
        assert_eq!(drawn, [root, b], "hidden subtree drops out of the list");

        assert!(!queue.traverse(&mut scene, root).dirty);

        // Toggling back is one dirty frame again.
        scene.set_visible(a, true);
        assert!(queue.traverse(&mut scene, root).dirty);
        assert!(!queue.traverse(&mut scene, root).dirty);
    }

    #[test]
    fn removal_dirties_through_eviction() {
        let (mut scene, root, a, _) = small_tree();
        let mut queue = RenderQueue::new();
        let _ = queue.traverse(&mut scene, root);

        scene.remove_child(root, a).unwrap();
        let frame = queue.traverse(&mut scene, root);
        assert!(frame.dirty);
        assert_eq!(frame.items.len(), 2);
        assert!(!queue.traverse(&mut scene, root).dirty);
    }

    #[test]
    fn reorder_dirties_through_the_container() {
        let (mut scene, root, a, b) = small_tree();
        let mut queue = RenderQueue::new();
        let _ = queue.traverse(&mut scene, root);

        scene.swap_children(root, a, b);
        let frame = queue.traverse(&mut scene, root);
        assert!(frame.dirty, "draw order changed even though no node moved");
        let order: Vec<NodeId> = frame.items.iter().map(|i| i.node).collect();
        assert_eq!(order, [root, b, a]);
        assert!(!queue.traverse(&mut scene, root).dirty);
    }

    #[test]
    fn out_of_tree_mask_changes_are_detected() {
        let (mut scene, root, a, _) = small_tree();
        // The mask never enters the tree; it is reachable only through the
        // mask reference.
        let mask = node_with_bounds(&mut scene, Rect::new(0.0, 0.0, 4.0, 4.0));
        scene.set_mask(a, Some(mask));

        let mut queue = RenderQueue::new();
        assert!(queue.traverse(&mut scene, root).dirty);
        assert!(!queue.traverse(&mut scene, root).dirty);

        // Moving the detached mask must still dirty the frame.
        scene.set_x(mask, 3.0);
        assert!(queue.traverse(&mut scene, root).dirty);
        assert!(!queue.traverse(&mut scene, root).dirty);
    }

    #[test]
    fn clearing_a_mask_dirties_once() {
        let (mut scene, root, a, _) = small_tree();
        let mask = scene.create_node(NodeProps::default());
        scene.set_mask(a, Some(mask));

        let mut queue = RenderQueue::new();
        let _ = queue.traverse(&mut scene, root);

        scene.set_mask(a, None);
        assert!(queue.traverse(&mut scene, root).dirty);
        assert!(!queue.traverse(&mut scene, root).dirty);
    }

    #[test]
    fn destroyed_mask_behaves_as_no_mask() {
        let (mut scene, root, a, _) = small_tree();
        let mask = scene.create_node(NodeProps::default());
        scene.set_mask(a, Some(mask));

        let mut queue = RenderQueue::new();
        let _ = queue.traverse(&mut scene, root);

        scene.remove(mask);
        // The stale reference stops producing a side entry; its eviction is
        // one dirty frame, after which things settle.
        assert!(queue.traverse(&mut scene, root).dirty);
        assert!(!queue.traverse(&mut scene, root).dirty);
    }

    #[test]
    fn two_queues_track_one_scene_independently() {
        let (mut scene, root, a, _) = small_tree();
        let mut q1 = RenderQueue::new();
        let mut q2 = RenderQueue::new();

        let _ = q1.traverse(&mut scene, root);
        scene.set_x(a, 9.0);
        assert!(q1.traverse(&mut scene, root).dirty);

        // The second renderer has never seen anything: its first frame is
        // dirty on its own terms.
        assert!(q2.traverse(&mut scene, root).dirty);
        assert!(!q2.traverse(&mut scene, root).dirty);
        assert!(!q1.traverse(&mut scene, root).dirty);
    }
}
