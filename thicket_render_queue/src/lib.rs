// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Render Queue: the per-frame traversal that turns a
//! [`thicket_scene::Scene`] into an ordered draw list — and, more
//! importantly, into the decision *not* to draw.
//!
//! A [`RenderQueue`] holds one renderer's view of one scene: per-node
//! cache entries recording the version stamps last seen and the resolved
//! render transform. [`RenderQueue::traverse`] visits the tree once per
//! frame, refreshes stale entries, threads accumulated alpha down the
//! traversal, and reports a single `dirty` bit. When no node's stamps
//! moved since the previous frame, the caller skips the clear+draw pass
//! entirely — the main performance payoff of the scene graph's versioned
//! cache.
//!
//! Masks are handled as side entries attached to the masked node, so a
//! mask that lives outside the drawn tree still dirties the frame when it
//! moves.
//!
//! ## Example
//!
//! ```rust
//! use kurbo::Rect;
//! use thicket_render_queue::RenderQueue;
//! use thicket_scene::{NodeProps, Scene};
//!
//! let mut scene = Scene::new();
//! let root = scene.create_root(NodeProps::default());
//! let sprite = scene.create_node(NodeProps {
//!     local_bounds: Rect::new(0.0, 0.0, 16.0, 16.0),
//!     ..NodeProps::default()
//! });
//! scene.add_child(root, sprite).unwrap();
//!
//! let mut queue = RenderQueue::new();
//! assert!(queue.traverse(&mut scene, root).dirty);
//! // Nothing changed: skip the redraw.
//! assert!(!queue.traverse(&mut scene, root).dirty);
//!
//! scene.set_x(sprite, 8.0);
//! let frame = queue.traverse(&mut scene, root);
//! assert!(frame.dirty);
//! assert_eq!(frame.items.len(), 2);
//! ```
//!
//! This crate is `no_std` and uses `alloc`.

#![no_std]

extern crate alloc;

mod queue;

pub use queue::{Frame, RenderItem, RenderQueue};
