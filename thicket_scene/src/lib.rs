// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Thicket Scene: a Kurbo-native retained 2D scene graph with lazily
//! recomputed derived geometry.
//!
//! Thicket Scene is a reusable building block for canvas renderers, UI
//! compositors, and animation players that keep a mutable tree of
//! positioned content alive across frames.
//!
//! - Represents a hierarchy of nodes with position/rotation/scale inputs,
//!   render properties (visibility, opacity, blend mode, mask, scroll
//!   rect), and drawable-supplied local bounds.
//! - Answers geometry queries — world transforms, bounds in any node's
//!   coordinate space, point and node-vs-node hit tests — that always
//!   reflect every prior mutation.
//! - Recomputes as little as possible: an effective property write is O(1)
//!   and touches only the written node; cached transforms and bounds are
//!   pulled back up to date at query time, walking ancestors only as far
//!   as stale version stamps require.
//!
//! ## The derived-geometry cache
//!
//! Every node lazily materializes a derived-state record: its local
//! transform, world transform, parent-space bounds, and world bounds, each
//! guarded by dirty flags and monotonic u64 version counters. Mutations go
//! through guarded setters that feed the invalidation engine
//! ([`Scene::invalidate`]); the engine sets flags and bumps counters on
//! that node only — eager subtree walks never happen. A descendant
//! discovers that an ancestor moved purely through version math: each node
//! remembers the parent world-transform version it last composed against,
//! and recomposes exactly when that observation goes stale.
//!
//! ## Not a renderer
//!
//! This crate does not draw. Concrete drawables (bitmaps, shapes, text)
//! supply their intrinsic bounding boxes via [`Scene::set_local_bounds`]
//! and react to nothing else; a renderer consumes resolved transforms and
//! the per-frame traversal in the companion `thicket_render_queue` crate
//! decides whether anything needs redrawing at all.
//!
//! ## API overview
//!
//! - [`Scene`]: the node arena and every operation on it.
//! - [`NodeId`]: generational handle of a node; stale handles answer
//!   `None` from accessors and never alias a reused slot.
//! - [`NodeProps`]: the property bundle nodes are created with.
//! - [`DirtyFlags`]: invalidation categories fed to [`Scene::invalidate`].
//! - [`VersionStamps`]: the counters a per-renderer cache compares.
//! - [`RenderSnapshot`]: one node's resolved render state, the seam
//!   consumed by the render queue.
//! - [`SceneError`]: the invalid-argument / out-of-range split surfaced by
//!   container operations.
//!
//! Key operations:
//! - [`Scene::create_node`] / [`Scene::create_root`] / [`Scene::remove`]
//! - Guarded setters: [`Scene::set_x`], [`Scene::set_y`],
//!   [`Scene::set_rotation`], [`Scene::set_scale_x`], [`Scene::set_scale_y`],
//!   [`Scene::set_alpha`], [`Scene::set_visible`], [`Scene::set_blend_mode`],
//!   [`Scene::set_mask`], [`Scene::set_scroll_rect`],
//!   [`Scene::set_opaque_background`], [`Scene::set_local_bounds`]
//! - Structure: [`Scene::add_child`], [`Scene::add_child_at`],
//!   [`Scene::remove_child`], [`Scene::remove_child_at`],
//!   [`Scene::remove_children`], [`Scene::set_child_index`],
//!   [`Scene::swap_children`], [`Scene::swap_children_at`]
//! - Queries: [`Scene::local_transform`], [`Scene::world_transform`],
//!   [`Scene::bounds`], [`Scene::world_bounds`], [`Scene::bounds_in`],
//!   [`Scene::local_to_world`], [`Scene::world_to_local`],
//!   [`Scene::hit_test_point`], [`Scene::hit_test_node`]
//!
//! ## Concurrency
//!
//! Single-threaded and synchronous by design: every mutation and query
//! completes before returning, and a query immediately following a
//! mutation observes it. Confine a `Scene` to one thread, as is
//! conventional for UI and render trees.
//!
//! This crate is `no_std` and uses `alloc`. Trigonometry requires either
//! the `std` feature (default) or the `libm` feature.

#![no_std]

extern crate alloc;

#[cfg(all(not(feature = "std"), not(feature = "libm")))]
compile_error!("thicket_scene requires either the `std` or `libm` feature");

mod derived;
mod scene;
mod types;
mod util;

pub use scene::{RenderSnapshot, Scene};
pub use types::{BlendMode, DirtyFlags, NodeId, NodeProps, SceneError, VersionStamps};
