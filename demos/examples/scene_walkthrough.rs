// Copyright 2026 the Thicket Authors
// SPDX-License-Identifier: Apache-2.0 OR MIT

//! Builds a small scene, mutates it, and shows how the render queue
//! decides whether each frame needs redrawing.

use kurbo::{Point, Rect};
use thicket_render_queue::RenderQueue;
use thicket_scene::{NodeProps, Scene};

fn main() {
    let mut scene = Scene::new();
    let stage = scene.create_root(NodeProps::default());

    let panel = scene.create_node(NodeProps {
        local_bounds: Rect::new(0.0, 0.0, 200.0, 120.0),
        opaque_background: Some(0x20_30_40),
        ..NodeProps::default()
    });
    let icon = scene.create_node(NodeProps {
        local_bounds: Rect::new(0.0, 0.0, 16.0, 16.0),
        ..NodeProps::default()
    });
    scene.add_child(stage, panel).unwrap();
    scene.add_child(panel, icon).unwrap();

    scene.set_x(panel, 40.0);
    scene.set_y(panel, 20.0);
    scene.set_x(icon, 8.0);
    scene.set_y(icon, 8.0);
    scene.set_rotation(icon, 45.0);

    let mut queue = RenderQueue::new();

    for frame_number in 0..4 {
        // Mutate only on the third frame.
        if frame_number == 2 {
            scene.set_x(icon, 96.0);
        }
        let frame = queue.traverse(&mut scene, stage);
        println!(
            "frame {frame_number}: dirty = {}, {} item(s)",
            frame.dirty,
            frame.items.len()
        );
        if frame.dirty {
            for item in frame.items {
                println!(
                    "  draw {:?} at {:?} (alpha {:.2})",
                    item.node,
                    item.transform.translation(),
                    item.alpha
                );
            }
        }
    }

    let probe = Point::new(50.0, 30.0);
    println!(
        "hit test at {probe:?}: {}",
        scene.hit_test_point(panel, probe)
    );
    println!(
        "icon bounds on the stage: {:?}",
        scene.bounds_in(icon, Some(stage)).unwrap()
    );
}
