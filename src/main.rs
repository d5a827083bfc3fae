//! # Headless Streaming Demo
//!
//! Exercises the world core without a window: streams chunks around a fixed
//! camera, waits for terrain generation and meshing on the sync barrier, and
//! prints what got built. Useful as a smoke test of the whole pipeline on
//! machines with no GPU.
//!
//! ## Usage
//!
//! ```bash
//! RUST_LOG=info cargo run --release
//! ```

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::{info, warn};

use voxelstream::scene::{Camera, Scene, DEFAULT_PICK_DISTANCE};
use voxelstream::scheduler::{ThreadPool, DEFAULT_SYNC_TIMEOUT};
use voxelstream::voxels::MeshState;

fn main() {
    voxelstream::init_logging();

    let pool = Arc::new(ThreadPool::with_default_threads());
    let camera = Camera::new(Point3::new(8.0, 80.0, 8.0), Vector3::new(0.0, -1.0, 0.0));
    let scene = Scene::new(Arc::clone(&pool), 2026, camera);

    // Stream the whole neighborhood in; each call is one frame's worth.
    let mut frames = 0;
    loop {
        frames += 1;
        let loaded = scene
            .update_chunks_around_player()
            .expect("pool alive during streaming");
        if loaded == 0 {
            break;
        }
    }
    info!(
        "streamed {} chunks over {frames} frames",
        scene.chunk_map().len()
    );

    if !pool.sync_registered_tasks(DEFAULT_SYNC_TIMEOUT * 40) {
        warn!("terrain generation still running past the barrier timeout");
    }

    scene
        .schedule_mesh_updates()
        .expect("pool alive during meshing");
    if !pool.sync_registered_tasks(DEFAULT_SYNC_TIMEOUT * 40) {
        warn!("meshing still running past the barrier timeout");
    }

    let mut meshed = 0;
    let mut vertices = 0;
    for chunk in scene.chunk_map().chunks() {
        if chunk.mesh_state() == MeshState::Generated {
            meshed += 1;
            vertices += chunk.mesh_data().vertex_count();
        }
    }
    info!("meshed {meshed} chunks, {vertices} vertices total");

    match scene.voxel_looked_at(DEFAULT_PICK_DISTANCE) {
        Some(hit) => info!(
            "looking at {:?} at {:?} (face {:?})",
            hit.material, hit.position, hit.face
        ),
        None => info!("looking at open sky"),
    }
}
