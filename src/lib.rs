#![warn(missing_docs)]
#![warn(rustdoc::missing_crate_level_docs)]
#![warn(rustdoc::invalid_rust_codeblocks)]

//! # Voxelstream
//!
//! The streaming core of a voxel world: keeps an effectively infinite,
//! procedurally generated world resident in memory around a moving player
//! while generating, meshing, and uploading terrain without stalling the
//! render loop.
//!
//! ## Key Modules
//!
//! * `scheduler` - Priority work-stealing thread pool with an opt-in
//!   synchronization barrier
//! * `voxels` - Materials, faces, and the per-chunk mesh state machine
//! * `scene` - Chunk streaming, terrain generation, and world-space queries
//! * `rendering` - The render-thread-bound GPU upload boundary
//!
//! ## Architecture
//!
//! All concurrency is explicit: N persistent pool workers plus the render
//! thread, no async. Background tasks generate terrain and build chunk
//! meshes; the render thread alone uploads finished meshes, a constraint the
//! `!Send` [`rendering::RenderContext`] enforces at compile time. A frame
//! that needs its background work finished blocks on the pool's sync
//! barrier with a timeout and carries on if the work is late.
//!
//! ## Usage
//!
//! ```no_run
//! use std::sync::Arc;
//! use cgmath::{Point3, Vector3};
//! use voxelstream::scene::{Camera, Scene};
//! use voxelstream::scheduler::ThreadPool;
//!
//! let pool = Arc::new(ThreadPool::with_default_threads());
//! let camera = Camera::new(Point3::new(0.0, 80.0, 0.0), Vector3::new(0.0, 0.0, -1.0));
//! let scene = Scene::new(pool, 42, camera);
//!
//! // Per frame: stream chunks, then (on the render thread, with a
//! // RenderContext in hand) scene.update_chunks(&ctx).
//! scene.update_chunks_around_player().unwrap();
//! ```

pub mod rendering;
pub mod scene;
pub mod scheduler;
pub mod voxels;

/// Routes `log` output to stdout, filtered by `RUST_LOG`.
pub fn init_logging() {
    let mut log_builder = env_logger::Builder::new();
    log_builder
        .target(env_logger::Target::Stdout)
        .parse_env("RUST_LOG")
        .init();
}
