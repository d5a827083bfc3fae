//! # Scene Module
//!
//! The chunk manager: a sparse map of resident chunks streamed in and out
//! around the player, the terrain generator filling new chunks on worker
//! threads, and the world-space query API (point lookups, edits, and the
//! look-at raycast) that crosses chunk boundaries.
//!
//! ## Frame Protocol
//!
//! The application loop drives the scene with two calls per frame:
//! [`Scene::update_chunks_around_player`] (any thread; loads and unloads
//! chunks and enqueues generation work) and [`Scene::update_chunks`] (render
//! thread only; advances every chunk's mesh state machine, including GPU
//! uploads). Headless callers use [`Scene::schedule_mesh_updates`] instead
//! of the latter to drive meshing without a graphics context.

pub mod camera;
pub mod chunk_map;
pub mod coords;
pub mod raycast;
pub mod terrain;

use std::sync::Arc;

use cgmath::{Point3, Vector3};
use log::{info, trace};

use crate::rendering::RenderContext;
use crate::scheduler::{SchedulerError, TaskPriority, ThreadPool};
use crate::voxels::material::Material;

pub use camera::Camera;
pub use chunk_map::ChunkMap;
pub use raycast::{raycast, VoxelHit};
pub use terrain::TerrainGenerator;

/// Horizontal streaming radius around the player, in chunks (Euclidean).
pub const LOAD_RADIUS: i32 = 6;
/// Vertical streaming radius around the player, in chunks.
pub const VERTICAL_RADIUS: i32 = 2;
/// Upper bound on chunks materialized per streaming call; the backpressure
/// that keeps a teleporting player from flooding the pool with generation.
pub const MAX_CHUNKS_PER_FRAME: usize = 8;
/// Default reach of the look-at raycast, in voxels.
pub const DEFAULT_PICK_DISTANCE: f32 = 100.0;

/// The streamed voxel world around one player.
pub struct Scene {
    map: Arc<ChunkMap>,
    terrain: Arc<TerrainGenerator>,
    pool: Arc<ThreadPool>,
    camera: Camera,
}

impl Scene {
    /// Creates an empty scene for a world seed.
    ///
    /// No chunks are resident until the first
    /// [`update_chunks_around_player`](Self::update_chunks_around_player).
    pub fn new(pool: Arc<ThreadPool>, seed: u32, camera: Camera) -> Self {
        info!("creating scene with seed {seed}");
        Scene {
            map: Arc::new(ChunkMap::new()),
            terrain: Arc::new(TerrainGenerator::new(seed)),
            pool,
            camera,
        }
    }

    /// The shared chunk map.
    pub fn chunk_map(&self) -> &Arc<ChunkMap> {
        &self.map
    }

    /// The terrain generator for this world.
    pub fn terrain(&self) -> &TerrainGenerator {
        &self.terrain
    }

    /// The player camera.
    pub fn camera(&self) -> Camera {
        self.camera
    }

    /// Moves the player camera; streaming follows on the next update.
    pub fn set_camera(&mut self, camera: Camera) {
        self.camera = camera;
    }

    fn within_load_volume(position: Point3<i32>, player_chunk: Point3<i32>) -> bool {
        let d = position - player_chunk;
        d.x * d.x + d.z * d.z <= LOAD_RADIUS * LOAD_RADIUS && d.y.abs() <= VERTICAL_RADIUS
    }

    /// Streams chunks relative to the player position.
    ///
    /// Unloads every resident chunk outside the load volume, then
    /// materializes the nearest missing chunks — at most
    /// [`MAX_CHUNKS_PER_FRAME`] per call — and enqueues a `High` priority,
    /// barrier-registered generation task for each. Returns the number of
    /// chunks newly materialized.
    ///
    /// In-flight tasks against an unloaded chunk finish harmlessly on their
    /// own `Arc` handle; the chunk is simply never drawn again.
    pub fn update_chunks_around_player(&self) -> Result<usize, SchedulerError> {
        let player_chunk = coords::position_to_chunk(self.camera.eye);

        for position in self.map.positions() {
            if !Self::within_load_volume(position, player_chunk) && self.map.remove(position).is_some() {
                trace!("unloaded chunk {position:?}");
            }
        }

        let mut candidates = Vec::new();
        for dy in -VERTICAL_RADIUS..=VERTICAL_RADIUS {
            for dz in -LOAD_RADIUS..=LOAD_RADIUS {
                for dx in -LOAD_RADIUS..=LOAD_RADIUS {
                    if dx * dx + dz * dz > LOAD_RADIUS * LOAD_RADIUS {
                        continue;
                    }
                    let position = player_chunk + Vector3::new(dx, dy, dz);
                    if !self.map.contains(position) {
                        candidates.push(position);
                    }
                }
            }
        }
        candidates.sort_by_key(|position| {
            let d = *position - player_chunk;
            d.x * d.x + d.y * d.y + d.z * d.z
        });

        let mut loaded = 0;
        for position in candidates.into_iter().take(MAX_CHUNKS_PER_FRAME) {
            let chunk = self.map.insert(position);
            let terrain = Arc::clone(&self.terrain);
            let map = Arc::clone(&self.map);
            self.pool.enqueue(TaskPriority::High, true, move || {
                terrain.fill_chunk(&chunk, &map);
            })?;
            loaded += 1;
        }

        if loaded > 0 {
            trace!("materialized {loaded} chunks around {player_chunk:?}");
        }
        Ok(loaded)
    }

    /// Advances every resident chunk's mesh state machine for one frame.
    ///
    /// Must run on the render thread: `Generated` chunks upload their mesh
    /// through `ctx` here, which the `!Send` context pins to the calling
    /// thread.
    pub fn update_chunks(&self, ctx: &RenderContext) -> Result<(), SchedulerError> {
        for chunk in self.map.chunks() {
            chunk.update(&self.map, &self.pool, ctx)?;
        }
        Ok(())
    }

    /// Schedules mesh generation for every dirty chunk without touching the
    /// GPU. The headless counterpart of [`update_chunks`](Self::update_chunks).
    pub fn schedule_mesh_updates(&self) -> Result<(), SchedulerError> {
        for chunk in self.map.chunks() {
            chunk.schedule_mesh_update(&self.map, &self.pool)?;
        }
        Ok(())
    }

    /// Material at a world-space voxel coordinate; air in unloaded space.
    pub fn voxel_at(&self, world: Point3<i32>) -> Material {
        self.map.voxel_at(world)
    }

    /// The voxel at a world-space coordinate, or `None` when there is none:
    /// either the owning chunk is not resident, or the cell is air. Voxel
    /// identity is positional; a cell holds a voxel iff its material is not
    /// air.
    pub fn get_voxel(&self, world: Point3<i32>) -> Option<Material> {
        self.map
            .get(coords::world_to_chunk(world))
            .map(|chunk| chunk.get_voxel(coords::world_to_local(world)))
            .filter(|material| material.is_solid())
    }

    /// Writes a voxel at a world-space coordinate.
    ///
    /// Returns `false` when the owning chunk is not resident; the world
    /// outside the streamed volume is not editable.
    pub fn insert_voxel(&self, material: Material, world: Point3<i32>) -> bool {
        self.map.set_voxel_at(world, material)
    }

    /// Clears a voxel at a world-space coordinate back to air.
    pub fn remove_voxel(&self, world: Point3<i32>) -> bool {
        self.map.set_voxel_at(world, Material::Air)
    }

    /// The solid voxel the camera looks at, within `max_distance` voxels.
    pub fn voxel_looked_at(&self, max_distance: f32) -> Option<VoxelHit> {
        raycast(&self.map, self.camera.eye, self.camera.forward, max_distance)
    }
}
