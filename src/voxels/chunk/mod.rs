//! # Chunk Module
//!
//! A chunk owns a fixed 16×16×16 voxel grid plus the mesh state machine
//! that turns that grid into GPU geometry:
//!
//! ```text
//! Clean → Dirty → Generating → Generated → Uploaded
//! ```
//!
//! Any voxel write moves the chunk back to `Dirty`, no matter where in the
//! pipeline it currently is — an `Uploaded` mesh is never left stale after
//! an edit. Mesh generation runs on a worker thread against the grid and the
//! shared chunk map (for neighbors across the chunk boundary); the upload
//! runs only on the render thread, which the `RenderContext` type enforces
//! at compile time.
//!
//! ## Locking
//!
//! Three independent pieces of interior state keep unrelated chunks from
//! serializing against each other:
//! - the voxel grid behind its own `RwLock` (writers: edits and terrain
//!   fill; readers: meshing and point queries),
//! - the CPU mesh buffers behind a chunk-local `Mutex`, held for the whole
//!   generate-and-swap,
//! - the mesh state as a single atomic, so frame-loop polling never takes a
//!   lock.

pub mod mesh;

use std::sync::atomic::{AtomicU8, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, RwLock};

use cgmath::Point3;
use log::trace;

use crate::rendering::{GpuMesh, RenderContext};
use crate::scene::chunk_map::ChunkMap;
use crate::scheduler::{SchedulerError, TaskPriority, ThreadPool};
use crate::voxels::face::{Face, FaceMask};
use crate::voxels::material::Material;
use self::mesh::MeshData;

/// Edge length of a chunk in voxels.
pub const CHUNK_SIZE: i32 = 16;
/// Total number of voxel cells in a chunk.
pub const CHUNK_VOLUME: usize = (CHUNK_SIZE * CHUNK_SIZE * CHUNK_SIZE) as usize;

/// Dense material grid of one chunk, indexed `x + 16 * (y + 16 * z)`.
pub type VoxelGrid = [Material; CHUNK_VOLUME];

/// Position of a chunk's mesh in the generation/upload pipeline.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
#[repr(u8)]
pub enum MeshState {
    /// Freshly created; no voxel data worth meshing yet.
    Clean = 0,
    /// Voxel data changed since the last completed mesh.
    Dirty = 1,
    /// A background mesh generation task is in flight.
    Generating = 2,
    /// CPU mesh buffers are ready and await upload.
    Generated = 3,
    /// GPU buffers match the CPU mesh; nothing to do.
    Uploaded = 4,
}

/// Atomic wrapper storing a [`MeshState`] discriminant.
struct AtomicMeshState(AtomicU8);

impl AtomicMeshState {
    fn new(state: MeshState) -> Self {
        AtomicMeshState(AtomicU8::new(state as u8))
    }

    fn load(&self) -> MeshState {
        Self::from_raw(self.0.load(Ordering::Acquire))
    }

    fn store(&self, state: MeshState) {
        self.0.store(state as u8, Ordering::Release);
    }

    fn compare_exchange(&self, current: MeshState, new: MeshState) -> Result<MeshState, MeshState> {
        self.0
            .compare_exchange(
                current as u8,
                new as u8,
                Ordering::AcqRel,
                Ordering::Acquire,
            )
            .map(Self::from_raw)
            .map_err(Self::from_raw)
    }

    fn from_raw(raw: u8) -> MeshState {
        match raw {
            0 => MeshState::Clean,
            1 => MeshState::Dirty,
            2 => MeshState::Generating,
            3 => MeshState::Generated,
            4 => MeshState::Uploaded,
            _ => unreachable!("invalid mesh state discriminant"),
        }
    }
}

/// A 16×16×16 cube of voxels, the unit of loading, meshing, and streaming.
///
/// Chunks are shared as `Arc<Chunk>`: the scene's chunk map owns the handles
/// and background tasks clone them, so an unload never invalidates a task
/// that is still running against the chunk.
pub struct Chunk {
    /// Position in chunk coordinates (world position / 16, floored).
    position: Point3<i32>,
    /// Dense material grid.
    voxels: RwLock<Box<VoxelGrid>>,
    /// CPU mesh buffers; the lock is held for the whole generate-and-swap.
    mesh: Mutex<MeshData>,
    /// GPU buffers; only touched from the render thread.
    gpu: Mutex<Option<GpuMesh>>,
    mesh_state: AtomicMeshState,
}

impl Chunk {
    /// Creates an all-air chunk at the given chunk coordinate.
    pub fn new(position: Point3<i32>) -> Self {
        Chunk {
            position,
            voxels: RwLock::new(Box::new([Material::Air; CHUNK_VOLUME])),
            mesh: Mutex::new(MeshData::new()),
            gpu: Mutex::new(None),
            mesh_state: AtomicMeshState::new(MeshState::Clean),
        }
    }

    /// The chunk's position in chunk coordinates.
    pub fn position(&self) -> Point3<i32> {
        self.position
    }

    /// Current state of the mesh pipeline for this chunk.
    pub fn mesh_state(&self) -> MeshState {
        self.mesh_state.load()
    }

    fn index(local: Point3<i32>) -> usize {
        (local.x + CHUNK_SIZE * (local.y + CHUNK_SIZE * local.z)) as usize
    }

    fn in_bounds(local: Point3<i32>) -> bool {
        (0..CHUNK_SIZE).contains(&local.x)
            && (0..CHUNK_SIZE).contains(&local.y)
            && (0..CHUNK_SIZE).contains(&local.z)
    }

    /// Reads the material at a chunk-local coordinate.
    ///
    /// Out-of-bounds coordinates read as air; cross-chunk lookups belong to
    /// the scene, not the chunk.
    pub fn get_voxel(&self, local: Point3<i32>) -> Material {
        if !Self::in_bounds(local) {
            return Material::Air;
        }
        self.voxels.read().unwrap()[Self::index(local)]
    }

    /// Writes the material at a chunk-local coordinate and marks the chunk
    /// dirty, regardless of where the mesh pipeline currently is.
    ///
    /// Out-of-bounds writes are ignored.
    pub fn set_voxel(&self, local: Point3<i32>, material: Material) {
        if !Self::in_bounds(local) {
            return;
        }
        {
            let mut voxels = self.voxels.write().unwrap();
            voxels[Self::index(local)] = material;
        }
        self.mesh_state.store(MeshState::Dirty);
    }

    /// Clears the voxel at a chunk-local coordinate back to air.
    pub fn remove_voxel(&self, local: Point3<i32>) {
        self.set_voxel(local, Material::Air);
    }

    /// Replaces the whole grid in one write, used by terrain generation.
    pub(crate) fn store_voxels(&self, grid: Box<VoxelGrid>) {
        *self.voxels.write().unwrap() = grid;
        self.mesh_state.store(MeshState::Dirty);
    }

    /// Claims the chunk for a mesh generation pass.
    ///
    /// Returns `true` when the state moved `Dirty → Generating`; a second
    /// caller (or a chunk that is not dirty) gets `false` and must not
    /// generate.
    pub fn begin_mesh_generation(&self) -> bool {
        self.mesh_state
            .compare_exchange(MeshState::Dirty, MeshState::Generating)
            .is_ok()
    }

    /// Builds the face-culled mesh for the current grid contents.
    ///
    /// Runs on a worker thread. For every non-air voxel each of the six
    /// faces is tested against its neighbor: in-grid neighbors read the
    /// local grid, neighbors beyond the 16³ boundary are resolved through
    /// the shared chunk map (an absent chunk reads as air). Visible faces
    /// emit one quad with a flat normal and the material color.
    ///
    /// The chunk's mesh lock is held for the whole generate-and-swap. On
    /// completion the state advances `Generating → Generated` — unless an
    /// edit arrived mid-generation and moved the chunk back to `Dirty`, in
    /// which case the state is left `Dirty` so the next update schedules a
    /// fresh pass over the newer grid.
    pub fn generate_mesh_data(&self, map: &ChunkMap) {
        let mut mesh = self.mesh.lock().unwrap();
        mesh.clear();

        {
            let voxels = self.voxels.read().unwrap();
            let origin = Point3::new(
                self.position.x * CHUNK_SIZE,
                self.position.y * CHUNK_SIZE,
                self.position.z * CHUNK_SIZE,
            );

            for z in 0..CHUNK_SIZE {
                for y in 0..CHUNK_SIZE {
                    for x in 0..CHUNK_SIZE {
                        let local = Point3::new(x, y, z);
                        let material = voxels[Self::index(local)];
                        if !material.is_solid() {
                            continue;
                        }

                        let mut visible = FaceMask::NONE;
                        for face in Face::ALL {
                            let neighbor = local + face.offset();
                            let neighbor_material = if Self::in_bounds(neighbor) {
                                voxels[Self::index(neighbor)]
                            } else {
                                map.voxel_at(Point3::new(
                                    origin.x + neighbor.x,
                                    origin.y + neighbor.y,
                                    origin.z + neighbor.z,
                                ))
                            };
                            if !neighbor_material.occludes() {
                                visible.set(face);
                            }
                        }

                        if visible.is_empty() {
                            continue;
                        }

                        let world = Point3::new(
                            (origin.x + x) as f32,
                            (origin.y + y) as f32,
                            (origin.z + z) as f32,
                        );
                        let color = material.color();
                        for face in Face::ALL {
                            if visible.contains(face) {
                                mesh.push_face(world, face, color);
                            }
                        }
                    }
                }
            }
        }

        match self
            .mesh_state
            .compare_exchange(MeshState::Generating, MeshState::Generated)
        {
            Ok(_) => trace!(
                "meshed chunk {:?}: {} vertices",
                self.position,
                mesh.vertex_count()
            ),
            // An edit landed mid-generation; stay dirty and remesh later.
            Err(observed) => trace!(
                "chunk {:?} went {observed:?} during meshing, discarding pass",
                self.position
            ),
        }
    }

    /// Copies the generated mesh into GPU buffers.
    ///
    /// Render thread only, which `RenderContext` being `!Send` guarantees.
    /// The copy happens exactly once per generation: the state advances
    /// `Generated → Uploaded` unless an edit raced in, in which case the
    /// chunk stays `Dirty` and the next pass replaces these buffers.
    pub fn upload_mesh_data(&self, ctx: &RenderContext) {
        let mesh = self.mesh.lock().unwrap();
        if self.mesh_state.load() != MeshState::Generated {
            return;
        }

        let label = format!(
            "chunk ({}, {}, {})",
            self.position.x, self.position.y, self.position.z
        );
        *self.gpu.lock().unwrap() = GpuMesh::upload(ctx, &mesh, &label);

        let _ = self
            .mesh_state
            .compare_exchange(MeshState::Generated, MeshState::Uploaded);
    }

    /// Schedules a background mesh generation pass when the chunk is dirty.
    ///
    /// The task runs at `VeryHigh` priority and participates in the sync
    /// barrier, so a frame can wait for outstanding meshing with
    /// [`ThreadPool::sync_registered_tasks`].
    pub fn schedule_mesh_update(
        self: &Arc<Self>,
        map: &Arc<ChunkMap>,
        pool: &ThreadPool,
    ) -> Result<(), SchedulerError> {
        if !self.begin_mesh_generation() {
            return Ok(());
        }

        let chunk = Arc::clone(self);
        let map = Arc::clone(map);
        match pool.enqueue(TaskPriority::VeryHigh, true, move || {
            chunk.generate_mesh_data(&map);
        }) {
            Ok(_handle) => Ok(()),
            Err(error) => {
                // Give the claim back so a later frame can retry.
                self.mesh_state.store(MeshState::Dirty);
                Err(error)
            }
        }
    }

    /// Drives the chunk's state machine for one frame.
    ///
    /// `Dirty` chunks get a background meshing task; `Generated` chunks are
    /// uploaded on the calling (render) thread; everything else is a no-op,
    /// so calling this every frame is idempotent.
    pub fn update(
        self: &Arc<Self>,
        map: &Arc<ChunkMap>,
        pool: &ThreadPool,
        ctx: &RenderContext,
    ) -> Result<(), SchedulerError> {
        match self.mesh_state.load() {
            MeshState::Dirty => self.schedule_mesh_update(map, pool),
            MeshState::Generated => {
                self.upload_mesh_data(ctx);
                Ok(())
            }
            MeshState::Clean | MeshState::Generating | MeshState::Uploaded => Ok(()),
        }
    }

    /// The CPU mesh buffers. Held by the mesher for a whole pass; callers
    /// should keep the guard short-lived.
    pub fn mesh_data(&self) -> MutexGuard<'_, MeshData> {
        self.mesh.lock().unwrap()
    }

    /// The GPU mesh, if one has been uploaded. Draw it only while
    /// [`mesh_state`](Self::mesh_state) reports [`MeshState::Uploaded`].
    pub fn gpu_mesh(&self) -> MutexGuard<'_, Option<GpuMesh>> {
        self.gpu.lock().unwrap()
    }

    /// Number of GPU indices to draw; zero unless the mesh is uploaded.
    pub fn index_count(&self) -> u32 {
        if self.mesh_state.load() != MeshState::Uploaded {
            return 0;
        }
        self.gpu
            .lock()
            .unwrap()
            .as_ref()
            .map(|gpu| gpu.index_count)
            .unwrap_or(0)
    }
}

#[cfg(test)]
mod tests {
    use super::mesh::{INDICES_PER_FACE, VERTICES_PER_FACE};
    use super::*;

    fn empty_map() -> ChunkMap {
        ChunkMap::new()
    }

    #[test]
    fn set_then_get_returns_the_material() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        let local = Point3::new(3, 7, 11);

        assert_eq!(chunk.get_voxel(local), Material::Air);
        chunk.set_voxel(local, Material::Stone);
        assert_eq!(chunk.get_voxel(local), Material::Stone);

        chunk.remove_voxel(local);
        assert_eq!(chunk.get_voxel(local), Material::Air);
    }

    #[test]
    fn out_of_bounds_access_is_air_and_ignored() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        let outside = Point3::new(16, 0, -1);

        assert_eq!(chunk.get_voxel(outside), Material::Air);
        chunk.set_voxel(outside, Material::Dirt);
        assert_eq!(chunk.mesh_state(), MeshState::Clean);
    }

    #[test]
    fn any_edit_marks_the_chunk_dirty() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        assert_eq!(chunk.mesh_state(), MeshState::Clean);

        chunk.set_voxel(Point3::new(0, 0, 0), Material::Dirt);
        assert_eq!(chunk.mesh_state(), MeshState::Dirty);

        assert!(chunk.begin_mesh_generation());
        chunk.generate_mesh_data(&empty_map());
        assert_eq!(chunk.mesh_state(), MeshState::Generated);

        // Editing a generated chunk invalidates the mesh again; the state
        // machine never leaves a stale `Uploaded` or `Generated` behind.
        chunk.remove_voxel(Point3::new(0, 0, 0));
        assert_eq!(chunk.mesh_state(), MeshState::Dirty);
    }

    #[test]
    fn isolated_voxel_meshes_to_exactly_one_cube() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_voxel(Point3::new(8, 8, 8), Material::Stone);

        assert!(chunk.begin_mesh_generation());
        chunk.generate_mesh_data(&empty_map());

        let mesh = chunk.mesh_data();
        assert_eq!(mesh.vertex_count(), 6 * VERTICES_PER_FACE);
        assert_eq!(mesh.index_count(), 6 * INDICES_PER_FACE);
    }

    #[test]
    fn fully_surrounded_voxel_contributes_no_faces() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        // Solid 3x3x3 block; the center voxel is occluded on all six sides.
        for x in 4..7 {
            for y in 4..7 {
                for z in 4..7 {
                    chunk.set_voxel(Point3::new(x, y, z), Material::Dirt);
                }
            }
        }

        assert!(chunk.begin_mesh_generation());
        chunk.generate_mesh_data(&empty_map());

        // Only the 54 outer faces of the 3x3x3 block are visible: had the
        // center contributed anything the counts would exceed this.
        let mesh = chunk.mesh_data();
        assert_eq!(mesh.vertex_count(), 54 * VERTICES_PER_FACE);
        assert_eq!(mesh.index_count(), 54 * INDICES_PER_FACE);
    }

    #[test]
    fn neighbor_chunk_culls_faces_across_the_boundary() {
        let map = Arc::new(ChunkMap::new());
        let left = map.insert(Point3::new(0, 0, 0));
        let right = map.insert(Point3::new(1, 0, 0));

        left.set_voxel(Point3::new(15, 8, 8), Material::Stone);
        right.set_voxel(Point3::new(0, 8, 8), Material::Stone);

        assert!(left.begin_mesh_generation());
        left.generate_mesh_data(&map);

        // The +X face presses against the neighbor chunk's voxel.
        let mesh = left.mesh_data();
        assert_eq!(mesh.vertex_count(), 5 * VERTICES_PER_FACE);
        assert_eq!(mesh.index_count(), 5 * INDICES_PER_FACE);
    }

    #[test]
    fn edit_during_generation_keeps_the_chunk_dirty() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_voxel(Point3::new(1, 1, 1), Material::Stone);

        assert!(chunk.begin_mesh_generation());
        assert_eq!(chunk.mesh_state(), MeshState::Generating);

        // A concurrent edit lands while the meshing task is in flight.
        chunk.set_voxel(Point3::new(2, 2, 2), Material::Dirt);

        chunk.generate_mesh_data(&empty_map());
        // The pass must not claim `Generated`; the edit needs a fresh pass.
        assert_eq!(chunk.mesh_state(), MeshState::Dirty);

        assert!(chunk.begin_mesh_generation());
        chunk.generate_mesh_data(&empty_map());
        assert_eq!(chunk.mesh_state(), MeshState::Generated);
    }

    #[test]
    fn begin_mesh_generation_claims_only_once() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_voxel(Point3::new(0, 0, 0), Material::Stone);

        assert!(chunk.begin_mesh_generation());
        assert!(!chunk.begin_mesh_generation());
    }

    #[test]
    fn index_count_is_zero_until_uploaded() {
        let chunk = Chunk::new(Point3::new(0, 0, 0));
        chunk.set_voxel(Point3::new(0, 0, 0), Material::Stone);
        assert!(chunk.begin_mesh_generation());
        chunk.generate_mesh_data(&empty_map());

        // Generated but not uploaded: nothing valid to draw yet.
        assert_eq!(chunk.index_count(), 0);
        assert!(chunk.gpu_mesh().is_none());
    }
}
