//! # Chunk Map
//!
//! The shared index of resident chunks, keyed by chunk coordinate. Everything
//! that crosses a chunk boundary goes through here: the mesher resolving a
//! neighbor voxel on the far side of a seam, point queries in world space,
//! and the streamer loading and unloading chunks around the player.
//!
//! The map is a read-mostly structure behind a `RwLock`: meshing tasks and
//! queries take read guards concurrently, only streaming takes the write
//! guard. Chunks themselves are `Arc`-shared, so a background task holding a
//! clone keeps its chunk alive across an unload, and the guard is always
//! dropped before touching the chunk's own locks.

use std::collections::HashMap;
use std::sync::{Arc, RwLock};

use cgmath::Point3;

use crate::scene::coords;
use crate::voxels::chunk::Chunk;
use crate::voxels::material::Material;

/// Thread-safe map from chunk coordinate to resident chunk.
#[derive(Default)]
pub struct ChunkMap {
    chunks: RwLock<HashMap<Point3<i32>, Arc<Chunk>>>,
}

impl ChunkMap {
    /// Creates an empty map.
    pub fn new() -> Self {
        ChunkMap::default()
    }

    /// The chunk at a chunk coordinate, if resident.
    pub fn get(&self, position: Point3<i32>) -> Option<Arc<Chunk>> {
        self.chunks.read().unwrap().get(&position).cloned()
    }

    /// Whether a chunk is resident at a chunk coordinate.
    pub fn contains(&self, position: Point3<i32>) -> bool {
        self.chunks.read().unwrap().contains_key(&position)
    }

    /// Inserts an empty chunk at a chunk coordinate and returns it.
    ///
    /// If a chunk is already resident there it is returned unchanged, so
    /// racing loaders never clobber voxel data.
    pub fn insert(&self, position: Point3<i32>) -> Arc<Chunk> {
        let mut chunks = self.chunks.write().unwrap();
        Arc::clone(
            chunks
                .entry(position)
                .or_insert_with(|| Arc::new(Chunk::new(position))),
        )
    }

    /// Removes the chunk at a chunk coordinate, returning the evicted handle.
    ///
    /// In-flight tasks holding their own `Arc` keep running against the
    /// evicted chunk; the data is dropped when the last handle goes away.
    pub fn remove(&self, position: Point3<i32>) -> Option<Arc<Chunk>> {
        self.chunks.write().unwrap().remove(&position)
    }

    /// Number of resident chunks.
    pub fn len(&self) -> usize {
        self.chunks.read().unwrap().len()
    }

    /// Whether no chunks are resident.
    pub fn is_empty(&self) -> bool {
        self.chunks.read().unwrap().is_empty()
    }

    /// Chunk coordinates of every resident chunk.
    pub fn positions(&self) -> Vec<Point3<i32>> {
        self.chunks.read().unwrap().keys().copied().collect()
    }

    /// Handles to every resident chunk.
    pub fn chunks(&self) -> Vec<Arc<Chunk>> {
        self.chunks.read().unwrap().values().cloned().collect()
    }

    /// Material at a world-space voxel coordinate.
    ///
    /// Coordinates in unloaded chunks read as air. The map guard is released
    /// before the chunk's grid lock is taken.
    pub fn voxel_at(&self, world: Point3<i32>) -> Material {
        let chunk = self.get(coords::world_to_chunk(world));
        match chunk {
            Some(chunk) => chunk.get_voxel(coords::world_to_local(world)),
            None => Material::Air,
        }
    }

    /// Writes the material at a world-space voxel coordinate.
    ///
    /// Returns `false` when the containing chunk is not resident; streaming
    /// decides what is editable, not this map.
    pub fn set_voxel_at(&self, world: Point3<i32>, material: Material) -> bool {
        match self.get(coords::world_to_chunk(world)) {
            Some(chunk) => {
                chunk.set_voxel(coords::world_to_local(world), material);
                true
            }
            None => false,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn insert_is_idempotent_per_position() {
        let map = ChunkMap::new();
        let first = map.insert(Point3::new(2, 0, -3));
        first.set_voxel(Point3::new(1, 2, 3), Material::Stone);

        let second = map.insert(Point3::new(2, 0, -3));
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(map.len(), 1);
        assert_eq!(second.get_voxel(Point3::new(1, 2, 3)), Material::Stone);
    }

    #[test]
    fn world_queries_route_to_the_right_chunk() {
        let map = ChunkMap::new();
        map.insert(Point3::new(-1, 0, 0));

        // World x = -1 is local x = 15 of chunk -1.
        assert!(map.set_voxel_at(Point3::new(-1, 5, 5), Material::Dirt));
        assert_eq!(map.voxel_at(Point3::new(-1, 5, 5)), Material::Dirt);
        let chunk = map.get(Point3::new(-1, 0, 0)).unwrap();
        assert_eq!(chunk.get_voxel(Point3::new(15, 5, 5)), Material::Dirt);
    }

    #[test]
    fn unloaded_chunks_read_as_air_and_reject_writes() {
        let map = ChunkMap::new();
        assert_eq!(map.voxel_at(Point3::new(100, 100, 100)), Material::Air);
        assert!(!map.set_voxel_at(Point3::new(100, 100, 100), Material::Stone));
    }

    #[test]
    fn removal_keeps_live_handles_valid() {
        let map = ChunkMap::new();
        let chunk = map.insert(Point3::new(0, 0, 0));
        chunk.set_voxel(Point3::new(0, 0, 0), Material::Bedrock);

        let evicted = map.remove(Point3::new(0, 0, 0)).unwrap();
        assert!(map.is_empty());
        assert_eq!(evicted.get_voxel(Point3::new(0, 0, 0)), Material::Bedrock);
    }
}
