//! Coordinate conversions between world space, chunk space, and chunk-local
//! space.
//!
//! All conversions use floored division so negative world coordinates land in
//! the right chunk: world x = -1 belongs to chunk -1 at local offset 15, not
//! to chunk 0. Truncating division gets this wrong on the negative side,
//! which shows up as a visible seam of misplaced voxels around the origin.

use cgmath::Point3;

use crate::voxels::chunk::CHUNK_SIZE;

/// Chunk coordinate containing a world-space voxel coordinate.
pub fn world_to_chunk(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.div_euclid(CHUNK_SIZE),
        world.y.div_euclid(CHUNK_SIZE),
        world.z.div_euclid(CHUNK_SIZE),
    )
}

/// Offset of a world-space voxel coordinate within its chunk, each component
/// in `0..16`.
pub fn world_to_local(world: Point3<i32>) -> Point3<i32> {
    Point3::new(
        world.x.rem_euclid(CHUNK_SIZE),
        world.y.rem_euclid(CHUNK_SIZE),
        world.z.rem_euclid(CHUNK_SIZE),
    )
}

/// World-space coordinate of a chunk-local offset.
pub fn local_to_world(chunk: Point3<i32>, local: Point3<i32>) -> Point3<i32> {
    Point3::new(
        chunk.x * CHUNK_SIZE + local.x,
        chunk.y * CHUNK_SIZE + local.y,
        chunk.z * CHUNK_SIZE + local.z,
    )
}

/// Chunk coordinate containing a continuous world-space position.
pub fn position_to_chunk(position: Point3<f32>) -> Point3<i32> {
    world_to_chunk(Point3::new(
        position.x.floor() as i32,
        position.y.floor() as i32,
        position.z.floor() as i32,
    ))
}
