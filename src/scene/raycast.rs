//! # Voxel Raycasting
//!
//! Grid traversal for picking the voxel the player is looking at. The walk
//! is a 3D DDA: starting from the voxel containing the ray origin, it
//! repeatedly steps across whichever axis boundary the ray crosses next,
//! testing each entered voxel against the chunk map until it finds a solid
//! one or exceeds the range.
//!
//! The traversal visits every voxel the ray passes through in order, so thin
//! walls can never be skipped the way a fixed-step sampling march would skip
//! them. Unloaded chunks read as air and are walked straight through.

use cgmath::{InnerSpace, Point3, Vector3};

use crate::scene::chunk_map::ChunkMap;
use crate::voxels::face::Face;
use crate::voxels::material::Material;

/// A solid voxel found by [`raycast`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VoxelHit {
    /// World-space coordinate of the hit voxel.
    pub position: Point3<i32>,
    /// Material of the hit voxel.
    pub material: Material,
    /// The face through which the ray entered the voxel. Placing a new voxel
    /// against this face puts it in the cell the ray came from.
    pub face: Face,
}

/// Per-axis traversal state: step direction, distance along the ray to the
/// next boundary crossing, and distance between crossings. Axes the ray is
/// parallel to never advance (`t_next` stays infinite).
fn axis_setup(origin: f32, dir: f32) -> (i32, f32, f32) {
    if dir > 0.0 {
        (1, (origin.floor() + 1.0 - origin) / dir, 1.0 / dir)
    } else if dir < 0.0 {
        (-1, (origin - origin.floor()) / -dir, -1.0 / dir)
    } else {
        (0, f32::INFINITY, f32::INFINITY)
    }
}

/// Walks the voxel grid from `origin` along `direction`, returning the first
/// solid voxel within `max_distance`, or `None` when the ray only crosses
/// air (and unloaded chunks) for its whole length.
///
/// The voxel containing the origin itself is not tested; the ray has not
/// entered it through any face.
pub fn raycast(
    map: &ChunkMap,
    origin: Point3<f32>,
    direction: Vector3<f32>,
    max_distance: f32,
) -> Option<VoxelHit> {
    if direction.magnitude2() <= f32::EPSILON {
        return None;
    }
    let dir = direction.normalize();

    let mut voxel = Point3::new(
        origin.x.floor() as i32,
        origin.y.floor() as i32,
        origin.z.floor() as i32,
    );

    let (step_x, mut t_next_x, t_delta_x) = axis_setup(origin.x, dir.x);
    let (step_y, mut t_next_y, t_delta_y) = axis_setup(origin.y, dir.y);
    let (step_z, mut t_next_z, t_delta_z) = axis_setup(origin.z, dir.z);

    loop {
        // Step across whichever axis boundary comes first along the ray.
        let (entered, traveled) = if t_next_x <= t_next_y && t_next_x <= t_next_z {
            let traveled = t_next_x;
            voxel.x += step_x;
            t_next_x += t_delta_x;
            let face = if step_x > 0 { Face::NegX } else { Face::PosX };
            (face, traveled)
        } else if t_next_y <= t_next_z {
            let traveled = t_next_y;
            voxel.y += step_y;
            t_next_y += t_delta_y;
            let face = if step_y > 0 { Face::NegY } else { Face::PosY };
            (face, traveled)
        } else {
            let traveled = t_next_z;
            voxel.z += step_z;
            t_next_z += t_delta_z;
            let face = if step_z > 0 { Face::NegZ } else { Face::PosZ };
            (face, traveled)
        };

        if traveled > max_distance {
            return None;
        }

        let material = map.voxel_at(voxel);
        if material.is_solid() {
            return Some(VoxelHit {
                position: voxel,
                material,
                face: entered,
            });
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn flat_floor_map() -> ChunkMap {
        // A 16x16 stone floor at world y = 0.
        let map = ChunkMap::new();
        let chunk = map.insert(Point3::new(0, 0, 0));
        for x in 0..16 {
            for z in 0..16 {
                chunk.set_voxel(Point3::new(x, 0, z), Material::Stone);
            }
        }
        map
    }

    #[test]
    fn straight_down_hits_the_floor_top_face() {
        let map = flat_floor_map();
        let hit = raycast(
            &map,
            Point3::new(8.5, 5.5, 8.5),
            Vector3::new(0.0, -1.0, 0.0),
            10.0,
        )
        .expect("floor within range");

        assert_eq!(hit.position, Point3::new(8, 0, 8));
        assert_eq!(hit.material, Material::Stone);
        assert_eq!(hit.face, Face::PosY);
    }

    #[test]
    fn out_of_range_misses() {
        let map = flat_floor_map();
        let hit = raycast(
            &map,
            Point3::new(8.5, 50.0, 8.5),
            Vector3::new(0.0, -1.0, 0.0),
            10.0,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn ray_through_air_and_unloaded_chunks_misses() {
        let map = flat_floor_map();
        let hit = raycast(
            &map,
            Point3::new(8.5, 5.5, 8.5),
            Vector3::new(0.0, 1.0, 0.0),
            200.0,
        );
        assert_eq!(hit, None);
    }

    #[test]
    fn diagonal_ray_enters_through_the_side_face() {
        let map = ChunkMap::new();
        let chunk = map.insert(Point3::new(0, 0, 0));
        chunk.set_voxel(Point3::new(8, 8, 8), Material::Dirt);

        // Approach mostly along +X so the final step crosses the X boundary.
        let hit = raycast(
            &map,
            Point3::new(2.5, 8.4, 8.5),
            Vector3::new(1.0, 0.02, 0.0),
            20.0,
        )
        .expect("block within range");

        assert_eq!(hit.position, Point3::new(8, 8, 8));
        assert_eq!(hit.face, Face::NegX);
    }

    #[test]
    fn thin_wall_is_never_stepped_over() {
        let map = ChunkMap::new();
        let chunk = map.insert(Point3::new(0, 0, 0));
        // A one-voxel-thick wall across the ray path.
        for y in 0..16 {
            for z in 0..16 {
                chunk.set_voxel(Point3::new(10, y, z), Material::Stone);
            }
        }

        let hit = raycast(
            &map,
            Point3::new(0.5, 7.3, 7.9),
            Vector3::new(0.97, 0.12, -0.21),
            40.0,
        )
        .expect("wall blocks every path");
        assert_eq!(hit.position.x, 10);
        assert_eq!(hit.face, Face::NegX);
    }

    #[test]
    fn zero_direction_is_rejected() {
        let map = flat_floor_map();
        assert_eq!(
            raycast(
                &map,
                Point3::new(8.0, 5.0, 8.0),
                Vector3::new(0.0, 0.0, 0.0),
                10.0
            ),
            None
        );
    }
}
