//! CPU-side mesh data for a chunk.
//!
//! The mesher emits one quad (4 vertices, 6 indices) per visible voxel face
//! into a `MeshData`, which is later copied verbatim into GPU buffers on the
//! render thread. Winding follows the face corner tables, two triangles per
//! quad: `0,1,2, 2,3,0`.

use cgmath::Point3;

use crate::rendering::Vertex;
use crate::voxels::face::Face;

/// Number of vertices emitted per visible face.
pub const VERTICES_PER_FACE: usize = 4;
/// Number of indices emitted per visible face.
pub const INDICES_PER_FACE: usize = 6;

/// Vertex and index buffers for one chunk mesh, produced on a worker thread
/// and consumed by the GPU upload on the render thread.
#[derive(Debug, Default)]
pub struct MeshData {
    /// Flat-shaded, vertex-colored mesh vertices in world space.
    pub vertices: Vec<Vertex>,
    /// Triangle indices into `vertices`.
    pub indices: Vec<u32>,
}

impl MeshData {
    /// Creates an empty mesh.
    pub fn new() -> Self {
        MeshData::default()
    }

    /// Removes all mesh data, keeping the allocations for the next pass.
    pub fn clear(&mut self) {
        self.vertices.clear();
        self.indices.clear();
    }

    /// Whether the mesh has nothing to draw.
    pub fn is_empty(&self) -> bool {
        self.indices.is_empty()
    }

    /// Number of vertices in the mesh.
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }

    /// Number of indices in the mesh.
    pub fn index_count(&self) -> usize {
        self.indices.len()
    }

    /// Appends one quad for `face` of the voxel whose minimum corner sits at
    /// `origin` (world space), colored `color` with the face's flat normal.
    pub fn push_face(&mut self, origin: Point3<f32>, face: Face, color: [f32; 4]) {
        let base = self.vertices.len() as u32;
        let normal = face.normal();

        for corner in face.corners() {
            self.vertices.push(Vertex::new(
                [
                    origin.x + corner[0],
                    origin.y + corner[1],
                    origin.z + corner[2],
                ],
                normal,
                color,
            ));
        }

        self.indices.extend_from_slice(&[
            base,
            base + 1,
            base + 2,
            base + 2,
            base + 3,
            base,
        ]);
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::voxels::material::Material;

    #[test]
    fn push_face_emits_one_quad() {
        let mut mesh = MeshData::new();
        mesh.push_face(
            Point3::new(0.0, 0.0, 0.0),
            Face::PosY,
            Material::Stone.color(),
        );

        assert_eq!(mesh.vertex_count(), VERTICES_PER_FACE);
        assert_eq!(mesh.index_count(), INDICES_PER_FACE);
        assert!(!mesh.is_empty());

        // Top face vertices all sit on the y = 1 plane with an up normal.
        for vertex in &mesh.vertices {
            assert_eq!(vertex.position[1], 1.0);
            assert_eq!(vertex.normal, [0.0, 1.0, 0.0]);
            assert_eq!(vertex.color, Material::Stone.color());
        }
    }

    #[test]
    fn indices_are_offset_per_quad() {
        let mut mesh = MeshData::new();
        mesh.push_face(
            Point3::new(0.0, 0.0, 0.0),
            Face::PosX,
            Material::Dirt.color(),
        );
        mesh.push_face(
            Point3::new(5.0, 0.0, -3.0),
            Face::NegZ,
            Material::Dirt.color(),
        );

        assert_eq!(mesh.indices[..6], [0, 1, 2, 2, 3, 0]);
        assert_eq!(mesh.indices[6..], [4, 5, 6, 6, 7, 4]);
    }

    #[test]
    fn clear_keeps_nothing_to_draw() {
        let mut mesh = MeshData::new();
        mesh.push_face(
            Point3::new(1.0, 2.0, 3.0),
            Face::NegY,
            Material::Sand.color(),
        );
        mesh.clear();
        assert!(mesh.is_empty());
        assert_eq!(mesh.vertex_count(), 0);
    }
}
