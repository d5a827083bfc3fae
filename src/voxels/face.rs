//! # Voxel Faces
//!
//! The six cardinal faces of a voxel and the 6-bit visibility mask the
//! mesher fills per voxel. Face order follows the axis convention
//! `[+X, -X, +Y, -Y, +Z, -Z]`; the corner tables keep a consistent
//! counter-clockwise winding when viewed from outside the voxel.

use cgmath::Vector3;

/// One of the six cardinal faces of a voxel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Face {
    /// Face pointing toward positive X.
    PosX = 0,
    /// Face pointing toward negative X.
    NegX = 1,
    /// The top face (positive Y).
    PosY = 2,
    /// The bottom face (negative Y).
    NegY = 3,
    /// Face pointing toward positive Z.
    PosZ = 4,
    /// Face pointing toward negative Z.
    NegZ = 5,
}

/// Unit corner positions for each face, relative to the voxel's minimum
/// corner, wound counter-clockwise as seen from outside.
const FACE_CORNERS: [[[f32; 3]; 4]; 6] = [
    // PosX
    [[1.0, 0.0, 0.0], [1.0, 1.0, 0.0], [1.0, 1.0, 1.0], [1.0, 0.0, 1.0]],
    // NegX
    [[0.0, 0.0, 1.0], [0.0, 1.0, 1.0], [0.0, 1.0, 0.0], [0.0, 0.0, 0.0]],
    // PosY
    [[0.0, 1.0, 1.0], [1.0, 1.0, 1.0], [1.0, 1.0, 0.0], [0.0, 1.0, 0.0]],
    // NegY
    [[0.0, 0.0, 0.0], [1.0, 0.0, 0.0], [1.0, 0.0, 1.0], [0.0, 0.0, 1.0]],
    // PosZ
    [[0.0, 0.0, 1.0], [1.0, 0.0, 1.0], [1.0, 1.0, 1.0], [0.0, 1.0, 1.0]],
    // NegZ
    [[0.0, 1.0, 0.0], [1.0, 1.0, 0.0], [1.0, 0.0, 0.0], [0.0, 0.0, 0.0]],
];

impl Face {
    /// All six faces in index order.
    pub const ALL: [Face; 6] = [
        Face::PosX,
        Face::NegX,
        Face::PosY,
        Face::NegY,
        Face::PosZ,
        Face::NegZ,
    ];

    /// Integer offset to the neighboring voxel across this face.
    pub fn offset(self) -> Vector3<i32> {
        match self {
            Face::PosX => Vector3::new(1, 0, 0),
            Face::NegX => Vector3::new(-1, 0, 0),
            Face::PosY => Vector3::new(0, 1, 0),
            Face::NegY => Vector3::new(0, -1, 0),
            Face::PosZ => Vector3::new(0, 0, 1),
            Face::NegZ => Vector3::new(0, 0, -1),
        }
    }

    /// Flat outward normal of this face.
    pub fn normal(self) -> [f32; 3] {
        match self {
            Face::PosX => [1.0, 0.0, 0.0],
            Face::NegX => [-1.0, 0.0, 0.0],
            Face::PosY => [0.0, 1.0, 0.0],
            Face::NegY => [0.0, -1.0, 0.0],
            Face::PosZ => [0.0, 0.0, 1.0],
            Face::NegZ => [0.0, 0.0, -1.0],
        }
    }

    /// The face on the opposite side of the voxel.
    ///
    /// A ray that steps along `+X` into a voxel enters through that voxel's
    /// `NegX` face, so the hit face of a raycast is the opposite of the step
    /// direction.
    pub fn opposite(self) -> Face {
        match self {
            Face::PosX => Face::NegX,
            Face::NegX => Face::PosX,
            Face::PosY => Face::NegY,
            Face::NegY => Face::PosY,
            Face::PosZ => Face::NegZ,
            Face::NegZ => Face::PosZ,
        }
    }

    /// Corner positions of this face relative to the voxel's minimum corner.
    pub fn corners(self) -> [[f32; 3]; 4] {
        FACE_CORNERS[self as usize]
    }
}

/// Per-voxel visibility mask, one bit per [`Face`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct FaceMask(u8);

impl FaceMask {
    /// Mask with no visible faces.
    pub const NONE: FaceMask = FaceMask(0);
    /// Mask with all six faces visible.
    pub const ALL: FaceMask = FaceMask(0b0011_1111);

    /// Marks a face visible.
    pub fn set(&mut self, face: Face) {
        self.0 |= 1 << face as u8;
    }

    /// Whether a face is marked visible.
    pub fn contains(self, face: Face) -> bool {
        self.0 & (1 << face as u8) != 0
    }

    /// Number of visible faces.
    pub fn count(self) -> u32 {
        self.0.count_ones()
    }

    /// Whether no face is visible (fully occluded voxel).
    pub fn is_empty(self) -> bool {
        self.0 == 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn offsets_are_unit_steps_matching_normals() {
        for face in Face::ALL {
            let offset = face.offset();
            let normal = face.normal();
            assert_eq!(offset.x as f32, normal[0]);
            assert_eq!(offset.y as f32, normal[1]);
            assert_eq!(offset.z as f32, normal[2]);
            assert_eq!(offset.x.abs() + offset.y.abs() + offset.z.abs(), 1);
        }
    }

    #[test]
    fn opposite_is_an_involution() {
        for face in Face::ALL {
            assert_ne!(face, face.opposite());
            assert_eq!(face, face.opposite().opposite());
        }
    }

    #[test]
    fn corners_lie_on_the_face_plane() {
        for face in Face::ALL {
            let offset = face.offset();
            for corner in face.corners() {
                // Along the face axis every corner sits on the outer plane:
                // 1.0 for positive faces, 0.0 for negative ones.
                let (axis, sign) = match face {
                    Face::PosX | Face::NegX => (corner[0], offset.x),
                    Face::PosY | Face::NegY => (corner[1], offset.y),
                    Face::PosZ | Face::NegZ => (corner[2], offset.z),
                };
                assert_eq!(axis, if sign > 0 { 1.0 } else { 0.0 });
            }
        }
    }

    #[test]
    fn mask_tracks_individual_faces() {
        let mut mask = FaceMask::NONE;
        assert!(mask.is_empty());

        mask.set(Face::PosY);
        mask.set(Face::NegZ);
        assert!(mask.contains(Face::PosY));
        assert!(mask.contains(Face::NegZ));
        assert!(!mask.contains(Face::PosX));
        assert_eq!(mask.count(), 2);

        for face in Face::ALL {
            mask.set(face);
        }
        assert_eq!(mask, FaceMask::ALL);
        assert_eq!(mask.count(), 6);
    }
}
