//! Minimal camera state for the streaming and picking queries.
//!
//! The scene only needs to know where the player's eye is and which way it
//! looks: streaming loads chunks around the eye, and the voxel pick casts a
//! ray along the view direction. Projection, input handling, and view
//! matrices stay with the embedding renderer.

use cgmath::{InnerSpace, Point3, Vector3};

/// Player viewpoint driving chunk streaming and voxel picking.
#[derive(Debug, Clone, Copy)]
pub struct Camera {
    /// Eye position in world space.
    pub eye: Point3<f32>,
    /// View direction; normalized on construction.
    pub forward: Vector3<f32>,
}

impl Camera {
    /// Creates a camera at `eye` looking along `forward`.
    pub fn new(eye: Point3<f32>, forward: Vector3<f32>) -> Self {
        Camera {
            eye,
            forward: forward.normalize(),
        }
    }

    /// Creates a camera at `eye` looking at `target`.
    pub fn looking_at(eye: Point3<f32>, target: Point3<f32>) -> Self {
        Camera::new(eye, target - eye)
    }
}
