//! Vertex format for chunk meshes.
//!
//! One flat-shaded, vertex-colored format is shared by every chunk mesh. The
//! layout matches what a voxel pipeline's vertex shader expects and is
//! `bytemuck`-castable straight into a GPU buffer.

/// A single mesh vertex: world-space position, flat face normal, and the
/// material-derived RGBA color.
///
/// # Memory Layout
/// - Position: `[f32; 3]` (12 bytes)
/// - Normal: `[f32; 3]` (12 bytes)
/// - Color: `[f32; 4]` (16 bytes)
///
/// Total size: 40 bytes
#[repr(C)]
#[derive(Copy, Clone, Debug, PartialEq, bytemuck::Pod, bytemuck::Zeroable)]
pub struct Vertex {
    /// World-space position of the vertex.
    pub position: [f32; 3],
    /// Flat normal of the face this vertex belongs to.
    pub normal: [f32; 3],
    /// RGBA color derived from the voxel material.
    pub color: [f32; 4],
}

impl Vertex {
    /// Creates a new vertex.
    pub fn new(position: [f32; 3], normal: [f32; 3], color: [f32; 4]) -> Self {
        Vertex {
            position,
            normal,
            color,
        }
    }

    /// Returns the vertex buffer layout description for the render pipeline.
    ///
    /// # Shader Attributes
    /// - `location = 0`: position (`vec3<f32>`)
    /// - `location = 1`: normal (`vec3<f32>`)
    /// - `location = 2`: color (`vec4<f32>`)
    pub fn desc<'a>() -> wgpu::VertexBufferLayout<'a> {
        wgpu::VertexBufferLayout {
            array_stride: std::mem::size_of::<Vertex>() as wgpu::BufferAddress,
            step_mode: wgpu::VertexStepMode::Vertex,
            attributes: &[
                wgpu::VertexAttribute {
                    offset: 0,
                    shader_location: 0,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 3]>() as wgpu::BufferAddress,
                    shader_location: 1,
                    format: wgpu::VertexFormat::Float32x3,
                },
                wgpu::VertexAttribute {
                    offset: std::mem::size_of::<[f32; 6]>() as wgpu::BufferAddress,
                    shader_location: 2,
                    format: wgpu::VertexFormat::Float32x4,
                },
            ],
        }
    }
}
