//! # Rendering Boundary
//!
//! The slice of the GPU surface this crate owns: a render-thread-bound
//! wrapper around the wgpu device/queue pair and the vertex/index buffer
//! upload for finished chunk meshes. Window creation, surface configuration,
//! shader compilation, and draw submission stay with the embedding
//! application.
//!
//! ## Thread Confinement
//!
//! GPU resource calls are only valid from the thread that owns the graphics
//! context. [`RenderContext`] enforces that by construction rather than by
//! lock: it is deliberately `!Send`, so the upload branch of the chunk state
//! machine cannot be moved onto a worker thread without a compile error.
//! This replaces the global static buffer handles of classic GL-style voxel
//! renderers with an explicit, injected resource.

pub mod vertex;

use std::marker::PhantomData;

use wgpu::util::DeviceExt;

pub use vertex::Vertex;

use crate::voxels::chunk::mesh::MeshData;

/// Owner of the GPU device and queue, pinned to the thread it was created on.
///
/// Construct it on the render thread from the device/queue pair the
/// application acquired while setting up its window surface, and pass it to
/// [`Scene::update_chunks`](crate::scene::Scene::update_chunks) every frame.
pub struct RenderContext {
    device: wgpu::Device,
    queue: wgpu::Queue,
    /// Raw pointer marker keeps the context `!Send`/`!Sync`, confining all
    /// GPU calls to the constructing thread.
    _thread_bound: PhantomData<*const ()>,
}

impl RenderContext {
    /// Wraps an already-created device and queue.
    pub fn new(device: wgpu::Device, queue: wgpu::Queue) -> Self {
        RenderContext {
            device,
            queue,
            _thread_bound: PhantomData,
        }
    }

    /// The wrapped GPU device.
    pub fn device(&self) -> &wgpu::Device {
        &self.device
    }

    /// The wrapped GPU queue.
    pub fn queue(&self) -> &wgpu::Queue {
        &self.queue
    }
}

/// GPU-resident mesh buffers for one chunk.
///
/// Valid to draw only while the owning chunk reports
/// [`MeshState::Uploaded`](crate::voxels::chunk::MeshState::Uploaded).
#[derive(Debug)]
pub struct GpuMesh {
    /// Vertex buffer holding [`Vertex`] data.
    pub vertex_buffer: wgpu::Buffer,
    /// Index buffer of `u32` indices.
    pub index_buffer: wgpu::Buffer,
    /// Number of indices to draw.
    pub index_count: u32,
}

impl GpuMesh {
    /// Copies a CPU-side mesh into GPU storage.
    ///
    /// Returns `None` for an empty mesh (a fully occluded or all-air chunk
    /// has nothing to draw).
    pub fn upload(ctx: &RenderContext, mesh: &MeshData, label: &str) -> Option<Self> {
        if mesh.is_empty() {
            return None;
        }

        let vertex_buffer = ctx
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} vertices")),
                contents: bytemuck::cast_slice(&mesh.vertices),
                usage: wgpu::BufferUsages::VERTEX,
            });
        let index_buffer = ctx
            .device()
            .create_buffer_init(&wgpu::util::BufferInitDescriptor {
                label: Some(&format!("{label} indices")),
                contents: bytemuck::cast_slice(&mesh.indices),
                usage: wgpu::BufferUsages::INDEX,
            });

        Some(GpuMesh {
            vertex_buffer,
            index_buffer,
            index_count: mesh.indices.len() as u32,
        })
    }
}
