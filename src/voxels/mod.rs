//! # Voxels Module
//!
//! Voxel-level building blocks of the world: the material palette, the six
//! cube faces with their corner tables, and the chunk that stores a 16³
//! grid of materials and drives its own mesh state machine.

pub mod chunk;
pub mod face;
pub mod material;

pub use chunk::{Chunk, MeshState, CHUNK_SIZE, CHUNK_VOLUME};
pub use face::{Face, FaceMask};
pub use material::Material;
