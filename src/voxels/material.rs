//! # Voxel Materials
//!
//! The material palette of the world. A voxel's identity is positional — a
//! grid cell holds a `Material`, and a cell counts as "having a voxel" if and
//! only if that material is not air. Everything the mesher needs from a
//! material (does it cull neighboring faces, what color does it render as)
//! lives here.

/// Every material a voxel grid cell can hold.
///
/// The palette follows the classic block-game split: fluids and surface
/// covers above ground, biome-specific grass variants on the surface,
/// dirt/stone/ores below, and wood/leaves for trees.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[repr(u8)]
pub enum Material {
    /// Empty cell; the absence of a voxel.
    Air,
    /// Indestructible world floor at y = 0.
    Bedrock,
    /// Fluid filling terrain below sea level.
    Water,
    /// Desert and beach surface.
    Sand,
    /// Mesa-colored sand variant.
    RedSand,
    /// Plains surface grass.
    GrassPlains,
    /// Forest surface grass.
    GrassForest,
    /// Jungle surface grass.
    GrassJungle,
    /// Savanna surface grass.
    GrassSavanna,
    /// Taiga surface grass.
    GrassTaiga,
    /// Birch forest surface grass.
    GrassBirch,
    /// Subsoil under grassy surfaces.
    Dirt,
    /// Bulk underground rock.
    Stone,
    /// Snow cover in cold biomes.
    Snow,
    /// Frozen water surface.
    Ice,
    /// Ocean floor material.
    Gravel,
    /// Tree trunk.
    Wood,
    /// Tree canopy.
    Leaves,
    /// Birch canopy variant.
    LeavesBirch,
    /// Common ore.
    CoalOre,
    /// Mid-depth ore.
    IronOre,
    /// Rare deep ore.
    GoldOre,
    /// Rarest, deepest ore.
    DiamondOre,
}

impl Material {
    /// Whether this cell holds a voxel at all.
    pub fn is_solid(self) -> bool {
        self != Material::Air
    }

    /// Whether a neighboring face pressed against this material is hidden.
    ///
    /// Only air (or an absent chunk) leaves a face visible; every stored
    /// material occludes, matching the face-culling rule of the mesher.
    pub fn occludes(self) -> bool {
        self != Material::Air
    }

    /// Flat RGBA color used for this material's mesh faces.
    pub fn color(self) -> [f32; 4] {
        match self {
            Material::Air => [0.0, 0.0, 0.0, 0.0],
            Material::Bedrock => [0.15, 0.15, 0.15, 1.0],
            Material::Water => [0.16, 0.32, 0.75, 0.8],
            Material::Sand => [0.86, 0.81, 0.58, 1.0],
            Material::RedSand => [0.76, 0.45, 0.25, 1.0],
            Material::GrassPlains => [0.35, 0.68, 0.25, 1.0],
            Material::GrassForest => [0.25, 0.55, 0.20, 1.0],
            Material::GrassJungle => [0.18, 0.60, 0.16, 1.0],
            Material::GrassSavanna => [0.58, 0.62, 0.25, 1.0],
            Material::GrassTaiga => [0.33, 0.48, 0.30, 1.0],
            Material::GrassBirch => [0.42, 0.65, 0.30, 1.0],
            Material::Dirt => [0.45, 0.32, 0.20, 1.0],
            Material::Stone => [0.50, 0.50, 0.52, 1.0],
            Material::Snow => [0.95, 0.96, 0.98, 1.0],
            Material::Ice => [0.65, 0.80, 0.95, 0.9],
            Material::Gravel => [0.55, 0.52, 0.50, 1.0],
            Material::Wood => [0.42, 0.30, 0.16, 1.0],
            Material::Leaves => [0.20, 0.45, 0.15, 1.0],
            Material::LeavesBirch => [0.45, 0.62, 0.28, 1.0],
            Material::CoalOre => [0.28, 0.28, 0.28, 1.0],
            Material::IronOre => [0.72, 0.60, 0.50, 1.0],
            Material::GoldOre => [0.85, 0.72, 0.25, 1.0],
            Material::DiamondOre => [0.45, 0.85, 0.85, 1.0],
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn air_is_the_only_non_solid_material() {
        assert!(!Material::Air.is_solid());
        assert!(!Material::Air.occludes());
        for material in [
            Material::Bedrock,
            Material::Water,
            Material::GrassPlains,
            Material::Stone,
            Material::DiamondOre,
        ] {
            assert!(material.is_solid(), "{material:?} should be solid");
            assert!(material.occludes(), "{material:?} should occlude");
        }
    }
}
