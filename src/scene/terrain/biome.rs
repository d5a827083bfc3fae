//! # Biomes
//!
//! Per-column terrain classification and everything that hangs off it: the
//! elevation curve a column's height is drawn from, the surface material
//! palette, and the tree shape for forested biomes.
//!
//! Classification happens in two stages. A large-scale continent sample
//! splits ocean, mountains, and lowland; lowland columns are then bucketed by
//! independent temperature and humidity fields. Every function here is a pure
//! mapping from noise samples, so the same seed always produces the same
//! world.

use crate::voxels::material::Material;

/// Terrain classification of one world column.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Biome {
    /// Gentle grassland with sparse trees.
    Plains,
    /// Hot sand flats, treeless.
    Desert,
    /// High stone peaks, snow-capped at altitude.
    Mountains,
    /// Temperate woodland.
    Forest,
    /// Low wet ground near sea level.
    Swamp,
    /// Hot, humid, densely treed.
    Jungle,
    /// Hot dry grassland with scattered trees.
    Savanna,
    /// Cold conifer forest with frozen water.
    Taiga,
    /// Snow-covered high peaks.
    SnowyMountains,
    /// Deep water over a gravel floor.
    Ocean,
    /// Frozen flatland, treeless.
    Tundra,
    /// Temperate woodland with the birch palette.
    BirchForest,
    /// Waterlogged coastal forest.
    Mangrove,
    /// Red-sand badlands.
    Mesa,
}

/// Shape of the trees a biome grows, when it grows any.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TreeParams {
    /// Fraction of columns that sprout a tree; compared against the tree
    /// noise layer, so higher means denser forest.
    pub density: f64,
    /// Shortest trunk, in voxels above the surface.
    pub min_trunk: i32,
    /// Tallest trunk.
    pub max_trunk: i32,
    /// Canopy material.
    pub leaves: Material,
}

impl Biome {
    /// Buckets the three classification samples (each roughly in `[-1, 1]`)
    /// into a biome.
    pub fn classify(continent: f64, temperature: f64, humidity: f64) -> Biome {
        if continent < -0.35 {
            return Biome::Ocean;
        }
        if continent > 0.55 {
            return if temperature < -0.25 {
                Biome::SnowyMountains
            } else {
                Biome::Mountains
            };
        }

        // Lowland: temperature rows, humidity columns.
        if temperature < -0.4 {
            if humidity < 0.0 {
                Biome::Tundra
            } else {
                Biome::Taiga
            }
        } else if temperature < 0.2 {
            if humidity < -0.3 {
                Biome::Plains
            } else if humidity < 0.25 {
                Biome::Forest
            } else {
                Biome::BirchForest
            }
        } else if temperature < 0.5 {
            if humidity < -0.25 {
                Biome::Savanna
            } else if humidity < 0.3 {
                Biome::Plains
            } else {
                Biome::Swamp
            }
        } else if humidity < -0.2 {
            Biome::Desert
        } else if humidity < 0.15 {
            Biome::Mesa
        } else if humidity < 0.5 {
            Biome::Jungle
        } else {
            Biome::Mangrove
        }
    }

    /// Base surface level and elevation amplitude for this biome, in voxels.
    pub fn elevation_profile(self) -> (i32, i32) {
        match self {
            Biome::Ocean => (46, 8),
            Biome::Plains => (64, 5),
            Biome::Desert => (64, 7),
            Biome::Mountains => (82, 38),
            Biome::SnowyMountains => (86, 38),
            Biome::Forest => (66, 9),
            Biome::Swamp => (60, 3),
            Biome::Jungle => (66, 10),
            Biome::Savanna => (66, 7),
            Biome::Taiga => (68, 11),
            Biome::Tundra => (64, 5),
            Biome::BirchForest => (66, 8),
            Biome::Mangrove => (60, 3),
            Biome::Mesa => (72, 16),
        }
    }

    /// Column height for an elevation sample in `[-1, 1]`.
    pub fn elevation(self, sample: f64) -> i32 {
        let (base, amplitude) = self.elevation_profile();
        base + (sample.clamp(-1.0, 1.0) * amplitude as f64).round() as i32
    }

    /// Topmost solid material of a column at `height`.
    pub fn surface_material(self, height: i32, sea_level: i32) -> Material {
        if height <= sea_level {
            // Submerged or shoreline columns share one floor palette.
            return match self {
                Biome::Ocean => Material::Gravel,
                Biome::Swamp | Biome::Mangrove => Material::Dirt,
                _ => Material::Sand,
            };
        }
        match self {
            Biome::Desert => Material::Sand,
            Biome::Mesa => Material::RedSand,
            Biome::Tundra | Biome::SnowyMountains => Material::Snow,
            Biome::Mountains => {
                if height > 96 {
                    Material::Snow
                } else {
                    Material::Stone
                }
            }
            Biome::Ocean => Material::Gravel,
            Biome::Plains => Material::GrassPlains,
            Biome::Forest | Biome::Swamp | Biome::Mangrove => Material::GrassForest,
            Biome::Jungle => Material::GrassJungle,
            Biome::Savanna => Material::GrassSavanna,
            Biome::Taiga => Material::GrassTaiga,
            Biome::BirchForest => Material::GrassBirch,
        }
    }

    /// Material of the few voxels directly under the surface.
    pub fn subsurface_material(self) -> Material {
        match self {
            Biome::Desert => Material::Sand,
            Biome::Mesa => Material::RedSand,
            Biome::Ocean => Material::Gravel,
            Biome::Mountains | Biome::SnowyMountains => Material::Stone,
            _ => Material::Dirt,
        }
    }

    /// What covers open water at the surface in this biome.
    pub fn water_surface(self) -> Material {
        match self {
            Biome::Tundra | Biome::SnowyMountains | Biome::Taiga => Material::Ice,
            _ => Material::Water,
        }
    }

    /// Tree shape for this biome, or `None` for treeless terrain.
    pub fn tree_params(self) -> Option<TreeParams> {
        match self {
            Biome::Forest => Some(TreeParams {
                density: 0.08,
                min_trunk: 4,
                max_trunk: 7,
                leaves: Material::Leaves,
            }),
            Biome::BirchForest => Some(TreeParams {
                density: 0.07,
                min_trunk: 5,
                max_trunk: 7,
                leaves: Material::LeavesBirch,
            }),
            Biome::Jungle => Some(TreeParams {
                density: 0.12,
                min_trunk: 6,
                max_trunk: 11,
                leaves: Material::Leaves,
            }),
            Biome::Taiga => Some(TreeParams {
                density: 0.06,
                min_trunk: 5,
                max_trunk: 9,
                leaves: Material::Leaves,
            }),
            Biome::Savanna => Some(TreeParams {
                density: 0.015,
                min_trunk: 4,
                max_trunk: 6,
                leaves: Material::Leaves,
            }),
            Biome::Swamp | Biome::Mangrove => Some(TreeParams {
                density: 0.04,
                min_trunk: 3,
                max_trunk: 5,
                leaves: Material::Leaves,
            }),
            Biome::Plains => Some(TreeParams {
                density: 0.005,
                min_trunk: 4,
                max_trunk: 6,
                leaves: Material::Leaves,
            }),
            Biome::Desert
            | Biome::Mesa
            | Biome::Mountains
            | Biome::SnowyMountains
            | Biome::Ocean
            | Biome::Tundra => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn continent_extremes_override_climate() {
        assert_eq!(Biome::classify(-0.8, 0.9, 0.9), Biome::Ocean);
        assert_eq!(Biome::classify(0.9, 0.0, 0.0), Biome::Mountains);
        assert_eq!(Biome::classify(0.9, -0.8, 0.0), Biome::SnowyMountains);
    }

    #[test]
    fn climate_grid_covers_hot_and_cold() {
        assert_eq!(Biome::classify(0.0, -0.9, -0.5), Biome::Tundra);
        assert_eq!(Biome::classify(0.0, -0.9, 0.5), Biome::Taiga);
        assert_eq!(Biome::classify(0.0, 0.0, 0.0), Biome::Forest);
        assert_eq!(Biome::classify(0.0, 0.9, -0.9), Biome::Desert);
        assert_eq!(Biome::classify(0.0, 0.9, 0.3), Biome::Jungle);
        assert_eq!(Biome::classify(0.0, 0.9, 0.9), Biome::Mangrove);
    }

    #[test]
    fn elevation_stays_within_the_profile() {
        for biome in [Biome::Ocean, Biome::Plains, Biome::Mountains, Biome::Mesa] {
            let (base, amplitude) = biome.elevation_profile();
            assert_eq!(biome.elevation(0.0), base);
            assert_eq!(biome.elevation(1.0), base + amplitude);
            assert_eq!(biome.elevation(-1.0), base - amplitude);
            // Samples outside the nominal noise range clamp.
            assert_eq!(biome.elevation(3.0), base + amplitude);
        }
    }

    #[test]
    fn submerged_columns_never_grow_grass() {
        for biome in [
            Biome::Plains,
            Biome::Forest,
            Biome::Jungle,
            Biome::Ocean,
            Biome::Swamp,
        ] {
            let material = biome.surface_material(50, 60);
            assert!(
                matches!(
                    material,
                    Material::Sand | Material::Gravel | Material::Dirt
                ),
                "{biome:?} underwater surface was {material:?}"
            );
        }
    }
}
