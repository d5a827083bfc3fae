//! # Terrain Generation
//!
//! Layered coherent-noise terrain. Seven independent fractal Perlin fields,
//! all derived from one world seed, drive the pipeline per column:
//!
//! 1. a large-scale continent field plus temperature/humidity fields pick
//!    the [`Biome`],
//! 2. the elevation field, blended across the column's four neighbors,
//!    yields the terrain height (same-biome neighbors weigh more, smoothing
//!    seams at biome borders),
//! 3. a 3D cave field carves solids, a 3D ore field seeds ore veins, and
//!    depth from the surface picks grass/dirt/stone otherwise,
//! 4. a high-frequency 2D tree field decides which columns sprout a tree,
//!    with trunk height and canopy palette from the biome.
//!
//! Every function here is pure in (coordinate, seed): no per-chunk state, no
//! shared randomness. Two generators built from the same seed produce
//! identical worlds, which the tests pin down.

pub mod biome;

use cgmath::Point3;
use log::debug;
use noise::{Fbm, MultiFractal, NoiseFn, Perlin};

use crate::scene::chunk_map::ChunkMap;
use crate::voxels::chunk::{Chunk, VoxelGrid, CHUNK_SIZE, CHUNK_VOLUME};
use crate::voxels::material::Material;

pub use self::biome::{Biome, TreeParams};

/// Water fills terrain below this world height.
pub const SEA_LEVEL: i32 = 60;

/// 3D cave noise above this threshold carves solid voxels out.
const CAVE_THRESHOLD: f64 = 0.55;
/// Neighbor sampling distance for the biome-border height blend, in voxels.
const BLEND_STEP: i32 = 4;

/// All noise layers of one world, built once per seed and shared (behind an
/// `Arc`) with every generation task.
pub struct TerrainGenerator {
    seed: u32,
    continent: Fbm<Perlin>,
    temperature: Fbm<Perlin>,
    humidity: Fbm<Perlin>,
    elevation: Fbm<Perlin>,
    cave: Fbm<Perlin>,
    ore: Fbm<Perlin>,
    tree: Fbm<Perlin>,
}

impl TerrainGenerator {
    /// Builds the noise stack for a world seed.
    pub fn new(seed: u32) -> Self {
        debug!("building terrain generator for seed {seed}");
        TerrainGenerator {
            seed,
            continent: Fbm::<Perlin>::new(seed)
                .set_octaves(4)
                .set_frequency(0.0015),
            temperature: Fbm::<Perlin>::new(seed.wrapping_add(1))
                .set_octaves(3)
                .set_frequency(0.0009),
            humidity: Fbm::<Perlin>::new(seed.wrapping_add(2))
                .set_octaves(3)
                .set_frequency(0.0011),
            elevation: Fbm::<Perlin>::new(seed.wrapping_add(3))
                .set_octaves(5)
                .set_frequency(0.008),
            cave: Fbm::<Perlin>::new(seed.wrapping_add(4))
                .set_octaves(3)
                .set_frequency(0.05),
            ore: Fbm::<Perlin>::new(seed.wrapping_add(5))
                .set_octaves(2)
                .set_frequency(0.11),
            tree: Fbm::<Perlin>::new(seed.wrapping_add(6))
                .set_octaves(2)
                .set_frequency(0.9),
        }
    }

    /// The world seed this generator was built from.
    pub fn seed(&self) -> u32 {
        self.seed
    }

    /// Biome of the column at a world (x, z).
    pub fn biome_at(&self, world_x: i32, world_z: i32) -> Biome {
        let p = [world_x as f64, world_z as f64];
        Biome::classify(
            self.continent.get(p),
            self.temperature.get(p),
            self.humidity.get(p),
        )
    }

    /// Terrain height of the column at a world (x, z).
    ///
    /// Blends the biome elevation function over the column and its four
    /// neighbors `BLEND_STEP` voxels away; neighbors sharing the column's
    /// biome weigh twice as much as foreign ones, so borders between biomes
    /// with very different profiles ramp instead of stepping.
    pub fn terrain_height(&self, world_x: i32, world_z: i32) -> i32 {
        let center_biome = self.biome_at(world_x, world_z);
        let offsets = [
            (0, 0),
            (BLEND_STEP, 0),
            (-BLEND_STEP, 0),
            (0, BLEND_STEP),
            (0, -BLEND_STEP),
        ];

        let mut weighted = 0.0;
        let mut total_weight = 0.0;
        for (index, (dx, dz)) in offsets.into_iter().enumerate() {
            let x = world_x + dx;
            let z = world_z + dz;
            let biome = if index == 0 {
                center_biome
            } else {
                self.biome_at(x, z)
            };
            let sample = self.elevation.get([x as f64, z as f64]);
            let weight = if index == 0 {
                2.0
            } else if biome == center_biome {
                1.0
            } else {
                0.5
            };
            weighted += biome.elevation(sample) as f64 * weight;
            total_weight += weight;
        }

        (weighted / total_weight).round() as i32
    }

    /// Material of the voxel at a world coordinate, given its column's
    /// terrain height and biome.
    fn material_at(&self, world: Point3<i32>, height: i32, biome: Biome) -> Material {
        if world.y < 0 {
            return Material::Air;
        }
        if world.y == 0 {
            return Material::Bedrock;
        }

        if world.y > height {
            // Open space above the surface: water up to sea level, ice caps
            // on cold water, air above.
            return if world.y > SEA_LEVEL {
                Material::Air
            } else if world.y == SEA_LEVEL {
                biome.water_surface()
            } else {
                Material::Water
            };
        }

        let p = [world.x as f64, world.y as f64, world.z as f64];
        if self.cave.get(p) > CAVE_THRESHOLD {
            return Material::Air;
        }

        let depth = height - world.y;
        if depth >= 4 {
            let ore = self.ore.get(p);
            if ore > 0.88 && world.y < 16 {
                return Material::DiamondOre;
            }
            if ore > 0.84 && world.y < 32 {
                return Material::GoldOre;
            }
            if ore > 0.78 && world.y < 56 {
                return Material::IronOre;
            }
            if ore > 0.72 {
                return Material::CoalOre;
            }
        }

        match depth {
            0 => biome.surface_material(height, SEA_LEVEL),
            1..=3 => biome.subsurface_material(),
            _ => Material::Stone,
        }
    }

    /// Generates the voxel contents of a chunk and plants its trees.
    ///
    /// Runs on a worker thread. The dense grid is built column by column and
    /// swapped in with one write; trees are then written voxel by voxel
    /// through the chunk map, because a canopy near a chunk edge spills into
    /// neighboring chunks. Spill into a chunk that is not resident is
    /// dropped, the same as any write into unloaded space.
    ///
    /// The chunk must already be resident in `map` so its own tree voxels
    /// land back in it.
    pub fn fill_chunk(&self, chunk: &Chunk, map: &ChunkMap) {
        let position = chunk.position();
        let mut grid: Box<VoxelGrid> = Box::new([Material::Air; CHUNK_VOLUME]);
        // Surface columns that may sprout a tree: (world x, world z, height).
        let mut tree_candidates = Vec::new();

        for local_z in 0..CHUNK_SIZE {
            for local_x in 0..CHUNK_SIZE {
                let world_x = position.x * CHUNK_SIZE + local_x;
                let world_z = position.z * CHUNK_SIZE + local_z;
                let biome = self.biome_at(world_x, world_z);
                let height = self.terrain_height(world_x, world_z);

                for local_y in 0..CHUNK_SIZE {
                    let world_y = position.y * CHUNK_SIZE + local_y;
                    let index = (local_x + CHUNK_SIZE * (local_y + CHUNK_SIZE * local_z)) as usize;
                    grid[index] =
                        self.material_at(Point3::new(world_x, world_y, world_z), height, biome);
                }

                // Only the chunk holding a column's surface plants its tree,
                // so a tall tree is never planted twice by stacked chunks.
                let chunk_floor = position.y * CHUNK_SIZE;
                if height > SEA_LEVEL && (chunk_floor..chunk_floor + CHUNK_SIZE).contains(&height) {
                    tree_candidates.push((world_x, world_z, height));
                }
            }
        }

        chunk.store_voxels(grid);

        for (world_x, world_z, height) in tree_candidates {
            self.try_plant_tree(map, world_x, world_z, height);
        }
    }

    /// Plants a tree on the column if the tree noise layer selects it.
    fn try_plant_tree(&self, map: &ChunkMap, world_x: i32, world_z: i32, height: i32) {
        let biome = self.biome_at(world_x, world_z);
        let Some(params) = biome.tree_params() else {
            return;
        };

        // Map the sample into [0, 1]; the top `density` slice grows a tree.
        let sample = (self.tree.get([world_x as f64, world_z as f64]) + 1.0) / 2.0;
        let cutoff = 1.0 - params.density;
        if sample <= cutoff {
            return;
        }

        // Caves can open right under a candidate column; no tree on a hole.
        if !map.voxel_at(Point3::new(world_x, height, world_z)).is_solid() {
            return;
        }

        let span = (params.max_trunk - params.min_trunk + 1) as f64;
        let trunk = params.min_trunk
            + (((sample - cutoff) / params.density) * span).floor() as i32;
        let trunk = trunk.clamp(params.min_trunk, params.max_trunk);
        let top = height + trunk;

        // Canopy first so the trunk overwrites its own cells.
        for layer_y in (top - 1)..=top {
            for dx in -1..=1 {
                for dz in -1..=1 {
                    map.set_voxel_at(
                        Point3::new(world_x + dx, layer_y, world_z + dz),
                        params.leaves,
                    );
                }
            }
        }
        map.set_voxel_at(Point3::new(world_x, top + 1, world_z), params.leaves);

        for trunk_y in (height + 1)..=top {
            map.set_voxel_at(Point3::new(world_x, trunk_y, world_z), Material::Wood);
        }
    }
}
