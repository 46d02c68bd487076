//! Chunk storage, lifecycle state, and the coordinate-keyed chunk map.
#![forbid(unsafe_code)]

pub mod locator;
pub mod persist;

use std::path::Path;
use std::sync::atomic::{AtomicU8, Ordering};

use hashbrown::HashMap;
use lode_blocks::{Block, BlockRegistry, BlockTypeId};
use lode_geom::{Aabb, Vec3};
use lode_structures::{TemplateRegistry, TemplateStamp};
use lode_terrain::generation::{GenBlockIds, Neighborhood, NEIGHBORHOOD_PAD, TREE_SEPARATION};
use lode_terrain::{
    ChunkCoord, TerrainGen, CHUNK_BITS_X, CHUNK_BITS_Y, CHUNK_MASK_X, CHUNK_MASK_Y, CHUNK_SIZE_X,
    CHUNK_SIZE_Y, CHUNK_SIZE_Z, CHUNK_VOLUME, SEA_LEVEL,
};

pub use locator::{BlockLocator, Direction};
pub use persist::LoadError;

/// Flat index layout: x in the low bits, then y, then z.
#[inline]
pub fn block_index(x: usize, y: usize, z: usize) -> usize {
    x | (y << CHUNK_BITS_X) | (z << (CHUNK_BITS_X + CHUNK_BITS_Y))
}

#[inline]
pub fn block_coords(index: usize) -> (usize, usize, usize) {
    (
        index & CHUNK_MASK_X,
        (index >> CHUNK_BITS_X) & CHUNK_MASK_Y,
        index >> (CHUNK_BITS_X + CHUNK_BITS_Y),
    )
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
#[repr(u8)]
pub enum ChunkState {
    Missing = 0,
    Constructing,
    ActivatingQueuedLoad,
    ActivatingLoading,
    ActivatingLoadComplete,
    ActivatingQueuedGenerate,
    ActivatingGenerating,
    ActivatingGenerateComplete,
    Active,
    DeactivatingQueuedSave,
    DeactivatingSaving,
    DeactivatingSaveComplete,
}

/// Lifecycle state readable from the owner thread while a generation worker
/// transitions it.
#[derive(Debug)]
pub struct ChunkStateCell(AtomicU8);

impl ChunkStateCell {
    pub fn new(state: ChunkState) -> Self {
        Self(AtomicU8::new(state as u8))
    }

    pub fn load(&self) -> ChunkState {
        match self.0.load(Ordering::Acquire) {
            0 => ChunkState::Missing,
            1 => ChunkState::Constructing,
            2 => ChunkState::ActivatingQueuedLoad,
            3 => ChunkState::ActivatingLoading,
            4 => ChunkState::ActivatingLoadComplete,
            5 => ChunkState::ActivatingQueuedGenerate,
            6 => ChunkState::ActivatingGenerating,
            7 => ChunkState::ActivatingGenerateComplete,
            8 => ChunkState::Active,
            9 => ChunkState::DeactivatingQueuedSave,
            10 => ChunkState::DeactivatingSaving,
            _ => ChunkState::DeactivatingSaveComplete,
        }
    }

    pub fn store(&self, state: ChunkState) {
        self.0.store(state as u8, Ordering::Release);
    }
}

/// Lateral neighbor links, stored as coordinate keys into the chunk map so a
/// destroyed neighbor can never dangle.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct NeighborLinks {
    pub east: Option<ChunkCoord>,
    pub west: Option<ChunkCoord>,
    pub north: Option<ChunkCoord>,
    pub south: Option<ChunkCoord>,
}

impl NeighborLinks {
    pub fn get(&self, dir: Direction) -> Option<ChunkCoord> {
        match dir {
            Direction::East => self.east,
            Direction::West => self.west,
            Direction::North => self.north,
            Direction::South => self.south,
            Direction::Skyward | Direction::Groundward => None,
        }
    }

    pub fn set(&mut self, dir: Direction, link: Option<ChunkCoord>) {
        match dir {
            Direction::East => self.east = link,
            Direction::West => self.west = link,
            Direction::North => self.north = link,
            Direction::South => self.south = link,
            Direction::Skyward | Direction::Groundward => {}
        }
    }
}

/// A full-height column of voxels at one 2D coordinate.
#[derive(Debug)]
pub struct Chunk {
    pub coord: ChunkCoord,
    pub origin: Vec3,
    pub bounds: Aabb,
    pub blocks: Vec<Block>,
    pub state: ChunkStateCell,
    pub needs_save: bool,
    pub mesh_dirty: bool,
    pub links: NeighborLinks,
    pub pending_stamps: Vec<TemplateStamp>,
}

impl Chunk {
    pub fn new(coord: ChunkCoord) -> Self {
        let (ox, oy) = coord.origin();
        let origin = Vec3::new(ox as f32, oy as f32, 0.0);
        let extent = Vec3::new(
            CHUNK_SIZE_X as f32,
            CHUNK_SIZE_Y as f32,
            CHUNK_SIZE_Z as f32,
        );
        Self {
            coord,
            origin,
            bounds: Aabb::new(origin, origin + extent),
            blocks: vec![Block::INVALID; CHUNK_VOLUME],
            state: ChunkStateCell::new(ChunkState::Constructing),
            needs_save: false,
            mesh_dirty: true,
            links: NeighborLinks::default(),
            pending_stamps: Vec::new(),
        }
    }

    #[inline]
    pub fn block(&self, index: usize) -> Option<&Block> {
        self.blocks.get(index)
    }

    #[inline]
    pub fn contains_local(&self, x: i32, y: i32, z: i32) -> bool {
        x >= 0
            && (x as usize) < CHUNK_SIZE_X
            && y >= 0
            && (y as usize) < CHUNK_SIZE_Y
            && z >= 0
            && (z as usize) < CHUNK_SIZE_Z
    }

    /// Chunk-local cell containing a world-space position.
    #[inline]
    pub fn local_coords(&self, pos: Vec3) -> (i32, i32, i32) {
        (
            (pos.x - self.origin.x).floor() as i32,
            (pos.y - self.origin.y).floor() as i32,
            (pos.z - self.origin.z).floor() as i32,
        )
    }

    /// Re-types one block in place, refreshing registry-derived flags.
    pub fn set_block_type(&mut self, index: usize, id: BlockTypeId, reg: &BlockRegistry) {
        let ty = reg
            .get(id)
            .unwrap_or_else(|| panic!("block type id {id} out of range"));
        self.blocks[index].set_type(id, ty);
    }

    /// Fills the block array from the terrain fields and applies queued
    /// template stamps. Runs on a generation worker.
    pub fn generate(
        &mut self,
        terrain: &TerrainGen,
        reg: &BlockRegistry,
        templates: &TemplateRegistry,
    ) {
        let (ox, oy) = self.coord.origin();
        let nb = Neighborhood::sample(terrain, ox, oy, CHUNK_SIZE_X, CHUNK_SIZE_Y);
        let ids = GenBlockIds::resolve(reg);

        for z in 0..CHUNK_SIZE_Z {
            for y in 0..CHUNK_SIZE_Y {
                for x in 0..CHUNK_SIZE_X {
                    let col = nb.col(x + NEIGHBORHOOD_PAD, y + NEIGHBORHOOD_PAD);
                    let ty = terrain.block_type_at(
                        &ids,
                        col,
                        ox + x as i32,
                        oy + y as i32,
                        z as i32,
                    );
                    self.blocks[block_index(x, y, z)] = reg.make(ty);
                }
            }
        }

        // Vegetation candidates over the padded grid, so a tree rooted just
        // outside the chunk can still spill its canopy in. Roots may lie
        // outside the chunk; stamping clips per cell.
        for ny in TREE_SEPARATION..nb.depth - TREE_SEPARATION {
            for nx in TREE_SEPARATION..nb.width - TREE_SEPARATION {
                let col = nb.col(nx, ny);
                let root_z = col.height + 1;
                if col.height <= SEA_LEVEL || root_z >= CHUNK_SIZE_Z as i32 {
                    continue;
                }
                if !nb.is_local_tree_maximum(nx, ny, TREE_SEPARATION)
                    || col.tree_noise <= col.forestness
                {
                    continue;
                }
                if let Some(template) = templates.get(terrain.tree_species(col)) {
                    self.pending_stamps.push(TemplateStamp {
                        root: (
                            nx as i32 - NEIGHBORHOOD_PAD as i32,
                            ny as i32 - NEIGHBORHOOD_PAD as i32,
                            root_z,
                        ),
                        template,
                    });
                }
            }
        }

        self.place_templates(reg);
    }

    /// Applies and clears the queued stamps; cells outside the chunk are
    /// silently dropped.
    pub fn place_templates(&mut self, reg: &BlockRegistry) {
        let stamps = std::mem::take(&mut self.pending_stamps);
        for stamp in &stamps {
            for entry in &stamp.template.entries {
                let x = stamp.root.0 + entry.dx;
                let y = stamp.root.1 + entry.dy;
                let z = stamp.root.2 + entry.dz;
                if !self.contains_local(x, y, z) {
                    continue;
                }
                let index = block_index(x as usize, y as usize, z as usize);
                self.set_block_type(index, entry.block, reg);
            }
        }
    }

    /// Attempts to fill the block array from a save file.
    pub fn load_from_file(
        &mut self,
        save_root: &Path,
        seed: u32,
        reg: &BlockRegistry,
    ) -> Result<(), LoadError> {
        self.state.store(ChunkState::ActivatingLoading);
        let path = persist::chunk_file_path(save_root, seed, self.coord);
        let bytes = std::fs::read(&path)?;
        self.blocks = persist::decode(&bytes, seed, reg)?;
        self.state.store(ChunkState::ActivatingLoadComplete);
        Ok(())
    }

    pub fn save_to_file(&self, save_root: &Path, seed: u32) -> std::io::Result<()> {
        self.state.store(ChunkState::DeactivatingSaving);
        let bytes = persist::encode(&self.blocks, seed);
        let path = persist::chunk_file_path(save_root, seed, self.coord);
        if let Some(dir) = path.parent() {
            std::fs::create_dir_all(dir)?;
        }
        std::fs::write(&path, bytes)?;
        self.state.store(ChunkState::DeactivatingSaveComplete);
        Ok(())
    }
}

/// The only owner of chunk lifetime. Neighbor links are wired and severed
/// here so they stay symmetric.
#[derive(Debug, Default)]
pub struct ChunkMap {
    chunks: HashMap<ChunkCoord, Chunk>,
}

impl ChunkMap {
    pub fn new() -> Self {
        Self::default()
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.chunks.is_empty()
    }

    #[inline]
    pub fn contains(&self, coord: ChunkCoord) -> bool {
        self.chunks.contains_key(&coord)
    }

    #[inline]
    pub fn get(&self, coord: ChunkCoord) -> Option<&Chunk> {
        self.chunks.get(&coord)
    }

    #[inline]
    pub fn get_mut(&mut self, coord: ChunkCoord) -> Option<&mut Chunk> {
        self.chunks.get_mut(&coord)
    }

    pub fn iter(&self) -> impl Iterator<Item = (&ChunkCoord, &Chunk)> {
        self.chunks.iter()
    }

    pub fn iter_mut(&mut self) -> impl Iterator<Item = (&ChunkCoord, &mut Chunk)> {
        self.chunks.iter_mut()
    }

    pub fn coords(&self) -> Vec<ChunkCoord> {
        self.chunks.keys().copied().collect()
    }

    pub fn insert(&mut self, chunk: Chunk) {
        self.chunks.insert(chunk.coord, chunk);
    }

    /// Wires the chunk's lateral links bidirectionally with any present
    /// neighbors. The chunk must already be in the map.
    pub fn wire_links(&mut self, coord: ChunkCoord) {
        for (dir, ncoord) in [
            (Direction::East, coord.east()),
            (Direction::West, coord.west()),
            (Direction::North, coord.north()),
            (Direction::South, coord.south()),
        ] {
            if !self.chunks.contains_key(&ncoord) {
                continue;
            }
            if let Some(chunk) = self.chunks.get_mut(&coord) {
                chunk.links.set(dir, Some(ncoord));
            }
            if let Some(neighbor) = self.chunks.get_mut(&ncoord) {
                neighbor.links.set(dir.opposite(), Some(coord));
            }
        }
    }

    /// Removes a chunk, severing any live neighbors' back-links.
    pub fn remove(&mut self, coord: ChunkCoord) -> Option<Chunk> {
        let chunk = self.chunks.remove(&coord)?;
        for dir in Direction::LATERAL {
            if let Some(ncoord) = chunk.links.get(dir) {
                if let Some(neighbor) = self.chunks.get_mut(&ncoord) {
                    neighbor.links.set(dir.opposite(), None);
                }
            }
        }
        Some(chunk)
    }

    /// Locator for a world-space position, if the containing chunk is loaded.
    pub fn locate(&self, pos: Vec3) -> BlockLocator {
        if pos.z < 0.0 || pos.z >= CHUNK_SIZE_Z as f32 {
            return BlockLocator::NONE;
        }
        let coord = ChunkCoord::containing(pos.x, pos.y);
        let Some(chunk) = self.get(coord) else {
            return BlockLocator::NONE;
        };
        let (x, y, z) = chunk.local_coords(pos);
        if !chunk.contains_local(x, y, z) {
            return BlockLocator::NONE;
        }
        BlockLocator::new(coord, block_index(x as usize, y as usize, z as usize))
    }
}
