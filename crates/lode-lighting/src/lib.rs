//! Two-channel light propagation over the chunk map.
//!
//! Outdoor light floods downward from sky-flagged cells at full strength;
//! indoor light radiates from emissive block types. Both decay by one unit
//! per cell of travel and are relaxed to a fixed point through one FIFO
//! dirty queue.
#![forbid(unsafe_code)]

use std::collections::VecDeque;

use lode_blocks::{BlockRegistry, LIGHT_MAX};
use lode_chunk::{block_index, BlockLocator, ChunkMap, Direction};
use lode_terrain::{ChunkCoord, CHUNK_SIZE_X, CHUNK_SIZE_Y, CHUNK_SIZE_Z, CHUNK_VOLUME};

pub struct LightEngine {
    queue: VecDeque<BlockLocator>,
    /// Debug toggle: when false, dirty marks are ignored entirely.
    pub enabled: bool,
}

impl Default for LightEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl LightEngine {
    pub fn new() -> Self {
        Self {
            queue: VecDeque::new(),
            enabled: true,
        }
    }

    #[inline]
    pub fn queued(&self) -> usize {
        self.queue.len()
    }

    /// Flags a block for recomputation and enqueues it.
    pub fn mark_dirty(&mut self, map: &mut ChunkMap, loc: BlockLocator) {
        if !self.enabled {
            return;
        }
        if let Some(block) = loc.block_mut(map) {
            block.set_light_dirty(true);
            self.queue.push_back(loc);
        }
    }

    /// Seeds dirty state for a freshly activated chunk: its outward-facing
    /// non-opaque boundary cells, every emitter, a top-down sky scan per
    /// column, and the lateral neighbors of each sky-exposed cell.
    pub fn seed_chunk(&mut self, map: &mut ChunkMap, coord: ChunkCoord, reg: &BlockRegistry) {
        // Lateral boundary shells, so light exchanges with already-active
        // neighbors in both directions.
        for z in 0..CHUNK_SIZE_Z {
            for y in 0..CHUNK_SIZE_Y {
                for x in [0, CHUNK_SIZE_X - 1] {
                    self.mark_if_transparent(map, coord, block_index(x, y, z));
                }
            }
            for x in 0..CHUNK_SIZE_X {
                for y in [0, CHUNK_SIZE_Y - 1] {
                    self.mark_if_transparent(map, coord, block_index(x, y, z));
                }
            }
        }

        // Light sources.
        for index in 0..CHUNK_VOLUME {
            let emits = map
                .get(coord)
                .and_then(|c| c.block(index))
                .is_some_and(|b| reg.emission_of(*b) != 0);
            if emits {
                self.mark_dirty(map, BlockLocator::new(coord, index));
            }
        }

        // Sky scan: each column is sky-exposed from the top until the first
        // opaque cell.
        if let Some(chunk) = map.get_mut(coord) {
            for y in 0..CHUNK_SIZE_Y {
                for x in 0..CHUNK_SIZE_X {
                    for z in (0..CHUNK_SIZE_Z).rev() {
                        let index = block_index(x, y, z);
                        if chunk.blocks[index].is_opaque() {
                            break;
                        }
                        chunk.blocks[index].set_sky(true);
                    }
                }
            }
        }

        // Lateral neighbors of sky cells: lets full-strength sky light spill
        // sideways into overhangs and caves, including across chunk seams.
        for y in 0..CHUNK_SIZE_Y {
            for x in 0..CHUNK_SIZE_X {
                let mut loc =
                    BlockLocator::new(coord, block_index(x, y, CHUNK_SIZE_Z - 1));
                while let Some(block) = loc.block(map).copied() {
                    if block.is_opaque() {
                        break;
                    }
                    for dir in Direction::LATERAL {
                        let nloc = loc.step(map, dir);
                        let wants_mark = nloc.block(map).is_some_and(|nb| {
                            !nb.is_opaque() && !nb.is_sky() && !nb.is_light_dirty()
                        });
                        if wants_mark {
                            self.mark_dirty(map, nloc);
                        }
                    }
                    loc = loc.step(map, Direction::Groundward);
                }
            }
        }
    }

    fn mark_if_transparent(&mut self, map: &mut ChunkMap, coord: ChunkCoord, index: usize) {
        let transparent = map
            .get(coord)
            .and_then(|c| c.block(index))
            .is_some_and(|b| !b.is_opaque());
        if transparent {
            self.mark_dirty(map, BlockLocator::new(coord, index));
        }
    }

    /// Drains the queue to a fixed point. Returns the number of blocks
    /// processed.
    pub fn process(&mut self, map: &mut ChunkMap, reg: &BlockRegistry) -> usize {
        let mut processed = 0;
        while let Some(loc) = self.queue.pop_front() {
            self.process_one(map, reg, loc);
            processed += 1;
        }
        processed
    }

    fn process_one(&mut self, map: &mut ChunkMap, reg: &BlockRegistry, loc: BlockLocator) {
        // A locator can go stale if its chunk deactivated while queued.
        let Some(block) = loc.block(map).copied() else {
            return;
        };
        if let Some(b) = loc.block_mut(map) {
            b.set_light_dirty(false);
        }

        let outdoor_floor = if block.is_sky() { LIGHT_MAX } else { 0 };
        let indoor_floor = reg.emission_of(block);

        let neighbors = Direction::ALL.map(|dir| loc.step(map, dir));
        let mut neighbor_indoor = 0u8;
        let mut neighbor_outdoor = 0u8;
        for nloc in &neighbors {
            if let Some(nb) = nloc.block(map) {
                neighbor_indoor = neighbor_indoor.max(nb.indoor_light());
                neighbor_outdoor = neighbor_outdoor.max(nb.outdoor_light());
            }
        }

        let (indoor, outdoor) = if block.is_opaque() {
            (indoor_floor, outdoor_floor)
        } else {
            (
                indoor_floor.max(neighbor_indoor.saturating_sub(1)),
                outdoor_floor.max(neighbor_outdoor.saturating_sub(1)),
            )
        };

        if indoor == block.indoor_light() && outdoor == block.outdoor_light() {
            return;
        }

        if let Some(b) = loc.block_mut(map) {
            b.set_indoor_light(indoor);
            b.set_outdoor_light(outdoor);
        }

        // The owning chunk re-meshes, and so does any lateral neighbor whose
        // shared face could be tinted by this cell.
        if let Some(coord) = loc.chunk {
            let links = map.get(coord).map(|c| c.links).unwrap_or_default();
            if let Some(chunk) = map.get_mut(coord) {
                chunk.mesh_dirty = true;
            }
            for dir in Direction::LATERAL {
                if let Some(ncoord) = links.get(dir) {
                    if let Some(neighbor) = map.get_mut(ncoord) {
                        neighbor.mesh_dirty = true;
                    }
                }
            }
        }

        for nloc in neighbors {
            let wants_mark = nloc
                .block(map)
                .is_some_and(|nb| !nb.is_opaque() && !nb.is_light_dirty());
            if wants_mark {
                self.mark_dirty(map, nloc);
            }
        }
    }

    /// Rescans the sky column after a block was placed at `loc` and enqueues
    /// the affected cells.
    pub fn on_block_placed(&mut self, map: &mut ChunkMap, loc: BlockLocator) {
        self.mark_dirty(map, loc);
        let Some(block) = loc.block(map).copied() else {
            return;
        };
        if block.is_sky() && block.is_opaque() {
            if let Some(b) = loc.block_mut(map) {
                b.set_sky(false);
            }
            self.walk_column_setting_sky(map, loc, false);
        }
    }

    /// Rescans the sky column after the block at `loc` was cleared to air.
    pub fn on_block_dug(&mut self, map: &mut ChunkMap, loc: BlockLocator) {
        self.mark_dirty(map, loc);
        let above_is_sky = loc
            .step(map, Direction::Skyward)
            .block(map)
            .is_some_and(|b| b.is_sky());
        if above_is_sky {
            if let Some(b) = loc.block_mut(map) {
                b.set_sky(true);
            }
            self.walk_column_setting_sky(map, loc, true);
        }
    }

    fn walk_column_setting_sky(&mut self, map: &mut ChunkMap, from: BlockLocator, sky: bool) {
        let mut cur = from.step(map, Direction::Groundward);
        while let Some(block) = cur.block(map).copied() {
            if block.is_opaque() {
                break;
            }
            if let Some(b) = cur.block_mut(map) {
                b.set_sky(sky);
            }
            self.mark_dirty(map, cur);
            cur = cur.step(map, Direction::Groundward);
        }
    }
}

/// Color used to hide lighting seams on an emitted face: the outward
/// neighbor's two channels mapped onto a per-direction base brightness.
/// Outdoor drives red, indoor drives green; the shader recombines them with
/// the sky and glow colors.
pub fn face_tint(map: &ChunkMap, loc: BlockLocator, dir: Direction) -> [u8; 4] {
    let base: u8 = match dir {
        Direction::East | Direction::West => 230,
        Direction::North | Direction::South => 200,
        Direction::Skyward | Direction::Groundward => 255,
    };
    let neighbor = loc.step(map, dir);
    let (outdoor, indoor) = neighbor
        .block(map)
        .map_or((0, 0), |b| (b.outdoor_light(), b.indoor_light()));
    let scale = |level: u8| (level as f32 / LIGHT_MAX as f32 * base as f32) as u8;
    [scale(outdoor), scale(indoor), 0, 255]
}
