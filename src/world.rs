//! World orchestration: streaming lifecycle, lighting drive, mesh refresh,
//! and interaction queries. All mutation here happens on the owning thread;
//! generation runs on the worker pool and hands chunks back whole.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::Instant;

use hashbrown::{HashMap, HashSet};
use lode_blocks::{Block, BlockRegistry, BlockTypeId};
use lode_chunk::{Chunk, ChunkMap, ChunkState};
use lode_geom::Vec3;
use lode_lighting::LightEngine;
use lode_mesh::{build_chunk_mesh, ChunkMesh};
use lode_runtime::{GenJob, Runtime};
use lode_structures::TemplateRegistry;
use lode_terrain::{ChunkCoord, TerrainGen, CHUNK_SIZE_X, CHUNK_SIZE_Y};

use crate::config::WorldConfig;
use crate::daycycle::{DayCycle, SkyState};
use crate::metrics::WorldMetrics;
use crate::raycast::{raycast_blocks, RaycastResult};

pub struct World {
    seed: u32,
    activation_radius: f32,
    deactivation_radius: f32,
    max_chunks: usize,
    save_root: PathBuf,
    reg: Arc<BlockRegistry>,
    templates: Arc<TemplateRegistry>,
    terrain: Arc<TerrainGen>,
    chunks: ChunkMap,
    /// Coordinates with an outstanding generation job. Disjoint from the
    /// active map at all times.
    pending: HashSet<ChunkCoord>,
    meshes: HashMap<ChunkCoord, ChunkMesh>,
    runtime: Runtime,
    pub lighting: LightEngine,
    pub daycycle: DayCycle,
    metrics: WorldMetrics,
}

impl World {
    pub fn new(
        cfg: &WorldConfig,
        reg: Arc<BlockRegistry>,
        templates: Arc<TemplateRegistry>,
    ) -> Self {
        let seed = cfg.resolve_seed();
        log::info!("world seed {seed}");
        Self {
            seed,
            activation_radius: cfg.activation_radius,
            deactivation_radius: cfg.deactivation_radius(),
            max_chunks: cfg.max_chunks,
            save_root: cfg.save_root.clone(),
            terrain: Arc::new(TerrainGen::new(seed)),
            reg,
            templates,
            chunks: ChunkMap::new(),
            pending: HashSet::new(),
            meshes: HashMap::new(),
            runtime: Runtime::new(),
            lighting: LightEngine::new(),
            daycycle: DayCycle::new(cfg.world_time_scale),
            metrics: WorldMetrics::default(),
        }
    }

    #[inline]
    pub fn seed(&self) -> u32 {
        self.seed
    }

    #[inline]
    pub fn metrics(&self) -> WorldMetrics {
        self.metrics
    }

    #[inline]
    pub fn sky_state(&self) -> SkyState {
        self.daycycle.sky_state()
    }

    #[inline]
    pub fn chunk_map(&self) -> &ChunkMap {
        &self.chunks
    }

    #[inline]
    pub fn active_chunks(&self) -> usize {
        self.chunks.len()
    }

    #[inline]
    pub fn pending_chunks(&self) -> usize {
        self.pending.len()
    }

    #[inline]
    pub fn is_pending(&self, coord: ChunkCoord) -> bool {
        self.pending.contains(&coord)
    }

    pub fn mesh(&self, coord: ChunkCoord) -> Option<&ChunkMesh> {
        self.meshes.get(&coord)
    }

    /// One simulation step around the observer's position.
    pub fn step(&mut self, observer: Vec3, dt_seconds: f32) {
        let started = Instant::now();
        self.metrics = WorldMetrics::default();

        self.daycycle.advance(dt_seconds);
        self.update_streaming(observer);
        self.poll_generation();
        self.rebuild_meshes(observer);
        self.metrics.lighting_blocks = self.lighting.process(&mut self.chunks, &self.reg);

        self.metrics.active_chunks = self.chunks.len();
        self.metrics.pending_chunks = self.pending.len();
        self.metrics.rendered_vertices =
            self.meshes.values().map(ChunkMesh::vertex_count).sum();
        self.metrics.step_micros = started.elapsed().as_micros() as u64;
    }

    /// Below the cap: activate the nearest missing chunk in range, else shed
    /// the farthest one outside the (larger) deactivation radius. At the
    /// cap: shed the globally farthest.
    fn update_streaming(&mut self, observer: Vec3) {
        if self.chunks.len() + self.pending.len() < self.max_chunks {
            if !self.activate_nearest_missing(observer) {
                self.deactivate_farthest_beyond(observer, self.deactivation_radius);
            }
        } else {
            self.deactivate_farthest_beyond(observer, 0.0);
        }
    }

    fn activate_nearest_missing(&mut self, observer: Vec3) -> bool {
        let radius = self.activation_radius;
        let center = ChunkCoord::containing(observer.x, observer.y);
        let span_x = (radius / CHUNK_SIZE_X as f32).ceil() as i32;
        let span_y = (radius / CHUNK_SIZE_Y as f32).ceil() as i32;

        let mut best: Option<(ChunkCoord, f32)> = None;
        for dy in -span_y..=span_y {
            for dx in -span_x..=span_x {
                let coord = center.offset(dx, dy);
                let d2 = coord.center_distance_sq(observer.x, observer.y);
                if d2 >= radius * radius {
                    continue;
                }
                if best.is_some_and(|(_, bd)| d2 >= bd) {
                    continue;
                }
                if self.chunks.contains(coord) || self.pending.contains(&coord) {
                    continue;
                }
                best = Some((coord, d2));
            }
        }

        match best {
            Some((coord, _)) => {
                self.request_activation(coord);
                true
            }
            None => false,
        }
    }

    fn deactivate_farthest_beyond(&mut self, observer: Vec3, radius: f32) -> bool {
        let mut farthest: Option<(ChunkCoord, f32)> = None;
        for (coord, _) in self.chunks.iter() {
            let d2 = coord.center_distance_sq(observer.x, observer.y);
            if d2 < radius * radius {
                continue;
            }
            if farthest.is_none_or(|(_, fd)| d2 > fd) {
                farthest = Some((*coord, d2));
            }
        }
        match farthest {
            Some((coord, _)) => {
                self.deactivate_chunk(coord);
                true
            }
            None => false,
        }
    }

    /// Load-or-generate. A successful load activates immediately; otherwise
    /// the chunk is dispatched to the worker pool and its coordinate held in
    /// the pending set until the job drains.
    pub fn request_activation(&mut self, coord: ChunkCoord) {
        if self.chunks.contains(coord) || self.pending.contains(&coord) {
            return;
        }
        let mut chunk = Chunk::new(coord);
        chunk.state.store(ChunkState::ActivatingQueuedLoad);
        match chunk.load_from_file(&self.save_root, self.seed, &self.reg) {
            Ok(()) => self.activate_chunk(chunk),
            Err(err) => {
                if err.is_integrity_failure() {
                    log::error!(
                        "chunk ({}, {}): corrupt save data, regenerating: {err}",
                        coord.cx,
                        coord.cy
                    );
                } else if !err.is_missing_file() {
                    log::warn!(
                        "chunk ({}, {}): ignoring save data: {err}",
                        coord.cx,
                        coord.cy
                    );
                }
                chunk.state.store(ChunkState::ActivatingQueuedGenerate);
                self.pending.insert(coord);
                self.runtime.submit(GenJob {
                    chunk,
                    terrain: self.terrain.clone(),
                    reg: self.reg.clone(),
                    templates: self.templates.clone(),
                });
            }
        }
    }

    /// Consumes at most one finished generation per step.
    fn poll_generation(&mut self) {
        if let Some(done) = self.runtime.poll_completed() {
            self.pending.remove(&done.chunk.coord);
            self.activate_chunk(done.chunk);
        }
    }

    fn activate_chunk(&mut self, chunk: Chunk) {
        let coord = chunk.coord;
        self.chunks.insert(chunk);
        self.chunks.wire_links(coord);
        self.lighting.seed_chunk(&mut self.chunks, coord, &self.reg);
        if let Some(c) = self.chunks.get_mut(coord) {
            c.state.store(ChunkState::Active);
            c.mesh_dirty = true;
        }
        log::debug!("activated chunk ({}, {})", coord.cx, coord.cy);
    }

    /// Synchronous removal; dirty chunks save on the way out.
    pub fn deactivate_chunk(&mut self, coord: ChunkCoord) {
        let Some(chunk) = self.chunks.remove(coord) else {
            return;
        };
        chunk.state.store(ChunkState::DeactivatingQueuedSave);
        if chunk.needs_save {
            if let Err(err) = chunk.save_to_file(&self.save_root, self.seed) {
                log::error!("chunk ({}, {}): save failed: {err}", coord.cx, coord.cy);
            }
        }
        self.meshes.remove(&coord);
        log::debug!("deactivated chunk ({}, {})", coord.cx, coord.cy);
    }

    /// Rebuilds at most the two nearest dirty meshes whose four lateral
    /// neighbors are present — a deliberate per-step cost cap.
    fn rebuild_meshes(&mut self, observer: Vec3) {
        let mut nearest: Option<(ChunkCoord, f32)> = None;
        let mut second: Option<(ChunkCoord, f32)> = None;
        for (coord, chunk) in self.chunks.iter() {
            if !chunk.mesh_dirty {
                continue;
            }
            let links = chunk.links;
            if links.east.is_none()
                || links.west.is_none()
                || links.north.is_none()
                || links.south.is_none()
            {
                continue;
            }
            let d = chunk.origin.distance_sq_xy(observer);
            if nearest.is_none_or(|(_, nd)| d < nd) {
                second = nearest;
                nearest = Some((*coord, d));
            } else if second.is_none_or(|(_, sd)| d < sd) {
                second = Some((*coord, d));
            }
        }
        for (coord, _) in [nearest, second].into_iter().flatten() {
            let mesh = build_chunk_mesh(&self.chunks, coord, &self.reg);
            self.meshes.insert(coord, mesh);
            if let Some(chunk) = self.chunks.get_mut(coord) {
                chunk.mesh_dirty = false;
            }
            self.metrics.meshes_rebuilt += 1;
        }
    }

    pub fn raycast(&self, start: Vec3, dir: Vec3, max_distance: f32) -> RaycastResult {
        raycast_blocks(&self.chunks, start, dir, max_distance)
    }

    pub fn block_at(&self, pos: Vec3) -> Option<Block> {
        self.chunks.locate(pos).block(&self.chunks).copied()
    }

    /// Places a block at a world position, rescanning the sky column and
    /// queueing the cell for lighting.
    pub fn add_block(&mut self, pos: Vec3, ty: BlockTypeId) -> bool {
        let loc = self.chunks.locate(pos);
        let Some(coord) = loc.chunk else {
            return false;
        };
        if let Some(chunk) = self.chunks.get_mut(coord) {
            chunk.set_block_type(loc.index, ty, &self.reg);
            chunk.mesh_dirty = true;
            chunk.needs_save = true;
        }
        self.lighting.on_block_placed(&mut self.chunks, loc);
        true
    }

    /// Clears a block to air, with the same rescan/queue behavior.
    pub fn dig_block(&mut self, pos: Vec3) -> bool {
        let loc = self.chunks.locate(pos);
        let Some(coord) = loc.chunk else {
            return false;
        };
        let air = self.reg.expect_id("air");
        if let Some(chunk) = self.chunks.get_mut(coord) {
            chunk.set_block_type(loc.index, air, &self.reg);
            chunk.mesh_dirty = true;
            chunk.needs_save = true;
        }
        self.lighting.on_block_dug(&mut self.chunks, loc);
        true
    }
}

impl Drop for World {
    /// Teardown saves every dirty chunk and severs links chunk by chunk.
    fn drop(&mut self) {
        for coord in self.chunks.coords() {
            if let Some(chunk) = self.chunks.remove(coord) {
                chunk.state.store(ChunkState::DeactivatingQueuedSave);
                if chunk.needs_save {
                    if let Err(err) = chunk.save_to_file(&self.save_root, self.seed) {
                        log::error!(
                            "chunk ({}, {}): save on teardown failed: {err}",
                            coord.cx,
                            coord.cy
                        );
                    }
                }
            }
        }
    }
}
