//! Background generation workers.
//!
//! A job owns its chunk outright: the block array crosses into the worker
//! with the job and comes back with the result, so the main thread can never
//! observe a half-generated chunk. Only the atomic lifecycle state is shared.
#![forbid(unsafe_code)]

use std::sync::Arc;
use std::thread;

use crossbeam_channel::{unbounded, Receiver, Sender};
use lode_blocks::BlockRegistry;
use lode_chunk::{Chunk, ChunkState};
use lode_structures::TemplateRegistry;
use lode_terrain::TerrainGen;
use rayon::{ThreadPool, ThreadPoolBuilder};

pub struct GenJob {
    pub chunk: Chunk,
    pub terrain: Arc<TerrainGen>,
    pub reg: Arc<BlockRegistry>,
    pub templates: Arc<TemplateRegistry>,
}

pub struct GenResult {
    pub chunk: Chunk,
}

/// Fixed pool of generation workers fed over a channel. Results are fetched
/// non-blockingly, one per poll.
pub struct Runtime {
    job_tx: Sender<GenJob>,
    res_rx: Receiver<GenResult>,
    pub workers: usize,
    _pool: Arc<ThreadPool>,
}

impl Runtime {
    pub fn new() -> Self {
        let workers = thread::available_parallelism()
            .map(|n| n.get().saturating_sub(1).max(1))
            .unwrap_or(2);
        Self::with_workers(workers)
    }

    pub fn with_workers(workers: usize) -> Self {
        let workers = workers.max(1);
        let (job_tx, job_rx) = unbounded::<GenJob>();
        let (res_tx, res_rx) = unbounded::<GenResult>();
        let pool = Arc::new(
            ThreadPoolBuilder::new()
                .num_threads(workers)
                .thread_name(|i| format!("lode-gen-{i}"))
                .build()
                .expect("generation pool"),
        );
        for _ in 0..workers {
            let rx = job_rx.clone();
            let tx = res_tx.clone();
            pool.spawn(move || {
                while let Ok(job) = rx.recv() {
                    let GenJob {
                        mut chunk,
                        terrain,
                        reg,
                        templates,
                    } = job;
                    chunk.state.store(ChunkState::ActivatingGenerating);
                    chunk.generate(&terrain, &reg, &templates);
                    chunk.state.store(ChunkState::ActivatingGenerateComplete);
                    log::trace!("generated chunk ({}, {})", chunk.coord.cx, chunk.coord.cy);
                    if tx.send(GenResult { chunk }).is_err() {
                        break;
                    }
                }
            });
        }
        Self {
            job_tx,
            res_rx,
            workers,
            _pool: pool,
        }
    }

    /// Fire-and-forget dispatch. The caller records the coordinate in its
    /// pending set; duplicate dispatch is the caller's bug to prevent.
    pub fn submit(&self, job: GenJob) {
        let coord = job.chunk.coord;
        if self.job_tx.send(job).is_err() {
            log::error!("generation pool is gone; chunk ({}, {}) dropped", coord.cx, coord.cy);
        }
    }

    /// Fetches at most one completed generation, without blocking.
    pub fn poll_completed(&self) -> Option<GenResult> {
        self.res_rx.try_recv().ok()
    }
}

impl Default for Runtime {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_terrain::ChunkCoord;
    use std::time::Duration;

    fn wait_for(runtime: &Runtime) -> GenResult {
        for _ in 0..500 {
            if let Some(done) = runtime.poll_completed() {
                return done;
            }
            thread::sleep(Duration::from_millis(10));
        }
        panic!("generation did not complete in time");
    }

    #[test]
    fn background_generation_matches_inline_generation() {
        let reg = Arc::new(BlockRegistry::builtin());
        let templates = Arc::new(TemplateRegistry::builtin(&reg));
        let terrain = Arc::new(TerrainGen::new(12345));
        let runtime = Runtime::with_workers(2);

        let coord = ChunkCoord::new(2, -1);
        let chunk = Chunk::new(coord);
        runtime.submit(GenJob {
            chunk,
            terrain: terrain.clone(),
            reg: reg.clone(),
            templates: templates.clone(),
        });

        let done = wait_for(&runtime);
        assert_eq!(done.chunk.coord, coord);
        assert_eq!(
            done.chunk.state.load(),
            ChunkState::ActivatingGenerateComplete
        );

        let mut inline = Chunk::new(coord);
        inline.generate(&terrain, &reg, &templates);
        assert_eq!(done.chunk.blocks, inline.blocks);
    }

    #[test]
    fn poll_yields_at_most_one_completion() {
        let reg = Arc::new(BlockRegistry::builtin());
        let templates = Arc::new(TemplateRegistry::builtin(&reg));
        let terrain = Arc::new(TerrainGen::new(7));
        let runtime = Runtime::with_workers(2);

        for i in 0..3 {
            runtime.submit(GenJob {
                chunk: Chunk::new(ChunkCoord::new(i, 0)),
                terrain: terrain.clone(),
                reg: reg.clone(),
                templates: templates.clone(),
            });
        }
        let mut seen = 0;
        for _ in 0..500 {
            if runtime.poll_completed().is_some() {
                seen += 1;
                if seen == 3 {
                    break;
                }
            }
            thread::sleep(Duration::from_millis(10));
        }
        assert_eq!(seen, 3);
        assert!(runtime.poll_completed().is_none());
    }
}
