//! Per-step diagnostics, aggregated once per step and handed to the
//! presentation layer instead of scattered globals.

#[derive(Clone, Copy, Debug, Default)]
pub struct WorldMetrics {
    pub active_chunks: usize,
    pub pending_chunks: usize,
    /// Sum of vertex counts over all built chunk meshes.
    pub rendered_vertices: usize,
    /// Meshes rebuilt this step (capped at two by design).
    pub meshes_rebuilt: u32,
    /// Blocks relaxed by the lighting queue this step.
    pub lighting_blocks: usize,
    pub step_micros: u64,
}
