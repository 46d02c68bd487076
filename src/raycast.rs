//! Voxel-grid raycasting over the loaded chunk set.

use lode_chunk::{BlockLocator, ChunkMap, Direction};
use lode_geom::Vec3;
use lode_terrain::CHUNK_SIZE_Z;

#[derive(Clone, Copy, Debug)]
pub struct RaycastResult {
    pub impacted: bool,
    pub position: Vec3,
    /// Outward normal of the struck face; zero when the ray started inside a
    /// solid block or missed.
    pub normal: Vec3,
    pub distance: f32,
    pub block: BlockLocator,
}

impl RaycastResult {
    fn miss_at(position: Vec3, distance: f32) -> Self {
        Self {
            impacted: false,
            position,
            normal: Vec3::ZERO,
            distance,
            block: BlockLocator::NONE,
        }
    }
}

/// Axis-stepping grid traversal from `start` along normalized `dir`. Stops
/// at the first solid block, at `max_distance`, or on leaving the loaded
/// world.
pub fn raycast_blocks(
    map: &ChunkMap,
    start: Vec3,
    dir: Vec3,
    max_distance: f32,
) -> RaycastResult {
    if start.z < 0.0 || start.z > CHUNK_SIZE_Z as f32 || max_distance == 0.0 {
        return RaycastResult::miss_at(start, 0.0);
    }
    let mut loc = map.locate(start);
    if !loc.is_some() {
        return RaycastResult::miss_at(start, 0.0);
    }

    let step_size = |d: f32| if d != 0.0 { 1.0 / d.abs() } else { f32::MAX };
    let (sx, sy, sz) = (step_size(dir.x), step_size(dir.y), step_size(dir.z));

    // Parametric distance to the first crossing on each axis.
    let frac = |v: f32| v - v.floor();
    let mut tx = if dir.x < 0.0 {
        frac(start.x) * sx
    } else {
        (1.0 - frac(start.x)) * sx
    };
    let mut ty = if dir.y < 0.0 {
        frac(start.y) * sy
    } else {
        (1.0 - frac(start.y)) * sy
    };
    let mut tz = if dir.z < 0.0 {
        frac(start.z) * sz
    } else {
        (1.0 - frac(start.z)) * sz
    };

    let step_east = dir.x >= 0.0;
    let step_north = dir.y >= 0.0;
    let step_sky = dir.z >= 0.0;

    let mut t = 0.0_f32;
    let mut normal = Vec3::ZERO;

    while t < max_distance {
        let Some(block) = loc.block(map) else {
            // Walked off the loaded world.
            return RaycastResult::miss_at(start + dir * t, t);
        };
        if block.is_solid() {
            return RaycastResult {
                impacted: true,
                position: start + dir * t,
                normal,
                distance: t,
                block: loc,
            };
        }

        if tx < ty && tx < tz {
            loc = loc.step(map, if step_east { Direction::East } else { Direction::West });
            t = tx;
            tx += sx;
            normal = if step_east { Vec3::WEST } else { Vec3::EAST };
        } else if ty < tz {
            loc = loc.step(
                map,
                if step_north {
                    Direction::North
                } else {
                    Direction::South
                },
            );
            t = ty;
            ty += sy;
            normal = if step_north { Vec3::SOUTH } else { Vec3::NORTH };
        } else {
            loc = loc.step(
                map,
                if step_sky {
                    Direction::Skyward
                } else {
                    Direction::Groundward
                },
            );
            t = tz;
            tz += sz;
            normal = if step_sky { Vec3::GROUNDWARD } else { Vec3::SKYWARD };
        }
    }

    RaycastResult::miss_at(start + dir * max_distance, max_distance)
}
