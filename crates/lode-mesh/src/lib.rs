//! Surface extraction: per-block face visibility and vertex emission.
//!
//! A face is emitted only when its outward neighbor is absent (chunk edge or
//! world edge) or present but non-visible. Water emits all six faces so the
//! renderer can blend through it. Visibility flags alone decide emission;
//! light state only tints.
#![forbid(unsafe_code)]

use lode_blocks::{BlockRegistry, TileUv};
use lode_chunk::{block_coords, BlockLocator, ChunkMap, Direction};
use lode_geom::Vec3;
use lode_lighting::face_tint;
use lode_terrain::{ChunkCoord, CHUNK_LAYER, CHUNK_VOLUME};

/// Position, seam-hiding tint, and atlas UV, flat-listed two triangles per
/// face.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct Vertex {
    pub position: [f32; 3],
    pub color: [u8; 4],
    pub uv: [f32; 2],
}

#[derive(Clone, Debug, Default)]
pub struct ChunkMesh {
    pub vertices: Vec<Vertex>,
}

impl ChunkMesh {
    #[inline]
    pub fn vertex_count(&self) -> usize {
        self.vertices.len()
    }
}

#[inline]
fn should_emit(block: lode_blocks::Block, neighbor: Option<lode_blocks::Block>) -> bool {
    block.is_water() || neighbor.is_none_or(|n| !n.is_visible())
}

/// Rebuilds the full vertex list for one chunk.
pub fn build_chunk_mesh(map: &ChunkMap, coord: ChunkCoord, reg: &BlockRegistry) -> ChunkMesh {
    let Some(chunk) = map.get(coord) else {
        return ChunkMesh::default();
    };
    let mut vertices = Vec::with_capacity(CHUNK_LAYER * 6);
    let (ox, oy) = coord.origin();

    for index in 0..CHUNK_VOLUME {
        let block = chunk.blocks[index];
        if !block.is_visible() {
            continue;
        }
        let Some(ty) = reg.get(block.type_id) else {
            continue;
        };
        let loc = BlockLocator::new(coord, index);
        let (x, y, z) = block_coords(index);
        let min = Vec3::new((ox + x as i32) as f32, (oy + y as i32) as f32, z as f32);

        for dir in Direction::ALL {
            let neighbor = loc.step(map, dir).block(map).copied();
            if !should_emit(block, neighbor) {
                continue;
            }
            let uv = match dir {
                Direction::Skyward => ty.top_uv,
                Direction::Groundward => ty.bottom_uv,
                _ => ty.side_uv,
            };
            emit_face(&mut vertices, min, dir, face_tint(map, loc, dir), uv);
        }
    }

    ChunkMesh { vertices }
}

/// Pushes one unit quad (two triangles) with corners wound outward.
fn emit_face(out: &mut Vec<Vertex>, min: Vec3, dir: Direction, color: [u8; 4], uv: TileUv) {
    let corner = |dx: f32, dy: f32, dz: f32| Vec3::new(min.x + dx, min.y + dy, min.z + dz);
    let quad = match dir {
        Direction::East => [
            corner(1.0, 0.0, 0.0),
            corner(1.0, 1.0, 0.0),
            corner(1.0, 1.0, 1.0),
            corner(1.0, 0.0, 1.0),
        ],
        Direction::West => [
            corner(0.0, 1.0, 0.0),
            corner(0.0, 0.0, 0.0),
            corner(0.0, 0.0, 1.0),
            corner(0.0, 1.0, 1.0),
        ],
        Direction::North => [
            corner(1.0, 1.0, 0.0),
            corner(0.0, 1.0, 0.0),
            corner(0.0, 1.0, 1.0),
            corner(1.0, 1.0, 1.0),
        ],
        Direction::South => [
            corner(0.0, 0.0, 0.0),
            corner(1.0, 0.0, 0.0),
            corner(1.0, 0.0, 1.0),
            corner(0.0, 0.0, 1.0),
        ],
        Direction::Skyward => [
            corner(0.0, 1.0, 1.0),
            corner(0.0, 0.0, 1.0),
            corner(1.0, 0.0, 1.0),
            corner(1.0, 1.0, 1.0),
        ],
        Direction::Groundward => [
            corner(1.0, 1.0, 0.0),
            corner(1.0, 0.0, 0.0),
            corner(0.0, 0.0, 0.0),
            corner(0.0, 1.0, 0.0),
        ],
    };
    let (uv_min, uv_max) = uv.rect();
    let uvs = [
        [uv_min[0], uv_max[1]],
        [uv_max[0], uv_max[1]],
        [uv_max[0], uv_min[1]],
        [uv_min[0], uv_min[1]],
    ];
    for i in [0, 1, 2, 0, 2, 3] {
        out.push(Vertex {
            position: [quad[i].x, quad[i].y, quad[i].z],
            color,
            uv: uvs[i],
        });
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use lode_chunk::{block_index, Chunk};

    fn air_chunk_map(reg: &BlockRegistry) -> ChunkMap {
        let air = reg.expect_id("air");
        let mut chunk = Chunk::new(ChunkCoord::new(0, 0));
        for b in chunk.blocks.iter_mut() {
            *b = reg.make(air);
        }
        let mut map = ChunkMap::new();
        map.insert(chunk);
        map.wire_links(ChunkCoord::new(0, 0));
        map
    }

    #[test]
    fn lone_cube_emits_six_faces() {
        let reg = BlockRegistry::builtin();
        let mut map = air_chunk_map(&reg);
        let coord = ChunkCoord::new(0, 0);
        let stone = reg.expect_id("stone");
        map.get_mut(coord)
            .unwrap()
            .set_block_type(block_index(8, 8, 40), stone, &reg);

        let mesh = build_chunk_mesh(&map, coord, &reg);
        assert_eq!(mesh.vertex_count(), 6 * 6);
    }

    #[test]
    fn buried_cube_emits_nothing() {
        let reg = BlockRegistry::builtin();
        let mut map = air_chunk_map(&reg);
        let coord = ChunkCoord::new(0, 0);
        let stone = reg.expect_id("stone");
        {
            let chunk = map.get_mut(coord).unwrap();
            for dz in -1i32..=1 {
                for dy in -1i32..=1 {
                    for dx in -1i32..=1 {
                        let idx = block_index(
                            (8 + dx) as usize,
                            (8 + dy) as usize,
                            (40 + dz) as usize,
                        );
                        chunk.set_block_type(idx, stone, &reg);
                    }
                }
            }
        }
        let mesh = build_chunk_mesh(&map, coord, &reg);
        // 27 cubes in a 3x3x3 block: only the outer shell shows, and the
        // center cube contributes no vertices at all. The shell of a 3x3x3
        // cube shows 9 faces per side.
        assert_eq!(mesh.vertex_count(), 6 * 9 * 6);
    }

    #[test]
    fn water_emits_all_faces_even_against_water() {
        let reg = BlockRegistry::builtin();
        let mut map = air_chunk_map(&reg);
        let coord = ChunkCoord::new(0, 0);
        let water = reg.expect_id("water");
        {
            let chunk = map.get_mut(coord).unwrap();
            chunk.set_block_type(block_index(8, 8, 40), water, &reg);
            chunk.set_block_type(block_index(9, 8, 40), water, &reg);
        }
        let mesh = build_chunk_mesh(&map, coord, &reg);
        assert_eq!(mesh.vertex_count(), 2 * 6 * 6);
    }

    #[test]
    fn chunk_edge_faces_are_emitted_when_no_neighbor_is_loaded() {
        let reg = BlockRegistry::builtin();
        let mut map = air_chunk_map(&reg);
        let coord = ChunkCoord::new(0, 0);
        let stone = reg.expect_id("stone");
        map.get_mut(coord)
            .unwrap()
            .set_block_type(block_index(15, 8, 40), stone, &reg);
        let mesh = build_chunk_mesh(&map, coord, &reg);
        // All six faces, including the east one facing the missing neighbor.
        assert_eq!(mesh.vertex_count(), 6 * 6);
    }

    #[test]
    fn faces_against_a_loaded_neighbor_follow_its_visibility() {
        let reg = BlockRegistry::builtin();
        let stone = reg.expect_id("stone");
        let air = reg.expect_id("air");
        let mut map = ChunkMap::new();
        for coord in [ChunkCoord::new(0, 0), ChunkCoord::new(1, 0)] {
            let mut chunk = Chunk::new(coord);
            for b in chunk.blocks.iter_mut() {
                *b = reg.make(air);
            }
            map.insert(chunk);
            map.wire_links(coord);
        }
        let coord = ChunkCoord::new(0, 0);
        map.get_mut(coord)
            .unwrap()
            .set_block_type(block_index(15, 8, 40), stone, &reg);
        // Mirror block right across the seam.
        map.get_mut(ChunkCoord::new(1, 0))
            .unwrap()
            .set_block_type(block_index(0, 8, 40), stone, &reg);
        let mesh = build_chunk_mesh(&map, coord, &reg);
        // The east face is suppressed by the visible neighbor across the seam.
        assert_eq!(mesh.vertex_count(), 5 * 6);
    }
}
