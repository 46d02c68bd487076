//! Non-owning cursor over one voxel, with O(1) neighbor stepping.

use lode_blocks::Block;
use lode_geom::Vec3;
use lode_terrain::{
    ChunkCoord, CHUNK_BITS_X, CHUNK_LAYER, CHUNK_MASK_X, CHUNK_MASK_Y, CHUNK_SIZE_Z,
};

use crate::{block_coords, ChunkMap};

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Direction {
    East,
    West,
    North,
    South,
    Skyward,
    Groundward,
}

impl Direction {
    pub const ALL: [Direction; 6] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
        Direction::Skyward,
        Direction::Groundward,
    ];

    pub const LATERAL: [Direction; 4] = [
        Direction::East,
        Direction::West,
        Direction::North,
        Direction::South,
    ];

    pub fn opposite(self) -> Direction {
        match self {
            Direction::East => Direction::West,
            Direction::West => Direction::East,
            Direction::North => Direction::South,
            Direction::South => Direction::North,
            Direction::Skyward => Direction::Groundward,
            Direction::Groundward => Direction::Skyward,
        }
    }

    /// Outward unit normal of a face looking this way.
    pub fn normal(self) -> Vec3 {
        match self {
            Direction::East => Vec3::EAST,
            Direction::West => Vec3::WEST,
            Direction::North => Vec3::NORTH,
            Direction::South => Vec3::SOUTH,
            Direction::Skyward => Vec3::SKYWARD,
            Direction::Groundward => Vec3::GROUNDWARD,
        }
    }
}

/// `(chunk coordinate, flat index)`. The coordinate is a key into the chunk
/// map, never a pointer, so a stale locator degrades to "absent" instead of
/// dangling. Every operation is total.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct BlockLocator {
    pub chunk: Option<ChunkCoord>,
    pub index: usize,
}

impl BlockLocator {
    pub const NONE: BlockLocator = BlockLocator {
        chunk: None,
        index: 0,
    };

    #[inline]
    pub fn new(chunk: ChunkCoord, index: usize) -> Self {
        Self {
            chunk: Some(chunk),
            index,
        }
    }

    #[inline]
    pub fn is_some(&self) -> bool {
        self.chunk.is_some()
    }

    pub fn block<'m>(&self, map: &'m ChunkMap) -> Option<&'m Block> {
        let coord = self.chunk?;
        map.get(coord)?.block(self.index)
    }

    pub fn block_mut<'m>(&self, map: &'m mut ChunkMap) -> Option<&'m mut Block> {
        let coord = self.chunk?;
        map.get_mut(coord)?.blocks.get_mut(self.index)
    }

    /// World-space center of the referenced cell.
    pub fn world_center(&self) -> Option<Vec3> {
        let coord = self.chunk?;
        let (x, y, z) = block_coords(self.index);
        let (ox, oy) = coord.origin();
        Some(Vec3::new(
            ox as f32 + x as f32 + 0.5,
            oy as f32 + y as f32 + 0.5,
            z as f32 + 0.5,
        ))
    }

    /// Steps one cell. Lateral steps at a chunk face hand off to the linked
    /// neighbor, wrapping the stepped axis to the opposite face; vertical
    /// steps off the world yield `NONE`.
    pub fn step(&self, map: &ChunkMap, dir: Direction) -> BlockLocator {
        let Some(coord) = self.chunk else {
            return Self::NONE;
        };
        let (x, y, z) = block_coords(self.index);
        let y_mask = CHUNK_MASK_Y << CHUNK_BITS_X;
        match dir {
            Direction::East => {
                if x == CHUNK_MASK_X {
                    self.hand_off(map, coord, dir, self.index & !CHUNK_MASK_X)
                } else {
                    Self::new(coord, self.index + 1)
                }
            }
            Direction::West => {
                if x == 0 {
                    self.hand_off(map, coord, dir, self.index | CHUNK_MASK_X)
                } else {
                    Self::new(coord, self.index - 1)
                }
            }
            Direction::North => {
                if y == CHUNK_MASK_Y {
                    self.hand_off(map, coord, dir, self.index & !y_mask)
                } else {
                    Self::new(coord, self.index + (1 << CHUNK_BITS_X))
                }
            }
            Direction::South => {
                if y == 0 {
                    self.hand_off(map, coord, dir, self.index | y_mask)
                } else {
                    Self::new(coord, self.index - (1 << CHUNK_BITS_X))
                }
            }
            Direction::Skyward => {
                if z == CHUNK_SIZE_Z - 1 {
                    Self::NONE
                } else {
                    Self::new(coord, self.index + CHUNK_LAYER)
                }
            }
            Direction::Groundward => {
                if z == 0 {
                    Self::NONE
                } else {
                    Self::new(coord, self.index - CHUNK_LAYER)
                }
            }
        }
    }

    fn hand_off(
        &self,
        map: &ChunkMap,
        coord: ChunkCoord,
        dir: Direction,
        wrapped_index: usize,
    ) -> BlockLocator {
        match map.get(coord).and_then(|c| c.links.get(dir)) {
            Some(ncoord) => Self::new(ncoord, wrapped_index),
            None => Self::NONE,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::{block_index, Chunk};
    use lode_terrain::{CHUNK_SIZE_X, CHUNK_SIZE_Y};

    fn two_chunk_map() -> ChunkMap {
        let mut map = ChunkMap::new();
        map.insert(Chunk::new(ChunkCoord::new(0, 0)));
        map.wire_links(ChunkCoord::new(0, 0));
        map.insert(Chunk::new(ChunkCoord::new(1, 0)));
        map.wire_links(ChunkCoord::new(1, 0));
        map
    }

    #[test]
    fn east_step_crosses_into_linked_neighbor() {
        let map = two_chunk_map();
        let loc = BlockLocator::new(
            ChunkCoord::new(0, 0),
            block_index(CHUNK_SIZE_X - 1, 5, 20),
        );
        let east = loc.step(&map, Direction::East);
        assert_eq!(east.chunk, Some(ChunkCoord::new(1, 0)));
        assert_eq!(block_coords(east.index), (0, 5, 20));
        // And back again.
        let west = east.step(&map, Direction::West);
        assert_eq!(west, loc);
    }

    #[test]
    fn steps_off_unlinked_faces_are_absent() {
        let map = two_chunk_map();
        let loc = BlockLocator::new(ChunkCoord::new(0, 0), block_index(0, 0, 0));
        for dir in [Direction::West, Direction::South, Direction::Groundward] {
            let stepped = loc.step(&map, dir);
            assert_eq!(stepped, BlockLocator::NONE);
            assert!(stepped.block(&map).is_none());
        }
        let top = BlockLocator::new(
            ChunkCoord::new(0, 0),
            block_index(3, 3, CHUNK_SIZE_Z - 1),
        );
        assert_eq!(top.step(&map, Direction::Skyward), BlockLocator::NONE);
    }

    #[test]
    fn stepping_from_an_absent_locator_stays_absent() {
        let map = two_chunk_map();
        for dir in Direction::ALL {
            assert_eq!(BlockLocator::NONE.step(&map, dir), BlockLocator::NONE);
        }
    }

    #[test]
    fn interior_steps_are_index_arithmetic() {
        let map = two_chunk_map();
        let loc = BlockLocator::new(ChunkCoord::new(0, 0), block_index(7, 7, 50));
        for (dir, expect) in [
            (Direction::East, (8, 7, 50)),
            (Direction::West, (6, 7, 50)),
            (Direction::North, (7, 8, 50)),
            (Direction::South, (7, 6, 50)),
            (Direction::Skyward, (7, 7, 51)),
            (Direction::Groundward, (7, 7, 49)),
        ] {
            let stepped = loc.step(&map, dir);
            assert_eq!(stepped.chunk, Some(ChunkCoord::new(0, 0)));
            assert_eq!(block_coords(stepped.index), expect);
        }
    }

    #[test]
    fn north_south_wrap_on_the_perpendicular_axis() {
        let mut map = ChunkMap::new();
        map.insert(Chunk::new(ChunkCoord::new(0, 0)));
        map.wire_links(ChunkCoord::new(0, 0));
        map.insert(Chunk::new(ChunkCoord::new(0, 1)));
        map.wire_links(ChunkCoord::new(0, 1));

        let loc = BlockLocator::new(
            ChunkCoord::new(0, 0),
            block_index(9, CHUNK_SIZE_Y - 1, 33),
        );
        let north = loc.step(&map, Direction::North);
        assert_eq!(north.chunk, Some(ChunkCoord::new(0, 1)));
        assert_eq!(block_coords(north.index), (9, 0, 33));
    }
}
