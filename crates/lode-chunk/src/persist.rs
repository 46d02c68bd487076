//! On-disk chunk format: fixed header followed by run-length pairs.
//!
//! `'G','C','H','K' | version | bits_x | bits_y | bits_z | seed (u32 LE) |
//! (type, count)*` — counts in 1..=255, runs covering the flattened block
//! array exactly once in index order.

use std::path::{Path, PathBuf};

use lode_blocks::{Block, BlockRegistry};
use lode_terrain::{ChunkCoord, CHUNK_BITS_X, CHUNK_BITS_Y, CHUNK_BITS_Z, CHUNK_VOLUME};
use thiserror::Error;

pub const MAGIC: [u8; 4] = *b"GCHK";
pub const FORMAT_VERSION: u8 = 2;
pub const HEADER_LEN: usize = 12;

#[derive(Debug, Error)]
pub enum LoadError {
    #[error("i/o: {0}")]
    Io(#[from] std::io::Error),
    /// The file is not of this format at all.
    #[error("not a chunk file (bad magic)")]
    BadMagic,
    #[error("chunk file too short ({0} bytes)")]
    Truncated(usize),
    #[error("chunk file version {found}, expected {expected}")]
    VersionMismatch { found: u8, expected: u8 },
    #[error("chunk file dimensions {found:?}, expected {expected:?}")]
    DimensionMismatch { found: [u8; 3], expected: [u8; 3] },
    #[error("chunk file world seed {found}, expected {expected}")]
    SeedMismatch { found: u32, expected: u32 },
    #[error("run-length payload covers {0} blocks")]
    BadRunLength(usize),
    #[error("run references unknown block type {0}")]
    UnknownBlockType(u8),
}

impl LoadError {
    /// Integrity failures, as opposed to compatibility mismatches that just
    /// mean "no usable save data".
    pub fn is_integrity_failure(&self) -> bool {
        matches!(
            self,
            LoadError::BadMagic | LoadError::BadRunLength(_) | LoadError::UnknownBlockType(_)
        )
    }

    pub fn is_missing_file(&self) -> bool {
        matches!(self, LoadError::Io(e) if e.kind() == std::io::ErrorKind::NotFound)
    }
}

/// One file per chunk coordinate per world-seed save directory.
pub fn chunk_file_path(save_root: &Path, seed: u32, coord: ChunkCoord) -> PathBuf {
    save_root
        .join(format!("World_{seed}"))
        .join(format!("chunk_{}_{}.gchk", coord.cx, coord.cy))
}

/// Serializes a block array. Panics if the emitted runs do not cover every
/// block — that is a logic defect, not a runtime condition.
pub fn encode(blocks: &[Block], seed: u32) -> Vec<u8> {
    assert!(!blocks.is_empty());
    let mut out = Vec::with_capacity(HEADER_LEN + 256);
    out.extend_from_slice(&MAGIC);
    out.push(FORMAT_VERSION);
    out.push(CHUNK_BITS_X as u8);
    out.push(CHUNK_BITS_Y as u8);
    out.push(CHUNK_BITS_Z as u8);
    out.extend_from_slice(&seed.to_le_bytes());

    let mut covered: usize = 0;
    let mut run_type = blocks[0].type_id;
    let mut run_len: u8 = 1;
    for block in &blocks[1..] {
        if run_len == u8::MAX || block.type_id != run_type {
            out.push(run_type);
            out.push(run_len);
            covered += run_len as usize;
            run_type = block.type_id;
            run_len = 1;
        } else {
            run_len += 1;
        }
    }
    out.push(run_type);
    out.push(run_len);
    covered += run_len as usize;

    assert_eq!(
        covered,
        blocks.len(),
        "run-length encoding must cover every block"
    );
    out
}

/// Parses and validates a chunk file body into freshly constructed blocks.
pub fn decode(
    bytes: &[u8],
    expected_seed: u32,
    reg: &BlockRegistry,
) -> Result<Vec<Block>, LoadError> {
    if bytes.len() < HEADER_LEN {
        return Err(LoadError::Truncated(bytes.len()));
    }
    if bytes[0..4] != MAGIC {
        return Err(LoadError::BadMagic);
    }
    if bytes[4] != FORMAT_VERSION {
        return Err(LoadError::VersionMismatch {
            found: bytes[4],
            expected: FORMAT_VERSION,
        });
    }
    let dims = [bytes[5], bytes[6], bytes[7]];
    let expected_dims = [CHUNK_BITS_X as u8, CHUNK_BITS_Y as u8, CHUNK_BITS_Z as u8];
    if dims != expected_dims {
        return Err(LoadError::DimensionMismatch {
            found: dims,
            expected: expected_dims,
        });
    }
    let seed = u32::from_le_bytes([bytes[8], bytes[9], bytes[10], bytes[11]]);
    if seed != expected_seed {
        return Err(LoadError::SeedMismatch {
            found: seed,
            expected: expected_seed,
        });
    }

    let body = &bytes[HEADER_LEN..];
    if body.len() % 2 != 0 {
        return Err(LoadError::BadRunLength(body.len()));
    }
    let mut blocks = Vec::with_capacity(CHUNK_VOLUME);
    for pair in body.chunks_exact(2) {
        let ty = pair[0];
        let count = pair[1] as usize;
        if count == 0 {
            return Err(LoadError::BadRunLength(blocks.len()));
        }
        if reg.get(ty).is_none() {
            return Err(LoadError::UnknownBlockType(ty));
        }
        if blocks.len() + count > CHUNK_VOLUME {
            return Err(LoadError::BadRunLength(blocks.len() + count));
        }
        let block = reg.make(ty);
        blocks.extend(std::iter::repeat_n(block, count));
    }
    if blocks.len() != CHUNK_VOLUME {
        return Err(LoadError::BadRunLength(blocks.len()));
    }
    Ok(blocks)
}
