//! TOML-facing definitions for registry loading.

use serde::Deserialize;

#[derive(Debug, Deserialize)]
pub struct BlocksConfig {
    pub blocks: Vec<BlockDef>,
}

/// One `[[blocks]]` entry. Omitted fields fall back to an ordinary solid
/// opaque cube with no emission.
#[derive(Debug, Deserialize)]
pub struct BlockDef {
    pub name: String,
    pub visible: Option<bool>,
    pub solid: Option<bool>,
    pub opaque: Option<bool>,
    pub water: Option<bool>,
    pub emission: Option<u8>,
    pub top: Option<[u16; 2]>,
    pub side: Option<[u16; 2]>,
    pub bottom: Option<[u16; 2]>,
}
