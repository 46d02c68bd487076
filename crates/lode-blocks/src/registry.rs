use std::collections::HashMap;
use std::error::Error;
use std::fs;
use std::path::Path;

use crate::config::BlocksConfig;
use crate::types::{Block, BlockTypeId, TileUv, LIGHT_MAX};

/// Immutable per-type properties. Indexed by `BlockTypeId` in the registry.
#[derive(Clone, Debug)]
pub struct BlockType {
    pub name: String,
    pub is_visible: bool,
    pub is_solid: bool,
    pub is_opaque: bool,
    pub is_water: bool,
    /// Emission level in 0..=15; nonzero marks a light source.
    pub light_emission: u8,
    pub top_uv: TileUv,
    pub side_uv: TileUv,
    pub bottom_uv: TileUv,
}

/// Append-only table of block types, built once before the world exists.
/// Index 0 is always `air`.
#[derive(Clone, Debug, Default)]
pub struct BlockRegistry {
    types: Vec<BlockType>,
    by_name: HashMap<String, BlockTypeId>,
}

impl BlockRegistry {
    /// The fixed default table: terrain, ores, and the tree/cactus blocks
    /// the generator stamps.
    pub fn builtin() -> Self {
        let mut reg = BlockRegistry::default();
        let rows: &[(&str, bool, bool, bool, bool, (u16, u16), (u16, u16), (u16, u16), u8)] = &[
            ("air", false, false, false, false, (0, 0), (0, 0), (0, 0), 0),
            ("grass", true, true, true, false, (32, 33), (33, 33), (32, 34), 0),
            ("dirt", true, true, true, false, (32, 34), (32, 34), (32, 34), 0),
            ("stone", true, true, true, false, (33, 32), (33, 32), (33, 32), 0),
            ("water", true, false, false, true, (32, 44), (32, 44), (32, 44), 0),
            ("bricks", true, true, true, false, (34, 32), (34, 32), (34, 32), 0),
            ("coal", true, true, true, false, (63, 34), (63, 34), (63, 34), 0),
            ("iron", true, true, true, false, (63, 35), (63, 35), (63, 35), 0),
            ("gold", true, true, true, false, (63, 36), (63, 36), (63, 36), 0),
            ("diamond", true, true, true, false, (63, 37), (63, 37), (63, 37), 0),
            ("glowstone", true, true, true, false, (46, 34), (46, 34), (46, 34), 15),
            ("cobblestone", true, true, true, false, (42, 40), (42, 40), (42, 40), 0),
            ("ice", true, true, true, false, (36, 35), (36, 35), (36, 35), 0),
            ("sand", true, true, true, false, (34, 34), (34, 34), (34, 34), 0),
            ("oak_log", true, true, true, false, (38, 33), (36, 33), (38, 33), 0),
            ("oak_leaf", true, true, true, false, (32, 35), (32, 35), (32, 35), 0),
            ("spruce_log", true, true, true, false, (38, 33), (38, 33), (38, 33), 0),
            ("spruce_leaf", true, true, true, false, (34, 35), (34, 35), (34, 35), 0),
            ("cactus", true, true, true, false, (38, 36), (37, 36), (39, 36), 0),
            ("snowy_grass", true, true, true, false, (36, 35), (33, 35), (32, 34), 0),
        ];
        for &(name, visible, solid, opaque, water, top, side, bottom, emission) in rows {
            reg.push(BlockType {
                name: name.to_string(),
                is_visible: visible,
                is_solid: solid,
                is_opaque: opaque,
                is_water: water,
                light_emission: emission,
                top_uv: TileUv(top.0, top.1),
                side_uv: TileUv(side.0, side.1),
                bottom_uv: TileUv(bottom.0, bottom.1),
            });
        }
        reg.assert_air_first();
        reg
    }

    pub fn from_config(cfg: BlocksConfig) -> Result<Self, Box<dyn Error>> {
        let mut reg = BlockRegistry::default();
        for def in cfg.blocks {
            let emission = def.emission.unwrap_or(0);
            if emission > LIGHT_MAX {
                return Err(format!(
                    "block '{}': emission {} exceeds channel max {}",
                    def.name, emission, LIGHT_MAX
                )
                .into());
            }
            let top = def.top.unwrap_or([0, 0]);
            let side = def.side.unwrap_or(top);
            let bottom = def.bottom.unwrap_or(top);
            let solid = def.solid.unwrap_or(true);
            reg.push(BlockType {
                name: def.name,
                is_visible: def.visible.unwrap_or(true),
                is_solid: solid,
                is_opaque: def.opaque.unwrap_or(solid),
                is_water: def.water.unwrap_or(false),
                light_emission: emission,
                top_uv: TileUv(top[0], top[1]),
                side_uv: TileUv(side[0], side[1]),
                bottom_uv: TileUv(bottom[0], bottom[1]),
            });
        }
        reg.assert_air_first();
        Ok(reg)
    }

    pub fn from_toml_str(text: &str) -> Result<Self, Box<dyn Error>> {
        let cfg: BlocksConfig = toml::from_str(text)?;
        Self::from_config(cfg)
    }

    pub fn load_from_path(path: impl AsRef<Path>) -> Result<Self, Box<dyn Error>> {
        let text = fs::read_to_string(path)?;
        Self::from_toml_str(&text)
    }

    fn push(&mut self, ty: BlockType) {
        let id = self.types.len() as BlockTypeId;
        self.by_name.insert(ty.name.clone(), id);
        self.types.push(ty);
    }

    fn assert_air_first(&self) {
        let air = self.types.first();
        assert!(
            air.is_some_and(|ty| ty.name == "air"
                && !ty.is_visible
                && !ty.is_solid
                && !ty.is_opaque
                && !ty.is_water
                && ty.light_emission == 0),
            "block registry must start with an inert 'air' entry"
        );
    }

    #[inline]
    pub fn get(&self, id: BlockTypeId) -> Option<&BlockType> {
        self.types.get(id as usize)
    }

    pub fn id_by_name(&self, name: &str) -> Option<BlockTypeId> {
        self.by_name.get(name).copied()
    }

    /// Startup-time lookup; an unknown name is a configuration defect.
    pub fn expect_id(&self, name: &str) -> BlockTypeId {
        match self.id_by_name(name) {
            Some(id) => id,
            None => panic!("undefined block type \"{name}\""),
        }
    }

    /// Constructs a block of the given type with registry-derived flags and
    /// cleared simulation state.
    pub fn make(&self, id: BlockTypeId) -> Block {
        let ty = self
            .get(id)
            .unwrap_or_else(|| panic!("block type id {id} out of range"));
        let mut b = Block::INVALID;
        b.set_type(id, ty);
        b
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.types.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.types.is_empty()
    }

    /// Emission for a block's type; 0 for the invalid sentinel.
    #[inline]
    pub fn emission_of(&self, block: Block) -> u8 {
        self.get(block.type_id).map_or(0, |ty| ty.light_emission)
    }
}
