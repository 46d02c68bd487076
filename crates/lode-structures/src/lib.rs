//! Reusable multi-voxel patterns stamped after base terrain generation.
#![forbid(unsafe_code)]

use std::collections::HashMap;
use std::sync::Arc;

use lode_blocks::{BlockRegistry, BlockTypeId};

/// One cell of a template, relative to its root.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub struct TemplateEntry {
    pub dx: i32,
    pub dy: i32,
    pub dz: i32,
    pub block: BlockTypeId,
}

#[derive(Clone, Debug)]
pub struct BlockTemplate {
    pub entries: Vec<TemplateEntry>,
}

/// A deferred placement produced during generation. The root is in chunk-local
/// coordinates and may lie outside the chunk; out-of-bounds cells are dropped
/// at stamp time.
#[derive(Clone, Debug)]
pub struct TemplateStamp {
    pub root: (i32, i32, i32),
    pub template: Arc<BlockTemplate>,
}

/// Name-keyed template table, built once at startup and immutable after.
#[derive(Clone, Debug, Default)]
pub struct TemplateRegistry {
    templates: HashMap<String, Arc<BlockTemplate>>,
}

impl TemplateRegistry {
    /// The three vegetation species the generator places.
    pub fn builtin(reg: &BlockRegistry) -> Self {
        let mut templates = TemplateRegistry::default();
        templates.insert("cactus", cactus(reg));
        templates.insert("oak", oak(reg));
        templates.insert("spruce", spruce(reg));
        templates
    }

    pub fn insert(&mut self, name: &str, template: BlockTemplate) {
        self.templates.insert(name.to_string(), Arc::new(template));
    }

    pub fn get(&self, name: &str) -> Option<Arc<BlockTemplate>> {
        self.templates.get(name).cloned()
    }

    /// Startup-time lookup; an unknown template name is a configuration defect.
    pub fn expect(&self, name: &str) -> Arc<BlockTemplate> {
        match self.get(name) {
            Some(t) => t,
            None => panic!("undefined block template \"{name}\""),
        }
    }

    pub fn len(&self) -> usize {
        self.templates.len()
    }

    pub fn is_empty(&self) -> bool {
        self.templates.is_empty()
    }
}

fn column(block: BlockTypeId, height: i32) -> Vec<TemplateEntry> {
    (0..height)
        .map(|dz| TemplateEntry {
            dx: 0,
            dy: 0,
            dz,
            block,
        })
        .collect()
}

fn cactus(reg: &BlockRegistry) -> BlockTemplate {
    BlockTemplate {
        entries: column(reg.expect_id("cactus"), 3),
    }
}

fn oak(reg: &BlockRegistry) -> BlockTemplate {
    let log = reg.expect_id("oak_log");
    let leaf = reg.expect_id("oak_leaf");
    let mut entries = column(log, 7);
    let mut push = |dx: i32, dy: i32, dz: i32| {
        entries.push(TemplateEntry {
            dx,
            dy,
            dz,
            block: leaf,
        });
    };
    // Canopy ring at trunk height 3: everything within Chebyshev distance 1,
    // plus the axis cells and near-diagonals at distance 2.
    for (dx, dy) in [
        (1, 0),
        (1, 1),
        (1, -1),
        (-1, -1),
        (-1, 0),
        (-1, 1),
        (0, 1),
        (0, -1),
        (2, 0),
        (-2, 0),
        (0, 2),
        (0, -2),
        (2, 1),
        (2, -1),
        (-2, 1),
        (-2, -1),
        (-1, -2),
        (-1, 2),
        (1, -2),
        (1, 2),
    ] {
        push(dx, dy, 3);
    }
    // Narrow crown up the remaining trunk.
    for dz in 4..7 {
        push(1, 0, dz);
        push(-1, 0, dz);
        push(0, 1, dz);
        push(0, -1, dz);
    }
    BlockTemplate { entries }
}

fn spruce(reg: &BlockRegistry) -> BlockTemplate {
    let log = reg.expect_id("spruce_log");
    let leaf = reg.expect_id("spruce_leaf");
    let mut entries = column(log, 8);
    for dz in 3..8 {
        for (dx, dy) in [(1, 0), (-1, 0), (0, 1), (0, -1)] {
            entries.push(TemplateEntry {
                dx,
                dy,
                dz,
                block: leaf,
            });
        }
    }
    BlockTemplate { entries }
}
