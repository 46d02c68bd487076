use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use lode::{World, WorldConfig};
use lode_blocks::BlockRegistry;
use lode_chunk::ChunkState;
use lode_geom::Vec3;
use lode_structures::TemplateRegistry;
use lode_terrain::{ChunkCoord, SEA_LEVEL};

const SEED: u32 = 12345;

fn test_config(save_root: &Path) -> WorldConfig {
    WorldConfig {
        world_seed: SEED,
        activation_radius: 40.0,
        max_chunks: 64,
        world_time_scale: 200.0,
        save_root: save_root.to_path_buf(),
    }
}

fn build_world(save_root: &Path) -> World {
    let reg = Arc::new(BlockRegistry::builtin());
    let templates = Arc::new(TemplateRegistry::builtin(&reg));
    World::new(&test_config(save_root), reg, templates)
}

/// Steps the world (observer fixed) until `want` chunks are active.
fn step_until_active(world: &mut World, observer: Vec3, want: usize) {
    for _ in 0..2000 {
        world.step(observer, 1.0 / 60.0);
        assert_eq!(world.lighting.queued(), 0, "step must drain lighting");
        if world.active_chunks() >= want {
            return;
        }
        std::thread::sleep(Duration::from_millis(2));
    }
    panic!(
        "only {} chunks active, wanted {want}",
        world.active_chunks()
    );
}

#[test]
fn activation_wires_neighbors_symmetrically() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = build_world(dir.path());
    let observer = Vec3::new(16.0, 8.0, 90.0);
    step_until_active(&mut world, observer, 6);

    let a = ChunkCoord::new(0, 0);
    let b = ChunkCoord::new(1, 0);
    let map = world.chunk_map();
    let ca = map.get(a).expect("chunk (0,0) active");
    let cb = map.get(b).expect("chunk (1,0) active");
    assert_eq!(ca.links.east, Some(b));
    assert_eq!(cb.links.west, Some(a));
    assert_eq!(ca.state.load(), ChunkState::Active);
    assert_eq!(cb.state.load(), ChunkState::Active);
}

#[test]
fn active_and_pending_sets_stay_disjoint() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = build_world(dir.path());
    let observer = Vec3::new(8.0, 8.0, 90.0);
    for _ in 0..200 {
        world.step(observer, 1.0 / 60.0);
        // The invariant itself: nothing active is also pending.
        for coord in world.chunk_map().coords() {
            assert!(!world.is_pending(coord), "{coord:?} both active and pending");
        }
        assert!(world.active_chunks() + world.pending_chunks() <= 64);
        std::thread::sleep(Duration::from_millis(1));
    }
}

#[test]
fn surface_is_lit_and_raycastable() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = build_world(dir.path());
    let observer = Vec3::new(8.0, 8.0, 90.0);
    step_until_active(&mut world, observer, 1);

    let hit = world.raycast(Vec3::new(8.5, 8.5, 120.0), Vec3::GROUNDWARD, 128.0);
    assert!(hit.impacted, "a downward ray must strike terrain");
    assert_eq!(hit.normal, Vec3::SKYWARD);
    assert!(hit.block.is_some());

    // The first open cell above the strike is sky-exposed and fully lit.
    let above = hit.position + Vec3::SKYWARD * 0.5;
    let block = world.block_at(above).expect("cell above impact");
    if !block.is_water() {
        assert!(block.is_sky());
        assert_eq!(block.outdoor_light(), 15);
    }
}

#[test]
fn dig_edit_survives_deactivation_and_reload() {
    let dir = tempfile::tempdir().unwrap();
    let observer = Vec3::new(8.0, 8.0, 90.0);

    let dug_at;
    {
        let mut world = build_world(dir.path());
        step_until_active(&mut world, observer, 1);

        let hit = world.raycast(Vec3::new(8.5, 8.5, 120.0), Vec3::GROUNDWARD, 128.0);
        assert!(hit.impacted);
        dug_at = hit.block.world_center().unwrap();
        assert!(world.dig_block(dug_at));
        world.step(observer, 1.0 / 60.0);

        let block = world.block_at(dug_at).unwrap();
        assert!(!block.is_solid());
        // The dug cell sits under open sky, so it converges to full outdoor
        // light within the step's propagation pass.
        if block.is_sky() {
            assert_eq!(block.outdoor_light(), 15);
        }
        // World drops here: dirty chunks save to disk.
    }

    let mut reloaded = build_world(dir.path());
    step_until_active(&mut reloaded, observer, 1);
    for _ in 0..200 {
        if reloaded.block_at(dug_at).is_some() {
            break;
        }
        reloaded.step(observer, 1.0 / 60.0);
        std::thread::sleep(Duration::from_millis(2));
    }
    let block = reloaded.block_at(dug_at).expect("dug cell loaded");
    assert!(!block.is_solid(), "edit must persist through save/load");
}

#[test]
fn placed_glowstone_casts_indoor_light() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = build_world(dir.path());
    let observer = Vec3::new(8.0, 8.0, 90.0);
    step_until_active(&mut world, observer, 1);

    let hit = world.raycast(Vec3::new(8.5, 8.5, 120.0), Vec3::GROUNDWARD, 128.0);
    assert!(hit.impacted);
    let above = hit.position + Vec3::SKYWARD * 0.5;
    let reg = BlockRegistry::builtin();
    assert!(world.add_block(above, reg.expect_id("glowstone")));
    world.step(observer, 1.0 / 60.0);

    let lateral = above + Vec3::EAST;
    if let Some(neighbor) = world.block_at(lateral) {
        if !neighbor.is_opaque() {
            assert_eq!(neighbor.indoor_light(), 14);
        }
    }
}

#[test]
fn observer_leaving_sheds_far_chunks() {
    let dir = tempfile::tempdir().unwrap();
    let mut world = build_world(dir.path());
    let near = Vec3::new(8.0, 8.0, 90.0);
    step_until_active(&mut world, near, 4);
    assert!(world.chunk_map().contains(ChunkCoord::new(0, 0)));

    // Jump far east; (0,0) is now well outside the deactivation radius and
    // gets shed one chunk per step once nothing new activates.
    let far = Vec3::new(2000.0, 8.0, 90.0);
    for _ in 0..2000 {
        world.step(far, 1.0 / 60.0);
        if !world.chunk_map().contains(ChunkCoord::new(0, 0)) {
            return;
        }
        std::thread::sleep(Duration::from_millis(1));
    }
    panic!("chunk (0,0) never deactivated");
}

#[test]
fn sea_level_terrain_obeys_biome_rules() {
    // The §8 scenario: seed 12345, chunk (0,0), column (8,8).
    let reg = BlockRegistry::builtin();
    let templates = TemplateRegistry::builtin(&reg);
    let terrain = lode_terrain::TerrainGen::new(SEED);
    let mut chunk = lode_chunk::Chunk::new(ChunkCoord::new(0, 0));
    chunk.generate(&terrain, &reg, &templates);

    let col = terrain.column(8, 8);
    let h = col.height;
    assert!(h > 0 && h < 128, "seed 12345 keeps (8,8) inside the world");
    let surface = chunk.blocks[lode_chunk::block_index(8, 8, h as usize)];
    let name = reg.get(surface.type_id).unwrap().name.clone();
    let organic = [
        "grass", "sand", "oak_log", "oak_leaf", "spruce_log", "spruce_leaf", "cactus",
    ];
    if h >= SEA_LEVEL {
        if col.humidity < 0.4 {
            // Dry surfaces sand over, apart from stamped vegetation.
            assert_ne!(name, "grass");
        }
        assert!(organic.contains(&name.as_str()), "surface was {name}");
    } else {
        // Submerged column: water (or ice when cold) sits above the surface.
        let above = chunk.blocks[lode_chunk::block_index(8, 8, (h + 1) as usize)];
        let above_name = reg.get(above.type_id).unwrap().name.clone();
        if col.temperature < 0.4 {
            assert_eq!(above_name, "ice");
        } else {
            assert_eq!(above_name, "water");
        }
    }
}
