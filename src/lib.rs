//! Streaming voxel world simulation core: chunk lifecycle, lighting,
//! persistence, and raycast queries, independent of any presentation layer.
#![forbid(unsafe_code)]

pub mod config;
pub mod daycycle;
pub mod metrics;
pub mod raycast;
pub mod world;

pub use config::WorldConfig;
pub use daycycle::{DayCycle, SkyState};
pub use metrics::WorldMetrics;
pub use raycast::{raycast_blocks, RaycastResult};
pub use world::World;
