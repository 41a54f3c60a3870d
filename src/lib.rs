pub mod app;
pub mod core;
pub mod debug;
pub mod gameplay;
pub mod interaction;
pub mod physics;
pub mod rendering;

// Curated re-exports
pub use app::game::{GamePlugin, PresentationPlugin};
pub use app::state::GameplayState;
pub use core::components::{CreationTime, CurrentDrop, Sphere, SphereRadius, SphereTier};
pub use core::config::GameConfig;
pub use core::tier::{BallScale, Tier, TierTable, MAX_TIER};
pub use gameplay::events::{
    DropCommand, GameOverEvent, MergeCompleted, ResetGame, RestoreSnapshot, SetBallScale,
};
pub use gameplay::snapshot::{live_sphere_snapshot, SnapshotData, SphereSnapshot};
