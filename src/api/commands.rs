use super::*;

/// Deferred world mutations produced by the listener thread and applied by
/// `drain_room_tasks` on the update thread. Variants carry plain values only.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum RoomTask {
    CreateSun,
    CreateDisco,
    /// Schedules `CreateWelcomePhase2`, so the welcome box appears a tick later.
    CreateWelcomePhase1,
    CreateWelcomePhase2,
    RemoveByTag(String),
}

/// The queue shared between the bridge and the update loop.
#[derive(Resource, Clone, Default)]
pub struct RoomTaskQueue(pub Arc<WorkQueue<RoomTask>>);

/// Room summary refreshed every frame for `GET /state`.
#[derive(Resource, Clone, Default)]
pub struct SharedSnapshot(pub Arc<RwLock<RoomState>>);
