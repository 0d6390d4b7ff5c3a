use super::*;

/// Everything a request handler may touch. Nothing here reaches into the world.
#[derive(Clone)]
pub(crate) struct AppState {
    pub(crate) queue: Arc<WorkQueue<RoomTask>>,
    pub(crate) snapshot: Arc<RwLock<RoomState>>,
}

impl AppState {
    pub(crate) fn new(queue: &RoomTaskQueue, snapshot: &SharedSnapshot) -> Self {
        Self {
            queue: queue.0.clone(),
            snapshot: snapshot.0.clone(),
        }
    }
}
