#[cfg(test)]
mod tests;

use super::*;
use crate::components::{despawn_tagged, RoomTag};
use crate::effects::{spawn_disco, spawn_sun, spawn_welcome};

/// Apply every task queued before this tick, oldest first.
///
/// Tasks queued while the batch runs (by the HTTP thread or by a task itself)
/// wait for the next tick.
pub(super) fn drain_room_tasks(world: &mut World) {
    let Some(queue) = world.get_resource::<RoomTaskQueue>().map(|q| q.0.clone()) else {
        return;
    };
    let batch = queue.drain_pending();
    if batch.is_empty() {
        return;
    }

    let mut rng = rand::thread_rng();
    for task in batch {
        run_task(world, &queue, task, &mut rng);
    }
}

pub(super) fn run_task(
    world: &mut World,
    queue: &WorkQueue<RoomTask>,
    task: RoomTask,
    rng: &mut impl rand::Rng,
) {
    debug!("[Room] running {:?}", task);
    match task {
        RoomTask::CreateSun => spawn_sun(world),
        RoomTask::CreateDisco => spawn_disco(world, rng),
        RoomTask::CreateWelcomePhase1 => queue.push(RoomTask::CreateWelcomePhase2),
        RoomTask::CreateWelcomePhase2 => spawn_welcome(world),
        RoomTask::RemoveByTag(tag) => {
            let removed = despawn_tagged(world, &tag);
            debug!("[Room] removed {} objects tagged {:?}", removed, tag);
        }
    }
}

/// Publish tag counts for `GET /state`.
pub(super) fn update_snapshot(
    tags: Query<&RoomTag>,
    shared: Res<SharedSnapshot>,
    mut tick: Local<u64>,
) {
    *tick += 1;
    let mut active_tags = BTreeMap::new();
    for tag in tags.iter() {
        *active_tags.entry(tag.0.clone()).or_insert(0) += 1;
    }
    if let Ok(mut snap) = shared.0.try_write() {
        snap.tick = *tick;
        snap.active_tags = active_tags;
    }
}

/// Stop the listener as soon as the app asks to exit, ahead of world teardown.
pub(super) fn stop_bridge_on_exit(
    mut exits: EventReader<AppExit>,
    bridge: Option<ResMut<CommandBridge>>,
) {
    if exits.read().next().is_none() {
        return;
    }
    if let Some(mut bridge) = bridge.filter(|b| b.is_running()) {
        bridge.shutdown();
    }
}
