use bevy::prelude::*;

/// True when running without a window (no meshes, materials or textures).
#[derive(Resource, Clone, Copy, Default)]
pub struct HeadlessMode(pub bool);

/// Per-frame ordering: queued tasks are applied before the camera moves.
#[derive(SystemSet, Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TickSet {
    DrainTasks,
    Camera,
}

/// Groups the entities an effect spawned so they can be removed together.
#[derive(Component, Clone, Debug, PartialEq, Eq)]
pub struct RoomTag(pub String);

impl RoomTag {
    pub fn new(tag: impl Into<String>) -> Self {
        Self(tag.into())
    }
}

/// Marks the static mushrooms scattered across the floor.
#[derive(Component)]
pub struct Mushroom;

/// Collect every entity whose tag equals `tag`.
pub fn entities_with_tag(world: &mut World, tag: &str) -> Vec<Entity> {
    let mut query = world.query::<(Entity, &RoomTag)>();
    query
        .iter(world)
        .filter(|(_, t)| t.0 == tag)
        .map(|(e, _)| e)
        .collect()
}

/// Despawn every entity carrying `tag` together with its children.
/// Returns how many tagged roots were removed.
pub fn despawn_tagged(world: &mut World, tag: &str) -> usize {
    let entities = entities_with_tag(world, tag);
    for entity in &entities {
        if let Ok(entity_mut) = world.get_entity_mut(*entity) {
            entity_mut.despawn_recursive();
        }
    }
    entities.len()
}
