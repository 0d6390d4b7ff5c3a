use bevy::prelude::*;
use rand::rngs::SmallRng;
use rand::{Rng, SeedableRng};

use crate::camera::FlyCamera;
use crate::components::{HeadlessMode, Mushroom};

pub struct ScenePlugin;

impl Plugin for ScenePlugin {
    fn build(&self, app: &mut App) {
        app.init_resource::<SceneConfig>()
            .add_systems(Startup, setup_room);
    }
}

#[derive(Resource, Clone, Debug)]
pub struct SceneConfig {
    pub mushroom_count: usize,
    pub seed: u64,
}

impl Default for SceneConfig {
    fn default() -> Self {
        Self {
            mushroom_count: 200,
            seed: 0x5eed,
        }
    }
}

/// The camera the room is viewed through.
#[derive(Component)]
pub struct RoomCamera;

pub const CAMERA_START: Vec3 = Vec3::new(0.0, 5.0, 0.0);
const FLOOR_SIZE: f32 = 100.0;
const SCATTER_HALF_EXTENT: f32 = 45.0;

struct MushroomVisuals {
    stem: Handle<Mesh>,
    cap: Handle<Mesh>,
    stem_material: Handle<StandardMaterial>,
    cap_material: Handle<StandardMaterial>,
}

fn setup_room(
    mut commands: Commands,
    config: Res<SceneConfig>,
    headless: Option<Res<HeadlessMode>>,
    meshes: Option<ResMut<Assets<Mesh>>>,
    materials: Option<ResMut<Assets<StandardMaterial>>>,
) {
    let headless = headless.is_some_and(|h| h.0);

    let mut camera = commands.spawn((
        Name::new("Camera"),
        RoomCamera,
        FlyCamera::default(),
        Transform::from_translation(CAMERA_START),
    ));
    if !headless {
        camera.insert(Camera3d::default());
    }

    let visuals = match (headless, meshes, materials) {
        (false, Some(mut meshes), Some(mut materials)) => {
            commands.spawn((
                Name::new("Plane"),
                Mesh3d(meshes.add(Plane3d::default().mesh().size(FLOOR_SIZE, FLOOR_SIZE))),
                MeshMaterial3d(materials.add(StandardMaterial {
                    base_color: Color::srgb(0.45, 0.43, 0.4),
                    perceptual_roughness: 0.9,
                    ..default()
                })),
                Transform::default(),
            ));
            Some(MushroomVisuals {
                stem: meshes.add(Cylinder::new(0.08, 0.5)),
                cap: meshes.add(Sphere::new(0.3)),
                stem_material: materials.add(Color::srgb(0.9, 0.88, 0.8)),
                cap_material: materials.add(Color::srgb(0.75, 0.15, 0.1)),
            })
        }
        _ => None,
    };

    let mut rng = SmallRng::seed_from_u64(config.seed);
    for _ in 0..config.mushroom_count {
        let transform = scatter_transform(&mut rng);
        let mut mushroom = commands.spawn((Name::new("Mushroom"), Mushroom, transform));
        if let Some(v) = &visuals {
            mushroom.with_children(|parent| {
                parent.spawn((
                    Mesh3d(v.stem.clone()),
                    MeshMaterial3d(v.stem_material.clone()),
                    Transform::from_xyz(0.0, 0.25, 0.0),
                ));
                parent.spawn((
                    Mesh3d(v.cap.clone()),
                    MeshMaterial3d(v.cap_material.clone()),
                    Transform::from_xyz(0.0, 0.5, 0.0).with_scale(Vec3::new(1.0, 0.45, 1.0)),
                ));
            });
        }
    }

    info!(
        "Room ready: {} mushrooms{}",
        config.mushroom_count,
        if headless { " (headless)" } else { "" }
    );
}

fn scatter_transform(rng: &mut impl Rng) -> Transform {
    let x = rng.gen_range(-SCATTER_HALF_EXTENT..SCATTER_HALF_EXTENT);
    let z = rng.gen_range(-SCATTER_HALF_EXTENT..SCATTER_HALF_EXTENT);
    let yaw = rng.gen_range(0.0..360.0_f32).to_radians();
    let scale = 0.5 + rng.gen::<f32>() * 2.0;
    Transform::from_xyz(x, 0.0, z)
        .with_rotation(Quat::from_rotation_y(yaw))
        .with_scale(Vec3::splat(scale))
}
