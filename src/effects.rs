use bevy::pbr::{light_consts, CascadeShadowConfigBuilder, DistanceFog, FogFalloff};
use bevy::prelude::*;
use rand::seq::SliceRandom;
use rand::Rng;

use crate::animation::{KeyframeAnimation, Track};
use crate::components::RoomTag;
use crate::scene::RoomCamera;

pub struct EffectsPlugin;

impl Plugin for EffectsPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(PostUpdate, sync_ambient_zone);
    }
}

/// The switchable effects. The tag of every entity an effect spawns is its name.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Effect {
    Sun,
    Disco,
    Welcome,
}

impl Effect {
    pub const ALL: [Effect; 3] = [Effect::Sun, Effect::Disco, Effect::Welcome];

    pub fn tag(self) -> &'static str {
        match self {
            Effect::Sun => "sun",
            Effect::Disco => "disco",
            Effect::Welcome => "welcome",
        }
    }

    pub fn from_tag(tag: &str) -> Option<Self> {
        Self::ALL.into_iter().find(|e| e.tag() == tag)
    }
}

pub const DISCO_FOLLOWERS: usize = 20;
const FOLLOWER_WAYPOINTS: usize = 20;
const DISCO_LIGHT_RANGE: f32 = 10.0;
const DISCO_LIGHT_LUMENS: f32 = 400_000.0;
const WELCOME_TEXTURE: &str = "textures/welcome.png";

/// Ambient/fog settings contributed by the sun effect while it exists.
#[derive(Component, Clone, Copy, Debug, PartialEq)]
pub struct AmbientZone {
    pub ambient: Color,
    pub fog: Color,
    pub fog_start: f32,
    pub fog_end: f32,
}

impl AmbientZone {
    fn sunny() -> Self {
        Self {
            ambient: Color::srgb(0.5, 0.5, 0.5),
            fog: Color::srgb(0.4, 0.5, 0.8),
            fog_start: 100.0,
            fog_end: 300.0,
        }
    }
}

/// Lighting of the room with no zone active.
const DARK_AMBIENT: Color = Color::srgb(0.05, 0.05, 0.08);
const DARK_CLEAR: Color = Color::srgb(0.02, 0.02, 0.03);
const DARK_AMBIENT_BRIGHTNESS: f32 = 80.0;
const SUN_AMBIENT_BRIGHTNESS: f32 = 500.0;

/// Attach a mesh and material when the render asset stores exist (windowed mode).
pub(crate) fn attach_mesh(
    world: &mut World,
    entity: Entity,
    mesh: impl Into<Mesh>,
    material: StandardMaterial,
) {
    let Some(mesh) = world
        .get_resource_mut::<Assets<Mesh>>()
        .map(|mut meshes| meshes.add(mesh.into()))
    else {
        return;
    };
    let Some(material) = world
        .get_resource_mut::<Assets<StandardMaterial>>()
        .map(|mut materials| materials.add(material))
    else {
        return;
    };
    world
        .entity_mut(entity)
        .insert((Mesh3d(mesh), MeshMaterial3d(material)));
}

pub fn spawn_sun(world: &mut World) {
    let tag = Effect::Sun.tag();
    world.spawn((Name::new("Zone"), RoomTag::new(tag), AmbientZone::sunny()));

    let sky = world
        .spawn((
            Name::new("SkyNode"),
            RoomTag::new(tag),
            Transform::from_scale(Vec3::splat(500.0)),
        ))
        .id();
    attach_mesh(
        world,
        sky,
        Cuboid::new(1.0, 1.0, 1.0),
        StandardMaterial {
            base_color: AmbientZone::sunny().fog,
            unlit: true,
            cull_mode: None,
            fog_enabled: false,
            ..default()
        },
    );

    world.spawn((
        Name::new("DirectionalLight"),
        RoomTag::new(tag),
        DirectionalLight {
            color: Color::srgb(0.5, 0.5, 0.5),
            illuminance: light_consts::lux::OVERCAST_DAY,
            shadows_enabled: true,
            ..default()
        },
        CascadeShadowConfigBuilder {
            first_cascade_far_bound: 10.0,
            maximum_distance: 200.0,
            ..default()
        }
        .build(),
        Transform::default().looking_to(Vec3::new(0.6, -1.0, 0.8), Vec3::Y),
    ));
}

fn disco_palette() -> Vec<LinearRgba> {
    vec![
        LinearRgba::rgb(1.0, 1.0, 1.0),
        LinearRgba::rgb(0.5, 0.5, 0.5),
        LinearRgba::rgb(1.0, 0.0, 0.0),
        LinearRgba::rgb(0.0, 1.0, 0.0),
        LinearRgba::rgb(0.0, 0.0, 1.0),
        LinearRgba::rgb(0.0, 1.0, 1.0),
        LinearRgba::rgb(1.0, 0.0, 1.0),
        LinearRgba::rgb(1.0, 1.0, 0.0),
    ]
}

/// The lead light circles a fixed square, one edge per second.
pub(crate) fn disco_leader_animation() -> KeyframeAnimation {
    let translation = Track::spline(0.7)
        .with_key(0.0, Vec3::new(-30.0, 5.0, -30.0))
        .with_key(1.0, Vec3::new(30.0, 5.0, -30.0))
        .with_key(2.0, Vec3::new(30.0, 5.0, 30.0))
        .with_key(3.0, Vec3::new(-30.0, 5.0, 30.0))
        .with_key(4.0, Vec3::new(-30.0, 5.0, -30.0));
    let light_color = Track::linear()
        .with_key(0.0, LinearRgba::rgb(1.0, 1.0, 1.0))
        .with_key(1.0, LinearRgba::rgb(1.0, 0.0, 0.0))
        .with_key(2.0, LinearRgba::rgb(1.0, 1.0, 0.0))
        .with_key(3.0, LinearRgba::rgb(0.0, 1.0, 0.0))
        .with_key(4.0, LinearRgba::rgb(1.0, 1.0, 1.0));
    KeyframeAnimation {
        translation: Some(translation),
        light_color: Some(light_color),
        ..default()
    }
}

/// A follower wanders through random points and returns to its start so the
/// loop has no seam.
pub(crate) fn disco_follower_animation(rng: &mut impl Rng) -> KeyframeAnimation {
    let mut translation = Track::spline(0.7);
    let mut t = 0.0;
    let mut start = None;
    for _ in 0..FOLLOWER_WAYPOINTS {
        let point = Vec3::new(
            rng.gen_range(-60.0..60.0),
            3.0,
            rng.gen_range(-60.0..60.0),
        );
        start.get_or_insert(point);
        translation.set_key(t, point);
        t += rng.gen::<f32>() * 3.0 + 0.5;
    }
    if let Some(start) = start {
        translation.set_key(t, start);
    }

    let mut palette = disco_palette();
    palette.shuffle(rng);
    let mut light_color = Track::linear();
    for (j, color) in palette.into_iter().enumerate() {
        light_color.set_key(j as f32 + rng.gen::<f32>() * 0.5, color);
    }

    KeyframeAnimation {
        translation: Some(translation),
        light_color: Some(light_color),
        ..default()
    }
}

fn spawn_disco_light(world: &mut World, animation: KeyframeAnimation) -> Entity {
    let position = animation
        .translation
        .as_ref()
        .and_then(|track| track.sample(0.0))
        .unwrap_or_default();
    world
        .spawn((
            Name::new("PointLight"),
            RoomTag::new(Effect::Disco.tag()),
            PointLight {
                range: DISCO_LIGHT_RANGE,
                intensity: DISCO_LIGHT_LUMENS,
                ..default()
            },
            Transform::from_translation(position),
            animation,
        ))
        .id()
}

pub fn spawn_disco(world: &mut World, rng: &mut impl Rng) {
    spawn_disco_light(world, disco_leader_animation());
    for _ in 0..DISCO_FOLLOWERS {
        let animation = disco_follower_animation(rng);
        spawn_disco_light(world, animation);
    }
}

pub(crate) fn welcome_animation() -> KeyframeAnimation {
    KeyframeAnimation {
        yaw_degrees: Some(
            Track::linear()
                .with_key(0.0, 0.0)
                .with_key(3.0, 180.0)
                .with_key(6.0, 360.0),
        ),
        translation: Some(
            Track::spline(0.5)
                .with_key(0.0, Vec3::new(0.0, 10.0, 0.0))
                .with_key(2.5, Vec3::new(0.0, 20.0, 0.0))
                .with_key(5.0, Vec3::new(0.0, 10.0, 0.0)),
        ),
        ..default()
    }
}

pub fn spawn_welcome(world: &mut World) {
    let entity = world
        .spawn((
            Name::new("WelcomeNode"),
            RoomTag::new(Effect::Welcome.tag()),
            Transform::from_xyz(0.0, 10.0, 0.0).with_scale(Vec3::splat(10.0)),
            welcome_animation(),
        ))
        .id();

    let texture = world
        .get_resource::<AssetServer>()
        .map(|assets| assets.load::<Image>(WELCOME_TEXTURE));
    attach_mesh(
        world,
        entity,
        Cuboid::new(1.0, 1.0, 1.0),
        StandardMaterial {
            base_color_texture: texture,
            depth_bias: 1.0,
            ..default()
        },
    );
}

/// Apply the active zone (if any) to the ambient light, clear colour and camera fog.
fn sync_ambient_zone(
    mut commands: Commands,
    zones: Query<&AmbientZone>,
    cameras: Query<Entity, With<RoomCamera>>,
    ambient: Option<ResMut<AmbientLight>>,
    clear: Option<ResMut<ClearColor>>,
    mut applied: Local<Option<Option<AmbientZone>>>,
) {
    let zone = zones.iter().next().copied();
    if *applied == Some(zone) {
        return;
    }
    *applied = Some(zone);

    if let Some(mut ambient) = ambient {
        match zone {
            Some(z) => {
                ambient.color = z.ambient;
                ambient.brightness = SUN_AMBIENT_BRIGHTNESS;
            }
            None => {
                ambient.color = DARK_AMBIENT;
                ambient.brightness = DARK_AMBIENT_BRIGHTNESS;
            }
        }
    }
    if let Some(mut clear) = clear {
        clear.0 = zone.map_or(DARK_CLEAR, |z| z.fog);
    }
    for camera in cameras.iter() {
        match zone {
            Some(z) => {
                commands.entity(camera).insert(DistanceFog {
                    color: z.fog,
                    falloff: FogFalloff::Linear {
                        start: z.fog_start,
                        end: z.fog_end,
                    },
                    ..default()
                });
            }
            None => {
                commands.entity(camera).remove::<DistanceFog>();
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::entities_with_tag;
    use rand::rngs::SmallRng;
    use rand::SeedableRng;

    #[test]
    fn effect_tags_round_trip() {
        for effect in Effect::ALL {
            assert_eq!(Effect::from_tag(effect.tag()), Some(effect));
        }
        assert_eq!(Effect::from_tag("lamp"), None);
    }

    #[test]
    fn disco_spawns_leader_and_followers_tagged_disco() {
        let mut world = World::new();
        let mut rng = SmallRng::seed_from_u64(7);
        spawn_disco(&mut world, &mut rng);
        assert_eq!(
            entities_with_tag(&mut world, "disco").len(),
            DISCO_FOLLOWERS + 1
        );
    }

    #[test]
    fn follower_path_loops_back_to_its_start() {
        let mut rng = SmallRng::seed_from_u64(42);
        let anim = disco_follower_animation(&mut rng);
        let track = anim.translation.expect("translation track");
        let keys = track.keys();
        assert_eq!(keys.len(), FOLLOWER_WAYPOINTS + 1);
        assert_eq!(keys.first().map(|k| k.1), keys.last().map(|k| k.1));
        for (_, p) in keys {
            assert!(p.x >= -60.0 && p.x <= 60.0);
            assert!(p.z >= -60.0 && p.z <= 60.0);
            assert_eq!(p.y, 3.0);
        }
        let colors = anim.light_color.expect("color track");
        assert_eq!(colors.keys().len(), 8);
    }

    #[test]
    fn sun_spawns_zone_sky_and_light() {
        let mut world = World::new();
        spawn_sun(&mut world);
        assert_eq!(entities_with_tag(&mut world, "sun").len(), 3);
        let mut zones = world.query::<&AmbientZone>();
        assert_eq!(zones.iter(&world).count(), 1);
    }

    #[test]
    fn welcome_spawns_one_animated_box() {
        let mut world = World::new();
        spawn_welcome(&mut world);
        let tagged = entities_with_tag(&mut world, "welcome");
        assert_eq!(tagged.len(), 1);
        assert!(world.get::<KeyframeAnimation>(tagged[0]).is_some());
    }

    #[test]
    fn ambient_follows_zone_lifetime() {
        let mut app = App::new();
        app.insert_resource(AmbientLight::default())
            .insert_resource(ClearColor::default())
            .add_systems(Update, sync_ambient_zone);
        let camera = app.world_mut().spawn(RoomCamera).id();

        app.update();
        assert_eq!(app.world().resource::<AmbientLight>().color, DARK_AMBIENT);
        assert!(app.world().get::<DistanceFog>(camera).is_none());

        let zone = app.world_mut().spawn(AmbientZone::sunny()).id();
        app.update();
        assert_eq!(
            app.world().resource::<AmbientLight>().color,
            AmbientZone::sunny().ambient
        );
        assert!(app.world().get::<DistanceFog>(camera).is_some());

        app.world_mut().despawn(zone);
        app.update();
        assert_eq!(app.world().resource::<ClearColor>().0, DARK_CLEAR);
        assert!(app.world().get::<DistanceFog>(camera).is_none());
    }
}
