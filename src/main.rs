mod animation;
mod api;
mod camera;
mod components;
mod config;
mod effects;
mod scene;
mod work_queue;

use bevy::prelude::*;
use components::{HeadlessMode, TickSet};
use config::RoomSettings;

fn main() {
    let args: Vec<String> = std::env::args().collect();
    let headless = args.iter().any(|a| a == "--headless");
    let no_api = args.iter().any(|a| a == "--no-api");

    let settings = RoomSettings::from_env(config::load_startup_config());
    let mut app = App::new();

    app.insert_resource(HeadlessMode(headless));

    if headless {
        // No window, no rendering: the scene graph, task queue and API only.
        app.add_plugins(MinimalPlugins);
        app.add_plugins(bevy::log::LogPlugin::default());
        info!("[Room] starting in HEADLESS mode");
    } else {
        app.add_plugins(
            DefaultPlugins
                .set(WindowPlugin {
                    primary_window: Some(Window {
                        title: settings.window_title.clone(),
                        resolution: settings.window_size.into(),
                        present_mode: bevy::window::PresentMode::AutoVsync,
                        ..default()
                    }),
                    ..default()
                })
                .set(bevy::asset::AssetPlugin {
                    file_path: settings.assets_dir.clone(),
                    ..default()
                }),
        );
        info!("[Room] starting in WINDOWED mode");
    }

    app.insert_resource(settings.scene.clone())
        .configure_sets(Update, (TickSet::DrainTasks, TickSet::Camera).chain())
        .add_plugins(scene::ScenePlugin)
        .add_plugins(animation::AnimationPlugin)
        .add_plugins(effects::EffectsPlugin)
        .add_plugins(camera::CameraPlugin)
        .add_plugins(api::ApiPlugin {
            bridge: (!no_api).then(|| settings.bridge_config()),
        });

    app.run();
}
