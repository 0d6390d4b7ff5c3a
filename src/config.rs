use serde::Deserialize;

use crate::api::{ApiSecurity, BridgeConfig, DEFAULT_BIND_ADDR};
use crate::scene::SceneConfig;

/// Optional settings read from `room.json` (or the file named by `ROOM_CONFIG`).
#[derive(Deserialize, Default, Debug)]
pub struct StartupConfig {
    pub window_title: Option<String>,
    pub window_width: Option<f32>,
    pub window_height: Option<f32>,
    pub assets_dir: Option<String>,
    pub api_addr: Option<String>,
    pub mushroom_count: Option<usize>,
    pub scene_seed: Option<u64>,
}

// Runs before the log plugin exists, hence plain stdout/stderr.
pub fn load_startup_config() -> StartupConfig {
    let path = env_var("ROOM_CONFIG").unwrap_or_else(|| "room.json".to_string());
    match std::fs::read_to_string(&path) {
        Ok(contents) => match serde_json::from_str::<StartupConfig>(&contents) {
            Ok(cfg) => {
                println!("[Room] Loaded startup config from {}", path);
                cfg
            }
            Err(e) => {
                eprintln!("[Room] Failed to parse {}: {}", path, e);
                StartupConfig::default()
            }
        },
        Err(_) => StartupConfig::default(),
    }
}

fn env_var(name: &str) -> Option<String> {
    std::env::var(name).ok().filter(|s| !s.is_empty())
}

/// Fully resolved settings; environment variables win over the file.
#[derive(Debug, Clone)]
pub struct RoomSettings {
    pub window_title: String,
    pub window_size: (f32, f32),
    pub assets_dir: String,
    pub scene: SceneConfig,
    pub api_addr: String,
}

impl RoomSettings {
    pub fn resolve(file: StartupConfig, env: impl Fn(&str) -> Option<String>) -> Self {
        let defaults = SceneConfig::default();
        Self {
            window_title: file.window_title.unwrap_or_else(|| "Room".to_string()),
            window_size: (
                file.window_width.unwrap_or(1280.0),
                file.window_height.unwrap_or(720.0),
            ),
            assets_dir: env("ROOM_ASSETS_DIR")
                .or(file.assets_dir)
                .unwrap_or_else(|| "assets".to_string()),
            scene: SceneConfig {
                mushroom_count: file.mushroom_count.unwrap_or(defaults.mushroom_count),
                seed: file.scene_seed.unwrap_or(defaults.seed),
            },
            api_addr: env("ROOM_API_ADDR")
                .or(file.api_addr)
                .unwrap_or_else(|| DEFAULT_BIND_ADDR.to_string()),
        }
    }

    pub fn from_env(file: StartupConfig) -> Self {
        Self::resolve(file, env_var)
    }

    pub fn bridge_config(&self) -> BridgeConfig {
        BridgeConfig {
            bind_addr: self.api_addr.clone(),
            security: ApiSecurity::from_env(),
            ..BridgeConfig::default()
        }
    }
}
