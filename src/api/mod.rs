mod bridge;
mod command_runtime;
mod commands;
mod router;
mod routes;
mod security;
mod state;
pub mod types;

use axum::{
    body::Bytes,
    extract::{Request, State},
    http::StatusCode,
    middleware::{self, Next},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use bevy::prelude::*;
use std::collections::{BTreeMap, HashMap};
use std::sync::{Arc, Mutex, RwLock};

use crate::components::TickSet;
use crate::work_queue::WorkQueue;
pub use bridge::{BridgeConfig, BridgeError, CommandBridge, DEFAULT_BIND_ADDR};
use command_runtime::*;
pub use commands::*;
use router::build_router;
use routes::*;
pub use security::ApiSecurity;
use security::*;
use state::*;
use types::*;

/// Wires the task queue into the update loop and, when configured, starts the
/// HTTP command bridge that feeds it.
#[derive(Default)]
pub struct ApiPlugin {
    /// `None` keeps the queue and its drain but opens no socket.
    pub bridge: Option<BridgeConfig>,
}

impl Plugin for ApiPlugin {
    fn build(&self, app: &mut App) {
        let queue = RoomTaskQueue::default();
        let snapshot = SharedSnapshot::default();

        app.insert_resource(queue.clone())
            .insert_resource(snapshot.clone())
            .add_systems(Update, drain_room_tasks.in_set(TickSet::DrainTasks))
            .add_systems(PostUpdate, update_snapshot)
            .add_systems(Last, stop_bridge_on_exit);

        let Some(config) = self.bridge.clone() else {
            info!("[Room API] command bridge disabled");
            return;
        };
        match CommandBridge::start(config, AppState::new(&queue, &snapshot)) {
            Ok(bridge) => {
                info!("[Room API] listening on http://{}", bridge.local_addr());
                app.insert_resource(bridge);
            }
            Err(e) => {
                warn!("[Room API] command bridge not started: {e}");
            }
        }
    }
}
