use super::*;

/// `POST /cmd`: validate, enqueue and acknowledge. The reply only confirms
/// receipt; the task runs on a later tick.
pub(super) async fn post_cmd(State(state): State<AppState>, body: Bytes) -> Response {
    match RoomCommand::parse(&body) {
        Ok(command) => {
            debug!("[Room API] accepted {:?}", command);
            state.queue.push(command.into_task());
            (StatusCode::OK, Json(CmdResponse::accepted())).into_response()
        }
        Err(err) => {
            warn!(
                "[Room API] rejected {:?}: {}",
                String::from_utf8_lossy(&body),
                err
            );
            err.into_response()
        }
    }
}

/// `GET /state`: last snapshot published by the update loop plus the queue depth.
pub(super) async fn get_state(State(state): State<AppState>) -> Json<CmdResponse<RoomState>> {
    let mut room = state
        .snapshot
        .read()
        .map(|snap| snap.clone())
        .unwrap_or_else(|poisoned| poisoned.into_inner().clone());
    room.pending_tasks = state.queue.len();
    Json(CmdResponse::success(room))
}
