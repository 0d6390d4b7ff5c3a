use super::*;
use crate::components::entities_with_tag;
use crate::effects::DISCO_FOLLOWERS;
use axum::body::Body;
use axum::http::Request as HttpRequest;
use tower::util::ServiceExt;

fn setup_runtime_app(queue: RoomTaskQueue) -> App {
    let mut app = App::new();
    app.insert_resource(queue)
        .insert_resource(SharedSnapshot::default())
        .add_systems(Update, (drain_room_tasks, update_snapshot).chain());
    app
}

fn tagged(app: &mut App, tag: &str) -> usize {
    entities_with_tag(app.world_mut(), tag).len()
}

#[test]
fn drain_runs_tasks_in_fifo_order() {
    let queue = RoomTaskQueue::default();
    let mut app = setup_runtime_app(queue.clone());

    queue.0.push(RoomTask::CreateSun);
    queue.0.push(RoomTask::RemoveByTag("sun".into()));
    queue.0.push(RoomTask::CreateDisco);
    app.update();

    assert_eq!(tagged(&mut app, "sun"), 0);
    assert_eq!(tagged(&mut app, "disco"), DISCO_FOLLOWERS + 1);
    assert!(queue.0.is_empty());
}

#[test]
fn draining_an_empty_queue_changes_nothing() {
    let queue = RoomTaskQueue::default();
    let mut app = setup_runtime_app(queue.clone());
    app.update();
    app.update();

    let world = app.world_mut();
    let mut tags = world.query::<&RoomTag>();
    assert_eq!(tags.iter(world).count(), 0);
    assert!(queue.0.is_empty());
}

#[test]
fn welcome_lands_one_tick_after_its_request() {
    let queue = RoomTaskQueue::default();
    let mut app = setup_runtime_app(queue.clone());

    queue.0.push(RoomTask::CreateWelcomePhase1);
    app.update();
    assert_eq!(tagged(&mut app, "welcome"), 0);
    assert_eq!(queue.0.len(), 1);

    app.update();
    assert_eq!(tagged(&mut app, "welcome"), 1);
    assert!(queue.0.is_empty());
}

#[test]
fn removing_an_unknown_tag_is_harmless() {
    let queue = RoomTaskQueue::default();
    let mut app = setup_runtime_app(queue.clone());
    queue.0.push(RoomTask::CreateSun);
    queue.0.push(RoomTask::RemoveByTag("nothing-here".into()));
    app.update();
    assert_eq!(tagged(&mut app, "sun"), 3);
}

#[test]
fn snapshot_counts_tagged_objects() {
    let queue = RoomTaskQueue::default();
    let mut app = setup_runtime_app(queue.clone());
    queue.0.push(RoomTask::CreateDisco);
    queue.0.push(RoomTask::CreateSun);
    app.update();

    let shared = app.world().resource::<SharedSnapshot>().0.clone();
    let snap = shared.read().expect("snapshot");
    assert_eq!(snap.tick, 1);
    assert_eq!(snap.active_tags.get("disco"), Some(&(DISCO_FOLLOWERS + 1)));
    assert_eq!(snap.active_tags.get("sun"), Some(&3));
}

async fn post(app: &Router, body: &str) -> StatusCode {
    let req = HttpRequest::builder()
        .method("POST")
        .uri("/cmd")
        .body(Body::from(body.to_string()))
        .expect("request");
    app.clone().oneshot(req).await.expect("response").status()
}

#[tokio::test]
async fn disco_on_then_off_through_the_router() {
    let queue = RoomTaskQueue::default();
    let mut app = setup_runtime_app(queue.clone());
    let snapshot = app.world().resource::<SharedSnapshot>().clone();
    let router = build_router(AppState::new(&queue, &snapshot), ApiSecurity::open());

    assert_eq!(
        post(&router, r#"{"cmd":"lighton","target":"disco"}"#).await,
        StatusCode::OK
    );
    assert_eq!(tagged(&mut app, "disco"), 0);
    app.update();
    assert_eq!(tagged(&mut app, "disco"), DISCO_FOLLOWERS + 1);

    assert_eq!(
        post(&router, r#"{"cmd":"lightoff","target":"disco"}"#).await,
        StatusCode::OK
    );
    app.update();
    assert_eq!(tagged(&mut app, "disco"), 0);
}

#[tokio::test]
async fn unknown_command_never_reaches_the_world() {
    let queue = RoomTaskQueue::default();
    let mut app = setup_runtime_app(queue.clone());
    let snapshot = app.world().resource::<SharedSnapshot>().clone();
    let router = build_router(AppState::new(&queue, &snapshot), ApiSecurity::open());

    assert_eq!(post(&router, r#"{"cmd":"foo"}"#).await, StatusCode::OK);
    assert!(queue.0.is_empty());
    app.update();

    let world = app.world_mut();
    let mut tags = world.query::<&RoomTag>();
    assert_eq!(tags.iter(world).count(), 0);
}

#[test]
fn exit_event_stops_the_bridge() {
    let queue = RoomTaskQueue::default();
    let snapshot = SharedSnapshot::default();
    let bridge = CommandBridge::start(
        BridgeConfig {
            bind_addr: "127.0.0.1:0".to_string(),
            ..BridgeConfig::default()
        },
        AppState::new(&queue, &snapshot),
    )
    .expect("start bridge");

    let mut app = App::new();
    app.add_event::<AppExit>()
        .insert_resource(bridge)
        .add_systems(Last, stop_bridge_on_exit);

    app.update();
    assert!(app.world().resource::<CommandBridge>().is_running());

    app.world_mut().send_event(AppExit::Success);
    app.update();
    assert!(!app.world().resource::<CommandBridge>().is_running());
}
