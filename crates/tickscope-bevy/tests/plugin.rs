use std::sync::mpsc;

use bevy_app::App;
use bevy_window::{PrimaryWindow, Window, WindowResolution};
use serde_json::json;
use tickscope_bevy::{
    ConnectionState, ScopeSession, ScopeStream, ScopeSurface, StreamStatus, TickscopePlugin,
};
use tickscope_core::{DrawingSurface, EntityId, ScopeConfig, Viewport};
use tickscope_stream::{StateStream, StreamEvent};

fn agent_message(tick: u64, x: f64) -> StreamEvent {
    StreamEvent::Message(
        json!({
            "tick": tick,
            "updated": [{ "id": 1, "type": "agent", "x": x, "z": 50.0, "rotation": 0.0,
                          "path": [{ "x": 90.0, "z": 50.0 }] }],
            "obstacles": [{ "id": 1, "type": "obstacle",
                            "minX": 0.0, "minZ": 0.0, "maxX": 10.0, "maxZ": 10.0 }],
        })
        .to_string(),
    )
}

fn app_with_stream() -> (App, mpsc::Sender<StreamEvent>) {
    let mut app = App::new();
    app.add_plugins(TickscopePlugin::new(ScopeConfig::default()));
    let (tx, rx) = mpsc::channel();
    app.insert_resource(ScopeStream::new(StateStream::detached(rx)));
    (app, tx)
}

#[test]
fn pending_messages_are_reconciled_in_one_frame() {
    let (mut app, tx) = app_with_stream();
    tx.send(StreamEvent::Opened).expect("send");
    tx.send(agent_message(1, 10.0)).expect("send");
    tx.send(StreamEvent::Message("{ truncated".to_string())).expect("send");
    tx.send(agent_message(2, 20.0)).expect("send");

    app.update();

    let session = &app.world().resource::<ScopeSession>().0;
    assert_eq!(session.tick(), Some(2));
    assert_eq!(session.stats().messages_applied, 2);
    assert_eq!(session.stats().messages_dropped, 1);

    let handle = session
        .reconciler()
        .agents()
        .get(&EntityId::Int(1))
        .expect("agent registered");
    // Snapped to 50 on tick 1, then 50 + (100 - 50) * 0.6.
    assert!((handle.position.x - 80.0).abs() < 1e-4);

    let surface = &app.world().resource::<ScopeSurface>().0;
    // Glyph, path line, markers, obstacle.
    assert_eq!(surface.len(), 4);

    let status = app.world().resource::<StreamStatus>();
    assert_eq!(status.connection, ConnectionState::Open);
    assert_eq!(status.messages, 3);
}

#[test]
fn closed_stream_freezes_the_scene() {
    let (mut app, tx) = app_with_stream();
    tx.send(StreamEvent::Opened).expect("send");
    tx.send(agent_message(7, 10.0)).expect("send");
    tx.send(StreamEvent::Closed {
        reason: "connection closed".to_string(),
    })
    .expect("send");

    app.update();

    assert!(app.world().get_resource::<ScopeStream>().is_none());
    assert_eq!(
        app.world().resource::<StreamStatus>().connection,
        ConnectionState::Closed {
            reason: "connection closed".to_string()
        }
    );

    // Later frames keep presenting the last scene.
    app.update();
    app.update();
    let session = &app.world().resource::<ScopeSession>().0;
    assert_eq!(session.tick(), Some(7));
    assert_eq!(app.world().resource::<ScopeSurface>().0.len(), 4);
}

#[test]
fn vanished_worker_closes_the_stream() {
    let (mut app, tx) = app_with_stream();
    tx.send(agent_message(3, 10.0)).expect("send");
    drop(tx);

    app.update();

    assert!(app.world().get_resource::<ScopeStream>().is_none());
    assert!(matches!(
        app.world().resource::<StreamStatus>().connection,
        ConnectionState::Closed { .. }
    ));
    assert_eq!(app.world().resource::<ScopeSession>().0.tick(), Some(3));
}

#[test]
fn no_stream_means_idle() {
    let mut app = App::new();
    app.add_plugins(TickscopePlugin::default());
    app.update();

    assert_eq!(app.world().resource::<ScopeSession>().0.tick(), None);
    assert_eq!(
        app.world().resource::<StreamStatus>().connection,
        ConnectionState::Idle
    );
}

#[test]
fn primary_window_drives_viewport_and_title() {
    let (mut app, tx) = app_with_stream();
    let window = app
        .world_mut()
        .spawn((
            Window {
                resolution: WindowResolution::new(800.0, 600.0),
                ..Default::default()
            },
            PrimaryWindow,
        ))
        .id();

    app.update();
    assert_eq!(
        app.world().resource::<ScopeSurface>().0.viewport(),
        Viewport::new(800.0, 600.0)
    );
    let title = |app: &App| {
        app.world()
            .get::<Window>(window)
            .map(|w| w.title.clone())
            .expect("window exists")
    };
    assert_eq!(title(&app), "tickscope | tick -");

    tx.send(agent_message(42, 10.0)).expect("send");
    app.update();
    assert_eq!(title(&app), "tickscope | tick 42");

    let session = &app.world().resource::<ScopeSession>().0;
    let handle = session
        .reconciler()
        .agents()
        .get(&EntityId::Int(1))
        .expect("agent registered");
    // x = 10 of 100 across 800 px.
    assert!((handle.position.x - 80.0).abs() < 1e-4);
    assert!((handle.position.y - 300.0).abs() < 1e-4);
}

#[test]
fn invalid_config_falls_back_to_defaults() {
    let config = ScopeConfig {
        world_extent: -5.0,
        ..ScopeConfig::default()
    };
    let mut app = App::new();
    app.add_plugins(TickscopePlugin::new(config));
    app.update();

    let session = &app.world().resource::<ScopeSession>().0;
    assert_eq!(session.reconciler().mapper().world_extent(), 100.0);
}
