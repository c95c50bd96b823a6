use anyhow::{bail, Result};
use bevy::log::LogPlugin;
use bevy::prelude::*;
use bevy::window::WindowResolution;
use tickscope_bevy::{ScopeStream, TickscopeGizmoPlugin, TickscopePlugin};
use tickscope_core::ScopeConfig;
use tickscope_stream::StateStream;

/// Runs the window until it is closed. The stream is released when the app exits.
pub fn run(config: ScopeConfig, stream: StateStream) -> Result<()> {
    let background = config.palette.background;
    let window = Window {
        title: "tickscope | tick -".to_string(),
        resolution: WindowResolution::new(config.viewport.width, config.viewport.height),
        ..default()
    };

    let exit = App::new()
        .insert_resource(ClearColor(Color::srgba_u8(
            background.r,
            background.g,
            background.b,
            background.a,
        )))
        .add_plugins(
            DefaultPlugins
                .build()
                // The CLI already installed a tracing subscriber.
                .disable::<LogPlugin>()
                .set(WindowPlugin {
                    primary_window: Some(window),
                    ..default()
                }),
        )
        .add_plugins((TickscopePlugin::new(config), TickscopeGizmoPlugin))
        .insert_resource(ScopeStream::new(stream))
        .add_systems(Startup, spawn_camera)
        .run();

    match exit {
        AppExit::Success => Ok(()),
        AppExit::Error(code) => bail!("viewer exited with code {code}"),
    }
}

fn spawn_camera(mut commands: Commands) {
    commands.spawn(Camera2d);
}
