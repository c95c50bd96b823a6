use bevy_ecs::change_detection::DetectChanges;
use bevy_ecs::prelude::{Commands, Query, Res, ResMut, With};
use bevy_window::{PrimaryWindow, Window};
use tickscope_core::{DrawingSurface, Session, Viewport};
use tickscope_stream::StreamEvent;
use tracing::{debug, info, warn};

use crate::{ConnectionState, ScopeSession, ScopeStream, ScopeSurface, StreamStatus};

/// Keeps the surface viewport equal to the primary window's logical size.
///
/// Only resizes on an actual change. A minimized window (zero size) keeps the last viewport.
pub fn sync_viewport(
    windows: Query<&Window, With<PrimaryWindow>>,
    mut surface: ResMut<ScopeSurface>,
) {
    let Ok(window) = windows.single() else {
        return;
    };
    let viewport = Viewport::new(window.width(), window.height());
    if viewport.width <= 0.0 || viewport.height <= 0.0 {
        return;
    }
    if surface.0.viewport() != viewport {
        debug!(width = viewport.width, height = viewport.height, "viewport resized");
        surface.0.resize(viewport);
    }
}

/// Drains the stream and reconciles every pending message, in order.
pub fn pump_state_stream(
    mut commands: Commands,
    stream: Option<Res<ScopeStream>>,
    mut session: ResMut<ScopeSession>,
    mut surface: ResMut<ScopeSurface>,
    mut status: ResMut<StreamStatus>,
) {
    let Some(stream) = stream else {
        return;
    };
    let (source, events) = {
        let mut stream = stream.lock();
        let events = stream.drain();
        if events.is_empty() {
            return;
        }
        (stream.source().to_string(), events)
    };

    let ScopeSession(session) = &mut *session;
    let ScopeSurface(surface) = &mut *surface;
    for event in events {
        match event {
            StreamEvent::Opened => {
                info!(source = %source, "state stream open");
                status.connection = ConnectionState::Open;
            }
            StreamEvent::Message(text) => {
                status.messages += 1;
                session.handle_message(&text, surface);
            }
            StreamEvent::Closed { reason } => {
                warn!(source = %source, reason = %reason, "state stream closed; scene is frozen");
                status.connection = ConnectionState::Closed { reason };
                commands.remove_resource::<ScopeStream>();
            }
        }
    }
}

pub fn update_window_title(
    session: Res<ScopeSession>,
    mut windows: Query<&mut Window, With<PrimaryWindow>>,
) {
    if !session.is_changed() {
        return;
    }
    let title = window_title(&session.0);
    for mut window in &mut windows {
        if window.title != title {
            window.title = title.clone();
        }
    }
}

pub(crate) fn window_title(session: &Session) -> String {
    format!("tickscope | {}", session.tick_label())
}
