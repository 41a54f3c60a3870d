use bevy::prelude::*;

use crate::app::state::GameplayState;
use crate::core::system::system_order::PreStepSet;
use crate::gameplay::events::DropCommand;

/// Translates mouse / touch into [`DropCommand`]s and handles the pause key.
/// Headless callers skip this plugin and send `DropCommand`s directly.
pub struct PointerInputPlugin;

impl Plugin for PointerInputPlugin {
    fn build(&self, app: &mut App) {
        app.add_systems(
            Update,
            (
                pointer_drop_commands
                    .in_set(PreStepSet)
                    .run_if(in_state(GameplayState::Playing)),
                toggle_pause,
            ),
        );
    }
}

fn cursor_world_pos(
    camera_q: &Query<(&Camera, &GlobalTransform)>,
    screen_pos: Vec2,
) -> Option<Vec2> {
    let (camera, cam_tf) = camera_q.iter().next()?;
    camera.viewport_to_world_2d(cam_tf, screen_pos).ok()
}

fn primary_pointer_world_pos(
    window: &Window,
    touches: &Touches,
    camera_q: &Query<(&Camera, &GlobalTransform)>,
) -> Option<Vec2> {
    if let Some(touch) = touches.iter().next() {
        return cursor_world_pos(camera_q, touch.position());
    }
    let cursor = window.cursor_position()?;
    cursor_world_pos(camera_q, cursor)
}

fn pointer_drop_commands(
    buttons: Res<ButtonInput<MouseButton>>,
    touches: Res<Touches>,
    windows_q: Query<&Window>,
    camera_q: Query<(&Camera, &GlobalTransform)>,
    mut drops: EventWriter<DropCommand>,
) {
    let Ok(window) = windows_q.single() else {
        return;
    };

    let released = buttons.just_released(MouseButton::Left) || touches.any_just_released();
    if released {
        drops.write(DropCommand::Release);
        return;
    }

    let pressed = buttons.pressed(MouseButton::Left) || touches.iter().next().is_some();
    if !pressed {
        return;
    }
    let Some(world_pos) = primary_pointer_world_pos(window, &touches, &camera_q) else {
        return;
    };
    if buttons.just_pressed(MouseButton::Left) || touches.iter_just_pressed().next().is_some() {
        drops.write(DropCommand::BeginDrag(world_pos.x));
    } else {
        drops.write(DropCommand::UpdateDrag(world_pos.x));
    }
}

fn toggle_pause(
    keys: Res<ButtonInput<KeyCode>>,
    state: Res<State<GameplayState>>,
    mut next_state: ResMut<NextState<GameplayState>>,
) {
    if !keys.just_pressed(KeyCode::Escape) {
        return;
    }
    match state.get() {
        GameplayState::Playing => next_state.set(GameplayState::Paused),
        GameplayState::Paused => next_state.set(GameplayState::Playing),
        GameplayState::GameOver => {} // only an external reset leaves game over
    }
}
