// This file is part of Sphere Drop.
// Copyright (C) 2025 Adam and contributors
// SPDX-License-Identifier: GPL-3.0-or-later

use bevy::prelude::*;
use bevy::state::app::StatesPlugin;

use crate::app::state::GameplayState;
use crate::core::system::system_order::{PreStepSet, RuleResolveSet};
use crate::gameplay::danger::DangerZonePlugin;
use crate::gameplay::hooks::PowerUpHooksPlugin;
use crate::gameplay::merge::MergeResolverPlugin;
use crate::gameplay::snapshot::SnapshotPlugin;
use crate::gameplay::spawn::SpawnControllerPlugin;
use crate::interaction::auto_close::AutoClosePlugin;
use crate::physics::arena::ArenaPlugin;
use crate::physics::world::PhysicsSetupPlugin;

/// The whole simulation core: physics world, arena, spawn controller, merge
/// resolver, danger monitor, snapshot/scale surface and power-up hooks.
/// Runs headless under `MinimalPlugins`; rendering and pointer input live in
/// [`PresentationPlugin`].
pub struct GamePlugin;

impl Plugin for GamePlugin {
    fn build(&self, app: &mut App) {
        if !app.is_plugin_added::<StatesPlugin>() {
            app.add_plugins(StatesPlugin);
        }
        app.init_state::<GameplayState>()
            .configure_sets(Update, (PreStepSet, RuleResolveSet.after(PreStepSet)))
            .add_plugins((
                PhysicsSetupPlugin,
                ArenaPlugin,
                SpawnControllerPlugin,
                MergeResolverPlugin,
                DangerZonePlugin,
                SnapshotPlugin,
                PowerUpHooksPlugin,
                AutoClosePlugin,
            ));
    }
}

/// Everything a windowed session adds on top of the core: camera, sphere
/// visuals, pointer input, debug stats.
pub struct PresentationPlugin;

impl Plugin for PresentationPlugin {
    fn build(&self, app: &mut App) {
        app.add_plugins((
            crate::rendering::camera::CameraPlugin,
            crate::rendering::sphere_visual::SphereVisualPlugin,
            crate::rendering::overlay::ArenaOverlayPlugin,
            crate::interaction::input::PointerInputPlugin,
            #[cfg(feature = "debug")]
            crate::debug::stats::DebugStatsPlugin,
        ));
    }
}
