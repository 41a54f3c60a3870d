//! Central system ordering labels to make the per-frame sequence explicit.
//! Stages (high-level):
//! 1. PreStep (drop input, spawn state machine, power-up hooks)
//! 2. Rapier (handled by plugin)
//! 3. RuleResolve (velocity clamps, merge batch, danger escalation, snapshot/scale handling)
//! 4. Rendering (implicit)
use bevy::prelude::*;

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct PreStepSet; // input and spawn control applied before the physics step

#[derive(SystemSet, Debug, Hash, PartialEq, Eq, Clone)]
pub struct RuleResolveSet; // game rules reacting to the contact stream
