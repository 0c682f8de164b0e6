use crate::config::{BehaviorWeights, BoundaryPolicy};
use crate::vecmath::Vector;
use serde::{Deserialize, Serialize};

/// Simulation parameters derived from the configuration, used on every tick.
/// Radii are stored squared so neighbor checks avoid square roots.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SimParams<const N: usize> {
    pub num_agents: usize,

    // Kinematic limits
    pub max_speed: f32,
    pub max_force: f32,

    // Interaction radii
    pub neighbor_radius: f32,
    pub neighbor_radius_sq: f32,
    pub separation_radius: f32,
    pub separation_radius_sq: f32,

    // World volume
    pub bounds_min: Vector<N>,
    pub bounds_max: Vector<N>,
    pub boundary_policy: BoundaryPolicy,

    pub weights: BehaviorWeights,
    pub obstacle: Option<Obstacle<N>>,
}

/// A static spherical obstacle agents steer around.
#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
pub struct Obstacle<const N: usize> {
    pub position: Vector<N>,
    /// Physical radius, passed through to snapshots for visualization.
    pub radius: f32,
    pub avoid_radius: f32,
    pub avoid_radius_sq: f32,
}
