pub mod behaviors;
pub mod config;
pub mod neighbors;
pub mod sim_params;
pub mod simulation;
pub mod state;
pub mod vecmath;

// Re-export key types for easier use by dependent crates
pub use config::{
    BehaviorWeights, BoundaryPolicy, FlockConfig, ObstacleConfig, OutputConfig, SimulationConfig,
    TimingConfig, WorldConfig,
};
pub use sim_params::{Obstacle, SimParams};
pub use simulation::{FlockSimulation, Snapshot};
pub use state::FlockState;
pub use vecmath::Vector;
