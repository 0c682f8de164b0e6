use crate::sim_params::{Obstacle, SimParams};
use crate::vecmath::Vector;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

// Configuration for the simulation volume and its boundary handling
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct WorldConfig {
    /// Spatial dimension of the run: 2 or 3.
    pub dimensions: usize,
    /// Per-axis lower bounds; length must equal `dimensions`.
    pub bounds_min: Vec<f32>,
    /// Per-axis upper bounds; length must equal `dimensions`.
    pub bounds_max: Vec<f32>,
    #[serde(default = "default_boundary_policy")]
    pub boundary_policy: BoundaryPolicy,
}

/// Rule applied to agents leaving the simulation volume.
#[derive(Deserialize, Serialize, Debug, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BoundaryPolicy {
    /// Toroidal topology: positions re-enter on the opposite side, velocity
    /// is untouched.
    Wrap,
    /// The velocity component on a crossed axis is inverted; the position is
    /// not clamped and may overshoot by up to one tick's displacement.
    Reflect,
}

fn default_boundary_policy() -> BoundaryPolicy {
    BoundaryPolicy::Wrap
}

// Parameters of the flock itself, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct FlockConfig {
    pub num_agents: u32,
    pub max_speed: f32,
    pub max_force: f32,
    /// Distance under which another agent counts as a neighbor for
    /// alignment and cohesion.
    pub neighbor_radius: f32,
    /// Distance under which separation kicks in. Defaults to
    /// `neighbor_radius / 2` when absent.
    #[serde(default)]
    pub separation_radius: Option<f32>,
    /// Seed for initial placement and velocity directions. A fixed seed and
    /// tick count reproduce a run bit for bit.
    pub placement_seed: u64,
}

// Relative strength of each steering behavior in the combined acceleration
#[derive(Deserialize, Serialize, Debug, Clone, Copy)]
pub struct BehaviorWeights {
    #[serde(default = "default_align_weight")]
    pub align: f32,
    #[serde(default = "default_cohesion_weight")]
    pub cohesion: f32,
    #[serde(default = "default_separation_weight")]
    pub separation: f32,
    #[serde(default = "default_avoid_weight")]
    pub avoid: f32,
}

fn default_align_weight() -> f32 {
    1.0
}

fn default_cohesion_weight() -> f32 {
    0.8
}

fn default_separation_weight() -> f32 {
    1.5
}

fn default_avoid_weight() -> f32 {
    1.5
}

impl Default for BehaviorWeights {
    fn default() -> Self {
        BehaviorWeights {
            align: default_align_weight(),
            cohesion: default_cohesion_weight(),
            separation: default_separation_weight(),
            avoid: default_avoid_weight(),
        }
    }
}

// A single static spherical obstacle (optional)
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct ObstacleConfig {
    /// Obstacle center; length must equal `dimensions`.
    pub position: Vec<f32>,
    /// Physical radius, forwarded to snapshots for visualization.
    pub radius: f32,
    /// Distance at which agents start steering away.
    pub avoid_radius: f32,
}

// Configuration for run length and snapshot cadence
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct TimingConfig {
    pub total_ticks: u32,
    pub record_interval_ticks: u32,
}

// Configuration for output settings, loaded from config.toml
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct OutputConfig {
    pub base_filename: String,
    pub save_positions: bool,
    pub save_stats: bool,
    /// Output format for recorded snapshots: "json", "bincode" or
    /// "messagepack". Defaults to JSON.
    pub format: Option<String>,
}

/// Main simulation configuration structure, loaded from config.toml.
#[derive(Deserialize, Serialize, Debug, Clone)]
pub struct SimulationConfig {
    pub world: WorldConfig,
    pub flock: FlockConfig,
    #[serde(default)]
    pub weights: BehaviorWeights,
    #[serde(default)]
    pub obstacle: Option<ObstacleConfig>,
    pub timing: TimingConfig,
    pub output: OutputConfig,
}

impl SimulationConfig {
    /// Loads and validates the simulation configuration from a TOML file.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path_ref = path.as_ref();

        let config_str = std::fs::read_to_string(path_ref).map_err(|e| {
            anyhow::anyhow!("Failed to read config file '{}': {}", path_ref.display(), e)
        })?;
        let config: SimulationConfig = toml::from_str(&config_str).map_err(|e| {
            anyhow::anyhow!("Failed to parse TOML from '{}': {}", path_ref.display(), e)
        })?;

        config.validate()?;
        Ok(config)
    }

    /// Checks the invariants the engine relies on. Any violation is fatal at
    /// startup; nothing is validated again on the hot path.
    pub fn validate(&self) -> Result<()> {
        let dims = self.world.dimensions;
        if dims != 2 && dims != 3 {
            anyhow::bail!("dimensions must be 2 or 3, got {}.", dims);
        }
        if self.world.bounds_min.len() != dims || self.world.bounds_max.len() != dims {
            anyhow::bail!(
                "bounds_min/bounds_max must have {} components, got {}/{}.",
                dims,
                self.world.bounds_min.len(),
                self.world.bounds_max.len()
            );
        }
        for axis in 0..dims {
            if self.world.bounds_max[axis] <= self.world.bounds_min[axis] {
                anyhow::bail!(
                    "bounds_max must exceed bounds_min on every axis (axis {}: {} <= {}).",
                    axis,
                    self.world.bounds_max[axis],
                    self.world.bounds_min[axis]
                );
            }
        }
        if self.flock.num_agents == 0 {
            anyhow::bail!("num_agents must be greater than 0.");
        }
        if self.flock.max_speed <= 0.0 {
            anyhow::bail!("max_speed must be positive.");
        }
        if self.flock.max_force <= 0.0 {
            anyhow::bail!("max_force must be positive.");
        }
        if self.flock.neighbor_radius < 0.0 {
            anyhow::bail!("neighbor_radius must not be negative.");
        }
        if let Some(sep) = self.flock.separation_radius {
            if sep < 0.0 {
                anyhow::bail!("separation_radius must not be negative.");
            }
        }
        if let Some(obstacle) = &self.obstacle {
            if obstacle.position.len() != dims {
                anyhow::bail!(
                    "obstacle position must have {} components, got {}.",
                    dims,
                    obstacle.position.len()
                );
            }
            if obstacle.radius < 0.0 || obstacle.avoid_radius < 0.0 {
                anyhow::bail!("obstacle radii must not be negative.");
            }
        }
        Ok(())
    }

    /// The effective separation threshold: configured value or half the
    /// neighbor radius.
    pub fn separation_radius(&self) -> f32 {
        self.flock
            .separation_radius
            .unwrap_or(self.flock.neighbor_radius / 2.0)
    }

    /// Converts the dimension-erased configuration into the fixed-dimension
    /// parameter struct used on the hot path. Fails if `N` does not match
    /// the configured dimension count.
    pub fn to_params<const N: usize>(&self) -> Result<SimParams<N>> {
        if self.world.dimensions != N {
            anyhow::bail!(
                "Config specifies {} dimensions but a {}-dimensional simulation was requested.",
                self.world.dimensions,
                N
            );
        }

        let neighbor_radius = self.flock.neighbor_radius;
        let separation_radius = self.separation_radius();

        let obstacle = match &self.obstacle {
            Some(o) => Some(Obstacle {
                position: to_vector::<N>(&o.position)?,
                radius: o.radius,
                avoid_radius: o.avoid_radius,
                avoid_radius_sq: o.avoid_radius * o.avoid_radius,
            }),
            None => None,
        };

        Ok(SimParams {
            num_agents: self.flock.num_agents as usize,
            max_speed: self.flock.max_speed,
            max_force: self.flock.max_force,
            neighbor_radius,
            neighbor_radius_sq: neighbor_radius * neighbor_radius,
            separation_radius,
            separation_radius_sq: separation_radius * separation_radius,
            bounds_min: to_vector::<N>(&self.world.bounds_min)?,
            bounds_max: to_vector::<N>(&self.world.bounds_max)?,
            boundary_policy: self.world.boundary_policy,
            weights: self.weights,
            obstacle,
        })
    }
}

fn to_vector<const N: usize>(components: &[f32]) -> Result<Vector<N>> {
    let array: [f32; N] = components.try_into().map_err(|_| {
        anyhow::anyhow!("Expected {} components, got {}.", N, components.len())
    })?;
    Ok(Vector::new(array))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_toml() -> &'static str {
        r#"
            [world]
            dimensions = 2
            bounds_min = [0.0, 0.0]
            bounds_max = [800.0, 600.0]
            boundary_policy = "wrap"

            [flock]
            num_agents = 50
            max_speed = 4.0
            max_force = 0.08
            neighbor_radius = 50.0
            placement_seed = 42

            [timing]
            total_ticks = 600
            record_interval_ticks = 60

            [output]
            base_filename = "flock"
            save_positions = true
            save_stats = true
        "#
    }

    #[test]
    fn parses_minimal_toml_with_defaults() {
        let config: SimulationConfig = toml::from_str(base_toml()).unwrap();
        config.validate().unwrap();
        assert_eq!(config.world.boundary_policy, BoundaryPolicy::Wrap);
        assert!((config.weights.align - 1.0).abs() < 1e-6);
        assert!((config.weights.cohesion - 0.8).abs() < 1e-6);
        assert!((config.weights.separation - 1.5).abs() < 1e-6);
        assert!((config.weights.avoid - 1.5).abs() < 1e-6);
        assert!(config.obstacle.is_none());
        // Separation threshold defaults to half the neighbor radius.
        assert!((config.separation_radius() - 25.0).abs() < 1e-6);
    }

    #[test]
    fn parses_obstacle_section() {
        let toml_str = format!(
            "{}\n[obstacle]\nposition = [400.0, 300.0]\nradius = 40.0\navoid_radius = 120.0\n",
            base_toml()
        );
        let config: SimulationConfig = toml::from_str(&toml_str).unwrap();
        config.validate().unwrap();
        let params = config.to_params::<2>().unwrap();
        let obstacle = params.obstacle.unwrap();
        assert_eq!(obstacle.position, Vector::new([400.0, 300.0]));
        assert!((obstacle.avoid_radius_sq - 14400.0).abs() < 1e-3);
    }

    #[test]
    fn rejects_invalid_parameters() {
        let mut config: SimulationConfig = toml::from_str(base_toml()).unwrap();
        config.flock.max_speed = 0.0;
        assert!(config.validate().is_err());

        let mut config: SimulationConfig = toml::from_str(base_toml()).unwrap();
        config.flock.num_agents = 0;
        assert!(config.validate().is_err());

        let mut config: SimulationConfig = toml::from_str(base_toml()).unwrap();
        config.flock.neighbor_radius = -1.0;
        assert!(config.validate().is_err());

        let mut config: SimulationConfig = toml::from_str(base_toml()).unwrap();
        config.world.dimensions = 4;
        assert!(config.validate().is_err());

        let mut config: SimulationConfig = toml::from_str(base_toml()).unwrap();
        config.world.bounds_max = vec![800.0];
        assert!(config.validate().is_err());
    }

    #[test]
    fn dimension_mismatch_is_rejected_at_params_conversion() {
        let config: SimulationConfig = toml::from_str(base_toml()).unwrap();
        assert!(config.to_params::<3>().is_err());
        assert!(config.to_params::<2>().is_ok());
    }
}
