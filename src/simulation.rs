use crate::behaviors;
use crate::config::{BoundaryPolicy, SimulationConfig};
use crate::sim_params::{Obstacle, SimParams};
use crate::state::FlockState;
use crate::vecmath::Vector;
use anyhow::Result;
use log::debug;
use rand::prelude::*;
use rand::distr::Uniform;
use rand_distr::StandardNormal;
use rayon::prelude::*;
use serde::{Deserialize, Serialize};

/// Read-only view of the simulation at one tick, consumed by the rendering
/// collaborator and by the snapshot export pipeline.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Snapshot<const N: usize> {
    /// Tick index at which the snapshot was taken (0 = before the first tick).
    pub tick: u64,
    pub agent_count: u32,
    /// Mean velocity magnitude over the population.
    pub average_speed: f32,
    pub positions: Vec<Vector<N>>,
    pub velocities: Vec<Vector<N>>,
    /// Static obstacle data, repeated per snapshot so a viewer needs no
    /// side channel.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub obstacle: Option<Obstacle<N>>,
}

/// Manages the state and execution of the flocking simulation on the CPU.
///
/// A tick runs in two parallel phases with a barrier between them: every
/// agent's steering is computed from the prior-tick `_in` buffers first, and
/// only then is any agent integrated into the `_out` buffers. Without that
/// barrier an agent updated early would silently change what a later agent
/// perceives as a neighbor's velocity within the same tick.
pub struct FlockSimulation<const N: usize> {
    /// The original run configuration.
    pub config: SimulationConfig,
    /// Derived hot-path parameters.
    pub params: SimParams<N>,
    /// The agent population, ping-pong buffered.
    pub state: FlockState<N>,
    /// Host RNG, used only for initial placement; ticks are RNG-free.
    pub rng: StdRng,
    /// Number of completed ticks.
    pub current_tick: u64,
    /// Snapshots collected at record intervals.
    recorded_snapshots: Vec<Snapshot<N>>,
}

impl<const N: usize> FlockSimulation<N> {
    /// Creates a new simulation, validating the configuration and placing
    /// the initial population.
    pub fn new(config: SimulationConfig) -> Result<Self> {
        config.validate()?;
        let params = config.to_params::<N>()?;

        let mut rng = StdRng::seed_from_u64(config.flock.placement_seed);
        let (positions, velocities) = place_agents(&params, &mut rng)?;
        let state = FlockState::new(positions, velocities);

        Ok(Self {
            config,
            params,
            state,
            rng,
            current_tick: 0,
            recorded_snapshots: Vec::new(),
        })
    }

    /// Advances the simulation by one tick.
    pub fn step(&mut self) -> Result<()> {
        let params = &self.params;
        let state = &mut self.state;
        let num_agents = state.num_agents;

        // --- Phase 1: accumulate forces (parallel) ---
        // Reads only the `_in` snapshot; each agent writes only its own
        // acceleration slot.
        {
            let positions = &state.positions_in;
            let velocities = &state.velocities_in;
            state.accelerations[..num_agents]
                .par_iter_mut()
                .enumerate()
                .for_each(|(agent_idx, acceleration)| {
                    *acceleration =
                        behaviors::accumulate_forces(agent_idx, positions, velocities, params);
                });
        }

        // --- Phase 2: integrate (parallel) ---
        // The par_iter boundary above is the barrier: no agent reaches this
        // point before every acceleration is in place.
        {
            let positions_in = &state.positions_in;
            let velocities_in = &state.velocities_in;
            let accelerations = &state.accelerations;
            state.positions_out[..num_agents]
                .par_iter_mut()
                .zip(state.velocities_out[..num_agents].par_iter_mut())
                .enumerate()
                .for_each(|(agent_idx, (position_out, velocity_out))| {
                    let mut velocity = velocities_in[agent_idx]
                        .add(accelerations[agent_idx])
                        .clamp_length(params.max_speed);
                    let mut position = positions_in[agent_idx].add(velocity);
                    apply_boundary(&mut position, &mut velocity, params);
                    *position_out = position;
                    *velocity_out = velocity;
                });
        }

        // --- Commit: output becomes input for the next tick ---
        self.state.swap_buffers();
        self.state.reset_accelerations();
        self.current_tick += 1;
        Ok(())
    }

    /// Advances one tick and returns the resulting state.
    pub fn tick(&mut self) -> Result<Snapshot<N>> {
        self.step()?;
        Ok(self.snapshot())
    }

    /// Non-mutating observation of the current state, valid before the
    /// first tick.
    pub fn snapshot(&self) -> Snapshot<N> {
        let num_agents = self.state.num_agents;
        let velocities = &self.state.velocities_in[..num_agents];
        let average_speed = if num_agents > 0 {
            velocities.iter().map(|v| v.length()).sum::<f32>() / num_agents as f32
        } else {
            0.0
        };
        Snapshot {
            tick: self.current_tick,
            agent_count: num_agents as u32,
            average_speed,
            positions: self.state.positions_in[..num_agents].to_vec(),
            velocities: velocities.to_vec(),
            obstacle: self.params.obstacle,
        }
    }

    /// Stores the current state in the recorded series. Called by the
    /// driver at record intervals.
    pub fn record_snapshot(&mut self) {
        debug!("Recording snapshot at tick {}...", self.current_tick);
        let snapshot = self.snapshot();
        self.recorded_snapshots.push(snapshot);
    }

    /// Provides access to the recorded snapshots.
    pub fn recorded_snapshots(&self) -> &[Snapshot<N>] {
        &self.recorded_snapshots
    }

    /// Returns the number of agents in the simulation.
    pub fn agent_count(&self) -> u32 {
        self.state.num_agents as u32
    }

    /// Provides access to the derived simulation parameters.
    pub fn params(&self) -> &SimParams<N> {
        &self.params
    }

    /// Provides access to the original simulation configuration.
    pub fn config(&self) -> &SimulationConfig {
        &self.config
    }
}

/// Applies the configured boundary policy to one agent's freshly integrated
/// position and velocity.
#[inline(always)]
fn apply_boundary<const N: usize>(
    position: &mut Vector<N>,
    velocity: &mut Vector<N>,
    params: &SimParams<N>,
) {
    match params.boundary_policy {
        BoundaryPolicy::Wrap => {
            for axis in 0..N {
                let min = params.bounds_min[axis];
                let max = params.bounds_max[axis];
                if position[axis] < min || position[axis] >= max {
                    // Toroidal remap preserving the overshoot.
                    position[axis] = min + (position[axis] - min).rem_euclid(max - min);
                }
            }
        }
        BoundaryPolicy::Reflect => {
            for axis in 0..N {
                if position[axis] < params.bounds_min[axis]
                    || position[axis] > params.bounds_max[axis]
                {
                    // Velocity flips on the crossed axis only; the position
                    // is allowed to overshoot until the next tick.
                    velocity[axis] = -velocity[axis];
                }
            }
        }
    }
}

/// Places the initial population: positions uniform over the bounds,
/// velocities in a uniformly random direction at exactly `max_speed`.
/// Sampling standard normal components and normalizing gives a direction
/// uniform on the N-sphere.
fn place_agents<const N: usize>(
    params: &SimParams<N>,
    rng: &mut StdRng,
) -> Result<(Vec<Vector<N>>, Vec<Vector<N>>)> {
    let mut axis_dists = Vec::with_capacity(N);
    for axis in 0..N {
        axis_dists.push(Uniform::new(
            params.bounds_min[axis],
            params.bounds_max[axis],
        )?);
    }

    let mut positions = Vec::with_capacity(params.num_agents);
    let mut velocities = Vec::with_capacity(params.num_agents);
    for _ in 0..params.num_agents {
        let mut position = Vector::zero();
        for axis in 0..N {
            position[axis] = rng.sample(axis_dists[axis]);
        }
        positions.push(position);
        velocities.push(random_direction(rng).scale(params.max_speed));
    }
    Ok((positions, velocities))
}

fn random_direction<const N: usize>(rng: &mut StdRng) -> Vector<N> {
    loop {
        let mut direction = Vector::zero();
        for axis in 0..N {
            direction[axis] = rng.sample(StandardNormal);
        }
        let unit = direction.normalize_or_zero();
        // A zero sample is astronomically unlikely but would break the
        // speed invariant; resample.
        if unit.length_squared() > 0.0 {
            return unit;
        }
    }
}
