use crate::vecmath::Vector;

/// Holds the per-agent state vectors on the CPU.
///
/// Positions and velocities are ping-pong buffered: every tick reads the
/// `_in` buffers for the whole population and writes the `_out` buffers,
/// then the pair is swapped. This keeps each agent's steering input a single
/// consistent prior-tick snapshot regardless of iteration or thread order.
#[derive(Debug)]
pub struct FlockState<const N: usize> {
    pub num_agents: usize,

    // --- Ping-pong buffers for the parallel update ---
    pub positions_in: Vec<Vector<N>>,
    pub velocities_in: Vec<Vector<N>>,
    pub positions_out: Vec<Vector<N>>,
    pub velocities_out: Vec<Vector<N>>,

    /// Per-agent accelerations, freshly accumulated during the force phase
    /// of each tick and zeroed again after integration.
    pub accelerations: Vec<Vector<N>>,
}

impl<const N: usize> FlockState<N> {
    /// Creates a new state from the initial agent placement. The population
    /// size is fixed for the whole run.
    pub fn new(positions: Vec<Vector<N>>, velocities: Vec<Vector<N>>) -> Self {
        debug_assert_eq!(positions.len(), velocities.len());
        let num_agents = positions.len();
        Self {
            num_agents,
            positions_out: vec![Vector::zero(); num_agents],
            velocities_out: vec![Vector::zero(); num_agents],
            accelerations: vec![Vector::zero(); num_agents],
            positions_in: positions,
            velocities_in: velocities,
        }
    }

    /// Swaps the input and output buffers for positions and velocities,
    /// committing the tick that was just integrated.
    pub fn swap_buffers(&mut self) {
        std::mem::swap(&mut self.positions_in, &mut self.positions_out);
        std::mem::swap(&mut self.velocities_in, &mut self.velocities_out);
    }

    /// Zeroes the acceleration buffer. Called at the end of every tick so
    /// forces never carry over between ticks.
    pub fn reset_accelerations(&mut self) {
        self.accelerations.fill(Vector::zero());
    }
}
