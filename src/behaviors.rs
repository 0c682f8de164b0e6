//! The classical flocking rules plus obstacle avoidance.
//!
//! Every behavior maps one agent and the prior-tick population snapshot to a
//! bounded steering vector: the desired heading is rescaled to `max_speed`,
//! the agent's current velocity is subtracted, and the correction is clamped
//! to `max_force`. A behavior with no qualifying neighbor contributes zero.

use crate::neighbors::for_each_neighbor;
use crate::sim_params::SimParams;
use crate::vecmath::Vector;

/// Turns a desired heading into a bounded steering correction. A zero
/// heading yields a zero desired velocity, so the correction degenerates to
/// braking, still clamped to `max_force`.
#[inline(always)]
fn steer_toward<const N: usize>(
    heading: Vector<N>,
    velocity: Vector<N>,
    params: &SimParams<N>,
) -> Vector<N> {
    let desired = heading.rescaled(params.max_speed);
    desired.sub(velocity).clamp_length(params.max_force)
}

/// Alignment: steer toward the average velocity of agents within the
/// neighbor radius.
pub fn align<const N: usize>(
    agent_idx: usize,
    positions: &[Vector<N>],
    velocities: &[Vector<N>],
    params: &SimParams<N>,
) -> Vector<N> {
    let mut velocity_sum = Vector::zero();
    let mut total = 0u32;
    for_each_neighbor(agent_idx, positions, params.neighbor_radius_sq, |j, _| {
        velocity_sum += velocities[j];
        total += 1;
        true
    });
    if total == 0 {
        return Vector::zero();
    }
    let average = velocity_sum.scale(1.0 / total as f32);
    steer_toward(average, velocities[agent_idx], params)
}

/// Cohesion: steer toward the centroid of agents within the neighbor radius.
pub fn cohere<const N: usize>(
    agent_idx: usize,
    positions: &[Vector<N>],
    velocities: &[Vector<N>],
    params: &SimParams<N>,
) -> Vector<N> {
    let mut position_sum = Vector::zero();
    let mut total = 0u32;
    for_each_neighbor(agent_idx, positions, params.neighbor_radius_sq, |j, _| {
        position_sum += positions[j];
        total += 1;
        true
    });
    if total == 0 {
        return Vector::zero();
    }
    let centroid = position_sum.scale(1.0 / total as f32);
    let to_centroid = centroid.sub(positions[agent_idx]);
    steer_toward(to_centroid, velocities[agent_idx], params)
}

/// Separation: steer away from agents within the separation radius, with
/// closer neighbors repelling harder (their offset is weighted by 1/dist).
///
/// When the per-neighbor repulsions cancel exactly (a symmetric pinch), the
/// averaged accumulator is zero and the behavior contributes zero rather
/// than an arbitrary direction.
pub fn separate<const N: usize>(
    agent_idx: usize,
    positions: &[Vector<N>],
    velocities: &[Vector<N>],
    params: &SimParams<N>,
) -> Vector<N> {
    let own_pos = positions[agent_idx];
    let mut repulsion_sum = Vector::zero();
    let mut total = 0u32;
    for_each_neighbor(
        agent_idx,
        positions,
        params.separation_radius_sq,
        |j, dist_sq| {
            let mut diff = own_pos.sub(positions[j]);
            // A coincident neighbor has no direction to flee along; it still
            // counts toward the average.
            if dist_sq > 1e-12 {
                diff = diff.scale(1.0 / dist_sq.sqrt());
            }
            repulsion_sum += diff;
            total += 1;
            true
        },
    );
    if total == 0 {
        return Vector::zero();
    }
    let average = repulsion_sum.scale(1.0 / total as f32);
    if average.length_squared() <= 1e-12 {
        return Vector::zero();
    }
    steer_toward(average, velocities[agent_idx], params)
}

/// Obstacle avoidance: within the avoid radius, a repulsion identical in
/// form to separation against a single point. Evaluated fresh every tick,
/// no persistent state.
pub fn avoid_obstacle<const N: usize>(
    position: Vector<N>,
    velocity: Vector<N>,
    params: &SimParams<N>,
) -> Vector<N> {
    let Some(obstacle) = &params.obstacle else {
        return Vector::zero();
    };
    let dist_sq = position.distance_squared(obstacle.position);
    if dist_sq >= obstacle.avoid_radius_sq {
        return Vector::zero();
    }
    let away = position.sub(obstacle.position);
    if away.length_squared() <= 1e-12 {
        // Sitting exactly on the obstacle center: no defined flee direction.
        return Vector::zero();
    }
    steer_toward(away, velocity, params)
}

/// Weights and sums the four behavior outputs into one acceleration. The
/// total is intentionally unclamped; only the post-integration velocity is
/// capped.
pub fn accumulate_forces<const N: usize>(
    agent_idx: usize,
    positions: &[Vector<N>],
    velocities: &[Vector<N>],
    params: &SimParams<N>,
) -> Vector<N> {
    let weights = &params.weights;
    let mut acceleration = align(agent_idx, positions, velocities, params).scale(weights.align);
    acceleration += cohere(agent_idx, positions, velocities, params).scale(weights.cohesion);
    acceleration += separate(agent_idx, positions, velocities, params).scale(weights.separation);
    acceleration +=
        avoid_obstacle(positions[agent_idx], velocities[agent_idx], params).scale(weights.avoid);
    acceleration
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::{BehaviorWeights, BoundaryPolicy};
    use crate::sim_params::Obstacle;

    const EPS: f32 = 1e-5;

    fn test_params(obstacle: Option<Obstacle<2>>) -> SimParams<2> {
        let neighbor_radius = 50.0f32;
        let separation_radius = 5.0f32;
        SimParams {
            num_agents: 2,
            max_speed: 4.0,
            max_force: 0.08,
            neighbor_radius,
            neighbor_radius_sq: neighbor_radius * neighbor_radius,
            separation_radius,
            separation_radius_sq: separation_radius * separation_radius,
            bounds_min: Vector::new([0.0, 0.0]),
            bounds_max: Vector::new([800.0, 600.0]),
            boundary_policy: BoundaryPolicy::Wrap,
            weights: BehaviorWeights::default(),
            obstacle,
        }
    }

    #[test]
    fn lone_agent_receives_no_steering() {
        let params = test_params(None);
        let positions = vec![Vector::new([10.0, 10.0])];
        let velocities = vec![Vector::new([1.0, 0.0])];
        assert_eq!(align(0, &positions, &velocities, &params), Vector::zero());
        assert_eq!(cohere(0, &positions, &velocities, &params), Vector::zero());
        assert_eq!(separate(0, &positions, &velocities, &params), Vector::zero());
        assert_eq!(
            accumulate_forces(0, &positions, &velocities, &params),
            Vector::zero()
        );
    }

    #[test]
    fn head_on_pair_damps_and_attracts() {
        // A at the origin heading +x, B ten units away heading -x. Both see
        // each other; separation is out of range (threshold 5 < 10).
        let params = test_params(None);
        let positions = vec![Vector::new([0.0, 0.0]), Vector::new([10.0, 0.0])];
        let velocities = vec![Vector::new([1.0, 0.0]), Vector::new([-1.0, 0.0])];

        let align_a = align(0, &positions, &velocities, &params);
        let align_b = align(1, &positions, &velocities, &params);
        // Alignment pulls each toward the other's heading: mutual damping.
        assert!(align_a[0] < 0.0);
        assert!(align_b[0] > 0.0);
        assert!(align_a.length() <= params.max_force + EPS);

        let cohere_a = cohere(0, &positions, &velocities, &params);
        let cohere_b = cohere(1, &positions, &velocities, &params);
        // Cohesion points each agent at the midpoint (5, 0).
        assert!(cohere_a[0] > 0.0);
        assert!(cohere_b[0] < 0.0);
        assert!(cohere_a[1].abs() < EPS);
        assert!(cohere_b.length() <= params.max_force + EPS);

        assert_eq!(separate(0, &positions, &velocities, &params), Vector::zero());
        assert_eq!(separate(1, &positions, &velocities, &params), Vector::zero());
    }

    #[test]
    fn separation_repels_inversely_with_distance() {
        let mut params = test_params(None);
        params.separation_radius = 25.0;
        params.separation_radius_sq = 625.0;
        let positions = vec![Vector::new([0.0, 0.0]), Vector::new([10.0, 0.0])];
        let velocities = vec![Vector::zero(), Vector::zero()];

        let steering = separate(0, &positions, &velocities, &params);
        // Pushed away from the neighbor, along -x, bounded by max_force.
        assert!(steering[0] < 0.0);
        assert!(steering[1].abs() < EPS);
        assert!(steering.length() <= params.max_force + EPS);
    }

    #[test]
    fn symmetric_pinch_cancels_to_zero() {
        let mut params = test_params(None);
        params.separation_radius = 25.0;
        params.separation_radius_sq = 625.0;
        // Two neighbors at equal distance on opposite sides.
        let positions = vec![
            Vector::new([0.0, 0.0]),
            Vector::new([4.0, 0.0]),
            Vector::new([-4.0, 0.0]),
        ];
        let velocities = vec![Vector::zero(); 3];
        assert_eq!(separate(0, &positions, &velocities, &params), Vector::zero());
    }

    #[test]
    fn per_behavior_steering_is_bounded_in_a_crowd() {
        let params = test_params(None);
        let positions: Vec<Vector<2>> = (0..8)
            .map(|i| Vector::new([(i as f32) * 3.0, (i % 3) as f32 * 2.0]))
            .collect();
        let velocities: Vec<Vector<2>> = (0..8)
            .map(|i| Vector::new([(i as f32) - 4.0, 2.0 - (i as f32) * 0.5]))
            .collect();
        for i in 0..positions.len() {
            assert!(align(i, &positions, &velocities, &params).length() <= params.max_force + EPS);
            assert!(cohere(i, &positions, &velocities, &params).length() <= params.max_force + EPS);
            assert!(
                separate(i, &positions, &velocities, &params).length() <= params.max_force + EPS
            );
        }
    }

    #[test]
    fn obstacle_repels_within_avoid_radius_only() {
        let obstacle = Obstacle {
            position: Vector::new([100.0, 100.0]),
            radius: 40.0,
            avoid_radius: 120.0,
            avoid_radius_sq: 120.0 * 120.0,
        };
        let params = test_params(Some(obstacle));

        // Inside the avoid radius: nonzero, directed away, bounded.
        let position = Vector::new([150.0, 100.0]);
        let steering = avoid_obstacle(position, Vector::zero(), &params);
        assert!(steering.length() > 0.0);
        assert!(steering.length() <= params.max_force + EPS);
        assert!(steering.dot(position.sub(obstacle.position)) > 0.0);

        // Outside the avoid radius: zero contribution.
        let far = Vector::new([400.0, 100.0]);
        assert_eq!(avoid_obstacle(far, Vector::zero(), &params), Vector::zero());
    }

    #[test]
    fn combiner_applies_configured_weights() {
        let mut params = test_params(None);
        params.weights = BehaviorWeights {
            align: 0.0,
            cohesion: 1.0,
            separation: 0.0,
            avoid: 0.0,
        };
        let positions = vec![Vector::new([0.0, 0.0]), Vector::new([10.0, 0.0])];
        let velocities = vec![Vector::zero(), Vector::zero()];
        let combined = accumulate_forces(0, &positions, &velocities, &params);
        let cohesion_only = cohere(0, &positions, &velocities, &params);
        assert_eq!(combined, cohesion_only);
    }
}
