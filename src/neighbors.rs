use crate::vecmath::Vector;

/// Visits every agent within `max_dist_sq` of agent `agent_idx`, excluding
/// the agent itself (identity is the stable index, never object identity).
///
/// The closure receives `(neighbor_idx, dist_sq)` and returns `true` to keep
/// scanning or `false` to stop early.
///
/// The scan is a full O(n) pass per agent, O(n²) per tick over the
/// population. That is an accepted scalability boundary for the population
/// sizes this engine targets; a spatial partitioning structure (uniform
/// grid) is the known upgrade path if it ever stops being one.
#[inline(always)]
pub fn for_each_neighbor<const N: usize, F>(
    agent_idx: usize,
    positions: &[Vector<N>],
    max_dist_sq: f32,
    mut f: F,
) where
    F: FnMut(usize, f32) -> bool,
{
    let own_pos = positions[agent_idx];
    for (neighbor_idx, neighbor_pos) in positions.iter().enumerate() {
        if neighbor_idx == agent_idx {
            continue;
        }
        let dist_sq = own_pos.distance_squared(*neighbor_pos);
        if dist_sq < max_dist_sq {
            if !f(neighbor_idx, dist_sq) {
                return;
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn excludes_self_and_respects_radius() {
        let positions: Vec<Vector<2>> = vec![
            Vector::new([0.0, 0.0]),
            Vector::new([3.0, 0.0]),
            Vector::new([100.0, 0.0]),
        ];
        let mut seen = Vec::new();
        for_each_neighbor(0, &positions, 25.0, |idx, dist_sq| {
            seen.push((idx, dist_sq));
            true
        });
        assert_eq!(seen, vec![(1, 9.0)]);
    }

    #[test]
    fn stops_when_closure_returns_false() {
        let positions: Vec<Vector<2>> = vec![
            Vector::new([0.0, 0.0]),
            Vector::new([1.0, 0.0]),
            Vector::new([2.0, 0.0]),
        ];
        let mut visits = 0;
        for_each_neighbor(0, &positions, 100.0, |_, _| {
            visits += 1;
            false
        });
        assert_eq!(visits, 1);
    }

    #[test]
    fn boundary_distance_does_not_qualify() {
        let positions: Vec<Vector<2>> =
            vec![Vector::new([0.0, 0.0]), Vector::new([5.0, 0.0])];
        let mut seen = 0;
        // Strict inequality: exactly at the radius is not a neighbor.
        for_each_neighbor(0, &positions, 25.0, |_, _| {
            seen += 1;
            true
        });
        assert_eq!(seen, 0);
    }
}
