//! Densifying an accepted search path into a uniformly time-sampled
//! trajectory (§4.8, the `getSamples`/`getKinoTraj`-style accessor).

use crate::node::PathNode;
use crate::shot::ShotTrajectory;
use crate::state::{State, StateIntegrator};

/// A densified trajectory: states sampled at `dt`-spaced instants from the
/// start of the path to its end, inclusive.
#[derive(Debug, Clone, Default)]
pub struct Samples {
    /// Sample instants, in seconds since the start of the path.
    pub times: Vec<f64>,
    /// States at each instant in `times`, same length and order.
    pub states: Vec<State>,
}

impl Samples {
    /// Re-samples a sequence of expanded nodes (root to goal, as returned by
    /// [`crate::node::NodePool::path_to_root`]) plus an optional trailing
    /// one-shot connection, at a fixed `dt`.
    ///
    /// Each node (other than the root) carries the control that was applied
    /// to reach it from its parent; the duration of that segment is the
    /// difference between consecutive nodes' `time` fields. The one-shot
    /// trajectory, if present, extends the path by its own `tau`.
    #[must_use]
    pub fn build(path: &[PathNode], shot: Option<&ShotTrajectory>, dt: f64) -> Self {
        let mut times = Vec::new();
        let mut states = Vec::new();
        let Some(root) = path.first() else {
            return Self { times, states };
        };
        let origin = root.time;
        times.push(0.0);
        states.push(root.state);

        for window in path.windows(2) {
            let (prev, node) = (&window[0], &window[1]);
            let tau = (node.time - prev.time).max(0.0);
            let u = node.input.unwrap_or_default();
            let steps = ((tau / dt).ceil() as usize).max(1);
            for step in 1..=steps {
                let t = (tau * step as f64 / steps as f64).min(tau);
                states.push(StateIntegrator::integrate(prev.state, u, t));
                times.push(prev.time - origin + t);
            }
        }

        if let Some(shot) = shot {
            let base_time = path.last().map_or(0.0, |n| n.time - origin);
            let steps = ((shot.tau / dt).ceil() as usize).max(1);
            for step in 1..=steps {
                let t = (shot.tau * step as f64 / steps as f64).min(shot.tau);
                states.push(State::new(shot.position_at(t), shot.velocity_at(t)));
                times.push(base_time + t);
            }
        }

        Self { times, states }
    }

    /// Number of samples.
    #[must_use]
    pub fn len(&self) -> usize {
        self.times.len()
    }

    /// Whether there are no samples.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.times.is_empty()
    }
}
