//! The kinodynamic A* search loop (§4.7) wiring the integrator, heuristic,
//! shot trajectory, node pool, and open set together.
//!
//! ```
//! use kinodynamic_astar::{nalgebra::Vector3, FreeSpaceOracle, Search, SearchParams, Status};
//!
//! let mut search = Search::new();
//! search.init(Vector3::zeros(), Vector3::new(10.0, 10.0, 10.0), Vector3::zeros())?;
//! search.set_param(SearchParams::default())?;
//! search.set_environment(Box::new(FreeSpaceOracle::new(
//!     Vector3::zeros(),
//!     Vector3::new(10.0, 10.0, 10.0),
//!     10.0,
//! )));
//!
//! let status = search.search(
//!     Vector3::new(0.0, 0.0, 1.0),
//!     Vector3::zeros(),
//!     Vector3::zeros(),
//!     Vector3::new(5.0, 0.0, 1.0),
//!     Vector3::zeros(),
//!     true,
//!     false,
//!     0.0,
//! );
//! assert_eq!(status, Status::ReachEnd);
//! # Ok::<(), kinodynamic_astar::PlannerError>(())
//! ```

use tracing::{debug, warn};

use crate::error::PlannerError;
use crate::heuristic::{optimal_time_and_cost, Heuristic};
use crate::node::{NodePool, NodeState, PathNode};
use crate::oracle::DistanceOracle;
use crate::params::SearchParams;
use crate::sampler::Samples;
use crate::shot::ShotTrajectory;
use crate::state::{State, StateIntegrator};
use crate::vector::{chebyshev_distance, within_bounds, Vec3};

/// Outcome of a [`Search::search`] call, numbered as in §6.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Status {
    /// Expansion crossed the configured horizon before a shot succeeded;
    /// the retrieved path is a valid prefix, not a full connection to goal.
    ReachHorizon = 1,
    /// A shot trajectory from some expanded node to the goal was accepted.
    ReachEnd = 2,
    /// The open set emptied, or the node pool was exhausted, before either
    /// of the above.
    NoPath = 3,
}

/// The kinodynamic A* planner.
///
/// Owns the node pool, open set, map bounds, oracle, and parameters for one
/// planning problem at a time. Call [`Search::init`], [`Search::set_param`],
/// and [`Search::set_environment`] once, then [`Search::search`] repeatedly,
/// calling [`Search::reset`] between independent searches.
pub struct Search {
    bounds: Option<(Vec3, Vec3)>,
    reference: Vec3,
    oracle: Option<Box<dyn DistanceOracle>>,
    params: SearchParams,
    pool: NodePool,
    open: crate::open_set::OpenSet,
    has_path: bool,
    terminal: Option<usize>,
    shot: Option<ShotTrajectory>,
    dynamic: bool,
    goal: State,
    iterations: u64,
}

impl Default for Search {
    fn default() -> Self {
        Self::new()
    }
}

impl Search {
    /// Builds a planner with default parameters and an empty node pool.
    /// [`Search::init`] must be called before [`Search::search`].
    #[must_use]
    pub fn new() -> Self {
        let params = SearchParams::default();
        Self {
            bounds: None,
            reference: Vec3::zeros(),
            oracle: None,
            pool: NodePool::new(params.allocate_num, params.resolution, params.time_resolution),
            open: crate::open_set::OpenSet::new(),
            has_path: false,
            terminal: None,
            shot: None,
            dynamic: false,
            goal: State::default(),
            iterations: 0,
            params,
        }
    }

    /// Sets the map bounds and a reference location (the original planner's
    /// "drone position", used only to bias diagnostics, not the search
    /// itself).
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidBounds`] if `min` is not strictly less
    /// than `max` on every axis.
    pub fn init(&mut self, min: Vec3, max: Vec3, reference: Vec3) -> Result<(), PlannerError> {
        if (0..3).any(|i| min[i] >= max[i]) {
            return Err(PlannerError::InvalidBounds { min, max });
        }
        self.bounds = Some((min, max));
        self.reference = reference;
        Ok(())
    }

    /// The reference location passed to [`Search::init`].
    #[must_use]
    pub fn reference(&self) -> Vec3 {
        self.reference
    }

    /// Supplies the [`DistanceOracle`] collision-query collaborator.
    pub fn set_environment(&mut self, oracle: Box<dyn DistanceOracle>) {
        self.oracle = Some(oracle);
    }

    /// Validates and installs new search parameters, rebuilding the node
    /// pool to match the new capacity and resolutions.
    ///
    /// # Errors
    ///
    /// Propagates [`SearchParams::validate`]'s error.
    pub fn set_param(&mut self, params: SearchParams) -> Result<(), PlannerError> {
        params.validate()?;
        self.pool = NodePool::new(params.allocate_num, params.resolution, params.time_resolution);
        self.params = params;
        Ok(())
    }

    /// Rewinds the node pool and open set, and clears any previous result.
    /// Must precede every [`Search::search`] call after the first.
    pub fn reset(&mut self) {
        self.pool.reset();
        self.open.reset();
        self.has_path = false;
        self.terminal = None;
        self.shot = None;
        self.iterations = 0;
    }

    /// Runs the kinodynamic A* search from `(p_s, v_s, a_s)` to `(p_g, v_g)`.
    ///
    /// `a_s` is accepted for API parity with the source planner's signature
    /// but is not part of the state model (§3): acceleration is a control,
    /// not a state component, so it does not feed the search directly.
    ///
    /// `init_flag` selects `init_max_tau` (when `true`) or `max_tau` (when
    /// `false`) as the root's own expansion duration, in addition to the
    /// always-root-only use of `init_max_tau` described in §4.7 — allowing a
    /// caller that re-enters `search` from a node it already owns (e.g. a
    /// replanning call reusing a trajectory midpoint) to request the
    /// steady-state duration for that seed instead. `dynamic` selects
    /// whether node identity is keyed on position alone or on position and
    /// time; `t_start` is clamped to `0` when negative, per the open
    /// question in §9.
    #[expect(clippy::too_many_arguments)]
    #[tracing::instrument(level = "debug", skip(self))]
    pub fn search(
        &mut self,
        p_s: Vec3,
        v_s: Vec3,
        a_s: Vec3,
        p_g: Vec3,
        v_g: Vec3,
        init_flag: bool,
        dynamic: bool,
        t_start: f64,
    ) -> Status {
        let _ = a_s;
        if self.bounds.is_none() {
            warn!("search called before init; no map bounds configured");
            return Status::NoPath;
        }
        let Some(oracle) = self.oracle.take() else {
            warn!("search called before set_environment");
            return Status::NoPath;
        };
        let status = self.run(oracle.as_ref(), p_s, v_s, p_g, v_g, init_flag, dynamic, t_start);
        self.oracle = Some(oracle);
        status
    }

    #[expect(clippy::too_many_arguments)]
    fn run(
        &mut self,
        oracle: &dyn DistanceOracle,
        p_s: Vec3,
        v_s: Vec3,
        p_g: Vec3,
        v_g: Vec3,
        init_flag: bool,
        dynamic: bool,
        t_start: f64,
    ) -> Status {
        let (min, max) = self.bounds.expect("checked by caller");

        self.dynamic = dynamic;
        self.goal = State::new(p_g, v_g);
        let t_start = t_start.max(0.0);
        let root_time = if dynamic { t_start } else { 0.0 };

        let start = State::new(p_s, v_s);
        let root_tau = if init_flag {
            self.params.init_max_tau
        } else {
            self.params.max_tau
        };

        let root = self.pool.push_root(start, root_time);
        self.pool.get_mut(root).node_state = NodeState::InOpenSet;
        self.open.push(root, 0.0);

        debug!(
            start = ?p_s,
            goal = ?p_g,
            dynamic,
            "seeded root node"
        );

        // The cutoff is measured from the start, not the goal (§3's "search
        // radius" is the expansion envelope around the query origin), so the
        // initial shot is always worth attempting regardless of how far the
        // goal lies beyond the horizon.
        if let Some(shot) = self.try_shot(start, oracle) {
            self.pool.get_mut(root).node_state = NodeState::InCloseSet;
            self.terminal = Some(root);
            self.shot = Some(shot);
            self.has_path = true;
            debug!("initial shot accepted, REACH_END");
            return Status::ReachEnd;
        }

        let controls = self.control_grid();

        loop {
            let Some((n_idx, f_popped)) = self.open.pop() else {
                debug!(iterations = self.iterations, "open set exhausted, NO_PATH");
                return Status::NoPath;
            };
            if self.pool.get(n_idx).node_state == NodeState::InCloseSet {
                continue;
            }
            // A stale re-push carries a larger f than the node's current
            // (already-improved) score; skip it without re-expanding.
            if f_popped > self.pool.get(n_idx).f_score + 1e-9 {
                continue;
            }
            self.pool.get_mut(n_idx).node_state = NodeState::InCloseSet;
            self.iterations += 1;

            let n = *self.pool.get(n_idx);

            if chebyshev_distance(n.state.pos, p_s) >= self.params.horizon {
                self.terminal = Some(n_idx);
                self.has_path = true;
                debug!(iterations = self.iterations, "REACH_HORIZON");
                return Status::ReachHorizon;
            }

            if let Some(shot) = self.try_shot(n.state, oracle) {
                self.terminal = Some(n_idx);
                self.shot = Some(shot);
                self.has_path = true;
                debug!(iterations = self.iterations, "shot accepted, REACH_END");
                return Status::ReachEnd;
            }

            let is_root = n_idx == root;
            let durations: &[f64] = if is_root {
                std::slice::from_ref(&root_tau)
            } else {
                &[0.5 * self.params.max_tau, self.params.max_tau]
            };

            for &tau in durations {
                for &u in &controls {
                    self.try_expand(n_idx, &n, u, tau, oracle, min, max);
                }
            }
        }
    }

    fn try_shot(&self, from: State, oracle: &dyn DistanceOracle) -> Option<ShotTrajectory> {
        let (_, tau) = optimal_time_and_cost(from, self.goal, self.params.w_time, self.params.max_vel);
        let shot = ShotTrajectory::new(from, self.goal, tau);
        shot.check_feasible(oracle, &self.params).then_some(shot)
    }

    #[expect(clippy::too_many_arguments)]
    fn try_expand(
        &mut self,
        n_idx: usize,
        n: &PathNode,
        u: Vec3,
        tau: f64,
        oracle: &dyn DistanceOracle,
        min: Vec3,
        max: Vec3,
    ) {
        let s_prime = StateIntegrator::integrate(n.state, u, tau);
        if s_prime.vel.amax() > self.params.max_vel {
            return;
        }

        let t_prime = n.time + tau;
        let same_cell = crate::node::position_cell(s_prime.pos, self.params.resolution)
            == crate::node::position_cell(n.state.pos, self.params.resolution);
        let same_time_cell = !self.dynamic
            || crate::node::position_time_cell(
                s_prime.pos,
                t_prime,
                self.params.resolution,
                self.params.time_resolution,
            ) == crate::node::position_time_cell(
                n.state.pos,
                n.time,
                self.params.resolution,
                self.params.time_resolution,
            );
        if same_cell && same_time_cell {
            return;
        }

        if !within_bounds(s_prime.pos, min, max) {
            return;
        }

        let samples = StateIntegrator::sample(n.state, u, tau, self.params.check_num.max(2));
        for s in &samples {
            if s.vel.amax() > self.params.max_vel || u.amax() > self.params.max_acc {
                return;
            }
            if !within_bounds(s.pos, min, max) {
                return;
            }
            if oracle.clearance(s.pos) <= self.params.margin {
                return;
            }
        }

        let g_prime = n.g_score + (u.dot(&u) + self.params.w_time) * tau;
        let (h, _) = Heuristic::estimate(s_prime, self.goal, self.params.w_time, self.params.max_vel);
        let f_prime = g_prime + self.params.lambda_heu * h;

        let existing = if self.dynamic {
            self.pool.find_by_position_time(s_prime.pos, t_prime)
        } else {
            self.pool.find_by_position(s_prime.pos)
        };

        match existing {
            None => {
                if let Some(idx) =
                    self.pool.push(s_prime, t_prime, u, g_prime, f_prime, n_idx)
                {
                    self.pool.get_mut(idx).node_state = NodeState::InOpenSet;
                    self.open.push(idx, f_prime);
                }
            }
            Some(idx) => {
                let existing_node = self.pool.get(idx);
                if existing_node.node_state == NodeState::InOpenSet && f_prime < existing_node.f_score
                {
                    let node = self.pool.get_mut(idx);
                    node.state = s_prime;
                    node.time = t_prime;
                    node.input = Some(u);
                    node.g_score = g_prime;
                    node.f_score = f_prime;
                    node.parent = Some(n_idx);
                    self.open.push(idx, f_prime);
                }
            }
        }
    }

    /// The discretized acceleration control grid, excluding the all-zero
    /// control, in a fixed deterministic order so that `f_score` ties
    /// resolve identically across runs (§9).
    fn control_grid(&self) -> Vec<Vec3> {
        let n = self.params.acc_samples_per_axis.max(1);
        let a_max = self.params.max_acc;
        let samples: Vec<f64> = if n == 1 {
            vec![0.0]
        } else {
            (0..n)
                .map(|i| -a_max + 2.0 * a_max * i as f64 / (n - 1) as f64)
                .collect()
        };
        let mut grid = Vec::with_capacity(n * n * n);
        for &x in &samples {
            for &y in &samples {
                for &z in &samples {
                    let u = Vec3::new(x, y, z);
                    if u.norm_squared() > 1e-12 {
                        grid.push(u);
                    }
                }
            }
        }
        grid
    }

    /// Whether the last `search` call produced a usable path
    /// (`ReachHorizon` or `ReachEnd`).
    #[must_use]
    pub fn has_path(&self) -> bool {
        self.has_path
    }

    fn retrieve_path(&self) -> Vec<PathNode> {
        match self.terminal {
            Some(idx) => self
                .pool
                .path_to_root(idx)
                .into_iter()
                .map(|i| *self.pool.get(i))
                .collect(),
            None => Vec::new(),
        }
    }

    /// Dense position sequence along the retrieved path, resampled at
    /// fixed-interval `dt`, per §4.8.
    #[must_use]
    pub fn get_kino_traj(&self, dt: f64) -> Vec<Vec3> {
        let path = self.retrieve_path();
        Samples::build(&path, self.shot.as_ref(), dt)
            .states
            .into_iter()
            .map(|s| s.pos)
            .collect()
    }

    /// Dense samples along the retrieved path, together with the start/end
    /// velocity and acceleration suitable for downstream spline fitting.
    #[must_use]
    pub fn get_samples(&self, dt: f64) -> (Vec<f64>, Vec<Vec3>, BoundaryConditions) {
        let path = self.retrieve_path();
        let samples = Samples::build(&path, self.shot.as_ref(), dt);
        let start_vel = path.first().map_or(Vec3::zeros(), |n| n.state.vel);
        let start_acc = path.get(1).and_then(|n| n.input).unwrap_or_else(Vec3::zeros);
        let (end_vel, end_acc) = match &self.shot {
            Some(shot) => (shot.velocity_at(shot.tau), shot.acceleration_at(shot.tau)),
            None => (
                path.last().map_or(Vec3::zeros(), |n| n.state.vel),
                path.last().and_then(|n| n.input).unwrap_or_else(Vec3::zeros),
            ),
        };
        let points = samples.states.iter().map(|s| s.pos).collect();
        (
            samples.times,
            points,
            BoundaryConditions {
                start_vel,
                start_acc,
                end_vel,
                end_acc,
            },
        )
    }

    /// All nodes touched by the last search (any lifecycle tag other than
    /// `NotExpand`), for visualization or debugging (§6, §10.6).
    #[must_use]
    pub fn get_visited_nodes(&self) -> Vec<PathNode> {
        (0..self.pool.len())
            .map(|i| *self.pool.get(i))
            .filter(|n| n.node_state != NodeState::NotExpand)
            .collect()
    }
}

/// Start/end velocity and acceleration boundary conditions for the path
/// returned by [`Search::get_samples`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct BoundaryConditions {
    /// Velocity at the start of the path.
    pub start_vel: Vec3,
    /// Acceleration applied on the first segment out of the root.
    pub start_acc: Vec3,
    /// Velocity at the end of the path.
    pub end_vel: Vec3,
    /// Acceleration at the end of the path (from the terminal shot, if any).
    pub end_acc: Vec3,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::{FreeSpaceOracle, SphereObstacleOracle};

    fn bounds() -> (Vec3, Vec3) {
        (Vec3::zeros(), Vec3::new(10.0, 10.0, 10.0))
    }

    #[test]
    fn s1_free_space_reaches_end_on_initial_shot() {
        let (min, max) = bounds();
        let mut search = Search::new();
        search.init(min, max, Vec3::zeros()).unwrap();
        let params = SearchParams {
            max_vel: 3.0,
            max_acc: 3.0,
            w_time: 10.0,
            lambda_heu: 10.0,
            margin: 0.1,
            ..SearchParams::default()
        };
        search.set_param(params).unwrap();
        search.set_environment(Box::new(FreeSpaceOracle::new(min, max, 10.0)));

        let status = search.search(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::zeros(),
            true,
            false,
            0.0,
        );
        assert_eq!(status, Status::ReachEnd);
        let traj = search.get_kino_traj(0.1);
        assert!((traj.first().unwrap() - Vec3::new(0.0, 0.0, 1.0)).norm() < 1e-6);
        assert!((traj.last().unwrap() - Vec3::new(5.0, 0.0, 1.0)).norm() < 1e-6);
    }

    #[test]
    fn s2_detours_around_sphere_obstacle() {
        let (min, max) = bounds();
        let mut search = Search::new();
        search.init(min, max, Vec3::zeros()).unwrap();
        let params = SearchParams {
            max_vel: 3.0,
            max_acc: 3.0,
            w_time: 10.0,
            lambda_heu: 10.0,
            margin: 0.1,
            check_num: 8,
            ..SearchParams::default()
        };
        search.set_param(params).unwrap();
        search.set_environment(Box::new(SphereObstacleOracle::new(
            min,
            max,
            Vec3::new(2.5, 0.0, 1.0),
            0.5,
        )));

        let status = search.search(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::zeros(),
            true,
            false,
            0.0,
        );
        assert!(matches!(status, Status::ReachEnd | Status::ReachHorizon));
        let oracle = SphereObstacleOracle::new(min, max, Vec3::new(2.5, 0.0, 1.0), 0.5);
        for p in search.get_kino_traj(0.1) {
            assert!(oracle.clearance(p) > 0.0);
        }
    }

    #[test]
    fn s4_tiny_pool_exhausts_to_no_path() {
        let (min, max) = bounds();
        let mut search = Search::new();
        search.init(min, max, Vec3::zeros()).unwrap();
        let params = SearchParams {
            allocate_num: 20,
            max_vel: 3.0,
            max_acc: 3.0,
            margin: 0.1,
            ..SearchParams::default()
        };
        search.set_param(params).unwrap();
        search.set_environment(Box::new(SphereObstacleOracle::new(
            min,
            max,
            Vec3::new(2.0, 0.0, 1.0),
            1.9,
        )));

        let status = search.search(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(9.0, 0.0, 1.0),
            Vec3::zeros(),
            true,
            false,
            0.0,
        );
        assert_eq!(status, Status::NoPath);
    }

    #[test]
    fn s5_dynamic_mode_is_deterministic() {
        let (min, max) = bounds();
        let run = || {
            let mut search = Search::new();
            search.init(min, max, Vec3::zeros()).unwrap();
            search.set_param(SearchParams::default()).unwrap();
            search.set_environment(Box::new(FreeSpaceOracle::new(min, max, 10.0)));
            let status = search.search(
                Vec3::new(0.0, 0.0, 1.0),
                Vec3::zeros(),
                Vec3::zeros(),
                Vec3::new(6.0, 1.0, 1.0),
                Vec3::zeros(),
                true,
                true,
                0.0,
            );
            (status, search.get_kino_traj(0.2))
        };
        let (s1, t1) = run();
        let (s2, t2) = run();
        assert_eq!(s1, s2);
        assert_eq!(t1.len(), t2.len());
        for (a, b) in t1.iter().zip(t2.iter()) {
            assert!((a - b).norm() < 1e-9);
        }
    }

    #[test]
    fn s6_velocity_bound_is_never_exceeded() {
        let (min, max) = bounds();
        let mut search = Search::new();
        search.init(min, max, Vec3::zeros()).unwrap();
        let params = SearchParams {
            max_vel: 0.5,
            max_acc: 3.0,
            margin: 0.1,
            horizon: 3.0,
            ..SearchParams::default()
        };
        search.set_param(params).unwrap();
        search.set_environment(Box::new(FreeSpaceOracle::new(min, max, 10.0)));

        let status = search.search(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(9.0, 9.0, 1.0),
            Vec3::zeros(),
            true,
            false,
            0.0,
        );
        assert!(matches!(status, Status::ReachHorizon | Status::ReachEnd));
        for node in search.get_visited_nodes() {
            assert!(node.state.vel.amax() <= 0.5 + 1e-9);
        }
    }

    #[test]
    fn reset_rewinds_pool_and_open_set() {
        let (min, max) = bounds();
        let mut search = Search::new();
        search.init(min, max, Vec3::zeros()).unwrap();
        search.set_param(SearchParams::default()).unwrap();
        search.set_environment(Box::new(FreeSpaceOracle::new(min, max, 10.0)));
        search.search(
            Vec3::new(0.0, 0.0, 1.0),
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(5.0, 0.0, 1.0),
            Vec3::zeros(),
            true,
            false,
            0.0,
        );
        search.reset();
        assert!(!search.has_path());
        assert!(search.get_visited_nodes().is_empty());
    }

    #[test]
    fn search_before_init_reports_no_path_without_panicking() {
        let mut search = Search::new();
        search.set_environment(Box::new(FreeSpaceOracle::new(
            Vec3::zeros(),
            Vec3::new(1.0, 1.0, 1.0),
            1.0,
        )));
        let status = search.search(
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::zeros(),
            Vec3::new(0.5, 0.5, 0.5),
            Vec3::zeros(),
            true,
            false,
            0.0,
        );
        assert_eq!(status, Status::NoPath);
    }
}
