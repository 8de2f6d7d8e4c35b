//! The one-shot analytic polynomial connection to the goal (§4.6).
//!
//! Each axis is fit independently with a cubic Hermite polynomial matching
//! position and velocity at both endpoints of a candidate duration `T`:
//!
//! `p(t) = p1 + v1·t + a2·t² + a3·t³`
//!
//! with `a2 = 3·Δp/T² − Δv/T`, `a3 = −2·Δp/T³ + Δv/T²`, where
//! `Δp = p2 − p1 − v1·T` and `Δv = v2 − v1`.

use crate::oracle::DistanceOracle;
use crate::params::SearchParams;
use crate::state::State;
use crate::vector::{within_bounds, Vec3};

/// Per-axis cubic Hermite coefficients connecting a start state to a goal
/// state over a fixed duration `tau`.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct ShotTrajectory {
    p1: Vec3,
    v1: Vec3,
    a2: Vec3,
    a3: Vec3,
    /// Duration of the connection.
    pub tau: f64,
}

impl ShotTrajectory {
    /// Builds the one-shot cubic connecting `x1` to `x2` over `tau`.
    ///
    /// `tau` must be strictly positive; the caller (the heuristic's
    /// returned optimal time) always supplies one.
    #[must_use]
    pub fn new(x1: State, x2: State, tau: f64) -> Self {
        let dp = x2.pos - x1.pos - x1.vel * tau;
        let dv = x2.vel - x1.vel;
        let tau2 = tau * tau;
        let tau3 = tau2 * tau;
        let a2 = dp * (3.0 / tau2) - dv * (1.0 / tau);
        let a3 = dp * (-2.0 / tau3) + dv * (1.0 / tau2);
        Self {
            p1: x1.pos,
            v1: x1.vel,
            a2,
            a3,
            tau,
        }
    }

    /// Position at time `t` since the start of the connection.
    #[must_use]
    pub fn position_at(&self, t: f64) -> Vec3 {
        self.p1 + self.v1 * t + self.a2 * (t * t) + self.a3 * (t * t * t)
    }

    /// Velocity at time `t`.
    #[must_use]
    pub fn velocity_at(&self, t: f64) -> Vec3 {
        self.v1 + self.a2 * (2.0 * t) + self.a3 * (3.0 * t * t)
    }

    /// Acceleration at time `t`.
    #[must_use]
    pub fn acceleration_at(&self, t: f64) -> Vec3 {
        self.a2 * 2.0 + self.a3 * (6.0 * t)
    }

    /// Checks feasibility at `check_num` uniformly-spaced samples over
    /// `[0, tau]`: every sample must stay within the velocity and
    /// acceleration bounds, within the map's bounds, and with clearance
    /// strictly greater than `margin`.
    #[must_use]
    pub fn check_feasible(&self, oracle: &dyn DistanceOracle, params: &SearchParams) -> bool {
        let (min, max) = oracle.bounds();
        let n = params.check_num.max(1);
        for i in 0..n {
            let t = self.tau * i as f64 / (n - 1).max(1) as f64;
            let pos = self.position_at(t);
            let vel = self.velocity_at(t);
            let acc = self.acceleration_at(t);
            if vel.amax() > params.max_vel || acc.amax() > params.max_acc {
                return false;
            }
            if !within_bounds(pos, min, max) {
                return false;
            }
            if oracle.clearance(pos) <= params.margin {
                return false;
            }
        }
        true
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::oracle::FreeSpaceOracle;

    #[test]
    fn matches_endpoints_exactly() {
        let x1 = State::new(Vec3::new(0.0, 0.0, 0.0), Vec3::new(1.0, 0.0, 0.0));
        let x2 = State::new(Vec3::new(2.0, 1.0, 0.0), Vec3::new(0.0, 1.0, 0.0));
        let tau = 1.5;
        let shot = ShotTrajectory::new(x1, x2, tau);
        let p0 = shot.position_at(0.0);
        let v0 = shot.velocity_at(0.0);
        let p1 = shot.position_at(tau);
        let v1 = shot.velocity_at(tau);
        assert!((p0 - x1.pos).norm() < 1e-9);
        assert!((v0 - x1.vel).norm() < 1e-9);
        assert!((p1 - x2.pos).norm() < 1e-6);
        assert!((v1 - x2.vel).norm() < 1e-6);
    }

    #[test]
    fn feasible_when_within_all_bounds() {
        let x1 = State::new(Vec3::zeros(), Vec3::zeros());
        let x2 = State::new(Vec3::new(1.0, 0.0, 0.0), Vec3::zeros());
        let shot = ShotTrajectory::new(x1, x2, 2.0);
        let oracle = FreeSpaceOracle::new(Vec3::new(-10.0, -10.0, -10.0), Vec3::new(10.0, 10.0, 10.0), 5.0);
        let params = SearchParams::default();
        assert!(shot.check_feasible(&oracle, &params));
    }

    #[test]
    fn infeasible_when_velocity_bound_exceeded() {
        let x1 = State::new(Vec3::zeros(), Vec3::zeros());
        let x2 = State::new(Vec3::new(100.0, 0.0, 0.0), Vec3::zeros());
        // A large displacement over a short duration forces excessive speed.
        let shot = ShotTrajectory::new(x1, x2, 0.1);
        let oracle = FreeSpaceOracle::new(
            Vec3::new(-1000.0, -1000.0, -1000.0),
            Vec3::new(1000.0, 1000.0, 1000.0),
            5.0,
        );
        let params = SearchParams::default();
        assert!(!shot.check_feasible(&oracle, &params));
    }

    #[test]
    fn infeasible_outside_map_bounds() {
        let x1 = State::new(Vec3::zeros(), Vec3::zeros());
        let x2 = State::new(Vec3::new(1.0, 0.0, 0.0), Vec3::zeros());
        let shot = ShotTrajectory::new(x1, x2, 2.0);
        let oracle = FreeSpaceOracle::new(Vec3::new(-0.5, -0.5, -0.5), Vec3::new(0.5, 0.5, 0.5), 5.0);
        let params = SearchParams::default();
        assert!(!shot.check_feasible(&oracle, &params));
    }
}
