//! A 3-D Euclidean vector, used for positions, velocities, accelerations,
//! and control inputs throughout the planner.

/// A 3-D vector of `f64` components.
///
/// This is a thin alias over [`nalgebra::Vector3`] rather than a hand-rolled
/// type: every quantity the planner manipulates (position, velocity,
/// acceleration) is a point or a displacement in `ℝ³`, and `nalgebra` already
/// provides the component-wise arithmetic, dot products, and norms needed
/// throughout [`crate::state`], [`crate::heuristic`], and [`crate::shot`].
pub type Vec3 = nalgebra::Vector3<f64>;

/// The Chebyshev (infinity) norm of `a - b`, i.e. `max_i |a_i - b_i|`.
///
/// Used for the horizon cutoff test (§4.7) and for map-bounds checks, both of
/// which compare per-axis extents rather than Euclidean distance.
#[must_use]
pub fn chebyshev_distance(a: Vec3, b: Vec3) -> f64 {
    (a - b).amax()
}

/// Returns `true` if every component of `v` lies within `[min, max]`.
#[must_use]
pub fn within_bounds(v: Vec3, min: Vec3, max: Vec3) -> bool {
    (0..3).all(|i| v[i] >= min[i] && v[i] <= max[i])
}
