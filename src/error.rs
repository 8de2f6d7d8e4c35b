//! Configuration-time errors.
//!
//! The search loop itself never fails: it returns a [`crate::search::Status`]
//! (§7). Misconfiguration, by contrast, is a programmer error discovered at
//! setup time (`init`, `set_param`, or oracle construction), and is reported
//! through this `thiserror`-derived type instead of silently clamped or
//! ignored.

use crate::vector::Vec3;

/// An error raised while configuring a [`crate::search::Search`] instance or
/// one of its collaborators.
#[derive(Debug, Clone, Copy, thiserror::Error, PartialEq)]
pub enum PlannerError {
    /// The map's lower bound is not strictly less than its upper bound on
    /// some axis.
    #[error("invalid map bounds: min {min:?} is not strictly less than max {max:?}")]
    InvalidBounds {
        /// The lower bound that was supplied.
        min: Vec3,
        /// The upper bound that was supplied.
        max: Vec3,
    },

    /// The spatial resolution `ρ` was not strictly positive.
    #[error("resolution must be strictly positive, got {0}")]
    NonPositiveResolution(f64),

    /// The time resolution `ρ_t` was not strictly positive.
    #[error("time resolution must be strictly positive, got {0}")]
    NonPositiveTimeResolution(f64),

    /// The node pool capacity (`allocate_num`) was zero.
    #[error("node pool capacity must be non-zero")]
    ZeroCapacity,

    /// The feasibility sample count (`check_num`) was zero.
    #[error("check_num must be non-zero")]
    ZeroCheckNum,

    /// The velocity bound (`max_vel`) was not strictly positive.
    #[error("max_vel must be strictly positive, got {0}")]
    NonPositiveVelocityBound(f64),

    /// The acceleration bound (`max_acc`) was not strictly positive.
    #[error("max_acc must be strictly positive, got {0}")]
    NonPositiveAccelerationBound(f64),
}
