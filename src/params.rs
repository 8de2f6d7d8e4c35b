//! Caller-configurable search parameters (§6).

use crate::error::PlannerError;

/// Tuning parameters for a [`crate::search::Search`] instance.
///
/// Every field corresponds to a row of the configuration table in §6; fields
/// left unspecified there (`horizon`, `lambda_heu`, `margin`, `allocate_num`,
/// `check_num`, `resolution`, `time_resolution`) get the conservative
/// defaults documented on each field below, picked for a planner operating
/// over a handful-of-meters indoor voxel map.
///
/// `acc_samples_per_axis` is not named in §6; it generalizes the fixed
/// `{-a_max, 0, +a_max}` control grid of §4.7 into a configurable resolution,
/// as the design notes explicitly allow ("or a finer grid per config").
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct SearchParams {
    /// Expansion duration for non-root nodes. Default `0.25`.
    pub max_tau: f64,
    /// Expansion duration at the root. Default `0.8`.
    pub init_max_tau: f64,
    /// Velocity bound on any axis. Default `3.0`.
    pub max_vel: f64,
    /// Acceleration bound on any axis, also the control range. Default `3.0`.
    pub max_acc: f64,
    /// Time-cost weight `w_t` in the objective. Default `10.0`.
    pub w_time: f64,
    /// Search radius cutoff (infinity-norm distance to goal). Default `7.0`.
    pub horizon: f64,
    /// Heuristic inflation factor `λ_h`. Default `5.0`.
    pub lambda_heu: f64,
    /// Minimum allowed clearance. Default `0.2`.
    pub margin: f64,
    /// Node pool capacity. Default `100_000`.
    pub allocate_num: usize,
    /// Segment sample count used by the feasibility checks. Default `5`.
    pub check_num: usize,
    /// Spatial cell size `ρ`. Default `0.1`.
    pub resolution: f64,
    /// Time cell size `ρ_t`, used only in dynamic mode. Default `0.8`.
    pub time_resolution: f64,
    /// Number of acceleration samples per axis in the control grid (the grid
    /// is this value cubed, minus the all-zero control). Default `3`, which
    /// reproduces the `{-a_max, 0, +a_max}` grid described in §4.7.
    pub acc_samples_per_axis: usize,
}

impl Default for SearchParams {
    fn default() -> Self {
        Self {
            max_tau: 0.25,
            init_max_tau: 0.8,
            max_vel: 3.0,
            max_acc: 3.0,
            w_time: 10.0,
            horizon: 7.0,
            lambda_heu: 5.0,
            margin: 0.2,
            allocate_num: 100_000,
            check_num: 5,
            resolution: 0.1,
            time_resolution: 0.8,
            acc_samples_per_axis: 3,
        }
    }
}

impl SearchParams {
    /// Validates the parameters, returning the first violated constraint.
    ///
    /// This is a pure check with no side effects; [`crate::search::Search::set_param`]
    /// calls it before committing the new parameters.
    pub fn validate(&self) -> Result<(), PlannerError> {
        if self.resolution <= 0.0 {
            return Err(PlannerError::NonPositiveResolution(self.resolution));
        }
        if self.time_resolution <= 0.0 {
            return Err(PlannerError::NonPositiveTimeResolution(self.time_resolution));
        }
        if self.allocate_num == 0 {
            return Err(PlannerError::ZeroCapacity);
        }
        if self.check_num == 0 {
            return Err(PlannerError::ZeroCheckNum);
        }
        if self.max_vel <= 0.0 {
            return Err(PlannerError::NonPositiveVelocityBound(self.max_vel));
        }
        if self.max_acc <= 0.0 {
            return Err(PlannerError::NonPositiveAccelerationBound(self.max_acc));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_validate() {
        assert_eq!(SearchParams::default().validate(), Ok(()));
    }

    #[test]
    fn zero_capacity_rejected() {
        let params = SearchParams {
            allocate_num: 0,
            ..SearchParams::default()
        };
        assert_eq!(params.validate(), Err(PlannerError::ZeroCapacity));
    }

    #[test]
    fn non_positive_resolution_rejected() {
        let params = SearchParams {
            resolution: 0.0,
            ..SearchParams::default()
        };
        assert_eq!(
            params.validate(),
            Err(PlannerError::NonPositiveResolution(0.0))
        );
    }
}
