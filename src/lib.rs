#![deny(missing_docs)]

//! A kinodynamic A* motion planner for a point robot modeled as a double
//! integrator, searching a 3D occupancy field for a dynamically feasible
//! trajectory from a start state to a goal state.
//!
//! The search fuses four pieces: a closed-form [`state`] propagation of the
//! double integrator, an admissible [`heuristic`] cost-to-go derived from the
//! optimal-control two-point boundary value problem, an analytic one-shot
//! polynomial [`shot`] that tries to close the remaining distance to the goal
//! in a single segment, and a hash-indexed open/closed set ([`node`],
//! [`open_set`]) that drives a standard A* loop ([`search`]). Collision
//! queries are delegated to a [`oracle::DistanceOracle`] supplied by the
//! caller, which decouples the planner core from any particular map
//! representation.
//!
//! The crate has no Cargo features: `tracing` spans and events are emitted
//! unconditionally at `debug`/`trace` level and are filtered by whichever
//! subscriber the caller installs (or none, if they install none).

pub extern crate nalgebra;

mod error;
mod heuristic;
mod node;
mod open_set;
mod oracle;
mod params;
mod sampler;
mod search;
mod shot;
mod state;
mod vector;

pub use error::PlannerError;
pub use heuristic::{optimal_time_and_cost, Heuristic};
pub use node::{NodeState, PathNode};
pub use oracle::{
    DistanceOracle, FreeSpaceOracle, SphereObstacleOracle, UnknownPolicy, VoxelEdtOracle,
};
pub use params::SearchParams;
pub use sampler::Samples;
pub use search::{BoundaryConditions, Search, Status};
pub use shot::ShotTrajectory;
pub use state::{State, StateIntegrator};
pub use vector::Vec3;
