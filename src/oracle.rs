//! The collision-query abstraction (§4.1) and two concrete implementations:
//! a real Euclidean Distance Transform over a dense voxel grid, and a pair
//! of analytic oracles used in tests (§9: "EDT over voxel grid" and
//! "analytic distance field for tests").

use crate::error::PlannerError;
use crate::vector::{within_bounds, Vec3};

/// How a [`DistanceOracle`] should answer a query outside its own bounded
/// query region.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UnknownPolicy {
    /// Treat the unknown region as free space: report the oracle's
    /// saturation distance.
    Free,
    /// Treat the unknown region as occupied: report zero clearance.
    Occupied,
}

/// A read-only source of clearance queries.
///
/// Implementations must be callable at the rate of inner-loop collision
/// checks (on the order of `10^5` calls per search) and must not mutate any
/// shared state: the search holds the oracle for the whole duration of a
/// `search()` call, and the caller is responsible for quiescing any
/// in-flight search before swapping the map out from under it.
pub trait DistanceOracle {
    /// Returns a non-negative distance from `p` to the nearest occupied
    /// cell. Points outside the oracle's query region are handled per its
    /// own unknown-cell policy rather than panicking.
    fn clearance(&self, p: Vec3) -> f64;

    /// The `(min, max)` bounding box of this oracle's query region.
    fn bounds(&self) -> (Vec3, Vec3);
}

/// A trivial oracle that reports a constant clearance everywhere inside its
/// bounds. Used to exercise the "no obstacles" scenario (S1) without
/// building a voxel grid.
#[derive(Debug, Clone, Copy)]
pub struct FreeSpaceOracle {
    min: Vec3,
    max: Vec3,
    clearance: f64,
}

impl FreeSpaceOracle {
    /// Creates an oracle reporting `clearance` everywhere within `[min, max]`.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3, clearance: f64) -> Self {
        Self { min, max, clearance }
    }
}

impl DistanceOracle for FreeSpaceOracle {
    fn clearance(&self, _p: Vec3) -> f64 {
        self.clearance
    }

    fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }
}

/// An analytic single-sphere obstacle: `clearance(p) = max(0, ‖p − center‖ − radius)`.
///
/// Used to exercise the "obstacle between start and goal" scenario (S2)
/// without building a voxel grid.
#[derive(Debug, Clone, Copy)]
pub struct SphereObstacleOracle {
    min: Vec3,
    max: Vec3,
    center: Vec3,
    radius: f64,
}

impl SphereObstacleOracle {
    /// Creates an oracle modeling a single spherical obstacle of the given
    /// `center` and `radius` within `[min, max]`.
    #[must_use]
    pub const fn new(min: Vec3, max: Vec3, center: Vec3, radius: f64) -> Self {
        Self {
            min,
            max,
            center,
            radius,
        }
    }
}

impl DistanceOracle for SphereObstacleOracle {
    fn clearance(&self, p: Vec3) -> f64 {
        ((p - self.center).norm() - self.radius).max(0.0)
    }

    fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }
}

/// A real Euclidean Distance Transform over a dense voxel occupancy grid.
///
/// The exact squared EDT is computed once at construction time using the
/// separable algorithm of Felzenszwalb & Huttenlocher ("Distance Transforms
/// of Sampled Functions"): a 1-D lower-envelope transform is applied along
/// each axis in turn, which is exact (not an approximation such as chamfer
/// distance) and runs in time linear in the number of voxels.
#[derive(Debug, Clone)]
pub struct VoxelEdtOracle {
    min: Vec3,
    max: Vec3,
    resolution: f64,
    dims: [usize; 3],
    /// World-unit clearance per voxel, row-major with x fastest-varying.
    distances: Vec<f64>,
    max_distance: f64,
    unknown_policy: UnknownPolicy,
}

impl VoxelEdtOracle {
    /// Builds an EDT oracle from a dense occupancy grid.
    ///
    /// `occupied` must have exactly `dims[0] * dims[1] * dims[2]` entries,
    /// row-major with the x axis fastest-varying, where `dims` is derived
    /// from `(max - min) / resolution`. Reported distances saturate at
    /// `max_distance`.
    ///
    /// # Errors
    ///
    /// Returns [`PlannerError::InvalidBounds`] if `min` is not strictly less
    /// than `max` on every axis, or [`PlannerError::NonPositiveResolution`]
    /// if `resolution` is not strictly positive.
    pub fn new(
        min: Vec3,
        max: Vec3,
        resolution: f64,
        occupied: &[bool],
        max_distance: f64,
        unknown_policy: UnknownPolicy,
    ) -> Result<Self, PlannerError> {
        if resolution <= 0.0 {
            return Err(PlannerError::NonPositiveResolution(resolution));
        }
        if (0..3).any(|i| min[i] >= max[i]) {
            return Err(PlannerError::InvalidBounds { min, max });
        }
        let dims = [
            (((max.x - min.x) / resolution).ceil() as usize).max(1),
            (((max.y - min.y) / resolution).ceil() as usize).max(1),
            (((max.z - min.z) / resolution).ceil() as usize).max(1),
        ];
        assert_eq!(
            occupied.len(),
            dims[0] * dims[1] * dims[2],
            "occupancy grid size does not match bounds/resolution"
        );
        let squared = squared_edt_3d(occupied, dims);
        let distances = squared
            .into_iter()
            .map(|d2| (d2.sqrt() * resolution).min(max_distance))
            .collect();
        Ok(Self {
            min,
            max,
            resolution,
            dims,
            distances,
            max_distance,
            unknown_policy,
        })
    }

    fn cell_of(&self, p: Vec3) -> Option<[usize; 3]> {
        if !within_bounds(p, self.min, self.max) {
            return None;
        }
        let mut cell = [0usize; 3];
        for i in 0..3 {
            let c = ((p[i] - self.min[i]) / self.resolution) as usize;
            cell[i] = c.min(self.dims[i] - 1);
        }
        Some(cell)
    }
}

impl DistanceOracle for VoxelEdtOracle {
    fn clearance(&self, p: Vec3) -> f64 {
        match self.cell_of(p) {
            Some([x, y, z]) => {
                let idx = x + y * self.dims[0] + z * self.dims[0] * self.dims[1];
                self.distances[idx]
            }
            None => match self.unknown_policy {
                UnknownPolicy::Free => self.max_distance,
                UnknownPolicy::Occupied => 0.0,
            },
        }
    }

    fn bounds(&self) -> (Vec3, Vec3) {
        (self.min, self.max)
    }
}

/// Exact squared Euclidean distance transform of a 3-D occupancy grid,
/// flattened row-major with `dims[0]` fastest-varying.
///
/// Applies the 1-D lower-envelope transform along x, then y, then z; each
/// pass is exact given an exact input, so the composition is exact.
fn squared_edt_3d(occupied: &[bool], dims: [usize; 3]) -> Vec<f64> {
    let [nx, ny, nz] = dims;
    let mut f: Vec<f64> = occupied
        .iter()
        .map(|&o| if o { 0.0 } else { f64::INFINITY })
        .collect();

    // Pass along x.
    for z in 0..nz {
        for y in 0..ny {
            let base = y * nx + z * nx * ny;
            let row = &f[base..base + nx];
            let transformed = distance_transform_1d(row);
            f[base..base + nx].copy_from_slice(&transformed);
        }
    }
    // Pass along y.
    for z in 0..nz {
        for x in 0..nx {
            let mut column: Vec<f64> = (0..ny).map(|y| f[x + y * nx + z * nx * ny]).collect();
            column = distance_transform_1d(&column);
            for (y, value) in column.into_iter().enumerate() {
                f[x + y * nx + z * nx * ny] = value;
            }
        }
    }
    // Pass along z.
    for y in 0..ny {
        for x in 0..nx {
            let mut column: Vec<f64> = (0..nz).map(|z| f[x + y * nx + z * nx * ny]).collect();
            column = distance_transform_1d(&column);
            for (z, value) in column.into_iter().enumerate() {
                f[x + y * nx + z * nx * ny] = value;
            }
        }
    }
    f
}

/// 1-D squared distance transform of the sampled function `f`, following
/// Felzenszwalb & Huttenlocher's lower-envelope-of-parabolas algorithm.
fn distance_transform_1d(f: &[f64]) -> Vec<f64> {
    let n = f.len();
    let mut d = vec![0.0; n];
    if n == 0 {
        return d;
    }
    let mut v = vec![0usize; n];
    let mut z = vec![0.0; n + 1];
    let mut k = 0usize;
    z[0] = f64::NEG_INFINITY;
    z[1] = f64::INFINITY;
    for q in 1..n {
        loop {
            let s = ((f[q] + (q * q) as f64) - (f[v[k]] + (v[k] * v[k]) as f64))
                / (2.0 * q as f64 - 2.0 * v[k] as f64);
            if s <= z[k] {
                if k == 0 {
                    break;
                }
                k -= 1;
            } else {
                k += 1;
                v[k] = q;
                z[k] = s;
                z[k + 1] = f64::INFINITY;
                break;
            }
        }
    }
    k = 0;
    for (q, slot) in d.iter_mut().enumerate() {
        while z[k + 1] < q as f64 {
            k += 1;
        }
        let dx = q as f64 - v[k] as f64;
        *slot = dx * dx + f[v[k]];
    }
    d
}
