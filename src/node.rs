//! The expansion node, its lifecycle tag, and the pre-allocated pool that
//! backs the search (§4.1, §4.5).

use rustc_hash::FxHashMap;

use crate::state::State;
use crate::vector::Vec3;

/// Lifecycle tag of a [`PathNode`], mirroring the original planner's
/// `NOT_EXPAND` / `IN_OPEN_SET` / `IN_CLOSE_SET` states.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NodeState {
    /// Never inserted into the open set.
    #[default]
    NotExpand,
    /// Currently in the open set, awaiting expansion.
    InOpenSet,
    /// Popped from the open set and expanded; will not be revisited.
    InCloseSet,
}

/// A single expansion node: a state reached at a particular time, with its
/// search bookkeeping.
///
/// `parent` is an index into the owning [`NodePool`] rather than a pointer
/// or `Rc`, so the pool can be a flat, reusable `Vec` with no reference
/// cycles to worry about; the root has no parent and carries `None`.
#[derive(Debug, Clone, Copy)]
pub struct PathNode {
    /// The 6-D state this node represents.
    pub state: State,
    /// Time since the start of the search at which this state is reached.
    pub time: f64,
    /// The control that was applied to reach this node from its parent.
    /// `None` for the root.
    pub input: Option<Vec3>,
    /// Accumulated cost from the root.
    pub g_score: f64,
    /// `g_score` plus the inflated heuristic to the goal.
    pub f_score: f64,
    /// Index of the parent node in the owning pool, or `None` for the root.
    pub parent: Option<usize>,
    /// Current lifecycle tag.
    pub node_state: NodeState,
}

impl PathNode {
    fn root(state: State, time: f64) -> Self {
        Self {
            state,
            time,
            input: None,
            g_score: 0.0,
            f_score: 0.0,
            parent: None,
            node_state: NodeState::NotExpand,
        }
    }
}

/// Integer cell index of a position at resolution `ρ`, used as the key of
/// the position-only hash index.
pub type Cell3 = [i64; 3];
/// Integer cell index of a position and a time, used as the key of the
/// position-plus-time hash index consulted in dynamic mode.
pub type Cell4 = [i64; 4];

/// Position cell index `⌊p_i / ρ⌋` (§3).
#[must_use]
pub fn position_cell(pos: Vec3, resolution: f64) -> Cell3 {
    [
        (pos.x / resolution).floor() as i64,
        (pos.y / resolution).floor() as i64,
        (pos.z / resolution).floor() as i64,
    ]
}

/// Position-plus-time cell index, appending `⌊t / ρ_t⌋` to [`position_cell`].
#[must_use]
pub fn position_time_cell(pos: Vec3, time: f64, resolution: f64, time_resolution: f64) -> Cell4 {
    let [x, y, z] = position_cell(pos, resolution);
    [x, y, z, (time / time_resolution).floor() as i64]
}

/// A pre-allocated arena of [`PathNode`]s plus the two hash indices that map
/// a discretized state back to a node already present in the open or closed
/// set.
///
/// Both the position-only (`by_cell3`) and position-plus-time (`by_cell4`)
/// indices are always maintained, regardless of whether the search is
/// running in dynamic mode: the original planner's `NodeHashTable` keeps
/// both `data_3d_` and `data_4d_` unconditionally, and a node inserted under
/// one discretization is cheap to also insert under the other. Only the
/// *query* the search performs depends on the dynamic flag.
pub struct NodePool {
    nodes: Vec<PathNode>,
    capacity: usize,
    resolution: f64,
    time_resolution: f64,
    by_cell3: FxHashMap<Cell3, usize>,
    by_cell4: FxHashMap<Cell4, usize>,
}

impl NodePool {
    /// Builds an empty pool with room for `capacity` nodes.
    #[must_use]
    pub fn new(capacity: usize, resolution: f64, time_resolution: f64) -> Self {
        Self {
            nodes: Vec::with_capacity(capacity),
            capacity,
            resolution,
            time_resolution,
            by_cell3: FxHashMap::default(),
            by_cell4: FxHashMap::default(),
        }
    }

    /// Empties the pool and both indices, keeping the underlying allocation.
    pub fn reset(&mut self) {
        self.nodes.clear();
        self.by_cell3.clear();
        self.by_cell4.clear();
    }

    /// Number of nodes currently allocated.
    #[must_use]
    pub fn len(&self) -> usize {
        self.nodes.len()
    }

    /// Whether the pool currently holds no nodes.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.nodes.is_empty()
    }

    /// Remaining capacity before the pool is exhausted.
    #[must_use]
    pub fn remaining(&self) -> usize {
        self.capacity.saturating_sub(self.nodes.len())
    }

    /// Inserts the root node (no parent, zero cost) and indexes it.
    ///
    /// Returns its index. The pool must be empty; callers call
    /// [`NodePool::reset`] beforehand.
    pub fn push_root(&mut self, state: State, time: f64) -> usize {
        debug_assert!(self.nodes.is_empty());
        let idx = self.nodes.len();
        self.nodes.push(PathNode::root(state, time));
        self.index(idx);
        idx
    }

    /// Allocates a new expanded node if capacity remains, indexing it under
    /// both hash tables.
    ///
    /// Returns `None` when the pool is full; the caller (§4.7) treats this
    /// as the node-budget exhaustion case.
    #[expect(clippy::too_many_arguments)]
    pub fn push(
        &mut self,
        state: State,
        time: f64,
        input: Vec3,
        g_score: f64,
        f_score: f64,
        parent: usize,
    ) -> Option<usize> {
        if self.nodes.len() >= self.capacity {
            return None;
        }
        let idx = self.nodes.len();
        self.nodes.push(PathNode {
            state,
            time,
            input: Some(input),
            g_score,
            f_score,
            parent: Some(parent),
            node_state: NodeState::NotExpand,
        });
        self.index(idx);
        Some(idx)
    }

    fn index(&mut self, idx: usize) {
        let node = &self.nodes[idx];
        self.by_cell3
            .insert(position_cell(node.state.pos, self.resolution), idx);
        self.by_cell4.insert(
            position_time_cell(node.state.pos, node.time, self.resolution, self.time_resolution),
            idx,
        );
    }

    /// Looks up the node occupying a position's cell, ignoring time.
    #[must_use]
    pub fn find_by_position(&self, pos: Vec3) -> Option<usize> {
        self.by_cell3.get(&position_cell(pos, self.resolution)).copied()
    }

    /// Looks up the node occupying a position-and-time cell.
    #[must_use]
    pub fn find_by_position_time(&self, pos: Vec3, time: f64) -> Option<usize> {
        self.by_cell4
            .get(&position_time_cell(pos, time, self.resolution, self.time_resolution))
            .copied()
    }

    /// Immutable access to a node by index.
    #[must_use]
    pub fn get(&self, idx: usize) -> &PathNode {
        &self.nodes[idx]
    }

    /// Mutable access to a node by index, e.g. to update its scores or
    /// lifecycle tag on a cheaper re-expansion.
    pub fn get_mut(&mut self, idx: usize) -> &mut PathNode {
        &mut self.nodes[idx]
    }

    /// Walks parent links from `idx` back to the root, returning states in
    /// root-to-`idx` order.
    #[must_use]
    pub fn path_to_root(&self, idx: usize) -> Vec<usize> {
        let mut path = Vec::new();
        let mut cur = Some(idx);
        while let Some(i) = cur {
            path.push(i);
            cur = self.nodes[i].parent;
        }
        path.reverse();
        path
    }
}
