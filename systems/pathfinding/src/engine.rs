//! Bounded Dijkstra expansion shared by the seek and avoidance finders.
//!
//! The frontier is ordered by accumulated cost and then by cell, so equal-cost
//! nodes always settle in the same order and the predecessor of a cell only
//! changes on a strict improvement. Both rules together make every search a
//! pure function of its inputs.

use std::{
    cmp::Reverse,
    collections::{hash_map::Entry, BTreeMap, BinaryHeap, HashMap},
};

use ordered_float::OrderedFloat;
use wayfarer_core::{GridPosition, WorldQuery};

use crate::{MovementCostProfile, Path, SearchOutcome};

/// North, west, east, south.
const CARDINAL_STEPS: [(i32, i32); 4] = [(0, -1), (-1, 0), (1, 0), (0, 1)];
const DIAGONAL_STEPS: [(i32, i32); 4] = [(-1, -1), (1, -1), (-1, 1), (1, 1)];

/// Limits applied to a single expansion.
#[derive(Clone, Copy, Debug, PartialEq)]
pub(crate) struct Bounds {
    /// Largest accumulated cost that may be enqueued.
    pub(crate) radius: f32,
    /// Largest number of nodes that may be settled.
    pub(crate) expansion_limit: Option<usize>,
}

impl Bounds {
    const UNBOUNDED: Self = Self {
        radius: f32::INFINITY,
        expansion_limit: None,
    };
}

/// Outcome of a search together with the work it took.
#[derive(Clone, Debug, PartialEq)]
pub(crate) struct Searched {
    pub(crate) outcome: SearchOutcome,
    pub(crate) expanded: usize,
    pub(crate) truncated: bool,
}

/// Which end of an edge pays the terrain cost.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
enum Direction {
    /// Costs accumulate from the sources outwards: entering a neighbour pays
    /// for the neighbour.
    Outward,
    /// Costs accumulate towards the sources: stepping from a neighbour into
    /// the current cell pays for the current cell.
    Inward,
}

enum Visit {
    Continue,
    Stop,
}

#[derive(Clone, Copy, Debug)]
struct Node {
    cost: f32,
    parent: Option<GridPosition>,
    settled: bool,
}

#[derive(Debug, Default)]
struct Expansion {
    nodes: HashMap<GridPosition, Node>,
    expanded: usize,
    truncated: bool,
}

impl Expansion {
    fn settled_cost(&self, cell: GridPosition) -> Option<f32> {
        self.nodes
            .get(&cell)
            .filter(|node| node.settled)
            .map(|node| node.cost)
    }

    fn is_settled(&self, cell: GridPosition) -> bool {
        self.settled_cost(cell).is_some()
    }

    fn settled(&self) -> impl Iterator<Item = (GridPosition, f32)> + '_ {
        self.nodes
            .iter()
            .filter(|(_, node)| node.settled)
            .map(|(cell, node)| (*cell, node.cost))
    }

    fn trace(&self, destination: GridPosition) -> Vec<GridPosition> {
        let mut cells = vec![destination];
        let mut cursor = destination;
        while let Some(parent) = self.nodes.get(&cursor).and_then(|node| node.parent) {
            cells.push(parent);
            cursor = parent;
        }
        cells.reverse();
        cells
    }
}

struct Graph<'a, W: ?Sized> {
    world: &'a W,
    profile: &'a MovementCostProfile,
}

impl<'a, W> Graph<'a, W>
where
    W: WorldQuery + ?Sized,
{
    fn new(world: &'a W, profile: &'a MovementCostProfile) -> Self {
        Self { world, profile }
    }

    fn is_enterable(&self, cell: GridPosition) -> bool {
        self.world
            .terrain(cell)
            .is_some_and(|terrain| self.profile.is_passable(terrain))
    }

    /// Planar neighbours inside the world, cardinal first.
    ///
    /// A diagonal is only offered when both orthogonal cells it would brush
    /// past can be entered.
    fn neighbours(&self, cell: GridPosition, out: &mut Vec<(GridPosition, bool)>) {
        out.clear();

        for (dx, dy) in CARDINAL_STEPS {
            if let Some(next) = cell.offset(dx, dy) {
                if self.world.terrain(next).is_some() {
                    out.push((next, false));
                }
            }
        }

        if !self.profile.allows_diagonal() {
            return;
        }

        for (dx, dy) in DIAGONAL_STEPS {
            let Some(next) = cell.offset(dx, dy) else {
                continue;
            };
            let corners_clear = [cell.offset(dx, 0), cell.offset(0, dy)]
                .into_iter()
                .all(|corner| corner.is_some_and(|corner| self.is_enterable(corner)));
            if corners_clear && self.world.terrain(next).is_some() {
                out.push((next, true));
            }
        }
    }

    fn edge_cost(
        &self,
        direction: Direction,
        from: GridPosition,
        to: GridPosition,
        diagonal: bool,
    ) -> Option<f32> {
        let entered = match direction {
            Direction::Outward => to,
            Direction::Inward => from,
        };
        self.world
            .terrain(entered)
            .and_then(|terrain| self.profile.step_cost(terrain, diagonal))
    }

    fn expand<F>(
        &self,
        sources: &[GridPosition],
        direction: Direction,
        bounds: Bounds,
        mut visit: F,
    ) -> Expansion
    where
        F: FnMut(GridPosition, f32) -> Visit,
    {
        let mut expansion = Expansion::default();
        let mut frontier = BinaryHeap::new();

        for &source in sources {
            if let Entry::Vacant(entry) = expansion.nodes.entry(source) {
                let _ = entry.insert(Node {
                    cost: 0.0,
                    parent: None,
                    settled: false,
                });
                frontier.push(Reverse((OrderedFloat(0.0_f32), source)));
            }
        }

        let mut neighbours = Vec::with_capacity(8);

        while let Some(Reverse((OrderedFloat(cost), cell))) = frontier.pop() {
            let Some(node) = expansion.nodes.get_mut(&cell) else {
                continue;
            };
            if node.settled {
                continue;
            }
            if bounds
                .expansion_limit
                .is_some_and(|limit| expansion.expanded >= limit)
            {
                expansion.truncated = true;
                break;
            }

            node.settled = true;
            expansion.expanded += 1;

            if let Visit::Stop = visit(cell, cost) {
                break;
            }

            self.neighbours(cell, &mut neighbours);
            for &(next, diagonal) in &neighbours {
                let Some(step) = self.edge_cost(direction, cell, next, diagonal) else {
                    continue;
                };
                let candidate = cost + step;
                if candidate > bounds.radius {
                    continue;
                }

                match expansion.nodes.entry(next) {
                    Entry::Occupied(mut entry) => {
                        let node = entry.get_mut();
                        if node.settled || candidate >= node.cost {
                            continue;
                        }
                        node.cost = candidate;
                        node.parent = Some(cell);
                    }
                    Entry::Vacant(entry) => {
                        let _ = entry.insert(Node {
                            cost: candidate,
                            parent: Some(cell),
                            settled: false,
                        });
                    }
                }
                frontier.push(Reverse((OrderedFloat(candidate), next)));
            }
        }

        expansion
    }
}

/// Finds the cheapest path from `start` to any of the `goals`.
///
/// `goals` maps each goal cell to its classification priority. Every goal
/// settled at the cost of the first one is considered, and the lowest
/// priority then the smallest cell wins.
pub(crate) fn seek<W>(
    world: &W,
    profile: &MovementCostProfile,
    goals: &BTreeMap<GridPosition, usize>,
    start: GridPosition,
    bounds: Bounds,
) -> Searched
where
    W: WorldQuery + ?Sized,
{
    if goals.is_empty() || world.terrain(start).is_none() {
        return Searched {
            outcome: SearchOutcome::NoPathFound,
            expanded: 0,
            truncated: false,
        };
    }

    let graph = Graph::new(world, profile);
    let mut best: Option<(f32, usize, GridPosition)> = None;

    let expansion = graph.expand(&[start], Direction::Outward, bounds, |cell, cost| {
        if let Some((found, _, _)) = best {
            if cost > found {
                return Visit::Stop;
            }
        }
        if let Some(&priority) = goals.get(&cell) {
            let replaces = best.map_or(true, |(_, current_priority, current_cell)| {
                (priority, cell) < (current_priority, current_cell)
            });
            if replaces {
                best = Some((cost, priority, cell));
            }
        }
        Visit::Continue
    });

    let outcome = match best {
        Some((cost, _, destination)) => {
            SearchOutcome::Path(Path::new(expansion.trace(destination), cost, None))
        }
        None => SearchOutcome::NoPathFound,
    };

    Searched {
        outcome,
        expanded: expansion.expanded,
        truncated: expansion.truncated,
    }
}

/// Finds the reachable cell farthest from every goal.
///
/// Cells reachable from `start` within the radius are ranked by their
/// cost-distance to the nearest goal (larger is better, unreachable by any
/// goal is best), then by the cost to get there, then by cell.
///
/// The expansion limit caps the reach pass only. Goal distances are measured
/// without a limit, stopping once every reached cell has its exact distance.
pub(crate) fn avoid<W>(
    world: &W,
    profile: &MovementCostProfile,
    goals: &BTreeMap<GridPosition, usize>,
    start: GridPosition,
    bounds: Bounds,
) -> Searched
where
    W: WorldQuery + ?Sized,
{
    if world.terrain(start).is_none() {
        return Searched {
            outcome: SearchOutcome::NoSafeCellFound,
            expanded: 0,
            truncated: false,
        };
    }

    let graph = Graph::new(world, profile);
    let reach = graph.expand(&[start], Direction::Outward, bounds, |_, _| Visit::Continue);

    let mut pending = reach.settled().count();
    let sources: Vec<GridPosition> = goals.keys().copied().collect();
    let field = graph.expand(
        &sources,
        Direction::Inward,
        Bounds::UNBOUNDED,
        |cell, _| {
            if reach.is_settled(cell) {
                pending -= 1;
                if pending == 0 {
                    return Visit::Stop;
                }
            }
            Visit::Continue
        },
    );

    let refuge = reach
        .settled()
        .map(|(cell, cost)| {
            let distance = field.settled_cost(cell).unwrap_or(f32::INFINITY);
            (cell, cost, distance)
        })
        .min_by(|left, right| {
            OrderedFloat(right.2)
                .cmp(&OrderedFloat(left.2))
                .then_with(|| OrderedFloat(left.1).cmp(&OrderedFloat(right.1)))
                .then_with(|| left.0.cmp(&right.0))
        });

    let outcome = match refuge {
        Some((cell, cost, distance)) => {
            let goal_distance = distance.is_finite().then_some(distance);
            SearchOutcome::Path(Path::new(reach.trace(cell), cost, goal_distance))
        }
        None => SearchOutcome::NoSafeCellFound,
    };

    Searched {
        outcome,
        expanded: reach.expanded + field.expanded,
        truncated: reach.truncated,
    }
}
