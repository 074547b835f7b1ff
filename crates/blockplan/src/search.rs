//! Generic A* driver over a pluggable search space

use indexmap::IndexMap;
use std::cmp::Reverse;
use std::collections::BinaryHeap;
use std::hash::Hash;
use std::time::Instant;
use tracing::debug;

use crate::error::{Error, Result};

/// A problem posed to the A* driver.
///
/// `Key` is the canonical identity of a state: two nodes with equal keys
/// denote the same physical configuration and are deduplicated, whatever
/// paths produced them. Path bookkeeping must never leak into the key.
pub trait SearchSpace {
    type State: Clone;
    type Key: Eq + Hash + Clone;
    type Edge: Clone;

    fn key(&self, state: &Self::State) -> Self::Key;
    /// Legal moves out of `state` with their successor states
    fn expand(&self, state: &Self::State) -> Vec<(Self::Edge, Self::State)>;
    fn is_goal(&self, state: &Self::State) -> bool;
    /// Admissible estimate of the remaining step count
    fn estimate(&self, state: &Self::State) -> usize;
}

/// Solution of a search: the edge sequence from start to goal, with the
/// states it passes through, and the number of expansions spent
#[derive(Debug)]
pub struct Solution<E, S> {
    pub path: Vec<(E, S)>,
    pub expanded: usize,
}

struct Node<E, S> {
    state: S,
    /// Index of the parent node and the edge taken from it; `None` at the root
    parent: Option<(usize, E)>,
    g: usize,
}

/// Best-first search with uniform step cost 1.
///
/// The open heap is ordered by `f = g + estimate` with insertion order as
/// the tie-break. Instead of decrease-key, improved routes push a fresh
/// entry and stale entries are skipped on pop (their recorded `g` no longer
/// matches the best known). With an admissible estimate the first goal pop
/// is optimal; should the estimate be inconsistent, a later cheaper route
/// re-enters the heap and the state is re-expanded.
///
/// # Errors
///
/// `NoPath` when the frontier empties, `SearchLimitExceeded` after
/// `max_states` expansions or once `deadline` has passed.
pub fn astar<P: SearchSpace>(
    space: &P,
    start: P::State,
    max_states: usize,
    deadline: Option<Instant>,
) -> Result<Solution<P::Edge, P::State>> {
    let mut nodes: Vec<Node<P::Edge, P::State>> = Vec::new();
    let mut best_g: IndexMap<P::Key, usize> = IndexMap::new();
    // (f, insertion order, node index)
    let mut open: BinaryHeap<Reverse<(usize, usize, usize)>> = BinaryHeap::new();
    let mut pushes = 0usize;
    let mut expanded = 0usize;

    let start_f = space.estimate(&start);
    best_g.insert(space.key(&start), 0);
    nodes.push(Node {
        state: start,
        parent: None,
        g: 0,
    });
    open.push(Reverse((start_f, pushes, 0)));

    while let Some(Reverse((_f, _order, index))) = open.pop() {
        let key = space.key(&nodes[index].state);
        if best_g.get(&key) != Some(&nodes[index].g) {
            continue; // a cheaper route to this state superseded the entry
        }

        if space.is_goal(&nodes[index].state) {
            debug!(expanded, cost = nodes[index].g, "goal reached");
            return Ok(Solution {
                path: reconstruct(&nodes, index),
                expanded,
            });
        }

        expanded += 1;
        if expanded > max_states {
            debug!(expanded, "expansion ceiling hit");
            return Err(Error::SearchLimitExceeded { expanded });
        }
        if deadline.is_some_and(|d| Instant::now() >= d) {
            debug!(expanded, "deadline passed");
            return Err(Error::SearchLimitExceeded { expanded });
        }

        let g_child = nodes[index].g + 1;
        for (edge, successor) in space.expand(&nodes[index].state) {
            let child_key = space.key(&successor);
            if best_g.get(&child_key).is_some_and(|&g| g <= g_child) {
                continue;
            }
            best_g.insert(child_key, g_child);
            let f = g_child + space.estimate(&successor);
            let child_index = nodes.len();
            nodes.push(Node {
                state: successor,
                parent: Some((index, edge)),
                g: g_child,
            });
            pushes += 1;
            open.push(Reverse((f, pushes, child_index)));
        }
    }

    debug!(expanded, "frontier exhausted");
    Err(Error::NoPath)
}

/// Walk parent links back to the root and reverse
fn reconstruct<E: Clone, S: Clone>(nodes: &[Node<E, S>], goal: usize) -> Vec<(E, S)> {
    let mut path = Vec::new();
    let mut current = goal;
    while let Some((parent, edge)) = &nodes[current].parent {
        path.push((edge.clone(), nodes[current].state.clone()));
        current = *parent;
    }
    path.reverse();
    path
}
