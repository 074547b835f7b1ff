//! Property tests for the planner: object conservation under action
//! sequences and admissibility of the cost estimator.

use proptest::prelude::*;
use std::collections::HashMap;

use crate::goal::Literal;
use crate::physics::{can_rest_on, Relation};
use crate::search::{astar, SearchSpace, Solution};
use crate::world::{Form, ObjectDef, Size, World, FLOOR};

use super::{heuristic, successors, ArmState, PlanSpace, PlanStep};

/// Build a small legal world: objects are placed column by column, each on
/// the first column whose top accepts it.
fn build_world(columns: usize, picks: &[usize]) -> World {
    let catalogue = [
        ("o0", ObjectDef::new(Form::Brick, Size::Large, "green")),
        ("o1", ObjectDef::new(Form::Box, Size::Large, "yellow")),
        ("o2", ObjectDef::new(Form::Ball, Size::Small, "white")),
        ("o3", ObjectDef::new(Form::Plank, Size::Small, "red")),
    ];
    let mut stacks: Vec<Vec<String>> = vec![Vec::new(); columns];
    let mut objects: HashMap<String, ObjectDef> = HashMap::new();
    for (&preferred, (id, def)) in picks.iter().zip(catalogue.iter()) {
        let column = (0..columns)
            .map(|offset| (preferred + offset) % columns)
            .find(|&col| {
                let top = stacks[col].last().map(|t| &objects[t]);
                can_rest_on(def, top)
            });
        if let Some(col) = column {
            stacks[col].push(id.to_string());
            objects.insert(id.to_string(), def.clone());
        }
    }
    World {
        objects,
        stacks,
        holding: None,
        arm: 0,
    }
}

fn arb_world() -> impl Strategy<Value = World> {
    (2..=4usize, proptest::collection::vec(0..4usize, 1..=4))
        .prop_map(|(columns, picks)| build_world(columns, &picks))
}

/// The same planning problem with the estimator switched off, for
/// uninformed reference searches
struct Blind<'a>(&'a PlanSpace<'a>);

impl SearchSpace for Blind<'_> {
    type State = ArmState;
    type Key = String;
    type Edge = PlanStep;

    fn key(&self, state: &ArmState) -> String {
        self.0.key(state)
    }

    fn expand(&self, state: &ArmState) -> Vec<(PlanStep, ArmState)> {
        self.0.expand(state)
    }

    fn is_goal(&self, state: &ArmState) -> bool {
        self.0.is_goal(state)
    }

    fn estimate(&self, _state: &ArmState) -> usize {
        0
    }
}

fn scene_ids(state: &ArmState) -> Vec<String> {
    let mut ids: Vec<String> = state
        .stacks
        .iter()
        .flat_map(|stack| stack.iter().cloned())
        .chain(state.holding.clone())
        .collect();
    ids.sort_unstable();
    ids
}

proptest! {
    /// Every state reachable through the successor relation keeps exactly
    /// the original objects, each in one place
    #[test]
    fn successors_conserve_objects(
        world in arb_world(),
        choices in proptest::collection::vec(0..8usize, 0..24),
    ) {
        let mut expected: Vec<String> = world.objects.keys().cloned().collect();
        expected.sort_unstable();

        let mut state = ArmState::from_world(&world);
        for choice in choices {
            let next = successors(&state, &world);
            if next.is_empty() {
                break;
            }
            state = next[choice % next.len()].1.clone();
            prop_assert_eq!(scene_ids(&state), expected.clone());
            prop_assert!(state.arm < world.columns());
        }
    }

    /// The estimator never exceeds the true optimal cost found by an
    /// uninformed search on the same problem
    #[test]
    fn estimator_is_admissible(
        world in arb_world(),
        relation_pick in 0..7usize,
        a_pick in 0..4usize,
        b_pick in 0..5usize,
    ) {
        let ids: Vec<String> = world.present().cloned().collect();
        prop_assume!(ids.len() >= 2);

        let relations = [
            Relation::OnTop,
            Relation::Inside,
            Relation::Above,
            Relation::Under,
            Relation::LeftOf,
            Relation::RightOf,
            Relation::Beside,
        ];
        let relation = relations[relation_pick % relations.len()];
        let a = ids[a_pick % ids.len()].clone();
        let b = if b_pick == 4 && matches!(relation, Relation::OnTop | Relation::Above) {
            FLOOR.to_string()
        } else {
            ids[b_pick % ids.len()].clone()
        };
        prop_assume!(a != b);

        let clauses = vec![vec![Literal::positive(relation, vec![a, b])]];
        let start = ArmState::from_world(&world);
        let space = PlanSpace { world: &world, clauses };

        match astar(&Blind(&space), start.clone(), 50_000, None) {
            Ok(Solution { path, .. }) => {
                // every suffix of an optimal path is optimal, so the
                // estimate is checked exactly at each state along it
                let bound = heuristic::estimate(&start, &world, &space.clauses);
                prop_assert!(
                    bound <= path.len(),
                    "estimate {} exceeds optimal cost {}",
                    bound,
                    path.len()
                );
                for (done, (_, state)) in path.iter().enumerate() {
                    let remaining = path.len() - (done + 1);
                    let bound = heuristic::estimate(state, &world, &space.clauses);
                    prop_assert!(
                        bound <= remaining,
                        "estimate {} exceeds remaining cost {}",
                        bound,
                        remaining
                    );
                }
            }
            // unreachable goals put no constraint on the estimate
            Err(_) => {}
        }
    }
}
