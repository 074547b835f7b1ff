//! Planner: arm states, successor generation, and plan assembly

mod heuristic;
#[cfg(test)]
mod proptest_tests;

use serde::{Deserialize, Serialize};
use std::fmt;
use std::sync::Arc;
use std::time::Instant;
use tracing::debug;

use crate::config::PlannerConfig;
use crate::error::{Error, Result};
use crate::goal::{Goal, Literal};
use crate::interpret::Interpretation;
use crate::physics::{can_rest_on, Scene};
use crate::search::{astar, SearchSpace};
use crate::world::{Form, ObjectDef, World};

/// Primitive arm actions
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Action {
    Left,
    Right,
    Pick,
    Drop,
}

const ACTIONS: [Action; 4] = [Action::Left, Action::Right, Action::Pick, Action::Drop];

impl Action {
    /// Single-letter wire token
    pub fn token(self) -> &'static str {
        match self {
            Action::Left => "l",
            Action::Right => "r",
            Action::Pick => "p",
            Action::Drop => "d",
        }
    }

    /// The action undone by this one
    pub fn inverse(self) -> Action {
        match self {
            Action::Left => Action::Right,
            Action::Right => Action::Left,
            Action::Pick => Action::Drop,
            Action::Drop => Action::Pick,
        }
    }
}

impl fmt::Display for Action {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.token())
    }
}

/// One emitted step: a primitive action and its narration
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct PlanStep {
    pub action: Action,
    pub message: String,
}

/// Search state: stack layout with columns shared between parent and child
/// states, the gripper, and the arm column.
///
/// `last` records the action that produced the state so that its inverse
/// can be pruned from the successors; it is never part of the canonical
/// identity.
#[derive(Debug, Clone)]
pub struct ArmState {
    stacks: Vec<Arc<Vec<String>>>,
    holding: Option<String>,
    arm: usize,
    last: Option<Action>,
}

impl ArmState {
    pub fn from_world(world: &World) -> Self {
        ArmState {
            stacks: world.stacks.iter().map(|s| Arc::new(s.clone())).collect(),
            holding: world.holding.clone(),
            arm: world.arm,
            last: None,
        }
    }

    pub fn holding(&self) -> Option<&str> {
        self.holding.as_deref()
    }

    pub fn arm(&self) -> usize {
        self.arm
    }

    fn top(&self, column: usize) -> Option<&String> {
        self.stacks[column].last()
    }

    fn position(&self, id: &str) -> Option<(usize, usize)> {
        self.stacks.iter().enumerate().find_map(|(col, stack)| {
            stack.iter().position(|o| o == id).map(|h| (col, h))
        })
    }

    /// Canonical identity covering stacks, gripper and arm only
    fn canonical_key(&self) -> String {
        let mut key = String::new();
        for (i, stack) in self.stacks.iter().enumerate() {
            if i > 0 {
                key.push(';');
            }
            for (j, id) in stack.iter().enumerate() {
                if j > 0 {
                    key.push(',');
                }
                key.push_str(id);
            }
        }
        key.push('|');
        if let Some(held) = &self.holding {
            key.push_str(held);
        }
        key.push('|');
        key.push_str(&self.arm.to_string());
        key
    }

    fn child(&self, action: Action) -> ArmState {
        ArmState {
            stacks: self.stacks.clone(),
            holding: self.holding.clone(),
            arm: self.arm,
            last: Some(action),
        }
    }

    /// Apply one primitive action if it is legal here, yielding the
    /// successor and its narration. Only the affected column is rebuilt;
    /// every other column stays shared with the parent.
    pub fn apply(&self, action: Action, world: &World) -> Option<(ArmState, String)> {
        match action {
            Action::Left => {
                if self.arm == 0 {
                    return None;
                }
                let mut next = self.child(action);
                next.arm -= 1;
                Some((next, "Moving left".to_string()))
            }
            Action::Right => {
                if self.arm + 1 >= self.stacks.len() {
                    return None;
                }
                let mut next = self.child(action);
                next.arm += 1;
                Some((next, "Moving right".to_string()))
            }
            Action::Pick => {
                if self.holding.is_some() {
                    return None;
                }
                let mut column = (*self.stacks[self.arm]).clone();
                let id = column.pop()?;
                let def = world.object(&id)?;
                let message = format!("Picking up the {}", def.form);
                let mut next = self.child(action);
                next.stacks[self.arm] = Arc::new(column);
                next.holding = Some(id);
                Some((next, message))
            }
            Action::Drop => {
                let held = self.holding.clone()?;
                let def = world.object(&held)?;
                let support = match self.top(self.arm) {
                    Some(top) => Some(world.object(top)?),
                    None => None,
                };
                if !can_rest_on(def, support) {
                    return None;
                }
                let message = match support {
                    None => format!("Dropping the {} on the floor", def.form),
                    Some(below) if below.form == Form::Box => {
                        format!("Dropping the {} in the {}", def.form, below.form)
                    }
                    Some(below) => format!("Dropping the {} on the {}", def.form, below.form),
                };
                let mut column = (*self.stacks[self.arm]).clone();
                column.push(held);
                let mut next = self.child(action);
                next.stacks[self.arm] = Arc::new(column);
                next.holding = None;
                Some((next, message))
            }
        }
    }
}

/// Legal successors of a state, pruning the inverse of the incoming action.
/// No physical configuration benefits from immediately undoing a move.
fn successors(state: &ArmState, world: &World) -> Vec<(PlanStep, ArmState)> {
    ACTIONS
        .into_iter()
        .filter(|action| state.last != Some(action.inverse()))
        .filter_map(|action| {
            state
                .apply(action, world)
                .map(|(next, message)| (PlanStep { action, message }, next))
        })
        .collect()
}

/// Scene view over a search state, borrowing the catalogue from the world
struct StateScene<'a> {
    state: &'a ArmState,
    world: &'a World,
}

impl Scene for StateScene<'_> {
    fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.state.position(id)
    }

    fn held(&self) -> Option<&str> {
        self.state.holding.as_deref()
    }

    fn def(&self, id: &str) -> Option<&ObjectDef> {
        self.world.object(id)
    }
}

/// The planning problem: a world and a goal flattened to sum-of-products
struct PlanSpace<'a> {
    world: &'a World,
    clauses: Vec<Vec<Literal>>,
}

impl PlanSpace<'_> {
    fn satisfied(&self, state: &ArmState) -> bool {
        let scene = StateScene {
            state,
            world: self.world,
        };
        self.clauses
            .iter()
            .any(|clause| clause.iter().all(|literal| literal.eval(&scene)))
    }
}

impl SearchSpace for PlanSpace<'_> {
    type State = ArmState;
    type Key = String;
    type Edge = PlanStep;

    fn key(&self, state: &ArmState) -> String {
        state.canonical_key()
    }

    fn expand(&self, state: &ArmState) -> Vec<(PlanStep, ArmState)> {
        successors(state, self.world)
    }

    fn is_goal(&self, state: &ArmState) -> bool {
        self.satisfied(state)
    }

    fn estimate(&self, state: &ArmState) -> usize {
        heuristic::estimate(state, self.world, &self.clauses)
    }
}

/// Find a minimal action sequence taking `world` to a state satisfying
/// `goal`.
///
/// # Errors
///
/// `NoPath` when the goal is unreachable, `SearchLimitExceeded` when the
/// configured expansion ceiling or deadline is hit, `InvalidWorld` when the
/// snapshot violates its structural invariants.
pub fn plan(world: &World, goal: &Goal, config: &PlannerConfig) -> Result<Vec<PlanStep>> {
    world.validate()?;
    let space = PlanSpace {
        world,
        clauses: goal.dnf(),
    };
    let deadline = config.timeout.map(|t| Instant::now() + t);
    let start = ArmState::from_world(world);
    let solution = astar(&space, start, config.max_states, deadline)?;
    debug!(
        goal = %goal,
        steps = solution.path.len(),
        expanded = solution.expanded,
        "plan found"
    );
    Ok(solution.path.into_iter().map(|(step, _)| step).collect())
}

/// An interpretation together with its emitted plan stream
#[derive(Debug, Clone, Serialize)]
pub struct PlannedInterpretation {
    #[serde(flatten)]
    pub interpretation: Interpretation,
    /// Interleaved narration and action tokens:
    /// `msg₁, cmd₁, msg₂, cmd₂, …` with `cmdᵢ ∈ {"l","r","p","d"}`
    pub plan: Vec<String>,
}

/// Plan every surviving interpretation against the same world
pub fn plan_all(
    interpretations: &[Interpretation],
    world: &World,
    config: &PlannerConfig,
) -> Result<Vec<PlannedInterpretation>> {
    interpretations
        .iter()
        .map(|interpretation| {
            let steps = plan(world, &interpretation.goal, config)?;
            let plan = steps
                .into_iter()
                .flat_map(|step| [step.message, step.action.token().to_string()])
                .collect();
            Ok(PlannedInterpretation {
                interpretation: interpretation.clone(),
                plan,
            })
        })
        .collect()
}

/// Execute an action sequence from a snapshot, producing the resulting
/// snapshot. Fails on the first illegal action. This is how a caller
/// commits a returned plan to its world.
pub fn apply_plan(world: &World, actions: &[Action]) -> Result<World> {
    world.validate()?;
    let mut state = ArmState::from_world(world);
    for &action in actions {
        let (next, _) = state.apply(action, world).ok_or_else(|| {
            Error::IllegalAction(format!("`{}` is illegal in {}", action, state.canonical_key()))
        })?;
        state = next;
    }
    Ok(World {
        objects: world.objects.clone(),
        stacks: state.stacks.iter().map(|s| (**s).clone()).collect(),
        holding: state.holding,
        arm: state.arm,
    })
}
