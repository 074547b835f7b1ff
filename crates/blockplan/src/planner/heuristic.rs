//! Admissible cost estimator for flattened goals.
//!
//! Every primitive action costs 1. Two bounds follow: moving one object
//! costs at least its pick plus the horizontal distance, and unburying an
//! object costs at least 4 per blocker (approach, pick, a step aside,
//! drop). Each conjunctive clause combines the minimum arm-approach over
//! its literals with the sum of their work terms; disjunction takes the
//! cheapest clause.

use crate::goal::Literal;
use crate::physics::Relation;
use crate::world::{World, FLOOR};

use super::{ArmState, StateScene};

/// Estimate the remaining actions for a sum-of-products goal
pub(super) fn estimate(state: &ArmState, world: &World, clauses: &[Vec<Literal>]) -> usize {
    clauses
        .iter()
        .map(|clause| clause_estimate(state, world, clause))
        .min()
        .unwrap_or(0)
}

fn clause_estimate(state: &ArmState, world: &World, clause: &[Literal]) -> usize {
    let mut approach = usize::MAX;
    let mut work = 0;
    for literal in clause {
        let (a, w) = literal_estimate(state, world, literal);
        approach = approach.min(a);
        work += w;
    }
    if approach == usize::MAX {
        0
    } else {
        // one arm: the cheapest approach is shared, the work is not
        approach + work
    }
}

/// `(arm-approach, task-work)` lower bound for one literal
fn literal_estimate(state: &ArmState, world: &World, literal: &Literal) -> (usize, usize) {
    let scene = StateScene { state, world };
    if literal.eval(&scene) {
        return (0, 0);
    }
    if !literal.polarity {
        // negated literals are outside the emitted goal language
        return (0, 0);
    }
    match (literal.relation, literal.args.as_slice()) {
        // the search drives the gripper without guidance
        (Relation::Holding, _) => (0, 0),
        (Relation::OnTop | Relation::Inside, [a, b]) => on_top_estimate(state, a, b),
        (Relation::Above, [a, b]) => above_estimate(state, a, b),
        (Relation::Under, [a, b]) => {
            if b == FLOOR {
                (0, 0)
            } else {
                above_estimate(state, b, a)
            }
        }
        (Relation::LeftOf, [a, b]) => lateral_estimate(state, a, b),
        (Relation::RightOf, [a, b]) => lateral_estimate(state, b, a),
        (Relation::Beside, [a, b]) => beside_estimate(state, a, b),
        _ => (0, 0),
    }
}

fn is_held(state: &ArmState, id: &str) -> bool {
    state.holding.as_deref() == Some(id)
}

/// Current column of an object; the arm column when it is held
fn col_or_arm(state: &ArmState, id: &str) -> usize {
    if is_held(state, id) {
        state.arm
    } else {
        state.position(id).map_or(state.arm, |(col, _)| col)
    }
}

/// Lower bound on clearing everything above an object: 4 per blocker
fn free_cost(state: &ArmState, id: &str) -> usize {
    if is_held(state, id) {
        return 0;
    }
    match state.position(id) {
        Some((col, height)) => 4 * (state.stacks[col].len() - 1 - height),
        None => 0,
    }
}

/// Lower bound on carrying an object to a destination column: the
/// horizontal distance plus the pick, which is already paid when held
fn move_object(state: &ArmState, id: &str, destination: usize) -> usize {
    let distance = col_or_arm(state, id).abs_diff(destination);
    if is_held(state, id) {
        distance
    } else {
        distance + 1
    }
}

/// Arm travel to visit two distinct columns, whichever first
fn approach_two(arm: usize, first: usize, second: usize) -> usize {
    arm.abs_diff(first).min(arm.abs_diff(second)) + first.abs_diff(second) - 1
}

/// Cheapest column for a floor placement of `id`, scored by clearing cost
/// plus arm travel. The object's own column does not count the object
/// itself: only what sits beneath it needs to go.
fn best_floor_spot(state: &ArmState, id: &str, from: usize) -> (usize, usize) {
    let own_column = state.position(id).map(|(col, _)| col);
    let mut best = (from, usize::MAX, 0);
    for (col, stack) in state.stacks.iter().enumerate() {
        let mut height = stack.len();
        if own_column == Some(col) {
            height -= 1;
        }
        let clearing = 4 * height;
        let score = clearing + col.abs_diff(from);
        if score < best.1 {
            best = (col, score, clearing);
        }
    }
    (best.0, best.2)
}

fn on_top_estimate(state: &ArmState, top: &str, bottom: &str) -> (usize, usize) {
    if top == FLOOR {
        return (0, 0);
    }
    let top_x = col_or_arm(state, top);
    let free_top = free_cost(state, top);
    if bottom != FLOOR && is_held(state, bottom) {
        // a held support may be dropped anywhere, so its column anchors
        // nothing; what remains certain is its drop, the pick of `top`,
        // and clearing whatever buries `top`
        return (state.arm.abs_diff(top_x), free_top + 2);
    }
    let (bottom_x, free_bottom) = if bottom == FLOOR {
        best_floor_spot(state, top, top_x)
    } else {
        (col_or_arm(state, bottom), free_cost(state, bottom))
    };
    let arm = state.arm;
    if free_top == 0 {
        (arm.abs_diff(top_x), free_bottom + move_object(state, top, bottom_x))
    } else if free_bottom == 0 {
        (arm.abs_diff(bottom_x), free_top + move_object(state, top, bottom_x))
    } else if top_x == bottom_x {
        // a shared stack: clearing the deeper one clears the other
        (arm.abs_diff(top_x), free_top.max(free_bottom))
    } else {
        (
            approach_two(arm, top_x, bottom_x),
            free_top + free_bottom + move_object(state, top, bottom_x),
        )
    }
}

fn above_estimate(state: &ArmState, top: &str, bottom: &str) -> (usize, usize) {
    if top == FLOOR {
        return (0, 0);
    }
    if bottom == FLOOR {
        // anywhere in a stack is above the floor; a held object needs a drop
        return (0, usize::from(is_held(state, top)));
    }
    let top_x = col_or_arm(state, top);
    if is_held(state, bottom) {
        // the support can land anywhere: only its drop and the pick of
        // `top` (nothing can slide in beneath a resting object) are certain
        return (state.arm.abs_diff(top_x), free_cost(state, top) + 2);
    }
    let bottom_x = col_or_arm(state, bottom);
    (
        state.arm.abs_diff(top_x),
        free_cost(state, top) + move_object(state, top, bottom_x),
    )
}

/// Lower bound for `left` ending strictly left of `right`: free and carry
/// whichever endpoint is cheaper next to the other. With no room on the
/// required side the fallback is the full table width.
fn lateral_estimate(state: &ArmState, left: &str, right: &str) -> (usize, usize) {
    if left == FLOOR || right == FLOOR {
        return (0, 0);
    }
    if is_held(state, left) || is_held(state, right) {
        // a held endpoint may land anywhere; only its drop is certain
        return (0, 1);
    }
    let width = state.stacks.len();
    let left_x = col_or_arm(state, left);
    let right_x = col_or_arm(state, right);

    let carry_left = match right_x.checked_sub(1) {
        Some(target) => (
            state.arm.abs_diff(left_x),
            free_cost(state, left) + move_object(state, left, target),
        ),
        None => (0, width),
    };
    let carry_right = if left_x + 1 < width {
        (
            state.arm.abs_diff(right_x),
            free_cost(state, right) + move_object(state, right, left_x + 1),
        )
    } else {
        (0, width)
    };
    cheaper(carry_left, carry_right)
}

/// Lower bound for ending in adjacent columns: carry either object next to
/// the other, on whichever side exists
fn beside_estimate(state: &ArmState, a: &str, b: &str) -> (usize, usize) {
    if a == FLOOR || b == FLOOR {
        return (0, 0);
    }
    if is_held(state, a) || is_held(state, b) {
        // a held endpoint may land anywhere; only its drop is certain
        return (0, 1);
    }
    let width = state.stacks.len();
    let a_x = col_or_arm(state, a);
    let b_x = col_or_arm(state, b);
    let mut best: Option<(usize, usize)> = None;
    for (moved, moved_x, anchor_x) in [(a, a_x, b_x), (b, b_x, a_x)] {
        let neighbours = [
            anchor_x.checked_sub(1),
            (anchor_x + 1 < width).then_some(anchor_x + 1),
        ];
        for target in neighbours.into_iter().flatten() {
            let option = (
                state.arm.abs_diff(moved_x),
                free_cost(state, moved) + move_object(state, moved, target),
            );
            best = Some(match best {
                Some(current) => cheaper(current, option),
                None => option,
            });
        }
    }
    best.unwrap_or((0, width))
}

fn cheaper(a: (usize, usize), b: (usize, usize)) -> (usize, usize) {
    if a.0 + a.1 <= b.0 + b.1 {
        a
    } else {
        b
    }
}
