//! Interpreter: resolve entity descriptions and synthesise goal formulas

use serde::{Deserialize, Serialize};
use tracing::{debug, trace};

use crate::command::{Command, Entity, FormPattern, Location, ObjectDesc, Parse, Quantifier};
use crate::error::{Error, Result};
use crate::goal::{Goal, Literal};
use crate::physics::{related, Relation};
use crate::world::{World, FLOOR};

/// Candidate identifiers matching a description, with the quantifier
/// carried until goal assembly
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CandList {
    pub candidates: Vec<String>,
    pub quantifier: Quantifier,
}

/// A parse annotated with the goal formula it denotes
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Interpretation {
    #[serde(flatten)]
    pub parse: Parse,
    pub goal: Goal,
}

/// Interpret every candidate parse against the world.
///
/// Semantically invalid parses are dropped; an ambiguous binding of `the`
/// is remembered rather than propagated, so other parses still get their
/// chance. Afterwards: exactly one surviving interpretation is returned;
/// none at all is an error that names the ambiguous forms when ambiguity
/// was the cause; several survivors are rejected as an ambiguous command.
pub fn interpret(parses: &[Parse], world: &World) -> Result<Vec<Interpretation>> {
    world.validate()?;

    let mut valid = Vec::new();
    let mut ambiguous: Vec<Vec<String>> = Vec::new();

    for parse in parses {
        match interpret_command(&parse.command, world) {
            Ok(goal) => {
                debug!(input = %parse.input, goal = %goal, "parse interpreted");
                valid.push(Interpretation {
                    parse: parse.clone(),
                    goal,
                });
            }
            Err(Error::Ambiguity { candidates }) => {
                debug!(input = %parse.input, ?candidates, "parse left `the` unresolved");
                ambiguous.push(candidates);
            }
            // precondition and domain violations are not parse choices
            Err(err @ (Error::ArmEmpty | Error::UnsupportedRelation(_))) => return Err(err),
            Err(err) => {
                debug!(input = %parse.input, %err, "parse rejected");
            }
        }
    }

    match valid.len() {
        1 => Ok(valid),
        0 if !ambiguous.is_empty() => Err(Error::AmbiguousReference {
            forms: ambiguous_forms(&ambiguous, world),
        }),
        0 => Err(Error::NoValidInterpretation),
        n => Err(Error::MultipleInterpretations(n)),
    }
}

/// Distinct forms of the ambiguous candidates, in first-seen order
fn ambiguous_forms(ambiguous: &[Vec<String>], world: &World) -> Vec<String> {
    let mut forms: Vec<String> = Vec::new();
    for id in ambiguous.iter().flatten() {
        if let Some(def) = world.object(id) {
            let name = def.form.to_string();
            if !forms.contains(&name) {
                forms.push(name);
            }
        }
    }
    forms
}

/// Interpret a single command into its goal formula
pub fn interpret_command(command: &Command, world: &World) -> Result<Goal> {
    match command {
        Command::Take { entity } => {
            let candidates = resolve_entity(entity, world)?;
            make_holding_goal(candidates)
        }
        Command::Put { location } => {
            let held = world.holding.clone().ok_or(Error::ArmEmpty)?;
            let subject = CandList {
                candidates: vec![held],
                quantifier: Quantifier::The,
            };
            let target = resolve_location(location, world)?;
            make_moving_goal(location.relation, subject, target)
        }
        Command::Move { entity, location } => {
            let subject = resolve_entity(entity, world)?;
            let target = resolve_location(location, world)?;
            make_moving_goal(location.relation, subject, target)
        }
    }
}

fn resolve_location(location: &Location, world: &World) -> Result<CandList> {
    if location.relation == Relation::Holding {
        return Err(Error::UnsupportedRelation(location.relation.to_string()));
    }
    resolve_entity(&location.entity, world)
}

fn resolve_entity(entity: &Entity, world: &World) -> Result<CandList> {
    let candidates = resolve_object(&entity.object, world)?;
    Ok(CandList {
        candidates,
        quantifier: entity.quantifier,
    })
}

/// Fold a recursive description into the matching identifiers, scanning the
/// scene in a deterministic order (stacks left to right, bottom to top,
/// then the held object).
fn resolve_object(desc: &ObjectDesc, world: &World) -> Result<Vec<String>> {
    match desc {
        ObjectDesc::Simple { form, size, color } => {
            if *form == FormPattern::Floor {
                // the floor denotes itself, never a catalogued object
                return Ok(vec![FLOOR.to_string()]);
            }
            let matches: Vec<String> = world
                .present()
                .filter(|id| {
                    world.object(id).is_some_and(|def| {
                        form.admits(def.form)
                            && size.map_or(true, |s| s == def.size)
                            && color.as_deref().map_or(true, |c| c == def.color)
                    })
                })
                .cloned()
                .collect();
            trace!(?desc, ?matches, "leaf description resolved");
            Ok(matches)
        }
        ObjectDesc::Relative { object, location } => {
            let inner = resolve_object(object, world)?;
            if location.relation == Relation::Holding {
                return Err(Error::UnsupportedRelation(location.relation.to_string()));
            }
            let list = resolve_entity(&location.entity, world)?;
            let kept: Vec<String> = inner
                .into_iter()
                .filter(|candidate| in_location(candidate, location.relation, &list, world))
                .collect();
            trace!(relation = %location.relation, ?kept, "relative clause filtered");
            Ok(kept)
        }
    }
}

/// Relative-clause membership. `the` behaves as `any` at this level: a
/// nested "the box" succeeds for a candidate in *some* box, leaving any
/// real ambiguity to be raised at the top level of the command.
fn in_location(candidate: &str, relation: Relation, list: &CandList, world: &World) -> bool {
    let related_to = |other: &String| related(world, relation, candidate, other);
    match list.quantifier {
        Quantifier::All => list.candidates.iter().all(related_to),
        Quantifier::The | Quantifier::Any => list.candidates.iter().any(related_to),
    }
}

/// Goal for `take`: hold one of the candidates
fn make_holding_goal(list: CandList) -> Result<Goal> {
    if list.candidates.is_empty() {
        return Err(Error::NoMatch);
    }
    match list.quantifier {
        Quantifier::All if list.candidates.len() > 1 => Err(Error::CannotHoldMany),
        Quantifier::The if list.candidates.len() > 1 => Err(Error::Ambiguity {
            candidates: list.candidates,
        }),
        _ => Ok(Goal::or(
            list.candidates
                .into_iter()
                .map(|c| Goal::Leaf(Literal::positive(Relation::Holding, vec![c])))
                .collect(),
        )),
    }
}

/// Goal for `move`/`put`, dispatched on the quantifier cross-product.
///
/// `the` on either side demands a unique candidate. `any` contributes a
/// disjunction, `all` a conjunction; `all subject × any target` distributes
/// the disjunction per subject (each subject next to *some* target, not all
/// of them sharing one). A literal relating an object to itself is never
/// emitted; a combination with nothing left is no match.
fn make_moving_goal(relation: Relation, subject: CandList, target: CandList) -> Result<Goal> {
    if subject.candidates.is_empty() || target.candidates.is_empty() {
        return Err(Error::NoMatch);
    }
    if subject.quantifier == Quantifier::The && subject.candidates.len() > 1 {
        return Err(Error::Ambiguity {
            candidates: subject.candidates,
        });
    }
    if target.quantifier == Quantifier::The && target.candidates.len() > 1 {
        return Err(Error::Ambiguity {
            candidates: target.candidates,
        });
    }

    let leaf = |s: &String, o: &String| {
        (s != o).then(|| Goal::Leaf(Literal::positive(relation, vec![s.clone(), o.clone()])))
    };
    let subjects = &subject.candidates;
    let targets = &target.candidates;

    let mut pairs = Vec::new();
    for s in subjects {
        for o in targets {
            if let Some(literal) = leaf(s, o) {
                pairs.push(literal);
            }
        }
    }

    use Quantifier::{All, Any, The};
    let goal = match (subject.quantifier, target.quantifier) {
        // a single satisfying pair suffices; `the` sides are singletons here
        (The | Any, The | Any) => {
            if pairs.is_empty() {
                return Err(Error::NoMatch);
            }
            Goal::or(pairs)
        }
        // every pair must hold
        (All, All) | (All, The) | (The, All) => {
            if pairs.is_empty() {
                return Err(Error::NoMatch);
            }
            Goal::and(pairs)
        }
        // some subject relates to every target
        (Any, All) => {
            let branches: Vec<Goal> = subjects
                .iter()
                .filter_map(|s| {
                    let conjuncts: Vec<Goal> =
                        targets.iter().filter_map(|o| leaf(s, o)).collect();
                    (conjuncts.len() == targets.len()).then(|| Goal::and(conjuncts))
                })
                .collect();
            if branches.is_empty() {
                return Err(Error::NoMatch);
            }
            Goal::or(branches)
        }
        // every subject relates to some target
        (All, Any) => {
            let branches: Vec<Goal> = subjects
                .iter()
                .map(|s| {
                    let disjuncts: Vec<Goal> =
                        targets.iter().filter_map(|o| leaf(s, o)).collect();
                    if disjuncts.is_empty() {
                        return Err(Error::NoMatch);
                    }
                    Ok(Goal::or(disjuncts))
                })
                .collect::<Result<_>>()?;
            Goal::and(branches)
        }
    };
    Ok(goal)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::world::{Form, ObjectDef, Size};
    use std::collections::HashMap;

    // two large bricks in the left columns, two large planks to their right
    fn pair_world() -> World {
        let mut objects = HashMap::new();
        objects.insert("b1".to_string(), ObjectDef::new(Form::Brick, Size::Large, "green"));
        objects.insert("b2".to_string(), ObjectDef::new(Form::Brick, Size::Large, "blue"));
        objects.insert("p1".to_string(), ObjectDef::new(Form::Plank, Size::Large, "red"));
        objects.insert("p2".to_string(), ObjectDef::new(Form::Plank, Size::Large, "white"));
        World {
            objects,
            stacks: vec![
                vec!["b1".to_string()],
                vec!["b2".to_string()],
                vec!["p1".to_string()],
                vec!["p2".to_string()],
            ],
            holding: None,
            arm: 0,
        }
    }

    fn brick(color: Option<&str>) -> ObjectDesc {
        ObjectDesc::Simple {
            form: FormPattern::Brick,
            size: None,
            color: color.map(str::to_string),
        }
    }

    fn plank(color: Option<&str>) -> ObjectDesc {
        ObjectDesc::Simple {
            form: FormPattern::Plank,
            size: None,
            color: color.map(str::to_string),
        }
    }

    fn move_command(
        subject_quant: Quantifier,
        subject: ObjectDesc,
        target_quant: Quantifier,
        target: ObjectDesc,
    ) -> Command {
        Command::Move {
            entity: Entity::new(subject_quant, subject),
            location: Location {
                relation: Relation::Beside,
                entity: Entity::new(target_quant, target),
            },
        }
    }

    fn beside(a: &str, b: &str) -> Goal {
        Goal::Leaf(Literal::positive(
            Relation::Beside,
            vec![a.to_string(), b.to_string()],
        ))
    }

    #[test]
    fn quantifier_table_singular_rows() {
        let world = pair_world();
        use Quantifier::*;

        // the/the: a single literal
        let goal = interpret_command(
            &move_command(The, brick(Some("green")), The, plank(Some("red"))),
            &world,
        )
        .unwrap();
        assert_eq!(goal, beside("b1", "p1"));

        // the/any: disjunction over targets
        let goal =
            interpret_command(&move_command(The, brick(Some("green")), Any, plank(None)), &world)
                .unwrap();
        assert_eq!(goal, Goal::or(vec![beside("b1", "p1"), beside("b1", "p2")]));

        // the/all: conjunction over targets
        let goal =
            interpret_command(&move_command(The, brick(Some("green")), All, plank(None)), &world)
                .unwrap();
        assert_eq!(goal, Goal::and(vec![beside("b1", "p1"), beside("b1", "p2")]));

        // any/the and all/the mirror the above
        let goal =
            interpret_command(&move_command(Any, brick(None), The, plank(Some("red"))), &world)
                .unwrap();
        assert_eq!(goal, Goal::or(vec![beside("b1", "p1"), beside("b2", "p1")]));
        let goal =
            interpret_command(&move_command(All, brick(None), The, plank(Some("red"))), &world)
                .unwrap();
        assert_eq!(goal, Goal::and(vec![beside("b1", "p1"), beside("b2", "p1")]));
    }

    #[test]
    fn quantifier_table_product_rows() {
        let world = pair_world();
        use Quantifier::*;

        // any/any: one disjunction over all pairs
        let goal = interpret_command(&move_command(Any, brick(None), Any, plank(None)), &world)
            .unwrap();
        assert_eq!(
            goal,
            Goal::or(vec![
                beside("b1", "p1"),
                beside("b1", "p2"),
                beside("b2", "p1"),
                beside("b2", "p2"),
            ])
        );

        // all/all: one conjunction over all pairs
        let goal = interpret_command(&move_command(All, brick(None), All, plank(None)), &world)
            .unwrap();
        assert_eq!(
            goal,
            Goal::and(vec![
                beside("b1", "p1"),
                beside("b1", "p2"),
                beside("b2", "p1"),
                beside("b2", "p2"),
            ])
        );

        // any/all: some subject beside every target
        let goal = interpret_command(&move_command(Any, brick(None), All, plank(None)), &world)
            .unwrap();
        assert_eq!(
            goal,
            Goal::or(vec![
                Goal::and(vec![beside("b1", "p1"), beside("b1", "p2")]),
                Goal::and(vec![beside("b2", "p1"), beside("b2", "p2")]),
            ])
        );

        // all/any: every subject beside some target
        let goal = interpret_command(&move_command(All, brick(None), Any, plank(None)), &world)
            .unwrap();
        assert_eq!(
            goal,
            Goal::and(vec![
                Goal::or(vec![beside("b1", "p1"), beside("b1", "p2")]),
                Goal::or(vec![beside("b2", "p1"), beside("b2", "p2")]),
            ])
        );
    }

    #[test]
    fn the_with_several_candidates_is_ambiguous() {
        let world = pair_world();
        let err = interpret_command(
            &move_command(Quantifier::The, brick(None), Quantifier::Any, plank(None)),
            &world,
        )
        .unwrap_err();
        assert_eq!(
            err,
            Error::Ambiguity {
                candidates: vec!["b1".to_string(), "b2".to_string()]
            }
        );
    }

    #[test]
    fn self_pairs_are_dropped() {
        let world = pair_world();
        // "move any brick beside any brick": the four cross pairs minus the
        // two relating a brick to itself
        let goal = interpret_command(
            &move_command(Quantifier::Any, brick(None), Quantifier::Any, brick(None)),
            &world,
        )
        .unwrap();
        assert_eq!(goal, Goal::or(vec![beside("b1", "b2"), beside("b2", "b1")]));
    }

    #[test]
    fn nested_the_defers_disambiguation() {
        // "take the brick left of a plank" with two planks: the nested
        // entity keeps both planks, and b1/b2 both sit left of some plank,
        // so the top-level `the` is what reports the ambiguity
        let world = pair_world();
        let command = Command::Take {
            entity: Entity::new(
                Quantifier::The,
                ObjectDesc::Relative {
                    object: Box::new(brick(None)),
                    location: Location {
                        relation: Relation::LeftOf,
                        entity: Entity::new(Quantifier::The, plank(None)),
                    },
                },
            ),
        };
        let err = interpret_command(&command, &world).unwrap_err();
        assert!(matches!(err, Error::Ambiguity { .. }));
    }

    #[test]
    fn relative_clause_with_all_requires_every_member() {
        // "a blue brick left of all planks": b2 stands left of p1 and p2
        let world = pair_world();
        let command = Command::Take {
            entity: Entity::new(
                Quantifier::Any,
                ObjectDesc::Relative {
                    object: Box::new(brick(Some("blue"))),
                    location: Location {
                        relation: Relation::LeftOf,
                        entity: Entity::new(Quantifier::All, plank(None)),
                    },
                },
            ),
        };
        let goal = interpret_command(&command, &world).unwrap();
        assert_eq!(
            goal,
            Goal::Leaf(Literal::positive(Relation::Holding, vec!["b2".to_string()]))
        );
    }

    #[test]
    fn take_all_of_many_fails() {
        let world = pair_world();
        let command = Command::Take {
            entity: Entity::new(Quantifier::All, brick(None)),
        };
        assert_eq!(interpret_command(&command, &world), Err(Error::CannotHoldMany));
    }

    #[test]
    fn put_requires_a_held_object() {
        let world = pair_world();
        let command = Command::Put {
            location: Location {
                relation: Relation::OnTop,
                entity: Entity::new(Quantifier::The, ObjectDesc::simple(FormPattern::Floor)),
            },
        };
        assert_eq!(interpret_command(&command, &world), Err(Error::ArmEmpty));
    }

    #[test]
    fn holding_is_not_a_location() {
        let world = pair_world();
        let command = Command::Move {
            entity: Entity::new(Quantifier::Any, brick(None)),
            location: Location {
                relation: Relation::Holding,
                entity: Entity::new(Quantifier::Any, plank(None)),
            },
        };
        assert!(matches!(
            interpret_command(&command, &world),
            Err(Error::UnsupportedRelation(_))
        ));
    }

    #[test]
    fn no_match_for_absent_objects() {
        let world = pair_world();
        let command = Command::Take {
            entity: Entity::new(Quantifier::Any, ObjectDesc::simple(FormPattern::Ball)),
        };
        assert_eq!(interpret_command(&command, &world), Err(Error::NoMatch));
    }

    #[test]
    fn interpretation_is_idempotent() {
        let world = pair_world();
        let command = move_command(
            Quantifier::Any,
            brick(None),
            Quantifier::All,
            plank(None),
        );
        let first = interpret_command(&command, &world).unwrap();
        let second = interpret_command(&command, &world).unwrap();
        assert_eq!(first, second);
    }

    #[test]
    fn cross_parse_policy() {
        let world = pair_world();
        let valid = Parse {
            input: "take a brick".to_string(),
            command: Command::Take {
                entity: Entity::new(Quantifier::Any, brick(None)),
            },
        };
        let no_match = Parse {
            input: "take a ball".to_string(),
            command: Command::Take {
                entity: Entity::new(Quantifier::Any, ObjectDesc::simple(FormPattern::Ball)),
            },
        };
        let ambiguous = Parse {
            input: "take the brick".to_string(),
            command: Command::Take {
                entity: Entity::new(Quantifier::The, brick(None)),
            },
        };

        // one survivor among failures
        let result = interpret(&[no_match.clone(), valid.clone()], &world).unwrap();
        assert_eq!(result.len(), 1);
        assert_eq!(result[0].parse, valid);

        // several survivors: ambiguous command
        assert_eq!(
            interpret(&[valid.clone(), valid.clone()], &world),
            Err(Error::MultipleInterpretations(2))
        );

        // nothing but failures, no ambiguity
        assert_eq!(
            interpret(&[no_match.clone()], &world),
            Err(Error::NoValidInterpretation)
        );

        // nothing but failures, one of them ambiguous: report the forms
        assert_eq!(
            interpret(&[no_match, ambiguous], &world),
            Err(Error::AmbiguousReference {
                forms: vec!["brick".to_string()]
            })
        );
    }
}
