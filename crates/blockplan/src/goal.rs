//! Goal formulas: AND/OR trees of relational literals

use nom::{
    branch::alt,
    bytes::complete::take_while1,
    character::complete::{char, multispace0, one_of},
    combinator::{all_consuming, map, map_res, opt},
    multi::{many1, separated_list1},
    sequence::{delimited, pair},
    IResult,
};
use serde::{Deserialize, Serialize};
use std::fmt;

use crate::error::{Error, Result};
use crate::physics::{holds, Relation, Scene};

/// A single relational fact over object identifiers.
///
/// The interpreter only ever emits positive literals; the polarity flag is
/// part of the goal language for symmetry with its textual form.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Literal {
    pub polarity: bool,
    pub relation: Relation,
    pub args: Vec<String>,
}

impl Literal {
    /// Create a new positive literal
    pub fn positive(relation: Relation, args: Vec<String>) -> Self {
        Literal {
            polarity: true,
            relation,
            args,
        }
    }

    /// Truth value against a scene snapshot
    pub fn eval<S: Scene + ?Sized>(&self, scene: &S) -> bool {
        holds(scene, self.relation, &self.args) == self.polarity
    }
}

impl fmt::Display for Literal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        if !self.polarity {
            write!(f, "-")?;
        }
        write!(f, "{}(", self.relation)?;
        for (i, arg) in self.args.iter().enumerate() {
            if i > 0 {
                write!(f, ",")?;
            }
            write!(f, "{}", arg)?;
        }
        write!(f, ")")
    }
}

/// Connective of an internal goal node
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Op {
    And,
    Or,
}

/// Goal formula: literal leaves under AND/OR nodes.
///
/// Finite, acyclic, and immutable once emitted. Internal nodes always have
/// at least one child; the `and`/`or` constructors collapse singletons.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum Goal {
    Leaf(Literal),
    Node(Op, Vec<Goal>),
}

impl Goal {
    pub fn leaf(literal: Literal) -> Self {
        Goal::Leaf(literal)
    }

    /// Conjunction of `children`, collapsing a singleton to its child.
    /// `children` must be non-empty.
    pub fn and(mut children: Vec<Goal>) -> Self {
        debug_assert!(!children.is_empty());
        if children.len() == 1 {
            children.remove(0)
        } else {
            Goal::Node(Op::And, children)
        }
    }

    /// Disjunction of `children`, collapsing a singleton to its child.
    /// `children` must be non-empty.
    pub fn or(mut children: Vec<Goal>) -> Self {
        debug_assert!(!children.is_empty());
        if children.len() == 1 {
            children.remove(0)
        } else {
            Goal::Node(Op::Or, children)
        }
    }

    /// Does the scene satisfy this goal?
    pub fn satisfied_in<S: Scene + ?Sized>(&self, scene: &S) -> bool {
        match self {
            Goal::Leaf(literal) => literal.eval(scene),
            Goal::Node(Op::And, children) => children.iter().all(|g| g.satisfied_in(scene)),
            Goal::Node(Op::Or, children) => children.iter().any(|g| g.satisfied_in(scene)),
        }
    }

    /// Flatten into sum-of-products form: a disjunction of conjunctive
    /// clauses. Conjunction distributes over nested disjunctions, so the
    /// clause count is the product of the branch widths.
    pub fn dnf(&self) -> Vec<Vec<Literal>> {
        match self {
            Goal::Leaf(literal) => vec![vec![literal.clone()]],
            Goal::Node(Op::Or, children) => children.iter().flat_map(|g| g.dnf()).collect(),
            Goal::Node(Op::And, children) => {
                let mut clauses: Vec<Vec<Literal>> = vec![vec![]];
                for child in children {
                    let alternatives = child.dnf();
                    let mut next = Vec::with_capacity(clauses.len() * alternatives.len());
                    for base in &clauses {
                        for alt in &alternatives {
                            let mut merged = base.clone();
                            merged.extend(alt.iter().cloned());
                            next.push(merged);
                        }
                    }
                    clauses = next;
                }
                clauses
            }
        }
    }
}

impl fmt::Display for Goal {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Goal::Leaf(literal) => write!(f, "{}", literal),
            Goal::Node(op, children) => {
                let sep = match op {
                    Op::And => " & ",
                    Op::Or => " | ",
                };
                write!(f, "(")?;
                for (i, child) in children.iter().enumerate() {
                    if i > 0 {
                        write!(f, "{}", sep)?;
                    }
                    write!(f, "{}", child)?;
                }
                write!(f, ")")
            }
        }
    }
}

// Parser for the serialised goal language. Accepts exactly what `Display`
// produces, with arbitrary whitespace between tokens.

fn identifier(input: &str) -> IResult<&str, &str> {
    take_while1(|c: char| c.is_ascii_alphanumeric() || c == '_')(input)
}

fn ws<'a, F, O>(inner: F) -> impl FnMut(&'a str) -> IResult<&'a str, O>
where
    F: FnMut(&'a str) -> IResult<&'a str, O>,
{
    delimited(multispace0, inner, multispace0)
}

fn literal(input: &str) -> IResult<&str, Literal> {
    let (input, negated) = opt(char('-'))(input)?;
    let (input, relation) = map_res(identifier, str::parse::<Relation>)(input)?;
    let (input, args) = delimited(
        char('('),
        separated_list1(char(','), map(ws(identifier), str::to_string)),
        char(')'),
    )(input)?;
    Ok((
        input,
        Literal {
            polarity: negated.is_none(),
            relation,
            args,
        },
    ))
}

fn compound(input: &str) -> IResult<&str, Goal> {
    let (input, _) = char('(')(input)?;
    let (input, first) = ws(goal_expr)(input)?;
    let (input, rest) = many1(pair(one_of("&|"), ws(goal_expr)))(input)?;
    let (input, _) = char(')')(input)?;
    // a node carries one connective; mixed separators need nesting
    let sep = rest[0].0;
    if rest.iter().any(|(c, _)| *c != sep) {
        return Err(nom::Err::Failure(nom::error::Error::new(
            input,
            nom::error::ErrorKind::Verify,
        )));
    }
    let mut children = vec![first];
    children.extend(rest.into_iter().map(|(_, goal)| goal));
    let op = if sep == '&' { Op::And } else { Op::Or };
    Ok((input, Goal::Node(op, children)))
}

fn goal_expr(input: &str) -> IResult<&str, Goal> {
    alt((compound, map(literal, Goal::Leaf)))(input)
}

/// Parse the serialised goal language back into a `Goal`
pub fn parse_goal(input: &str) -> Result<Goal> {
    match all_consuming(ws(goal_expr))(input) {
        Ok((_, goal)) => Ok(goal),
        Err(_) => Err(Error::GoalSyntax(input.trim().to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn lit(relation: Relation, args: &[&str]) -> Literal {
        Literal::positive(relation, args.iter().map(|s| s.to_string()).collect())
    }

    #[test]
    fn literal_display() {
        assert_eq!(lit(Relation::OnTop, &["a", "floor"]).to_string(), "ontop(a,floor)");
        let mut negated = lit(Relation::Holding, &["b"]);
        negated.polarity = false;
        assert_eq!(negated.to_string(), "-holding(b)");
    }

    #[test]
    fn compound_display() {
        let goal = Goal::or(vec![
            Goal::and(vec![
                Goal::Leaf(lit(Relation::Inside, &["a", "b"])),
                Goal::Leaf(lit(Relation::LeftOf, &["a", "c"])),
            ]),
            Goal::Leaf(lit(Relation::Holding, &["c"])),
        ]);
        assert_eq!(
            goal.to_string(),
            "((inside(a,b) & leftof(a,c)) | holding(c))"
        );
    }

    #[test]
    fn singleton_nodes_collapse() {
        let goal = Goal::or(vec![Goal::Leaf(lit(Relation::Holding, &["a"]))]);
        assert_eq!(goal, Goal::Leaf(lit(Relation::Holding, &["a"])));
    }

    #[test]
    fn display_round_trips_through_parser() {
        let goals = [
            Goal::Leaf(lit(Relation::Holding, &["e"])),
            Goal::and(vec![
                Goal::Leaf(lit(Relation::Inside, &["e", "k"])),
                Goal::Leaf(lit(Relation::Inside, &["f", "m"])),
            ]),
            Goal::or(vec![
                Goal::and(vec![
                    Goal::Leaf(lit(Relation::LeftOf, &["a", "b"])),
                    Goal::Leaf(lit(Relation::Above, &["a", "floor"])),
                ]),
                Goal::Leaf(lit(Relation::OnTop, &["b", "floor"])),
            ]),
        ];
        for goal in goals {
            let back = parse_goal(&goal.to_string()).unwrap();
            assert_eq!(back, goal);
        }
    }

    #[test]
    fn parser_accepts_whitespace_and_rejects_junk() {
        assert!(parse_goal("  ( holding(a) | holding(b) )  ").is_ok());
        assert!(parse_goal("holding(a) extra").is_err());
        assert!(parse_goal("(holding(a) & holding(b) | holding(c))").is_err());
        assert!(parse_goal("around(a,b)").is_err());
        assert!(parse_goal("").is_err());
    }

    #[test]
    fn dnf_distributes_conjunction() {
        // (p | q) & r  =>  (p & r) | (q & r)
        let p = lit(Relation::LeftOf, &["a", "b"]);
        let q = lit(Relation::RightOf, &["a", "b"]);
        let r = lit(Relation::Beside, &["c", "d"]);
        let goal = Goal::and(vec![
            Goal::or(vec![Goal::Leaf(p.clone()), Goal::Leaf(q.clone())]),
            Goal::Leaf(r.clone()),
        ]);
        assert_eq!(
            goal.dnf(),
            vec![vec![p, r.clone()], vec![q, r]]
        );
    }
}
