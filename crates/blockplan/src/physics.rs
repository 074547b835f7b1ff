//! Physics oracle: spatial relations and stacking legality

use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

use crate::error::Error;
use crate::world::{Form, ObjectDef, Size, World, FLOOR};

/// Spatial relations plus the arm's `holding` pseudo-relation
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Relation {
    LeftOf,
    RightOf,
    Beside,
    Above,
    Under,
    OnTop,
    Inside,
    Holding,
}

impl Relation {
    pub fn name(self) -> &'static str {
        match self {
            Relation::LeftOf => "leftof",
            Relation::RightOf => "rightof",
            Relation::Beside => "beside",
            Relation::Above => "above",
            Relation::Under => "under",
            Relation::OnTop => "ontop",
            Relation::Inside => "inside",
            Relation::Holding => "holding",
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name())
    }
}

impl FromStr for Relation {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self, Error> {
        match s {
            "leftof" => Ok(Relation::LeftOf),
            "rightof" => Ok(Relation::RightOf),
            "beside" => Ok(Relation::Beside),
            "above" => Ok(Relation::Above),
            "under" => Ok(Relation::Under),
            "ontop" => Ok(Relation::OnTop),
            "inside" => Ok(Relation::Inside),
            "holding" => Ok(Relation::Holding),
            other => Err(Error::UnsupportedRelation(other.to_string())),
        }
    }
}

/// Read-only view of a scene: the structure needed to evaluate relations.
///
/// Both the `World` snapshot and the planner's internal arm states expose
/// this view, so goals evaluate identically on either.
pub trait Scene {
    /// `(column, height)` of a stack-resident object, height 0 at the bottom
    fn locate(&self, id: &str) -> Option<(usize, usize)>;
    /// Identifier held by the arm, if any
    fn held(&self) -> Option<&str>;
    /// Catalogue lookup
    fn def(&self, id: &str) -> Option<&ObjectDef>;
}

impl Scene for World {
    fn locate(&self, id: &str) -> Option<(usize, usize)> {
        self.find(id)
    }

    fn held(&self) -> Option<&str> {
        self.holding.as_deref()
    }

    fn def(&self, id: &str) -> Option<&ObjectDef> {
        self.object(id)
    }
}

/// Does the binary relation hold between `a` and `b` in this scene?
///
/// Held objects satisfy no spatial relation. The floor is only meaningful
/// as the second argument of `ontop` and `above`; everywhere else it makes
/// the relation false.
pub fn related<S: Scene + ?Sized>(scene: &S, relation: Relation, a: &str, b: &str) -> bool {
    if relation == Relation::Holding {
        return false;
    }
    if scene.held().is_some_and(|h| h == a || h == b) {
        return false;
    }
    let (a_col, a_height) = match scene.locate(a) {
        Some(pos) => pos,
        None => return false,
    };
    if b == FLOOR {
        return match relation {
            Relation::Above => true,
            Relation::OnTop => a_height == 0,
            _ => false,
        };
    }
    let (b_col, b_height) = match scene.locate(b) {
        Some(pos) => pos,
        None => return false,
    };
    match relation {
        Relation::LeftOf => a_col < b_col,
        Relation::RightOf => a_col > b_col,
        Relation::Beside => a_col.abs_diff(b_col) == 1,
        Relation::Above => a_col == b_col && a_height > b_height,
        Relation::Under => a_col == b_col && a_height < b_height,
        Relation::OnTop => a_col == b_col && a_height == b_height + 1,
        Relation::Inside => {
            a_col == b_col
                && a_height == b_height + 1
                && scene.def(b).is_some_and(|d| d.form == Form::Box)
        }
        Relation::Holding => unreachable!("handled above"),
    }
}

/// Evaluate `relation(args…)` against a scene.
pub fn holds<S: Scene + ?Sized>(scene: &S, relation: Relation, args: &[String]) -> bool {
    match (relation, args) {
        (Relation::Holding, [x]) => scene.held() == Some(x.as_str()),
        (_, [a, b]) => related(scene, relation, a, b),
        _ => false,
    }
}

/// Stacking legality: may `top` come to rest directly on `below`?
/// `None` stands for the floor, which supports everything.
pub fn can_rest_on(top: &ObjectDef, below: Option<&ObjectDef>) -> bool {
    let below = match below {
        None => return true,
        Some(def) => def,
    };
    // balls support nothing, and rest only in boxes (or on the floor)
    if below.form == Form::Ball {
        return false;
    }
    if top.form == Form::Ball && below.form != Form::Box {
        return false;
    }
    if below.size == Size::Small && top.size == Size::Large {
        return false;
    }
    if below.size == Size::Large && top.size == Size::Small {
        return true;
    }
    // same size from here on
    if below.form == Form::Box {
        return !matches!(top.form, Form::Pyramid | Form::Plank | Form::Box);
    }
    if top.form == Form::Box {
        return match top.size {
            Size::Small => !matches!(below.form, Form::Brick | Form::Pyramid),
            Size::Large => below.form != Form::Pyramid,
        };
    }
    true
}
