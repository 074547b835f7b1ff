//! Input contract: parsed commands handed over by the upstream parser

use serde::{Deserialize, Serialize};

use crate::physics::Relation;
use crate::world::{Form, Size};

/// Quantifier binding the quantity and ambiguity policy of a noun phrase
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Quantifier {
    The,
    Any,
    All,
}

/// Form constraint of a leaf description
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FormPattern {
    /// Wildcard: matches every form
    Anyform,
    /// The table surface
    Floor,
    Brick,
    Plank,
    Ball,
    Pyramid,
    Box,
    Table,
}

impl FormPattern {
    /// The concrete form this pattern names, if it names one
    pub fn as_form(self) -> Option<Form> {
        match self {
            FormPattern::Anyform | FormPattern::Floor => None,
            FormPattern::Brick => Some(Form::Brick),
            FormPattern::Plank => Some(Form::Plank),
            FormPattern::Ball => Some(Form::Ball),
            FormPattern::Pyramid => Some(Form::Pyramid),
            FormPattern::Box => Some(Form::Box),
            FormPattern::Table => Some(Form::Table),
        }
    }

    /// Does this pattern admit an object of the given form?
    pub fn admits(self, form: Form) -> bool {
        match self {
            FormPattern::Anyform => true,
            FormPattern::Floor => false,
            _ => self.as_form() == Some(form),
        }
    }
}

/// Recursive object description.
///
/// `Relative` wraps a description in a relative clause ("the ball *in a
/// box*"); `Simple` is a leaf with optional size and colour constraints.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ObjectDesc {
    Relative {
        object: Box<ObjectDesc>,
        location: Location,
    },
    Simple {
        form: FormPattern,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        size: Option<Size>,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        color: Option<String>,
    },
}

impl ObjectDesc {
    pub fn simple(form: FormPattern) -> Self {
        ObjectDesc::Simple {
            form,
            size: None,
            color: None,
        }
    }
}

/// A relative clause: relation plus the entity it relates to
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub relation: Relation,
    pub entity: Entity,
}

/// Quantified object description
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Entity {
    pub quantifier: Quantifier,
    pub object: Box<ObjectDesc>,
}

impl Entity {
    pub fn new(quantifier: Quantifier, object: ObjectDesc) -> Self {
        Entity {
            quantifier,
            object: Box::new(object),
        }
    }
}

/// Command variants produced by the upstream parser
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "verb", rename_all = "lowercase")]
pub enum Command {
    Take { entity: Entity },
    /// Drops the held object somewhere; presupposes a non-empty gripper
    Put { location: Location },
    Move { entity: Entity, location: Location },
}

/// One candidate parse of an input sentence
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Parse {
    /// The sentence this parse was derived from
    pub input: String,
    pub command: Command,
}
