//! World model: object catalogue and tabletop snapshot

use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::fmt;

use crate::error::{Error, Result};

/// Reserved identifier for the table surface. Never part of the catalogue.
pub const FLOOR: &str = "floor";

/// Physical shape of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Form {
    Brick,
    Plank,
    Ball,
    Pyramid,
    Box,
    Table,
}

impl fmt::Display for Form {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Form::Brick => "brick",
            Form::Plank => "plank",
            Form::Ball => "ball",
            Form::Pyramid => "pyramid",
            Form::Box => "box",
            Form::Table => "table",
        };
        write!(f, "{}", name)
    }
}

/// Relative size of an object
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Size {
    Small,
    Large,
}

impl fmt::Display for Size {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Size::Small => write!(f, "small"),
            Size::Large => write!(f, "large"),
        }
    }
}

/// Immutable catalogue entry describing one object
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ObjectDef {
    pub form: Form,
    pub size: Size,
    pub color: String,
}

impl ObjectDef {
    pub fn new(form: Form, size: Size, color: &str) -> Self {
        ObjectDef {
            form,
            size,
            color: color.to_string(),
        }
    }
}

impl fmt::Display for ObjectDef {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} {} {}", self.size, self.color, self.form)
    }
}

/// A snapshot of the tabletop: catalogue, stack layout, and arm state.
///
/// `stacks[i][0]` is the bottom of column `i`, the last element its top.
/// Every catalogued identifier sits in exactly one stack cell or in the
/// gripper; `validate` checks this.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct World {
    /// Identifier → definition catalogue
    pub objects: HashMap<String, ObjectDef>,
    pub stacks: Vec<Vec<String>>,
    /// Identifier of the held object, if any
    #[serde(default)]
    pub holding: Option<String>,
    /// Column index the arm is over
    #[serde(default)]
    pub arm: usize,
}

impl World {
    /// Locate a stack-resident object as `(column, height)`, height 0 at
    /// the bottom. `None` for held or unknown identifiers.
    pub fn find(&self, id: &str) -> Option<(usize, usize)> {
        self.stacks.iter().enumerate().find_map(|(col, stack)| {
            stack.iter().position(|o| o == id).map(|h| (col, h))
        })
    }

    /// Catalogue lookup. `None` for the floor and unknown identifiers.
    pub fn object(&self, id: &str) -> Option<&ObjectDef> {
        self.objects.get(id)
    }

    pub fn columns(&self) -> usize {
        self.stacks.len()
    }

    /// Identifiers present in the scene, in a deterministic order: stacks
    /// left to right, bottom to top, then the held object.
    pub fn present(&self) -> impl Iterator<Item = &String> {
        self.stacks.iter().flatten().chain(self.holding.iter())
    }

    /// Check the structural invariants: arm in range, every catalogued
    /// identifier in exactly one place, no unknown identifiers.
    pub fn validate(&self) -> Result<()> {
        if self.stacks.is_empty() {
            return Err(Error::InvalidWorld("no columns".into()));
        }
        if self.arm >= self.stacks.len() {
            return Err(Error::InvalidWorld(format!(
                "arm over column {} of {}",
                self.arm,
                self.stacks.len()
            )));
        }
        let mut seen = HashSet::new();
        for id in self.present() {
            if id == FLOOR {
                return Err(Error::InvalidWorld("`floor` used as an object".into()));
            }
            if !self.objects.contains_key(id) {
                return Err(Error::InvalidWorld(format!("unknown identifier `{}`", id)));
            }
            if !seen.insert(id.as_str()) {
                return Err(Error::InvalidWorld(format!("`{}` appears twice", id)));
            }
        }
        for id in self.objects.keys() {
            if !seen.contains(id.as_str()) {
                return Err(Error::InvalidWorld(format!(
                    "`{}` is catalogued but absent from the scene",
                    id
                )));
            }
        }
        Ok(())
    }
}
