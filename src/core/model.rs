//! Purpose: Resource types rendered by the serializers.
//! Exports: `Policy`, `Recipe`, `Bag`, `Tiddler`.
//! Role: Plain data loaded from a store; serializers read fields, never mutate them.
//! Invariants: Every field except a resource's name/title is optional in store input.
use serde::Deserialize;
use std::collections::BTreeMap;

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Policy {
    pub read: Vec<String>,
    pub write: Vec<String>,
    pub create: Vec<String>,
    pub delete: Vec<String>,
    pub manage: Vec<String>,
    pub accept: Vec<String>,
    pub owner: Option<String>,
}

/// Ordered list of `(bag, filter)` pairs.
#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Recipe {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub recipe: Vec<(String, String)>,
}

impl Recipe {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
pub struct Bag {
    pub name: String,
    #[serde(default)]
    pub desc: String,
    #[serde(default)]
    pub policy: Policy,
    #[serde(default)]
    pub tiddlers: Vec<Tiddler>,
}

impl Bag {
    pub fn new(name: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            ..Self::default()
        }
    }
}

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq)]
#[serde(default)]
pub struct Tiddler {
    pub title: String,
    pub bag: Option<String>,
    pub recipe: Option<String>,
    pub creator: String,
    pub modifier: String,
    pub created: String,
    pub modified: String,
    pub tags: Vec<String>,
    pub fields: BTreeMap<String, String>,
    pub text: String,
    #[serde(rename = "type")]
    pub content_type: Option<String>,
    pub revision: u64,
}

impl Tiddler {
    pub fn new(title: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            ..Self::default()
        }
    }
}
