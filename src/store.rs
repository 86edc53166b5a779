//! Purpose: Read-only resource store backing the render CLI and HTTP host.
//! Exports: `Store`.
//! Role: Loads recipes and bags (with their tiddlers) from one JSON file.
//! Invariants: Lookups never mutate; missing resources are `NotFound` errors.
//! Invariants: Load errors carry the store path.

use std::path::Path;

use serde::Deserialize;

use crate::core::error::{Error, ErrorKind, Result};
use crate::core::model::{Bag, Recipe, Tiddler};

#[derive(Clone, Debug, Default, Deserialize)]
pub struct Store {
    #[serde(default)]
    recipes: Vec<Recipe>,
    #[serde(default)]
    bags: Vec<Bag>,
}

impl Store {
    pub fn new(recipes: Vec<Recipe>, bags: Vec<Bag>) -> Self {
        Self { recipes, bags }
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).map_err(|err| {
            Error::new(ErrorKind::Io)
                .with_message("failed to read store")
                .with_path(path)
                .with_source(err)
        })?;
        serde_json::from_str(&text).map_err(|err| {
            Error::new(ErrorKind::Usage)
                .with_message(format!("invalid store file: {err}"))
                .with_path(path)
                .with_hint("Expected a JSON object with `recipes` and `bags` arrays.")
                .with_source(err)
        })
    }

    pub fn recipes(&self) -> &[Recipe] {
        &self.recipes
    }

    pub fn bags(&self) -> &[Bag] {
        &self.bags
    }

    pub fn recipe(&self, name: &str) -> Result<&Recipe> {
        self.recipes
            .iter()
            .find(|recipe| recipe.name == name)
            .ok_or_else(|| not_found(format!("recipe not found: {name}")))
    }

    pub fn bag(&self, name: &str) -> Result<&Bag> {
        self.bags
            .iter()
            .find(|bag| bag.name == name)
            .ok_or_else(|| not_found(format!("bag not found: {name}")))
    }

    pub fn tiddler(&self, bag: &str, title: &str) -> Result<&Tiddler> {
        self.bag(bag)?
            .tiddlers
            .iter()
            .find(|tiddler| tiddler.title == title)
            .ok_or_else(|| not_found(format!("tiddler not found: {title} (bag: {bag})")))
    }
}

fn not_found(message: String) -> Error {
    Error::new(ErrorKind::NotFound).with_message(message)
}
