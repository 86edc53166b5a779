//! Purpose: Serializer seam shared by the base JSON renderer and the JSONP wrapper.
//! Exports: `Serialization`, `SerializerId`, `for_id`, `json`.
//! Role: Lets the registry hand out any renderer behind one trait object.
//! Invariants: Every implementation renders the same six resource shapes.
//! Invariants: A serializer is built per request and holds no cross-request state.

pub mod json;

use crate::core::environ::Environ;
use crate::core::error::Result;
use crate::core::model::{Bag, Recipe, Tiddler};
use crate::jsonp::JsonpSerialization;
use json::JsonSerialization;

/// Renders collections and single resources to response text.
pub trait Serialization {
    fn list_recipes(&self, recipes: &[Recipe]) -> Result<String>;
    fn list_bags(&self, bags: &[Bag]) -> Result<String>;
    /// Lists the tiddlers held by `bag`.
    fn list_tiddlers(&self, bag: &Bag) -> Result<String>;
    fn recipe_as(&self, recipe: &Recipe) -> Result<String>;
    fn bag_as(&self, bag: &Bag) -> Result<String>;
    fn tiddler_as(&self, tiddler: &Tiddler) -> Result<String>;
}

impl<S: Serialization + ?Sized> Serialization for Box<S> {
    fn list_recipes(&self, recipes: &[Recipe]) -> Result<String> {
        (**self).list_recipes(recipes)
    }

    fn list_bags(&self, bags: &[Bag]) -> Result<String> {
        (**self).list_bags(bags)
    }

    fn list_tiddlers(&self, bag: &Bag) -> Result<String> {
        (**self).list_tiddlers(bag)
    }

    fn recipe_as(&self, recipe: &Recipe) -> Result<String> {
        (**self).recipe_as(recipe)
    }

    fn bag_as(&self, bag: &Bag) -> Result<String> {
        (**self).bag_as(bag)
    }

    fn tiddler_as(&self, tiddler: &Tiddler) -> Result<String> {
        (**self).tiddler_as(tiddler)
    }
}

#[derive(Clone, Copy, Debug, Eq, PartialEq)]
pub enum SerializerId {
    Json,
    Jsonp,
}

impl SerializerId {
    pub fn as_str(self) -> &'static str {
        match self {
            SerializerId::Json => "serializations::json",
            SerializerId::Jsonp => "serializations::jsonp",
        }
    }
}

/// Builds the serializer registered under `id` for one request.
pub fn for_id(id: SerializerId, environ: &Environ) -> Box<dyn Serialization + '_> {
    match id {
        SerializerId::Json => Box::new(JsonSerialization::new(environ)),
        SerializerId::Jsonp => Box::new(JsonpSerialization::new(
            JsonSerialization::new(environ),
            environ,
        )),
    }
}
