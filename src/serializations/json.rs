//! Purpose: Base JSON renderer for recipes, bags, and tiddlers.
//! Exports: `JsonSerialization`.
//! Role: Produces the compact JSON bodies every other serializer builds on.
//! Invariants: Key sets and names per resource shape are stable.
//! Invariants: List responses carry names only unless the request is `fat`.
//! Notes: Encoder failures surface as `ErrorKind::Serialization` with the source attached.

use serde_json::{Map, Value, json};

use super::Serialization;
use crate::core::environ::Environ;
use crate::core::error::{Error, ErrorKind, Result};
use crate::core::model::{Bag, Policy, Recipe, Tiddler};

#[derive(Clone, Copy, Debug)]
pub struct JsonSerialization<'a> {
    environ: &'a Environ,
}

impl<'a> JsonSerialization<'a> {
    pub fn new(environ: &'a Environ) -> Self {
        Self { environ }
    }
}

impl Serialization for JsonSerialization<'_> {
    fn list_recipes(&self, recipes: &[Recipe]) -> Result<String> {
        let items: Vec<Value> = if self.environ.is_fat() {
            recipes
                .iter()
                .map(|recipe| {
                    let mut map = recipe_json(recipe);
                    map.insert("name".to_string(), json!(recipe.name));
                    Value::Object(map)
                })
                .collect()
        } else {
            recipes.iter().map(|recipe| json!(recipe.name)).collect()
        };
        encode(&Value::Array(items))
    }

    fn list_bags(&self, bags: &[Bag]) -> Result<String> {
        let items: Vec<Value> = if self.environ.is_fat() {
            bags.iter()
                .map(|bag| {
                    let mut map = bag_json(bag);
                    map.insert("name".to_string(), json!(bag.name));
                    Value::Object(map)
                })
                .collect()
        } else {
            bags.iter().map(|bag| json!(bag.name)).collect()
        };
        encode(&Value::Array(items))
    }

    fn list_tiddlers(&self, bag: &Bag) -> Result<String> {
        let fat = self.environ.is_fat();
        let items: Vec<Value> = bag
            .tiddlers
            .iter()
            .map(|tiddler| Value::Object(tiddler_json(tiddler, Some(&bag.name), fat)))
            .collect();
        encode(&Value::Array(items))
    }

    fn recipe_as(&self, recipe: &Recipe) -> Result<String> {
        encode(&Value::Object(recipe_json(recipe)))
    }

    fn bag_as(&self, bag: &Bag) -> Result<String> {
        encode(&Value::Object(bag_json(bag)))
    }

    fn tiddler_as(&self, tiddler: &Tiddler) -> Result<String> {
        encode(&Value::Object(tiddler_json(tiddler, None, true)))
    }
}

fn encode(value: &Value) -> Result<String> {
    serde_json::to_string(value).map_err(|err| {
        Error::new(ErrorKind::Serialization)
            .with_message("failed to encode json")
            .with_source(err)
    })
}

fn policy_json(policy: &Policy) -> Value {
    json!({
        "read": policy.read,
        "write": policy.write,
        "create": policy.create,
        "delete": policy.delete,
        "manage": policy.manage,
        "accept": policy.accept,
        "owner": policy.owner,
    })
}

fn recipe_json(recipe: &Recipe) -> Map<String, Value> {
    let lines: Vec<Value> = recipe
        .recipe
        .iter()
        .map(|(bag, filter)| json!([bag, filter]))
        .collect();
    let mut map = Map::new();
    map.insert("desc".to_string(), json!(recipe.desc));
    map.insert("policy".to_string(), policy_json(&recipe.policy));
    map.insert("recipe".to_string(), Value::Array(lines));
    map
}

fn bag_json(bag: &Bag) -> Map<String, Value> {
    let mut map = Map::new();
    map.insert("desc".to_string(), json!(bag.desc));
    map.insert("policy".to_string(), policy_json(&bag.policy));
    map
}

// `owning_bag` fills in the bag for tiddlers listed from a bag that did not record it.
fn tiddler_json(
    tiddler: &Tiddler,
    owning_bag: Option<&str>,
    with_text: bool,
) -> Map<String, Value> {
    let bag = tiddler.bag.as_deref().or(owning_bag);
    let mut map = Map::new();
    map.insert("title".to_string(), json!(tiddler.title));
    map.insert("creator".to_string(), json!(tiddler.creator));
    map.insert("modifier".to_string(), json!(tiddler.modifier));
    map.insert("created".to_string(), json!(tiddler.created));
    map.insert("modified".to_string(), json!(tiddler.modified));
    map.insert("tags".to_string(), json!(tiddler.tags));
    map.insert("fields".to_string(), json!(tiddler.fields));
    map.insert("type".to_string(), json!(tiddler.content_type));
    map.insert("revision".to_string(), json!(tiddler.revision));
    map.insert("bag".to_string(), json!(bag));
    if let Some(recipe) = &tiddler.recipe {
        map.insert("recipe".to_string(), json!(recipe));
    }
    if with_text {
        map.insert("text".to_string(), json!(tiddler.text));
    }
    map
}
