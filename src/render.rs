//! Purpose: Map a requested resource shape onto one serializer operation.
//! Exports: `Target`, `select_serializer`, `render_target`.
//! Role: Shared by the `render` command and the HTTP handlers so both answer identically.
//! Invariants: Exactly one serializer operation runs per target.
//! Invariants: Store lookups fail before any serializer output is produced.

use clap::Subcommand;

use tiddlyweb_jsonp::config::Config;
use tiddlyweb_jsonp::core::environ::Environ;
use tiddlyweb_jsonp::core::error::{Error, ErrorKind};
use tiddlyweb_jsonp::serializations::{self, Serialization};
use tiddlyweb_jsonp::store::Store;

#[derive(Clone, Debug, Eq, PartialEq, Subcommand)]
pub(crate) enum Target {
    #[command(about = "List recipe names (full objects with --query fat=1)")]
    Recipes,
    #[command(about = "List bag names (full objects with --query fat=1)")]
    Bags,
    #[command(about = "List the tiddlers held by a bag")]
    Tiddlers {
        #[arg(help = "Bag name")]
        bag: String,
    },
    #[command(about = "Render one recipe")]
    Recipe {
        #[arg(help = "Recipe name")]
        name: String,
    },
    #[command(about = "Render one bag")]
    Bag {
        #[arg(help = "Bag name")]
        name: String,
    },
    #[command(about = "Render one tiddler")]
    Tiddler {
        #[arg(help = "Bag name")]
        bag: String,
        #[arg(help = "Tiddler title")]
        title: String,
    },
}

/// Builds the negotiated serializer for one request, plus its response content type.
pub(crate) fn select_serializer<'a, 'c>(
    config: &'c Config,
    accept: Option<&str>,
    environ: &'a Environ,
) -> Result<(Box<dyn Serialization + 'a>, &'c str), Error> {
    let (content_type, entry) = config.negotiate(accept).ok_or_else(|| {
        Error::new(ErrorKind::Internal)
            .with_message("no serializer registered for application/json")
    })?;
    tracing::debug!(content_type, serializer = entry.id.as_str(), "selected serializer");
    Ok((
        serializations::for_id(entry.id, environ),
        entry.response_type.as_str(),
    ))
}

pub(crate) fn render_target(
    serializer: &dyn Serialization,
    store: &Store,
    target: &Target,
) -> Result<String, Error> {
    match target {
        Target::Recipes => serializer.list_recipes(store.recipes()),
        Target::Bags => serializer.list_bags(store.bags()),
        Target::Tiddlers { bag } => serializer.list_tiddlers(store.bag(bag)?),
        Target::Recipe { name } => serializer.recipe_as(store.recipe(name)?),
        Target::Bag { name } => serializer.bag_as(store.bag(name)?),
        Target::Tiddler { bag, title } => serializer.tiddler_as(store.tiddler(bag, title)?),
    }
}
