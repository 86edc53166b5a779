//! Purpose: Contract coverage for the JSONP wrapper over the real JSON serializer.
//! Exports: Integration tests only.
//! Role: Check identity, exact wrapping, and unwrap-equals-plain for all six shapes.
//! Invariants: Inputs come from the shared store fixture; assertions compare whole strings.

use std::path::Path;

use serde_json::Value;
use tiddlyweb_jsonp::core::environ::Environ;
use tiddlyweb_jsonp::jsonp::JsonpSerialization;
use tiddlyweb_jsonp::serializations::Serialization;
use tiddlyweb_jsonp::serializations::json::JsonSerialization;
use tiddlyweb_jsonp::store::Store;

fn store() -> Store {
    let path = Path::new(env!("CARGO_MANIFEST_DIR")).join("tests/fixtures/store.json");
    Store::load(&path).expect("fixture store")
}

fn render_all(serializer: &dyn Serialization, store: &Store) -> Vec<String> {
    let common = store.bag("common").expect("common bag");
    vec![
        serializer.list_recipes(store.recipes()).expect("list_recipes"),
        serializer.list_bags(store.bags()).expect("list_bags"),
        serializer.list_tiddlers(common).expect("list_tiddlers"),
        serializer
            .recipe_as(store.recipe("default").expect("recipe"))
            .expect("recipe_as"),
        serializer.bag_as(common).expect("bag_as"),
        serializer
            .tiddler_as(store.tiddler("common", "Test").expect("tiddler"))
            .expect("tiddler_as"),
    ]
}

fn plain_and_wrapped(query: &str) -> (Vec<String>, Vec<String>) {
    let store = store();
    let environ = Environ::from_query_string(query);
    let plain = render_all(&JsonSerialization::new(&environ), &store);
    let wrapped = render_all(
        &JsonpSerialization::new(JsonSerialization::new(&environ), &environ),
        &store,
    );
    (plain, wrapped)
}

fn strip_wrapper(text: &str) -> &str {
    let open = text.find('(').expect("opening paren");
    text[open + 1..].strip_suffix(')').expect("closing paren")
}

#[test]
fn without_callback_output_is_base_output() {
    for query in ["", "fat=1", "other=value"] {
        let (plain, wrapped) = plain_and_wrapped(query);
        assert_eq!(plain, wrapped, "query: {query}");
    }
}

#[test]
fn empty_callback_adds_nothing() {
    let (plain, wrapped) = plain_and_wrapped("callback=");
    assert_eq!(plain, wrapped);
    for body in &wrapped {
        serde_json::from_str::<Value>(body).expect("still plain json");
    }
}

#[test]
fn callback_wraps_exactly() {
    let (plain, wrapped) = plain_and_wrapped("callback=foo");
    assert_eq!(plain.len(), 6);
    for (plain, wrapped) in plain.iter().zip(&wrapped) {
        assert_eq!(wrapped, &format!("foo({plain})"));
    }
}

#[test]
fn only_first_callback_value_is_used() {
    let (plain, wrapped) = plain_and_wrapped("callback=first&callback=second");
    for (plain, wrapped) in plain.iter().zip(&wrapped) {
        assert_eq!(wrapped, &format!("first({plain})"));
    }
}

#[test]
fn stripping_wrapper_recovers_plain_json() {
    let (_, plain) = plain_and_wrapped("fat=1");
    let (_, wrapped) = plain_and_wrapped("fat=1&callback=jQuery123_456");
    for (plain, wrapped) in plain.iter().zip(&wrapped) {
        assert_eq!(strip_wrapper(wrapped), plain);
    }
}

#[test]
fn wrapped_tiddler_body_is_the_json_tiddler() {
    let store = store();
    let environ = Environ::from_query_string("callback=myFunc");
    let wrapped = JsonpSerialization::new(JsonSerialization::new(&environ), &environ)
        .tiddler_as(store.tiddler("common", "Test").expect("tiddler"))
        .expect("tiddler_as");

    assert!(wrapped.starts_with("myFunc({"));
    assert!(wrapped.ends_with("})"));
    let value: Value = serde_json::from_str(strip_wrapper(&wrapped)).expect("json body");
    assert_eq!(value["title"], "Test");
    assert_eq!(value["bag"], "common");
    assert_eq!(value["revision"], 3);
    assert_eq!(value["tags"], serde_json::json!(["published", "demo"]));
    assert_eq!(value["type"], "text/x-markdown");
}
