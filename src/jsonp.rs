//! Purpose: Wrap JSON responses in a caller-named function for script-tag consumption.
//! Exports: `JsonpSerialization`, `wrap_markers`, `init`.
//! Role: Decorator over any `Serialization`; registered for `application/json`.
//! Invariants: Without a non-empty `callback` the output is the inner output, byte for byte.
//! Invariants: With `callback=<name>` the output is exactly `<name>(` + inner + `)`.
//! Invariants: Inner errors are returned unchanged; no partial output is produced.
//! Notes: The callback name is neither validated nor escaped; callers get it verbatim.

use crate::config::{Config, JSON_CONTENT_TYPE, JSON_RESPONSE_TYPE};
use crate::core::environ::{Environ, Query};
use crate::core::error::Result;
use crate::core::model::{Bag, Recipe, Tiddler};
use crate::serializations::{Serialization, SerializerId};

const CALLBACK_KEY: &str = "callback";

/// Registers the JSONP serializer as the `application/json` handler.
///
/// Replaces whatever was registered for that content type; calling it again
/// leaves the config unchanged.
pub fn init(config: &mut Config) {
    config.register(JSON_CONTENT_TYPE, SerializerId::Jsonp, JSON_RESPONSE_TYPE);
}

/// Returns the `(prefix, suffix)` pair for the request's `callback` parameter.
///
/// Only the first value counts; a missing key, an empty list, or an empty
/// first value all yield `("", "")`.
pub fn wrap_markers(query: &Query) -> (String, String) {
    match query.first(CALLBACK_KEY) {
        Some(callback) if !callback.is_empty() => {
            tracing::debug!(callback, "wrapping json response");
            (format!("{callback}("), ")".to_string())
        }
        _ => (String::new(), String::new()),
    }
}

pub struct JsonpSerialization<'a, S> {
    inner: S,
    environ: &'a Environ,
}

impl<'a, S: Serialization> JsonpSerialization<'a, S> {
    pub fn new(inner: S, environ: &'a Environ) -> Self {
        Self { inner, environ }
    }

    fn wrap(&self, render: impl FnOnce(&S) -> Result<String>) -> Result<String> {
        let (prefix, suffix) = wrap_markers(&self.environ.query);
        let body = render(&self.inner)?;
        let mut out = String::with_capacity(prefix.len() + body.len() + suffix.len());
        out.push_str(&prefix);
        out.push_str(&body);
        out.push_str(&suffix);
        Ok(out)
    }
}

impl<S: Serialization> Serialization for JsonpSerialization<'_, S> {
    fn list_recipes(&self, recipes: &[Recipe]) -> Result<String> {
        self.wrap(|inner| inner.list_recipes(recipes))
    }

    fn list_bags(&self, bags: &[Bag]) -> Result<String> {
        self.wrap(|inner| inner.list_bags(bags))
    }

    fn list_tiddlers(&self, bag: &Bag) -> Result<String> {
        self.wrap(|inner| inner.list_tiddlers(bag))
    }

    fn recipe_as(&self, recipe: &Recipe) -> Result<String> {
        self.wrap(|inner| inner.recipe_as(recipe))
    }

    fn bag_as(&self, bag: &Bag) -> Result<String> {
        self.wrap(|inner| inner.bag_as(bag))
    }

    fn tiddler_as(&self, tiddler: &Tiddler) -> Result<String> {
        self.wrap(|inner| inner.tiddler_as(tiddler))
    }
}

#[cfg(test)]
mod tests {
    use super::{JsonpSerialization, init, wrap_markers};
    use crate::config::{Config, JSON_CONTENT_TYPE, JSON_RESPONSE_TYPE};
    use crate::core::environ::{Environ, Query};
    use crate::core::error::{Error, ErrorKind, Result};
    use crate::core::model::{Bag, Recipe, Tiddler};
    use crate::serializations::{Serialization, SerializerId};

    // Canned bodies so the wrapper is checked independently of the real encoder.
    struct Canned;

    impl Serialization for Canned {
        fn list_recipes(&self, _recipes: &[Recipe]) -> Result<String> {
            Ok(r#"["default"]"#.to_string())
        }

        fn list_bags(&self, _bags: &[Bag]) -> Result<String> {
            Ok(r#"[{"name":"a"},{"name":"b"}]"#.to_string())
        }

        fn list_tiddlers(&self, _bag: &Bag) -> Result<String> {
            Ok(r#"[{"title":"One"}]"#.to_string())
        }

        fn recipe_as(&self, _recipe: &Recipe) -> Result<String> {
            Ok(r#"{"desc":"","recipe":[]}"#.to_string())
        }

        fn bag_as(&self, _bag: &Bag) -> Result<String> {
            Ok(r#"{"desc":""}"#.to_string())
        }

        fn tiddler_as(&self, _tiddler: &Tiddler) -> Result<String> {
            Ok(r#"{"title":"Test"}"#.to_string())
        }
    }

    struct Failing;

    impl Failing {
        fn err() -> Error {
            Error::new(ErrorKind::Serialization).with_message("bad resource")
        }
    }

    impl Serialization for Failing {
        fn list_recipes(&self, _recipes: &[Recipe]) -> Result<String> {
            Err(Self::err())
        }

        fn list_bags(&self, _bags: &[Bag]) -> Result<String> {
            Err(Self::err())
        }

        fn list_tiddlers(&self, _bag: &Bag) -> Result<String> {
            Err(Self::err())
        }

        fn recipe_as(&self, _recipe: &Recipe) -> Result<String> {
            Err(Self::err())
        }

        fn bag_as(&self, _bag: &Bag) -> Result<String> {
            Err(Self::err())
        }

        fn tiddler_as(&self, _tiddler: &Tiddler) -> Result<String> {
            Err(Self::err())
        }
    }

    fn render_all(serializer: &dyn Serialization) -> Vec<Result<String>> {
        let bag = Bag::new("a");
        vec![
            serializer.list_recipes(&[Recipe::new("default")]),
            serializer.list_bags(&[Bag::new("a"), Bag::new("b")]),
            serializer.list_tiddlers(&bag),
            serializer.recipe_as(&Recipe::new("default")),
            serializer.bag_as(&bag),
            serializer.tiddler_as(&Tiddler::new("Test")),
        ]
    }

    fn bodies(serializer: &dyn Serialization) -> Vec<String> {
        render_all(serializer)
            .into_iter()
            .map(|result| result.expect("render"))
            .collect()
    }

    #[test]
    fn markers_follow_first_callback_value() {
        let cases = [
            ("", ("", "")),
            ("other=1", ("", "")),
            ("callback=", ("", "")),
            ("callback", ("", "")),
            ("callback=foo", ("foo(", ")")),
            ("callback=first&callback=second", ("first(", ")")),
            ("callback=&callback=second", ("", "")),
        ];
        for (raw, (prefix, suffix)) in cases {
            let (got_prefix, got_suffix) = wrap_markers(&Query::parse(raw));
            assert_eq!((got_prefix.as_str(), got_suffix.as_str()), (prefix, suffix), "{raw}");
        }
    }

    #[test]
    fn missing_key_yields_no_markers() {
        let query = Query::new();
        assert_eq!(wrap_markers(&query), (String::new(), String::new()));
    }

    #[test]
    fn no_callback_is_identity() {
        let environ = Environ::default();
        let wrapped = JsonpSerialization::new(Canned, &environ);
        assert_eq!(bodies(&wrapped), bodies(&Canned));
    }

    #[test]
    fn callback_wraps_every_shape() {
        let environ = Environ::from_query_string("callback=foo");
        let wrapped = JsonpSerialization::new(Canned, &environ);
        for (wrapped, plain) in bodies(&wrapped).into_iter().zip(bodies(&Canned)) {
            assert_eq!(wrapped, format!("foo({plain})"));
        }
    }

    #[test]
    fn single_tiddler_scenario() {
        let environ = Environ::from_query_string("callback=myFunc");
        let wrapped = JsonpSerialization::new(Canned, &environ);
        assert_eq!(
            wrapped.tiddler_as(&Tiddler::new("Test")).expect("tiddler"),
            r#"myFunc({"title":"Test"})"#
        );
    }

    #[test]
    fn bag_list_without_callback_is_unchanged() {
        let environ = Environ::default();
        let wrapped = JsonpSerialization::new(Canned, &environ);
        assert_eq!(
            wrapped
                .list_bags(&[Bag::new("a"), Bag::new("b")])
                .expect("bags"),
            r#"[{"name":"a"},{"name":"b"}]"#
        );
    }

    #[test]
    fn empty_callback_matches_plain_output() {
        let environ = Environ::from_query_string("callback=");
        let wrapped = JsonpSerialization::new(Canned, &environ);
        assert_eq!(bodies(&wrapped), bodies(&Canned));
    }

    #[test]
    fn callback_is_not_escaped() {
        let environ = Environ::from_query_string("callback=alert%281%29%3Bx");
        let wrapped = JsonpSerialization::new(Canned, &environ);
        assert_eq!(
            wrapped.bag_as(&Bag::new("a")).expect("bag"),
            r#"alert(1);x({"desc":""})"#
        );
    }

    #[test]
    fn inner_errors_propagate_unchanged() {
        let environ = Environ::from_query_string("callback=foo");
        let wrapped = JsonpSerialization::new(Failing, &environ);
        for result in render_all(&wrapped) {
            let err = result.expect_err("inner failure");
            assert_eq!(err.kind(), ErrorKind::Serialization);
            assert_eq!(err.message(), Some("bad resource"));
        }
    }

    #[test]
    fn init_registers_jsonp_for_json() {
        let mut config = Config::default();
        assert_eq!(
            config.serializer_for(JSON_CONTENT_TYPE).map(|entry| entry.id),
            Some(SerializerId::Json)
        );

        init(&mut config);
        let entry = config.serializer_for(JSON_CONTENT_TYPE).expect("entry");
        assert_eq!(entry.id, SerializerId::Jsonp);
        assert_eq!(entry.response_type, JSON_RESPONSE_TYPE);

        let snapshot = config.clone();
        init(&mut config);
        assert_eq!(config, snapshot);
    }
}
