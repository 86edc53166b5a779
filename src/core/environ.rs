//! Purpose: Per-request context handed to serializers.
//! Exports: `Query`, `Environ`.
//! Role: Carries decoded query parameters from the host into rendering calls.
//! Invariants: Built fresh per request; repeated keys keep their arrival order.
//! Invariants: Decoding never fails; malformed escapes are decoded lossily.

use std::collections::BTreeMap;

/// Query parameters as a map from name to every value supplied for it.
#[derive(Clone, Debug, Default, Eq, PartialEq)]
pub struct Query {
    params: BTreeMap<String, Vec<String>>,
}

impl Query {
    pub fn new() -> Self {
        Self::default()
    }

    /// Decodes an `application/x-www-form-urlencoded` query string.
    ///
    /// A leading `?` is ignored and a bare `key` decodes to an empty value.
    pub fn parse(raw: &str) -> Self {
        let raw = raw.strip_prefix('?').unwrap_or(raw);
        let mut query = Self::new();
        for (key, value) in url::form_urlencoded::parse(raw.as_bytes()) {
            query.append(key.into_owned(), value.into_owned());
        }
        query
    }

    pub fn append(&mut self, key: impl Into<String>, value: impl Into<String>) {
        self.params.entry(key.into()).or_default().push(value.into());
    }

    pub fn get(&self, key: &str) -> Option<&[String]> {
        self.params.get(key).map(Vec::as_slice)
    }

    pub fn first(&self, key: &str) -> Option<&str> {
        self.get(key)
            .and_then(|values| values.first())
            .map(String::as_str)
    }

    pub fn is_empty(&self) -> bool {
        self.params.is_empty()
    }
}

impl<K, V> FromIterator<(K, V)> for Query
where
    K: Into<String>,
    V: Into<String>,
{
    fn from_iter<I: IntoIterator<Item = (K, V)>>(iter: I) -> Self {
        let mut query = Self::new();
        for (key, value) in iter {
            query.append(key, value);
        }
        query
    }
}

#[derive(Clone, Debug, Default)]
pub struct Environ {
    pub query: Query,
}

impl Environ {
    pub fn new(query: Query) -> Self {
        Self { query }
    }

    pub fn from_query_string(raw: &str) -> Self {
        Self::new(Query::parse(raw))
    }

    /// True when the request asks for full objects in list responses.
    pub fn is_fat(&self) -> bool {
        self.query.first("fat").is_some_and(|value| !value.is_empty())
    }
}
