//! Purpose: Serializer registry keyed by request content type.
//! Exports: `Config`, `SerializerEntry`, `JSON_CONTENT_TYPE`, `JSON_RESPONSE_TYPE`.
//! Role: Explicit configuration object mutated once at startup by plugin `init` calls.
//! Invariants: `Config::default()` maps `application/json` to the base JSON serializer.
//! Invariants: Registering the same entry twice leaves the config unchanged.

use std::collections::BTreeMap;

use crate::serializations::SerializerId;

pub const JSON_CONTENT_TYPE: &str = "application/json";
pub const JSON_RESPONSE_TYPE: &str = "application/json; charset=UTF-8";

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct SerializerEntry {
    pub id: SerializerId,
    /// Value sent as the response `Content-Type`.
    pub response_type: String,
}

#[derive(Clone, Debug, Eq, PartialEq)]
pub struct Config {
    serializers: BTreeMap<String, SerializerEntry>,
}

impl Config {
    /// A config with no serializers registered.
    pub fn empty() -> Self {
        Self {
            serializers: BTreeMap::new(),
        }
    }

    pub fn register(
        &mut self,
        content_type: impl Into<String>,
        id: SerializerId,
        response_type: impl Into<String>,
    ) {
        self.serializers.insert(
            content_type.into(),
            SerializerEntry {
                id,
                response_type: response_type.into(),
            },
        );
    }

    pub fn serializer_for(&self, content_type: &str) -> Option<&SerializerEntry> {
        self.serializers.get(content_type)
    }

    pub fn serializers(&self) -> impl Iterator<Item = (&str, &SerializerEntry)> {
        self.serializers
            .iter()
            .map(|(content_type, entry)| (content_type.as_str(), entry))
    }

    /// Picks the serializer for an `Accept` header.
    ///
    /// The first listed media type with a registered serializer wins; media
    /// parameters and quality values are ignored. Falls back to
    /// `application/json` when nothing listed is registered.
    pub fn negotiate(&self, accept: Option<&str>) -> Option<(&str, &SerializerEntry)> {
        let listed = accept
            .into_iter()
            .flat_map(|header| header.split(','))
            .filter_map(|item| item.split(';').next())
            .map(|media| media.trim().to_ascii_lowercase());
        for media in listed {
            if let Some((content_type, entry)) = self.serializers.get_key_value(media.as_str()) {
                return Some((content_type.as_str(), entry));
            }
        }
        self.serializers
            .get_key_value(JSON_CONTENT_TYPE)
            .map(|(content_type, entry)| (content_type.as_str(), entry))
    }
}

impl Default for Config {
    fn default() -> Self {
        let mut config = Self::empty();
        config.register(JSON_CONTENT_TYPE, SerializerId::Json, JSON_RESPONSE_TYPE);
        config
    }
}
