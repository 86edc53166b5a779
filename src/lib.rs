//! Purpose: JSONP serialization for TiddlyWeb-style JSON responses.
//! Exports: `core` (errors, request context, model), `serializations`, `jsonp`, `config`, `store`.
//! Role: Library backing the `tiddlyweb-jsonp` binary and its tests.
//! Invariants: Serializers are built per request from an explicit `Config`; no global registry.
//! Invariants: Core modules prefer explicit inputs/outputs over hidden state.
pub mod config;
pub mod core;
pub mod jsonp;
pub mod serializations;
pub mod store;
