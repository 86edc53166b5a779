// Core modules: errors, request context, and the resource model.
pub mod environ;
pub mod error;
pub mod model;
