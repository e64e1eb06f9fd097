//! Binding core: identifiers, errors, the cache, recipe resolution and blueprints.

pub mod blueprint;
pub mod cache;
pub mod error;
pub mod resolver;
pub mod types;
