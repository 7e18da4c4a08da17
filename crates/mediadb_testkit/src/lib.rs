//! # MediaDB Testkit
//!
//! Shared fixtures for exercising the catalog in tests: an in-memory
//! catalog, minimal valid entities, and a populated "universe" with one
//! of everything wired together. The crate's `tests/` directory holds
//! the cross-entity integration suites.

pub mod fixtures;

pub use fixtures::{
    catalog, character, episode, genre, media, person, producer, user, Universe,
};
