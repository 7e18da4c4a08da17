//! # MediaDB Core
//!
//! The generic persistence engine for MediaDB.
//!
//! This crate defines the two contracts every persisted entity type
//! participates in, and the engine that drives them:
//!
//! - [`Model`]: a serializable record exposing [`Metadata`] (ID,
//!   timestamps, optimistic version) that the engine manages.
//! - [`Service`]: a stateless per-entity descriptor supplying bucket
//!   naming, validation, cleaning, initialization, frozen-field
//!   carry-over and lifecycle hooks.
//! - [`Repository`]: the generic CRUD engine, instantiated once per
//!   entity type, implementing create/update/delete/get plus
//!   forward-only first/skip pagination over ID-ordered bucket scans.
//!
//! Relationship services register cascading-delete callbacks on the
//! [`PersistHooks`] of the services they reference; the hooks run inside
//! the triggering transaction, so a cascade either fully applies or the
//! whole transaction rolls back.

pub mod codec;
mod error;
mod hooks;
mod model;
mod repository;
mod service;

pub use error::{EngineError, EngineResult};
pub use hooks::{Hook, PersistHooks};
pub use model::{now_millis, EntityId, Metadata, Model};
pub use repository::Repository;
pub use service::Service;

pub use mediadb_storage::{Bucket, Store, StoreError, StoreOptions, Tx};
