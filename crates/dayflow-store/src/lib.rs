//! # dayflow-store
//!
//! `SQLite` persistence gateway for the dayflow engine.
//!
//! Provides the connection pool, schema migrations, entity types, and
//! stateless repositories over tasks, day plans, time logs, progress
//! snapshots, and stop events. Repositories never open transactions —
//! that is the engine's unit-of-work job; every method takes a
//! `&Connection` (or a `&Transaction`, which derefs to one).

#![deny(unsafe_code)]

pub mod connection;
pub mod migrations;
pub mod repos;
pub mod types;

pub use connection::{ConnectionConfig, ConnectionPool, PooledConnection};
