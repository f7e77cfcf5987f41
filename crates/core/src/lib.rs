//! Core logic for guided voice lessons.
//!
//! This crate is the backend-agnostic heart of the system, structured into
//! submodules for clarity:
//!
//! - `script`: the immutable lesson dialogue and the loader boundary.
//! - `transcript`: the append-only log of exchanged turns.
//! - `channel`: the abstraction over the remote streaming-avatar backend.
//! - `session`: the turn-taking state machine that drives one lesson.
//!
//! Nothing here talks to a network; the delivery service supplies concrete
//! `ScriptStore` and `AvatarConnector` implementations, and tests drive the
//! controller with mock collaborators.

pub mod channel;
pub mod script;
pub mod session;
pub mod transcript;
