//! Aula API Library Crate
//!
//! This library contains all the logic for the lesson web service: the
//! application state, lesson store, API handlers, WebSocket session host,
//! and routing. The `api` binary is a thin wrapper around this library.

pub mod config;
pub mod handlers;
pub mod models;
pub mod router;
pub mod scripts;
pub mod state;
pub mod ws;
