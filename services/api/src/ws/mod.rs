//! WebSocket Session Management
//!
//! This module contains the core logic for hosting lesson sessions over
//! WebSockets. It is structured into submodules for clarity:
//!
//! - `protocol`: Defines the JSON-based message format for client-server communication.
//! - `session`: Manages the WebSocket connection lifecycle, from handshake to termination.
//! - `provider`: Connects to the third-party streaming-avatar backend.

pub mod protocol;
pub mod provider;
pub mod session;

pub use session::ws_handler;
