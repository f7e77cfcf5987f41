//! Shared Application State
//!
//! This module defines the `AppState` struct, which holds all shared,
//! clonable resources like the lesson store and the avatar connector.

use crate::config::Config;
use crate::scripts::FileScriptStore;
use aula_core::channel::AvatarConnector;
use std::sync::Arc;

/// The shared application state, created once at startup and passed to all handlers.
#[derive(Clone)]
pub struct AppState {
    pub scripts: Arc<FileScriptStore>,
    pub connector: Arc<dyn AvatarConnector>,
    pub config: Arc<Config>,
}
