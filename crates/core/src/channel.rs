//! Abstraction over the remote streaming-avatar backend.
//!
//! The session controller drives a backend session through this trait and
//! consumes its events from an mpsc receiver; it never owns the transport.
//! A concrete adapter (WebSocket, in-process fake) lives behind the
//! `AvatarConnector`, which bundles credential acquisition with the channel
//! open so a failed start is one observable error.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use tokio::sync::mpsc;

/// Opaque playback locator for the avatar's media stream. Recorded for the
/// presentation layer; the controller never looks inside.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct MediaHandle(pub String);

/// Events pushed by the backend for one open session, delivered in the
/// order they occurred on the backend.
#[derive(Debug, Clone)]
pub enum AvatarEvent {
    /// The media stream is ready for playback.
    StreamReady(MediaHandle),
    /// The backend detected the start of user speech.
    UserStarted,
    /// The backend detected the end of user speech.
    UserStopped,
}

/// Failure vocabulary of the avatar backend adapter.
#[derive(Debug, thiserror::Error)]
pub enum ChannelError {
    #[error("token acquisition failed: {0}")]
    Token(String),
    #[error("failed to open avatar session: {0}")]
    Open(String),
    #[error("avatar channel i/o failure: {0}")]
    Io(String),
    #[error("avatar channel already closed")]
    Closed,
}

/// Command surface of one open avatar session.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait AvatarChannel: Send + Sync {
    /// Speak `text` through the avatar. Fire-and-forget: the ack only means
    /// the backend accepted the task, not that playback finished.
    async fn speak(&mut self, text: &str) -> Result<(), ChannelError>;

    /// Configure the backend to report user speech activity and its end.
    async fn start_listening(&mut self) -> Result<(), ChannelError>;

    async fn stop_listening(&mut self) -> Result<(), ChannelError>;

    /// Best-effort cancel of the utterance currently being spoken.
    async fn interrupt(&mut self) -> Result<(), ChannelError>;

    /// Release the backend session.
    async fn close(&mut self) -> Result<(), ChannelError>;
}

/// Result of a successful connect: the command handle plus the stream of
/// backend events for this session.
pub struct AvatarConnection {
    pub channel: Box<dyn AvatarChannel>,
    pub events: mpsc::Receiver<AvatarEvent>,
}

/// Provisions one avatar session: acquires the short-lived credential and
/// opens the backend session. One connect per lesson session.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait AvatarConnector: Send + Sync {
    async fn connect(&self) -> Result<AvatarConnection, ChannelError>;
}
