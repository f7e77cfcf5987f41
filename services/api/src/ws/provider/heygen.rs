//! Handles the real-time connection to the streaming-avatar backend.
//!
//! Connecting is two external calls: a REST token exchange, then a
//! WebSocket session carrying JSON task frames. A writer task drains the
//! command queue onto the socket; a reader task decodes backend events and
//! forwards them, in arrival order, to the session controller.

use crate::config::Config;
use async_trait::async_trait;
use aula_core::channel::{
    AvatarChannel, AvatarConnection, AvatarConnector, AvatarEvent, ChannelError, MediaHandle,
};
use futures_util::{SinkExt, StreamExt};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tokio::sync::mpsc;
use tokio_tungstenite::{connect_async, tungstenite::protocol::Message as WsMessage};
use tracing::{debug, info, warn};

/// Commands accepted by the backend session socket.
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireCommand<'a> {
    SessionStart {
        avatar_name: &'a str,
        quality: &'a str,
        language: &'a str,
        voice_rate: f32,
    },
    Speak {
        text: &'a str,
    },
    StartListening,
    StopListening,
    Interrupt,
}

/// Events pushed by the backend session socket.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
enum WireEvent {
    StreamReady { url: String },
    UserStart,
    UserStop,
    SessionClosed,
    #[serde(other)]
    Unknown,
}

#[derive(Debug)]
enum Outbound {
    Frame(String),
    Close,
}

#[derive(Deserialize)]
struct TokenResponse {
    data: TokenData,
}

#[derive(Deserialize)]
struct TokenData {
    token: String,
}

/// Provisions avatar sessions against the configured backend.
pub struct HeygenConnector {
    http: reqwest::Client,
    config: Arc<Config>,
}

impl HeygenConnector {
    pub fn new(config: Arc<Config>) -> Self {
        Self {
            http: reqwest::Client::new(),
            config,
        }
    }

    /// Exchanges the long-lived API key for a short-lived session token.
    async fn create_token(&self) -> Result<String, ChannelError> {
        let url = format!("{}/v1/streaming.create_token", self.config.avatar_base_url);
        let response = self
            .http
            .post(&url)
            .header("x-api-key", &self.config.avatar_api_key)
            .send()
            .await
            .map_err(|e| ChannelError::Token(e.to_string()))?;

        if !response.status().is_success() {
            return Err(ChannelError::Token(format!(
                "token endpoint returned {}",
                response.status()
            )));
        }

        let body: TokenResponse = response
            .json()
            .await
            .map_err(|e| ChannelError::Token(e.to_string()))?;
        Ok(body.data.token)
    }
}

#[async_trait]
impl AvatarConnector for HeygenConnector {
    async fn connect(&self) -> Result<AvatarConnection, ChannelError> {
        let token = self.create_token().await?;
        let (channel, events) = HeygenChannel::open(&self.config, &token).await?;
        Ok(AvatarConnection {
            channel: Box::new(channel),
            events,
        })
    }
}

/// One open backend session. Commands are queued to the writer task; the
/// session dies when either side closes the socket.
pub struct HeygenChannel {
    cmd_tx: mpsc::Sender<Outbound>,
}

impl HeygenChannel {
    async fn open(
        config: &Config,
        token: &str,
    ) -> Result<(Self, mpsc::Receiver<AvatarEvent>), ChannelError> {
        let ws_url = format!(
            "{}/v1/ws/streaming.session?session_token={}",
            config.avatar_base_url.replacen("http", "ws", 1),
            token
        );
        let (ws_stream, _) = connect_async(ws_url)
            .await
            .map_err(|e| ChannelError::Open(e.to_string()))?;
        let (mut write, mut read) = ws_stream.split();
        info!("Connected to avatar streaming backend.");

        // Configure the avatar session parameters.
        let start = serde_json::to_string(&WireCommand::SessionStart {
            avatar_name: &config.avatar_name,
            quality: &config.avatar_quality,
            language: &config.lesson_language,
            voice_rate: config.voice_rate,
        })
        .map_err(|e| ChannelError::Open(e.to_string()))?;
        write
            .send(WsMessage::Text(start.into()))
            .await
            .map_err(|e| ChannelError::Open(e.to_string()))?;

        let (cmd_tx, mut cmd_rx) = mpsc::channel::<Outbound>(32);
        let (event_tx, event_rx) = mpsc::channel::<AvatarEvent>(64);

        // Writer task: drains queued commands onto the socket.
        tokio::spawn(async move {
            while let Some(outbound) = cmd_rx.recv().await {
                match outbound {
                    Outbound::Frame(frame) => {
                        if let Err(e) = write.send(WsMessage::Text(frame.into())).await {
                            warn!(error = %e, "failed to send command to avatar backend");
                            break;
                        }
                    }
                    Outbound::Close => {
                        let _ = write.send(WsMessage::Close(None)).await;
                        break;
                    }
                }
            }
        });

        // Reader task: decodes backend events and preserves arrival order.
        tokio::spawn(async move {
            while let Some(message) = read.next().await {
                let message = match message {
                    Ok(message) => message,
                    Err(e) => {
                        warn!(error = %e, "avatar backend read failed");
                        break;
                    }
                };
                match message {
                    WsMessage::Text(text) => {
                        let event = match serde_json::from_str::<WireEvent>(&text) {
                            Ok(event) => event,
                            Err(e) => {
                                debug!(error = %e, "ignoring undecodable backend frame");
                                continue;
                            }
                        };
                        let mapped = match event {
                            WireEvent::StreamReady { url } => {
                                Some(AvatarEvent::StreamReady(MediaHandle(url)))
                            }
                            WireEvent::UserStart => Some(AvatarEvent::UserStarted),
                            WireEvent::UserStop => Some(AvatarEvent::UserStopped),
                            WireEvent::SessionClosed => {
                                info!("avatar backend ended the session");
                                break;
                            }
                            WireEvent::Unknown => None,
                        };
                        if let Some(event) = mapped {
                            if event_tx.send(event).await.is_err() {
                                break;
                            }
                        }
                    }
                    WsMessage::Close(reason) => {
                        info!("avatar backend closed the stream: {:?}", reason);
                        break;
                    }
                    _ => {}
                }
            }
        });

        Ok((Self { cmd_tx }, event_rx))
    }

    async fn send(&mut self, command: WireCommand<'_>) -> Result<(), ChannelError> {
        let frame = serde_json::to_string(&command).map_err(|e| ChannelError::Io(e.to_string()))?;
        self.cmd_tx
            .send(Outbound::Frame(frame))
            .await
            .map_err(|_| ChannelError::Closed)
    }
}

#[async_trait]
impl AvatarChannel for HeygenChannel {
    async fn speak(&mut self, text: &str) -> Result<(), ChannelError> {
        self.send(WireCommand::Speak { text }).await
    }

    async fn start_listening(&mut self) -> Result<(), ChannelError> {
        self.send(WireCommand::StartListening).await
    }

    async fn stop_listening(&mut self) -> Result<(), ChannelError> {
        self.send(WireCommand::StopListening).await
    }

    async fn interrupt(&mut self) -> Result<(), ChannelError> {
        self.send(WireCommand::Interrupt).await
    }

    async fn close(&mut self) -> Result<(), ChannelError> {
        self.cmd_tx
            .send(Outbound::Close)
            .await
            .map_err(|_| ChannelError::Closed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn commands_serialize_as_tagged_task_frames() {
        let speak = serde_json::to_string(&WireCommand::Speak { text: "Say hello" }).unwrap();
        assert_eq!(speak, r#"{"type":"speak","text":"Say hello"}"#);

        let listen = serde_json::to_string(&WireCommand::StartListening).unwrap();
        assert_eq!(listen, r#"{"type":"start_listening"}"#);
    }

    #[test]
    fn events_deserialize_from_tagged_frames() {
        let ready: WireEvent =
            serde_json::from_str(r#"{"type":"stream_ready","url":"wss://media.example/abc"}"#)
                .unwrap();
        assert!(matches!(ready, WireEvent::StreamReady { url } if url == "wss://media.example/abc"));

        let stop: WireEvent = serde_json::from_str(r#"{"type":"user_stop"}"#).unwrap();
        assert!(matches!(stop, WireEvent::UserStop));
    }

    #[test]
    fn unknown_event_kinds_are_tolerated() {
        let unknown: WireEvent =
            serde_json::from_str(r#"{"type":"avatar_blink"}"#).unwrap();
        assert!(matches!(unknown, WireEvent::Unknown));
    }
}
