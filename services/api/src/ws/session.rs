//! Manages the primary WebSocket connection lifecycle for a lesson session.

use super::protocol::{ClientMessage, ServerMessage};
use crate::state::AppState;
use anyhow::{Context, Result, anyhow};
use aula_core::{
    channel::AvatarEvent,
    script::{LessonScript, ScriptStore},
    session::LessonSession,
};
use axum::{
    extract::{
        State,
        ws::{Message, WebSocket, WebSocketUpgrade},
    },
    response::Response,
};
use futures_util::{
    SinkExt, StreamExt,
    stream::{SplitSink, SplitStream},
};
use std::sync::Arc;
use tracing::{Instrument, error, info, instrument, warn};

/// Axum handler to upgrade an HTTP connection to a WebSocket.
pub async fn ws_handler(ws: WebSocketUpgrade, State(state): State<Arc<AppState>>) -> Response {
    ws.on_upgrade(|socket| handle_socket(socket, state))
}

/// Main handler for an individual WebSocket connection.
///
/// Performs the initial handshake (the client names a lesson, the script is
/// loaded) and then runs the lesson session loop until either side hangs up.
#[instrument(name = "ws_lesson", skip_all, fields(connection_id, lesson_id))]
async fn handle_socket(socket: WebSocket, state: Arc<AppState>) {
    let connection_id: u32 = rand::random();
    tracing::Span::current().record("connection_id", &connection_id.to_string());
    info!("New WebSocket connection. Awaiting init...");

    let (mut socket_tx, mut socket_rx) = socket.split();

    // The first message from the client must be an `init` message.
    let lesson_id = match read_init(&mut socket_rx).await {
        Ok(Some(lesson_id)) => lesson_id,
        Ok(None) => {
            info!("Client disconnected before sending init message.");
            return;
        }
        Err(e) => {
            warn!("Session initialization failed: {:?}", e);
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };
    tracing::Span::current().record("lesson_id", &lesson_id);

    let script = match state.scripts.load(&lesson_id).await {
        Ok(script) => script,
        Err(e) => {
            warn!(error = %e, "Lesson script unavailable.");
            let _ = send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await;
            return;
        }
    };

    if send_msg(
        &mut socket_tx,
        ServerMessage::Initialized {
            lesson_id: lesson_id.clone(),
            title: script.title.clone(),
        },
    )
    .await
    .is_err()
    {
        error!("Failed to send Initialized message to client.");
        return;
    }

    let session_span = tracing::info_span!("lesson_runtime", %lesson_id);
    if let Err(e) = run_lesson_session(state, script, socket_tx, socket_rx)
        .instrument(session_span)
        .await
    {
        error!(error = ?e, "Lesson session terminated with error.");
    }
    info!("Lesson session finished.");
}

/// Reads and validates the `init` handshake message.
async fn read_init(socket_rx: &mut SplitStream<WebSocket>) -> Result<Option<String>> {
    let Some(msg) = socket_rx.next().await else {
        return Ok(None);
    };
    let msg = msg.context("error receiving first message")?;
    let Message::Text(text) = msg else {
        return Err(anyhow!("First message was not a text `init` message."));
    };
    let init: ClientMessage =
        serde_json::from_str(&text).context("First message must be valid JSON")?;
    match init {
        ClientMessage::Init { lesson_id } => Ok(Some(lesson_id)),
        _ => Err(anyhow!("First message must be `init`")),
    }
}

/// The main event loop for an active lesson session.
///
/// Client intents and avatar-backend events are applied to the controller
/// one at a time; after every applied transition the updated snapshot is
/// pushed to the client.
async fn run_lesson_session(
    state: Arc<AppState>,
    script: LessonScript,
    mut socket_tx: SplitSink<WebSocket, Message>,
    mut socket_rx: SplitStream<WebSocket>,
) -> Result<()> {
    let mut session = LessonSession::new(script, state.connector.clone());
    let mut events = match session.start().await {
        Ok(events) => events,
        Err(e) => {
            send_msg(
                &mut socket_tx,
                ServerMessage::Error {
                    message: e.to_string(),
                },
            )
            .await?;
            return Err(e.into());
        }
    };

    let result = lesson_loop(&mut session, &mut events, &mut socket_tx, &mut socket_rx).await;

    // The backend session is always released, whatever ended the loop.
    session.end().await;
    info!("WebSocket connection closed and lesson session terminated.");
    result
}

/// Applies client intents and avatar events to the controller, one at a
/// time, pushing the updated snapshot after each transition.
async fn lesson_loop(
    session: &mut LessonSession,
    events: &mut tokio::sync::mpsc::Receiver<AvatarEvent>,
    socket_tx: &mut SplitSink<WebSocket, Message>,
    socket_rx: &mut SplitStream<WebSocket>,
) -> Result<()> {
    send_msg(
        socket_tx,
        ServerMessage::Snapshot {
            state: session.snapshot(),
        },
    )
    .await?;
    let mut announced_complete = session.is_complete();
    if announced_complete {
        send_msg(socket_tx, ServerMessage::LessonComplete).await?;
    }

    loop {
        tokio::select! {
            // Handle intents from the client WebSocket.
            Some(msg_result) = socket_rx.next() => {
                match msg_result {
                    Ok(ws_msg) => match ws_msg {
                        Message::Text(text) => {
                            match serde_json::from_str::<ClientMessage>(&text) {
                                Ok(ClientMessage::Init { .. }) => {
                                    warn!("Ignoring duplicate init message.");
                                    continue;
                                }
                                Ok(ClientMessage::Pause) => session.pause().await,
                                Ok(ClientMessage::Resume) => session.resume().await,
                                Ok(ClientMessage::Repeat) => session.repeat().await,
                                Ok(ClientMessage::ManualMessage { text }) => {
                                    session.send_manual_message(&text).await
                                }
                                Ok(ClientMessage::End) => {
                                    session.end().await;
                                    send_msg(socket_tx, ServerMessage::Snapshot { state: session.snapshot() }).await?;
                                    break;
                                }
                                Err(e) => {
                                    warn!(error = %e, "Ignoring malformed client message.");
                                    continue;
                                }
                            }
                        },
                        Message::Close(_) => {
                            info!("Client sent close frame. Shutting down session.");
                            break;
                        },
                        Message::Binary(_) | Message::Ping(_) | Message::Pong(_) => continue,
                    },
                    Err(e) => {
                        error!("Error receiving from client WebSocket: {:?}", e);
                        break;
                    }
                }
            },
            // Handle events from the avatar backend.
            Some(event) = events.recv() => {
                let stream_url = match &event {
                    AvatarEvent::StreamReady(handle) => Some(handle.0.clone()),
                    _ => None,
                };
                session.handle_event(event).await;
                if let Some(url) = stream_url {
                    send_msg(socket_tx, ServerMessage::StreamReady { url }).await?;
                }
            },
            // If all channels close, exit the loop.
            else => break,
        }

        send_msg(
            socket_tx,
            ServerMessage::Snapshot {
                state: session.snapshot(),
            },
        )
        .await?;
        if !announced_complete && session.is_complete() {
            announced_complete = true;
            send_msg(socket_tx, ServerMessage::LessonComplete).await?;
        }
    }

    Ok(())
}

/// A helper function to serialize and send a `ServerMessage` to the client.
pub(crate) async fn send_msg(
    socket_tx: &mut SplitSink<WebSocket, Message>,
    msg: ServerMessage,
) -> Result<()> {
    let serialized = serde_json::to_string(&msg)?;
    socket_tx.send(Message::Text(serialized.into())).await?;
    Ok(())
}
