//! The lesson session controller.
//!
//! One `LessonSession` owns the turn-taking state for one voice lesson: it
//! sequences avatar utterances, opens listening windows, consumes backend
//! events, and advances through the scripted dialogue. All mutation goes
//! through its intent methods and `handle_event`; the host applies them one
//! at a time, so transitions are serialized by `&mut` ownership and no event
//! is processed while an intent's channel calls are still in flight.

use crate::channel::{AvatarChannel, AvatarConnector, AvatarEvent, ChannelError, MediaHandle};
use crate::script::LessonScript;
use crate::transcript::Transcript;
use serde::Serialize;
use std::sync::Arc;
use tokio::sync::mpsc;
use tracing::{debug, info, warn};

/// Where the controller is in the turn-taking cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Phase {
    /// Nothing spoken, no channel open.
    Idle,
    /// Channel being provisioned; transient within `start()`.
    Starting,
    /// The current step's utterance has been issued but its listening
    /// window is not open yet. No listening window may open before its
    /// matching utterance has been issued.
    AvatarSpeaking,
    /// A listening window is open; waiting for the user-stop signal.
    AwaitingUserTurn,
    /// Listening and advancement suspended; the active utterance was
    /// interrupted. No step advancement may occur here.
    Paused,
    /// Channel teardown in progress; transient within `end()`.
    Ending,
    /// Terminal for this session instance. `start()` runs a fresh session.
    Ended,
}

/// Errors surfaced synchronously from session intents. Failures during an
/// in-flight turn are absorbed into `Paused` plus the `last_error` flag
/// instead, never thrown across the event boundary.
#[derive(Debug, thiserror::Error)]
pub enum SessionError {
    /// Credential or channel-open failure during `start()`. The controller
    /// is back in `Idle`; the caller may retry.
    #[error("session start failed: {0}")]
    StartFailed(#[source] ChannelError),
    /// The intent is not valid in the current phase. Callers may ignore.
    #[error("intent not valid while {0:?}")]
    InvalidIntent(Phase),
}

/// Serializable read view of the controller, pushed to the presentation
/// layer after each transition.
#[derive(Debug, Clone, Serialize)]
pub struct SessionSnapshot {
    pub phase: Phase,
    pub step_index: usize,
    /// Text of the step at the current index, if the dialogue is not
    /// exhausted.
    pub current_text: Option<String>,
    pub user_is_talking: bool,
    pub is_complete: bool,
    /// Set when a mid-session channel failure was absorbed into `Paused`.
    pub last_error: Option<String>,
    pub transcript: Transcript,
}

/// The turn-taking state machine for one guided voice lesson.
pub struct LessonSession {
    script: LessonScript,
    connector: Arc<dyn AvatarConnector>,
    channel: Option<Box<dyn AvatarChannel>>,
    phase: Phase,
    step_index: usize,
    user_is_talking: bool,
    media_handle: Option<MediaHandle>,
    last_error: Option<String>,
    transcript: Transcript,
}

impl LessonSession {
    /// A controller is only ever constructed with a fully-loaded script.
    pub fn new(script: LessonScript, connector: Arc<dyn AvatarConnector>) -> Self {
        Self {
            script,
            connector,
            channel: None,
            phase: Phase::Idle,
            step_index: 0,
            user_is_talking: false,
            media_handle: None,
            last_error: None,
            transcript: Transcript::default(),
        }
    }

    /// Provisions the channel, speaks the opening remark and the first step,
    /// and opens the first listening window. Returns the backend event
    /// stream the host must pump into [`handle_event`](Self::handle_event).
    ///
    /// Valid from `Idle` and `Ended` only; a restart tears nothing down
    /// itself, it simply begins a fresh session over a new channel.
    pub async fn start(&mut self) -> Result<mpsc::Receiver<AvatarEvent>, SessionError> {
        match self.phase {
            Phase::Idle | Phase::Ended => {}
            other => return Err(SessionError::InvalidIntent(other)),
        }
        self.reset();
        self.phase = Phase::Starting;

        let connection = match self.connector.connect().await {
            Ok(connection) => connection,
            Err(e) => {
                self.phase = Phase::Idle;
                return Err(SessionError::StartFailed(e));
            }
        };
        let mut channel = connection.channel;

        if !self.script.opening_remark.is_empty() {
            if let Err(e) = channel.speak(&self.script.opening_remark).await {
                self.phase = Phase::Idle;
                return Err(SessionError::StartFailed(e));
            }
        }

        self.channel = Some(channel);
        if let Err(e) = self.speak_current_step().await {
            self.channel = None;
            self.phase = Phase::Idle;
            return Err(SessionError::StartFailed(e));
        }
        if self.phase == Phase::Starting {
            // Empty dialogue: the session is live and immediately complete.
            self.phase = Phase::AwaitingUserTurn;
        }

        info!(title = %self.script.title, steps = self.script.len(), "lesson session started");
        Ok(connection.events)
    }

    /// Applies one backend event. Signals inconsistent with the current
    /// phase are ignored, never errors.
    pub async fn handle_event(&mut self, event: AvatarEvent) {
        match event {
            AvatarEvent::StreamReady(handle) => {
                // Recorded for the presentation layer; does not advance phase.
                self.media_handle = Some(handle);
            }
            AvatarEvent::UserStarted => {
                self.user_is_talking = true;
            }
            AvatarEvent::UserStopped => {
                self.user_is_talking = false;
                self.advance_on_user_stop().await;
            }
        }
    }

    /// Interrupts the current utterance, closes the listening window, and
    /// freezes the step counter. Best-effort: channel failures still land
    /// in `Paused`. A no-op outside `AvatarSpeaking`/`AwaitingUserTurn`.
    pub async fn pause(&mut self) {
        if !matches!(self.phase, Phase::AvatarSpeaking | Phase::AwaitingUserTurn) {
            debug!(phase = ?self.phase, "pause ignored");
            return;
        }
        if let Some(channel) = self.channel.as_mut() {
            if let Err(e) = channel.interrupt().await {
                warn!(error = %e, "interrupt failed while pausing");
            }
            if let Err(e) = channel.stop_listening().await {
                warn!(error = %e, "failed to close listening window while pausing");
            }
        }
        self.phase = Phase::Paused;
    }

    /// Re-issues the *current* step's utterance and reopens the listening
    /// window. Anything the user said while paused is dropped, not
    /// replayed. A no-op outside `Paused`.
    pub async fn resume(&mut self) {
        if self.phase != Phase::Paused {
            debug!(phase = ?self.phase, "resume ignored outside pause");
            return;
        }
        self.phase = Phase::AwaitingUserTurn;
        if let Err(e) = self.speak_current_step().await {
            self.fail_into_paused(e);
        }
    }

    /// Re-issues the current step without touching the step counter. Valid
    /// from any non-terminal phase with a channel open; clears a pause.
    pub async fn repeat(&mut self) {
        if matches!(
            self.phase,
            Phase::Idle | Phase::Starting | Phase::Ending | Phase::Ended
        ) {
            debug!(phase = ?self.phase, "repeat ignored");
            return;
        }
        if let Err(e) = self.speak_current_step().await {
            self.fail_into_paused(e);
        }
    }

    /// Speaks `text` as an ad-hoc utterance. Pure side-channel: never
    /// mutates the step counter, the phase, or the transcript.
    pub async fn send_manual_message(&mut self, text: &str) {
        if matches!(self.phase, Phase::Idle | Phase::Ending | Phase::Ended) {
            debug!(phase = ?self.phase, "manual message ignored");
            return;
        }
        let Some(channel) = self.channel.as_mut() else {
            return;
        };
        if let Err(e) = channel.speak(text).await {
            warn!(error = %e, "manual message failed");
            self.last_error = Some(e.to_string());
        }
    }

    /// Tears the channel down and discards the media handle. Teardown
    /// failures are logged and never prevent reaching `Ended`. Idempotent:
    /// ending an already-ended session is a no-op.
    pub async fn end(&mut self) {
        if self.phase == Phase::Ended {
            debug!("end ignored; session already ended");
            return;
        }
        self.phase = Phase::Ending;
        if let Some(mut channel) = self.channel.take() {
            if let Err(e) = channel.close().await {
                warn!(error = %e, "avatar channel teardown failed; forcing session end");
            }
        }
        self.media_handle = None;
        self.user_is_talking = false;
        self.phase = Phase::Ended;
        info!("lesson session ended");
    }

    pub fn phase(&self) -> Phase {
        self.phase
    }

    pub fn step_index(&self) -> usize {
        self.step_index
    }

    pub fn user_is_talking(&self) -> bool {
        self.user_is_talking
    }

    /// Dialogue exhaustion is a readable condition, not a terminal state:
    /// the channel stays open until `end()`.
    pub fn is_complete(&self) -> bool {
        self.step_index >= self.script.len()
    }

    pub fn media_handle(&self) -> Option<&MediaHandle> {
        self.media_handle.as_ref()
    }

    pub fn transcript(&self) -> &Transcript {
        &self.transcript
    }

    pub fn snapshot(&self) -> SessionSnapshot {
        SessionSnapshot {
            phase: self.phase,
            step_index: self.step_index,
            current_text: self.script.step(self.step_index).map(|s| s.text.clone()),
            user_is_talking: self.user_is_talking,
            is_complete: self.is_complete(),
            last_error: self.last_error.clone(),
            transcript: self.transcript.clone(),
        }
    }

    /// Accepts a user-stop signal: exactly one advancement per signal, only
    /// while a listening window is open and a step is defined at the
    /// current index. Everything else is a stale or out-of-order signal.
    async fn advance_on_user_stop(&mut self) {
        if self.phase != Phase::AwaitingUserTurn {
            debug!(phase = ?self.phase, "ignoring user-stop outside an open listening window");
            return;
        }
        let expected = match self.script.step(self.step_index) {
            Some(step) => step.expected_response.clone(),
            None => {
                debug!("ignoring user-stop past the end of the dialogue");
                return;
            }
        };

        if let Some(reply) = expected {
            self.transcript.push_user(&reply);
        }
        self.step_index += 1;

        if self.step_index < self.script.len() {
            if let Err(e) = self.speak_current_step().await {
                self.fail_into_paused(e);
            }
        } else {
            info!(steps = self.script.len(), "dialogue complete; channel stays open until end()");
        }
    }

    /// Issues the utterance for the step at the current index, appends the
    /// avatar line, and opens the listening window. A no-op once the
    /// dialogue is exhausted.
    async fn speak_current_step(&mut self) -> Result<(), ChannelError> {
        let text = match self.script.step(self.step_index) {
            Some(step) => step.text.clone(),
            None => return Ok(()),
        };
        let channel = match self.channel.as_mut() {
            Some(channel) => channel,
            None => return Err(ChannelError::Closed),
        };

        self.phase = Phase::AvatarSpeaking;
        channel.speak(&text).await?;
        self.transcript.push_avatar(&text);
        channel.start_listening().await?;
        self.phase = Phase::AwaitingUserTurn;
        Ok(())
    }

    /// Fail-safe for mid-session channel failures: stop advancing rather
    /// than proceed blind.
    fn fail_into_paused(&mut self, e: ChannelError) {
        warn!(error = %e, "channel failure absorbed; pausing session");
        self.last_error = Some(e.to_string());
        self.phase = Phase::Paused;
    }

    fn reset(&mut self) {
        self.channel = None;
        self.step_index = 0;
        self.user_is_talking = false;
        self.media_handle = None;
        self.last_error = None;
        self.transcript = Transcript::default();
    }
}
