//! Defines the WebSocket message protocol between the browser client and the API server.

use aula_core::session::SessionSnapshot;
use serde::{Deserialize, Serialize};

/// Messages sent from the client (browser) to the server.
#[derive(Deserialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ClientMessage {
    /// Starts a lesson session. This must be the first message.
    Init {
        /// Catalog identifier of the lesson to run.
        lesson_id: String,
    },
    /// Suspend listening and advancement; interrupts the current utterance.
    Pause,
    /// Leave pause by re-issuing the current step.
    Resume,
    /// Re-issue the current step without advancing.
    Repeat,
    /// An ad-hoc utterance for the avatar to speak; does not touch the dialogue.
    ManualMessage { text: String },
    /// Tear down the avatar session.
    End,
}

/// Messages sent from the server to the client (browser).
#[derive(Serialize, Debug)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum ServerMessage {
    /// Confirms the lesson script was loaded and the session is starting.
    Initialized { lesson_id: String, title: String },
    /// The controller's read view, pushed after every applied transition.
    Snapshot { state: SessionSnapshot },
    /// The avatar's media stream is ready for playback.
    StreamReady { url: String },
    /// The scripted dialogue has been exhausted; the session stays live.
    LessonComplete,
    /// Reports an error to the client.
    Error { message: String },
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn client_messages_deserialize_from_tagged_json() {
        let init: ClientMessage =
            serde_json::from_str(r#"{"type":"init","lesson_id":"lesson1"}"#).unwrap();
        assert!(matches!(init, ClientMessage::Init { lesson_id } if lesson_id == "lesson1"));

        let pause: ClientMessage = serde_json::from_str(r#"{"type":"pause"}"#).unwrap();
        assert!(matches!(pause, ClientMessage::Pause));

        let manual: ClientMessage =
            serde_json::from_str(r#"{"type":"manual_message","text":"hola"}"#).unwrap();
        assert!(matches!(manual, ClientMessage::ManualMessage { text } if text == "hola"));
    }

    #[test]
    fn unknown_client_message_is_rejected() {
        let result: Result<ClientMessage, _> = serde_json::from_str(r#"{"type":"dance"}"#);
        assert!(result.is_err());
    }

    #[test]
    fn server_messages_serialize_with_type_tag() {
        let msg = ServerMessage::Initialized {
            lesson_id: "lesson1".to_string(),
            title: "Saludos".to_string(),
        };
        let json = serde_json::to_string(&msg).unwrap();
        assert_eq!(
            json,
            r#"{"type":"initialized","lesson_id":"lesson1","title":"Saludos"}"#
        );

        let complete = serde_json::to_string(&ServerMessage::LessonComplete).unwrap();
        assert_eq!(complete, r#"{"type":"lesson_complete"}"#);
    }
}
