//! Lesson script data model and the loader boundary.
//!
//! A lesson is an ordered, immutable sequence of scripted exchanges. The
//! session controller is only ever constructed with a fully-loaded script;
//! partial loads are not representable.

use async_trait::async_trait;
#[cfg(test)]
use mockall::automock;
use serde::{Deserialize, Serialize};

/// One scripted exchange: the line the avatar speaks and, optionally, the
/// canonical reply the learner is expected to give back.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonStep {
    /// Utterance the avatar must speak for this step.
    pub text: String,
    /// Reply recorded into the transcript when no recognized speech
    /// transcript is available. Absent is a valid value, not an error.
    #[serde(default, rename = "expectedResponse")]
    pub expected_response: Option<String>,
}

/// An ordered lesson dialogue plus its introduction. Immutable for the
/// lifetime of a session; loaded exactly once per session start.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LessonScript {
    pub title: String,
    /// Introductory utterance spoken once, before the stepped dialogue
    /// begins. Empty means the lesson has no opening remark.
    #[serde(default, rename = "avatarScript", alias = "openingRemark")]
    pub opening_remark: String,
    pub dialog: Vec<LessonStep>,
}

impl LessonScript {
    /// The step at `index`, or `None` once the dialogue is exhausted.
    pub fn step(&self, index: usize) -> Option<&LessonStep> {
        self.dialog.get(index)
    }

    /// Number of steps in the dialogue.
    pub fn len(&self) -> usize {
        self.dialog.len()
    }

    pub fn is_empty(&self) -> bool {
        self.dialog.is_empty()
    }
}

/// Failures while fetching or decoding a lesson document.
#[derive(Debug, thiserror::Error)]
pub enum ScriptError {
    #[error("lesson '{0}' not found")]
    NotFound(String),
    #[error("lesson '{id}' could not be read: {reason}")]
    Unreadable { id: String, reason: String },
    #[error("lesson '{id}' is malformed: {reason}")]
    Parse { id: String, reason: String },
}

/// The loader boundary: given a lesson identifier, yields a fully-populated
/// script or fails. Loading the same identifier twice yields the same
/// content and step ordering.
#[async_trait]
#[cfg_attr(test, automock)]
pub trait ScriptStore: Send + Sync {
    async fn load(&self, lesson_id: &str) -> Result<LessonScript, ScriptError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parses_lesson_document_with_original_field_names() {
        let json = r#"{
            "title": "Saludos",
            "avatarScript": "¡Hola! Bienvenido a la lección uno.",
            "dialog": [
                { "text": "Say hello", "expectedResponse": "Hello" },
                { "text": "Say goodbye" }
            ]
        }"#;

        let script: LessonScript = serde_json::from_str(json).unwrap();
        assert_eq!(script.title, "Saludos");
        assert_eq!(script.opening_remark, "¡Hola! Bienvenido a la lección uno.");
        assert_eq!(script.len(), 2);
        assert_eq!(
            script.step(0).unwrap().expected_response.as_deref(),
            Some("Hello")
        );
        // expectedResponse absent is valid, not an error.
        assert_eq!(script.step(1).unwrap().expected_response, None);
        assert!(script.step(2).is_none());
    }

    #[test]
    fn accepts_opening_remark_alias() {
        let json = r#"{
            "title": "Greetings",
            "openingRemark": "Hi!",
            "dialog": [ { "text": "Say hello" } ]
        }"#;

        let script: LessonScript = serde_json::from_str(json).unwrap();
        assert_eq!(script.opening_remark, "Hi!");
    }

    #[test]
    fn missing_dialog_is_a_parse_failure() {
        let json = r#"{ "title": "Broken", "avatarScript": "Hi" }"#;
        let result: Result<LessonScript, _> = serde_json::from_str(json);
        assert!(result.is_err());
    }

    #[test]
    fn missing_opening_remark_defaults_to_empty() {
        let json = r#"{ "title": "Plain", "dialog": [] }"#;
        let script: LessonScript = serde_json::from_str(json).unwrap();
        assert!(script.opening_remark.is_empty());
        assert!(script.is_empty());
    }
}
