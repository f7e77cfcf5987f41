//! REST API Models
//!
//! Payload types for the lesson catalog endpoints.

use serde::Serialize;

/// One catalog entry: the identifier clients pass to `init`, plus the
/// display title from the lesson document.
#[derive(Serialize, Debug, Clone)]
pub struct LessonSummary {
    pub id: String,
    pub title: String,
}

#[derive(Serialize, Debug)]
pub struct ErrorResponse {
    pub message: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_lesson_summary_serialization() {
        let summary = LessonSummary {
            id: "lesson1".to_string(),
            title: "Saludos".to_string(),
        };

        let json = serde_json::to_string(&summary).unwrap();
        assert_eq!(json, r#"{"id":"lesson1","title":"Saludos"}"#);
    }

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            message: "Lesson not found".to_string(),
        };

        let json = serde_json::to_string(&error).unwrap();
        assert_eq!(json, r#"{"message":"Lesson not found"}"#);
    }
}
