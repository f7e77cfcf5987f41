//! Append-only transcript of exchanged turns.

use serde::Serialize;

/// Who produced a transcript line.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum Speaker {
    Avatar,
    User,
}

/// One line of the exchange, in production order.
#[derive(Debug, Clone, Serialize)]
pub struct TranscriptEntry {
    pub speaker: Speaker,
    pub message: String,
}

/// Ordered log of exchanged turns. Entries are appended in production order
/// and never reordered or mutated after insertion.
#[derive(Debug, Default, Clone, Serialize)]
#[serde(transparent)]
pub struct Transcript {
    entries: Vec<TranscriptEntry>,
}

impl Transcript {
    pub fn push_avatar(&mut self, message: &str) {
        self.entries.push(TranscriptEntry {
            speaker: Speaker::Avatar,
            message: message.to_string(),
        });
    }

    pub fn push_user(&mut self, message: &str) {
        self.entries.push(TranscriptEntry {
            speaker: Speaker::User,
            message: message.to_string(),
        });
    }

    pub fn entries(&self) -> &[TranscriptEntry] {
        &self.entries
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn preserves_production_order() {
        let mut transcript = Transcript::default();
        transcript.push_avatar("Say hello");
        transcript.push_user("Hello");
        transcript.push_avatar("Say goodbye");

        let entries = transcript.entries();
        assert_eq!(entries.len(), 3);
        assert_eq!(entries[0].speaker, Speaker::Avatar);
        assert_eq!(entries[0].message, "Say hello");
        assert_eq!(entries[1].speaker, Speaker::User);
        assert_eq!(entries[1].message, "Hello");
        assert_eq!(entries[2].speaker, Speaker::Avatar);
        assert_eq!(entries[2].message, "Say goodbye");
    }

    #[test]
    fn serializes_as_a_plain_array() {
        let mut transcript = Transcript::default();
        transcript.push_user("Hola");

        let json = serde_json::to_string(&transcript).unwrap();
        assert_eq!(json, r#"[{"speaker":"user","message":"Hola"}]"#);
    }
}
