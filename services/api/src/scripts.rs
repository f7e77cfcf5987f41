//! Filesystem-backed lesson store.
//!
//! Lesson documents live as `<lessons_dir>/<id>.json` in the format the
//! lesson pages consume: `title`, `avatarScript`, and an ordered `dialog`
//! array. The store is read-only; re-loading an identifier yields the same
//! script every time.

use aula_core::script::{LessonScript, ScriptError, ScriptStore};
use async_trait::async_trait;
use std::path::PathBuf;
use tracing::debug;

pub struct FileScriptStore {
    root: PathBuf,
}

impl FileScriptStore {
    pub fn new(root: PathBuf) -> Self {
        Self { root }
    }

    /// Lists the lesson identifiers available in the store, sorted.
    pub async fn list(&self) -> anyhow::Result<Vec<String>> {
        let mut ids = Vec::new();
        let mut entries = tokio::fs::read_dir(&self.root).await?;
        while let Some(entry) = entries.next_entry().await? {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) == Some("json") {
                if let Some(stem) = path.file_stem().and_then(|s| s.to_str()) {
                    ids.push(stem.to_string());
                }
            }
        }
        ids.sort();
        Ok(ids)
    }

    /// The identifier is a catalog key, not a path.
    fn is_valid_id(lesson_id: &str) -> bool {
        !lesson_id.is_empty()
            && !lesson_id.contains('/')
            && !lesson_id.contains('\\')
            && !lesson_id.contains("..")
    }
}

#[async_trait]
impl ScriptStore for FileScriptStore {
    async fn load(&self, lesson_id: &str) -> Result<LessonScript, ScriptError> {
        if !Self::is_valid_id(lesson_id) {
            return Err(ScriptError::NotFound(lesson_id.to_string()));
        }
        let path = self.root.join(format!("{lesson_id}.json"));
        debug!(lesson_id, path = %path.display(), "loading lesson script");

        let raw = match tokio::fs::read_to_string(&path).await {
            Ok(raw) => raw,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(ScriptError::NotFound(lesson_id.to_string()));
            }
            Err(e) => {
                return Err(ScriptError::Unreadable {
                    id: lesson_id.to_string(),
                    reason: e.to_string(),
                });
            }
        };

        serde_json::from_str(&raw).map_err(|e| ScriptError::Parse {
            id: lesson_id.to_string(),
            reason: e.to_string(),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn store_with(files: &[(&str, &str)]) -> (tempfile::TempDir, FileScriptStore) {
        let dir = tempfile::tempdir().unwrap();
        for (name, content) in files {
            std::fs::write(dir.path().join(name), content).unwrap();
        }
        let store = FileScriptStore::new(dir.path().to_path_buf());
        (dir, store)
    }

    const LESSON1: &str = r#"{
        "title": "Saludos",
        "avatarScript": "¡Hola!",
        "dialog": [ { "text": "Say hello", "expectedResponse": "Hello" } ]
    }"#;

    #[tokio::test]
    async fn loads_a_lesson_by_id() {
        let (_dir, store) = store_with(&[("lesson1.json", LESSON1)]);

        let script = store.load("lesson1").await.unwrap();
        assert_eq!(script.title, "Saludos");
        assert_eq!(script.len(), 1);

        // Re-requesting the same identifier is idempotent.
        let again = store.load("lesson1").await.unwrap();
        assert_eq!(again.title, script.title);
        assert_eq!(again.len(), script.len());
    }

    #[tokio::test]
    async fn unknown_id_is_not_found() {
        let (_dir, store) = store_with(&[]);
        let err = store.load("lesson9").await.unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(_)));
    }

    #[tokio::test]
    async fn path_traversal_ids_are_rejected() {
        let (_dir, store) = store_with(&[("lesson1.json", LESSON1)]);
        let err = store.load("../lesson1").await.unwrap_err();
        assert!(matches!(err, ScriptError::NotFound(_)));
    }

    #[tokio::test]
    async fn document_without_dialog_is_a_parse_error() {
        let (_dir, store) =
            store_with(&[("broken.json", r#"{ "title": "Broken", "avatarScript": "Hi" }"#)]);
        let err = store.load("broken").await.unwrap_err();
        assert!(matches!(err, ScriptError::Parse { .. }));
    }

    #[tokio::test]
    async fn lists_lessons_sorted() {
        let (_dir, store) = store_with(&[
            ("lesson2.json", LESSON1),
            ("lesson1.json", LESSON1),
            ("notes.txt", "ignored"),
        ]);

        let ids = store.list().await.unwrap();
        assert_eq!(ids, vec!["lesson1", "lesson2"]);
    }
}
