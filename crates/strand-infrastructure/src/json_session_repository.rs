//! JSON file-based SessionRepository implementation.
//!
//! Directory structure:
//! ```text
//! base_dir/
//! ├── sessions/
//! │   ├── chat_1700000000000_ab12cd3.json
//! │   └── chat_1700000000001_xy98zw7.json
//! └── active_session.txt
//! ```

use crate::paths::StrandPaths;
use async_trait::async_trait;
use std::path::{Path, PathBuf};
use strand_core::session::{ChatSession, SessionRepository};
use strand_core::{Result, StrandError};
use tokio::fs;

/// File-per-session JSON repository.
///
/// Each session is serialized to `sessions/<id>.json`; the active session
/// identifier lives in `active_session.txt` next to it. Writes replace the
/// whole file, which is adequate for the save-after-mutate contract of the
/// session store.
pub struct JsonSessionRepository {
    base_dir: PathBuf,
}

impl JsonSessionRepository {
    /// Creates a repository rooted at `base_dir`, creating the directory
    /// structure if needed.
    ///
    /// # Errors
    ///
    /// Returns an error if the directories cannot be created.
    pub async fn new(base_dir: impl AsRef<Path>) -> Result<Self> {
        let base_dir = base_dir.as_ref().to_path_buf();
        fs::create_dir_all(base_dir.join("sessions"))
            .await
            .map_err(|e| StrandError::io(format!("Failed to create sessions directory: {e}")))?;
        Ok(Self { base_dir })
    }

    /// Creates a repository at the default location
    /// (`<config dir>/strand`).
    pub async fn default_location() -> Result<Self> {
        Self::new(StrandPaths::config_dir()?).await
    }

    fn session_file_path(&self, session_id: &str) -> PathBuf {
        self.base_dir
            .join("sessions")
            .join(format!("{session_id}.json"))
    }

    fn active_file_path(&self) -> PathBuf {
        self.base_dir.join("active_session.txt")
    }

    async fn load_session_from_path(&self, path: &Path) -> Result<ChatSession> {
        let json = fs::read_to_string(path)
            .await
            .map_err(|e| StrandError::io(format!("Failed to read {}: {}", path.display(), e)))?;
        let session = serde_json::from_str(&json)?;
        Ok(session)
    }
}

#[async_trait]
impl SessionRepository for JsonSessionRepository {
    async fn find_by_id(&self, session_id: &str) -> Result<Option<ChatSession>> {
        let path = self.session_file_path(session_id);
        if !path.exists() {
            return Ok(None);
        }
        Ok(Some(self.load_session_from_path(&path).await?))
    }

    async fn save(&self, session: &ChatSession) -> Result<()> {
        let path = self.session_file_path(&session.id);
        let json = serde_json::to_string_pretty(session)?;
        fs::write(&path, json)
            .await
            .map_err(|e| StrandError::io(format!("Failed to write {}: {}", path.display(), e)))?;
        Ok(())
    }

    async fn delete(&self, session_id: &str) -> Result<()> {
        let path = self.session_file_path(session_id);
        if path.exists() {
            fs::remove_file(&path).await.map_err(|e| {
                StrandError::io(format!("Failed to delete {}: {}", path.display(), e))
            })?;
        }
        Ok(())
    }

    async fn list_all(&self) -> Result<Vec<ChatSession>> {
        let sessions_dir = self.base_dir.join("sessions");
        let mut entries = fs::read_dir(&sessions_dir)
            .await
            .map_err(|e| StrandError::io(format!("Failed to read sessions directory: {e}")))?;

        let mut sessions = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| StrandError::io(format!("Failed to read directory entry: {e}")))?
        {
            let path = entry.path();
            if path.extension().and_then(|s| s.to_str()) != Some("json") {
                continue;
            }
            match self.load_session_from_path(&path).await {
                Ok(session) => sessions.push(session),
                Err(e) => {
                    // A corrupt file must not take the whole list down.
                    tracing::warn!(
                        "[JsonSessionRepository] Skipping unreadable session {}: {}",
                        path.display(),
                        e
                    );
                }
            }
        }

        // Most recently active first.
        sessions.sort_by(|a, b| b.last_message_time.cmp(&a.last_message_time));
        Ok(sessions)
    }

    async fn get_active_session_id(&self) -> Result<Option<String>> {
        let path = self.active_file_path();
        if !path.exists() {
            return Ok(None);
        }
        let id = fs::read_to_string(&path)
            .await
            .map_err(|e| StrandError::io(format!("Failed to read active session ID: {e}")))?;
        let id = id.trim().to_string();
        if id.is_empty() { Ok(None) } else { Ok(Some(id)) }
    }

    async fn set_active_session_id(&self, session_id: &str) -> Result<()> {
        fs::write(self.active_file_path(), session_id)
            .await
            .map_err(|e| StrandError::io(format!("Failed to write active session ID: {e}")))?;
        Ok(())
    }

    async fn clear_active_session_id(&self) -> Result<()> {
        let path = self.active_file_path();
        if path.exists() {
            fs::remove_file(&path)
                .await
                .map_err(|e| StrandError::io(format!("Failed to clear active session ID: {e}")))?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use strand_core::session::{Message, MessageRole};
    use tempfile::TempDir;

    fn test_session(id: &str, last_message_time: &str) -> ChatSession {
        ChatSession {
            id: id.to_string(),
            title: format!("Session {id}"),
            messages: vec![Message {
                id: format!("msg_{id}"),
                role: MessageRole::User,
                content: "Hello".to_string(),
                timestamp: last_message_time.to_string(),
                is_error: false,
                is_step: false,
            }],
            agent_id: "super-agent".to_string(),
            last_message_time: last_message_time.to_string(),
        }
    }

    #[tokio::test]
    async fn save_and_load_round_trip() {
        let temp = TempDir::new().unwrap();
        let repo = JsonSessionRepository::new(temp.path()).await.unwrap();

        let session = test_session("chat_1", "2024-01-01T00:00:00+00:00");
        repo.save(&session).await.unwrap();

        let loaded = repo.find_by_id("chat_1").await.unwrap().unwrap();
        assert_eq!(loaded, session);
        assert!(repo.find_by_id("chat_missing").await.unwrap().is_none());
    }

    #[tokio::test]
    async fn list_is_sorted_by_last_activity() {
        let temp = TempDir::new().unwrap();
        let repo = JsonSessionRepository::new(temp.path()).await.unwrap();

        repo.save(&test_session("chat_a", "2024-01-01T00:00:00+00:00"))
            .await
            .unwrap();
        repo.save(&test_session("chat_b", "2024-03-01T00:00:00+00:00"))
            .await
            .unwrap();
        repo.save(&test_session("chat_c", "2024-02-01T00:00:00+00:00"))
            .await
            .unwrap();

        let ids: Vec<String> = repo
            .list_all()
            .await
            .unwrap()
            .into_iter()
            .map(|s| s.id)
            .collect();
        assert_eq!(ids, vec!["chat_b", "chat_c", "chat_a"]);
    }

    #[tokio::test]
    async fn delete_removes_file_and_tolerates_missing() {
        let temp = TempDir::new().unwrap();
        let repo = JsonSessionRepository::new(temp.path()).await.unwrap();

        let session = test_session("chat_del", "2024-01-01T00:00:00+00:00");
        repo.save(&session).await.unwrap();
        repo.delete("chat_del").await.unwrap();
        assert!(repo.find_by_id("chat_del").await.unwrap().is_none());

        // Deleting again is not an error.
        repo.delete("chat_del").await.unwrap();
    }

    #[tokio::test]
    async fn active_session_id_round_trip() {
        let temp = TempDir::new().unwrap();
        let repo = JsonSessionRepository::new(temp.path()).await.unwrap();

        assert_eq!(repo.get_active_session_id().await.unwrap(), None);

        repo.set_active_session_id("chat_1").await.unwrap();
        assert_eq!(
            repo.get_active_session_id().await.unwrap(),
            Some("chat_1".to_string())
        );

        repo.clear_active_session_id().await.unwrap();
        assert_eq!(repo.get_active_session_id().await.unwrap(), None);
    }

    #[tokio::test]
    async fn corrupt_session_file_is_skipped() {
        let temp = TempDir::new().unwrap();
        let repo = JsonSessionRepository::new(temp.path()).await.unwrap();

        repo.save(&test_session("chat_ok", "2024-01-01T00:00:00+00:00"))
            .await
            .unwrap();
        std::fs::write(temp.path().join("sessions/broken.json"), "{ not json").unwrap();

        let sessions = repo.list_all().await.unwrap();
        assert_eq!(sessions.len(), 1);
        assert_eq!(sessions[0].id, "chat_ok");
    }
}
