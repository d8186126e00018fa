//! Conversation store
//!
//! Conversations and their messages, persisted as one JSON file per
//! conversation and cached in memory. Messages are immutable once appended.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use uuid::Uuid;

pub use concierge_provider::Role;

pub const DEFAULT_TITLE: &str = "New Conversation";

#[derive(Error, Debug)]
pub enum SessionError {
    #[error("conversation store I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("corrupt conversation file: {0}")]
    Json(#[from] serde_json::Error),

    #[error("conversation {0} not found")]
    NotFound(Uuid),
}

pub type Result<T> = std::result::Result<T, SessionError>;

/// A single conversation turn
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Message {
    pub id: Uuid,
    pub role: Role,
    pub content: String,
    pub created_at: DateTime<Utc>,
}

impl Message {
    pub fn new(role: Role, content: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            role,
            content: content.into(),
            created_at: Utc::now(),
        }
    }

    pub fn user(content: impl Into<String>) -> Self {
        Self::new(Role::User, content)
    }

    pub fn assistant(content: impl Into<String>) -> Self {
        Self::new(Role::Assistant, content)
    }

    pub fn system(content: impl Into<String>) -> Self {
        Self::new(Role::System, content)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Conversation {
    pub id: Uuid,
    pub title: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default)]
    pub messages: Vec<Message>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl Conversation {
    pub fn new(title: Option<String>, session_id: Option<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            title: title
                .filter(|t| !t.trim().is_empty())
                .unwrap_or_else(|| DEFAULT_TITLE.to_string()),
            session_id,
            messages: Vec::new(),
            created_at: now,
            updated_at: now,
        }
    }

    /// Messages in canonical order (by creation time, ties keep insertion order)
    pub fn history(&self) -> Vec<Message> {
        let mut messages = self.messages.clone();
        messages.sort_by_key(|m| m.created_at);
        messages
    }

    fn push(&mut self, message: Message) {
        self.messages.push(message);
        self.updated_at = Utc::now();
    }
}

/// File-backed conversation store
pub struct ConversationStore {
    dir: PathBuf,
    cache: HashMap<Uuid, Conversation>,
}

impl ConversationStore {
    pub fn new(dir: impl AsRef<Path>) -> Self {
        let dir = dir.as_ref().to_path_buf();
        if let Err(e) = std::fs::create_dir_all(&dir) {
            warn!("failed to create conversation dir {:?}: {}", dir, e);
        }

        Self {
            dir,
            cache: HashMap::new(),
        }
    }

    pub fn dir(&self) -> &Path {
        &self.dir
    }

    pub async fn create(
        &mut self,
        title: Option<String>,
        session_id: Option<String>,
    ) -> Result<Conversation> {
        let conversation = Conversation::new(title, session_id);
        self.save(&conversation).await?;
        self.cache.insert(conversation.id, conversation.clone());
        debug!("created conversation {}", conversation.id);
        Ok(conversation)
    }

    pub async fn get(&mut self, id: Uuid) -> Result<Option<Conversation>> {
        Ok(self.load_cached(id).await?.cloned())
    }

    /// All conversations, newest first, optionally restricted to one session
    pub async fn list(&mut self, session_id: Option<&str>) -> Result<Vec<Conversation>> {
        let mut entries = tokio::fs::read_dir(&self.dir).await?;
        while let Some(entry) = entries.next_entry().await? {
            let name = entry.file_name();
            let Some(id) = name
                .to_str()
                .and_then(|n| n.strip_suffix(".json"))
                .and_then(|stem| Uuid::parse_str(stem).ok())
            else {
                continue;
            };
            if let Err(e) = self.load_cached(id).await {
                warn!("skipping conversation {}: {}", id, e);
            }
        }

        let mut conversations: Vec<Conversation> = self
            .cache
            .values()
            .filter(|c| session_id.map_or(true, |s| c.session_id.as_deref() == Some(s)))
            .cloned()
            .collect();
        conversations.sort_by(|a, b| b.created_at.cmp(&a.created_at));
        Ok(conversations)
    }

    pub async fn delete(&mut self, id: Uuid) -> Result<bool> {
        let cached = self.cache.remove(&id).is_some();
        let path = self.path_for(id);
        if path.exists() {
            tokio::fs::remove_file(path).await?;
            Ok(true)
        } else {
            Ok(cached)
        }
    }

    pub async fn append_message(
        &mut self,
        id: Uuid,
        role: Role,
        content: impl Into<String>,
    ) -> Result<Message> {
        let message = Message::new(role, content);
        let conversation = self
            .load_cached(id)
            .await?
            .ok_or(SessionError::NotFound(id))?;
        conversation.push(message.clone());
        let snapshot = conversation.clone();
        self.save(&snapshot).await?;
        Ok(message)
    }

    /// Drop a message, used to roll back a turn that failed upstream
    pub async fn remove_message(&mut self, id: Uuid, message_id: Uuid) -> Result<bool> {
        let conversation = self
            .load_cached(id)
            .await?
            .ok_or(SessionError::NotFound(id))?;
        let before = conversation.messages.len();
        conversation.messages.retain(|m| m.id != message_id);
        if conversation.messages.len() == before {
            return Ok(false);
        }
        let snapshot = conversation.clone();
        self.save(&snapshot).await?;
        Ok(true)
    }

    pub async fn history(&mut self, id: Uuid) -> Result<Vec<Message>> {
        self.load_cached(id)
            .await?
            .map(|c| c.history())
            .ok_or(SessionError::NotFound(id))
    }

    async fn save(&self, conversation: &Conversation) -> Result<()> {
        let content = serde_json::to_string_pretty(conversation)?;
        tokio::fs::write(self.path_for(conversation.id), content).await?;
        debug!("saved conversation {}", conversation.id);
        Ok(())
    }

    async fn load_cached(&mut self, id: Uuid) -> Result<Option<&mut Conversation>> {
        if !self.cache.contains_key(&id) {
            let path = self.path_for(id);
            if !path.exists() {
                return Ok(None);
            }
            let content = tokio::fs::read_to_string(&path).await?;
            let conversation: Conversation = serde_json::from_str(&content)?;
            debug!("loaded conversation {}", id);
            self.cache.insert(id, conversation);
        }
        Ok(self.cache.get_mut(&id))
    }

    fn path_for(&self, id: Uuid) -> PathBuf {
        self.dir.join(format!("{}.json", id))
    }
}
